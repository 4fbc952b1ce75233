//! URI output: a single record's data, base64-encoded and optionally split
//! across 1-9 `raddata://` chunks (spec.md §4.6, §6). `UseUrlSafeBase64` and
//! `NoBaseXEncoding` are mutually exclusive, enforced by the CLI layer
//! before this codec ever runs.

use std::collections::HashSet;
use std::io::Write;

use crate::error::WriteError;
use crate::spectrum::SpecFile;

use super::traits::{resolve_single_record, SpecFileWriter};

#[derive(Debug, Clone, Copy, Default)]
pub struct UriOptions {
    pub num_chunks: u8,
    pub as_mailto: bool,
    pub url_safe_base64: bool,
    /// When set, payload bytes are written as hex instead of base64.
    pub no_basex_encoding: bool,
}

pub struct UriCodec(pub UriOptions);

fn encode_payload(bytes: &[u8], opts: &UriOptions) -> String {
    if opts.no_basex_encoding {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    } else if opts.url_safe_base64 {
        base64_simd::URL_SAFE_NO_PAD.encode_type::<String>(bytes)
    } else {
        base64_simd::STANDARD.encode_type::<String>(bytes)
    }
}

fn chunk_string(s: &str, n: usize) -> Vec<String> {
    if n <= 1 {
        return vec![s.to_string()];
    }
    let len = s.len();
    let chunk_len = len.div_ceil(n);
    s.as_bytes()
        .chunks(chunk_len.max(1))
        .map(|c| String::from_utf8_lossy(c).to_string())
        .collect()
}

impl SpecFileWriter for UriCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let opts = &self.0;
        if opts.url_safe_base64 && opts.no_basex_encoding {
            return Err(WriteError::Encoding {
                format: "Uri",
                message: "UseUrlSafeBase64 and NoBaseXEncoding are mutually exclusive".into(),
            });
        }
        let r = resolve_single_record(spec, samples, detectors, "Uri")?;

        let mut payload = String::new();
        payload.push_str(&r.detector_name);
        payload.push('\n');
        if let Some(counts) = &r.gamma_counts {
            payload.push_str(&counts.iter().map(f64::to_string).collect::<Vec<_>>().join(" "));
        }

        let encoded = encode_payload(payload.as_bytes(), opts);
        let n = opts.num_chunks.clamp(1, 9) as usize;
        let chunks = chunk_string(&encoded, n);
        let total = chunks.len();

        for (i, chunk) in chunks.iter().enumerate() {
            let scheme = if opts.as_mailto { "mailto:" } else { "raddata://" };
            writeln!(out, "{}G0{:04}{:02}/{:02} {}", scheme, 0, i + 1, total, chunk)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Record;

    #[test]
    fn mutually_exclusive_options_are_rejected() {
        let mut spec = SpecFile::new();
        spec.push_record(Record::new(1, "A"));
        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        let opts = UriOptions { url_safe_base64: true, no_basex_encoding: true, ..Default::default() };
        let err = UriCodec(opts).write(&mut buf, &spec, &samples, &dets).unwrap_err();
        assert!(matches!(err, WriteError::Encoding { .. }));
    }

    #[test]
    fn splits_into_requested_chunk_count() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0; 100]);
        spec.push_record(r);
        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        let opts = UriOptions { num_chunks: 3, ..Default::default() };
        UriCodec(opts).write(&mut buf, &spec, &samples, &dets).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}

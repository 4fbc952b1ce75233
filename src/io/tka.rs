//! TKA: the simplest single-record format — live time, real time, then one
//! channel count per line, no calibration (spec.md §4.6 `Tka`).

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{Record, SpecFile};

use super::traits::{resolve_single_record, SpecFileReader, SpecFileWriter};

pub struct TkaCodec;

impl SpecFileWriter for TkaCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let r = resolve_single_record(spec, samples, detectors, "Tka")?;
        writeln!(out, "{}", r.live_time)?;
        writeln!(out, "{}", r.real_time)?;
        for c in r.gamma_counts.as_deref().unwrap_or(&[]) {
            writeln!(out, "{}", c)?;
        }
        Ok(())
    }
}

impl SpecFileReader for TkaCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let mut lines = BufReader::new(input).lines();
        let live_time: f64 = lines
            .next()
            .ok_or(ParseError::UnrecognizedFormat)??
            .trim()
            .parse()
            .map_err(|_| ParseError::Malformed { format: "Tka", message: "non-numeric live time".into() })?;
        let real_time: f64 = lines
            .next()
            .ok_or(ParseError::UnrecognizedFormat)??
            .trim()
            .parse()
            .map_err(|_| ParseError::Malformed { format: "Tka", message: "non-numeric real time".into() })?;

        let mut counts = Vec::new();
        for line in lines {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            counts.push(trimmed.parse::<f64>().map_err(|_| ParseError::Malformed {
                format: "Tka",
                message: "non-numeric channel datum".into(),
            })?);
        }

        let mut r = Record::new(1, "tka");
        r.live_time = live_time;
        r.real_time = real_time;
        r.gamma_counts = Some(counts);

        let mut spec = SpecFile::new();
        spec.push_record(r);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_times_and_counts() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.live_time = 95.0;
        r.real_time = 100.0;
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        TkaCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = TkaCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].live_time, 95.0);
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
    }
}

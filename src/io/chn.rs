//! CHN: a binary single-record format. Title limited to 63 characters, no
//! deviation-pair support (spec.md §4.6 `Chn`).

use std::collections::HashSet;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{EnergyCalibration, Record, SpecFile};

use super::traits::{resolve_single_record, SpecFileReader, SpecFileWriter};

const TITLE_LIMIT: usize = 63;

pub struct ChnCodec;

impl SpecFileWriter for ChnCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let r = resolve_single_record(spec, samples, detectors, "Chn")?;

        let title: String = r.title.chars().take(TITLE_LIMIT).collect();
        out.write_u8(title.len() as u8)?;
        out.write_all(title.as_bytes())?;
        out.write_f64::<LittleEndian>(r.real_time)?;
        out.write_f64::<LittleEndian>(r.live_time)?;

        let (a, b) = r
            .energy_calibration
            .as_ref()
            .map(|c| (c.coefficients.first().copied().unwrap_or(0.0), c.coefficients.get(1).copied().unwrap_or(1.0)))
            .unwrap_or((0.0, 1.0));
        out.write_f64::<LittleEndian>(a)?;
        out.write_f64::<LittleEndian>(b)?;

        let counts = r.gamma_counts.as_deref().unwrap_or(&[]);
        out.write_u32::<LittleEndian>(counts.len() as u32)?;
        for c in counts {
            out.write_f32::<LittleEndian>(*c as f32)?;
        }
        Ok(())
    }
}

impl SpecFileReader for ChnCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let title_len = input.read_u8()? as usize;
        let mut title_buf = vec![0u8; title_len];
        input.read_exact(&mut title_buf)?;

        let real_time = input.read_f64::<LittleEndian>()?;
        let live_time = input.read_f64::<LittleEndian>()?;
        let a = input.read_f64::<LittleEndian>()?;
        let b = input.read_f64::<LittleEndian>()?;

        let num_channels = input.read_u32::<LittleEndian>()? as usize;
        let mut counts = Vec::with_capacity(num_channels);
        for _ in 0..num_channels {
            counts.push(input.read_f32::<LittleEndian>()? as f64);
        }

        let mut r = Record::new(1, "chn");
        r.title = String::from_utf8_lossy(&title_buf).to_string();
        r.real_time = real_time;
        r.live_time = live_time;
        r.gamma_counts = Some(counts);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![a, b], num_channels).shared());

        let mut spec = SpecFile::new();
        spec.push_record(r);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_multi_record_selection() {
        let mut spec = SpecFile::new();
        spec.push_record(Record::new(1, "A"));
        spec.push_record(Record::new(2, "A"));
        let mut buf = Vec::new();
        let samples = HashSet::from([1, 2]);
        let dets = HashSet::from(["A".to_string()]);
        let err = ChnCodec.write(&mut buf, &spec, &samples, &dets).unwrap_err();
        assert!(matches!(err, WriteError::InvalidSelection { count: 2, .. }));
    }

    #[test]
    fn round_trips_the_one_record() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.title = "x".repeat(100);
        r.gamma_counts = Some(vec![1.0, 2.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        ChnCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = ChnCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].title.len(), 63);
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0]));
    }
}

//! Canberra CNF: a binary single-record format (spec.md §4.6 `Cnf`).

use std::collections::HashSet;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{EnergyCalibration, Record, SpecFile};

use super::traits::{resolve_single_record, SpecFileReader, SpecFileWriter};

pub struct CnfCodec;

impl SpecFileWriter for CnfCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let r = resolve_single_record(spec, samples, detectors, "Cnf")?;
        out.write_f64::<LittleEndian>(r.real_time)?;
        out.write_f64::<LittleEndian>(r.live_time)?;
        let coeffs = r.energy_calibration.as_ref().map(|c| c.coefficients.clone()).unwrap_or_default();
        out.write_u32::<LittleEndian>(coeffs.len() as u32)?;
        for c in &coeffs {
            out.write_f64::<LittleEndian>(*c)?;
        }
        let counts = r.gamma_counts.as_deref().unwrap_or(&[]);
        out.write_u32::<LittleEndian>(counts.len() as u32)?;
        for c in counts {
            out.write_f32::<LittleEndian>(*c as f32)?;
        }
        Ok(())
    }
}

impl SpecFileReader for CnfCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let real_time = input.read_f64::<LittleEndian>()?;
        let live_time = input.read_f64::<LittleEndian>()?;
        let num_coeffs = input.read_u32::<LittleEndian>()? as usize;
        let mut coeffs = Vec::with_capacity(num_coeffs);
        for _ in 0..num_coeffs {
            coeffs.push(input.read_f64::<LittleEndian>()?);
        }
        let num_channels = input.read_u32::<LittleEndian>()? as usize;
        let mut counts = Vec::with_capacity(num_channels);
        for _ in 0..num_channels {
            counts.push(input.read_f32::<LittleEndian>()? as f64);
        }

        let mut r = Record::new(1, "cnf");
        r.real_time = real_time;
        r.live_time = live_time;
        r.gamma_counts = Some(counts);
        r.energy_calibration = Some(EnergyCalibration::polynomial(coeffs, num_channels).shared());

        let mut spec = SpecFile::new();
        spec.push_record(r);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_one_record() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        CnfCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = CnfCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
    }
}

//! SPC family: single-record formats that preserve calibration and GPS,
//! unlike CHN (spec.md §4.6 `SpcBinaryInt`/`SpcBinaryFloat`/`SpcAscii`).
//! The three variants share a layout and differ only in how channel counts
//! are encoded.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{EnergyCalibration, GpsFix, Record, SpecFile};

use super::traits::{resolve_single_record, SpecFileReader, SpecFileWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpcVariant {
    BinaryInt,
    BinaryFloat,
    Ascii,
}

pub struct SpcCodec(pub SpcVariant);

impl SpecFileWriter for SpcCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let r = resolve_single_record(spec, samples, detectors, "Spc")?;
        let coeffs = r
            .energy_calibration
            .as_ref()
            .map(|c| c.coefficients.clone())
            .unwrap_or_default();
        let counts = r.gamma_counts.as_deref().unwrap_or(&[]);
        let (lat, lon) = r.gps.map(|g| (g.latitude, g.longitude)).unwrap_or((0.0, 0.0));

        match self.0 {
            SpcVariant::Ascii => {
                writeln!(out, "REAL_TIME: {}", r.real_time)?;
                writeln!(out, "LIVE_TIME: {}", r.live_time)?;
                writeln!(out, "LATITUDE: {}", lat)?;
                writeln!(out, "LONGITUDE: {}", lon)?;
                writeln!(out, "CAL_COEFF: {}", coeffs.iter().map(f64::to_string).collect::<Vec<_>>().join(" "))?;
                for c in counts {
                    writeln!(out, "{}", c)?;
                }
            }
            SpcVariant::BinaryInt | SpcVariant::BinaryFloat => {
                out.write_f64::<LittleEndian>(r.real_time)?;
                out.write_f64::<LittleEndian>(r.live_time)?;
                out.write_f64::<LittleEndian>(lat)?;
                out.write_f64::<LittleEndian>(lon)?;
                out.write_u32::<LittleEndian>(coeffs.len() as u32)?;
                for c in &coeffs {
                    out.write_f64::<LittleEndian>(*c)?;
                }
                out.write_u32::<LittleEndian>(counts.len() as u32)?;
                for c in counts {
                    if self.0 == SpcVariant::BinaryInt {
                        out.write_i32::<LittleEndian>(*c as i32)?;
                    } else {
                        out.write_f32::<LittleEndian>(*c as f32)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl SpecFileReader for SpcCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let mut r = Record::new(1, "spc");
        match self.0 {
            SpcVariant::Ascii => {
                let mut reader = BufReader::new(input);
                let mut coeffs = Vec::new();
                let mut counts = Vec::new();
                let mut lat = 0.0;
                let mut lon = 0.0;
                let mut line = String::new();
                while reader.read_line(&mut line)? > 0 {
                    let trimmed = line.trim();
                    if let Some(rest) = trimmed.strip_prefix("REAL_TIME:") {
                        r.real_time = rest.trim().parse().unwrap_or(0.0);
                    } else if let Some(rest) = trimmed.strip_prefix("LIVE_TIME:") {
                        r.live_time = rest.trim().parse().unwrap_or(0.0);
                    } else if let Some(rest) = trimmed.strip_prefix("LATITUDE:") {
                        lat = rest.trim().parse().unwrap_or(0.0);
                    } else if let Some(rest) = trimmed.strip_prefix("LONGITUDE:") {
                        lon = rest.trim().parse().unwrap_or(0.0);
                    } else if let Some(rest) = trimmed.strip_prefix("CAL_COEFF:") {
                        coeffs = rest.split_whitespace().filter_map(|t| t.parse().ok()).collect();
                    } else if let Ok(v) = trimmed.parse::<f64>() {
                        counts.push(v);
                    }
                    line.clear();
                }
                r.gps = Some(GpsFix { latitude: lat, longitude: lon, position_time: None });
                let n = counts.len();
                r.gamma_counts = Some(counts);
                r.energy_calibration = Some(EnergyCalibration::polynomial(coeffs, n).shared());
            }
            SpcVariant::BinaryInt | SpcVariant::BinaryFloat => {
                r.real_time = input.read_f64::<LittleEndian>()?;
                r.live_time = input.read_f64::<LittleEndian>()?;
                let lat = input.read_f64::<LittleEndian>()?;
                let lon = input.read_f64::<LittleEndian>()?;
                r.gps = Some(GpsFix { latitude: lat, longitude: lon, position_time: None });

                let num_coeffs = input.read_u32::<LittleEndian>()? as usize;
                let mut coeffs = Vec::with_capacity(num_coeffs);
                for _ in 0..num_coeffs {
                    coeffs.push(input.read_f64::<LittleEndian>()?);
                }
                let num_channels = input.read_u32::<LittleEndian>()? as usize;
                let mut counts = Vec::with_capacity(num_channels);
                for _ in 0..num_channels {
                    let v = if self.0 == SpcVariant::BinaryInt {
                        input.read_i32::<LittleEndian>()? as f64
                    } else {
                        input.read_f32::<LittleEndian>()? as f64
                    };
                    counts.push(v);
                }
                r.gamma_counts = Some(counts);
                r.energy_calibration = Some(EnergyCalibration::polynomial(coeffs, num_channels).shared());
            }
        }

        let mut spec = SpecFile::new();
        spec.push_record(r);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let mut r = Record::new(1, "A");
        r.real_time = 100.0;
        r.live_time = 95.0;
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        r.gps = Some(GpsFix { latitude: 1.5, longitude: -2.5, position_time: None });
        r
    }

    #[test]
    fn binary_int_round_trips() {
        let mut spec = SpecFile::new();
        spec.push_record(sample_record());
        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        SpcCodec(SpcVariant::BinaryInt).write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = SpcCodec(SpcVariant::BinaryInt).read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(parsed.records()[0].gps.unwrap().latitude, 1.5);
    }

    #[test]
    fn ascii_round_trips() {
        let mut spec = SpecFile::new();
        spec.push_record(sample_record());
        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        SpcCodec(SpcVariant::Ascii).write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = SpcCodec(SpcVariant::Ascii).read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
    }
}

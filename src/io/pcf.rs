//! PCF: a binary multi-record format. Titles are truncated to 60 characters
//! on write (spec.md §4.6, §6 "PCF titles are truncated to 60 characters").
//!
//! Record layout (little-endian): `detector_number: i32`, `sample_number:
//! i32`, `real_time: f64`, `live_time: f64`, `title_len: u8`, `title` bytes,
//! `num_channels: u32`, calibration model tag `u8` + `num_coeffs: u32` +
//! coefficients (`f64` each), then `num_channels` channel counts (`f32`
//! each, matching the historical PCF single-precision channel storage).

use std::collections::HashSet;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{CalibrationModel, EnergyCalibration, Record, SpecFile};

use super::traits::{SpecFileReader, SpecFileWriter};

const TITLE_LIMIT: usize = 60;

fn model_tag(model: CalibrationModel) -> u8 {
    match model {
        CalibrationModel::Polynomial => 0,
        CalibrationModel::FullRangeFraction => 1,
        CalibrationModel::LowerChannelEdge => 2,
        CalibrationModel::Invalid => 255,
    }
}

fn tag_model(tag: u8) -> CalibrationModel {
    match tag {
        0 => CalibrationModel::Polynomial,
        1 => CalibrationModel::FullRangeFraction,
        2 => CalibrationModel::LowerChannelEdge,
        _ => CalibrationModel::Invalid,
    }
}

pub struct PcfCodec;

impl SpecFileWriter for PcfCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        for r in spec.records() {
            if !samples.contains(&r.sample_number) || !detectors.contains(&r.detector_name) {
                continue;
            }
            out.write_i32::<LittleEndian>(r.detector_number)?;
            out.write_i32::<LittleEndian>(r.sample_number)?;
            out.write_f64::<LittleEndian>(r.real_time)?;
            out.write_f64::<LittleEndian>(r.live_time)?;

            let title: String = r.title.chars().take(TITLE_LIMIT).collect();
            out.write_u8(title.len() as u8)?;
            out.write_all(title.as_bytes())?;

            let counts = r.gamma_counts.as_deref().unwrap_or(&[]);
            out.write_u32::<LittleEndian>(counts.len() as u32)?;

            match &r.energy_calibration {
                Some(cal) => {
                    out.write_u8(model_tag(cal.model))?;
                    out.write_u32::<LittleEndian>(cal.coefficients.len() as u32)?;
                    for c in &cal.coefficients {
                        out.write_f64::<LittleEndian>(*c)?;
                    }
                }
                None => {
                    out.write_u8(model_tag(CalibrationModel::Invalid))?;
                    out.write_u32::<LittleEndian>(0)?;
                }
            }
            for c in counts {
                out.write_f32::<LittleEndian>(*c as f32)?;
            }
        }
        Ok(())
    }
}

impl SpecFileReader for PcfCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let mut spec = SpecFile::new();
        loop {
            let detector_number = match input.read_i32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(ParseError::Io(e)),
            };
            let sample_number = input.read_i32::<LittleEndian>()?;
            let real_time = input.read_f64::<LittleEndian>()?;
            let live_time = input.read_f64::<LittleEndian>()?;

            let title_len = input.read_u8()? as usize;
            let mut title_buf = vec![0u8; title_len];
            input.read_exact(&mut title_buf)?;
            let title = String::from_utf8_lossy(&title_buf).to_string();

            let num_channels = input.read_u32::<LittleEndian>()? as usize;

            let model_byte = input.read_u8()?;
            let model = tag_model(model_byte);
            let num_coeffs = input.read_u32::<LittleEndian>()? as usize;
            let mut coefficients = Vec::with_capacity(num_coeffs);
            for _ in 0..num_coeffs {
                coefficients.push(input.read_f64::<LittleEndian>()?);
            }

            let mut counts = Vec::with_capacity(num_channels);
            for _ in 0..num_channels {
                counts.push(input.read_f32::<LittleEndian>()? as f64);
            }

            let mut r = Record::new(sample_number, String::new());
            r.detector_number = detector_number;
            r.detector_name = format!("det{}", detector_number);
            r.real_time = real_time;
            r.live_time = live_time;
            r.title = title;
            r.gamma_counts = Some(counts);
            r.energy_calibration = Some(match model {
                CalibrationModel::Polynomial => EnergyCalibration::polynomial(coefficients, num_channels),
                CalibrationModel::FullRangeFraction => {
                    EnergyCalibration::full_range_fraction(coefficients, num_channels)
                }
                CalibrationModel::LowerChannelEdge => EnergyCalibration::lower_channel_edge(coefficients),
                CalibrationModel::Invalid => EnergyCalibration::invalid(),
            }.shared());

            spec.push_record(r);
        }

        if spec.records().is_empty() {
            return Err(ParseError::UnrecognizedFormat);
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_titles_to_60_chars() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.title = "x".repeat(200);
        r.gamma_counts = Some(vec![1.0, 2.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        PcfCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = PcfCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].title.len(), 60);
    }

    #[test]
    fn round_trips_channel_counts() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        PcfCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = PcfCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
    }
}

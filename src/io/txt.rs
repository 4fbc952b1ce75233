//! Human-readable multi-record text format (spec.md §4.6 `Txt`).
//!
//! One block per emitted record:
//! ```text
//! Sample: <n> Detector: <name>
//! LiveTime: <s> RealTime: <s>
//! Title: <title>
//! Remark: <remark>            (repeated, zero or more)
//! Calibration: <model> <c0> <c1> ...
//! Channel data: <n0> <n1> ...
//! ```

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{CalibrationModel, EnergyCalibration, Record, SpecFile};

use super::traits::{SpecFileReader, SpecFileWriter};

pub struct TxtCodec;

impl SpecFileWriter for TxtCodec {
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
            writeln!(out, "Sample: {} Detector: {}", r.sample_number, r.detector_name)?;
            writeln!(out, "LiveTime: {} RealTime: {}", r.live_time, r.real_time)?;
            writeln!(out, "Title: {}", r.title)?;
            for remark in &r.remarks {
                writeln!(out, "Remark: {}", remark)?;
            }
            if let Some(cal) = &r.energy_calibration {
                let model = match cal.model {
                    CalibrationModel::Polynomial => "Polynomial",
                    CalibrationModel::FullRangeFraction => "FullRangeFraction",
                    CalibrationModel::LowerChannelEdge => "LowerChannelEdge",
                    CalibrationModel::Invalid => "Invalid",
                };
                let coeffs = cal
                    .coefficients
                    .iter()
                    .map(f64::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(out, "Calibration: {} {}", model, coeffs)?;
            }
            if let Some(counts) = &r.gamma_counts {
                let line = counts.iter().map(f64::to_string).collect::<Vec<_>>().join(" ");
                writeln!(out, "Channel data: {}", line)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl SpecFileReader for TxtCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let reader = BufReader::new(input);
        let mut spec = SpecFile::new();
        let mut cur: Option<Record> = None;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                if let Some(r) = cur.take() {
                    spec.push_record(r);
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix("Sample:") {
                if let Some(r) = cur.take() {
                    spec.push_record(r);
                }
                let mut sample = 0;
                let mut detector = String::new();
                let mut parts = rest.split("Detector:");
                if let Some(s) = parts.next() {
                    sample = s.trim().parse().unwrap_or(0);
                }
                if let Some(d) = parts.next() {
                    detector = d.trim().to_string();
                }
                cur = Some(Record::new(sample, detector));
            } else if let Some(rest) = line.strip_prefix("LiveTime:") {
                if let Some(r) = cur.as_mut() {
                    let mut parts = rest.split("RealTime:");
                    if let Some(lt) = parts.next() {
                        r.live_time = lt.trim().parse().unwrap_or(0.0);
                    }
                    if let Some(rt) = parts.next() {
                        r.real_time = rt.trim().parse().unwrap_or(0.0);
                    }
                }
            } else if let Some(rest) = line.strip_prefix("Title:") {
                if let Some(r) = cur.as_mut() {
                    r.title = rest.trim().to_string();
                }
            } else if let Some(rest) = line.strip_prefix("Remark:") {
                if let Some(r) = cur.as_mut() {
                    r.remarks.push(rest.trim().to_string());
                }
            } else if let Some(rest) = line.strip_prefix("Calibration:") {
                if let Some(r) = cur.as_mut() {
                    let mut toks = rest.split_whitespace();
                    let model = toks.next().unwrap_or("Invalid");
                    let coeffs: Vec<f64> = toks.filter_map(|t| t.parse().ok()).collect();
                    let n = r.gamma_counts.as_ref().map(|c| c.len()).unwrap_or(coeffs.len());
                    r.energy_calibration = Some(
                        match model {
                            "Polynomial" => EnergyCalibration::polynomial(coeffs, n),
                            "FullRangeFraction" => EnergyCalibration::full_range_fraction(coeffs, n),
                            "LowerChannelEdge" => EnergyCalibration::lower_channel_edge(coeffs),
                            _ => EnergyCalibration::invalid(),
                        }
                        .shared(),
                    );
                }
            } else if let Some(rest) = line.strip_prefix("Channel data:") {
                if let Some(r) = cur.as_mut() {
                    let counts: Vec<f64> = rest
                        .split_whitespace()
                        .map(|t| {
                            t.parse::<f64>().map_err(|_| ParseError::Malformed {
                                format: "Txt",
                                message: "non-numeric channel datum".into(),
                            })
                        })
                        .collect::<Result<Vec<f64>, ParseError>>()?;
                    r.gamma_counts = Some(counts);
                }
            }
        }
        if let Some(r) = cur.take() {
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
    use std::collections::HashSet;

    #[test]
    fn round_trips_a_single_record() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "Aa1");
        r.title = "sample".to_string();
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["Aa1".to_string()]);
        TxtCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = TxtCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records().len(), 1);
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(parsed.records()[0].title, "sample");
    }
}

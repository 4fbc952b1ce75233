//! IAEA SPE: a text single-record format that preserves remarks and title
//! (spec.md §4.6 `SpeIaea`).

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{EnergyCalibration, Record, SpecFile};

use super::traits::{resolve_single_record, SpecFileReader, SpecFileWriter};

pub struct SpeCodec;

impl SpecFileWriter for SpeCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let r = resolve_single_record(spec, samples, detectors, "SpeIaea")?;
        writeln!(out, "$SPEC_ID:")?;
        writeln!(out, "{}", r.title)?;
        for remark in &r.remarks {
            writeln!(out, "{}", remark)?;
        }
        writeln!(out, "$MEAS_TIM:")?;
        writeln!(out, "{} {}", r.live_time, r.real_time)?;
        let counts = r.gamma_counts.as_deref().unwrap_or(&[]);
        writeln!(out, "$DATA:")?;
        writeln!(out, "0 {}", counts.len().saturating_sub(1))?;
        for c in counts {
            writeln!(out, "{}", c)?;
        }
        if let Some(cal) = &r.energy_calibration {
            writeln!(out, "$ENER_FIT:")?;
            writeln!(
                out,
                "{}",
                cal.coefficients.iter().map(f64::to_string).collect::<Vec<_>>().join(" ")
            )?;
        }
        Ok(())
    }
}

impl SpecFileReader for SpeCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let reader = BufReader::new(input);
        let mut r = Record::new(1, "spe");
        let mut counts = Vec::new();
        let mut coeffs = vec![0.0, 1.0];
        let mut section = String::new();

        for line in reader.lines() {
            let line = line?;
            if let Some(tag) = line.strip_prefix('$') {
                section = tag.trim_end_matches(':').to_string();
                continue;
            }
            match section.as_str() {
                "SPEC_ID" => {
                    if r.title.is_empty() {
                        r.title = line.clone();
                    } else {
                        r.remarks.push(line.clone());
                    }
                }
                "MEAS_TIM" => {
                    let mut toks = line.split_whitespace();
                    r.live_time = toks.next().and_then(|t| t.parse().ok()).unwrap_or(0.0);
                    r.real_time = toks.next().and_then(|t| t.parse().ok()).unwrap_or(0.0);
                }
                "DATA" => {
                    if let Ok(v) = line.trim().parse::<f64>() {
                        counts.push(v);
                    }
                }
                "ENER_FIT" => {
                    coeffs = line.split_whitespace().filter_map(|t| t.parse().ok()).collect();
                }
                _ => {}
            }
        }

        let n = counts.len();
        r.gamma_counts = Some(counts);
        r.energy_calibration = Some(EnergyCalibration::polynomial(coeffs, n).shared());

        let mut spec = SpecFile::new();
        spec.push_record(r);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_title_and_remarks() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.title = "calibration check".to_string();
        r.remarks = vec!["note one".to_string()];
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        SpeCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = SpeCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].title, "calibration check");
        assert_eq!(parsed.records()[0].remarks, vec!["note one".to_string()]);
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
    }
}

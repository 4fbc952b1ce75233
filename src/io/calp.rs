//! CALp sidecar: a plain-text energy-calibration-only format (spec.md §6).
//!
//! One block per detector, each block a `Detector: <name>` header line
//! (omitted when the file describes exactly one gamma detector) followed by
//! `Equation: Polynomial|FullRangeFraction|LowerChannelEdge` and a
//! `Coefficients: c0 c1 ...` line. Blocks are separated by blank lines.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::spectrum::{CalibrationModel, EnergyCalibration};

#[derive(Debug, Clone, Default)]
pub struct CalpDocument {
    pub by_detector: IndexMap<String, EnergyCalibration>,
    pub default: Option<EnergyCalibration>,
}

pub fn parse_calp(text: &str) -> Result<CalpDocument, ParseError> {
    let mut doc = CalpDocument::default();
    let mut cur_name: Option<String> = None;
    let mut cur_model: Option<CalibrationModel> = None;
    let mut cur_coeffs: Option<Vec<f64>> = None;
    let mut cur_channels: usize = 0;

    let flush = |doc: &mut CalpDocument,
                 name: Option<String>,
                 model: Option<CalibrationModel>,
                 coeffs: Option<Vec<f64>>,
                 channels: usize| {
        let (Some(model), Some(coeffs)) = (model, coeffs) else {
            return;
        };
        let cal = match model {
            CalibrationModel::Polynomial => EnergyCalibration::polynomial(coeffs, channels),
            CalibrationModel::FullRangeFraction => {
                EnergyCalibration::full_range_fraction(coeffs, channels)
            }
            CalibrationModel::LowerChannelEdge => EnergyCalibration::lower_channel_edge(coeffs),
            CalibrationModel::Invalid => return,
        };
        match name {
            Some(n) => {
                doc.by_detector.insert(n, cal);
            }
            None => doc.default = Some(cal),
        }
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut doc, cur_name.take(), cur_model.take(), cur_coeffs.take(), cur_channels);
            cur_channels = 0;
            continue;
        }
        if let Some(rest) = line.strip_prefix("Detector:") {
            cur_name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Equation:") {
            cur_model = Some(match rest.trim() {
                "Polynomial" => CalibrationModel::Polynomial,
                "FullRangeFraction" => CalibrationModel::FullRangeFraction,
                "LowerChannelEdge" => CalibrationModel::LowerChannelEdge,
                other => {
                    return Err(ParseError::Malformed {
                        format: "CALp",
                        message: format!("unrecognized equation type '{}'", other),
                    })
                }
            });
        } else if let Some(rest) = line.strip_prefix("Channels:") {
            cur_channels = rest.trim().parse().map_err(|_| ParseError::Malformed {
                format: "CALp",
                message: "non-numeric channel count".into(),
            })?;
        } else if let Some(rest) = line.strip_prefix("Coefficients:") {
            cur_coeffs = Some(
                rest.split_whitespace()
                    .map(|tok| {
                        tok.parse::<f64>().map_err(|_| ParseError::Malformed {
                            format: "CALp",
                            message: "non-numeric coefficient".into(),
                        })
                    })
                    .collect::<Result<Vec<f64>, ParseError>>()?,
            );
        } else {
            return Err(ParseError::Malformed {
                format: "CALp",
                message: format!("unrecognized line '{}'", line),
            });
        }
    }
    flush(&mut doc, cur_name.take(), cur_model.take(), cur_coeffs.take(), cur_channels);

    Ok(doc)
}

/// Serializes a single detector's calibration, omitting the `Detector:` key
/// when `name` is `None` (exactly one gamma detector in the source file).
pub fn write_calp_block(out: &mut String, name: Option<&str>, cal: &EnergyCalibration) {
    if let Some(name) = name {
        let _ = writeln!(out, "Detector: {}", name);
    }
    let model = match cal.model {
        CalibrationModel::Polynomial => "Polynomial",
        CalibrationModel::FullRangeFraction => "FullRangeFraction",
        CalibrationModel::LowerChannelEdge => "LowerChannelEdge",
        CalibrationModel::Invalid => "Polynomial",
    };
    let _ = writeln!(out, "Equation: {}", model);
    let _ = writeln!(out, "Channels: {}", cal.num_channels);
    let coeffs = cal
        .coefficients
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "Coefficients: {}", coeffs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_without_detector_key_becomes_default() {
        let text = "Equation: Polynomial\nChannels: 1024\nCoefficients: 0.0 3.0\n";
        let doc = parse_calp(text).unwrap();
        assert!(doc.by_detector.is_empty());
        assert_eq!(doc.default.unwrap().coefficients, vec![0.0, 3.0]);
    }

    #[test]
    fn multiple_blocks_key_by_detector_name() {
        let text = "Detector: Aa1\nEquation: Polynomial\nChannels: 16\nCoefficients: 0.0 1.0\n\nDetector: Ba1\nEquation: Polynomial\nChannels: 16\nCoefficients: 0.0 2.0\n";
        let doc = parse_calp(text).unwrap();
        assert_eq!(doc.by_detector.len(), 2);
        assert_eq!(doc.by_detector["Ba1"].coefficients, vec![0.0, 2.0]);
    }

    #[test]
    fn round_trips_through_write_and_parse() {
        let cal = EnergyCalibration::polynomial(vec![0.0, 3.0], 16);
        let mut out = String::new();
        write_calp_block(&mut out, Some("Aa1"), &cal);
        let doc = parse_calp(&out).unwrap();
        assert_eq!(doc.by_detector["Aa1"].coefficients, cal.coefficients);
    }
}

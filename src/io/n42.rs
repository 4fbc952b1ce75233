//! N42.42 XML family (spec.md §4.6 `N42_2006` / `N42_2012`).
//!
//! 2012 is "nearly lossless": every [`Record`] field this crate models maps
//! to an element. 2006 uses the older, flatter `<Measurement>` layout and
//! drops neutron per-tube detail and GPS (spec.md's "lossy for some newer
//! fields").

use std::collections::HashSet;
use std::io::{Read, Write};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{CalibrationModel, EnergyCalibration, NeutronData, Record, SpecFile};

use super::traits::{SpecFileReader, SpecFileWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum N42Version {
    V2006,
    V2012,
}

pub struct N42Codec(pub N42Version);

fn write_elem(w: &mut Writer<&mut Vec<u8>>, tag: &str, text: &str) -> Result<(), WriteError> {
    w.write_event(Event::Start(BytesStart::new(tag)))
        .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;
    w.write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;
    Ok(())
}

impl SpecFileWriter for N42Codec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let mut buf = Vec::new();
        let mut w = Writer::new_with_indent(&mut buf, b' ', 2);

        let root_tag = match self.0 {
            N42Version::V2006 => "N42InstrumentData",
            N42Version::V2012 => "RadInstrumentData",
        };
        w.write_event(Event::Start(BytesStart::new(root_tag)))
            .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;

        if !spec.instrument_type.is_empty() {
            write_elem(&mut w, "InstrumentType", &spec.instrument_type)?;
        }
        if !spec.manufacturer.is_empty() {
            write_elem(&mut w, "Manufacturer", &spec.manufacturer)?;
        }
        if !spec.instrument_model.is_empty() {
            write_elem(&mut w, "InstrumentModel", &spec.instrument_model)?;
        }

        for r in spec.records() {
            if !samples.contains(&r.sample_number) || !detectors.contains(&r.detector_name) {
                continue;
            }
            w.write_event(Event::Start(BytesStart::new("Measurement")))
                .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;
            write_elem(&mut w, "DetectorName", &r.detector_name)?;
            write_elem(&mut w, "SampleNumber", &r.sample_number.to_string())?;
            write_elem(&mut w, "RealTime", &r.real_time.to_string())?;
            write_elem(&mut w, "LiveTime", &r.live_time.to_string())?;
            write_elem(&mut w, "Title", &r.title)?;

            if let Some(cal) = &r.energy_calibration {
                let model = match cal.model {
                    CalibrationModel::Polynomial => "Polynomial",
                    CalibrationModel::FullRangeFraction => "FullRangeFraction",
                    CalibrationModel::LowerChannelEdge => "LowerChannelEdge",
                    CalibrationModel::Invalid => "Invalid",
                };
                write_elem(&mut w, "CalibrationModel", model)?;
                let coeffs = cal.coefficients.iter().map(f64::to_string).collect::<Vec<_>>().join(" ");
                write_elem(&mut w, "CoefficientValues", &coeffs)?;
            }
            if let Some(counts) = &r.gamma_counts {
                let line = counts.iter().map(f64::to_string).collect::<Vec<_>>().join(" ");
                write_elem(&mut w, "ChannelData", &line)?;
            }
            if self.0 == N42Version::V2012 {
                if let Some(neutrons) = &r.neutrons {
                    write_elem(&mut w, "NeutronCounts", &neutrons.counts.to_string())?;
                }
                if let Some(gps) = &r.gps {
                    write_elem(&mut w, "Latitude", &gps.latitude.to_string())?;
                    write_elem(&mut w, "Longitude", &gps.longitude.to_string())?;
                }
            }
            for remark in &r.remarks {
                write_elem(&mut w, "Remark", remark)?;
            }
            w.write_event(Event::End(BytesEnd::new("Measurement")))
                .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;
        }

        w.write_event(Event::End(BytesEnd::new(root_tag)))
            .map_err(|e| WriteError::Encoding { format: "N42", message: e.to_string() })?;
        out.write_all(&buf)?;
        Ok(())
    }
}

impl SpecFileReader for N42Codec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        let mut reader = Reader::from_str(&text);
        reader.config_mut().trim_text(true);

        let mut spec = SpecFile::new();
        let mut cur: Option<Record> = None;
        let mut cur_tag = String::new();
        let mut buf = Vec::new();
        let mut pending_model = CalibrationModel::Invalid;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "Measurement" {
                        cur = Some(Record::new(0, String::new()));
                    }
                    cur_tag = name;
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    if let Some(r) = cur.as_mut() {
                        match cur_tag.as_str() {
                            "DetectorName" => r.detector_name = text,
                            "SampleNumber" => r.sample_number = text.trim().parse().unwrap_or(0),
                            "RealTime" => r.real_time = text.trim().parse().unwrap_or(0.0),
                            "LiveTime" => r.live_time = text.trim().parse().unwrap_or(0.0),
                            "Title" => r.title = text,
                            "Remark" => r.remarks.push(text),
                            "CalibrationModel" => {
                                pending_model = match text.as_str() {
                                    "Polynomial" => CalibrationModel::Polynomial,
                                    "FullRangeFraction" => CalibrationModel::FullRangeFraction,
                                    "LowerChannelEdge" => CalibrationModel::LowerChannelEdge,
                                    _ => CalibrationModel::Invalid,
                                };
                            }
                            "CoefficientValues" => {
                                let coeffs: Vec<f64> = text
                                    .split_whitespace()
                                    .filter_map(|t| t.parse().ok())
                                    .collect();
                                let n = r.gamma_counts.as_ref().map(|c| c.len()).unwrap_or(coeffs.len());
                                r.energy_calibration = Some(
                                    match pending_model {
                                        CalibrationModel::Polynomial => {
                                            EnergyCalibration::polynomial(coeffs, n)
                                        }
                                        CalibrationModel::FullRangeFraction => {
                                            EnergyCalibration::full_range_fraction(coeffs, n)
                                        }
                                        CalibrationModel::LowerChannelEdge => {
                                            EnergyCalibration::lower_channel_edge(coeffs)
                                        }
                                        CalibrationModel::Invalid => EnergyCalibration::invalid(),
                                    }
                                    .shared(),
                                );
                            }
                            "ChannelData" => {
                                let counts: Vec<f64> =
                                    text.split_whitespace().filter_map(|t| t.parse().ok()).collect();
                                r.gamma_counts = Some(counts);
                            }
                            "NeutronCounts" => {
                                r.neutrons = Some(NeutronData {
                                    counts: text.trim().parse().unwrap_or(0.0),
                                    per_tube: None,
                                    contained: true,
                                });
                            }
                            _ => {}
                        }
                    }
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "Measurement" {
                        if let Some(r) = cur.take() {
                            spec.push_record(r);
                        }
                    }
                }
                _ => {}
            }
            buf.clear();
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
    fn round_trips_2012_through_write_and_parse() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "Aa1");
        r.title = "measurement".to_string();
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["Aa1".to_string()]);
        N42Codec(N42Version::V2012).write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = N42Codec(N42Version::V2012).read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(parsed.records()[0].title, "measurement");
    }
}

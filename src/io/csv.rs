//! CSV format: channel-edge/count pairs, one record's table per block,
//! separated by a blank line. All metadata besides the channel data and the
//! energy calibration used to derive the edges is lost (spec.md §4.6 `Csv`).

use std::collections::HashSet;
use std::io::{Read, Write};

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{EnergyCalibration, Record, SpecFile};

use super::traits::{SpecFileReader, SpecFileWriter};

pub struct CsvCodec;

impl SpecFileWriter for CsvCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let mut wtr = WriterBuilder::new().from_writer(Vec::new());
        for r in spec.records() {
            if !samples.contains(&r.sample_number) || !detectors.contains(&r.detector_name) {
                continue;
            }
            let edges = r
                .energy_calibration
                .as_ref()
                .map(|c| c.channel_edges())
                .unwrap_or_default();
            let counts = r.gamma_counts.as_deref().unwrap_or(&[]);
            wtr.write_record(["Energy (keV)", "Counts"])
                .map_err(|e| WriteError::Encoding {
                    format: "Csv",
                    message: e.to_string(),
                })?;
            for (i, count) in counts.iter().enumerate() {
                let edge = edges.get(i).copied().unwrap_or(i as f64);
                wtr.write_record([edge.to_string(), count.to_string()])
                    .map_err(|e| WriteError::Encoding {
                        format: "Csv",
                        message: e.to_string(),
                    })?;
            }
        }
        let bytes = wtr.into_inner().map_err(|e| WriteError::Encoding {
            format: "Csv",
            message: e.to_string(),
        })?;
        out.write_all(&bytes)?;
        Ok(())
    }
}

impl SpecFileReader for CsvCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let mut edges = Vec::new();
        let mut counts = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(|e| ParseError::Malformed {
                format: "Csv",
                message: e.to_string(),
            })?;
            if row.len() < 2 {
                continue;
            }
            let (Ok(edge), Ok(count)) = (row[0].parse::<f64>(), row[1].parse::<f64>()) else {
                continue;
            };
            edges.push(edge);
            counts.push(count);
        }
        if counts.is_empty() {
            return Err(ParseError::UnrecognizedFormat);
        }

        let mut r = Record::new(1, "csv");
        let n = counts.len();
        r.gamma_counts = Some(counts);
        edges.push(edges.last().copied().unwrap_or(0.0) + 1.0);
        r.energy_calibration = Some(EnergyCalibration::lower_channel_edge(edges[..n].to_vec()).shared());

        let mut spec = SpecFile::new();
        spec.push_record(r);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_channel_data() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0, 2.0, 3.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 3).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        CsvCodec.write(&mut buf, &spec, &samples, &dets).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = CsvCodec.read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].gamma_counts, Some(vec![1.0, 2.0, 3.0]));
    }
}

//! Exploranium GR130/GR135 binary multi-record formats. Output is rebinned
//! to the detector's fixed channel count: 256 for GR130, 1024 for GR135
//! (spec.md §4.6, §6 "GR130 output is 256 channels; GR135 output is 1024
//! channels. Non-matching inputs are rebinned by the writer.").

use std::collections::HashSet;
use std::io::{Read, Write};
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ParseError, WriteError};
use crate::spectrum::rebin::rebin_counts;
use crate::spectrum::{EnergyCalibration, Record, SpecFile};

use super::traits::{SpecFileReader, SpecFileWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploraniumModel {
    Gr130v0,
    Gr135v2,
}

impl ExploraniumModel {
    fn channels(self) -> usize {
        match self {
            ExploraniumModel::Gr130v0 => 256,
            ExploraniumModel::Gr135v2 => 1024,
        }
    }
}

pub struct ExploraniumCodec(pub ExploraniumModel);

impl SpecFileWriter for ExploraniumCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let target = self.0.channels();
        for r in spec.records() {
            if !samples.contains(&r.sample_number) || !detectors.contains(&r.detector_name) {
                continue;
            }
            let Some(counts) = &r.gamma_counts else { continue };
            let rebinned = if counts.len() == target {
                counts.clone()
            } else if let Some(cal) = &r.energy_calibration {
                let old_edges = cal.channel_edges();
                let new_cal = EnergyCalibration::full_range_fraction(
                    vec![old_edges[0], old_edges[old_edges.len() - 1] - old_edges[0]],
                    target,
                );
                rebin_counts(&old_edges, counts, &new_cal.channel_edges())
            } else {
                let mut v = counts.clone();
                v.resize(target, 0.0);
                v
            };

            out.write_i32::<LittleEndian>(r.sample_number)?;
            out.write_f64::<LittleEndian>(r.live_time)?;
            for c in &rebinned {
                out.write_u32::<LittleEndian>(*c as u32)?;
            }
        }
        Ok(())
    }
}

impl SpecFileReader for ExploraniumCodec {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError> {
        let channels = self.0.channels();
        let mut spec = SpecFile::new();
        loop {
            let sample_number = match input.read_i32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(ParseError::Io(e)),
            };
            let live_time = input.read_f64::<LittleEndian>()?;
            let mut counts = Vec::with_capacity(channels);
            for _ in 0..channels {
                counts.push(input.read_u32::<LittleEndian>()? as f64);
            }
            let mut r = Record::new(sample_number, "exploranium");
            r.live_time = live_time;
            r.real_time = live_time;
            r.gamma_counts = Some(counts);
            r.energy_calibration =
                Some(Rc::new(EnergyCalibration::polynomial(vec![0.0, 1.0], channels)));
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
    fn writer_rebins_non_matching_channel_counts() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0; 2048]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2048).shared());
        spec.push_record(r);

        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        ExploraniumCodec(ExploraniumModel::Gr130v0)
            .write(&mut buf, &spec, &samples, &dets)
            .unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let parsed = ExploraniumCodec(ExploraniumModel::Gr130v0).read(&mut cursor).unwrap();
        assert_eq!(parsed.records()[0].num_gamma_channels(), Some(256));
    }
}

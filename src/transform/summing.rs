//! Pipeline step 5 (sum-all) and step 11 (sum-det-per-sample /
//! sum-samples-per-det), spec.md §4.2.
//!
//! Mutual exclusion of the two step-11 modes is a CLI-level `UsageError`
//! (exit code 36); this module takes a single enum so the pipeline driver
//! can't construct the nonsensical "both" state at all.

use std::collections::HashSet;

use itertools::Itertools;
use log::warn;

use crate::spectrum::{DerivedDataProperties, SourceType, SpecFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerSampleOrPerDetector {
    SumDetPerSample,
    SumSamplesPerDet,
}

/// Step 5: collapse the whole file to a single summed record.
pub fn apply_sum_all(spec: &mut SpecFile) {
    let samples: HashSet<i32> = spec.sample_numbers().iter().copied().collect();
    let detectors: HashSet<String> = spec.detector_names().iter().cloned().collect();
    if samples.is_empty() {
        return;
    }
    match spec.sum_measurements(&samples, &detectors) {
        Ok(mut summed) => {
            summed.sample_number = 1;
            summed.detector_name = "summed".to_string();
            summed.title = resolve_title(spec);
            summed.derived_data_properties |= DerivedDataProperties::GAMMA_SUMMED;
            spec.records_mut().clear();
            spec.push_record(summed);
        }
        Err(e) => warn!("sum-all requested but could not be performed: {}", e),
    }
}

/// Step 11.
pub fn apply_per_sample_or_per_detector(spec: &mut SpecFile, mode: PerSampleOrPerDetector) {
    match mode {
        PerSampleOrPerDetector::SumDetPerSample => sum_det_per_sample(spec),
        PerSampleOrPerDetector::SumSamplesPerDet => sum_samples_per_det(spec),
    }
}

fn sum_det_per_sample(spec: &mut SpecFile) {
    let detectors: HashSet<String> = spec.detector_names().iter().cloned().collect();
    let samples: Vec<i32> = spec.sample_numbers().to_vec();

    let mut out = Vec::with_capacity(samples.len());
    for sample in samples {
        let one = HashSet::from([sample]);
        match spec.sum_measurements(&one, &detectors) {
            Ok(mut summed) => {
                summed.sample_number = sample;
                summed.detector_name = "summed".to_string();
                summed.title = title_for_sample(spec, sample);
                summed.derived_data_properties |= DerivedDataProperties::GAMMA_SUMMED;
                out.push(summed);
            }
            Err(e) => warn!(
                "sample {} has no contributor with a valid gamma calibration, omitting: {}",
                sample, e
            ),
        }
    }
    *spec.records_mut() = out;
}

fn sum_samples_per_det(spec: &mut SpecFile) {
    let samples: HashSet<i32> = spec.sample_numbers().iter().copied().collect();
    let detectors: Vec<String> = spec.detector_names().to_vec();

    let mut out = Vec::with_capacity(detectors.len());
    for detector in detectors {
        let one = HashSet::from([detector.clone()]);
        match spec.sum_measurements(&samples, &one) {
            Ok(mut summed) => {
                summed.sample_number = 1;
                summed.detector_name = detector;
                summed.derived_data_properties |= DerivedDataProperties::GAMMA_SUMMED;
                out.push(summed);
            }
            Err(_) => warn!(
                "detector '{}' has no valid gamma-calibrated record across any sample, omitting",
                detector
            ),
        }
    }
    *spec.records_mut() = out;
}

fn resolve_title(spec: &SpecFile) -> String {
    title_for_records(spec.records().iter())
}

fn title_for_sample(spec: &SpecFile, sample: i32) -> String {
    title_for_records(spec.records().iter().filter(|r| r.sample_number == sample))
}

fn title_for_records<'a>(records: impl Iterator<Item = &'a crate::spectrum::Record>) -> String {
    let records: Vec<_> = records.collect();
    if records.is_empty() {
        return String::new();
    }
    if records.iter().map(|r| &r.title).all_equal() {
        return records[0].title.clone();
    }
    if records.iter().all(|r| r.source_type == SourceType::Background) {
        return "Background".to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, EnergyCalibration, Record};

    fn rec(sample: i32, det: &str, title: &str) -> Record {
        let mut r = Record::new(sample, det);
        r.gamma_counts = Some(vec![1.0; 16]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 16).shared());
        r.title = title.to_string();
        r
    }

    #[test]
    fn sum_all_collapses_to_one_record() {
        let mut spec = SpecFile::new();
        spec.push_record(rec(1, "A", "x"));
        spec.push_record(rec(1, "B", "x"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_sum_all(&mut spec);
        assert_eq!(spec.records().len(), 1);
        assert_eq!(spec.records()[0].title, "x");
        assert_eq!(spec.records()[0].gamma_sum(), 32.0);
    }

    #[test]
    fn sum_det_per_sample_emits_one_record_per_sample() {
        let mut spec = SpecFile::new();
        spec.push_record(rec(1, "A", "x"));
        spec.push_record(rec(1, "B", "y"));
        spec.push_record(rec(2, "A", "x"));
        spec.push_record(rec(2, "B", "x"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_per_sample_or_per_detector(&mut spec, PerSampleOrPerDetector::SumDetPerSample);
        assert_eq!(spec.records().len(), 2);
        let by_sample: std::collections::HashMap<i32, &Record> =
            spec.records().iter().map(|r| (r.sample_number, r)).collect();
        assert_eq!(by_sample[&1].title, ""); // titles disagree, not all Background
        assert_eq!(by_sample[&2].title, "x");
    }

    #[test]
    fn sum_samples_per_det_emits_one_record_per_detector() {
        let mut spec = SpecFile::new();
        spec.push_record(rec(1, "A", "x"));
        spec.push_record(rec(2, "A", "x"));
        spec.push_record(rec(1, "B", "x"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_per_sample_or_per_detector(&mut spec, PerSampleOrPerDetector::SumSamplesPerDet);
        assert_eq!(spec.records().len(), 2);
        assert!(spec.records().iter().all(|r| r.sample_number == 1));
    }
}

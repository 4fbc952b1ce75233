//! The per-file transform pipeline driver (spec.md §4.2, §4.3): runs the
//! eleven record-set transforms in a fixed order, re-synchronizing derived
//! views after every step that alters the record set.

use indexmap::IndexMap;
use log::warn;

use crate::io::calp::CalpDocument;
use crate::spectrum::CleanupFlags;
use crate::spectrum::SpecFile;
use crate::transform::{
    self, PerSampleOrPerDetector, SourceTypeFilters,
};

/// Every option the pipeline's eleven steps read, gathered in one place so
/// `crate::cli` only has to build one of these per invocation.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub keep_all_calibration_variants: bool,

    pub exclude_detectors: Vec<String>,
    pub include_detectors: Vec<String>,

    pub source_type_filters: SourceTypeFilters,

    pub only_derived: bool,
    pub no_derived: bool,

    pub sum_all: bool,

    pub detector_renames: IndexMap<String, String>,

    pub normalize_n42_names: bool,
    pub dont_rename_detectors: Vec<String>,

    pub calp: Option<CalpDocument>,

    /// `2^(f-1)` channels are combined when `Some`.
    pub rebin_factor_exponent: Option<u32>,

    pub linearize: Option<(f64, f64)>,

    pub per_sample_or_per_detector: Option<PerSampleOrPerDetector>,
}

/// Runs a single input file through the eleven ordered steps of spec.md
/// §4.2, applying `cleanup_after_load(DontChangeOrReorderSamples)` and
/// clearing `uuid` after every step that can alter the record set. Returns
/// `false` when detector selection left nothing behind, in which case the
/// caller should drop this file from the run with a warning (spec.md §4.2
/// step 2).
pub fn run_pipeline(spec: &mut SpecFile, opts: &PipelineOptions) -> bool {
    let mut resync = |spec: &mut SpecFile| {
        spec.cleanup_after_load(CleanupFlags::DontChangeOrReorderSamples);
        spec.uuid.clear();
    };

    // 1. Energy-calibration variant selection.
    transform::select_energy_calibration_variant(spec, opts.keep_all_calibration_variants);
    resync(spec);

    // 2. Detector inclusion/exclusion.
    if !transform::select_detectors(spec, &opts.exclude_detectors, &opts.include_detectors) {
        return false;
    }
    resync(spec);

    // 3. Source-type filters.
    transform::apply_source_type_filters(spec, &opts.source_type_filters);
    resync(spec);

    // 4. Derived-data filter.
    transform::apply_derived_data_filter(spec, opts.only_derived, opts.no_derived);
    resync(spec);

    // 5. Sum-all.
    if opts.sum_all {
        transform::apply_sum_all(spec);
        resync(spec);
    }

    // 6. Detector renaming.
    if !opts.detector_renames.is_empty() {
        transform::apply_detector_renames(spec, &opts.detector_renames);
        resync(spec);
    }

    // 7. N42 name normalization.
    if opts.normalize_n42_names {
        transform::normalize_det_name_to_n42(spec, &opts.dont_rename_detectors);
        resync(spec);
    }

    // 8. CALp application.
    if let Some(doc) = &opts.calp {
        transform::apply_calp(spec, doc);
        resync(spec);
    }

    // 9. Channel rebinning.
    if let Some(exp) = opts.rebin_factor_exponent {
        transform::apply_channel_rebin(spec, exp);
        resync(spec);
    }

    // 10. Linearization.
    if let Some((lower, upper)) = opts.linearize {
        if upper <= lower {
            warn!("linearization requested with upper <= lower ({} <= {}); skipping", upper, lower);
        } else {
            transform::apply_linearization(spec, lower, upper);
            resync(spec);
        }
    }

    // 11. Sum-det-per-sample / sum-samples-per-det (mutually exclusive,
    // enforced as a CLI-level UsageError before the pipeline ever runs).
    if let Some(mode) = opts.per_sample_or_per_detector {
        transform::apply_per_sample_or_per_detector(spec, mode);
        resync(spec);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{EnergyCalibration, Record};

    #[test]
    fn empty_detector_selection_aborts_the_file() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0, 2.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
        spec.push_record(r);
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        let opts = PipelineOptions {
            exclude_detectors: vec!["A".to_string()],
            ..Default::default()
        };
        assert!(!run_pipeline(&mut spec, &opts));
    }

    #[test]
    fn sum_all_reduces_to_one_record_and_clears_uuid() {
        let mut spec = SpecFile::new();
        spec.uuid = "some-uuid".to_string();
        let mut a = Record::new(1, "A");
        a.gamma_counts = Some(vec![1.0, 2.0]);
        a.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
        let mut b = Record::new(1, "B");
        b.gamma_counts = Some(vec![1.0, 2.0]);
        b.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
        spec.push_record(a);
        spec.push_record(b);
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        let opts = PipelineOptions { sum_all: true, ..Default::default() };
        assert!(run_pipeline(&mut spec, &opts));
        assert_eq!(spec.records().len(), 1);
        assert_eq!(spec.uuid, "");
    }
}

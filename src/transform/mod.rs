//! The eleven ordered record-set transforms of spec.md §4.2.
//!
//! Each submodule is one numbered step; [`crate::pipeline`] sequences them
//! and runs `cleanup_after_load(DontChangeOrReorderSamples)` plus the `uuid`
//! reset after every step that alters the record set.

pub mod calibration_variant;
pub mod calp;
pub mod derived_filter;
pub mod detector_select;
pub mod linearize;
pub mod n42_naming;
pub mod rebin_step;
pub mod rename;
pub mod source_filter;
pub mod summing;

pub use calibration_variant::select_energy_calibration_variant;
pub use calp::apply_calp;
pub use derived_filter::apply_derived_data_filter;
pub use detector_select::select_detectors;
pub use linearize::apply_linearization;
pub use n42_naming::normalize_det_name_to_n42;
pub use rebin_step::apply_channel_rebin;
pub use rename::apply_detector_renames;
pub use source_filter::{apply_source_type_filters, SourceTypeFilters};
pub use summing::{apply_per_sample_or_per_detector, apply_sum_all, PerSampleOrPerDetector};

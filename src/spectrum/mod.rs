//! The in-memory spectrum data model (spec.md §3, §4.1): [`SpecFile`] is a
//! container of [`Record`]s, each optionally referencing a shared, immutable
//! [`EnergyCalibration`].

pub mod calibration;
pub mod detector_analysis;
mod file;
pub mod rebin;
pub mod record;
pub mod types;

pub use calibration::{CalibrationModel, EnergyCalibration};
pub use detector_analysis::DetectorAnalysis;
pub use file::SpecFile;
pub use record::{GpsFix, NeutronData, Record};
pub use types::{CleanupFlags, DerivedDataProperties, DetectorType, Occupancy, SourceType, SM_MIN_CHANNELS};

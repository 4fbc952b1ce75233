//! A single `(sample, detector)` measurement (spec.md §3 "Record").

use std::rc::Rc;

use chrono::{DateTime, Utc};

use super::calibration::EnergyCalibration;
use super::types::{DerivedDataProperties, Occupancy, SourceType, SM_MIN_CHANNELS};

/// GPS fix associated with a record. Latitude/longitude/time are jointly
/// valid or jointly absent (spec.md §3 `has_gps_info`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub position_time: Option<DateTime<Utc>>,
}

/// Neutron counts: a scalar sum, and optionally per-tube detail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeutronData {
    pub counts: f64,
    pub per_tube: Option<Vec<f64>>,
    /// Whether this neutron count was contained within (i.e. read out
    /// alongside) the gamma acquisition, as opposed to a separate record.
    pub contained: bool,
}

/// One measurement inside a [`crate::spectrum::SpecFile`]. Identity within a
/// file is the pair `(sample_number, detector_name)` (spec.md §3).
#[derive(Debug, Clone)]
pub struct Record {
    pub sample_number: i32,
    pub detector_name: String,
    pub detector_number: i32,

    pub start_time: Option<DateTime<Utc>>,
    pub real_time: f64,
    pub live_time: f64,

    pub source_type: SourceType,
    pub occupancy: Occupancy,

    pub title: String,
    pub remarks: Vec<String>,

    pub gamma_counts: Option<Vec<f64>>,
    pub energy_calibration: Option<Rc<EnergyCalibration>>,
    /// Name of the calibration variant this record's [`Self::energy_calibration`]
    /// was chosen from, for formats that expose more than one simultaneously
    /// (spec.md §4.2 step 1). `None` when the format only ever has one.
    pub calibration_variant: Option<String>,

    pub neutrons: Option<NeutronData>,

    pub gps: Option<GpsFix>,

    pub derived_data_properties: DerivedDataProperties,
}

impl Record {
    pub fn new(sample_number: i32, detector_name: impl Into<String>) -> Self {
        Self {
            sample_number,
            detector_name: detector_name.into(),
            detector_number: 0,
            start_time: None,
            real_time: 0.0,
            live_time: 0.0,
            source_type: SourceType::Unknown,
            occupancy: Occupancy::Unknown,
            title: String::new(),
            remarks: Vec::new(),
            gamma_counts: None,
            energy_calibration: None,
            calibration_variant: None,
            neutrons: None,
            gps: None,
            derived_data_properties: DerivedDataProperties::empty(),
        }
    }

    pub fn num_gamma_channels(&self) -> Option<usize> {
        self.gamma_counts.as_ref().map(|c| c.len())
    }

    pub fn gamma_sum(&self) -> f64 {
        self.gamma_counts
            .as_ref()
            .map(|c| c.iter().sum())
            .unwrap_or(0.0)
    }

    /// spec.md §3: "valid iff gamma_counts is present and it has >=
    /// sm_min_channels channels", further constrained by the calibration's
    /// own validity.
    pub fn has_valid_gamma_calibration(&self) -> bool {
        match (&self.gamma_counts, &self.energy_calibration) {
            (Some(counts), Some(cal)) => counts.len() >= SM_MIN_CHANNELS && cal.valid(),
            _ => false,
        }
    }

    /// spec.md invariant 1: `live_time <= real_time`, soft (logged as a
    /// warning by whoever inspects it, never an error).
    pub fn violates_time_ordering(&self) -> bool {
        self.live_time > self.real_time
    }

    pub fn has_gps_info(&self) -> bool {
        self.gps.is_some()
    }
}

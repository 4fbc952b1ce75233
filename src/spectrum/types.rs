//! Small enums and bitflags shared by [`crate::spectrum::Record`] and
//! [`crate::spectrum::SpecFile`].

use bitflags::bitflags;

/// What kind of acquisition a [`crate::spectrum::Record`] represents.
///
/// `Unknown` is a legitimate value: many vendor formats simply don't record
/// this, and the pipeline (spec.md §4.2 step 3) has a specific rule for
/// reinterpreting it as `Foreground` in single-sample files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceType {
    #[default]
    Unknown,
    IntrinsicActivity,
    Calibration,
    Background,
    Foreground,
}

/// Portal-monitor occupancy state, if the format records one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occupancy {
    #[default]
    Unknown,
    NotOccupied,
    Occupied,
}

/// Coarse detector hardware classification, used by a handful of formats to
/// pick vendor-specific quirks and by the `--set-model` CLI hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectorType {
    #[default]
    Unknown,
    NaI,
    HPGe,
    CsI,
    LaBr3,
    Other,
}

bitflags! {
    /// Which parts of a [`crate::spectrum::Record`] were synthesized by the
    /// detector itself (e.g. a pre-summed or background-subtracted channel)
    /// rather than being a raw acquisition (spec.md GLOSSARY "Derived data").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DerivedDataProperties: u8 {
        const GAMMA_SUMMED       = 0b0000_0001;
        const GAMMA_BACKGROUND_SUBTRACTED = 0b0000_0010;
        const NEUTRON_SUMMED     = 0b0000_0100;
        const OPERATOR_REVIEWED  = 0b0000_1000;
    }
}

/// Flags controlling how [`crate::spectrum::SpecFile::cleanup_after_load`]
/// renumbers samples (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupFlags {
    /// Recompute derived views; renumber samples to `1..N` in `start_time`
    /// order; deduplicate identical energy calibrations.
    StandardCleanup,
    /// Recompute derived views without touching `sample_number` values.
    DontChangeOrReorderSamples,
    /// Renumber by `start_time` ascending, ties broken by original order.
    ReorderSamplesByTime,
}

/// The minimum number of channels a gamma histogram or energy calibration
/// must have to be considered meaningful (spec.md §3, `sm_min_channels`).
pub const SM_MIN_CHANNELS: usize = 2;

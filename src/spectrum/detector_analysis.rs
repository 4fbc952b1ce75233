//! Opaque pass-through for instrument-produced analysis results.
//!
//! spec.md is explicit that nuclide identification and peak fitting are
//! Non-goals of this engine; when a parsed file carries a vendor "detector
//! analysis" block (isotope ID results, dose rates, etc.) we keep it as an
//! unopinionated bag of fields so writers that support it can round-trip it,
//! without this crate ever interpreting its contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorAnalysis {
    pub remarks: Vec<String>,
    /// Free-form `(name, value)` results as reported by the instrument, e.g.
    /// `("Nuclide", "Cs137")` or `("DoseRate", "1.2 uSv/h")`.
    pub results: Vec<(String, String)>,
}

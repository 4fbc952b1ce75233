//! Pipeline step 8: apply a CALp sidecar calibration (spec.md §4.2, §6).
//!
//! Parsing the CALp text format itself lives in [`crate::io::calp`]; this
//! module just threads a parsed document into [`SpecFile`].

use crate::io::calp::CalpDocument;
use crate::spectrum::SpecFile;

pub fn apply_calp(spec: &mut SpecFile, doc: &CalpDocument) {
    spec.set_energy_calibration_from_calp(&doc.by_detector, doc.default.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, EnergyCalibration, Record};
    use indexmap::IndexMap;

    #[test]
    fn single_detector_file_uses_default_entry() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0; 16]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 16).shared());
        spec.push_record(r);
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        let doc = CalpDocument {
            by_detector: IndexMap::new(),
            default: Some(EnergyCalibration::polynomial(vec![1.0, 2.0], 16)),
        };
        apply_calp(&mut spec, &doc);

        assert_eq!(
            spec.records()[0].energy_calibration.as_ref().unwrap().coefficients,
            vec![1.0, 2.0]
        );
    }
}

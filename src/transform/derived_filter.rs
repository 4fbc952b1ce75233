//! Pipeline step 4: derived-data filter (spec.md §4.2).
//!
//! Mutual exclusion between `only_derived` and `no_derived` is a CLI-level
//! `UsageError` (exit code 40) checked before the pipeline ever runs; see
//! `crate::cli`.

use crate::spectrum::SpecFile;

pub fn apply_derived_data_filter(spec: &mut SpecFile, only_derived: bool, no_derived: bool) {
    if only_derived {
        spec.records_mut().retain(|r| !r.derived_data_properties.is_empty());
    } else if no_derived {
        spec.records_mut().retain(|r| r.derived_data_properties.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, DerivedDataProperties, Record};

    #[test]
    fn only_derived_keeps_only_synthesized_records() {
        let mut spec = SpecFile::new();
        let mut derived = Record::new(1, "A");
        derived.derived_data_properties = DerivedDataProperties::GAMMA_SUMMED;
        spec.push_record(derived);
        spec.push_record(Record::new(2, "A"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_derived_data_filter(&mut spec, true, false);
        assert_eq!(spec.records().len(), 1);
    }

    #[test]
    fn no_derived_drops_synthesized_records() {
        let mut spec = SpecFile::new();
        let mut derived = Record::new(1, "A");
        derived.derived_data_properties = DerivedDataProperties::GAMMA_SUMMED;
        spec.push_record(derived);
        spec.push_record(Record::new(2, "A"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_derived_data_filter(&mut spec, false, true);
        assert_eq!(spec.records().len(), 1);
        assert!(spec.records()[0].derived_data_properties.is_empty());
    }
}

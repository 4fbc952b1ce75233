//! Pipeline step 3: source-type filters (spec.md §4.2).
//!
//! The `*_only` variants (`--background-only`, etc.) are expressed by the CLI
//! layer as the four complementary `no_*` flags before this step ever runs;
//! this module only knows about the five `no_*` booleans.

use crate::spectrum::SourceType;
use crate::spectrum::SpecFile;

#[derive(Debug, Clone, Copy, Default)]
pub struct SourceTypeFilters {
    pub no_background: bool,
    pub no_foreground: bool,
    pub no_intrinsic: bool,
    pub no_calibration: bool,
    pub no_unknown: bool,
}

impl SourceTypeFilters {
    fn excludes(&self, effective: SourceType) -> bool {
        match effective {
            SourceType::Background => self.no_background,
            SourceType::Foreground => self.no_foreground,
            SourceType::IntrinsicActivity => self.no_intrinsic,
            SourceType::Calibration => self.no_calibration,
            SourceType::Unknown => self.no_unknown,
        }
    }
}

pub fn apply_source_type_filters(spec: &mut SpecFile, filters: &SourceTypeFilters) {
    // "Unknown in a file whose remaining sample count is exactly one" is
    // evaluated against the sample count going into this step.
    let single_sample = spec.sample_numbers().len() == 1;

    spec.records_mut().retain(|r| {
        let effective = if r.source_type == SourceType::Unknown && single_sample {
            SourceType::Foreground
        } else {
            r.source_type
        };
        !filters.excludes(effective)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, Record};

    #[test]
    fn no_background_drops_background_records() {
        let mut spec = SpecFile::new();
        let mut bg = Record::new(1, "A");
        bg.source_type = SourceType::Background;
        let mut fg = Record::new(2, "A");
        fg.source_type = SourceType::Foreground;
        spec.push_record(bg);
        spec.push_record(fg);
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_source_type_filters(
            &mut spec,
            &SourceTypeFilters {
                no_background: true,
                ..Default::default()
            },
        );
        assert_eq!(spec.records().len(), 1);
        assert_eq!(spec.records()[0].source_type, SourceType::Foreground);
    }

    #[test]
    fn unknown_in_single_sample_file_counts_as_foreground() {
        let mut spec = SpecFile::new();
        let unknown = Record::new(1, "A");
        spec.push_record(unknown);
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_source_type_filters(
            &mut spec,
            &SourceTypeFilters {
                no_foreground: true,
                ..Default::default()
            },
        );
        assert!(spec.records().is_empty());
    }

    #[test]
    fn unknown_in_multi_sample_file_is_not_reclassified() {
        let mut spec = SpecFile::new();
        spec.push_record(Record::new(1, "A"));
        spec.push_record(Record::new(2, "A"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        apply_source_type_filters(
            &mut spec,
            &SourceTypeFilters {
                no_foreground: true,
                ..Default::default()
            },
        );
        assert_eq!(spec.records().len(), 2);
    }
}

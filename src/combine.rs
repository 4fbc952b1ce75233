//! The combine engine (spec.md §4.5): merges two or more already-piped-through
//! [`SpecFile`]s into one, for the `--combine-input-files` CLI mode.

use crate::error::UsageError;
use crate::spectrum::{CleanupFlags, SpecFile};
use crate::transform::apply_sum_all;

/// Sort applied to the combined record set before it is handed to the
/// output planner (spec.md §4.5, §5 "Ordering guarantees").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineSort {
    /// Concatenation in argv order (default).
    #[default]
    ArgvOrder,
    /// `ReorderSamplesByTime`, ascending, stable.
    Time,
}

/// Merges `files` (already individually run through the per-file pipeline,
/// in argv order) into one [`SpecFile`]. Requires at least two inputs.
pub fn combine_files(
    mut files: Vec<SpecFile>,
    sort: CombineSort,
    sum_all: bool,
) -> Result<SpecFile, UsageError> {
    if files.len() < 2 {
        return Err(UsageError::new(
            24,
            "combine-input-files requires at least two input files",
        ));
    }

    let rest = files.split_off(1);
    let mut seed = files.into_iter().next().unwrap();

    for other in rest {
        for record in other.records() {
            seed.push_record(record.clone());
        }
        merge_string_set(&mut seed.remarks, &other.remarks);
        merge_string_set(&mut seed.parse_warnings, &other.parse_warnings);
    }

    let cleanup_flags = match sort {
        CombineSort::ArgvOrder => CleanupFlags::DontChangeOrReorderSamples,
        CombineSort::Time => CleanupFlags::ReorderSamplesByTime,
    };
    seed.cleanup_after_load(cleanup_flags);

    if sum_all {
        apply_sum_all(&mut seed);
        seed.cleanup_after_load(CleanupFlags::DontChangeOrReorderSamples);
        seed.uuid.clear();
    }

    Ok(seed)
}

/// Appends entries from `incoming` that are not already present in `seed`,
/// preserving the seed's existing order (spec.md §4.5 "set-union, preserving
/// insertion order of the seed").
fn merge_string_set(seed: &mut Vec<String>, incoming: &[String]) {
    for entry in incoming {
        if !seed.contains(entry) {
            seed.push(entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{EnergyCalibration, Record};

    fn file_with(det: &str, remark: &str) -> SpecFile {
        let mut f = SpecFile::new();
        let mut r = Record::new(1, det);
        r.gamma_counts = Some(vec![1.0, 2.0]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
        f.remarks.push(remark.to_string());
        f.push_record(r);
        f.cleanup_after_load(CleanupFlags::StandardCleanup);
        f
    }

    #[test]
    fn requires_at_least_two_inputs() {
        let err = combine_files(vec![file_with("A", "r1")], CombineSort::ArgvOrder, false)
            .unwrap_err();
        assert_eq!(err.code, 24);
    }

    #[test]
    fn appends_clones_and_unions_remarks() {
        let a = file_with("A", "shared");
        let b = file_with("B", "shared");
        let combined = combine_files(vec![a, b], CombineSort::ArgvOrder, false).unwrap();
        assert_eq!(combined.records().len(), 2);
        assert_eq!(combined.remarks, vec!["shared".to_string()]);
    }

    #[test]
    fn sum_all_collapses_combined_records() {
        let a = file_with("A", "r1");
        let b = file_with("B", "r2");
        let combined = combine_files(vec![a, b], CombineSort::ArgvOrder, true).unwrap();
        assert_eq!(combined.records().len(), 1);
    }
}

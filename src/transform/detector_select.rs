//! Pipeline step 2: detector inclusion/exclusion (spec.md §4.2).

use std::collections::HashSet;

use log::warn;

use crate::spectrum::SpecFile;

/// Applies `exclude` first, then restricts to `include` among what remains.
/// Unrecognized names only warn. Returns `true` if the resulting detector set
/// is non-empty (spec.md: "If the resulting detector set is empty, the file
/// is skipped with a warning").
pub fn select_detectors(spec: &mut SpecFile, exclude: &[String], include: &[String]) -> bool {
    let all: HashSet<String> = spec.detector_names().iter().cloned().collect();

    for name in exclude {
        if !all.contains(name) {
            warn!("detector to exclude '{}' is not present in this file", name);
        }
    }
    let mut remaining: HashSet<String> = all
        .iter()
        .filter(|n| !exclude.contains(n))
        .cloned()
        .collect();

    if !include.is_empty() {
        for name in include {
            if !all.contains(name) {
                warn!("detector to include '{}' is not present in this file", name);
            }
        }
        remaining = remaining
            .into_iter()
            .filter(|n| include.contains(n))
            .collect();
    }

    if remaining.is_empty() {
        warn!("no detectors remain after inclusion/exclusion filtering; skipping file");
        return false;
    }

    spec.records_mut().retain(|r| remaining.contains(&r.detector_name));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, Record};

    fn rec(det: &str) -> Record {
        Record::new(1, det)
    }

    #[test]
    fn exclusion_runs_before_inclusion() {
        let mut spec = SpecFile::new();
        spec.push_record(rec("A"));
        spec.push_record(rec("B"));
        spec.push_record(rec("C"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        let ok = select_detectors(
            &mut spec,
            &["B".to_string()],
            &["A".to_string(), "B".to_string()],
        );
        assert!(ok);
        let names: Vec<String> = spec.records().iter().map(|r| r.detector_name.clone()).collect();
        assert_eq!(names, vec!["A".to_string()]);
    }

    #[test]
    fn empty_result_skips_file() {
        let mut spec = SpecFile::new();
        spec.push_record(rec("A"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        let ok = select_detectors(&mut spec, &["A".to_string()], &[]);
        assert!(!ok);
    }
}

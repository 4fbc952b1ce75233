//! Pipeline step 6: user-supplied detector renaming (spec.md §4.2).

use indexmap::IndexMap;
use log::warn;

use crate::spectrum::SpecFile;

/// Applies `from=to` renames (case-sensitive on `from`) in the order given;
/// unknown `from` names only warn, matching `SpecUtils`'s recoverable
/// `UnknownDetector` (spec.md §7).
pub fn apply_detector_renames(spec: &mut SpecFile, renames: &IndexMap<String, String>) {
    for (from, to) in renames {
        if let Err(e) = spec.change_detector_name(from, to) {
            warn!("could not rename detector '{}' to '{}': {}", from, to, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, Record};

    #[test]
    fn renames_known_detector() {
        let mut spec = SpecFile::new();
        spec.push_record(Record::new(1, "VD1"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        let mut renames = IndexMap::new();
        renames.insert("VD1".to_string(), "Aa1".to_string());
        apply_detector_renames(&mut spec, &renames);

        assert_eq!(spec.records()[0].detector_name, "Aa1");
    }

    #[test]
    fn unknown_from_name_only_warns() {
        let mut spec = SpecFile::new();
        spec.push_record(Record::new(1, "VD1"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);

        let mut renames = IndexMap::new();
        renames.insert("Missing".to_string(), "Aa1".to_string());
        apply_detector_renames(&mut spec, &renames);

        assert_eq!(spec.records()[0].detector_name, "VD1");
    }
}

//! Detector-name normalization to the N42 `<column><panel><mca>` convention
//! (spec.md §4.2 step 7).
//!
//! Grounded directly on `normalize_det_name_to_n42` in the original
//! `cambio`'s `CommandLineUtil.cpp`: only spectroscopic gamma detectors (more
//! than a handful of channels) are candidates for renaming, names are
//! assigned in column-then-panel-then-MCA order, and a matching neutron
//! partner (`<name>n`/`<name>N`) rides along with its gamma detector's new
//! prefix.

use std::collections::HashSet;

use log::warn;

use crate::spectrum::SpecFile;

/// A name already matches the `[A-D][a-h][1-8](...)?` convention.
pub fn is_n42_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() < 3 {
        return false;
    }
    let col = bytes[0];
    let panel = bytes[1];
    let mca = bytes[2];
    (b'A'..=b'D').contains(&col) && (b'a'..=b'h').contains(&panel) && (b'1'..=b'8').contains(&mca)
}

/// Rename every gamma-detector name that doesn't already match the N42
/// convention, per spec.md §4.2 step 7. Names in `dont_change` are left
/// alone (case-sensitive), matching the original's `dont_change_det_names`
/// parameter used to keep already-user-renamed detectors untouched.
///
/// Idempotent: running it twice has the same effect as running it once
/// (spec.md §8 testable property 6), since after the first pass every
/// renamed detector's name matches [`is_n42_name`] and is excluded from
/// `names_to_change` on the second pass.
pub fn normalize_det_name_to_n42(spec: &mut SpecFile, dont_change: &[String]) {
    let mut names_to_change: Vec<String> = Vec::new();
    let mut final_n42_names: HashSet<String> = HashSet::new();
    let mut other_names: HashSet<String> = HashSet::new();
    let mut seen = HashSet::new();

    for r in spec.records() {
        let name = &r.detector_name;
        if !seen.insert(name.clone()) {
            continue;
        }
        let is_gamma_spectroscopic = r
            .gamma_counts
            .as_ref()
            .map(|c| c.len() > 6)
            .unwrap_or(false);

        if dont_change.iter().any(|d| d == name) {
            if is_n42_name(name) {
                final_n42_names.insert(name.clone());
            } else {
                other_names.insert(name.clone());
            }
        } else if is_gamma_spectroscopic {
            if is_n42_name(name) {
                final_n42_names.insert(name.clone());
            } else {
                names_to_change.push(name.clone());
            }
        } else {
            other_names.insert(name.clone());
        }
    }

    // A gamma-spectroscopic detector may have samples with no gamma data;
    // make sure its name doesn't also linger in `other_names`.
    for n in final_n42_names.iter().chain(names_to_change.iter()) {
        other_names.remove(n);
    }

    if names_to_change.is_empty() {
        return;
    }

    names_to_change.sort_by_key(|n| n.to_lowercase());

    // Pool size scales with how many renames are needed (spec.md §4.2
    // step 7: "pool size is adapted to the count of renames needed").
    let num_col: u8 = if names_to_change.len() > 16 { 4 } else { 2 };
    let num_panel: u8 = if names_to_change.len() > 8 { 8 } else { 4 };
    let num_mca: u8 = if names_to_change.len() > 32 { 8 } else { 1 };

    let n42_name_taken = |final_names: &HashSet<String>, candidate_prefix: &str| -> bool {
        final_names
            .iter()
            .any(|n| n.len() >= 3 && n[0..3].eq_ignore_ascii_case(candidate_prefix))
    };

    for name in names_to_change {
        let mut new_prefix: Option<String> = None;

        // Two-character legacy names like "A1"/"B2" -> "Aa1"/"Ba2".
        if name.len() == 2 {
            let b = name.as_bytes();
            let col_ok = b[0].is_ascii_alphabetic() && (b'a'..=b'h').contains(&b[0].to_ascii_lowercase());
            let mca_ok = (b'1'..=b'8').contains(&b[1]);
            if col_ok && mca_ok {
                let candidate = format!("{}a{}", (b[0].to_ascii_uppercase() as char), b[1] as char);
                if !n42_name_taken(&final_n42_names, &candidate) {
                    new_prefix = Some(candidate);
                }
            }
        }

        // "DetectorInfoPan<d>DetG<d>" -> "<A+pan-1>a<mca>".
        if new_prefix.is_none()
            && name.len() == 21
            && name[..15].eq_ignore_ascii_case("DetectorInfoPan")
            && name[16..20].eq_ignore_ascii_case("DetG")
        {
            let pan = name.as_bytes()[15];
            let mca = name.as_bytes()[20];
            if pan.is_ascii_digit() && mca.is_ascii_digit() {
                let col = b'A' + (pan - b'1');
                let candidate = format!("{}a{}", col as char, mca as char);
                if !n42_name_taken(&final_n42_names, &candidate) {
                    new_prefix = Some(candidate);
                }
            }
        }

        if new_prefix.is_none() {
            'search: for mca in 0..num_mca {
                for panel in 0..num_panel {
                    for col in 0..num_col {
                        let candidate = format!(
                            "{}{}{}",
                            (b'A' + col) as char,
                            (b'a' + panel) as char,
                            (b'1' + mca) as char
                        );
                        if !n42_name_taken(&final_n42_names, &candidate) {
                            new_prefix = Some(candidate);
                            break 'search;
                        }
                    }
                }
            }
        }

        let Some(prefix) = new_prefix else {
            warn!(
                "normalize_det_name_to_n42: failed to find a free N42 name for detector '{}'",
                name
            );
            continue;
        };

        let new_name = if name.is_empty() {
            prefix.clone()
        } else {
            format!("{} {}", prefix, name)
        };

        if let Err(e) = spec.change_detector_name(&name, &new_name) {
            warn!(
                "normalize_det_name_to_n42: could not rename '{}' to '{}': {}",
                name, new_name, e
            );
            continue;
        }
        final_n42_names.insert(new_name.clone());

        for suffix in ['N', 'n'] {
            let neutron_name = format!("{}{}", name, suffix);
            if other_names.contains(&neutron_name) {
                let new_neutron_name = format!("{}N {}", prefix, name);
                if let Err(e) = spec.change_detector_name(&neutron_name, &new_neutron_name) {
                    warn!(
                        "normalize_det_name_to_n42: could not rename neutron partner '{}' to '{}': {}",
                        neutron_name, new_neutron_name, e
                    );
                } else {
                    other_names.remove(&neutron_name);
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, Record};

    fn gamma_record(sample: i32, det: &str) -> Record {
        let mut r = Record::new(sample, det);
        r.gamma_counts = Some(vec![1.0; 1024]);
        r
    }

    #[test]
    fn recognizes_n42_names() {
        assert!(is_n42_name("Aa1"));
        assert!(is_n42_name("Dh8 extra"));
        assert!(!is_n42_name("VD1"));
        assert!(!is_n42_name("A1"));
    }

    #[test]
    fn legacy_two_char_names_get_a_panel() {
        let mut spec = SpecFile::new();
        spec.push_record(gamma_record(1, "A1"));
        spec.push_record(gamma_record(1, "B2"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        normalize_det_name_to_n42(&mut spec, &[]);
        let names: Vec<&String> = spec.detector_names().iter().collect();
        assert!(names.iter().any(|n| n.starts_with("Aa1")));
        assert!(names.iter().any(|n| n.starts_with("Ba2")));
    }

    #[test]
    fn idempotent_on_already_n42_names() {
        let mut spec = SpecFile::new();
        spec.push_record(gamma_record(1, "Aa1"));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        normalize_det_name_to_n42(&mut spec, &[]);
        let first: Vec<String> = spec.detector_names().to_vec();
        normalize_det_name_to_n42(&mut spec, &[]);
        let second: Vec<String> = spec.detector_names().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn neutron_partner_follows_gamma_rename() {
        let mut spec = SpecFile::new();
        spec.push_record(gamma_record(1, "VD1"));
        let mut neutron = Record::new(1, "VD1N");
        neutron.neutrons = Some(crate::spectrum::NeutronData {
            counts: 5.0,
            per_tube: None,
            contained: true,
        });
        spec.push_record(neutron);
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        normalize_det_name_to_n42(&mut spec, &[]);
        let names: Vec<&String> = spec.detector_names().iter().collect();
        assert!(names.iter().any(|n| n.ends_with("N VD1")));
    }
}

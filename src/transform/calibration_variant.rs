//! Pipeline step 1: energy-calibration variant selection (spec.md §4.2).
//!
//! When a file exposes more than one named calibration variant (e.g. a
//! linearized "Lin" version alongside a raw polynomial one) and the user
//! didn't ask to keep "all" of them, pick the single variant the rest of the
//! pipeline should see.

use log::warn;
use regex::Regex;

use crate::spectrum::SpecFile;

/// Picks a variant tag and drops calibrations tagged with any other variant
/// from every record (a record keeping its original calibration if it has no
/// tag at all, i.e. the format only ever exposed one variant).
pub fn select_energy_calibration_variant(spec: &mut SpecFile, keep_all: bool) {
    if keep_all {
        return;
    }
    let variants = spec.energy_cal_variants().to_vec();
    if variants.len() <= 1 {
        return;
    }

    let chosen = pick_variant(&variants);

    let Some(chosen) = chosen else {
        warn!(
            "file exposes {} energy calibration variants ({:?}) with no clear preference; keeping all",
            variants.len(),
            variants
        );
        return;
    };

    for r in spec.records_mut() {
        if let Some(tag) = &r.calibration_variant {
            if tag != &chosen {
                r.energy_calibration = None;
            }
        }
    }
}

fn pick_variant(variants: &[String]) -> Option<String> {
    if let Some(lin) = variants.iter().find(|v| v.to_lowercase().contains("lin")) {
        return Some(lin.clone());
    }

    let mev_re = Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*MeV$").unwrap();
    let mut best: Option<(f64, &String)> = None;
    for v in variants {
        if let Some(caps) = mev_re.captures(v) {
            if let Ok(value) = caps[1].parse::<f64>() {
                if best.map(|(b, _)| value > b).unwrap_or(true) {
                    best = Some((value, v));
                }
            }
        }
    }
    best.map(|(_, v)| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_lin_tag() {
        let variants = vec!["Raw".to_string(), "Linearized".to_string(), "3MeV".to_string()];
        assert_eq!(pick_variant(&variants), Some("Linearized".to_string()));
    }

    #[test]
    fn falls_back_to_largest_mev_suffix() {
        let variants = vec!["1.5MeV".to_string(), "3MeV".to_string(), "Other".to_string()];
        assert_eq!(pick_variant(&variants), Some("3MeV".to_string()));
    }

    #[test]
    fn no_preference_returns_none() {
        let variants = vec!["Alpha".to_string(), "Beta".to_string()];
        assert_eq!(pick_variant(&variants), None);
    }
}

//! Pipeline step 9: channel rebinning by power-of-two factor (spec.md §4.2).
//!
//! "Factor `f` means combine `2^(f-1)` channels." Each distinct channel
//! count present in the file is handled independently; a channel-count class
//! that isn't evenly divisible by the combine factor is skipped with a
//! warning rather than aborting the whole file.

use log::warn;

use crate::spectrum::SpecFile;

pub fn apply_channel_rebin(spec: &mut SpecFile, factor_exponent: u32) {
    if factor_exponent == 0 {
        return;
    }
    let combine = 1usize << (factor_exponent - 1);
    if combine <= 1 {
        return;
    }
    for &n in spec.gamma_channel_counts().to_vec().iter() {
        if n % combine != 0 {
            warn!(
                "channel-count class of {} channels is not evenly divisible by the rebin factor {}; skipping",
                n, combine
            );
            continue;
        }
        // combine_gamma_channels only touches records whose channel count
        // equals its `target_channel_count` argument, so calling it once per
        // distinct class present is safe to do in a loop.
        if let Err(e) = spec.combine_gamma_channels(combine, n) {
            warn!("could not rebin {} channel records: {}", n, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, EnergyCalibration, Record};

    fn rec(channels: usize) -> Record {
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0; channels]);
        r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], channels).shared());
        r
    }

    #[test]
    fn factor_one_is_noop() {
        let mut spec = SpecFile::new();
        spec.push_record(rec(1024));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        apply_channel_rebin(&mut spec, 1);
        assert_eq!(spec.records()[0].num_gamma_channels(), Some(1024));
    }

    #[test]
    fn factor_two_halves_channel_count() {
        let mut spec = SpecFile::new();
        spec.push_record(rec(1024));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        apply_channel_rebin(&mut spec, 2);
        assert_eq!(spec.records()[0].num_gamma_channels(), Some(512));
    }

    #[test]
    fn indivisible_class_is_skipped_not_fatal() {
        let mut spec = SpecFile::new();
        spec.push_record(rec(1000));
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        apply_channel_rebin(&mut spec, 3); // combine=4, 1000 % 4 == 0 actually; use 10
        apply_channel_rebin(&mut spec, 10); // combine = 512, doesn't divide 1000 (or already-changed count)
        // No panic is the property under test.
    }
}

//! Counts-preserving histogram resampling shared by `combine_gamma_channels`,
//! `truncate_gamma_channels`'s calibration handling, and `rebin_measurement`
//! (spec.md §4.1).
//!
//! The algorithm treats counts within a channel as uniformly distributed
//! across that channel's energy span, so the cumulative count as a function
//! of energy is piecewise-linear; resampling onto a new set of edges is then
//! just evaluating that piecewise-linear cumulative at the new edges and
//! differencing. This preserves total counts exactly (up to floating point
//! error) whenever the new edges span a subset of the old range, and
//! approximately otherwise (energy outside the old range contributes zero).

/// Evaluate the piecewise-linear cumulative-counts curve defined by
/// `edges`/`counts` at an arbitrary energy.
fn cumulative_at(edges: &[f64], counts: &[f64], energy: f64) -> f64 {
    debug_assert_eq!(edges.len(), counts.len() + 1);
    if edges.is_empty() {
        return 0.0;
    }
    if energy <= edges[0] {
        return 0.0;
    }
    if energy >= *edges.last().unwrap() {
        return counts.iter().sum();
    }
    let mut acc = 0.0;
    for (i, w) in edges.windows(2).enumerate() {
        let (lo, hi) = (w[0], w[1]);
        if energy <= hi {
            let frac = if hi > lo { (energy - lo) / (hi - lo) } else { 0.0 };
            acc += counts[i] * frac;
            return acc;
        }
        acc += counts[i];
    }
    acc
}

/// Resample `(old_edges, old_counts)` onto `new_edges`
/// (`new_edges.len() == new_counts.len() + 1`).
pub fn rebin_counts(old_edges: &[f64], old_counts: &[f64], new_edges: &[f64]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(new_edges.len());
    for &e in new_edges {
        cum.push(cumulative_at(old_edges, old_counts, e));
    }
    cum.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rebin_preserves_counts() {
        let edges = vec![0.0, 10.0, 20.0, 30.0];
        let counts = vec![5.0, 7.0, 3.0];
        let out = rebin_counts(&edges, &counts, &edges);
        for (a, b) in out.iter().zip(counts.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn coarser_rebin_preserves_total() {
        let edges = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        let counts = vec![4.0, 4.0, 4.0, 4.0];
        let new_edges = vec![0.0, 20.0, 40.0];
        let out = rebin_counts(&edges, &counts, &new_edges);
        assert_eq!(out.len(), 2);
        let total: f64 = out.iter().sum();
        assert!((total - counts.iter().sum::<f64>()).abs() < 1e-9);
    }
}

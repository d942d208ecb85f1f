//! Random sampling without replacement.
//!
//! Both draws take the run's generator explicitly so a run stays
//! reproducible from its seed.

use rand::seq::SliceRandom;
use rand::Rng;

/// Draw `min(count, items.len())` items uniformly without replacement.
pub fn uniform_sample<T: Copy>(items: &[T], count: usize, rng: &mut impl Rng) -> Vec<T> {
    let amount = count.min(items.len());
    items.choose_multiple(rng, amount).copied().collect()
}

/// Draw up to `count` indices into `weights` without replacement, each draw
/// proportional to the weights still in the pool.
///
/// Successive cumulative-distribution draws: one uniform number per pick,
/// scaled by the remaining total, walked down the remaining weights in index
/// order. Entries with zero, negative or non-finite weight are never drawn.
/// A zero count, an empty pool or a degenerate weight sum returns an empty
/// selection.
pub fn weighted_sample(weights: &[f64], count: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut pool: Vec<(usize, f64)> = weights
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .collect();

    let total: f64 = pool.iter().map(|(_, w)| w).sum();
    if count == 0 || pool.is_empty() || !total.is_finite() || total <= 0.0 {
        return Vec::new();
    }

    let mut selected = Vec::with_capacity(count.min(pool.len()));
    while selected.len() < count && !pool.is_empty() {
        let remaining: f64 = pool.iter().map(|(_, w)| w).sum();
        if remaining <= 0.0 {
            break;
        }

        let mut threshold = rng.gen::<f64>() * remaining;
        // Rounding can leave a sliver past the last entry; it belongs to the last one.
        let mut pick = pool.len() - 1;
        for (pos, (_, weight)) in pool.iter().enumerate() {
            threshold -= weight;
            if threshold <= 0.0 {
                pick = pos;
                break;
            }
        }

        selected.push(pool.remove(pick).0);
    }

    selected
}

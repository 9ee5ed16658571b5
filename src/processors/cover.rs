//! Category cover: builds candidate clusters that hold one point per category.
//!
//! Every combination of `C` labels is walked greedily in partition order. The
//! first point seen for a category is kept and later points of that category
//! are skipped, so the result depends on point order. That tie-break is
//! intentional; no optimal assignment is attempted.

use log::{debug, warn};

use super::partition::{binomial, Combinations, LabelPartition};
use crate::core::point::CategoryIndex;

/// A candidate cluster as point indices, one per category.
pub type Candidate = Vec<usize>;

/// Enumerate covering candidates from a label partition.
///
/// Yields nothing when there are fewer labels than categories, or when the
/// number of label combinations exceeds `max_combinations`.
pub fn cover_categories(
    partition: &LabelPartition,
    categories: &CategoryIndex,
    max_combinations: u64,
) -> Vec<Candidate> {
    let c = categories.len();
    let l = partition.len();
    if c == 0 || l < c {
        return Vec::new();
    }

    let combos = binomial(l, c);
    if combos > max_combinations {
        warn!(
            "cover: C({}, {}) = {} label combinations exceeds limit {}; skipping",
            l, c, combos, max_combinations
        );
        return Vec::new();
    }

    let mut satisfied = vec![false; c];
    let mut candidates = Vec::new();

    for combo in Combinations::new(l, c) {
        satisfied.iter_mut().for_each(|s| *s = false);
        let mut cluster: Candidate = Vec::with_capacity(c);

        'walk: for &label in &combo {
            for &point in partition.members(label) {
                let category = categories.of(point);
                if !satisfied[category] {
                    satisfied[category] = true;
                    cluster.push(point);
                    if cluster.len() == c {
                        break 'walk;
                    }
                }
            }
        }

        if cluster.len() == c {
            candidates.push(cluster);
        }
    }

    debug!(
        "cover: {} labels, {} categories -> {} candidates from {} combinations",
        l,
        c,
        candidates.len(),
        combos
    );
    candidates
}

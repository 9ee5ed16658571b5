//! Exhaustive enumeration for tiny inputs.

use log::debug;

use super::cover::Candidate;
use super::partition::Combinations;
use crate::config::BruteForceConfig;
use crate::core::point::CategoryIndex;

/// Whether the input is small enough to enumerate every point combination.
pub fn is_applicable(categories: &CategoryIndex, config: &BruteForceConfig) -> bool {
    categories.point_count() <= config.max_points && categories.len() <= config.max_categories
}

/// Every `C`-point combination whose categories are pairwise distinct.
///
/// With exactly `C` points and no repeated category, the combination covers
/// the full category set.
pub fn brute_force_candidates(categories: &CategoryIndex) -> Vec<Candidate> {
    let c = categories.len();
    if c == 0 {
        return Vec::new();
    }

    let mut seen = vec![false; c];
    let candidates: Vec<Candidate> = Combinations::new(categories.point_count(), c)
        .filter(|combo| {
            seen.iter_mut().for_each(|s| *s = false);
            combo.iter().all(|&p| {
                let category = categories.of(p);
                !std::mem::replace(&mut seen[category], true)
            })
        })
        .collect();

    debug!(
        "brute force: {} points, {} categories -> {} candidates",
        categories.point_count(),
        c,
        candidates.len()
    );
    candidates
}

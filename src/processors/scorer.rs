//! Cluster scoring, deduplication, preference filtering, and strategy metric.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::cover::Candidate;
use crate::config::ScorerConfig;
use crate::core::geo;
use crate::core::point::{LatLng, Point, Preference};

/// A candidate with its centroid, compactness, and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCluster {
    /// 1-based position in the sorted output; 0 until ranked
    pub rank: usize,
    pub points: Vec<Point>,
    pub center: LatLng,
    /// Sum of squared planar deviations from the center, in degrees squared
    pub wcss: f64,
    /// Largest distance from the center to a member, in meters
    pub radius_m: f64,
}

/// Outcome of scoring one strategy's candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Accepted clusters, ascending by `wcss` and ranked
    pub valid: Vec<ScoredCluster>,
    /// Candidates left after deduplication
    pub unique_candidates: usize,
    /// Whether the valid list came from the loosest-setting fallback
    pub promoted: bool,
    pub combined_metric: f64,
}

/// WCSS of the points at `members`.
pub fn compactness(points: &[Point], members: &[usize]) -> f64 {
    let locs: Vec<LatLng> = members.iter().map(|&i| points[i].location()).collect();
    match geo::centroid(&locs) {
        Some(center) => wcss(&locs, center),
        None => 0.0,
    }
}

fn wcss(locs: &[LatLng], center: LatLng) -> f64 {
    locs.iter()
        .map(|l| (l.lat - center.lat).powi(2) + (l.lng - center.lng).powi(2))
        .sum()
}

/// Total WCSS over a candidate set.
pub fn total_compactness(points: &[Point], candidates: &[Candidate]) -> f64 {
    candidates.iter().map(|c| compactness(points, c)).sum()
}

/// Center, WCSS, and radius of one candidate. The rank is left at zero.
pub fn score_candidate(points: &[Point], members: &[usize]) -> ScoredCluster {
    let cluster_points: Vec<Point> = members.iter().map(|&i| points[i].clone()).collect();
    let locs: Vec<LatLng> = cluster_points.iter().map(Point::location).collect();
    let center = geo::centroid(&locs).unwrap_or(LatLng::new(0.0, 0.0));

    ScoredCluster {
        rank: 0,
        wcss: wcss(&locs, center),
        radius_m: geo::radius(&locs, center),
        center,
        points: cluster_points,
    }
}

/// Drop candidates whose point-location multiset was already seen.
///
/// The first occurrence is kept and candidate order is preserved.
pub fn dedup_candidates(points: &[Point], candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<Vec<(u64, u64)>> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|candidate| {
            let mut key: Vec<(u64, u64)> =
                candidate.iter().map(|&i| points[i].location_key()).collect();
            key.sort_unstable();
            seen.insert(key)
        })
        .collect()
}

/// WCSS cutoff for a preference: linear from `min_threshold` to `max_threshold`.
pub fn acceptance_threshold(preference: Preference, config: &ScorerConfig) -> f64 {
    config.min_threshold + (config.max_threshold - config.min_threshold) * preference.value()
}

/// `count^weight / mean(wcss)` over the valid clusters.
///
/// Zero clusters give `0.0`; a zero mean gives `+inf`.
pub fn combined_metric(valid: &[ScoredCluster], weight: f64) -> f64 {
    if valid.is_empty() {
        return 0.0;
    }
    let count = valid.len() as f64;
    let avg_wcss = valid.iter().map(|c| c.wcss).sum::<f64>() / count;
    if avg_wcss == 0.0 {
        f64::INFINITY
    } else {
        count.powf(weight) / avg_wcss
    }
}

/// Score, deduplicate, and filter one strategy's candidates.
///
/// Candidates with `wcss` strictly below the preference threshold are valid.
/// At the loosest preference, if nothing passes, the tightest rejected
/// candidate is promoted so that any candidate at all yields one result.
pub fn evaluate(
    points: &[Point],
    candidates: Vec<Candidate>,
    preference: Preference,
    config: &ScorerConfig,
) -> Evaluation {
    let unique = dedup_candidates(points, candidates);
    let unique_candidates = unique.len();
    let threshold = acceptance_threshold(preference, config);

    let (mut valid, rejected): (Vec<ScoredCluster>, Vec<ScoredCluster>) = unique
        .iter()
        .map(|c| score_candidate(points, c))
        .partition(|c| c.wcss < threshold);

    let mut promoted = false;
    if valid.is_empty() && preference.is_loosest() {
        if let Some(best) = rejected.into_iter().min_by(|a, b| a.wcss.total_cmp(&b.wcss)) {
            debug!("scorer: promoting rejected cluster with wcss={:.3e}", best.wcss);
            valid.push(best);
            promoted = true;
        }
    }

    valid.sort_by(|a, b| a.wcss.total_cmp(&b.wcss));
    for (i, cluster) in valid.iter_mut().enumerate() {
        cluster.rank = i + 1;
    }

    let combined_metric = combined_metric(&valid, config.count_weight);
    debug!(
        "scorer: threshold={:.3e} unique={} valid={} metric={:.4e}",
        threshold,
        unique_candidates,
        valid.len(),
        combined_metric
    );

    Evaluation {
        valid,
        unique_candidates,
        promoted,
        combined_metric,
    }
}

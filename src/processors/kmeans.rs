//! Partition-based candidate generation: seeded k-means plus refinement.
//!
//! K-means runs on raw (lat, lng) degrees, which matches the planar WCSS used
//! by the scorer. Initialization is k-means++ driven by a `ChaCha8Rng` seeded
//! from the configuration, so identical input always yields identical labels.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::cover::{cover_categories, Candidate};
use super::partition::LabelPartition;
use super::scorer::total_compactness;
use crate::config::{LimitsConfig, PartitionConfig};
use crate::core::point::{CategoryIndex, LatLng, Point};

/// Result of one k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<LatLng>,
    /// Sum of squared distances from each point to its centroid
    pub inertia: f64,
    pub iterations: usize,
}

/// Number of clusters to ask k-means for.
///
/// `max(C, N / C)`, capped at `min(N, C * 10)` and at `max_clusters`.
pub fn target_cluster_count(n_points: usize, n_categories: usize, max_clusters: usize) -> usize {
    if n_points == 0 || n_categories == 0 {
        return 0;
    }
    let target = n_categories.max(n_points / n_categories);
    let cap = n_points.min(n_categories * 10);
    target.min(cap).min(max_clusters)
}

#[inline]
fn sq_dist(a: LatLng, b: LatLng) -> f64 {
    (a.lat - b.lat).powi(2) + (a.lng - b.lng).powi(2)
}

/// Index and squared distance of the nearest centroid; ties go to the lowest index.
fn nearest(loc: LatLng, centroids: &[LatLng]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, &c) in centroids.iter().enumerate() {
        let d = sq_dist(loc, c);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

/// K-means++ seeding: each next centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn plus_plus_init(locations: &[LatLng], k: usize, rng: &mut ChaCha8Rng) -> Vec<LatLng> {
    let n = locations.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(locations[rng.gen_range(0..n)]);

    let mut min_d2: Vec<f64> = locations
        .iter()
        .map(|&l| sq_dist(l, centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_d2.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = n - 1;
            for (i, &d) in min_d2.iter().enumerate() {
                acc += d;
                if acc > target {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // Every point coincides with a centroid already
            rng.gen_range(0..n)
        };

        let chosen = locations[next];
        centroids.push(chosen);
        for (d, &l) in min_d2.iter_mut().zip(locations) {
            *d = d.min(sq_dist(l, chosen));
        }
    }

    centroids
}

/// Lloyd's algorithm from k-means++ seeds.
///
/// Stops when assignments stop changing or after `max_iterations`. A cluster
/// that loses all its points keeps its previous centroid. `k` is clamped to
/// the point count.
pub fn kmeans(locations: &[LatLng], k: usize, seed: u64, max_iterations: usize) -> KMeansFit {
    let n = locations.len();
    let k = k.min(n);
    if k == 0 {
        return KMeansFit {
            labels: vec![0; n],
            centroids: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        };
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids = plus_plus_init(locations, k, &mut rng);
    let mut labels: Vec<usize> = locations.iter().map(|&l| nearest(l, &centroids).0).collect();
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mut sums = vec![(0.0f64, 0.0f64, 0usize); k];
        for (&label, loc) in labels.iter().zip(locations) {
            let s = &mut sums[label];
            s.0 += loc.lat;
            s.1 += loc.lng;
            s.2 += 1;
        }
        for (centroid, &(lat, lng, count)) in centroids.iter_mut().zip(&sums) {
            if count > 0 {
                *centroid = LatLng::new(lat / count as f64, lng / count as f64);
            }
        }

        let next: Vec<usize> = locations.iter().map(|&l| nearest(l, &centroids).0).collect();
        if next == labels {
            break;
        }
        labels = next;
    }

    let inertia = labels
        .iter()
        .zip(locations)
        .map(|(&label, &loc)| sq_dist(loc, centroids[label]))
        .sum();

    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

/// Best of `n_init` k-means runs seeded `seed, seed + 1, ...` by inertia.
pub fn kmeans_best_of(
    locations: &[LatLng],
    k: usize,
    seed: u64,
    n_init: usize,
    max_iterations: usize,
) -> KMeansFit {
    let mut best = kmeans(locations, k, seed, max_iterations);
    for run in 1..n_init as u64 {
        let fit = kmeans(locations, k, seed.wrapping_add(run), max_iterations);
        if fit.inertia < best.inertia {
            best = fit;
        }
    }
    best
}

fn fit_partition(locations: &[LatLng], target: usize, seed: u64, config: &PartitionConfig) -> LabelPartition {
    let fit = kmeans_best_of(
        locations,
        target,
        seed,
        config.n_init,
        config.max_lloyd_iterations,
    );
    debug!(
        "partition: k={} seed={} inertia={:.3e} after {} iterations",
        target, seed, fit.inertia, fit.iterations
    );
    LabelPartition::from_labels(&fit.labels, fit.centroids.len())
}

/// Mean WCSS per candidate, or `None` for an empty set.
fn refinement_cost(points: &[Point], candidates: &[Candidate]) -> Option<f64> {
    if candidates.is_empty() {
        return None;
    }
    Some(total_compactness(points, candidates) / candidates.len() as f64)
}

/// Whether a refinement pass beats the current best. An empty set never
/// replaces a non-empty one.
fn improves(cost: Option<f64>, best: Option<f64>) -> bool {
    match (cost, best) {
        (Some(cost), Some(best)) => cost < best,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Covering candidates from a k-means partition, refined to lower WCSS.
///
/// Each refinement pass recomputes the covering combinations and keeps them
/// only if their mean WCSS per candidate improves; the first non-improving
/// pass stops the loop. The mean keeps reseeded partitions that yield fewer
/// combinations comparable. Without `reseed_each_iteration` every pass sees
/// the same partition, so the loop ends after one pass.
pub fn partition_candidates(
    points: &[Point],
    locations: &[LatLng],
    categories: &CategoryIndex,
    config: &PartitionConfig,
    limits: &LimitsConfig,
) -> Vec<Candidate> {
    let target = target_cluster_count(locations.len(), categories.len(), limits.max_clusters);
    if target == 0 {
        return Vec::new();
    }

    let partition = fit_partition(locations, target, config.seed, config);
    let mut best = cover_categories(&partition, categories, limits.max_combinations);
    let mut best_cost = refinement_cost(points, &best);

    for iteration in 1..=config.refinement_iterations {
        let candidates = if config.reseed_each_iteration {
            let seed = config.seed.wrapping_add(iteration as u64);
            let reseeded = fit_partition(locations, target, seed, config);
            cover_categories(&reseeded, categories, limits.max_combinations)
        } else {
            cover_categories(&partition, categories, limits.max_combinations)
        };
        let cost = refinement_cost(points, &candidates);

        if improves(cost, best_cost) {
            best = candidates;
            best_cost = cost;
        } else {
            debug!("partition: refinement converged after {} passes", iteration);
            break;
        }
    }

    best
}

//! Density-based candidate generation (DBSCAN over great-circle distance).
//!
//! This module implements a parallelized DBSCAN using:
//! - `kiddo` KD-tree over Earth-centered coordinates for range queries
//! - `rayon` for parallel neighbor finding and core point identification
//! - Atomic union-find for lock-free cluster merging
//!
//! The neighborhood radius and minimum neighborhood size are derived from the
//! data. A run that leaves any point unassigned contributes no candidates.
//!
//! # Example
//!
//! ```
//! use meetpoint::core::point::LatLng;
//! use meetpoint::processors::density::dbscan;
//!
//! let locs = vec![
//!     LatLng::new(47.6000, -122.3000),
//!     LatLng::new(47.6001, -122.3000),
//!     LatLng::new(47.7000, -122.3000),
//! ];
//! let labels = dbscan(&locs, 50.0, 2);
//! assert_eq!(labels, vec![0, 0, -1]);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use log::{debug, warn};
use rayon::prelude::*;

use super::cover::{cover_categories, Candidate};
use super::partition::LabelPartition;
use crate::config::{DensityConfig, LimitsConfig};
use crate::core::geo;
use crate::core::point::{CategoryIndex, LatLng};

/// Absolute slack in meters on the KD-tree radius. ECEF coordinates are
/// around 6.4e6 m, so their rounding swamps a relative slack at sub-meter
/// spacing. Candidates are re-checked exactly by haversine.
const CHORD_SLACK_M: f64 = 1e-3;

/// Atomic Union-Find data structure for lock-free parallel cluster merging.
///
/// Uses path compression with atomic compare-and-swap operations to safely
/// merge clusters from multiple threads without locks.
pub struct AtomicUnionFind {
    parent: Vec<AtomicUsize>,
}

impl AtomicUnionFind {
    /// Create a new union-find structure where each element is its own parent.
    #[inline]
    pub fn new(size: usize) -> Self {
        let parent = (0..size).map(AtomicUsize::new).collect();
        Self { parent }
    }

    /// Find the root of the set containing `x` with path compression.
    #[inline]
    pub fn find(&self, mut x: usize) -> usize {
        loop {
            let p = self.parent[x].load(Ordering::Relaxed);
            if p == x {
                return x;
            }
            let gp = self.parent[p].load(Ordering::Relaxed);
            if gp != p {
                // Losing this race only skips a compression step
                let _ = self.parent[x].compare_exchange_weak(
                    p,
                    gp,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                );
            }
            x = p;
        }
    }

    /// Union the sets containing `x` and `y`.
    ///
    /// Returns true if a merge occurred, false if they were already joined.
    #[inline]
    pub fn union(&self, x: usize, y: usize) -> bool {
        loop {
            let root_x = self.find(x);
            let root_y = self.find(y);

            if root_x == root_y {
                return false;
            }

            // Smaller root points at the larger one
            let (small, large) = if root_x < root_y {
                (root_x, root_y)
            } else {
                (root_y, root_x)
            };

            match self.parent[small].compare_exchange_weak(
                small,
                large,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(_) => continue,
            }
        }
    }
}

/// DBSCAN parameters derived from a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityParams {
    /// Neighborhood radius in meters
    pub eps_m: f64,
    /// Neighborhood size (including the point itself) that makes a core point
    pub min_samples: usize,
}

impl DensityParams {
    /// Radius from a low percentile of pairwise distances; minimum samples
    /// from a fraction of the point count, never below one.
    pub fn derive(locations: &[LatLng], config: &DensityConfig) -> Self {
        let distances = geo::pairwise_distances(locations);
        let eps_m = geo::percentile(&distances, config.eps_percentile).unwrap_or(0.0);
        let min_samples =
            ((locations.len() as f64 * config.min_samples_fraction).floor() as usize).max(1);
        Self { eps_m, min_samples }
    }
}

/// DBSCAN over haversine distance.
///
/// A point's neighborhood is every point within `eps_m` meters, itself
/// included. Core points have at least `min_samples` neighbors and are merged
/// transitively; border points join the cluster of their lowest-index core
/// neighbor.
///
/// # Algorithm (Parallelized)
///
/// 1. **Build KD-tree** over Earth-centered Cartesian coordinates
/// 2. **Parallel neighbor finding**: chord-radius query, confirmed by haversine
/// 3. **Core point identification**
/// 4. **Lock-free cluster formation** with the atomic union-find
/// 5. **Label assignment** in point order, so labels are deterministic
///
/// # Returns
///
/// One label per point; `-1` marks noise.
pub fn dbscan(locations: &[LatLng], eps_m: f64, min_samples: usize) -> Vec<i32> {
    let n = locations.len();
    if n == 0 {
        return Vec::new();
    }

    let coords: Vec<[f64; 3]> = locations.iter().map(|&l| geo::to_cartesian(l)).collect();
    let tree: ImmutableKdTree<f64, 3> = ImmutableKdTree::new_from_slice(&coords);

    let chord = geo::chord_length(eps_m.max(0.0)) + CHORD_SLACK_M;
    let chord_sq = chord * chord;

    let neighbors: Vec<Vec<usize>> = coords
        .par_iter()
        .enumerate()
        .map(|(i, coord)| {
            let mut found: Vec<usize> = tree
                .within::<SquaredEuclidean>(coord, chord_sq)
                .iter()
                .map(|nn| nn.item as usize)
                .filter(|&j| j == i || geo::distance(locations[i], locations[j]) <= eps_m)
                .collect();
            if !found.contains(&i) {
                found.push(i);
            }
            found.sort_unstable();
            found
        })
        .collect();

    let is_core: Vec<bool> = neighbors
        .par_iter()
        .map(|neigh| neigh.len() >= min_samples)
        .collect();

    let uf = AtomicUnionFind::new(n);
    (0..n).into_par_iter().for_each(|i| {
        if is_core[i] {
            for &j in &neighbors[i] {
                if is_core[j] {
                    uf.union(i, j);
                }
            }
        }
    });

    let mut root_to_cluster: HashMap<usize, i32> = HashMap::new();
    let mut next_cluster_id: i32 = 0;
    for i in 0..n {
        if is_core[i] {
            let root = uf.find(i);
            root_to_cluster.entry(root).or_insert_with(|| {
                let id = next_cluster_id;
                next_cluster_id += 1;
                id
            });
        }
    }

    let mut labels = vec![-1i32; n];
    for i in 0..n {
        if is_core[i] {
            labels[i] = root_to_cluster[&uf.find(i)];
        } else if let Some(&j) = neighbors[i].iter().find(|&&j| is_core[j]) {
            labels[i] = root_to_cluster[&uf.find(j)];
        }
    }

    labels
}

/// Outcome of the density partitioning step.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityOutcome {
    Partition(LabelPartition),
    /// Some points were left as noise; the strategy contributes nothing.
    Degenerate { noise: usize },
}

/// Run DBSCAN with data-derived parameters and build the label partition.
pub fn density_partition(locations: &[LatLng], config: &DensityConfig) -> DensityOutcome {
    let params = DensityParams::derive(locations, config);
    let labels = dbscan(locations, params.eps_m, params.min_samples);
    debug!(
        "density: eps={:.1}m min_samples={} over {} points",
        params.eps_m,
        params.min_samples,
        locations.len()
    );

    match LabelPartition::from_dense_labels(&labels) {
        Ok(partition) => DensityOutcome::Partition(partition),
        Err(noise) => DensityOutcome::Degenerate { noise },
    }
}

/// Covering candidates from the density partition, or none if it is degenerate
/// or has more labels than `limits.max_labels`.
pub fn density_candidates(
    locations: &[LatLng],
    categories: &CategoryIndex,
    config: &DensityConfig,
    limits: &LimitsConfig,
) -> Vec<Candidate> {
    match density_partition(locations, config) {
        DensityOutcome::Degenerate { noise } => {
            warn!(
                "density: {} of {} points unassigned; strategy yields no candidates",
                noise,
                locations.len()
            );
            Vec::new()
        }
        DensityOutcome::Partition(partition) if partition.len() > limits.max_labels => {
            warn!(
                "density: {} labels exceeds max_labels {}; strategy yields no candidates",
                partition.len(),
                limits.max_labels
            );
            Vec::new()
        }
        DensityOutcome::Partition(partition) => {
            cover_categories(&partition, categories, limits.max_combinations)
        }
    }
}

//! Great-circle geometry on decimal-degree coordinates.
//!
//! Distances are haversine meters. Centroids are the planar mean of lat/lng,
//! which is accurate enough for points within one metropolitan area.

use rayon::prelude::*;

use super::point::LatLng;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Above this many points the pairwise distance matrix is built in parallel.
const PARALLEL_PAIRWISE_MIN: usize = 256;

/// Haversine distance between two coordinates, in meters.
///
/// Symmetric, and exactly zero for identical coordinates.
#[inline]
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    if a == b {
        return 0.0;
    }

    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Arithmetic mean of latitudes and longitudes. `None` for an empty slice.
pub fn centroid(locations: &[LatLng]) -> Option<LatLng> {
    if locations.is_empty() {
        return None;
    }
    let n = locations.len() as f64;
    let (lat_sum, lng_sum) = locations
        .iter()
        .fold((0.0, 0.0), |(lat, lng), loc| (lat + loc.lat, lng + loc.lng));
    Some(LatLng::new(lat_sum / n, lng_sum / n))
}

/// Largest distance in meters from `center` to any location; zero when empty.
pub fn radius(locations: &[LatLng], center: LatLng) -> f64 {
    locations
        .iter()
        .map(|&loc| distance(center, loc))
        .fold(0.0, f64::max)
}

/// Distances for every unordered pair `i < j`, in row-major order.
pub fn pairwise_distances(locations: &[LatLng]) -> Vec<f64> {
    let n = locations.len();
    if n < 2 {
        return Vec::new();
    }

    let row = |i: usize| -> Vec<f64> {
        locations[i + 1..]
            .iter()
            .map(|&other| distance(locations[i], other))
            .collect()
    };

    if n >= PARALLEL_PAIRWISE_MIN {
        (0..n - 1).into_par_iter().flat_map_iter(row).collect()
    } else {
        (0..n - 1).flat_map(row).collect()
    }
}

/// Percentile `q` (0..=100) with linear interpolation between closest ranks.
///
/// Returns `None` for an empty input.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Earth-centered Cartesian coordinates in meters.
///
/// Straight-line (chord) distance between two of these grows monotonically
/// with great-circle distance, so Euclidean KD-tree queries can stand in for
/// haversine range queries.
#[inline]
pub fn to_cartesian(loc: LatLng) -> [f64; 3] {
    let phi = loc.lat.to_radians();
    let lambda = loc.lng.to_radians();
    [
        EARTH_RADIUS_M * phi.cos() * lambda.cos(),
        EARTH_RADIUS_M * phi.cos() * lambda.sin(),
        EARTH_RADIUS_M * phi.sin(),
    ]
}

/// Chord length in meters subtending a great-circle arc of `arc_m` meters.
#[inline]
pub fn chord_length(arc_m: f64) -> f64 {
    let half_angle = (arc_m / EARTH_RADIUS_M / 2.0).min(std::f64::consts::FRAC_PI_2);
    2.0 * EARTH_RADIUS_M * half_angle.sin()
}

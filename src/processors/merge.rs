//! Collapse near-duplicate listings before clustering.

use crate::core::geo;
use crate::core::point::Point;

/// Merge same-category points lying within `threshold_m` meters of each other.
///
/// Points are visited in input order. Each unvisited point absorbs every later
/// unvisited point of its category that is strictly closer than `threshold_m`,
/// and the group is replaced by one point at the group's mean location. Output
/// order follows the first member of each group.
pub fn merge_nearby(points: &[Point], threshold_m: f64) -> Vec<Point> {
    let mut visited = vec![false; points.len()];
    let mut merged = Vec::with_capacity(points.len());

    for i in 0..points.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let anchor = &points[i];
        let mut lat_sum = anchor.lat;
        let mut lng_sum = anchor.lng;
        let mut count = 1usize;

        for j in i + 1..points.len() {
            let other = &points[j];
            if visited[j] || other.category != anchor.category {
                continue;
            }
            if geo::distance(anchor.location(), other.location()) < threshold_m {
                visited[j] = true;
                lat_sum += other.lat;
                lng_sum += other.lng;
                count += 1;
            }
        }

        merged.push(Point::new(
            anchor.category.clone(),
            lat_sum / count as f64,
            lng_sum / count as f64,
        ));
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_close_same_category() {
        let points = vec![
            Point::new("Coffee", 47.6000, -122.3000),
            Point::new("Gym", 47.6000, -122.3000),
            Point::new("Coffee", 47.6010, -122.3000), // ~111 m away
            Point::new("Coffee", 47.6200, -122.3000), // ~2.2 km away
        ];
        let merged = merge_nearby(&points, 250.0);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].category, "Coffee");
        assert!((merged[0].lat - 47.6005).abs() < 1e-9);
        assert_eq!(merged[1], points[1]);
        assert_eq!(merged[2], points[3]);
    }

    #[test]
    fn test_distance_measured_from_group_anchor() {
        // b is near a and c is near b, but c is too far from a
        let points = vec![
            Point::new("Gym", 0.0, 0.0),
            Point::new("Gym", 0.0, 0.002),
            Point::new("Gym", 0.0, 0.004),
        ];
        let merged = merge_nearby(&points, 250.0);
        assert_eq!(merged.len(), 2);
        assert!((merged[0].lng - 0.001).abs() < 1e-12);
        assert_eq!(merged[1], points[2]);
    }

    #[test]
    fn test_zero_threshold_keeps_duplicates() {
        let points = vec![Point::new("Gym", 1.0, 1.0), Point::new("Gym", 1.0, 1.0)];
        assert_eq!(merge_nearby(&points, 0.0).len(), 2);
        assert!(merge_nearby(&[], 250.0).is_empty());
    }
}

//! End-to-end behavior of the meeting-point engine.

use std::collections::BTreeSet;

use meetpoint::config::EngineConfig;
use meetpoint::core::point::{CategoryIndex, Point, Preference};
use meetpoint::processors::arbiter::{find_meeting_points, run_strategies, Strategy as Method};
use meetpoint::processors::brute_force::brute_force_candidates;
use meetpoint::processors::scorer::{acceptance_threshold, evaluate};
use meetpoint::processors::ScoredCluster;
use proptest::prelude::*;

fn categories_of(cluster: &ScoredCluster) -> Vec<&str> {
    let mut names: Vec<&str> = cluster.points.iter().map(|p| p.category.as_str()).collect();
    names.sort_unstable();
    names
}

fn location_set(cluster: &ScoredCluster) -> Vec<(u64, u64)> {
    let mut key: Vec<(u64, u64)> = cluster.points.iter().map(Point::location_key).collect();
    key.sort_unstable();
    key
}

#[test]
fn test_nearer_pair_is_the_only_meeting_point() {
    let points = vec![
        Point::new("Coffee", 0.0, 0.0),
        Point::new("Coffee", 0.0, 0.05),
        Point::new("Gym", 0.0, 0.0002),
    ];
    let clusters =
        find_meeting_points(&points, Preference::default(), &EngineConfig::default()).unwrap();

    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(cluster.rank, 1);
    assert_eq!(categories_of(cluster), vec!["Coffee", "Gym"]);
    assert!(cluster.points.contains(&points[0]));
    assert!(cluster.points.contains(&points[2]));
    assert!((cluster.center.lng - 0.0001).abs() < 1e-12);
}

#[test]
fn test_one_point_per_category_yields_single_combination() {
    let points = vec![
        Point::new("Bank", 47.60000, -122.30000),
        Point::new("Coffee", 47.60005, -122.30002),
        Point::new("Gym", 47.60002, -122.30006),
    ];
    let report = run_strategies(&points, Preference::default(), &EngineConfig::default()).unwrap();

    let brute = &report.results[0];
    assert_eq!(brute.method, Method::BruteForce);
    assert_eq!(brute.candidates, 1);

    // Any other strategy can only rebuild the same cluster, so the tie goes to brute force
    assert_eq!(report.winner, Some(Method::BruteForce));
    let clusters = report.clusters();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].points.len(), 3);
}

#[test]
fn test_single_category_gives_singletons() {
    let points: Vec<Point> = (0..5)
        .map(|i| Point::new("Library", 10.0 + i as f64 * 0.01, 20.0))
        .collect();
    let clusters =
        find_meeting_points(&points, Preference::TIGHTEST, &EngineConfig::default()).unwrap();

    assert_eq!(clusters.len(), points.len());
    for (i, cluster) in clusters.iter().enumerate() {
        assert_eq!(cluster.rank, i + 1);
        assert_eq!(cluster.points.len(), 1);
        assert_eq!(cluster.wcss, 0.0);
        assert_eq!(cluster.radius_m, 0.0);
    }
}

#[test]
fn test_loosest_preference_always_returns_a_cluster() {
    // ~111 km apart; rejected at every threshold
    let points = vec![Point::new("Coffee", 47.0, -122.0), Point::new("Gym", 48.0, -122.0)];
    let config = EngineConfig::default();

    let strict = find_meeting_points(&points, Preference::new(0.99).unwrap(), &config).unwrap();
    assert!(strict.is_empty());

    let loose = find_meeting_points(&points, Preference::LOOSEST, &config).unwrap();
    assert_eq!(loose.len(), 1);
    assert_eq!(loose[0].rank, 1);
    assert!(loose[0].wcss > config.scorer.max_threshold);
}

#[test]
fn test_looser_preference_never_shrinks_the_valid_set() {
    let points = vec![
        Point::new("A", 0.0, 0.0),
        Point::new("B", 0.0, 0.001),
        Point::new("A", 0.0, 0.01),
        Point::new("B", 0.0, 0.025),
        Point::new("A", 0.0, 0.05),
        Point::new("B", 0.0, 0.05005),
    ];
    let candidates = vec![vec![0, 1], vec![2, 3], vec![4, 5], vec![0, 3]];
    let config = EngineConfig::default().scorer;

    let mut previous = 0;
    for step in 0..=10 {
        let pref = Preference::new(step as f64 / 10.0).unwrap();
        let evaluation = evaluate(&points, candidates.clone(), pref, &config);
        assert!(evaluation.valid.len() >= previous);
        previous = evaluation.valid.len();
    }
    assert!(previous >= 2);
}

#[test]
fn test_duplicate_listings_are_reported_once() {
    let points = vec![
        Point::new("Coffee", 1.0, 1.0),
        Point::new("Coffee", 1.0, 1.0),
        Point::new("Gym", 1.0, 1.0001),
    ];
    let clusters =
        find_meeting_points(&points, Preference::default(), &EngineConfig::default()).unwrap();

    assert_eq!(clusters.len(), 1);
}

#[test]
fn test_repeated_runs_are_identical() {
    let points: Vec<Point> = (0..24)
        .map(|i| {
            let category = ["Coffee", "Gym", "Bank"][i % 3];
            let cluster = (i / 6) as f64 * 0.02;
            Point::new(category, 47.6 + cluster, -122.3 + (i % 6) as f64 * 0.0001)
        })
        .collect();
    let config = EngineConfig::default();

    let first = run_strategies(&points, Preference::default(), &config).unwrap();
    let second = run_strategies(&points, Preference::default(), &config).unwrap();
    assert_eq!(first, second);
    assert!(!first.clusters().is_empty());
}

/// Up to ten points in three categories, small enough for brute force to apply.
fn points_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((0usize..3, -0.01f64..0.01, -0.01f64..0.01), 1..=10).prop_map(|raw| {
        raw.into_iter()
            .map(|(c, dlat, dlng)| Point::new(["A", "B", "C"][c], 30.0 + dlat, 40.0 + dlng))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_clusters_cover_every_category_once(
        points in points_strategy(),
        pref in 0.0f64..=1.0,
    ) {
        let config = EngineConfig::default();
        let preference = Preference::new(pref).unwrap();
        let clusters = find_meeting_points(&points, preference, &config).unwrap();

        let index = CategoryIndex::build(&points);
        let expected: Vec<&str> = index.names().iter().map(String::as_str).collect();
        let threshold = acceptance_threshold(preference, &config.scorer);

        let mut seen = BTreeSet::new();
        for (i, cluster) in clusters.iter().enumerate() {
            prop_assert_eq!(categories_of(cluster), expected.clone());
            prop_assert_eq!(cluster.rank, i + 1);
            prop_assert!(cluster.wcss >= 0.0);
            prop_assert!(cluster.radius_m >= 0.0);
            if !preference.is_loosest() {
                prop_assert!(cluster.wcss < threshold);
            }
            prop_assert!(seen.insert(location_set(cluster)));
        }
        for pair in clusters.windows(2) {
            prop_assert!(pair[0].wcss <= pair[1].wcss);
        }
    }

    #[test]
    fn prop_loosest_preference_is_never_empty(points in points_strategy()) {
        let clusters =
            find_meeting_points(&points, Preference::LOOSEST, &EngineConfig::default()).unwrap();
        prop_assert!(!clusters.is_empty());
    }

    #[test]
    fn prop_same_input_same_report(points in points_strategy(), pref in 0.0f64..=1.0) {
        let config = EngineConfig::default();
        let preference = Preference::new(pref).unwrap();
        let first = run_strategies(&points, preference, &config).unwrap();
        let second = run_strategies(&points, preference, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_raising_preference_keeps_valid_count(
        points in points_strategy(),
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let index = CategoryIndex::build(&points);
        let candidates = brute_force_candidates(&index);
        let config = EngineConfig::default().scorer;

        let at_low = evaluate(&points, candidates.clone(), Preference::new(low).unwrap(), &config);
        let at_high = evaluate(&points, candidates, Preference::new(high).unwrap(), &config);
        prop_assert!(at_high.valid.len() >= at_low.valid.len());
    }
}

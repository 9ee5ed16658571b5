//! Strategy arbitration: run every applicable generator and keep the best.
//!
//! The three strategies share no mutable state and run as rayon tasks. All of
//! them are joined before metrics are compared, so the winner never depends on
//! which finished first.

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::brute_force;
use super::cover::Candidate;
use super::density;
use super::kmeans;
use super::scorer::{self, ScoredCluster};
use crate::config::{ConfigError, EngineConfig};
use crate::core::point::{validate_points, CategoryIndex, InputError, LatLng, Point, Preference};

/// Errors that stop a request before any strategy runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("{found} distinct categories exceeds the configured maximum of {max}")]
    TooManyCategories { found: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// A candidate generator, listed in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    BruteForce,
    Density,
    Partition,
}

impl Strategy {
    /// Evaluation order; earlier strategies win ties.
    pub const ORDER: [Strategy; 3] = [Strategy::BruteForce, Strategy::Density, Strategy::Partition];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::BruteForce => "brute_force",
            Strategy::Density => "density",
            Strategy::Partition => "partition",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One strategy's scored output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    pub method: Strategy,
    /// Candidates produced before deduplication
    pub candidates: usize,
    pub scored_clusters: Vec<ScoredCluster>,
    pub combined_metric: f64,
}

impl StrategyResult {
    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }
}

/// Every strategy that ran, in evaluation order, and the chosen one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbiterReport {
    pub results: Vec<StrategyResult>,
    pub winner: Option<Strategy>,
}

impl ArbiterReport {
    /// The winning strategy's clusters; empty when no covering location exists.
    pub fn clusters(&self) -> &[ScoredCluster] {
        self.winner
            .and_then(|w| self.results.iter().find(|r| r.method == w))
            .map(|r| r.scored_clusters.as_slice())
            .unwrap_or(&[])
    }

    pub fn into_clusters(self) -> Vec<ScoredCluster> {
        match self.winner {
            Some(w) => self
                .results
                .into_iter()
                .find(|r| r.method == w)
                .map(|r| r.scored_clusters)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

/// Index of the result with the strictly greatest metric; the first wins ties.
pub fn select_best(results: &[StrategyResult]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, result) in results.iter().enumerate() {
        match best {
            Some((_, score)) if result.combined_metric <= score => {}
            _ => best = Some((i, result.combined_metric)),
        }
    }
    best.map(|(i, _)| i)
}

fn score_strategy(
    method: Strategy,
    points: &[Point],
    candidates: Vec<Candidate>,
    preference: Preference,
    config: &EngineConfig,
) -> StrategyResult {
    let produced = candidates.len();
    let evaluation = scorer::evaluate(points, candidates, preference, &config.scorer);
    info!(
        "{}: {} candidates, {} unique, {} valid, metric {:.4e}",
        method,
        produced,
        evaluation.unique_candidates,
        evaluation.valid.len(),
        evaluation.combined_metric
    );
    StrategyResult {
        method,
        candidates: produced,
        scored_clusters: evaluation.valid,
        combined_metric: evaluation.combined_metric,
    }
}

/// Run every applicable strategy and report all of their results.
///
/// Input and configuration are validated first; nothing runs on failure.
pub fn run_strategies(
    points: &[Point],
    preference: Preference,
    config: &EngineConfig,
) -> Result<ArbiterReport, EngineError> {
    config.validate()?;
    validate_points(points)?;

    let categories = CategoryIndex::build(points);
    if categories.len() > config.limits.max_categories {
        return Err(EngineError::TooManyCategories {
            found: categories.len(),
            max: config.limits.max_categories,
        });
    }

    let locations: Vec<LatLng> = points.iter().map(Point::location).collect();
    let brute_force_applicable = brute_force::is_applicable(&categories, &config.brute_force);
    debug!(
        "arbiter: {} points, {} categories, brute force {}",
        points.len(),
        categories.len(),
        if brute_force_applicable { "on" } else { "off" }
    );

    let (brute, (dense, partitioned)) = rayon::join(
        || {
            brute_force_applicable.then(|| {
                let candidates = brute_force::brute_force_candidates(&categories);
                score_strategy(Strategy::BruteForce, points, candidates, preference, config)
            })
        },
        || {
            rayon::join(
                || {
                    let candidates = density::density_candidates(
                        &locations,
                        &categories,
                        &config.density,
                        &config.limits,
                    );
                    score_strategy(Strategy::Density, points, candidates, preference, config)
                },
                || {
                    let candidates = kmeans::partition_candidates(
                        points,
                        &locations,
                        &categories,
                        &config.partition,
                        &config.limits,
                    );
                    score_strategy(Strategy::Partition, points, candidates, preference, config)
                },
            )
        },
    );

    let results: Vec<StrategyResult> = brute.into_iter().chain([dense, partitioned]).collect();
    let winner = select_best(&results)
        .map(|i| &results[i])
        .filter(|r| !r.scored_clusters.is_empty())
        .map(|r| r.method);

    match winner {
        Some(method) => info!("arbiter: selected {}", method),
        None => info!("arbiter: no covering location found"),
    }

    Ok(ArbiterReport { results, winner })
}

/// Ranked meeting-point clusters for `points` at the given preference.
///
/// An empty list means no strategy could assemble a cluster covering every
/// category.
pub fn find_meeting_points(
    points: &[Point],
    preference: Preference,
    config: &EngineConfig,
) -> Result<Vec<ScoredCluster>, EngineError> {
    Ok(run_strategies(points, preference, config)?.into_clusters())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(method: Strategy, metric: f64) -> StrategyResult {
        StrategyResult {
            method,
            candidates: 0,
            scored_clusters: Vec::new(),
            combined_metric: metric,
        }
    }

    #[test]
    fn test_select_best_prefers_strictly_greater() {
        let results = vec![
            result(Strategy::BruteForce, 1.0),
            result(Strategy::Density, 3.0),
            result(Strategy::Partition, 2.0),
        ];
        assert_eq!(select_best(&results), Some(1));
    }

    #[test]
    fn test_select_best_ties_keep_evaluation_order() {
        let results = vec![
            result(Strategy::BruteForce, f64::INFINITY),
            result(Strategy::Density, f64::INFINITY),
            result(Strategy::Partition, 5.0),
        ];
        assert_eq!(select_best(&results), Some(0));

        let zeros = vec![result(Strategy::Density, 0.0), result(Strategy::Partition, 0.0)];
        assert_eq!(select_best(&zeros), Some(0));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_rejects_invalid_input_before_running() {
        let config = EngineConfig::default();
        let err = find_meeting_points(&[], Preference::default(), &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(InputError::EmptyPoints)));
    }

    #[test]
    fn test_rejects_too_many_categories() {
        let mut config = EngineConfig::default();
        config.limits.max_categories = 2;
        let points: Vec<Point> = ["A", "B", "C"]
            .iter()
            .map(|c| Point::new(*c, 0.0, 0.0))
            .collect();
        let err = find_meeting_points(&points, Preference::default(), &config).unwrap_err();
        assert!(matches!(err, EngineError::TooManyCategories { found: 3, max: 2 }));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.scorer.count_weight = 0.5;
        let points = vec![Point::new("Gym", 0.0, 0.0)];
        let err = find_meeting_points(&points, Preference::default(), &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_brute_force_only_under_guard() {
        let config = EngineConfig::default();
        let small: Vec<Point> = (0..4)
            .map(|i| Point::new(if i % 2 == 0 { "A" } else { "B" }, 0.0, i as f64 * 1e-4))
            .collect();
        let report = run_strategies(&small, Preference::default(), &config).unwrap();
        let methods: Vec<Strategy> = report.results.iter().map(|r| r.method).collect();
        assert_eq!(methods, Strategy::ORDER.to_vec());

        let large: Vec<Point> = (0..12)
            .map(|i| Point::new(if i % 2 == 0 { "A" } else { "B" }, 0.0, i as f64 * 1e-4))
            .collect();
        let report = run_strategies(&large, Preference::default(), &config).unwrap();
        let methods: Vec<Strategy> = report.results.iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Strategy::Density, Strategy::Partition]);
    }

    #[test]
    fn test_no_covering_cluster_is_empty_not_error() {
        // Categories sit ~110 km apart at the tightest preference
        let points = vec![Point::new("Coffee", 47.0, -122.0), Point::new("Gym", 48.0, -122.0)];
        let report = run_strategies(&points, Preference::TIGHTEST, &EngineConfig::default()).unwrap();
        assert!(report.winner.is_none());
        assert!(report.clusters().is_empty());
        assert!(report.into_clusters().is_empty());
    }
}

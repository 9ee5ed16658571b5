//! Configuration types for the meeting-point engine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A configuration value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("scorer.min_threshold ({min}) must not exceed scorer.max_threshold ({max})")]
    ThresholdOrder { min: f64, max: f64 },
}

/// Guard for the exhaustive brute-force strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BruteForceConfig {
    /// Largest point count the enumerator accepts
    #[serde(default = "default_brute_force_max_points")]
    pub max_points: usize,

    /// Largest distinct-category count the enumerator accepts
    #[serde(default = "default_brute_force_max_categories")]
    pub max_categories: usize,
}

fn default_brute_force_max_points() -> usize {
    10
}

fn default_brute_force_max_categories() -> usize {
    3
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            max_points: default_brute_force_max_points(),
            max_categories: default_brute_force_max_categories(),
        }
    }
}

/// Data-derived DBSCAN parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityConfig {
    /// Percentile of pairwise distances used as the neighborhood radius
    #[serde(default = "default_eps_percentile")]
    pub eps_percentile: f64,

    /// Fraction of the point count used as the minimum neighborhood size
    #[serde(default = "default_min_samples_fraction")]
    pub min_samples_fraction: f64,
}

fn default_eps_percentile() -> f64 {
    10.0
}

fn default_min_samples_fraction() -> f64 {
    0.05
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            eps_percentile: default_eps_percentile(),
            min_samples_fraction: default_min_samples_fraction(),
        }
    }
}

/// K-means partitioning and the refinement loop around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Seed for k-means++ initialization
    #[serde(default)]
    pub seed: u64,

    /// Number of independent k-means runs; the lowest inertia wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,

    /// Lloyd iteration cap per run
    #[serde(default = "default_max_lloyd_iterations")]
    pub max_lloyd_iterations: usize,

    /// Refinement passes over the covering combinations
    #[serde(default = "default_refinement_iterations")]
    pub refinement_iterations: usize,

    /// Re-run k-means with `seed + iteration` on every refinement pass
    #[serde(default)]
    pub reseed_each_iteration: bool,
}

fn default_n_init() -> usize {
    1
}

fn default_max_lloyd_iterations() -> usize {
    300
}

fn default_refinement_iterations() -> usize {
    100
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            n_init: default_n_init(),
            max_lloyd_iterations: default_max_lloyd_iterations(),
            refinement_iterations: default_refinement_iterations(),
            reseed_each_iteration: false,
        }
    }
}

/// Acceptance threshold and strategy metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// WCSS cutoff at preference 0.0 (degrees squared)
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f64,

    /// WCSS cutoff at preference 1.0 (degrees squared)
    #[serde(default = "default_max_threshold")]
    pub max_threshold: f64,

    /// Exponent on the valid-cluster count in the combined metric
    #[serde(default = "default_count_weight")]
    pub count_weight: f64,
}

fn default_min_threshold() -> f64 {
    0.0001
}

fn default_max_threshold() -> f64 {
    0.0012
}

fn default_count_weight() -> f64 {
    2.0
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            min_threshold: default_min_threshold(),
            max_threshold: default_max_threshold(),
            count_weight: default_count_weight(),
        }
    }
}

/// Hard bounds on the combinatorial work a single request may do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Distinct categories accepted per request
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,

    /// Upper bound on the k-means cluster count
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,

    /// Density partitions with more labels than this are discarded
    #[serde(default = "default_max_labels")]
    pub max_labels: usize,

    /// Label combinations the cover step may enumerate
    #[serde(default = "default_max_combinations")]
    pub max_combinations: u64,
}

fn default_max_categories() -> usize {
    8
}

fn default_max_clusters() -> usize {
    60
}

fn default_max_labels() -> usize {
    60
}

fn default_max_combinations() -> u64 {
    1_000_000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_categories: default_max_categories(),
            max_clusters: default_max_clusters(),
            max_labels: default_max_labels(),
            max_combinations: default_max_combinations(),
        }
    }
}

/// Optional pre-pass collapsing same-category points that sit close together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Merge distance in meters
    #[serde(default = "default_merge_radius")]
    pub radius_m: f64,
}

fn default_merge_radius() -> f64 {
    250.0
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radius_m: default_merge_radius(),
        }
    }
}

/// Main engine configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub brute_force: BruteForceConfig,

    #[serde(default)]
    pub density: DensityConfig,

    #[serde(default)]
    pub partition: PartitionConfig,

    #[serde(default)]
    pub scorer: ScorerConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.density.eps_percentile;
        if !(p > 0.0 && p <= 100.0) {
            return Err(ConfigError::OutOfRange {
                field: "density.eps_percentile",
                expected: "in (0, 100]",
                value: p,
            });
        }

        let f = self.density.min_samples_fraction;
        if !(0.0..=1.0).contains(&f) {
            return Err(ConfigError::OutOfRange {
                field: "density.min_samples_fraction",
                expected: "in [0, 1]",
                value: f,
            });
        }

        let scorer = &self.scorer;
        for (field, value) in [
            ("scorer.min_threshold", scorer.min_threshold),
            ("scorer.max_threshold", scorer.max_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "finite and non-negative",
                    value,
                });
            }
        }
        if scorer.min_threshold > scorer.max_threshold {
            return Err(ConfigError::ThresholdOrder {
                min: scorer.min_threshold,
                max: scorer.max_threshold,
            });
        }
        if !(scorer.count_weight.is_finite() && scorer.count_weight > 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "scorer.count_weight",
                expected: "finite and greater than 1",
                value: scorer.count_weight,
            });
        }

        if self.partition.n_init == 0 {
            return Err(ConfigError::OutOfRange {
                field: "partition.n_init",
                expected: "at least 1",
                value: 0.0,
            });
        }

        if self.merge.enabled && !(self.merge.radius_m.is_finite() && self.merge.radius_m >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "merge.radius_m",
                expected: "finite and non-negative",
                value: self.merge.radius_m,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert_eq!(config.brute_force.max_points, 10);
        assert_eq!(config.brute_force.max_categories, 3);
        assert_eq!(config.density.eps_percentile, 10.0);
        assert_eq!(config.partition.refinement_iterations, 100);
        assert_eq!(config.scorer.count_weight, 2.0);
        assert!(!config.merge.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "scorer:\n  max_threshold: 0.002\npartition:\n  seed: 7\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scorer.max_threshold, 0.002);
        assert_eq!(config.scorer.min_threshold, 0.0001);
        assert_eq!(config.partition.seed, 7);
        assert_eq!(config.limits.max_categories, 8);
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.yaml");

        let mut config = EngineConfig::default();
        config.merge.enabled = true;
        config.to_yaml(&path).unwrap();

        let loaded = EngineConfig::from_yaml(&path).unwrap();
        assert!(loaded.merge.enabled);
        assert_eq!(loaded.limits.max_combinations, config.limits.max_combinations);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = EngineConfig::default();
        config.scorer.min_threshold = 0.01;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_weight_not_above_one() {
        let mut config = EngineConfig::default();
        config.scorer.count_weight = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_percentile() {
        let mut config = EngineConfig::default();
        config.density.eps_percentile = 0.0;
        assert!(config.validate().is_err());
    }
}

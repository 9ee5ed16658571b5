//! Candidate generation, scoring, and strategy selection.

pub mod arbiter;
pub mod brute_force;
pub mod cover;
pub mod density;
pub mod kmeans;
pub mod merge;
pub mod partition;
pub mod scorer;

// Re-export key types for convenience
pub use arbiter::{
    find_meeting_points, run_strategies, ArbiterReport, EngineError, Strategy, StrategyResult,
};
pub use cover::{cover_categories, Candidate};
pub use density::{dbscan, DensityOutcome, DensityParams};
pub use merge::merge_nearby;
pub use partition::LabelPartition;
pub use scorer::{evaluate, Evaluation, ScoredCluster};

//! Meeting-point search over categorized points of interest.
//!
//! Given points tagged with the category of errand they satisfy, this crate
//! finds small areas where every requested category is present and ranks them
//! by compactness. It provides:
//! - Great-circle geometry helpers
//! - Three candidate generators: exhaustive, DBSCAN, and seeded k-means
//! - A category-cover step that assembles one point per category
//! - A scorer that filters candidates by a quality/quantity preference
//! - An arbiter that runs the generators in parallel and keeps the best
//!
//! # Example
//!
//! ```
//! use meetpoint::{find_meeting_points, EngineConfig, Point, Preference};
//!
//! let points = vec![
//!     Point::new("Coffee", 47.6000, -122.3000),
//!     Point::new("Gym", 47.6002, -122.3001),
//!     Point::new("Coffee", 47.7000, -122.2000),
//! ];
//! let clusters = find_meeting_points(&points, Preference::default(), &EngineConfig::default()).unwrap();
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].rank, 1);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use crate::config::{ConfigError, EngineConfig};
pub use crate::core::point::{LatLng, Point, Preference};
pub use crate::processors::arbiter::{find_meeting_points, run_strategies, EngineError, Strategy};
pub use crate::processors::scorer::ScoredCluster;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

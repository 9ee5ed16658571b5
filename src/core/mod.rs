//! Core data types, geometry, and file I/O.

pub mod geo;
pub mod loaders;
pub mod point;
pub mod writers;

pub use loaders::{load_points, LoaderError};
pub use point::{CategoryIndex, InputError, LatLng, Point, Preference};
pub use writers::{write_clusters_csv, write_clusters_json, WriteError};

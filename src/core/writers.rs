//! Writers for ranked cluster results.
//!
//! - JSON: the cluster list as pretty-printed objects
//! - CSV: one row per member point, tagged with its cluster's rank and stats

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::processors::scorer::ScoredCluster;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// JSON serialization error.
    #[error("JSON write error for '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Write clusters as a pretty-printed JSON array.
///
/// # Example
///
/// ```no_run
/// use meetpoint::core::writers::write_clusters_json;
/// use std::path::Path;
///
/// write_clusters_json(Path::new("clusters.json"), &[]).unwrap();
/// ```
pub fn write_clusters_json(path: &Path, clusters: &[ScoredCluster]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;

    serde_json::to_writer_pretty(&mut writer, clusters).map_err(|e| WriteError::JsonError {
        path: path.display().to_string(),
        source: e,
    })?;
    writer.write_all(b"\n").and_then(|_| writer.flush()).map_err(|e| WriteError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Write clusters as CSV with one row per member point.
///
/// Columns: `rank,category,lat,lng,center_lat,center_lng,wcss,radius_m`.
pub fn write_clusters_csv(path: &Path, clusters: &[ScoredCluster]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut csv_writer = csv::Writer::from_writer(create_buffered_writer(path)?);
    let path_str = path.display().to_string();

    let csv_err = |e: csv::Error| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    };

    csv_writer
        .write_record([
            "rank",
            "category",
            "lat",
            "lng",
            "center_lat",
            "center_lng",
            "wcss",
            "radius_m",
        ])
        .map_err(csv_err)?;

    for cluster in clusters {
        for point in &cluster.points {
            csv_writer
                .write_record(&[
                    cluster.rank.to_string(),
                    point.category.clone(),
                    format!("{:.7}", point.lat),
                    format!("{:.7}", point.lng),
                    format!("{:.7}", cluster.center.lat),
                    format!("{:.7}", cluster.center.lng),
                    format!("{:.6e}", cluster.wcss),
                    format!("{:.1}", cluster.radius_m),
                ])
                .map_err(csv_err)?;
        }
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })?;

    Ok(())
}

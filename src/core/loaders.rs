//! Loaders for point-of-interest files.
//!
//! Two formats are accepted:
//! - JSON: an array of `{"category" | "name", "lat", "lng"}` objects
//! - CSV: a header row with category, lat, and lng columns

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

use super::point::Point;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Point file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFormat {
    Json,
    Csv,
}

impl PointFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(PointFormat::Json),
            "csv" => Some(PointFormat::Csv),
            _ => None,
        }
    }
}

const CATEGORY_COLUMNS: &[&str] = &["category", "name"];
const LAT_COLUMNS: &[&str] = &["lat", "latitude"];
const LNG_COLUMNS: &[&str] = &["lng", "lon", "long", "longitude"];

fn find_column(col_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|name| col_map.get(*name).copied())
}

/// Load points from a JSON array.
pub fn load_points_json<P: AsRef<Path>>(path: P) -> Result<Vec<Point>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let points: Vec<Point> = serde_json::from_reader(BufReader::new(file))?;

    if points.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }
    Ok(points)
}

/// Load points from a CSV file with a header row.
///
/// Column names are matched case-insensitively. The category column may be
/// named `category` or `name`; `latitude` and `lon`/`longitude` are accepted
/// for the coordinates.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a required column is
/// missing, or a coordinate does not parse.
pub fn load_points_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Point>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let col_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    let (cat_idx, lat_idx, lng_idx) = match (
        find_column(&col_map, CATEGORY_COLUMNS),
        find_column(&col_map, LAT_COLUMNS),
        find_column(&col_map, LNG_COLUMNS),
    ) {
        (Some(c), Some(la), Some(ln)) => (c, la, ln),
        _ => {
            return Err(LoaderError::MissingColumns(format!(
                "expected category, lat, lng in header [{}]",
                headers.iter().collect::<Vec<_>>().join(", ")
            )))
        }
    };

    let mut points = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let parse = |idx: usize, what: &str| -> Result<f64> {
            record
                .get(idx)
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| LoaderError::ParseError(format!("row {}: invalid {}", row + 1, what)))
        };

        let category = record.get(cat_idx).unwrap_or_default().to_string();
        let lat = parse(lat_idx, "lat")?;
        let lng = parse(lng_idx, "lng")?;
        points.push(Point::new(category, lat, lng));
    }

    if points.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }
    Ok(points)
}

/// Load points, choosing the parser from the file extension.
pub fn load_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point>> {
    let path = path.as_ref();
    match PointFormat::from_path(path) {
        Some(PointFormat::Json) => load_points_json(path),
        Some(PointFormat::Csv) => load_points_csv(path),
        None => Err(LoaderError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_with_suffix(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_load_points_csv() -> Result<()> {
        let mut file = temp_with_suffix(".csv");
        writeln!(file, "Category,Lat,Lng").unwrap();
        writeln!(file, "Coffee, 47.6, -122.3").unwrap();
        writeln!(file, "Gym,47.61,-122.31").unwrap();
        file.flush().unwrap();

        let points = load_points(file.path())?;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point::new("Coffee", 47.6, -122.3));
        assert_eq!(points[1].category, "Gym");
        Ok(())
    }

    #[test]
    fn test_load_points_csv_aliases() -> Result<()> {
        let mut file = temp_with_suffix(".csv");
        writeln!(file, "longitude,name,latitude").unwrap();
        writeln!(file, "-122.3,Bank,47.6").unwrap();
        file.flush().unwrap();

        let points = load_points_csv(file.path())?;
        assert_eq!(points, vec![Point::new("Bank", 47.6, -122.3)]);
        Ok(())
    }

    #[test]
    fn test_load_points_csv_missing_column() {
        let mut file = temp_with_suffix(".csv");
        writeln!(file, "category,lat").unwrap();
        writeln!(file, "Coffee,47.6").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_points_csv(file.path()),
            Err(LoaderError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_load_points_csv_bad_number() {
        let mut file = temp_with_suffix(".csv");
        writeln!(file, "category,lat,lng").unwrap();
        writeln!(file, "Coffee,north,-122.3").unwrap();
        file.flush().unwrap();

        match load_points_csv(file.path()) {
            Err(LoaderError::ParseError(msg)) => assert!(msg.contains("row 1")),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_points_csv_header_only() {
        let mut file = temp_with_suffix(".csv");
        writeln!(file, "category,lat,lng").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_points_csv(file.path()),
            Err(LoaderError::EmptyFile(_))
        ));
    }

    #[test]
    fn test_load_points_json() -> Result<()> {
        let mut file = temp_with_suffix(".json");
        write!(
            file,
            r#"[{{"name":"LA Fitness","lat":47.662302,"lng":-122.3755124}},
               {{"category":"Coffee","lat":47.66,"lng":-122.37}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let points = load_points(file.path())?;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].category, "LA Fitness");
        assert_eq!(points[1].category, "Coffee");
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_with_suffix(".txt");
        assert!(matches!(
            load_points(file.path()),
            Err(LoaderError::UnsupportedFormat(_))
        ));
    }
}

//! Point-of-interest, category, and preference types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating caller input, before any strategy runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("no points provided")]
    EmptyPoints,

    #[error("point {index} has an empty category")]
    MissingCategory { index: usize },

    #[error("point {index} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { index: usize, lat: f64, lng: f64 },

    #[error("preference must be a finite value in [0, 1], got {0}")]
    InvalidPreference(f64),

    #[error("preference level must be in -2..=2, got {0}")]
    InvalidLevel(i8),
}

/// A decimal-degree coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A geocoded point of interest tagged with the category it satisfies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Destination kind, e.g. "Coffee". Accepts `name` on input.
    #[serde(alias = "name")]
    pub category: String,
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(category: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            category: category.into(),
            lat,
            lng,
        }
    }

    #[inline]
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Bit-exact location key. Negative zero is folded into positive zero.
    #[inline]
    pub fn location_key(&self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lng + 0.0).to_bits())
    }
}

/// Check that the point list is non-empty and every point is well formed.
pub fn validate_points(points: &[Point]) -> Result<(), InputError> {
    if points.is_empty() {
        return Err(InputError::EmptyPoints);
    }

    for (index, point) in points.iter().enumerate() {
        if point.category.trim().is_empty() {
            return Err(InputError::MissingCategory { index });
        }
        let lat_ok = point.lat.is_finite() && (-90.0..=90.0).contains(&point.lat);
        let lng_ok = point.lng.is_finite() && (-180.0..=180.0).contains(&point.lng);
        if !lat_ok || !lng_ok {
            return Err(InputError::InvalidCoordinates {
                index,
                lat: point.lat,
                lng: point.lng,
            });
        }
    }

    Ok(())
}

/// Dense category numbering for a point list.
///
/// Categories are numbered `0..C` in lexicographic order of their names, and
/// every point is mapped to its category number. Generators work on these
/// numbers instead of comparing strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndex {
    names: Vec<String>,
    of_point: Vec<usize>,
}

impl CategoryIndex {
    pub fn build(points: &[Point]) -> Self {
        let mut ids: BTreeMap<&str, usize> = BTreeMap::new();
        for point in points {
            ids.entry(point.category.as_str()).or_insert(0);
        }
        for (id, slot) in ids.values_mut().enumerate() {
            *slot = id;
        }

        let of_point = points
            .iter()
            .map(|p| ids[p.category.as_str()])
            .collect();
        let names = ids.keys().map(|s| s.to_string()).collect();

        Self { names, of_point }
    }

    /// Number of distinct categories.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of indexed points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.of_point.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Category number of the point at `point`.
    #[inline]
    pub fn of(&self, point: usize) -> usize {
        self.of_point[point]
    }
}

/// Caller-tunable quality/quantity trade-off in `[0, 1]`.
///
/// `0.0` asks for few, tight clusters; `1.0` accepts more, looser ones.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Preference(f64);

impl Preference {
    pub const TIGHTEST: Preference = Preference(0.0);
    pub const LOOSEST: Preference = Preference(1.0);

    pub fn new(value: f64) -> Result<Self, InputError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InputError::InvalidPreference(value))
        }
    }

    /// Map the five-step UI scale onto `[0, 1]`.
    ///
    /// Higher levels are stricter: `2` maps to `0.0` and `-2` to `1.0`.
    pub fn from_level(level: i8) -> Result<Self, InputError> {
        if !(-2..=2).contains(&level) {
            return Err(InputError::InvalidLevel(level));
        }
        Ok(Self(f64::from(2 - level) / 4.0))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_loosest(self) -> bool {
        self.0 >= 1.0
    }
}

impl Default for Preference {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f64> for Preference {
    type Error = InputError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

//! Shape normalization.
//!
//! Converts the shape representations accepted from callers into the
//! internal [`Point`] sequence used by the rest of the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::HeightError;
use crate::point::Point;
use crate::polyline;

/// A shape point as supplied by a caller.
///
/// Unknown fields (for example a location `type`) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShapePoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl From<Point> for ShapePoint {
    fn from(p: Point) -> Self {
        Self {
            lat: p.lat,
            lon: p.lon,
        }
    }
}

/// Convert caller shape points into a path, preserving order.
///
/// # Errors
///
/// - [`HeightError::InsufficientShape`] if `raw` is empty
/// - [`HeightError::InvalidCoordinate`] if a point is not a valid WGS84 position
pub fn normalize(raw: &[ShapePoint]) -> Result<Vec<Point>, HeightError> {
    if raw.is_empty() {
        return Err(HeightError::InsufficientShape);
    }

    raw.iter()
        .map(|sp| validated(Point::new(sp.lon, sp.lat)))
        .collect()
}

/// Decode a polyline6 string into a path.
///
/// # Errors
///
/// Fails like [`normalize`], or with [`HeightError::InvalidEncodedPolyline`]
/// when the string is malformed.
pub fn from_encoded(encoded: &str) -> Result<Vec<Point>, HeightError> {
    let path = polyline::decode(encoded)?;
    if path.is_empty() {
        return Err(HeightError::InsufficientShape);
    }
    path.into_iter().map(validated).collect()
}

pub(crate) fn validated(p: Point) -> Result<Point, HeightError> {
    if p.is_valid() {
        Ok(p)
    } else {
        Err(HeightError::InvalidCoordinate {
            lat: p.lat,
            lon: p.lon,
        })
    }
}

//! GeoJSON input and output for elevation profiles.
//!
//! Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use heightline::geojson::{profile_to_geometry, shape_from_geometry};
//! use geojson::Geometry;
//!
//! let line: Geometry = r#"{"type": "LineString", "coordinates": [[138.5, 35.5], [138.6, 35.6]]}"#
//!     .parse()?;
//! let path = shape_from_geometry(&line)?;
//!
//! // ... run the pipeline ...
//!
//! let enriched = profile_to_geometry(&response);
//! // {"type": "LineString", "coordinates": [[138.5, 35.5, 500.0], [138.6, 35.6, 750.0]]}
//! ```

use geojson::{Geometry, Position, Value as GeoJsonValue};

use crate::error::HeightError;
use crate::height::HeightResponse;
use crate::point::Point;
use crate::shape::validated;

/// Build a path from a GeoJSON geometry.
///
/// Accepts `Point`, `MultiPoint` and `LineString`, with coordinates in GeoJSON
/// `[lon, lat]` order. Any altitude already present is ignored.
///
/// # Errors
///
/// - [`HeightError::UnsupportedGeometry`] for any other geometry type
/// - [`HeightError::InsufficientShape`] for an empty geometry
/// - [`HeightError::InvalidCoordinate`] for a position with fewer than two
///   values or outside valid ranges
pub fn shape_from_geometry(geometry: &Geometry) -> Result<Vec<Point>, HeightError> {
    let positions: &[Position] = match &geometry.value {
        GeoJsonValue::Point(p) => std::slice::from_ref(p),
        GeoJsonValue::MultiPoint(ps) | GeoJsonValue::LineString(ps) => ps,
        other => {
            return Err(HeightError::UnsupportedGeometry {
                kind: geometry_kind(other).to_string(),
            })
        }
    };

    if positions.is_empty() {
        return Err(HeightError::InsufficientShape);
    }
    positions.iter().map(|p| position_to_point(p)).collect()
}

/// Render a profile as a GeoJSON geometry with elevation as the Z value.
///
/// A single-point profile becomes a `Point`, anything longer a `LineString`.
/// Points without elevation data keep only `[lon, lat]`.
pub fn profile_to_geometry(response: &HeightResponse) -> Geometry {
    let heights: Vec<Option<f64>> = match (&response.height, &response.range_height) {
        (Some(h), _) => h.clone(),
        (None, Some(pairs)) => pairs.iter().map(|p| p.1).collect(),
        (None, None) => vec![None; response.shape.len()],
    };

    let mut coords: Vec<Position> = response
        .shape
        .iter()
        .zip(heights)
        .map(|(p, h)| match h {
            Some(h) => vec![p.lon, p.lat, h],
            None => vec![p.lon, p.lat],
        })
        .collect();

    let value = if coords.len() == 1 {
        GeoJsonValue::Point(coords.remove(0))
    } else {
        GeoJsonValue::LineString(coords)
    };
    Geometry::new(value)
}

fn position_to_point(position: &[f64]) -> Result<Point, HeightError> {
    match position {
        [lon, lat, ..] => validated(Point::new(*lon, *lat)),
        _ => Err(HeightError::InvalidCoordinate {
            lat: position.get(1).copied().unwrap_or(f64::NAN),
            lon: position.first().copied().unwrap_or(f64::NAN),
        }),
    }
}

fn geometry_kind(value: &GeoJsonValue) -> &'static str {
    match value {
        GeoJsonValue::Point(_) => "Point",
        GeoJsonValue::MultiPoint(_) => "MultiPoint",
        GeoJsonValue::LineString(_) => "LineString",
        GeoJsonValue::MultiLineString(_) => "MultiLineString",
        GeoJsonValue::Polygon(_) => "Polygon",
        GeoJsonValue::MultiPolygon(_) => "MultiPolygon",
        GeoJsonValue::GeometryCollection(_) => "GeometryCollection",
    }
}

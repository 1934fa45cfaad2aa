//! Geographic points and great-circle math.
//!
//! Distances and interpolation use the haversine formulas from the [`geo`]
//! crate (mean earth radius, 6371008.8 m).

use geo::{point, HaversineDistance, HaversineIntermediate};
use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees (WGS84).
///
/// Serializes as `{"lat": .., "lon": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Point {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl Point {
    /// Create a point from longitude and latitude.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to `other` in meters.
    ///
    /// # Example
    ///
    /// ```
    /// use heightline::Point;
    ///
    /// let d = Point::new(0.0, 0.0).distance(&Point::new(0.0, 1.0));
    /// assert!((d - 111_195.08).abs() < 1.0);
    /// ```
    pub fn distance(&self, other: &Point) -> f64 {
        self.to_geo().haversine_distance(&other.to_geo())
    }

    /// Point at fraction `f` (0.0 to 1.0) along the great circle to `other`.
    pub fn intermediate(&self, other: &Point, f: f64) -> Point {
        let p = self.to_geo().haversine_intermediate(&other.to_geo(), f);
        Point::new(p.x(), p.y())
    }

    fn to_geo(self) -> geo::Point<f64> {
        point!(x: self.lon, y: self.lat)
    }
}

/// Total great-circle length of a path in meters.
pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

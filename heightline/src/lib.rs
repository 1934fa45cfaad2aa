//! # heightline - Elevation profiles along geographic paths
//!
//! Given a path as an ordered sequence of points, heightline reports the
//! elevation at every point and, optionally, the cumulative distance along
//! the path, ready to plot as an elevation profile.
//!
//! ## Features
//!
//! - **Exact resampling**: paths can be re-sampled every N meters along
//!   great circles, always keeping the original endpoints
//! - **Bounded**: oversized requests are rejected before any elevation data
//!   is read
//! - **SRTM backed**: memory-mapped `.hgt` tiles (SRTM1/SRTM3) with an LRU
//!   tile cache and optional download of missing tiles
//! - **Pluggable**: any [`ElevationSource`] can stand in for SRTM
//!
//! ## Quick Start
//!
//! ```ignore
//! use heightline::{height, HeightLimits, HeightRequest, SrtmService};
//!
//! let service = SrtmService::new("/data/srtm", 100);
//! let request: HeightRequest = serde_json::from_str(
//!     r#"{"encoded_polyline": "_izlhA~rlgdF_{geC~ywl@_kwzCn`{nI", "range": true}"#,
//! )?;
//!
//! let response = height(request, &service, &HeightLimits::default())?;
//! println!("{}", serde_json::to_string(&response)?);
//! ```
//!
//! ## Shapes
//!
//! Paths arrive as `{lat, lon}` objects, as a polyline6 string (see
//! [`polyline`]) or, with the `geojson` feature, as a GeoJSON geometry.
//!
//! ## SRTM Data Format
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Each sample is a 16-bit big-endian signed integer in meters. The special
//! value -32768 marks a void; voids are reported as "no data".

pub mod config;
#[cfg(feature = "download")]
pub mod download;
pub mod error;
pub mod filename;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod height;
pub mod point;
pub mod polyline;
pub mod resample;
pub mod service;
pub mod shape;
pub mod source;
pub mod tile;

pub use config::HeightLimits;
pub use error::{HeightError, Result, SrtmError};
pub use height::{
    accumulate_ranges, assemble, height, query, shape_from_request, HeightRequest,
    HeightResponse, RangeHeight,
};
pub use point::Point;
pub use resample::{resample, resample_spherical_polyline, Resampled};
pub use service::{CacheStats, SrtmService, SrtmServiceBuilder};
pub use shape::ShapePoint;
pub use source::{ElevationSource, NO_DATA_VALUE};
pub use tile::{SrtmResolution, SrtmTile, VOID_VALUE};

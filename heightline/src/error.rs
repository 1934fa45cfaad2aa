//! Error types for the heightline library.
//!
//! [`SrtmError`] covers the SRTM elevation source (tile files, cache, downloads).
//! [`HeightError`] covers the elevation profile pipeline and carries the stable
//! numeric codes exposed to callers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with SRTM data.
#[derive(Error, Debug)]
pub enum SrtmError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File size doesn't match SRTM1 or SRTM3 format.
    #[error("Invalid file size: {size} bytes (expected 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidFileSize { size: usize },

    /// Coordinates are outside valid SRTM coverage.
    #[error("Coordinates out of bounds: lat={lat}, lon={lon} (valid: lat ±60°, lon ±180°)")]
    OutOfBounds { lat: f64, lon: f64 },

    /// The required .hgt file was not found.
    #[error("SRTM file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The tile is neither on disk nor obtainable from the download source.
    #[error("SRTM tile not available: {filename}")]
    TileNotAvailable { filename: String },

    /// A tile download failed.
    #[error("Failed to download {filename}: {reason}")]
    DownloadFailed { filename: String, reason: String },

    /// HTTP transport error while downloading.
    #[cfg(feature = "download")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using [`SrtmError`].
pub type Result<T> = std::result::Result<T, SrtmError>;

/// Boxed error produced by an [`ElevationSource`](crate::ElevationSource).
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the elevation profile pipeline.
///
/// Every variant maps to a stable numeric [`code`](HeightError::code).
#[derive(Error, Debug)]
pub enum HeightError {
    /// The request carried no shape points.
    #[error("insufficient shape points")]
    InsufficientShape,

    /// The requested resample distance is below the configured minimum.
    #[error("resample distance below minimum of {min} meters")]
    SpacingTooSmall { min: f64 },

    /// More shape points than the configured limit.
    #[error("shape too large ({count}{}); limit is {limit}", resample_note(.resampled))]
    ShapeTooLarge {
        count: usize,
        limit: usize,
        resampled: bool,
    },

    /// The elevation source could not produce samples.
    #[error("elevation source failure: {0}")]
    ElevationSourceFailure(#[source] SourceError),

    /// The encoded polyline could not be decoded.
    #[error("invalid encoded polyline: {reason}")]
    InvalidEncodedPolyline { reason: String },

    /// A shape point is not a finite WGS84 coordinate.
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// The geometry type cannot describe a path.
    #[error("unsupported geometry type: {kind}")]
    UnsupportedGeometry { kind: String },
}

fn resample_note(resampled: &bool) -> &'static str {
    if *resampled {
        " after resampling"
    } else {
        ""
    }
}

impl HeightError {
    /// Stable numeric code for this error.
    pub fn code(&self) -> u16 {
        match self {
            HeightError::InsufficientShape => 312,
            HeightError::SpacingTooSmall { .. } => 313,
            HeightError::ShapeTooLarge { .. } => 314,
            HeightError::ElevationSourceFailure(_) => 315,
            HeightError::InvalidEncodedPolyline { .. } => 316,
            HeightError::InvalidCoordinate { .. } => 317,
            HeightError::UnsupportedGeometry { .. } => 318,
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, HeightError::ElevationSourceFailure(_))
    }
}

//! The elevation data source seam.

use std::sync::Arc;

use crate::point::Point;

/// Height reported for points without elevation data.
pub const NO_DATA_VALUE: f64 = -32768.0;

/// Something that can report the elevation of a sequence of points.
///
/// Implementations must return exactly one value per input point, in input
/// order, using [`NO_DATA_VALUE`] where no data exists. Errors are reserved
/// for failures of the source itself (I/O, corrupt data, network).
pub trait ElevationSource {
    /// Error produced when the source fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sample the elevation of every point in one batched call.
    fn sample_all(&self, points: &[Point]) -> Result<Vec<f64>, Self::Error>;
}

impl<S: ElevationSource + ?Sized> ElevationSource for &S {
    type Error = S::Error;

    fn sample_all(&self, points: &[Point]) -> Result<Vec<f64>, Self::Error> {
        (**self).sample_all(points)
    }
}

impl<S: ElevationSource + ?Sized> ElevationSource for Arc<S> {
    type Error = S::Error;

    fn sample_all(&self, points: &[Point]) -> Result<Vec<f64>, Self::Error> {
        (**self).sample_all(points)
    }
}

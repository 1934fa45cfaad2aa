//! Path resampling along great circles.
//!
//! [`resample`] is the entry point used by the pipeline: it validates the
//! requested spacing, resamples the path while keeping both endpoints exact,
//! re-encodes the display polyline and enforces the shape size limit.

use crate::config::HeightLimits;
use crate::error::HeightError;
use crate::point::{self, Point};
use crate::polyline;

/// Samples closer than this (meters) to a segment end are left to the next
/// segment, or to the appended endpoint on the last one.
const END_TOLERANCE: f64 = 1e-6;

/// Result of [`resample`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// The path to sample, resampled or as supplied.
    pub path: Vec<Point>,
    /// The display polyline, regenerated when the path was resampled.
    pub encoded_polyline: Option<String>,
    /// Whether the path was replaced by a resampled one.
    pub resampled: bool,
}

/// Resample `path` every `spacing` meters and enforce the shape limit.
///
/// - `spacing` of `None` leaves the path untouched.
/// - Paths with fewer than two points are never resampled.
/// - The first and last points of the result are the original endpoints.
///
/// # Errors
///
/// - [`HeightError::SpacingTooSmall`] if `spacing` is below `limits.min_resample`
/// - [`HeightError::ShapeTooLarge`] if the resulting path exceeds
///   `limits.max_elevation_shape` points
pub fn resample(
    path: Vec<Point>,
    spacing: Option<f64>,
    encoded_polyline: Option<String>,
    limits: &HeightLimits,
) -> Result<Resampled, HeightError> {
    let mut result = Resampled {
        path,
        encoded_polyline,
        resampled: false,
    };

    if let Some(spacing) = spacing {
        // Written this way so NaN is rejected too
        if !(spacing >= limits.min_resample) {
            return Err(HeightError::SpacingTooSmall {
                min: limits.min_resample,
            });
        }

        if result.path.len() > 1 {
            // Reject before interpolating; the count is a lower bound
            let minimum = minimum_resampled_len(&result.path, spacing);
            if minimum > limits.max_elevation_shape {
                return Err(HeightError::ShapeTooLarge {
                    count: minimum,
                    limit: limits.max_elevation_shape,
                    resampled: true,
                });
            }

            let last = result.path[result.path.len() - 1];
            let mut resampled = resample_spherical_polyline(&result.path, spacing);
            resampled.push(last);

            tracing::debug!(
                spacing,
                before = result.path.len(),
                after = resampled.len(),
                "Resampled shape"
            );

            if result.encoded_polyline.is_some() {
                result.encoded_polyline = Some(polyline::encode(&resampled));
            }
            result.path = resampled;
            result.resampled = true;
        }
    }

    if result.path.len() > limits.max_elevation_shape {
        return Err(HeightError::ShapeTooLarge {
            count: result.path.len(),
            limit: limits.max_elevation_shape,
            resampled: result.resampled,
        });
    }

    Ok(result)
}

/// Fewest points [`resample`] can produce for `path` at `spacing`,
/// endpoints included.
fn minimum_resampled_len(path: &[Point], spacing: f64) -> usize {
    let whole_steps = (point::path_length(path) / spacing).floor();
    // `as` saturates, so huge paths clamp instead of wrapping
    (whole_steps as usize).saturating_add(1)
}

/// Walk `path` along its great-circle segments emitting a point every
/// `spacing` meters of travelled distance.
///
/// The output starts with the original first point. Samples are taken at
/// distances `k * spacing` (`k >= 1`) strictly before the end of the path, so
/// the original last point is never part of the output; callers append it.
/// Zero-length segments are skipped.
///
/// # Example
///
/// ```
/// use heightline::{resample::resample_spherical_polyline, Point};
///
/// let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 0.01)];
/// let samples = resample_spherical_polyline(&path, 500.0);
/// assert_eq!(samples[0], path[0]);
/// assert_eq!(samples.len(), 3); // 0 m, 500 m, 1000 m of ~1112 m
/// ```
pub fn resample_spherical_polyline(path: &[Point], spacing: f64) -> Vec<Point> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };

    let mut out = vec![first];
    if !(spacing > 0.0) {
        return out;
    }

    let mut k = 1u64;
    let mut travelled = 0.0;

    for w in path.windows(2) {
        let seg = w[0].distance(&w[1]);
        if seg <= 0.0 {
            continue;
        }

        let seg_end = travelled + seg;
        loop {
            let target = k as f64 * spacing;
            if target >= seg_end - END_TOLERANCE {
                break;
            }
            let f = ((target - travelled) / seg).clamp(0.0, 1.0);
            out.push(w[0].intermediate(&w[1], f));
            k += 1;
        }
        travelled = seg_end;
    }

    out
}

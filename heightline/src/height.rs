//! The elevation profile pipeline.
//!
//! A height request flows through five steps:
//!
//! 1. the shape is normalized into a [`Point`] path ([`shape_from_request`]),
//! 2. optionally resampled and checked against the size limit ([`resample`]),
//! 3. sampled against an [`ElevationSource`] in one batch ([`query`]),
//! 4. optionally turned into cumulative distances ([`accumulate_ranges`]),
//! 5. packaged into a [`HeightResponse`] ([`assemble`]).
//!
//! Every request-caused error is detected before the elevation source is
//! touched.
//!
//! # Example
//!
//! ```ignore
//! use heightline::{height, HeightLimits, HeightRequest, SrtmService};
//!
//! let service = SrtmService::new("/data/srtm", 100);
//! let request: HeightRequest = serde_json::from_str(
//!     r#"{"shape": [{"lat": 40.712433, "lon": -76.504913}, {"lat": 40.712276, "lon": -76.605263}],
//!         "range": true, "resample_distance": 100}"#,
//! )?;
//! let response = height(request, &service, &HeightLimits::default())?;
//! ```

use serde::{Deserialize, Serialize};

use crate::config::HeightLimits;
use crate::error::HeightError;
use crate::point::Point;
use crate::resample::{resample, Resampled};
use crate::shape::{self, ShapePoint};
use crate::source::{ElevationSource, NO_DATA_VALUE};

/// Largest supported `height_precision`.
pub const MAX_HEIGHT_PRECISION: u8 = 2;

/// A request for the elevation profile of one path.
///
/// Absent optional fields mean: no resampling, no ranges, whole-meter
/// heights, analytics enabled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HeightRequest {
    /// Caller supplied identifier, echoed in the response.
    #[serde(default)]
    pub id: Option<String>,
    /// Path points in travel order.
    #[serde(default)]
    pub shape: Vec<ShapePoint>,
    /// Polyline6 form of the path; takes precedence over `shape`.
    #[serde(default)]
    pub encoded_polyline: Option<String>,
    /// Resample the path every this many meters.
    #[serde(default)]
    pub resample_distance: Option<f64>,
    /// Include cumulative distances in the response.
    #[serde(default)]
    pub range: bool,
    /// Decimal places kept in heights (0 to 2).
    #[serde(default)]
    pub height_precision: u8,
    /// Suppress analytics logging for this request.
    #[serde(default)]
    pub do_not_track: bool,
}

/// `[range, height]` pair of a profile with ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeHeight(pub f64, pub Option<f64>);

/// Elevation profile of one path.
///
/// Exactly one of `height` and `range_height` is present. Heights without
/// data serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HeightResponse {
    /// Identifier from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The sampled points, after any resampling.
    pub shape: Vec<Point>,
    /// Polyline6 form of `shape`, present when the request was encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
    /// One height per shape point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Vec<Option<f64>>>,
    /// One `[range, height]` pair per shape point.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Vec<f64>>>))]
    pub range_height: Option<Vec<RangeHeight>>,
}

/// Compute the elevation profile described by `request`.
///
/// # Errors
///
/// Any [`HeightError`]; only [`HeightError::ElevationSourceFailure`] can
/// occur after the elevation source has been queried.
pub fn height<S: ElevationSource>(
    request: HeightRequest,
    source: &S,
    limits: &HeightLimits,
) -> Result<HeightResponse, HeightError> {
    let path = shape_from_request(&request)?;

    let Resampled {
        path,
        encoded_polyline,
        resampled,
    } = resample(
        path,
        request.resample_distance,
        request.encoded_polyline,
        limits,
    )?;

    let heights = query(source, &path)?;
    if !request.do_not_track {
        tracing::info!(
            target: "analytics",
            sample_count = path.len(),
            resampled,
            "Height request"
        );
    }

    let ranges = request.range.then(|| accumulate_ranges(&path));

    Ok(assemble(
        request.id,
        path,
        encoded_polyline,
        heights,
        ranges,
        request.height_precision,
    ))
}

/// Normalize the request's shape. An encoded polyline wins over `shape`.
pub fn shape_from_request(request: &HeightRequest) -> Result<Vec<Point>, HeightError> {
    match request.encoded_polyline.as_deref() {
        Some(encoded) => shape::from_encoded(encoded),
        None => shape::normalize(&request.shape),
    }
}

/// Sample every point of `path` in one call to `source`.
///
/// # Panics
///
/// Panics if the source breaks its contract by returning a different number
/// of samples than points.
pub fn query<S: ElevationSource>(source: &S, path: &[Point]) -> Result<Vec<f64>, HeightError> {
    let heights = source
        .sample_all(path)
        .map_err(|e| HeightError::ElevationSourceFailure(Box::new(e)))?;

    assert_eq!(
        heights.len(),
        path.len(),
        "elevation source returned {} samples for {} points",
        heights.len(),
        path.len()
    );

    Ok(heights)
}

/// Cumulative great-circle distance from the first point, in meters.
///
/// # Example
///
/// ```
/// use heightline::{accumulate_ranges, Point};
///
/// let ranges = accumulate_ranges(&[Point::new(0.0, 0.0), Point::new(0.0, 1.0)]);
/// assert_eq!(ranges[0], 0.0);
/// assert!((ranges[1] - 111_195.0).abs() < 1.0);
/// ```
pub fn accumulate_ranges(path: &[Point]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(path.len());
    if path.is_empty() {
        return ranges;
    }

    ranges.push(0.0);
    for w in path.windows(2) {
        let prev = ranges[ranges.len() - 1];
        ranges.push(prev + w[0].distance(&w[1]));
    }
    ranges
}

/// Package a profile.
///
/// Heights are rounded to `height_precision` decimals (at most
/// [`MAX_HEIGHT_PRECISION`]) and ranges to whole meters.
///
/// # Panics
///
/// Panics if `heights` or `ranges` are not aligned with `path`.
pub fn assemble(
    id: Option<String>,
    path: Vec<Point>,
    encoded_polyline: Option<String>,
    heights: Vec<f64>,
    ranges: Option<Vec<f64>>,
    height_precision: u8,
) -> HeightResponse {
    assert_eq!(heights.len(), path.len(), "heights not aligned with shape");

    let scale = 10f64.powi(i32::from(height_precision.min(MAX_HEIGHT_PRECISION)));
    let rounded = heights.into_iter().map(|h| {
        (h != NO_DATA_VALUE && h.is_finite()).then(|| (h * scale).round() / scale)
    });

    let (height, range_height) = match ranges {
        Some(ranges) => {
            assert_eq!(ranges.len(), path.len(), "ranges not aligned with shape");
            let pairs = ranges
                .into_iter()
                .zip(rounded)
                .map(|(r, h)| RangeHeight(r.round(), h))
                .collect();
            (None, Some(pairs))
        }
        None => (Some(rounded.collect()), None),
    };

    HeightResponse {
        id,
        shape: path,
        encoded_polyline,
        height,
        range_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyline;
    use std::cell::Cell;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Reports `lat * 100` for every point and counts calls.
    #[derive(Default)]
    struct SlopeSource {
        calls: Cell<usize>,
    }

    impl ElevationSource for SlopeSource {
        type Error = io::Error;

        fn sample_all(&self, points: &[Point]) -> Result<Vec<f64>, io::Error> {
            self.calls.set(self.calls.get() + 1);
            Ok(points.iter().map(|p| p.lat * 100.0).collect())
        }
    }

    struct FailingSource;

    impl ElevationSource for FailingSource {
        type Error = io::Error;

        fn sample_all(&self, _points: &[Point]) -> Result<Vec<f64>, io::Error> {
            Err(io::Error::new(io::ErrorKind::NotFound, "tile store offline"))
        }
    }

    struct ShortSource;

    impl ElevationSource for ShortSource {
        type Error = io::Error;

        fn sample_all(&self, points: &[Point]) -> Result<Vec<f64>, io::Error> {
            Ok(vec![0.0; points.len().saturating_sub(1)])
        }
    }

    /// Log sink shared with a `fmt` subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `request` and return everything logged while it ran.
    fn logged_while(request: HeightRequest) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            height(request, &SlopeSource::default(), &limits()).unwrap();
        });

        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn two_points() -> Vec<ShapePoint> {
        vec![
            ShapePoint { lat: 0.0, lon: 0.0 },
            ShapePoint { lat: 1.0, lon: 0.0 },
        ]
    }

    fn limits() -> HeightLimits {
        HeightLimits::new(1.0, 1000)
    }

    #[test]
    fn test_height_without_range() {
        let request = HeightRequest {
            shape: two_points(),
            ..Default::default()
        };
        let response = height(request, &SlopeSource::default(), &limits()).unwrap();

        assert_eq!(response.shape.len(), 2);
        assert_eq!(response.shape[1], Point::new(0.0, 1.0));
        assert_eq!(response.height, Some(vec![Some(0.0), Some(100.0)]));
        assert!(response.range_height.is_none());
    }

    #[test]
    fn test_height_with_range() {
        let request = HeightRequest {
            shape: two_points(),
            range: true,
            ..Default::default()
        };
        let response = height(request, &SlopeSource::default(), &limits()).unwrap();

        assert!(response.height.is_none());
        let pairs = response.range_height.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], RangeHeight(0.0, Some(0.0)));
        assert!((pairs[1].0 - 111_195.0).abs() < 1.0);
        assert_eq!(pairs[1].1, Some(100.0));
    }

    #[test]
    fn test_analytics_event_logged() {
        let logs = logged_while(HeightRequest {
            shape: two_points(),
            ..Default::default()
        });
        assert!(logs.contains("analytics"), "logs: {}", logs);
        assert!(logs.contains("sample_count=2"), "logs: {}", logs);
        assert!(logs.contains("resampled=false"), "logs: {}", logs);
    }

    #[test]
    fn test_do_not_track_suppresses_analytics() {
        let logs = logged_while(HeightRequest {
            shape: two_points(),
            do_not_track: true,
            ..Default::default()
        });
        assert!(!logs.contains("analytics"), "logs: {}", logs);
        assert!(!logs.contains("sample_count"), "logs: {}", logs);
    }

    #[test]
    fn test_empty_shape() {
        let source = SlopeSource::default();
        let err = height(HeightRequest::default(), &source, &limits()).unwrap_err();
        assert!(matches!(err, HeightError::InsufficientShape));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_spacing_too_small_before_query() {
        let source = SlopeSource::default();
        let request = HeightRequest {
            shape: vec![
                ShapePoint { lat: 0.0, lon: 0.0 },
                ShapePoint { lat: 0.5, lon: 0.0 },
                ShapePoint { lat: 1.0, lon: 0.0 },
            ],
            resample_distance: Some(0.5),
            ..Default::default()
        };
        let err = height(request, &source, &limits()).unwrap_err();

        assert!(matches!(err, HeightError::SpacingTooSmall { .. }));
        assert!(err.to_string().contains('1'));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_shape_too_large_before_query() {
        let source = SlopeSource::default();
        let request = HeightRequest {
            shape: two_points(),
            resample_distance: Some(1000.0),
            ..Default::default()
        };
        let err = height(request, &source, &HeightLimits::new(10.0, 50)).unwrap_err();

        assert!(err.to_string().contains("after resampling"));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_source_failure_propagates() {
        let request = HeightRequest {
            shape: two_points(),
            ..Default::default()
        };
        let err = height(request, &FailingSource, &limits()).unwrap_err();

        assert_eq!(err.code(), 315);
        assert!(err.to_string().contains("tile store offline"));
    }

    #[test]
    #[should_panic(expected = "elevation source returned")]
    fn test_misaligned_source_panics() {
        let _ = query(&ShortSource, &[Point::new(0.0, 0.0), Point::new(0.0, 1.0)]);
    }

    #[test]
    fn test_encoded_polyline_resampled() {
        let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 0.01)];
        let request = HeightRequest {
            encoded_polyline: Some(polyline::encode(&path)),
            resample_distance: Some(100.0),
            range: true,
            ..Default::default()
        };
        let response = height(request, &SlopeSource::default(), &limits()).unwrap();

        // ~1112 m at 100 m spacing: 0, 100, ..., 1100 and the endpoint
        assert_eq!(response.shape.len(), 13);
        assert_eq!(response.shape[12], path[1]);

        let decoded = polyline::decode(response.encoded_polyline.as_deref().unwrap()).unwrap();
        assert_eq!(decoded.len(), response.shape.len());

        let pairs = response.range_height.unwrap();
        assert_eq!(pairs.len(), 13);
        assert_eq!(pairs[1].0, 100.0);
        assert!(pairs.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_single_point_with_resample_is_noop() {
        let request = HeightRequest {
            shape: vec![ShapePoint {
                lat: 35.5,
                lon: 138.5,
            }],
            resample_distance: Some(10.0),
            range: true,
            ..Default::default()
        };
        let response = height(request, &SlopeSource::default(), &limits()).unwrap();
        assert_eq!(response.shape, vec![Point::new(138.5, 35.5)]);
        assert_eq!(response.range_height, Some(vec![RangeHeight(0.0, Some(3550.0))]));
    }

    #[test]
    fn test_accumulate_ranges_properties() {
        let path = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.1, 0.1),
            Point::new(0.1, 0.2),
        ];
        let ranges = accumulate_ranges(&path);

        assert_eq!(ranges.len(), path.len());
        assert_eq!(ranges[0], 0.0);
        assert_eq!(ranges[1], 0.0);
        assert!(ranges.windows(2).all(|w| w[0] <= w[1]));
        assert!(accumulate_ranges(&[]).is_empty());
    }

    #[test]
    fn test_assemble_precision_and_no_data() {
        let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(0.0, 2.0)];
        let heights = vec![123.456, NO_DATA_VALUE, -4.44];

        let response = assemble(None, path.clone(), None, heights.clone(), None, 1);
        assert_eq!(response.height, Some(vec![Some(123.5), None, Some(-4.4)]));

        let response = assemble(None, path.clone(), None, heights.clone(), None, 0);
        assert_eq!(response.height, Some(vec![Some(123.0), None, Some(-4.0)]));

        // Clamped to two decimals
        let response = assemble(None, path, None, heights, None, 9);
        assert_eq!(response.height, Some(vec![Some(123.46), None, Some(-4.44)]));
    }

    #[test]
    #[should_panic(expected = "ranges not aligned")]
    fn test_assemble_misaligned_ranges_panics() {
        let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];
        let _ = assemble(None, path, None, vec![1.0, 2.0], Some(vec![0.0]), 0);
    }

    #[test]
    fn test_response_json_shape() {
        let request: HeightRequest = serde_json::from_str(
            r#"{"id": "abc", "shape": [{"lat": 0, "lon": 0}, {"lat": 1, "lon": 0}], "range": true}"#,
        )
        .unwrap();
        let response = height(request, &SlopeSource::default(), &limits()).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], "abc");
        assert_eq!(json["shape"][1]["lat"], 1.0);
        assert_eq!(json["range_height"][0][0], 0.0);
        assert_eq!(json["range_height"][1][1], 100.0);
        assert!(json.get("height").is_none());
        assert!(json.get("encoded_polyline").is_none());
    }

    #[test]
    fn test_no_data_serializes_as_null() {
        let response = assemble(
            None,
            vec![Point::new(0.0, 0.0)],
            None,
            vec![NO_DATA_VALUE],
            None,
            0,
        );
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""height":[null]"#));
    }
}

//! Encoded polyline codec.
//!
//! Shapes are exchanged in the Google polyline format with six decimal digits
//! of precision ("polyline6"). Each coordinate pair is stored as a latitude
//! delta followed by a longitude delta.

use crate::error::HeightError;
use crate::point::Point;

/// Scale factor for polyline6.
pub const PRECISION: f64 = 1e6;

/// Encode a path as a polyline6 string.
///
/// # Example
///
/// ```
/// use heightline::{polyline, Point};
///
/// let path = vec![Point::new(-120.2, 38.5), Point::new(-120.95, 40.7)];
/// let encoded = polyline::encode(&path);
/// assert_eq!(polyline::decode(&encoded).unwrap(), path);
/// ```
pub fn encode(path: &[Point]) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;

    for p in path {
        let lat = (p.lat * PRECISION).round() as i64;
        let lon = (p.lon * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

/// Decode a polyline6 string into a path.
///
/// # Errors
///
/// Returns [`HeightError::InvalidEncodedPolyline`] if the string contains
/// characters outside the polyline alphabet, ends in the middle of a value,
/// or holds a latitude without its longitude.
pub fn decode(encoded: &str) -> Result<Vec<Point>, HeightError> {
    let bytes = encoded.as_bytes();
    let mut path = Vec::new();
    let mut pos = 0;
    let mut lat = 0i64;
    let mut lon = 0i64;

    while pos < bytes.len() {
        lat = accumulate(lat, decode_value(bytes, &mut pos)?)?;
        if pos >= bytes.len() {
            return Err(HeightError::InvalidEncodedPolyline {
                reason: "latitude without longitude".to_string(),
            });
        }
        lon = accumulate(lon, decode_value(bytes, &mut pos)?)?;
        path.push(Point::new(lon as f64 / PRECISION, lat as f64 / PRECISION));
    }

    Ok(path)
}

fn accumulate(total: i64, delta: i64) -> Result<i64, HeightError> {
    total
        .checked_add(delta)
        .ok_or_else(|| HeightError::InvalidEncodedPolyline {
            reason: "value overflow".to_string(),
        })
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}

fn decode_value(bytes: &[u8], pos: &mut usize) -> Result<i64, HeightError> {
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| HeightError::InvalidEncodedPolyline {
                reason: "unterminated value".to_string(),
            })?;
        *pos += 1;

        if !(63..=126).contains(&byte) {
            return Err(HeightError::InvalidEncodedPolyline {
                reason: format!("invalid character {:?} at offset {}", byte as char, *pos - 1),
            });
        }
        if shift > 60 {
            return Err(HeightError::InvalidEncodedPolyline {
                reason: "value overflow".to_string(),
            });
        }

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

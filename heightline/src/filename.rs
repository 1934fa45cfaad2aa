//! SRTM tile naming.
//!
//! Tiles are named after their southwest corner: `{N|S}{lat:02}{E|W}{lon:03}.hgt`,
//! for example `N35E138.hgt` or `S13W078.hgt`.

use crate::point::Point;

/// Integer `(lat, lon)` of a tile's southwest corner.
pub type TileKey = (i32, i32);

/// Key of the tile containing `point`.
///
/// Points on the northern or eastern edge of the SRTM grid (lat 60, lon 180)
/// belong to the tile below or to the west, since no tile starts there.
pub fn tile_key(point: &Point) -> TileKey {
    let lat = (point.lat.floor() as i32).min(59);
    let lon = (point.lon.floor() as i32).min(179);
    (lat, lon)
}

/// Whether `point` lies inside SRTM coverage (±60° latitude).
pub fn in_coverage(point: &Point) -> bool {
    (-60.0..=60.0).contains(&point.lat) && (-180.0..=180.0).contains(&point.lon)
}

/// Filename of the tile with the given southwest corner.
///
/// # Examples
///
/// ```
/// use heightline::filename::coords_to_filename;
///
/// assert_eq!(coords_to_filename(35, 138), "N35E138.hgt");
/// assert_eq!(coords_to_filename(-13, -78), "S13W078.hgt");
/// ```
pub fn coords_to_filename(lat: i32, lon: i32) -> String {
    let ns = if lat >= 0 { 'N' } else { 'S' };
    let ew = if lon >= 0 { 'E' } else { 'W' };
    format!("{}{:02}{}{:03}.hgt", ns, lat.abs(), ew, lon.abs())
}

/// Parse the southwest corner from a tile filename, with or without a
/// leading path and `.hgt` extension.
///
/// # Examples
///
/// ```
/// use heightline::filename::filename_to_lat_lon;
///
/// assert_eq!(filename_to_lat_lon("N35E138.hgt"), Some((35, 138)));
/// assert_eq!(filename_to_lat_lon("/data/s12w077.hgt"), Some((-12, -77)));
/// assert_eq!(filename_to_lat_lon("invalid"), None);
/// ```
pub fn filename_to_lat_lon(filename: &str) -> Option<TileKey> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let name = name.strip_suffix(".hgt").unwrap_or(name);

    if name.len() != 7 || !name.is_ascii() {
        return None;
    }

    let lat_sign = match name.as_bytes()[0].to_ascii_uppercase() {
        b'N' => 1,
        b'S' => -1,
        _ => return None,
    };
    let lon_sign = match name.as_bytes()[3].to_ascii_uppercase() {
        b'E' => 1,
        b'W' => -1,
        _ => return None,
    };
    let lat: i32 = name[1..3].parse().ok()?;
    let lon: i32 = name[4..7].parse().ok()?;

    Some((lat * lat_sign, lon * lon_sign))
}

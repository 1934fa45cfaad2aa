//! SRTM tile parsing and elevation sampling.
//!
//! This module provides the [`SrtmTile`] struct for reading SRTM `.hgt` files
//! and sampling elevation at coordinates inside the tile.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Result, SrtmError};
use crate::filename::filename_to_lat_lon;

/// File size for SRTM1 (1 arc-second, ~30m resolution): 3601 × 3601 × 2 bytes
const SRTM1_SIZE: usize = 3601 * 3601 * 2; // 25,934,402 bytes

/// File size for SRTM3 (3 arc-second, ~90m resolution): 1201 × 1201 × 2 bytes
const SRTM3_SIZE: usize = 1201 * 1201 * 2; // 2,884,802 bytes

/// Number of samples per row/column for SRTM1
const SRTM1_SAMPLES: usize = 3601;

/// Number of samples per row/column for SRTM3
const SRTM3_SAMPLES: usize = 1201;

/// Value indicating no data (void) in SRTM files
pub const VOID_VALUE: i16 = -32768;

/// Resolution type of an SRTM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtmResolution {
    /// SRTM1: 1 arc-second (~30m) resolution
    Srtm1,
    /// SRTM3: 3 arc-second (~90m) resolution
    Srtm3,
}

impl SrtmResolution {
    /// Returns the number of samples per row/column for this resolution.
    pub fn samples(&self) -> usize {
        match self {
            SrtmResolution::Srtm1 => SRTM1_SAMPLES,
            SrtmResolution::Srtm3 => SRTM3_SAMPLES,
        }
    }
}

/// A memory-mapped SRTM tile covering one 1°×1° cell.
pub struct SrtmTile {
    data: Mmap,
    samples: usize,
    resolution: SrtmResolution,
    /// Southwest corner latitude
    base_lat: i32,
    /// Southwest corner longitude
    base_lon: i32,
}

impl SrtmTile {
    /// Load an SRTM tile, taking the southwest corner from the filename
    /// (e.g. `N35E138.hgt`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be mapped, its name does not follow
    /// the SRTM convention, or its size matches neither SRTM1 nor SRTM3.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().to_string_lossy();
        let (base_lat, base_lon) =
            filename_to_lat_lon(&name).ok_or_else(|| SrtmError::FileNotFound {
                path: path.as_ref().to_path_buf(),
            })?;
        Self::from_file_with_coords(path, base_lat, base_lon)
    }

    /// Load an SRTM tile with explicit southwest corner coordinates.
    pub fn from_file_with_coords<P: AsRef<Path>>(
        path: P,
        base_lat: i32,
        base_lon: i32,
    ) -> Result<Self> {
        let file = File::open(&path)?;

        // SAFETY: the file is opened read-only and the mapping never escapes
        // this struct; tiles are not rewritten while the service runs.
        let mmap = unsafe { Mmap::map(&file)? };

        let (samples, resolution) = match mmap.len() {
            SRTM1_SIZE => (SRTM1_SAMPLES, SrtmResolution::Srtm1),
            SRTM3_SIZE => (SRTM3_SAMPLES, SrtmResolution::Srtm3),
            size => return Err(SrtmError::InvalidFileSize { size }),
        };

        Ok(Self {
            data: mmap,
            samples,
            resolution,
            base_lat,
            base_lon,
        })
    }

    /// Nearest-neighbour elevation at the given coordinates.
    ///
    /// Returns the raw sample, which may be [`VOID_VALUE`].
    ///
    /// # Errors
    ///
    /// Returns [`SrtmError::OutOfBounds`] if the coordinates are outside this tile.
    pub fn get_elevation(&self, lat: f64, lon: f64) -> Result<i16> {
        let (y, x) = self.grid_position(lat, lon)?;
        Ok(self.get_elevation_at(y.round() as usize, x.round() as usize))
    }

    /// Bilinearly interpolated elevation at the given coordinates.
    ///
    /// Returns `None` if any of the four surrounding samples is void.
    pub fn get_elevation_interpolated(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        let (y, x) = self.grid_position(lat, lon)?;
        let last = self.samples - 1;

        let row0 = (y.floor() as usize).min(last);
        let col0 = (x.floor() as usize).min(last);
        let row1 = (row0 + 1).min(last);
        let col1 = (col0 + 1).min(last);
        let dy = y - row0 as f64;
        let dx = x - col0 as f64;

        let corners = [
            self.get_elevation_at(row0, col0),
            self.get_elevation_at(row0, col1),
            self.get_elevation_at(row1, col0),
            self.get_elevation_at(row1, col1),
        ];
        if corners.contains(&VOID_VALUE) {
            return Ok(None);
        }
        let [nw, ne, sw, se] = corners.map(f64::from);

        let north = nw + (ne - nw) * dx;
        let south = sw + (se - sw) * dx;
        Ok(Some(north + (south - north) * dy))
    }

    /// Elevation for profile sampling: interpolated where possible, nearest
    /// neighbour where the interpolation window touches a void, `None` when
    /// the nearest sample itself is void.
    pub fn sample(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        if let Some(v) = self.get_elevation_interpolated(lat, lon)? {
            return Ok(Some(v));
        }
        let v = self.get_elevation(lat, lon)?;
        Ok((v != VOID_VALUE).then_some(f64::from(v)))
    }

    /// Fractional (row, col) grid position; row 0 is the north edge.
    fn grid_position(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        let lat_frac = lat - self.base_lat as f64;
        let lon_frac = lon - self.base_lon as f64;

        if !(0.0..=1.0).contains(&lat_frac) || !(0.0..=1.0).contains(&lon_frac) {
            return Err(SrtmError::OutOfBounds { lat, lon });
        }

        let span = (self.samples - 1) as f64;
        Ok(((1.0 - lat_frac) * span, lon_frac * span))
    }

    fn get_elevation_at(&self, row: usize, col: usize) -> i16 {
        let row = row.min(self.samples - 1);
        let col = col.min(self.samples - 1);

        // 2 bytes per sample, big-endian, row-major
        let offset = (row * self.samples + col) * 2;
        i16::from_be_bytes([self.data[offset], self.data[offset + 1]])
    }

    /// Returns the resolution of this tile.
    pub fn resolution(&self) -> SrtmResolution {
        self.resolution
    }

    /// Returns the number of samples per row/column.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the southwest corner as `(lat, lon)`.
    pub fn base(&self) -> (i32, i32) {
        (self.base_lat, self.base_lon)
    }
}

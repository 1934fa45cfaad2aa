//! SRTM elevation source with LRU tile caching.
//!
//! [`SrtmService`] loads `.hgt` tiles on demand from a data directory, keeps
//! them memory-mapped in a [`moka`] cache and implements
//! [`ElevationSource`] for the profile pipeline.
//!
//! ```ignore
//! use heightline::SrtmServiceBuilder;
//!
//! let service = SrtmServiceBuilder::new("/data/srtm")
//!     .cache_size(100)
//!     .build()?;
//! let heights = service.sample_all(&path)?;
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::error::{Result, SrtmError};
use crate::filename::{coords_to_filename, in_coverage, tile_key, TileKey};
use crate::point::Point;
use crate::source::{ElevationSource, NO_DATA_VALUE};
use crate::tile::SrtmTile;

#[cfg(feature = "download")]
use crate::download::{DownloadConfig, Downloader};

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in the cache.
    pub entry_count: u64,
    /// Number of cache hits (requests served from cache).
    pub hit_count: u64,
    /// Number of cache misses (tiles loaded from disk).
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// SRTM elevation source with automatic tile caching.
pub struct SrtmService {
    /// Directory containing .hgt files.
    data_dir: PathBuf,
    /// LRU cache of loaded tiles, keyed by southwest corner.
    tile_cache: Cache<TileKey, Arc<SrtmTile>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    #[cfg(feature = "download")]
    downloader: Option<Downloader>,
}

impl SrtmService {
    /// Create a service reading tiles from `data_dir`, caching at most
    /// `cache_size` tiles.
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            tile_cache: Cache::builder().max_capacity(cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            #[cfg(feature = "download")]
            downloader: None,
        }
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> SrtmServiceBuilder {
        SrtmServiceBuilder::new(data_dir)
    }

    /// Elevation at a single point.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - interpolated elevation in meters
    /// - `Ok(None)` - void data, missing tile, or outside SRTM coverage
    /// - `Err(...)` - corrupted file, I/O or download error
    pub fn get_elevation(&self, point: &Point) -> Result<Option<f64>> {
        if !in_coverage(point) {
            return Ok(None);
        }
        match self.load_tile(tile_key(point)) {
            Ok(tile) => tile.sample(point.lat, point.lon),
            Err(SrtmError::FileNotFound { .. }) | Err(SrtmError::TileNotAvailable { .. }) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Elevations for a batch of points, in input order.
    ///
    /// Points are grouped by tile so each unique tile is loaded once.
    /// Void data, missing tiles and points outside coverage yield
    /// [`NO_DATA_VALUE`]; any other tile error aborts the batch.
    pub fn get_elevations(&self, points: &[Point]) -> Result<Vec<f64>> {
        let mut results = vec![NO_DATA_VALUE; points.len()];

        let mut groups: HashMap<TileKey, Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            if in_coverage(p) {
                groups.entry(tile_key(p)).or_default().push(i);
            }
        }

        for (key, indices) in groups {
            let tile = match self.load_tile(key) {
                Ok(t) => t,
                Err(SrtmError::FileNotFound { .. }) | Err(SrtmError::TileNotAvailable { .. }) => {
                    continue
                }
                Err(e) => return Err(e),
            };

            for i in indices {
                let p = &points[i];
                if let Some(v) = tile.sample(p.lat, p.lon)? {
                    results[i] = v;
                }
            }
        }

        Ok(results)
    }

    /// Load a tile from cache, disk, a local `.hgt.zip`, or the download source.
    fn load_tile(&self, key: TileKey) -> Result<Arc<SrtmTile>> {
        if let Some(tile) = self.tile_cache.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(tile);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let filename = coords_to_filename(key.0, key.1);
        let path = self.data_dir.join(&filename);

        if !path.exists() {
            let zip_path = self.data_dir.join(format!("{}.zip", filename));
            if zip_path.exists() {
                self.extract_hgt_from_zip(&zip_path, &filename)?;
            } else {
                self.fetch_missing(&filename, &path)?;
            }
        }

        let tile = Arc::new(SrtmTile::from_file_with_coords(&path, key.0, key.1)?);
        tracing::debug!(tile = %filename, "Loaded tile");
        self.tile_cache.insert(key, tile.clone());

        Ok(tile)
    }

    #[cfg(feature = "download")]
    fn fetch_missing(&self, filename: &str, _path: &Path) -> Result<()> {
        match self.downloader {
            Some(ref downloader) => {
                downloader.download_tile_by_name(filename, &self.data_dir)?;
                Ok(())
            }
            None => Err(SrtmError::TileNotAvailable {
                filename: filename.to_string(),
            }),
        }
    }

    #[cfg(not(feature = "download"))]
    fn fetch_missing(&self, _filename: &str, path: &Path) -> Result<()> {
        Err(SrtmError::FileNotFound {
            path: path.to_path_buf(),
        })
    }

    /// Extract an .hgt file from a local .hgt.zip archive.
    fn extract_hgt_from_zip(&self, zip_path: &Path, filename: &str) -> Result<()> {
        let invalid = |e: zip::result::ZipError| {
            SrtmError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        };

        let file = std::fs::File::open(zip_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(invalid)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(invalid)?;
            if entry.name().to_lowercase().ends_with(".hgt") {
                // Other loaders treat an existing .hgt as complete, so it
                // only appears once fully written
                let mut staged = tempfile::NamedTempFile::new_in(&self.data_dir)?;
                std::io::copy(&mut entry, staged.as_file_mut())?;
                staged
                    .persist(self.data_dir.join(filename))
                    .map_err(|e| SrtmError::Io(e.error))?;
                return Ok(());
            }
        }

        Err(SrtmError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No .hgt file found in {}", zip_path.display()),
        )))
    }

    /// Check if auto-download is enabled.
    #[cfg(feature = "download")]
    pub fn has_auto_download(&self) -> bool {
        self.downloader.is_some()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.tile_cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.tile_cache.policy().max_capacity().unwrap_or(0)
    }

    /// Clear all tiles from the cache.
    pub fn clear_cache(&self) {
        self.tile_cache.invalidate_all();
    }
}

impl ElevationSource for SrtmService {
    type Error = SrtmError;

    fn sample_all(&self, points: &[Point]) -> Result<Vec<f64>> {
        self.get_elevations(points)
    }
}

/// Builder for creating [`SrtmService`] with custom configuration.
pub struct SrtmServiceBuilder {
    data_dir: PathBuf,
    cache_size: u64,
    #[cfg(feature = "download")]
    download_config: Option<DownloadConfig>,
}

impl SrtmServiceBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_size: 100,
            #[cfg(feature = "download")]
            download_config: None,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `HEIGHTLINE_DATA_DIR` | Directory containing .hgt files | Required |
    /// | `HEIGHTLINE_CACHE_SIZE` | Maximum tiles in cache | 100 |
    /// | `HEIGHTLINE_DOWNLOAD_URL` | URL template for missing tiles* | None |
    /// | `HEIGHTLINE_DOWNLOAD_GZIP` | Force gzip decoding of downloads* | auto |
    /// | `HEIGHTLINE_DOWNLOAD_TIMEOUT` | Download timeout in seconds* | 300 |
    /// | `HEIGHTLINE_DOWNLOAD_RETRIES` | Retries after a failed download* | 3 |
    ///
    /// *Only used when the `download` feature is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if `HEIGHTLINE_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("HEIGHTLINE_DATA_DIR").map_err(|_| {
            SrtmError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HEIGHTLINE_DATA_DIR environment variable not set",
            ))
        })?;

        let cache_size: u64 = std::env::var("HEIGHTLINE_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        #[cfg(feature = "download")]
        let download_config = std::env::var("HEIGHTLINE_DOWNLOAD_URL").ok().map(|template| {
            download_config_from_vars(
                template,
                std::env::var("HEIGHTLINE_DOWNLOAD_GZIP").ok(),
                std::env::var("HEIGHTLINE_DOWNLOAD_TIMEOUT").ok(),
                std::env::var("HEIGHTLINE_DOWNLOAD_RETRIES").ok(),
            )
        });

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            cache_size,
            #[cfg(feature = "download")]
            download_config,
        })
    }

    /// Set the data directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the maximum number of tiles to keep in cache.
    ///
    /// Default is 100 tiles.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Download missing tiles with the given configuration.
    #[cfg(feature = "download")]
    pub fn auto_download(mut self, config: DownloadConfig) -> Self {
        self.download_config = Some(config);
        self
    }

    /// Build the [`SrtmService`].
    ///
    /// # Errors
    ///
    /// Fails if auto-download is configured and the HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<SrtmService> {
        #[cfg(feature = "download")]
        let downloader = match self.download_config {
            Some(config) => Some(Downloader::new(config)?),
            None => None,
        };

        Ok(SrtmService {
            data_dir: self.data_dir,
            tile_cache: Cache::builder().max_capacity(self.cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            #[cfg(feature = "download")]
            downloader,
        })
    }
}

/// Download settings from raw variable values. Unparseable numbers fall back
/// to the defaults.
#[cfg(feature = "download")]
fn download_config_from_vars(
    template: String,
    gzip: Option<String>,
    timeout_secs: Option<String>,
    max_retries: Option<String>,
) -> DownloadConfig {
    let mut config = match gzip {
        Some(flag) if flag.eq_ignore_ascii_case("true") || flag == "1" => {
            DownloadConfig::with_url_template_and_compression(
                template,
                crate::download::Compression::Gzip,
            )
        }
        _ => DownloadConfig::with_url_template(template),
    };

    if let Some(secs) = timeout_secs.and_then(|s| s.parse().ok()) {
        config = config.with_timeout(secs);
    }
    if let Some(retries) = max_retries.and_then(|s| s.parse().ok()) {
        config = config.with_max_retries(retries);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::tests::write_srtm3_tile;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// SRTM3 tile with `center` at row 600, col 600 and zero elsewhere.
    fn create_test_tile(dir: &Path, filename: &str, center: i16) {
        write_srtm3_tile(dir, filename, |row, col| {
            if (row, col) == (600, 600) {
                center
            } else {
                0
            }
        });
    }

    #[test]
    fn test_service_basic() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 500);

        let service = SrtmService::new(temp_dir.path(), 10);

        let elevation = service.get_elevation(&Point::new(138.5, 35.5)).unwrap();
        assert_eq!(elevation, Some(500.0));
    }

    #[test]
    fn test_cache_hit() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 500);

        let service = SrtmService::new(temp_dir.path(), 10);

        let _ = service.get_elevation(&Point::new(138.5, 35.5)).unwrap();
        let stats = service.cache_stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 0);

        let _ = service.get_elevation(&Point::new(138.6, 35.6)).unwrap();
        let stats = service.cache_stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[test]
    fn test_missing_tile_and_out_of_coverage() {
        let temp_dir = TempDir::new().unwrap();
        let service = SrtmService::new(temp_dir.path(), 10);

        assert_eq!(service.get_elevation(&Point::new(50.0, 50.0)).unwrap(), None);
        assert_eq!(service.get_elevation(&Point::new(0.0, 70.0)).unwrap(), None);
    }

    #[test]
    fn test_get_elevations_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 500);
        create_test_tile(temp_dir.path(), "N36E138.hgt", 1000);

        let service = SrtmService::new(temp_dir.path(), 10);

        let points = vec![
            Point::new(138.5, 36.5), // second tile, center
            Point::new(50.0, 50.0),  // missing tile
            Point::new(138.5, 35.5), // first tile, center
            Point::new(0.0, 75.0),   // outside coverage
            Point::new(138.1, 35.1), // first tile, zero-filled
        ];
        let heights = service.get_elevations(&points).unwrap();

        assert_eq!(heights, vec![1000.0, NO_DATA_VALUE, 500.0, NO_DATA_VALUE, 0.0]);
        // One miss per unique tile, including the missing one
        assert_eq!(service.cache_stats().miss_count, 3);
    }

    #[test]
    fn test_void_data_is_no_data() {
        let temp_dir = TempDir::new().unwrap();
        write_srtm3_tile(temp_dir.path(), "N35E138.hgt", |_, _| crate::tile::VOID_VALUE);

        let service = SrtmService::new(temp_dir.path(), 10);
        let heights = service.sample_all(&[Point::new(138.5, 35.5)]).unwrap();
        assert_eq!(heights, vec![NO_DATA_VALUE]);
    }

    #[test]
    fn test_corrupt_tile_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("N35E138.hgt"), [0u8; 64]).unwrap();

        let service = SrtmService::new(temp_dir.path(), 10);
        let result = service.sample_all(&[Point::new(138.5, 35.5)]);
        assert!(matches!(result, Err(SrtmError::InvalidFileSize { size: 64 })));
    }

    #[test]
    fn test_hgt_zip_extraction() {
        let temp_dir = TempDir::new().unwrap();

        let hgt_data = vec![0u8; 1201 * 1201 * 2];
        let zip_path = temp_dir.path().join("N40E010.hgt.zip");
        let file = fs::File::create(&zip_path).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip_writer.start_file("N40E010.hgt", options).unwrap();
        zip_writer.write_all(&hgt_data).unwrap();
        zip_writer.finish().unwrap();

        let service = SrtmService::new(temp_dir.path(), 10);

        let result = service.get_elevation(&Point::new(10.5, 40.5)).unwrap();
        assert_eq!(result, Some(0.0));
        assert!(temp_dir.path().join("N40E010.hgt").exists());
    }

    #[test]
    fn test_hgt_zip_extraction_concurrent() {
        let temp_dir = TempDir::new().unwrap();

        let hgt_data = vec![0u8; 1201 * 1201 * 2];
        let file = fs::File::create(temp_dir.path().join("N40E010.hgt.zip")).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip_writer.start_file("N40E010.hgt", options).unwrap();
        zip_writer.write_all(&hgt_data).unwrap();
        zip_writer.finish().unwrap();

        let service = SrtmService::new(temp_dir.path(), 10);

        // Every loader sees either no .hgt or a complete one
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| service.get_elevation(&Point::new(10.5, 40.5))))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), Some(0.0));
            }
        });

        let mut names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["N40E010.hgt", "N40E010.hgt.zip"]);
    }

    #[cfg(feature = "download")]
    #[test]
    fn test_download_config_from_vars() {
        use crate::download::Compression;

        let template = "https://example.com/{filename}.hgt".to_string();
        let config = download_config_from_vars(template.clone(), None, None, None);
        assert_eq!(config.compression, Compression::None);
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.max_retries, 3);

        let config = download_config_from_vars(
            template.clone(),
            Some("1".into()),
            Some("30".into()),
            Some("0".into()),
        );
        assert_eq!(config.compression, Compression::Gzip);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 0);

        let config =
            download_config_from_vars(template, None, Some("soon".into()), Some("-1".into()));
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_cache_stats() {
        let stats = CacheStats {
            entry_count: 5,
            hit_count: 80,
            miss_count: 20,
        };
        assert_eq!(stats.hit_rate(), 0.8);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_clear_cache() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "N35E138.hgt", 500);

        let service = SrtmService::new(temp_dir.path(), 10);
        let p = Point::new(138.5, 35.5);

        let _ = service.get_elevation(&p).unwrap();
        service.clear_cache();
        let _ = service.get_elevation(&p).unwrap();
        assert_eq!(service.cache_stats().miss_count, 2);
    }

    #[test]
    fn test_builder() {
        let temp_dir = TempDir::new().unwrap();
        let service = SrtmServiceBuilder::new(".")
            .data_dir(temp_dir.path())
            .cache_size(7)
            .build()
            .unwrap();
        assert_eq!(service.cache_capacity(), 7);
        assert_eq!(service.data_dir(), temp_dir.path());
    }

    #[test]
    fn test_from_env() {
        let temp_dir = TempDir::new().unwrap();
        let orig_dir = std::env::var("HEIGHTLINE_DATA_DIR").ok();
        let orig_size = std::env::var("HEIGHTLINE_CACHE_SIZE").ok();

        std::env::remove_var("HEIGHTLINE_DATA_DIR");
        assert!(SrtmServiceBuilder::from_env().is_err());

        std::env::set_var("HEIGHTLINE_DATA_DIR", temp_dir.path());
        std::env::set_var("HEIGHTLINE_CACHE_SIZE", "50");
        let builder = SrtmServiceBuilder::from_env().unwrap();
        assert_eq!(builder.data_dir, temp_dir.path());
        assert_eq!(builder.cache_size, 50);

        std::env::remove_var("HEIGHTLINE_CACHE_SIZE");
        let builder = SrtmServiceBuilder::from_env().unwrap();
        assert_eq!(builder.cache_size, 100);

        match orig_dir {
            Some(v) => std::env::set_var("HEIGHTLINE_DATA_DIR", v),
            None => std::env::remove_var("HEIGHTLINE_DATA_DIR"),
        }
        match orig_size {
            Some(v) => std::env::set_var("HEIGHTLINE_CACHE_SIZE", v),
            None => std::env::remove_var("HEIGHTLINE_CACHE_SIZE"),
        }
    }
}

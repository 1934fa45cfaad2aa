//! SRTM tile download.
//!
//! Missing tiles can be fetched from any server that exposes them under a
//! predictable URL. Only available with the `download` feature.
//!
//! URL templates understand these placeholders:
//!
//! - `{filename}`: tile name without extension (e.g. `N35E138`)
//! - `{lat_prefix}`, `{lat}`: `N`/`S` and the two-digit latitude
//! - `{lon_prefix}`, `{lon}`: `E`/`W` and the three-digit longitude

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use zip::ZipArchive;

use crate::error::{Result, SrtmError};

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default number of retries after a failed attempt.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Compression format of downloaded tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Raw `.hgt`
    #[default]
    None,
    /// `.hgt.gz`
    Gzip,
    /// `.hgt.zip`
    Zip,
}

impl Compression {
    /// Detect compression from a URL or filename extension.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use heightline::download::Compression;
    ///
    /// assert_eq!(Compression::from_url("file.hgt.gz"), Compression::Gzip);
    /// assert_eq!(Compression::from_url("file.hgt.zip"), Compression::Zip);
    /// assert_eq!(Compression::from_url("file.hgt"), Compression::None);
    /// ```
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.ends_with(".gz") {
            Compression::Gzip
        } else if lower.ends_with(".zip") {
            Compression::Zip
        } else {
            Compression::None
        }
    }
}

/// Configuration for downloading SRTM tiles.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// URL template with placeholders.
    pub url_template: String,
    /// Compression of the downloaded payload.
    pub compression: Compression,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
}

impl DownloadConfig {
    /// Configuration for `url_template`, detecting compression from its
    /// extension.
    ///
    /// ```ignore
    /// use heightline::download::{Compression, DownloadConfig};
    ///
    /// let config = DownloadConfig::with_url_template("https://example.com/{filename}.hgt.zip");
    /// assert_eq!(config.compression, Compression::Zip);
    /// ```
    pub fn with_url_template(url_template: impl Into<String>) -> Self {
        let url_template = url_template.into();
        let compression = Compression::from_url(&url_template);
        Self::with_url_template_and_compression(url_template, compression)
    }

    /// Configuration for `url_template` with explicit compression.
    pub fn with_url_template_and_compression(
        url_template: impl Into<String>,
        compression: Compression,
    ) -> Self {
        Self {
            url_template: url_template.into(),
            compression,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Blocking SRTM tile downloader.
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
}

impl Downloader {
    /// Create a downloader.
    ///
    /// # Errors
    ///
    /// Fails if the template is empty or the HTTP client cannot be built.
    pub fn new(config: DownloadConfig) -> Result<Self> {
        if config.url_template.is_empty() {
            return Err(SrtmError::DownloadFailed {
                filename: String::new(),
                reason: "No download URL template configured".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SrtmError::DownloadFailed {
                filename: String::new(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// The configuration this downloader was built with.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download `filename` (e.g. `N35E138.hgt`) into `dest_dir`.
    ///
    /// Returns the path of the decompressed `.hgt` file. Existing files are
    /// not downloaded again.
    pub fn download_tile_by_name(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf> {
        let base_name = filename.strip_suffix(".hgt").unwrap_or(filename);
        let dest_path = dest_dir.join(format!("{}.hgt", base_name));
        if dest_path.exists() {
            return Ok(dest_path);
        }

        let url = self.build_url(base_name)?;
        fs::create_dir_all(dest_dir)?;

        let mut attempt = 0;
        loop {
            match self.do_download(&url, &dest_path) {
                Ok(()) => {
                    tracing::info!(tile = %base_name, %url, "Downloaded tile");
                    return Ok(dest_path);
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(tile = %base_name, attempt, error = %e, "Tile download failed, retrying");
                    std::thread::sleep(Duration::from_millis(500 * u64::from(attempt)));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Download URL for a tile base name such as `N35E138`.
    fn build_url(&self, base_name: &str) -> Result<String> {
        let invalid = || SrtmError::DownloadFailed {
            filename: format!("{}.hgt", base_name),
            reason: "Invalid filename format".to_string(),
        };

        if base_name.len() != 7 || !base_name.is_ascii() {
            return Err(invalid());
        }
        let (lat_prefix, lat) = (&base_name[0..1], &base_name[1..3]);
        let (lon_prefix, lon) = (&base_name[3..4], &base_name[4..7]);

        Ok(self
            .config
            .url_template
            .replace("{filename}", base_name)
            .replace("{lat_prefix}", lat_prefix)
            .replace("{lat}", lat)
            .replace("{lon_prefix}", lon_prefix)
            .replace("{lon}", lon))
    }

    fn do_download(&self, url: &str, dest_path: &Path) -> Result<()> {
        let filename = dest_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(SrtmError::DownloadFailed {
                filename,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes()?;
        let data = decompress(&bytes, self.config.compression, &filename)?;

        // Write then rename so a partial file is never mistaken for a tile
        let dest_dir = dest_path.parent().unwrap_or_else(|| Path::new("."));
        let mut staged = tempfile::NamedTempFile::new_in(dest_dir)?;
        staged.write_all(&data)?;
        staged.persist(dest_path).map_err(|e| SrtmError::Io(e.error))?;

        Ok(())
    }
}

/// Decode a downloaded payload into raw `.hgt` bytes.
fn decompress(bytes: &[u8], compression: Compression, filename: &str) -> Result<Vec<u8>> {
    let failed = |reason: String| SrtmError::DownloadFailed {
        filename: filename.to_string(),
        reason,
    };

    match compression {
        Compression::None => Ok(bytes.to_vec()),
        Compression::Gzip => {
            let mut data = Vec::new();
            GzDecoder::new(bytes)
                .read_to_end(&mut data)
                .map_err(|e| failed(format!("Failed to decompress gzip: {}", e)))?;
            Ok(data)
        }
        Compression::Zip => {
            let mut archive = ZipArchive::new(Cursor::new(bytes))
                .map_err(|e| failed(format!("Failed to read ZIP archive: {}", e)))?;

            for i in 0..archive.len() {
                let mut entry = archive
                    .by_index(i)
                    .map_err(|e| failed(format!("Failed to read ZIP entry: {}", e)))?;
                if entry.name().to_lowercase().ends_with(".hgt") {
                    let mut data = Vec::new();
                    entry
                        .read_to_end(&mut data)
                        .map_err(|e| failed(format!("Failed to extract .hgt from ZIP: {}", e)))?;
                    return Ok(data);
                }
            }

            Err(failed("No .hgt file found in ZIP archive".to_string()))
        }
    }
}

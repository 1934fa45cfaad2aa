pub mod encode;
pub mod profile;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args};
use heightline::{download::DownloadConfig, ShapePoint, SrtmService, SrtmServiceBuilder};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where a path comes from. Exactly one source must be given.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("shape_source").required(true).args(["shape", "encoded", "input"])))]
pub struct ShapeArgs {
    /// Points as "lat,lon;lat,lon;..."
    #[arg(short, long, allow_hyphen_values = true)]
    pub shape: Option<String>,

    /// Path as a polyline6 string
    #[arg(short, long, allow_hyphen_values = true)]
    pub encoded: Option<String>,

    /// Input file (.csv, .geojson or .json)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Column name for latitude (CSV only)
    #[arg(long, default_value = "lat", requires = "input")]
    pub lat_col: String,

    /// Column name for longitude (CSV only)
    #[arg(long, default_value = "lon", requires = "input")]
    pub lon_col: String,
}

/// How to reach the SRTM tiles.
pub struct ServiceOptions {
    pub data_dir: Option<PathBuf>,
    pub cache_size: u64,
    pub auto_download: Option<String>,
    pub download_timeout: Option<u64>,
    pub download_retries: Option<u32>,
}

impl ServiceOptions {
    /// Download settings, when a URL template was given.
    fn download_config(&self) -> Option<DownloadConfig> {
        let mut config = DownloadConfig::with_url_template(self.auto_download.as_deref()?);
        if let Some(secs) = self.download_timeout {
            config = config.with_timeout(secs);
        }
        if let Some(retries) = self.download_retries {
            config = config.with_max_retries(retries);
        }
        Some(config)
    }

    pub fn build(self) -> Result<SrtmService> {
        let mut builder = match &self.data_dir {
            Some(dir) => SrtmServiceBuilder::new(dir),
            None => SrtmServiceBuilder::from_env().context(
                "HEIGHTLINE_DATA_DIR environment variable not set. Use --data-dir or set HEIGHTLINE_DATA_DIR",
            )?,
        };

        builder = builder.cache_size(self.cache_size);

        if let Some(config) = self.download_config() {
            builder = builder.auto_download(config);
        }

        builder.build().context("Failed to create SRTM service")
    }
}

/// Parse `"lat,lon;lat,lon"` into shape points. Empty segments are skipped.
pub fn parse_shape(value: &str) -> Result<Vec<ShapePoint>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (lat, lon) = pair
                .split_once(',')
                .with_context(|| format!("Expected 'lat,lon', got '{}'", pair))?;
            Ok(ShapePoint {
                lat: lat.trim().parse().context("Invalid latitude")?,
                lon: lon.trim().parse().context("Invalid longitude")?,
            })
        })
        .collect()
}

/// Read shape points from a CSV or GeoJSON file.
pub fn read_shape_file(input: &Path, lat_col: &str, lon_col: &str) -> Result<Vec<ShapePoint>> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => read_csv(input, lat_col, lon_col),
        "geojson" | "json" => read_geojson(input),
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

fn read_csv(input: &Path, lat_col: &str, lon_col: &str) -> Result<Vec<ShapePoint>> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    let mut shape = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize, name: &str| -> Result<f64> {
            record
                .get(idx)
                .with_context(|| format!("Missing {} on row {}", name, line + 1))?
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} on row {}", name, line + 1))
        };
        shape.push(ShapePoint {
            lat: field(lat_idx, "latitude")?,
            lon: field(lon_idx, "longitude")?,
        });
    }
    Ok(shape)
}

fn read_geojson(input: &Path) -> Result<Vec<ShapePoint>> {
    let file = File::open(input).context("Failed to open input file")?;
    let geojson: geojson::GeoJson =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let geometry = match geojson {
        geojson::GeoJson::Geometry(geometry) => geometry,
        geojson::GeoJson::Feature(feature) => {
            feature.geometry.context("Feature has no geometry")?
        }
        geojson::GeoJson::FeatureCollection(fc) => {
            let mut geometries = fc.features.into_iter().filter_map(|f| f.geometry);
            let first = geometries
                .next()
                .context("FeatureCollection has no geometry")?;
            if geometries.next().is_some() {
                bail!("FeatureCollection must contain exactly one geometry");
            }
            first
        }
    };

    let path = heightline::geojson::shape_from_geometry(&geometry)
        .context("Unsupported GeoJSON geometry")?;
    Ok(path.into_iter().map(ShapePoint::from).collect())
}

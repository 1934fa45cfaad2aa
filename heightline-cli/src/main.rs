use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{ServiceOptions, ShapeArgs};

/// Elevation profiles along geographic paths
#[derive(Parser)]
#[command(name = "heightline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing .hgt files
    #[arg(short, long, env = "HEIGHTLINE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Maximum tiles in cache
    #[arg(
        short,
        long,
        env = "HEIGHTLINE_CACHE_SIZE",
        default_value = "100",
        global = true
    )]
    cache_size: u64,

    /// Download missing tiles from this URL template (e.g. https://host/{filename}.hgt.zip)
    #[arg(
        short,
        long,
        env = "HEIGHTLINE_DOWNLOAD_URL",
        value_name = "URL_TEMPLATE",
        global = true
    )]
    auto_download: Option<String>,

    /// Download timeout in seconds
    #[arg(long, env = "HEIGHTLINE_DOWNLOAD_TIMEOUT", value_name = "SECS", global = true)]
    download_timeout: Option<u64>,

    /// Retries after a failed tile download
    #[arg(long, env = "HEIGHTLINE_DOWNLOAD_RETRIES", global = true)]
    download_retries: Option<u32>,

    /// Smallest accepted resample distance in meters
    #[arg(
        long,
        env = "HEIGHTLINE_MIN_RESAMPLE",
        default_value_t = heightline::config::DEFAULT_MIN_RESAMPLE,
        global = true
    )]
    min_resample: f64,

    /// Largest accepted number of shape points, after resampling
    #[arg(
        long,
        env = "HEIGHTLINE_MAX_SHAPE",
        default_value_t = heightline::config::DEFAULT_MAX_ELEVATION_SHAPE,
        global = true
    )]
    max_shape: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the elevation profile of a path
    Profile {
        #[command(flatten)]
        shape: ShapeArgs,

        /// Resample the path every this many meters
        #[arg(short, long, value_name = "METERS")]
        resample: Option<f64>,

        /// Include cumulative distance along the path
        #[arg(long)]
        range: bool,

        /// Decimal places kept in heights (0-2)
        #[arg(short, long, default_value = "0")]
        precision: u8,

        /// Identifier echoed in JSON output
        #[arg(long)]
        id: Option<String>,

        /// Output the profile as JSON
        #[arg(short, long, conflicts_with = "geojson")]
        json: bool,

        /// Output the profile as a GeoJSON geometry with elevation as Z
        #[arg(long)]
        geojson: bool,

        /// Do not log the request to the analytics target
        #[arg(long)]
        no_track: bool,
    },

    /// Print the polyline6 encoding of a path
    Encode {
        #[command(flatten)]
        shape: ShapeArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let service = ServiceOptions {
        data_dir: cli.data_dir,
        cache_size: cli.cache_size,
        auto_download: cli.auto_download,
        download_timeout: cli.download_timeout,
        download_retries: cli.download_retries,
    };
    let limits = heightline::HeightLimits::new(cli.min_resample, cli.max_shape);

    match cli.command {
        Commands::Profile {
            shape,
            resample,
            range,
            precision,
            id,
            json,
            geojson,
            no_track,
        } => commands::profile::run(
            service,
            limits,
            shape,
            commands::profile::ProfileOptions {
                resample,
                range,
                precision,
                id,
                format: commands::profile::OutputFormat::from_flags(json, geojson),
                no_track,
            },
        ),
        Commands::Encode { shape } => commands::encode::run(shape),
    }
}

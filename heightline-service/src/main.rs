//! heightline service - HTTP microservice for elevation profiles.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HEIGHTLINE_DATA_DIR` | Directory containing .hgt files | `.` |
//! | `HEIGHTLINE_CACHE_SIZE` | Maximum tiles in cache | 100 |
//! | `HEIGHTLINE_PORT` | HTTP server port | 8080 |
//! | `HEIGHTLINE_DOWNLOAD_URL` | URL template for auto-download | None |
//! | `HEIGHTLINE_DOWNLOAD_GZIP` | Force gzip decoding of downloads | auto |
//! | `HEIGHTLINE_DOWNLOAD_TIMEOUT` | Download timeout in seconds | 300 |
//! | `HEIGHTLINE_DOWNLOAD_RETRIES` | Retries after a failed download | 3 |
//! | `HEIGHTLINE_MIN_RESAMPLE` | Minimum resample distance in meters | 10 |
//! | `HEIGHTLINE_MAX_SHAPE` | Maximum points per profile | 750000 |
//! | `RUST_LOG` | Log filter (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /height` - Elevation profile of a path
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use heightline::{HeightLimits, SrtmServiceBuilder};
use heightline_service::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "heightline_service=info,heightline=info,analytics=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("HEIGHTLINE_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // The library reads HEIGHTLINE_DATA_DIR, HEIGHTLINE_CACHE_SIZE,
    // HEIGHTLINE_DOWNLOAD_* settings
    let srtm_service = match SrtmServiceBuilder::from_env() {
        Ok(builder) => builder.build()?,
        Err(_) => {
            tracing::warn!("HEIGHTLINE_DATA_DIR not set, using current directory");
            SrtmServiceBuilder::new(".").build()?
        }
    };
    let limits = HeightLimits::from_env();

    tracing::info!(
        data_dir = %srtm_service.data_dir().display(),
        cache_capacity = srtm_service.cache_capacity(),
        auto_download = srtm_service.has_auto_download(),
        min_resample = limits.min_resample,
        max_elevation_shape = limits.max_elevation_shape,
        port = port,
        "Starting heightline service"
    );

    let app = router(Arc::new(AppState {
        srtm_service,
        limits,
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! HTTP request handlers for the elevation profile service.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use heightline::{HeightError, HeightRequest, HeightResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

/// Error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable numeric error code; absent for internal failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    /// Error message.
    pub error: String,
    /// HTTP status code.
    pub status_code: u16,
    /// HTTP status text.
    pub status: String,
}

impl ErrorResponse {
    fn new(status: StatusCode, error_code: Option<u16>, error: String) -> Self {
        Self {
            error_code,
            error,
            status_code: status.as_u16(),
            status: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of tiles in cache.
    pub cached_tiles: u64,
    /// Maximum number of cached tiles.
    pub cache_capacity: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Compute the elevation profile of a path.
///
/// Heights without elevation data are returned as `null`. When `range` is
/// set, the response carries `range_height` pairs instead of `height`.
#[utoipa::path(
    post,
    path = "/height",
    tag = "height",
    request_body = HeightRequest,
    responses(
        (status = 200, description = "Elevation profile", body = HeightResponse),
        (status = 400, description = "Invalid shape or options", body = ErrorResponse),
        (status = 500, description = "Elevation data could not be read", body = ErrorResponse)
    )
)]
pub async fn post_height(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HeightRequest>,
) -> Response {
    tracing::debug!(
        id = ?request.id,
        shape_points = request.shape.len(),
        encoded = request.encoded_polyline.is_some(),
        resample_distance = ?request.resample_distance,
        "Height request"
    );

    // Tile reads are blocking
    let task_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        heightline::height(request, &task_state.srtm_service, &task_state.limits)
    })
    .await;

    match result {
        Ok(Ok(response)) => {
            tracing::debug!(samples = response.shape.len(), "Height request complete");
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "Height task failed");
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (
                status,
                Json(ErrorResponse::new(status, None, "internal error".to_string())),
            )
                .into_response()
        }
    }
}

/// Map a pipeline error to its HTTP status and JSON body.
fn error_response(e: HeightError) -> Response {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if status.is_server_error() {
        tracing::error!(code = e.code(), error = %e, "Height request failed");
    } else {
        tracing::warn!(code = e.code(), error = %e, "Height request rejected");
    }

    (
        status,
        Json(ErrorResponse::new(status, Some(e.code()), e.to_string())),
    )
        .into_response()
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get cache statistics.
///
/// Returns information about the tile cache.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Tile cache statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.srtm_service.cache_stats();

    Json(StatsResponse {
        cached_tiles: stats.entry_count,
        cache_capacity: state.srtm_service.cache_capacity(),
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}

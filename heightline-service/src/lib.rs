//! heightline service library
//!
//! HTTP handlers, router and OpenAPI document for the elevation profile
//! service. Used by both the `heightline-service` binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use heightline::{HeightLimits, SrtmService};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// SRTM elevation source.
    pub srtm_service: SrtmService,
    /// Request size limits.
    pub limits: HeightLimits,
}

/// OpenAPI documentation for the heightline service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "heightline Elevation Profile Service",
        version = "0.1.0",
        description = "Elevation profiles along geographic paths, backed by SRTM data.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "Pedro Sanz Martinez", url = "https://github.com/pedrosanzmtz/heightline")
    ),
    paths(handlers::post_height, handlers::health_check, handlers::get_stats),
    components(schemas(
        heightline::HeightRequest,
        heightline::HeightResponse,
        heightline::ShapePoint,
        heightline::Point,
        handlers::ErrorResponse,
        handlers::HealthResponse,
        handlers::StatsResponse,
    )),
    tags(
        (name = "height", description = "Elevation profile endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the service router with tracing, CORS and Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/height", post(handlers::post_height))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{ErrorResponse, HealthResponse, StatsResponse};

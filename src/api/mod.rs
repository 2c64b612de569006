//! Subscriber-facing HTTP API using Axum.
//!
//! Exposes the long-lived SSE stream plus small pull-style endpoints for the
//! current state, recent logs, and a proxied upstream engine status.

pub mod handlers;
mod routes;

pub use handlers::BridgeHandle;

use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `AIRWATCH_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for development (e.g., a local dashboard dev server).
fn build_cors_layer() -> CorsLayer {
    match std::env::var("AIRWATCH_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(handle: BridgeHandle) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/stream", routes::stream_routes(handle.clone()))
        .merge(routes::legacy_routes(handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

//! Route tables for the bridge API.

use super::handlers::{self, BridgeHandle};
use axum::routing::get;
use axum::Router;

/// Routes under `/api/stream`.
pub fn stream_routes(handle: BridgeHandle) -> Router {
    Router::new()
        .route("/live", get(handlers::live_stream))
        .route("/state", get(handlers::get_state))
        .route("/logs", get(handlers::get_logs))
        .route("/engine-status", get(handlers::engine_status))
        .with_state(handle)
}

/// Top-level routes kept for probes and older dashboards.
pub fn legacy_routes(_handle: BridgeHandle) -> Router {
    Router::new().route("/health", get(handlers::health_check))
}

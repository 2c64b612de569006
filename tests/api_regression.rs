//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the pull endpoints and SSE stream using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port — runs in CI without `#[ignore]`.

use airwatch_bridge::api::{create_app, BridgeHandle};
use airwatch_bridge::config::{BridgeConfig, UpstreamConfig};
use airwatch_bridge::hub::BroadcastHub;
use airwatch_bridge::pipeline::BridgeState;
use airwatch_bridge::types::LogLevel;
use airwatch_bridge::upstream::UpstreamClient;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

/// A handle whose upstream client points at a port nothing listens on.
fn create_test_handle() -> BridgeHandle {
    let config = BridgeConfig::default();
    let upstream_config = UpstreamConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        poll_interval_secs: 1,
        request_timeout_secs: 1,
    };
    BridgeHandle {
        state: Arc::new(RwLock::new(BridgeState::new(config.stream.log_capacity))),
        hub: Arc::new(BroadcastHub::new(config.stream.subscriber_buffer)),
        upstream: Arc::new(UpstreamClient::new(&upstream_config).unwrap()),
        log_replay: config.stream.log_replay,
    }
}

async fn get_json(handle: BridgeHandle, uri: &str) -> Value {
    let resp = create_app(handle)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// All GET pull endpoints should return 200.
#[tokio::test]
async fn test_get_endpoints_return_200() {
    let endpoints = [
        "/health",
        "/api/stream/state",
        "/api/stream/logs",
        "/api/stream/engine-status",
    ];

    for endpoint in &endpoints {
        let resp = create_app(create_test_handle())
            .oneshot(
                Request::builder()
                    .uri(*endpoint)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(
            resp.status().is_success(),
            "GET {endpoint} returned status {}",
            resp.status()
        );
    }
}

/// /health returns a JSON object naming the service.
#[tokio::test]
async fn test_health_returns_json_object() {
    let body = get_json(create_test_handle(), "/health").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "airwatch-bridge");
}

/// A fresh bridge reports simulation mode, tick 0 and no snapshot.
#[tokio::test]
async fn test_state_reflects_fresh_bridge() {
    let body = get_json(create_test_handle(), "/api/stream/state").await;
    assert_eq!(body["connected"], false);
    assert_eq!(body["simulation_mode"], true);
    assert_eq!(body["tick"], 0);
    assert!(body["latest"].is_null());
    assert_eq!(body["clients"], 0);
}

/// /logs honors the limit parameter and returns newest entries first.
#[tokio::test]
async fn test_logs_limit_and_ordering() {
    let handle = create_test_handle();
    {
        let mut state = handle.state.write().await;
        for i in 0..10 {
            state
                .event_log
                .push(LogLevel::Info, format!("entry {i}"), None);
        }
    }

    let body = get_json(handle, "/api/stream/logs?limit=3").await;
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0]["message"], "entry 9");
    assert_eq!(logs[2]["message"], "entry 7");
}

/// Engine status degrades to connected:false when the engine is unreachable,
/// still returning 200 to the subscriber.
#[tokio::test]
async fn test_engine_status_unreachable_reports_disconnected() {
    let body = get_json(create_test_handle(), "/api/stream/engine-status").await;
    assert_eq!(body["connected"], false);
    assert!(body["message"].as_str().unwrap().contains("not reachable"));
}

/// Serve a fixed JSON document at /status on an ephemeral local port and
/// return a handle whose upstream client points at it.
async fn handle_with_stub_status(status_body: Value) -> BridgeHandle {
    use axum::routing::get;

    let stub = axum::Router::new().route("/status", get(move || async move { Json(status_body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });

    let upstream_config = UpstreamConfig {
        base_url: format!("http://{addr}"),
        poll_interval_secs: 1,
        request_timeout_secs: 1,
    };
    let mut handle = create_test_handle();
    handle.upstream = Arc::new(UpstreamClient::new(&upstream_config).unwrap());
    handle
}

/// A reachable engine's object status document passes through with the
/// connected flag added.
#[tokio::test]
async fn test_engine_status_object_payload_gains_connected_flag() {
    let handle =
        handle_with_stub_status(serde_json::json!({ "status": "running", "stats": {} })).await;
    let body = get_json(handle, "/api/stream/engine-status").await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["status"], "running");
}

/// A non-object status body is wrapped rather than returned bare, so the
/// connected flag is always present.
#[tokio::test]
async fn test_engine_status_non_object_payload_is_wrapped() {
    let handle = handle_with_stub_status(serde_json::json!("ok")).await;
    let body = get_json(handle, "/api/stream/engine-status").await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["status"], "ok");
}

/// The live stream responds with the SSE content type.
#[tokio::test]
async fn test_live_stream_is_sse() {
    let resp = create_app(create_test_handle())
        .oneshot(
            Request::builder()
                .uri("/api/stream/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("text/event-stream"),
        "unexpected content type {content_type}"
    );
}

/// Registering through the SSE endpoint shows up in the subscriber count.
#[tokio::test]
async fn test_subscriber_count_tracks_live_connections() {
    let handle = create_test_handle();

    let resp = create_app(handle.clone())
        .oneshot(
            Request::builder()
                .uri("/api/stream/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = get_json(handle, "/api/stream/state").await;
    assert_eq!(body["clients"], 1);
}

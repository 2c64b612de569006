//! HTTP handlers for the subscriber-facing API.

use crate::hub::BroadcastHub;
use crate::pipeline::BridgeState;
use crate::types::StreamEvent;
use crate::upstream::UpstreamClient;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct BridgeHandle {
    pub state: Arc<RwLock<BridgeState>>,
    pub hub: Arc<BroadcastHub>,
    pub upstream: Arc<UpstreamClient>,
    /// How many recent log entries a new subscriber is seeded with.
    pub log_replay: usize,
}

impl BridgeHandle {
    /// Register a new subscriber, seeded with the catch-up batch:
    /// `connected`, then `log_history`, then the latest `stream_update`.
    ///
    /// Registration happens while the state read lock is still held. The
    /// driver broadcasts under the state write lock, so a tick publishing
    /// concurrently lands either in the seed or live on the channel; it can
    /// never fall between the two.
    pub async fn subscribe(&self) -> (u64, mpsc::Receiver<StreamEvent>) {
        let state = self.state.read().await;
        let mut seed = vec![
            StreamEvent::Connected {
                upstream_connected: state.upstream_connected(),
                simulation_mode: !state.upstream_connected(),
                timestamp: chrono::Utc::now(),
            },
            StreamEvent::LogHistory {
                logs: state.event_log.recent(self.log_replay),
            },
        ];
        if let Some(snapshot) = &state.latest {
            seed.push(StreamEvent::StreamUpdate {
                payload: snapshot.clone(),
            });
        }
        self.hub.register(seed)
    }
}

/// Deregisters the subscriber when the SSE stream is dropped, so a closed
/// connection is removed immediately rather than on the next failed write.
struct SubscriberGuard {
    hub: Arc<BroadcastHub>,
    id: u64,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.hub.deregister(self.id);
        info!(
            subscriber = self.id,
            total = self.hub.subscriber_count(),
            "SSE subscriber disconnected"
        );
    }
}

/// `GET /api/stream/live` — long-lived SSE subscription.
///
/// Registers the connection with the broadcast hub, seeded with the catch-up
/// batch: `connected`, then `log_history`, then the latest `stream_update`.
pub async fn live_stream(
    State(h): State<BridgeHandle>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (id, rx) = h.subscribe().await;
    info!(
        subscriber = id,
        total = h.hub.subscriber_count(),
        "SSE subscriber connected"
    );
    let guard = SubscriberGuard {
        hub: Arc::clone(&h.hub),
        id,
    };

    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|event| (event, (rx, guard)))
    })
    .map(|event| Event::default().json_data(&event));

    Sse::new(stream)
}

/// `GET /api/stream/state` — current snapshot, mode, and subscriber count.
pub async fn get_state(State(h): State<BridgeHandle>) -> Json<Value> {
    let state = h.state.read().await;
    Json(json!({
        "connected": state.upstream_connected(),
        "simulation_mode": !state.upstream_connected(),
        "clients": h.hub.subscriber_count(),
        "tick": state.tick,
        "latest": state.latest,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogsParams {
    pub limit: Option<usize>,
}

/// `GET /api/stream/logs?limit=N` — most recent log entries, newest first.
pub async fn get_logs(
    State(h): State<BridgeHandle>,
    Query(params): Query<LogsParams>,
) -> Json<Value> {
    let limit = params.limit.unwrap_or(50);
    let state = h.state.read().await;
    Json(json!({ "logs": state.event_log.recent(limit) }))
}

/// `GET /api/stream/engine-status` — proxied upstream status.
///
/// Reports `connected: false` rather than erroring when the engine is down;
/// upstream failure is a mode, not an error, from a subscriber's viewpoint.
pub async fn engine_status(State(h): State<BridgeHandle>) -> Json<Value> {
    match h.upstream.engine_status().await {
        Ok(Value::Object(mut obj)) => {
            obj.insert("connected".to_string(), json!(true));
            Json(Value::Object(obj))
        }
        // A non-object body (scalar, array) still gets the connected flag.
        Ok(other) => Json(json!({ "connected": true, "status": other })),
        Err(err) => Json(json!({
            "connected": false,
            "message": format!("Upstream engine not reachable: {err}"),
        })),
    }
}

/// `GET /health` — liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "airwatch-bridge" }))
}

//! AirWatch Bridge: real-time air-quality telemetry bridge.
//!
//! Polls an upstream air-quality engine over REST, falls back to a synthetic
//! city feed when the engine is unreachable, enriches every reading with
//! rolling-window analytics and edge-triggered threshold alerts, and fans the
//! resulting snapshots out to any number of SSE subscribers.
//!
//! ## Architecture
//!
//! - **Pipeline driver**: one cancellable loop that polls, falls back,
//!   enriches and publishes — the sole writer of shared state
//! - **Analytics**: per-zone rolling windows with spike detection, plus an
//!   ordered threshold table evaluated on rising edges only
//! - **Broadcast hub**: per-subscriber bounded channels with catch-up
//!   seeding, lossy delivery to slow consumers, and periodic heartbeats
//! - **API**: Axum SSE stream and pull endpoints over the same shared state

pub mod analytics;
pub mod api;
pub mod config;
pub mod eventlog;
pub mod hub;
pub mod pipeline;
pub mod simulator;
pub mod types;
pub mod upstream;
pub mod zones;

// Re-export configuration
pub use config::BridgeConfig;

// Re-export commonly used types
pub use types::{
    Alert, CitySummary, FeedMode, LogEntry, LogLevel, PipelineStats, RawReading, Reading,
    Snapshot, StreamEvent, ThresholdTier, ZoneCategory,
};

// Re-export core components
pub use analytics::{AlertDetector, RollingTracker};
pub use api::{create_app, BridgeHandle};
pub use eventlog::EventLog;
pub use hub::BroadcastHub;
pub use pipeline::{BridgeState, PipelineDriver};
pub use simulator::SyntheticFeed;
pub use upstream::{UpstreamBatch, UpstreamClient, UpstreamError, UpstreamFeed};

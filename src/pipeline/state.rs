//! Shared bridge state.
//!
//! One owned struct, constructed at startup with explicit configuration and
//! passed by handle to the driver, the hub heartbeat and the API handlers.
//! The pipeline driver is its only writer; handlers take read locks.

use crate::eventlog::EventLog;
use crate::types::{FeedMode, PipelineStats, Snapshot};
use chrono::{DateTime, Utc};

/// Live pipeline state behind `Arc<RwLock<..>>`.
#[derive(Debug)]
pub struct BridgeState {
    /// Monotonically increasing snapshot counter; unique per process.
    pub tick: u64,

    /// Which feed is currently authoritative. Starts synthetic until the
    /// first successful upstream poll.
    pub feed: FeedMode,

    /// Consecutive failed polls since the last success.
    pub consecutive_failures: u32,

    /// Cumulative counters since startup.
    pub total_events: u64,
    pub spikes_detected: u64,
    pub alerts_triggered: u64,

    pub started_at: DateTime<Utc>,

    /// The single authoritative snapshot; superseded in place each tick.
    pub latest: Option<Snapshot>,

    /// Bounded operational event log, replayed to late joiners.
    pub event_log: EventLog,
}

impl BridgeState {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            tick: 0,
            feed: FeedMode::Synthetic,
            consecutive_failures: 0,
            total_events: 0,
            spikes_detected: 0,
            alerts_triggered: 0,
            started_at: Utc::now(),
            latest: None,
            event_log: EventLog::new(log_capacity),
        }
    }

    pub fn upstream_connected(&self) -> bool {
        self.feed.is_upstream()
    }

    /// Counters in snapshot form.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            total_events: self.total_events,
            spikes_detected: self.spikes_detected,
            alerts_triggered: self.alerts_triggered,
            windows_processed: self.tick,
            started_at: self.started_at,
        }
    }
}

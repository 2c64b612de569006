//! Core domain types for the telemetry bridge.
//!
//! Readings, snapshots, alerts and log entries are created once per tick and
//! never mutated; the next tick supersedes them. The [`StreamEvent`] envelope
//! is the wire format pushed to every live subscriber.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Zones
// ============================================================================

/// Zone land-use category. Drives the synthetic feed's spike behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneCategory {
    Residential,
    Park,
    Traffic,
    Mixed,
    Commercial,
    Industrial,
}

impl ZoneCategory {
    /// Traffic and industrial zones are the ones that exhibit sudden
    /// exaggerated spikes in the synthetic model.
    pub fn is_spike_prone(self) -> bool {
        matches!(self, Self::Traffic | Self::Industrial)
    }
}

impl std::fmt::Display for ZoneCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Residential => "residential",
            Self::Park => "park",
            Self::Traffic => "traffic",
            Self::Mixed => "mixed",
            Self::Commercial => "commercial",
            Self::Industrial => "industrial",
        };
        write!(f, "{s}")
    }
}

/// A monitored zone with its baseline characteristics.
///
/// Immutable for the process lifetime; defined by [`crate::zones::registry`].
#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ZoneCategory,
    pub baseline_aqi: f64,
}

// ============================================================================
// Readings and snapshots
// ============================================================================

/// Map an AQI value to its human-readable level label.
pub fn aqi_level(aqi: f64) -> &'static str {
    if aqi <= 50.0 {
        "Good"
    } else if aqi <= 100.0 {
        "Satisfactory"
    } else if aqi <= 200.0 {
        "Moderate"
    } else if aqi <= 300.0 {
        "Poor"
    } else if aqi <= 400.0 {
        "Very Poor"
    } else {
        "Severe"
    }
}

/// One zone's raw per-tick sample before enrichment.
///
/// Both feeds produce this shape: the upstream poller by normalizing the
/// engine's zone payload, the synthetic generator directly. The pipeline
/// driver enriches it into a [`Reading`] with rolling stats and spike flags.
#[derive(Debug, Clone)]
pub struct RawReading {
    pub zone_id: String,
    pub zone_name: String,
    pub category: ZoneCategory,
    pub aqi: f64,
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    /// Anomaly flag carried in from the feed itself (upstream spike flag or
    /// synthetic exaggerated-spike injection).
    pub marked_spike: bool,
}

/// One zone's fully enriched per-tick reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub zone_id: String,
    pub zone_name: String,
    pub zone_category: ZoneCategory,
    pub aqi: f64,
    pub aqi_level: String,
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub rolling_avg: f64,
    pub spike: bool,
    pub timestamp: DateTime<Utc>,
}

/// Which feed produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    Upstream,
    Synthetic,
}

impl FeedMode {
    pub fn is_upstream(self) -> bool {
        matches!(self, Self::Upstream)
    }

    /// Pipeline layer label shown to subscribers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Upstream => "Upstream Streaming Engine",
            Self::Synthetic => "Upstream Streaming Engine (Simulated)",
        }
    }
}

/// Cumulative pipeline counters carried in every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total_events: u64,
    pub spikes_detected: u64,
    pub alerts_triggered: u64,
    pub windows_processed: u64,
    pub started_at: DateTime<Utc>,
}

/// City-wide summary derived from one tick's readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySummary {
    pub avg_aqi: f64,
    pub max_aqi: f64,
    pub aqi_level: String,
    pub critical_zones: usize,
    pub total_zones: usize,
}

/// One tick's complete consolidated state.
///
/// Exactly one snapshot is "latest" at any time; the previous one is
/// discarded when superseded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub feed: FeedMode,
    pub layer: String,
    pub stats: PipelineStats,
    pub city_summary: CitySummary,
    pub readings: Vec<Reading>,
    pub active_alerts: Vec<Alert>,
}

// ============================================================================
// Alerts
// ============================================================================

/// One row of the severity threshold table: data, not code. New tiers are
/// added in configuration, never by editing detection logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdTier {
    pub cutoff: f64,
    pub severity: String,
    pub action: String,
}

/// An edge-triggered threshold alert.
///
/// Created only at the instant a zone's value crosses a tier cutoff upward
/// relative to the previous tick. Lives only inside the snapshot cycle that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub zone_id: String,
    pub zone_name: String,
    pub severity: String,
    pub aqi: f64,
    pub threshold: f64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event log
// ============================================================================

/// Severity tag for operational log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Critical,
}

/// One append-only operational event (connects, spikes, alerts, summaries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Subscriber wire envelope
// ============================================================================

/// Discriminated event envelope pushed to live subscribers, keyed by `event`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Sent once at registration: current mode and timestamp.
    Connected {
        upstream_connected: bool,
        simulation_mode: bool,
        timestamp: DateTime<Utc>,
    },
    /// Full snapshot payload, pushed every tick.
    StreamUpdate { payload: Snapshot },
    /// A single new log entry.
    Log { log: LogEntry },
    /// Batch of recent log entries, sent once at registration.
    LogHistory { logs: Vec<LogEntry> },
    /// Timestamp-only keepalive on a fixed interval.
    Heartbeat { timestamp: DateTime<Utc> },
}

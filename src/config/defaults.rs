//! System-wide default constants.
//!
//! Centralises the tunable values of the bridge. Grouped by subsystem for
//! easy discovery; every value here can be overridden via `bridge_config.toml`.

// ============================================================================
// Upstream polling
// ============================================================================

/// Base URL of the upstream streaming engine.
pub const UPSTREAM_BASE_URL: &str = "http://localhost:5000";

/// Interval between polls of the upstream engine (seconds).
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Per-request timeout for upstream fetches (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 4;

/// Consecutive failed polls before the one-time "simulation mode active"
/// advisory is logged.
pub const SIM_NOTICE_AFTER_FAILURES: u32 = 3;

// ============================================================================
// Rolling analytics
// ============================================================================

/// Per-zone rolling window length (samples).
pub const WINDOW_SIZE: usize = 20;

/// Multiplicative spike margin over the rolling average (1.30 = +30%).
pub const SPIKE_MARGIN: f64 = 1.30;

/// Minimum window samples before the margin-based spike rule applies.
pub const SPIKE_MIN_SAMPLES: usize = 3;

// ============================================================================
// Event log & stream fan-out
// ============================================================================

/// Event log ring-buffer capacity (entries).
pub const LOG_CAPACITY: usize = 100;

/// Recent log entries replayed to a newly registered subscriber.
pub const LOG_REPLAY: usize = 30;

/// Heartbeat interval pushed to all subscribers (seconds).
pub const HEARTBEAT_SECS: u64 = 20;

/// Per-subscriber outbound channel capacity (events).
pub const SUBSCRIBER_BUFFER: usize = 64;

// ============================================================================
// Synthetic feed
// ============================================================================

/// AQI values are clamped to this range.
pub const AQI_MIN: f64 = 10.0;
pub const AQI_MAX: f64 = 500.0;

/// Amplitude of the slow sinusoidal drift term (AQI units).
pub const DRIFT_AMPLITUDE: f64 = 12.0;

/// Half-range of the uniform noise term (AQI units, +/-).
pub const NOISE_AMPLITUDE: f64 = 8.0;

/// Per-tick chance of an exaggerated spike in spike-prone zones.
pub const SPIKE_CHANCE: f64 = 0.05;

/// Magnitude range of an injected spike (AQI units).
pub const SPIKE_BOOST_MIN: f64 = 40.0;
pub const SPIKE_BOOST_MAX: f64 = 80.0;

/// Secondary pollutants are fixed ratios of the AQI plus independent noise.
pub const PM25_RATIO: f64 = 0.6;
pub const PM10_RATIO: f64 = 0.9;
pub const NO2_RATIO: f64 = 0.3;

/// Half-range of the independent noise on secondary pollutants.
pub const SECONDARY_NOISE: f64 = 3.0;

// ============================================================================
// HTTP server
// ============================================================================

/// Default bind address for the subscriber-facing server.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

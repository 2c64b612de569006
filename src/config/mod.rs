//! Bridge configuration loaded from TOML.
//!
//! Every operational knob (poll interval, window size, spike margin,
//! threshold table, log capacity, heartbeat interval) is a config field so
//! deployments never require code changes.
//!
//! ## Loading order
//!
//! 1. `AIRWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `bridge_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])

pub mod defaults;

use crate::types::ThresholdTier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Root configuration for a bridge deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Subscriber-facing HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream engine polling
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Rolling-window and spike analytics
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Ordered severity threshold table, highest cutoff first
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<ThresholdTier>,

    /// Event log and broadcast fan-out
    #[serde(default)]
    pub stream: StreamConfig,

    /// Synthetic feed tuning
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            analytics: AnalyticsConfig::default(),
            thresholds: default_thresholds(),
            stream: StreamConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration using the standard search order:
    /// 1. `AIRWATCH_CONFIG` environment variable
    /// 2. `./bridge_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("AIRWATCH_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded bridge config from AIRWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from AIRWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "AIRWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new("bridge_config.toml");
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!("Loaded bridge config from ./bridge_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse ./bridge_config.toml, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load and parse a specific TOML file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

fn default_thresholds() -> Vec<ThresholdTier> {
    vec![
        ThresholdTier {
            cutoff: 300.0,
            severity: "EMERGENCY".to_string(),
            action: "Immediate action required. Industrial halt mandatory.".to_string(),
        },
        ThresholdTier {
            cutoff: 200.0,
            severity: "CRITICAL".to_string(),
            action: "High pollution. Vulnerable groups must stay indoors.".to_string(),
        },
        ThresholdTier {
            cutoff: 150.0,
            severity: "WARNING".to_string(),
            action: "Elevated AQI. Limit outdoor activities.".to_string(),
        },
    ]
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
        }
    }
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::UPSTREAM_BASE_URL.to_string(),
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

fn default_base_url() -> String {
    defaults::UPSTREAM_BASE_URL.to_string()
}
fn default_poll_interval() -> u64 {
    defaults::POLL_INTERVAL_SECS
}
fn default_request_timeout() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_spike_margin")]
    pub spike_margin: f64,

    #[serde(default = "default_spike_min_samples")]
    pub spike_min_samples: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_size: defaults::WINDOW_SIZE,
            spike_margin: defaults::SPIKE_MARGIN,
            spike_min_samples: defaults::SPIKE_MIN_SAMPLES,
        }
    }
}

fn default_window_size() -> usize {
    defaults::WINDOW_SIZE
}
fn default_spike_margin() -> f64 {
    defaults::SPIKE_MARGIN
}
fn default_spike_min_samples() -> usize {
    defaults::SPIKE_MIN_SAMPLES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    #[serde(default = "default_log_replay")]
    pub log_replay: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: defaults::HEARTBEAT_SECS,
            subscriber_buffer: defaults::SUBSCRIBER_BUFFER,
            log_capacity: defaults::LOG_CAPACITY,
            log_replay: defaults::LOG_REPLAY,
        }
    }
}

fn default_heartbeat() -> u64 {
    defaults::HEARTBEAT_SECS
}
fn default_subscriber_buffer() -> usize {
    defaults::SUBSCRIBER_BUFFER
}
fn default_log_capacity() -> usize {
    defaults::LOG_CAPACITY
}
fn default_log_replay() -> usize {
    defaults::LOG_REPLAY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_drift_amplitude")]
    pub drift_amplitude: f64,

    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,

    #[serde(default = "default_spike_chance")]
    pub spike_chance: f64,

    #[serde(default = "default_spike_boost_min")]
    pub spike_boost_min: f64,

    #[serde(default = "default_spike_boost_max")]
    pub spike_boost_max: f64,

    #[serde(default = "default_aqi_min")]
    pub aqi_min: f64,

    #[serde(default = "default_aqi_max")]
    pub aqi_max: f64,

    #[serde(default = "default_secondary_noise")]
    pub secondary_noise: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            drift_amplitude: defaults::DRIFT_AMPLITUDE,
            noise_amplitude: defaults::NOISE_AMPLITUDE,
            spike_chance: defaults::SPIKE_CHANCE,
            spike_boost_min: defaults::SPIKE_BOOST_MIN,
            spike_boost_max: defaults::SPIKE_BOOST_MAX,
            aqi_min: defaults::AQI_MIN,
            aqi_max: defaults::AQI_MAX,
            secondary_noise: defaults::SECONDARY_NOISE,
        }
    }
}

impl SimulationConfig {
    /// A fully deterministic variant with noise, drift and spikes disabled.
    /// Used by tests that assert exact time-of-day behaviour.
    pub fn quiet() -> Self {
        Self {
            drift_amplitude: 0.0,
            noise_amplitude: 0.0,
            spike_chance: 0.0,
            secondary_noise: 0.0,
            ..Self::default()
        }
    }
}

fn default_drift_amplitude() -> f64 {
    defaults::DRIFT_AMPLITUDE
}
fn default_noise_amplitude() -> f64 {
    defaults::NOISE_AMPLITUDE
}
fn default_spike_chance() -> f64 {
    defaults::SPIKE_CHANCE
}
fn default_spike_boost_min() -> f64 {
    defaults::SPIKE_BOOST_MIN
}
fn default_spike_boost_max() -> f64 {
    defaults::SPIKE_BOOST_MAX
}
fn default_aqi_min() -> f64 {
    defaults::AQI_MIN
}
fn default_aqi_max() -> f64 {
    defaults::AQI_MAX
}
fn default_secondary_noise() -> f64 {
    defaults::SECONDARY_NOISE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_constants() {
        let config = BridgeConfig::default();
        assert_eq!(config.upstream.poll_interval_secs, 5);
        assert_eq!(config.analytics.window_size, 20);
        assert!((config.analytics.spike_margin - 1.30).abs() < f64::EPSILON);
        assert_eq!(config.stream.log_capacity, 100);
        assert_eq!(config.stream.heartbeat_secs, 20);
    }

    #[test]
    fn test_default_threshold_table_ordered_descending() {
        let config = BridgeConfig::default();
        assert_eq!(config.thresholds.len(), 3);
        assert!(config
            .thresholds
            .windows(2)
            .all(|w| w[0].cutoff > w[1].cutoff));
        assert_eq!(config.thresholds[0].severity, "EMERGENCY");
        assert_eq!(config.thresholds[2].severity, "WARNING");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [upstream]
            base_url = "http://engine:5000"
            poll_interval_secs = 2

            [[thresholds]]
            cutoff = 250.0
            severity = "SEVERE"
            action = "Stay indoors."
        "#;
        let config: BridgeConfig = toml::from_str(toml_str).expect("parses");
        assert_eq!(config.upstream.base_url, "http://engine:5000");
        assert_eq!(config.upstream.poll_interval_secs, 2);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.analytics.window_size, 20);
        assert_eq!(config.thresholds.len(), 1);
        assert_eq!(config.thresholds[0].severity, "SEVERE");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server]\naddr = \"127.0.0.1:9999\"").expect("write");
        let config = BridgeConfig::load_from_file(file.path()).expect("loads");
        assert_eq!(config.server.addr, "127.0.0.1:9999");
        assert_eq!(config.stream.log_replay, 30);
    }

    #[test]
    fn test_quiet_simulation_disables_randomness() {
        let sim = SimulationConfig::quiet();
        assert_eq!(sim.noise_amplitude, 0.0);
        assert_eq!(sim.drift_amplitude, 0.0);
        assert_eq!(sim.spike_chance, 0.0);
        // Clamp range is untouched.
        assert_eq!(sim.aqi_max, 500.0);
    }
}

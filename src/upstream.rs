//! Upstream streaming-engine client.
//!
//! Fetches the three read endpoints (`/wards`, `/alerts`, `/status`) with a
//! short per-request timeout and validates each body against an explicit
//! schema. Any timeout, connection error, non-2xx status or shape mismatch
//! is an [`UpstreamError`] — the driver treats them all identically by
//! falling back to the synthetic feed. No partial use of a malformed payload
//! is ever attempted.

use crate::config::UpstreamConfig;
use crate::types::{RawReading, ZoneCategory};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Failure modes of an upstream poll. All variants recover locally via the
/// synthetic feed; none is ever surfaced to subscribers as an error.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport-level failure: timeout, refused connection, DNS.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-2xx status.
    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The body did not match the expected schema.
    #[error("malformed upstream payload: {0}")]
    Malformed(String),
}

// ============================================================================
// Payload schemas
// ============================================================================

/// `GET /wards` — current per-zone readings.
#[derive(Debug, Deserialize)]
pub struct WardsPayload {
    pub wards: Vec<UpstreamReading>,
}

/// One zone reading as reported by the engine.
#[derive(Debug, Deserialize)]
pub struct UpstreamReading {
    pub ward_id: String,
    pub ward_name: String,
    pub ward_type: ZoneCategory,
    pub aqi: f64,
    #[serde(default)]
    pub pm25: f64,
    #[serde(default)]
    pub pm10: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub spike: bool,
}

impl From<UpstreamReading> for RawReading {
    fn from(r: UpstreamReading) -> Self {
        Self {
            zone_id: r.ward_id,
            zone_name: r.ward_name,
            category: r.ward_type,
            aqi: r.aqi,
            pm25: r.pm25,
            pm10: r.pm10,
            no2: r.no2,
            marked_spike: r.spike,
        }
    }
}

/// `GET /alerts` — alerts currently active in the engine.
#[derive(Debug, Deserialize)]
pub struct AlertsPayload {
    pub alerts: Vec<serde_json::Value>,
}

/// `GET /status` — engine liveness and counters.
#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: String,
    #[serde(default)]
    pub stats: serde_json::Value,
}

/// One successful poll of all three endpoints, normalized.
#[derive(Debug)]
pub struct UpstreamBatch {
    pub readings: Vec<RawReading>,
    /// How many alerts the engine itself currently reports. The bridge
    /// recomputes alerts from readings with its own threshold table; this
    /// count only feeds the per-tick summary log.
    pub engine_alerts: usize,
    pub engine_status: String,
}

// ============================================================================
// Client
// ============================================================================

/// Seam between the pipeline driver and the upstream engine, so regression
/// tests can substitute scripted outcomes for live HTTP.
#[async_trait]
pub trait UpstreamFeed: Send + Sync + 'static {
    /// Fetch and validate all three read endpoints.
    async fn fetch_batch(&self) -> Result<UpstreamBatch, UpstreamError>;
}

/// HTTP client for the upstream engine's read endpoints.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    /// Proxy fetch of the raw engine status document, for the pull endpoint.
    pub async fn engine_status(&self) -> Result<serde_json::Value, UpstreamError> {
        self.get_json("/status").await
    }
}

#[async_trait]
impl UpstreamFeed for UpstreamClient {
    async fn fetch_batch(&self) -> Result<UpstreamBatch, UpstreamError> {
        let wards: WardsPayload = self.get_json("/wards").await?;
        let alerts: AlertsPayload = self.get_json("/alerts").await?;
        let status: StatusPayload = self.get_json("/status").await?;

        Ok(UpstreamBatch {
            readings: wards.wards.into_iter().map(RawReading::from).collect(),
            engine_alerts: alerts.alerts.len(),
            engine_status: status.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wards_payload_decodes() {
        let body = r#"{
            "wards": [{
                "ward_id": "zone_3",
                "ward_name": "Zone 3 - Traffic Hub",
                "ward_type": "traffic",
                "aqi": 182.0,
                "pm25": 109.2,
                "pm10": 163.8,
                "no2": 54.6,
                "spike": true,
                "rolling_avg": 171.4
            }]
        }"#;
        let payload: WardsPayload = serde_json::from_str(body).expect("decodes");
        assert_eq!(payload.wards.len(), 1);
        let raw = RawReading::from(
            payload.wards.into_iter().next().expect("one reading"),
        );
        assert_eq!(raw.zone_id, "zone_3");
        assert_eq!(raw.category, ZoneCategory::Traffic);
        assert!(raw.marked_spike);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        // No "aqi" — must fail outright rather than be partially used.
        let body = r#"{"wards": [{"ward_id": "z", "ward_name": "Z", "ward_type": "park"}]}"#;
        assert!(serde_json::from_str::<WardsPayload>(body).is_err());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let body = r#"{"wards": [{"ward_id": "z", "ward_name": "Z", "ward_type": "volcano", "aqi": 10.0}]}"#;
        assert!(serde_json::from_str::<WardsPayload>(body).is_err());
    }

    #[test]
    fn test_status_payload_tolerates_missing_stats() {
        let payload: StatusPayload =
            serde_json::from_str(r#"{"status": "running"}"#).expect("decodes");
        assert_eq!(payload.status, "running");
        assert!(payload.stats.is_null());
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_http_error() {
        let config = UpstreamConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            poll_interval_secs: 5,
            request_timeout_secs: 1,
        };
        let client = UpstreamClient::new(&config).expect("client builds");
        let err = client.fetch_batch().await.expect_err("must fail");
        assert!(matches!(err, UpstreamError::Http(_)));
    }
}

//! Periodic snapshot driver.
//!
//! One cancellable loop owns snapshot production end to end: poll the
//! upstream engine, fall back to the synthetic feed on any failure, run the
//! shared enrichment (rolling windows, spike flags, edge-triggered alerts,
//! city summary), then publish to shared state and the broadcast hub.
//!
//! The interval uses `MissedTickBehavior::Delay` and the poll runs inline in
//! the loop body, so a slow upstream can never cause overlapping polls.
//! Mode transitions (upstream <-> synthetic) are logged exactly once per
//! change, never per tick.

use crate::analytics::{AlertDetector, RollingTracker};
use crate::config::BridgeConfig;
use crate::hub::BroadcastHub;
use crate::pipeline::state::BridgeState;
use crate::simulator::SyntheticFeed;
use crate::types::{
    aqi_level, CitySummary, FeedMode, LogLevel, RawReading, Reading, Snapshot, StreamEvent,
};
use crate::upstream::{UpstreamError, UpstreamFeed};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A log notice accumulated during one cycle, flushed atomically at publish.
type Notice = (LogLevel, String, Option<serde_json::Value>);

/// Owns all per-tick mutable pipeline state: rolling windows, alert edges,
/// the tick counter and the feed-mode flag. Single writer by construction.
pub struct PipelineDriver<U: UpstreamFeed> {
    upstream: U,
    feed: SyntheticFeed,
    tracker: RollingTracker,
    detector: AlertDetector,
    state: Arc<RwLock<BridgeState>>,
    hub: Arc<BroadcastHub>,
    poll_interval: Duration,
    sim_notice_after: u32,

    tick: u64,
    mode: FeedMode,
    failures: u32,
}

impl<U: UpstreamFeed> PipelineDriver<U> {
    pub fn new(
        config: &BridgeConfig,
        upstream: U,
        feed: SyntheticFeed,
        state: Arc<RwLock<BridgeState>>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            upstream,
            feed,
            tracker: RollingTracker::new(
                config.analytics.window_size,
                config.analytics.spike_margin,
                config.analytics.spike_min_samples,
            ),
            detector: AlertDetector::new(config.thresholds.clone()),
            state,
            hub,
            poll_interval: Duration::from_secs(config.upstream.poll_interval_secs.max(1)),
            sim_notice_after: crate::config::defaults::SIM_NOTICE_AFTER_FAILURES,
            tick: 0,
            mode: FeedMode::Synthetic,
            failures: 0,
        }
    }

    /// Run the poll loop until cancelled. No timer survives cancellation.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("[PollDriver] Shutdown signal received after {} ticks", self.tick);
                    return;
                }
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// One complete production cycle: poll, fall back, enrich, publish.
    pub async fn run_cycle(&mut self) {
        let now = Utc::now();
        let mut notices: Vec<Notice> = Vec::new();

        let (raw, mode) = match self.upstream.fetch_batch().await {
            Ok(batch) => {
                if self.mode != FeedMode::Upstream {
                    notices.push((
                        LogLevel::Success,
                        "Upstream engine connected — live feed active".to_string(),
                        Some(json!({ "engine_status": batch.engine_status })),
                    ));
                    info!(
                        alerts = batch.engine_alerts,
                        "Connected to upstream engine via REST polling"
                    );
                }
                self.mode = FeedMode::Upstream;
                self.failures = 0;
                (batch.readings, FeedMode::Upstream)
            }
            Err(err) => {
                self.note_failure(&err, &mut notices);
                let samples = self.feed.tick(self.tick + 1, now);
                (samples, FeedMode::Synthetic)
            }
        };

        self.publish(raw, mode, now, notices).await;
    }

    fn note_failure(&mut self, err: &UpstreamError, notices: &mut Vec<Notice>) {
        self.failures += 1;

        if self.mode == FeedMode::Upstream {
            notices.push((
                LogLevel::Warning,
                "Upstream engine disconnected — switching to simulation mode".to_string(),
                None,
            ));
        }
        self.mode = FeedMode::Synthetic;

        if self.failures <= self.sim_notice_after {
            warn!(attempt = self.failures, error = %err, "Upstream unreachable");
        }
        if self.failures == self.sim_notice_after {
            notices.push((
                LogLevel::Info,
                "Simulation mode active — upstream engine will be retried every poll".to_string(),
                None,
            ));
        }
    }

    /// Shared enrichment and publication path for both feeds.
    async fn publish(
        &mut self,
        raw: Vec<RawReading>,
        mode: FeedMode,
        now: DateTime<Utc>,
        mut notices: Vec<Notice>,
    ) {
        self.tick += 1;
        let critical_cutoff = self.detector.lowest_cutoff().unwrap_or(f64::INFINITY);

        let mut readings = Vec::with_capacity(raw.len());
        let mut alerts = Vec::new();

        for r in raw {
            let stats = self.tracker.observe(&r.zone_id, r.aqi, r.marked_spike);

            if stats.spike {
                notices.push((
                    LogLevel::Warning,
                    format!(
                        "Spike detected: {} — AQI {:.0} (rolling avg {:.1})",
                        r.zone_name, r.aqi, stats.rolling_avg
                    ),
                    Some(json!({ "zone_id": r.zone_id, "aqi": r.aqi })),
                ));
            }

            if let Some(alert) = self.detector.evaluate(&r.zone_id, &r.zone_name, r.aqi, now) {
                // The lowest tier is advisory; everything above it is urgent.
                let level = if alert.threshold > critical_cutoff {
                    LogLevel::Critical
                } else {
                    LogLevel::Warning
                };
                notices.push((
                    level,
                    format!(
                        "{} alert: {} crossed AQI {:.0} (now {:.0})",
                        alert.severity, alert.zone_name, alert.threshold, alert.aqi
                    ),
                    Some(json!({ "zone_id": r.zone_id, "aqi": r.aqi, "threshold": alert.threshold })),
                ));
                alerts.push(alert);
            }

            readings.push(Reading {
                aqi_level: aqi_level(r.aqi).to_string(),
                rolling_avg: stats.rolling_avg,
                spike: stats.spike,
                timestamp: now,
                zone_id: r.zone_id,
                zone_name: r.zone_name,
                zone_category: r.category,
                aqi: r.aqi,
                pm25: r.pm25,
                pm10: r.pm10,
                no2: r.no2,
            });
        }

        let summary = summarize(&readings, critical_cutoff);
        if mode.is_upstream() {
            notices.push((
                LogLevel::Info,
                format!(
                    "Window update — city avg: {:.1} | max: {:.0} | critical: {}/{}",
                    summary.avg_aqi, summary.max_aqi, summary.critical_zones, summary.total_zones
                ),
                Some(json!({ "tick": self.tick })),
            ));
        }

        let spikes_this_tick = readings.iter().filter(|r| r.spike).count() as u64;
        let alerts_this_tick = alerts.len() as u64;

        // Update shared state and fan out while holding the write lock.
        // Registration also runs under the state lock, so a concurrently
        // registering subscriber either sees all of this tick in its
        // catch-up batch or receives all of it live, never neither.
        let mut state = self.state.write().await;
        state.tick = self.tick;
        state.feed = mode;
        state.consecutive_failures = self.failures;
        state.total_events += readings.len() as u64;
        state.spikes_detected += spikes_this_tick;
        state.alerts_triggered += alerts_this_tick;

        for (level, message, payload) in notices {
            let entry = state.event_log.push(level, message, payload);
            self.hub.broadcast(&StreamEvent::Log { log: entry });
        }

        let snapshot = Snapshot {
            tick: self.tick,
            timestamp: now,
            feed: mode,
            layer: mode.label().to_string(),
            stats: state.stats(),
            city_summary: summary,
            readings,
            active_alerts: alerts,
        };
        state.latest = Some(snapshot.clone());
        self.hub
            .broadcast(&StreamEvent::StreamUpdate { payload: snapshot });
    }
}

/// Derive the city-wide summary from one tick's readings.
fn summarize(readings: &[Reading], critical_cutoff: f64) -> CitySummary {
    if readings.is_empty() {
        return CitySummary {
            avg_aqi: 0.0,
            max_aqi: 0.0,
            aqi_level: aqi_level(0.0).to_string(),
            critical_zones: 0,
            total_zones: 0,
        };
    }

    let sum: f64 = readings.iter().map(|r| r.aqi).sum();
    let avg = (sum / readings.len() as f64 * 10.0).round() / 10.0;
    let max = readings.iter().map(|r| r.aqi).fold(f64::MIN, f64::max);
    let critical = readings.iter().filter(|r| r.aqi >= critical_cutoff).count();

    CitySummary {
        avg_aqi: avg,
        max_aqi: max,
        aqi_level: aqi_level(avg).to_string(),
        critical_zones: critical,
        total_zones: readings.len(),
    }
}

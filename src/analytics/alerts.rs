//! Edge-triggered threshold alert detection.
//!
//! The detector holds each zone's previous value and fires at most one alert
//! per zone per tick, only when the new value crosses a tier cutoff from
//! below. A zone holding above a cutoff never re-alerts until it first drops
//! back under that cutoff.

use crate::types::{Alert, ThresholdTier};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Stateful upward-edge detector over an ordered severity threshold table.
#[derive(Debug)]
pub struct AlertDetector {
    /// Tiers sorted by cutoff descending so the highest crossed tier wins.
    tiers: Vec<ThresholdTier>,
    previous: HashMap<String, f64>,
}

impl AlertDetector {
    pub fn new(mut tiers: Vec<ThresholdTier>) -> Self {
        tiers.sort_by(|a, b| b.cutoff.total_cmp(&a.cutoff));
        Self {
            tiers,
            previous: HashMap::new(),
        }
    }

    /// The lowest cutoff in the table; the single source of the "critical
    /// zone" classification used in city summaries.
    pub fn lowest_cutoff(&self) -> Option<f64> {
        self.tiers.last().map(|t| t.cutoff)
    }

    /// The highest cutoff in the table.
    pub fn highest_cutoff(&self) -> Option<f64> {
        self.tiers.first().map(|t| t.cutoff)
    }

    /// Evaluate a zone's new value against the table.
    ///
    /// Returns an alert only for an upward edge (previous < cutoff <= new);
    /// when several cutoffs are crossed in one tick the highest-severity
    /// tier wins. Zones never seen before are treated as rising from zero.
    pub fn evaluate(
        &mut self,
        zone_id: &str,
        zone_name: &str,
        aqi: f64,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let prev = self
            .previous
            .insert(zone_id.to_string(), aqi)
            .unwrap_or(0.0);

        for tier in &self.tiers {
            if aqi >= tier.cutoff && prev < tier.cutoff {
                return Some(Alert {
                    zone_id: zone_id.to_string(),
                    zone_name: zone_name.to_string(),
                    severity: tier.severity.clone(),
                    aqi,
                    threshold: tier.cutoff,
                    action: tier.action.clone(),
                    timestamp: now,
                });
            }
        }
        None
    }
}

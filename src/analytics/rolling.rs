//! Per-zone rolling window tracker.
//!
//! Maintains a bounded FIFO of each zone's most recent readings and computes
//! the rolling average and spike flag on every new value. Windows are fully
//! independent between zones; no cross-zone state exists.

use std::collections::{HashMap, VecDeque};

/// Result of feeding one value into a zone's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Rolling average over the window, including the new value (1 decimal).
    pub rolling_avg: f64,
    /// True if the value is an anomaly: externally marked, or above the
    /// rolling average by the configured margin with enough history.
    pub spike: bool,
}

/// Bounded per-zone history with rolling average and spike detection.
#[derive(Debug)]
pub struct RollingTracker {
    window_size: usize,
    spike_margin: f64,
    min_samples: usize,
    windows: HashMap<String, VecDeque<f64>>,
}

impl RollingTracker {
    pub fn new(window_size: usize, spike_margin: f64, min_samples: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            spike_margin,
            min_samples,
            windows: HashMap::new(),
        }
    }

    /// Feed one new value for a zone; returns the updated rolling stats.
    ///
    /// An empty window degrades gracefully: the average equals the sample
    /// and the margin rule stays inert until `min_samples` are present.
    pub fn observe(&mut self, zone_id: &str, value: f64, marked_anomaly: bool) -> WindowStats {
        let window = self
            .windows
            .entry(zone_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.window_size + 1));

        window.push_back(value);
        if window.len() > self.window_size {
            window.pop_front();
        }

        let sum: f64 = window.iter().sum();
        let rolling_avg = (sum / window.len() as f64 * 10.0).round() / 10.0;

        let spike = marked_anomaly
            || (window.len() >= self.min_samples && value > rolling_avg * self.spike_margin);

        WindowStats { rolling_avg, spike }
    }

    /// Number of samples currently held for a zone.
    pub fn samples(&self, zone_id: &str) -> usize {
        self.windows.get(zone_id).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RollingTracker {
        RollingTracker::new(20, 1.30, 3)
    }

    #[test]
    fn test_empty_window_average_equals_sample() {
        let mut t = tracker();
        let stats = t.observe("zone_1", 42.0, false);
        assert_eq!(stats.rolling_avg, 42.0);
        assert!(!stats.spike);
    }

    #[test]
    fn test_constant_value_converges_to_value() {
        let mut t = tracker();
        let mut stats = t.observe("zone_1", 120.0, false);
        for _ in 0..4 {
            stats = t.observe("zone_1", 120.0, false);
        }
        assert_eq!(stats.rolling_avg, 120.0);
        assert!(!stats.spike);
    }

    #[test]
    fn test_spike_flagged_above_margin_with_history() {
        let mut t = tracker();
        t.observe("zone_1", 100.0, false);
        t.observe("zone_1", 100.0, false);
        t.observe("zone_1", 100.0, false);
        // Window [100,100,100,200] -> avg 125; 200 > 125 * 1.30 = 162.5
        let stats = t.observe("zone_1", 200.0, false);
        assert!(stats.spike);
    }

    #[test]
    fn test_value_within_margin_never_flagged() {
        let mut t = tracker();
        t.observe("zone_1", 100.0, false);
        t.observe("zone_1", 100.0, false);
        t.observe("zone_1", 100.0, false);
        // Window [100,100,100,120] -> avg 105; 120 < 105 * 1.30 = 136.5
        let stats = t.observe("zone_1", 120.0, false);
        assert!(!stats.spike);
    }

    #[test]
    fn test_marked_anomaly_always_flagged() {
        let mut t = tracker();
        let stats = t.observe("zone_1", 50.0, true);
        assert!(stats.spike);
    }

    #[test]
    fn test_no_margin_spike_below_min_samples() {
        let mut t = tracker();
        t.observe("zone_1", 100.0, false);
        // Only 2 samples in the window, margin rule must not fire.
        let stats = t.observe("zone_1", 400.0, false);
        assert!(!stats.spike);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut t = RollingTracker::new(5, 1.30, 3);
        for i in 0..50 {
            t.observe("zone_1", f64::from(i), false);
        }
        assert_eq!(t.samples("zone_1"), 5);
    }

    #[test]
    fn test_windows_independent_per_zone() {
        let mut t = tracker();
        for _ in 0..5 {
            t.observe("zone_1", 400.0, false);
        }
        // zone_2's first sample must not see zone_1's history.
        let stats = t.observe("zone_2", 50.0, false);
        assert_eq!(stats.rolling_avg, 50.0);
        assert_eq!(t.samples("zone_2"), 1);
    }
}

//! Synthetic feed generator.
//!
//! Substitutes for the upstream engine whenever it is unreachable, producing
//! physically plausible per-zone samples: baseline x time-of-day factor,
//! a slow sinusoidal drift, bounded noise, and occasional exaggerated spikes
//! in traffic/industrial zones. The random source is injected so seeded runs
//! are fully deterministic; the clock is an argument so tests can pin the
//! hour of day.

use crate::config::SimulationConfig;
use crate::types::{RawReading, Zone};
use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Time-of-day multiplier: commute windows run high, overnight runs low.
pub fn time_factor(now: DateTime<Utc>) -> f64 {
    match now.hour() {
        7..=9 => 1.25,
        17..=20 => 1.20,
        0..=5 => 0.75,
        _ => 1.0,
    }
}

/// Deterministic-plus-noise generator over the zone registry.
pub struct SyntheticFeed<R: Rng = StdRng> {
    config: SimulationConfig,
    zones: &'static [Zone],
    rng: R,
}

impl SyntheticFeed<StdRng> {
    /// Entropy-seeded generator for production use.
    pub fn new(config: SimulationConfig, zones: &'static [Zone]) -> Self {
        Self::with_rng(config, zones, StdRng::from_entropy())
    }

    /// Seeded generator for reproducible runs (`--seed`) and tests.
    pub fn seeded(config: SimulationConfig, zones: &'static [Zone], seed: u64) -> Self {
        Self::with_rng(config, zones, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SyntheticFeed<R> {
    pub fn with_rng(config: SimulationConfig, zones: &'static [Zone], rng: R) -> Self {
        Self { config, zones, rng }
    }

    /// Produce one full set of zone samples for the given tick.
    pub fn tick(&mut self, tick: u64, now: DateTime<Utc>) -> Vec<RawReading> {
        let factor = time_factor(now);
        // Drift phase advances with the tick counter, not wall time, so a
        // seeded replay of N ticks is byte-identical.
        let drift = (tick as f64 * 0.3).sin() * self.config.drift_amplitude;

        let zones = self.zones;
        zones
            .iter()
            .map(|zone| self.sample_zone(zone, factor, drift))
            .collect()
    }

    fn sample_zone(&mut self, zone: &Zone, factor: f64, drift: f64) -> RawReading {
        let cfg = &self.config;

        let noise = self.rng.gen_range(-1.0..=1.0) * cfg.noise_amplitude;
        let marked_spike = zone.category.is_spike_prone()
            && cfg.spike_chance > 0.0
            && self.rng.gen::<f64>() < cfg.spike_chance;
        let boost = if marked_spike {
            self.rng.gen_range(cfg.spike_boost_min..=cfg.spike_boost_max)
        } else {
            0.0
        };

        let aqi = (zone.baseline_aqi * factor + drift + noise + boost)
            .round()
            .clamp(cfg.aqi_min, cfg.aqi_max);

        RawReading {
            zone_id: zone.id.to_string(),
            zone_name: zone.name.to_string(),
            category: zone.category,
            aqi,
            pm25: self.secondary(aqi, crate::config::defaults::PM25_RATIO),
            pm10: self.secondary(aqi, crate::config::defaults::PM10_RATIO),
            no2: self.secondary(aqi, crate::config::defaults::NO2_RATIO),
            marked_spike,
        }
    }

    /// Secondary pollutants are a fixed ratio of the AQI plus independent
    /// noise, not independently modelled.
    fn secondary(&mut self, aqi: f64, ratio: f64) -> f64 {
        let noise = self.rng.gen_range(-1.0..=1.0) * self.config.secondary_noise;
        ((aqi * ratio + noise).max(0.0) * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZoneCategory;
    use crate::zones;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).single().expect("valid time")
    }

    fn quiet_feed(seed: u64) -> SyntheticFeed {
        SyntheticFeed::seeded(SimulationConfig::quiet(), zones::registry(), seed)
    }

    fn industrial_aqi(samples: &[RawReading]) -> f64 {
        samples
            .iter()
            .find(|r| r.category == ZoneCategory::Industrial)
            .expect("industrial zone present")
            .aqi
    }

    #[test]
    fn test_overnight_runs_below_baseline() {
        let mut feed = quiet_feed(7);
        for tick in 1..=3 {
            let samples = feed.tick(tick, at_hour(2));
            // Baseline 210 * 0.75 = 157.5, well below baseline.
            assert!(industrial_aqi(&samples) < 210.0);
        }
    }

    #[test]
    fn test_commute_hour_runs_above_baseline() {
        let mut feed = quiet_feed(7);
        for tick in 1..=3 {
            let samples = feed.tick(tick, at_hour(8));
            // Baseline 210 * 1.25 = 262.5, well above baseline.
            assert!(industrial_aqi(&samples) > 210.0);
        }
    }

    #[test]
    fn test_time_factor_windows() {
        assert_eq!(time_factor(at_hour(8)), 1.25);
        assert_eq!(time_factor(at_hour(18)), 1.20);
        assert_eq!(time_factor(at_hour(2)), 0.75);
        assert_eq!(time_factor(at_hour(12)), 1.0);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let mut a = SyntheticFeed::seeded(SimulationConfig::default(), zones::registry(), 42);
        let mut b = SyntheticFeed::seeded(SimulationConfig::default(), zones::registry(), 42);
        let now = at_hour(12);
        for tick in 1..=10 {
            let sa = a.tick(tick, now);
            let sb = b.tick(tick, now);
            for (ra, rb) in sa.iter().zip(sb.iter()) {
                assert_eq!(ra.aqi, rb.aqi);
                assert_eq!(ra.marked_spike, rb.marked_spike);
                assert_eq!(ra.pm25, rb.pm25);
            }
        }
    }

    #[test]
    fn test_values_clamped_to_range() {
        let mut feed = SyntheticFeed::seeded(SimulationConfig::default(), zones::registry(), 3);
        for tick in 1..=200 {
            for sample in feed.tick(tick, at_hour(8)) {
                assert!(sample.aqi >= 10.0, "aqi {} under floor", sample.aqi);
                assert!(sample.aqi <= 500.0, "aqi {} over ceiling", sample.aqi);
            }
        }
    }

    #[test]
    fn test_spikes_only_in_prone_zones() {
        let config = SimulationConfig {
            spike_chance: 1.0,
            ..SimulationConfig::quiet()
        };
        let mut feed = SyntheticFeed::seeded(config, zones::registry(), 11);
        let samples = feed.tick(1, at_hour(12));
        for sample in samples {
            assert_eq!(sample.marked_spike, sample.category.is_spike_prone());
        }
    }

    #[test]
    fn test_secondary_pollutants_track_ratio() {
        let mut feed = quiet_feed(5);
        let samples = feed.tick(1, at_hour(12));
        for sample in samples {
            // secondary_noise is zero, so ratios are exact (to 1 decimal).
            assert_eq!(sample.pm25, (sample.aqi * 0.6 * 10.0).round() / 10.0);
            assert_eq!(sample.pm10, (sample.aqi * 0.9 * 10.0).round() / 10.0);
            assert_eq!(sample.no2, (sample.aqi * 0.3 * 10.0).round() / 10.0);
        }
    }

    #[test]
    fn test_samples_follow_registry_order() {
        let mut feed = quiet_feed(1);
        let samples = feed.tick(1, at_hour(12));
        let ids: Vec<_> = samples.iter().map(|s| s.zone_id.as_str()).collect();
        let expected: Vec<_> = zones::registry().iter().map(|z| z.id).collect();
        assert_eq!(ids, expected);
    }
}

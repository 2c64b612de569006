//! Zone registry: the fixed ordered list of monitored zones.
//!
//! Pure leaf dependency for the synthetic feed and the pipeline driver.
//! Baselines and categories mirror the city's monitoring network layout.

use crate::types::{Zone, ZoneCategory};

/// The monitored zones, in canonical snapshot order.
static ZONES: [Zone; 8] = [
    Zone {
        id: "zone_1",
        name: "Zone 1 - Central",
        category: ZoneCategory::Residential,
        baseline_aqi: 85.0,
    },
    Zone {
        id: "zone_2",
        name: "Zone 2 - North",
        category: ZoneCategory::Park,
        baseline_aqi: 45.0,
    },
    Zone {
        id: "zone_3",
        name: "Zone 3 - Traffic Hub",
        category: ZoneCategory::Traffic,
        baseline_aqi: 156.0,
    },
    Zone {
        id: "zone_4",
        name: "Zone 4 - East",
        category: ZoneCategory::Mixed,
        baseline_aqi: 120.0,
    },
    Zone {
        id: "zone_5",
        name: "Zone 5 - West",
        category: ZoneCategory::Commercial,
        baseline_aqi: 98.0,
    },
    Zone {
        id: "zone_6",
        name: "Zone 6 - Industrial",
        category: ZoneCategory::Industrial,
        baseline_aqi: 210.0,
    },
    Zone {
        id: "zone_7",
        name: "Zone 7 - South",
        category: ZoneCategory::Residential,
        baseline_aqi: 112.0,
    },
    Zone {
        id: "zone_8",
        name: "Zone 8 - Market Area",
        category: ZoneCategory::Commercial,
        baseline_aqi: 145.0,
    },
];

/// Fixed ordered list of monitored zones. Pure, infallible.
pub fn registry() -> &'static [Zone] {
    &ZONES
}

//! Radial climate bands and static climate event annotations.
//!
//! Zones are concentric bands on the disk, ordered outward:
//!
//! | Zone | Band |
//! |------|------|
//! | Polar | `[0, polar_max)` |
//! | Stable | `[polar_max, heating_min)` |
//! | Heating | `[heating_min, cooling_min)` |
//! | Cooling | `[cooling_min, subarctic_min)` |
//! | Subarctic | `[subarctic_min, outer_radius]` |
//!
//! Anything outside those bands (past the rim, negative or non-finite) is
//! [`ClimateZone::Temperate`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionSolver;
use crate::geometry::PolarCoordinate;

/// Climate classification of a radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateZone {
    Polar,
    Stable,
    Heating,
    Cooling,
    Subarctic,
    Temperate,
}

impl ClimateZone {
    /// Temperature anomaly slope in °C per 100 years.
    pub fn anomaly_per_century(&self) -> f64 {
        match self {
            ClimateZone::Polar => 2.0,
            ClimateZone::Stable => 0.5,
            ClimateZone::Heating => 3.0,
            ClimateZone::Cooling => -1.5,
            ClimateZone::Subarctic => -0.8,
            ClimateZone::Temperate => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClimateZone::Polar => "polar",
            ClimateZone::Stable => "stable",
            ClimateZone::Heating => "heating",
            ClimateZone::Cooling => "cooling",
            ClimateZone::Subarctic => "subarctic",
            ClimateZone::Temperate => "temperate",
        }
    }
}

/// The four band edges plus the disk rim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateBoundaries {
    pub polar_max: f64,
    pub heating_min: f64,
    pub cooling_min: f64,
    pub subarctic_min: f64,
    pub outer_radius: f64,
}

impl Default for ClimateBoundaries {
    fn default() -> Self {
        Self {
            polar_max: 2_500.0,
            heating_min: 5_000.0,
            cooling_min: 12_000.0,
            subarctic_min: 16_000.0,
            outer_radius: 20_000.0,
        }
    }
}

/// Pure climate queries over a set of band edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClimateModel {
    boundaries: ClimateBoundaries,
}

impl ClimateModel {
    pub fn new(boundaries: ClimateBoundaries) -> Self {
        Self { boundaries }
    }

    pub fn boundaries(&self) -> &ClimateBoundaries {
        &self.boundaries
    }

    /// Zone containing radius `r`.
    pub fn zone_at(&self, r: f64) -> ClimateZone {
        let b = &self.boundaries;
        if !r.is_finite() || r < 0.0 || r > b.outer_radius {
            ClimateZone::Temperate
        } else if r < b.polar_max {
            ClimateZone::Polar
        } else if r < b.heating_min {
            ClimateZone::Stable
        } else if r < b.cooling_min {
            ClimateZone::Heating
        } else if r < b.subarctic_min {
            ClimateZone::Cooling
        } else {
            ClimateZone::Subarctic
        }
    }

    /// Temperature anomaly (°C) after `years` at radius `r`.
    pub fn temperature_anomaly(&self, r: f64, years: f64) -> f64 {
        self.zone_at(r).anomaly_per_century() * years / 100.0
    }

    /// Zone a position will be in after `years` of expansion at `rate`.
    pub fn predict_future_zone(&self, position: PolarCoordinate, rate: f64, years: f64) -> ClimateZone {
        let future_r = ExpansionSolver::new(rate).expanded_radius(position.r, years);
        self.zone_at(future_r)
    }

    /// Whether a position not yet in the cooling band will be inside it
    /// after `years`.
    pub fn will_enter_cooling_zone(&self, position: PolarCoordinate, rate: f64, years: f64) -> bool {
        self.zone_at(position.r) != ClimateZone::Cooling
            && self.predict_future_zone(position, rate, years) == ClimateZone::Cooling
    }
}

/// Kind of a recorded climate event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateEventKind {
    Snow,
    Heat,
    Cold,
    Drought,
}

/// How unusual an event was for its location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Uncommon,
    Rare,
    Unprecedented,
}

/// A fixed annotation drawn on the map. Not simulated.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimateEvent {
    pub id: u32,
    pub kind: ClimateEventKind,
    pub name: &'static str,
    pub location: PolarCoordinate,
    pub date: NaiveDate,
    /// 1 (minor) to 5 (extreme).
    pub severity: u8,
    pub rarity: Rarity,
}

const EVENT_TABLE: &[(u32, ClimateEventKind, &str, f64, f64, (i32, u32, u32), u8, Rarity)] = &[
    (1, ClimateEventKind::Snow, "Saharan snowfall", 6_800.0, 0.05, (2018, 1, 7), 3, Rarity::Rare),
    (2, ClimateEventKind::Heat, "Siberian heatwave", 3_700.0, 1.85, (2020, 6, 20), 4, Rarity::Unprecedented),
    (3, ClimateEventKind::Cold, "Texas deep freeze", 6_900.0, -1.73, (2021, 2, 15), 5, Rarity::Rare),
    (4, ClimateEventKind::Heat, "Pacific Northwest heat dome", 5_100.0, -2.14, (2021, 6, 29), 5, Rarity::Unprecedented),
    (5, ClimateEventKind::Drought, "Horn of Africa drought", 9_700.0, 0.73, (2022, 3, 1), 4, Rarity::Rare),
    (6, ClimateEventKind::Snow, "Baghdad snowfall", 7_300.0, 0.78, (2008, 1, 11), 2, Rarity::Unprecedented),
    (7, ClimateEventKind::Cold, "Southern Brazil frost", 13_000.0, -0.86, (2021, 7, 29), 3, Rarity::Uncommon),
    (8, ClimateEventKind::Drought, "Murray-Darling drought", 14_000.0, 2.54, (2019, 12, 1), 4, Rarity::Rare),
];

/// Static list of notable climate events, for annotation only.
pub fn climate_events() -> Vec<ClimateEvent> {
    EVENT_TABLE
        .iter()
        .filter_map(|&(id, kind, name, r, theta, (y, m, d), severity, rarity)| {
            Some(ClimateEvent {
                id,
                kind,
                name,
                location: PolarCoordinate::new(r, theta),
                date: NaiveDate::from_ymd_opt(y, m, d)?,
                severity,
                rarity,
            })
        })
        .collect()
}

//! Moving point-light sun and its illumination footprint.
//!
//! The sun circles the origin once per day at a height of roughly
//! `altitude`. Over a year its circle breathes sinusoidally between the two
//! tropic radii. The lit area under it is a soft-edged disk whose radius is
//! set by the sun's height and a fixed illumination half-angle.
//!
//! Time arguments are in days.
//!
//! The day-length and solar-noon queries are fixed-resolution scans over a
//! day, not closed forms: their granularity (5 and 10 minutes) is part of
//! the result. They cost O(samples) per call; keep them out of per-frame
//! paths for anything but a handful of observers.

use std::f64::consts::TAU;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{smoothstep, Vector2};

/// Samples used by [`SolarSolver::solar_noon`] (10-minute steps).
pub const SOLAR_NOON_SAMPLES: u32 = 144;

/// Samples used by [`SolarSolver::day_length_hours`] (5-minute steps).
pub const DAY_LENGTH_SAMPLES: u32 = 288;

/// Default intensity threshold separating day from night.
pub const DAYLIGHT_THRESHOLD: f64 = 0.2;

/// Solar model parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarConfig {
    /// Mean height of the sun above the disk.
    pub altitude: f64,
    /// Fractional amplitude of the annual height oscillation.
    pub altitude_variation: f64,
    /// Days per year.
    pub period: f64,
    /// Days per revolution around the origin.
    pub daily_period: f64,
    /// Radius of the sun's circle at the northern solstice.
    pub inner_tropic_radius: f64,
    /// Radius of the sun's circle at the southern solstice.
    pub outer_tropic_radius: f64,
    /// Half-angle of the illumination cone, in degrees.
    pub illumination_half_angle_deg: f64,
    /// Intensity floor for unlit areas.
    pub ambient: f64,
}

impl SolarConfig {
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude.max(0.0);
        self
    }

    pub fn with_tropics(mut self, inner: f64, outer: f64) -> Self {
        self.inner_tropic_radius = inner.min(outer).max(0.0);
        self.outer_tropic_radius = inner.max(outer).max(0.0);
        self
    }

    pub fn with_half_angle(mut self, degrees: f64) -> Self {
        self.illumination_half_angle_deg = degrees.clamp(0.0, 89.0);
        self
    }

    pub fn with_ambient(mut self, ambient: f64) -> Self {
        self.ambient = ambient.clamp(0.0, 1.0);
        self
    }
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            altitude: 5_000.0,
            altitude_variation: 0.02,
            period: 365.25,
            daily_period: 1.0,
            inner_tropic_radius: 7_396.0,
            outer_tropic_radius: 12_604.0,
            illumination_half_angle_deg: 50.0,
            ambient: 0.05,
        }
    }
}

/// Periodic sun position and illumination queries.
#[derive(Clone, Debug, PartialEq)]
pub struct SolarSolver {
    config: SolarConfig,
}

impl SolarSolver {
    pub fn new(config: SolarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolarConfig {
        &self.config
    }

    /// Fraction of the year elapsed at `t`, in `[0, 1)`.
    pub fn annual_phase(&self, t: f64) -> f64 {
        t.rem_euclid(self.config.period) / self.config.period
    }

    /// Fraction of the day elapsed at `t`, in `[0, 1)`.
    pub fn daily_phase(&self, t: f64) -> f64 {
        t.rem_euclid(self.config.daily_period) / self.config.daily_period
    }

    /// Radius of the sun's daily circle at `t`.
    pub fn sun_radius(&self, t: f64) -> f64 {
        let c = &self.config;
        let mid = (c.inner_tropic_radius + c.outer_tropic_radius) / 2.0;
        let amplitude = (c.outer_tropic_radius - c.inner_tropic_radius) / 2.0;
        mid + amplitude * (TAU * self.annual_phase(t)).sin()
    }

    /// Sun position `(x, y, z)` at `t` days.
    pub fn sun_position(&self, t: f64) -> DVec3 {
        let c = &self.config;
        let annual = TAU * self.annual_phase(t);
        let radius = self.sun_radius(t);
        let angle = TAU * self.daily_phase(t);
        let z = c.altitude * (1.0 + c.altitude_variation * annual.sin());
        DVec3::new(radius * angle.cos(), radius * angle.sin(), z)
    }

    /// Radius of the lit footprint when the sun is at height `z`.
    pub fn cone_radius(&self, z: f64) -> f64 {
        z * self.config.illumination_half_angle_deg.to_radians().tan()
    }

    /// Intensity in `[ambient, 1]` at a surface point.
    pub fn illumination_intensity(&self, surface: Vector2, t: f64) -> f64 {
        let sun = self.sun_position(t);
        let distance = surface.distance(sun.truncate());
        let cone = self.cone_radius(sun.z);
        let lit = 1.0 - smoothstep(0.6 * cone, 1.4 * cone, distance);
        lit.max(self.config.ambient)
    }

    /// Whether intensity exceeds `threshold` (use [`DAYLIGHT_THRESHOLD`] by default).
    pub fn is_daylight(&self, pos: Vector2, t: f64, threshold: f64) -> bool {
        self.illumination_intensity(pos, t) > threshold
    }

    /// `samples` positions over the day containing `t`.
    pub fn daily_sun_path(&self, t: f64, samples: u32) -> Vec<DVec3> {
        let day = self.config.daily_period;
        let start = (t / day).floor() * day;
        (0..samples)
            .map(|i| self.sun_position(start + day * i as f64 / samples as f64))
            .collect()
    }

    /// `samples` positions spread over one year starting at `t = 0`.
    pub fn annual_sun_path(&self, samples: u32) -> Vec<DVec3> {
        let period = self.config.period;
        (0..samples)
            .map(|i| self.sun_position(period * i as f64 / samples as f64))
            .collect()
    }

    /// Time (days) within the day starting at `date` when the sun is closest
    /// to `observer`, to 10-minute resolution.
    pub fn solar_noon(&self, observer: Vector2, date: f64) -> f64 {
        let start = date.floor();
        let mut best_t = start;
        let mut best_distance = f64::INFINITY;

        for i in 0..SOLAR_NOON_SAMPLES {
            let t = start + i as f64 / SOLAR_NOON_SAMPLES as f64;
            let d = observer.distance(self.sun_position(t).truncate());
            if d < best_distance {
                best_distance = d;
                best_t = t;
            }
        }

        best_t
    }

    /// Hours of daylight at `observer` on the day starting at `date`.
    ///
    /// Scans the day in 5-minute steps for the rising and falling crossings
    /// of [`DAYLIGHT_THRESHOLD`]. With no crossing the answer is 24 or 0 by
    /// the intensity at local solar noon.
    pub fn day_length_hours(&self, observer: Vector2, date: f64) -> f64 {
        let start = date.floor();
        let n = DAY_LENGTH_SAMPLES;
        let step = 1.0 / n as f64;
        let lit: Vec<bool> = (0..n)
            .map(|i| self.is_daylight(observer, start + i as f64 * step, DAYLIGHT_THRESHOLD))
            .collect();

        let mut sunrise = None;
        let mut sunset = None;
        for i in 0..n as usize {
            let prev = lit[(i + n as usize - 1) % n as usize];
            match (prev, lit[i]) {
                (false, true) if sunrise.is_none() => sunrise = Some(i),
                (true, false) if sunset.is_none() => sunset = Some(i),
                _ => {}
            }
        }

        match (sunrise, sunset) {
            (Some(rise), Some(set)) => {
                let span = (set as f64 - rise as f64).rem_euclid(n as f64);
                span * step * 24.0
            }
            _ => {
                let noon = self.solar_noon(observer, start);
                if self.is_daylight(observer, noon, DAYLIGHT_THRESHOLD) {
                    24.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl Default for SolarSolver {
    fn default() -> Self {
        Self::new(SolarConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver() -> SolarSolver {
        SolarSolver::default()
    }

    #[test]
    fn test_sun_radius_stays_between_tropics() {
        let s = solver();
        for day in 0..366 {
            let r = s.sun_radius(day as f64 + 0.37);
            assert!(r >= 7_396.0 - 1e-6 && r <= 12_604.0 + 1e-6);
        }
    }

    #[test]
    fn test_sun_position_is_periodic() {
        let s = solver();
        let a = s.sun_position(10.25);
        let b = s.sun_position(10.25 + 365.25);
        assert!((a - b).length() < 1e-6);
    }

    #[test]
    fn test_sun_moves_with_daily_phase() {
        let s = solver();
        let p0 = s.sun_position(0.0);
        assert!(p0.y.abs() < 1e-9);
        assert!((p0.x - 10_000.0).abs() < 1e-6);
        let quarter = s.sun_position(0.25);
        assert!(quarter.x.abs() < 100.0);
        assert!(quarter.y > 0.0);
    }

    #[test]
    fn test_intensity_bounds() {
        let s = solver();
        let sun = s.sun_position(3.3).truncate();
        assert!((s.illumination_intensity(sun, 3.3) - 1.0).abs() < 1e-12);
        let far = -sun;
        assert_eq!(s.illumination_intensity(far, 3.3), 0.05);
    }

    #[test]
    fn test_is_daylight_threshold() {
        let s = solver();
        let sun = s.sun_position(1.5).truncate();
        assert!(s.is_daylight(sun, 1.5, DAYLIGHT_THRESHOLD));
        assert!(!s.is_daylight(-sun, 1.5, DAYLIGHT_THRESHOLD));
    }

    #[test]
    fn test_paths_are_fresh_and_sized() {
        let s = solver();
        let daily = s.daily_sun_path(4.7, 48);
        assert_eq!(daily.len(), 48);
        assert_eq!(daily, s.daily_sun_path(4.2, 48));
        assert_eq!(s.annual_sun_path(365).len(), 365);
    }

    #[test]
    fn test_solar_noon_points_at_observer() {
        let s = solver();
        // Observer on the sun's circle at a quarter turn.
        let observer = Vector2::new(0.0, s.sun_radius(20.25));
        let noon = s.solar_noon(observer, 20.0);
        assert!(noon >= 20.0 && noon < 21.0);
        assert!((noon - 20.25).abs() <= 1.0 / SOLAR_NOON_SAMPLES as f64);
    }

    #[test]
    fn test_day_length_partial_day() {
        let s = solver();
        let observer = Vector2::new(10_000.0, 0.0);
        let hours = s.day_length_hours(observer, 80.0);
        assert!(hours > 0.0 && hours < 24.0, "hours {hours}");
        // Resolution is one 5-minute sample
        let samples = hours * DAY_LENGTH_SAMPLES as f64 / 24.0;
        assert!((samples - samples.round()).abs() < 1e-9);
    }

    #[test]
    fn test_polar_night_and_day_edge_cases() {
        // A huge cone lights everything all day.
        let bright = SolarSolver::new(SolarConfig::default().with_half_angle(89.0));
        assert_eq!(bright.day_length_hours(Vector2::ZERO, 5.0), 24.0);

        // A sun with no height lights nothing away from its own track.
        let dark = SolarSolver::new(SolarConfig::default().with_altitude(0.0));
        assert_eq!(dark.day_length_hours(Vector2::new(19_000.0, 0.0), 5.0), 0.0);
    }
}

//! Displacement stations advected by the expansion.
//!
//! Stations are point markers scattered over the disk. Each frame their
//! radius is multiplied by `1 + rate * dt`. Because that multiply compounds
//! frame over frame it is only a first-order match for
//! [`ExpansionSolver::expanded_radius`]; over long spans the station
//! population runs ahead of the closed form. Both are kept on purpose.
//!
//! `displacement` is always recomputed as
//! `cartesian(position) - cartesian(initial_position)`, never accumulated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionSolver;
use crate::geometry::{PolarCoordinate, Vector2};

/// Power applied to the uniform radius sample; below 1 biases outward.
pub const RADIUS_BIAS_EXPONENT: f64 = 0.7;

/// Minimum cosine between displacement and radial direction to count as radial.
pub const RADIAL_COSINE_THRESHOLD: f64 = 0.8;

/// Fraction of radial stations needed to call the pattern radial.
pub const RADIAL_FRACTION_THRESHOLD: f64 = 0.75;

/// Station population parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub count: u32,
    /// RNG seed so a population can be regenerated exactly.
    pub seed: u64,
    pub min_radius: f64,
    /// Largest sampled radius as a fraction of the disk radius.
    pub max_radius_fraction: f64,
}

impl StationConfig {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            count: 200,
            seed: 0x5EED,
            min_radius: 500.0,
            max_radius_fraction: 0.95,
        }
    }
}

/// A single station.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub id: u32,
    pub name: String,
    pub position: PolarCoordinate,
    /// Where the station started. Never mutated after generation.
    pub initial_position: PolarCoordinate,
    pub velocity: Vector2,
    pub displacement: Vector2,
}

impl Station {
    pub fn new(id: u32, name: impl Into<String>, position: PolarCoordinate) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            initial_position: position,
            velocity: Vector2::ZERO,
            displacement: Vector2::ZERO,
        }
    }

    fn recompute_displacement(&mut self) {
        self.displacement = self.position.to_cartesian() - self.initial_position.to_cartesian();
    }
}

/// Least-squares fit of displacement magnitude against initial radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacementRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub samples: usize,
}

/// Result of [`validate_expansion_pattern`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpansionPattern {
    pub radial_count: usize,
    pub total: usize,
    pub radial_fraction: f64,
    pub is_radial: bool,
}

/// Latitude-like label for a radius on a disk of radius `outer_radius`.
pub fn pseudo_latitude(r: f64, outer_radius: f64) -> f64 {
    90.0 - 180.0 * r / outer_radius
}

fn region_name(latitude: f64) -> &'static str {
    if latitude > 60.0 {
        "Arctic"
    } else if latitude > 20.0 {
        "Northern"
    } else if latitude >= -20.0 {
        "Equatorial"
    } else if latitude >= -60.0 {
        "Southern"
    } else {
        "Antarctic"
    }
}

/// Owns and advances the station population.
#[derive(Clone, Debug)]
pub struct StationSimulator {
    config: StationConfig,
    outer_radius: f64,
    expansion: ExpansionSolver,
    stations: Vec<Station>,
}

impl StationSimulator {
    /// Create a simulator and generate `config.count` stations.
    pub fn new(config: StationConfig, outer_radius: f64, rate: f64) -> Self {
        let mut sim = Self {
            config,
            outer_radius,
            expansion: ExpansionSolver::new(rate),
            stations: Vec::new(),
        };
        sim.generate_stations(sim.config.count);
        sim
    }

    /// Create a simulator around an explicit station list.
    pub fn from_stations(stations: Vec<Station>, outer_radius: f64, rate: f64) -> Self {
        Self {
            config: StationConfig::new(stations.len() as u32),
            outer_radius,
            expansion: ExpansionSolver::new(rate),
            stations,
        }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn rate(&self) -> f64 {
        self.expansion.rate()
    }

    pub fn set_expansion_rate(&mut self, rate: f64) {
        self.expansion.set_expansion_rate(rate);
    }

    /// Replace the population with `count` freshly sampled stations.
    pub fn generate_stations(&mut self, count: u32) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let r_min = self.config.min_radius;
        let r_max = (self.config.max_radius_fraction * self.outer_radius).max(r_min);

        self.stations = (0..count)
            .map(|id| {
                let u: f64 = rng.gen();
                let r = r_min + (r_max - r_min) * u.powf(RADIUS_BIAS_EXPONENT);
                let theta = rng.gen_range(0.0..std::f64::consts::TAU);
                let region = region_name(pseudo_latitude(r, self.outer_radius));
                Station::new(id, format!("{region}-{id:03}"), PolarCoordinate::new(r, theta))
            })
            .collect();
        tracing::debug!(count, "generated stations");
    }

    /// Advance every station by `dt` years.
    pub fn update_positions(&mut self, dt: f64) {
        let factor = 1.0 + self.expansion.rate() * dt;
        for station in &mut self.stations {
            station.position = station.position.with_radius(station.position.r * factor);
            station.velocity = self.expansion.velocity_at(station.position);
            station.recompute_displacement();
        }
    }

    /// Put every station back at its initial position.
    pub fn reset(&mut self) {
        for station in &mut self.stations {
            station.position = station.initial_position;
            station.velocity = Vector2::ZERO;
            station.displacement = Vector2::ZERO;
        }
    }

    /// OLS of `|displacement|` against initial radius. `None` with fewer than
    /// two stations or when every initial radius is the same.
    pub fn analyze_displacement_pattern(&self) -> Option<DisplacementRegression> {
        let n = self.stations.len();
        if n < 2 {
            return None;
        }

        let xs = self.stations.iter().map(|s| s.initial_position.r);
        let ys = self.stations.iter().map(|s| s.displacement.length());
        let mean_x = xs.clone().sum::<f64>() / n as f64;
        let mean_y = ys.clone().sum::<f64>() / n as f64;

        let (mut sxx, mut sxy) = (0.0, 0.0);
        for (x, y) in xs.clone().zip(ys.clone()) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }
        if sxx <= f64::EPSILON {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (x, y) in xs.zip(ys) {
            let predicted = slope * x + intercept;
            ss_res += (y - predicted) * (y - predicted);
            ss_tot += (y - mean_y) * (y - mean_y);
        }
        let r_squared = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res <= f64::EPSILON {
            1.0
        } else {
            0.0
        };

        Some(DisplacementRegression {
            slope,
            intercept,
            r_squared,
            samples: n,
        })
    }
}

/// Classify a population as radially expanding.
///
/// A station counts as radial when its displacement is within
/// `acos(0.8)` of its own radial direction. Stations that have not moved
/// never count.
pub fn validate_expansion_pattern(stations: &[Station]) -> ExpansionPattern {
    let total = stations.len();
    let radial_count = stations
        .iter()
        .filter(|s| {
            let dir = s.displacement.normalize_or_zero();
            dir != Vector2::ZERO
                && dir.dot(s.initial_position.radial_direction()) >= RADIAL_COSINE_THRESHOLD
        })
        .count();
    let radial_fraction = if total == 0 {
        0.0
    } else {
        radial_count as f64 / total as f64
    };

    ExpansionPattern {
        radial_count,
        total,
        radial_fraction,
        is_radial: total > 0 && radial_fraction >= RADIAL_FRACTION_THRESHOLD,
    }
}

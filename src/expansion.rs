//! Closed-form radial expansion of the disk.
//!
//! Every radius grows linearly in time from a reference epoch:
//!
//! ```text
//! r(t) = r0 * (1 + k * (t - t0))
//! ```
//!
//! `k` is the expansion rate per simulation year. The station simulator
//! advances positions with a per-frame multiply instead (see
//! [`crate::stations`]); the two agree to first order in `dt`.

use crate::error::DomainError;
use crate::geometry::{PolarCoordinate, Vector2};

/// Length of a day at `t = 0`, in hours.
pub const BASE_DAY_LENGTH_HOURS: f64 = 24.0;

/// Linear-in-time expansion model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpansionSolver {
    rate: f64,
    reference_time: f64,
    base_day_length: f64,
}

impl ExpansionSolver {
    /// Create a solver with rate `k` and reference time 0.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            reference_time: 0.0,
            base_day_length: BASE_DAY_LENGTH_HOURS,
        }
    }

    /// Set the reference time `t0`.
    pub fn with_reference_time(mut self, t0: f64) -> Self {
        self.reference_time = t0;
        self
    }

    /// Set the day length (hours) at `t = 0`.
    pub fn with_base_day_length(mut self, hours: f64) -> Self {
        self.base_day_length = hours;
        self
    }

    /// Current expansion rate `k`.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Reference time `t0`.
    #[inline]
    pub fn reference_time(&self) -> f64 {
        self.reference_time
    }

    pub fn set_expansion_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    /// `r0 * (1 + k (t - t0))`. Not clamped: large negative times give
    /// negative radii and it is up to the caller to reject them.
    #[inline]
    pub fn expanded_radius(&self, r0: f64, t: f64) -> f64 {
        r0 * self.growth_factor(t)
    }

    /// `1 + k (t - t0)`.
    #[inline]
    pub fn growth_factor(&self, t: f64) -> f64 {
        1.0 + self.rate * (t - self.reference_time)
    }

    /// Radial speed `k r` of a point at radius `r`.
    #[inline]
    pub fn expansion_velocity(&self, r: f64) -> f64 {
        self.rate * r
    }

    /// Cartesian velocity of a point: `k r` along its own radial direction.
    pub fn velocity_at(&self, position: PolarCoordinate) -> Vector2 {
        position.radial_direction() * self.expansion_velocity(position.r)
    }

    /// `(1 + k t)^2`.
    #[inline]
    pub fn moment_of_inertia_scale(&self, t: f64) -> f64 {
        let f = 1.0 + self.rate * t;
        f * f
    }

    /// Day length in hours at time `t`.
    #[inline]
    pub fn day_length(&self, t: f64) -> f64 {
        self.base_day_length * self.moment_of_inertia_scale(t)
    }

    /// Radius `years_ago` years before a point was at `r_now`.
    ///
    /// Inverse of [`expanded_radius`](Self::expanded_radius) over an elapsed
    /// span. Fails when `1 + k * years_ago` is zero or the result is not finite.
    pub fn historical_radius(&self, r_now: f64, years_ago: f64) -> Result<f64, DomainError> {
        let r = r_now / (1.0 + self.rate * years_ago);
        if r.is_finite() {
            Ok(r)
        } else {
            Err(DomainError::NonFiniteHistoricalRadius {
                rate: self.rate,
                years_ago,
            })
        }
    }
}

impl Default for ExpansionSolver {
    fn default() -> Self {
        Self::new(0.0)
    }
}

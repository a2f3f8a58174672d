//! Polar/Cartesian conversion and small numeric helpers.
//!
//! Everything in the simulation is positioned on a flat disk centred on a
//! fixed origin. Positions are stored as [`PolarCoordinate`]s and converted
//! to Cartesian [`Vector2`]s whenever they are rendered or combined with
//! other Cartesian data.
//!
//! Vector algebra (add, subtract, scale, dot, magnitude) comes straight from
//! [`glam::DVec2`]; the helpers here cover the cases where the semantics are
//! specific to this crate.

use std::f64::consts::{PI, TAU};

use glam::DVec2;

/// Cartesian 2D vector used by every solver.
pub type Vector2 = DVec2;

/// A position on the disk as radial distance and angle.
///
/// `r` is never negative. `theta` is not normalized; use
/// [`angular_difference`] when comparing angles.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PolarCoordinate {
    /// Distance from the origin (always `>= 0`).
    pub r: f64,
    /// Angle in radians.
    pub theta: f64,
}

impl PolarCoordinate {
    /// Create a polar coordinate.
    ///
    /// A negative radius is folded onto the opposite ray so the `r >= 0`
    /// invariant holds for every value this type carries.
    pub fn new(r: f64, theta: f64) -> Self {
        if r < 0.0 {
            Self { r: -r, theta: theta + PI }
        } else {
            Self { r, theta }
        }
    }

    /// Convert to Cartesian `(r cos θ, r sin θ)`.
    #[inline]
    pub fn to_cartesian(self) -> Vector2 {
        polar_to_cartesian(self)
    }

    /// Convert a Cartesian point to polar form.
    #[inline]
    pub fn from_cartesian(v: Vector2) -> Self {
        cartesian_to_polar(v)
    }

    /// Same angle, different radius.
    #[inline]
    pub fn with_radius(self, r: f64) -> Self {
        Self::new(r, self.theta)
    }

    /// Unit vector pointing away from the origin along this position's angle.
    #[inline]
    pub fn radial_direction(self) -> Vector2 {
        DVec2::new(self.theta.cos(), self.theta.sin())
    }
}

/// `(r, θ) -> (r cos θ, r sin θ)`.
#[inline]
pub fn polar_to_cartesian(p: PolarCoordinate) -> Vector2 {
    DVec2::new(p.r * p.theta.cos(), p.r * p.theta.sin())
}

/// `(x, y) -> (|v|, atan2(y, x))`. The angle of the origin is 0.
#[inline]
pub fn cartesian_to_polar(v: Vector2) -> PolarCoordinate {
    PolarCoordinate {
        r: v.length(),
        theta: v.y.atan2(v.x),
    }
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed arc from `b` to `a`, in `(-π, π]`.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Cubic Hermite step between `edge0` and `edge1`, clamped to `[0, 1]`.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Unit vector in the direction of `v`, or zero for the zero vector.
#[inline]
pub fn normalize(v: Vector2) -> Vector2 {
    v.normalize_or_zero()
}

/// Euclidean length of `v`.
#[inline]
pub fn magnitude(v: Vector2) -> f64 {
    v.length()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_polar_round_trip() {
        for &theta in &[-7.0, -PI, -1.0, 0.0, 0.5, PI, 4.0, 13.0] {
            let p = PolarCoordinate::new(1234.5, theta);
            let back = cartesian_to_polar(polar_to_cartesian(p));
            assert!((back.r - p.r).abs() < 1e-9 * p.r);
            assert!(angular_difference(back.theta, theta).abs() < EPS);
        }
    }

    #[test]
    fn test_negative_radius_folds() {
        let p = PolarCoordinate::new(-5.0, 0.0);
        assert_eq!(p.r, 5.0);
        let c = p.to_cartesian();
        assert!((c.x + 5.0).abs() < EPS);
        assert!(c.y.abs() < EPS);
    }

    #[test]
    fn test_origin_to_polar() {
        let p = cartesian_to_polar(DVec2::ZERO);
        assert_eq!(p.r, 0.0);
        assert_eq!(p.theta, 0.0);
    }

    #[test]
    fn test_normalize_angle_range() {
        for &a in &[-100.0, -TAU, -0.1, 0.0, 3.0, TAU, 100.0] {
            let n = normalize_angle(a);
            assert!((0.0..TAU).contains(&n), "{a} -> {n}");
        }
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < EPS);
        assert_eq!(normalize_angle(-1e-18), 0.0);
    }

    #[test]
    fn test_angular_difference_shortest_arc() {
        assert!((angular_difference(0.1, TAU - 0.1) - 0.2).abs() < EPS);
        assert!((angular_difference(TAU - 0.1, 0.1) + 0.2).abs() < EPS);
        // Half turn maps to +π, never -π
        assert!((angular_difference(PI, 0.0) - PI).abs() < EPS);
        assert!((angular_difference(0.0, PI) - PI).abs() < EPS);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < EPS);
        assert!((smoothstep(10.0, 20.0, 12.5) - 0.15625).abs() < EPS);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert_eq!(lerp(2.0, 4.0, 0.25), 2.5);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(DVec2::ZERO), DVec2::ZERO);
        let n = normalize(DVec2::new(3.0, 4.0));
        assert!((magnitude(n) - 1.0).abs() < EPS);
    }
}

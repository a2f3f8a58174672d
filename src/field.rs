//! Analytic toroidal field and streamline tracing.
//!
//! The field is evaluated in polar form and rotated back into Cartesian
//! space:
//!
//! ```text
//! B_r(r, θ) = B0 cos θ / r²
//! B_θ(r, θ) = B0 sin θ / r²
//! ```
//!
//! `r` is floored to [`MIN_FIELD_RADIUS`] so the origin never produces an
//! infinity.
//!
//! # Streamlines
//!
//! Lines are traced with classic RK4 over the *unit* field direction, so
//! every step advances the same arc length regardless of field magnitude.
//! That gives evenly spaced vertices for drawing at the cost of physical
//! accuracy.
//!
//! ```ignore
//! let solver = FieldSolver::new(1.0e6, 20_000.0);
//! let lines = solver.generate_streamlines(&FieldConfig::default());
//! ```

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geometry::{cartesian_to_polar, PolarCoordinate, Vector2};

/// Radius floor used when evaluating the field near the origin.
pub const MIN_FIELD_RADIUS: f64 = 1e-3;

/// Lines stop once they fall inside this radius.
pub const CENTRE_ABSORPTION_RADIUS: f64 = 1.0;

/// Scale applied to the magnitude channel of [`FieldTexture`] before clamping.
pub const TEXTURE_MAGNITUDE_SCALE: f64 = 1.0 / 100.0;

/// Largest accepted field texture side length.
pub const MAX_TEXTURE_RESOLUTION: u32 = 2048;

/// Streamline and overlay parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of streamlines, seeded evenly in angle.
    pub line_count: u32,
    /// Radius of the seed ring.
    pub start_radius: f64,
    /// Upper bound on RK4 steps per line.
    pub max_steps: u32,
    /// Arc length advanced per step.
    pub step_size: f64,
    /// Side length of the sampled field texture. 0 disables the texture path:
    /// no samples are taken and the magnitude overlay is not drawn.
    pub texture_resolution: u32,
}

impl FieldConfig {
    /// Create a field configuration with `line_count` lines.
    ///
    /// Default values:
    /// - `start_radius`: 100
    /// - `max_steps`: 400
    /// - `step_size`: 50
    /// - `texture_resolution`: 128
    pub fn new(line_count: u32) -> Self {
        Self {
            line_count,
            start_radius: 100.0,
            max_steps: 400,
            step_size: 50.0,
            texture_resolution: 128,
        }
    }

    /// Set the seed ring radius (floored at the absorption radius).
    pub fn with_start_radius(mut self, radius: f64) -> Self {
        self.start_radius = radius.max(CENTRE_ABSORPTION_RADIUS);
        self
    }

    /// Set the step budget per line.
    pub fn with_max_steps(mut self, steps: u32) -> Self {
        self.max_steps = steps;
        self
    }

    /// Set the RK4 step size (must be positive).
    pub fn with_step_size(mut self, step: f64) -> Self {
        self.step_size = step.abs().max(f64::EPSILON);
        self
    }

    /// Set the texture resolution. 0 turns the texture path off.
    pub fn with_texture_resolution(mut self, resolution: u32) -> Self {
        self.texture_resolution = resolution.min(MAX_TEXTURE_RESOLUTION);
        self
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::new(24)
    }
}

/// A traced field line.
///
/// Always recomputed from scratch; never extended in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Streamline {
    pub points: Vec<Vector2>,
}

impl Streamline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// RGBA float samples of the field over `[-R, R]²`.
///
/// Channels per texel: direction x and y remapped to `[0, 1]`, a zero
/// placeholder, and magnitude scaled by [`TEXTURE_MAGNITUDE_SCALE`] and
/// clamped to `[0, 1]`. Rows run from `y = -R` upwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldTexture {
    pub resolution: u32,
    pub data: Vec<f32>,
}

impl FieldTexture {
    /// True when no texels were sampled, i.e. the texture path is off.
    pub fn is_empty(&self) -> bool {
        self.resolution == 0 || self.data.is_empty()
    }

    /// Texel at column `x`, row `y`.
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = ((y * self.resolution + x) * 4) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Quantize to 8-bit RGBA for upload or dumping.
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let bytes = self
            .data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        image::RgbaImage::from_raw(self.resolution, self.resolution, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.resolution, self.resolution))
    }
}

/// Evaluates the toroidal field of strength `B0` over a disk of radius `R`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSolver {
    strength: f64,
    outer_radius: f64,
}

impl FieldSolver {
    pub fn new(strength: f64, outer_radius: f64) -> Self {
        Self {
            strength,
            outer_radius,
        }
    }

    #[inline]
    pub fn strength(&self) -> f64 {
        self.strength
    }

    #[inline]
    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    pub fn set_strength(&mut self, strength: f64) {
        self.strength = strength;
    }

    pub fn set_outer_radius(&mut self, radius: f64) {
        self.outer_radius = radius;
    }

    /// Field components `(B_r, B_θ)` in the local polar basis.
    pub fn field_vector_polar(&self, r: f64, theta: f64) -> Vector2 {
        let r = r.max(MIN_FIELD_RADIUS);
        let scale = self.strength / (r * r);
        Vector2::new(scale * theta.cos(), scale * theta.sin())
    }

    /// Field at a Cartesian point, rotated out of the polar basis.
    pub fn field_vector_cartesian(&self, pos: Vector2) -> Vector2 {
        let PolarCoordinate { r, theta } = cartesian_to_polar(pos);
        let b = self.field_vector_polar(r, theta);
        let (sin, cos) = theta.sin_cos();
        Vector2::new(b.x * cos - b.y * sin, b.x * sin + b.y * cos)
    }

    /// `|B|` at a Cartesian point.
    pub fn field_magnitude(&self, pos: Vector2) -> f64 {
        let PolarCoordinate { r, theta } = cartesian_to_polar(pos);
        self.field_vector_polar(r, theta).length()
    }

    /// Unit field direction, zero where the field vanishes.
    #[inline]
    fn direction(&self, pos: Vector2) -> Vector2 {
        self.field_vector_cartesian(pos).normalize_or_zero()
    }

    /// One RK4 step over the unit direction field.
    fn rk4_step(&self, p: Vector2, h: f64) -> Vector2 {
        let k1 = self.direction(p);
        let k2 = self.direction(p + k1 * (h / 2.0));
        let k3 = self.direction(p + k2 * (h / 2.0));
        let k4 = self.direction(p + k3 * h);
        p + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
    }

    /// Trace a single line from `seed`.
    ///
    /// Returns at most `max_steps + 1` points. Every point lies in
    /// `[1, R]` except possibly the last, which is the one that left.
    pub fn trace_streamline(&self, seed: Vector2, max_steps: u32, step_size: f64) -> Streamline {
        let mut points = Vec::with_capacity(max_steps as usize + 1);
        points.push(seed);

        let mut p = seed;
        for _ in 0..max_steps {
            p = self.rk4_step(p, step_size);
            if !p.is_finite() {
                break;
            }
            points.push(p);

            let r = p.length();
            if r > self.outer_radius || r < CENTRE_ABSORPTION_RADIUS {
                break;
            }
        }

        Streamline { points }
    }

    /// Trace `config.line_count` lines seeded evenly on the start ring.
    pub fn generate_streamlines(&self, config: &FieldConfig) -> Vec<Streamline> {
        let count = config.line_count;
        (0..count)
            .map(|i| {
                let theta = TAU * i as f64 / count as f64;
                let seed = PolarCoordinate::new(config.start_radius, theta).to_cartesian();
                self.trace_streamline(seed, config.max_steps, config.step_size)
            })
            .collect()
    }

    /// Sample the field on a `resolution × resolution` grid over `[-R, R]²`.
    pub fn generate_field_texture(&self, resolution: u32) -> FieldTexture {
        let n = resolution as usize;
        let mut data = Vec::with_capacity(n * n * 4);
        let r = self.outer_radius;
        let coord = |i: u32| {
            if resolution <= 1 {
                0.0
            } else {
                -r + 2.0 * r * i as f64 / (resolution - 1) as f64
            }
        };

        for row in 0..resolution {
            let y = coord(row);
            for col in 0..resolution {
                let x = coord(col);
                let b = self.field_vector_cartesian(Vector2::new(x, y));
                let dir = b.normalize_or_zero();
                let magnitude = (b.length() * TEXTURE_MAGNITUDE_SCALE).clamp(0.0, 1.0);
                data.push((dir.x * 0.5 + 0.5) as f32);
                data.push((dir.y * 0.5 + 0.5) as f32);
                data.push(0.0);
                data.push(magnitude as f32);
            }
        }

        FieldTexture { resolution, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    const R: f64 = 20_000.0;

    // ========== Field Evaluation Tests ==========

    #[test]
    fn test_inverse_square_falloff() {
        let solver = FieldSolver::new(1.0e6, R);
        for &theta in &[0.0, 0.7, 2.0, -1.3] {
            let near = PolarCoordinate::new(250.0, theta).to_cartesian();
            let far = PolarCoordinate::new(500.0, theta).to_cartesian();
            let ratio = solver.field_magnitude(far) / solver.field_magnitude(near);
            assert!((ratio - 0.25).abs() < 1e-9, "ratio {ratio}");
        }
    }

    #[test]
    fn test_origin_is_floored() {
        let solver = FieldSolver::new(1.0, R);
        let b = solver.field_vector_cartesian(Vector2::ZERO);
        assert!(b.is_finite());
        let expected = 1.0 / (MIN_FIELD_RADIUS * MIN_FIELD_RADIUS);
        assert!((solver.field_magnitude(Vector2::ZERO) - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_polar_components() {
        let solver = FieldSolver::new(4.0, R);
        let b = solver.field_vector_polar(2.0, 0.0);
        assert!((b.x - 1.0).abs() < 1e-12);
        assert!(b.y.abs() < 1e-12);
    }

    #[test]
    fn test_cartesian_rotation() {
        // At θ = π/4: B_r = B_θ, so the Cartesian field points along +y.
        let solver = FieldSolver::new(1.0, R);
        let pos = PolarCoordinate::new(1.0, FRAC_PI_4).to_cartesian();
        let b = solver.field_vector_cartesian(pos);
        assert!(b.x.abs() < 1e-12);
        assert!((b.y - 1.0).abs() < 1e-12);
    }

    // ========== Streamline Tests ==========

    #[test]
    fn test_streamline_terminates_within_bounds() {
        let solver = FieldSolver::new(1.0e6, R);
        let config = FieldConfig::new(16).with_start_radius(100.0).with_max_steps(200);
        let lines = solver.generate_streamlines(&config);
        assert_eq!(lines.len(), 16);

        for line in &lines {
            assert!(line.len() <= 201);
            let (last, body) = line.points.split_last().unwrap();
            for p in body {
                let r = p.length();
                assert!((CENTRE_ABSORPTION_RADIUS..=R).contains(&r), "r = {r}");
            }
            assert!(last.is_finite());
        }
    }

    #[test]
    fn test_streamline_uniform_step_length() {
        let solver = FieldSolver::new(1.0e6, R);
        let line = solver.trace_streamline(Vector2::new(300.0, 40.0), 20, 10.0);
        for pair in line.points.windows(2) {
            let step = pair[0].distance(pair[1]);
            assert!(step <= 10.0 + 1e-6);
            assert!(step > 5.0, "step {step}");
        }
    }

    #[test]
    fn test_streamline_leaves_disk() {
        // Along θ = 0 the field is purely radial and outward.
        let solver = FieldSolver::new(1.0, 1_000.0);
        let line = solver.trace_streamline(Vector2::new(10.0, 0.0), 10_000, 50.0);
        let last = line.points.last().unwrap();
        assert!(last.length() > 1_000.0);
        assert!(line.len() < 100);
    }

    #[test]
    fn test_streamlines_are_regenerated_fresh() {
        let solver = FieldSolver::new(1.0e6, R);
        let config = FieldConfig::new(8);
        assert_eq!(
            solver.generate_streamlines(&config),
            solver.generate_streamlines(&config)
        );
        assert!(solver.generate_streamlines(&FieldConfig::new(0)).is_empty());
    }

    // ========== Texture Tests ==========

    #[test]
    fn test_texture_layout() {
        let solver = FieldSolver::new(1.0e6, R);
        let tex = solver.generate_field_texture(16);
        assert_eq!(tex.data.len(), 16 * 16 * 4);
        for chunk in tex.data.chunks(4) {
            assert!((0.0..=1.0).contains(&chunk[0]));
            assert!((0.0..=1.0).contains(&chunk[1]));
            assert_eq!(chunk[2], 0.0);
            assert!((0.0..=1.0).contains(&chunk[3]));
        }
    }

    #[test]
    fn test_texture_magnitude_channel() {
        // Corner of the grid: (R, R), |B| = B0 / (2 R²)
        let solver = FieldSolver::new(1.0e5, 100.0);
        let tex = solver.generate_field_texture(2);
        let corner = tex.texel(1, 1);
        let expected = 1.0e5 / (2.0 * 100.0 * 100.0) / 100.0;
        assert!((corner[3] as f64 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_texture_to_rgba8() {
        let solver = FieldSolver::new(1.0, R);
        let img = solver.generate_field_texture(4).to_rgba8();
        assert_eq!(img.dimensions(), (4, 4));
    }

    // ========== Config Tests ==========

    #[test]
    fn test_field_config_builder() {
        let config = FieldConfig::new(12)
            .with_start_radius(0.5)
            .with_max_steps(10)
            .with_step_size(-3.0);
        assert_eq!(config.line_count, 12);
        assert_eq!(config.start_radius, CENTRE_ABSORPTION_RADIUS);
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.step_size, 3.0);
    }
}

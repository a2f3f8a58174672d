//! CPU-side geometry generators.
//!
//! Everything here produces flat `f32` arrays ready for
//! [`Mesh::set_attribute`](super::buffer::Mesh::set_attribute): positions
//! are two floats per vertex, colours four.

use std::f64::consts::TAU;
use std::ops::Range;

use crate::geometry::Vector2;

/// Triangulated disk: flat positions and triangle indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiskGeometry {
    pub positions: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Centre-fan disk of `radius` with `segments` rim vertices.
///
/// Vertex 0 is the centre; triangle `i` is `(0, i + 1, (i + 1) % segments + 1)`.
pub fn disk(radius: f64, segments: u32) -> DiskGeometry {
    let segments = segments.max(3);
    let mut positions = Vec::with_capacity(2 * (segments as usize + 1));
    positions.extend_from_slice(&[0.0, 0.0]);
    for i in 0..segments {
        let angle = TAU * i as f64 / segments as f64;
        positions.push((radius * angle.cos()) as f32);
        positions.push((radius * angle.sin()) as f32);
    }

    let indices = (0..segments)
        .flat_map(|i| [0, i + 1, (i + 1) % segments + 1])
        .collect();

    DiskGeometry { positions, indices }
}

/// Closed ring as a line strip: `segments + 1` points, last equal to first.
pub fn ring(radius: f64, segments: u32) -> Vec<f32> {
    let segments = segments.max(3);
    (0..=segments)
        .flat_map(|i| {
            let angle = TAU * (i % segments) as f64 / segments as f64;
            [(radius * angle.cos()) as f32, (radius * angle.sin()) as f32]
        })
        .collect()
}

/// Flatten points into `[x0, y0, x1, y1, ...]`.
pub fn flatten_points(points: &[Vector2]) -> Vec<f32> {
    points
        .iter()
        .flat_map(|p| [p.x as f32, p.y as f32])
        .collect()
}

/// Several coloured polylines packed into one vertex buffer.
///
/// Each pushed polyline becomes a vertex range to draw as a line strip.
/// Segments pushed with [`push_segment`](Self::push_segment) are meant for
/// line-list drawing and get no range of their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolylineBatch {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub ranges: Vec<Range<u32>>,
}

impl PolylineBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 2) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn push_vertex(&mut self, p: Vector2, color: [f32; 4]) {
        self.positions.extend_from_slice(&[p.x as f32, p.y as f32]);
        self.colors.extend_from_slice(&color);
    }

    /// Append a polyline. Lines with fewer than two points are dropped.
    pub fn push(&mut self, points: &[Vector2], color: [f32; 4]) {
        if points.len() < 2 {
            return;
        }
        let start = self.vertex_count();
        self.positions.extend(flatten_points(points));
        for _ in points {
            self.colors.extend_from_slice(&color);
        }
        self.ranges.push(start..self.vertex_count());
    }

    /// Append a single line-list segment.
    pub fn push_segment(&mut self, a: Vector2, b: Vector2, color: [f32; 4]) {
        self.push_vertex(a, color);
        self.push_vertex(b, color);
    }

    /// Append a `+` marker of half-size `size` as two line-list segments.
    pub fn push_cross(&mut self, centre: Vector2, size: f64, color: [f32; 4]) {
        self.push_segment(centre - Vector2::X * size, centre + Vector2::X * size, color);
        self.push_segment(centre - Vector2::Y * size, centre + Vector2::Y * size, color);
    }

    /// Append a diamond outline of half-size `size` as four line-list segments.
    pub fn push_diamond(&mut self, centre: Vector2, size: f64, color: [f32; 4]) {
        let corners = [
            centre + Vector2::X * size,
            centre + Vector2::Y * size,
            centre - Vector2::X * size,
            centre - Vector2::Y * size,
        ];
        for i in 0..4 {
            self.push_segment(corners[i], corners[(i + 1) % 4], color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_fan_topology() {
        let d = disk(2.0, 8);
        assert_eq!(d.positions.len(), 2 * 9);
        assert_eq!(d.indices.len(), 3 * 8);
        assert_eq!(&d.positions[..2], &[0.0, 0.0]);
        assert!(d.indices.chunks(3).all(|t| t[0] == 0));
        // Last triangle closes the fan back to the first rim vertex.
        assert_eq!(&d.indices[21..], &[0, 8, 1]);
        let max = *d.indices.iter().max().unwrap();
        assert_eq!(max, 8);
    }

    #[test]
    fn test_disk_rim_radius() {
        let d = disk(5.0, 16);
        for v in d.positions.chunks(2).skip(1) {
            let r = (v[0] * v[0] + v[1] * v[1]).sqrt();
            assert!((r - 5.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ring_is_closed() {
        let r = ring(3.0, 12);
        assert_eq!(r.len(), 2 * 13);
        assert_eq!(&r[..2], &r[24..]);
    }

    #[test]
    fn test_degenerate_segment_counts_are_raised() {
        assert_eq!(disk(1.0, 0).indices.len(), 9);
        assert_eq!(ring(1.0, 1).len(), 8);
    }

    #[test]
    fn test_flatten_points() {
        let flat = flatten_points(&[Vector2::new(1.0, 2.0), Vector2::new(-3.0, 4.5)]);
        assert_eq!(flat, vec![1.0, 2.0, -3.0, 4.5]);
    }

    #[test]
    fn test_batch_ranges() {
        let mut batch = PolylineBatch::new();
        let white = [1.0; 4];
        batch.push(&[Vector2::ZERO, Vector2::X, Vector2::Y], white);
        batch.push(&[Vector2::ZERO], white);
        batch.push(&[Vector2::X, Vector2::ONE], white);
        assert_eq!(batch.ranges, vec![0..3, 3..5]);
        assert_eq!(batch.vertex_count(), 5);
        assert_eq!(batch.colors.len(), 5 * 4);
    }

    #[test]
    fn test_markers_are_line_list_pairs() {
        let mut batch = PolylineBatch::new();
        batch.push_cross(Vector2::ZERO, 1.0, [1.0; 4]);
        batch.push_diamond(Vector2::ZERO, 1.0, [1.0; 4]);
        assert_eq!(batch.vertex_count(), 4 + 8);
        assert!(batch.ranges.is_empty());
    }
}

//! Base disk and latitude rings.
//!
//! The terrain renderer owns the unit disk mesh every other layer draws
//! over. Other renderers receive it through [`TerrainRenderer::base_disk`]
//! for the duration of a draw call and never hold on to it.

use std::ops::Range;

use glam::{Mat4, Vec4};

use super::buffer::{Mesh, MeshView, VertexArray};
use super::mesh::{self, PolylineBatch};
use super::program::{Program, ProgramKind};
use super::GpuContext;
use crate::climate::ClimateBoundaries;
use crate::error::GpuError;
use crate::geometry::Vector2;
use crate::solar::SolarConfig;

/// Rim vertices of the base disk.
pub const DISK_SEGMENTS: u32 = 256;

const RING_SEGMENTS: u32 = 180;
const TROPIC_COLOR: [f32; 4] = [1.0, 0.85, 0.4, 0.55];
const EQUATOR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.45];

/// Owns the base disk and draws it coloured by climate band.
pub struct TerrainRenderer {
    disk: Mesh,
    earth: Program,
    disk_array: VertexArray,
    disk_pipeline: wgpu::RenderPipeline,
    rings: Mesh,
    ring_ranges: Vec<Range<u32>>,
    line: Program,
    ring_array: VertexArray,
    ring_pipeline: wgpu::RenderPipeline,
    outer_radius: f64,
}

impl TerrainRenderer {
    pub fn new(
        ctx: &GpuContext,
        boundaries: &ClimateBoundaries,
        solar: &SolarConfig,
    ) -> Result<Self, GpuError> {
        let device = ctx.device();

        let geometry = mesh::disk(1.0, DISK_SEGMENTS);
        let disk = Mesh::new("Base Disk")
            .with_attribute(device, "position", &geometry.positions, 2)
            .with_indices(device, &geometry.indices);

        let mut earth = Program::builtin(device, ProgramKind::Earth)?;
        let disk_array = VertexArray::new(&earth, &["position"]);
        let disk_pipeline = earth.link(device, ctx.target(), &disk_array, wgpu::PrimitiveTopology::TriangleList)?;
        earth.set_uniform(
            "zones",
            Vec4::new(
                boundaries.polar_max as f32,
                boundaries.heating_min as f32,
                boundaries.cooling_min as f32,
                boundaries.subarctic_min as f32,
            ),
        );
        earth.set_uniform("outer_radius", boundaries.outer_radius as f32);
        earth.set_uniform("opacity", 1.0f32);

        let mut batch = PolylineBatch::new();
        let equator = (solar.inner_tropic_radius + solar.outer_tropic_radius) / 2.0;
        for (radius, color) in [
            (solar.inner_tropic_radius, TROPIC_COLOR),
            (equator, EQUATOR_COLOR),
            (solar.outer_tropic_radius, TROPIC_COLOR),
        ] {
            let points: Vec<Vector2> = mesh::ring(radius, RING_SEGMENTS)
                .chunks_exact(2)
                .map(|p| Vector2::new(p[0] as f64, p[1] as f64))
                .collect();
            batch.push(&points, color);
        }
        let rings = Mesh::new("Latitude Rings")
            .with_attribute(device, "position", &batch.positions, 2)
            .with_attribute(device, "color", &batch.colors, 4);

        let mut line = Program::builtin(device, ProgramKind::Line)?;
        let ring_array = VertexArray::new(&line, &["position", "color"]);
        let ring_pipeline = line.link(device, ctx.target(), &ring_array, wgpu::PrimitiveTopology::LineStrip)?;
        line.set_uniform("tint", Vec4::ONE);

        tracing::info!(segments = DISK_SEGMENTS, "terrain renderer ready");

        Ok(Self {
            disk,
            earth,
            disk_array,
            disk_pipeline,
            rings,
            ring_ranges: batch.ranges,
            line,
            ring_array,
            ring_pipeline,
            outer_radius: boundaries.outer_radius,
        })
    }

    /// Borrow the unit base disk for another layer's draw.
    pub fn base_disk(&self) -> MeshView<'_> {
        self.disk.view()
    }

    /// Push camera and current disk radius.
    pub fn update(&mut self, queue: &wgpu::Queue, view_proj: Mat4, radius: f64) {
        self.earth.set_uniform("view_proj", view_proj);
        self.earth.set_uniform("radius", radius as f32);
        self.earth.flush(queue);

        let scale = if self.outer_radius > 0.0 {
            radius / self.outer_radius
        } else {
            1.0
        };
        self.line.set_uniform("view_proj", view_proj);
        self.line.set_uniform("scale", scale as f32);
        self.line.flush(queue);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.disk_pipeline);
        if self.earth.bind(pass) {
            self.disk_array.draw(pass, self.disk.view());
        }
    }

    pub fn draw_rings(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.ring_pipeline);
        if self.line.bind(pass) {
            self.ring_array.draw_ranges(pass, self.rings.view(), &self.ring_ranges);
        }
    }

    /// Release everything this renderer owns, including the base disk.
    /// Borrowers must be done drawing before this is called.
    pub fn dispose(&mut self) {
        self.disk.dispose();
        self.rings.dispose();
        self.ring_ranges.clear();
        self.earth.dispose();
        self.line.dispose();
    }
}

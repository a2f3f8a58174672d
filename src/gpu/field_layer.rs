//! Field magnitude overlay and streamlines.

use std::ops::Range;

use glam::{Mat4, Vec4};

use super::buffer::{Mesh, MeshView, VertexArray};
use super::mesh::PolylineBatch;
use super::program::{Program, ProgramKind};
use super::texture::FieldTextureGpu;
use super::GpuContext;
use crate::error::GpuError;
use crate::field::{FieldTexture, Streamline};

const OVERLAY_OPACITY: f32 = 0.55;

/// The overlay needs sampled texels. The GPU texture is still created at
/// 1×1 so the program's bind group stays complete.
fn overlay_enabled(texture: &FieldTexture) -> bool {
    !texture.is_empty()
}

/// Colour ramp along a streamline: bright near the centre, fading outward.
fn streamline_color(index: usize, count: usize) -> [f32; 4] {
    let t = if count > 1 {
        index as f32 / (count - 1) as f32
    } else {
        0.0
    };
    [0.55 + 0.45 * t, 0.9, 1.0 - 0.4 * t, 0.85]
}

pub struct FieldRenderer {
    field: Program,
    overlay_array: VertexArray,
    overlay_pipeline: wgpu::RenderPipeline,
    texture: FieldTextureGpu,
    /// Off when the field texture has no samples.
    overlay_enabled: bool,
    line: Program,
    line_array: VertexArray,
    line_pipeline: wgpu::RenderPipeline,
    streamlines: Mesh,
    ranges: Vec<Range<u32>>,
}

impl FieldRenderer {
    pub fn new(ctx: &GpuContext, field_texture: &FieldTexture, streamlines: &[Streamline]) -> Result<Self, GpuError> {
        let device = ctx.device();

        let mut field = Program::builtin(device, ProgramKind::Field)?;
        let overlay_array = VertexArray::new(&field, &["position"]);
        let overlay_pipeline =
            field.link(device, ctx.target(), &overlay_array, wgpu::PrimitiveTopology::TriangleList)?;
        field.set_uniform("opacity", OVERLAY_OPACITY);

        let texture = FieldTextureGpu::new(device, ctx.queue(), field_texture);
        if let Some(binding) = texture.binding() {
            field.bind_texture(device, binding);
        }

        let mut line = Program::builtin(device, ProgramKind::Line)?;
        let line_array = VertexArray::new(&line, &["position", "color"]);
        let line_pipeline = line.link(device, ctx.target(), &line_array, wgpu::PrimitiveTopology::LineStrip)?;
        line.set_uniform("tint", Vec4::ONE);

        let mut renderer = Self {
            field,
            overlay_array,
            overlay_pipeline,
            texture,
            overlay_enabled: overlay_enabled(field_texture),
            line,
            line_array,
            line_pipeline,
            streamlines: Mesh::new("Streamlines"),
            ranges: Vec::new(),
        };
        renderer.upload_streamlines(ctx, streamlines);
        Ok(renderer)
    }

    /// Replace the streamline buffers. Called only when the lines were
    /// regenerated.
    pub fn upload_streamlines(&mut self, ctx: &GpuContext, streamlines: &[Streamline]) {
        let mut batch = PolylineBatch::new();
        for (i, line) in streamlines.iter().enumerate() {
            batch.push(&line.points, streamline_color(i, streamlines.len()));
        }

        let device = ctx.device();
        self.streamlines.dispose();
        self.streamlines = Mesh::new("Streamlines")
            .with_attribute(device, "position", &batch.positions, 2)
            .with_attribute(device, "color", &batch.colors, 4);
        self.ranges = batch.ranges;
        tracing::debug!(lines = self.ranges.len(), vertices = batch.positions.len() / 2, "uploaded streamlines");
    }

    /// Replace the magnitude texture.
    pub fn upload_texture(&mut self, ctx: &GpuContext, texture: &FieldTexture) {
        self.overlay_enabled = overlay_enabled(texture);
        if !self.overlay_enabled {
            return;
        }
        let device = ctx.device();
        let resized = self.texture.resolution() != texture.resolution.max(1);
        self.texture.upload(device, ctx.queue(), texture);
        if resized {
            if let Some(binding) = self.texture.binding() {
                self.field.bind_texture(device, binding);
            }
        }
    }

    /// Push camera, disk radius, and the scale from field-domain units to
    /// the current disk.
    pub fn update(&mut self, queue: &wgpu::Queue, view_proj: Mat4, radius: f64, scale: f64) {
        self.field.set_uniform("view_proj", view_proj);
        self.field.set_uniform("radius", radius as f32);
        self.field.flush(queue);

        self.line.set_uniform("view_proj", view_proj);
        self.line.set_uniform("scale", scale as f32);
        self.line.flush(queue);
    }

    /// Draw the overlay on the borrowed base disk, then the streamlines.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, disk: MeshView<'_>) {
        if self.overlay_enabled {
            pass.set_pipeline(&self.overlay_pipeline);
            if self.field.bind(pass) {
                self.overlay_array.draw(pass, disk);
            }
        }

        if self.ranges.is_empty() {
            return;
        }
        pass.set_pipeline(&self.line_pipeline);
        if self.line.bind(pass) {
            self.line_array.draw_ranges(pass, self.streamlines.view(), &self.ranges);
        }
    }

    /// Release owned handles. The base disk is borrowed and left alone.
    pub fn dispose(&mut self) {
        self.streamlines.dispose();
        self.ranges.clear();
        self.texture.dispose();
        self.field.dispose();
        self.line.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_follows_texture_resolution() {
        let solver = crate::field::FieldSolver::new(1.0e6, 20_000.0);
        assert!(!overlay_enabled(&solver.generate_field_texture(0)));
        assert!(!overlay_enabled(&FieldTexture::default()));
        assert!(overlay_enabled(&solver.generate_field_texture(4)));
    }

    #[test]
    fn test_streamline_color_ramp() {
        assert_eq!(streamline_color(0, 1), [0.55, 0.9, 1.0, 0.85]);
        let last = streamline_color(9, 10);
        assert!((last[0] - 1.0).abs() < 1e-6);
        assert!((last[2] - 0.6).abs() < 1e-6);
    }
}

//! Day/night shading, the sun's daily path and its lit footprint.

use glam::{Mat4, Vec4};

use super::buffer::{Mesh, MeshView, VertexArray};
use super::mesh::{self, PolylineBatch};
use super::program::{Program, ProgramKind};
use super::GpuContext;
use crate::error::GpuError;
use crate::geometry::Vector2;
use crate::solar::SolarSolver;

/// Simulation days the sun may move before its path is regenerated.
pub const PATH_REGEN_THRESHOLD_DAYS: f64 = 1.0 / 24.0;

/// Samples in the drawn daily path.
pub const PATH_SAMPLES: u32 = 96;

const FOOTPRINT_SEGMENTS: u32 = 64;
const NIGHT_OPACITY: f32 = 0.7;
const PATH_COLOR: [f32; 4] = [1.0, 0.8, 0.2, 0.7];
const FOOTPRINT_COLOR: [f32; 4] = [1.0, 0.95, 0.6, 0.9];

/// Whether a path computed at `last` is stale at `now` (both in days).
pub fn path_needs_regen(last: Option<f64>, now: f64) -> bool {
    last.map_or(true, |t| (now - t).abs() > PATH_REGEN_THRESHOLD_DAYS)
}

pub struct SolarRenderer {
    solar: Program,
    shade_array: VertexArray,
    shade_pipeline: wgpu::RenderPipeline,
    line: Program,
    line_array: VertexArray,
    path_pipeline: wgpu::RenderPipeline,
    path: Mesh,
    footprint: Mesh,
    path_time: Option<f64>,
}

impl SolarRenderer {
    pub fn new(ctx: &GpuContext, solver: &SolarSolver) -> Result<Self, GpuError> {
        let device = ctx.device();

        let mut solar = Program::builtin(device, ProgramKind::Solar)?;
        let shade_array = VertexArray::new(&solar, &["position"]);
        let shade_pipeline =
            solar.link(device, ctx.target(), &shade_array, wgpu::PrimitiveTopology::TriangleList)?;
        solar.set_uniform("ambient", solver.config().ambient as f32);
        solar.set_uniform("night_opacity", NIGHT_OPACITY);

        let mut line = Program::builtin(device, ProgramKind::Line)?;
        let line_array = VertexArray::new(&line, &["position", "color"]);
        let path_pipeline = line.link(device, ctx.target(), &line_array, wgpu::PrimitiveTopology::LineStrip)?;
        line.set_uniform("tint", Vec4::ONE);
        line.set_uniform("scale", 1.0f32);

        Ok(Self {
            solar,
            shade_array,
            shade_pipeline,
            line,
            line_array,
            path_pipeline,
            path: Mesh::new("Sun Path"),
            footprint: Mesh::new("Sun Footprint"),
            path_time: None,
        })
    }

    /// Update uniforms for time `t_days`, re-uploading the daily path when the
    /// sun has moved past [`PATH_REGEN_THRESHOLD_DAYS`] since it was built.
    pub fn update(&mut self, ctx: &GpuContext, view_proj: Mat4, solver: &SolarSolver, t_days: f64, radius: f64) {
        let sun = solver.sun_position(t_days);
        let cone = solver.cone_radius(sun.z);

        self.solar.set_uniform("view_proj", view_proj);
        self.solar.set_uniform("radius", radius as f32);
        self.solar.set_uniform(
            "sun",
            Vec4::new(sun.x as f32, sun.y as f32, sun.z as f32, cone as f32),
        );
        self.solar.flush(ctx.queue());

        self.line.set_uniform("view_proj", view_proj);
        self.line.flush(ctx.queue());

        if path_needs_regen(self.path_time, t_days) {
            let points: Vec<Vector2> = solver
                .daily_sun_path(t_days, PATH_SAMPLES)
                .iter()
                .map(|p| p.truncate())
                .collect();
            let mut closed = points.clone();
            closed.extend(points.first().copied());

            let mut batch = PolylineBatch::new();
            batch.push(&closed, PATH_COLOR);
            self.path.dispose();
            self.path = Mesh::new("Sun Path")
                .with_attribute(ctx.device(), "position", &batch.positions, 2)
                .with_attribute(ctx.device(), "color", &batch.colors, 4);
            self.path_time = Some(t_days);
            tracing::debug!(t_days, samples = PATH_SAMPLES, "regenerated sun path");
        }

        // Footprint moves every frame; same size, so it is written in place.
        let centre = sun.truncate();
        let positions: Vec<f32> = mesh::ring(cone, FOOTPRINT_SEGMENTS)
            .chunks_exact(2)
            .flat_map(|p| [p[0] + centre.x as f32, p[1] + centre.y as f32])
            .collect();
        if self.footprint.is_empty() {
            let colors: Vec<f32> = (0..positions.len() / 2).flat_map(|_| FOOTPRINT_COLOR).collect();
            self.footprint = Mesh::new("Sun Footprint")
                .with_attribute(ctx.device(), "position", &positions, 2)
                .with_attribute(ctx.device(), "color", &colors, 4);
        } else {
            self.footprint
                .update_attribute(ctx.device(), ctx.queue(), "position", &positions, 2);
        }
    }

    /// Force the path to be rebuilt on the next update.
    pub fn invalidate_path(&mut self) {
        self.path_time = None;
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, disk: MeshView<'_>) {
        pass.set_pipeline(&self.shade_pipeline);
        if self.solar.bind(pass) {
            self.shade_array.draw(pass, disk);
        }

        pass.set_pipeline(&self.path_pipeline);
        if self.line.bind(pass) {
            self.line_array.draw(pass, self.path.view());
            self.line_array.draw(pass, self.footprint.view());
        }
    }

    pub fn dispose(&mut self) {
        self.path.dispose();
        self.footprint.dispose();
        self.path_time = None;
        self.solar.dispose();
        self.line.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_regen_threshold() {
        assert!(path_needs_regen(None, 0.0));
        assert!(!path_needs_regen(Some(10.0), 10.0 + PATH_REGEN_THRESHOLD_DAYS * 0.5));
        assert!(path_needs_regen(Some(10.0), 10.0 + PATH_REGEN_THRESHOLD_DAYS * 1.5));
        // Time moving backwards (reset) also invalidates.
        assert!(path_needs_regen(Some(10.0), 0.0));
    }
}

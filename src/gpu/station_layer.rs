//! Station markers, displacement vectors and climate event markers.

use glam::{Mat4, Vec4};

use super::buffer::{Mesh, VertexArray};
use super::mesh::PolylineBatch;
use super::program::{Program, ProgramKind};
use super::GpuContext;
use crate::climate::{ClimateEvent, ClimateEventKind};
use crate::error::GpuError;
use crate::stations::{pseudo_latitude, Station};

const DISPLACEMENT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.6];

/// Marker colour by pseudo-latitude, cold at the centre to warm at the rim.
fn station_color(latitude: f64) -> [f32; 4] {
    let t = ((90.0 - latitude) / 180.0).clamp(0.0, 1.0) as f32;
    [0.3 + 0.7 * t, 0.8 - 0.3 * t, 1.0 - 0.7 * t, 1.0]
}

fn event_color(kind: ClimateEventKind) -> [f32; 4] {
    match kind {
        ClimateEventKind::Snow => [0.85, 0.95, 1.0, 1.0],
        ClimateEventKind::Heat => [1.0, 0.35, 0.2, 1.0],
        ClimateEventKind::Cold => [0.35, 0.55, 1.0, 1.0],
        ClimateEventKind::Drought => [0.9, 0.7, 0.3, 1.0],
    }
}

/// Build the line-list batch for a station population. `marker_size` is
/// the half-size of each cross in world units.
pub fn station_batch(stations: &[Station], outer_radius: f64, marker_size: f64) -> PolylineBatch {
    let mut batch = PolylineBatch::new();
    for station in stations {
        let here = station.position.to_cartesian();
        let color = station_color(pseudo_latitude(station.initial_position.r, outer_radius));
        batch.push_cross(here, marker_size, color);
        batch.push_segment(station.initial_position.to_cartesian(), here, DISPLACEMENT_COLOR);
    }
    batch
}

/// Diamond markers sized by event severity.
pub fn event_batch(events: &[ClimateEvent], marker_size: f64) -> PolylineBatch {
    let mut batch = PolylineBatch::new();
    for event in events {
        let size = marker_size * (1.0 + 0.25 * event.severity as f64);
        batch.push_diamond(event.location.to_cartesian(), size, event_color(event.kind));
    }
    batch
}

pub struct StationRenderer {
    line: Program,
    line_array: VertexArray,
    pipeline: wgpu::RenderPipeline,
    stations: Mesh,
    events: Mesh,
    outer_radius: f64,
}

impl StationRenderer {
    pub fn new(ctx: &GpuContext, outer_radius: f64) -> Result<Self, GpuError> {
        let device = ctx.device();
        let mut line = Program::builtin(device, ProgramKind::Line)?;
        let line_array = VertexArray::new(&line, &["position", "color"]);
        let pipeline = line.link(device, ctx.target(), &line_array, wgpu::PrimitiveTopology::LineList)?;
        line.set_uniform("tint", Vec4::ONE);
        line.set_uniform("scale", 1.0f32);

        Ok(Self {
            line,
            line_array,
            pipeline,
            stations: Mesh::new("Stations"),
            events: Mesh::new("Climate Events"),
            outer_radius,
        })
    }

    /// Re-upload station and event geometry. Called after the station
    /// population has been advanced for the frame.
    pub fn update(
        &mut self,
        ctx: &GpuContext,
        view_proj: Mat4,
        stations: &[Station],
        events: &[ClimateEvent],
        marker_size: f64,
    ) {
        self.line.set_uniform("view_proj", view_proj);
        self.line.flush(ctx.queue());

        let batch = station_batch(stations, self.outer_radius, marker_size);
        if self.stations.is_empty() {
            self.stations = Mesh::new("Stations")
                .with_attribute(ctx.device(), "position", &batch.positions, 2)
                .with_attribute(ctx.device(), "color", &batch.colors, 4);
        } else {
            self.stations
                .update_attribute(ctx.device(), ctx.queue(), "position", &batch.positions, 2);
            self.stations
                .update_attribute(ctx.device(), ctx.queue(), "color", &batch.colors, 4);
        }

        // Events are static; only their marker size follows the zoom.
        let batch = event_batch(events, marker_size);
        if self.events.is_empty() {
            self.events = Mesh::new("Climate Events")
                .with_attribute(ctx.device(), "position", &batch.positions, 2)
                .with_attribute(ctx.device(), "color", &batch.colors, 4);
        } else {
            self.events
                .update_attribute(ctx.device(), ctx.queue(), "position", &batch.positions, 2);
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.stations.is_empty() && self.events.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        if self.line.bind(pass) {
            self.line_array.draw(pass, self.stations.view());
            self.line_array.draw(pass, self.events.view());
        }
    }

    pub fn dispose(&mut self) {
        self.stations.dispose();
        self.events.dispose();
        self.line.dispose();
    }
}

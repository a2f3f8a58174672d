//! 2D orthographic map camera.
//!
//! The camera looks straight down at the disk. Its state is a centre point,
//! a zoom factor and a rotation about the view axis. The visible region is
//! `±aspect / zoom` wide and `±1 / zoom` tall in world units.
//!
//! Screen coordinates are pixels with the origin at the top-left corner and
//! `y` growing downward. Matrices are computed in `f64` and only narrowed to
//! `f32` at upload time, so `screen_to_world` and `world_to_screen` stay
//! exact inverses even at the far end of the zoom range.

use glam::{DMat4, DVec2, DVec3, DVec4, Mat4};
use serde::{Deserialize, Serialize};

/// Depth range of the orthographic volume. Generous because the sun sits
/// several thousand units above the disk.
const DEPTH_EXTENT: f64 = 1.0e6;

/// Camera limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Extra room around the disk when fitting it to the viewport.
    pub fit_padding: f64,
}

impl CameraConfig {
    pub fn with_zoom_limits(mut self, min: f64, max: f64) -> Self {
        let min = min.max(f64::MIN_POSITIVE);
        self.min_zoom = min;
        self.max_zoom = max.max(min);
        self
    }

    pub fn with_fit_padding(mut self, padding: f64) -> Self {
        self.fit_padding = padding.max(1.0);
        self
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0e-6,
            max_zoom: 1.0e-1,
            fit_padding: 1.1,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Matrices {
    view: DMat4,
    projection: DMat4,
    view_projection: DMat4,
    inverse_view_projection: DMat4,
}

/// Map camera with lazily recomputed matrices.
#[derive(Clone, Debug)]
pub struct Camera {
    position: DVec2,
    zoom: f64,
    rotation: f64,
    viewport: DVec2,
    config: CameraConfig,
    dirty: bool,
    matrices: Matrices,
}

impl Camera {
    /// Create a camera for a `width` x `height` pixel viewport.
    pub fn new(width: u32, height: u32, config: CameraConfig) -> Self {
        let mut camera = Self {
            position: DVec2::ZERO,
            zoom: config.min_zoom,
            rotation: 0.0,
            viewport: DVec2::new(width.max(1) as f64, height.max(1) as f64),
            config,
            dirty: true,
            matrices: Matrices {
                view: DMat4::IDENTITY,
                projection: DMat4::IDENTITY,
                view_projection: DMat4::IDENTITY,
                inverse_view_projection: DMat4::IDENTITY,
            },
        };
        camera.update();
        camera
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn aspect(&self) -> f64 {
        self.viewport.x / self.viewport.y
    }

    pub fn viewport(&self) -> DVec2 {
        self.viewport
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
        self.dirty = true;
    }

    /// Set zoom, clamped to the configured limits. Inverted limits resolve
    /// to `max_zoom` rather than panicking.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.max(self.config.min_zoom).min(self.config.max_zoom);
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, radians: f64) {
        self.rotation = radians;
        self.dirty = true;
    }

    /// Resize the viewport. Zero sizes are treated as one pixel.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = DVec2::new(width.max(1) as f64, height.max(1) as f64);
        self.dirty = true;
    }

    /// World units covered by one screen pixel.
    pub fn world_units_per_pixel(&self) -> f64 {
        2.0 / (self.zoom * self.viewport.y)
    }

    /// Pan by a screen-space drag of `(dx, dy)` pixels. The content follows
    /// the pointer, so the distance moved in world units shrinks as zoom grows.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let scale = self.world_units_per_pixel();
        // Screen y points down, world y points up.
        let screen_delta = DVec2::new(-dx, dy) * scale;
        self.position += DVec2::from_angle(self.rotation).rotate(screen_delta);
        self.dirty = true;
    }

    /// Multiply zoom by `factor` while keeping `(world_x, world_y)` at the
    /// same screen position.
    pub fn zoom_to_point(&mut self, world_x: f64, world_y: f64, factor: f64) {
        let anchor = DVec2::new(world_x, world_y);
        let before = self.world_to_screen(anchor);
        self.set_zoom(self.zoom * factor);
        let after = self.world_to_screen(anchor);
        let delta = after - before;
        self.pan(-delta.x, -delta.y);
    }

    /// Centre on the origin, clear rotation and zoom so a disk of `radius`
    /// (times `padding`) fits the viewport's limiting dimension.
    pub fn fit_earth(&mut self, radius: f64, padding: f64) {
        self.position = DVec2::ZERO;
        self.rotation = 0.0;
        let extent = (2.0 * radius * padding).max(f64::MIN_POSITIVE);
        // Visible height is 2 / zoom, visible width is 2 * aspect / zoom.
        let limiting = self.aspect().min(1.0);
        self.set_zoom(2.0 * limiting / extent);
    }

    /// [`fit_earth`](Self::fit_earth) with the configured padding.
    pub fn fit(&mut self, radius: f64) {
        self.fit_earth(radius, self.config.fit_padding);
    }

    /// Recompute matrices if anything changed since the last call.
    pub fn update(&mut self) {
        if !self.dirty {
            return;
        }

        let view = DMat4::from_rotation_z(-self.rotation)
            * DMat4::from_translation(DVec3::new(-self.position.x, -self.position.y, 0.0));
        let half_w = self.aspect() / self.zoom;
        let half_h = 1.0 / self.zoom;
        let projection =
            DMat4::orthographic_rh(-half_w, half_w, -half_h, half_h, -DEPTH_EXTENT, DEPTH_EXTENT);
        let view_projection = projection * view;

        self.matrices = Matrices {
            view,
            projection,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
        };
        self.dirty = false;
    }

    pub fn view_matrix(&mut self) -> DMat4 {
        self.update();
        self.matrices.view
    }

    pub fn projection_matrix(&mut self) -> DMat4 {
        self.update();
        self.matrices.projection
    }

    pub fn view_projection(&mut self) -> DMat4 {
        self.update();
        self.matrices.view_projection
    }

    /// View-projection narrowed for upload as a uniform.
    pub fn view_projection_f32(&mut self) -> Mat4 {
        self.view_projection().as_mat4()
    }

    /// Pixel coordinates to world coordinates on the disk plane.
    pub fn screen_to_world(&mut self, screen: DVec2) -> DVec2 {
        self.update();
        let ndc = DVec2::new(
            2.0 * screen.x / self.viewport.x - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.y,
        );
        let world = self.matrices.inverse_view_projection * DVec4::new(ndc.x, ndc.y, 0.0, 1.0);
        world.truncate().truncate() / world.w
    }

    /// World coordinates on the disk plane to pixel coordinates.
    pub fn world_to_screen(&mut self, world: DVec2) -> DVec2 {
        self.update();
        let clip = self.matrices.view_projection * DVec4::new(world.x, world.y, 0.0, 1.0);
        let ndc = clip.truncate().truncate() / clip.w;
        DVec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1280, 720, CameraConfig::default())
    }
}

//! Top-level controller.
//!
//! The engine owns the [`SimulationState`], every solver, and the camera.
//! Each frame it advances time, re-parameterizes the solvers from a copy of
//! the state, regenerates stale field data, advects the stations, and only
//! then publishes a [`FrameStats`] snapshot. Renderers read from the engine
//! after [`Engine::advance`] returns and never write back.

use std::time::Duration;

use crate::camera::Camera;
use crate::climate::{climate_events, ClimateEvent, ClimateModel};
use crate::config::EngineConfig;
use crate::expansion::ExpansionSolver;
use crate::field::{FieldSolver, FieldTexture, Streamline};
use crate::geometry::Vector2;
use crate::input::Action;
use crate::solar::SolarSolver;
use crate::state::{FrameStats, SimulationState, VisualizationMode};
use crate::stations::StationSimulator;
use crate::time::FrameClock;

/// Wall time between periodic stats log lines.
pub const STATS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Station cross half-size in screen pixels.
const STATION_MARKER_PIXELS: f64 = 4.0;

/// Requests the engine cannot satisfy itself and hands to the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostRequest {
    Snapshot,
    Quit,
}

/// Inputs the streamlines and field texture were generated from.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FieldKey {
    strength: f64,
    line_count: u32,
    outer_radius: f64,
}

pub struct Engine {
    config: EngineConfig,
    state: SimulationState,
    initial_state: SimulationState,
    clock: FrameClock,
    expansion: ExpansionSolver,
    field: FieldSolver,
    solar: SolarSolver,
    climate: ClimateModel,
    stations: StationSimulator,
    events: Vec<ClimateEvent>,
    camera: Camera,
    streamlines: Vec<Streamline>,
    field_texture: FieldTexture,
    field_key: Option<FieldKey>,
    field_generation: u64,
    stats: FrameStats,
    last_report: Duration,
}

impl Engine {
    /// Build the engine for a `width × height` viewport. Field data is
    /// generated immediately so the first frame has something to upload.
    pub fn new(config: EngineConfig, width: u32, height: u32) -> Self {
        let state = config.simulation.initial_state();
        let outer_radius = config.domain.outer_radius;

        let mut clock = FrameClock::new(config.simulation.years_per_second, state.time_scale);
        clock.set_paused(state.paused);

        let expansion = ExpansionSolver::new(state.expansion_rate)
            .with_base_day_length(config.domain.base_day_length);
        let field = FieldSolver::new(state.field_strength, outer_radius);
        let solar = SolarSolver::new(config.solar.clone());
        let climate = ClimateModel::new(config.climate.clone());
        let stations = StationSimulator::new(config.stations.clone(), outer_radius, state.expansion_rate);

        let mut camera = Camera::new(width, height, config.camera.clone());
        camera.fit(outer_radius);

        tracing::info!(
            outer_radius,
            stations = stations.len(),
            mode = state.mode.label(),
            "engine initialized"
        );

        let mut engine = Self {
            config,
            state,
            initial_state: state,
            clock,
            expansion,
            field,
            solar,
            climate,
            stations,
            events: climate_events(),
            camera,
            streamlines: Vec::new(),
            field_texture: FieldTexture::default(),
            field_key: None,
            field_generation: 0,
            stats: FrameStats::default(),
            last_report: Duration::ZERO,
        };
        engine.sync_solvers();
        engine.refresh_field();
        engine.stats = engine.compute_stats();
        engine
    }

    /// Advance by the wall time since the last call.
    pub fn tick(&mut self) -> FrameStats {
        let dt = self.clock.tick();
        let stats = self.advance(dt);

        let elapsed = self.clock.wall_elapsed();
        if elapsed.saturating_sub(self.last_report) >= STATS_LOG_INTERVAL {
            self.last_report = elapsed;
            tracing::info!(
                fps = stats.fps.round(),
                time = stats.time,
                radius = stats.expanded_radius,
                day_length = stats.day_length,
                mode = stats.mode.label(),
                "stats"
            );
        }
        stats
    }

    /// Advance simulation time by `dt` years and bring every solver up to
    /// date. A paused engine still refreshes derived data but keeps its time.
    pub fn advance(&mut self, dt: f64) -> FrameStats {
        let dt = if self.state.paused || !dt.is_finite() { 0.0 } else { dt };
        self.state.time += dt;

        self.sync_solvers();
        self.refresh_field();
        if dt != 0.0 {
            self.stations.update_positions(dt);
        }

        self.stats = self.compute_stats();
        tracing::trace!(frame = self.stats.frame, time = self.stats.time, "advanced");
        self.stats
    }

    fn sync_solvers(&mut self) {
        self.expansion.set_expansion_rate(self.state.expansion_rate);
        self.stations.set_expansion_rate(self.state.expansion_rate);
        self.field.set_strength(self.state.field_strength);
        self.field.set_outer_radius(self.config.domain.outer_radius);
    }

    /// Regenerate streamlines and texture when `B0`, count or `R` changed.
    fn refresh_field(&mut self) {
        let key = FieldKey {
            strength: self.field.strength(),
            line_count: self.config.field.line_count,
            outer_radius: self.field.outer_radius(),
        };
        if self.field_key == Some(key) {
            return;
        }

        self.streamlines = self.field.generate_streamlines(&self.config.field);
        self.field_texture = self.field.generate_field_texture(self.config.field.texture_resolution);
        self.field_key = Some(key);
        self.field_generation += 1;
        tracing::debug!(
            strength = key.strength,
            lines = self.streamlines.len(),
            generation = self.field_generation,
            "regenerated field data"
        );
    }

    fn compute_stats(&self) -> FrameStats {
        let state = &self.state;
        FrameStats {
            frame: self.clock.frame(),
            fps: self.clock.fps(),
            time: state.time,
            expanded_radius: self.expanded_radius(),
            day_length: self.expansion.day_length(state.time),
            sun_distance: self.solar.sun_radius(state.solar_days()),
            mode: state.mode,
            paused: state.paused,
        }
    }

    /// Apply a host action. Returns the requests that need the window.
    pub fn apply(&mut self, action: Action) -> Option<HostRequest> {
        match action {
            Action::Pan(delta) => self.camera.pan(delta.x, delta.y),
            Action::ZoomAt { screen, factor } => {
                let anchor = self.camera.screen_to_world(screen);
                self.camera.zoom_to_point(anchor.x, anchor.y, factor);
            }
            Action::SetMode(mode) => self.set_mode(mode),
            Action::TogglePause => self.toggle_pause(),
            Action::Reset => self.reset(),
            Action::Fit => self.fit_camera(),
            Action::ScaleTime(factor) => self.set_time_scale(self.state.time_scale * factor),
            Action::Snapshot => return Some(HostRequest::Snapshot),
            Action::Quit => return Some(HostRequest::Quit),
        }
        None
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        let scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
        self.state.time_scale = scale;
        self.clock.set_time_scale(scale);
        tracing::debug!(scale, "time scale");
    }

    pub fn set_expansion_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.state.expansion_rate = rate;
        }
    }

    pub fn set_field_strength(&mut self, strength: f64) {
        if strength.is_finite() {
            self.state.field_strength = strength.max(0.0);
        }
    }

    /// Jump to absolute time `time` in years.
    pub fn set_time(&mut self, time: f64) {
        if time.is_finite() {
            self.state.time = time;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
        self.clock.set_paused(paused);
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.state.paused);
        tracing::info!(paused = self.state.paused, "pause toggled");
    }

    pub fn set_mode(&mut self, mode: VisualizationMode) {
        if self.state.mode != mode {
            tracing::info!(mode = mode.label(), "visualization mode");
        }
        self.state.mode = mode;
    }

    /// Restore the initial state and move every station home.
    pub fn reset(&mut self) {
        self.state = self.initial_state;
        self.clock.set_paused(self.state.paused);
        self.clock.set_time_scale(self.state.time_scale);
        self.stations.reset();
        self.sync_solvers();
        self.refresh_field();
        self.stats = self.compute_stats();
        tracing::info!("simulation reset");
    }

    /// Fit the camera to the current disk.
    pub fn fit_camera(&mut self) {
        let radius = self.expanded_radius().abs().max(self.config.domain.outer_radius);
        self.camera.fit(radius);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.camera.set_viewport(width, height);
        }
    }

    /// Disk radius at the current time.
    pub fn expanded_radius(&self) -> f64 {
        self.expansion
            .expanded_radius(self.config.domain.outer_radius, self.state.time)
    }

    /// Ratio of the current disk to the base disk.
    pub fn growth_factor(&self) -> f64 {
        let r = self.config.domain.outer_radius;
        if r > 0.0 {
            self.expanded_radius() / r
        } else {
            1.0
        }
    }

    /// World size of a marker that appears a fixed number of pixels wide.
    pub fn marker_size(&self) -> f64 {
        self.camera.world_units_per_pixel() * STATION_MARKER_PIXELS
    }

    /// Bumped each time streamlines and texture are regenerated.
    pub fn field_generation(&self) -> u64 {
        self.field_generation
    }

    /// Current simulated climate zone at a world position, for hover
    /// readouts.
    pub fn zone_at(&self, world: Vector2) -> crate::climate::ClimateZone {
        self.climate.zone_at(world.length() / self.growth_factor().max(f64::EPSILON))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn expansion(&self) -> &ExpansionSolver {
        &self.expansion
    }

    pub fn field(&self) -> &FieldSolver {
        &self.field
    }

    pub fn solar(&self) -> &SolarSolver {
        &self.solar
    }

    pub fn climate(&self) -> &ClimateModel {
        &self.climate
    }

    pub fn stations(&self) -> &StationSimulator {
        &self.stations
    }

    pub fn events(&self) -> &[ClimateEvent] {
        &self.events
    }

    pub fn streamlines(&self) -> &[Streamline] {
        &self.streamlines
    }

    pub fn field_texture(&self) -> &FieldTexture {
        &self.field_texture
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateZone;
    use crate::config::SimulationConfig;
    use crate::field::FieldConfig;
    use crate::stations::StationConfig;

    fn small_config() -> EngineConfig {
        EngineConfig::new()
            .with_field(FieldConfig::new(6).with_texture_resolution(8))
            .with_stations(StationConfig::new(20).with_seed(3))
    }

    fn engine() -> Engine {
        Engine::new(small_config(), 800, 600)
    }

    #[test]
    fn test_new_generates_field_data() {
        let engine = engine();
        assert_eq!(engine.streamlines().len(), 6);
        assert_eq!(engine.field_texture().resolution, 8);
        assert_eq!(engine.field_generation(), 1);
        assert_eq!(engine.stations().len(), 20);
        assert_eq!(engine.events().len(), climate_events().len());
    }

    #[test]
    fn test_advance_moves_time_and_radius() {
        let mut engine = engine();
        let stats = engine.advance(10.0);
        assert_eq!(stats.time, 10.0);
        let expected = 20_000.0 * (1.0 + 0.01 * 10.0);
        assert!((stats.expanded_radius - expected).abs() < 1e-6);
        assert!((stats.day_length - 24.0 * 1.1f64.powi(2)).abs() < 1e-9);
        assert!((engine.growth_factor() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_paused_engine_keeps_time() {
        let mut engine = engine();
        engine.set_paused(true);
        let before = engine.stations().stations()[0].position;
        let stats = engine.advance(5.0);
        assert_eq!(stats.time, 0.0);
        assert!(stats.paused);
        assert_eq!(engine.stations().stations()[0].position, before);
    }

    #[test]
    fn test_field_regenerates_only_on_change() {
        let mut engine = engine();
        engine.advance(1.0);
        engine.advance(1.0);
        assert_eq!(engine.field_generation(), 1);

        engine.set_field_strength(2.0e6);
        engine.advance(0.0);
        assert_eq!(engine.field_generation(), 2);
        assert_eq!(engine.field().strength(), 2.0e6);

        // Expansion rate does not touch the field.
        engine.set_expansion_rate(0.05);
        engine.advance(0.0);
        assert_eq!(engine.field_generation(), 2);
    }

    #[test]
    fn test_solvers_follow_state() {
        let mut engine = engine();
        engine.set_expansion_rate(0.033);
        engine.advance(0.0);
        assert_eq!(engine.expansion().rate(), 0.033);
        assert_eq!(engine.stations().rate(), 0.033);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let config = small_config()
            .with_simulation(SimulationConfig::default().with_expansion_rate(0.02));
        let mut engine = Engine::new(config, 800, 600);
        engine.set_expansion_rate(0.5);
        engine.set_mode(VisualizationMode::Station);
        engine.advance(3.0);
        engine.reset();

        let state = engine.state();
        assert_eq!(state.time, 0.0);
        assert_eq!(state.expansion_rate, 0.02);
        assert_eq!(state.mode, VisualizationMode::Terrain);
        for station in engine.stations().stations() {
            assert_eq!(station.position, station.initial_position);
            assert_eq!(station.displacement, Vector2::ZERO);
        }
    }

    #[test]
    fn test_apply_actions() {
        let mut engine = engine();
        assert_eq!(engine.apply(Action::Snapshot), Some(HostRequest::Snapshot));
        assert_eq!(engine.apply(Action::Quit), Some(HostRequest::Quit));

        assert_eq!(engine.apply(Action::SetMode(VisualizationMode::Solar)), None);
        assert_eq!(engine.state().mode, VisualizationMode::Solar);

        engine.apply(Action::ScaleTime(2.0));
        assert_eq!(engine.state().time_scale, 2.0);
        assert_eq!(engine.clock_mut().time_scale(), 2.0);

        engine.apply(Action::TogglePause);
        assert!(engine.state().paused);
        assert!(engine.clock_mut().is_paused());
    }

    #[test]
    fn test_zoom_action_keeps_cursor_anchor() {
        let mut engine = engine();
        let screen = Vector2::new(600.0, 150.0);
        let before = engine.camera_mut().screen_to_world(screen);
        engine.apply(Action::ZoomAt { screen, factor: 1.1 });
        let after = engine.camera_mut().world_to_screen(before);
        assert!((after - screen).length() < 1e-6);
    }

    #[test]
    fn test_setters_reject_non_finite() {
        let mut engine = engine();
        engine.set_time_scale(f64::NAN);
        assert_eq!(engine.state().time_scale, 0.0);
        engine.set_time_scale(-3.0);
        assert_eq!(engine.state().time_scale, 0.0);
        engine.set_expansion_rate(f64::INFINITY);
        assert_eq!(engine.state().expansion_rate, 0.01);
        engine.set_time(f64::NAN);
        assert_eq!(engine.state().time, 0.0);
        assert_eq!(engine.advance(f64::NAN).time, 0.0);
    }

    #[test]
    fn test_zone_at_uses_undeformed_radius() {
        let mut engine = engine();
        engine.advance(100.0);
        // Growth factor 2: a world point at 2 × 1000 maps back to 1000.
        assert_eq!(engine.zone_at(Vector2::new(2_000.0, 0.0)), ClimateZone::Polar);
    }

    #[test]
    fn test_out_of_range_config_is_reported_not_fatal() {
        use crate::error::ConfigError;

        let err = EngineConfig::from_json(r#"{"camera":{"min_zoom":1.0,"max_zoom":0.1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "camera.max_zoom", .. }));

        // A hand-assembled config skips validation but still builds.
        let mut config = small_config();
        config.camera.min_zoom = 1.0;
        config.camera.max_zoom = 0.1;
        let engine = Engine::new(config, 800, 600);
        assert_eq!(engine.camera().zoom(), 0.1);
    }

    #[test]
    fn test_zero_texture_resolution_skips_sampling() {
        let config = small_config().with_field(FieldConfig::new(6).with_texture_resolution(0));
        let engine = Engine::new(config, 800, 600);
        assert!(engine.field_texture().is_empty());
        assert_eq!(engine.streamlines().len(), 6);
    }
}

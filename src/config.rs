//! Engine configuration.
//!
//! Every section has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!     "simulation": { "expansion_rate": 0.033, "time_scale": 4.0 },
//!     "stations": { "count": 400, "seed": 7 },
//!     "log_level": "debug"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::climate::ClimateBoundaries;
use crate::error::ConfigError;
use crate::field::{FieldConfig, MAX_TEXTURE_RESOLUTION};
use crate::solar::SolarConfig;
use crate::state::{SimulationState, VisualizationMode, DAYS_PER_YEAR};
use crate::stations::StationConfig;

/// One simulated day per wall second. At 60 fps a frame then moves the sun
/// well under an hour, so the solar layer rebuilds its path only every few
/// frames. Raise the time scale to watch the expansion itself.
pub const DEFAULT_YEARS_PER_SECOND: f64 = 1.0 / DAYS_PER_YEAR;

/// Initial values of the host-adjustable parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Start time in years.
    pub initial_time: f64,
    pub time_scale: f64,
    /// Expansion rate `k` per year.
    pub expansion_rate: f64,
    /// Central field strength `B0`.
    pub field_strength: f64,
    /// Simulation years per wall-clock second at scale 1.
    pub years_per_second: f64,
    pub mode: VisualizationMode,
    pub paused: bool,
}

impl SimulationConfig {
    pub fn with_expansion_rate(mut self, rate: f64) -> Self {
        self.expansion_rate = rate;
        self
    }

    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale.max(0.0);
        self
    }

    pub fn with_field_strength(mut self, strength: f64) -> Self {
        self.field_strength = strength.max(0.0);
        self
    }

    pub fn with_years_per_second(mut self, years: f64) -> Self {
        self.years_per_second = years.max(0.0);
        self
    }

    /// State the engine starts (and resets) to.
    pub fn initial_state(&self) -> SimulationState {
        SimulationState {
            time: self.initial_time,
            time_scale: self.time_scale,
            expansion_rate: self.expansion_rate,
            field_strength: self.field_strength,
            paused: self.paused,
            mode: self.mode,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let state = SimulationState::default();
        Self {
            initial_time: state.time,
            time_scale: state.time_scale,
            expansion_rate: state.expansion_rate,
            field_strength: state.field_strength,
            years_per_second: DEFAULT_YEARS_PER_SECOND,
            mode: state.mode,
            paused: state.paused,
        }
    }
}

/// Size of the disk and its rotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Disk radius at `t = 0`, in km.
    pub outer_radius: f64,
    /// Day length at `t = 0`, in hours.
    pub base_day_length: f64,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            outer_radius: 20_000.0,
            base_day_length: 24.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Directory PNG snapshots are written to.
    pub snapshot_dir: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Expanse".to_string(),
            width: 1280,
            height: 720,
            snapshot_dir: ".".to_string(),
        }
    }
}

/// Everything needed to start the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub simulation: SimulationConfig,
    pub domain: DomainConfig,
    pub field: FieldConfig,
    pub solar: SolarConfig,
    pub climate: ClimateBoundaries,
    pub stations: StationConfig,
    pub camera: CameraConfig,
    pub window: WindowConfig,
    /// Default `tracing` filter. `RUST_LOG` takes precedence.
    pub log_level: Option<String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse and [`validate`](Self::validate) a JSON config.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values the builders would have clamped. Deserialized and
    /// hand-assembled configs bypass the builders, so this runs before the
    /// engine is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        finite("simulation.initial_time", sim.initial_time)?;
        finite("simulation.expansion_rate", sim.expansion_rate)?;
        non_negative("simulation.time_scale", sim.time_scale)?;
        non_negative("simulation.field_strength", sim.field_strength)?;
        non_negative("simulation.years_per_second", sim.years_per_second)?;

        positive("domain.outer_radius", self.domain.outer_radius)?;
        positive("domain.base_day_length", self.domain.base_day_length)?;

        let field = &self.field;
        positive("field.step_size", field.step_size)?;
        non_negative("field.start_radius", field.start_radius)?;
        if field.texture_resolution > MAX_TEXTURE_RESOLUTION {
            return Err(invalid(
                "field.texture_resolution",
                format!("{} exceeds {MAX_TEXTURE_RESOLUTION}", field.texture_resolution),
            ));
        }

        let solar = &self.solar;
        positive("solar.period", solar.period)?;
        positive("solar.daily_period", solar.daily_period)?;
        non_negative("solar.altitude", solar.altitude)?;
        finite("solar.altitude_variation", solar.altitude_variation)?;
        non_negative("solar.inner_tropic_radius", solar.inner_tropic_radius)?;
        if solar.outer_tropic_radius.is_nan() || solar.outer_tropic_radius < solar.inner_tropic_radius {
            return Err(invalid("solar.outer_tropic_radius", "must not be below inner_tropic_radius"));
        }
        if !(0.0..90.0).contains(&solar.illumination_half_angle_deg) {
            return Err(invalid("solar.illumination_half_angle_deg", "must be in [0, 90)"));
        }
        if !(0.0..=1.0).contains(&solar.ambient) {
            return Err(invalid("solar.ambient", "must be in [0, 1]"));
        }

        let climate = &self.climate;
        let edges = [
            climate.polar_max,
            climate.heating_min,
            climate.cooling_min,
            climate.subarctic_min,
            climate.outer_radius,
        ];
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] > w[1]) {
            return Err(invalid("climate", "band edges must be finite and ascending"));
        }

        let stations = &self.stations;
        non_negative("stations.min_radius", stations.min_radius)?;
        if stations.max_radius_fraction == 0.0 || !(0.0..=1.0).contains(&stations.max_radius_fraction) {
            return Err(invalid("stations.max_radius_fraction", "must be in (0, 1]"));
        }

        let camera = &self.camera;
        positive("camera.min_zoom", camera.min_zoom)?;
        positive("camera.max_zoom", camera.max_zoom)?;
        if camera.min_zoom > camera.max_zoom {
            return Err(invalid(
                "camera.max_zoom",
                format!("{} is below min_zoom {}", camera.max_zoom, camera.min_zoom),
            ));
        }
        positive("camera.fit_padding", camera.fit_padding)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    /// Set the disk radius. Non-positive values are ignored.
    pub fn with_outer_radius(mut self, radius: f64) -> Self {
        if radius > 0.0 {
            self.domain.outer_radius = radius;
        }
        self
    }

    pub fn with_field(mut self, field: FieldConfig) -> Self {
        self.field = field;
        self
    }

    pub fn with_solar(mut self, solar: SolarConfig) -> Self {
        self.solar = solar;
        self
    }

    pub fn with_climate(mut self, climate: ClimateBoundaries) -> Self {
        self.climate = climate;
        self
    }

    pub fn with_stations(mut self, stations: StationConfig) -> Self {
        self.stations = stations;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not finite")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(invalid(field, format!("{value} is negative")));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(invalid(field, format!("{value} is not positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.domain.outer_radius, 20_000.0);
        assert_eq!(config.field.line_count, 24);
        assert_eq!(config.stations.count, 200);
        assert_eq!(config.camera.fit_padding, 1.1);
        assert_eq!(config.simulation.initial_state(), SimulationState::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "simulation": { "expansion_rate": 0.033 }, "stations": { "seed": 7 } }"#,
        )
        .unwrap();
        assert_eq!(config.simulation.expansion_rate, 0.033);
        assert_eq!(config.simulation.time_scale, 1.0);
        assert_eq!(config.stations.seed, 7);
        assert_eq!(config.stations.count, 200);
        assert_eq!(config.solar, SolarConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::new()
            .with_outer_radius(6_371.0)
            .with_log_level("debug");
        let back = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_builders_clamp() {
        let sim = SimulationConfig::default()
            .with_time_scale(-2.0)
            .with_field_strength(-1.0);
        assert_eq!(sim.time_scale, 0.0);
        assert_eq!(sim.field_strength, 0.0);
        assert_eq!(EngineConfig::new().with_outer_radius(-5.0).domain.outer_radius, 20_000.0);
    }

    fn invalid_field(json: &str) -> &'static str {
        match EngineConfig::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_zoom_limits_rejected() {
        let field = invalid_field(r#"{ "camera": { "min_zoom": 1.0, "max_zoom": 0.1 } }"#);
        assert_eq!(field, "camera.max_zoom");
        assert_eq!(invalid_field(r#"{ "camera": { "min_zoom": 0.0 } }"#), "camera.min_zoom");
    }

    #[test]
    fn test_oversized_texture_rejected() {
        let field = invalid_field(r#"{ "field": { "texture_resolution": 100000 } }"#);
        assert_eq!(field, "field.texture_resolution");
        let at_cap = format!(r#"{{ "field": {{ "texture_resolution": {MAX_TEXTURE_RESOLUTION} }} }}"#);
        assert!(EngineConfig::from_json(&at_cap).is_ok());
    }

    #[test]
    fn test_zero_solar_period_rejected() {
        assert_eq!(invalid_field(r#"{ "solar": { "period": 0.0 } }"#), "solar.period");
        assert_eq!(invalid_field(r#"{ "solar": { "daily_period": -1.0 } }"#), "solar.daily_period");
    }

    #[test]
    fn test_other_ranges_rejected() {
        assert_eq!(invalid_field(r#"{ "domain": { "outer_radius": 0.0 } }"#), "domain.outer_radius");
        assert_eq!(invalid_field(r#"{ "field": { "step_size": 0.0 } }"#), "field.step_size");
        assert_eq!(
            invalid_field(r#"{ "climate": { "heating_min": 13000.0 } }"#),
            "climate"
        );
        assert_eq!(
            invalid_field(r#"{ "stations": { "max_radius_fraction": 1.5 } }"#),
            "stations.max_radius_fraction"
        );
    }

    #[test]
    fn test_builder_configs_validate() {
        assert!(EngineConfig::default().validate().is_ok());
        let config = EngineConfig::new()
            .with_camera(CameraConfig::default().with_zoom_limits(1.0, 0.1))
            .with_field(FieldConfig::new(8).with_texture_resolution(100_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_frame_stays_under_path_threshold() {
        use crate::gpu::solar_layer::PATH_REGEN_THRESHOLD_DAYS;

        let sim = SimulationConfig::default();
        let days_per_frame = sim.years_per_second * sim.time_scale * DAYS_PER_YEAR / 60.0;
        assert!(days_per_frame < PATH_REGEN_THRESHOLD_DAYS);
    }
}

//! Simulation state snapshot and per-frame output.

use serde::{Deserialize, Serialize};

/// Days per simulation year, used to convert between solver time bases.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Which layer set is drawn over the base disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Terrain,
    Field,
    Solar,
    Station,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 4] = [
        VisualizationMode::Terrain,
        VisualizationMode::Field,
        VisualizationMode::Solar,
        VisualizationMode::Station,
    ];

    /// Mode for a 1-based hotkey index.
    pub fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn label(&self) -> &'static str {
        match self {
            VisualizationMode::Terrain => "terrain",
            VisualizationMode::Field => "field",
            VisualizationMode::Solar => "solar",
            VisualizationMode::Station => "station",
        }
    }
}

/// Everything the host can set. Owned by the engine; solvers receive a copy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationState {
    /// Absolute simulation time in years.
    pub time: f64,
    pub time_scale: f64,
    /// Expansion rate `k` per year.
    pub expansion_rate: f64,
    /// Central field strength `B0`.
    pub field_strength: f64,
    pub paused: bool,
    pub mode: VisualizationMode,
}

impl SimulationState {
    /// Simulation time expressed in days, the solar solver's time base.
    #[inline]
    pub fn solar_days(&self) -> f64 {
        self.time * DAYS_PER_YEAR
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            time: 0.0,
            time_scale: 1.0,
            expansion_rate: 0.01,
            field_strength: 1.0e6,
            paused: false,
            mode: VisualizationMode::Terrain,
        }
    }
}

/// Read-only numbers reported to the host once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub fps: f64,
    /// Simulation time in years.
    pub time: f64,
    /// Disk radius at the current time.
    pub expanded_radius: f64,
    /// Day length in hours at the current time.
    pub day_length: f64,
    /// Planar distance of the sun from the origin.
    pub sun_distance: f64,
    pub mode: VisualizationMode,
    pub paused: bool,
}

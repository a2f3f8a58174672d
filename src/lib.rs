//! # Expanse
//!
//! Real-time visualization of analytic fields over an expanding polar disk.
//!
//! Expanse evaluates a handful of closed-form models every frame (radial
//! expansion, a toroidal vector field, a moving point light, and a population
//! of advected stations) and draws them through wgpu with a 2-D orthographic
//! camera.
//!
//! ## Quick Start
//!
//! ```ignore
//! use expanse::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let config = EngineConfig::new()
//!         .with_simulation(SimulationConfig::default().with_expansion_rate(0.033))
//!         .with_stations(StationConfig::new(400).with_seed(7));
//!     expanse::run(config)
//! }
//! ```
//!
//! ## Layout
//!
//! The solvers are plain structs with no GPU dependency and can be used on
//! their own:
//!
//! ```
//! use expanse::{ExpansionSolver, FieldConfig, FieldSolver};
//!
//! let expansion = ExpansionSolver::new(0.033);
//! assert!((expansion.expanded_radius(20_000.0, 100.0) - 86_000.0).abs() < 1e-6);
//!
//! let field = FieldSolver::new(1.0e6, 20_000.0);
//! let lines = field.generate_streamlines(&FieldConfig::new(8));
//! assert_eq!(lines.len(), 8);
//! ```
//!
//! The [`Engine`] owns the simulation state and drives the solvers in a
//! fixed order each frame. The `gpu` module turns their output into draw
//! calls, one renderer per visualization mode, all sharing the base disk
//! owned by the terrain renderer.
//!
//! ## Controls
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left drag | Pan |
//! | Wheel | Zoom about the cursor |
//! | `1`-`4` | Terrain, field, solar, station mode |
//! | `Space` | Pause |
//! | `R` | Reset |
//! | `F` | Fit the disk |
//! | `[` / `]` | Halve / double the time scale |
//! | `P` | Save a PNG snapshot |

pub mod camera;
pub mod climate;
pub mod config;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod field;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod solar;
pub mod state;
pub mod stations;
pub mod time;
pub mod uniforms;
mod window;

pub use camera::{Camera, CameraConfig};
pub use climate::{climate_events, ClimateBoundaries, ClimateEvent, ClimateModel, ClimateZone};
pub use config::{DomainConfig, EngineConfig, SimulationConfig, WindowConfig};
pub use engine::{Engine, HostRequest};
pub use error::{ConfigError, DomainError, EngineError, GpuError};
pub use expansion::ExpansionSolver;
pub use field::{FieldConfig, FieldSolver, FieldTexture, Streamline};
pub use geometry::{PolarCoordinate, Vector2};
pub use gpu::buffer::{GpuBuffer, Mesh, MeshView, VertexArray};
pub use gpu::program::{Program, ProgramKind};
pub use gpu::GpuContext;
pub use solar::{SolarConfig, SolarSolver};
pub use state::{FrameStats, SimulationState, VisualizationMode};
pub use stations::{validate_expansion_pattern, Station, StationConfig, StationSimulator};
pub use time::FrameClock;
pub use uniforms::UniformValue;
pub use window::run;

pub mod prelude {
    pub use crate::camera::{Camera, CameraConfig};
    pub use crate::climate::{ClimateBoundaries, ClimateModel, ClimateZone};
    pub use crate::config::{EngineConfig, SimulationConfig};
    pub use crate::engine::Engine;
    pub use crate::error::EngineError;
    pub use crate::expansion::ExpansionSolver;
    pub use crate::field::{FieldConfig, FieldSolver};
    pub use crate::geometry::{PolarCoordinate, Vector2};
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::solar::{SolarConfig, SolarSolver};
    pub use crate::state::{SimulationState, VisualizationMode};
    pub use crate::stations::{StationConfig, StationSimulator};
}

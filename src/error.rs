//! Error types for Expanse.
//!
//! Initialization failures (GPU context, shader compile/link) are fatal and
//! propagate to the binary. Numerical edge cases inside the frame loop are
//! absorbed where they occur; the only one surfaced to callers is
//! [`DomainError`].

use thiserror::Error;

/// Errors that can occur during GPU initialization and resource creation.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// Surface reports no usable texture format.
    #[error("GPU surface is not compatible with the selected adapter")]
    IncompatibleSurface,
    /// WGSL failed to parse or validate.
    #[error("Shader '{program}' failed to compile:\n{diagnostics}")]
    ShaderCompile {
        program: String,
        diagnostics: String,
    },
    /// Pipeline creation was rejected by the device.
    #[error("Program '{program}' failed to link:\n{diagnostics}")]
    ProgramLink {
        program: String,
        diagnostics: String,
    },
    /// Failed to map buffer for reading.
    #[error("Failed to map GPU buffer: {0}")]
    BufferMapping(String),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for [`crate::EngineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value parsed but is outside the range the engine can run with.
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A formula was evaluated outside the region where it is defined.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    /// `1 + k * years_ago` is zero (or the result is otherwise non-finite).
    #[error("historical radius undefined for rate {rate} at {years_ago} years ago")]
    NonFiniteHistoricalRadius { rate: f64, years_ago: f64 },
}

/// Errors that can occur when running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Config could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// Writing a snapshot image failed.
    #[error("Failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_error_includes_diagnostics() {
        let err = GpuError::ShaderCompile {
            program: "earth".into(),
            diagnostics: "error: expected ';'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("earth"));
        assert!(msg.contains("expected ';'"));
    }

    #[test]
    fn test_gpu_error_wraps_into_engine_error() {
        let err: EngineError = GpuError::NoAdapter.into();
        assert!(err.to_string().starts_with("GPU error"));
    }
}

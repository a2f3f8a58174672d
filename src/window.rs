//! winit application shell.
//!
//! [`App`] owns the window, the GPU context, the [`Engine`] and the render
//! layers. Every redraw it turns input into actions, advances the engine,
//! and then lets the layers read the updated state.

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::EngineConfig;
use crate::engine::{Engine, HostRequest};
use crate::error::{EngineError, GpuError};
use crate::gpu::field_layer::FieldRenderer;
use crate::gpu::solar_layer::SolarRenderer;
use crate::gpu::station_layer::StationRenderer;
use crate::gpu::terrain::TerrainRenderer;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::state::VisualizationMode;

/// Every render layer. Terrain is created first and disposed last because
/// the other layers borrow its base disk.
struct Layers {
    terrain: TerrainRenderer,
    field: FieldRenderer,
    solar: SolarRenderer,
    stations: StationRenderer,
    field_generation: u64,
}

impl Layers {
    fn new(ctx: &GpuContext, engine: &Engine) -> Result<Self, GpuError> {
        let config = engine.config();
        let terrain = TerrainRenderer::new(ctx, &config.climate, &config.solar)?;
        let field = FieldRenderer::new(ctx, engine.field_texture(), engine.streamlines())?;
        let solar = SolarRenderer::new(ctx, engine.solar())?;
        let stations = StationRenderer::new(ctx, config.domain.outer_radius)?;
        Ok(Self {
            terrain,
            field,
            solar,
            stations,
            field_generation: engine.field_generation(),
        })
    }

    /// Push the engine's post-update state to the GPU. Only the layers the
    /// current mode draws are touched.
    fn update(&mut self, ctx: &GpuContext, engine: &mut Engine) {
        let view_proj = engine.camera_mut().view_projection_f32();
        let radius = engine.expanded_radius();
        let state = engine.state();

        self.terrain.update(ctx.queue(), view_proj, radius);

        if self.field_generation != engine.field_generation() {
            self.field.upload_streamlines(ctx, engine.streamlines());
            self.field.upload_texture(ctx, engine.field_texture());
            self.field_generation = engine.field_generation();
        }

        match state.mode {
            VisualizationMode::Terrain => {}
            VisualizationMode::Field => {
                self.field
                    .update(ctx.queue(), view_proj, radius, engine.growth_factor());
            }
            VisualizationMode::Solar => {
                self.solar
                    .update(ctx, view_proj, engine.solar(), state.solar_days(), radius);
            }
            VisualizationMode::Station => {
                self.stations.update(
                    ctx,
                    view_proj,
                    engine.stations().stations(),
                    engine.events(),
                    engine.marker_size(),
                );
            }
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mode: VisualizationMode) {
        self.terrain.draw(pass);
        let disk = self.terrain.base_disk();
        match mode {
            VisualizationMode::Terrain => self.terrain.draw_rings(pass),
            VisualizationMode::Field => {
                self.field.draw(pass, disk);
                self.terrain.draw_rings(pass);
            }
            VisualizationMode::Solar => self.solar.draw(pass, disk),
            VisualizationMode::Station => {
                self.terrain.draw_rings(pass);
                self.stations.draw(pass);
            }
        }
    }

    fn dispose(&mut self) {
        self.stations.dispose();
        self.solar.dispose();
        self.field.dispose();
        self.terrain.dispose();
    }
}

pub struct App {
    config: EngineConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    engine: Option<Engine>,
    layers: Option<Layers>,
    input: Input,
    error: Option<EngineError>,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            engine: None,
            layers: None,
            input: Input::new(),
            error: None,
        }
    }

    /// Fatal error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<EngineError> {
        self.error.take()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EngineError> {
        let window_config = &self.config.window;
        let window_attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(window_config.width, window_config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let (width, height) = gpu.size();
        let engine = Engine::new(self.config.clone(), width, height);
        let layers = Layers::new(&gpu, &engine)?;

        tracing::info!(width, height, "window ready");
        window.request_redraw();

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.engine = Some(engine);
        self.layers = Some(layers);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(engine), Some(layers)) = (&mut self.gpu, &mut self.engine, &mut self.layers)
        else {
            return;
        };

        let mut snapshot = false;
        for action in self.input.actions() {
            match engine.apply(action) {
                Some(HostRequest::Quit) => {
                    event_loop.exit();
                    return;
                }
                Some(HostRequest::Snapshot) => snapshot = true,
                None => {}
            }
        }
        self.input.begin_frame();

        // Solvers finish before any layer reads them.
        engine.tick();
        layers.update(gpu, engine);

        let mode = engine.state().mode;
        match gpu.render(|pass| layers.draw(pass, mode)) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => tracing::warn!("render error: {e:?}"),
        }

        if snapshot {
            let dir = PathBuf::from(&self.config.window.snapshot_dir);
            match save_snapshot(gpu, layers, mode, dir) {
                Ok(path) => tracing::info!(path = %path.display(), "saved snapshot"),
                Err(e) => tracing::warn!("snapshot failed: {e}"),
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut layers) = self.layers.take() {
            layers.dispose();
            tracing::debug!("render layers disposed");
        }
    }
}

fn save_snapshot(
    gpu: &GpuContext,
    layers: &Layers,
    mode: VisualizationMode,
    dir: PathBuf,
) -> Result<PathBuf, EngineError> {
    let image = gpu.capture(|pass| layers.draw(pass, mode))?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("expanse-{stamp}.png"));
    image.save(&path)?;
    Ok(path)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Open the window and run until it is closed.
pub fn run(config: EngineConfig) -> Result<(), EngineError> {
    config.validate()?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    app.shutdown();

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

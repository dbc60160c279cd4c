//! Platform layer: windowing & event loop.
//!
//! - Continuous redraws: every `AboutToWait` requests the next frame; vsync
//!   paces the loop.
//! - Proper handling of resize/close/Escape.
//! - All GPU setup happens in `resumed`; a failure there stops the loop and
//!   is returned from [`run_viewer`].

pub mod driver;

use std::{sync::Arc, time::Duration, time::Instant};

use anyhow::{Context, Result, anyhow};
use asset::{scene::SceneAssets, shader::ShaderSources};
use corelib::{
    camera::{CameraPath, CameraState},
    frame::FrameTransformGenerator,
};
use renderer::GpuState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use driver::{FpsCounter, FrameDriver};

/// Window and frame-loop settings.
#[derive(Clone, Debug)]
pub struct ViewerOptions {
    pub title: String,
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    pub camera: CameraState,
    pub path: CameraPath,
    pub generator: FrameTransformGenerator,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            title: "Svarog Viewer".to_owned(),
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 640,
            height: 480,
            camera: CameraState::default(),
            path: CameraPath::default(),
            generator: FrameTransformGenerator::default(),
        }
    }
}

/// Open a window, upload `scene` and render until the window is closed.
pub fn run_viewer(options: ViewerOptions, scene: SceneAssets, shaders: ShaderSources) -> Result<()> {
    let event_loop: EventLoop<()> = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(options, scene, shaders);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match app.error.take() {
        Some(err) => Err(err),
        None => {
            log::info!("Rendered {} frames", app.driver.frame());
            Ok(())
        }
    }
}

struct ViewerApp {
    options: ViewerOptions,
    /// Assets waiting for the GPU; taken on the first `resumed`.
    pending: Option<(SceneAssets, ShaderSources)>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    driver: FrameDriver,
    fps: Option<FpsCounter>,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(options: ViewerOptions, scene: SceneAssets, shaders: ShaderSources) -> Self {
        let driver = FrameDriver::new(options.camera, options.path, options.generator);
        let fps = options
            .show_fps
            .then(|| FpsCounter::new(Duration::from_secs(1)));
        Self {
            options,
            pending: Some((scene, shaders)),
            window: None,
            gpu: None,
            driver,
            fps,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some((scene, shaders)) = self.pending.take() else {
            return Ok(());
        };

        let attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.options.backends,
            scene,
            &shaders,
        ))?;

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let transforms = self.driver.transforms(gpu.viewport());
        match gpu.render(&transforms) {
            Ok(()) => {
                self.driver.finish_frame();
                if let Some(fps) = self.fps.as_mut() {
                    if let Some(rate) = fps.tick(Instant::now()) {
                        log::info!("FPS: {:.1}", rate);
                    }
                }
            }
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost/outdated ({err}); reconfiguring.");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory"));
            }
            Err(err) => {
                log::warn!("Skipping frame: {err}");
            }
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {:.3}", scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

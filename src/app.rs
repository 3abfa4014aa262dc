//! Interactive viewer: window, input and the per-frame loop.
//!
//! Each redraw ticks the timer, eases the camera, steps the simulation,
//! marshals a snapshot and hands it to the [`RayTracer`].
//!
//! | Input | Action |
//! |-------|--------|
//! | Left drag | Orbit |
//! | Wheel, `Q`/`E` | Zoom |
//! | `W`/`A`/`S`/`D`, arrows | Orbit |
//! | `G` | Toggle gravity |
//! | `T` | Toggle spacetime grid |
//! | `1`/`2`/`3` | Euler / Leapfrog / RK4 |
//! | `Space` | Reset bodies |
//! | `R` | Reset camera |
//! | `P` | Pause |
//! | `Escape` | Quit |

use std::sync::Arc;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::camera::OrbitCamera;
use crate::config::Config;
use crate::error::AppError;
use crate::gpu::RayTracer;
use crate::grid::SpacetimeGrid;
use crate::integrator::IntegrationScheme;
use crate::simulation::Simulation;
use crate::snapshot::SceneSnapshotMarshaler;
use crate::time::FrameTimer;

const TITLE_REFRESH_FRAMES: u64 = 30;
const KEY_ZOOM_IN: f32 = 0.9;
const KEY_ZOOM_OUT: f32 = 1.1;

pub struct App {
    config: Config,
    simulation: Simulation,
    camera: OrbitCamera,
    marshaler: SceneSnapshotMarshaler,
    timer: FrameTimer,
    window: Option<Arc<Window>>,
    tracer: Option<RayTracer>,
    error: Option<AppError>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let simulation = Simulation::from_config(&config);
        let camera = OrbitCamera::new(&config.camera, aspect);
        let marshaler = SceneSnapshotMarshaler::from_config(&config);
        let mut timer = FrameTimer::new().with_fixed_step(Some(config.physics.time_step));
        timer.set_time_scale(config.physics.time_scale);

        Self {
            config,
            simulation,
            camera,
            marshaler,
            timer,
            window: None,
            tracer: None,
            error: None,
        }
    }

    /// Open the window and block until it closes.
    pub fn run(mut self) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: AppError) {
        error!("{}", e);
        self.error = Some(e);
        event_loop.exit();
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>, AppError> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        Ok(Arc::new(event_loop.create_window(attrs)?))
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let step = self.camera.key_step();
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyG => {
                self.simulation.toggle_gravity();
            }
            KeyCode::Digit1 => self.simulation.set_scheme(IntegrationScheme::Euler),
            KeyCode::Digit2 => self.simulation.set_scheme(IntegrationScheme::Leapfrog),
            KeyCode::Digit3 => self.simulation.set_scheme(IntegrationScheme::Rk4),
            KeyCode::Space => self.simulation.reset(),
            KeyCode::KeyR => self.camera.reset(),
            KeyCode::KeyT => {
                if let Some(tracer) = self.tracer.as_mut() {
                    let shown = tracer.toggle_grid();
                    info!("Spacetime grid {}", if shown { "on" } else { "off" });
                }
            }
            KeyCode::KeyP => {
                let paused = self.timer.toggle_pause();
                info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => self.camera.orbit(-step, 0.0),
            KeyCode::KeyD | KeyCode::ArrowRight => self.camera.orbit(step, 0.0),
            KeyCode::KeyW | KeyCode::ArrowUp => self.camera.orbit(0.0, -step),
            KeyCode::KeyS | KeyCode::ArrowDown => self.camera.orbit(0.0, step),
            KeyCode::KeyQ => self.camera.zoom(KEY_ZOOM_IN),
            KeyCode::KeyE => self.camera.zoom(KEY_ZOOM_OUT),
            _ => {}
        }
    }

    fn refresh_title(&self) {
        if let Some(window) = &self.window {
            window.set_title(&format!(
                "{} | {:.0} FPS | {} bodies | {}{}",
                self.config.window.title,
                self.timer.fps(),
                self.simulation.bodies().len(),
                self.simulation.scheme(),
                if self.simulation.gravity_enabled() { "" } else { " | gravity off" },
            ));
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let tick = self.timer.tick();
        self.camera.update(tick.frame_secs);
        self.simulation.step(tick.sim_dt);

        if self.timer.frames() % TITLE_REFRESH_FRAMES == 0 {
            self.refresh_title();
        }

        let snapshot = self.marshaler.marshal(&self.camera, self.simulation.bodies());
        if let Some(tracer) = &mut self.tracer {
            match tracer.render(&snapshot) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = tracer.size();
                    tracer.resize(size);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => warn!("Render error: {:?}", e),
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match self.create_window(event_loop) {
            Ok(w) => w,
            Err(e) => return self.fail(event_loop, e),
        };
        self.window = Some(window.clone());

        let central = self.simulation.central();
        let horizon_radius = central.horizon_radius();
        let grid = SpacetimeGrid::from_config(central, &self.config.rendering);
        let show_grid = self.config.rendering.enable_grid;
        match pollster::block_on(RayTracer::new(window, horizon_radius, &grid, show_grid)) {
            Ok(tracer) => {
                let size = tracer.size();
                self.camera
                    .set_aspect(size.width as f32 / size.height.max(1) as f32);
                self.tracer = Some(tracer);
                info!("Ray tracer ready");
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(tracer) = &mut self.tracer {
                    tracer.resize(physical_size);
                }
                if physical_size.height > 0 {
                    self.camera
                        .set_aspect(physical_size.width as f32 / physical_size.height as f32);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.camera.set_dragging(state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.camera.cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.scroll(lines);
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
}

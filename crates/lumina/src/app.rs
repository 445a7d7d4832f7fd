//! Windowed editor: event loop, camera controls and the editor UI.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use lumina_render::RenderEngine;
use lumina_ui::{EditorAction, EditorUi, InputEvent, InputTranslator, Key, MouseButton, UiOverlay};
use pollster::FutureExt;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{Engine, Error, Result};

/// Radians of orbit per pixel of drag.
const ORBIT_SPEED: f32 = 0.01;
/// Fraction of the camera distance moved per wheel notch.
const ZOOM_STEP: f32 = 0.1;

/// Camera motion driven by a mouse drag outside the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CameraDrag {
    Orbit { last: Vec2 },
    Pan { last: Vec2 },
}

struct EditorApp {
    engine: Engine,
    window: Option<Arc<Window>>,
    ui: Option<EditorUi>,
    overlay: UiOverlay,
    input: InputTranslator,
    drag: Option<CameraDrag>,
    screenshot_pending: bool,
    screenshot_counter: u32,
    last_frame: Option<Instant>,
    /// First fatal error; stops the event loop.
    error: Option<Error>,
}

impl EditorApp {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            window: None,
            ui: None,
            overlay: UiOverlay::new(),
            input: InputTranslator::new(),
            drag: None,
            screenshot_pending: false,
            screenshot_counter: 0,
            last_frame: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("lumina")
            .with_inner_size(LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let renderer = RenderEngine::new_windowed(window.clone()).block_on()?;
        let (width, height) = renderer.dimensions();
        self.engine.attach_renderer(renderer)?;
        self.engine.camera_mut().set_aspect_ratio(width as f32 / height as f32);
        self.engine.fit_camera();
        self.ui = Some(EditorUi::new(self.engine.options(), width as f32)?);
        self.window = Some(window);
        Ok(())
    }

    /// Sends an input event to the UI, or to the camera if the UI does not want it.
    fn route_input(&mut self, event: &InputEvent) -> Result<Vec<EditorAction>> {
        let Some(ui) = self.ui.as_mut() else {
            return Ok(Vec::new());
        };
        let to_ui = match event {
            // Moves always reach the UI so hover state stays current.
            InputEvent::MouseMove { .. } => true,
            InputEvent::MouseDown { position, .. } | InputEvent::Wheel { position, .. } => {
                self.drag.is_none() && ui.wants_pointer(*position)
            }
            InputEvent::MouseUp { .. } => self.drag.is_none(),
            InputEvent::KeyDown(_) | InputEvent::Text(_) => ui.wants_keyboard(),
        };
        let actions = if to_ui {
            ui.handle_input(event, self.engine.options_mut())?
        } else {
            Vec::new()
        };
        let ui_captured = ui.tree().captured().is_some();
        if !to_ui || (matches!(event, InputEvent::MouseMove { .. }) && !ui_captured) {
            self.camera_input(event);
        }
        Ok(actions)
    }

    fn camera_input(&mut self, event: &InputEvent) {
        let camera = self.engine.camera_mut();
        match *event {
            InputEvent::MouseDown { position, button } => {
                self.drag = match button {
                    MouseButton::Left => Some(CameraDrag::Orbit { last: position }),
                    MouseButton::Right | MouseButton::Middle => Some(CameraDrag::Pan { last: position }),
                };
            }
            InputEvent::MouseMove { position } => match self.drag {
                Some(CameraDrag::Orbit { last }) => {
                    let delta = (position - last) * ORBIT_SPEED;
                    camera.orbit(delta.x, delta.y);
                    self.drag = Some(CameraDrag::Orbit { last: position });
                }
                Some(CameraDrag::Pan { last }) => {
                    let scale = camera.distance() * 0.002;
                    let delta = (position - last) * scale;
                    camera.pan(-delta.x, delta.y);
                    self.drag = Some(CameraDrag::Pan { last: position });
                }
                None => {}
            },
            InputEvent::MouseUp { .. } => self.drag = None,
            InputEvent::Wheel { delta, .. } => {
                let distance = camera.distance();
                camera.zoom(delta * distance * ZOOM_STEP);
            }
            InputEvent::KeyDown(Key::Home) => self.engine.reset_camera(),
            InputEvent::KeyDown(_) | InputEvent::Text(_) => {}
        }
    }

    fn apply_actions(&mut self, event_loop: &ActiveEventLoop, actions: Vec<EditorAction>) {
        for action in actions {
            match action {
                EditorAction::OptionsChanged => log::debug!("editor changed engine options"),
                EditorAction::ResetCamera => self.engine.reset_camera(),
                EditorAction::Screenshot => self.screenshot_pending = true,
                EditorAction::Quit => event_loop.exit(),
            }
        }
    }

    fn redraw(&mut self) -> Result<()> {
        if let Some(ui) = self.ui.as_mut() {
            self.overlay.set_draw_list(ui.draw());
        }
        self.engine.render_frame(Some(&mut self.overlay))?;
        if std::mem::take(&mut self.screenshot_pending) {
            self.save_screenshot();
        }
        self.last_frame = Some(Instant::now());
        Ok(())
    }

    /// Saves the scene without the UI. Failures are logged, not fatal.
    fn save_screenshot(&mut self) {
        let filename = format!("screenshot_{:04}.png", self.screenshot_counter);
        self.screenshot_counter += 1;
        let Some((width, height)) = self.engine.renderer().map(RenderEngine::dimensions) else {
            return;
        };
        match self.engine.render_to_file(&filename, width, height) {
            Ok(()) => log::info!("screenshot saved to {filename}"),
            Err(err) => log::warn!("screenshot failed: {err}"),
        }
    }

    fn frame_interval(&self) -> Option<Duration> {
        match self.engine.options().max_fps {
            0 => None,
            fps => Some(Duration::from_secs_f64(1.0 / f64::from(fps))),
        }
    }
}

impl ApplicationHandler for EditorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.engine.renderer_mut() {
                    renderer.resize(size.width, size.height);
                }
                if size.width > 0 && size.height > 0 {
                    self.engine
                        .camera_mut()
                        .set_aspect_ratio(size.width as f32 / size.height as f32);
                }
                if let Some(ui) = self.ui.as_mut() {
                    if let Err(err) = ui.resize(size.width as f32) {
                        log::warn!("failed to resize editor menu: {err}");
                    }
                }
                return;
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
                return;
            }
            _ => {}
        }

        for input in self.input.translate(&event) {
            match self.route_input(&input) {
                Ok(actions) => self.apply_actions(event_loop, actions),
                Err(err) => log::warn!("editor input failed: {err}"),
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        match (self.frame_interval(), self.last_frame) {
            (Some(interval), Some(last)) if last.elapsed() < interval => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(last + interval));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Poll);
                window.request_redraw();
            }
        }
    }
}

/// Opens the editor window and blocks until it closes.
///
/// Left drag orbits the camera, right or middle drag pans and the wheel zooms,
/// unless the pointer is over the editor UI.
pub fn run_editor(engine: Engine) -> Result<()> {
    crate::init_logging();
    let event_loop = EventLoop::new()?;
    let mut app = EditorApp::new(engine);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

//! Window loop, per-frame orchestration and the headless runner.

use std::any::Any;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use log::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::assets::AssetLoader;
use crate::camera::{Camera, MoveDirection};
use crate::input::{FrameInput, InputEvent, InputState, KeyCode, NamedKey};
use crate::render::{NullDevice, WgpuRenderer};
use crate::scene::{desk_scene, Resources, Scene, SceneParameters};

/// Longest frame delta fed to movement and updates, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Simulated frame time for headless runs.
pub const HEADLESS_FRAME_DELTA: f32 = 1.0 / 60.0;

/// Pixel-precise scroll deltas are converted to lines with this factor.
const PIXELS_PER_SCROLL_LINE: f32 = 20.0;

const MOVE_KEYS: [(char, MoveDirection); 6] = [
    ('W', MoveDirection::Forward),
    ('S', MoveDirection::Backward),
    ('A', MoveDirection::Left),
    ('D', MoveDirection::Right),
    ('Q', MoveDirection::Up),
    ('E', MoveDirection::Down),
];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub assets: PathBuf,
    /// Camera travel in units per second.
    pub move_speed: f32,
    /// Degrees of yaw and pitch per pixel of cursor motion.
    pub look_sensitivity: Vec2,
    /// Field-of-view degrees per scroll line.
    pub zoom_step: f32,
    pub camera_position: Vec3,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Desk Scene".to_string(),
            width: 800,
            height: 600,
            assets: PathBuf::from("assets"),
            move_speed: 0.5,
            look_sensitivity: Vec2::new(0.15, 0.15),
            zoom_step: 2.0,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
        }
    }
}

impl AppConfig {
    pub fn camera(&self) -> Camera {
        Camera::new(self.width, self.height, self.camera_position, true)
    }
}

/// Whether the loop keeps going after a frame's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Measures frame deltas. The first tick reports zero.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        delta.min(MAX_FRAME_DELTA)
    }
}

/// Applies one frame of input to the camera.
pub fn handle_input(
    camera: &mut Camera,
    input: &FrameInput,
    config: &AppConfig,
    dt: f32,
) -> AppControl {
    if input.close_requested || input.was_pressed(KeyCode::Named(NamedKey::Escape)) {
        return AppControl::Exit;
    }

    // Minimised windows report a zero-area size.
    if let Some((width, height)) = input.resized.filter(|&(w, h)| w > 0 && h > 0) {
        camera.set_size(width, height);
    }

    if input.was_pressed(KeyCode::Character('P')) {
        camera.set_perspective(!camera.is_perspective());
    }

    let amount = config.move_speed * dt;
    for (key, direction) in MOVE_KEYS {
        if input.is_held(KeyCode::Character(key)) {
            camera.move_by(direction, amount);
        }
    }

    if input.cursor_delta != Vec2::ZERO {
        let look = input.cursor_delta * config.look_sensitivity;
        camera.rotate_by(look.x, look.y);
    }

    if input.scroll != 0.0 {
        camera.increment_zoom(input.scroll * config.zoom_step);
    }

    AppControl::Continue
}

/// Builds the desk against a [`NullDevice`], records `frames` frames and
/// writes a summary to `out`.
pub fn run_headless(config: &AppConfig, frames: u32, out: &mut impl Write) -> Result<()> {
    let assets = AssetLoader::new(&config.assets);
    let mut device = NullDevice::new();
    let mut scene = desk_scene();
    let failures = scene.init(&mut Resources::new(&mut device, &assets));
    let camera = config.camera();

    let mut lights = SceneParameters::default();
    scene.process_lighting(&mut lights);

    writeln!(
        out,
        "Loaded desk scene with {} objects ({} point lights)",
        scene.len(),
        lights.point_lights().len()
    )?;
    for object in scene.objects() {
        let position = object.transform().w_axis;
        writeln!(
            out,
            " - {} pos=({:.2}, {:.2}, {:.2})",
            object.name(),
            position.x,
            position.y,
            position.z
        )?;
    }
    if failures > 0 {
        writeln!(out, "{failures} resource(s) fell back to defaults")?;
    }

    for index in 1..=frames.max(1) {
        let frame = scene.frame(&camera, HEADLESS_FRAME_DELTA);
        writeln!(out, "Frame {index}:")?;
        for (slot, light) in frame.parameters.point_lights().iter().enumerate() {
            writeln!(
                out,
                " light {slot} pos=({:.2}, {:.2}, {:.2}) diffuse=({:.2}, {:.2}, {:.2})",
                light.position.x,
                light.position.y,
                light.position.z,
                light.diffuse.x,
                light.diffuse.y,
                light.diffuse.z
            )?;
        }
        writeln!(
            out,
            " draws={} program_switches={} skipped={}",
            frame.draws.commands().len(),
            frame.draws.program_binds(),
            frame.draws.skipped_draws()
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Opens the window and runs the interactive loop until it exits.
pub fn run_interactive(config: AppConfig) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let mut app = Application::new(config);
    event_loop
        .run_app(&mut app)
        .context("window event loop terminated with error")?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Interactive window state driven by winit.
pub struct Application {
    config: AppConfig,
    scene: Scene,
    camera: Camera,
    input: InputState,
    clock: FrameClock,
    renderer: Option<WgpuRenderer>,
    error: Option<anyhow::Error>,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        let camera = config.camera();
        Self {
            config,
            scene: desk_scene(),
            camera,
            input: InputState::new(),
            clock: FrameClock::new(),
            renderer: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.error = Some(err);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.width as f64,
                self.config.height as f64,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );

        let mut renderer = pollster::block_on(WgpuRenderer::new(window))
            .map_err(|err| WindowInitError::from_error("GPU", err))?;
        info!("rendering with {}", renderer.adapter_name());

        let size = renderer.size();
        self.camera.set_size(size.width, size.height);

        let assets = AssetLoader::new(&self.config.assets);
        self.scene.init(&mut Resources::new(&mut renderer, &assets));
        self.renderer = Some(renderer);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        let input = self.input.take_frame();
        if handle_input(&mut self.camera, &input, &self.config, dt) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        let frame = self.scene.frame(&self.camera, dt);
        let clear = self.scene.clear_color();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match renderer.render(&frame.draws, clear) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU is out of memory"));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
            }
            Err(other) => {
                debug!("skipping frame: {other}");
            }
        }
    }
}

impl ApplicationHandler for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            error!("failed to start: {err:#}");
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if window_id != renderer.window_id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.input.handle(InputEvent::CloseRequested),
            WindowEvent::Resized(size) => {
                renderer.resize(size);
                self.input.handle(InputEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = renderer.window().inner_size();
                renderer.resize(size);
                self.input.handle(InputEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = map_keycode(code) else {
                    return;
                };
                self.input.handle(match event.state {
                    ElementState::Pressed => InputEvent::KeyPressed(key),
                    ElementState::Released => InputEvent::KeyReleased(key),
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.handle(InputEvent::CursorMoved(Vec2::new(
                    position.x as f32,
                    position.y as f32,
                )));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => {
                        position.y as f32 / PIXELS_PER_SCROLL_LINE
                    }
                };
                self.input.handle(InputEvent::Scrolled(lines));
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// The window or GPU could not be brought up.
#[derive(Debug)]
pub struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

/// Maps the physical keys `handle_input` reacts to; everything else is
/// dropped before it reaches [`InputState`].
fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    Some(match code {
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        WinitKey::KeyP => KeyCode::Character('P'),
        WinitKey::KeyW => KeyCode::Character('W'),
        WinitKey::KeyA => KeyCode::Character('A'),
        WinitKey::KeyS => KeyCode::Character('S'),
        WinitKey::KeyD => KeyCode::Character('D'),
        WinitKey::KeyQ => KeyCode::Character('Q'),
        WinitKey::KeyE => KeyCode::Character('E'),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn frame_with(events: &[InputEvent]) -> FrameInput {
        let mut state = InputState::new();
        for event in events {
            state.handle(*event);
        }
        state.take_frame()
    }

    fn bundled_config() -> AppConfig {
        AppConfig {
            assets: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn clock_starts_at_zero_and_clamps_long_frames() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick_at(start), 0.0);
        let dt = clock.tick_at(start + Duration::from_millis(100));
        assert!((dt - 0.1).abs() < 1e-4);
        assert_eq!(clock.tick_at(start + Duration::from_secs(5)), MAX_FRAME_DELTA);
    }

    #[test]
    fn held_w_moves_forward_by_speed_times_delta() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        let input = frame_with(&[InputEvent::KeyPressed(KeyCode::Character('W'))]);
        assert_eq!(handle_input(&mut camera, &input, &config, 1.0), AppControl::Continue);
        assert!(camera
            .position()
            .abs_diff_eq(Vec3::new(0.0, 0.0, 2.5), 1e-5));
    }

    #[test]
    fn q_and_e_move_vertically() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        let up = frame_with(&[InputEvent::KeyPressed(KeyCode::Character('Q'))]);
        handle_input(&mut camera, &up, &config, 0.2);
        assert!((camera.position().y - 0.1).abs() < 1e-5);

        let down = frame_with(&[InputEvent::KeyPressed(KeyCode::Character('E'))]);
        handle_input(&mut camera, &down, &config, 0.2);
        assert!(camera.position().y.abs() < 1e-5);
    }

    #[test]
    fn p_toggles_projection_once_per_press() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        let mut state = InputState::new();
        let p = KeyCode::Character('P');

        state.handle(InputEvent::KeyPressed(p));
        handle_input(&mut camera, &state.take_frame(), &config, 0.0);
        assert!(!camera.is_perspective());

        // Still held on the next frame: no second toggle.
        state.handle(InputEvent::KeyPressed(p));
        handle_input(&mut camera, &state.take_frame(), &config, 0.0);
        assert!(!camera.is_perspective());

        state.handle(InputEvent::KeyReleased(p));
        state.handle(InputEvent::KeyPressed(p));
        handle_input(&mut camera, &state.take_frame(), &config, 0.0);
        assert!(camera.is_perspective());
    }

    #[test]
    fn escape_and_close_exit() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        let escape = frame_with(&[InputEvent::KeyPressed(KeyCode::Named(NamedKey::Escape))]);
        assert_eq!(handle_input(&mut camera, &escape, &config, 0.0), AppControl::Exit);
        let close = frame_with(&[InputEvent::CloseRequested]);
        assert_eq!(handle_input(&mut camera, &close, &config, 0.0), AppControl::Exit);
    }

    #[test]
    fn cursor_and_scroll_drive_look_and_zoom() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        let input = frame_with(&[
            InputEvent::CursorMoved(Vec2::new(100.0, 100.0)),
            InputEvent::CursorMoved(Vec2::new(110.0, 80.0)),
            InputEvent::Scrolled(1.0),
        ]);
        handle_input(&mut camera, &input, &config, 0.0);
        assert!((camera.yaw() - (-90.0 + 1.5)).abs() < 1e-4);
        assert!((camera.pitch() - 3.0).abs() < 1e-4);
        assert_eq!(camera.fov(), 43.0);
    }

    #[test]
    fn resize_updates_the_aspect_ratio() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        let input = frame_with(&[InputEvent::Resized {
            width: 1000,
            height: 500,
        }]);
        handle_input(&mut camera, &input, &config, 0.0);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn zero_area_resize_keeps_previous_size() {
        let config = AppConfig::default();
        let mut camera = config.camera();
        for (width, height) in [(0, 600), (800, 0), (0, 0)] {
            let input = frame_with(&[InputEvent::Resized { width, height }]);
            handle_input(&mut camera, &input, &config, 0.0);
            assert_eq!(camera.size(), (800, 600));
            assert!(camera.projection_matrix().is_finite());
        }
    }

    #[test]
    fn key_map_covers_exactly_the_bound_keys() {
        let bound = [
            (WinitKey::Escape, KeyCode::Named(NamedKey::Escape)),
            (WinitKey::KeyP, KeyCode::Character('P')),
            (WinitKey::KeyW, KeyCode::Character('W')),
            (WinitKey::KeyA, KeyCode::Character('A')),
            (WinitKey::KeyS, KeyCode::Character('S')),
            (WinitKey::KeyD, KeyCode::Character('D')),
            (WinitKey::KeyQ, KeyCode::Character('Q')),
            (WinitKey::KeyE, KeyCode::Character('E')),
        ];
        for (code, key) in bound {
            assert_eq!(map_keycode(code), Some(key));
        }
        for code in [WinitKey::Space, WinitKey::KeyZ, WinitKey::ArrowUp, WinitKey::ShiftLeft] {
            assert_eq!(map_keycode(code), None);
        }
    }

    #[test]
    fn headless_summary_lists_objects_and_lights() {
        let mut out = Vec::new();
        run_headless(&bundled_config(), 2, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Loaded desk scene with 8 objects (2 point lights)"));
        assert!(text.contains(" - computer pos=(0.00, 0.00, 0.25)"));
        assert!(text.contains(" light 0 pos=(-2.00, 1.00, 1.00) diffuse=(1.00, 1.00, 1.00)"));
        assert!(text.contains(" light 1 pos=(2.00, 0.00, 1.00) diffuse=(1.00, 0.00, 0.00)"));
        assert_eq!(text.matches(" draws=16 program_switches=8 skipped=0").count(), 2);
        assert!(!text.contains("fell back"));
    }

    #[test]
    fn headless_survives_missing_assets() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            assets: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let mut out = Vec::new();
        run_headless(&config, 1, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("8 objects (2 point lights)"));
        assert!(text.contains(" draws=0 program_switches=8 skipped=16"));
    }
}

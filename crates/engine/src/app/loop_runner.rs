use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::{load_def_database, resolve_app_paths, ContentPipelineError, StartupError};

use super::input::{InputEvent, InputQueue};
use super::scene::SceneRuntime;
use super::{InputSnapshot, Renderer, Scene, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Mummy Pietree".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to load content database: {0}")]
    ContentPipeline(#[from] ContentPipelineError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        base_content_dir = %app_paths.base_content_dir.display(),
        "startup"
    );
    let def_database = load_def_database(&app_paths)?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let asset_root = app_paths.root.join("assets");
    let mut renderer = Renderer::new(window, asset_root).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    let initial_size = window_for_loop.inner_size();
    let mut input_collector = InputCollector::new(initial_size.width, initial_size.height);
    let mut runtime = SceneRuntime::new(scene);
    runtime.set_def_database(def_database);
    runtime.load();
    info!(
        entity_count = runtime.world().entity_count(),
        "scene_loaded"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut frame_stats = FrameStats::new(metrics_log_interval, last_frame_instant);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        input_collector.set_window_size(new_size.width, new_size.height);
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        input_collector.set_window_size(size.width, size.height);
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input_collector
                            .set_cursor_position_px(position.x as f32, position.y as f32);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input_collector.clear_cursor_position();
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                            && event.state == ElementState::Pressed
                        {
                            input_collector.mark_quit_requested();
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                        accumulator = accumulator.saturating_add(clamped_frame_dt);

                        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                        for _ in 0..step_plan.ticks_to_run {
                            let input_snapshot = input_collector.snapshot_for_tick();
                            runtime.update(fixed_dt_seconds, &input_snapshot);
                            frame_stats.record_tick();
                        }
                        accumulator = step_plan.remaining_accumulator;

                        if step_plan.dropped_backlog > Duration::ZERO {
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame, "sim_clamp_triggered"
                            );
                        }

                        runtime.render();
                        if let Err(error) = renderer.render_world(runtime.world()) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        let next_title = runtime.debug_title();
                        if next_title != last_applied_title {
                            match &next_title {
                                Some(title) => window_for_loop.set_title(title),
                                None => window_for_loop.set_title(&config.window_title),
                            }
                            last_applied_title = next_title;
                        }

                        frame_stats.record_frame();
                        if let Some((fps, tps)) = frame_stats.maybe_rates(now) {
                            info!(
                                fps,
                                tps,
                                entity_count = runtime.world().entity_count(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Turns OS mouse events into buffered pointer events. Each button change is
/// stamped with the cursor position known at that moment, so a press and
/// release inside one frame are both delivered, in order, on the next tick.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    right_mouse_is_down: bool,
    queue: InputQueue,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let Some(position_px) = self.cursor_position_px else {
            // No cursor, no ray. The dropped press must not pair with a later release.
            if state == ElementState::Released {
                self.track_button_state(button, state);
            }
            return;
        };
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                if !self.left_mouse_is_down {
                    self.queue.push(InputEvent::PrimaryPress { position_px });
                }
            }
            (MouseButton::Left, ElementState::Released) => {
                if self.left_mouse_is_down {
                    self.queue.push(InputEvent::PrimaryRelease { position_px });
                }
            }
            (MouseButton::Right, ElementState::Pressed) => {
                if !self.right_mouse_is_down {
                    self.queue.push(InputEvent::SecondaryPress { position_px });
                }
            }
            _ => {}
        }
        self.track_button_state(button, state);
    }

    fn track_button_state(&mut self, button: MouseButton, state: ElementState) {
        let is_down = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left_mouse_is_down = is_down,
            MouseButton::Right => self.right_mouse_is_down = is_down,
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.cursor_position_px,
            self.queue.drain(),
            self.window_width,
            self.window_height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Frame and tick counters reported as rates once per interval.
#[derive(Debug)]
struct FrameStats {
    interval: Duration,
    interval_start: Instant,
    frames: u32,
    ticks: u32,
}

impl FrameStats {
    fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            interval_start: now,
            frames: 0,
            ticks: 0,
        }
    }

    fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    fn maybe_rates(&mut self, now: Instant) -> Option<(f32, f32)> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let rates = (self.frames as f32 / seconds, self.ticks as f32 / seconds);
        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        Some(rates)
    }
}

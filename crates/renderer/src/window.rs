use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use formula::{ExpressionGenerator, FormulaFactory};
use gallery::{FixedStep, GallerySlotManager, GridLayout, ScrollAnimator};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use tracing::{debug, error, info, warn};

use crate::gpu::GpuState;
use crate::types::RendererConfig;

/// Everything the event loop mutates: the window, its GPU state and the
/// gallery bookkeeping driven by the fixed tick.
pub(crate) struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    slots: GallerySlotManager,
    animator: ScrollAnimator,
    layout: GridLayout,
    clock: FixedStep,
    mouse: MouseState,
    last_advance: Instant,
    pixels_per_line: f32,
    viewport_rows: usize,
    dirty: bool,
    retry_pending: bool,
    warned_full: bool,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let factory = FormulaFactory::new(
            ExpressionGenerator::new(config.max_operators),
            config.seed,
            config.preview_formulas,
        );
        let slots = GallerySlotManager::new(
            config.layout.images_per_row,
            config.rows_in_memory,
            factory,
        );
        let display_slots = slots.display_slots().count();
        let gpu = GpuState::new(window.as_ref(), size, config, display_slots)?;

        let viewport_rows = config.layout.rows_per_screen(size.height);
        let mut animator = ScrollAnimator::new(config.scroll);
        animator.set_viewport_rows(viewport_rows);
        info!(
            seed = config.seed,
            capacity = slots.capacity(),
            viewport_rows,
            "gallery ready"
        );

        let mut state = Self {
            window,
            gpu,
            slots,
            animator,
            layout: config.layout,
            clock: FixedStep::new(config.tick_interval),
            mouse: MouseState::default(),
            last_advance: Instant::now(),
            pixels_per_line: config.pixels_per_line.max(f32::EPSILON),
            viewport_rows,
            dirty: true,
            retry_pending: false,
            warned_full: false,
        };
        state.refresh_slots();
        Ok(state)
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        let viewport_rows = self.layout.rows_per_screen(new_size.height);
        if viewport_rows != self.viewport_rows {
            debug!(viewport_rows, "viewport row count changed");
            self.viewport_rows = viewport_rows;
            self.animator.set_viewport_rows(viewport_rows);
            self.refresh_slots();
        }
        self.dirty = true;
    }

    pub(crate) fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / self.pixels_per_line,
        };
        if lines == 0.0 {
            return;
        }
        if !self.animator.is_active() {
            // an idle gallery must not replay the time it spent waiting
            self.clock.reset();
            self.last_advance = Instant::now();
        }
        self.animator.apply_wheel(lines);
    }

    pub(crate) fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.mouse.handle_cursor_moved(position);
    }

    pub(crate) fn handle_mouse_button(&mut self, state: ElementState) {
        if let Some((from, to)) = self.mouse.handle_button(state) {
            debug!(
                from_x = from.x,
                from_y = from.y,
                to_x = to.x,
                to_y = to.y,
                "drag released"
            );
        }
    }

    /// Runs every fixed tick that elapsed since the last call.
    pub(crate) fn advance(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_advance);
        self.last_advance = now;
        let ticks = self.clock.advance(elapsed);
        for _ in 0..ticks {
            if self.animator.tick() {
                self.dirty = true;
            }
            self.refresh_slots();
        }
    }

    /// Whether the loop must wake up again without waiting for input.
    pub(crate) fn needs_ticks(&self) -> bool {
        self.animator.is_active() || self.retry_pending
    }

    pub(crate) fn next_tick_deadline(&self, now: Instant) -> Instant {
        now + self.clock.until_next_tick()
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let height = self.size().height;
        let tiles = self
            .layout
            .place(self.slots.resident(), self.animator.state(), height);
        self.gpu.draw_gallery(&tiles, self.layout.tile_size)
    }

    fn refresh_slots(&mut self) {
        let scroll = *self.animator.state();
        let mut report = self
            .slots
            .ensure_rows_visible(&scroll, self.viewport_rows, &mut self.gpu);

        if report.gallery_full {
            let top = usize::try_from(scroll.rows_scrolled).unwrap_or(usize::MAX);
            if let Some(row) = self.slots.recycle_farthest_hidden(top, self.viewport_rows) {
                debug!(row, "recycled hidden row");
                report = self
                    .slots
                    .ensure_rows_visible(&scroll, self.viewport_rows, &mut self.gpu);
            }
        }
        if report.gallery_full && !self.warned_full {
            warn!(
                capacity = self.slots.capacity(),
                viewport_rows = self.viewport_rows,
                "window shows more rows than the gallery keeps in memory"
            );
            self.warned_full = true;
        }

        self.retry_pending = report.failed > 0;
        if report.changed() {
            self.dirty = true;
        }
    }
}

/// Opens the gallery window and blocks until it is closed.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.window_size.0, config.window_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create gallery window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)
        .map_err(|err| anyhow!("failed to initialise gallery renderer: {err:#}"))?;
    state.window().request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    state.handle_wheel(delta);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.handle_cursor_moved(position);
                }
                WindowEvent::MouseInput {
                    state: button_state,
                    button,
                    ..
                } => {
                    if button == MouseButton::Left {
                        state.handle_mouse_button(button_state);
                    }
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    let _ = inner_size_writer.request_inner_size(state.size());
                }
                WindowEvent::RedrawRequested => match state.render_frame() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.resize(state.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; closing gallery");
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("surface timeout; retrying next frame");
                    }
                    Err(other) => {
                        warn!("surface error: {other:?}; retrying next frame");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            state.advance(now);
            if state.take_dirty() {
                state.window().request_redraw();
            }
            if state.needs_ticks() {
                let deadline = state.next_tick_deadline(now);
                tracing::trace!("gallery: waiting for next tick");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[derive(Default)]
struct MouseState {
    position: Option<PhysicalPosition<f64>>,
    pressed_anchor: Option<PhysicalPosition<f64>>,
}

impl MouseState {
    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.position = Some(position);
    }

    /// Returns the drag endpoints when a press is released.
    fn handle_button(
        &mut self,
        state: ElementState,
    ) -> Option<(PhysicalPosition<f64>, PhysicalPosition<f64>)> {
        match state {
            ElementState::Pressed => {
                self.pressed_anchor = self.position;
                None
            }
            ElementState::Released => {
                let anchor = self.pressed_anchor.take()?;
                Some((anchor, self.position?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_reports_drag_endpoints() {
        let mut mouse = MouseState::default();
        mouse.handle_cursor_moved(PhysicalPosition::new(10.0, 20.0));
        assert!(mouse.handle_button(ElementState::Pressed).is_none());
        mouse.handle_cursor_moved(PhysicalPosition::new(30.0, 5.0));

        let (from, to) = mouse.handle_button(ElementState::Released).unwrap();
        assert_eq!((from.x, from.y), (10.0, 20.0));
        assert_eq!((to.x, to.y), (30.0, 5.0));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut mouse = MouseState::default();
        mouse.handle_cursor_moved(PhysicalPosition::new(1.0, 1.0));
        assert!(mouse.handle_button(ElementState::Released).is_none());
    }

    #[test]
    fn press_before_any_motion_has_no_anchor() {
        let mut mouse = MouseState::default();
        mouse.handle_button(ElementState::Pressed);
        mouse.handle_cursor_moved(PhysicalPosition::new(4.0, 4.0));
        assert!(mouse.handle_button(ElementState::Released).is_none());
    }
}

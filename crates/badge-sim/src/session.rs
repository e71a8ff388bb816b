//! Render/event loop
//!
//! One iteration: composite → map into the window → pace → drain input. The
//! loop checks the termination flag only between iterations, so a quit seen
//! during a frame lets that frame finish and stops the next one from starting.

use std::time::Duration;

use crate::backend::HostBackend;
use crate::canvas::Canvas;
use crate::compositor::Compositor;
use crate::input::{self, HostEvent, KeyHandler};
use crate::pacer::FramePacer;
use crate::state::{LogicalFramebuffer, SimState};
use crate::viewport::{self, ViewportState};

/// Per-session render loop state (texture, layout, pacer, event buffer)
#[derive(Debug)]
pub struct RenderLoop {
    compositor: Compositor,
    viewport: ViewportState,
    pacer: FramePacer,
    frame: LogicalFramebuffer,
    frame_version: u64,
    events: Vec<HostEvent>,
    frames: u64,
}

impl RenderLoop {
    /// Loop paced at `frame_period`
    pub fn new(frame_period: Duration) -> Self {
        Self {
            compositor: Compositor::new(),
            viewport: ViewportState::default(),
            pacer: FramePacer::new(frame_period),
            frame: LogicalFramebuffer::new(),
            frame_version: 0,
            events: Vec::with_capacity(32),
            frames: 0,
        }
    }

    /// Layout state (Uninitialized until the first frame)
    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// Mutable layout state, for forcing a new layout
    pub fn viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.viewport
    }

    /// Frames completed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one full iteration
    pub fn step<B, H>(&mut self, backend: &mut B, state: &SimState, handler: &H)
    where
        B: HostBackend + ?Sized,
        H: KeyHandler + ?Sized,
    {
        self.frame_version = state.copy_frame_if_newer(self.frame_version, &mut self.frame);
        let texture = self.compositor.composite(&self.frame, state.brightness());
        let params = self.viewport.resolve(backend.window_size());
        let led = state.indicator();

        let mut draw = |canvas: &mut Canvas<'_>| viewport::draw_frame(canvas, texture, params, led);
        if let Err(e) = backend.render(&mut draw) {
            tracing::warn!(error = %e, frame = self.frames, "Frame not presented");
        }

        self.pacer.wait();

        backend.poll_events(&mut self.events);
        input::dispatch(self.events.drain(..), handler, state);
        self.frames = self.frames.saturating_add(1);
    }

    /// Iterate until the termination flag is raised. Returns frames rendered.
    pub fn run<B, H>(&mut self, backend: &mut B, state: &SimState, handler: &H) -> u64
    where
        B: HostBackend + ?Sized,
        H: KeyHandler + ?Sized,
    {
        while !state.quit_requested() {
            self.step(backend, state, handler);
        }
        self.frames
    }
}

/// Run the loop to completion, then tear the backend down exactly once.
pub fn run_session<B, H>(
    backend: &mut B,
    state: &SimState,
    handler: &H,
    frame_period: Duration,
) -> u64
where
    B: HostBackend + ?Sized,
    H: KeyHandler + ?Sized,
{
    let mut render_loop = RenderLoop::new(frame_period);
    let frames = render_loop.run(backend, state, handler);
    tracing::info!(frames, "Render loop finished");
    backend.shutdown();
    frames
}

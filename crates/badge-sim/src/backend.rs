//! Host backend abstraction
//!
//! The render loop talks to the host through [`HostBackend`]. The winit +
//! softbuffer implementation lives in the private `window` module;
//! [`HeadlessBackend`] renders into memory for tests and CI.

use std::collections::VecDeque;

use embedded_graphics::prelude::Size;

use crate::canvas::Canvas;
use crate::error::SimError;
use crate::input::HostEvent;

/// Window, renderer and event source used by the render loop
pub trait HostBackend {
    /// Current drawable size of the host window in physical pixels
    fn window_size(&self) -> Size;

    /// Let `draw` paint one frame, then present it
    fn render(&mut self, draw: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), SimError>;

    /// Append every pending host event to `events` without blocking
    fn poll_events(&mut self, events: &mut Vec<HostEvent>);

    /// Release window resources. Only the first call has any effect.
    fn shutdown(&mut self);
}

/// In-memory backend with scripted input
#[derive(Debug)]
pub struct HeadlessBackend {
    size: Size,
    pixels: Vec<u32>,
    scripted: VecDeque<Vec<HostEvent>>,
    frames_presented: u64,
    teardowns: u32,
}

impl HeadlessBackend {
    /// Backend with a window of the given size
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: Vec::new(),
            scripted: VecDeque::new(),
            frames_presented: 0,
            teardowns: 0,
        }
    }

    /// Simulate a host window resize
    pub fn set_window_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Queue events returned by one future [`poll_events`](HostBackend::poll_events) call.
    ///
    /// Polls with nothing queued return no events.
    pub fn script_poll(&mut self, events: Vec<HostEvent>) {
        self.scripted.push_back(events);
    }

    /// Last presented frame, row-major `0xAARRGGBB`
    pub fn frame(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel of the last presented frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = usize::try_from(y.checked_mul(self.size.width)?.checked_add(x)?).ok()?;
        self.pixels.get(idx).copied()
    }

    /// Number of frames presented
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Number of times teardown actually ran
    pub fn teardowns(&self) -> u32 {
        self.teardowns
    }
}

impl HostBackend for HeadlessBackend {
    fn window_size(&self) -> Size {
        self.size
    }

    fn render(&mut self, draw: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), SimError> {
        let needed = usize::try_from(self.size.width.saturating_mul(self.size.height))
            .unwrap_or(usize::MAX);
        self.pixels.resize(needed, 0);
        if let Some(mut canvas) = Canvas::new(&mut self.pixels, self.size) {
            draw(&mut canvas);
        }
        self.frames_presented = self.frames_presented.saturating_add(1);
        Ok(())
    }

    fn poll_events(&mut self, events: &mut Vec<HostEvent>) {
        if let Some(batch) = self.scripted.pop_front() {
            events.extend(batch);
        }
    }

    fn shutdown(&mut self) {
        if self.teardowns == 0 {
            tracing::debug!("Headless backend shut down");
            self.teardowns = 1;
        }
    }
}

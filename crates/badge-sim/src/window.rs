//! Isolated window management layer
//!
//! Based on softbuffer pattern: https://github.com/rust-windowing/softbuffer
//! Follows "isolate the madness" principle - all platform-specific code here.
//!
//! The event loop is never handed over to winit: the render loop owns the
//! main thread and pumps pending events once per frame with a zero timeout.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, Size};
use softbuffer::{Context, Surface};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window as WinitWindow, WindowAttributes, WindowId};

use crate::backend::HostBackend;
use crate::canvas::Canvas;
use crate::config::{SimConfig, MINIMIZE_ON_FOCUS_LOSS_ENV_VAR};
use crate::error::SimError;
use crate::input::{self, HostEvent};

type WinitSurface = Surface<Arc<WinitWindow>, Arc<WinitWindow>>;

/// Pumps allowed for the platform to deliver `resumed` and create the window.
const CREATE_ATTEMPTS: u32 = 10;

/// Whether an env value asks for minimize-on-focus-loss.
pub(crate) fn minimize_requested(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim_start().starts_with('1'))
}

/// Default the minimize-on-focus-loss flag to `0`, never overriding a value
/// the user set. Returns the effective setting.
///
/// With the flag on, Alt-Tab away from the fullscreen simulator pushes it to
/// the bottom of the window stack, where it is tedious to find again.
/// Must run before any other thread is started.
pub(crate) fn sanitize_environment() -> bool {
    sanitize_var(MINIMIZE_ON_FOCUS_LOSS_ENV_VAR)
}

fn sanitize_var(name: &str) -> bool {
    // Any value counts as set, including non-UTF-8 ones.
    let Some(value) = std::env::var_os(name) else {
        std::env::set_var(name, "0");
        return false;
    };
    let on = minimize_requested(Some(&value.to_string_lossy()));
    if on {
        tracing::warn!(
            var = name,
            "Fullscreen window will minimize whenever it loses focus; \
             set this to 0 for sane Alt-Tab behaviour. Proceeding anyway."
        );
    }
    on
}

/// Creates the window from inside `resumed`, as winit requires
struct WindowCreator {
    attributes: Option<WindowAttributes>,
    window: Option<Arc<WinitWindow>>,
    error: Option<String>,
}

impl ApplicationHandler for WindowCreator {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attributes) = self.attributes.take() {
            match event_loop.create_window(attributes) {
                Ok(window) => self.window = Some(Arc::new(window)),
                Err(e) => self.error = Some(e.to_string()),
            }
        }
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, _: WindowEvent) {}
}

/// Collects one frame's worth of translated events
struct EventCollector<'a> {
    events: &'a mut Vec<HostEvent>,
    focus_lost: bool,
}

impl ApplicationHandler for EventCollector<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Window is already created before the render loop starts
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::Focused(false)) {
            self.focus_lost = true;
        }
        if let Some(event) = input::translate(&event) {
            self.events.push(event);
        }
    }
}

#[cfg(unix)]
fn register_interrupt(flag: &Arc<AtomicBool>) {
    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(flag)) {
        tracing::warn!(error = %e, "Ctrl-C will not shut down cleanly");
    }
}

#[cfg(not(unix))]
fn register_interrupt(_flag: &Arc<AtomicBool>) {}

/// winit window + softbuffer surface
pub(crate) struct WinitBackend {
    surface: Option<WinitSurface>,
    window: Option<Arc<WinitWindow>>,
    event_loop: Option<EventLoop<()>>,
    surface_size: Option<(NonZeroU32, NonZeroU32)>,
    minimize_on_focus_loss: bool,
    interrupted: Arc<AtomicBool>,
}

impl WinitBackend {
    /// Bring up event loop, window and renderer, then show one cleared frame.
    ///
    /// Call [`sanitize_environment`] first. Any failure here is fatal.
    pub(crate) fn start(
        config: &SimConfig,
        title: &str,
        minimize_on_focus_loss: bool,
    ) -> Result<Self, SimError> {
        let mut event_loop = EventLoop::new().map_err(SimError::EventLoop)?;
        tracing::debug!("Host event loop initialized");

        let interrupted = Arc::new(AtomicBool::new(false));
        register_interrupt(&interrupted);

        let mut attributes = WindowAttributes::default()
            .with_title(title)
            .with_visible(false)
            .with_resizable(true);
        if !config.fullscreen {
            let (w, h) = config.window_size;
            attributes = attributes.with_inner_size(PhysicalSize::new(w, h));
        }
        let window = create_window(&mut event_loop, attributes)?;
        tracing::debug!(title, "Window created");

        if config.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            tracing::debug!("Window switched to desktop fullscreen");
        }

        let context = Context::new(Arc::clone(&window)).map_err(SimError::Surface)?;
        let surface = Surface::new(&context, Arc::clone(&window)).map_err(SimError::Surface)?;
        tracing::debug!("Renderer created");

        let mut backend = Self {
            surface: Some(surface),
            window: Some(Arc::clone(&window)),
            event_loop: Some(event_loop),
            surface_size: None,
            minimize_on_focus_loss,
            interrupted,
        };

        window.set_visible(true);
        let mut clear = |canvas: &mut Canvas<'_>| {
            let _ = canvas.clear(Rgb888::BLACK);
        };
        if let Err(e) = backend.render(&mut clear) {
            tracing::warn!(error = %e, "Initial clear not presented");
        }
        tracing::info!("Simulator window ready");
        Ok(backend)
    }

    fn minimize_if_fullscreen(&self) {
        if let Some(window) = &self.window {
            if window.fullscreen().is_some() {
                window.set_minimized(true);
            }
        }
    }
}

fn create_window(
    event_loop: &mut EventLoop<()>,
    attributes: WindowAttributes,
) -> Result<Arc<WinitWindow>, SimError> {
    let mut creator = WindowCreator {
        attributes: Some(attributes),
        window: None,
        error: None,
    };
    for _ in 0..CREATE_ATTEMPTS {
        let _ = event_loop.pump_app_events(Some(Duration::from_millis(1)), &mut creator);
        if let Some(window) = creator.window.take() {
            return Ok(window);
        }
        if let Some(error) = creator.error.take() {
            return Err(SimError::Window(error));
        }
    }
    Err(SimError::Window("event loop never resumed".into()))
}

impl HostBackend for WinitBackend {
    fn window_size(&self) -> Size {
        self.window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                Size::new(size.width, size.height)
            })
            .unwrap_or_default()
    }

    fn render(&mut self, draw: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), SimError> {
        let (Some(window), Some(surface)) = (self.window.as_ref(), self.surface.as_mut()) else {
            return Ok(());
        };
        let size = window.inner_size();
        // Minimized windows report a zero size; nothing to draw into.
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return Ok(());
        };
        if self.surface_size != Some((w, h)) {
            surface.resize(w, h).map_err(SimError::Surface)?;
            self.surface_size = Some((w, h));
        }

        let mut buffer = surface.buffer_mut().map_err(SimError::Present)?;
        if let Some(mut canvas) = Canvas::new(&mut buffer, Size::new(w.get(), h.get())) {
            draw(&mut canvas);
        }
        buffer.present().map_err(SimError::Present)
    }

    fn poll_events(&mut self, events: &mut Vec<HostEvent>) {
        let mut focus_lost = false;
        if let Some(event_loop) = self.event_loop.as_mut() {
            let mut collector = EventCollector {
                events: &mut *events,
                focus_lost: false,
            };
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut collector)
            {
                tracing::debug!(code, "Host event loop exited");
                collector.events.push(HostEvent::Quit);
            }
            focus_lost = collector.focus_lost;
        }

        if focus_lost && self.minimize_on_focus_loss {
            self.minimize_if_fullscreen();
        }
        if self.interrupted.swap(false, Ordering::AcqRel) {
            tracing::info!("Interrupt received");
            events.push(HostEvent::Quit);
        }
    }

    fn shutdown(&mut self) {
        if self.window.is_none() && self.event_loop.is_none() {
            return;
        }
        // Creation-reverse order: renderer, window, event loop.
        drop(self.surface.take());
        tracing::debug!("Renderer destroyed");
        if let Some(window) = self.window.take() {
            window.set_visible(false);
            drop(window);
            tracing::debug!("Window destroyed");
        }
        drop(self.event_loop.take());
        tracing::debug!("Event and video subsystems shut down");
        tracing::info!("Host backend closed");
    }
}

impl Drop for WinitBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Dual-thread coordinator
//!
//! Firmware runs on a worker thread; the render/event loop owns the main
//! thread (several window systems only deliver events there). When the loop
//! ends the backend is torn down and the process exits; the worker is not
//! joined, so firmware that never returns is simply cut off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::badge::Badge;
use crate::buttons::ButtonState;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::input::KeyRouter;
use crate::logging;
use crate::session;
use crate::state::SimState;
use crate::window::{self, WinitBackend};

/// Set by the first session in this process.
static STARTED: AtomicBool = AtomicBool::new(false);

/// Program name used for the window title when `argv` is empty.
const DEFAULT_PROGRAM: &str = "badge";

/// Runs firmware against the simulated badge
pub struct Simulator<F> {
    config: SimConfig,
    firmware: F,
}

impl<F> Simulator<F>
where
    F: FnOnce(Badge, Vec<String>) -> i32 + Send + 'static,
{
    /// Simulator that will call `firmware` as its entry point
    pub fn new(config: SimConfig, firmware: F) -> Self {
        Self { config, firmware }
    }

    /// Start firmware, run the window until quit, then exit the process.
    ///
    /// Exit status is 0 after a quit request and 1 after a startup failure.
    /// Must be called from the main thread, at most once per process.
    pub fn run(self, args: Vec<String>) -> ! {
        logging::init();
        let code = exit_code(self.session(args));
        std::process::exit(code)
    }

    fn session(self, args: Vec<String>) -> Result<(), SimError> {
        if STARTED.swap(true, Ordering::SeqCst) {
            return Err(SimError::AlreadyRunning);
        }

        // Environment edits must happen before the worker thread exists.
        let minimize_on_focus_loss = window::sanitize_environment();

        let state = Arc::new(SimState::new());
        let keys = Arc::new(KeyRouter::new(Arc::new(ButtonState::new())));
        let badge = Badge::new(Arc::clone(&state), Arc::clone(&keys));

        let program = args.first().map_or(DEFAULT_PROGRAM, String::as_str);
        let title = self.config.window_title(program);

        spawn_firmware(self.firmware, badge, args)?;

        let mut backend = WinitBackend::start(&self.config, &title, minimize_on_focus_loss)?;
        tracing::info!(
            period_ms = u64::try_from(self.config.frame_period.as_millis()).unwrap_or(u64::MAX),
            fullscreen = self.config.fullscreen,
            "Simulator running"
        );
        session::run_session(&mut backend, &state, &*keys, self.config.frame_period);
        Ok(())
    }
}

/// Process exit status for a finished session; reports fatal errors on stderr.
fn exit_code(result: Result<(), SimError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) if e.is_fatal() => {
            tracing::debug!(error = ?e, "Fatal startup failure");
            eprintln!("{e}");
            1
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session ended after a non-fatal error");
            0
        }
    }
}

fn spawn_firmware<F>(firmware: F, badge: Badge, args: Vec<String>) -> Result<(), SimError>
where
    F: FnOnce(Badge, Vec<String>) -> i32 + Send + 'static,
{
    std::thread::Builder::new()
        .name("firmware".into())
        .spawn(move || {
            let code = firmware(badge, args);
            tracing::info!(code, "Firmware main returned");
        })
        .map(drop)
        .map_err(SimError::WorkerSpawn)
}

//! Badge Hardware Simulator
//!
//! Desktop stand-in for the badge's display, flare LED and buttons, so badge
//! firmware can run and be tested on a workstation without target hardware.
//!
//! # Architecture
//!
//! ```text
//! firmware thread                      render thread (main)
//! ───────────────                      ────────────────────
//! Badge::display() ─ flush() ──▶ SimState ──▶ Compositor ──▶ Viewport mapper ──▶ window
//! Badge::flare_led()  ─────────▶    │                                    │
//! Badge::buttons()  ◀── KeyRouter ◀─┴──── input translator ◀── host events ◀┘
//!                                             ▲
//!                                        frame pacer (30 Hz)
//! ```
//!
//! - Window management (winit + softbuffer)
//! - Logical RGB framebuffer with embedded-graphics integration
//! - Brightness emulation and flare LED swatch
//! - Headless backend for CI
//!
//! # Example
//!
//! ```no_run
//! use badge_sim::{Badge, SimConfig, Simulator};
//! use embedded_graphics::pixelcolor::Rgb888;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
//!
//! fn firmware_main(mut badge: Badge, _args: Vec<String>) -> i32 {
//!     Rectangle::new(Point::new(10, 10), Size::new(50, 30))
//!         .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
//!         .draw(badge.display())
//!         .ok();
//!     badge.flush();
//!     badge.flare_led(0, 255, 0);
//!     0
//! }
//!
//! Simulator::new(SimConfig::from_env(), firmware_main).run(std::env::args().collect());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod backend;
pub mod badge;
pub mod buttons;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod hal;
pub mod input;
pub mod logging;
pub mod pacer;
pub mod session;
pub mod simulator;
pub mod state;
pub mod viewport;
mod window;

pub use backend::{HeadlessBackend, HostBackend};
pub use badge::Badge;
pub use buttons::{Button, ButtonState};
pub use canvas::Canvas;
pub use compositor::{CompositedFramebuffer, Compositor};
pub use config::{SimConfig, FRAME_RATE_HZ, LCD_XSIZE, LCD_YSIZE};
pub use error::SimError;
pub use input::{HostEvent, KeyHandler, KeyRouter, Keysym};
pub use pacer::FramePacer;
pub use session::RenderLoop;
pub use simulator::Simulator;
pub use state::{IndicatorColor, LogicalFramebuffer, SimState};
pub use viewport::{ViewportParams, ViewportState};

//! State shared between the firmware thread and the render thread
//!
//! | Field        | Writer          | Reader        | Synchronisation                         |
//! |--------------|-----------------|---------------|-----------------------------------------|
//! | framebuffer  | firmware flush  | render, 1×/frame | `Mutex` front slot + `AtomicU64` version |
//! | brightness   | firmware        | render, 1×/frame | `AtomicU8`, last write wins           |
//! | indicator    | firmware        | render, 1×/frame | `AtomicU32` packed RGB, last write wins |
//! | quit         | render (input)  | render, firmware | `AtomicBool`, set once               |
//!
//! The firmware never draws into the front slot directly: it draws into its own
//! [`LogicalFramebuffer`] and publishes a complete frame with
//! [`SimState::publish_frame`], so the render thread never observes a torn frame.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};

use crate::config::{LCD_XSIZE, LCD_YSIZE};

/// Number of pixels on the LCD.
// LCD dimensions are small compile-time constants; the product cannot overflow.
#[allow(clippy::arithmetic_side_effects)]
pub const LCD_PIXELS: usize = (LCD_XSIZE * LCD_YSIZE) as usize;

/// Firmware view of the LCD: `LCD_XSIZE × LCD_YSIZE` pixels of (red, green, blue)
#[derive(Clone, PartialEq, Eq)]
pub struct LogicalFramebuffer {
    pixels: Vec<[u8; 3]>,
}

impl core::fmt::Debug for LogicalFramebuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogicalFramebuffer")
            .field("width", &LCD_XSIZE)
            .field("height", &LCD_YSIZE)
            .finish_non_exhaustive()
    }
}

impl LogicalFramebuffer {
    /// Create a black framebuffer
    pub fn new() -> Self {
        Self {
            pixels: vec![[0, 0, 0]; LCD_PIXELS],
        }
    }

    // x < LCD_XSIZE and y < LCD_YSIZE, so the index is below LCD_PIXELS.
    #[allow(clippy::arithmetic_side_effects)]
    fn index(x: u32, y: u32) -> Option<usize> {
        if x < LCD_XSIZE && y < LCD_YSIZE {
            Some((y * LCD_XSIZE + x) as usize)
        } else {
            None
        }
    }

    /// Set pixel at coordinates (out-of-range writes are ignored)
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if let Some(px) = Self::index(x, y).and_then(|i| self.pixels.get_mut(i)) {
            *px = rgb;
        }
    }

    /// Get pixel at coordinates
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        Self::index(x, y).and_then(|i| self.pixels.get(i)).copied()
    }

    /// Fill the whole framebuffer with one colour
    pub fn fill(&mut self, rgb: [u8; 3]) {
        self.pixels.fill(rgb);
    }

    /// Row-major pixel slice
    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }
}

impl Default for LogicalFramebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for LogicalFramebuffer {
    fn size(&self) -> Size {
        Size::new(LCD_XSIZE, LCD_YSIZE)
    }
}

impl DrawTarget for LogicalFramebuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set_pixel(x, y, [color.r(), color.g(), color.b()]);
            }
        }
        Ok(())
    }
}

/// Colour of the simulated flare LED
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IndicatorColor {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl IndicatorColor {
    /// LED off
    pub const OFF: Self = Self::new(0, 0, 0);

    /// Create from channels
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    fn pack(self) -> u32 {
        u32::from_be_bytes([0, self.red, self.green, self.blue])
    }

    fn unpack(word: u32) -> Self {
        let [_, red, green, blue] = word.to_be_bytes();
        Self { red, green, blue }
    }
}

impl From<IndicatorColor> for Rgb888 {
    fn from(c: IndicatorColor) -> Self {
        Rgb888::new(c.red, c.green, c.blue)
    }
}

/// Brightness at startup (full).
pub const DEFAULT_BRIGHTNESS: u8 = 255;

/// Shared simulator state, passed by `Arc` to both threads
#[derive(Debug)]
pub struct SimState {
    front: Mutex<LogicalFramebuffer>,
    frame_version: AtomicU64,
    brightness: AtomicU8,
    indicator: AtomicU32,
    quit: AtomicBool,
}

impl SimState {
    /// Black screen, full brightness, LED off, not quitting
    pub fn new() -> Self {
        Self {
            front: Mutex::new(LogicalFramebuffer::new()),
            frame_version: AtomicU64::new(0),
            brightness: AtomicU8::new(DEFAULT_BRIGHTNESS),
            indicator: AtomicU32::new(IndicatorColor::OFF.pack()),
            quit: AtomicBool::new(false),
        }
    }

    // A panic while holding the lock leaves a fully-initialised buffer behind,
    // so a poisoned slot is still usable.
    fn front(&self) -> MutexGuard<'_, LogicalFramebuffer> {
        self.front.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a complete frame for the render thread
    pub fn publish_frame(&self, frame: &LogicalFramebuffer) {
        let mut front = self.front();
        front.pixels.copy_from_slice(&frame.pixels);
        self.frame_version.fetch_add(1, Ordering::Release);
    }

    /// Number of frames published so far
    pub fn frame_version(&self) -> u64 {
        self.frame_version.load(Ordering::Acquire)
    }

    /// Copy the published frame into `dst` if it is newer than `seen`.
    ///
    /// Returns the version now held by `dst`.
    pub fn copy_frame_if_newer(&self, seen: u64, dst: &mut LogicalFramebuffer) -> u64 {
        if self.frame_version() == seen {
            return seen;
        }
        let front = self.front();
        // Read under the lock so the version matches the copied pixels.
        let version = self.frame_version();
        dst.pixels.copy_from_slice(&front.pixels);
        version
    }

    /// Set LCD brightness (0 = dark, 255 = full)
    pub fn set_brightness(&self, level: u8) {
        self.brightness.store(level, Ordering::Relaxed);
    }

    /// Current LCD brightness
    pub fn brightness(&self) -> u8 {
        self.brightness.load(Ordering::Relaxed)
    }

    /// Set the flare LED colour
    pub fn set_indicator(&self, color: IndicatorColor) {
        self.indicator.store(color.pack(), Ordering::Relaxed);
    }

    /// Current flare LED colour
    pub fn indicator(&self) -> IndicatorColor {
        IndicatorColor::unpack(self.indicator.load(Ordering::Relaxed))
    }

    /// Raise the termination flag.
    ///
    /// Returns `true` only for the call that changed it from `false`.
    pub fn request_quit(&self) -> bool {
        !self.quit.swap(true, Ordering::AcqRel)
    }

    /// Whether a quit has been requested
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use std::sync::Arc;

    #[test]
    fn framebuffer_ignores_out_of_range() {
        let mut fb = LogicalFramebuffer::new();
        fb.set_pixel(LCD_XSIZE, 0, [1, 2, 3]);
        fb.set_pixel(0, LCD_YSIZE, [1, 2, 3]);
        assert!(fb.pixels().iter().all(|p| *p == [0, 0, 0]));
        assert_eq!(fb.pixel(LCD_XSIZE, 0), None);
    }

    #[test]
    fn framebuffer_is_a_draw_target() {
        let mut fb = LogicalFramebuffer::new();
        Rectangle::new(Point::new(-5, -5), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::new(200, 100, 50)))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.pixel(0, 0), Some([200, 100, 50]));
        assert_eq!(fb.pixel(4, 4), Some([200, 100, 50]));
        assert_eq!(fb.pixel(5, 5), Some([0, 0, 0]));
    }

    #[test]
    fn indicator_round_trips_through_atomic() {
        let state = SimState::new();
        assert_eq!(state.indicator(), IndicatorColor::OFF);
        state.set_indicator(IndicatorColor::new(10, 20, 30));
        assert_eq!(state.indicator(), IndicatorColor::new(10, 20, 30));
    }

    #[test]
    fn brightness_defaults_to_full() {
        let state = SimState::new();
        assert_eq!(state.brightness(), 255);
        state.set_brightness(128);
        assert_eq!(state.brightness(), 128);
    }

    #[test]
    fn quit_is_idempotent() {
        let state = SimState::new();
        assert!(!state.quit_requested());
        assert!(state.request_quit());
        assert!(!state.request_quit());
        assert!(state.quit_requested());
    }

    #[test]
    fn copy_only_when_newer() {
        let state = SimState::new();
        let mut back = LogicalFramebuffer::new();
        back.fill([9, 9, 9]);
        state.publish_frame(&back);

        let mut seen = LogicalFramebuffer::new();
        let v = state.copy_frame_if_newer(0, &mut seen);
        assert_eq!(v, 1);
        assert_eq!(seen.pixel(3, 3), Some([9, 9, 9]));

        // Unchanged version: destination left alone.
        seen.fill([1, 1, 1]);
        assert_eq!(state.copy_frame_if_newer(v, &mut seen), 1);
        assert_eq!(seen.pixel(3, 3), Some([1, 1, 1]));
    }

    #[test]
    fn published_frames_are_never_torn() {
        let state = Arc::new(SimState::new());
        let writer = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                let mut fb = LogicalFramebuffer::new();
                for i in 0..200u8 {
                    fb.fill([i, i, i]);
                    state.publish_frame(&fb);
                }
            })
        };

        let mut seen = 0;
        let mut copy = LogicalFramebuffer::new();
        while !writer.is_finished() {
            seen = state.copy_frame_if_newer(seen, &mut copy);
            let first = copy.pixels()[0];
            assert!(copy.pixels().iter().all(|p| *p == first));
        }
        writer.join().unwrap();
    }
}

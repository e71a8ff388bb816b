//! LCD compositing: RGB framebuffer → brightness-scaled BGRA texture
//!
//! The host surface takes `0xAARRGGBB` words. Stored little-endian, such a
//! word is the byte sequence `[B, G, R, A]`, so the composited buffer keeps
//! bytes in that order: output channel 0 ← input blue, 1 ← green, 2 ← red,
//! 3 = opaque alpha.

use crate::config::{LCD_XSIZE, LCD_YSIZE};
use crate::state::{LogicalFramebuffer, LCD_PIXELS};

/// Alpha written for every composited pixel.
pub const OPAQUE: u8 = 255;

/// Scale one colour channel by `brightness / 255`, rounded to nearest.
pub fn scale_channel(brightness: u8, value: u8) -> u8 {
    // 255 * 255 + 127 fits in u16, and the quotient is at most 255.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    let scaled = ((u16::from(brightness) * u16::from(value) + 127) / 255) as u8;
    scaled
}

/// Composite one RGB pixel into host BGRA byte order.
pub fn composite_pixel(rgb: [u8; 3], brightness: u8) -> [u8; 4] {
    let [r, g, b] = rgb;
    [
        scale_channel(brightness, b),
        scale_channel(brightness, g),
        scale_channel(brightness, r),
        OPAQUE,
    ]
}

/// LCD-sized buffer of BGRA pixels ready for the host surface
#[derive(Clone, PartialEq, Eq)]
pub struct CompositedFramebuffer {
    pixels: Vec<[u8; 4]>,
}

impl core::fmt::Debug for CompositedFramebuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompositedFramebuffer")
            .field("width", &LCD_XSIZE)
            .field("height", &LCD_YSIZE)
            .finish_non_exhaustive()
    }
}

impl CompositedFramebuffer {
    fn new() -> Self {
        Self {
            pixels: vec![[0, 0, 0, OPAQUE]; LCD_PIXELS],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        LCD_XSIZE
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        LCD_YSIZE
    }

    /// BGRA bytes of the pixel at coordinates
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= LCD_XSIZE || y >= LCD_YSIZE {
            return None;
        }
        let idx = usize::try_from(y.checked_mul(LCD_XSIZE)?.checked_add(x)?).ok()?;
        self.pixels.get(idx).copied()
    }

    /// Pixel as a host surface word (`0xAARRGGBB`)
    pub fn argb(&self, x: u32, y: u32) -> Option<u32> {
        self.pixel(x, y).map(u32::from_le_bytes)
    }

    /// Row-major BGRA pixels
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }
}

/// Per-frame compositor; owns the texture it writes into
#[derive(Debug)]
pub struct Compositor {
    texture: CompositedFramebuffer,
}

impl Compositor {
    /// Allocate the LCD-sized texture
    pub fn new() -> Self {
        Self {
            texture: CompositedFramebuffer::new(),
        }
    }

    /// Recompute the texture from `src` at the given brightness
    pub fn composite(&mut self, src: &LogicalFramebuffer, brightness: u8) -> &CompositedFramebuffer {
        for (out, rgb) in self.texture.pixels.iter_mut().zip(src.pixels()) {
            *out = composite_pixel(*rgb, brightness);
        }
        &self.texture
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

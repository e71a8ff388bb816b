//! Software rasterizer over a host surface buffer
//!
//! Pixels are `0xAARRGGBB` words, row-major, `width × height`. Drawing outside
//! the buffer is clipped silently.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::compositor::CompositedFramebuffer;

/// Convert an embedded-graphics colour to an opaque surface word
pub fn to_argb(color: Rgb888) -> u32 {
    u32::from_be_bytes([0xFF, color.r(), color.g(), color.b()])
}

/// Drawing target borrowing one frame of host surface memory
pub struct Canvas<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Wrap a surface buffer. Returns `None` if the buffer is smaller than `size`.
    pub fn new(pixels: &'a mut [u32], size: Size) -> Option<Self> {
        let needed = usize::try_from(size.width.checked_mul(size.height)?).ok()?;
        let pixels = pixels.get_mut(..needed)?;
        Some(Self {
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(y).ok().filter(|y| *y < self.height)?;
        usize::try_from(y.checked_mul(self.width)?.checked_add(x)?).ok()
    }

    /// Surface word at coordinates
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).and_then(|i| self.pixels.get(i)).copied()
    }

    fn put(&mut self, x: i32, y: i32, word: u32) {
        if let Some(px) = self.index(x, y).and_then(|i| self.pixels.get_mut(i)) {
            *px = word;
        }
    }

    /// Nearest-neighbour scale `texture` into `dst`, clipped to the canvas
    pub fn blit_scaled(&mut self, texture: &CompositedFramebuffer, dst: Rectangle) {
        let (dw, dh) = (dst.size.width, dst.size.height);
        if dw == 0 || dh == 0 {
            return;
        }
        let (sw, sh) = (u64::from(texture.width()), u64::from(texture.height()));
        for dy in 0..dh {
            // dy < dh, so sy < sh: the quotient always fits back into u32.
            #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
            let sy = (u64::from(dy) * sh / u64::from(dh)) as u32;
            let Some(y) = i32::try_from(dy).ok().and_then(|dy| dst.top_left.y.checked_add(dy)) else {
                break;
            };
            if y < 0 {
                continue;
            }
            if u32::try_from(y).map_or(true, |y| y >= self.height) {
                break;
            }
            for dx in 0..dw {
                #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
                let sx = (u64::from(dx) * sw / u64::from(dw)) as u32;
                let Some(x) = i32::try_from(dx).ok().and_then(|dx| dst.top_left.x.checked_add(dx)) else {
                    break;
                };
                if let Some(word) = texture.argb(sx, sy) {
                    self.put(x, y, word);
                }
            }
        }
    }
}

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            self.put(x, y, to_argb(color));
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(to_argb(color));
        Ok(())
    }
}

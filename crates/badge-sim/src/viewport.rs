//! Viewport mapping: where the LCD lands in the host window, plus the LED panel
//!
//! Layout is computed once from the window size seen on the first frame and
//! then held; later host resizes do not move the LCD. Firmware or tooling may
//! force a new layout with [`ViewportState::recompute`] or [`ViewportState::set`].
//!
//! ```text
//!  ┌──────────────────────────── window ─────────────────────────────┐
//!  │   ┌────────────────┐                                            │
//!  │   │                │    L E D                                   │
//!  │   │   LCD × scale  │    ┌─────┐                                 │
//!  │   │                │    │swatch│                                │
//!  │   └────────────────┘    └─────┘                                 │
//!  └─────────────────────────────────────────────────────────────────┘
//! ```

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, Point, Primitive, Size};
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::Drawable;

use crate::canvas::Canvas;
use crate::compositor::CompositedFramebuffer;
use crate::config::{LCD_XSIZE, LCD_YSIZE};
use crate::state::IndicatorColor;

/// Empty space kept around the LCD on every side.
pub const MARGIN: u32 = 20;
/// Horizontal space reserved right of the LCD for the LED label and swatch.
pub const LED_PANEL_WIDTH: u32 = 91;
/// Gap between the LCD's right edge and the LED label.
pub const LED_GAP: i32 = 20;
/// Edge length of the LED swatch.
pub const SWATCH_SIZE: u32 = 51;
/// Horizontal advance between label letters.
const LETTER_SPACING: i32 = 12;

/// Target rectangle of the LCD image inside the host window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportParams {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Scaled width (> 0)
    pub width: u32,
    /// Scaled height (> 0)
    pub height: u32,
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

impl ViewportParams {
    /// Default layout for a window of the given size.
    ///
    /// Largest integer scale that leaves [`MARGIN`] around the LCD and room for
    /// the LED panel; windows too small for scale 1 get a fractional aspect fit.
    pub fn default_for(window: Size) -> Self {
        let reserved_w = MARGIN.saturating_mul(2).saturating_add(LED_PANEL_WIDTH);
        let avail_w = window.width.saturating_sub(reserved_w);
        let avail_h = window.height.saturating_sub(MARGIN.saturating_mul(2));

        let scale = (avail_w / LCD_XSIZE).min(avail_h / LCD_YSIZE);
        let (width, height) = if scale >= 1 {
            (LCD_XSIZE.saturating_mul(scale), LCD_YSIZE.saturating_mul(scale))
        } else {
            aspect_fit(avail_w.max(1), avail_h.max(1))
        };

        let x = window
            .width
            .saturating_sub(width.saturating_add(LED_PANEL_WIDTH))
            / 2;
        let y = window.height.saturating_sub(height) / 2;
        Self {
            x: to_i32(x),
            y: to_i32(y),
            width,
            height,
        }
    }

    /// Destination rectangle for the LCD blit
    pub fn rect(&self) -> Rectangle {
        Rectangle::new(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }

    /// Rectangle whose one-pixel edge sits immediately outside the LCD image
    pub fn border_rect(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x.saturating_sub(1), self.y.saturating_sub(1)),
            Size::new(self.width.saturating_add(2), self.height.saturating_add(2)),
        )
    }

    /// Baseline-left point of the "LED" label
    pub fn led_label_origin(&self) -> Point {
        Point::new(
            self.x.saturating_add(to_i32(self.width)).saturating_add(LED_GAP),
            self.y
                .saturating_add(to_i32(self.height / 2))
                .saturating_sub(20),
        )
    }

    /// LED swatch rectangle, below the label
    pub fn swatch_rect(&self) -> Rectangle {
        let origin = self.led_label_origin();
        Rectangle::new(
            Point::new(origin.x, origin.y.saturating_add(20)),
            Size::new(SWATCH_SIZE, SWATCH_SIZE),
        )
    }
}

/// Largest `LCD_XSIZE:LCD_YSIZE` box inside `w × h`, at least 1×1
fn aspect_fit(w: u32, h: u32) -> (u32, u32) {
    let (w64, h64) = (u64::from(w), u64::from(h));
    let (lx, ly) = (u64::from(LCD_XSIZE), u64::from(LCD_YSIZE));
    // Products of u32 values fit in u64; the quotients are bounded by w / h.
    #[allow(clippy::arithmetic_side_effects)]
    let fitted = if w64 * ly <= h64 * lx {
        (w64, w64 * ly / lx)
    } else {
        (h64 * lx / ly, h64)
    };
    (
        u32::try_from(fitted.0).unwrap_or(w).max(1),
        u32::try_from(fitted.1).unwrap_or(h).max(1),
    )
}

/// One-time layout state: computed from the first frame's window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewportState {
    /// No frame drawn yet
    #[default]
    Uninitialized,
    /// Layout fixed for the rest of the run
    Computed(ViewportParams),
}

impl ViewportState {
    /// Current layout, computing it from `window` on the first call only
    pub fn resolve(&mut self, window: Size) -> ViewportParams {
        match *self {
            Self::Computed(params) => params,
            Self::Uninitialized => {
                let params = ViewportParams::default_for(window);
                tracing::debug!(
                    window_w = window.width,
                    window_h = window.height,
                    x = params.x,
                    y = params.y,
                    w = params.width,
                    h = params.height,
                    "Viewport computed"
                );
                *self = Self::Computed(params);
                params
            }
        }
    }

    /// Layout if already computed
    pub fn params(&self) -> Option<ViewportParams> {
        match self {
            Self::Computed(params) => Some(*params),
            Self::Uninitialized => None,
        }
    }

    /// Re-derive the default layout for a new window size
    pub fn recompute(&mut self, window: Size) -> ViewportParams {
        *self = Self::Uninitialized;
        self.resolve(window)
    }

    /// Override the layout
    pub fn set(&mut self, params: ViewportParams) {
        *self = Self::Computed(params);
    }
}

fn stroke(color: Rgb888) -> PrimitiveStyle<Rgb888> {
    PrimitiveStyleBuilder::new()
        .stroke_color(color)
        .stroke_width(1)
        .stroke_alignment(StrokeAlignment::Inside)
        .build()
}

/// Literally draws L E D with line segments, letters 10 px tall above `origin`
fn draw_led_label<D>(target: &mut D, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let style = PrimitiveStyle::with_stroke(Rgb888::WHITE, 1);
    let seg = |x0: i32, y0: i32, x1: i32, y1: i32| {
        Line::new(Point::new(x0, y0), Point::new(x1, y1)).into_styled(style)
    };
    let Point { x, y } = origin;
    let (top, mid) = (y.saturating_sub(10), y.saturating_sub(5));

    // L
    seg(x, y, x, top).draw(target)?;
    seg(x, y, x.saturating_add(8), y).draw(target)?;

    // E
    let x = x.saturating_add(LETTER_SPACING);
    seg(x, y, x, top).draw(target)?;
    seg(x, y, x.saturating_add(8), y).draw(target)?;
    seg(x, mid, x.saturating_add(5), mid).draw(target)?;
    seg(x, top, x.saturating_add(8), top).draw(target)?;

    // D
    let x = x.saturating_add(LETTER_SPACING);
    let (x8, x10) = (x.saturating_add(8), x.saturating_add(10));
    seg(x, y, x, top).draw(target)?;
    seg(x, y, x8, y).draw(target)?;
    seg(x, top, x8, top).draw(target)?;
    seg(x8, top, x10, mid).draw(target)?;
    seg(x8, y, x10, mid).draw(target)?;
    Ok(())
}

/// Draw one complete frame: LCD image, border, LED label and swatch
pub fn draw_frame(
    canvas: &mut Canvas<'_>,
    texture: &CompositedFramebuffer,
    viewport: ViewportParams,
    led: IndicatorColor,
) {
    // Canvas drawing is infallible.
    let _ = canvas.clear(Rgb888::BLACK);
    canvas.blit_scaled(texture, viewport.rect());
    let _ = viewport.border_rect().into_styled(stroke(Rgb888::WHITE)).draw(canvas);
    let _ = draw_led_label(canvas, viewport.led_label_origin());

    let swatch = PrimitiveStyleBuilder::new()
        .fill_color(Rgb888::from(led))
        .stroke_color(Rgb888::WHITE)
        .stroke_width(1)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    let _ = viewport.swatch_rect().into_styled(swatch).draw(canvas);
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss
)]
mod tests {
    use super::*;
    use crate::canvas::to_argb;
    use crate::compositor::Compositor;
    use crate::state::LogicalFramebuffer;

    #[test]
    fn layout_for_1024x768() {
        let p = ViewportParams::default_for(Size::new(1024, 768));
        assert_eq!(
            p,
            ViewportParams {
                x: 136,
                y: 54,
                width: 660,
                height: 660
            }
        );
    }

    #[test]
    fn layout_fits_inside_window() {
        for (w, h) in [(1920, 1080), (300, 200), (133, 133), (10, 10), (1, 1)] {
            let p = ViewportParams::default_for(Size::new(w, h));
            assert!(p.width > 0 && p.height > 0, "{w}x{h}: {p:?}");
            assert!(p.x >= 0 && p.y >= 0);
            assert!(p.x as u32 + p.width <= w, "{w}x{h}: {p:?}");
            assert!(p.y as u32 + p.height <= h, "{w}x{h}: {p:?}");
        }
    }

    #[test]
    fn small_window_uses_aspect_fit() {
        let p = ViewportParams::default_for(Size::new(200, 150));
        // 200 - 131 = 69 wide, 150 - 40 = 110 tall → width-limited square
        assert_eq!((p.width, p.height), (69, 69));
    }

    #[test]
    fn state_computes_once() {
        let mut state = ViewportState::default();
        assert_eq!(state.params(), None);
        let first = state.resolve(Size::new(1024, 768));
        let later = state.resolve(Size::new(640, 480));
        assert_eq!(first, later);
        assert_eq!(state.params(), Some(first));
    }

    #[test]
    fn recompute_and_set() {
        let mut state = ViewportState::default();
        state.resolve(Size::new(1024, 768));
        let small = state.recompute(Size::new(640, 480));
        assert_eq!(small, ViewportParams::default_for(Size::new(640, 480)));

        let custom = ViewportParams {
            x: 5,
            y: 6,
            width: 132,
            height: 132,
        };
        state.set(custom);
        assert_eq!(state.resolve(Size::new(1024, 768)), custom);
    }

    #[test]
    fn frame_has_border_and_swatch() {
        let (w, h) = (1024u32, 768u32);
        let mut buf = vec![0u32; (w * h) as usize];
        let mut canvas = Canvas::new(&mut buf, Size::new(w, h)).unwrap();
        let mut fb = LogicalFramebuffer::new();
        fb.fill([0, 0, 255]);
        let mut compositor = Compositor::new();
        let tex = compositor.composite(&fb, 255);
        let vp = ViewportParams::default_for(Size::new(w, h));
        let led = IndicatorColor::new(0, 255, 0);

        draw_frame(&mut canvas, tex, vp, led);

        let white = to_argb(Rgb888::WHITE);
        // LCD content
        assert_eq!(canvas.pixel(vp.x, vp.y), Some(0xFF00_00FF));
        // Border ring is immediately outside the image on all four sides
        assert_eq!(canvas.pixel(vp.x - 1, vp.y - 1), Some(white));
        assert_eq!(canvas.pixel(vp.x + vp.width as i32, vp.y + 10), Some(white));
        assert_eq!(canvas.pixel(vp.x + 10, vp.y + vp.height as i32), Some(white));
        // Nothing drawn two pixels out
        assert_eq!(canvas.pixel(vp.x - 2, vp.y + 10), Some(to_argb(Rgb888::BLACK)));
        // Swatch: white outline, LED colour inside
        let swatch = vp.swatch_rect();
        let p = swatch.top_left;
        assert_eq!(canvas.pixel(p.x, p.y), Some(white));
        assert_eq!(canvas.pixel(p.x + 25, p.y + 25), Some(0xFF00_FF00));
        assert_eq!(canvas.pixel(p.x + 50, p.y + 50), Some(white));
        // Label: the L's vertical stroke
        let label = vp.led_label_origin();
        assert_eq!(canvas.pixel(label.x, label.y - 5), Some(white));
    }
}

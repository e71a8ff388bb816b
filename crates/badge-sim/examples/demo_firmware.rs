//! Demo Firmware
//!
//! Minimal badge app running inside the simulator:
//! - D-pad moves a cursor across the LCD
//! - A cycles the flare LED colour
//! - `.` / `,` raise and lower the backlight
//! - B blanks the screen
//!
//! Run with: `cargo run --example demo_firmware`
//! (`BADGE_SIM_WINDOWED=1` for an 800×600 window instead of fullscreen)

// Demo arithmetic is on small, bounded LCD coordinates.
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use std::time::Duration;

use badge_sim::{hal, Badge, Button, SimConfig, Simulator, LCD_XSIZE, LCD_YSIZE};
use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;

const CURSOR: u32 = 9;
const STEP: i32 = 4;
const BRIGHTNESS_STEP: u8 = 32;
const LED_CYCLE: [(u8, u8, u8); 4] = [(255, 0, 0), (0, 255, 0), (0, 0, 255), (0, 0, 0)];

fn main() {
    Simulator::new(SimConfig::from_env(), firmware_main).run(std::env::args().collect());
}

fn firmware_main(badge: Badge, _args: Vec<String>) -> i32 {
    hal::init();
    let code = match run(badge) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "Demo firmware failed");
            1
        }
    };
    hal::deinit();
    code
}

fn run(mut badge: Badge) -> anyhow::Result<()> {
    let mut cursor = Point::new(60, 70);
    let mut led = 0usize;
    let max = Point::new(
        i32::try_from(LCD_XSIZE - CURSOR)?,
        i32::try_from(LCD_YSIZE - CURSOR)?,
    );

    while !badge.quit_requested() {
        let buttons = badge.buttons();
        for button in buttons.take_pressed() {
            match button {
                Button::A => {
                    led = (led + 1) % LED_CYCLE.len();
                    let (r, g, b) = LED_CYCLE[led];
                    badge.flare_led(r, g, b);
                }
                Button::RotateCw => {
                    badge.set_brightness(badge.brightness().saturating_add(BRIGHTNESS_STEP));
                }
                Button::RotateCcw => {
                    badge.set_brightness(badge.brightness().saturating_sub(BRIGHTNESS_STEP));
                }
                _ => {}
            }
        }

        let (dx, dy) = (
            axis(buttons.is_down(Button::Left), buttons.is_down(Button::Right)),
            axis(buttons.is_down(Button::Up), buttons.is_down(Button::Down)),
        );
        cursor = Point::new(
            (cursor.x + dx * STEP).clamp(0, max.x),
            (cursor.y + dy * STEP).clamp(20, max.y),
        );
        let blank = buttons.is_down(Button::B);

        draw(&mut badge, cursor, blank)?;
        badge.flush();
        std::thread::sleep(Duration::from_millis(20));
    }
    Ok(())
}

fn axis(negative: bool, positive: bool) -> i32 {
    i32::from(positive) - i32::from(negative)
}

fn draw(badge: &mut Badge, cursor: Point, blank: bool) -> anyhow::Result<()> {
    let display = badge.display();
    display.clear(Rgb888::BLACK)?;
    if blank {
        return Ok(());
    }

    let text = MonoTextStyle::new(&FONT_6X10, Rgb888::WHITE);
    Text::new("HackRVA badge", Point::new(4, 12), text).draw(display)?;
    Rectangle::new(Point::new(0, 16), Size::new(LCD_XSIZE, 1))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::new(96, 96, 96)))
        .draw(display)?;
    Circle::new(cursor, CURSOR)
        .into_styled(PrimitiveStyle::with_fill(Rgb888::YELLOW))
        .draw(display)?;
    Ok(())
}

//! Firmware-facing handle to the simulated badge
//!
//! Handed to the firmware entry point on its own thread. Drawing goes into a
//! private back buffer; nothing reaches the screen until [`Badge::flush`].

use std::sync::Arc;

use crate::buttons::ButtonState;
use crate::input::{KeyRouter, SharedKeyHandler};
use crate::state::{IndicatorColor, LogicalFramebuffer, SimState};

/// Simulated badge peripherals as seen by firmware
#[derive(Debug)]
pub struct Badge {
    state: Arc<SimState>,
    keys: Arc<KeyRouter>,
    display: LogicalFramebuffer,
}

impl Badge {
    /// Handle over shared state and the key router the render thread feeds
    pub fn new(state: Arc<SimState>, keys: Arc<KeyRouter>) -> Self {
        Self {
            state,
            keys,
            display: LogicalFramebuffer::new(),
        }
    }

    /// Back buffer; an embedded-graphics `DrawTarget<Color = Rgb888>`
    pub fn display(&mut self) -> &mut LogicalFramebuffer {
        &mut self.display
    }

    /// Publish the back buffer to the simulated LCD
    pub fn flush(&self) {
        self.state.publish_frame(&self.display);
    }

    /// Set LCD backlight level (0–255)
    pub fn set_brightness(&self, level: u8) {
        self.state.set_brightness(level);
    }

    /// Current LCD backlight level
    pub fn brightness(&self) -> u8 {
        self.state.brightness()
    }

    /// Set the flare LED colour
    pub fn flare_led(&self, red: u8, green: u8, blue: u8) {
        self.state.set_indicator(IndicatorColor::new(red, green, blue));
    }

    /// Current flare LED colour
    pub fn led(&self) -> IndicatorColor {
        self.state.indicator()
    }

    /// Badge buttons driven by host keys
    pub fn buttons(&self) -> &ButtonState {
        self.keys.buttons()
    }

    /// Receive raw key-press/key-release callbacks (after the button layer)
    pub fn register_key_handler(&self, handler: SharedKeyHandler) {
        self.keys.register(handler);
    }

    /// Whether the simulator is shutting down.
    ///
    /// The process exits right after teardown whether or not firmware checks this.
    pub fn quit_requested(&self) -> bool {
        self.state.quit_requested()
    }

    /// Shared state backing this handle
    pub fn state(&self) -> &Arc<SimState> {
        &self.state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::buttons::Button;
    use crate::input::{KeyHandler, Keysym};
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use winit::keyboard::KeyCode;

    fn badge() -> (Badge, Arc<SimState>, Arc<KeyRouter>) {
        let state = Arc::new(SimState::new());
        let keys = Arc::new(KeyRouter::new(Arc::new(ButtonState::new())));
        (Badge::new(Arc::clone(&state), Arc::clone(&keys)), state, keys)
    }

    #[test]
    fn drawing_is_invisible_until_flush() {
        let (mut badge, state, _) = badge();
        Rectangle::new(Point::zero(), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::GREEN))
            .draw(badge.display())
            .unwrap();
        assert_eq!(state.frame_version(), 0);

        badge.flush();
        let mut seen = LogicalFramebuffer::new();
        state.copy_frame_if_newer(0, &mut seen);
        assert_eq!(seen.pixel(2, 2), Some([0, 255, 0]));
    }

    #[test]
    fn led_and_brightness_reach_shared_state() {
        let (badge, state, _) = badge();
        badge.flare_led(1, 2, 3);
        badge.set_brightness(40);
        assert_eq!(state.indicator(), IndicatorColor::new(1, 2, 3));
        assert_eq!(state.brightness(), 40);
        assert_eq!(badge.led(), IndicatorColor::new(1, 2, 3));
    }

    #[test]
    fn buttons_follow_router() {
        let (badge, _, keys) = badge();
        keys.key_press(Keysym::new(KeyCode::KeyJ));
        assert!(badge.buttons().is_down(Button::B));
    }
}

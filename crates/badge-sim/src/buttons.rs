//! Badge button layer driven by host keys.
//!
//! # Key mapping
//!
//! | Key(s)          | Badge button           |
//! |-----------------|------------------------|
//! | ↑, W            | [`Button::Up`]         |
//! | ↓, S            | [`Button::Down`]       |
//! | ←, A            | [`Button::Left`]       |
//! | →, D            | [`Button::Right`]      |
//! | Space, K        | [`Button::A`]          |
//! | Backspace, J    | [`Button::B`]          |
//! | Enter           | [`Button::Encoder`]    |
//! | `.`             | [`Button::RotateCw`]   |
//! | `,`             | [`Button::RotateCcw`]  |
//!
//! Held state follows press/release. A press also sets a latch that stays set
//! until firmware consumes it, so short taps between two firmware polls are
//! not lost. Keyboard auto-repeat does not re-latch.

use std::sync::atomic::{AtomicU16, Ordering};

use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{KeyHandler, Keysym};

/// Physical badge buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// D-pad up
    Up,
    /// D-pad down
    Down,
    /// D-pad left
    Left,
    /// D-pad right
    Right,
    /// A button
    A,
    /// B button
    B,
    /// Rotary encoder push
    Encoder,
    /// Rotary encoder clockwise detent
    RotateCw,
    /// Rotary encoder counter-clockwise detent
    RotateCcw,
}

impl Button {
    /// Every button, in bit order
    pub const ALL: [Button; 9] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::Encoder,
        Button::RotateCw,
        Button::RotateCcw,
    ];

    fn bit(self) -> u16 {
        match self {
            Button::Up => 1 << 0,
            Button::Down => 1 << 1,
            Button::Left => 1 << 2,
            Button::Right => 1 << 3,
            Button::A => 1 << 4,
            Button::B => 1 << 5,
            Button::Encoder => 1 << 6,
            Button::RotateCw => 1 << 7,
            Button::RotateCcw => 1 << 8,
        }
    }
}

/// Map a host key to a badge button.
///
/// Returns `None` for keys that have no mapping.
pub fn map_key(key: PhysicalKey) -> Option<Button> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Button::Up,
        KeyCode::ArrowDown | KeyCode::KeyS => Button::Down,
        KeyCode::ArrowLeft | KeyCode::KeyA => Button::Left,
        KeyCode::ArrowRight | KeyCode::KeyD => Button::Right,
        KeyCode::Space | KeyCode::KeyK => Button::A,
        KeyCode::Backspace | KeyCode::KeyJ => Button::B,
        KeyCode::Enter => Button::Encoder,
        KeyCode::Period => Button::RotateCw,
        KeyCode::Comma => Button::RotateCcw,
        _ => return None,
    })
}

/// Held and latched button state, written by the render thread
#[derive(Debug, Default)]
pub struct ButtonState {
    held: AtomicU16,
    latched: AtomicU16,
}

impl ButtonState {
    /// No buttons held or latched
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press
    pub fn press(&self, button: Button) {
        self.held.fetch_or(button.bit(), Ordering::AcqRel);
        self.latched.fetch_or(button.bit(), Ordering::AcqRel);
    }

    /// Record a release
    pub fn release(&self, button: Button) {
        self.held.fetch_and(!button.bit(), Ordering::AcqRel);
    }

    /// Whether the button is currently held down
    pub fn is_down(&self, button: Button) -> bool {
        self.held.load(Ordering::Acquire) & button.bit() != 0
    }

    /// Consume the latch for one button
    pub fn take(&self, button: Button) -> bool {
        self.latched.fetch_and(!button.bit(), Ordering::AcqRel) & button.bit() != 0
    }

    /// Consume every latched press, in [`Button::ALL`] order
    pub fn take_pressed(&self) -> Vec<Button> {
        let bits = self.latched.swap(0, Ordering::AcqRel);
        Button::ALL
            .into_iter()
            .filter(|b| bits & b.bit() != 0)
            .collect()
    }
}

impl KeyHandler for ButtonState {
    fn key_press(&self, key: Keysym) {
        if let Some(button) = map_key(key.key) {
            if key.repeat {
                self.held.fetch_or(button.bit(), Ordering::AcqRel);
            } else {
                tracing::trace!(?button, "Button press");
                self.press(button);
            }
        }
    }

    fn key_release(&self, key: Keysym) {
        if let Some(button) = map_key(key.key) {
            tracing::trace!(?button, "Button release");
            self.release(button);
        }
    }
}

//! Host input → firmware key callbacks
//!
//! Each frame the backend drains every pending host event into a list of
//! [`HostEvent`]s (pointer motion, pointer buttons and window metadata are
//! dropped during translation). [`dispatch`] then hands key events to the
//! firmware's [`KeyHandler`] in host order, once each, and turns a quit
//! request into the shared termination flag.

use std::sync::{Arc, PoisonError, RwLock};

use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::buttons::ButtonState;
use crate::state::SimState;

/// Key identifier passed to firmware callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keysym {
    /// Physical key (layout independent)
    pub key: PhysicalKey,
    /// Generated by keyboard auto-repeat
    pub repeat: bool,
}

impl Keysym {
    /// A fresh press/release of `code`
    pub fn new(code: KeyCode) -> Self {
        Self {
            key: PhysicalKey::Code(code),
            repeat: false,
        }
    }

    /// An auto-repeat press of `code`
    pub fn repeat(code: KeyCode) -> Self {
        Self {
            key: PhysicalKey::Code(code),
            repeat: true,
        }
    }
}

/// Input events the simulator reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Key went down
    KeyDown(Keysym),
    /// Key went up
    KeyUp(Keysym),
    /// Window close, Ctrl-C or backend shutdown
    Quit,
}

/// Translate a winit window event.
///
/// Returns `None` for event kinds the simulator ignores.
pub fn translate(event: &WindowEvent) -> Option<HostEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key,
                    state,
                    repeat,
                    ..
                },
            ..
        } => {
            let sym = Keysym {
                key: *physical_key,
                repeat: *repeat,
            };
            Some(match state {
                ElementState::Pressed => HostEvent::KeyDown(sym),
                ElementState::Released => HostEvent::KeyUp(sym),
            })
        }
        WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(HostEvent::Quit),
        _ => None,
    }
}

/// Firmware key callback surface
pub trait KeyHandler {
    /// A key was pressed (or auto-repeated)
    fn key_press(&self, key: Keysym);
    /// A key was released
    fn key_release(&self, key: Keysym);
}

impl<T: KeyHandler + ?Sized> KeyHandler for Arc<T> {
    fn key_press(&self, key: Keysym) {
        (**self).key_press(key);
    }

    fn key_release(&self, key: Keysym) {
        (**self).key_release(key);
    }
}

/// Deliver one frame's events in order.
///
/// Returns the number of key callbacks invoked.
pub fn dispatch<H, I>(events: I, handler: &H, state: &SimState) -> usize
where
    H: KeyHandler + ?Sized,
    I: IntoIterator<Item = HostEvent>,
{
    let mut delivered = 0usize;
    for event in events {
        match event {
            HostEvent::KeyDown(key) => {
                handler.key_press(key);
                delivered = delivered.saturating_add(1);
            }
            HostEvent::KeyUp(key) => {
                handler.key_release(key);
                delivered = delivered.saturating_add(1);
            }
            HostEvent::Quit => {
                if state.request_quit() {
                    tracing::info!("Quit requested");
                }
            }
        }
    }
    delivered
}

/// Shared handle to a firmware-registered key handler.
pub type SharedKeyHandler = Arc<dyn KeyHandler + Send + Sync>;

/// Routes key events to the badge buttons, then to a firmware-registered handler
pub struct KeyRouter {
    buttons: Arc<ButtonState>,
    registered: RwLock<Option<SharedKeyHandler>>,
}

impl KeyRouter {
    /// Router feeding `buttons`, with no extra handler registered
    pub fn new(buttons: Arc<ButtonState>) -> Self {
        Self {
            buttons,
            registered: RwLock::new(None),
        }
    }

    /// Button state fed by this router
    pub fn buttons(&self) -> &Arc<ButtonState> {
        &self.buttons
    }

    /// Install (or replace) the firmware's raw key handler
    pub fn register(&self, handler: SharedKeyHandler) {
        *self.registered.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Remove the firmware's raw key handler
    pub fn unregister(&self) {
        *self.registered.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn registered(&self) -> Option<SharedKeyHandler> {
        self.registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl core::fmt::Debug for KeyRouter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyRouter")
            .field("buttons", &self.buttons)
            .field("registered", &self.registered().is_some())
            .finish()
    }
}

impl KeyHandler for KeyRouter {
    fn key_press(&self, key: Keysym) {
        self.buttons.key_press(key);
        if let Some(handler) = self.registered() {
            handler.key_press(key);
        }
    }

    fn key_release(&self, key: Keysym) {
        self.buttons.key_release(key);
        if let Some(handler) = self.registered() {
            handler.key_release(key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::buttons::Button;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(bool, Keysym)>>);

    impl KeyHandler for Recorder {
        fn key_press(&self, key: Keysym) {
            self.0.lock().unwrap().push((true, key));
        }
        fn key_release(&self, key: Keysym) {
            self.0.lock().unwrap().push((false, key));
        }
    }

    #[test]
    fn translate_close_is_quit() {
        assert_eq!(translate(&WindowEvent::CloseRequested), Some(HostEvent::Quit));
    }

    #[test]
    fn translate_ignores_window_metadata() {
        assert_eq!(translate(&WindowEvent::Focused(true)), None);
        assert_eq!(translate(&WindowEvent::RedrawRequested), None);
        assert_eq!(
            translate(&WindowEvent::Resized(winit::dpi::PhysicalSize::new(10, 10))),
            None
        );
    }

    #[test]
    fn dispatch_preserves_order() {
        let state = SimState::new();
        let rec = Recorder::default();
        let events = [
            HostEvent::KeyDown(Keysym::new(KeyCode::KeyA)),
            HostEvent::KeyDown(Keysym::new(KeyCode::KeyB)),
            HostEvent::KeyUp(Keysym::new(KeyCode::KeyA)),
            HostEvent::KeyUp(Keysym::new(KeyCode::KeyB)),
        ];
        assert_eq!(dispatch(events, &rec, &state), 4);
        let got = rec.0.into_inner().unwrap();
        assert_eq!(
            got,
            vec![
                (true, Keysym::new(KeyCode::KeyA)),
                (true, Keysym::new(KeyCode::KeyB)),
                (false, Keysym::new(KeyCode::KeyA)),
                (false, Keysym::new(KeyCode::KeyB)),
            ]
        );
        assert!(!state.quit_requested());
    }

    #[test]
    fn double_quit_is_harmless() {
        let state = SimState::new();
        let rec = Recorder::default();
        dispatch([HostEvent::Quit, HostEvent::Quit], &rec, &state);
        assert!(state.quit_requested());
        assert!(rec.0.into_inner().unwrap().is_empty());
    }

    #[test]
    fn router_feeds_buttons_then_registered_handler() {
        let buttons = Arc::new(ButtonState::new());
        let router = KeyRouter::new(Arc::clone(&buttons));
        let rec = Arc::new(Recorder::default());
        router.register(rec.clone());

        router.key_press(Keysym::new(KeyCode::ArrowUp));
        router.key_press(Keysym::new(KeyCode::F5));

        assert!(buttons.is_down(Button::Up));
        assert_eq!(rec.0.lock().unwrap().len(), 2);

        router.unregister();
        router.key_release(Keysym::new(KeyCode::ArrowUp));
        assert!(!buttons.is_down(Button::Up));
        assert_eq!(rec.0.lock().unwrap().len(), 2);
    }
}

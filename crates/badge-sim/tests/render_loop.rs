//! Render/event loop behaviour against the headless backend

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss
)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use badge_sim::session::run_session;
use badge_sim::{
    Badge, Button, ButtonState, HeadlessBackend, HostBackend, HostEvent, IndicatorColor,
    KeyHandler, KeyRouter, Keysym, RenderLoop, SimState, ViewportParams,
};
use embedded_graphics::prelude::Size;
use winit::keyboard::KeyCode;

const FAST: Duration = Duration::from_millis(1);

#[derive(Default)]
struct Recorder(Mutex<Vec<HostEvent>>);

impl KeyHandler for Recorder {
    fn key_press(&self, key: Keysym) {
        self.0.lock().unwrap().push(HostEvent::KeyDown(key));
    }
    fn key_release(&self, key: Keysym) {
        self.0.lock().unwrap().push(HostEvent::KeyUp(key));
    }
}

fn down(code: KeyCode) -> HostEvent {
    HostEvent::KeyDown(Keysym::new(code))
}

fn up(code: KeyCode) -> HostEvent {
    HostEvent::KeyUp(Keysym::new(code))
}

fn rig() -> (Badge, Arc<SimState>, Arc<KeyRouter>) {
    let state = Arc::new(SimState::new());
    let keys = Arc::new(KeyRouter::new(Arc::new(ButtonState::new())));
    (Badge::new(Arc::clone(&state), Arc::clone(&keys)), state, keys)
}

#[test]
fn quit_mid_frame_finishes_frame_and_tears_down_once() {
    let state = SimState::new();
    let rec = Recorder::default();
    let mut backend = HeadlessBackend::new(Size::new(640, 480));
    backend.script_poll(vec![]);
    backend.script_poll(vec![down(KeyCode::KeyA), HostEvent::Quit, up(KeyCode::KeyA)]);
    backend.script_poll(vec![down(KeyCode::KeyB)]);

    let frames = run_session(&mut backend, &state, &rec, FAST);

    assert_eq!(frames, 2);
    assert_eq!(backend.frames_presented(), 2);
    assert!(state.quit_requested());
    // Events polled with the quit are still delivered; the next poll never happens.
    assert_eq!(
        *rec.0.lock().unwrap(),
        vec![down(KeyCode::KeyA), up(KeyCode::KeyA)]
    );
    assert_eq!(backend.teardowns(), 1);
    backend.shutdown();
    assert_eq!(backend.teardowns(), 1);
}

#[test]
fn loop_does_not_start_when_already_quitting() {
    let state = SimState::new();
    state.request_quit();
    let mut backend = HeadlessBackend::new(Size::new(640, 480));
    let frames = run_session(&mut backend, &state, &Recorder::default(), FAST);
    assert_eq!(frames, 0);
    assert_eq!(backend.teardowns(), 1);
}

#[test]
fn events_dispatched_in_host_order() {
    let state = SimState::new();
    let rec = Recorder::default();
    let mut backend = HeadlessBackend::new(Size::new(640, 480));
    let batch = vec![
        down(KeyCode::ArrowUp),
        down(KeyCode::Space),
        up(KeyCode::ArrowUp),
        HostEvent::KeyDown(Keysym::repeat(KeyCode::Space)),
        up(KeyCode::Space),
    ];
    backend.script_poll(batch.clone());

    let mut render_loop = RenderLoop::new(FAST);
    render_loop.step(&mut backend, &state, &rec);

    assert_eq!(*rec.0.lock().unwrap(), batch);
}

#[test]
fn viewport_fixed_after_first_frame() {
    let state = SimState::new();
    let rec = Recorder::default();
    let mut backend = HeadlessBackend::new(Size::new(1024, 768));
    let mut render_loop = RenderLoop::new(FAST);
    assert_eq!(render_loop.viewport().params(), None);

    render_loop.step(&mut backend, &state, &rec);
    let first = render_loop.viewport().params().unwrap();
    assert_eq!(first, ViewportParams::default_for(Size::new(1024, 768)));

    backend.set_window_size(Size::new(640, 480));
    render_loop.step(&mut backend, &state, &rec);
    render_loop.step(&mut backend, &state, &rec);
    assert_eq!(render_loop.viewport().params(), Some(first));
}

#[test]
fn layout_recomputed_on_request_after_resize() {
    let state = SimState::new();
    let rec = Recorder::default();
    let mut backend = HeadlessBackend::new(Size::new(1024, 768));
    let mut render_loop = RenderLoop::new(FAST);
    render_loop.step(&mut backend, &state, &rec);

    backend.set_window_size(Size::new(640, 480));
    let resized = render_loop.viewport_mut().recompute(backend.window_size());
    assert_eq!(resized, ViewportParams::default_for(Size::new(640, 480)));

    render_loop.step(&mut backend, &state, &rec);
    assert_eq!(render_loop.viewport().params(), Some(resized));
    assert!(resized.x as u32 + resized.width <= 640);
    assert!(resized.y as u32 + resized.height <= 480);
}

#[test]
fn firmware_frame_brightness_and_led_reach_window() {
    let (mut badge, state, keys) = rig();
    badge.display().fill([200, 100, 50]);
    badge.flush();
    badge.set_brightness(128);
    badge.flare_led(255, 0, 0);

    let mut backend = HeadlessBackend::new(Size::new(1024, 768));
    let mut render_loop = RenderLoop::new(FAST);
    render_loop.step(&mut backend, &state, &*keys);

    let vp = render_loop.viewport().params().unwrap();
    let lcd = backend.pixel(vp.x as u32 + 3, vp.y as u32 + 3).unwrap();
    assert_eq!(lcd, u32::from_le_bytes([25, 50, 100, 255]));

    let swatch = vp.swatch_rect();
    let led = backend
        .pixel(swatch.top_left.x as u32 + 25, swatch.top_left.y as u32 + 25)
        .unwrap();
    assert_eq!(led, 0xFFFF_0000);
    assert_eq!(state.indicator(), IndicatorColor::new(255, 0, 0));
}

#[test]
fn unflushed_drawing_stays_off_screen() {
    let (mut badge, state, keys) = rig();
    badge.display().fill([255, 255, 255]);

    let mut backend = HeadlessBackend::new(Size::new(1024, 768));
    let mut render_loop = RenderLoop::new(FAST);
    render_loop.step(&mut backend, &state, &*keys);

    let vp = render_loop.viewport().params().unwrap();
    assert_eq!(backend.pixel(vp.x as u32, vp.y as u32), Some(0xFF00_0000));
}

#[test]
fn keys_reach_badge_buttons_through_loop() {
    let (badge, state, keys) = rig();
    let rec = Arc::new(Recorder::default());
    badge.register_key_handler(rec.clone());

    let mut backend = HeadlessBackend::new(Size::new(640, 480));
    backend.script_poll(vec![down(KeyCode::KeyW), up(KeyCode::KeyW), down(KeyCode::KeyD)]);

    let mut render_loop = RenderLoop::new(FAST);
    render_loop.step(&mut backend, &state, &*keys);

    assert!(badge.buttons().is_down(Button::Right));
    assert!(!badge.buttons().is_down(Button::Up));
    assert_eq!(badge.buttons().take_pressed(), vec![Button::Up, Button::Right]);
    assert_eq!(rec.0.lock().unwrap().len(), 3);
}

#[test]
fn loop_keeps_fixed_cadence() {
    let state = SimState::new();
    let period = Duration::from_millis(10);
    let mut backend = HeadlessBackend::new(Size::new(320, 240));
    for _ in 0..5 {
        backend.script_poll(vec![]);
    }
    backend.script_poll(vec![HostEvent::Quit]);

    let start = Instant::now();
    let frames = run_session(&mut backend, &state, &Recorder::default(), period);
    assert_eq!(frames, 6);
    assert!(start.elapsed() >= period * 5);
}

#[test]
fn firmware_thread_publishes_while_loop_renders() {
    let (mut badge, state, keys) = rig();
    let worker = std::thread::spawn(move || {
        for i in 0..50u8 {
            badge.display().fill([i, i, i]);
            badge.flush();
        }
        badge
    });

    let mut backend = HeadlessBackend::new(Size::new(640, 480));
    let mut render_loop = RenderLoop::new(FAST);
    while !worker.is_finished() {
        render_loop.step(&mut backend, &state, &*keys);
    }
    let _badge = worker.join().unwrap();
    render_loop.step(&mut backend, &state, &*keys);

    let vp = render_loop.viewport().params().unwrap();
    assert_eq!(
        backend.pixel(vp.x as u32, vp.y as u32),
        Some(u32::from_le_bytes([49, 49, 49, 255]))
    );
}

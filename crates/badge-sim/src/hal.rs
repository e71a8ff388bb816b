//! Peripheral stand-ins
//!
//! On hardware these poke GPIO, PWM and RTC registers. In the simulator the
//! display, LED and buttons are provided by the render loop, so each call
//! only leaves a trace in the log.

fn stub(name: &'static str) {
    tracing::debug!(stub = name, "Simulated HAL call");
}

/// Bring up display controller, LED PWM, buttons, IR and RTC
pub fn init() {
    stub("display_controller_init_gpio");
    stub("led_pwm_init_gpio");
    stub("button_init_gpio");
    stub("ir_init");
    stub("display_controller_reset");
    stub("rtc_init");
}

/// Release peripherals and flush persistent storage
pub fn deinit() {
    stub("flash_deinit");
    stub("hal_deinit");
}

/// Restart the badge; in the simulator this ends the process
pub fn reboot() -> ! {
    stub("hal_reboot");
    std::process::exit(0)
}

/// Mask interrupts, returning the previous mask state
pub fn disable_interrupts() -> u32 {
    stub("hal_disable_interrupts");
    0
}

/// Restore a mask state returned by [`disable_interrupts`]
pub fn restore_interrupts(state: u32) {
    tracing::debug!(stub = "hal_restore_interrupts", state, "Simulated HAL call");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_stubs_round_trip() {
        init();
        let saved = disable_interrupts();
        assert_eq!(saved, 0);
        restore_interrupts(saved);
        deinit();
    }
}

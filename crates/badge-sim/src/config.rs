//! Simulator configuration

use std::time::Duration;

/// Width of the badge LCD in pixels.
pub const LCD_XSIZE: u32 = 132;
/// Height of the badge LCD in pixels.
pub const LCD_YSIZE: u32 = 132;

/// Render/event cadence of the simulated display.
pub const FRAME_RATE_HZ: u32 = 30;

/// Environment variable selecting [`SimConfig::WINDOWED`] when set to `1`.
pub const WINDOWED_ENV_VAR: &str = "BADGE_SIM_WINDOWED";

/// Environment variable controlling whether the fullscreen window minimizes
/// when it loses focus. Defaulted to `0` at startup if unset.
pub const MINIMIZE_ON_FOCUS_LOSS_ENV_VAR: &str = "BADGE_SIM_MINIMIZE_ON_FOCUS_LOSS";

/// Configuration for the simulator window and render loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Time budget per render/event cycle
    pub frame_period: Duration,
    /// Force the window into desktop fullscreen after creation
    pub fullscreen: bool,
    /// Initial inner size of the window when not fullscreen
    pub window_size: (u32, u32),
    /// Window title prefix; the program name is appended
    pub title_prefix: &'static str,
}

impl SimConfig {
    /// Default configuration: desktop fullscreen, 30 Hz
    pub const DEFAULT: Self = Self {
        frame_period: Duration::from_nanos(1_000_000_000 / FRAME_RATE_HZ as u64),
        fullscreen: true,
        window_size: (800, 600),
        title_prefix: "HackRVA Badge Emulator",
    };

    /// Resizable 800×600 window, 30 Hz
    pub const WINDOWED: Self = Self {
        frame_period: Self::DEFAULT.frame_period,
        fullscreen: false,
        window_size: (800, 600),
        title_prefix: Self::DEFAULT.title_prefix,
    };

    /// Pick a preset from the environment (`BADGE_SIM_WINDOWED=1` → windowed)
    pub fn from_env() -> Self {
        Self::from_windowed_flag(std::env::var(WINDOWED_ENV_VAR).ok().as_deref())
    }

    fn from_windowed_flag(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim() == "1" => Self::WINDOWED,
            _ => Self::DEFAULT,
        }
    }

    /// Window title for the given program name (`argv[0]`)
    pub fn window_title(&self, program: &str) -> String {
        format!("{} - {}", self.title_prefix, program)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_period_is_30hz() {
        let period = SimConfig::DEFAULT.frame_period;
        assert_eq!(period, Duration::from_nanos(33_333_333));
    }

    #[test]
    fn windowed_flag_selects_preset() {
        assert_eq!(SimConfig::from_windowed_flag(Some("1")), SimConfig::WINDOWED);
        assert_eq!(SimConfig::from_windowed_flag(Some("0")), SimConfig::DEFAULT);
        assert_eq!(SimConfig::from_windowed_flag(None), SimConfig::DEFAULT);
    }

    #[test]
    fn window_title_appends_program() {
        assert_eq!(
            SimConfig::DEFAULT.window_title("./badge"),
            "HackRVA Badge Emulator - ./badge"
        );
    }
}

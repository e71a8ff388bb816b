//! Fixed-cadence frame pacing
//!
//! The deadline advances by exactly one period per frame, so a slow frame is
//! followed by unslept frames until the schedule is met again; the pacer never
//! tries to run faster than that to catch up.

use std::time::{Duration, Instant};

/// Sleeps the render thread to a fixed frame period
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    next_deadline: Option<Instant>,
}

impl FramePacer {
    /// Pacer for the given frame period
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: None,
        }
    }

    /// Frame period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Deadline the next [`wait`](Self::wait) will sleep until, once started
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    /// Sleep until the current frame's deadline, then advance it one period.
    ///
    /// The first call starts the schedule at "now + period". Returns the time
    /// actually slept (zero when the frame overran).
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        let period = self.period;
        let deadline = *self
            .next_deadline
            .get_or_insert_with(|| now.checked_add(period).unwrap_or(now));
        let remaining = deadline.saturating_duration_since(now);
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.next_deadline = deadline.checked_add(self.period);
        remaining
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn n_frames_take_at_least_n_minus_one_periods() {
        let period = Duration::from_millis(10);
        let mut pacer = FramePacer::new(period);
        let start = Instant::now();
        for _ in 0..6 {
            pacer.wait();
        }
        assert!(start.elapsed() >= period * 5);
    }

    #[test]
    fn deadline_advances_by_exactly_one_period() {
        let period = Duration::from_millis(5);
        let mut pacer = FramePacer::new(period);
        pacer.wait();
        let first = pacer.next_deadline().unwrap_or_else(Instant::now);
        pacer.wait();
        let second = pacer.next_deadline().unwrap_or_else(Instant::now);
        assert_eq!(second - first, period);
    }

    #[test]
    fn overrun_frame_skips_sleep() {
        let period = Duration::from_millis(5);
        let mut pacer = FramePacer::new(period);
        pacer.wait();
        std::thread::sleep(period * 3);
        assert_eq!(pacer.wait(), Duration::ZERO);
    }
}

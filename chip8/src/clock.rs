//! Wall clock time and the delay timer governor.
use std::time::Instant;

use crate::constants::*;

/// Host frame clock.
///
/// Measures the time that elapsed between consecutive frames, which is
/// fed to the VM so it can count down its timers.
pub struct Clock(Instant);

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub fn new() -> Self {
        Self(Instant::now())
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.0 = Instant::now()
    }

    /// Milliseconds elapsed since the previous lap, then restart the lap.
    pub fn lap(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.0);
        self.0 = now;
        elapsed.as_secs_f64() * 1000.0
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts elapsed wall clock time into timer decrements.
///
/// Elapsed time accumulates as a fraction of a timer period. Each
/// time the governor is drained, at most one period is consumed, even if
/// the accumulator has fallen several periods behind. Timers therefore lag
/// rather than jump when frames are slow.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TimerGovernor {
    ticks: f64,
}

impl TimerGovernor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add elapsed milliseconds to the accumulator.
    #[inline]
    pub fn accumulate(&mut self, elapsed_ms: f64) {
        self.ticks += elapsed_ms / TIMER_PERIOD_MS;
    }

    /// Consume a single period if one is available.
    #[inline]
    pub fn drain(&mut self) -> bool {
        if self.ticks >= 1.0 {
            self.ticks -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.ticks = 0.0;
    }
}

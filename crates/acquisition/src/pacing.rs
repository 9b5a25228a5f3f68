//! Poll-cycle pacing

use std::thread;
use std::time::{Duration, Instant};

/// Outcome of pacing one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTiming {
    /// Cycle finished early, slept for the remainder of the period
    Slept(Duration),
    /// Cycle took at least one full period, next cycle starts immediately
    Overrun(Duration),
}

/// Fixed-rate pacer
///
/// Sleeps `max(0, period - elapsed)` after each cycle. An overrun is not
/// compensated: there is no negative sleep and no catch-up burst.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    period: Duration,
}

impl Pacer {
    /// Pacer for `rate_hz`
    ///
    /// `None` unless the rate is finite, > 0 and its period fits in a
    /// `Duration`.
    pub fn from_rate_hz(rate_hz: f64) -> Option<Self> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return None;
        }
        let period = Duration::try_from_secs_f64(1.0 / rate_hz).ok()?;
        Some(Self { period })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left in the period after `elapsed`
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.period
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }

    /// Sleep out the rest of the cycle that began at `cycle_start`
    pub fn pace(&self, cycle_start: Instant) -> CycleTiming {
        let elapsed = cycle_start.elapsed();
        match self.remaining(elapsed) {
            Some(remaining) => {
                thread::sleep(remaining);
                CycleTiming::Slept(remaining)
            }
            None => CycleTiming::Overrun(elapsed.saturating_sub(self.period)),
        }
    }
}

//! Wall-clock time budget shared by every pipeline stage.
//!
//! The budget is anchored once, when the pipeline starts, and every later
//! query derives the remaining time from the injected [`Clock`]. Nothing here
//! reads ambient global state, so tests can drive the budget with a fake clock.

use std::time::{Duration, Instant};

/// Source of monotonic instants.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Total time limit plus the instant the pipeline started.
pub struct Budget {
    clock: Box<dyn Clock>,
    start: Instant,
    total_ms: i64,
}

impl Budget {
    /// Capture the start instant from `clock`. The start is never reset.
    pub fn start(clock: Box<dyn Clock>, total_ms: i64) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            total_ms,
        }
    }

    /// Budget in milliseconds for a limit expressed in (fractional) minutes.
    pub fn from_minutes(clock: Box<dyn Clock>, minutes: f64) -> Self {
        Self::start(clock, minutes_to_ms(minutes))
    }

    pub fn total_ms(&self) -> i64 {
        self.total_ms
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Wall-clock time since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.start)
    }

    /// `total - elapsed`, negative once the deadline has passed.
    pub fn remaining_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.total_ms.saturating_sub(elapsed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_ms() <= 0
    }

    /// Remaining budget floored to whole seconds, for external `-timelimit` style arguments.
    pub fn remaining_whole_secs(&self) -> u64 {
        u64::try_from(self.remaining_ms() / 1000).unwrap_or(0)
    }

    /// Remaining budget in fractional minutes (never negative).
    pub fn remaining_minutes(&self) -> f64 {
        self.remaining_ms().max(0) as f64 / 60_000.0
    }
}

pub fn minutes_to_ms(minutes: f64) -> i64 {
    (minutes * 60_000.0).round() as i64
}

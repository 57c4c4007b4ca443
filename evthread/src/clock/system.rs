use super::{Clock, Ticks};
use crate::platform::sys_monotonic_nanos;

use std::sync::OnceLock;

/// Tick resolution used by [`SystemClock::new`].
pub const DEFAULT_TICKS_PER_SEC: u64 = 10_000;

/// Process-wide origin so that every `SystemClock` agrees on tick values.
fn origin_nanos() -> u128 {
    static ORIGIN: OnceLock<u128> = OnceLock::new();
    *ORIGIN.get_or_init(sys_monotonic_nanos)
}

/// A clock backed by the operating system's monotonic counter.
///
/// Ticks count from the first time any `SystemClock` was created in this
/// process, so clocks of equal resolution are interchangeable.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    ticks_per_sec: u64,
}

impl SystemClock {
    /// Creates a clock with [`DEFAULT_TICKS_PER_SEC`] resolution.
    pub fn new() -> Self {
        Self::with_resolution(DEFAULT_TICKS_PER_SEC)
    }

    /// Creates a clock with the given number of ticks per second.
    ///
    /// # Panics
    ///
    /// Panics if `ticks_per_sec` is `0` or finer than one nanosecond.
    pub fn with_resolution(ticks_per_sec: u64) -> Self {
        assert!(
            ticks_per_sec > 0 && ticks_per_sec <= 1_000_000_000,
            "ticks_per_sec must be in 1..=1_000_000_000"
        );

        origin_nanos();
        Self { ticks_per_sec }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ticks(&self) -> Ticks {
        let elapsed = sys_monotonic_nanos().saturating_sub(origin_nanos());
        (elapsed * self.ticks_per_sec as u128 / 1_000_000_000) as Ticks
    }

    fn ticks_per_sec(&self) -> u64 {
        self.ticks_per_sec
    }
}

//! Monotonic time sources.
//!
//! Everything the event loop schedules is expressed in [`Ticks`], the
//! fundamental resolution unit of a [`Clock`]. A clock only has to be
//! monotonic and to know how many ticks make up a second; the unit
//! conversions used by timers are derived from that.
//!
//! Two clocks are provided:
//! - [`SystemClock`], backed by the operating system's monotonic counter,
//! - [`ManualClock`], advanced by hand, for deterministic tests.

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::{DEFAULT_TICKS_PER_SEC, SystemClock};

use std::thread;
use std::time::Duration;

/// A point or a span on a clock's tick axis.
pub type Ticks = i64;

/// A monotonic tick source.
///
/// Implementations must never return a smaller value from
/// [`now_ticks`](Self::now_ticks) than a previous call did. Periodic
/// timers rely on this to keep their phase.
pub trait Clock: Send + Sync {
    /// Current tick count.
    fn now_ticks(&self) -> Ticks;

    /// Number of ticks in one second.
    fn ticks_per_sec(&self) -> u64;

    /// Converts milliseconds to ticks, rounding up.
    ///
    /// Rounding up guarantees that a delay is never shorter than asked for.
    fn ms_to_ticks_ceil(&self, ms: u64) -> Ticks {
        let ticks = (ms as u128 * self.ticks_per_sec() as u128).div_ceil(1_000);
        ticks.min(Ticks::MAX as u128) as Ticks
    }

    /// Converts a tick span to microseconds, rounding up.
    ///
    /// Non-positive spans convert to `0`.
    fn ticks_to_us_ceil(&self, ticks: Ticks) -> u64 {
        if ticks <= 0 {
            return 0;
        }

        let us = (ticks as u128 * 1_000_000).div_ceil(self.ticks_per_sec() as u128);
        us.min(u64::MAX as u128) as u64
    }

    /// Converts microseconds to ticks, rounding up.
    fn us_to_ticks_ceil(&self, us: u64) -> Ticks {
        let ticks = (us as u128 * self.ticks_per_sec() as u128).div_ceil(1_000_000);
        ticks.min(Ticks::MAX as u128) as Ticks
    }

    /// Converts a tick span to milliseconds, rounding down.
    fn ticks_to_ms_floor(&self, ticks: Ticks) -> u64 {
        if ticks <= 0 {
            return 0;
        }

        (ticks as u128 * 1_000 / self.ticks_per_sec() as u128) as u64
    }

    /// Milliseconds elapsed since the clock's origin.
    fn uptime_ms(&self) -> u64 {
        self.ticks_to_ms_floor(self.now_ticks())
    }
}

/// How long a blocking acquisition may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Block until the operation succeeds.
    Forever,

    /// Fail immediately if the operation cannot succeed right away.
    NoWait,

    /// Block for at most the given duration.
    After(Duration),
}

/// Wait as long as it takes.
pub const WAIT_FOREVER: Timeout = Timeout::Forever;

/// Do not wait at all.
pub const NO_WAIT: Timeout = Timeout::NoWait;

impl Timeout {
    /// A finite timeout of `ms` milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Timeout::After(Duration::from_millis(ms))
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Timeout::NoWait
        } else {
            Timeout::After(duration)
        }
    }
}

/// Sleeps the calling thread until `clock` reports an uptime of at least
/// `target_ms`.
///
/// Returns immediately if that time has already passed. Useful in tests
/// that check state at absolute points in time rather than after
/// relative delays, which would accumulate drift.
pub fn sleep_until_ms(clock: &dyn Clock, target_ms: u64) {
    let now_ms = clock.uptime_ms();

    if target_ms > now_ms {
        thread::sleep(Duration::from_millis(target_ms - now_ms));
    }
}

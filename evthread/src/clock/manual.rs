use super::{Clock, Ticks};

use std::sync::atomic::{AtomicI64, Ordering};

/// A clock that only moves when told to.
///
/// Useful for exercising timer scheduling without sleeping. Share it
/// through an `Arc` between the test and the component under test.
#[derive(Debug)]
pub struct ManualClock {
    ticks: AtomicI64,
    ticks_per_sec: u64,
}

impl ManualClock {
    /// Creates a clock at tick `0` with the given resolution.
    ///
    /// # Panics
    ///
    /// Panics if `ticks_per_sec == 0`.
    pub fn new(ticks_per_sec: u64) -> Self {
        assert!(ticks_per_sec > 0, "ticks_per_sec must be > 0");

        Self {
            ticks: AtomicI64::new(0),
            ticks_per_sec,
        }
    }

    /// Moves the clock to an absolute tick value.
    ///
    /// # Panics
    ///
    /// Panics if `ticks` is earlier than the current value, which is
    /// then left unchanged.
    pub fn set_ticks(&self, ticks: Ticks) {
        let moved = self
            .ticks
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (ticks >= current).then_some(ticks)
            });

        assert!(moved.is_ok(), "ManualClock must not go backwards");
    }

    /// Moves the clock forward by `ticks`.
    pub fn advance_ticks(&self, ticks: Ticks) {
        assert!(ticks >= 0, "ManualClock must not go backwards");
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Moves the clock forward by `ms` milliseconds, rounded up to whole ticks.
    pub fn advance_ms(&self, ms: u64) {
        self.advance_ticks(self.ms_to_ticks_ceil(ms));
    }
}

impl Clock for ManualClock {
    fn now_ticks(&self) -> Ticks {
        self.ticks.load(Ordering::Acquire)
    }

    fn ticks_per_sec(&self) -> u64 {
        self.ticks_per_sec
    }
}

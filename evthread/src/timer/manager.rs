use super::entry::{Timer, WeakTimer};
use crate::clock::{Clock, Ticks};

use log::debug;
use std::fmt;
use std::sync::Arc;

/// The timer that fires next and how long until it does.
#[derive(Debug, Clone)]
pub struct NextExpiry {
    /// Armed timer with the earliest expiry.
    pub timer: Timer,

    /// Microseconds until the expiry, rounded up; `0` once it is due.
    pub wait_us: u64,
}

impl NextExpiry {
    /// Whether the timer is already due.
    pub fn is_expired(&self) -> bool {
        self.wait_us == 0
    }
}

/// A fixed-capacity set of observed timers.
///
/// The manager does not own its timers: it keeps weak references in
/// registration order and finds the next expiry by a linear scan. Timers
/// whose last handle was dropped are skipped and their slot is reclaimed
/// on the next registration.
pub struct TimerManager {
    /// Weak references in registration order.
    timers: Vec<WeakTimer>,

    /// Maximum number of live registrations.
    capacity: usize,

    /// Clock handed to every registered timer.
    clock: Arc<dyn Clock>,
}

impl TimerManager {
    /// Creates an empty manager.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        assert!(capacity > 0, "timer manager capacity must be > 0");

        Self {
            timers: Vec::with_capacity(capacity),
            capacity,
            clock,
        }
    }

    /// Starts observing `timer`.
    ///
    /// The timer adopts this manager's clock, so register timers before
    /// arming them.
    ///
    /// # Panics
    ///
    /// Panics if the manager is full or if the timer is already
    /// registered with a manager.
    pub fn register(&mut self, timer: &Timer) {
        self.prune();

        assert!(
            self.timers.len() < self.capacity,
            "max number of timers ({}) reached",
            self.capacity
        );
        assert!(
            timer.attach(self.clock.clone()),
            "timer \"{}\" is already registered",
            timer.name()
        );

        self.timers.push(timer.downgrade());
        debug!(
            "registered timer \"{}\" ({}/{})",
            timer.name(),
            self.timers.len(),
            self.capacity
        );
    }

    /// Stops observing `timer`.
    ///
    /// Returns `false` if this manager did not observe it.
    pub fn deregister(&mut self, timer: &Timer) -> bool {
        let Some(index) = self.timers.iter().position(|t| t.refers_to(timer)) else {
            return false;
        };

        self.timers.remove(index);
        timer.detach();
        true
    }

    /// Finds the armed timer that expires first.
    ///
    /// Ties go to the timer registered first. `None` means no timer is
    /// armed and the caller may block indefinitely.
    ///
    /// Timer state is left untouched; acting on the expiry is up to the
    /// caller.
    pub fn next_expiring(&self) -> Option<NextExpiry> {
        let mut earliest: Option<(Timer, Ticks)> = None;

        for timer in self.timers.iter().filter_map(WeakTimer::upgrade) {
            let Some(fire_at) = timer.next_fire_ticks() else {
                continue;
            };

            if earliest.as_ref().is_none_or(|(_, best)| fire_at < *best) {
                earliest = Some((timer, fire_at));
            }
        }

        let (timer, fire_at) = earliest?;
        let now = self.clock.now_ticks();

        let wait_us = if fire_at <= now {
            0
        } else {
            self.clock.ticks_to_us_ceil(fire_at - now)
        };

        Some(NextExpiry { timer, wait_us })
    }

    /// Number of live registered timers.
    pub fn len(&self) -> usize {
        self.timers.iter().filter(|t| t.is_alive()).count()
    }

    /// Whether no live timer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of registered timers.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The clock timers are scheduled against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn prune(&mut self) {
        self.timers.retain(WeakTimer::is_alive);
    }
}

impl Drop for TimerManager {
    /// Releases every live registration.
    fn drop(&mut self) {
        for timer in self.timers.iter().filter_map(WeakTimer::upgrade) {
            timer.detach();
        }
    }
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerManager")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

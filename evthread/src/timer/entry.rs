use crate::clock::{Clock, SystemClock, Ticks};

use log::{debug, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Period value that makes [`Timer::start_with_delay`] arm a one-shot timer.
pub const ONE_SHOT: i64 = -1;

type Action = Box<dyn FnMut() + Send + 'static>;

/// Scheduling state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Idle,
    Armed {
        /// Absolute tick of the next expiry.
        next_fire_ticks: Ticks,

        /// `None` for a one-shot timer.
        period_ticks: Option<Ticks>,

        /// Period as requested, kept to convert onto another clock.
        period_ms: Option<u64>,
    },
}

pub(crate) struct TimerInner {
    name: String,
    schedule: Mutex<Schedule>,

    /// Clock of the owning manager, or a system clock while unregistered.
    clock: Mutex<Arc<dyn Clock>>,

    registered: AtomicBool,

    /// Taken out while the action runs so it may replace itself.
    action: Mutex<Option<Action>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A zero period still advances by one tick.
fn period_to_ticks(clock: &dyn Clock, period_ms: u64) -> Ticks {
    clock.ms_to_ticks_ceil(period_ms).max(1)
}

/// A one-shot or periodic software timer.
///
/// `Timer` is a handle: clones refer to the same timer, so a copy can be
/// moved into an event handler that arms it while the original stays
/// with its owner. A [`TimerManager`](super::TimerManager) only holds a
/// weak reference, so the timer lives as long as some handle does.
///
/// Arming and disarming are meant to happen either before the owning
/// event loop starts or on the loop thread itself (inside a handler, a
/// timer action, or a closure passed to `run_in_loop`).
///
/// # Examples
///
/// ```rust,ignore
/// let blink = Timer::new("blink", move || led.toggle());
/// event_loop.timer_manager().register(&blink);
///
/// // First expiry after 500 ms, then every second.
/// blink.start_with_delay(500, 1000);
/// ```
#[derive(Clone)]
pub struct Timer {
    inner: Arc<TimerInner>,
}

impl Timer {
    /// Creates an idle, unregistered timer.
    ///
    /// `name` is only used in log messages.
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            inner: Arc::new(TimerInner {
                name: name.into(),
                schedule: Mutex::new(Schedule::Idle),
                clock: Mutex::new(Arc::new(SystemClock::new())),
                registered: AtomicBool::new(false),
                action: Mutex::new(Some(Box::new(action))),
            }),
        }
    }

    /// The diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Starts the timer in periodic mode.
    ///
    /// The first expiry happens `period_ms` from now, and every
    /// `period_ms` after that. Equivalent to
    /// `start_with_delay(period_ms, period_ms)`.
    pub fn start(&self, period_ms: i64) {
        self.start_with_delay(period_ms, period_ms);
    }

    /// Starts the timer with an initial delay distinct from its period.
    ///
    /// `period_ms` is [`ONE_SHOT`] for a timer that fires once. Both
    /// values are rounded up to whole ticks so the timer never fires
    /// early. A zero period is treated as one tick.
    ///
    /// Restarting an armed timer reschedules it from now.
    ///
    /// # Panics
    ///
    /// Panics if `delay_ms < 0` or `period_ms < -1`.
    pub fn start_with_delay(&self, delay_ms: i64, period_ms: i64) {
        assert!(
            delay_ms >= 0,
            "timer \"{}\": delay must be >= 0, got {delay_ms}",
            self.name()
        );
        assert!(
            period_ms >= ONE_SHOT,
            "timer \"{}\": period must be >= -1, got {period_ms}",
            self.name()
        );

        if !self.is_registered() {
            warn!(
                "timer \"{}\" is not registered with a timer manager, its expiries will not be handled",
                self.name()
            );
        }

        let clock = self.clock();
        let next_fire_ticks = clock
            .now_ticks()
            .saturating_add(clock.ms_to_ticks_ceil(delay_ms as u64));

        let period_ms = (period_ms != ONE_SHOT).then_some(period_ms as u64);
        let period_ticks = period_ms.map(|ms| period_to_ticks(clock.as_ref(), ms));

        *lock(&self.inner.schedule) = Schedule::Armed {
            next_fire_ticks,
            period_ticks,
            period_ms,
        };

        debug!(
            "timer \"{}\" armed: next expiry at tick {next_fire_ticks}, period {period_ticks:?}",
            self.name()
        );
    }

    /// Disarms the timer.
    ///
    /// The expiry action and the registration are kept.
    pub fn stop(&self) {
        *lock(&self.inner.schedule) = Schedule::Idle;
    }

    /// Whether the timer is armed.
    pub fn is_running(&self) -> bool {
        matches!(*lock(&self.inner.schedule), Schedule::Armed { .. })
    }

    /// Whether a timer manager currently observes this timer.
    pub fn is_registered(&self) -> bool {
        self.inner.registered.load(Ordering::Acquire)
    }

    /// Absolute tick of the next expiry, or `None` while idle.
    pub fn next_fire_ticks(&self) -> Option<Ticks> {
        match *lock(&self.inner.schedule) {
            Schedule::Armed {
                next_fire_ticks, ..
            } => Some(next_fire_ticks),
            Schedule::Idle => None,
        }
    }

    /// Period in ticks, or `None` for an idle or one-shot timer.
    pub fn period_ticks(&self) -> Option<Ticks> {
        match *lock(&self.inner.schedule) {
            Schedule::Armed { period_ticks, .. } => period_ticks,
            Schedule::Idle => None,
        }
    }

    /// Accounts for one expiry.
    ///
    /// A one-shot timer becomes idle. A periodic timer moves its next
    /// expiry forward by exactly one period, not to "now + period", so a
    /// late loop catches up without losing phase.
    pub fn update_after_expiry(&self) {
        let mut schedule = lock(&self.inner.schedule);

        match *schedule {
            Schedule::Idle => {}
            Schedule::Armed {
                period_ticks: None, ..
            } => *schedule = Schedule::Idle,
            Schedule::Armed {
                next_fire_ticks,
                period_ticks: Some(period),
                period_ms,
            } => {
                *schedule = Schedule::Armed {
                    next_fire_ticks: next_fire_ticks.saturating_add(period),
                    period_ticks: Some(period),
                    period_ms,
                };
            }
        }
    }

    /// Replaces the expiry action.
    ///
    /// May be called from inside the running action; the replacement is
    /// used from the next expiry on.
    pub fn set_expiry_action<F>(&self, action: F)
    where
        F: FnMut() + Send + 'static,
    {
        *lock(&self.inner.action) = Some(Box::new(action));
    }

    /// Runs the expiry action on the calling thread.
    ///
    /// The action is put back even if it panics.
    pub fn fire(&self) {
        let Some(action) = lock(&self.inner.action).take() else {
            debug!("timer \"{}\" fired from inside its own action", self.name());
            return;
        };

        let mut running = RunningAction {
            slot: &self.inner.action,
            action: Some(action),
        };

        if let Some(action) = running.action.as_mut() {
            action();
        }
    }

    fn clock(&self) -> Arc<dyn Clock> {
        lock(&self.inner.clock).clone()
    }

    /// Marks the timer as observed by a manager ticking on `clock`.
    ///
    /// An armed timer keeps the time left until its next expiry.
    /// Returns `false` if some manager already observes it.
    pub(crate) fn attach(&self, clock: Arc<dyn Clock>) -> bool {
        if self
            .inner
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let previous = std::mem::replace(&mut *lock(&self.inner.clock), clock.clone());
        self.rebase(previous.as_ref(), clock.as_ref());
        true
    }

    /// Moves an armed schedule from the tick axis of `from` to that of `to`.
    fn rebase(&self, from: &dyn Clock, to: &dyn Clock) {
        let mut schedule = lock(&self.inner.schedule);

        let Schedule::Armed {
            next_fire_ticks,
            period_ms,
            ..
        } = *schedule
        else {
            return;
        };

        let remaining_us =
            from.ticks_to_us_ceil(next_fire_ticks.saturating_sub(from.now_ticks()));

        *schedule = Schedule::Armed {
            next_fire_ticks: to
                .now_ticks()
                .saturating_add(to.us_to_ticks_ceil(remaining_us)),
            period_ticks: period_ms.map(|ms| period_to_ticks(to, ms)),
            period_ms,
        };
    }

    pub(crate) fn detach(&self) {
        self.inner.registered.store(false, Ordering::Release);
    }

    pub(crate) fn downgrade(&self) -> WeakTimer {
        WeakTimer(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.inner.name)
            .field("schedule", &*lock(&self.inner.schedule))
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Returns a taken action to its slot unless a new one was installed meanwhile.
struct RunningAction<'a> {
    slot: &'a Mutex<Option<Action>>,
    action: Option<Action>,
}

impl Drop for RunningAction<'_> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            lock(self.slot).get_or_insert(action);
        }
    }
}

/// Non-owning reference kept by a timer manager.
pub(crate) struct WeakTimer(Weak<TimerInner>);

impl WeakTimer {
    pub(crate) fn upgrade(&self) -> Option<Timer> {
        self.0.upgrade().map(|inner| Timer { inner })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub(crate) fn refers_to(&self, timer: &Timer) -> bool {
        Weak::as_ptr(&self.0) == Arc::as_ptr(&timer.inner)
    }
}

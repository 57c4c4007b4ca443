use super::EventLoop;
use crate::clock::{Clock, SystemClock};

use std::marker::PhantomData;
use std::sync::Arc;

/// Queue capacity used unless [`EventLoopBuilder::queue_capacity`] is called.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Timer capacity used unless [`EventLoopBuilder::max_timers`] is called.
pub const DEFAULT_MAX_TIMERS: usize = 10;

/// Builder for configuring and creating an event loop for events of type `E`.
///
/// # Examples
///
/// ```rust,ignore
/// let event_loop = EventLoopBuilder::<LedEvent>::new("led")
///     .stack_size(64 * 1024)
///     .queue_capacity(16)
///     .build();
/// ```
pub struct EventLoopBuilder<E> {
    /// Name of the loop and of its worker thread.
    name: String,

    /// Worker stack size in bytes; platform default when `None`.
    stack_size: Option<usize>,

    /// Nice-style worker priority; inherited when `None`.
    priority: Option<i32>,

    /// Number of items the queue holds.
    queue_capacity: usize,

    /// Number of timers the loop can observe.
    max_timers: usize,

    /// Clock timers are scheduled against.
    clock: Option<Arc<dyn Clock>>,

    events: PhantomData<fn() -> E>,
}

impl<E: Send + 'static> EventLoopBuilder<E> {
    /// Creates a builder with default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stack_size: None,
            priority: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_timers: DEFAULT_MAX_TIMERS,
            clock: None,
            events: PhantomData,
        }
    }

    /// Sets the worker thread's stack size in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "stack_size must be > 0");

        self.stack_size = Some(bytes);
        self
    }

    /// Sets the worker thread's priority.
    ///
    /// Lower values are more urgent, as with `nice`. If the platform
    /// refuses the value, the worker logs a warning and keeps the
    /// inherited priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets how many items the queue holds before sends are rejected.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn queue_capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "queue_capacity must be > 0");

        self.queue_capacity = n;
        self
    }

    /// Sets how many timers the loop's manager can observe.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn max_timers(mut self, n: usize) -> Self {
        assert!(n > 0, "max_timers must be > 0");

        self.max_timers = n;
        self
    }

    /// Schedules timers against `clock` instead of a [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the loop. The worker thread is not started.
    pub fn build(self) -> EventLoop<E> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));

        EventLoop::new(
            self.name,
            self.stack_size,
            self.priority,
            self.queue_capacity,
            self.max_timers,
            clock,
        )
    }
}

//! The single-thread event loop.
//!
//! An [`EventLoop`] owns one worker thread, one bounded
//! [`MessageQueue`](crate::queue::MessageQueue), and one
//! [`TimerManager`](crate::timer::TimerManager). The worker repeatedly:
//! 1. fires every timer that is already due, earliest first,
//! 2. blocks on the queue until the next timer deadline,
//! 3. dispatches whatever it dequeued: a typed event goes to the
//!    installed handler, a deferred closure is simply run.
//!
//! All handlers, closures, and timer actions therefore run on the same
//! thread, one at a time, and need no locking for state they own.
//! Other threads talk to the loop through a [`LoopHandle`].

mod builder;
mod core;
mod handle;
mod worker;

pub use self::builder::{DEFAULT_MAX_TIMERS, DEFAULT_QUEUE_CAPACITY, EventLoopBuilder};
pub use self::core::EventLoop;
pub use self::handle::LoopHandle;

/// An item travelling through the loop's queue.
pub(crate) enum QueueItem<E> {
    /// A typed external event for the installed handler.
    Event(E),

    /// A closure to run on the loop thread.
    Deferred(Box<dyn FnOnce() + Send + 'static>),
}

/// Lifecycle of an [`EventLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Built but not started; timers and the handler may be configured.
    Constructed,

    /// The worker thread is running.
    Started,

    /// Exit was requested; the worker returns once the current handler does.
    Terminating,

    /// The worker thread has returned.
    Terminated,
}

//! # evthread
//!
//! **evthread** is an event-driven execution engine for a single worker
//! thread. An [`EventLoop`] owns one OS thread, one bounded message
//! queue, and a set of software [`Timer`]s, and delivers either timer
//! expirations or externally injected messages to user-supplied
//! handlers, one at a time, on that thread.
//!
//! Three sources of work share one blocking wait-point:
//!
//! - **Timers**, one-shot or periodic, each with an expiry action
//! - **Typed events**, values of the user's event enum sent with
//!   [`LoopHandle::send_event`]
//! - **Deferred closures**, run on the loop thread via
//!   [`LoopHandle::run_in_loop`]
//!
//! The loop fires every due timer before it blocks, then waits on the
//! queue for at most the time left until the next timer deadline.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evthread::{EventLoop, Timer};
//!
//! enum Event {
//!     Flash { rate_ms: i64 },
//!     Exit,
//! }
//!
//! let mut event_loop = EventLoop::<Event>::builder("led").build();
//!
//! let blink = Timer::new("blink", || println!("toggle"));
//! event_loop.timer_manager().register(&blink);
//!
//! let handle = event_loop.handle();
//! event_loop.on_external_event(move |event| match event {
//!     Event::Flash { rate_ms } => blink.start(rate_ms),
//!     Event::Exit => handle.exit_event_loop(),
//! });
//!
//! event_loop.start()?;
//! event_loop.send_event(Event::Flash { rate_ms: 500 })?;
//! ```
//!
//! ## Modules
//!
//! - [`clock`] — Tick sources and unit conversions
//! - [`timer`] — Timers and the timer manager
//! - [`queue`] — The bounded message queue
//! - [`event_loop`] — The event loop, its builder and handles
//! - [`sync`] — A named mutex with timed, scoped acquisition

mod platform;

pub mod clock;
pub mod error;
pub mod event_loop;
pub mod queue;
pub mod sync;
pub mod timer;

pub use clock::{Clock, ManualClock, NO_WAIT, SystemClock, Ticks, Timeout, WAIT_FOREVER};
pub use error::{LockError, SendError};
pub use event_loop::{EventLoop, EventLoopBuilder, LoopHandle, LoopState};
pub use sync::{Mutex, MutexGuard, ScopedLock};
pub use timer::{NextExpiry, ONE_SHOT, Timer, TimerManager};

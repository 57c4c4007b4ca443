//! Software timers driven by an event loop.
//!
//! A [`Timer`] records *when* it should fire next and *what* to run
//! when it does. A [`TimerManager`] observes a set of timers and answers
//! the one question the event loop needs before it blocks: which timer
//! fires next, and how long until then.
//!
//! Timers never fire by themselves. The loop calls
//! [`Timer::update_after_expiry`] and [`Timer::fire`] on its own thread
//! once [`TimerManager::next_expiring`] reports an expiry.

mod entry;
mod manager;

pub use entry::{ONE_SHOT, Timer};
pub use manager::{NextExpiry, TimerManager};

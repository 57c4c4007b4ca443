//! Cross-thread synchronization for user state.
//!
//! Handlers and timer actions run on the loop thread, but the state they
//! update is usually read from other threads too. This module provides a
//! named mutex whose acquisition takes a [`Timeout`](crate::clock::Timeout),
//! and two guards over it:
//! - [`MutexGuard`], returned by [`Mutex::lock`] once the lock is held,
//! - [`ScopedLock`], which records whether acquisition succeeded and is
//!   a no-op when it did not.
//!
//! Both release the mutex exactly once, when dropped.

mod mutex;

pub use mutex::{Mutex, MutexGuard, ScopedLock};

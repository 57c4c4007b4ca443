//! Platform-specific OS glue.
//!
//! This module provides the few operating-system services the event
//! loop needs and the standard library does not expose directly:
//! - a monotonic nanosecond counter backing [`SystemClock`](crate::clock::SystemClock),
//! - a way to adjust the scheduling priority of the calling thread.
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system.

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(unix)]
pub(crate) use unix as sys;

#[cfg(windows)]
pub(crate) use windows as sys;

pub(crate) use sys::{sys_monotonic_nanos, sys_set_thread_priority};

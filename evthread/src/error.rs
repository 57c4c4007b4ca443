//! Error types reported to callers.
//!
//! Only recoverable conditions are represented here. Misuse such as a
//! negative timer delay or starting a loop twice panics instead.

use std::time::Duration;

use thiserror::Error;

/// Failure to enqueue an item into a [`MessageQueue`](crate::queue::MessageQueue).
///
/// The rejected item is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The queue holds `capacity` items already.
    #[error("message queue is full")]
    QueueFull,

    /// The receiving side has shut down.
    #[error("message queue is closed")]
    Closed,
}

/// Failure to acquire a [`Mutex`](crate::sync::Mutex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockError {
    /// The mutex stayed locked for the whole timeout.
    #[error("mutex not acquired within {0:?}")]
    Timeout(Duration),

    /// The mutex was locked and the caller asked not to wait.
    #[error("mutex is locked")]
    WouldBlock,
}

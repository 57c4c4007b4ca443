//! Bounded multi-producer, single-consumer message queue.
//!
//! The queue is the only wait-point of an event loop: the consumer
//! blocks in [`MessageQueue::recv`] with a timeout equal to the time
//! left until the next timer expiry, so one call waits for both
//! messages and timers.

use crate::error::SendError;

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of a blocking [`MessageQueue::recv`].
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeue<T> {
    /// The oldest queued item.
    Item(T),

    /// The timeout elapsed with the queue still empty.
    Timeout,

    /// The queue was closed and holds nothing more.
    Closed,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A FIFO holding at most `capacity` items.
///
/// Sending never blocks: when the queue is full the item is rejected
/// and dropped. Receiving blocks until an item arrives, the timeout
/// elapses, or the queue is closed. Items from one producer are
/// received in the order they were sent.
pub struct MessageQueue<T> {
    /// Queued items and the closed flag.
    inner: Mutex<Inner<T>>,

    /// Signalled when an item is pushed or the queue is closed.
    not_empty: Condvar,

    /// Maximum number of items held at once.
    capacity: usize,
}

impl<T> MessageQueue<T> {
    /// Creates an empty queue.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be > 0");

        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` without blocking.
    ///
    /// On failure the item is dropped after the queue's lock is released.
    pub fn try_send(&self, item: T) -> Result<(), SendError> {
        let mut inner = self.lock();

        if inner.closed {
            return Err(SendError::Closed);
        }

        if inner.items.len() >= self.capacity {
            return Err(SendError::QueueFull);
        }

        inner.items.push_back(item);
        drop(inner);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, waiting up to `timeout` for one to arrive.
    ///
    /// `None` waits forever. Spurious wake-ups are absorbed: `Timeout` is
    /// only returned once the full duration has passed.
    pub fn recv(&self, timeout: Option<Duration>) -> Dequeue<T> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut inner = self.lock();

        loop {
            if let Some(item) = inner.items.pop_front() {
                return Dequeue::Item(item);
            }

            if inner.closed {
                return Dequeue::Closed;
            }

            match deadline {
                None => {
                    inner = self
                        .not_empty
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Dequeue::Timeout;
                    }

                    let (guard, _) = self
                        .not_empty
                        .wait_timeout(inner, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    inner = guard;
                }
            }
        }
    }

    /// Removes the oldest item if one is queued.
    pub fn try_recv(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Closes the queue.
    ///
    /// Queued items are discarded, waiting receivers return
    /// [`Dequeue::Closed`], and later sends fail with [`SendError::Closed`].
    pub fn close(&self) {
        let discarded = {
            let mut inner = self.lock();
            inner.closed = true;
            std::mem::take(&mut inner.items)
        };

        self.not_empty.notify_all();
        drop(discarded);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

use super::QueueItem;
use super::handle::Shared;
use crate::platform::sys_set_thread_priority;
use crate::queue::Dequeue;
use crate::timer::{Timer, TimerManager};

use log::{debug, error, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

type Handler<E> = Box<dyn FnMut(E) + Send + 'static>;

/// The part of an event loop that lives on the worker thread.
///
/// Built together with the loop and moved into the thread by `start`.
/// Everything it owns is only touched from that thread afterwards.
pub(crate) struct Worker<E> {
    shared: Arc<Shared<E>>,

    pub(crate) timers: TimerManager,
    pub(crate) handler: Option<Handler<E>>,
}

impl<E> Worker<E> {
    pub(crate) fn new(shared: Arc<Shared<E>>, timers: TimerManager) -> Self {
        Self {
            shared,
            timers,
            handler: None,
        }
    }

    /// Thread entry point.
    ///
    /// Runs the loop until exit is requested, then closes the queue so
    /// that anything still queued is discarded.
    pub(crate) fn run(mut self, priority: Option<i32>) {
        self.shared.enter_loop_thread();

        if let Some(priority) = priority {
            if let Err(err) = sys_set_thread_priority(priority) {
                warn!(
                    "event loop \"{}\": could not set priority {priority}: {err}",
                    self.shared.name
                );
            }
        }

        debug!("event loop \"{}\" running", self.shared.name);

        self.event_loop();

        self.shared.queue.close();
        self.shared.mark_terminated();

        debug!("event loop \"{}\" terminated", self.shared.name);
    }

    /// # Execution loop
    ///
    /// - Fire every due timer, earliest first, re-checking after each one
    /// - Otherwise, block on the queue until the next timer deadline
    /// - Dispatch the dequeued event or closure
    /// - Return as soon as exit has been requested
    fn event_loop(&mut self) {
        while !self.shared.exit_requested() {
            let next = loop {
                match self.timers.next_expiring() {
                    Some(expiry) if expiry.is_expired() => {
                        self.expire(&expiry.timer);

                        if self.shared.exit_requested() {
                            return;
                        }
                    }
                    next => break next,
                }
            };

            let timeout = next.map(|expiry| Duration::from_micros(expiry.wait_us));

            match self.shared.queue.recv(timeout) {
                Dequeue::Item(QueueItem::Event(event)) => self.dispatch(event),
                Dequeue::Item(QueueItem::Deferred(f)) => {
                    contain(&self.shared.name, "deferred closure", f)
                }
                Dequeue::Timeout => {}
                Dequeue::Closed => {
                    panic!("event loop \"{}\": queue closed while running", self.shared.name)
                }
            }
        }
    }

    /// Accounts for the expiry before running the action, so an action
    /// that restarts its own timer is not overridden.
    fn expire(&self, timer: &Timer) {
        timer.update_after_expiry();
        contain(&self.shared.name, timer.name(), || timer.fire());
    }

    fn dispatch(&mut self, event: E) {
        match self.handler.as_mut() {
            Some(handler) => contain(&self.shared.name, "event handler", || handler(event)),
            None => warn!(
                "event loop \"{}\": no external event handler installed, event discarded",
                self.shared.name
            ),
        }
    }
}

/// Runs user code, logging instead of unwinding out of the loop.
fn contain(loop_name: &str, what: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(
            "event loop \"{loop_name}\": {what} panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

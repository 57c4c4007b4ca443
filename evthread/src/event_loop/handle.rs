use super::{LoopState, QueueItem};
use crate::clock::Clock;
use crate::error::SendError;
use crate::queue::MessageQueue;

use log::warn;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

const CONSTRUCTED: u8 = 0;
const STARTED: u8 = 1;
const TERMINATED: u8 = 2;

/// State shared between an event loop, its worker, and every handle.
pub(crate) struct Shared<E> {
    pub(crate) name: String,
    pub(crate) queue: MessageQueue<QueueItem<E>>,
    pub(crate) clock: Arc<dyn Clock>,

    /// Only ever set from the loop thread.
    exit_requested: AtomicBool,

    state: AtomicU8,

    /// Identity of the worker thread, known once it runs.
    loop_thread: OnceLock<ThreadId>,
}

impl<E> Shared<E> {
    pub(crate) fn new(name: String, queue_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            queue: MessageQueue::new(queue_capacity),
            clock,
            exit_requested: AtomicBool::new(false),
            state: AtomicU8::new(CONSTRUCTED),
            loop_thread: OnceLock::new(),
        }
    }

    pub(crate) fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire)
    }

    /// Records the calling thread as the loop thread.
    pub(crate) fn enter_loop_thread(&self) {
        let _ = self.loop_thread.set(thread::current().id());
    }

    pub(crate) fn mark_started(&self) {
        self.state.store(STARTED, Ordering::Release);
    }

    pub(crate) fn mark_terminated(&self) {
        self.state.store(TERMINATED, Ordering::Release);
    }

    pub(crate) fn state(&self) -> LoopState {
        match self.state.load(Ordering::Acquire) {
            CONSTRUCTED => LoopState::Constructed,
            STARTED if self.exit_requested() => LoopState::Terminating,
            STARTED => LoopState::Started,
            _ => LoopState::Terminated,
        }
    }
}

/// A cloneable, thread-safe reference to an event loop.
///
/// Handles are how other threads feed the loop and how code running on
/// the loop thread asks it to stop. A handle stays valid after the loop
/// terminates; sends then fail with [`SendError::Closed`].
///
/// # Examples
///
/// ```rust,ignore
/// let handle = event_loop.handle();
/// event_loop.on_external_event(move |event| match event {
///     Event::Exit => handle.exit_event_loop(),
///     Event::Flash { rate_ms } => blink.start(rate_ms),
/// });
/// ```
pub struct LoopHandle<E> {
    shared: Arc<Shared<E>>,
}

impl<E> LoopHandle<E> {
    pub(crate) fn new(shared: Arc<Shared<E>>) -> Self {
        Self { shared }
    }

    /// Name of the loop.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Queues `event` for the loop's external event handler.
    ///
    /// Never blocks.
    ///
    /// # Errors
    ///
    /// [`SendError::QueueFull`] or [`SendError::Closed`]; the event is dropped.
    pub fn send_event(&self, event: E) -> Result<(), SendError> {
        self.enqueue(QueueItem::Event(event))
    }

    /// Queues `f` to run once on the loop thread.
    ///
    /// Closures run in FIFO order with respect to events and other
    /// closures. This is the way to arm or stop timers from another thread.
    ///
    /// # Errors
    ///
    /// [`SendError::QueueFull`] or [`SendError::Closed`]; the closure is dropped.
    pub fn run_in_loop<F>(&self, f: F) -> Result<(), SendError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(QueueItem::Deferred(Box::new(f)))
    }

    fn enqueue(&self, item: QueueItem<E>) -> Result<(), SendError> {
        self.shared.queue.try_send(item).inspect_err(|err| {
            warn!("event loop \"{}\": item dropped: {err}", self.shared.name);
        })
    }

    /// Asks the loop to stop once the current handler returns.
    ///
    /// # Panics
    ///
    /// Panics if called from any thread other than the loop thread.
    pub fn exit_event_loop(&self) {
        assert!(
            self.is_loop_thread(),
            "exit_event_loop() must be called from the thread of event loop \"{}\"",
            self.shared.name
        );

        self.shared.exit_requested.store(true, Ordering::Release);
    }

    /// Whether the calling thread is this loop's worker.
    pub fn is_loop_thread(&self) -> bool {
        self.shared.loop_thread.get() == Some(&thread::current().id())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// The clock timers of this loop are scheduled against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.shared.clock
    }
}

impl<E> Clone for LoopHandle<E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<E> fmt::Debug for LoopHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish()
    }
}

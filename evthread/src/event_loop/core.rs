use super::builder::EventLoopBuilder;
use super::handle::{LoopHandle, Shared};
use super::worker::Worker;
use super::LoopState;
use crate::clock::Clock;
use crate::error::SendError;
use crate::timer::TimerManager;

use log::{debug, error};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// An event loop running on its own thread.
///
/// `E` is the user's event type, normally an enum with one variant per
/// kind of external event. The loop is built in the
/// [`Constructed`](LoopState::Constructed) state: register timers through
/// [`timer_manager`](Self::timer_manager), install the event handler with
/// [`on_external_event`](Self::on_external_event), then call
/// [`start`](Self::start).
///
/// Dropping the loop joins its worker thread. Make sure the loop will
/// terminate first, typically by sending an event whose handler calls
/// [`LoopHandle::exit_event_loop`].
///
/// # Examples
///
/// ```rust,ignore
/// enum Event {
///     Exit,
/// }
///
/// let mut event_loop = EventLoop::<Event>::builder("worker").build();
/// let handle = event_loop.handle();
///
/// event_loop.on_external_event(move |event| match event {
///     Event::Exit => handle.exit_event_loop(),
/// });
///
/// event_loop.start()?;
/// event_loop.send_event(Event::Exit)?;
/// ```
pub struct EventLoop<E: Send + 'static> {
    /// State shared with the worker and every handle.
    shared: Arc<Shared<E>>,

    /// Timers and handler, moved to the worker thread by `start`.
    worker: Option<Worker<E>>,

    /// Join handle of the worker thread once started.
    thread: Option<JoinHandle<()>>,

    stack_size: Option<usize>,
    priority: Option<i32>,
}

impl<E: Send + 'static> EventLoop<E> {
    /// Returns a builder for a loop named `name`.
    pub fn builder(name: impl Into<String>) -> EventLoopBuilder<E> {
        EventLoopBuilder::new(name)
    }

    pub(crate) fn new(
        name: String,
        stack_size: Option<usize>,
        priority: Option<i32>,
        queue_capacity: usize,
        max_timers: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        debug!("event loop \"{name}\": queue capacity {queue_capacity}, {max_timers} timers");

        let shared = Arc::new(Shared::new(name, queue_capacity, clock.clone()));
        let timers = TimerManager::new(max_timers, clock);

        Self {
            worker: Some(Worker::new(shared.clone(), timers)),
            shared,
            thread: None,
            stack_size,
            priority,
        }
    }

    /// Name of the loop and of its worker thread.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The manager timers must be registered with to be serviced.
    ///
    /// # Panics
    ///
    /// Panics once the loop has been started.
    pub fn timer_manager(&mut self) -> &mut TimerManager {
        let Some(worker) = self.worker.as_mut() else {
            panic!(
                "timer_manager() called after event loop \"{}\" was started",
                self.shared.name
            );
        };

        &mut worker.timers
    }

    /// Installs the handler for events sent with [`send_event`](Self::send_event).
    ///
    /// Replaces any previous handler. Events arriving while no handler is
    /// installed are logged and discarded.
    ///
    /// # Panics
    ///
    /// Panics once the loop has been started.
    pub fn on_external_event<F>(&mut self, handler: F)
    where
        F: FnMut(E) + Send + 'static,
    {
        let Some(worker) = self.worker.as_mut() else {
            panic!(
                "on_external_event() called after event loop \"{}\" was started",
                self.shared.name
            );
        };

        worker.handler = Some(Box::new(handler));
    }

    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be spawned. The loop
    /// is then [`Terminated`](LoopState::Terminated).
    ///
    /// # Panics
    ///
    /// Panics if the loop was already started.
    pub fn start(&mut self) -> io::Result<()> {
        let Some(worker) = self.worker.take() else {
            panic!("event loop \"{}\" started twice", self.shared.name);
        };

        let mut builder = thread::Builder::new().name(self.shared.name.clone());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        let priority = self.priority;
        self.shared.mark_started();

        match builder.spawn(move || worker.run(priority)) {
            Ok(thread) => {
                self.thread = Some(thread);
                Ok(())
            }
            Err(err) => {
                error!("event loop \"{}\": failed to spawn worker: {err}", self.shared.name);
                self.shared.queue.close();
                self.shared.mark_terminated();
                Err(err)
            }
        }
    }

    /// Queues `event` for the external event handler. See [`LoopHandle::send_event`].
    pub fn send_event(&self, event: E) -> Result<(), SendError> {
        self.handle().send_event(event)
    }

    /// Queues `f` to run once on the loop thread. See [`LoopHandle::run_in_loop`].
    pub fn run_in_loop<F>(&self, f: F) -> Result<(), SendError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle().run_in_loop(f)
    }

    /// Asks the loop to stop. See [`LoopHandle::exit_event_loop`].
    ///
    /// # Panics
    ///
    /// Panics if called from any thread other than the loop thread.
    pub fn exit_event_loop(&self) {
        self.handle().exit_event_loop();
    }

    /// A handle for feeding or stopping the loop from elsewhere.
    pub fn handle(&self) -> LoopHandle<E> {
        LoopHandle::new(self.shared.clone())
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

impl<E: Send + 'static> Drop for EventLoop<E> {
    /// Joins the worker thread.
    ///
    /// Blocks until the loop exits; a loop that never exits blocks forever.
    fn drop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        debug!("event loop \"{}\": joining worker", self.shared.name);

        if thread.join().is_err() {
            error!("event loop \"{}\": worker thread panicked", self.shared.name);
        }
    }
}

impl<E: Send + 'static> fmt::Debug for EventLoop<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

//! Worker thread for continuous runs
//!
//! A continuous run executes on a dedicated thread so the host stays
//! responsive to a cancellation request.  The worker takes ownership of
//! the [`Engine`] for the duration of the run and gives it back on
//! join, which makes "exactly one worker is active at a time" a
//! property of the types: while a [`Worker`] exists, nobody else can
//! call a mutating engine operation.
//!
//! Cancellation is a single atomic flag with one producer (the host)
//! and one consumer (the run loop); no queue or message passing is
//! needed.

use super::engine::Engine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Cooperative cancellation flag, checked by the run loop between
/// instructions.  Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Asks the run loop to stop after the instruction in flight.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A run in progress on its own thread.
pub struct Worker {
    handle: JoinHandle<Engine>,
    cancel: CancelFlag,
}

impl Worker {
    /// Moves the engine onto a new thread and starts the run loop.
    pub fn spawn(mut engine: Engine) -> Self {
        let cancel = engine.cancel_flag();
        let handle = thread::spawn(move || {
            engine.run();
            engine
        });
        Worker { handle, cancel }
    }

    /// Requests cooperative cancellation.  The instruction in flight
    /// completes; the next one never executes.
    pub fn cancel(&self) {
        self.cancel.request();
    }

    /// True once the run loop has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run to end and returns the engine.
    pub fn join(self) -> Engine {
        match self.handle.join() {
            Ok(engine) => engine,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

//! A single-result handle returned by [`super::ThreadPool::execute`].
//!
//! Conceptually a binary result-semaphore pre-decremented to 0 plus a
//! result slot. [`crate::sync::Semaphore`] always starts *fully
//! available*, so rather than force an awkward "decrement once right
//! after construction" dance through that public API, `Future` is built
//! on its own `Mutex`+`Condvar` monitor directly — one slot that starts
//! empty and is filled exactly once.

use std::sync::{Condvar, Mutex};

/// A result that becomes available exactly once, from exactly one
/// producing thread, and is read by exactly one joining thread.
pub struct Future<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Future<T> {
    pub(super) fn new() -> Self {
        Future {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Called once by the worker that ran the job.
    pub(super) fn complete(&self, value: T) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value);
        drop(guard);
        self.ready.notify_all();
    }

    /// Blocks until a result is posted, then consumes it. A future may be
    /// joined by at most one caller; joining twice panics rather than
    /// returning a stale or fabricated value.
    pub fn join(&self) -> T {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        while guard.is_none() {
            guard = self.ready.wait(guard).unwrap_or_else(|e| e.into_inner());
        }
        guard.take().expect("Future joined more than once")
    }

    /// `true` once the worker has posted a result, without consuming it.
    pub fn is_ready(&self) -> bool {
        self.slot.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

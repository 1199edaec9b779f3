//! Counting semaphore with timed, multi-unit operations.
//!
//! Built directly on a `std::sync::{Mutex, Condvar}` monitor rather than a
//! platform semaphore primitive. `up`/`down` are the single-unit cases of
//! the more general `op(±k)`, and `timed_op` adds a deadline to the same
//! wait loop.
//!
//! The value never drops below zero: `down`/`op(-k)` blocks while
//! `value < k`, re-checking the predicate on every wake so that spurious
//! wake-ups never smuggle a thread past a not-yet-true precondition.

use std::sync::{Condvar, Mutex};

use crate::deadline::Deadline;
use crate::error::{Error, Result};

struct State {
    value: i64,
}

/// A non-negative-valued counting semaphore supporting blocking and timed
/// acquisition/release of multiple units at once.
///
/// No fairness guarantee is made on which blocked waiter is woken first:
/// this follows directly from `Condvar`'s own unspecified wake-up order
/// and must not be "fixed" without a deliberate design change.
pub struct Semaphore {
    state: Mutex<State>,
    cvar: Condvar,
}

impl Semaphore {
    /// `max_value` must be `> 0`; the semaphore starts fully available at
    /// `max_value`.
    pub fn new(max_value: i64) -> Result<Self> {
        if max_value <= 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(Semaphore {
            state: Mutex::new(State { value: max_value }),
            cvar: Condvar::new(),
        })
    }

    /// Shorthand for `op(1)`. Never blocks.
    pub fn up(&self) -> Result<()> {
        self.op(1)
    }

    /// Shorthand for `op(-1)`. Blocks while the value is `< 1`.
    pub fn down(&self) -> Result<()> {
        self.op(-1)
    }

    /// Adds (`k > 0`) or subtracts (`k < 0`) `k` units. A positive `k` never
    /// blocks and wakes one waiter; a negative `k` blocks until
    /// `value >= |k|` holds.
    pub fn op(&self, k: i64) -> Result<()> {
        if k == 0 {
            return Err(Error::InvalidArgument);
        }
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        if k > 0 {
            guard.value += k;
            drop(guard);
            self.cvar.notify_one();
            return Ok(());
        }
        let need = -k;
        while guard.value < need {
            guard = self.cvar.wait(guard).map_err(|_| Error::Internal)?;
        }
        guard.value -= need;
        Ok(())
    }

    /// Timed variant of [`Semaphore::op`]. Only meaningful for `k < 0`
    /// (a positive `k` never blocks, so a deadline cannot fire); `k > 0`
    /// behaves exactly like `op(k)` aside from also validating the timeout.
    ///
    /// Recomputes the remaining time on every wake-up, so a long string of
    /// spurious/irrelevant wake-ups cannot extend the effective timeout
    /// beyond `timeout_millis` plus scheduling noise.
    pub fn timed_op(&self, k: i64, timeout_millis: i64) -> Result<()> {
        if k == 0 {
            return Err(Error::InvalidArgument);
        }
        let deadline = Deadline::from_millis(timeout_millis)?;

        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        if k > 0 {
            guard.value += k;
            drop(guard);
            self.cvar.notify_one();
            return Ok(());
        }
        let need = -k;
        while guard.value < need {
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            let (next_guard, result) = self
                .cvar
                .wait_timeout(guard, remaining)
                .map_err(|_| Error::Internal)?;
            guard = next_guard;
            if result.timed_out() && guard.value < need {
                return Err(Error::Timeout);
            }
        }
        guard.value -= need;
        Ok(())
    }

    /// Current value, for diagnostics/tests. Not part of the monitored
    /// protocol — by the time the caller observes this, another thread may
    /// have changed it.
    pub fn value(&self) -> i64 {
        self.state.lock().map(|g| g.value).unwrap_or(0)
    }
}

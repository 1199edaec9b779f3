//! Monotonic deadline helpers shared by every timed operation in this crate.
//!
//! Every timed operation in this crate (semaphore, reader/writer lock,
//! bounded queue, thread-pool submission) converts its caller-supplied
//! relative millisecond timeout into an absolute [`Instant`] deadline once,
//! at call entry, and then recomputes remaining time on each wake-up of the
//! condition variable it is waiting on. Using `Instant` rather than the
//! wall-clock `SystemTime` sidesteps the clock-jump hazard a wall-clock
//! deadline would be exposed to.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// An absolute point in time by which a timed operation must have
/// succeeded, computed from a relative millisecond timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Converts `timeout_millis` (which must be `> 0`) into an absolute
    /// deadline measured from now.
    pub fn from_millis(timeout_millis: i64) -> Result<Self> {
        if timeout_millis <= 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(Deadline {
            at: Instant::now() + Duration::from_millis(timeout_millis as u64),
        })
    }

    /// Time remaining until the deadline, or `Duration::ZERO` if it has
    /// already elapsed. Used to re-arm `Condvar::wait_timeout` after a
    /// spurious or legitimate wake-up that did not satisfy the waiter's
    /// precondition.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// `true` once `remaining()` would be zero.
    pub fn has_elapsed(&self) -> bool {
        Instant::now() >= self.at
    }
}

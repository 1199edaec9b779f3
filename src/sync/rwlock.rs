//! Reader/writer lock with timed acquisition, built on its own monitor
//! (`Mutex` + `Condvar`) rather than on [`crate::sync::Semaphore`] — the two
//! primitives are independent.
//!
//! `value > 0` means that many readers hold the lock, `value == 0` means
//! idle, `value == -1` means a single writer holds it. No fairness is
//! guaranteed: an unbroken stream of readers may starve a waiting writer.
//! Releasing a lock you do not hold, or recursively acquiring from the
//! same thread, is undefined behavior and is not detected.

use std::sync::{Condvar, Mutex};

use crate::deadline::Deadline;
use crate::error::{Error, Result};

struct State {
    value: i64,
}

/// Many-readers-xor-one-writer lock with blocking and timed acquisition.
pub struct RwLock {
    state: Mutex<State>,
    cvar: Condvar,
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RwLock {
    /// Starts idle (`value == 0`).
    pub fn new() -> Self {
        RwLock {
            state: Mutex::new(State { value: 0 }),
            cvar: Condvar::new(),
        }
    }

    /// Blocks while a writer holds the lock (`value < 0`), then joins the
    /// reader count.
    pub fn acquire_reader(&self) -> Result<()> {
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        while guard.value < 0 {
            guard = self.cvar.wait(guard).map_err(|_| Error::Internal)?;
        }
        guard.value += 1;
        Ok(())
    }

    /// Timed variant of [`RwLock::acquire_reader`].
    pub fn acquire_reader_timed(&self, timeout_millis: i64) -> Result<()> {
        let deadline = Deadline::from_millis(timeout_millis)?;
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        while guard.value < 0 {
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            let (next_guard, result) = self
                .cvar
                .wait_timeout(guard, remaining)
                .map_err(|_| Error::Internal)?;
            guard = next_guard;
            if result.timed_out() && guard.value < 0 {
                return Err(Error::Timeout);
            }
        }
        guard.value += 1;
        Ok(())
    }

    /// Decrements the reader count and wakes one waiter. Calling this
    /// without holding a reader lock is undefined behavior (not checked).
    pub fn release_reader(&self) -> Result<()> {
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        guard.value -= 1;
        drop(guard);
        self.cvar.notify_one();
        Ok(())
    }

    /// Blocks while the lock is non-idle (`value != 0`), then claims it
    /// exclusively (`value = -1`).
    pub fn acquire_writer(&self) -> Result<()> {
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        while guard.value != 0 {
            guard = self.cvar.wait(guard).map_err(|_| Error::Internal)?;
        }
        guard.value = -1;
        Ok(())
    }

    /// Timed variant of [`RwLock::acquire_writer`].
    pub fn acquire_writer_timed(&self, timeout_millis: i64) -> Result<()> {
        let deadline = Deadline::from_millis(timeout_millis)?;
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        while guard.value != 0 {
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            let (next_guard, result) = self
                .cvar
                .wait_timeout(guard, remaining)
                .map_err(|_| Error::Internal)?;
            guard = next_guard;
            if result.timed_out() && guard.value != 0 {
                return Err(Error::Timeout);
            }
        }
        guard.value = -1;
        Ok(())
    }

    /// Resets the lock to idle and wakes one waiter. Calling this without
    /// holding the writer lock is undefined behavior (not checked).
    pub fn release_writer(&self) -> Result<()> {
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        guard.value = 0;
        drop(guard);
        self.cvar.notify_one();
        Ok(())
    }

    /// Current internal value, for diagnostics/tests.
    pub fn value(&self) -> i64 {
        self.state.lock().map(|g| g.value).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn starts_idle() {
        let lock = RwLock::new();
        assert_eq!(lock.value(), 0);
    }

    #[test]
    fn multiple_readers_share_the_lock() {
        let lock = RwLock::new();
        lock.acquire_reader().unwrap();
        lock.acquire_reader().unwrap();
        lock.acquire_reader().unwrap();
        assert_eq!(lock.value(), 3);
        lock.release_reader().unwrap();
        lock.release_reader().unwrap();
        lock.release_reader().unwrap();
        assert_eq!(lock.value(), 0);
    }

    #[test]
    fn writer_excludes_further_writers_until_released() {
        let lock = Arc::new(RwLock::new());
        lock.acquire_writer().unwrap();
        assert_eq!(lock.value(), -1);

        let other = Arc::clone(&lock);
        let acquired = Arc::new(AtomicBool::new(false));
        let acquired_flag = Arc::clone(&acquired);
        let handle = std::thread::spawn(move || {
            other.acquire_writer().unwrap();
            acquired_flag.store(true, Ordering::SeqCst);
            other.release_writer().unwrap();
        });

        std::thread::sleep(Duration::from_millis(40));
        assert!(!acquired.load(Ordering::SeqCst));
        lock.release_writer().unwrap();
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn writer_waits_for_all_readers_to_release() {
        let lock = Arc::new(RwLock::new());
        lock.acquire_reader().unwrap();
        lock.acquire_reader().unwrap();

        let writer_lock = Arc::clone(&lock);
        let writer_acquired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&writer_acquired);
        let handle = std::thread::spawn(move || {
            writer_lock.acquire_writer().unwrap();
            flag.store(true, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(40));
        assert!(!writer_acquired.load(Ordering::SeqCst));

        lock.release_reader().unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert!(!writer_acquired.load(Ordering::SeqCst));

        lock.release_reader().unwrap();
        handle.join().unwrap();
        assert!(writer_acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn timed_reader_acquire_fails_while_writer_holds_lock() {
        let lock = RwLock::new();
        lock.acquire_writer().unwrap();
        let start = Instant::now();
        let result = lock.acquire_reader_timed(80);
        assert_eq!(result, Err(Error::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(75));
    }

    #[test]
    fn timed_writer_acquire_succeeds_within_deadline() {
        let lock = Arc::new(RwLock::new());
        lock.acquire_reader().unwrap();

        let releaser = Arc::clone(&lock);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            releaser.release_reader().unwrap();
        });

        assert_eq!(lock.acquire_writer_timed(500), Ok(()));
    }

    #[test]
    fn rejects_non_positive_timeouts() {
        let lock = RwLock::new();
        assert_eq!(lock.acquire_reader_timed(0).err(), Some(Error::InvalidArgument));
        assert_eq!(lock.acquire_writer_timed(-1).err(), Some(Error::InvalidArgument));
    }
}

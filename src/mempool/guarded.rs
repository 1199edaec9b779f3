//! Shared protected/unprotected interior-mutability helper.
//!
//! Both [`super::FixedPool`] and [`super::Arena`] support a "protected" mode
//! (an internal mutex guards every public operation) and an "unprotected"
//! mode (no synchronization at all; the caller warrants single-threaded
//! use). Rather than duplicating that branch in both allocators, they
//! share this enum.

use std::cell::UnsafeCell;
use std::sync::Mutex;

use crate::error::Error;

pub(crate) enum Guarded<T> {
    Protected(Mutex<T>),
    Unprotected(UnsafeCell<T>),
}

impl<T> Guarded<T> {
    pub(crate) fn new(value: T, protected: bool) -> Self {
        if protected {
            Guarded::Protected(Mutex::new(value))
        } else {
            Guarded::Unprotected(UnsafeCell::new(value))
        }
    }

    /// Runs `f` with exclusive access to the guarded value. In protected
    /// mode this blocks on the internal mutex; in unprotected mode it is a
    /// direct, unsynchronized borrow — sound only because the constructor's
    /// `protected: false` contract obligates the caller to single-thread
    /// all access to this pool/arena.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        match self {
            Guarded::Protected(mutex) => {
                let mut guard = mutex.lock().map_err(|_| Error::Internal)?;
                Ok(f(&mut guard))
            }
            // SAFETY: `protected == false` is a construction-time contract
            // that the caller will never access this pool/arena from more
            // than one thread concurrently.
            Guarded::Unprotected(cell) => Ok(f(unsafe { &mut *cell.get() })),
        }
    }
}

// SAFETY: `Guarded::Unprotected` is sound to move between threads (only one
// thread touches it at a time per the caller's contract) and, per that same
// contract, sound to share behind `&Guarded` as long as the caller upholds
// single-threaded access. `Guarded::Protected` is the ordinary `Mutex<T>`
// case. Both require `T: Send` to move `T` across the thread boundary.
unsafe impl<T: Send> Send for Guarded<T> {}
unsafe impl<T: Send> Sync for Guarded<T> {}

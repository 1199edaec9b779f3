//! Crate-wide error taxonomy.
//!
//! Every public operation in this crate returns [`Result<T>`], a thin alias
//! over a single shared [`Error`] enum: a hand-rolled enum with manual
//! `Display` and a marker `std::error::Error` impl, rather than giving
//! every subsystem its own enum. A shared enum is appropriate here because
//! the five kinds below are the same five kinds every subsystem in this
//! crate can produce.
//!
//! | Variant            | Meaning                                                     |
//! |---------------------|-------------------------------------------------------------|
//! | [`Error::InvalidArgument`] | Null/zero/negative/misuse input (e.g. `op(0)`).      |
//! | [`Error::ResourceExhausted`] | Allocator/pool/worker capacity reached.            |
//! | [`Error::Timeout`]  | Deadline elapsed in a timed variant.                        |
//! | [`Error::Corruption`] | Magic-marker mismatch on a pointer handed back to a pool. |
//! | [`Error::Internal`] | The underlying OS/std primitive failed unexpectedly.        |

use core::fmt;

/// The five error kinds a primitive in this crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Null required input, zero/negative size, or a misused argument
    /// (e.g. `Semaphore::op(0)`, a non-positive timeout).
    InvalidArgument,
    /// An allocator returned no span, a pool was empty, or a thread pool's
    /// live-worker count is already at its configured maximum.
    ResourceExhausted,
    /// A timed operation's deadline elapsed before its precondition held.
    Timeout,
    /// A pointer handed back to a pool carried a magic-marker mismatch,
    /// meaning it was freed to the wrong pool or freed twice.
    Corruption,
    /// The underlying mutex/condvar/thread primitive failed unexpectedly.
    /// Recovery is not attempted; this should not occur in practice.
    Internal,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidArgument => "invalid argument",
            Error::ResourceExhausted => "resource exhausted",
            Error::Timeout => "operation timed out",
            Error::Corruption => "pool/arena magic marker mismatch",
            Error::Internal => "internal synchronization primitive failure",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias. Every public operation returns this, except a
/// few (e.g. `FixedPool::alloc`) that return `Option<T>` directly — an
/// empty free list is the expected steady-state outcome of a saturated
/// pool, not an exceptional one.
pub type Result<T> = core::result::Result<T, Error>;

//! Concurrency and resource-management primitives: a counting semaphore,
//! a reader/writer lock, a sense-reversing barrier, a fixed-size memory
//! pool, a variable-size arena, a bounded blocking queue, a thread pool
//! with futures, a red/black tree sorted map, and a segmented list.
//!
//! Every primitive here is built on `std::sync::{Mutex, Condvar}` monitors
//! rather than raw platform synchronization calls.

pub mod collections;
pub mod deadline;
pub mod error;
pub mod mempool;
pub mod pool;
pub mod queue;
pub mod sync;

pub use collections::{RbTreeMap, SegmentedList};
pub use deadline::Deadline;
pub use error::{Error, Result};
pub use mempool::{Arena, ArenaPtr, FixedPool, FixedPoolPtr};
pub use pool::{Future, ThreadPool};
pub use queue::BoundedQueue;
pub use sync::{Barrier, RwLock, Semaphore};

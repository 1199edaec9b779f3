//! Synchronization substrate: counting semaphore, reader/writer lock, and
//! sense-reversing barrier. All three are leaf primitives — none of them
//! acquires a lock belonging to another module in this crate.

mod barrier;
mod rwlock;
mod semaphore;

pub use barrier::Barrier;
pub use rwlock::RwLock;
pub use semaphore::Semaphore;

//! Thread pool and futures, built on [`crate::sync::Semaphore`].

mod future;
mod thread_pool;

pub use future::Future;
pub use thread_pool::ThreadPool;

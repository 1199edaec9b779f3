//! Bounded producer/consumer queue, built on [`crate::sync`] and
//! [`crate::mempool`].

mod bounded_queue;

pub use bounded_queue::BoundedQueue;

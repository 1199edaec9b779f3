//! Memory pools: a fixed-cell pool and a variable-size arena, both built
//! directly on raw blocks rather than on the system allocator, sharing
//! the [`guarded`] protected/unprotected mode and the [`backing`]
//! owned/caller-supplied block representation.

mod arena;
mod backing;
mod fixed_pool;
mod guarded;

pub use arena::{Arena, ArenaPtr};
pub use fixed_pool::{FixedPool, FixedPoolPtr};

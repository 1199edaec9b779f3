//! Bounded blocking FIFO queue.
//!
//! Two [`Semaphore`]s — `slots` (free capacity) and `items` (occupied
//! capacity) — plus a `Mutex`-guarded intrusive list. Every live node holds
//! a cell from a [`FixedPool`] of depth `capacity` for its entire lifetime:
//! the cell's bytes carry the node's own heap address, allocated in
//! `push_back` when the node is created and freed in `pop_front` when the
//! node is torn down, so the pool's exhaustion state tracks real node
//! lifetime rather than the queue's nominal occupancy alone. Timed variants
//! apply the deadline only to the first semaphore wait (a "loose" timeout
//! contract); once that wait succeeds, the remaining bounded-time mutex
//! operations are not deadline-checked.

use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::mempool::{FixedPool, FixedPoolPtr};
use crate::sync::Semaphore;

/// Each node cell holds one heap-pointer-sized handle.
const HANDLE_CELL_SIZE: usize = core::mem::size_of::<usize>();

/// A bounded FIFO, strict across all producers and consumers by enqueue
/// order.
pub struct BoundedQueue<T> {
    slots: Semaphore,
    items: Semaphore,
    list: Mutex<RawList<T>>,
}

/// The mutex-guarded list state: a singly-linked chain of boxed nodes, each
/// one holding a pool cell for as long as the node itself is live.
struct RawList<T> {
    head: Option<Box<LinkedNode<T>>>,
    tail: *mut LinkedNode<T>,
    pool: FixedPool,
}

struct LinkedNode<T> {
    value: T,
    next: Option<Box<LinkedNode<T>>>,
    cell: FixedPoolPtr,
}

// SAFETY: `tail` only ever points at a node owned by this same `RawList`
// (reachable from `head`), and is only read/written under the queue's
// mutex; it carries no independent aliasing.
unsafe impl<T: Send> Send for RawList<T> {}

impl<T> BoundedQueue<T> {
    /// `capacity` must be `> 0`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument);
        }
        // The node pool exists to bound total node allocations to
        // `capacity` exactly; a cell is alloc'd when a node is created and
        // freed when it is torn down, so pool exhaustion tracks real node
        // lifetime rather than just a parallel counter.
        let pool = FixedPool::create(HANDLE_CELL_SIZE, capacity, true)?;
        Ok(BoundedQueue {
            slots: Semaphore::new(capacity as i64)?,
            items: Semaphore::new(capacity as i64)?,
            list: Mutex::new(RawList {
                head: None,
                tail: core::ptr::null_mut(),
                pool,
            }),
        })
    }

    fn push_back(&self, value: T) -> Result<()> {
        let mut guard = self.list.lock().map_err(|_| Error::Internal)?;
        let cell = guard.pool.alloc().ok_or(Error::ResourceExhausted)?;

        let mut node = Box::new(LinkedNode {
            value,
            next: None,
            cell,
        });
        let raw: *mut LinkedNode<T> = &mut *node;
        // The cell now records the node's own heap address for as long as
        // the node is live; it is freed back to the pool only when the
        // node is popped, so the cell's lifetime matches the node's.
        guard
            .pool
            .as_mut_slice(&mut node.cell)
            .copy_from_slice(&(raw as usize).to_ne_bytes());

        match guard.head {
            Some(_) => {
                // SAFETY: `tail` is non-null whenever `head` is `Some`, and
                // points at the last node reachable from `head`.
                unsafe { (*guard.tail).next = Some(node) };
            }
            None => guard.head = Some(node),
        }
        guard.tail = raw;
        Ok(())
    }

    fn pop_front(&self) -> Result<T> {
        let mut guard = self.list.lock().map_err(|_| Error::Internal)?;
        let mut front = guard.head.take().ok_or(Error::Internal)?;
        guard.head = front.next.take();
        if guard.head.is_none() {
            guard.tail = core::ptr::null_mut();
        }
        let LinkedNode { value, cell, .. } = *front;
        guard.pool.free(cell)?;
        Ok(value)
    }

    /// Blocks while the queue is full.
    pub fn enqueue(&self, value: T) -> Result<()> {
        self.slots.down()?;
        if let Err(e) = self.push_back(value) {
            // Restore `slots` on failure between the slot wait and the
            // items signal.
            let _ = self.slots.up();
            return Err(e);
        }
        self.items.up()?;
        Ok(())
    }

    /// Blocks while the queue is empty.
    pub fn dequeue(&self) -> Result<T> {
        self.items.down()?;
        let value = self.pop_front()?;
        self.slots.up()?;
        Ok(value)
    }

    /// Timed enqueue. Only the initial `slots` wait is deadline-checked.
    pub fn timed_enqueue(&self, value: T, timeout_millis: i64) -> Result<()> {
        self.slots.timed_op(-1, timeout_millis)?;
        if let Err(e) = self.push_back(value) {
            let _ = self.slots.up();
            return Err(e);
        }
        self.items.up()?;
        Ok(())
    }

    /// Timed dequeue. Only the initial `items` wait is deadline-checked.
    pub fn timed_dequeue(&self, timeout_millis: i64) -> Result<T> {
        self.items.timed_op(-1, timeout_millis)?;
        let value = self.pop_front()?;
        self.slots.up()?;
        Ok(value)
    }
}

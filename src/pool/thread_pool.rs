//! Thread pool with futures.
//!
//! A pool built on a fixed-size task-stealing runtime works well for a
//! constant worker count, but has no concept of per-worker identity or
//! elastic growth. This pool tracks individual worker records (mailbox,
//! join handle, availability state) in an array and grows the *elastic*
//! variant by spawning a genuinely new OS thread on demand — so it is
//! built directly on `std::thread::spawn` rather than handing jobs to an
//! external work-stealing pool, keeping the familiar "bounded submission
//! via a counting permit, job as a boxed closure, `Drop` drains and joins"
//! shape.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use super::Future;
use crate::error::{Error, Result};
use crate::sync::Semaphore;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Work(Job),
    Shutdown,
}

/// A worker's private mailbox: the monitor backing its "work available"
/// wait and pending-message slot in the worker loop.
struct Mailbox {
    msg: Mutex<Option<Message>>,
    cvar: Condvar,
}

impl Mailbox {
    fn new() -> Self {
        Mailbox {
            msg: Mutex::new(None),
            cvar: Condvar::new(),
        }
    }

    fn post(&self, message: Message) {
        let mut guard = self.msg.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(message);
        drop(guard);
        self.cvar.notify_one();
    }

    fn take(&self) -> Message {
        let mut guard = self.msg.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(message) = guard.take() {
                return message;
            }
            guard = self.cvar.wait(guard).unwrap_or_else(|e| e.into_inner());
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Elastic-only: this index has never had a worker spawned for it.
    NotSpawned,
    Available,
    Busy,
}

struct WorkerSlot {
    state: SlotState,
    mailbox: Arc<Mailbox>,
    handle: Option<JoinHandle<()>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Variant {
    Fixed,
    Elastic,
}

struct Shared {
    variant: Variant,
    max: usize,
    /// One permit per worker slot that is either idle or not yet spawned.
    /// A granted permit does not always correspond to an
    /// already-marked-available worker — it may instead license spawning
    /// a brand new one.
    available: Semaphore,
    slots: Mutex<Vec<WorkerSlot>>,
    live: AtomicUsize,
}

/// A pool of worker threads executing boxed jobs and publishing results
/// through [`Future`] handles.
pub struct ThreadPool {
    shared: Arc<Shared>,
}

fn spawn_worker(shared: &Arc<Shared>, index: usize, mailbox: Arc<Mailbox>) -> Result<JoinHandle<()>> {
    let shared = Arc::clone(shared);
    std::thread::Builder::new()
        .spawn(move || worker_loop(shared, index, mailbox))
        .map_err(|_| Error::ResourceExhausted)
}

/// The per-worker dispatch loop: wait for work, run it, publish the
/// result, mark self available again.
fn worker_loop(shared: Arc<Shared>, index: usize, mailbox: Arc<Mailbox>) {
    loop {
        match mailbox.take() {
            Message::Work(job) => {
                job();
                let mut slots = shared.slots.lock().unwrap_or_else(|e| e.into_inner());
                slots[index].state = SlotState::Available;
                drop(slots);
                let _ = shared.available.up();
            }
            Message::Shutdown => return,
        }
    }
}

impl ThreadPool {
    fn build(min: usize, max: usize, variant: Variant) -> Result<Self> {
        if min == 0 || max < min {
            return Err(Error::InvalidArgument);
        }
        let available = Semaphore::new(max as i64)?;
        let mut slots = Vec::with_capacity(max);
        for _ in 0..max {
            slots.push(WorkerSlot {
                state: SlotState::NotSpawned,
                mailbox: Arc::new(Mailbox::new()),
                handle: None,
            });
        }

        let shared = Arc::new(Shared {
            variant,
            max,
            available,
            slots: Mutex::new(slots),
            live: AtomicUsize::new(0),
        });

        for index in 0..min {
            let mailbox = {
                let slots = shared.slots.lock().unwrap_or_else(|e| e.into_inner());
                Arc::clone(&slots[index].mailbox)
            };
            let handle = spawn_worker(&shared, index, mailbox)?;
            let mut slots = shared.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots[index].state = SlotState::Available;
            slots[index].handle = Some(handle);
        }
        shared.live.store(min, Ordering::SeqCst);

        Ok(ThreadPool { shared })
    }

    /// A fixed-size pool of exactly `n` workers, all spawned up front.
    pub fn fixed(n: usize) -> Result<Self> {
        Self::build(n, n, Variant::Fixed)
    }

    /// Starts with `min` workers, spawning additional workers up to `max`
    /// on demand. Never shrinks back below its high-water mark.
    pub fn elastic(min: usize, max: usize) -> Result<Self> {
        Self::build(min, max, Variant::Elastic)
    }

    /// A fixed pool sized to the host's available parallelism.
    pub fn fixed_for_available_parallelism() -> Result<Self> {
        Self::fixed(num_cpus::get())
    }

    /// Submits `job`, blocking while no worker is available (the
    /// backpressure point), and returns a [`Future`] the caller later
    /// [`join`](Future::join)s for the result.
    pub fn execute<T, F>(&self, job: F) -> Result<Arc<Future<T>>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let future = Arc::new(Future::new());
        let future_for_job = Arc::clone(&future);
        let boxed: Job = Box::new(move || {
            let result = job();
            future_for_job.complete(result);
        });

        self.shared.available.down()?;

        let (index, newly_spawned) = {
            let mut slots = self.shared.slots.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(i) = slots.iter().position(|s| s.state == SlotState::Available) {
                slots[i].state = SlotState::Busy;
                (i, None)
            } else if self.shared.variant == Variant::Elastic
                && self.shared.live.load(Ordering::SeqCst) < self.shared.max
            {
                let i = slots
                    .iter()
                    .position(|s| s.state == SlotState::NotSpawned)
                    .expect("an elastic pool below max must have an unspawned slot");
                slots[i].state = SlotState::Busy;
                (i, Some(Arc::clone(&slots[i].mailbox)))
            } else {
                // The semaphore granted a permit with no available worker and
                // no room to grow: the availability bookkeeping is broken.
                let _ = self.shared.available.up();
                return Err(Error::Internal);
            }
        };

        if let Some(mailbox) = newly_spawned {
            let handle = spawn_worker(&self.shared, index, mailbox)?;
            let mut slots = self.shared.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots[index].handle = Some(handle);
            drop(slots);
            self.shared.live.fetch_add(1, Ordering::SeqCst);
        }

        let mailbox = {
            let slots = self.shared.slots.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(&slots[index].mailbox)
        };
        mailbox.post(Message::Work(boxed));

        Ok(future)
    }

    /// Current number of spawned OS threads (`<= max`, `>= min`).
    pub fn live_workers(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }
}

impl Drop for ThreadPool {
    /// (a) drains by acquiring `available` `max` times, ensuring no worker
    /// is currently busy and no submission is mid-flight holding a permit;
    /// (b) signals every spawned worker to exit and joins its OS thread;
    /// (c) the pool's structures are released as the surrounding
    /// `Arc<Shared>` drops. Submissions concurrent with drop are undefined.
    fn drop(&mut self) {
        let _ = self.shared.available.op(-(self.shared.max as i64));

        let handles: Vec<(Arc<Mailbox>, JoinHandle<()>)> = {
            let mut slots = self.shared.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots
                .iter_mut()
                .filter_map(|s| s.handle.take().map(|h| (Arc::clone(&s.mailbox), h)))
                .collect()
        };
        for (mailbox, handle) in handles {
            mailbox.post(Message::Shutdown);
            let _ = handle.join();
        }
    }
}

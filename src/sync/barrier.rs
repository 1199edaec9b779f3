//! N-way rendezvous barrier with sense reversal.
//!
//! Avoids the classic double-barrier bug where a fast thread from
//! generation *k+1* races a slow thread of generation *k* out of its wait:
//! each waiter captures the sense bit on entry and waits only while it is
//! still equal to that captured value, rather than waiting for an
//! arrival-count threshold that a later generation could also satisfy.

use std::sync::{Condvar, Mutex};

use crate::error::{Error, Result};

struct State {
    arrived: usize,
    sense: bool,
}

/// A reusable barrier for exactly `n` participants per generation.
pub struct Barrier {
    n: usize,
    state: Mutex<State>,
    cvar: Condvar,
}

impl Barrier {
    /// Creates a barrier requiring `n` arrivals per generation. `n` must be
    /// `> 0`.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(Barrier {
            n,
            state: Mutex::new(State {
                arrived: 0,
                sense: false,
            }),
            cvar: Condvar::new(),
        })
    }

    /// Blocks the calling thread until all `n` participants of the current
    /// generation have called `sync`. The last arriver flips the sense bit,
    /// resets the arrival count, and wakes everyone else.
    pub fn sync(&self) -> Result<()> {
        let mut guard = self.state.lock().map_err(|_| Error::Internal)?;
        let my_sense = guard.sense;
        guard.arrived += 1;
        if guard.arrived == self.n {
            guard.arrived = 0;
            guard.sense = !guard.sense;
            drop(guard);
            self.cvar.notify_all();
            return Ok(());
        }
        while guard.sense == my_sense {
            guard = self.cvar.wait(guard).map_err(|_| Error::Internal)?;
        }
        Ok(())
    }
}

//! Growable, indexed sequence of `i64`s stored in fixed-capacity rows.
//!
//! Element `i` lives at row `i / ROW_SIZE`, offset `i % ROW_SIZE`. The row
//! directory is a `Vec` of owned row buffers rather than a doubled raw
//! array of row pointers — `Vec::push` already amortizes the directory's
//! own growth, so there is nothing left for a hand-rolled doubling scheme
//! to add. The design target is cache-friendly append and indexed access;
//! `remove_at` is deliberately O(n), shifting every following element
//! down by one row boundary.

use crate::error::{Error, Result};
use crate::sync::RwLock;

/// Elements per row. A tunable constant; construct with
/// [`SegmentedList::with_row_size`] for a non-default value.
pub const DEFAULT_ROW_SIZE: usize = 128;

struct Rows {
    rows: Vec<Vec<i64>>,
    row_size: usize,
    len: usize,
}

impl Rows {
    fn new(row_size: usize) -> Self {
        Rows {
            rows: Vec::new(),
            row_size,
            len: 0,
        }
    }

    fn get(&self, index: usize) -> Option<i64> {
        if index >= self.len {
            return None;
        }
        Some(self.rows[index / self.row_size][index % self.row_size])
    }

    fn set(&mut self, index: usize, value: i64) -> bool {
        if index >= self.len {
            return false;
        }
        self.rows[index / self.row_size][index % self.row_size] = value;
        true
    }

    fn append(&mut self, value: i64) {
        let row = self.len / self.row_size;
        if row == self.rows.len() {
            self.rows.push(Vec::with_capacity(self.row_size));
        }
        self.rows[row].push(value);
        self.len += 1;
    }

    fn remove_at(&mut self, index: usize) -> Option<i64> {
        if index >= self.len {
            return None;
        }
        let removed = self.get(index).unwrap();
        for i in index..self.len - 1 {
            let next = self.get(i + 1).unwrap();
            self.set(i, next);
        }
        self.len -= 1;
        let rows_needed = self.len.div_ceil(self.row_size);
        self.rows.truncate(rows_needed);
        if let Some(last) = self.rows.last_mut() {
            let used_in_last = self.len - (rows_needed - 1) * self.row_size;
            last.truncate(used_in_last);
        }
        Some(removed)
    }

    fn index_of(&self, value: i64) -> Option<usize> {
        (0..self.len).find(|&i| self.get(i) == Some(value))
    }

    fn to_vec(&self) -> Vec<i64> {
        (0..self.len).map(|i| self.get(i).unwrap()).collect()
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.len = 0;
    }
}

/// An indexed sequence of `i64`s with an optional reader/writer lock.
pub struct SegmentedList {
    lock: Option<RwLock>,
    rows: std::cell::UnsafeCell<Rows>,
}

// SAFETY: when `lock` is `Some`, every public method acquires it (reader
// for lookups, writer for mutation) before touching `rows`; when `lock` is
// `None` the constructor contract obligates the caller to single-thread
// all access.
unsafe impl Send for SegmentedList {}
unsafe impl Sync for SegmentedList {}

struct ReadGuard<'a>(Option<&'a RwLock>);
impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.0 {
            let _ = lock.release_reader();
        }
    }
}

struct WriteGuard<'a>(Option<&'a RwLock>);
impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.0 {
            let _ = lock.release_writer();
        }
    }
}

impl SegmentedList {
    /// 128 elements per row, synchronized.
    pub fn new() -> Self {
        Self::with_row_size(DEFAULT_ROW_SIZE, true)
    }

    /// As [`SegmentedList::new`], but with a tunable row size and an
    /// optional reader/writer lock (`synchronized = false` means the
    /// caller warrants single-threaded use, same contract as
    /// [`crate::mempool::FixedPool`]'s unprotected mode).
    pub fn with_row_size(row_size: usize, synchronized: bool) -> Self {
        SegmentedList {
            lock: synchronized.then(RwLock::new),
            rows: std::cell::UnsafeCell::new(Rows::new(row_size.max(1))),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Rows) -> R) -> Result<R> {
        let _guard = match &self.lock {
            Some(lock) => {
                lock.acquire_reader()?;
                ReadGuard(Some(lock))
            }
            None => ReadGuard(None),
        };
        // SAFETY: the read guard (or the caller's single-threaded-use
        // contract when unsynchronized) excludes concurrent writers.
        Ok(f(unsafe { &*self.rows.get() }))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Rows) -> R) -> Result<R> {
        let _guard = match &self.lock {
            Some(lock) => {
                lock.acquire_writer()?;
                WriteGuard(Some(lock))
            }
            None => WriteGuard(None),
        };
        // SAFETY: the write guard (or the caller's single-threaded-use
        // contract when unsynchronized) excludes every other access.
        Ok(f(unsafe { &mut *self.rows.get() }))
    }

    /// Logical element count.
    pub fn size(&self) -> Result<usize> {
        self.read(|r| r.len)
    }

    /// Returns the element at `index`.
    pub fn get(&self, index: usize) -> Result<i64> {
        self.read(|r| r.get(index)).and_then(|v| v.ok_or(Error::InvalidArgument))
    }

    /// Overwrites the element at `index`.
    pub fn set(&self, index: usize, value: i64) -> Result<()> {
        self.write(|r| r.set(index, value))
            .and_then(|ok| if ok { Ok(()) } else { Err(Error::InvalidArgument) })
    }

    /// Amortized O(1): grows the row directory (via `Vec::push`) only
    /// when the current row is full.
    pub fn append(&self, value: i64) -> Result<()> {
        self.write(|r| r.append(value))
    }

    /// O(n): shifts every following element down by one logical slot.
    pub fn remove_at(&self, index: usize) -> Result<i64> {
        self.write(|r| r.remove_at(index))
            .and_then(|v| v.ok_or(Error::InvalidArgument))
    }

    /// Empties the list without shrinking row capacity eagerly (rows are
    /// simply dropped).
    pub fn clear(&self) -> Result<()> {
        self.write(|r| r.clear())
    }

    /// Linear scan, first match.
    pub fn index_of(&self, value: i64) -> Result<Option<usize>> {
        self.read(|r| r.index_of(value))
    }

    /// Copies every element out in order.
    pub fn to_array(&self) -> Result<Vec<i64>> {
        self.read(|r| r.to_vec())
    }
}

impl Default for SegmentedList {
    fn default() -> Self {
        Self::new()
    }
}

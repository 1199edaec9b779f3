//! Fixed-size pool: O(1) allocator of uniform cells from a contiguous block.
//!
//! `free` is a method on [`FixedPool`] itself — the type system already
//! routes the call to the right pool — and each cell's header word holds a
//! per-instance tag validated on free, catching a pointer freed to the
//! wrong pool or freed twice ([`Error::Corruption`]).

use std::sync::atomic::{AtomicUsize, Ordering};

use super::backing::Backing;
use super::guarded::Guarded;
use crate::error::{Error, Result};

const WORD: usize = core::mem::size_of::<usize>();
/// Sentinel "no next free cell" value. Cell indices never reach this, so it
/// cannot collide with a real link.
const NO_NEXT: usize = usize::MAX;

/// Base for per-pool identity tags, chosen to be far larger than any
/// realistic `num_cells`, so a tag is never confused with a free-list index.
const TAG_BASE: usize = 0x00C0_FFEE;
static NEXT_TAG: AtomicUsize = AtomicUsize::new(TAG_BASE);

struct Inner {
    backing: Backing,
    free_head: Option<usize>,
}

/// A pool of `num_cells` fixed-size cells, handed out and reclaimed in O(1).
pub struct FixedPool {
    guarded: Guarded<Inner>,
    cell_size: usize,
    num_cells: usize,
    stride: usize,
    tag: usize,
}

/// An allocated cell. Opaque by design: callers hold a handle, never a
/// raw pointer into the pool's backing block.
pub struct FixedPoolPtr {
    index: usize,
}

impl Inner {
    /// Reads the leading header word of cell `index`.
    unsafe fn read_header(&self, stride: usize, index: usize) -> usize {
        let cell = self.backing.base_ptr().add(index * stride) as *const usize;
        cell.read()
    }

    unsafe fn write_header(&mut self, stride: usize, index: usize, value: usize) {
        let cell = self.backing.base_ptr().add(index * stride) as *mut usize;
        cell.write(value);
    }

    unsafe fn user_ptr(&self, stride: usize, index: usize) -> *mut u8 {
        self.backing.base_ptr().add(index * stride + WORD)
    }
}

impl FixedPool {
    fn new_inner(
        backing: Backing,
        cell_size: usize,
        num_cells: usize,
        protected: bool,
    ) -> Result<Self> {
        if cell_size == 0 || num_cells == 0 {
            return Err(Error::InvalidArgument);
        }
        let stride = WORD + cell_size;
        if backing.len() < stride * num_cells {
            return Err(Error::InvalidArgument);
        }

        let mut inner = Inner {
            backing,
            free_head: if num_cells > 0 { Some(0) } else { None },
        };
        // SAFETY: the block is freshly sized to `stride * num_cells`; every
        // cell index below is in bounds.
        unsafe {
            for i in 0..num_cells {
                let next = if i + 1 < num_cells { i + 1 } else { NO_NEXT };
                inner.write_header(stride, i, next);
            }
        }

        Ok(FixedPool {
            guarded: Guarded::new(inner, protected),
            cell_size,
            num_cells,
            stride,
            tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Allocates and owns a `(cell_size + word) * num_cells` block.
    pub fn create(cell_size: usize, num_cells: usize, protected: bool) -> Result<Self> {
        let stride = WORD + cell_size;
        let block = vec![0u8; stride.saturating_mul(num_cells)].into_boxed_slice();
        Self::new_inner(Backing::Owned(block), cell_size, num_cells, protected)
    }

    /// Same as [`create`](Self::create), over a caller-supplied block.
    ///
    /// # Safety
    /// `block` must point to at least `block_len` valid, writable bytes for
    /// the entire lifetime of the returned `FixedPool`, and must not be
    /// accessed by anything else while the pool is alive.
    pub unsafe fn create_from_block(
        cell_size: usize,
        num_cells: usize,
        block: *mut u8,
        block_len: usize,
        protected: bool,
    ) -> Result<Self> {
        if block.is_null() {
            return Err(Error::InvalidArgument);
        }
        Self::new_inner(
            Backing::Borrowed {
                ptr: block,
                len: block_len,
            },
            cell_size,
            num_cells,
            protected,
        )
    }

    /// Pops a cell from the free list. Returns `None` when the pool is
    /// exhausted — the expected steady state of a saturated pool, not an
    /// error condition.
    pub fn alloc(&self) -> Option<FixedPoolPtr> {
        let stride = self.stride;
        let tag = self.tag;
        self.guarded
            .with(|inner| {
                let index = inner.free_head?;
                // SAFETY: `index` came from the free list, so it is a valid
                // cell index whose header we are about to overwrite.
                let next = unsafe { inner.read_header(stride, index) };
                inner.free_head = if next == NO_NEXT { None } else { Some(next) };
                unsafe { inner.write_header(stride, index, tag) };
                Some(FixedPoolPtr { index })
            })
            .ok()
            .flatten()
    }

    /// Validates `ptr`'s header tag, then pushes it back onto the free
    /// list. Returns [`Error::Corruption`] if the
    /// header does not carry this pool's tag (freed twice, or a handle from
    /// a different pool).
    pub fn free(&self, ptr: FixedPoolPtr) -> Result<()> {
        if ptr.index >= self.num_cells {
            return Err(Error::Corruption);
        }
        let stride = self.stride;
        let tag = self.tag;
        self.guarded.with(move |inner| {
            // SAFETY: `ptr.index < self.num_cells`, checked above.
            let header = unsafe { inner.read_header(stride, ptr.index) };
            if header != tag {
                return Err(Error::Corruption);
            }
            let next = inner.free_head.unwrap_or(NO_NEXT);
            unsafe { inner.write_header(stride, ptr.index, next) };
            inner.free_head = Some(ptr.index);
            Ok(())
        })?
    }

    /// Borrows the cell's user region as bytes.
    pub fn as_slice<'a>(&'a self, ptr: &'a FixedPoolPtr) -> &'a [u8] {
        let stride = self.stride;
        let cell_size = self.cell_size;
        // SAFETY: `ptr` was produced by `alloc` on this pool and has not
        // been freed (the caller still holds it), so its user region is
        // live and exclusively described by this borrow's lifetime.
        unsafe {
            let inner_ptr = self
                .guarded
                .with(|inner| inner.user_ptr(stride, ptr.index))
                .unwrap_or(core::ptr::null_mut());
            core::slice::from_raw_parts(inner_ptr, cell_size)
        }
    }

    /// Mutably borrows the cell's user region as bytes.
    pub fn as_mut_slice<'a>(&'a self, ptr: &'a mut FixedPoolPtr) -> &'a mut [u8] {
        let stride = self.stride;
        let cell_size = self.cell_size;
        unsafe {
            let inner_ptr = self
                .guarded
                .with(|inner| inner.user_ptr(stride, ptr.index))
                .unwrap_or(core::ptr::null_mut());
            core::slice::from_raw_parts_mut(inner_ptr, cell_size)
        }
    }

    /// Requests that the OS lock this pool's backing block in RAM
    /// (`mlock`), preventing it from being paged out.
    pub fn pin(&self) -> Result<()> {
        self.guarded.with(|inner| {
            let ptr = inner.backing.base_ptr();
            let len = inner.backing.len();
            // SAFETY: `ptr`/`len` describe this pool's own backing block.
            let rc = unsafe { libc::mlock(ptr as *const libc::c_void, len) };
            if rc != 0 {
                Err(Error::Internal)
            } else {
                Ok(())
            }
        })?
    }

    /// Requests that the OS unlock a previously [`pin`](Self::pin)ned block.
    pub fn unpin(&self) -> Result<()> {
        self.guarded.with(|inner| {
            let ptr = inner.backing.base_ptr();
            let len = inner.backing.len();
            // SAFETY: see `pin`.
            let rc = unsafe { libc::munlock(ptr as *const libc::c_void, len) };
            if rc != 0 {
                Err(Error::Internal)
            } else {
                Ok(())
            }
        })?
    }

    /// Size in bytes reserved for each cell's user-visible payload.
    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// Total number of cells this pool was created with.
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }
}

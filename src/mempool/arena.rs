//! Variable-size arena: a single contiguous block sub-allocated into
//! variable-length spans, with an address-ordered free list and eager
//! adjacent-block coalescing.
//!
//! Free spans are the free list's own nodes: a free span of `size` bytes
//! starting at offset `o` stores, as three machine words, `{size, prev,
//! next}`; an allocated span stores two words, `{tag, size}`, followed by
//! the user's bytes. `prev`/`next` are byte *offsets* into the arena's
//! block rather than raw pointers — address comparisons (the free list's
//! address-sort invariant, and adjacency checks for coalescing) become
//! ordinary integer comparisons, and the arena's block can be an owned
//! `Box<[u8]>` without any self-referential-pointer bookkeeping. The
//! header's first word records a per-arena identity tag (see
//! [`FixedPool`](super::FixedPool) for the same substitution), validated
//! on [`Arena::free`].

use std::sync::atomic::{AtomicUsize, Ordering};

use super::backing::Backing;
use super::guarded::Guarded;
use crate::error::{Error, Result};

const WORD: usize = core::mem::size_of::<usize>();
const ALLOC_HEADER: usize = 2 * WORD;
const FREE_HEADER: usize = 3 * WORD;
/// Every span, free or allocated, must be at least this big so it can
/// re-enter the free list (as a `{size, prev, next}` node) on release.
const MIN_SPAN: usize = FREE_HEADER;
/// Splitting rule threshold: a remainder smaller than this is handed out
/// whole rather than split off.
const SPLIT_THRESHOLD: usize = 4 * WORD;

const NO_OFF: usize = usize::MAX;

/// Base for per-arena identity tags. Chosen well above any plausible arena
/// size so a free span's `size` word is never mistaken for an allocated
/// span's tag.
const TAG_BASE: usize = 0x7000_0000;
static NEXT_TAG: AtomicUsize = AtomicUsize::new(TAG_BASE);

struct Inner {
    backing: Backing,
    free_head: Option<usize>,
}

impl Inner {
    unsafe fn read_word(&self, offset: usize) -> usize {
        (self.backing.base_ptr().add(offset) as *const usize).read()
    }

    unsafe fn write_word(&mut self, offset: usize, value: usize) {
        (self.backing.base_ptr().add(offset) as *mut usize).write(value);
    }

    fn free_size(&self, o: usize) -> usize {
        unsafe { self.read_word(o) }
    }
    fn free_prev(&self, o: usize) -> Option<usize> {
        let v = unsafe { self.read_word(o + WORD) };
        (v != NO_OFF).then_some(v)
    }
    fn free_next(&self, o: usize) -> Option<usize> {
        let v = unsafe { self.read_word(o + 2 * WORD) };
        (v != NO_OFF).then_some(v)
    }
    fn set_free_size(&mut self, o: usize, v: usize) {
        unsafe { self.write_word(o, v) }
    }
    fn set_free_prev(&mut self, o: usize, v: Option<usize>) {
        unsafe { self.write_word(o + WORD, v.unwrap_or(NO_OFF)) }
    }
    fn set_free_next(&mut self, o: usize, v: Option<usize>) {
        unsafe { self.write_word(o + 2 * WORD, v.unwrap_or(NO_OFF)) }
    }

    fn alloc_tag(&self, o: usize) -> usize {
        unsafe { self.read_word(o) }
    }
    fn alloc_size(&self, o: usize) -> usize {
        unsafe { self.read_word(o + WORD) }
    }
    fn set_alloc_tag(&mut self, o: usize, v: usize) {
        unsafe { self.write_word(o, v) }
    }
    fn set_alloc_size(&mut self, o: usize, v: usize) {
        unsafe { self.write_word(o + WORD, v) }
    }

    /// Unlinks the free span at `span_off`, fixing up both neighbors and
    /// the head pointer.
    fn unlink_free(&mut self, span_off: usize) {
        let prev = self.free_prev(span_off);
        let next = self.free_next(span_off);
        match prev {
            Some(p) => self.set_free_next(p, next),
            None => self.free_head = next,
        }
        if let Some(n) = next {
            self.set_free_prev(n, prev);
        }
    }

    /// Inserts a freshly-freed span into the free list in address order.
    fn insert_free_sorted(&mut self, span_off: usize, size: usize) {
        self.set_free_size(span_off, size);
        let mut cur = self.free_head;
        let mut prev = None;
        while let Some(o) = cur {
            if o > span_off {
                break;
            }
            prev = Some(o);
            cur = self.free_next(o);
        }
        self.set_free_prev(span_off, prev);
        self.set_free_next(span_off, cur);
        match prev {
            Some(p) => self.set_free_next(p, Some(span_off)),
            None => self.free_head = Some(span_off),
        }
        if let Some(n) = cur {
            self.set_free_prev(n, Some(span_off));
        }
    }

    /// Eagerly merges `span_off` with a physically-adjacent next span and
    /// then with a physically-adjacent previous span, in that order:
    /// merging with next first keeps the size used for the prev check
    /// accurate.
    fn coalesce(&mut self, span_off: usize) {
        let size = self.free_size(span_off);
        if let Some(next_off) = self.free_next(span_off) {
            if span_off + size == next_off {
                let next_size = self.free_size(next_off);
                let next_next = self.free_next(next_off);
                self.set_free_size(span_off, size + next_size);
                self.set_free_next(span_off, next_next);
                if let Some(nn) = next_next {
                    self.set_free_prev(nn, Some(span_off));
                }
            }
        }

        let size = self.free_size(span_off);
        if let Some(prev_off) = self.free_prev(span_off) {
            if prev_off + self.free_size(prev_off) == span_off {
                let prev_size = self.free_size(prev_off);
                let span_next = self.free_next(span_off);
                self.set_free_size(prev_off, prev_size + size);
                self.set_free_next(prev_off, span_next);
                if let Some(sn) = span_next {
                    self.set_free_prev(sn, Some(prev_off));
                }
            }
        }
    }
}

/// A first-fit variable-size allocator over one contiguous block.
pub struct Arena {
    guarded: Guarded<Inner>,
    size: usize,
    tag: usize,
}

/// A handle to an allocated span. Opaque: callers hold a handle, never a
/// raw pointer arithmetic result.
pub struct ArenaPtr {
    offset: usize,
}

impl Arena {
    fn new_inner(backing: Backing, size: usize, protected: bool) -> Result<Self> {
        if size < MIN_SPAN {
            return Err(Error::InvalidArgument);
        }
        if backing.len() < size {
            return Err(Error::InvalidArgument);
        }
        let mut inner = Inner {
            backing,
            free_head: Some(0),
        };
        inner.set_free_size(0, size);
        inner.set_free_prev(0, None);
        inner.set_free_next(0, None);

        Ok(Arena {
            guarded: Guarded::new(inner, protected),
            size,
            tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Allocates and owns a block of `size` bytes, starting as one free
    /// span.
    pub fn create(size: usize, protected: bool) -> Result<Self> {
        let block = vec![0u8; size].into_boxed_slice();
        Self::new_inner(Backing::Owned(block), size, protected)
    }

    /// Same as [`create`](Self::create), over a caller-supplied block.
    ///
    /// # Safety
    /// `block` must point to at least `size` valid, writable bytes for the
    /// entire lifetime of the returned `Arena`, exclusively owned by it.
    pub unsafe fn create_from_block(
        block: *mut u8,
        size: usize,
        protected: bool,
    ) -> Result<Self> {
        if block.is_null() {
            return Err(Error::InvalidArgument);
        }
        Self::new_inner(Backing::Borrowed { ptr: block, len: size }, size, protected)
    }

    /// First-fit allocation with tail-splitting. Returns
    /// [`Error::ResourceExhausted`] when no free span is large enough; the
    /// arena never falls back to the system allocator.
    pub fn alloc(&self, requested: usize) -> Result<ArenaPtr> {
        if requested == 0 {
            return Err(Error::InvalidArgument);
        }
        let adjusted = (requested + ALLOC_HEADER).max(MIN_SPAN);
        let tag = self.tag;

        self.guarded.with(move |inner| {
            let mut cur = inner.free_head;
            let mut chosen = None;
            while let Some(o) = cur {
                if inner.free_size(o) >= adjusted {
                    chosen = Some(o);
                    break;
                }
                cur = inner.free_next(o);
            }
            let span_off = chosen.ok_or(Error::ResourceExhausted)?;
            let span_size = inner.free_size(span_off);
            let remainder = span_size - adjusted;

            if remainder < SPLIT_THRESHOLD {
                inner.unlink_free(span_off);
                inner.set_alloc_tag(span_off, tag);
                inner.set_alloc_size(span_off, span_size);
                Ok(ArenaPtr {
                    offset: span_off + ALLOC_HEADER,
                })
            } else {
                inner.set_free_size(span_off, remainder);
                let new_off = span_off + remainder;
                inner.set_alloc_tag(new_off, tag);
                inner.set_alloc_size(new_off, adjusted);
                Ok(ArenaPtr {
                    offset: new_off + ALLOC_HEADER,
                })
            }
        })?
    }

    /// Validates the span's tag, inserts it back into the free list in
    /// address order, and eagerly coalesces with physically-adjacent free
    /// neighbors.
    pub fn free(&self, ptr: ArenaPtr) -> Result<()> {
        let tag = self.tag;
        self.guarded.with(move |inner| {
            let span_off = ptr
                .offset
                .checked_sub(ALLOC_HEADER)
                .ok_or(Error::Corruption)?;
            if inner.alloc_tag(span_off) != tag {
                return Err(Error::Corruption);
            }
            let size = inner.alloc_size(span_off);
            inner.insert_free_sorted(span_off, size);
            inner.coalesce(span_off);
            Ok(())
        })?
    }

    /// Borrows the allocation's user-visible bytes. `len` must not exceed
    /// the size originally requested for `ptr`.
    pub fn as_slice<'a>(&'a self, ptr: &'a ArenaPtr, len: usize) -> &'a [u8] {
        let base = self
            .guarded
            .with(|inner| inner.backing.base_ptr())
            .unwrap_or(core::ptr::null_mut());
        // SAFETY: `ptr.offset` points past a live allocated span's header,
        // and `len` is bounded by the caller to the requested size.
        unsafe { core::slice::from_raw_parts(base.add(ptr.offset), len) }
    }

    /// Mutably borrows the allocation's user-visible bytes.
    pub fn as_mut_slice<'a>(&'a self, ptr: &'a mut ArenaPtr, len: usize) -> &'a mut [u8] {
        let base = self
            .guarded
            .with(|inner| inner.backing.base_ptr())
            .unwrap_or(core::ptr::null_mut());
        unsafe { core::slice::from_raw_parts_mut(base.add(ptr.offset), len) }
    }

    /// Total size of the arena's backing block.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Walks the whole block and confirms the invariants: the free list is
    /// address-sorted, spans tile the block exactly, and no two
    /// physically-adjacent free spans coexist. Exposed for tests and for
    /// hosts that opt into the `invariant-checks` feature.
    #[cfg(any(test, feature = "invariant-checks"))]
    pub fn check_invariants(&self) -> Result<()> {
        self.guarded.with(|inner| {
            // Free list must be strictly address-sorted.
            let mut last: Option<usize> = None;
            let mut cur = inner.free_head;
            while let Some(o) = cur {
                if let Some(l) = last {
                    if o <= l {
                        return Err(Error::Corruption);
                    }
                }
                last = Some(o);
                cur = inner.free_next(o);
            }

            // Walk the block span-by-span; spans must tile it exactly, and
            // two free spans must never be physically adjacent.
            let mut offset = 0usize;
            let mut total = 0usize;
            let mut prev_was_free = false;
            while offset < self.size {
                let tag_word = inner.alloc_tag(offset);
                let (size, is_free) = if tag_word == self.tag {
                    (inner.alloc_size(offset), false)
                } else {
                    (inner.free_size(offset), true)
                };
                if size < MIN_SPAN || offset + size > self.size {
                    return Err(Error::Corruption);
                }
                if is_free && prev_was_free {
                    return Err(Error::Corruption);
                }
                prev_was_free = is_free;
                total += size;
                offset += size;
            }
            if total != self.size {
                return Err(Error::Corruption);
            }
            Ok(())
        })?
    }
}

//! Shared "owned vs. caller-supplied" block storage for the two allocators
//! in this module ([`super::FixedPool`] and [`super::Arena`]).

pub(crate) enum Backing {
    Owned(Box<[u8]>),
    /// A block the allocator does not own. An allocator built from
    /// `create_from_block` never frees this memory; the caller is
    /// responsible for its lifetime, which must outlive the allocator.
    Borrowed { ptr: *mut u8, len: usize },
}

// SAFETY: the raw pointer in `Borrowed` is only ever dereferenced through
// the owning allocator's accessors, under the same single-owner-at-a-time
// discipline `Guarded` requires of its `T: Send` bound; moving a `Backing`
// between threads does not by itself grant any new access to the pointee.
unsafe impl Send for Backing {}

impl Backing {
    pub(crate) fn base_ptr(&self) -> *mut u8 {
        match self {
            Backing::Owned(b) => b.as_ptr() as *mut u8,
            Backing::Borrowed { ptr, .. } => *ptr,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Backing::Owned(b) => b.len(),
            Backing::Borrowed { len, .. } => *len,
        }
    }
}

//! Allocators for shared string arenas.

use core::{alloc::Layout, fmt, ptr::NonNull};

/// A source of memory for [`SharedString`](super::SharedString) arenas.
///
/// The allocator is stored inside the arena it allocated and is asked to free
/// it with the exact [`Layout`] it was allocated with.
pub trait ArenaAllocator: Send + Sync + 'static {
    /// Allocates a block of memory fitting `layout`, or returns `None`.
    ///
    /// `layout` never has a size of zero.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Frees a block returned by [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` was returned by `allocate` on this allocator, or a clone of
    ///    it, with the same `layout`.
    /// 2. The block is not used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global allocator.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Global;

impl ArenaAllocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY:
        // 1. `layout` has a non-zero size (checked above)
        let ptr = unsafe { alloc::alloc::alloc(layout) };
        NonNull::new(ptr)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY:
        // 1. `ptr` was allocated by the global allocator with `layout`
        //    (guaranteed by the caller)
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// The arena for a shared string could not be allocated.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shared string arena allocation failed")
    }
}

impl core::error::Error for AllocError {}

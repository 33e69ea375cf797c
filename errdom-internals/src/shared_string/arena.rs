//! The single-allocation arena behind an owned [`SharedString`].
//!
//! An arena is laid out as an [`Arena<A>`] (header followed by the allocator
//! that produced it) and then the string bytes. The header is the first field
//! of a `#[repr(C)]` struct, so a pointer to the arena is also a pointer to its
//! header, and the header's `release` hook knows the concrete `A`.
//!
//! [`SharedString`]: super::SharedString

use core::{
    alloc::{Layout, LayoutError},
    ptr::NonNull,
};

use super::allocator::{AllocError, ArenaAllocator};
use crate::intrusive::RefCount;

/// The allocator-independent prefix of every arena.
#[repr(C)]
pub(super) struct ArenaHeader {
    /// Number of [`SharedString`](super::SharedString)s using the arena.
    ref_count: RefCount,
    /// Length in bytes of the string stored after the arena.
    length: usize,
    /// Destroys the allocator and frees the arena through it.
    release: unsafe fn(NonNull<ArenaHeader>),
}

/// An arena allocated by `A`.
#[repr(C)]
struct Arena<A> {
    /// Must stay the first field.
    header: ArenaHeader,
    /// The allocator the arena is freed through.
    allocator: A,
}

/// Computes the layout of an arena holding `length` bytes and the offset of
/// those bytes.
fn layout<A>(length: usize) -> Result<(Layout, usize), LayoutError> {
    let (layout, offset) = Layout::new::<Arena<A>>().extend(Layout::array::<u8>(length)?)?;
    Ok((layout.pad_to_align(), offset))
}

/// Allocates an arena through `allocator` and copies `bytes` into it.
///
/// Returns the arena header and a pointer to the copied bytes. The arena starts
/// with a count of one, owned by the caller.
pub(super) fn allocate<A: ArenaAllocator>(
    bytes: &[u8],
    allocator: A,
) -> Result<(NonNull<ArenaHeader>, NonNull<u8>), AllocError> {
    let (layout, offset) = layout::<A>(bytes.len()).map_err(|_| AllocError)?;
    let base = allocator.allocate(layout).ok_or(AllocError)?;
    let arena = base.cast::<Arena<A>>();

    // SAFETY:
    // 1. `base` is a fresh allocation of `layout`, which starts with an
    //    `Arena<A>` and is aligned for it.
    unsafe {
        arena.write(Arena {
            header: ArenaHeader {
                ref_count: RefCount::new(),
                length: bytes.len(),
                release: release::<A>,
            },
            allocator,
        });
    }

    // SAFETY:
    // 1. `offset` is within the allocation of `layout` as computed by
    //    `Layout::extend`.
    let data = unsafe { base.add(offset) };

    // SAFETY:
    // 1. `bytes` is valid for reads of `bytes.len()` bytes.
    // 2. `data` is valid for writes of `bytes.len()` bytes, since the layout
    //    reserves them after `offset`.
    // 3. The fresh allocation cannot overlap `bytes`.
    unsafe {
        core::ptr::copy_nonoverlapping(bytes.as_ptr(), data.as_ptr(), bytes.len());
    }

    Ok((arena.cast::<ArenaHeader>(), data))
}

/// Reports a failed arena allocation for `length` bytes.
pub(super) fn allocation_failed<A>(length: usize) -> ! {
    match layout::<A>(length) {
        Ok((layout, _)) => alloc::alloc::handle_alloc_error(layout),
        Err(_) => panic!("string of {length} bytes is too large for a shared arena"),
    }
}

impl ArenaHeader {
    /// Returns the number of users of the arena.
    #[inline]
    pub(super) fn use_count(&self) -> usize {
        self.ref_count.get()
    }

    /// Adds one user.
    #[inline]
    pub(super) fn retain(&self) {
        self.ref_count.increment();
    }
}

/// Removes one user from the arena, freeing it when the last one leaves.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `header` points to a live arena created by [`allocate`].
/// 2. The caller owns one unit of its count and does not use the arena
///    afterwards.
#[inline]
pub(super) unsafe fn release_ref(header: NonNull<ArenaHeader>) {
    // SAFETY:
    // 1. The arena is alive while the caller owns a unit of its count.
    let header_ref = unsafe { header.as_ref() };
    if header_ref.ref_count.decrement() {
        let release = header_ref.release;
        // SAFETY:
        // 1. `release` was set by `allocate` for the allocator type of this
        //    arena.
        // 2. The count reached zero, so no other user exists.
        unsafe { release(header) }
    }
}

/// Destroys an arena created by [`allocate`] with allocator type `A`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `header` was returned by `allocate::<A>`.
/// 2. The arena has no remaining users.
unsafe fn release<A: ArenaAllocator>(header: NonNull<ArenaHeader>) {
    let arena = header.cast::<Arena<A>>();

    // SAFETY:
    // 1. The arena holds an initialized `Arena<A>` (guaranteed by the caller).
    // 2. Ownership of the allocator moves out here, and the memory is freed
    //    below without dropping it again.
    let Arena { header, allocator } = unsafe { arena.read() };

    if let Ok((layout, _)) = layout::<A>(header.length) {
        // SAFETY:
        // 1. The arena was allocated by this allocator with the layout computed
        //    from the same length.
        // 2. No user remains (guaranteed by the caller).
        unsafe { allocator.deallocate(arena.cast::<u8>(), layout) };
    }
}

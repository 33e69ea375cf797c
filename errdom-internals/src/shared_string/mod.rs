//! Reference-counted, immutable strings.
//!
//! A [`SharedString`] either borrows a `&'static str` without allocating, or
//! owns a reference to an arena: one allocation holding a header (atomic count
//! and length) followed by the bytes. Cloning an arena-backed string bumps the
//! count; the last clone frees the arena through the allocator that created
//! it.
//!
//! This module encapsulates the fields of [`SharedString`], guaranteeing the
//! invariant that `ptr`/`len` always describe valid UTF-8 that stays alive for
//! as long as the string (and, for arena strings, any clone of it) exists.

mod allocator;
mod arena;

use alloc::string::String;
use core::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    ptr::NonNull,
};

pub use self::allocator::{AllocError, ArenaAllocator, Global};
use self::arena::ArenaHeader;

/// An immutable string shared by reference counting.
///
/// # Examples
///
/// ```
/// use errdom_internals::shared_string::SharedString;
///
/// let literal = SharedString::from_static("Bad file descriptor");
/// assert_eq!(literal.use_count(), 0);
///
/// let owned = SharedString::new(&format!("code {}", 9));
/// let copy = owned.clone();
/// assert_eq!(owned.use_count(), 2);
/// assert_eq!(copy, "code 9");
/// ```
pub struct SharedString {
    /// Start of the bytes.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `ptr` is valid for reads of `len` bytes of UTF-8.
    /// 2. If `arena` is `None`, the bytes are `'static`.
    /// 3. If `arena` is `Some`, the bytes live inside that arena, and this
    ///    string owns one unit of its count.
    ptr: NonNull<u8>,
    /// Number of bytes.
    len: usize,
    /// The arena owning the bytes, if any.
    arena: Option<NonNull<ArenaHeader>>,
}

impl SharedString {
    /// Wraps a string literal. No allocation takes place.
    #[inline]
    pub const fn from_static(value: &'static str) -> Self {
        // SAFETY:
        // 1. The pointer of a reference is never null.
        let ptr = unsafe { NonNull::new_unchecked(value.as_ptr().cast_mut()) };
        Self {
            ptr,
            len: value.len(),
            arena: None,
        }
    }

    /// Copies `value` into a new arena from the global allocator.
    #[inline]
    pub fn new(value: &str) -> Self {
        Self::new_in(value, Global)
    }

    /// Copies `value` into a new arena allocated by `allocator`.
    ///
    /// Allocation failure is reported through
    /// [`handle_alloc_error`](alloc::alloc::handle_alloc_error).
    pub fn new_in<A: ArenaAllocator>(value: &str, allocator: A) -> Self {
        match Self::try_new_in(value, allocator) {
            Ok(string) => string,
            Err(AllocError) => arena::allocation_failed::<A>(value.len()),
        }
    }

    /// Copies `value` into a new arena allocated by `allocator`, returning an
    /// error if the allocator fails.
    pub fn try_new_in<A: ArenaAllocator>(value: &str, allocator: A) -> Result<Self, AllocError> {
        let (header, ptr) = arena::allocate(value.as_bytes(), allocator)?;
        Ok(Self {
            ptr,
            len: value.len(),
            arena: Some(header),
        })
    }

    /// Returns the string.
    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY:
        // 1. The bytes are valid UTF-8 (guaranteed by the type invariants)
        unsafe { core::str::from_utf8_unchecked(self.as_bytes()) }
    }

    /// Returns the bytes of the string.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY:
        // 1. `ptr` is valid for reads of `len` bytes for as long as `self` is
        //    alive (guaranteed by the type invariants)
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of strings sharing the arena, or zero if the string
    /// does not own an arena.
    #[inline]
    pub fn use_count(&self) -> usize {
        match self.arena {
            // SAFETY:
            // 1. The arena is alive while this string owns a unit of its count.
            Some(header) => unsafe { header.as_ref() }.use_count(),
            None => 0,
        }
    }

    /// Returns whether the string owns an arena.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.arena.is_some()
    }
}

impl Clone for SharedString {
    #[inline]
    fn clone(&self) -> Self {
        if let Some(header) = self.arena {
            // SAFETY:
            // 1. The arena is alive while this string owns a unit of its count.
            unsafe { header.as_ref() }.retain();
        }
        Self {
            ptr: self.ptr,
            len: self.len,
            arena: self.arena,
        }
    }
}

impl Drop for SharedString {
    #[inline]
    fn drop(&mut self) {
        if let Some(header) = self.arena.take() {
            // SAFETY:
            // 1. `header` points to a live arena created by `arena::allocate`.
            // 2. This string owns one unit of its count and is going away.
            unsafe { arena::release_ref(header) }
        }
    }
}

impl Default for SharedString {
    #[inline]
    fn default() -> Self {
        Self::from_static("")
    }
}

impl Deref for SharedString {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for SharedString {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for SharedString {
    #[inline]
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for SharedString {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for SharedString {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&String> for SharedString {
    #[inline]
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl PartialEq for SharedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SharedString {}

impl PartialOrd for SharedString {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SharedString {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for SharedString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialEq<str> for SharedString {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for SharedString {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<SharedString> for str {
    #[inline]
    fn eq(&self, other: &SharedString) -> bool {
        self == other.as_str()
    }
}

impl PartialEq<SharedString> for &str {
    #[inline]
    fn eq(&self, other: &SharedString) -> bool {
        *self == other.as_str()
    }
}

impl fmt::Display for SharedString {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl fmt::Debug for SharedString {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

// SAFETY: The bytes are immutable and the arena count is atomic. Arena
// allocators are required to be `Send + Sync`, so the last clone may free the
// arena from any thread.
unsafe impl Send for SharedString {}

// SAFETY: Shared access only reads immutable bytes and bumps the atomic count.
unsafe impl Sync for SharedString {}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec::Vec};
    use core::{
        alloc::Layout,
        sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
    };

    use super::*;

    static_assertions::assert_impl_all!(SharedString: Send, Sync, Clone, Default);
    static_assertions::assert_eq_size!(SharedString, [usize; 3]);

    #[test]
    fn test_static_strings_do_not_count() {
        let s = SharedString::from_static("hello");
        assert_eq!(s.use_count(), 0);
        assert!(!s.is_shared());
        let copy = s.clone();
        assert_eq!(copy, "hello");
        assert_eq!(s.use_count(), 0);
    }

    #[test]
    fn test_nested_copies() {
        let s = SharedString::new("shared");
        assert_eq!(s.use_count(), 1);
        {
            let a = s.clone();
            assert_eq!(s.use_count(), 2);
            {
                let b = a.clone();
                assert_eq!(s.use_count(), 3);
                {
                    let c = b.clone();
                    assert_eq!(c.use_count(), 4);
                }
                assert_eq!(s.use_count(), 3);
            }
            assert_eq!(s.use_count(), 2);
        }
        assert_eq!(s.use_count(), 1);
    }

    #[test]
    fn test_take_clears_source() {
        let mut s = SharedString::new("moving");
        let moved = core::mem::take(&mut s);
        assert!(s.is_empty());
        assert_eq!(s.use_count(), 0);
        assert_eq!(moved, "moving");
        assert_eq!(moved.use_count(), 1);
    }

    #[test]
    fn test_assignment_releases_previous() {
        let a = SharedString::new("first");
        let b = SharedString::new("second");
        let mut target = a.clone();
        assert_eq!(target, a);
        assert_eq!(a.use_count(), 2);
        target = b.clone();
        assert_eq!(a.use_count(), 1);
        assert_eq!(b.use_count(), 2);
        assert_eq!(target, b);
    }

    #[test]
    fn test_ordering_and_equality() {
        let abc = SharedString::new("abc");
        let abd = SharedString::from_static("abd");
        let ab = SharedString::from_static("ab");
        assert!(abc < abd);
        assert!(ab < abc);
        assert!(abd > ab);
        assert_eq!(abc, SharedString::from_static("abc"));
        assert_ne!(abc, abd);
        assert_eq!("abc", abc);
        assert_eq!(abc.to_string(), "abc");
        assert_eq!(alloc::format!("{abc:?}"), "\"abc\"");
    }

    #[test]
    fn test_empty_arena() {
        let s = SharedString::new("");
        assert!(s.is_empty());
        assert!(s.is_shared());
        assert_eq!(s.as_str(), "");
    }

    static ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Clone, Copy)]
    struct CountingAllocator;

    impl ArenaAllocator for CountingAllocator {
        fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
            ALLOCATED.fetch_add(layout.size(), AtomicOrdering::SeqCst);
            Global.allocate(layout)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), AtomicOrdering::SeqCst);
            // SAFETY: forwarded from the caller
            unsafe { Global.deallocate(ptr, layout) }
        }
    }

    #[test]
    fn test_allocator_gets_exact_size_back() {
        {
            let s = SharedString::new_in("counted arena", CountingAllocator);
            assert!(ALLOCATED.load(AtomicOrdering::SeqCst) >= "counted arena".len());
            let copies: Vec<_> = (0..4).map(|_| s.clone()).collect();
            assert_eq!(s.use_count(), 5);
            drop(copies);
            assert_eq!(s, "counted arena");
        }
        assert_eq!(ALLOCATED.load(AtomicOrdering::SeqCst), 0);
    }

    #[derive(Clone, Copy)]
    struct FailingAllocator;

    impl ArenaAllocator for FailingAllocator {
        fn allocate(&self, _layout: Layout) -> Option<NonNull<u8>> {
            None
        }

        unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
            unreachable!("nothing was allocated");
        }
    }

    #[test]
    fn test_allocation_failure() {
        assert_eq!(
            SharedString::try_new_in("nope", FailingAllocator).err(),
            Some(AllocError)
        );
    }
}

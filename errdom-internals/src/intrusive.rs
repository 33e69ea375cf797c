//! Intrusive reference counting.
//!
//! An [`IntrusivePtr`] shares ownership of an object that stores its own
//! atomic count, instead of a separately allocated control block. The pointee
//! exposes its count through [`RefCounted`]; [`Counted`] wraps any value with a
//! count for the common case.
//!
//! There are no weak references.
//!
//! # Ordering
//!
//! Increments are `Relaxed`: a thread can only clone a pointer it already
//! owns, so nothing needs to be published. Decrements are `Release`, and the
//! thread that takes the count to zero issues an `Acquire` fence before running
//! the deleter, so the destructor observes every write made by every former
//! owner.

use alloc::boxed::Box;
use core::{
    fmt,
    marker::PhantomData,
    ops::Deref,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering, fence},
};

use crate::value::{InPlace, Payload};

/// An atomic reference count, starting at one.
pub struct RefCount {
    /// Number of live [`IntrusivePtr`]s to the object holding this count.
    count: AtomicUsize,
}

impl RefCount {
    /// Creates a count of one, owned by whoever creates the object.
    #[inline]
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(1),
        }
    }

    /// Returns the current count.
    #[inline]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Adds one owner.
    #[inline]
    pub(crate) fn increment(&self) {
        let previous = self.count.fetch_add(1, Ordering::Relaxed);
        debug_assert!(previous != 0, "revived a released object");
        debug_assert!(previous < isize::MAX.cast_unsigned(), "reference count overflow");
    }

    /// Removes one owner and returns whether it was the last one.
    #[inline]
    pub(crate) fn decrement(&self) -> bool {
        if self.count.fetch_sub(1, Ordering::Release) != 1 {
            return false;
        }
        fence(Ordering::Acquire);
        true
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefCount").field(&self.get()).finish()
    }
}

/// An object that embeds its own [`RefCount`].
///
/// # Safety
///
/// Implementors must ensure:
///
/// 1. [`ref_count`](Self::ref_count) returns the same [`RefCount`] for the
///    entire lifetime of the object, and that count is stored inside the
///    object.
/// 2. The count is not modified by anything other than [`IntrusivePtr`].
pub unsafe trait RefCounted {
    /// Returns the count embedded in this object.
    fn ref_count(&self) -> &RefCount;
}

/// A value paired with an embedded [`RefCount`].
///
/// # Examples
///
/// ```
/// use errdom_internals::intrusive::{Counted, IntrusivePtr};
///
/// let a = IntrusivePtr::new(Counted::new(String::from("shared")));
/// let b = a.clone();
/// assert_eq!(a.use_count(), 2);
/// assert_eq!(b.get().map(|s| s.as_str()), Some("shared"));
/// ```
pub struct Counted<T> {
    /// Number of owners.
    count: RefCount,
    /// The wrapped value.
    value: T,
}

impl<T> Counted<T> {
    /// Wraps `value` with a count of one.
    #[inline]
    pub const fn new(value: T) -> Self {
        Self {
            count: RefCount::new(),
            value,
        }
    }

    /// Unwraps the value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }
}

// SAFETY:
// 1. The count is a field of `Counted` and never replaced.
// 2. `count` is private to this module, which only touches it through
//    `IntrusivePtr`.
unsafe impl<T> RefCounted for Counted<T> {
    #[inline]
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

impl<T> Deref for Counted<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Counted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}

/// Frees an object once its count has reached zero.
pub trait Deleter<T> {
    /// Destroys and deallocates the object.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` was obtained from the allocation scheme this deleter undoes.
    /// 2. No other reference to the object exists.
    unsafe fn delete(&self, ptr: NonNull<T>);
}

/// Deleter for objects allocated with [`Box`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct BoxDeleter;

impl<T> Deleter<T> for BoxDeleter {
    #[inline]
    unsafe fn delete(&self, ptr: NonNull<T>) {
        // SAFETY:
        // 1. The pointer comes from `Box::leak` (guaranteed by the caller)
        // 2. Ownership is unique (guaranteed by the caller)
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        drop(boxed);
    }
}

/// Shared ownership of a [`RefCounted`] object.
///
/// The pointer may be null. A non-null pointer always contributes exactly one
/// to the count of its object.
pub struct IntrusivePtr<T: RefCounted, D: Deleter<T> = BoxDeleter> {
    /// The shared object.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. If `Some`, the pointee is alive and this pointer owns one unit of
    ///    its count.
    /// 2. If `Some`, the pointee was allocated in a way `deleter` can undo.
    ptr: Option<NonNull<T>>,
    /// Frees the pointee when the last owner lets go.
    deleter: D,
    /// Tells the drop checker that the pointee may be dropped with us.
    _marker: PhantomData<T>,
}

impl<T: RefCounted> IntrusivePtr<T> {
    /// Moves `value` to the heap and takes the first reference to it.
    ///
    /// The count embedded in `value` must be one.
    #[inline]
    pub fn new(value: T) -> Self {
        debug_assert_eq!(
            value.ref_count().get(),
            1,
            "a new object must start with a reference count of one"
        );
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        Self {
            ptr: Some(ptr),
            deleter: BoxDeleter,
            _marker: PhantomData,
        }
    }

    /// Creates a null pointer.
    #[inline]
    pub const fn null() -> Self {
        Self::null_with(BoxDeleter)
    }

    /// Releases the current object, if any, and takes the first reference to
    /// `value`.
    #[inline]
    pub fn reset_to(&mut self, value: T) {
        *self = Self::new(value);
    }
}

impl<T: RefCounted, D: Deleter<T>> IntrusivePtr<T, D> {
    /// Adopts a pointer whose count was initialized to one.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live object whose count is one and owned by the
    ///    caller, who transfers that unit to the returned pointer.
    /// 2. `deleter` can free the object.
    #[inline]
    pub unsafe fn from_raw(ptr: NonNull<T>, deleter: D) -> Self {
        Self {
            ptr: Some(ptr),
            deleter,
            _marker: PhantomData,
        }
    }

    /// Creates a null pointer carrying `deleter`.
    #[inline]
    pub const fn null_with(deleter: D) -> Self {
        Self {
            ptr: None,
            deleter,
            _marker: PhantomData,
        }
    }

    /// Returns the shared object, or `None` if null.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY:
        // 1. A non-null pointer keeps its pointee alive for as long as `self`
        //    is borrowed.
        self.ptr.map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Returns the raw pointer, null if this pointer is null.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
            .map_or(core::ptr::null(), |ptr| ptr.as_ptr().cast_const())
    }

    /// Returns whether this pointer is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns the number of owners of the object, zero if null.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.get().map_or(0, |object| object.ref_count().get())
    }

    /// Returns whether both pointers share the same object.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }

    /// Releases the object and leaves this pointer null.
    #[inline]
    pub fn reset(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY:
            // 1. `ptr` owned one unit of the count, which is given up here.
            // 2. `ptr` was allocated in a way `self.deleter` can undo.
            unsafe { release(ptr, &self.deleter) };
        }
    }

    /// Exchanges the objects of two pointers without touching the counts.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }
}

/// Gives up one unit of the count of `ptr`, deleting the object at zero.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The caller owns one unit of the count of the live object at `ptr`.
/// 2. The object was allocated in a way `deleter` can undo.
#[inline]
unsafe fn release<T: RefCounted, D: Deleter<T>>(ptr: NonNull<T>, deleter: &D) {
    // SAFETY:
    // 1. The object is alive while the caller holds a unit of its count.
    let object = unsafe { ptr.as_ref() };
    if object.ref_count().decrement() {
        // SAFETY:
        // 1. The object was allocated in a way `deleter` can undo (guaranteed by
        //    the caller)
        // 2. The count reached zero and the fence in `decrement` ordered every
        //    previous access before this point, so no other reference exists.
        unsafe { deleter.delete(ptr) };
    }
}

impl<T: RefCounted, D: Deleter<T> + Default> Default for IntrusivePtr<T, D> {
    #[inline]
    fn default() -> Self {
        Self::null_with(D::default())
    }
}

impl<T: RefCounted, D: Deleter<T> + Clone> Clone for IntrusivePtr<T, D> {
    #[inline]
    fn clone(&self) -> Self {
        if let Some(object) = self.get() {
            object.ref_count().increment();
        }
        Self {
            ptr: self.ptr,
            deleter: self.deleter.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: RefCounted, D: Deleter<T>> Drop for IntrusivePtr<T, D> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: RefCounted + fmt::Debug, D: Deleter<T>> fmt::Debug for IntrusivePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(object) => f
                .debug_struct("IntrusivePtr")
                .field("object", object)
                .field("use_count", &object.ref_count().get())
                .finish(),
            None => f.write_str("IntrusivePtr(null)"),
        }
    }
}

// SAFETY: The pointer behaves like an `Arc<T>` with an inline deleter. The
// object may be reached and dropped from any owning thread, so it must be
// `Send + Sync`, and the deleter travels with the pointer.
unsafe impl<T: RefCounted + Send + Sync, D: Deleter<T> + Send> Send for IntrusivePtr<T, D> {}

// SAFETY: Shared access only hands out `&T` and clones the pointer, which
// requires `T: Sync` for the reference and `T: Send` because a clone may end
// up dropping the object on another thread.
unsafe impl<T: RefCounted + Send + Sync, D: Deleter<T> + Sync> Sync for IntrusivePtr<T, D> {}

impl<T, D> Payload for IntrusivePtr<T, D>
where
    T: RefCounted + Send + Sync + 'static,
    D: Deleter<T> + Clone + Send + Sync + 'static,
{
    type Storage = InPlace;
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};
    use core::sync::atomic::AtomicBool;

    use super::*;

    static_assertions::assert_eq_size!(IntrusivePtr<Counted<String>>, usize);
    static_assertions::assert_impl_all!(IntrusivePtr<Counted<String>>: Send, Sync, Clone);
    static_assertions::assert_not_impl_any!(IntrusivePtr<Counted<core::cell::Cell<u8>>>: Send, Sync);

    struct DropFlag<'a>(&'a AtomicBool);

    impl Drop for DropFlag<'_> {
        fn drop(&mut self) {
            assert!(!self.0.swap(true, Ordering::SeqCst), "dropped twice");
        }
    }

    #[test]
    fn test_clone_and_drop_counts() {
        let a = IntrusivePtr::new(Counted::new(String::from("value")));
        assert_eq!(a.use_count(), 1);
        {
            let b = a.clone();
            assert_eq!(a.use_count(), 2);
            {
                let c = b.clone();
                assert_eq!(c.use_count(), 3);
                assert!(c.ptr_eq(&a));
            }
            assert_eq!(a.use_count(), 2);
        }
        assert_eq!(a.use_count(), 1);
    }

    #[test]
    fn test_move_keeps_count() {
        let a = IntrusivePtr::new(Counted::new(5_u32));
        let b = a.clone();
        let mut moved = b;
        assert_eq!(moved.use_count(), 2);

        let taken = core::mem::take(&mut moved);
        assert!(moved.is_null());
        assert_eq!(moved.use_count(), 0);
        assert_eq!(taken.use_count(), 2);
    }

    #[test]
    fn test_reset_and_swap() {
        let mut a = IntrusivePtr::new(Counted::new(1_u8));
        let mut b = IntrusivePtr::new(Counted::new(2_u8));
        let keep = a.clone();

        a.swap(&mut b);
        assert_eq!(a.get().map(|v| **v), Some(2));
        assert_eq!(b.get().map(|v| **v), Some(1));
        assert_eq!(keep.use_count(), 2);

        b.reset();
        assert!(b.is_null());
        assert!(b.as_ptr().is_null());
        assert_eq!(keep.use_count(), 1);

        b = keep.clone();
        assert!(b.ptr_eq(&keep));
        assert_eq!(keep.use_count(), 2);

        b.reset_to(Counted::new(3));
        assert_eq!(keep.use_count(), 1);
        assert_eq!(b.get().map(|v| **v), Some(3));
        assert!(IntrusivePtr::<Counted<u8>>::null().is_null());
    }

    #[test]
    fn test_last_owner_drops_exactly_once() {
        let dropped = AtomicBool::new(false);
        let a = IntrusivePtr::new(Counted::new(DropFlag(&dropped)));
        let b = a.clone();
        drop(a);
        assert!(!dropped.load(Ordering::SeqCst));
        drop(b);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_custom_deleter() {
        static DELETED: AtomicUsize = AtomicUsize::new(0);

        #[derive(Clone, Default)]
        struct CountingDeleter;

        impl<T> Deleter<T> for CountingDeleter {
            unsafe fn delete(&self, ptr: NonNull<T>) {
                DELETED.fetch_add(1, Ordering::SeqCst);
                // SAFETY: the tests allocate with Box
                unsafe { BoxDeleter.delete(ptr) };
            }
        }

        let ptr = NonNull::from(Box::leak(Box::new(Counted::new(9_i64))));
        // SAFETY: freshly leaked box with a count of one
        let a = unsafe { IntrusivePtr::from_raw(ptr, CountingDeleter) };
        let b = a.clone();
        drop(a);
        assert_eq!(DELETED.load(Ordering::SeqCst), 0);
        drop(b);
        assert_eq!(DELETED.load(Ordering::SeqCst), 1);

        let null: IntrusivePtr<Counted<i64>, CountingDeleter> = IntrusivePtr::default();
        drop(null);
        assert_eq!(DELETED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_clones() {
        let shared = IntrusivePtr::new(Counted::new(String::from("threads")));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let local = shared.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let copy = local.clone();
                        assert!(copy.use_count() >= 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.use_count(), 1);
    }
}

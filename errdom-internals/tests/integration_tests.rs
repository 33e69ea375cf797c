//! Integration tests for the errdom-internals crate.
//!
//! These exercise the public building blocks together the way `errdom` uses
//! them: payloads of every storage strategy living in erased cells that are
//! copied and dropped through their vtables, intrusive pointers as in-place
//! payloads, and shared strings handed out as messages.

use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use errdom_internals::{
    intrusive::{Counted, IntrusivePtr},
    shared_string::{ArenaAllocator, Global, SharedString},
    value::{BitCast, ErasedValue, InPlace, Payload, Representation, ValueRef, ValueVtable},
};

#[derive(Clone)]
struct Tracked(Arc<AtomicUsize>);

impl Payload for Tracked {
    type Storage = InPlace;
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Pointer(usize);

impl Payload for Pointer {
    type Storage = BitCast;
}

#[test]
fn test_cell_copies_follow_the_vtable() {
    let drops = Arc::new(AtomicUsize::new(0));
    let vtable = ValueVtable::new::<Tracked>();
    assert_eq!(vtable.representation(), Representation::InPlace);
    assert!(!vtable.is_trivial());

    let mut original = ErasedValue::new(Tracked(drops.clone()));
    // SAFETY: the vtable matches the cell
    let mut copy = unsafe { vtable.clone_value(&original) };
    assert_eq!(Arc::strong_count(&drops), 3);

    // SAFETY: the vtable matches the cell, which is not used again
    unsafe { vtable.drop_value(&mut copy) };
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(Arc::strong_count(&drops), 2);

    // SAFETY: the vtable matches the cell, which is not used again
    unsafe { vtable.drop_value(&mut original) };
    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert_eq!(Arc::strong_count(&drops), 1);
}

#[test]
fn test_trivial_payloads() {
    let vtable = ValueVtable::new::<Pointer>();
    assert!(vtable.is_trivial());
    assert_eq!(vtable.representation(), Representation::BitCast);
    assert!(vtable.type_name().ends_with("Pointer"));

    let cell = ErasedValue::new(Pointer(0xdead_beef));
    // SAFETY: the vtable matches the cell
    let copy = unsafe { vtable.clone_value(&cell) };
    // SAFETY: both cells hold a `Pointer`
    let (a, b) = unsafe { (cell.into_inner::<Pointer>(), copy.into_inner::<Pointer>()) };
    assert_eq!(a, b);

    let cell = ErasedValue::new(-7_i16);
    // SAFETY: the cell holds an i16
    match unsafe { cell.view::<i16>() } {
        ValueRef::Owned(value) => assert_eq!(value, -7),
        ValueRef::Borrowed(_) => panic!("numeric payloads are rebuilt"),
    }
}

#[test]
fn test_intrusive_pointer_in_a_cell() {
    let shared = IntrusivePtr::new(Counted::new(String::from("shared code")));
    let vtable = ValueVtable::new::<IntrusivePtr<Counted<String>>>();

    let mut cell = ErasedValue::new(shared.clone());
    assert_eq!(shared.use_count(), 2);
    {
        // SAFETY: the cell holds an intrusive pointer
        let view = unsafe { cell.view::<IntrusivePtr<Counted<String>>>() };
        assert!(view.ptr_eq(&shared));
        assert_eq!(view.get().map(|s| s.as_str()), Some("shared code"));
    }

    // SAFETY: the vtable matches the cell
    let mut copy = unsafe { vtable.clone_value(&cell) };
    assert_eq!(shared.use_count(), 3);
    // SAFETY: the vtable matches the cells, which are not used again
    unsafe { vtable.drop_value(&mut copy) };
    // SAFETY: see above
    unsafe { vtable.drop_value(&mut cell) };
    assert_eq!(shared.use_count(), 1);
}

struct CountingAllocator {
    live: Arc<AtomicUsize>,
}

impl ArenaAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        // SAFETY: allocated by `Global` with the same layout
        unsafe { Global.deallocate(ptr, layout) }
    }
}

#[test]
fn test_shared_strings_across_threads() {
    let live = Arc::new(AtomicUsize::new(0));
    let message = SharedString::new_in(
        "Missing pants",
        CountingAllocator {
            live: live.clone(),
        },
    );
    assert_eq!(live.load(Ordering::SeqCst), 1);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let message = message.clone();
            std::thread::spawn(move || {
                assert_eq!(message, "Missing pants");
                message.len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 13);
    }

    assert_eq!(message.use_count(), 1);
    drop(message);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_static_strings_are_not_counted() {
    let message = SharedString::from_static("Bad error code");
    let copy = message.clone();
    assert_eq!(copy.use_count(), 0);
    assert!(!copy.is_shared());
    assert_eq!(copy.as_bytes(), b"Bad error code");
    assert!(SharedString::default().is_empty());
}

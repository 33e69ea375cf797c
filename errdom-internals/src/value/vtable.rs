//! Resource-management descriptor for erased payloads.
//!
//! This module encapsulates the fields of [`ValueVtable`] so they cannot be
//! set directly. This visibility restriction guarantees the safety invariant:
//! **the hooks of a vtable always match the payload type it was built for**.
//!
//! # Safety Invariant
//!
//! Vtables are only created as `&'static` references via [`ValueVtable::new`],
//! which pairs the hooks with a specific payload type `T` at compile time.

use core::any::TypeId;

use super::{
    cell::ErasedValue,
    storage::{Payload, Representation, Storage},
};

/// Describes how to copy and destroy the payload held by an [`ErasedValue`].
///
/// Moving needs no hook: every Rust value may be relocated with a plain
/// memory copy, and the cell is moved as a whole.
///
/// # Safety Invariant
///
/// The fields `clone` and `drop` are either `None` or point to the hooks of the
/// storage strategy selected by the payload type `T` used to create this
/// [`ValueVtable`].
// Only ever handed out as `&'static Self`.
#[allow(missing_copy_implementations)]
pub struct ValueVtable {
    /// Gets the [`TypeId`] of the payload type.
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the payload type.
    type_name: fn() -> &'static str,
    /// Storage strategy of the payload type.
    representation: Representation,
    /// Clones the payload into a new cell; `None` means a bitwise copy.
    clone: Option<unsafe fn(&ErasedValue) -> ErasedValue>,
    /// Drops the payload in place; `None` means nothing needs to run.
    drop: Option<unsafe fn(&mut ErasedValue)>,
}

impl ValueVtable {
    /// Creates the [`ValueVtable`] for the payload type `T`.
    ///
    /// Fails to compile if `T` cannot be stored by the strategy it selected.
    pub const fn new<T: Payload>() -> &'static Self {
        const {
            assert!(
                <T::Storage as Storage<T>>::FITS,
                "payload cannot be stored by the storage strategy it selected"
            );
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                representation: <T::Storage as Storage<T>>::REPRESENTATION,
                clone: <T::Storage as Storage<T>>::CLONE,
                drop: <T::Storage as Storage<T>>::DROP,
            }
        }
    }

    /// Gets the [`TypeId`] of the payload type that was used to create this
    /// [`ValueVtable`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the payload type that was used to
    /// create this [`ValueVtable`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Gets the storage strategy of the payload type.
    #[inline]
    pub fn representation(&self) -> Representation {
        self.representation
    }

    /// Returns whether copies are bitwise and destruction is a no-op.
    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.clone.is_none() && self.drop.is_none()
    }

    /// Makes a copy of the payload held by `value`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ValueVtable`] is the vtable of the payload type stored in
    ///    `value`.
    #[inline]
    pub unsafe fn clone_value(&self, value: &ErasedValue) -> ErasedValue {
        match self.clone {
            // SAFETY: `clone` points to the clone hook of the payload type of
            // this vtable. That function's safety requirements are upheld:
            // 1. Guaranteed by the caller
            Some(clone) => unsafe { clone(value) },
            None => value.bitwise_copy(),
        }
    }

    /// Drops the payload held by `value`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ValueVtable`] is the vtable of the payload type stored in
    ///    `value`.
    /// 2. The payload is not used again afterwards.
    #[inline]
    pub unsafe fn drop_value(&self, value: &mut ErasedValue) {
        if let Some(drop) = self.drop {
            // SAFETY: `drop` points to the drop hook of the payload type of
            // this vtable. That function's safety requirements are upheld:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            unsafe { drop(value) }
        }
    }
}

impl core::fmt::Debug for ValueVtable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValueVtable")
            .field("type_name", &self.type_name())
            .field("representation", &self.representation)
            .field("trivial", &self.is_trivial())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::*;
    use crate::value::InPlace;

    #[derive(Clone)]
    struct Tracked(Arc<()>);

    impl Payload for Tracked {
        type Storage = InPlace;
    }

    #[test]
    fn test_vtable_metadata() {
        let vtable = ValueVtable::new::<u32>();
        assert_eq!(vtable.type_id(), TypeId::of::<u32>());
        assert_eq!(vtable.representation(), Representation::Numeric);
        assert!(vtable.is_trivial());

        let vtable = ValueVtable::new::<Tracked>();
        assert_eq!(vtable.type_id(), TypeId::of::<Tracked>());
        assert!(vtable.type_name().ends_with("Tracked"));
        assert_eq!(vtable.representation(), Representation::InPlace);
        assert!(!vtable.is_trivial());
    }

    #[test]
    fn test_clone_and_drop_hooks() {
        let counter = Arc::new(());
        let vtable = ValueVtable::new::<Tracked>();

        let mut original = ErasedValue::new(Tracked(counter.clone()));
        assert_eq!(Arc::strong_count(&counter), 2);

        // SAFETY: `original` holds a `Tracked`
        let mut copy = unsafe { vtable.clone_value(&original) };
        assert_eq!(Arc::strong_count(&counter), 3);

        // SAFETY: `copy` holds a `Tracked` and is not used afterwards
        unsafe { vtable.drop_value(&mut copy) };
        assert_eq!(Arc::strong_count(&counter), 2);

        // SAFETY: `original` holds a `Tracked` and is not used afterwards
        unsafe { vtable.drop_value(&mut original) };
        assert_eq!(Arc::strong_count(&counter), 1);
    }
}

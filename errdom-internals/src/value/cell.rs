//! The pointer-sized storage cell.
//!
//! This module encapsulates the `cell` field of [`ErasedValue`], ensuring it is
//! only reachable through the accessors below. The accessors that read the
//! cell back are `unsafe`, since the cell itself never records which type it
//! holds.
//!
//! # Safety Invariant
//!
//! An [`ErasedValue`] is always in one of two states:
//!
//! - **code**: the cell was written by [`ErasedValue::from_code`] and holds an
//!   initialized pointer-sized integer,
//! - **in place**: the cell was written by [`ErasedValue::from_in_place`] and
//!   holds a valid `T` at offset zero, for some `T` that fits the cell.
//!
//! Which of the two applies, and which `T`, is recorded by the
//! [`ValueVtable`](super::ValueVtable) that travels with the cell.

use core::mem::MaybeUninit;

/// Size in bytes of the storage cell of an [`ErasedValue`].
pub const CELL_SIZE: usize = size_of::<*mut ()>();

/// Alignment in bytes of the storage cell of an [`ErasedValue`].
pub const CELL_ALIGN: usize = align_of::<*mut ()>();

/// Returns whether a `T` can be constructed inside the cell.
#[inline]
pub(crate) const fn fits<T>() -> bool {
    size_of::<T>() <= CELL_SIZE && align_of::<T>() <= CELL_ALIGN
}

/// A pointer-sized cell holding one payload whose type has been erased.
///
/// The cell has no drop glue. Dropping an [`ErasedValue`] that holds a payload
/// with a destructor leaks that payload; the owner must route destruction
/// through the matching [`ValueVtable`](super::ValueVtable).
// Copying the cell duplicates ownership of in-place payloads.
#[allow(missing_copy_implementations)]
#[repr(transparent)]
pub struct ErasedValue {
    /// The raw storage.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The cell is either in the code state or in the in-place state
    ///    described in the module documentation.
    /// 2. The state does not change for the lifetime of the value, except
    ///    that an in-place payload may be dropped right before the value
    ///    itself goes away.
    ///
    /// A pointer type is used for the storage so that payloads containing
    /// pointers keep their provenance while they sit in the cell.
    cell: MaybeUninit<*mut ()>,
}

impl ErasedValue {
    /// Creates a cell in the code state.
    #[inline]
    pub(crate) const fn from_code(code: isize) -> Self {
        Self {
            cell: MaybeUninit::new(core::ptr::without_provenance_mut(code.cast_unsigned())),
        }
    }

    /// Creates a cell in the in-place state holding `value`.
    ///
    /// Fails to compile if `T` is larger or more aligned than the cell.
    #[inline]
    pub(crate) fn from_in_place<T>(value: T) -> Self {
        const {
            assert!(
                fits::<T>(),
                "payload is larger or more aligned than the erased value cell"
            );
        }

        let mut cell = MaybeUninit::<*mut ()>::uninit();
        let ptr: *mut T = cell.as_mut_ptr().cast::<T>();

        // SAFETY:
        // 1. `ptr` points to the start of `cell`, which is valid for writes.
        // 2. The const assertion above ensures that a `T` fits within the cell
        //    and that the cell is sufficiently aligned for `T`.
        unsafe {
            ptr.write(value);
        }

        Self { cell }
    }

    /// Reads the integer stored in a code-state cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell is in the code state.
    #[inline]
    pub(crate) unsafe fn code(&self) -> isize {
        // SAFETY:
        // 1. Code-state cells are fully initialized (guaranteed by the caller)
        let ptr: *mut () = unsafe { self.cell.assume_init() };
        ptr.addr().cast_signed()
    }

    /// Borrows the payload of an in-place cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell is in the in-place state and holds a valid `T`.
    #[inline]
    pub(crate) unsafe fn in_place_ref<T>(&self) -> &T {
        let ptr: *const T = self.cell.as_ptr().cast::<T>();

        // SAFETY:
        // 1. The pointer is non-null and aligned for `T`, since the payload was
        //    written at this address by `from_in_place`.
        // 2. The pointee is a valid `T` (guaranteed by the caller).
        // 3. The returned reference borrows `self`, so the payload cannot be
        //    dropped or moved while it is alive.
        unsafe { &*ptr }
    }

    /// Moves the payload out of an in-place cell, leaving the bits behind.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell is in the in-place state and holds a valid `T`.
    /// 2. The payload left in the cell is treated as moved-from: it must not be
    ///    read, cloned or dropped again.
    #[inline]
    pub(crate) unsafe fn read_in_place<T>(&self) -> T {
        let ptr: *const T = self.cell.as_ptr().cast::<T>();

        // SAFETY:
        // 1. The pointer is valid for reads and aligned for `T` (see
        //    `in_place_ref`).
        // 2. Duplication of ownership is prevented by the caller.
        unsafe { ptr.read() }
    }

    /// Runs the destructor of the payload of an in-place cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell is in the in-place state and holds a valid `T`.
    /// 2. The payload is not used again afterwards.
    #[inline]
    pub(crate) unsafe fn drop_in_place<T>(&mut self) {
        let ptr: *mut T = self.cell.as_mut_ptr().cast::<T>();

        // SAFETY:
        // 1. The pointer is valid for reads and writes and aligned for `T`.
        // 2. The pointee is a valid `T` that is not used again (guaranteed by
        //    the caller).
        unsafe { ptr.drop_in_place() }
    }

    /// Copies the bits of the cell.
    ///
    /// The copy is only a semantic copy if the payload has no resource
    /// management of its own.
    #[inline]
    pub(crate) const fn bitwise_copy(&self) -> Self {
        Self { cell: self.cell }
    }
}

impl core::fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ErasedValue { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_eq_size!(ErasedValue, usize);
    static_assertions::assert_eq_align!(ErasedValue, usize);
    static_assertions::assert_not_impl_any!(ErasedValue: Send, Sync, Clone, Copy);

    #[test]
    fn test_code_state() {
        for code in [0, 1, -1, isize::MIN, isize::MAX] {
            let value = ErasedValue::from_code(code);
            // SAFETY: the cell was created in the code state
            assert_eq!(unsafe { value.code() }, code);
        }
    }

    #[test]
    fn test_in_place_state() {
        let value = ErasedValue::from_in_place(0x1234_u16);
        // SAFETY: the cell holds a u16
        assert_eq!(unsafe { *value.in_place_ref::<u16>() }, 0x1234);

        let copy = value.bitwise_copy();
        // SAFETY: a bitwise copy of a u16 is a u16
        assert_eq!(unsafe { copy.read_in_place::<u16>() }, 0x1234);
    }

    #[test]
    fn test_drop_in_place() {
        use alloc::boxed::Box;

        let mut value = ErasedValue::from_in_place(Box::new(7_u32));
        // SAFETY: the cell holds a Box<u32>
        assert_eq!(unsafe { **value.in_place_ref::<Box<u32>>() }, 7);
        // SAFETY: the cell holds a Box<u32> which is not used afterwards
        unsafe { value.drop_in_place::<Box<u32>>() };
    }
}

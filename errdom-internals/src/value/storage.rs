//! Storage strategies for payloads.
//!
//! A payload type picks exactly one strategy through [`Payload::Storage`]:
//!
//! - [`Numeric`]: integral and enum-like payloads, stored as a number
//! - [`BitCast`]: `Copy` payloads exactly the size of the cell, stored as
//!   their raw bits
//! - [`InPlace`]: any other payload that fits the cell, constructed inside
//!   the cell and cloned and dropped through the
//!   [`ValueVtable`](super::ValueVtable)
//!
//! Payloads that are too large for the cell are stored behind a pointer, such
//! as [`IntrusivePtr`](crate::intrusive::IntrusivePtr), which is itself an
//! [`InPlace`] payload.
//!
//! The strategy is fixed per type at compile time and is never written into
//! the cell.

use core::{fmt, ops::Deref};

use super::cell::{CELL_ALIGN, CELL_SIZE, ErasedValue, fits};

/// Tag naming the storage strategy of a payload type.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Representation {
    /// Stored as a number with [`NumericPayload::into_code`].
    Numeric,
    /// Stored as the raw bits of a `Copy` value the size of the cell.
    BitCast,
    /// Constructed inside the cell.
    InPlace,
}

/// A type that may be stored in an [`ErasedValue`].
///
/// # Examples
///
/// ```
/// use errdom_internals::value::{ErasedValue, InPlace, Payload};
///
/// #[derive(Clone)]
/// struct Handle(u32);
///
/// impl Payload for Handle {
///     type Storage = InPlace;
/// }
///
/// let value = ErasedValue::new(Handle(7));
/// // SAFETY: the value was built from a `Handle`
/// let handle: Handle = unsafe { value.into_inner::<Handle>() };
/// assert_eq!(handle.0, 7);
/// ```
pub trait Payload: Clone + Send + Sync + 'static {
    /// The strategy used to store this payload.
    type Storage: Storage<Self>;
}

/// Conversion of an integral or enum-like payload to and from a number.
pub trait NumericPayload: Copy + Send + Sync + 'static {
    /// Converts the payload to its numeric code.
    fn into_code(self) -> isize;

    /// Converts a numeric code back into the payload.
    ///
    /// The code is always one previously returned by
    /// [`into_code`](Self::into_code) on a value of this type.
    fn from_code(code: isize) -> Self;
}

/// Private module preventing strategies from being defined outside this crate.
mod sealed {
    /// Supertrait of [`Storage`](super::Storage).
    pub trait Sealed {}
}

/// A storage strategy for payloads of type `T`.
///
/// This trait is sealed: the set of strategies is closed.
pub trait Storage<T>: sealed::Sealed + 'static {
    /// Tag of this strategy.
    const REPRESENTATION: Representation;

    /// Whether this strategy can store a `T` at all.
    const FITS: bool;

    /// Clone hook for the resource-management descriptor, `None` for a
    /// bitwise copy.
    const CLONE: Option<unsafe fn(&ErasedValue) -> ErasedValue>;

    /// Drop hook for the resource-management descriptor, `None` if nothing
    /// needs to run.
    const DROP: Option<unsafe fn(&mut ErasedValue)>;

    /// Stores `value` into a fresh cell.
    fn store(value: T) -> ErasedValue;

    /// Takes the payload back out of a cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `value` was created by [`store`](Self::store) of this strategy for
    ///    this `T`, or is a copy made through the matching descriptor.
    unsafe fn load(value: ErasedValue) -> T;

    /// Views the payload of a cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `value` was created by [`store`](Self::store) of this strategy for
    ///    this `T`, or is a copy made through the matching descriptor.
    unsafe fn view(value: &ErasedValue) -> ValueRef<'_, T>;
}

/// Strategy for integral and enum-like payloads.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Numeric;

/// Strategy for `Copy` payloads the exact size of the cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct BitCast;

/// Strategy for payloads constructed inside the cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct InPlace;

impl sealed::Sealed for Numeric {}
impl sealed::Sealed for BitCast {}
impl sealed::Sealed for InPlace {}

impl<T: NumericPayload> Storage<T> for Numeric {
    const REPRESENTATION: Representation = Representation::Numeric;
    const FITS: bool = true;
    const CLONE: Option<unsafe fn(&ErasedValue) -> ErasedValue> = None;
    const DROP: Option<unsafe fn(&mut ErasedValue)> = None;

    #[inline]
    fn store(value: T) -> ErasedValue {
        ErasedValue::from_code(value.into_code())
    }

    #[inline]
    unsafe fn load(value: ErasedValue) -> T {
        // SAFETY:
        // 1. Cells built by this strategy are in the code state (guaranteed by
        //    the caller)
        let code = unsafe { value.code() };
        T::from_code(code)
    }

    #[inline]
    unsafe fn view(value: &ErasedValue) -> ValueRef<'_, T> {
        // SAFETY:
        // 1. Cells built by this strategy are in the code state (guaranteed by
        //    the caller)
        let code = unsafe { value.code() };
        ValueRef::Owned(T::from_code(code))
    }
}

impl<T: Copy + 'static> Storage<T> for BitCast {
    const REPRESENTATION: Representation = Representation::BitCast;
    const FITS: bool = size_of::<T>() == CELL_SIZE && align_of::<T>() <= CELL_ALIGN;
    const CLONE: Option<unsafe fn(&ErasedValue) -> ErasedValue> = None;
    const DROP: Option<unsafe fn(&mut ErasedValue)> = None;

    #[inline]
    fn store(value: T) -> ErasedValue {
        const {
            assert!(
                size_of::<T>() == CELL_SIZE,
                "bit-cast payloads must be exactly the size of the erased value cell"
            );
        }
        ErasedValue::from_in_place(value)
    }

    #[inline]
    unsafe fn load(value: ErasedValue) -> T {
        // SAFETY:
        // 1. The cell holds a `T` (guaranteed by the caller)
        // 2. `T: Copy`, so reading it does not duplicate ownership
        unsafe { value.read_in_place::<T>() }
    }

    #[inline]
    unsafe fn view(value: &ErasedValue) -> ValueRef<'_, T> {
        // SAFETY:
        // 1. The cell holds a `T` (guaranteed by the caller)
        ValueRef::Borrowed(unsafe { value.in_place_ref::<T>() })
    }
}

impl<T: Clone + 'static> Storage<T> for InPlace {
    const REPRESENTATION: Representation = Representation::InPlace;
    const FITS: bool = fits::<T>();
    const CLONE: Option<unsafe fn(&ErasedValue) -> ErasedValue> = Some(clone_in_place::<T>);
    const DROP: Option<unsafe fn(&mut ErasedValue)> = if core::mem::needs_drop::<T>() {
        Some(drop_in_place::<T>)
    } else {
        None
    };

    #[inline]
    fn store(value: T) -> ErasedValue {
        ErasedValue::from_in_place(value)
    }

    #[inline]
    unsafe fn load(value: ErasedValue) -> T {
        // SAFETY:
        // 1. The cell holds a `T` (guaranteed by the caller)
        // 2. `value` is consumed here and has no drop glue, so the payload
        //    left behind is never touched again
        unsafe { value.read_in_place::<T>() }
    }

    #[inline]
    unsafe fn view(value: &ErasedValue) -> ValueRef<'_, T> {
        // SAFETY:
        // 1. The cell holds a `T` (guaranteed by the caller)
        ValueRef::Borrowed(unsafe { value.in_place_ref::<T>() })
    }
}

/// Clones an in-place payload into a new cell.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell holds a valid `T` constructed in place.
unsafe fn clone_in_place<T: Clone>(value: &ErasedValue) -> ErasedValue {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &T = unsafe { value.in_place_ref::<T>() };
    ErasedValue::from_in_place(value.clone())
}

/// Drops an in-place payload.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell holds a valid `T` constructed in place.
/// 2. The payload is not used again afterwards.
unsafe fn drop_in_place<T>(value: &mut ErasedValue) {
    // SAFETY:
    // 1. Guaranteed by the caller
    // 2. Guaranteed by the caller
    unsafe { value.drop_in_place::<T>() }
}

impl ErasedValue {
    /// Stores a payload using the strategy it selected.
    #[inline]
    pub fn new<T: Payload>(value: T) -> Self {
        <T::Storage as Storage<T>>::store(value)
    }

    /// Takes the payload back out of the cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell was created by [`ErasedValue::new::<T>`](Self::new) or is a
    ///    copy made through [`ValueVtable::new::<T>`](super::ValueVtable::new).
    #[inline]
    pub unsafe fn into_inner<T: Payload>(self) -> T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { <T::Storage as Storage<T>>::load(self) }
    }

    /// Views the payload of the cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell was created by [`ErasedValue::new::<T>`](Self::new) or is a
    ///    copy made through [`ValueVtable::new::<T>`](super::ValueVtable::new).
    #[inline]
    pub unsafe fn view<T: Payload>(&self) -> ValueRef<'_, T> {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { <T::Storage as Storage<T>>::view(self) }
    }
}

/// A view of a payload stored in an [`ErasedValue`].
///
/// Numeric payloads are rebuilt from their code and held by value; every other
/// payload is borrowed from the cell.
pub enum ValueRef<'a, T> {
    /// A payload rebuilt from the cell.
    Owned(T),
    /// A payload borrowed from the cell.
    Borrowed(&'a T),
}

impl<T: Clone> ValueRef<'_, T> {
    /// Returns an owned copy of the payload.
    #[inline]
    pub fn into_owned(self) -> T {
        match self {
            ValueRef::Owned(value) => value,
            ValueRef::Borrowed(value) => value.clone(),
        }
    }
}

impl<T> Deref for ValueRef<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self {
            ValueRef::Owned(value) => value,
            ValueRef::Borrowed(value) => value,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Implements [`NumericPayload`] and [`Payload`] for primitive integers.
macro_rules! impl_numeric_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NumericPayload for $ty {
                #[inline]
                fn into_code(self) -> isize {
                    self as isize
                }

                #[inline]
                fn from_code(code: isize) -> Self {
                    code as $ty
                }
            }

            impl Payload for $ty {
                type Storage = Numeric;
            }
        )*
    };
}

impl_numeric_payload!(i8, i16, i32, isize, u8, u16, u32, usize);

#[cfg(target_pointer_width = "64")]
impl_numeric_payload!(i64, u64);

impl NumericPayload for bool {
    #[inline]
    fn into_code(self) -> isize {
        isize::from(self)
    }

    #[inline]
    fn from_code(code: isize) -> Self {
        code != 0
    }
}

impl Payload for bool {
    type Storage = Numeric;
}

#[cfg(target_pointer_width = "64")]
impl Payload for f64 {
    type Storage = BitCast;
}

#[cfg(target_pointer_width = "32")]
impl Payload for f32 {
    type Storage = BitCast;
}

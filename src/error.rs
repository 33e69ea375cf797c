use core::{any::TypeId, fmt, mem::ManuallyDrop};

use errdom_internals::{
    shared_string::SharedString,
    value::{ErasedValue, Payload, ValueRef},
};

use crate::{
    Errc, ErrorCode, ExceptionErrc, IntoError,
    domain::{Domain, DomainVtable, ErrorDomain},
};

/// An error from any error domain.
///
/// An `Error` is two words: a reference to the static table of its domain and
/// a pointer-sized cell holding the payload. Copying an error copies the
/// payload the way the payload type says to; dropping it releases whatever
/// the payload owns.
///
/// # Examples
///
/// ```
/// use errdom::{Errc, Error, GenericDomain};
///
/// let error = Error::new::<GenericDomain>(Errc::NoSuchFileOrDirectory);
/// assert_eq!(error.message(), "No such file or directory");
/// assert_eq!(error.cast::<Errc>(), Some(Errc::NoSuchFileOrDirectory));
/// assert_eq!(error.cast::<u32>(), None);
/// ```
pub struct Error {
    /// The domain of the error.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `value` holds a payload of the payload type of this domain, created
    ///    through `ErasedValue::new` or copied through the domain's
    ///    [`ValueVtable`](errdom_internals::value::ValueVtable).
    domain: &'static DomainVtable,
    /// The payload.
    value: ErasedValue,
}

impl Error {
    /// Creates an error of the domain `D` holding `value`.
    ///
    /// Fails to compile if the payload type cannot be stored by the strategy
    /// it selected.
    #[inline]
    pub fn new<D: ErrorDomain>(value: D::Value) -> Self {
        Self {
            domain: DomainVtable::new::<D>(),
            value: ErasedValue::new(value),
        }
    }

    /// Creates an error from anything implementing [`IntoError`].
    ///
    /// ```
    /// use errdom::{Errc, Error};
    ///
    /// let error = Error::from_value(Errc::PermissionDenied);
    /// assert!(error == Errc::PermissionDenied);
    /// ```
    #[inline]
    pub fn from_value<T: IntoError>(value: T) -> Self {
        value.into_error()
    }

    /// Returns the domain of this error.
    #[inline]
    pub fn domain(&self) -> Domain {
        Domain::from_vtable(self.domain)
    }

    /// Returns the message describing this error.
    pub fn message(&self) -> SharedString {
        // SAFETY:
        // 1. `self.domain` is the vtable of `self` (struct invariant)
        unsafe { self.domain.message(self) }
    }

    /// Raises this error as a panic, the way its domain wants it raised.
    ///
    /// The built-in domains raise a value that can be turned back into an
    /// equivalent [`Error`] once caught, see
    /// [`ExceptionPtr::catch`](crate::ExceptionPtr::catch).
    pub fn throw_exception(&self) -> ! {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            domain = self.domain().name(),
            description = %self.message(),
            "raising error"
        );
        // SAFETY:
        // 1. `self.domain` is the vtable of `self` (struct invariant)
        unsafe { self.domain.throw_exception(self) }
    }

    /// Returns whether the payload of this error is a `T`.
    #[inline]
    pub fn is<T: Payload>(&self) -> bool {
        self.domain.value().type_id() == TypeId::of::<T>()
    }

    /// Returns a copy of the payload if it is a `T`.
    #[inline]
    pub fn cast<T: Payload>(&self) -> Option<T> {
        self.cast_ref::<T>().map(ValueRef::into_owned)
    }

    /// Returns a view of the payload if it is a `T`.
    #[inline]
    pub fn cast_ref<T: Payload>(&self) -> Option<ValueRef<'_, T>> {
        if self.is::<T>() {
            // SAFETY:
            // 1. The payload is a `T` (checked above)
            Some(unsafe { self.value_unchecked::<T>() })
        } else {
            None
        }
    }

    /// Returns a view of the payload if this error belongs to the domain `D`.
    ///
    /// This is the usual way for [`ErrorDomain::equivalent`] to inspect the
    /// other side of a comparison.
    #[inline]
    pub fn value_in<D: ErrorDomain>(&self) -> Option<ValueRef<'_, D::Value>> {
        if self.domain.id() == D::ID {
            self.cast_ref::<D::Value>()
        } else {
            None
        }
    }

    /// Moves the payload out if it is a `T`, or hands the error back.
    pub fn into_cast<T: Payload>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let this = ManuallyDrop::new(self);
        // SAFETY:
        // 1. `this` is never dropped, so the payload is moved out exactly once.
        let value = unsafe { core::ptr::read(&this.value) };
        // SAFETY:
        // 1. The payload is a `T` (checked above)
        Ok(unsafe { value.into_inner::<T>() })
    }

    /// Returns a copy of the payload without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The payload of this error is a `T`.
    #[inline]
    pub unsafe fn cast_unchecked<T: Payload>(&self) -> T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.value_unchecked::<T>() }.into_owned()
    }

    /// Views the payload without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The payload of this error is a `T`.
    #[inline]
    pub(crate) unsafe fn value_unchecked<T: Payload>(&self) -> ValueRef<'_, T> {
        debug_assert!(
            self.is::<T>(),
            "payload of {} is a {}, not a {}",
            self.domain.name(),
            self.domain.value().type_name(),
            core::any::type_name::<T>()
        );
        // SAFETY:
        // 1. `self.value` holds a payload of the domain's payload type (struct
        //    invariant), which is `T` (guaranteed by the caller)
        unsafe { self.value.view::<T>() }
    }
}

impl Clone for Error {
    fn clone(&self) -> Self {
        // SAFETY:
        // 1. The value vtable of the domain is the vtable of `self.value`
        //    (struct invariant)
        let value = unsafe { self.domain.value().clone_value(&self.value) };
        Self {
            domain: self.domain,
            value,
        }
    }
}

impl Drop for Error {
    fn drop(&mut self) {
        // SAFETY:
        // 1. The value vtable of the domain is the vtable of `self.value`
        //    (struct invariant)
        // 2. The payload is not used after the error is dropped.
        unsafe { self.domain.value().drop_value(&mut self.value) }
    }
}

// SAFETY: Every payload type is `Send + Sync` (required by `Payload`), and the
// domain vtable is immutable static data.
unsafe impl Send for Error {}

// SAFETY: Every payload type is `Send + Sync` (required by `Payload`), and the
// domain vtable is immutable static data.
unsafe impl Sync for Error {}

impl PartialEq for Error {
    /// Two errors are equal when either domain considers them equivalent.
    fn eq(&self, other: &Self) -> bool {
        // SAFETY:
        // 1. `self.domain` is the vtable of `self` (struct invariant)
        if unsafe { self.domain.equivalent(self, other) } {
            return true;
        }
        // SAFETY:
        // 1. `other.domain` is the vtable of `other` (struct invariant)
        unsafe { other.domain.equivalent(other, self) }
    }
}

macro_rules! compare_through_error {
    ($($ty:ty),*) => {
        $(
            impl PartialEq<$ty> for Error {
                fn eq(&self, other: &$ty) -> bool {
                    *self == Error::from(*other)
                }
            }

            impl PartialEq<Error> for $ty {
                fn eq(&self, other: &Error) -> bool {
                    Error::from(*self) == *other
                }
            }
        )*
    };
}

compare_through_error!(Errc, ErrorCode, ExceptionErrc);

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("domain", &self.domain().name())
            .field("message", &self.message().as_str())
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl core::error::Error for Error {}

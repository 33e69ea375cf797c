//! Vtable for type-erased domain operations.
//!
//! This module encapsulates the fields of [`DomainVtable`] so they cannot be
//! accessed directly. This guarantees the safety invariant: **the vtable's
//! domain type matches the domain the payload of the [`Error`] was built
//! for**. Vtables are only created as `&'static` references through
//! [`DomainVtable::new`], which pairs the function pointers with one domain
//! type at compile time.

use errdom_internals::{shared_string::SharedString, value::ValueVtable};

use super::{DomainId, ErrorDomain};
use crate::Error;

/// Vtable for type-erased domain operations.
///
/// # Safety
///
/// The following safety invariants are guaranteed to be upheld as long as this
/// struct exists:
///
/// * The fields `equivalent`, `message` and `throw_exception` point to the
///   functions defined below, instantiated with the domain `D` that was used
///   to create this [`DomainVtable`].
/// * `value` is the [`ValueVtable`] of `D::Value`.
// Only ever handed out as `&'static Self`.
#[allow(missing_copy_implementations)]
pub(crate) struct DomainVtable {
    /// The id of the domain.
    id: DomainId,
    /// Gets the name of the domain.
    name: fn() -> &'static str,
    /// Resource management for the payload type.
    value: &'static ValueVtable,
    /// Dispatches to [`ErrorDomain::equivalent`].
    equivalent: unsafe fn(&Error, &Error) -> bool,
    /// Dispatches to [`ErrorDomain::message`].
    message: unsafe fn(&Error) -> SharedString,
    /// Dispatches to [`ErrorDomain::throw_exception`].
    throw_exception: unsafe fn(&Error) -> !,
}

impl DomainVtable {
    /// Creates the [`DomainVtable`] for the domain `D`.
    pub(crate) const fn new<D: ErrorDomain>() -> &'static Self {
        const {
            &Self {
                id: D::ID,
                name: D::name,
                value: ValueVtable::new::<D::Value>(),
                equivalent: equivalent::<D>,
                message: message::<D>,
                throw_exception: throw_exception::<D>,
            }
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> DomainId {
        self.id
    }

    #[inline]
    pub(crate) fn name(&self) -> &'static str {
        (self.name)()
    }

    /// Gets the resource-management descriptor of the payload type.
    #[inline]
    pub(crate) fn value(&self) -> &'static ValueVtable {
        self.value
    }

    /// Asks this domain whether `lhs` is equivalent to `rhs`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`DomainVtable`] is the vtable of `lhs`.
    #[inline]
    pub(crate) unsafe fn equivalent(&self, lhs: &Error, rhs: &Error) -> bool {
        // SAFETY: `self.equivalent` points to `equivalent::<D>` below. That
        // function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.equivalent)(lhs, rhs) }
    }

    /// Renders the message of `error`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`DomainVtable`] is the vtable of `error`.
    #[inline]
    pub(crate) unsafe fn message(&self, error: &Error) -> SharedString {
        // SAFETY: `self.message` points to `message::<D>` below. That
        // function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.message)(error) }
    }

    /// Raises `error` as a panic.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`DomainVtable`] is the vtable of `error`.
    #[inline]
    pub(crate) unsafe fn throw_exception(&self, error: &Error) -> ! {
        // SAFETY: `self.throw_exception` points to `throw_exception::<D>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.throw_exception)(error) }
    }
}

/// Calls [`ErrorDomain::equivalent`] with the payload of `lhs`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `lhs` was created for the domain `D`.
unsafe fn equivalent<D: ErrorDomain>(lhs: &Error, rhs: &Error) -> bool {
    debug_assert_eq!(lhs.domain().id(), D::ID);
    // SAFETY:
    // 1. The payload of `lhs` is a `D::Value` (guaranteed by the caller)
    let value = unsafe { lhs.value_unchecked::<D::Value>() };
    D::equivalent(&value, rhs)
}

/// Calls [`ErrorDomain::message`] with the payload of `error`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `error` was created for the domain `D`.
unsafe fn message<D: ErrorDomain>(error: &Error) -> SharedString {
    debug_assert_eq!(error.domain().id(), D::ID);
    // SAFETY:
    // 1. The payload of `error` is a `D::Value` (guaranteed by the caller)
    let value = unsafe { error.value_unchecked::<D::Value>() };
    D::message(&value)
}

/// Calls [`ErrorDomain::throw_exception`] with the payload of `error`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `error` was created for the domain `D`.
unsafe fn throw_exception<D: ErrorDomain>(error: &Error) -> ! {
    debug_assert_eq!(error.domain().id(), D::ID);
    // SAFETY:
    // 1. The payload of `error` is a `D::Value` (guaranteed by the caller)
    let value = unsafe { error.value_unchecked::<D::Value>() };
    D::throw_exception(&value, error)
}

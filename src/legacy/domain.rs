use errdom_internals::{
    intrusive::{Counted, IntrusivePtr},
    shared_string::SharedString,
};

use super::ErrorCode;
use crate::{
    DomainId, Errc, Error, ErrorDomain, ExceptionCategory, ExceptionCodeDomain, ExceptionErrc,
    GenericCategory, GenericDomain,
};

/// The domain of shared legacy [`ErrorCode`]s.
///
/// The payload is a shared, reference-counted copy of the code. A null
/// payload describes itself as `Bad error code` and is equivalent to nothing.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct LegacyCodeDomain;

impl ErrorDomain for LegacyCodeDomain {
    type Value = IntrusivePtr<Counted<ErrorCode>>;

    const ID: DomainId = DomainId::new(0x1d4f_6a2b_93c0_e857, 0xa3c1_0b7e_58d2_f964);

    fn name() -> &'static str {
        "legacy error code domain"
    }

    fn equivalent(lhs: &Self::Value, rhs: &Error) -> bool {
        let Some(code) = lhs.get() else {
            return false;
        };
        let code: ErrorCode = **code;

        if let Some(other) = rhs.value_in::<LegacyCodeDomain>() {
            return other.get().is_some_and(|other| **other == code);
        }
        if let Some(errc) = rhs.value_in::<GenericDomain>() {
            return code.category().equivalent_to_generic(code.value(), *errc);
        }
        false
    }

    fn message(value: &Self::Value) -> SharedString {
        value
            .get()
            .map_or(SharedString::from_static("Bad error code"), |code| {
                code.message()
            })
    }

    /// Raises an [`Exception`](crate::Exception) of kind
    /// [`System`](crate::ExceptionKind::System) carrying the code.
    fn throw_exception(value: &Self::Value, error: &Error) -> ! {
        #[cfg(feature = "std")]
        if let Some(code) = value.get() {
            crate::Exception::system(**code).raise()
        }
        #[cfg(not(feature = "std"))]
        let _ = value;
        crate::propagate::throw_error(error)
    }
}

/// Wraps a legacy code.
///
/// A [`GenericCategory`] code with a known value becomes a [`GenericDomain`]
/// error and an [`ExceptionCategory`] code with a known value becomes an
/// [`ExceptionCodeDomain`] error. Anything else is shared in the
/// [`LegacyCodeDomain`].
impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        if code.is_in::<GenericCategory>() {
            if let Some(errc) = Errc::from_raw_os_error(code.value()) {
                return errc.into();
            }
        } else if code.is_in::<ExceptionCategory>() {
            if let Some(errc) = ExceptionErrc::from_code(code.value()) {
                return errc.into();
            }
        }
        Error::new::<LegacyCodeDomain>(IntrusivePtr::new(Counted::new(code)))
    }
}

impl Error {
    /// Returns the legacy code this error corresponds to, if it has one.
    ///
    /// Errors of the generic, legacy and exception code domains have one. A
    /// null legacy payload and errors of any other domain do not.
    ///
    /// ```
    /// use errdom::{Errc, Error, ErrorCode, GenericCategory};
    ///
    /// let code = ErrorCode::new(9, &GenericCategory);
    /// assert_eq!(Error::from(code).to_error_code(), Some(code));
    /// ```
    pub fn to_error_code(&self) -> Option<ErrorCode> {
        if let Some(code) = self.value_in::<LegacyCodeDomain>() {
            return code.get().map(|code| **code);
        }
        if let Some(errc) = self.value_in::<GenericDomain>() {
            return Some(ErrorCode::from(*errc));
        }
        if let Some(errc) = self.value_in::<ExceptionCodeDomain>() {
            return Some(ErrorCode::from(*errc));
        }
        None
    }
}

use alloc::string::String;
use core::any::Any;

use errdom_internals::shared_string::SharedString;

use super::{Exception, ExceptionErrc, ExceptionPtr, classify};
use crate::{
    DomainId, Error, ErrorCode, ErrorDomain, GenericDomain, LegacyCodeDomain, ThrownError,
};

/// The domain of captured panics.
///
/// A captured [`Exception`] is equivalent to whatever its classification is
/// equivalent to. A payload that cannot be classified is only equivalent to
/// other handles to the same payload.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct NativeExceptionDomain;

impl ErrorDomain for NativeExceptionDomain {
    type Value = ExceptionPtr;

    const ID: DomainId = DomainId::new(0xc6a8_41f0_2b93_d75e, 0x3e9b_7f12_a04c_68d1);

    fn name() -> &'static str {
        "native exception domain"
    }

    fn equivalent(lhs: &ExceptionPtr, rhs: &Error) -> bool {
        let other = rhs.value_in::<NativeExceptionDomain>();
        if other.as_ref().is_some_and(|other| lhs.ptr_eq(other)) {
            return true;
        }

        let unspecified = ErrorCode::from(ExceptionErrc::Unspecified);
        let code = classify(lhs);
        if code == unspecified {
            return false;
        }
        match other {
            Some(other) => classify(&other) == code,
            None => Error::from(code) == *rhs,
        }
    }

    fn message(value: &ExceptionPtr) -> SharedString {
        value.describe()
    }

    /// Re-raises the captured payload.
    #[cfg(feature = "std")]
    fn throw_exception(value: &ExceptionPtr, _error: &Error) -> ! {
        value.rethrow()
    }
}

/// Describes a panic payload.
///
/// Text payloads, as produced by `panic!`, are returned verbatim.
pub(super) fn describe_payload(payload: &(dyn Any + Send)) -> SharedString {
    if let Some(exception) = payload.downcast_ref::<Exception>() {
        exception.message().clone()
    } else if let Some(text) = payload.downcast_ref::<&'static str>() {
        SharedString::from_static(text)
    } else if let Some(text) = payload.downcast_ref::<String>() {
        SharedString::new(text)
    } else if let Some(thrown) = payload.downcast_ref::<ThrownError>() {
        thrown.error().message()
    } else {
        SharedString::from_static("Unknown dynamic exception")
    }
}

/// Captures a panic payload.
///
/// A captured [`ThrownError`] hands back the error it carries instead.
impl From<ExceptionPtr> for Error {
    fn from(exception: ExceptionPtr) -> Self {
        match exception.with_downcast(|thrown: &ThrownError| thrown.error().clone()) {
            Some(error) => error,
            None => Error::new::<NativeExceptionDomain>(exception),
        }
    }
}

/// The domain of [`ExceptionErrc`] classifications.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ExceptionCodeDomain;

impl ErrorDomain for ExceptionCodeDomain {
    type Value = ExceptionErrc;

    const ID: DomainId = DomainId::new(0x8f27_c5d3_61ae_0b94, 0xd41e_926a_7c05_b3f8);

    fn name() -> &'static str {
        "exception code domain"
    }

    fn equivalent(lhs: &ExceptionErrc, rhs: &Error) -> bool {
        if let Some(other) = rhs.value_in::<ExceptionCodeDomain>() {
            return *other == *lhs;
        }
        if let Some(code) = rhs.value_in::<LegacyCodeDomain>() {
            return code
                .get()
                .is_some_and(|code| **code == ErrorCode::from(*lhs));
        }
        if let Some(errc) = rhs.value_in::<GenericDomain>() {
            return lhs.generic_condition() == Some(*errc);
        }
        false
    }

    fn message(value: &ExceptionErrc) -> SharedString {
        SharedString::from_static(value.message())
    }
}

impl From<ExceptionErrc> for Error {
    #[inline]
    fn from(errc: ExceptionErrc) -> Self {
        Error::new::<ExceptionCodeDomain>(errc)
    }
}

impl Error {
    /// Returns a captured panic equivalent to this error.
    ///
    /// A native exception error hands back its own handle. Codes with a
    /// natural failure kind become an [`Exception`] of that kind. Anything
    /// else is wrapped in a [`ThrownError`], which converts back into an equal
    /// error.
    ///
    /// ```
    /// use errdom::{Errc, Error, Exception};
    ///
    /// let error = Error::from(Errc::BadFileDescriptor);
    /// let ptr = error.to_exception_ptr();
    /// assert!(ptr.is::<Exception>());
    /// assert!(Error::from(ptr) == error);
    /// ```
    pub fn to_exception_ptr(&self) -> ExceptionPtr {
        if let Some(ptr) = self.value_in::<NativeExceptionDomain>() {
            return ptr.into_owned();
        }
        if let Some(errc) = self.value_in::<ExceptionCodeDomain>() {
            if let Some(kind) = errc.kind() {
                return ExceptionPtr::new(Exception::of_kind(kind));
            }
        }
        match self.to_error_code() {
            Some(code) if !code.is_in::<super::ExceptionCategory>() => {
                ExceptionPtr::new(Exception::system(code))
            }
            _ => ExceptionPtr::new(ThrownError::new(self.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Errc, ExceptionKind, SystemCategory};

    #[test]
    fn test_messages() {
        let error = Error::from(Exception::invalid_argument("Erroneous reticulum"));
        assert_eq!(error.message(), "Erroneous reticulum");
        assert_eq!(error.domain().name(), "native exception domain");

        assert_eq!(Error::from(ExceptionPtr::new("static text")).message(), "static text");
        assert_eq!(
            Error::from(ExceptionPtr::new(String::from("owned text"))).message(),
            "owned text"
        );
        assert_eq!(
            Error::from(ExceptionPtr::new(3.5_f64)).message(),
            "Unknown dynamic exception"
        );
    }

    #[test]
    fn test_classified_equivalence() {
        let error = Error::from(Exception::invalid_argument("X"));
        assert!(error == Errc::InvalidArgument);
        assert!(Errc::InvalidArgument == error);
        assert!(error == ExceptionErrc::InvalidArgument);
        assert!(error != Errc::ResultOutOfRange);

        let other = Error::from(Exception::invalid_argument("Y"));
        assert!(error == other);
        assert!(error != Error::from(Exception::logic_error("X")));
    }

    #[test]
    fn test_system_exception_equivalence() {
        let code = ErrorCode::from(Errc::NotEnoughMemory);
        let error = Error::from(Exception::system(code));
        assert!(error == Errc::NotEnoughMemory);
        assert!(error == code);
        assert_eq!(error.message(), "Cannot allocate memory");
    }

    #[test]
    fn test_unclassified_payloads_compare_by_identity() {
        let error = Error::from(ExceptionPtr::new(17_i32));
        assert!(error == error.clone());
        assert!(error != Error::from(ExceptionPtr::new(17_i32)));
        assert!(error != ExceptionErrc::Unspecified);
    }

    #[test]
    fn test_exception_codes() {
        let error = Error::from(ExceptionErrc::LengthError);
        assert_eq!(error.message(), "length error");
        assert!(error == Errc::ValueTooLarge);
        assert!(error == ErrorCode::from(ExceptionErrc::LengthError));
        assert!(error != Errc::ResultOutOfRange);
        assert_eq!(
            error.to_error_code(),
            Some(ErrorCode::from(ExceptionErrc::LengthError))
        );

        let wrapped = Error::new::<LegacyCodeDomain>(errdom_internals::intrusive::IntrusivePtr::new(
            errdom_internals::intrusive::Counted::new(ErrorCode::from(ExceptionErrc::LengthError)),
        ));
        assert!(wrapped == error);
        assert!(error == wrapped);
    }

    #[test]
    fn test_to_exception_ptr() {
        let ptr = Error::from(ExceptionErrc::OverflowError).to_exception_ptr();
        assert_eq!(
            ptr.with_downcast(|exception: &Exception| exception.kind()),
            Some(ExceptionKind::Overflow)
        );

        let error = Error::from(ErrorCode::new(4242, &SystemCategory));
        let ptr = error.to_exception_ptr();
        assert_eq!(
            ptr.with_downcast(|exception: &Exception| exception.code()),
            Some(Some(ErrorCode::new(4242, &SystemCategory)))
        );

        let native = Error::from(ExceptionPtr::new(1_u8));
        assert!(native.to_exception_ptr().ptr_eq(&native.cast::<ExceptionPtr>().unwrap()));
    }

    #[test]
    fn test_thrown_error_unwraps() {
        let error = Error::from(ExceptionErrc::Unspecified);
        let ptr = error.to_exception_ptr();
        assert!(ptr.is::<ThrownError>());
        let back = Error::from(ptr);
        assert!(back.domain().is::<ExceptionCodeDomain>());
        assert!(back == error);
    }
}

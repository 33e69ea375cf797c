//! Classification of captured panics into numeric codes.

use core::{any::Any, fmt};

use errdom_internals::{
    shared_string::SharedString,
    value::{Numeric, NumericPayload, Payload},
};

use super::{Exception, ExceptionKind, ExceptionPtr};
use crate::{Errc, ErrorCategory, ErrorCode};

/// The classification of a captured failure.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(i32)]
pub enum ExceptionErrc {
    /// A [`ExceptionKind::Runtime`] failure.
    RuntimeError = 1,
    /// A [`ExceptionKind::Domain`] failure.
    DomainError = 2,
    /// A [`ExceptionKind::InvalidArgument`] failure.
    InvalidArgument = 3,
    /// A [`ExceptionKind::Length`] failure.
    LengthError = 4,
    /// A [`ExceptionKind::OutOfRange`] failure.
    OutOfRange = 5,
    /// A [`ExceptionKind::Logic`] failure.
    LogicError = 6,
    /// A [`ExceptionKind::Range`] failure.
    RangeError = 7,
    /// A [`ExceptionKind::Overflow`] failure.
    OverflowError = 8,
    /// A [`ExceptionKind::Underflow`] failure.
    UnderflowError = 9,
    /// A [`ExceptionKind::Allocation`] failure.
    AllocationFailure = 10,
    /// A [`ExceptionKind::ArrayLength`] failure.
    ArrayLength = 11,
    /// A [`ExceptionKind::OptionalAccess`] failure.
    OptionalAccess = 12,
    /// A [`ExceptionKind::TypeId`] failure.
    TypeId = 13,
    /// A [`ExceptionKind::AnyCast`] failure.
    AnyCast = 14,
    /// A [`ExceptionKind::Cast`] failure.
    Cast = 15,
    /// A [`ExceptionKind::WeakPtr`] failure.
    WeakPtr = 16,
    /// A [`ExceptionKind::FunctionCall`] failure.
    FunctionCall = 17,
    /// A [`ExceptionKind::BadException`] failure.
    BadException = 18,
    /// A [`ExceptionKind::VariantAccess`] failure.
    VariantAccess = 19,
    /// A failure no rule recognised.
    Unspecified = 20,
}

impl ExceptionErrc {
    /// Every classification, in code order.
    const ALL: [Self; 20] = [
        Self::RuntimeError,
        Self::DomainError,
        Self::InvalidArgument,
        Self::LengthError,
        Self::OutOfRange,
        Self::LogicError,
        Self::RangeError,
        Self::OverflowError,
        Self::UnderflowError,
        Self::AllocationFailure,
        Self::ArrayLength,
        Self::OptionalAccess,
        Self::TypeId,
        Self::AnyCast,
        Self::Cast,
        Self::WeakPtr,
        Self::FunctionCall,
        Self::BadException,
        Self::VariantAccess,
        Self::Unspecified,
    ];

    /// Returns the classification with the code `code`.
    pub const fn from_code(code: i32) -> Option<Self> {
        if code >= 1 && code <= Self::ALL.len() as i32 {
            Some(Self::ALL[(code - 1) as usize])
        } else {
            None
        }
    }

    /// Returns the numeric code of this classification.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Returns the description of this classification.
    pub const fn message(self) -> &'static str {
        match self {
            Self::RuntimeError => "runtime error",
            Self::DomainError => "domain error",
            Self::InvalidArgument => "invalid argument",
            Self::LengthError => "length error",
            Self::OutOfRange => "out of range",
            Self::LogicError => "logic error",
            Self::RangeError => "range error",
            Self::OverflowError => "overflow error",
            Self::UnderflowError => "underflow error",
            Self::AllocationFailure => "memory allocation failed",
            Self::ArrayLength => "invalid array length",
            Self::OptionalAccess => "access to an empty optional value",
            Self::TypeId => "type information of an absent value",
            Self::AnyCast => "failed conversion of a dynamically typed value",
            Self::Cast => "failed cast",
            Self::WeakPtr => "dangling weak pointer",
            Self::FunctionCall => "call through an empty function",
            Self::BadException => "failure while raising a failure",
            Self::VariantAccess => "access to the wrong variant alternative",
            Self::Unspecified => "unspecified exception",
        }
    }

    /// Returns the portable condition this classification corresponds to.
    pub const fn generic_condition(self) -> Option<Errc> {
        match self {
            Self::DomainError => Some(Errc::ArgumentOutOfDomain),
            Self::InvalidArgument => Some(Errc::InvalidArgument),
            Self::LengthError | Self::OverflowError => Some(Errc::ValueTooLarge),
            Self::OutOfRange | Self::RangeError | Self::UnderflowError => {
                Some(Errc::ResultOutOfRange)
            }
            Self::AllocationFailure | Self::ArrayLength => Some(Errc::NotEnoughMemory),
            _ => None,
        }
    }

    /// Returns the kind of failure this classification stands for.
    pub const fn kind(self) -> Option<ExceptionKind> {
        Some(match self {
            Self::RuntimeError => ExceptionKind::Runtime,
            Self::DomainError => ExceptionKind::Domain,
            Self::InvalidArgument => ExceptionKind::InvalidArgument,
            Self::LengthError => ExceptionKind::Length,
            Self::OutOfRange => ExceptionKind::OutOfRange,
            Self::LogicError => ExceptionKind::Logic,
            Self::RangeError => ExceptionKind::Range,
            Self::OverflowError => ExceptionKind::Overflow,
            Self::UnderflowError => ExceptionKind::Underflow,
            Self::AllocationFailure => ExceptionKind::Allocation,
            Self::ArrayLength => ExceptionKind::ArrayLength,
            Self::OptionalAccess => ExceptionKind::OptionalAccess,
            Self::TypeId => ExceptionKind::TypeId,
            Self::AnyCast => ExceptionKind::AnyCast,
            Self::Cast => ExceptionKind::Cast,
            Self::WeakPtr => ExceptionKind::WeakPtr,
            Self::FunctionCall => ExceptionKind::FunctionCall,
            Self::BadException => ExceptionKind::BadException,
            Self::VariantAccess => ExceptionKind::VariantAccess,
            Self::Unspecified => return None,
        })
    }
}

impl NumericPayload for ExceptionErrc {
    #[inline]
    fn into_code(self) -> isize {
        self as isize
    }

    fn from_code(code: isize) -> Self {
        match i32::try_from(code).ok().and_then(Self::from_code) {
            Some(errc) => errc,
            None => unreachable!("{code} is not the code of an `ExceptionErrc`"),
        }
    }
}

impl Payload for ExceptionErrc {
    type Storage = Numeric;
}

impl fmt::Display for ExceptionErrc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl core::error::Error for ExceptionErrc {}

impl From<ExceptionErrc> for ErrorCode {
    #[inline]
    fn from(errc: ExceptionErrc) -> Self {
        ErrorCode::new(errc.code(), &ExceptionCategory)
    }
}

/// The category of [`ExceptionErrc`] codes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ExceptionCategory;

impl ErrorCategory for ExceptionCategory {
    fn name(&self) -> &'static str {
        "exception"
    }

    fn message(&self, code: i32) -> SharedString {
        SharedString::from_static(match ExceptionErrc::from_code(code) {
            Some(errc) => errc.message(),
            None if code == 0 => "success",
            None => "unknown exception code",
        })
    }

    fn generic_condition(&self, code: i32) -> Option<Errc> {
        ExceptionErrc::from_code(code).and_then(ExceptionErrc::generic_condition)
    }
}

/// What a classification rule produces when it matches.
#[derive(Copy, Clone)]
enum Outcome {
    /// A fixed classification.
    Code(ExceptionErrc),
    /// The code carried by the failure; the next rules are tried if it
    /// carries none.
    OwnCode,
}

/// Tests for one kind, most specific kinds first.
const RULES: [(ExceptionKind, Outcome); 20] = [
    (ExceptionKind::Domain, Outcome::Code(ExceptionErrc::DomainError)),
    (ExceptionKind::InvalidArgument, Outcome::Code(ExceptionErrc::InvalidArgument)),
    (ExceptionKind::Length, Outcome::Code(ExceptionErrc::LengthError)),
    (ExceptionKind::OutOfRange, Outcome::Code(ExceptionErrc::OutOfRange)),
    (ExceptionKind::Logic, Outcome::Code(ExceptionErrc::LogicError)),
    (ExceptionKind::Range, Outcome::Code(ExceptionErrc::RangeError)),
    (ExceptionKind::Overflow, Outcome::Code(ExceptionErrc::OverflowError)),
    (ExceptionKind::Underflow, Outcome::Code(ExceptionErrc::UnderflowError)),
    (ExceptionKind::System, Outcome::OwnCode),
    (ExceptionKind::Runtime, Outcome::Code(ExceptionErrc::RuntimeError)),
    (ExceptionKind::ArrayLength, Outcome::Code(ExceptionErrc::ArrayLength)),
    (ExceptionKind::Allocation, Outcome::Code(ExceptionErrc::AllocationFailure)),
    (ExceptionKind::TypeId, Outcome::Code(ExceptionErrc::TypeId)),
    (ExceptionKind::OptionalAccess, Outcome::Code(ExceptionErrc::OptionalAccess)),
    (ExceptionKind::AnyCast, Outcome::Code(ExceptionErrc::AnyCast)),
    (ExceptionKind::VariantAccess, Outcome::Code(ExceptionErrc::VariantAccess)),
    (ExceptionKind::Cast, Outcome::Code(ExceptionErrc::Cast)),
    (ExceptionKind::WeakPtr, Outcome::Code(ExceptionErrc::WeakPtr)),
    (ExceptionKind::FunctionCall, Outcome::Code(ExceptionErrc::FunctionCall)),
    (ExceptionKind::BadException, Outcome::Code(ExceptionErrc::BadException)),
];

/// A captured payload as seen by the rules.
enum Failure<'a> {
    /// An [`Exception`].
    Exception(&'a Exception),
    /// Anything else: a panic message or a foreign payload.
    Other,
}

impl<'a> Failure<'a> {
    fn of(payload: &'a (dyn Any + Send)) -> Self {
        match payload.downcast_ref::<Exception>() {
            Some(exception) => Self::Exception(exception),
            None => Self::Other,
        }
    }

    fn is_a(&self, kind: ExceptionKind) -> bool {
        match self {
            Self::Exception(exception) => exception.kind().is_a(kind),
            Self::Other => false,
        }
    }

    fn own_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Exception(exception) => exception.code(),
            Self::Other => None,
        }
    }
}

/// Classifies a captured failure.
///
/// Returns an [`ExceptionCategory`] code, or the code carried by a
/// [`ExceptionKind::System`] failure. A payload no rule recognises is
/// classified as [`ExceptionErrc::Unspecified`].
///
/// ```
/// use errdom::{Exception, ExceptionErrc, ExceptionPtr, ErrorCode, exception::classify};
///
/// let ptr = ExceptionPtr::new(Exception::underflow_error("1e-400"));
/// assert_eq!(classify(&ptr), ErrorCode::from(ExceptionErrc::UnderflowError));
///
/// let ptr = ExceptionPtr::new("just text");
/// assert_eq!(classify(&ptr), ErrorCode::from(ExceptionErrc::Unspecified));
/// ```
pub fn classify(exception: &ExceptionPtr) -> ErrorCode {
    classify_or(exception, ExceptionErrc::Unspecified.into())
}

/// Classifies a captured failure, returning `not_matched` when no rule
/// recognises it.
pub fn classify_or(exception: &ExceptionPtr, not_matched: ErrorCode) -> ErrorCode {
    exception.with_payload(|payload| {
        let failure = Failure::of(payload);
        for (kind, outcome) in RULES {
            if !failure.is_a(kind) {
                continue;
            }
            match outcome {
                Outcome::Code(errc) => return errc.into(),
                Outcome::OwnCode => {
                    if let Some(code) = failure.own_code() {
                        return code;
                    }
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            payload_type = payload_type_name(payload),
            "no classification rule matched the captured panic"
        );
        not_matched
    })
}

/// Names the common payload types for diagnostics.
#[cfg(feature = "tracing")]
fn payload_type_name(payload: &(dyn Any + Send)) -> &'static str {
    if payload.is::<Exception>() {
        "Exception"
    } else if payload.is::<&'static str>() {
        "&str"
    } else if payload.is::<alloc::string::String>() {
        "String"
    } else if payload.is::<crate::ThrownError>() {
        "ThrownError"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    fn classified(exception: Exception) -> ErrorCode {
        classify(&ExceptionPtr::new(exception))
    }

    #[test]
    fn test_codes_are_dense() {
        for (index, errc) in ExceptionErrc::ALL.iter().enumerate() {
            assert_eq!(errc.code(), index as i32 + 1);
            assert_eq!(ExceptionErrc::from_code(errc.code()), Some(*errc));
        }
        assert_eq!(ExceptionErrc::from_code(0), None);
        assert_eq!(ExceptionErrc::from_code(21), None);
    }

    #[test]
    fn test_most_specific_rule_wins() {
        assert_eq!(
            classified(Exception::invalid_argument("x")),
            ErrorCode::from(ExceptionErrc::InvalidArgument)
        );
        assert_eq!(
            classified(Exception::logic_error("x")),
            ErrorCode::from(ExceptionErrc::LogicError)
        );
        assert_eq!(
            classified(Exception::overflow_error("x")),
            ErrorCode::from(ExceptionErrc::OverflowError)
        );
        assert_eq!(
            classified(Exception::of_kind(ExceptionKind::AnyCast)),
            ErrorCode::from(ExceptionErrc::AnyCast)
        );
        assert_eq!(
            classified(Exception::of_kind(ExceptionKind::ArrayLength)),
            ErrorCode::from(ExceptionErrc::ArrayLength)
        );
    }

    #[test]
    fn test_system_failures_keep_their_code() {
        let code = ErrorCode::from(Errc::NotEnoughMemory);
        assert_eq!(classified(Exception::system(code)), code);
        assert_eq!(
            classified(Exception::new(ExceptionKind::System, "no code")),
            ErrorCode::from(ExceptionErrc::RuntimeError)
        );
    }

    #[test]
    fn test_unmatched_payloads() {
        let fallback = ErrorCode::from(Errc::IoError);
        assert_eq!(classify_or(&ExceptionPtr::new(42_u64), fallback), fallback);
        assert_eq!(
            classify(&ExceptionPtr::new(String::from("text"))),
            ErrorCode::from(ExceptionErrc::Unspecified)
        );
    }

    #[test]
    fn test_category() {
        let code = ErrorCode::from(ExceptionErrc::RangeError);
        assert_eq!(code.message(), "range error");
        assert_eq!(code.generic_condition(), Some(Errc::ResultOutOfRange));
        assert_eq!(ExceptionCategory.message(0), "success");
        assert_eq!(ExceptionErrc::Cast.generic_condition(), None);
        assert_eq!(ExceptionErrc::Cast.kind(), Some(ExceptionKind::Cast));
        assert_eq!(ExceptionErrc::Unspecified.kind(), None);
    }
}

//! Interop with panics.
//!
//! A panic payload captured with [`ExceptionPtr::catch`] becomes an error of
//! the [`NativeExceptionDomain`]. Payloads that are an [`Exception`] are
//! classified by their [`ExceptionKind`] into an [`ExceptionErrc`], which is
//! how a captured failure compares equal to portable codes:
//!
//! ```
//! # #[cfg(feature = "std")] {
//! use errdom::{Errc, Error, Exception, ExceptionPtr};
//!
//! let caught = ExceptionPtr::catch(|| Exception::invalid_argument("X").raise()).unwrap_err();
//! let error = Error::from(caught);
//! assert_eq!(error.message(), "X");
//! assert!(error == Errc::InvalidArgument);
//! # }
//! ```

mod classify;
mod domain;
mod ptr;

use core::fmt;

use errdom_internals::shared_string::SharedString;

pub use self::{
    classify::{ExceptionCategory, ExceptionErrc, classify, classify_or},
    domain::{ExceptionCodeDomain, NativeExceptionDomain},
    ptr::ExceptionPtr,
};
use crate::ErrorCode;

/// The kind of a failure, arranged in a hierarchy.
///
/// Most kinds refine either [`Logic`](Self::Logic) (a broken precondition)
/// or [`Runtime`](Self::Runtime) (a failure only detectable while running).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum ExceptionKind {
    /// A violated precondition or invariant.
    Logic,
    /// An argument outside the domain of a function.
    Domain,
    /// An invalid argument.
    InvalidArgument,
    /// An attempt to exceed a maximum size.
    Length,
    /// An index or key out of range.
    OutOfRange,
    /// A failure only detectable at run time.
    Runtime,
    /// A result outside the representable range.
    Range,
    /// An arithmetic overflow.
    Overflow,
    /// An arithmetic underflow.
    Underflow,
    /// A failure reported by the operating system, carrying its code.
    System,
    /// A failed memory allocation.
    Allocation,
    /// An invalid array length.
    ArrayLength,
    /// Access to an empty optional value.
    OptionalAccess,
    /// Type information requested for an absent value.
    TypeId,
    /// A failed conversion out of a dynamically typed value.
    AnyCast,
    /// Access to the wrong alternative of a variant.
    VariantAccess,
    /// A failed checked cast.
    Cast,
    /// Upgrade of a dangling weak pointer.
    WeakPtr,
    /// A call through an empty function wrapper.
    FunctionCall,
    /// A failure while raising another failure.
    BadException,
}

impl ExceptionKind {
    /// Returns the kind this kind refines, if any.
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Domain | Self::InvalidArgument | Self::Length | Self::OutOfRange => {
                Some(Self::Logic)
            }
            Self::Range | Self::Overflow | Self::Underflow | Self::System => Some(Self::Runtime),
            Self::ArrayLength => Some(Self::Allocation),
            Self::AnyCast => Some(Self::Cast),
            Self::Logic
            | Self::Runtime
            | Self::Allocation
            | Self::OptionalAccess
            | Self::TypeId
            | Self::VariantAccess
            | Self::Cast
            | Self::WeakPtr
            | Self::FunctionCall
            | Self::BadException => None,
        }
    }

    /// Returns whether this kind is `ancestor` or refines it.
    ///
    /// ```
    /// use errdom::ExceptionKind;
    ///
    /// assert!(ExceptionKind::InvalidArgument.is_a(ExceptionKind::Logic));
    /// assert!(!ExceptionKind::InvalidArgument.is_a(ExceptionKind::Runtime));
    /// ```
    pub fn is_a(self, ancestor: Self) -> bool {
        let mut kind = Some(self);
        while let Some(current) = kind {
            if current == ancestor {
                return true;
            }
            kind = current.parent();
        }
        false
    }

    /// Returns the default description of failures of this kind.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Logic => "logic error",
            Self::Domain => "domain error",
            Self::InvalidArgument => "invalid argument",
            Self::Length => "length error",
            Self::OutOfRange => "out of range",
            Self::Runtime => "runtime error",
            Self::Range => "range error",
            Self::Overflow => "overflow error",
            Self::Underflow => "underflow error",
            Self::System => "system error",
            Self::Allocation => "memory allocation failed",
            Self::ArrayLength => "invalid array length",
            Self::OptionalAccess => "access to an empty optional value",
            Self::TypeId => "type information of an absent value",
            Self::AnyCast => "failed conversion of a dynamically typed value",
            Self::VariantAccess => "access to the wrong variant alternative",
            Self::Cast => "failed cast",
            Self::WeakPtr => "dangling weak pointer",
            Self::FunctionCall => "call through an empty function",
            Self::BadException => "failure while raising a failure",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A failure raised as a panic payload.
///
/// ```
/// use errdom::{Errc, ErrorCode, Exception, ExceptionKind};
///
/// let exception = Exception::out_of_range("index 7 of 3");
/// assert_eq!(exception.kind(), ExceptionKind::OutOfRange);
/// assert_eq!(exception.message(), "index 7 of 3");
///
/// let exception = Exception::system(ErrorCode::from(Errc::NotEnoughMemory));
/// assert_eq!(exception.message(), "Cannot allocate memory");
/// assert!(exception.code().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct Exception {
    /// The kind of failure.
    kind: ExceptionKind,
    /// What went wrong.
    message: SharedString,
    /// The code of a [`ExceptionKind::System`] failure.
    code: Option<ErrorCode>,
}

macro_rules! constructors {
    ($($(#[$meta:meta])* $name:ident => $kind:ident,)*) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(message: impl Into<SharedString>) -> Self {
                Self::new(ExceptionKind::$kind, message)
            }
        )*
    };
}

impl Exception {
    /// Creates a failure of `kind` described by `message`.
    #[must_use]
    pub fn new(kind: ExceptionKind, message: impl Into<SharedString>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    /// Creates a failure of `kind` with its default description.
    #[must_use]
    pub fn of_kind(kind: ExceptionKind) -> Self {
        Self::new(kind, SharedString::from_static(kind.description()))
    }

    /// Creates a [`ExceptionKind::System`] failure carrying `code` and its
    /// message.
    #[must_use]
    pub fn system(code: ErrorCode) -> Self {
        Self {
            kind: ExceptionKind::System,
            message: code.message(),
            code: Some(code),
        }
    }

    constructors! {
        /// Creates a [`ExceptionKind::Logic`] failure.
        logic_error => Logic,
        /// Creates a [`ExceptionKind::Domain`] failure.
        domain_error => Domain,
        /// Creates a [`ExceptionKind::InvalidArgument`] failure.
        invalid_argument => InvalidArgument,
        /// Creates a [`ExceptionKind::Length`] failure.
        length_error => Length,
        /// Creates a [`ExceptionKind::OutOfRange`] failure.
        out_of_range => OutOfRange,
        /// Creates a [`ExceptionKind::Runtime`] failure.
        runtime_error => Runtime,
        /// Creates a [`ExceptionKind::Range`] failure.
        range_error => Range,
        /// Creates a [`ExceptionKind::Overflow`] failure.
        overflow_error => Overflow,
        /// Creates a [`ExceptionKind::Underflow`] failure.
        underflow_error => Underflow,
    }

    /// Returns the kind of failure.
    #[inline]
    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    /// Returns the description of the failure.
    #[inline]
    pub fn message(&self) -> &SharedString {
        &self.message
    }

    /// Returns the code of a [`ExceptionKind::System`] failure.
    #[inline]
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Raises this failure as a panic.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    #[track_caller]
    pub fn raise(self) -> ! {
        std::panic::panic_any(self)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for Exception {}

/// Captures `exception` in the [`NativeExceptionDomain`].
impl From<Exception> for crate::Error {
    #[inline]
    fn from(exception: Exception) -> Self {
        ExceptionPtr::new(exception).into()
    }
}

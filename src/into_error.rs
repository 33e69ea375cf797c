use crate::Error;

/// Converts a value into an [`Error`].
///
/// This is the extension point for types that have a natural error
/// representation in some domain. Implement it next to your payload type and
/// [`Error::from_value`], [`ResultExt`](crate::ResultExt) and any function
/// taking `impl IntoError` accept it.
///
/// Every built-in code type implements it, and so does [`Error`] itself.
///
/// # Examples
///
/// ```
/// use errdom::{Errc, Error, IntoError};
///
/// enum ParseFailure {
///     Empty,
///     TooLong,
/// }
///
/// impl IntoError for ParseFailure {
///     fn into_error(self) -> Error {
///         match self {
///             ParseFailure::Empty => Errc::InvalidArgument.into(),
///             ParseFailure::TooLong => Errc::ValueTooLarge.into(),
///         }
///     }
/// }
///
/// fn fail(error: impl IntoError) -> Error {
///     error.into_error()
/// }
///
/// assert!(fail(ParseFailure::Empty) == Errc::InvalidArgument);
/// assert_eq!(Error::from_value(ParseFailure::TooLong).message(), "Value too large for defined data type");
/// ```
pub trait IntoError {
    /// Converts `self` into an [`Error`].
    #[must_use]
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

macro_rules! into_error_via_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoError for $ty {
                #[inline]
                fn into_error(self) -> Error {
                    Error::from(self)
                }
            }
        )*
    };
}

into_error_via_from!(
    crate::Errc,
    crate::ErrorCode,
    crate::ExceptionErrc,
    crate::ExceptionPtr,
    crate::Exception,
    crate::ThrownError,
);

#[cfg(feature = "std")]
into_error_via_from!(std::io::Error);

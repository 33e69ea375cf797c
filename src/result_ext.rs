//! Extension methods for `Result` types whose error converts into an
//! [`Error`].

use crate::{Error, IntoError};

/// Extension methods for `Result<T, E>` where `E: IntoError`.
///
/// # Examples
///
/// ```
/// use errdom::{Errc, Error, ResultExt};
///
/// fn open(name: &str) -> Result<u32, Errc> {
///     if name.is_empty() { Err(Errc::NoSuchFileOrDirectory) } else { Ok(3) }
/// }
///
/// let result: Result<u32, Error> = open("").map_into_error();
/// assert!(result.unwrap_err() == Errc::NoSuchFileOrDirectory);
/// assert_eq!(open("motd").or_throw(), 3);
/// ```
pub trait ResultExt<T, E>: Sized {
    /// Converts the error, if any, into an [`Error`].
    fn map_into_error(self) -> Result<T, Error>;

    /// Returns the success value, or raises the error as a panic through
    /// [`Error::throw_exception`].
    #[track_caller]
    fn or_throw(self) -> T;
}

impl<T, E: IntoError> ResultExt<T, E> for Result<T, E> {
    #[inline]
    fn map_into_error(self) -> Result<T, Error> {
        self.map_err(IntoError::into_error)
    }

    fn or_throw(self) -> T {
        match self {
            Ok(value) => value,
            Err(error) => error.into_error().throw_exception(),
        }
    }
}

use core::fmt;

use crate::Error;

/// The panic payload raised for an [`Error`] whose domain has no panic form
/// of its own.
///
/// Converting a captured `ThrownError` back into an [`Error`] yields the
/// carried error rather than a native exception wrapping it.
///
/// ```
/// # #[cfg(feature = "std")] {
/// use std::panic::AssertUnwindSafe;
///
/// use errdom::{Error, ExceptionErrc, ExceptionPtr, ThrownError};
///
/// let error = Error::from(ExceptionErrc::Unspecified);
/// let caught = ExceptionPtr::catch(AssertUnwindSafe(|| error.throw_exception())).unwrap_err();
/// assert!(caught.is::<ThrownError>());
/// assert!(Error::from(caught) == error);
/// # }
/// ```
#[derive(Clone)]
pub struct ThrownError {
    /// The carried error.
    error: Error,
}

impl ThrownError {
    /// Wraps `error`.
    #[inline]
    pub fn new(error: Error) -> Self {
        Self { error }
    }

    /// Returns the carried error.
    #[inline]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Unwraps the carried error.
    #[inline]
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Debug for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThrownError").field(&self.error).finish()
    }
}

impl fmt::Display for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl core::error::Error for ThrownError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ThrownError> for Error {
    #[inline]
    fn from(thrown: ThrownError) -> Self {
        thrown.error
    }
}

/// Raises a [`ThrownError`] carrying a copy of `error`.
///
/// Without `std` there is no typed panic payload, so the panic carries the
/// domain name and message as text.
#[track_caller]
pub(crate) fn throw_error(error: &Error) -> ! {
    #[cfg(feature = "std")]
    {
        std::panic::panic_any(ThrownError::new(error.clone()))
    }
    #[cfg(not(feature = "std"))]
    {
        panic!("{}: {}", error.domain().name(), error.message())
    }
}

use core::ops::Deref;

#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

/// The lock guarding a captured panic payload.
///
/// Payloads are only `Send`, so shared access goes through a mutex.
#[repr(transparent)]
pub(crate) struct PayloadLock<T: Send>(impl_::Mutex<T>);

#[repr(transparent)]
pub(crate) struct PayloadGuard<'a, T: Send>(impl_::MutexGuard<'a, T>);

impl<T: Send> PayloadLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::Mutex::new(value))
    }

    #[inline]
    pub(crate) fn lock(&self) -> PayloadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.lock();

        // A panic while the payload was borrowed leaves it intact.
        #[cfg(feature = "std")]
        let guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        PayloadGuard(guard)
    }
}

impl<T: Send> Deref for PayloadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

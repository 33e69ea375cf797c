use alloc::boxed::Box;
use core::{any::Any, fmt};

use errdom_internals::value::{InPlace, Payload};

use crate::payload_lock::PayloadLock;

/// A boxed panic payload.
type PanicPayload = Box<dyn Any + Send>;

/// A shared handle to a captured panic payload.
///
/// Cloning the handle shares the payload. Re-raising it with
/// [`rethrow`](Self::rethrow) raises a copy of the original payload when its
/// type is known to be cloneable, so code catching it with
/// [`catch_unwind`](std::panic::catch_unwind) sees an [`Exception`] or a panic
/// message as usual. Any other payload is raised as the handle itself, and
/// catching it again yields a handle to the same payload.
///
/// ```
/// # #[cfg(feature = "std")] {
/// use std::panic;
///
/// use errdom::{Exception, ExceptionPtr};
///
/// let caught = ExceptionPtr::catch(|| Exception::length_error("too long").raise()).unwrap_err();
/// let payload = panic::catch_unwind(|| caught.rethrow()).unwrap_err();
/// let exception = payload.downcast::<Exception>().unwrap();
/// assert_eq!(exception.message(), "too long");
/// # }
/// ```
///
/// [`Exception`]: crate::Exception
#[derive(Clone)]
pub struct ExceptionPtr {
    /// The payload, shared between every copy of the handle.
    inner: triomphe::Arc<PayloadLock<PanicPayload>>,
}

impl ExceptionPtr {
    /// Captures `exception` as if it had been raised and caught.
    pub fn new<E: Any + Send>(exception: E) -> Self {
        Self::from_payload(Box::new(exception))
    }

    /// Captures a panic payload.
    ///
    /// A payload that is itself an [`ExceptionPtr`] is unwrapped, so a
    /// re-raised handle keeps its identity.
    pub fn from_payload(payload: PanicPayload) -> Self {
        match payload.downcast::<ExceptionPtr>() {
            Ok(ptr) => *ptr,
            Err(payload) => Self {
                inner: triomphe::Arc::new(PayloadLock::new(payload)),
            },
        }
    }

    /// Runs `f`, capturing the payload if it panics.
    ///
    /// The panic hook runs as usual before the payload is captured.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn catch<R>(f: impl FnOnce() -> R + std::panic::UnwindSafe) -> Result<R, Self> {
        std::panic::catch_unwind(f).map_err(Self::from_payload)
    }

    /// Raises the captured payload again.
    ///
    /// An [`Exception`](crate::Exception), a panic message or a
    /// [`ThrownError`](crate::ThrownError) is raised as a copy of itself.
    /// Any other payload cannot be copied and is raised as this handle.
    ///
    /// The panic hook is not invoked.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn rethrow(&self) -> ! {
        #[cfg(feature = "tracing")]
        tracing::debug!(payload = %self.describe(), "re-raising captured panic");
        let payload = self
            .with_payload(clone_payload)
            .unwrap_or_else(|| Box::new(self.clone()));
        std::panic::resume_unwind(payload)
    }

    /// Returns whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.lock().is::<T>()
    }

    /// Calls `f` with the payload if it is a `T`.
    ///
    /// The payload stays locked while `f` runs.
    pub fn with_downcast<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let payload = self.inner.lock();
        payload.downcast_ref::<T>().map(f)
    }

    /// Calls `f` with the payload.
    pub(crate) fn with_payload<R>(&self, f: impl FnOnce(&(dyn Any + Send)) -> R) -> R {
        let payload = self.inner.lock();
        f(&**payload)
    }

    /// Returns whether both handles share the same payload.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        triomphe::Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the number of handles sharing the payload.
    #[inline]
    pub fn use_count(&self) -> usize {
        triomphe::Arc::count(&self.inner)
    }

    /// Describes the payload the way the native exception domain does.
    pub(crate) fn describe(&self) -> errdom_internals::shared_string::SharedString {
        self.with_payload(super::domain::describe_payload)
    }
}

/// Copies a payload whose type is known to be cloneable.
#[cfg(feature = "std")]
fn clone_payload(payload: &(dyn Any + Send)) -> Option<PanicPayload> {
    let copy: PanicPayload = if let Some(exception) = payload.downcast_ref::<crate::Exception>() {
        Box::new(exception.clone())
    } else if let Some(text) = payload.downcast_ref::<&'static str>() {
        Box::new(*text)
    } else if let Some(text) = payload.downcast_ref::<alloc::string::String>() {
        Box::new(text.clone())
    } else if let Some(thrown) = payload.downcast_ref::<crate::ThrownError>() {
        Box::new(thrown.clone())
    } else {
        return None;
    };
    Some(copy)
}

impl Payload for ExceptionPtr {
    type Storage = InPlace;
}

impl fmt::Debug for ExceptionPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionPtr")
            .field("payload", &self.describe().as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::Exception;

    static_assertions::assert_eq_size!(ExceptionPtr, usize);
    static_assertions::assert_impl_all!(ExceptionPtr: Send, Sync, Clone);

    #[test]
    fn test_nested_handles_unwrap() {
        let ptr = ExceptionPtr::new(Exception::runtime_error("boom"));
        let nested = ExceptionPtr::new(ptr.clone());
        assert!(nested.ptr_eq(&ptr));
        assert_eq!(ptr.use_count(), 2);
    }

    #[test]
    fn test_downcast() {
        let ptr = ExceptionPtr::new(String::from("text"));
        assert!(ptr.is::<String>());
        assert!(!ptr.is::<Exception>());
        assert_eq!(ptr.with_downcast(|text: &String| text.len()), Some(4));
        assert_eq!(ptr.with_downcast(|_: &Exception| ()), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_catch_and_rethrow_keep_identity() {
        let caught = ExceptionPtr::catch(|| -> u32 { std::panic::panic_any(7_u8) }).unwrap_err();
        assert_eq!(caught.with_downcast(|code: &u8| *code), Some(7));

        let again = ExceptionPtr::catch(|| caught.rethrow()).unwrap_err();
        assert!(again.ptr_eq(&caught));
        assert_eq!(ExceptionPtr::catch(|| 5).ok(), Some(5));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_rethrow_raises_original_payload() {
        let caught = ExceptionPtr::new(Exception::invalid_argument("X"));
        let payload = std::panic::catch_unwind(|| caught.rethrow()).unwrap_err();
        let exception = payload.downcast::<Exception>().unwrap();
        assert_eq!(exception.kind(), crate::ExceptionKind::InvalidArgument);
        assert_eq!(exception.message(), "X");

        let caught = ExceptionPtr::new("static text");
        let payload = std::panic::catch_unwind(|| caught.rethrow()).unwrap_err();
        assert_eq!(payload.downcast_ref::<&'static str>(), Some(&"static text"));

        let caught = ExceptionPtr::new(String::from("owned text"));
        let payload = std::panic::catch_unwind(|| caught.rethrow()).unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("owned text"));
        assert_eq!(caught.use_count(), 1);
    }
}

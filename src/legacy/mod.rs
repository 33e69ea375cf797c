//! Interop with category-based error codes.
//!
//! A legacy error code is an integer paired with an [`ErrorCategory`] that
//! gives it meaning. Such a pair is an [`ErrorCode`]. Wrapping it into an
//! [`Error`](crate::Error) puts it in the [`LegacyCodeDomain`], unless the
//! code belongs to a category this crate has a dedicated domain for.
//!
//! # Writing a category
//!
//! ```
//! use errdom::{Errc, Error, ErrorCategory, ErrorCode, SharedString};
//!
//! struct JazzCategory;
//!
//! impl ErrorCategory for JazzCategory {
//!     fn name(&self) -> &'static str {
//!         "jazz"
//!     }
//!
//!     fn message(&self, code: i32) -> SharedString {
//!         match code {
//!             1 => "Ragtime error".into(),
//!             2 => "Invalid jazz".into(),
//!             3 => "Missing pants".into(),
//!             _ => "Unknown jazz error".into(),
//!         }
//!     }
//!
//!     fn generic_condition(&self, code: i32) -> Option<Errc> {
//!         (code == 2).then_some(Errc::InvalidArgument)
//!     }
//! }
//!
//! let error = Error::from(ErrorCode::new(2, &JazzCategory));
//! assert_eq!(error.message(), "Invalid jazz");
//! assert!(error == Errc::InvalidArgument);
//! assert!(Error::from(ErrorCode::new(3, &JazzCategory)) != Errc::InvalidArgument);
//! ```

mod domain;

use core::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use errdom_internals::shared_string::SharedString;

pub use self::domain::LegacyCodeDomain;
use crate::{Errc, generic::UNSPECIFIED_ERROR};

/// The meaning of a family of integer error codes.
///
/// Two categories are the same category exactly when they have the same
/// concrete type.
pub trait ErrorCategory: Any + Send + Sync {
    /// Returns the name of the category.
    fn name(&self) -> &'static str;

    /// Returns the message describing `code`.
    fn message(&self, code: i32) -> SharedString;

    /// Returns the portable condition `code` corresponds to, if any.
    fn generic_condition(&self, code: i32) -> Option<Errc> {
        let _ = code;
        None
    }

    /// Returns whether `code` is equivalent to the portable condition
    /// `condition`.
    fn equivalent_to_generic(&self, code: i32, condition: Errc) -> bool {
        self.generic_condition(code) == Some(condition)
    }
}

/// Returns the concrete type of a category.
fn category_type_id(category: &dyn ErrorCategory) -> TypeId {
    let category: &dyn Any = category;
    category.type_id()
}

/// An integer error code together with the category giving it meaning.
#[derive(Copy, Clone)]
pub struct ErrorCode {
    /// The raw code.
    value: i32,
    /// The category of the code.
    category: &'static dyn ErrorCategory,
}

impl ErrorCode {
    /// Creates an error code.
    #[inline]
    pub const fn new(value: i32, category: &'static dyn ErrorCategory) -> Self {
        Self { value, category }
    }

    /// Returns the raw code.
    #[inline]
    pub const fn value(self) -> i32 {
        self.value
    }

    /// Returns the category of the code.
    #[inline]
    pub const fn category(self) -> &'static dyn ErrorCategory {
        self.category
    }

    /// Returns whether the category of the code is `C`.
    #[inline]
    pub fn is_in<C: ErrorCategory>(self) -> bool {
        category_type_id(self.category) == TypeId::of::<C>()
    }

    /// Returns the message describing the code.
    #[inline]
    pub fn message(self) -> SharedString {
        self.category.message(self.value)
    }

    /// Returns the portable condition the code corresponds to, if any.
    #[inline]
    pub fn generic_condition(self) -> Option<Errc> {
        self.category.generic_condition(self.value)
    }
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && category_type_id(self.category) == category_type_id(other.category)
    }
}

impl Eq for ErrorCode {}

impl Hash for ErrorCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        category_type_id(self.category).hash(state);
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCode")
            .field("value", &self.value)
            .field("category", &self.category.name())
            .finish()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category.name(), self.value)
    }
}

impl From<Errc> for ErrorCode {
    #[inline]
    fn from(errc: Errc) -> Self {
        Self::new(errc.code(), &GenericCategory)
    }
}

/// The category of portable POSIX-style codes, numbered like [`Errc`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct GenericCategory;

impl ErrorCategory for GenericCategory {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn message(&self, code: i32) -> SharedString {
        let message = Errc::from_raw_os_error(code).map_or(UNSPECIFIED_ERROR, Errc::message);
        SharedString::from_static(message)
    }

    fn generic_condition(&self, code: i32) -> Option<Errc> {
        Errc::from_raw_os_error(code)
    }
}

/// The category of raw operating system error codes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct SystemCategory;

impl ErrorCategory for SystemCategory {
    fn name(&self) -> &'static str {
        "system"
    }

    fn message(&self, code: i32) -> SharedString {
        #[cfg(feature = "std")]
        {
            use alloc::string::ToString;

            SharedString::from(std::io::Error::from_raw_os_error(code).to_string())
        }
        #[cfg(not(feature = "std"))]
        {
            GenericCategory.message(code)
        }
    }

    fn generic_condition(&self, code: i32) -> Option<Errc> {
        #[cfg(target_os = "linux")]
        {
            Errc::from_raw_os_error(code)
        }
        #[cfg(all(not(target_os = "linux"), feature = "std"))]
        {
            Errc::from_io_error_kind(std::io::Error::from_raw_os_error(code).kind())
        }
        #[cfg(all(not(target_os = "linux"), not(feature = "std")))]
        {
            let _ = code;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;
    use crate::{Error, ExceptionCategory, GenericDomain};

    static_assertions::assert_impl_all!(ErrorCode: Send, Sync, Copy);

    struct MyLibCategory;

    impl ErrorCategory for MyLibCategory {
        fn name(&self) -> &'static str {
            "mylib"
        }

        fn message(&self, code: i32) -> SharedString {
            match code {
                1 => "Ragtime error".into(),
                2 => "Invalid jazz".into(),
                3 => "Missing pants".into(),
                _ => "Unknown mylib error".into(),
            }
        }

        fn generic_condition(&self, code: i32) -> Option<Errc> {
            match code {
                2 => Some(Errc::InvalidArgument),
                _ => None,
            }
        }
    }

    #[test]
    fn test_category_identity_is_by_type() {
        let a = ErrorCode::new(2, &MyLibCategory);
        let b = ErrorCode::new(2, &MyLibCategory);
        let c = ErrorCode::new(2, &GenericCategory);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_in::<MyLibCategory>());
        assert!(!a.is_in::<ExceptionCategory>());
        assert_eq!(format!("{a}"), "mylib:2");
        assert_eq!(format!("{a:?}"), r#"ErrorCode { value: 2, category: "mylib" }"#);
    }

    #[test]
    fn test_custom_category_messages() {
        let ragtime = Error::from(ErrorCode::new(1, &MyLibCategory));
        assert_eq!(ragtime.message(), "Ragtime error");
        assert_eq!(ragtime.domain().name(), "legacy error code domain");
        let pants = Error::from(ErrorCode::new(3, &MyLibCategory));
        assert_eq!(pants.message(), "Missing pants");
        assert_eq!(pants.to_error_code(), Some(ErrorCode::new(3, &MyLibCategory)));
        assert!(Error::from(ErrorCode::new(2, &MyLibCategory)) == Errc::InvalidArgument);
        assert!(Error::from(ErrorCode::new(3, &MyLibCategory)) != Errc::InvalidArgument);
    }

    #[test]
    fn test_generic_category() {
        let code = ErrorCode::from(Errc::BadFileDescriptor);
        assert!(code.is_in::<GenericCategory>());
        assert_eq!(code.message(), "Bad file descriptor");
        assert_eq!(GenericCategory.message(1000), UNSPECIFIED_ERROR);
        assert!(Error::from(code).domain().is::<GenericDomain>());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_system_category_maps_to_generic() {
        let code = ErrorCode::new(9, &SystemCategory);
        assert_eq!(code.generic_condition(), Some(Errc::BadFileDescriptor));
        let error = Error::from(code);
        assert!(error == Errc::BadFileDescriptor);
        #[cfg(feature = "std")]
        assert!(error.message().starts_with("Bad file descriptor"));
    }
}

//! Commonly used items for convenient importing.
//!
//! ```
//! use errdom::prelude::*;
//!
//! fn check(fd: i32) -> Result<i32, Error> {
//!     if fd < 0 {
//!         return Err(Errc::BadFileDescriptor.into());
//!     }
//!     Ok(fd)
//! }
//!
//! assert!(check(-1).unwrap_err() == Errc::BadFileDescriptor);
//! ```

pub use crate::{
    Errc, Error, ErrorCategory, ErrorCode, ErrorDomain, Exception, ExceptionPtr, IntoError,
    ResultExt,
};

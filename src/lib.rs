#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Open-set, two-word error values with pluggable error domains.
//!
//! ## Overview
//!
//! An [`Error`] is a pair of a reference to an error *domain* and a
//! pointer-sized payload. The domain says what the payload means: how to
//! render it as a message, how to compare it against errors from other
//! domains, and how to raise it as a panic. Anyone can add a domain, so the
//! set of errors an [`Error`] can carry is open, yet the value itself stays
//! two machine words wide, is cheap to move, and never allocates unless the
//! payload does.
//!
//! ```
//! use errdom::{Errc, Error};
//!
//! let error = Error::from(Errc::BadFileDescriptor);
//! assert_eq!(error.message(), "Bad file descriptor");
//! assert_eq!(error.domain().name(), "generic domain");
//! assert!(error == Errc::BadFileDescriptor);
//! ```
//!
//! ## Domains
//!
//! A domain is a type implementing [`ErrorDomain`]. It names a payload type,
//! a 128-bit [`DomainId`] and a set of static handler functions. Four domains
//! ship with the crate:
//!
//! - [`GenericDomain`]: portable POSIX-style codes ([`Errc`]).
//! - [`LegacyCodeDomain`]: a shared [`ErrorCode`], the classic `(value,
//!   category)` pair, for interop with category-based code.
//! - [`NativeExceptionDomain`]: a captured panic payload ([`ExceptionPtr`]).
//! - [`ExceptionCodeDomain`]: the numeric classification of a captured panic
//!   ([`ExceptionErrc`]).
//!
//! ## Equivalence
//!
//! `a == b` holds when either side's domain declares the other equivalent.
//! This is how a legacy `(EBADF, system)` code compares equal to
//! [`Errc::BadFileDescriptor`] and how a captured
//! [`Exception::invalid_argument`] compares equal to [`Errc::InvalidArgument`].
//!
//! ## Payloads
//!
//! A payload implements [`Payload`] and picks one of three storage
//! strategies: a number ([`Numeric`]), a bitwise copy of a pointer-sized
//! value ([`BitCast`]) or a value constructed inside the cell ([`InPlace`]).
//! Payloads that need more room share ownership of a heap object through an
//! [`IntrusivePtr`] or any other pointer-sized handle.
//!
//! ## Feature flags
//!
//! - `std` (default): unwinding interop ([`ExceptionPtr::catch`],
//!   [`ExceptionPtr::rethrow`]), [`std::io::Error`] conversion and OS messages
//!   for [`SystemCategory`].
//! - `tracing` (default): emits [`tracing`](https://docs.rs/tracing) events
//!   when errors are propagated and when a captured panic cannot be classified.
//!
//! [`Numeric`]: errdom_internals::value::Numeric
//! [`BitCast`]: errdom_internals::value::BitCast
//! [`InPlace`]: errdom_internals::value::InPlace

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod domain;
pub mod exception;
pub mod generic;
pub mod legacy;
pub mod prelude;

mod error;
mod into_error;
mod payload_lock;
mod propagate;
mod result_ext;

pub use errdom_internals::{
    intrusive::{BoxDeleter, Counted, Deleter, IntrusivePtr, RefCount, RefCounted},
    shared_string::{AllocError, ArenaAllocator, Global, SharedString},
    value::{BitCast, InPlace, Numeric, NumericPayload, Payload, Representation, ValueRef},
};

pub use self::{
    domain::{Domain, DomainId, ErrorDomain},
    error::Error,
    exception::{
        Exception, ExceptionCategory, ExceptionCodeDomain, ExceptionErrc, ExceptionKind,
        ExceptionPtr, NativeExceptionDomain,
    },
    generic::{Errc, GenericDomain},
    into_error::IntoError,
    legacy::{
        ErrorCategory, ErrorCode, GenericCategory, LegacyCodeDomain, SystemCategory,
    },
    propagate::ThrownError,
    result_ext::ResultExt,
};

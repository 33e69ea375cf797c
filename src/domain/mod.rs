//! The error domain protocol.
//!
//! An error domain gives meaning to the payload stored in an [`Error`]. Every
//! domain is a type implementing [`ErrorDomain`]; it is never instantiated, its
//! handler functions are static and receive the payload explicitly, the same
//! way the rest of this crate never needs a live domain object.
//!
//! # Writing a domain
//!
//! ```
//! use errdom::{DomainId, Errc, Error, ErrorDomain, SharedString};
//!
//! /// Errors of the jazz subsystem.
//! #[derive(Copy, Clone, PartialEq, Eq, Debug)]
//! #[repr(i32)]
//! enum JazzErrc {
//!     Ragtime = 1,
//!     Invalid = 2,
//! }
//!
//! impl errdom::NumericPayload for JazzErrc {
//!     fn into_code(self) -> isize {
//!         self as isize
//!     }
//!
//!     fn from_code(code: isize) -> Self {
//!         if code == 1 { JazzErrc::Ragtime } else { JazzErrc::Invalid }
//!     }
//! }
//!
//! impl errdom::Payload for JazzErrc {
//!     type Storage = errdom::Numeric;
//! }
//!
//! struct JazzDomain;
//!
//! impl ErrorDomain for JazzDomain {
//!     type Value = JazzErrc;
//!
//!     const ID: DomainId = DomainId::new(0x4a41_5a5a_0000_0001, 0x6a61_7a7a_0000_0001);
//!
//!     fn name() -> &'static str {
//!         "jazz domain"
//!     }
//!
//!     fn equivalent(lhs: &JazzErrc, rhs: &Error) -> bool {
//!         match rhs.value_in::<JazzDomain>() {
//!             Some(rhs) => *lhs == *rhs,
//!             None => *lhs == JazzErrc::Invalid && *rhs == Errc::InvalidArgument,
//!         }
//!     }
//!
//!     fn message(value: &JazzErrc) -> SharedString {
//!         match value {
//!             JazzErrc::Ragtime => "Ragtime error".into(),
//!             JazzErrc::Invalid => "Invalid jazz".into(),
//!         }
//!     }
//! }
//!
//! let error = Error::new::<JazzDomain>(JazzErrc::Invalid);
//! assert_eq!(error.message(), "Invalid jazz");
//! assert!(error == Errc::InvalidArgument);
//! assert!(error != Error::new::<JazzDomain>(JazzErrc::Ragtime));
//! ```

mod vtable;

use core::{
    fmt,
    hash::{Hash, Hasher},
};

use errdom_internals::{
    shared_string::SharedString,
    value::{Payload, Representation},
};

pub(crate) use self::vtable::DomainVtable;
use crate::Error;

/// The 128-bit identity of an error domain.
///
/// Two domains are the same domain exactly when their ids are equal. Pick the
/// id once, for example from a random UUID, and never change it.
///
/// Ids order the same way as their [`as_u128`](Self::as_u128) values.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId {
    /// High 64 bits. Declared first so the derived ordering is numeric.
    hi: u64,
    /// Low 64 bits.
    lo: u64,
}

impl DomainId {
    /// Creates a domain id from its low and high halves.
    #[inline]
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    /// Creates a domain id from a 128-bit integer.
    #[inline]
    pub const fn from_u128(id: u128) -> Self {
        Self {
            lo: id as u64,
            hi: (id >> 64) as u64,
        }
    }

    /// Returns the low 64 bits.
    #[inline]
    pub const fn lo(self) -> u64 {
        self.lo
    }

    /// Returns the high 64 bits.
    #[inline]
    pub const fn hi(self) -> u64 {
        self.hi
    }

    /// Returns the id as a 128-bit integer.
    #[inline]
    pub const fn as_u128(self) -> u128 {
        ((self.hi as u128) << 64) | self.lo as u128
    }
}

impl fmt::Debug for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainId({:016x}{:016x})", self.hi, self.lo)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// A family of errors sharing one payload type and one set of semantics.
///
/// The handlers are plain functions rather than methods: a domain has no
/// state of its own, and everything it knows about a particular error is in
/// the payload it is handed.
pub trait ErrorDomain: 'static {
    /// The payload stored in errors of this domain.
    type Value: Payload;

    /// The identity of this domain.
    const ID: DomainId;

    /// Returns the human-readable name of this domain.
    fn name() -> &'static str;

    /// Returns whether an error of this domain holding `lhs` is semantically
    /// equivalent to `rhs`.
    ///
    /// `rhs` may belong to any domain, including this one. Only answer for
    /// the domains you know about and return `false` otherwise; the other side
    /// gets asked as well.
    fn equivalent(lhs: &Self::Value, rhs: &Error) -> bool;

    /// Returns the message describing `value`.
    fn message(value: &Self::Value) -> SharedString;

    /// Raises `error`, which holds `value`, as a panic.
    ///
    /// The default raises a [`ThrownError`](crate::ThrownError) carrying a
    /// copy of `error`.
    fn throw_exception(value: &Self::Value, error: &Error) -> ! {
        let _ = value;
        crate::propagate::throw_error(error)
    }
}

/// A handle to an error domain.
///
/// Handles compare and hash by [`DomainId`] only.
#[derive(Copy, Clone)]
pub struct Domain {
    /// The dispatch table of the domain.
    vtable: &'static DomainVtable,
}

impl Domain {
    /// Returns the handle of the domain `D`.
    #[inline]
    pub const fn of<D: ErrorDomain>() -> Self {
        Self {
            vtable: DomainVtable::new::<D>(),
        }
    }

    #[inline]
    pub(crate) const fn from_vtable(vtable: &'static DomainVtable) -> Self {
        Self { vtable }
    }

    /// Returns the id of the domain.
    #[inline]
    pub fn id(self) -> DomainId {
        self.vtable.id()
    }

    /// Returns the name of the domain.
    #[inline]
    pub fn name(self) -> &'static str {
        self.vtable.name()
    }

    /// Returns whether this is the domain `D`.
    #[inline]
    pub fn is<D: ErrorDomain>(self) -> bool {
        self.id() == D::ID
    }

    /// Returns the type name of the payload of the domain.
    #[inline]
    pub fn payload_type_name(self) -> &'static str {
        self.vtable.value().type_name()
    }

    /// Returns how the payload of the domain is stored.
    #[inline]
    pub fn representation(self) -> Representation {
        self.vtable.value().representation()
    }
}

impl PartialEq for Domain {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Domain {}

impl Hash for Domain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name())
            .field("id", &self.id())
            .finish()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
#![deny(missing_copy_implementations)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`errdom`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased storage and the unsafe
//! ownership primitives that power the [`errdom`] error library.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`errdom`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`value`]**: Type-erased payload storage
//!   - [`ErasedValue`]: Pointer-sized cell holding one payload
//!   - [`Payload`]: Implemented by every type that may be stored in a cell
//!   - [`Numeric`], [`BitCast`], [`InPlace`]: The closed set of storage
//!     strategies a payload picks from
//!   - [`ValueVtable`]: Resource-management descriptor for a payload type
//!
//! - **[`intrusive`]**: Shared ownership with the count stored inside the
//!   pointee
//!   - [`IntrusivePtr`]: The owning pointer
//!   - [`RefCounted`]/[`Counted`]: How a pointee exposes its count
//!
//! - **[`shared_string`]**: Reference-counted, immutable string buffer
//!   - [`SharedString`]: Borrowed-static or arena-backed string
//!   - [`ArenaAllocator`]: Allocator hook for arena-backed strings
//!
//! # Safety Strategy
//!
//! The cell in [`ErasedValue`] has no idea what it stores. The only record of
//! the stored type lives in the [`ValueVtable`] that was built for that type,
//! and the owner of the cell (the `Error` type in `errdom`) keeps the two
//! together. Every unsafe accessor on [`ErasedValue`] therefore requires the
//! caller to prove that the type parameter matches the type the cell was
//! built from, and debug builds check this through [`ValueVtable::type_id`].
//!
//! [`errdom`]: https://docs.rs/errdom/latest/errdom/
//! [`ErasedValue`]: value::ErasedValue
//! [`Payload`]: value::Payload
//! [`Numeric`]: value::Numeric
//! [`BitCast`]: value::BitCast
//! [`InPlace`]: value::InPlace
//! [`ValueVtable`]: value::ValueVtable
//! [`ValueVtable::type_id`]: value::ValueVtable::type_id
//! [`IntrusivePtr`]: intrusive::IntrusivePtr
//! [`RefCounted`]: intrusive::RefCounted
//! [`Counted`]: intrusive::Counted
//! [`SharedString`]: shared_string::SharedString
//! [`ArenaAllocator`]: shared_string::ArenaAllocator

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod intrusive;
pub mod shared_string;
pub mod value;

//! Type-erased payload storage.
//!
//! An [`ErasedValue`] is a pointer-sized cell. A payload type implements
//! [`Payload`] to choose how it is stored in that cell, and the matching
//! [`ValueVtable`] carries the type information and resource management that
//! the cell itself does not record.

mod cell;
mod storage;
mod vtable;

pub use self::{
    cell::{CELL_ALIGN, CELL_SIZE, ErasedValue},
    storage::{
        BitCast, InPlace, Numeric, NumericPayload, Payload, Representation, Storage, ValueRef,
    },
    vtable::ValueVtable,
};

//! Subtype lattice and type registry
//!
//! Types are arena-allocated in a [`TypeRegistry`] and referenced by copyable
//! [`TypeId`] handles. The registry owns the parent-chain subtyping relation
//! and is the single place raw external data is turned into verified,
//! immutable definitions.

mod datum;
mod registry;

pub use datum::Datum;
pub use registry::{
    Definition, Descriptor, FieldSpec, Predicate, RecordSpec, TypeId, TypeKind, TypeRegistry,
};

//! TyIR - typed single-assignment IR core for JIT front-ends
//!
//! A statically type-checked, single-assignment value model used to describe
//! typed data and the results of IR-level operations before any machine code
//! is generated. A front-end lowers its source language into
//! [`Operation`] call sequences; a code generator resolves [`Value`]s and
//! materializes allocation and phi decisions into real storage and branches.
//! Neither of those collaborators lives here.
//!
//! ## Architecture
//!
//! The crate is organized into:
//! - **Common** (`common/`): shared infrastructure (errors, diagnostics)
//! - **Types** (`types/`): subtype lattice, type registry, raw data model
//! - **Value** (`value`): single-assignment resolution cells
//! - **SSA** (`ssa`): bundles of the statically possible bindings at one
//!   program point
//! - **Ops** (`ops`): typed operation signatures and call validation

pub mod common;
pub mod ops;
pub mod ssa;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use common::{DiagnosticReporter, IrError, IrResult};
pub use ops::{Operation, OperationSpec};
pub use ssa::{Ssa, SsaKind};
pub use types::{
    Datum, Definition, Descriptor, FieldSpec, RecordSpec, TypeId, TypeKind, TypeRegistry,
};
pub use value::{Payload, Value};

//! Error types for IR construction

use thiserror::Error;

/// IR-construction error.
///
/// Every variant is raised synchronously and marks a defect in the code
/// building the IR, not a recoverable runtime condition. No entity is ever
/// observable in a partially constructed state: construction either fully
/// validates or returns one of these.
#[derive(Error, Debug)]
pub enum IrError {
    #[error("construction error: {message}")]
    Construction { message: String },

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("operation '{operation}' expected {expected} operands, but got {actual}")]
    Arity {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error("state error: {message}")]
    State { message: String },

    #[error("phi must be given multiple bindings, only {given} given")]
    Cardinality { given: usize },

    #[error("constraint failed: {message}")]
    Constraint { message: String },
}

impl IrError {
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    /// Type mismatch at a call site, naming the operand position and both
    /// sides of the failed bound.
    pub fn operand_mismatch(operation: &str, index: usize, expected: &str, actual: &str) -> Self {
        Self::TypeMismatch {
            message: format!(
                "operation '{operation}' expects type '{expected}' for operand {index}, but got a '{actual}'"
            ),
        }
    }
}

pub type IrResult<T> = Result<T, IrError>;

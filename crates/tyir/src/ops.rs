//! Operation signatures and call validation

use crate::common::{IrError, IrResult};
use crate::ssa::Ssa;
use crate::types::{TypeId, TypeRegistry};

/// Descriptor for [`Operation::create`].
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub name: String,
    pub operands: Vec<TypeId>,
    /// `None` for side-effecting operations that produce no binding.
    pub result: Option<TypeId>,
}

/// A typed call signature over SSA arguments.
///
/// Immutable after [`Operation::create`]; validating a call and minting its
/// result binding is the only thing an operation does.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    operands: Box<[TypeId]>,
    result: Option<TypeId>,
}

impl Operation {
    /// Validate the descriptor eagerly: every operand type and the result
    /// type must be registered.
    pub fn create(types: &TypeRegistry, spec: OperationSpec) -> IrResult<Operation> {
        for (index, &operand) in spec.operands.iter().enumerate() {
            if !types.contains(operand) {
                return Err(IrError::construction(format!(
                    "operation '{}' operand {index} is not a registered type",
                    spec.name
                )));
            }
        }
        if let Some(result) = spec.result {
            if !types.contains(result) {
                return Err(IrError::construction(format!(
                    "operation '{}' result is not a registered type",
                    spec.name
                )));
            }
        }
        Ok(Operation {
            name: spec.name,
            operands: spec.operands.into_boxed_slice(),
            result: spec.result,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operands(&self) -> &[TypeId] {
        &self.operands
    }

    pub fn result(&self) -> Option<TypeId> {
        self.result
    }

    /// Validate a call and mint its result binding.
    ///
    /// Arity is checked first. Then, per position, every constituent value of
    /// the argument must satisfy the operand bound; a phi argument is
    /// accepted only if all of its alternatives do. A valid call returns a
    /// fresh dynamic binding of the result type, or `None` for side-effecting
    /// operations.
    pub fn create_call_value(
        &self,
        types: &TypeRegistry,
        args: &[Ssa],
    ) -> IrResult<Option<Ssa>> {
        if args.len() != self.operands.len() {
            return Err(IrError::Arity {
                operation: self.name.clone(),
                expected: self.operands.len(),
                actual: args.len(),
            });
        }
        for (index, (&expected, arg)) in self.operands.iter().zip(args).enumerate() {
            for value in arg.values() {
                if !types.is_super_type_of(expected, value.ty()) {
                    return Err(IrError::operand_mismatch(
                        &self.name,
                        index,
                        types.name(expected),
                        types.name(value.ty()),
                    ));
                }
            }
        }
        Ok(self.result.map(|result| Ssa::dynamic(types, result)))
    }
}

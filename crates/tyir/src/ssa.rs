//! SSA value bundles
//!
//! An [`Ssa`] names the set of statically possible realizations of one
//! program-point binding. Most bindings carry exactly one value; a phi
//! carries one per control-flow alternative converging at its program point.
//! Only one alternative is actually produced at runtime, but the type
//! checker must treat every one of them as possible.

use crate::common::{IrError, IrResult};
use crate::types::{TypeId, TypeRegistry};
use crate::value::{Payload, Value};

/// The closed set of SSA shapes. No other variants exist.
#[derive(Debug, Clone)]
pub enum SsaKind {
    /// The result of an operation: statically typed, runtime-opaque.
    Dynamic,
    /// Wraps a value that still needs a storage decision downstream. Tags
    /// only; no allocation happens here.
    Allocation,
    /// Superimposition of ≥2 alternatives converging at one program point.
    /// Retains its constituents.
    Phi { sources: Box<[Ssa]> },
}

/// A named, immutable, non-empty bundle of values.
#[derive(Debug, Clone)]
pub struct Ssa {
    name: String,
    values: Box<[Value]>,
    kind: SsaKind,
}

impl Ssa {
    /// A binding of the given static type whose concrete content is only
    /// determined at execution time. Its single value is born resolved to
    /// the dynamic marker.
    pub fn dynamic(types: &TypeRegistry, ty: TypeId) -> Ssa {
        Ssa {
            name: format!("dynamic {}", types.name(ty)),
            values: Box::new([Value::resolved(ty, Payload::Dynamic)]),
            kind: SsaKind::Dynamic,
        }
    }

    /// Wrap an existing value, tagging it as allocation-pending.
    pub fn allocation(types: &TypeRegistry, base: Value) -> Ssa {
        Ssa {
            name: format!("allocation {}", types.name(base.ty())),
            values: Box::new([base]),
            kind: SsaKind::Allocation,
        }
    }

    /// Merge ≥2 bindings converging from different control-flow paths.
    ///
    /// The result's values are the concatenation of the constituents'
    /// values, in argument order; its name is built from the de-duplicated,
    /// order-preserving constituent names.
    pub fn phi(sources: Vec<Ssa>) -> IrResult<Ssa> {
        if sources.len() < 2 {
            return Err(IrError::Cardinality {
                given: sources.len(),
            });
        }
        let values: Vec<Value> = sources
            .iter()
            .flat_map(|source| source.values.iter().cloned())
            .collect();
        let mut names: Vec<&str> = Vec::new();
        for source in &sources {
            if !names.contains(&source.name.as_str()) {
                names.push(&source.name);
            }
        }
        let name = format!("phi():{}", names.join("|"));
        Ok(Ssa {
            name,
            values: values.into_boxed_slice(),
            kind: SsaKind::Phi {
                sources: sources.into_boxed_slice(),
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn kind(&self) -> &SsaKind {
        &self.kind
    }

    /// True iff every constituent value's type is bounded by `ty`.
    pub fn is_constrained_to_type(&self, types: &TypeRegistry, ty: TypeId) -> bool {
        self.values
            .iter()
            .all(|value| types.is_super_type_of(ty, value.ty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Datum, RecordSpec};
    use pretty_assertions::assert_eq;

    fn number(types: &mut TypeRegistry) -> TypeId {
        types.primitive("Number", |datum| matches!(datum, Datum::Int(_)))
    }

    #[test]
    fn test_dynamic_is_born_resolved_to_the_dynamic_marker() {
        let mut types = TypeRegistry::new();
        let num = number(&mut types);
        let dynamic = Ssa::dynamic(&types, num);

        assert_eq!(dynamic.name(), "dynamic Number");
        assert_eq!(dynamic.values().len(), 1);
        assert_eq!(dynamic.values()[0].ty(), num);
        assert_eq!(dynamic.values()[0].payload(), Some(Payload::Dynamic));
        assert!(matches!(dynamic.kind(), SsaKind::Dynamic));

        // An observer registered after construction still sees the marker.
        let observed = std::rc::Rc::new(std::cell::RefCell::new(None));
        let seen = std::rc::Rc::clone(&observed);
        dynamic.values()[0].then(move |payload| *seen.borrow_mut() = Some(payload.clone()));
        assert_eq!(*observed.borrow(), Some(Payload::Dynamic));
    }

    #[test]
    fn test_allocation_wraps_the_base_value() {
        let mut types = TypeRegistry::new();
        let num = number(&mut types);
        let base = Value::new(num);
        let allocation = Ssa::allocation(&types, base.clone());

        assert_eq!(allocation.name(), "allocation Number");
        assert_eq!(allocation.values(), [base]);
        assert!(matches!(allocation.kind(), SsaKind::Allocation));
    }

    #[test]
    fn test_phi_requires_multiple_sources() {
        let mut types = TypeRegistry::new();
        let num = number(&mut types);
        let one = Ssa::allocation(&types, Value::new(num));
        let two = Ssa::allocation(&types, Value::new(num));

        let result = Ssa::phi(vec![one.clone()]);
        assert!(matches!(result, Err(IrError::Cardinality { given: 1 })));
        assert!(Ssa::phi(vec![one, two]).is_ok());
    }

    #[test]
    fn test_phi_concatenates_values_in_argument_order() {
        let mut types = TypeRegistry::new();
        let num = number(&mut types);
        let first = Value::new(num);
        let second = Value::new(num);
        let third = Value::new(num);

        let left = Ssa::phi(vec![
            Ssa::allocation(&types, first.clone()),
            Ssa::allocation(&types, second.clone()),
        ])
        .unwrap();
        let right = Ssa::allocation(&types, third.clone());
        let merged = Ssa::phi(vec![left, right]).unwrap();

        assert_eq!(merged.values().to_vec(), vec![first, second, third]);
        let SsaKind::Phi { sources } = merged.kind() else {
            panic!("expected a phi");
        };
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_phi_name_deduplicates_constituents() {
        let mut types = TypeRegistry::new();
        let num = number(&mut types);
        let one = Ssa::allocation(&types, Value::new(num));
        let two = Ssa::allocation(&types, Value::new(num));
        let dynamic = Ssa::dynamic(&types, num);

        let merged = Ssa::phi(vec![one, dynamic, two]).unwrap();
        assert_eq!(merged.name(), "phi():allocation Number|dynamic Number");
    }

    #[test]
    fn test_is_constrained_to_type_checks_every_value() {
        let mut types = TypeRegistry::new();
        let base = types.record(RecordSpec::new("Base")).unwrap();
        let narrow = types.record(RecordSpec::new("Narrow").parent(base)).unwrap();

        let narrowed = Ssa::dynamic(&types, narrow);
        assert!(narrowed.is_constrained_to_type(&types, narrow));
        assert!(narrowed.is_constrained_to_type(&types, base));

        // One alternative outside the bound poisons the whole merge.
        let widened = Ssa::phi(vec![
            Ssa::dynamic(&types, narrow),
            Ssa::dynamic(&types, base),
        ])
        .unwrap();
        assert!(widened.is_constrained_to_type(&types, base));
        assert!(!widened.is_constrained_to_type(&types, narrow));
    }
}

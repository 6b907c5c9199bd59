//! Type definitions and the subtyping relation

use std::collections::BTreeMap;
use std::fmt;

use string_interner::{DefaultStringInterner, DefaultSymbol};

use crate::common::{IrError, IrResult};
use crate::value::Value;

use super::datum::Datum;

/// Stable handle to a type in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Predicate run against raw data on behalf of a type.
pub type Predicate = Box<dyn Fn(&Datum) -> bool + Send + Sync>;

/// The closed set of type shapes. No other variants exist; entries are only
/// minted by [`TypeRegistry`] factory methods.
pub enum TypeKind {
    /// Leaf type vetted by a user predicate.
    Primitive { check: Predicate },
    /// Placeholder type; accepts only the unit datum.
    Stub,
    /// Homogeneous ordered sequence.
    List { element: TypeId },
    /// Named fields, with single inheritance from a parent record.
    Record { fields: BTreeMap<String, TypeId> },
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { .. } => f.write_str("Primitive"),
            Self::Stub => f.write_str("Stub"),
            Self::List { element } => f.debug_struct("List").field("element", element).finish(),
            Self::Record { fields } => f.debug_struct("Record").field("fields", fields).finish(),
        }
    }
}

/// Field declaration in a [`RecordSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    /// Field of an already-registered type.
    Ty(TypeId),
    /// The record type being declared, for recursive shapes like
    /// node-with-next.
    SelfRef,
}

/// Descriptor for [`TypeRegistry::record`].
#[derive(Debug, Clone)]
pub struct RecordSpec {
    name: String,
    parent: Option<TypeId>,
    fields: Vec<(String, FieldSpec)>,
}

impl RecordSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.fields.push((name.into(), FieldSpec::Ty(ty)));
        self
    }

    /// Declare a field of the record type itself.
    pub fn self_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), FieldSpec::SelfRef));
        self
    }
}

/// Raw descriptor handed to [`TypeRegistry::definition_for`].
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// Raw datum, for primitives and stubs.
    Datum(Datum),
    /// Ordered element values, for lists.
    Values(Vec<Value>),
    /// Field values by name, for records.
    Fields(BTreeMap<String, Value>),
}

/// A verified, immutable definition produced by
/// [`TypeRegistry::definition_for`].
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// Canonical structural rendering of a datum.
    Canonical(String),
    /// Descriptor accepted verbatim.
    Verbatim(Descriptor),
    /// Ordered element values, validated against the element bound.
    Values(Box<[Value]>),
    /// Field values, validated against every field bound.
    Fields(BTreeMap<String, Value>),
}

struct TypeDef {
    name: DefaultSymbol,
    parent: Option<TypeId>,
    kind: TypeKind,
}

/// Arena of type definitions plus the subtyping relation over them.
///
/// A registry entry is immutable once its factory method returns: a failed
/// construction leaves no entry behind.
pub struct TypeRegistry {
    names: DefaultStringInterner,
    types: Vec<TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            names: DefaultStringInterner::new(),
            types: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// True when `ty` was minted by this registry.
    pub fn contains(&self, ty: TypeId) -> bool {
        ty.index() < self.types.len()
    }

    pub fn name(&self, ty: TypeId) -> &str {
        self.names
            .resolve(self.types[ty.index()].name)
            .expect("type names are interned at construction")
    }

    pub fn parent(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.index()].parent
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.types[ty.index()].kind
    }

    /// Register a leaf type vetted by `check`.
    pub fn primitive(
        &mut self,
        name: impl Into<String>,
        check: impl Fn(&Datum) -> bool + Send + Sync + 'static,
    ) -> TypeId {
        self.push(name, None, TypeKind::Primitive {
            check: Box::new(check),
        })
    }

    /// Register a placeholder type that accepts only the unit datum.
    pub fn stub(&mut self, name: impl Into<String>) -> TypeId {
        self.push(name, None, TypeKind::Stub)
    }

    /// Register a sequence type over `element`.
    pub fn list(&mut self, name: impl Into<String>, element: TypeId) -> IrResult<TypeId> {
        let name = name.into();
        if !self.contains(element) {
            return Err(IrError::construction(format!(
                "list '{name}' references an unknown element type"
            )));
        }
        Ok(self.push(name, None, TypeKind::List { element }))
    }

    /// Register a record type.
    ///
    /// The record's handle is reserved before its field map is finalized, so
    /// [`RecordSpec::self_field`] resolves to the record itself. A child may
    /// redeclare a parent field only with a type the parent's field type is a
    /// supertype of; non-redeclared parent fields are inherited verbatim.
    pub fn record(&mut self, spec: RecordSpec) -> IrResult<TypeId> {
        let RecordSpec {
            name,
            parent,
            fields,
        } = spec;
        if let Some(parent_id) = parent {
            if !self.contains(parent_id) {
                return Err(IrError::construction(format!(
                    "record '{name}' declares an unknown parent type"
                )));
            }
            if !matches!(self.kind(parent_id), TypeKind::Record { .. }) {
                return Err(IrError::construction(format!(
                    "record '{name}' cannot inherit from '{}', which is not a record",
                    self.name(parent_id)
                )));
            }
        }

        let id = self.push(name, parent, TypeKind::Record {
            fields: BTreeMap::new(),
        });
        match self.resolve_record_fields(id, parent, fields) {
            Ok(resolved) => {
                if let TypeKind::Record { fields } = &mut self.types[id.index()].kind {
                    *fields = resolved;
                }
                Ok(id)
            }
            Err(err) => {
                self.types.pop();
                Err(err)
            }
        }
    }

    fn push(&mut self, name: impl Into<String>, parent: Option<TypeId>, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let name = self.names.get_or_intern(name.into());
        self.types.push(TypeDef { name, parent, kind });
        id
    }

    fn resolve_record_fields(
        &self,
        id: TypeId,
        parent: Option<TypeId>,
        declared: Vec<(String, FieldSpec)>,
    ) -> IrResult<BTreeMap<String, TypeId>> {
        let mut fields = BTreeMap::new();
        for (field, spec) in declared {
            let field_ty = match spec {
                FieldSpec::SelfRef => id,
                FieldSpec::Ty(ty) => {
                    if !self.contains(ty) {
                        return Err(IrError::construction(format!(
                            "field '{field}' of record '{}' references an unknown type",
                            self.name(id)
                        )));
                    }
                    ty
                }
            };
            if fields.insert(field.clone(), field_ty).is_some() {
                return Err(IrError::construction(format!(
                    "field '{field}' of record '{}' is declared twice",
                    self.name(id)
                )));
            }
        }

        let Some(parent_id) = parent else {
            return Ok(fields);
        };
        let TypeKind::Record {
            fields: parent_fields,
        } = self.kind(parent_id)
        else {
            unreachable!("record parents are validated before the handle is reserved");
        };
        for (field, &parent_ty) in parent_fields {
            match fields.get(field) {
                Some(&child_ty) => {
                    // A redeclared field may only narrow the parent's bound.
                    if !self.is_super_type_of(parent_ty, child_ty) {
                        return Err(IrError::type_mismatch(format!(
                            "cannot redeclare field '{field}' as '{}': it is not a subtype of '{}'",
                            self.name(child_ty),
                            self.name(parent_ty)
                        )));
                    }
                }
                None => {
                    fields.insert(field.clone(), parent_ty);
                }
            }
        }
        Ok(fields)
    }

    /// Walk `child`'s parent chain, including itself, looking for `parent`.
    /// O(depth of the chain).
    pub fn is_super_type_of(&self, parent: TypeId, child: TypeId) -> bool {
        let mut cursor = Some(child);
        while let Some(ty) = cursor {
            if ty == parent {
                return true;
            }
            cursor = self.types[ty.index()].parent;
        }
        false
    }

    /// Run the type's predicate against raw data.
    pub fn check(&self, ty: TypeId, datum: &Datum) -> bool {
        match &self.types[ty.index()].kind {
            TypeKind::Primitive { check } => check(datum),
            TypeKind::Stub => matches!(datum, Datum::Unit),
            TypeKind::List { element } => match datum {
                Datum::Seq(items) => items.iter().all(|item| self.check(*element, item)),
                _ => false,
            },
            TypeKind::Record { .. } => true,
        }
    }

    /// Turn a raw descriptor into a verified immutable definition for `ty`.
    ///
    /// Variant-specific: primitives canonicalize the datum structurally,
    /// lists and records check every constituent value against its lattice
    /// bound, stubs pass the descriptor through verbatim.
    pub fn definition_for(&self, ty: TypeId, descriptor: Descriptor) -> IrResult<Definition> {
        match &self.types[ty.index()].kind {
            TypeKind::Primitive { .. } => {
                let Descriptor::Datum(datum) = descriptor else {
                    return Err(IrError::construction(format!(
                        "definition for primitive '{}' must be a datum",
                        self.name(ty)
                    )));
                };
                let canonical = serde_json::to_string(&datum).map_err(|err| {
                    IrError::construction(format!(
                        "cannot canonicalize definition for '{}': {err}",
                        self.name(ty)
                    ))
                })?;
                Ok(Definition::Canonical(canonical))
            }

            TypeKind::Stub => Ok(Definition::Verbatim(descriptor)),

            TypeKind::List { element } => {
                let Descriptor::Values(values) = descriptor else {
                    return Err(IrError::construction(format!(
                        "definition for list '{}' must be a sequence of values",
                        self.name(ty)
                    )));
                };
                for value in &values {
                    if !self.is_super_type_of(*element, value.ty()) {
                        return Err(IrError::type_mismatch(format!(
                            "list '{}' requires elements of type '{}', but got a '{}'",
                            self.name(ty),
                            self.name(*element),
                            self.name(value.ty())
                        )));
                    }
                }
                Ok(Definition::Values(values.into_boxed_slice()))
            }

            TypeKind::Record { fields } => {
                let Descriptor::Fields(given) = descriptor else {
                    return Err(IrError::construction(format!(
                        "definition for record '{}' must be a field map",
                        self.name(ty)
                    )));
                };
                for (field, value) in &given {
                    let Some(&field_ty) = fields.get(field) else {
                        return Err(IrError::construction(format!(
                            "record '{}' has no field '{field}'",
                            self.name(ty)
                        )));
                    };
                    if !self.is_super_type_of(field_ty, value.ty()) {
                        return Err(IrError::type_mismatch(format!(
                            "field '{field}' of record '{}' requires a '{}', but got a '{}'",
                            self.name(ty),
                            self.name(field_ty),
                            self.name(value.ty())
                        )));
                    }
                }
                for field in fields.keys() {
                    if !given.contains_key(field) {
                        return Err(IrError::construction(format!(
                            "record '{}' is missing field '{field}'",
                            self.name(ty)
                        )));
                    }
                }
                Ok(Definition::Fields(given))
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .finish()
    }
}

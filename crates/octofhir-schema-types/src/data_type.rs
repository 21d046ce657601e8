//! The DataType hierarchy
//!
//! Structural dependencies (base types, mixins, union members and the base
//! of a mapped type) are held as `Arc<DataType>` since they always form a
//! DAG. Field and array item types are [`TypeLink`]s looked up through the
//! owning [`TypeDocument`](crate::TypeDocument), so recursive types stay
//! representable.

use crate::{AdditionalFields, BuiltinCodec, FieldTable, MappedOperation, TypeLink};
use indexmap::IndexMap;
use octofhir_schema_filter_ast::AllowSigns;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Attributes shared by every kind of type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    pub description: Option<String>,
    /// Id of the owning document
    pub document: String,
    pub source: Option<String>,
    /// Declared inline inside another type
    pub embedded: bool,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            document: document.into(),
            source: None,
            embedded: false,
        }
    }

    pub fn link(&self) -> TypeLink {
        TypeLink::new(&self.document, &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Simple,
    Complex,
    Enum,
    Union,
    Mapped,
    Array,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "Simple",
            Self::Complex => "Complex",
            Self::Enum => "Enum",
            Self::Union => "Union",
            Self::Mapped => "Mapped",
            Self::Array => "Array",
        };
        f.write_str(name)
    }
}

/// A named, immutable type of a built document
#[derive(Debug, Clone)]
pub enum DataType {
    Simple(SimpleType),
    Complex(ComplexType),
    Enum(EnumType),
    Union(UnionType),
    Mapped(MappedType),
    Array(ArrayType),
}

impl DataType {
    pub fn info(&self) -> &TypeInfo {
        match self {
            Self::Simple(t) => &t.info,
            Self::Complex(t) => &t.info,
            Self::Enum(t) => &t.info,
            Self::Union(t) => &t.info,
            Self::Mapped(t) => &t.info,
            Self::Array(t) => &t.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Simple(_) => TypeKind::Simple,
            Self::Complex(_) => TypeKind::Complex,
            Self::Enum(_) => TypeKind::Enum,
            Self::Union(_) => TypeKind::Union,
            Self::Mapped(_) => TypeKind::Mapped,
            Self::Array(_) => TypeKind::Array,
        }
    }

    /// Effective fields of object-like types
    pub fn fields(&self) -> Option<&FieldTable> {
        match self {
            Self::Complex(t) => Some(&t.fields),
            Self::Union(t) => Some(&t.fields),
            Self::Mapped(t) => Some(t.fields()),
            _ => None,
        }
    }

    pub fn has_fields(&self) -> bool {
        matches!(self, Self::Complex(_) | Self::Union(_) | Self::Mapped(_))
    }

    pub fn additional_fields(&self) -> AdditionalFields {
        match self {
            Self::Complex(t) => t.additional_fields,
            Self::Union(t) => t.additional_fields,
            Self::Mapped(t) => t.base.additional_fields(),
            _ => AdditionalFields::Forbid,
        }
    }

    pub fn discriminator_field(&self) -> Option<&str> {
        match self {
            Self::Complex(t) => t.discriminator_field.as_deref(),
            Self::Mapped(t) => t.base.discriminator_field(),
            _ => None,
        }
    }

    pub fn discriminator_value(&self) -> Option<&Value> {
        match self {
            Self::Complex(t) => t.discriminator_value.as_ref(),
            Self::Mapped(t) => t.base.discriminator_value(),
            _ => None,
        }
    }

    /// The single base type, if any
    pub fn base(&self) -> Option<&Arc<DataType>> {
        match self {
            Self::Simple(t) => t.base.as_ref(),
            Self::Complex(t) => t.base.as_ref(),
            Self::Enum(t) => t.base.as_ref(),
            Self::Mapped(t) => Some(&t.base),
            Self::Union(_) | Self::Array(_) => None,
        }
    }

    /// True for the type itself and anything reachable through base or mixin links
    pub fn is_derived_from(&self, name: &str) -> bool {
        if self.name().eq_ignore_ascii_case(name) {
            return true;
        }
        if let Self::Complex(t) = self {
            if t.mixins.iter().any(|m| m.is_derived_from(name)) {
                return true;
            }
        }
        self.base().is_some_and(|b| b.is_derived_from(name))
    }

    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            Self::Simple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexType> {
        match self {
            Self::Complex(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            Self::Enum(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            Self::Union(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_mapped(&self) -> Option<&MappedType> {
        match self {
            Self::Mapped(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Self::Array(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.kind())
    }
}

// === Simple ===

/// Constraints of a simple type, merged attribute by attribute over its base
#[derive(Debug, Clone, Default)]
pub struct SimpleConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub allow_signs: Option<AllowSigns>,
}

impl SimpleConstraints {
    pub fn merge_over(self, base: &SimpleConstraints) -> Self {
        Self {
            min_length: self.min_length.or(base.min_length),
            max_length: self.max_length.or(base.max_length),
            pattern: self.pattern.or_else(|| base.pattern.clone()),
            minimum: self.minimum.or(base.minimum),
            maximum: self.maximum.or(base.maximum),
            allow_signs: self.allow_signs.or(base.allow_signs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimpleType {
    pub info: TypeInfo,
    pub base: Option<Arc<DataType>>,
    pub codec: BuiltinCodec,
    pub constraints: SimpleConstraints,
}

// === Complex ===

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub info: TypeInfo,
    pub base: Option<Arc<DataType>>,
    /// Types mixed in, in declaration order
    pub mixins: Vec<Arc<DataType>>,
    /// Inherited and own fields
    pub fields: FieldTable,
    pub additional_fields: AdditionalFields,
    pub discriminator_field: Option<String>,
    pub discriminator_value: Option<Value>,
}

impl ComplexType {
    /// Fields declared by this type rather than inherited
    pub fn own_fields(&self) -> impl Iterator<Item = &crate::FieldRef> {
        self.fields
            .iter()
            .filter(|f| f.origin.eq_ignore_ascii_case(&self.info.name))
    }
}

// === Enum ===

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub value: Value,
    pub key: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub info: TypeInfo,
    pub base: Option<Arc<DataType>>,
    /// Keyed by the JSON text of the value
    pub values: IndexMap<String, EnumValue>,
}

impl EnumType {
    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains_key(&value.to_string())
    }

    pub fn get(&self, value: &Value) -> Option<&EnumValue> {
        self.values.get(&value.to_string())
    }
}

// === Union ===

#[derive(Debug, Clone)]
pub struct UnionType {
    pub info: TypeInfo,
    pub members: Vec<Arc<DataType>>,
    /// Fields of all members; on a name clash the later member's field is kept
    pub fields: FieldTable,
    pub additional_fields: AdditionalFields,
}

impl UnionType {
    /// Member whose discriminator value equals `value`
    pub fn member_for_discriminator(&self, value: &Value) -> Option<&Arc<DataType>> {
        self.members
            .iter()
            .find(|m| m.discriminator_value() == Some(value))
    }
}

// === Mapped ===

#[derive(Debug, Clone)]
pub struct MappedType {
    pub info: TypeInfo,
    pub base: Arc<DataType>,
    pub operation: MappedOperation,
    fields: OnceCell<FieldTable>,
}

impl MappedType {
    pub fn new(info: TypeInfo, base: Arc<DataType>, operation: MappedOperation) -> Self {
        Self {
            info,
            base,
            operation,
            fields: OnceCell::new(),
        }
    }

    /// Field view derived from the base on first access
    pub fn fields(&self) -> &FieldTable {
        self.fields.get_or_init(|| self.project())
    }

    fn project(&self) -> FieldTable {
        let mut table = self.base.fields().cloned().unwrap_or_default();
        let listed = |keys: &[String], name: &str| keys.iter().any(|k| k.eq_ignore_ascii_case(name));
        match &self.operation {
            MappedOperation::Pick(keys) => table.retain(|f| listed(keys, &f.name)),
            MappedOperation::Omit(keys) => table.retain(|f| !listed(keys, &f.name)),
            MappedOperation::Partial(selection) => {
                table.map_required(|f| f.required && !selection.includes(&f.name));
            }
            MappedOperation::Required(selection) => {
                table.map_required(|f| f.required || selection.includes(&f.name));
            }
        }
        table
    }
}

// === Array ===

#[derive(Debug, Clone)]
pub struct ArrayType {
    pub info: TypeInfo,
    pub items: TypeLink,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, FieldRef, FieldSelection};
    use pretty_assertions::assert_eq;

    fn field(name: &str, required: bool) -> FieldRef {
        FieldRef::new(Arc::new(Field {
            name: name.to_string(),
            ty: TypeLink::new("builtins", "string"),
            is_array: false,
            required,
            exclusive: false,
            default: None,
            fixed: None,
            description: None,
            readonly: false,
            writeonly: false,
            deprecated: false,
            origin: "User".to_string(),
        }))
    }

    fn user() -> Arc<DataType> {
        Arc::new(DataType::Complex(ComplexType {
            info: TypeInfo::new("User", "test"),
            base: None,
            mixins: Vec::new(),
            fields: [field("id", true), field("name", true), field("email", false)]
                .into_iter()
                .collect(),
            additional_fields: AdditionalFields::Error,
            discriminator_field: None,
            discriminator_value: None,
        }))
    }

    fn mapped(operation: MappedOperation) -> DataType {
        DataType::Mapped(MappedType::new(TypeInfo::new("View", "test"), user(), operation))
    }

    fn required_flags(ty: &DataType) -> Vec<(String, bool)> {
        ty.fields()
            .map(|t| t.iter().map(|f| (f.name.clone(), f.required)).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_pick_keeps_base_flags_and_order() {
        let view = mapped(MappedOperation::Pick(vec!["EMAIL".into(), "id".into()]));
        assert_eq!(
            required_flags(&view),
            vec![("id".to_string(), true), ("email".to_string(), false)]
        );
        assert_eq!(view.additional_fields(), AdditionalFields::Error);
    }

    #[test]
    fn test_omit_partial_required() {
        let omit = mapped(MappedOperation::Omit(vec!["name".into()]));
        assert_eq!(omit.fields().map(FieldTable::len), Some(2));

        let partial = mapped(MappedOperation::Partial(FieldSelection::All));
        assert!(required_flags(&partial).iter().all(|(_, r)| !r));

        let required = mapped(MappedOperation::Required(FieldSelection::keys(["email"])));
        assert!(required_flags(&required).iter().all(|(_, r)| *r));
    }

    #[test]
    fn test_mapped_fields_share_base_objects() {
        let base = user();
        let view = MappedType::new(
            TypeInfo::new("View", "test"),
            Arc::clone(&base),
            MappedOperation::Partial(FieldSelection::All),
        );
        let (Some(original), Some(projected)) = (
            base.fields().and_then(|t| t.get("id")),
            view.fields().get("id"),
        ) else {
            panic!("field missing");
        };
        assert!(projected.shares_field(original));
        assert_eq!(projected.origin, "User");
    }

    #[test]
    fn test_is_derived_from_walks_base_chain() {
        let view = mapped(MappedOperation::Omit(vec![]));
        assert!(view.is_derived_from("view"));
        assert!(view.is_derived_from("USER"));
        assert!(!view.is_derived_from("Order"));
        assert_eq!(view.to_string(), "View (Mapped)");
    }
}

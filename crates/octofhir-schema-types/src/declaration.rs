//! Declarative type records
//!
//! These are the inputs of [`TypeBuilder`](crate::TypeBuilder): either
//! deserialized from JSON or assembled in code through the `with_*` builders.
//! A declaration without `kind` is a complex type.

use crate::{AdditionalFields, BuiltinCodec};
use indexmap::IndexMap;
use octofhir_schema_diagnostics::{Result, SchemaError};
use octofhir_schema_filter_ast::AllowSigns;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A document's worth of type declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDeclaration {
    #[serde(default = "default_document_id")]
    pub id: String,
    /// Ids of already built documents this one refers to, usable as `id:Type`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    pub types: IndexMap<String, TypeDeclaration>,
}

fn default_document_id() -> String {
    "default".to_string()
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    matches!(map.get("types"), Some(Value::Object(_)))
        && map.keys().all(|key| matches!(key.as_str(), "id" | "references" | "types"))
}

impl DocumentDeclaration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            references: Vec::new(),
            types: IndexMap::new(),
        }
    }

    pub fn with_type(mut self, name: impl Into<String>, declaration: impl Into<TypeDeclaration>) -> Self {
        self.types.insert(name.into(), declaration.into());
        self
    }

    pub fn with_reference(mut self, id: impl Into<String>) -> Self {
        self.references.push(id.into());
        self
    }

    /// Parse a document; a bare object of types is accepted as the `types` map
    ///
    /// An object is the document envelope when its `types` is an object and
    /// it has no keys besides `id`, `references` and `types`. A bare map
    /// declaring nothing but a type named `types` must use the envelope.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(format_error)?;
        let value = match value {
            Value::Object(map) if !is_envelope(&map) => serde_json::json!({ "types": Value::Object(map) }),
            other => other,
        };
        serde_json::from_value(value).map_err(format_error)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }
}

fn format_error(err: serde_json::Error) -> SchemaError {
    SchemaError::Format {
        message: err.to_string(),
    }
}

/// One named type declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct TypeDeclaration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Identifier of whatever produced the declaration (a class name, a file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub body: TypeBody,
}

#[derive(Deserialize)]
struct TypeDeclarationRepr {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    body: TypeBody,
}

impl TryFrom<Value> for TypeDeclaration {
    type Error = serde_json::Error;

    fn try_from(mut value: Value) -> std::result::Result<Self, Self::Error> {
        if let Value::Object(map) = &mut value {
            map.entry("kind")
                .or_insert_with(|| Value::String("Complex".to_string()));
        }
        let repr: TypeDeclarationRepr = serde_json::from_value(value)?;
        Ok(Self {
            description: repr.description,
            source: repr.source,
            body: repr.body,
        })
    }
}

impl TypeDeclaration {
    pub fn new(body: TypeBody) -> Self {
        Self {
            description: None,
            source: None,
            body,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeBody {
    #[serde(alias = "simple")]
    Simple(SimpleTypeDeclaration),
    #[serde(alias = "complex")]
    Complex(ComplexTypeDeclaration),
    #[serde(alias = "enum")]
    Enum(EnumTypeDeclaration),
    #[serde(alias = "union")]
    Union(UnionTypeDeclaration),
    #[serde(alias = "mixin")]
    Mixin(MixinTypeDeclaration),
    #[serde(alias = "mapped")]
    Mapped(MappedTypeDeclaration),
    #[serde(alias = "array")]
    Array(ArrayTypeDeclaration),
}

macro_rules! into_declaration {
    ($($decl:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$decl> for TypeDeclaration {
                fn from(decl: $decl) -> Self {
                    TypeDeclaration::new(TypeBody::$variant(decl))
                }
            }

            impl From<$decl> for TypeRef {
                fn from(decl: $decl) -> Self {
                    TypeRef::Inline(Box::new(decl.into()))
                }
            }
        )*
    };
}

into_declaration! {
    SimpleTypeDeclaration => Simple,
    ComplexTypeDeclaration => Complex,
    EnumTypeDeclaration => Enum,
    UnionTypeDeclaration => Union,
    MixinTypeDeclaration => Mixin,
    MappedTypeDeclaration => Mapped,
    ArrayTypeDeclaration => Array,
}

/// A type named elsewhere or declared in place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Named(String),
    Inline(Box<TypeDeclaration>),
}

impl TypeRef {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Inline(_) => None,
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<TypeDeclaration> for TypeRef {
    fn from(decl: TypeDeclaration) -> Self {
        Self::Inline(Box::new(decl))
    }
}

// Simple

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleTypeDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<BuiltinCodec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_signs: Option<AllowSigns>,
}

impl SimpleTypeDeclaration {
    pub fn new(codec: BuiltinCodec) -> Self {
        Self {
            codec: Some(codec),
            ..Self::default()
        }
    }

    /// Refine another simple type
    pub fn derived(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..Self::default()
        }
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_allow_signs(mut self, allow_signs: AllowSigns) -> Self {
        self.allow_signs = Some(allow_signs);
        self
    }
}

// Complex

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexTypeDeclaration {
    #[serde(default, alias = "extends", skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_fields: Option<AdditionalFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<Value>,
}

impl ComplexTypeDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<TypeRef>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field: impl Into<FieldDeclaration>) -> Self {
        self.fields.insert(name.into(), field.into());
        self
    }

    pub fn with_additional_fields(mut self, policy: AdditionalFields) -> Self {
        self.additional_fields = Some(policy);
        self
    }

    pub fn with_discriminator(mut self, field: impl Into<String>, value: Option<Value>) -> Self {
        self.discriminator_field = Some(field.into());
        self.discriminator_value = value;
        self
    }

    /// Only a discriminator value, the field comes from the base type
    pub fn with_discriminator_value(mut self, value: impl Into<Value>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "FieldRepr")]
pub struct FieldDeclaration {
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(skip_serializing_if = "is_false")]
    pub is_array: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    /// Left out of encoded output unless projected in with `+name`
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub writeonly: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// `"city": "string"` or the full object form
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldRepr {
    Short(String),
    Full(FullFieldRepr),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullFieldRepr {
    #[serde(rename = "type")]
    type_ref: TypeRef,
    #[serde(default)]
    is_array: bool,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    exclusive: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    fixed: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    writeonly: bool,
    #[serde(default)]
    deprecated: bool,
}

impl From<FieldRepr> for FieldDeclaration {
    fn from(repr: FieldRepr) -> Self {
        match repr {
            FieldRepr::Short(name) => FieldDeclaration::new(name),
            FieldRepr::Full(f) => FieldDeclaration {
                type_ref: f.type_ref,
                is_array: f.is_array,
                required: f.required,
                exclusive: f.exclusive,
                default: f.default,
                fixed: f.fixed,
                description: f.description,
                readonly: f.readonly,
                writeonly: f.writeonly,
                deprecated: f.deprecated,
            },
        }
    }
}

impl FieldDeclaration {
    pub fn new(type_ref: impl Into<TypeRef>) -> Self {
        Self {
            type_ref: type_ref.into(),
            is_array: false,
            required: false,
            exclusive: false,
            default: None,
            fixed: None,
            description: None,
            readonly: false,
            writeonly: false,
            deprecated: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn writeonly(mut self) -> Self {
        self.writeonly = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_fixed(mut self, value: impl Into<Value>) -> Self {
        self.fixed = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<&str> for FieldDeclaration {
    fn from(type_name: &str) -> Self {
        Self::new(type_name)
    }
}

// Enum

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumTypeDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub values: Vec<EnumValueDeclaration>,
}

impl EnumTypeDeclaration {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            base: None,
            values: values
                .into_iter()
                .map(|v| EnumValueDeclaration::Plain(v.into()))
                .collect(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>, key: Option<&str>, description: Option<&str>) -> Self {
        self.values.push(EnumValueDeclaration::Detailed {
            value: value.into(),
            key: key.map(str::to_string),
            description: description.map(str::to_string),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValueDeclaration {
    Detailed {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Plain(Value),
}

// Union and mixin

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnionTypeDeclaration {
    pub members: Vec<TypeRef>,
}

impl UnionTypeDeclaration {
    pub fn new<I, T>(members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinTypeDeclaration {
    pub mixins: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_fields: Option<AdditionalFields>,
}

impl MixinTypeDeclaration {
    pub fn new<I, T>(mixins: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        Self {
            mixins: mixins.into_iter().map(Into::into).collect(),
            additional_fields: None,
        }
    }
}

// Mapped

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedTypeDeclaration {
    pub base: TypeRef,
    #[serde(flatten)]
    pub operation: MappedOperation,
}

impl MappedTypeDeclaration {
    pub fn pick<I: IntoIterator<Item = S>, S: Into<String>>(base: impl Into<TypeRef>, keys: I) -> Self {
        Self {
            base: base.into(),
            operation: MappedOperation::Pick(keys.into_iter().map(Into::into).collect()),
        }
    }

    pub fn omit<I: IntoIterator<Item = S>, S: Into<String>>(base: impl Into<TypeRef>, keys: I) -> Self {
        Self {
            base: base.into(),
            operation: MappedOperation::Omit(keys.into_iter().map(Into::into).collect()),
        }
    }

    pub fn partial(base: impl Into<TypeRef>, selection: FieldSelection) -> Self {
        Self {
            base: base.into(),
            operation: MappedOperation::Partial(selection),
        }
    }

    pub fn required(base: impl Into<TypeRef>, selection: FieldSelection) -> Self {
        Self {
            base: base.into(),
            operation: MappedOperation::Required(selection),
        }
    }
}

/// Projection applied by a mapped type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappedOperation {
    Pick(Vec<String>),
    Omit(Vec<String>),
    Partial(FieldSelection),
    Required(FieldSelection),
}

impl MappedOperation {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pick(_) => "pick",
            Self::Omit(_) => "omit",
            Self::Partial(_) => "partial",
            Self::Required(_) => "required",
        }
    }

    /// Field names the operation refers to explicitly
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Pick(keys) | Self::Omit(keys) => keys,
            Self::Partial(FieldSelection::Keys(keys)) | Self::Required(FieldSelection::Keys(keys)) => keys,
            Self::Partial(FieldSelection::All) | Self::Required(FieldSelection::All) => &[],
        }
    }
}

/// Every field (`true`) or the listed ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectionRepr", into = "SelectionRepr")]
pub enum FieldSelection {
    All,
    Keys(Vec<String>),
}

impl FieldSelection {
    pub fn keys<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Keys(keys) => keys.iter().any(|k| k.eq_ignore_ascii_case(name)),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    Flag(bool),
    Keys(Vec<String>),
}

impl From<SelectionRepr> for FieldSelection {
    fn from(repr: SelectionRepr) -> Self {
        match repr {
            SelectionRepr::Flag(true) => Self::All,
            SelectionRepr::Flag(false) => Self::Keys(Vec::new()),
            SelectionRepr::Keys(keys) => Self::Keys(keys),
        }
    }
}

impl From<FieldSelection> for SelectionRepr {
    fn from(selection: FieldSelection) -> Self {
        match selection {
            FieldSelection::All => Self::Flag(true),
            FieldSelection::Keys(keys) => Self::Keys(keys),
        }
    }
}

// Array

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayTypeDeclaration {
    pub items: TypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl ArrayTypeDeclaration {
    pub fn new(items: impl Into<TypeRef>) -> Self {
        Self {
            items: items.into(),
            min_items: None,
            max_items: None,
        }
    }

    pub fn with_items_range(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }
}

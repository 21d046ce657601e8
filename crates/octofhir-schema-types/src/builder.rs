//! Two-phase type construction
//!
//! Phase one registers every declaration as a pending stub, hoisting inline
//! sub-declarations out under synthesized names. Phase two resolves stubs
//! depth first with a visiting/resolved marker per type, so forward
//! references always succeed and cycles are reported with their full chain.
//!
//! Only structural dependencies (base, mixins, union members, mapped base)
//! are resolved recursively. Field and array item types are checked for
//! existence and linked by name, which is what allows a type to refer to
//! itself through a field.

use crate::{
    AdditionalFields, ArrayType, ComplexType, DataType, DocumentDeclaration, EnumType, EnumValue,
    EnumValueDeclaration, Field, FieldDeclaration, FieldRef, FieldTable, MappedType, SimpleConstraints,
    SimpleType, TypeBody, TypeDeclaration, TypeDocument, TypeInfo, TypeLink, TypeRef, TypeRegistry, UnionType,
    builtins,
};
use indexmap::IndexMap;
use octofhir_schema_diagnostics::{Result, SchemaError};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Resolved,
}

#[derive(Debug, Clone)]
struct PendingType {
    name: String,
    /// Declaration as registered, used to recognise repeated registration
    original: TypeDeclaration,
    /// Declaration with every inline type replaced by a synthesized name
    declaration: TypeDeclaration,
    embedded: bool,
}

/// Builds one [`TypeDocument`]
#[derive(Debug)]
pub struct TypeBuilder {
    document: String,
    references: Vec<(String, Arc<TypeDocument>)>,
    pending: IndexMap<String, PendingType>,
    states: HashMap<String, VisitState>,
    stack: Vec<String>,
    registry: TypeRegistry,
}

impl TypeBuilder {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            references: Vec::new(),
            pending: IndexMap::new(),
            states: HashMap::new(),
            stack: Vec::new(),
            registry: TypeRegistry::new(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document
    }

    /// Make a built document visible under `namespace`
    pub fn reference(&mut self, namespace: impl Into<String>, document: Arc<TypeDocument>) -> &mut Self {
        self.references.push((namespace.into(), document));
        self
    }

    /// Register a pending declaration
    ///
    /// Registering the same declaration twice under one name is a no-op;
    /// a different declaration under a taken name is a duplicate.
    pub fn register(&mut self, name: &str, declaration: TypeDeclaration) -> Result<()> {
        self.register_pending(name, declaration, false)
    }

    pub fn register_document(&mut self, declaration: &DocumentDeclaration) -> Result<()> {
        for (name, decl) in &declaration.types {
            self.register(name, decl.clone())?;
        }
        Ok(())
    }

    fn register_pending(&mut self, name: &str, declaration: TypeDeclaration, embedded: bool) -> Result<()> {
        let key = name.to_lowercase();
        if let Some(existing) = self.pending.get(&key) {
            if existing.original == declaration {
                return Ok(());
            }
            return Err(SchemaError::DuplicateName {
                name: name.to_string(),
                document: self.document.clone(),
            });
        }

        let original = declaration.clone();
        let mut hoisted = declaration;
        let mark = self.pending.len();
        // reserve the name before hoisting so nested names cannot take it
        self.pending.insert(
            key.clone(),
            PendingType {
                name: name.to_string(),
                original: original.clone(),
                declaration: original.clone(),
                embedded,
            },
        );
        if let Err(err) = self.hoist(name, &mut hoisted) {
            // drop the owner and every inline type hoisted before the failure
            self.pending.truncate(mark);
            return Err(err);
        }
        if let Some(pending) = self.pending.get_mut(&key) {
            pending.declaration = hoisted;
        }
        Ok(())
    }

    /// Replace inline declarations with registered, synthesized names
    fn hoist(&mut self, owner: &str, declaration: &mut TypeDeclaration) -> Result<()> {
        match &mut declaration.body {
            TypeBody::Complex(complex) => {
                if let Some(base) = &mut complex.base {
                    self.hoist_ref(format!("{owner}.base"), base)?;
                }
                for (field, decl) in &mut complex.fields {
                    self.hoist_ref(format!("{owner}.{field}"), &mut decl.type_ref)?;
                }
            }
            TypeBody::Union(union) => {
                for (i, member) in union.members.iter_mut().enumerate() {
                    self.hoist_ref(format!("{owner}[{i}]"), member)?;
                }
            }
            TypeBody::Mixin(mixin) => {
                for (i, member) in mixin.mixins.iter_mut().enumerate() {
                    self.hoist_ref(format!("{owner}[{i}]"), member)?;
                }
            }
            TypeBody::Mapped(mapped) => self.hoist_ref(format!("{owner}.base"), &mut mapped.base)?,
            TypeBody::Array(array) => self.hoist_ref(format!("{owner}.items"), &mut array.items)?,
            TypeBody::Simple(_) | TypeBody::Enum(_) => {}
        }
        Ok(())
    }

    fn hoist_ref(&mut self, name: String, type_ref: &mut TypeRef) -> Result<()> {
        if let TypeRef::Inline(inline) = type_ref {
            let declaration = (**inline).clone();
            self.register_pending(&name, declaration, true)?;
            *type_ref = TypeRef::Named(name);
        }
        Ok(())
    }

    /// Materialize a type, building its structural dependencies first
    pub fn resolve(&mut self, name: &str) -> Result<Arc<DataType>> {
        if let Some((namespace, local)) = name.split_once(':') {
            if namespace.eq_ignore_ascii_case(&self.document) {
                return self.resolve(local);
            }
            return self
                .external(name)
                .ok_or_else(|| SchemaError::unresolved(name, self.referrer()));
        }

        let key = name.to_lowercase();
        match self.states.get(&key) {
            Some(VisitState::Resolved) => {
                if let Some(ty) = self.registry.get(&key) {
                    return Ok(Arc::clone(ty));
                }
            }
            Some(VisitState::Visiting) => return Err(self.cycle(name)),
            None => {}
        }

        let Some(pending) = self.pending.get(&key).cloned() else {
            return self
                .external(name)
                .ok_or_else(|| SchemaError::unresolved(name, self.referrer()));
        };

        self.states.insert(key.clone(), VisitState::Visiting);
        self.stack.push(pending.name.clone());
        let built = self.materialize(&pending);
        self.stack.pop();

        match built {
            Ok(ty) => {
                log::debug!("resolved {} type '{}' in '{}'", ty.kind(), ty.name(), self.document);
                let ty = Arc::new(ty);
                self.registry.insert(Arc::clone(&ty));
                self.states.insert(key, VisitState::Resolved);
                Ok(ty)
            }
            Err(err) => {
                self.states.remove(&key);
                Err(err)
            }
        }
    }

    /// Resolve every registered type and seal the document
    pub fn build(mut self) -> Result<TypeDocument> {
        let names: Vec<String> = self.pending.values().map(|p| p.name.clone()).collect();
        for name in &names {
            self.resolve(name)?;
        }

        let mut registry = TypeRegistry::new();
        for name in &names {
            if let Some(ty) = self.registry.get(name) {
                registry.insert(Arc::clone(ty));
            }
        }
        log::debug!("built document '{}' with {} types", self.document, registry.len());
        Ok(TypeDocument::new(self.document, registry, self.references))
    }

    fn cycle(&self, name: &str) -> SchemaError {
        let start = self
            .stack
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .unwrap_or(0);
        let mut chain: Vec<String> = self.stack[start..].to_vec();
        chain.push(name.to_string());
        SchemaError::CircularReference { chain }
    }

    fn referrer(&self) -> String {
        self.stack.last().cloned().unwrap_or_else(|| self.document.clone())
    }

    fn external(&self, name: &str) -> Option<Arc<DataType>> {
        if let Some((namespace, local)) = name.split_once(':') {
            return self
                .references
                .iter()
                .find(|(ns, _)| ns.eq_ignore_ascii_case(namespace))
                .and_then(|(_, doc)| doc.get_type(local))
                .or_else(|| builtins().get_type(name))
                .cloned();
        }
        self.references
            .iter()
            .find_map(|(_, doc)| doc.get_type(name))
            .or_else(|| builtins().get_type(name))
            .cloned()
    }

    /// Link to a field or item type without resolving it
    fn link(&self, name: &str, referrer: &str) -> Result<TypeLink> {
        let local = match name.split_once(':') {
            Some((ns, local)) if ns.eq_ignore_ascii_case(&self.document) => Some(local),
            Some(_) => None,
            None => Some(name),
        };
        if let Some(pending) = local.and_then(|n| self.pending.get(&n.to_lowercase())) {
            return Ok(TypeLink::new(&self.document, &pending.name));
        }
        self.external(name)
            .map(|ty| ty.info().link())
            .ok_or_else(|| SchemaError::unresolved(name, referrer))
    }

    fn named<'a>(&self, owner: &str, type_ref: &'a TypeRef) -> Result<&'a str> {
        type_ref
            .as_name()
            .ok_or_else(|| SchemaError::invalid(owner, "inline declaration was not hoisted"))
    }

    fn materialize(&mut self, pending: &PendingType) -> Result<DataType> {
        let declaration = &pending.declaration;
        let info = TypeInfo {
            name: pending.name.clone(),
            description: declaration.description.clone(),
            document: self.document.clone(),
            source: declaration.source.clone(),
            embedded: pending.embedded,
        };
        let owner = pending.name.as_str();

        match &declaration.body {
            TypeBody::Simple(simple) => {
                let base = simple.base.as_deref().map(|b| self.resolve(b)).transpose()?;
                let base_simple = match &base {
                    Some(b) => Some(b.as_simple().ok_or_else(|| {
                        SchemaError::invalid(owner, format!("base '{}' of a simple type must be simple", b.name()))
                    })?),
                    None => None,
                };
                let codec = simple
                    .codec
                    .or_else(|| base_simple.map(|b| b.codec))
                    .ok_or_else(|| SchemaError::invalid(owner, "simple type needs a codec or a base"))?;
                let pattern = simple
                    .pattern
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| SchemaError::invalid(owner, format!("invalid pattern: {e}")))?;
                let own = SimpleConstraints {
                    min_length: simple.min_length,
                    max_length: simple.max_length,
                    pattern,
                    minimum: simple.minimum,
                    maximum: simple.maximum,
                    allow_signs: simple.allow_signs,
                };
                let constraints = match base_simple {
                    Some(b) => own.merge_over(&b.constraints),
                    None => own,
                };
                if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length) {
                    if min > max {
                        return Err(SchemaError::invalid(owner, "minLength is greater than maxLength"));
                    }
                }
                if let (Some(min), Some(max)) = (constraints.minimum, constraints.maximum) {
                    if min > max {
                        return Err(SchemaError::invalid(owner, "minimum is greater than maximum"));
                    }
                }
                Ok(DataType::Simple(SimpleType {
                    info,
                    base,
                    codec,
                    constraints,
                }))
            }

            TypeBody::Complex(complex) => {
                let base = match &complex.base {
                    Some(b) => Some(self.resolve_composable(owner, self.named(owner, b)?, "base")?),
                    None => None,
                };
                let mut fields = base.as_ref().and_then(|b| b.fields()).cloned().unwrap_or_default();
                for (name, decl) in &complex.fields {
                    fields.insert(self.field(owner, name, decl)?);
                }

                let discriminator_field = complex
                    .discriminator_field
                    .clone()
                    .or_else(|| base.as_ref().and_then(|b| b.discriminator_field()).map(str::to_string));
                if complex.discriminator_value.is_some() && discriminator_field.is_none() {
                    return Err(SchemaError::invalid(owner, "discriminatorValue without a discriminatorField"));
                }
                let additional_fields = complex
                    .additional_fields
                    .or_else(|| base.as_ref().map(|b| b.additional_fields()))
                    .unwrap_or_default();

                Ok(DataType::Complex(ComplexType {
                    info,
                    base,
                    mixins: Vec::new(),
                    fields,
                    additional_fields,
                    discriminator_field,
                    discriminator_value: complex.discriminator_value.clone(),
                }))
            }

            TypeBody::Mixin(mixin) => {
                let mut mixins = Vec::with_capacity(mixin.mixins.len());
                let mut fields = FieldTable::new();
                for member in &mixin.mixins {
                    let ty = self.resolve_composable(owner, self.named(owner, member)?, "mixin")?;
                    for field in ty.fields().into_iter().flatten() {
                        fields.insert_if_absent(field.clone());
                    }
                    mixins.push(ty);
                }
                let additional_fields = mixin
                    .additional_fields
                    .unwrap_or_else(|| AdditionalFields::combine(mixins.iter().map(|m| m.additional_fields())));

                Ok(DataType::Complex(ComplexType {
                    info,
                    base: None,
                    mixins,
                    fields,
                    additional_fields,
                    discriminator_field: None,
                    discriminator_value: None,
                }))
            }

            TypeBody::Union(union) => {
                if union.members.is_empty() {
                    return Err(SchemaError::invalid(owner, "union needs at least one member"));
                }
                let mut members = Vec::with_capacity(union.members.len());
                let mut fields = FieldTable::new();
                for member in &union.members {
                    let ty = self.resolve_composable(owner, self.named(owner, member)?, "union member")?;
                    for field in ty.fields().into_iter().flatten() {
                        fields.insert(field.clone());
                    }
                    members.push(ty);
                }
                let additional_fields = AdditionalFields::combine(members.iter().map(|m| m.additional_fields()));

                Ok(DataType::Union(UnionType {
                    info,
                    members,
                    fields,
                    additional_fields,
                }))
            }

            TypeBody::Mapped(mapped) => {
                let base = self.resolve_composable(owner, self.named(owner, &mapped.base)?, "mapped base")?;
                if let Some(table) = base.fields() {
                    if let Some(unknown) = mapped.operation.keys().iter().find(|k| !table.contains(k)) {
                        return Err(SchemaError::invalid(
                            owner,
                            format!("{} key '{unknown}' is not a field of '{}'", mapped.operation.name(), base.name()),
                        ));
                    }
                }
                Ok(DataType::Mapped(MappedType::new(info, base, mapped.operation.clone())))
            }

            TypeBody::Enum(decl) => {
                let base = decl.base.as_deref().map(|b| self.resolve(b)).transpose()?;
                let mut values = match &base {
                    Some(b) => b
                        .as_enum()
                        .ok_or_else(|| {
                            SchemaError::invalid(owner, format!("base '{}' of an enum must be an enum", b.name()))
                        })?
                        .values
                        .clone(),
                    None => IndexMap::new(),
                };
                for value in &decl.values {
                    let value = match value {
                        EnumValueDeclaration::Plain(value) => EnumValue {
                            value: value.clone(),
                            key: None,
                            description: None,
                        },
                        EnumValueDeclaration::Detailed {
                            value,
                            key,
                            description,
                        } => EnumValue {
                            value: value.clone(),
                            key: key.clone(),
                            description: description.clone(),
                        },
                    };
                    values.insert(value.value.to_string(), value);
                }
                Ok(DataType::Enum(EnumType { info, base, values }))
            }

            TypeBody::Array(array) => {
                let items_name = self.named(owner, &array.items)?;
                let items = self.link(items_name, owner)?;
                if let (Some(min), Some(max)) = (array.min_items, array.max_items) {
                    if min > max {
                        return Err(SchemaError::invalid(owner, "minItems is greater than maxItems"));
                    }
                }
                Ok(DataType::Array(ArrayType {
                    info,
                    items,
                    min_items: array.min_items,
                    max_items: array.max_items,
                }))
            }
        }
    }

    /// Resolve a structural dependency that must carry fields
    fn resolve_composable(&mut self, owner: &str, name: &str, role: &str) -> Result<Arc<DataType>> {
        let ty = self.resolve(name)?;
        if !ty.has_fields() {
            return Err(SchemaError::invalid(
                owner,
                format!("{role} '{}' is a {} type, expected Complex, Union or Mapped", ty.name(), ty.kind()),
            ));
        }
        Ok(ty)
    }

    fn field(&self, owner: &str, name: &str, decl: &FieldDeclaration) -> Result<FieldRef> {
        let referrer = format!("{owner}.{name}");
        let type_name = self.named(&referrer, &decl.type_ref)?;
        let ty = self.link(type_name, &referrer)?;
        Ok(FieldRef::new(Arc::new(Field {
            name: name.to_string(),
            ty,
            is_array: decl.is_array,
            required: decl.required,
            exclusive: decl.exclusive,
            default: decl.default.clone(),
            fixed: decl.fixed.clone(),
            description: decl.description.clone(),
            readonly: decl.readonly,
            writeonly: decl.writeonly,
            deprecated: decl.deprecated,
            origin: owner.to_string(),
        })))
    }
}

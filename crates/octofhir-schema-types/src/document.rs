//! Built, immutable type documents

use crate::{BUILTINS_DOCUMENT, DataType, DocumentDeclaration, TypeBuilder, TypeLink, TypeRegistry, builtins};
use octofhir_schema_diagnostics::{Result, SchemaError};
use std::sync::Arc;

/// A fully resolved set of types
///
/// Documents are immutable once built and may be shared across threads.
/// Other documents are referenced under a namespace and searched after the
/// local registry; the built-in document is searched last.
#[derive(Debug, Clone)]
pub struct TypeDocument {
    id: String,
    registry: TypeRegistry,
    references: Vec<(String, Arc<TypeDocument>)>,
}

impl TypeDocument {
    pub fn new(id: impl Into<String>, registry: TypeRegistry, references: Vec<(String, Arc<TypeDocument>)>) -> Self {
        Self {
            id: id.into(),
            registry,
            references,
        }
    }

    /// Build a declared document, taking its references from `available` by id
    pub fn build(declaration: &DocumentDeclaration, available: &[Arc<TypeDocument>]) -> Result<Self> {
        let mut builder = TypeBuilder::new(&declaration.id);
        for id in &declaration.references {
            let doc = available
                .iter()
                .find(|d| d.id.eq_ignore_ascii_case(id))
                .ok_or_else(|| SchemaError::unresolved(id, &declaration.id))?;
            builder.reference(id, Arc::clone(doc));
        }
        builder.register_document(declaration)?;
        builder.build()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::build(&DocumentDeclaration::from_json(json)?, &[])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Local types in declaration order
    pub fn types(&self) -> impl Iterator<Item = &Arc<DataType>> {
        self.registry.iter()
    }

    pub fn references(&self) -> impl Iterator<Item = (&str, &Arc<TypeDocument>)> {
        self.references.iter().map(|(ns, doc)| (ns.as_str(), doc))
    }

    /// Look a type up by `name` or `namespace:name`
    pub fn get_type(&self, name: &str) -> Option<&Arc<DataType>> {
        if let Some((namespace, local)) = name.split_once(':') {
            return self.namespace(namespace)?.get_type(local);
        }
        self.registry
            .get(name)
            .or_else(|| self.references.iter().find_map(|(_, doc)| doc.get_type(name)))
            .or_else(|| self.fallback().and_then(|b| b.registry.get(name)))
    }

    pub fn get_by_source(&self, source: &str) -> Option<&Arc<DataType>> {
        self.registry
            .get_by_source(source)
            .or_else(|| self.references.iter().find_map(|(_, doc)| doc.get_by_source(source)))
    }

    /// This document, a referenced one (searched recursively) or the built-ins
    pub fn find_document(&self, id: &str) -> Option<&TypeDocument> {
        if self.id.eq_ignore_ascii_case(id) {
            return Some(self);
        }
        self.references
            .iter()
            .find_map(|(_, doc)| doc.find_document(id))
            .or_else(|| self.fallback().filter(|b| b.id.eq_ignore_ascii_case(id)))
    }

    /// Resolve the type a field or array item links to
    pub fn field_type(&self, link: &TypeLink) -> Option<&Arc<DataType>> {
        self.find_document(&link.document)?.registry.get(&link.name)
    }

    pub fn is_derived_from(&self, name: &str, ancestor: &str) -> bool {
        self.get_type(name).is_some_and(|t| t.is_derived_from(ancestor))
    }

    fn namespace(&self, namespace: &str) -> Option<&TypeDocument> {
        if self.id.eq_ignore_ascii_case(namespace) {
            return Some(self);
        }
        self.references
            .iter()
            .find(|(ns, _)| ns.eq_ignore_ascii_case(namespace))
            .map(|(_, doc)| doc.as_ref())
            .or_else(|| self.fallback().filter(|b| b.id.eq_ignore_ascii_case(namespace)))
    }

    fn fallback(&self) -> Option<&TypeDocument> {
        (self.id != BUILTINS_DOCUMENT).then(|| builtins().as_ref())
    }
}

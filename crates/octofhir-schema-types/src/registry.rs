//! Per-document type registry

use crate::DataType;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Named types of one document
///
/// Names and source identifiers are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<DataType>>,
    /// Lowercased source identifier to lowercased type name
    sources: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, returning the one it replaced
    pub fn insert(&mut self, ty: Arc<DataType>) -> Option<Arc<DataType>> {
        let key = ty.name().to_lowercase();
        if let Some(source) = &ty.info().source {
            self.sources.insert(source.to_lowercase(), key.clone());
        }
        self.types.insert(key, ty)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DataType>> {
        self.types.get(&name.to_lowercase())
    }

    pub fn get_by_source(&self, source: &str) -> Option<&Arc<DataType>> {
        self.sources
            .get(&source.to_lowercase())
            .and_then(|name| self.types.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DataType>> {
        self.types.values()
    }
}

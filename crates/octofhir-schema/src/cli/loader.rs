//! Loading type documents from files

use crate::{DocumentDeclaration, TypeDocument};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Build documents in order; each may reference the ones loaded before it by id
pub fn load_documents(files: &[PathBuf]) -> Result<Vec<Arc<TypeDocument>>> {
    let mut documents: Vec<Arc<TypeDocument>> = Vec::with_capacity(files.len());
    for file in files {
        let declaration = DocumentDeclaration::from_json_file(file)
            .with_context(|| format!("Failed to load {}", file.display()))?;
        let document = TypeDocument::build(&declaration, &documents)
            .with_context(|| format!("Failed to build {}", file.display()))?;
        log::debug!("loaded document '{}' from {}", document.id(), file.display());
        documents.push(Arc::new(document));
    }
    Ok(documents)
}

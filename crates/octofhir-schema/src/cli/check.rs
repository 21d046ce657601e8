//! Check command implementation

use super::loader::load_documents;
use super::output::{self, OutputFormat};
use crate::{DataType, TypeDocument};
use anyhow::Result;
use colored::Colorize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};

/// Configuration for check command
pub struct CheckConfig {
    pub files: Vec<PathBuf>,
    /// Also list synthesized inline types
    pub embedded: bool,
    pub format: OutputFormat,
}

/// One row of the type listing
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct TypeRow {
    #[tabled(rename = "Document")]
    pub document: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Base")]
    pub base: String,
    #[tabled(rename = "Fields")]
    pub fields: String,
}

impl TypeRow {
    pub fn new(ty: &DataType) -> Self {
        Self {
            document: ty.info().document.clone(),
            name: ty.name().to_string(),
            kind: ty.kind().to_string(),
            base: ty.base().map(|b| b.name().to_string()).unwrap_or_default(),
            fields: ty
                .fields()
                .map(|table| {
                    table
                        .iter()
                        .map(|f| {
                            let mut name = f.name.clone();
                            if f.is_array {
                                name.push_str("[]");
                            }
                            if f.required {
                                name.push('!');
                            }
                            name
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "document": self.document,
            "name": self.name,
            "kind": self.kind,
            "base": (!self.base.is_empty()).then_some(&self.base),
            "fields": self.fields,
        })
    }
}

/// Rows for the local types of a document
pub fn type_rows(document: &TypeDocument, embedded: bool) -> Vec<TypeRow> {
    document
        .types()
        .filter(|ty| embedded || !ty.info().embedded)
        .map(|ty| TypeRow::new(ty))
        .collect()
}

/// Build every document and list its types
pub fn check(config: CheckConfig) -> Result<()> {
    if config.files.is_empty() {
        anyhow::bail!("No documents specified");
    }

    let documents = load_documents(&config.files)?;
    let rows: Vec<TypeRow> = documents
        .iter()
        .flat_map(|doc| type_rows(doc, config.embedded))
        .collect();

    if config.format.is_json() {
        let value = Value::Array(rows.iter().map(TypeRow::to_json).collect());
        println!("{}", output::format_json(&value, config.format)?);
        return Ok(());
    }

    println!("{}", Table::new(rows.iter().cloned()).with(Style::modern()));
    println!(
        "{}",
        output::format_success(&format!(
            "{} document(s), {} type(s)",
            documents.len().to_string().bold(),
            rows.len()
        ))
    );
    Ok(())
}

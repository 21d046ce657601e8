//! Validate command implementation

use super::loader::load_documents;
use super::output::{self, OutputFormat};
use crate::{CodecGenerator, CodecOptions, Direction, SchemaError, ValidationError};
use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Configuration for validate command
pub struct ValidateConfig {
    /// Documents to build; the type is looked up in the last one
    pub documents: Vec<PathBuf>,
    pub type_name: String,
    /// JSON input file, `-` for stdin
    pub input: PathBuf,
    pub direction: Direction,
    pub options: CodecOptions,
    pub format: OutputFormat,
}

/// Decode or encode a JSON value and print the result
pub fn validate(config: ValidateConfig) -> Result<()> {
    let documents = load_documents(&config.documents)?;
    let document = documents
        .last()
        .cloned()
        .context("No documents specified")?;
    let input = read_input(&config.input)?;

    let generator = CodecGenerator::new(document);
    let codec = generator.generate(&config.type_name, config.direction, &config.options)?;
    match codec.apply(&input) {
        Ok(value) => {
            println!("{}", output::format_json(&value, config.format.for_values())?);
            Ok(())
        }
        Err(err) => {
            print_issues(&err, config.format)?;
            Err(SchemaError::from(err)).context(format!("{} {} failed", config.direction, config.type_name))
        }
    }
}

fn read_input(path: &Path) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).context("Input is not valid JSON")
}

/// Render issues one per line as `code path: message`
pub fn format_issues(err: &ValidationError) -> Vec<String> {
    err.issues
        .iter()
        .map(|issue| {
            let path = if issue.path.is_empty() { "(root)" } else { &issue.path };
            format!("{} {}: {}", issue.code.to_string().red().bold(), path.cyan(), issue.message)
        })
        .collect()
}

fn print_issues(err: &ValidationError, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        let value = serde_json::to_value(err).context("Failed to serialize issues")?;
        println!("{}", output::format_json(&value, format)?);
        return Ok(());
    }
    for line in format_issues(err) {
        eprintln!("  {line}");
    }
    Ok(())
}

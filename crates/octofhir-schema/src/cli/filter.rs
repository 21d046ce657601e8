//! Filter command implementation

use super::output::{self, OutputFormat};
use crate::ast::{AllowSigns, Expression};
use crate::{parse_field_path, parse_filter};
use anyhow::Result;
use serde_json::{Value, json};

/// Configuration for filter command
pub struct FilterConfig {
    pub text: String,
    /// Parse a sortable field path instead of a filter
    pub path: Option<AllowSigns>,
    pub format: OutputFormat,
}

/// Parse filter text and print its canonical form or AST
pub fn filter(config: FilterConfig) -> Result<()> {
    let parsed = match config.path {
        Some(allow) => parse_field_path(&config.text, allow).map(|path| (path.to_string(), json!(path))),
        None => parse_filter(&config.text).map(|expr| (expr.to_string(), describe(&expr))),
    };

    match parsed {
        Ok((_, value)) if config.format.is_json() => {
            println!("{}", output::format_json(&value, config.format)?);
            Ok(())
        }
        Ok((canonical, _)) => {
            println!("{canonical}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.render());
            anyhow::bail!("{} syntax error(s) in {:?}", err.diagnostics.len(), config.text)
        }
    }
}

/// AST plus the field paths the expression reads
pub fn describe(expr: &Expression) -> Value {
    let fields: Vec<String> = expr
        .field_references()
        .iter()
        .map(|f| f.segments.join("."))
        .collect();
    json!({
        "expression": expr,
        "canonical": expr.to_string(),
        "fields": fields,
    })
}

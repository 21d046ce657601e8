//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::io::IsTerminal;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Table,
    Text,
}

impl OutputFormat {
    /// Parse a `--format` value, falling back to `default` when absent or unknown
    pub fn parse(format: Option<&str>, default: Self) -> Self {
        match format.map(str::to_lowercase).as_deref() {
            Some("json") => Self::Json,
            Some("pretty" | "json-pretty") => Self::JsonPretty,
            Some("table") => Self::Table,
            Some("text") => Self::Text,
            _ => default,
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    /// Values are always printed as JSON
    pub fn for_values(self) -> Self {
        if self == Self::Json { self } else { Self::JsonPretty }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(std::io::stdout().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Format diagnostic information (file:line:col)
pub fn format_location(file: &str, line: usize, col: usize) -> String {
    format!("{}:{}:{}", file.cyan(), line, col)
}

/// Format JSON value for output
pub fn format_json(value: &Value, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        serde_json::to_string(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    }
}

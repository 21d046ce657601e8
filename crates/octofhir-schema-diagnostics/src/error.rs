//! Error types for type-graph construction, validation and filter parsing

use crate::{
    ErrorCode, SCH0100, SCH0109, SCH0110, SCH0114, SCH0200, SCH0401, SCH0406, SourceLocation,
    Span,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with location and context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the span (converts to location using provided source)
    pub fn with_span(mut self, span: Span, source: &str) -> Self {
        self.location = Some(SourceLocation::from_span(span, source));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// 1-based line, 0 when the diagnostic has no location
    pub fn line(&self) -> usize {
        self.location.as_ref().map_or(0, |l| l.line)
    }

    /// 1-based column, 0 when the diagnostic has no location
    pub fn column(&self) -> usize {
        self.location.as_ref().map_or(0, |l| l.column)
    }

    /// Render the diagnostic with the offending source line and a caret marker
    pub fn render(&self, source: &str) -> String {
        let mut out = self.header();
        if let Some(loc) = &self.location {
            if let Some(text) = source.lines().nth(loc.line.saturating_sub(1)) {
                let width = loc.length.max(1);
                out.push_str(&format!(
                    "\n  | {}\n  | {}{}",
                    text,
                    " ".repeat(loc.column.saturating_sub(1)),
                    "^".repeat(width)
                ));
            }
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  = help: {help}"));
        }
        out
    }

    #[cfg(feature = "colored")]
    fn header(&self) -> String {
        use colored::Colorize;
        let head = format!("{}[{}]", self.severity, self.code);
        let head = match self.severity {
            Severity::Error => head.red().bold(),
            Severity::Warning => head.yellow().bold(),
        };
        match &self.location {
            Some(loc) => format!("{}: {} at {}", head, self.message, loc),
            None => format!("{}: {}", head, self.message),
        }
    }

    #[cfg(not(feature = "colored"))]
    fn header(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}[{}]: {} at {}", self.severity, self.code, self.message, loc),
            None => format!("{}[{}]: {}", self.severity, self.code, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// One path-qualified problem found while decoding or encoding a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: ErrorCode,
    /// Dot/bracket qualified location (`address.city`, `tags[2]`), empty for the root value
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.code, self.message)
        } else {
            write!(f, "{}: {}: {}", self.code, self.path, self.message)
        }
    }
}

/// Codec failure carrying every issue collected for one value
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    match issues {
        [] => "validation failed".to_string(),
        [single] => single.to_string(),
        many => format!(
            "{} validation issues: {}",
            many.len(),
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn single(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(code, path, message)])
    }

    /// Issues reported at exactly this path
    pub fn issues_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.path == path)
    }

    pub fn code(&self) -> ErrorCode {
        self.issues.first().map_or(SCH0200, |i| i.code)
    }
}

/// Filter text that could not be parsed
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{}", render_syntax(.diagnostics))]
pub struct SyntaxError {
    /// The text that failed to parse
    pub input: String,
    pub diagnostics: Vec<Diagnostic>,
}

fn render_syntax(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.location {
            Some(loc) => format!("{} at {}", d.message, loc),
            None => d.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl SyntaxError {
    pub fn new(input: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            input: input.into(),
            diagnostics,
        }
    }

    /// `(message, line, column)` triples
    pub fn issues(&self) -> impl Iterator<Item = (&str, usize, usize)> {
        self.diagnostics
            .iter()
            .map(|d| (d.message.as_str(), d.line(), d.column()))
    }

    pub fn code(&self) -> ErrorCode {
        self.diagnostics.first().map_or(crate::SCH0001, |d| d.code)
    }

    /// Every diagnostic rendered against the source text
    pub fn render(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(&self.input))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Main error type of the schema engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Two different declarations under one name in a document
    #[error("{code}: type '{name}' is already declared in document '{document}'", code = SCH0109)]
    DuplicateName { name: String, document: String },

    /// A base/mixin/union/mapped chain loops back on itself
    #[error("{code}: circular reference {}", .chain.join(" -> "), code = SCH0114)]
    CircularReference { chain: Vec<String> },

    /// A named type is absent from the document and its references
    #[error("{code}: unresolved type '{name}' referenced by '{referrer}'", code = SCH0100)]
    UnresolvedReference { name: String, referrer: String },

    /// A declaration that cannot be turned into a type
    #[error("{code}: invalid declaration of '{name}': {message}", code = SCH0110)]
    InvalidDeclaration { name: String, message: String },

    #[error("{code}: cannot read '{path}': {message}", code = SCH0401)]
    Io { path: String, message: String },

    #[error("{code}: malformed document: {message}", code = SCH0406)]
    Format { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl SchemaError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn unresolved(name: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            name: name.into(),
            referrer: referrer.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateName { .. } => SCH0109,
            Self::CircularReference { .. } => SCH0114,
            Self::UnresolvedReference { .. } => SCH0100,
            Self::InvalidDeclaration { .. } => SCH0110,
            Self::Io { .. } => SCH0401,
            Self::Format { .. } => SCH0406,
            Self::Validation(err) => err.code(),
            Self::Syntax(err) => err.code(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Syntax(err) => err
                .diagnostics
                .first()
                .cloned()
                .unwrap_or_else(|| Diagnostic::error(err.code(), err.to_string())),
            Self::CircularReference { chain } => {
                Diagnostic::error(SCH0114, format!("circular reference {}", chain.join(" -> ")))
                    .with_help(SCH0114.info().help.unwrap_or_default())
            }
            Self::UnresolvedReference { name, referrer } => Diagnostic::error(
                SCH0100,
                format!("unresolved type '{name}' referenced by '{referrer}'"),
            )
            .with_help(SCH0100.info().help.unwrap_or_default()),
            other => Diagnostic::error(other.code(), other.to_string()),
        }
    }
}

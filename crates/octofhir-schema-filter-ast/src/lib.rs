//! Filter expression AST
//!
//! Nodes produced by the filter parser and consumed by query layers. Every node
//! renders back to canonical filter text through `Display`, and the
//! [`ExpressionVisitor`] trait lets callers translate a tree into a backend
//! predicate.

mod expression;
mod field_path;
mod literal;
mod operator;
mod visitor;

pub use expression::*;
pub use field_path::*;
pub use literal::*;
pub use operator::*;
pub use visitor::*;

use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

/// Dotted field reference (`address.city`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QualifiedIdentifier {
    pub segments: SmallVec<[String; 2]>,
}

impl QualifiedIdentifier {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a dotted path
    pub fn parse_dotted(path: &str) -> Self {
        Self::new(path.split('.'))
    }

    /// Last segment
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }
}

impl From<&str> for QualifiedIdentifier {
    fn from(s: &str) -> Self {
        Self::parse_dotted(s)
    }
}

impl fmt::Display for QualifiedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

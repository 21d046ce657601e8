//! Issue collection while a codec walks a value

use octofhir_schema_diagnostics::{ErrorCode, ValidationIssue};
use smallvec::SmallVec;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Current location plus every issue reported so far
#[derive(Debug, Default)]
pub struct ValidationContext {
    path: SmallVec<[PathSegment; 8]>,
    issues: Vec<ValidationIssue>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dot/bracket form of the current location (`items[2].name`)
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(i) => {
                    let _ = write!(out, "[{i}]");
                }
            }
        }
        out
    }

    pub fn report(&mut self, code: ErrorCode, message: impl Into<String>) {
        let path = self.path();
        self.issues.push(ValidationIssue::new(code, path, message));
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Run `f` one key deeper
    pub fn at_key<R>(&mut self, key: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(PathSegment::Key(key.to_string()));
        let result = f(self);
        self.path.pop();
        result
    }

    /// Run `f` one array index deeper
    pub fn at_index<R>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(PathSegment::Index(index));
        let result = f(self);
        self.path.pop();
        result
    }

    /// A context at the same location with no issues, for trial runs
    pub fn fork(&self) -> Self {
        Self {
            path: self.path.clone(),
            issues: Vec::new(),
        }
    }

    pub fn absorb(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }
}

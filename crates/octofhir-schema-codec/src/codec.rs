//! Generated validator handle

use crate::{Direction, ValidationContext};
use octofhir_schema_diagnostics::ValidationError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Validator body: returns `None` after reporting why the value was rejected
pub type CodecFn = Arc<dyn Fn(&Value, &mut ValidationContext) -> Option<Value> + Send + Sync>;

/// A decode or encode validator for one type
#[derive(Clone)]
pub struct Codec {
    type_name: Arc<str>,
    direction: Direction,
    func: CodecFn,
}

impl Codec {
    pub fn new(type_name: &str, direction: Direction, func: CodecFn) -> Self {
        Self {
            type_name: Arc::from(type_name),
            direction,
            func,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Validate a whole value
    pub fn apply(&self, input: &Value) -> Result<Value, ValidationError> {
        let mut ctx = ValidationContext::new();
        let output = self.apply_in(input, &mut ctx);
        match output {
            Some(value) if !ctx.has_issues() => Ok(value),
            _ => Err(ValidationError::new(ctx.into_issues())),
        }
    }

    /// Validate a nested value, reporting into `ctx`
    pub fn apply_in(&self, input: &Value, ctx: &mut ValidationContext) -> Option<Value> {
        let before = ctx.issue_count();
        let output = (self.func)(input, ctx)?;
        (ctx.issue_count() == before).then_some(output)
    }

    /// Both handles share one generated validator
    pub fn ptr_eq(&self, other: &Codec) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("type_name", &self.type_name)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

//! Diagnostics and error handling for the schema engine
//!
//! Every failure the engine can report is expressed here: structured `SCHnnnn`
//! error codes, source locations for filter text, build-time [`SchemaError`]s,
//! per-call [`ValidationError`]s and filter [`SyntaxError`]s.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for type-graph construction
pub type Result<T> = std::result::Result<T, SchemaError>;

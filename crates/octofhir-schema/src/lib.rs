//! Declarative data types, generated codecs and filter expressions
//!
//! This crate bundles the schema engine:
//! - Building an immutable type graph from declarations
//! - Generating memoized decode/encode validators for its types
//! - Parsing `$filter`-style query expressions into an AST
//!
//! # Example
//!
//! ```
//! use octofhir_schema::{CodecGenerator, CodecOptions, TypeDocument, parse_filter};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let doc = TypeDocument::from_json(r#"{
//!     "User": {"fields": {"id": {"type": "integer", "required": true}, "name": "string"}}
//! }"#)?;
//! let codecs = CodecGenerator::new(Arc::new(doc));
//! let user = codecs.decode("User", &json!({"ID": "7", "name": "Ann"}), &CodecOptions::new())?;
//! assert_eq!(user, json!({"id": 7, "name": "Ann"}));
//!
//! let filter = parse_filter("name = 'Ann' and id > 5")?;
//! assert_eq!(filter.to_string(), "name = 'Ann' and id > 5");
//! # Ok::<(), octofhir_schema::SchemaError>(())
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_schema_codec as codec;
pub use octofhir_schema_diagnostics as diagnostics;
pub use octofhir_schema_filter_ast as ast;
pub use octofhir_schema_filter_parser as parser;
pub use octofhir_schema_types as types;

// Convenience re-exports
pub use octofhir_schema_codec::{Codec, CodecGenerator, CodecOptions, Direction};
pub use octofhir_schema_diagnostics::{Result, SchemaError, SyntaxError, ValidationError};
pub use octofhir_schema_filter_ast::{Expression, FieldPath};
pub use octofhir_schema_filter_parser::{parse_field_path, parse_filter};
pub use octofhir_schema_types::{DataType, DocumentDeclaration, TypeBuilder, TypeDocument};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;

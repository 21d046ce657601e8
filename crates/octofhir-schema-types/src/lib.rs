//! Data type graph
//!
//! This crate turns declarative type records into an immutable, acyclic graph
//! of named data types:
//! - Declarations (serde records, JSON loading and a fluent builder API)
//! - The `DataType` hierarchy and its composition rules
//! - `TypeRegistry`, `TypeBuilder` and the built `TypeDocument`
//! - Built-in simple types shared by every document

mod builder;
mod builtins;
mod data_type;
mod declaration;
mod document;
mod field;
mod registry;

pub use builder::*;
pub use builtins::*;
pub use data_type::*;
pub use declaration::*;
pub use document::*;
pub use field::*;
pub use registry::*;

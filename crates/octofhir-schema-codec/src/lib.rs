//! Codec generation
//!
//! A [`CodecGenerator`] turns the types of a built
//! [`TypeDocument`](octofhir_schema_types::TypeDocument) into validators:
//! - decode: validate and coerce external input
//! - encode: validate and shape output
//!
//! Codecs are memoized per (type, direction, options signature). Failures
//! are reported as a [`ValidationError`](octofhir_schema_diagnostics::ValidationError)
//! listing every path-qualified issue found in the value.

mod codec;
mod context;
mod generator;
mod object;
mod options;
mod scalar;

pub use codec::{Codec, CodecFn};
pub use context::{PathSegment, ValidationContext};
pub use generator::CodecGenerator;
pub use options::{CodecOptions, Direction};

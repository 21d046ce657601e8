//! Built-in simple types
//!
//! Every document falls back to the shared `builtins` document for
//! unqualified names it does not declare itself.

use crate::{DataType, SimpleConstraints, SimpleType, TypeDocument, TypeInfo, TypeRegistry};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Id of the built-in document
pub const BUILTINS_DOCUMENT: &str = "builtins";

/// Scalar validator a simple type is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinCodec {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Date,
    #[serde(alias = "date-time")]
    Datetime,
    Time,
    Uuid,
    Email,
    Url,
    Base64,
    Object,
    Null,
    FieldPath,
    Filter,
}

impl BuiltinCodec {
    pub const ALL: [BuiltinCodec; 16] = [
        Self::Any,
        Self::String,
        Self::Number,
        Self::Integer,
        Self::Boolean,
        Self::Date,
        Self::Datetime,
        Self::Time,
        Self::Uuid,
        Self::Email,
        Self::Url,
        Self::Base64,
        Self::Object,
        Self::Null,
        Self::FieldPath,
        Self::Filter,
    ];

    /// Name of the built-in type using this codec
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Time => "time",
            Self::Uuid => "uuid",
            Self::Email => "email",
            Self::Url => "url",
            Self::Base64 => "base64",
            Self::Object => "object",
            Self::Null => "null",
            Self::FieldPath => "field-path",
            Self::Filter => "filter",
        }
    }

    /// Values are handled as JSON strings
    pub const fn is_textual(&self) -> bool {
        !matches!(
            self,
            Self::Any | Self::Number | Self::Integer | Self::Boolean | Self::Object | Self::Null
        )
    }
}

impl fmt::Display for BuiltinCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

static BUILTINS: Lazy<Arc<TypeDocument>> = Lazy::new(|| {
    let mut registry = TypeRegistry::new();
    for codec in BuiltinCodec::ALL {
        registry.insert(Arc::new(DataType::Simple(SimpleType {
            info: TypeInfo::new(codec.type_name(), BUILTINS_DOCUMENT),
            base: None,
            codec,
            constraints: SimpleConstraints::default(),
        })));
    }
    Arc::new(TypeDocument::new(BUILTINS_DOCUMENT, registry, Vec::new()))
});

/// The shared built-in document
pub fn builtins() -> &'static Arc<TypeDocument> {
    &BUILTINS
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_every_codec_has_a_type() {
        let doc = builtins();
        assert_eq!(doc.types().count(), BuiltinCodec::ALL.len());
        for codec in BuiltinCodec::ALL {
            let ty = doc.get_type(codec.type_name());
            assert_eq!(ty.and_then(|t| t.as_simple()).map(|s| s.codec), Some(codec));
        }
    }

    #[rstest]
    #[case("\"field-path\"", BuiltinCodec::FieldPath)]
    #[case("\"date-time\"", BuiltinCodec::Datetime)]
    #[case("\"uuid\"", BuiltinCodec::Uuid)]
    fn test_codec_names(#[case] json: &str, #[case] expected: BuiltinCodec) {
        assert_eq!(serde_json::from_str::<BuiltinCodec>(json).unwrap(), expected);
    }
}

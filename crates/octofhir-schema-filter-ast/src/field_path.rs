//! Sortable field paths (`-createdAt`, `+address.-city`)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction marker on a path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            _ => None,
        }
    }

    pub const fn as_char(&self) -> char {
        match self {
            Self::Plus => '+',
            Self::Minus => '-',
        }
    }
}

/// Where signs are accepted in a field path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowSigns {
    /// No signs at all
    #[default]
    Never,
    /// Only on the first segment
    First,
    /// On every segment
    Each,
}

impl AllowSigns {
    pub const fn permits(&self, segment_index: usize) -> bool {
        match self {
            Self::Never => false,
            Self::First => segment_index == 0,
            Self::Each => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldPathSegment {
    pub name: String,
    pub sign: Option<Sign>,
}

impl FieldPathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sign: None,
        }
    }

    pub fn signed(name: impl Into<String>, sign: Sign) -> Self {
        Self {
            name: name.into(),
            sign: Some(sign),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldPath {
    pub segments: Vec<FieldPathSegment>,
}

impl FieldPath {
    pub fn new(segments: Vec<FieldPathSegment>) -> Self {
        Self { segments }
    }

    /// Sign of the first segment, which decides the sort direction
    pub fn leading_sign(&self) -> Option<Sign> {
        self.segments.first().and_then(|s| s.sign)
    }

    /// Segment names without signs joined by `.`
    pub fn unsigned(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if let Some(sign) = segment.sign {
                write!(f, "{}", sign.as_char())?;
            }
            f.write_str(&segment.name)?;
        }
        Ok(())
    }
}

//! Codec direction and options

use octofhir_schema_diagnostics::SyntaxError;
use octofhir_schema_filter_ast::{AllowSigns, Sign};
use octofhir_schema_filter_parser::parse_field_path;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// External input to validated value
    Decode,
    /// Value to external output
    Encode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Decode => "decode",
            Self::Encode => "encode",
        })
    }
}

/// Per-codec behaviour switches
///
/// `omit` and `projection` entries are field paths; dotted entries reach
/// into nested objects. `partial` applies at every depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodecOptions {
    pub omit: Vec<String>,
    pub partial: bool,
    /// Encode only: `name` selects, `-name` excludes, `+name` adds an exclusive field
    pub projection: Vec<String>,
    pub ignore_readonly_fields: bool,
    pub ignore_writeonly_fields: bool,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_omit<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.omit.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn with_projection<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.projection.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn ignore_readonly_fields(mut self) -> Self {
        self.ignore_readonly_fields = true;
        self
    }

    pub fn ignore_writeonly_fields(mut self) -> Self {
        self.ignore_writeonly_fields = true;
        self
    }

    /// Cache key component; equal for options that behave the same
    pub fn signature(&self) -> String {
        let normalize = |entries: &[String]| {
            let mut entries: Vec<String> = entries.iter().map(|e| e.to_lowercase()).collect();
            entries.sort();
            entries.dedup();
            entries.join(",")
        };
        format!(
            "omit={};partial={};projection={};ro={};wo={}",
            normalize(&self.omit),
            self.partial,
            normalize(&self.projection),
            self.ignore_readonly_fields,
            self.ignore_writeonly_fields
        )
    }

    /// Reject malformed omit or projection paths
    pub fn validate(&self) -> Result<(), SyntaxError> {
        for entry in &self.omit {
            parse_field_path(entry, AllowSigns::Never)?;
        }
        for entry in &self.projection {
            parse_field_path(entry, AllowSigns::First)?;
        }
        Ok(())
    }

    pub(crate) fn is_omitted(&self, name: &str) -> bool {
        self.omit.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    /// Options for the value of field `name`
    pub(crate) fn nested(&self, name: &str) -> CodecOptions {
        CodecOptions {
            omit: strip_head(&self.omit, name),
            partial: self.partial,
            projection: self
                .projection
                .iter()
                .filter_map(|entry| {
                    let (sign, path) = split_sign(entry);
                    let rest = strip_one(path, name)?;
                    Some(match sign {
                        Some(sign) => format!("{}{rest}", sign.as_char()),
                        None => rest.to_string(),
                    })
                })
                .collect(),
            ignore_readonly_fields: self.ignore_readonly_fields,
            ignore_writeonly_fields: self.ignore_writeonly_fields,
        }
    }

    /// Whether an encoded object keeps field `name`
    pub(crate) fn projects(&self, name: &str, exclusive: bool) -> bool {
        let mut include_only = false;
        let mut selected = false;
        let mut forced = false;
        for entry in &self.projection {
            let (sign, path) = split_sign(entry);
            let (head, rest) = path.split_once('.').map_or((path, None), |(h, r)| (h, Some(r)));
            let matches = head.eq_ignore_ascii_case(name);
            match sign {
                None => {
                    include_only = true;
                    selected |= matches;
                }
                Some(Sign::Plus) => forced |= matches,
                Some(Sign::Minus) if matches && rest.is_none() => return false,
                Some(Sign::Minus) => {}
            }
        }
        if include_only {
            selected || forced
        } else {
            !exclusive || forced
        }
    }
}

fn split_sign(entry: &str) -> (Option<Sign>, &str) {
    let mut chars = entry.chars();
    match chars.next().and_then(Sign::from_char) {
        Some(sign) => (Some(sign), chars.as_str()),
        None => (None, entry),
    }
}

fn strip_one<'a>(path: &'a str, head: &str) -> Option<&'a str> {
    let (first, rest) = path.split_once('.')?;
    first.eq_ignore_ascii_case(head).then_some(rest)
}

fn strip_head(entries: &[String], head: &str) -> Vec<String> {
    entries
        .iter()
        .filter_map(|e| strip_one(e, head).map(str::to_string))
        .collect()
}

//! Built-in scalar validators for simple and enum types

use crate::{Codec, CodecFn, Direction, ValidationContext};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use octofhir_schema_diagnostics::{
    SCH0203, SCH0204, SCH0205, SCH0206, SCH0207, SCH0208, SyntaxError,
};
use octofhir_schema_filter_parser::{parse_field_path, parse_filter};
use octofhir_schema_types::{BuiltinCodec, EnumType, SimpleConstraints, SimpleType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::Arc;

static EMAIL: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));
static URL: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$"));
static BASE64: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$"));

fn matches_pattern(regex: &Lazy<Result<Regex, regex::Error>>, text: &str) -> bool {
    regex.as_ref().is_ok_and(|r| r.is_match(text))
}

pub(crate) fn simple_codec(ty: &SimpleType, direction: Direction) -> Codec {
    let scalar = ScalarCodec {
        codec: ty.codec,
        constraints: ty.constraints.clone(),
        coerce: direction == Direction::Decode,
    };
    let func: CodecFn = Arc::new(move |value: &Value, ctx: &mut ValidationContext| scalar.check(value, ctx));
    Codec::new(&ty.info.name, direction, func)
}

pub(crate) fn enum_codec(ty: &EnumType, direction: Direction) -> Codec {
    let values = ty.values.clone();
    let func: CodecFn = Arc::new(move |value: &Value, ctx: &mut ValidationContext| {
        if values.contains_key(&value.to_string()) {
            return Some(value.clone());
        }
        let allowed: Vec<String> = values.values().map(|v| v.value.to_string()).collect();
        ctx.report(SCH0207, format!("{value} is not one of {}", allowed.join(", ")));
        None
    });
    Codec::new(&ty.info.name, direction, func)
}

struct ScalarCodec {
    codec: BuiltinCodec,
    constraints: SimpleConstraints,
    /// Decode accepts textual forms of numbers and booleans
    coerce: bool,
}

impl ScalarCodec {
    fn check(&self, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
        let output = match self.codec {
            BuiltinCodec::Any => Some(value.clone()),
            BuiltinCodec::Null => value.is_null().then(|| Value::Null),
            BuiltinCodec::Object => value.is_object().then(|| value.clone()),
            BuiltinCodec::Boolean => self.boolean(value),
            BuiltinCodec::Number => self.number(value, false),
            BuiltinCodec::Integer => self.number(value, true),
            BuiltinCodec::String => self.string(value),
            _ => return self.textual(value, ctx),
        };
        let Some(output) = output else {
            ctx.report(SCH0203, format!("expected {}, got {}", self.codec, json_kind(value)));
            return None;
        };
        self.constrain(&output, ctx).then_some(output)
    }

    fn boolean(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) if self.coerce && s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
            Value::String(s) if self.coerce && s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
            _ => None,
        }
    }

    fn number(&self, value: &Value, integer: bool) -> Option<Value> {
        let number = match value {
            Value::Number(n) => n.clone(),
            Value::String(s) if self.coerce => parse_number(s.trim())?,
            _ => return None,
        };
        if !integer {
            return Some(Value::Number(number));
        }
        if number.is_i64() || number.is_u64() {
            return Some(Value::Number(number));
        }
        let float = number.as_f64()?;
        // 2.0 is accepted as the integer 2
        (float.fract() == 0.0 && float.abs() < i64::MAX as f64).then(|| Value::from(float as i64))
    }

    fn string(&self, value: &Value) -> Option<Value> {
        match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) if self.coerce => Some(Value::String(n.to_string())),
            Value::Bool(b) if self.coerce => Some(Value::String(b.to_string())),
            _ => None,
        }
    }

    /// String-carried formats, normalised on success
    fn textual(&self, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
        let Value::String(text) = value else {
            ctx.report(SCH0203, format!("expected {} string, got {}", self.codec, json_kind(value)));
            return None;
        };
        let normalized = match self.codec {
            BuiltinCodec::Date => normalize_date(text),
            BuiltinCodec::Datetime => normalize_datetime(text),
            BuiltinCodec::Time => normalize_time(text),
            BuiltinCodec::Uuid => is_uuid(text).then(|| text.to_lowercase()),
            BuiltinCodec::Email => matches_pattern(&EMAIL, text).then(|| text.clone()),
            BuiltinCodec::Url => matches_pattern(&URL, text).then(|| text.clone()),
            BuiltinCodec::Base64 => matches_pattern(&BASE64, text).then(|| text.clone()),
            BuiltinCodec::FieldPath => {
                let allow = self.constraints.allow_signs.unwrap_or_default();
                match parse_field_path(text, allow) {
                    Ok(path) => Some(path.to_string()),
                    Err(err) => return report_syntax(ctx, "field path", &err),
                }
            }
            BuiltinCodec::Filter => match parse_filter(text) {
                Ok(expr) => Some(expr.to_string()),
                Err(err) => return report_syntax(ctx, "filter", &err),
            },
            _ => Some(text.clone()),
        };
        let Some(normalized) = normalized else {
            let code = if matches!(self.codec, BuiltinCodec::Date | BuiltinCodec::Datetime | BuiltinCodec::Time) {
                SCH0208
            } else {
                SCH0206
            };
            ctx.report(code, format!("'{text}' is not a valid {}", self.codec));
            return None;
        };
        let output = Value::String(normalized);
        self.constrain(&output, ctx).then_some(output)
    }

    /// Declared length, pattern and range constraints
    fn constrain(&self, value: &Value, ctx: &mut ValidationContext) -> bool {
        let c = &self.constraints;
        let before = ctx.issue_count();
        match value {
            Value::String(s) => {
                let len = s.chars().count();
                if let Some(min) = c.min_length.filter(|min| len < *min) {
                    ctx.report(SCH0205, format!("length {len} is less than {min}"));
                }
                if let Some(max) = c.max_length.filter(|max| len > *max) {
                    ctx.report(SCH0205, format!("length {len} is greater than {max}"));
                }
                if let Some(pattern) = c.pattern.as_ref().filter(|p| !p.is_match(s)) {
                    ctx.report(SCH0206, format!("'{s}' does not match pattern {}", pattern.as_str()));
                }
            }
            Value::Number(n) => {
                let x = n.as_f64().unwrap_or_default();
                if let Some(min) = c.minimum.filter(|min| x < *min) {
                    ctx.report(SCH0204, format!("{n} is less than minimum {min}"));
                }
                if let Some(max) = c.maximum.filter(|max| x > *max) {
                    ctx.report(SCH0204, format!("{n} is greater than maximum {max}"));
                }
            }
            _ => {}
        }
        ctx.issue_count() == before
    }
}

fn report_syntax(ctx: &mut ValidationContext, what: &str, err: &SyntaxError) -> Option<Value> {
    for diagnostic in &err.diagnostics {
        ctx.report(
            diagnostic.code,
            format!("invalid {what} at column {}: {}", diagnostic.column(), diagnostic.message),
        );
    }
    None
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn normalize_date(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn normalize_datetime(text: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn normalize_time(text: &str) -> Option<String> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
        .map(|t| t.format("%H:%M:%S%.f").to_string())
}

fn is_uuid(text: &str) -> bool {
    text.len() == 36
        && text.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

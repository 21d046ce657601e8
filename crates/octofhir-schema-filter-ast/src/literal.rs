//! Literal nodes

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{self, Write};

/// A literal value in a filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Literal {
    Null,
    Boolean(bool),
    /// Arbitrary precision number (`42`, `-1.5`, `2e3`)
    Number(Decimal),
    String(String),
    /// `YYYY-MM-DD`
    Date(NaiveDate),
    /// `hh:mm[:ss[.fff]]`
    Time(NaiveTime),
    /// `YYYY-MM-DDThh:mm[:ss[.fff]][Z|+hh:mm]`
    DateTime(DateTimeLiteral),
}

/// Date-time with an optional UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateTimeLiteral {
    pub value: NaiveDateTime,
    /// Offset east of UTC in minutes, `None` for a local time
    pub offset_minutes: Option<i16>,
}

impl DateTimeLiteral {
    pub const fn new(value: NaiveDateTime, offset_minutes: Option<i16>) -> Self {
        Self {
            value,
            offset_minutes,
        }
    }
}

impl fmt::Display for DateTimeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.format("%Y-%m-%dT%H:%M:%S%.f"))?;
        match self.offset_minutes {
            None => Ok(()),
            Some(0) => f.write_char('Z'),
            Some(offset) => {
                let sign = if offset < 0 { '-' } else { '+' };
                let abs = offset.unsigned_abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
        }
    }
}

impl Literal {
    /// Name of the literal kind as used in diagnostics
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<Decimal> for Literal {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write_quoted(f, s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Single-quoted with backslash escapes
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('\'')?;
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_string_escaping() {
        assert_eq!(Literal::from("O'Brien").to_string(), r"'O\'Brien'");
        assert_eq!(Literal::from("a\\b\n").to_string(), r"'a\\b\n'");
        assert_eq!(Literal::from("say \"hi\"").to_string(), "'say \"hi\"'");
    }

    #[test]
    fn test_number_keeps_scale() {
        let n = Decimal::from_str("1.50").unwrap();
        assert_eq!(Literal::Number(n).to_string(), "1.50");
        assert_eq!(Literal::from(-3i64).to_string(), "-3");
    }

    #[test]
    fn test_temporal_rendering() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Literal::Date(date).to_string(), "2024-02-29");

        let time = NaiveTime::from_hms_milli_opt(8, 5, 0, 250).unwrap();
        assert_eq!(Literal::Time(time).to_string(), "08:05:00.250");

        let dt = date.and_hms_opt(23, 59, 1).unwrap();
        assert_eq!(Literal::DateTime(DateTimeLiteral::new(dt, None)).to_string(), "2024-02-29T23:59:01");
        assert_eq!(Literal::DateTime(DateTimeLiteral::new(dt, Some(0))).to_string(), "2024-02-29T23:59:01Z");
        assert_eq!(
            Literal::DateTime(DateTimeLiteral::new(dt, Some(-330))).to_string(),
            "2024-02-29T23:59:01-05:30"
        );
    }
}

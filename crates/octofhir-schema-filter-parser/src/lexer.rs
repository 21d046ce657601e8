//! Filter tokenizer built from Winnow combinators
//!
//! Each token parser backtracks when the input does not start with its token
//! kind and cuts once the kind is certain (an opening quote, `dddd-`, `@`).
//! Cut errors carry a label the driver turns into a diagnostic before it skips
//! ahead, so one pass reports every lexical error in the text.

use chrono::{NaiveDate, NaiveTime};
use octofhir_schema_diagnostics::{
    Diagnostic, ErrorCode, SCH0001, SCH0005, SCH0006, SCH0007, SCH0008, SCH0013, SCH0015, Span,
    Spanned,
};
use octofhir_schema_filter_ast::{ComparisonOperator, DateTimeLiteral};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use winnow::ModalResult;
use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, cut_err, fail, not, opt, peek, preceded};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

pub type Input<'a> = &'a str;
pub type PResult<T> = ModalResult<T>;

const STRING: &str = "string literal";
const NUMBER: &str = "number";
const TEMPORAL: &str = "date/time literal";
const CONSTANT: &str = "external constant";

/// Reserved words, matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Or,
    Not,
    True,
    False,
    Null,
}

impl Keyword {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    String(String),
    Number(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTimeLiteral),
    Identifier(String),
    Keyword(Keyword),
    Operator(ComparisonOperator),
    ExternalConstant(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{s}'"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Identifier(name) => f.write_str(name),
            Self::Keyword(kw) => f.write_str(kw.as_str()),
            Self::Operator(op) => f.write_str(op.symbol()),
            Self::ExternalConstant(name) => write!(f, "@{name}"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::Comma => f.write_str(","),
            Self::Dot => f.write_str("."),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

/// Split filter text into tokens, terminated by [`Token::Eof`]
///
/// All lexical errors are collected; any error fails the whole call.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Diagnostic>> {
    let mut input: Input<'_> = source;
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    loop {
        let _ = ws(&mut input);
        let start = source.len() - input.len();
        if input.is_empty() {
            tokens.push(Spanned::new(Token::Eof, Span::point(start)));
            break;
        }

        let checkpoint = input;
        match token(&mut input) {
            Ok(tok) => {
                let end = source.len() - input.len();
                tokens.push(Spanned::new(tok, Span::new(start, end)));
            }
            Err(err) => {
                input = checkpoint;
                let (code, message, skip) = describe_failure(input, &err);
                diagnostics.push(
                    Diagnostic::error(code, message).with_span(Span::new(start, start + skip), source),
                );
                input = &input[skip..];
            }
        }
    }

    if diagnostics.is_empty() {
        Ok(tokens)
    } else {
        Err(diagnostics)
    }
}

/// Error code, message and the number of bytes to skip before lexing resumes
fn describe_failure(rest: &str, err: &ErrMode<ContextError>) -> (ErrorCode, String, usize) {
    let first = rest.chars().next().unwrap_or_default();
    match failure_label(err) {
        Some(STRING) => match string_extent(rest) {
            Some(len) => (
                SCH0005,
                format!("invalid escape sequence in {}", &rest[..len]),
                len,
            ),
            None => (SCH0006, "unterminated string literal".to_string(), rest.len()),
        },
        Some(TEMPORAL) => {
            let len = literal_run(rest);
            (SCH0008, format!("invalid date/time literal '{}'", &rest[..len]), len)
        }
        Some(NUMBER) => {
            let len = literal_run(rest);
            (SCH0007, format!("invalid number '{}'", &rest[..len]), len)
        }
        Some(_) => (SCH0013, "expected identifier after '@'".to_string(), 1),
        None if first == '!' => {
            let len = 1 + literal_run(&rest[1..]);
            (SCH0015, format!("invalid operator '{}'", &rest[..len]), len)
        }
        None => (
            SCH0001,
            format!("unexpected character '{first}'"),
            first.len_utf8().max(1),
        ),
    }
}

fn failure_label(err: &ErrMode<ContextError>) -> Option<&'static str> {
    match err {
        ErrMode::Cut(e) => e.context().find_map(|c| match c {
            StrContext::Label(label) => Some(*label),
            _ => None,
        }),
        _ => None,
    }
}

/// Byte length of a quoted string including both quotes
fn string_extent(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();
    let (_, quote) = chars.next()?;
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(i + c.len_utf8());
        }
    }
    None
}

/// Length of the run of characters that can belong to a number or date/time
fn literal_run(rest: &str) -> usize {
    rest.char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '$' | ':' | '.' | '+' | '-')))
        .map_or(rest.len(), |(i, _)| i)
        .max(rest.chars().next().map_or(0, char::len_utf8))
}

fn ws(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

fn token(input: &mut Input<'_>) -> PResult<Token> {
    alt((
        string_literal.map(Token::String),
        temporal,
        number.map(Token::Number),
        external_constant.map(Token::ExternalConstant),
        operator.map(Token::Operator),
        punctuation,
        word.map(word_token),
    ))
    .parse_next(input)
}

/// `[A-Za-z_$][A-Za-z0-9_$]*`
pub fn word<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .parse_next(input)
}

fn word_token(word: &str) -> Token {
    match word.to_ascii_lowercase().as_str() {
        "and" => Token::Keyword(Keyword::And),
        "or" => Token::Keyword(Keyword::Or),
        "not" => Token::Keyword(Keyword::Not),
        "true" => Token::Keyword(Keyword::True),
        "false" => Token::Keyword(Keyword::False),
        "null" => Token::Keyword(Keyword::Null),
        "in" => Token::Operator(ComparisonOperator::In),
        "like" => Token::Operator(ComparisonOperator::Like),
        _ => Token::Identifier(word.to_string()),
    }
}

fn punctuation(input: &mut Input<'_>) -> PResult<Token> {
    alt((
        '('.value(Token::LParen),
        ')'.value(Token::RParen),
        '['.value(Token::LBracket),
        ']'.value(Token::RBracket),
        ','.value(Token::Comma),
        '.'.value(Token::Dot),
    ))
    .parse_next(input)
}

fn operator(input: &mut Input<'_>) -> PResult<ComparisonOperator> {
    alt((
        "!=".value(ComparisonOperator::NotEqual),
        ">=".value(ComparisonOperator::GreaterOrEqual),
        "<=".value(ComparisonOperator::LessOrEqual),
        ">".value(ComparisonOperator::Greater),
        "<".value(ComparisonOperator::Less),
        "=".value(ComparisonOperator::Equal),
        preceded('!', word).verify_map(|w: &str| match w.to_ascii_lowercase().as_str() {
            "in" => Some(ComparisonOperator::NotIn),
            "like" => Some(ComparisonOperator::NotLike),
            _ => None,
        }),
    ))
    .parse_next(input)
}

fn external_constant(input: &mut Input<'_>) -> PResult<String> {
    preceded('@', cut_err(word).context(StrContext::Label(CONSTANT)))
        .map(str::to_string)
        .parse_next(input)
}

// Strings

fn string_literal(input: &mut Input<'_>) -> PResult<String> {
    let quote: char = one_of(['\'', '"']).parse_next(input)?;
    cut_err(|input: &mut Input<'_>| string_body(input, quote))
        .context(StrContext::Label(STRING))
        .parse_next(input)
}

fn string_body(input: &mut Input<'_>, quote: char) -> PResult<String> {
    let mut out = String::new();
    loop {
        let chunk: &str = take_till(0.., (quote, '\\')).parse_next(input)?;
        out.push_str(chunk);
        let c: char = any.parse_next(input)?;
        if c != '\\' {
            return Ok(out);
        }
        out.push(escape(input)?);
    }
}

fn escape(input: &mut Input<'_>) -> PResult<char> {
    let c: char = any.parse_next(input)?;
    match c {
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        't' => Ok('\t'),
        'u' => take_while(4, ('0'..='9', 'a'..='f', 'A'..='F'))
            .verify_map(|hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32))
            .parse_next(input),
        other => Ok(other),
    }
}

// Numbers

fn number(input: &mut Input<'_>) -> PResult<Decimal> {
    let text: &str = (
        opt('-'),
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)?;
    cut_err(boundary.verify_map(|_| parse_decimal(text)))
        .context(StrContext::Label(NUMBER))
        .parse_next(input)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A literal must not run into identifier-like characters
fn boundary(input: &mut Input<'_>) -> PResult<()> {
    not(one_of(|c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '$' | ':' | '.' | '-')
    }))
    .parse_next(input)
}

// Dates and times

fn digits<'a>(count: usize) -> impl Parser<Input<'a>, &'a str, ErrMode<ContextError>> {
    take_while(count, |c: char| c.is_ascii_digit())
}

fn temporal(input: &mut Input<'_>) -> PResult<Token> {
    if opt(peek((digits(4), '-'))).parse_next(input)?.is_some() {
        return cut_err(date_or_datetime)
            .context(StrContext::Label(TEMPORAL))
            .parse_next(input);
    }
    if opt(peek((digits(2), ':'))).parse_next(input)?.is_some() {
        return cut_err((time_of_day, boundary).map(|(t, _)| Token::Time(t)))
            .context(StrContext::Label(TEMPORAL))
            .parse_next(input);
    }
    fail.parse_next(input)
}

fn date_or_datetime(input: &mut Input<'_>) -> PResult<Token> {
    let date = (digits(4), '-', digits(2), '-', digits(2))
        .take()
        .verify_map(|text: &str| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
        .parse_next(input)?;

    if opt('T').parse_next(input)?.is_none() {
        boundary(input)?;
        return Ok(Token::Date(date));
    }

    let time = time_of_day(input)?;
    let offset = opt(utc_offset).parse_next(input)?;
    boundary(input)?;
    Ok(Token::DateTime(DateTimeLiteral::new(date.and_time(time), offset)))
}

/// `hh:mm[:ss[.f{1,9}]]`
fn time_of_day(input: &mut Input<'_>) -> PResult<NaiveTime> {
    (
        digits(2),
        ':',
        digits(2),
        opt((':', digits(2), opt(('.', take_while(1..=9, |c: char| c.is_ascii_digit()))))),
    )
        .take()
        .verify_map(|text: &str| {
            let format = if text.len() == 5 { "%H:%M" } else { "%H:%M:%S%.f" };
            NaiveTime::parse_from_str(text, format).ok()
        })
        .parse_next(input)
}

/// `Z` or `+hh:mm`/`-hh:mm`, in minutes east of UTC
fn utc_offset(input: &mut Input<'_>) -> PResult<i16> {
    alt((
        'Z'.value(0),
        (one_of(['+', '-']), digits(2), ':', digits(2)).verify_map(
            |(sign, hours, _, minutes): (char, &str, char, &str)| {
                let hours: i16 = hours.parse().ok()?;
                let minutes: i16 = minutes.parse().ok()?;
                if hours > 23 || minutes > 59 {
                    return None;
                }
                let total = hours * 60 + minutes;
                Some(if sign == '-' { -total } else { total })
            },
        ),
    ))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap_or_else(|d| panic!("failed to tokenize {source:?}: {d:?}"))
            .into_iter()
            .map(|t| t.inner)
            .collect()
    }

    fn errors(source: &str) -> Vec<(ErrorCode, usize, usize)> {
        tokenize(source)
            .expect_err("expected lexical errors")
            .into_iter()
            .map(|d| (d.code, d.line(), d.column()))
            .collect()
    }

    #[test]
    fn test_operators_and_words() {
        assert_eq!(
            kinds("a!=1 AND b !like 'x' or c IN [1,2]"),
            vec![
                Token::Identifier("a".into()),
                Token::Operator(ComparisonOperator::NotEqual),
                Token::Number(Decimal::ONE),
                Token::Keyword(Keyword::And),
                Token::Identifier("b".into()),
                Token::Operator(ComparisonOperator::NotLike),
                Token::String("x".into()),
                Token::Keyword(Keyword::Or),
                Token::Identifier("c".into()),
                Token::Operator(ComparisonOperator::In),
                Token::LBracket,
                Token::Number(Decimal::ONE),
                Token::Comma,
                Token::Number(Decimal::TWO),
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'O\'Brien' "say \"hi\"" 'tab\there' 'é\q'"#),
            vec![
                Token::String("O'Brien".into()),
                Token::String("say \"hi\"".into()),
                Token::String("tab\there".into()),
                Token::String("éq".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("-1.50 2e3 0"),
            vec![
                Token::Number(Decimal::from_str("-1.50").unwrap()),
                Token::Number(Decimal::from(2000)),
                Token::Number(Decimal::ZERO),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_temporal_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            kinds("2024-01-31 10:30 2024-01-31T10:30:15.5+02:00 2024-01-31T00:00Z"),
            vec![
                Token::Date(date),
                Token::Time(NaiveTime::from_hms_opt(10, 30, 0).unwrap()),
                Token::DateTime(DateTimeLiteral::new(
                    date.and_hms_milli_opt(10, 30, 15, 500).unwrap(),
                    Some(120)
                )),
                Token::DateTime(DateTimeLiteral::new(date.and_hms_opt(0, 0, 0).unwrap(), Some(0))),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_external_constant() {
        assert_eq!(
            kinds("owner = @currentUser"),
            vec![
                Token::Identifier("owner".into()),
                Token::Operator(ComparisonOperator::Equal),
                Token::ExternalConstant("currentUser".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_collects_every_lexical_error() {
        assert_eq!(
            errors("a = 2024-13-01 and b = 12abc and c # 1"),
            vec![(SCH0008, 1, 5), (SCH0007, 1, 24), (SCH0001, 1, 36)]
        );
    }

    #[test]
    fn test_unterminated_and_bad_escape() {
        assert_eq!(errors("name = 'abc"), vec![(SCH0006, 1, 8)]);
        assert_eq!(errors(r"name = '\u12' and x = 1"), vec![(SCH0005, 1, 8)]);
    }

    #[test]
    fn test_invalid_operator_and_constant() {
        assert_eq!(errors("a !~ 1"), vec![(SCH0015, 1, 3)]);
        assert_eq!(errors("a = @ 1"), vec![(SCH0013, 1, 5)]);
    }

    #[test]
    fn test_token_spans() {
        let tokens = tokenize("ab  >= 'x'").unwrap();
        let spans: Vec<Span> = tokens.iter().map(|t| t.span).collect();
        assert_eq!(
            spans,
            vec![Span::new(0, 2), Span::new(4, 6), Span::new(7, 10), Span::point(10)]
        );
    }
}

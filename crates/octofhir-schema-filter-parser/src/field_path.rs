//! Field path parser (`address.city`, `-createdAt`)

use crate::lexer::{Input, PResult, word};
use octofhir_schema_diagnostics::{Diagnostic, SCH0001, SCH0013, SCH0016, Span, SyntaxError};
use octofhir_schema_filter_ast::{AllowSigns, FieldPath, FieldPathSegment, Sign};
use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::one_of;

/// Parse a dotted field path, accepting `+`/`-` segment prefixes where the policy allows
pub fn parse_field_path(text: &str, allow_signs: AllowSigns) -> Result<FieldPath, SyntaxError> {
    let mut input: Input<'_> = text;
    let mut segments = Vec::new();
    let offset = |rest: &str| text.len() - rest.len();
    let fail = |code, message: String, span: Span| {
        SyntaxError::new(text, vec![Diagnostic::error(code, message).with_span(span, text)])
    };

    loop {
        let sign_at = offset(input);
        let sign = sign(&mut input).unwrap_or_default();
        if let Some(sign) = sign {
            if !allow_signs.permits(segments.len()) {
                let message = match allow_signs {
                    AllowSigns::First => format!(
                        "sign '{}' is only allowed on the first path segment",
                        sign.as_char()
                    ),
                    _ => format!("sign '{}' is not allowed in this field path", sign.as_char()),
                };
                return Err(fail(SCH0016, message, Span::new(sign_at, sign_at + 1)));
            }
        }

        let name_at = offset(input);
        let Ok(name) = word(&mut input) else {
            return Err(fail(SCH0013, "expected field name".to_string(), Span::point(name_at)));
        };
        segments.push(FieldPathSegment {
            name: name.to_string(),
            sign,
        });

        if input.is_empty() {
            break;
        }
        let dot_at = offset(input);
        if dot(&mut input).is_err() {
            let unexpected = input.chars().next().unwrap_or_default();
            return Err(fail(
                SCH0001,
                format!("unexpected character '{unexpected}' in field path"),
                Span::new(dot_at, dot_at + unexpected.len_utf8()),
            ));
        }
    }

    Ok(FieldPath::new(segments))
}

fn sign(input: &mut Input<'_>) -> PResult<Option<Sign>> {
    opt(one_of(['+', '-']))
        .map(|c: Option<char>| c.and_then(Sign::from_char))
        .parse_next(input)
}

fn dot(input: &mut Input<'_>) -> PResult<char> {
    '.'.parse_next(input)
}

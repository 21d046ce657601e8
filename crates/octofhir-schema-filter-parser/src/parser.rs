//! Recursive-descent parser over lexer tokens

use crate::lexer::{Keyword, Token, tokenize};
use octofhir_schema_diagnostics::{
    Diagnostic, ErrorCode, SCH0001, SCH0002, SCH0010, SCH0012, SCH0013, Spanned, SyntaxError,
};
use octofhir_schema_filter_ast::{Expression, FunctionCall, Literal, LogicalOperator, QualifiedIdentifier};

type ParseResult<T> = std::result::Result<T, Diagnostic>;

/// Parse filter text into an expression tree
///
/// Lexical errors are all reported together; parsing stops at the first
/// syntax error. No partial tree is ever returned.
pub fn parse_filter(text: &str) -> Result<Expression, SyntaxError> {
    log::trace!("parsing filter {text:?}");
    let tokens = tokenize(text).map_err(|diagnostics| SyntaxError::new(text, diagnostics))?;
    FilterParser::new(text, tokens)
        .parse()
        .map_err(|diagnostic| SyntaxError::new(text, vec![diagnostic]))
}

struct FilterParser<'s> {
    source: &'s str,
    /// Always terminated by `Token::Eof`
    tokens: Vec<Spanned<Token>>,
    pos: usize,
}

impl<'s> FilterParser<'s> {
    fn new(source: &'s str, tokens: Vec<Spanned<Token>>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    fn parse(mut self) -> ParseResult<Expression> {
        let expr = self.or_expression()?;
        let next = self.peek();
        if next.inner != Token::Eof {
            return Err(self.error(next, SCH0001, format!("unexpected token '{}'", next.inner)));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Spanned<Token> {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn at(&self, token: &Token) -> bool {
        &self.peek().inner == token
    }

    fn bump(&mut self) -> Spanned<Token> {
        let token = self.peek().clone();
        if token.inner != Token::Eof {
            self.pos += 1;
        }
        token
    }

    /// Consume the token if it matches
    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, token: &Spanned<Token>, code: ErrorCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(code, message).with_span(token.span, self.source)
    }

    /// Require a closing delimiter for the bracket opened at `open`
    fn expect_closing(&mut self, closing: Token, open: &Spanned<Token>) -> ParseResult<()> {
        if self.eat(&closing) {
            return Ok(());
        }
        let found = self.peek();
        let message = if found.inner == Token::Eof {
            format!("missing closing '{}' for '{}' at column {}", closing, open.inner, column_of(self.source, open))
        } else {
            format!("expected '{}', found '{}'", closing, found.inner)
        };
        Err(self.error(found, SCH0010, message))
    }

    /// orExpr := andExpr ('or' andExpr)*
    fn or_expression(&mut self) -> ParseResult<Expression> {
        let mut items = vec![self.and_expression()?];
        while self.eat(&Token::Keyword(Keyword::Or)) {
            items.push(self.and_expression()?);
        }
        Ok(collapse(LogicalOperator::Or, items))
    }

    /// andExpr := notExpr ('and' notExpr)*
    fn and_expression(&mut self) -> ParseResult<Expression> {
        let mut items = vec![self.not_expression()?];
        while self.eat(&Token::Keyword(Keyword::And)) {
            items.push(self.not_expression()?);
        }
        Ok(collapse(LogicalOperator::And, items))
    }

    /// notExpr := ['not'] comparison
    fn not_expression(&mut self) -> ParseResult<Expression> {
        if self.eat(&Token::Keyword(Keyword::Not)) {
            return Ok(Expression::not(self.comparison()?));
        }
        self.comparison()
    }

    /// comparison := term (compOp term)?
    fn comparison(&mut self) -> ParseResult<Expression> {
        let left = self.term()?;
        if let Token::Operator(op) = self.peek().inner {
            self.bump();
            let right = self.term()?;
            return Ok(Expression::comparison(left, op, right));
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult<Expression> {
        let token = self.bump();
        let expr = match token.inner {
            Token::String(ref s) => Expression::Literal(Literal::String(s.clone())),
            Token::Number(n) => Expression::Literal(Literal::Number(n)),
            Token::Date(d) => Expression::Literal(Literal::Date(d)),
            Token::Time(t) => Expression::Literal(Literal::Time(t)),
            Token::DateTime(dt) => Expression::Literal(Literal::DateTime(dt)),
            Token::Keyword(Keyword::True) => Expression::Literal(Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Expression::Literal(Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Expression::Literal(Literal::Null),
            Token::ExternalConstant(ref name) => Expression::ExternalConstant(name.clone()),
            Token::LParen => {
                let inner = self.or_expression()?;
                self.expect_closing(Token::RParen, &token)?;
                Expression::group(inner)
            }
            Token::LBracket => Expression::Array(self.array_items(&token)?),
            Token::Identifier(ref name) => self.path_or_call(name.clone())?,
            Token::Eof => {
                return Err(self.error(&token, SCH0002, "unexpected end of input, expected expression"));
            }
            ref other => {
                return Err(self.error(&token, SCH0012, format!("expected expression, found '{other}'")));
            }
        };
        Ok(expr)
    }

    /// Items of `[a, b]` after the opening bracket
    fn array_items(&mut self, open: &Spanned<Token>) -> ParseResult<Vec<Expression>> {
        let mut items = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(items);
        }
        loop {
            items.push(self.term()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect_closing(Token::RBracket, open)?;
        Ok(items)
    }

    /// `a.b.c` or `a.b(args)`
    fn path_or_call(&mut self, first: String) -> ParseResult<Expression> {
        let mut segments = vec![first];
        while self.eat(&Token::Dot) {
            let token = self.bump();
            let Token::Identifier(name) = &token.inner else {
                let message = format!("expected identifier after '.', found '{}'", token.inner);
                return Err(self.error(&token, SCH0013, message));
            };
            segments.push(name.clone());
        }
        let name = QualifiedIdentifier::new(segments);

        if !self.at(&Token::LParen) {
            return Ok(Expression::Identifier(name));
        }
        let open = self.bump();
        let mut args = Vec::new();
        if !self.at(&Token::RParen) {
            loop {
                args.push(self.or_expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect_closing(Token::RParen, &open)?;
        Ok(Expression::FunctionCall(FunctionCall { name, args }))
    }
}

fn collapse(op: LogicalOperator, mut items: Vec<Expression>) -> Expression {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Expression::logical(op, items)
    }
}

fn column_of(source: &str, token: &Spanned<Token>) -> usize {
    octofhir_schema_diagnostics::offset_to_line_col(source, token.span.start).1
}

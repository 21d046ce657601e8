//! Filter expression parser using Winnow
//!
//! Text is first split into tokens by a Winnow lexer that reports every lexical
//! error it meets, then a recursive-descent parser builds the
//! [`Expression`](octofhir_schema_filter_ast::Expression) tree:
//!
//! ```text
//! expr        := orExpr
//! orExpr      := andExpr ('or' andExpr)*
//! andExpr     := notExpr ('and' notExpr)*
//! notExpr     := ['not'] comparison
//! comparison  := term (compOp term)?
//! term        := literal | fieldPath | functionCall | '(' expr ')'
//! ```

mod field_path;
mod lexer;
mod parser;

pub use field_path::parse_field_path;
pub use lexer::{Keyword, Token, tokenize};
pub use parser::parse_filter;

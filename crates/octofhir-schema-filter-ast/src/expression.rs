//! Expression nodes

use crate::{ComparisonOperator, Literal, LogicalOperator, QualifiedIdentifier};
use serde::Serialize;
use std::fmt;

/// A parsed filter expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    /// `left op right`
    Comparison(ComparisonExpression),
    /// Flattened chain of `and` or `or` operands
    Logical(LogicalExpression),
    /// `not target`
    Negative(NegativeExpression),
    /// Explicit grouping, kept so the tree renders back to the same text
    Parentheses(Box<Expression>),
    /// `[a, b, c]`
    Array(Vec<Expression>),
    /// `name(arg, ...)`
    FunctionCall(FunctionCall),
    /// Field reference
    Identifier(QualifiedIdentifier),
    /// `@name`, bound by the caller at execution time
    ExternalConstant(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonExpression {
    pub left: Box<Expression>,
    pub op: ComparisonOperator,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalExpression {
    pub op: LogicalOperator,
    pub items: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeExpression {
    pub target: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: QualifiedIdentifier,
    pub args: Vec<Expression>,
}

impl Expression {
    pub fn comparison(left: Expression, op: ComparisonOperator, right: Expression) -> Self {
        Self::Comparison(ComparisonExpression {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// Build a logical node, merging operands that use the same connective
    pub fn logical(op: LogicalOperator, items: impl IntoIterator<Item = Expression>) -> Self {
        let mut flat = Vec::new();
        for item in items {
            match item {
                Self::Logical(inner) if inner.op == op => flat.extend(inner.items),
                other => flat.push(other),
            }
        }
        Self::Logical(LogicalExpression { op, items: flat })
    }

    pub fn and(items: impl IntoIterator<Item = Expression>) -> Self {
        Self::logical(LogicalOperator::And, items)
    }

    pub fn or(items: impl IntoIterator<Item = Expression>) -> Self {
        Self::logical(LogicalOperator::Or, items)
    }

    pub fn not(target: Expression) -> Self {
        Self::Negative(NegativeExpression {
            target: Box::new(target),
        })
    }

    pub fn group(inner: Expression) -> Self {
        Self::Parentheses(Box::new(inner))
    }

    pub fn identifier(path: &str) -> Self {
        Self::Identifier(QualifiedIdentifier::parse_dotted(path))
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::Literal(value.into())
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Self {
        Self::FunctionCall(FunctionCall {
            name: QualifiedIdentifier::parse_dotted(name),
            args,
        })
    }

    /// The expression with any number of wrapping parentheses removed
    pub fn unwrap_parentheses(&self) -> &Expression {
        let mut current = self;
        while let Self::Parentheses(inner) = current {
            current = inner;
        }
        current
    }

    pub fn as_comparison(&self) -> Option<&ComparisonExpression> {
        match self {
            Self::Comparison(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(c) => write!(f, "{} {} {}", c.left, c.op, c.right),
            Self::Logical(l) => {
                for (i, item) in l.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", l.op)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Negative(n) => write!(f, "not {}", n.target),
            Self::Parentheses(inner) => write!(f, "({inner})"),
            Self::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Self::FunctionCall(call) => {
                write!(f, "{}(", call.name)?;
                write_list(f, &call.args)?;
                f.write_str(")")
            }
            Self::Identifier(id) => write!(f, "{id}"),
            Self::ExternalConstant(name) => write!(f, "@{name}"),
            Self::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

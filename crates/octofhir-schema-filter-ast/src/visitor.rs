//! Visitor contract for translating filter trees

use crate::{
    ComparisonExpression, Expression, FunctionCall, Literal, LogicalExpression,
    NegativeExpression, QualifiedIdentifier,
};

/// One method per node kind; implementors decide how children are visited
pub trait ExpressionVisitor {
    type Output;

    fn visit_comparison(&mut self, expr: &ComparisonExpression) -> Self::Output;
    fn visit_logical(&mut self, expr: &LogicalExpression) -> Self::Output;
    fn visit_negative(&mut self, expr: &NegativeExpression) -> Self::Output;
    fn visit_array(&mut self, items: &[Expression]) -> Self::Output;
    fn visit_function_call(&mut self, call: &FunctionCall) -> Self::Output;
    fn visit_identifier(&mut self, ident: &QualifiedIdentifier) -> Self::Output;
    fn visit_external_constant(&mut self, name: &str) -> Self::Output;
    fn visit_literal(&mut self, literal: &Literal) -> Self::Output;

    /// Grouping is transparent unless overridden
    fn visit_parentheses(&mut self, inner: &Expression) -> Self::Output {
        inner.accept(self)
    }
}

impl Expression {
    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Comparison(c) => visitor.visit_comparison(c),
            Self::Logical(l) => visitor.visit_logical(l),
            Self::Negative(n) => visitor.visit_negative(n),
            Self::Parentheses(inner) => visitor.visit_parentheses(inner),
            Self::Array(items) => visitor.visit_array(items),
            Self::FunctionCall(call) => visitor.visit_function_call(call),
            Self::Identifier(id) => visitor.visit_identifier(id),
            Self::ExternalConstant(name) => visitor.visit_external_constant(name),
            Self::Literal(lit) => visitor.visit_literal(lit),
        }
    }

    /// Every field path the expression reads, in order of first appearance
    pub fn field_references(&self) -> Vec<QualifiedIdentifier> {
        let mut collector = FieldCollector::default();
        self.accept(&mut collector);
        collector.fields
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: Vec<QualifiedIdentifier>,
}

impl FieldCollector {
    fn visit_all(&mut self, items: &[Expression]) {
        for item in items {
            item.accept(self);
        }
    }
}

impl ExpressionVisitor for FieldCollector {
    type Output = ();

    fn visit_comparison(&mut self, expr: &ComparisonExpression) {
        expr.left.accept(self);
        expr.right.accept(self);
    }

    fn visit_logical(&mut self, expr: &LogicalExpression) {
        self.visit_all(&expr.items);
    }

    fn visit_negative(&mut self, expr: &NegativeExpression) {
        expr.target.accept(self);
    }

    fn visit_array(&mut self, items: &[Expression]) {
        self.visit_all(items);
    }

    fn visit_function_call(&mut self, call: &FunctionCall) {
        self.visit_all(&call.args);
    }

    fn visit_identifier(&mut self, ident: &QualifiedIdentifier) {
        if !self.fields.contains(ident) {
            self.fields.push(ident.clone());
        }
    }

    fn visit_external_constant(&mut self, _name: &str) {}

    fn visit_literal(&mut self, _literal: &Literal) {}
}

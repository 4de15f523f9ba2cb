//! IDE lookup tables.
//!
//! Walks a function body's expressions and records `(location -> type)` and
//! `(location -> definition location)` tables. Synthetic and wildcard
//! locations are skipped; hover queries pick the innermost covering range.

use pyrite_ast::{Expression, Node, Statement};
use pyrite_common::{Location, Position};
use pyrite_types::Type;

pub struct LookupTable {
    annotations: Vec<(Location, Type)>,
    definitions: Vec<(Location, Location)>,
}

impl LookupTable {
    /// Build tables over `statements`. `annotate` supplies the resolved type
    /// of an expression, `definition` its declaration site; either may
    /// decline.
    pub fn build(
        statements: &[Node<Statement>],
        annotate: &dyn Fn(&Node<Expression>) -> Option<Type>,
        definition: &dyn Fn(&Node<Expression>) -> Option<Location>,
    ) -> Self {
        let mut table = LookupTable {
            annotations: Vec::new(),
            definitions: Vec::new(),
        };
        for statement in statements {
            table.walk_statement(statement, annotate, definition);
        }
        table.annotations.sort_by_key(|(location, _)| *location);
        table.definitions.sort_by_key(|(location, _)| *location);
        table
    }

    /// The type at `position`, preferring the innermost covering expression.
    pub fn annotation_at(&self, position: Position) -> Option<&Type> {
        self.annotations
            .iter()
            .filter(|(location, _)| location.contains(position))
            .min_by_key(|(location, _)| location.width())
            .map(|(_, annotation)| annotation)
    }

    pub fn definition_at(&self, position: Position) -> Option<Location> {
        self.definitions
            .iter()
            .filter(|(location, _)| location.contains(position))
            .min_by_key(|(location, _)| location.width())
            .map(|(_, definition)| *definition)
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    fn record(
        &mut self,
        expression: &Node<Expression>,
        annotate: &dyn Fn(&Node<Expression>) -> Option<Type>,
        definition: &dyn Fn(&Node<Expression>) -> Option<Location>,
    ) {
        // Fabricated nodes have no stable position to key on.
        if expression.location.is_synthetic() || expression.location.is_any() {
            return;
        }
        if let Some(annotation) = annotate(expression) {
            self.annotations.push((expression.location, annotation));
        }
        if let Some(target) = definition(expression) {
            if !target.is_synthetic() {
                self.definitions.push((expression.location, target));
            }
        }
    }

    fn walk_statement(
        &mut self,
        statement: &Node<Statement>,
        annotate: &dyn Fn(&Node<Expression>) -> Option<Type>,
        definition: &dyn Fn(&Node<Expression>) -> Option<Location>,
    ) {
        match &statement.value {
            Statement::Assign(assign) => {
                self.walk_expression(&assign.target, annotate, definition);
                if let Some(annotation) = &assign.annotation {
                    self.walk_expression(annotation, annotate, definition);
                }
                if let Some(value) = &assign.value {
                    self.walk_expression(value, annotate, definition);
                }
            }
            Statement::Expression(expression) => {
                self.walk_expression(expression, annotate, definition)
            }
            Statement::Return(ret) => {
                if let Some(expression) = &ret.expression {
                    self.walk_expression(expression, annotate, definition);
                }
            }
            Statement::Raise(raise) => {
                if let Some(expression) = &raise.expression {
                    self.walk_expression(expression, annotate, definition);
                }
            }
            Statement::If { test, body, orelse } => {
                self.walk_expression(test, annotate, definition);
                for statement in body.iter().chain(orelse) {
                    self.walk_statement(statement, annotate, definition);
                }
            }
            Statement::Define(define) => {
                for statement in &define.body {
                    self.walk_statement(statement, annotate, definition);
                }
            }
            Statement::Class(class) => {
                for statement in &class.body {
                    self.walk_statement(statement, annotate, definition);
                }
            }
            Statement::Import(_) | Statement::Pass => {}
        }
    }

    fn walk_expression(
        &mut self,
        expression: &Node<Expression>,
        annotate: &dyn Fn(&Node<Expression>) -> Option<Type>,
        definition: &dyn Fn(&Node<Expression>) -> Option<Location>,
    ) {
        self.record(expression, annotate, definition);
        match &expression.value {
            Expression::Name(pyrite_ast::Name::Attribute { base, .. }) => {
                self.walk_expression(base, annotate, definition);
            }
            Expression::Call(call) => {
                self.walk_expression(&call.callee, annotate, definition);
                for argument in &call.arguments {
                    self.walk_expression(&argument.value, annotate, definition);
                }
            }
            Expression::Subscript(subscript) => {
                self.walk_expression(&subscript.base, annotate, definition);
                self.walk_expression(&subscript.index, annotate, definition);
            }
            Expression::Lambda(lambda) => {
                self.walk_expression(&lambda.body, annotate, definition);
            }
            Expression::Starred(starred) => {
                self.walk_expression(&starred.value, annotate, definition);
            }
            Expression::Tuple(entries)
            | Expression::List(entries)
            | Expression::Set(entries) => {
                for entry in entries {
                    self.walk_expression(entry, annotate, definition);
                }
            }
            Expression::Dictionary(dictionary) => {
                for (key, value) in &dictionary.entries {
                    self.walk_expression(key, annotate, definition);
                    self.walk_expression(value, annotate, definition);
                }
                for keyword in &dictionary.keywords {
                    self.walk_expression(keyword, annotate, definition);
                }
            }
            Expression::BooleanOperation { left, right, .. }
            | Expression::Comparison { left, right, .. } => {
                self.walk_expression(left, annotate, definition);
                self.walk_expression(right, annotate, definition);
            }
            Expression::Await(inner) => self.walk_expression(inner, annotate, definition),
            _ => {}
        }
    }
}

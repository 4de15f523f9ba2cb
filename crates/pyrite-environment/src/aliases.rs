//! Layers 4 and 5: alias resolution and empty-stub detection.

use crate::annotation_parser::{self, Alias, AnnotationContext};
use crate::ast_environment::AstEnvironment;
use crate::globals::{UnannotatedGlobal, UnannotatedGlobalEnvironment};
use crate::table::EnvironmentTable;
use pyrite_ast::{Expression, Node, Statement};
use pyrite_common::Reference;
use pyrite_types::{Type, Variable};
use rustc_hash::FxHashSet;

/// Layer 4: `X = Y` and `X: TypeAlias = Y` declarations, plus declared type
/// variables, resolved to their targets.
pub struct AliasEnvironment {
    table: EnvironmentTable<Reference, Option<Alias>, Reference>,
}

impl AliasEnvironment {
    pub fn new() -> Self {
        Self {
            table: EnvironmentTable::new(),
        }
    }

    pub fn alias(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<Alias> {
        let mut visited = FxHashSet::default();
        self.alias_with_visited(ast, globals, name, trigger, &mut visited)
    }

    fn alias_with_visited(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        name: &Reference,
        trigger: Option<&Reference>,
        visited: &mut FxHashSet<Reference>,
    ) -> Option<Alias> {
        if !visited.insert(name.clone()) {
            // Cyclic alias chain.
            return None;
        }
        self.table.get_or_produce(name, trigger, || {
            let global = globals.global(ast, name, Some(name))?;
            match global {
                UnannotatedGlobal::SimpleAssign {
                    annotation,
                    value: Some(value),
                    ..
                } => {
                    let is_alias_declaration = annotation
                        .as_ref()
                        .and_then(|annotation| annotation.value.as_reference())
                        .map(|reference| {
                            let rendered = reference.to_string();
                            rendered == "typing_extensions.TypeAlias"
                                || rendered == "typing.TypeAlias"
                                || rendered == "TypeAlias"
                        })
                        .unwrap_or(annotation.is_none());
                    if !is_alias_declaration {
                        return None;
                    }
                    alias_of_value(ast, globals, &value)
                }
                UnannotatedGlobal::Imported { original, .. } => {
                    self.alias_with_visited(ast, globals, &original, Some(name), visited)
                }
                _ => None,
            }
        })
    }

    pub fn invalidate(&self, triggers: &[Reference]) -> Vec<Reference> {
        let affected: Vec<Reference> = self
            .table
            .keys()
            .into_iter()
            .filter(|key| triggers.contains(key))
            .collect();
        let mut downstream = self.table.invalidate(affected.iter());
        downstream.extend(affected);
        downstream
    }
}

impl Default for AliasEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

fn alias_of_value(
    ast: &AstEnvironment<'_>,
    globals: &UnannotatedGlobalEnvironment,
    value: &Node<Expression>,
) -> Option<Alias> {
    let qualify = |reference: &Reference| {
        globals
            .class_summary(ast, reference, None)
            .map(|summary| pyrite_common::intern(&summary.qualified_name.to_string()))
    };
    let resolve_alias = |_: &Reference| None;
    let context = AnnotationContext {
        resolve_alias: &resolve_alias,
        qualify: &qualify,
    };

    // `T = TypeVar("T", ...)` declares a variable, not a type alias.
    if let Expression::Call(call) = &value.value {
        if let Some(variable) = annotation_parser::parse_type_variable(call, &context) {
            return Some(Alias::VariableAlias(Variable::Unary(variable)));
        }
        return None;
    }
    match &value.value {
        Expression::Name(_) | Expression::Subscript(_) | Expression::None => {
            let parsed = annotation_parser::parse_annotation(value, &context);
            if parsed == Type::Top {
                return None;
            }
            Some(Alias::TypeAlias(parsed))
        }
        _ => None,
    }
}

/// Layer 5: modules whose whole body is `...` placeholders. Their members
/// are implicitly `Any`.
pub struct EmptyStubEnvironment {
    table: EnvironmentTable<Reference, bool, Reference>,
}

impl EmptyStubEnvironment {
    pub fn new() -> Self {
        Self {
            table: EnvironmentTable::new(),
        }
    }

    pub fn is_empty_stub(
        &self,
        ast: &AstEnvironment<'_>,
        module: &Reference,
        trigger: Option<&Reference>,
    ) -> bool {
        self.table.get_or_produce(module, trigger, || {
            let Some(source) = ast.parsed_source(module, trigger) else {
                return false;
            };
            !source.statements.is_empty()
                && source
                    .statements
                    .iter()
                    .all(is_placeholder_statement)
        })
    }

    pub fn invalidate_modules(&self, modules: &[Reference]) -> Vec<Reference> {
        let affected: Vec<Reference> = self
            .table
            .keys()
            .into_iter()
            .filter(|key| modules.contains(key))
            .collect();
        self.table.invalidate(affected.iter())
    }
}

impl Default for EmptyStubEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

fn is_placeholder_statement(statement: &Node<Statement>) -> bool {
    match &statement.value {
        Statement::Pass => true,
        Statement::Expression(expression) => {
            matches!(expression.value, Expression::Ellipsis)
        }
        Statement::Assign(assign) => assign
            .value
            .as_ref()
            .map(|value| matches!(value.value, Expression::Ellipsis))
            .unwrap_or(true),
        _ => false,
    }
}

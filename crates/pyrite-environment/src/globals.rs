//! Layer 3: parsed source -> unannotated globals and class summaries.
//!
//! Nothing here touches types; a global is the raw declaration shape a name
//! resolves to inside its module. Annotation parsing happens above, so this
//! layer's values survive edits that only move type information around.

use crate::ast_environment::AstEnvironment;
use crate::table::EnvironmentTable;
use pyrite_ast::{ClassDef, Expression, Name, Node, Signature, Statement};
use pyrite_common::{Atom, Location, Reference};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub qualified_name: Reference,
    pub bases: Vec<Node<Expression>>,
    pub keywords: Vec<(Atom, Node<Expression>)>,
    pub decorators: Vec<Node<Expression>>,
    pub body: Vec<Node<Statement>>,
    pub location: Location,
}

impl ClassSummary {
    fn of(class: &ClassDef, module: &Reference, location: Location) -> Self {
        Self {
            qualified_name: module.combine(&class.name.value),
            bases: class.bases.clone(),
            keywords: class.keywords.clone(),
            decorators: class.decorators.clone(),
            body: class.body.clone(),
            location,
        }
    }

    /// Whether any base expression names `typing.Protocol`.
    pub fn is_protocol(&self) -> bool {
        self.bases.iter().any(|base| {
            base.value
                .as_reference()
                .map(|reference| {
                    let name = reference.to_string();
                    name == "typing.Protocol" || name == "Protocol"
                })
                .unwrap_or(false)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UnannotatedGlobal {
    SimpleAssign {
        annotation: Option<Node<Expression>>,
        value: Option<Node<Expression>>,
        location: Location,
    },
    /// Every `def` of this name, in source order (overload sets).
    Define(Vec<Signature>),
    Class(ClassSummary),
    Imported {
        original: Reference,
        location: Location,
    },
}

pub struct UnannotatedGlobalEnvironment {
    globals: EnvironmentTable<Reference, Option<UnannotatedGlobal>, Reference>,
    module_classes: EnvironmentTable<Reference, Vec<Reference>, Reference>,
}

impl UnannotatedGlobalEnvironment {
    pub fn new() -> Self {
        Self {
            globals: EnvironmentTable::new(),
            module_classes: EnvironmentTable::new(),
        }
    }

    /// The raw global `name` resolves to, reading through the AST layer.
    pub fn global(
        &self,
        ast: &AstEnvironment<'_>,
        name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<UnannotatedGlobal> {
        self.globals.get_or_produce(name, trigger, || {
            let module = enclosing_module(ast, name)?;
            let source = ast.parsed_source(&module, Some(name))?;
            let local = name.drop_prefix(&module)?;
            find_global(&source.statements, &module, &local)
        })
    }

    /// Classes defined at the top level of `module`, as qualified names.
    pub fn module_classes(
        &self,
        ast: &AstEnvironment<'_>,
        module: &Reference,
        trigger: Option<&Reference>,
    ) -> Vec<Reference> {
        self.module_classes.get_or_produce(module, trigger, || {
            let Some(source) = ast.parsed_source(module, trigger) else {
                return Vec::new();
            };
            source
                .statements
                .iter()
                .filter_map(|statement| match &statement.value {
                    Statement::Class(class) => Some(module.combine(&class.name.value)),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn class_summary(
        &self,
        ast: &AstEnvironment<'_>,
        qualified_name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<ClassSummary> {
        match self.global(ast, qualified_name, trigger)? {
            UnannotatedGlobal::Class(summary) => Some(summary),
            _ => None,
        }
    }

    /// Invalidate every cached key belonging to a reparsed module. Returns
    /// the full downstream trigger set.
    pub fn invalidate_modules(&self, modules: &[Reference]) -> Vec<Reference> {
        let affected_globals: Vec<Reference> = self
            .globals
            .keys()
            .into_iter()
            .filter(|key| modules.iter().any(|module| module.is_prefix_of(key)))
            .collect();
        let affected_modules: Vec<Reference> = self
            .module_classes
            .keys()
            .into_iter()
            .filter(|key| modules.contains(key))
            .collect();
        let mut triggers = self.globals.invalidate(affected_globals.iter());
        triggers.extend(self.module_classes.invalidate(affected_modules.iter()));
        triggers.extend(affected_globals);
        triggers.sort();
        triggers.dedup();
        triggers
    }
}

impl Default for UnannotatedGlobalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest tracked module prefix of `name`.
fn enclosing_module(ast: &AstEnvironment<'_>, name: &Reference) -> Option<Reference> {
    let mut candidate = name.prefix();
    while !candidate.is_empty() {
        if ast.tracker().contains(&candidate) {
            return Some(candidate);
        }
        candidate = candidate.prefix();
    }
    None
}

/// Walk a statement list (descending into classes for dotted locals) for the
/// declaration of `local`.
fn find_global(
    statements: &[Node<Statement>],
    module: &Reference,
    local: &Reference,
) -> Option<UnannotatedGlobal> {
    let head = local.head()?;
    let mut defines: Vec<Signature> = Vec::new();
    for statement in statements {
        match &statement.value {
            Statement::Assign(assign) if local.len() == 1 => {
                if let Expression::Name(Name::Identifier(target)) = &assign.target.value {
                    if *target == head {
                        return Some(UnannotatedGlobal::SimpleAssign {
                            annotation: assign.annotation.clone(),
                            value: assign.value.clone(),
                            location: statement.location,
                        });
                    }
                }
            }
            Statement::Define(define) if local.len() == 1 => {
                if define.signature.name.value.last() == Some(head) {
                    defines.push(define.signature.clone());
                }
            }
            Statement::Class(class) => {
                if class.name.value.last() == Some(head) {
                    if local.len() == 1 {
                        return Some(UnannotatedGlobal::Class(ClassSummary::of(
                            class,
                            module,
                            statement.location,
                        )));
                    }
                    // Dotted local: resolve the rest inside the class body.
                    let nested_module = module.combine(&class.name.value);
                    let rest = Reference::from_components(local.components()[1..].to_vec());
                    return find_global(&class.body, &nested_module, &rest);
                }
            }
            Statement::Import(import) if local.len() == 1 => {
                for entry in &import.imports {
                    let binds = entry.alias.unwrap_or_else(|| {
                        entry.name.last().unwrap_or(head)
                    });
                    if binds == head {
                        let original = match &import.from {
                            Some(from) => from.combine(&entry.name),
                            None => entry.name.clone(),
                        };
                        return Some(UnannotatedGlobal::Imported {
                            original,
                            location: statement.location,
                        });
                    }
                }
            }
            Statement::If { body, orelse, .. } => {
                if let Some(found) = find_global(body, module, local)
                    .or_else(|| find_global(orelse, module, local))
                {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    if defines.is_empty() {
        None
    } else {
        Some(UnannotatedGlobal::Define(defines))
    }
}

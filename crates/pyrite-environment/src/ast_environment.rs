//! Layer 2: module reference -> parsed source.

use crate::interfaces::{
    IncrementalUpdate, ModuleTracker, ParseOutcome, SourceParser, UpdateResult,
};
use crate::table::EnvironmentTable;
use pyrite_ast::{Expression, Name, Node, Statement};
use pyrite_common::{Atom, Reference};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A parsed module plus the names a `from m import *` would bring in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedSource {
    pub statements: Vec<Node<Statement>>,
    pub wildcard_exports: Vec<Atom>,
}

impl ParsedSource {
    pub fn empty() -> Self {
        Self {
            statements: Vec::new(),
            wildcard_exports: Vec::new(),
        }
    }
}

pub struct AstEnvironment<'a> {
    tracker: &'a dyn ModuleTracker,
    parser: &'a dyn SourceParser,
    table: EnvironmentTable<Reference, Option<ParsedSource>, Reference>,
}

impl<'a> AstEnvironment<'a> {
    pub fn new(tracker: &'a dyn ModuleTracker, parser: &'a dyn SourceParser) -> Self {
        Self {
            tracker,
            parser,
            table: EnvironmentTable::new(),
        }
    }

    pub fn tracker(&self) -> &dyn ModuleTracker {
        self.tracker
    }

    /// Parsed source of `module`; `None` when untracked or unparseable.
    /// `trigger` names the downstream key reading on whose behalf.
    pub fn parsed_source(
        &self,
        module: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<ParsedSource> {
        self.table.get_or_produce(module, trigger, || {
            match self.parser.parse(module) {
                ParseOutcome::Parsed(statements) => {
                    let wildcard_exports = wildcard_exports(&statements);
                    Some(ParsedSource {
                        statements,
                        wildcard_exports,
                    })
                }
                ParseOutcome::SyntaxError(message) => {
                    debug!("syntax error in {}: {}", module, message);
                    None
                }
                ParseOutcome::SystemError(message) => {
                    debug!("system error reading {}: {}", module, message);
                    None
                }
                ParseOutcome::Missing => None,
            }
        })
    }

    /// Re-parse the modules behind `updates`. Returns the reparsed set and
    /// the per-kind failures; downstream layers invalidate off `reparsed`.
    pub fn update(&mut self, updates: &[IncrementalUpdate]) -> UpdateResult {
        let mut result = UpdateResult::default();
        for update in updates {
            let module = match update {
                IncrementalUpdate::NewExplicit(path) | IncrementalUpdate::NewImplicit(path) => {
                    match self.tracker.module_for_path(path) {
                        Some(module) => module,
                        None => continue,
                    }
                }
                IncrementalUpdate::Delete(module) => module.clone(),
            };
            self.table.invalidate([&module]);
            match update {
                IncrementalUpdate::Delete(_) => {
                    result.reparsed.push(module);
                }
                _ => match self.parser.parse(&module) {
                    ParseOutcome::Parsed(_) => result.reparsed.push(module),
                    ParseOutcome::SyntaxError(_) => {
                        result.reparsed.push(module.clone());
                        result.syntax_errors.push(module);
                    }
                    ParseOutcome::SystemError(_) => {
                        result.reparsed.push(module.clone());
                        result.system_errors.push(module);
                    }
                    ParseOutcome::Missing => result.reparsed.push(module),
                },
            }
        }
        result
    }
}

/// `__all__`-driven wildcard exports, falling back to top-level assigned and
/// defined names.
fn wildcard_exports(statements: &[Node<Statement>]) -> Vec<Atom> {
    let mut exports = Vec::new();
    let mut dunder_all: Option<Vec<Atom>> = None;
    for statement in statements {
        match &statement.value {
            Statement::Assign(assign) => {
                if let Expression::Name(Name::Identifier(target)) = &assign.target.value {
                    if pyrite_common::resolve(*target).as_ref() == "__all__" {
                        if let Some(value) = &assign.value {
                            if let Expression::List(entries) | Expression::Tuple(entries) =
                                &value.value
                            {
                                dunder_all = Some(
                                    entries
                                        .iter()
                                        .filter_map(|entry| match &entry.value {
                                            Expression::String(name) => {
                                                Some(pyrite_common::intern(name))
                                            }
                                            _ => None,
                                        })
                                        .collect(),
                                );
                            }
                        }
                    } else {
                        exports.push(*target);
                    }
                }
            }
            Statement::Define(define) => {
                if let Some(name) = define.signature.name.value.last() {
                    exports.push(name);
                }
            }
            Statement::Class(class) => {
                if let Some(name) = class.name.value.last() {
                    exports.push(name);
                }
            }
            _ => {}
        }
    }
    dunder_all.unwrap_or(exports)
}

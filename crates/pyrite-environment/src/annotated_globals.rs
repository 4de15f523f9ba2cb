//! Layer 10: global reference -> annotation and declaration location.

use crate::aliases::AliasEnvironment;
use crate::annotation_parser::{self, AnnotationContext};
use crate::ast_environment::AstEnvironment;
use crate::class_environment::qualify_class;
use crate::globals::{UnannotatedGlobal, UnannotatedGlobalEnvironment};
use crate::table::EnvironmentTable;
use pyrite_common::{Location, Reference};
use pyrite_types::Type;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// How a global may be rebound: annotated declarations are immutable facts,
/// inferred ones may be refined by assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnnotatedGlobal {
    Immutable(Type),
    Mutable(Type),
}

impl AnnotatedGlobal {
    pub fn annotation(&self) -> &Type {
        match self {
            AnnotatedGlobal::Immutable(annotation) | AnnotatedGlobal::Mutable(annotation) => {
                annotation
            }
        }
    }
}

pub struct AnnotatedGlobalEnvironment {
    table: EnvironmentTable<Reference, Option<(AnnotatedGlobal, Location)>, Reference>,
}

impl AnnotatedGlobalEnvironment {
    pub fn new() -> Self {
        Self {
            table: EnvironmentTable::new(),
        }
    }

    pub fn get_global(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        aliases: &AliasEnvironment,
        name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<AnnotatedGlobal> {
        let mut visited = FxHashSet::default();
        self.resolve(ast, globals, aliases, name, trigger, &mut visited)
            .map(|(global, _)| global)
    }

    pub fn get_global_location(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        aliases: &AliasEnvironment,
        name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<Location> {
        let mut visited = FxHashSet::default();
        self.resolve(ast, globals, aliases, name, trigger, &mut visited)
            .map(|(_, location)| location)
    }

    fn resolve(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        aliases: &AliasEnvironment,
        name: &Reference,
        trigger: Option<&Reference>,
        visited: &mut FxHashSet<Reference>,
    ) -> Option<(AnnotatedGlobal, Location)> {
        if !visited.insert(name.clone()) {
            return None;
        }
        self.table.get_or_produce(name, trigger, || {
            let resolve_alias =
                |reference: &Reference| aliases.alias(ast, globals, reference, None);
            let qualify = |reference: &Reference| qualify_class(ast, globals, name, reference);
            let context = AnnotationContext {
                resolve_alias: &resolve_alias,
                qualify: &qualify,
            };

            match globals.global(ast, name, Some(name))? {
                UnannotatedGlobal::SimpleAssign {
                    annotation,
                    value,
                    location,
                } => match annotation {
                    Some(annotation) => {
                        let parsed =
                            annotation_parser::parse_annotation(&annotation, &context);
                        Some((AnnotatedGlobal::Immutable(parsed), location))
                    }
                    None => {
                        let value = value?;
                        let inferred =
                            annotation_parser::literal_type(&value).weaken_literals();
                        Some((AnnotatedGlobal::Mutable(inferred), location))
                    }
                },
                UnannotatedGlobal::Define(signatures) => {
                    let callable =
                        annotation_parser::callable_of_signatures(&signatures, &context)?;
                    let location = signatures
                        .first()
                        .map(|signature| signature.name.location)
                        .unwrap_or_else(Location::any);
                    Some((
                        AnnotatedGlobal::Immutable(Type::Callable(Box::new(callable))),
                        location,
                    ))
                }
                UnannotatedGlobal::Class(summary) => Some((
                    AnnotatedGlobal::Immutable(Type::meta(Type::Primitive(
                        pyrite_common::intern(&summary.qualified_name.to_string()),
                    ))),
                    summary.location,
                )),
                UnannotatedGlobal::Imported { original, location } => self
                    .resolve(ast, globals, aliases, &original, Some(name), visited)
                    .map(|(global, _)| (global, location)),
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

    /// Serialize this layer's `(key, value)` tables for saved-state
    /// restart. The format is opaque; it round-trips `equal_value`.
    pub fn serialize_saved_state(&self) -> serde_json::Result<String> {
        self.table.serialize_tables()
    }

    pub fn load_saved_state(&self, serialized: &str) -> serde_json::Result<()> {
        self.table.load_tables(serialized)
    }
}

impl Default for AnnotatedGlobalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

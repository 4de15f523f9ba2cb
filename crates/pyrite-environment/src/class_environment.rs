//! Layers 6-8: class hierarchy, per-class metadata, undecorated functions.

use crate::aliases::{AliasEnvironment, EmptyStubEnvironment};
use crate::annotation_parser::{self, Alias, AnnotationContext};
use crate::ast_environment::AstEnvironment;
use crate::globals::{ClassSummary, UnannotatedGlobal, UnannotatedGlobalEnvironment};
use crate::table::EnvironmentTable;
use pyrite_ast::Expression;
use pyrite_common::{Atom, Reference};
use pyrite_types::{
    Callable, ClassHierarchy, OrderedTypes, Parameter, Type, Variable,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub successors: Vec<Atom>,
    pub is_protocol: bool,
    pub is_test: bool,
    /// Extends a class from a `...`-only stub module; gets `__init__` and
    /// `__getattr__` synthesized.
    pub extends_placeholder_stub: bool,
    pub metaclass_candidates: Vec<Reference>,
}

pub struct ClassEnvironment {
    hierarchy: RwLock<Option<Arc<ClassHierarchy>>>,
    metadata: EnvironmentTable<Reference, Option<ClassMetadata>, Reference>,
    undecorated: EnvironmentTable<Reference, Option<Callable>, Reference>,
}

impl ClassEnvironment {
    pub fn new() -> Self {
        Self {
            hierarchy: RwLock::new(None),
            metadata: EnvironmentTable::new(),
            undecorated: EnvironmentTable::new(),
        }
    }

    /// The class hierarchy over every tracked module, rebuilt lazily after
    /// invalidation.
    pub fn hierarchy(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        aliases: &AliasEnvironment,
    ) -> Arc<ClassHierarchy> {
        if let Some(hierarchy) = self
            .hierarchy
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return hierarchy;
        }
        let built = Arc::new(build_hierarchy(ast, globals, aliases));
        *self.hierarchy.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&built));
        built
    }

    pub fn metadata(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        aliases: &AliasEnvironment,
        empty_stubs: &EmptyStubEnvironment,
        class_name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<ClassMetadata> {
        self.metadata.get_or_produce(class_name, trigger, || {
            let summary = globals.class_summary(ast, class_name, Some(class_name))?;
            let hierarchy = self.hierarchy(ast, globals, aliases);
            let qualified = pyrite_common::intern(&class_name.to_string());
            let successors = match hierarchy.successors(qualified) {
                Ok(successors) => successors,
                Err(error) => {
                    // Integrity failures recover with an empty successor
                    // list at the query boundary.
                    warn!("MRO failure for {}: {}", class_name, error);
                    Vec::new()
                }
            };
            let is_test = successors.iter().any(|successor| {
                let name = pyrite_common::resolve(*successor);
                name.as_ref() == "unittest.TestCase" || name.as_ref() == "TestCase"
            });
            let extends_placeholder_stub = summary.bases.iter().any(|base| {
                base.value
                    .as_reference()
                    .map(|reference| {
                        let module = reference.prefix();
                        !module.is_empty() && empty_stubs.is_empty_stub(ast, &module, Some(class_name))
                    })
                    .unwrap_or(false)
            });
            let metaclass_candidates = summary
                .keywords
                .iter()
                .filter(|(keyword, _)| pyrite_common::resolve(*keyword).as_ref() == "metaclass")
                .filter_map(|(_, value)| value.value.as_reference())
                .collect();
            Some(ClassMetadata {
                successors,
                is_protocol: summary.is_protocol(),
                is_test,
                extends_placeholder_stub,
                metaclass_candidates,
            })
        })
    }

    /// A top-level function's signature before decorators apply.
    pub fn undecorated_function(
        &self,
        ast: &AstEnvironment<'_>,
        globals: &UnannotatedGlobalEnvironment,
        aliases: &AliasEnvironment,
        name: &Reference,
        trigger: Option<&Reference>,
    ) -> Option<Callable> {
        self.undecorated.get_or_produce(name, trigger, || {
            let UnannotatedGlobal::Define(signatures) = globals.global(ast, name, Some(name))?
            else {
                return None;
            };
            let resolve_alias = |reference: &Reference| aliases.alias(ast, globals, reference, None);
            let qualify = |reference: &Reference| qualify_class(ast, globals, name, reference);
            let context = AnnotationContext {
                resolve_alias: &resolve_alias,
                qualify: &qualify,
            };
            annotation_parser::callable_of_signatures(&signatures, &context)
        })
    }

    pub fn invalidate(&self, triggers: &[Reference]) -> Vec<Reference> {
        // Any class-shape change may reshape the DAG; rebuild it wholesale.
        *self.hierarchy.write().unwrap_or_else(|e| e.into_inner()) = None;
        let affected_metadata: Vec<Reference> = self
            .metadata
            .keys()
            .into_iter()
            .filter(|key| triggers.contains(key))
            .collect();
        let affected_functions: Vec<Reference> = self
            .undecorated
            .keys()
            .into_iter()
            .filter(|key| triggers.contains(key))
            .collect();
        let mut downstream = self.metadata.invalidate(affected_metadata.iter());
        downstream.extend(self.undecorated.invalidate(affected_functions.iter()));
        downstream
    }
}

impl Default for ClassEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Qualify a short class name as seen from `from_name`'s module.
pub fn qualify_class(
    ast: &AstEnvironment<'_>,
    globals: &UnannotatedGlobalEnvironment,
    from_name: &Reference,
    reference: &Reference,
) -> Option<Atom> {
    // Already-qualified names win.
    if globals.class_summary(ast, reference, None).is_some() {
        return Some(pyrite_common::intern(&reference.to_string()));
    }
    let mut module = from_name.prefix();
    while !module.is_empty() {
        let candidate = module.combine(reference);
        match globals.global(ast, &candidate, None) {
            Some(UnannotatedGlobal::Class(summary)) => {
                return Some(pyrite_common::intern(&summary.qualified_name.to_string()));
            }
            Some(UnannotatedGlobal::Imported { original, .. }) => {
                if globals.class_summary(ast, &original, None).is_some() {
                    return Some(pyrite_common::intern(&original.to_string()));
                }
            }
            _ => {}
        }
        module = module.prefix();
    }
    None
}

fn build_hierarchy(
    ast: &AstEnvironment<'_>,
    globals: &UnannotatedGlobalEnvironment,
    aliases: &AliasEnvironment,
) -> ClassHierarchy {
    let names = pyrite_types::well_known();
    let mut hierarchy = pyrite_types::class_hierarchy::builtin_hierarchy();

    let modules = ast.tracker().modules();
    let mut summaries: Vec<ClassSummary> = Vec::new();
    for module in &modules {
        for class_name in globals.module_classes(ast, module, None) {
            if let Some(summary) = globals.class_summary(ast, &class_name, None) {
                // First pass: make every class known before edges resolve.
                hierarchy.insert(pyrite_common::intern(&summary.qualified_name.to_string()));
                summaries.push(summary);
            }
        }
    }

    for summary in &summaries {
        let qualified = pyrite_common::intern(&summary.qualified_name.to_string());
        let resolve_alias =
            |reference: &Reference| aliases.alias(ast, globals, reference, None);
        let qualify =
            |reference: &Reference| qualify_class(ast, globals, &summary.qualified_name, reference);
        let context = AnnotationContext {
            resolve_alias: &resolve_alias,
            qualify: &qualify,
        };

        let mut declared: Vec<Variable> = Vec::new();
        let mut connected = false;
        for base in &summary.bases {
            match &base.value {
                Expression::Subscript(subscript) => {
                    let base_name = subscript
                        .base
                        .value
                        .as_reference()
                        .map(|reference| reference.to_string())
                        .unwrap_or_default();
                    if is_generic_marker(&base_name) {
                        // Generic[T, ...] declares the class's variables.
                        let entries = match &subscript.index.value {
                            Expression::Tuple(entries) => entries.clone(),
                            _ => vec![(*subscript.index).clone()],
                        };
                        for entry in entries {
                            if let Some(reference) = entry.value.as_reference() {
                                if let Some(Alias::VariableAlias(variable)) =
                                    (context.resolve_alias)(&reference)
                                {
                                    declared.push(variable);
                                    continue;
                                }
                            }
                            // An undeclared parameter position still needs a
                            // slot; a fresh invariant variable stands in.
                            if let Some(reference) = entry.value.as_reference() {
                                if let Some(last) = reference.last() {
                                    declared.push(Variable::Unary(
                                        pyrite_types::UnaryVariable::new(last),
                                    ));
                                }
                            }
                        }
                        continue;
                    }
                    // Parametric base: edge with instantiated parameters.
                    let parsed = annotation_parser::parse_annotation(base, &context);
                    if let Type::Parametric {
                        name: parent,
                        parameters,
                    } = parsed
                    {
                        let edge: Vec<Type> = parameters
                            .iter()
                            .filter_map(Parameter::as_single)
                            .cloned()
                            .collect();
                        hierarchy.connect(qualified, parent, OrderedTypes::Concrete(edge));
                        connected = true;
                    }
                }
                _ => {
                    if let Some(reference) = base.value.as_reference() {
                        let rendered = reference.to_string();
                        if is_generic_marker(&rendered) {
                            continue;
                        }
                        let parent = (context.qualify)(&reference)
                            .unwrap_or_else(|| builtin_base(&rendered, names));
                        hierarchy.connect(qualified, parent, OrderedTypes::empty());
                        connected = true;
                    }
                }
            }
        }
        if !connected {
            hierarchy.connect(qualified, names.object, OrderedTypes::empty());
        }
        if !declared.is_empty() {
            hierarchy.set_variables(qualified, declared);
        }
    }

    if let Err(error) = hierarchy.check_integrity() {
        // Recover at the boundary; queries against the broken region answer
        // with sentinels.
        warn!("class hierarchy integrity check failed: {}", error);
    }
    hierarchy
}

/// The `Generic`/`Protocol` base markers; they declare variables rather
/// than contributing edges.
fn is_generic_marker(rendered: &str) -> bool {
    matches!(
        rendered,
        "Generic" | "typing.Generic" | "Protocol" | "typing.Protocol"
    )
}

/// Base names that refer to builtin classes when nothing tracked matches.
fn builtin_base(rendered: &str, names: &pyrite_types::names::WellKnownNames) -> Atom {
    match rendered {
        "int" => names.int,
        "str" => names.str_,
        "bool" => names.bool_,
        "float" => names.float,
        "bytes" => names.bytes,
        "object" => names.object,
        "type" => names.r#type,
        "tuple" => names.tuple,
        "list" => names.list,
        "set" => names.set,
        "dict" => names.dict,
        "BaseException" | "Exception" => names.base_exception,
        _ => pyrite_common::intern(rendered),
    }
}

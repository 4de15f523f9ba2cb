//! Layer 9: the attribute/order surface (C8 + C6).
//!
//! `AttributeResolution` is the handle queries enter through: it owns the
//! hierarchy snapshot for the current generation, builds per-class attribute
//! tables on demand, and implements `ClassHandler` so the order can reach
//! back into attribute resolution (protocol conformance, `__call__` lookup)
//! without the two crates knowing each other's internals.

use crate::annotation_parser::{self, AnnotationContext};
use crate::class_environment::qualify_class;
use crate::globals::{UnannotatedGlobal, UnannotatedGlobalEnvironment};
use crate::table::EnvironmentTable;
use crate::Environments;
use pyrite_ast::{Expression, Node, Statement};
use pyrite_common::{Atom, Reference};
use pyrite_solver::attributes::{
    AttributeTable, InstantiatedAttribute, UninstantiatedAnnotation, UninstantiatedAttribute,
};
use pyrite_solver::dataclasses::{self, DataclassField, DataclassOptions};
use pyrite_solver::signature::{signature_select, CallArgument, SignatureMatch};
use pyrite_solver::weaken;
use pyrite_solver::{ClassHandler, TypeOrder};
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{
    solution_from_zipped, well_known, zip_variables_with_parameters, Callable,
    CallableParameters, ClassHierarchy, Solution, Type,
};
use std::sync::Arc;

/// An arity complaint from `check_invalid_type_parameters`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidTypeParameters {
    pub class_name: Atom,
    pub expected: usize,
    pub provided: usize,
}

pub struct AttributeResolution<'e> {
    envs: &'e Environments<'e>,
    hierarchy: Arc<ClassHierarchy>,
    tables: EnvironmentTable<Atom, Option<AttributeTable>, Reference>,
}

impl<'e> AttributeResolution<'e> {
    pub fn new(envs: &'e Environments<'e>) -> Self {
        let hierarchy = envs
            .classes
            .hierarchy(&envs.ast, &envs.globals, &envs.aliases);
        Self {
            envs,
            hierarchy,
            tables: EnvironmentTable::new(),
        }
    }

    /// A fresh order over this resolution surface.
    pub fn order(&self) -> TypeOrder<'_> {
        TypeOrder::new(self)
    }

    // =========================================================================
    // Annotation parsing
    // =========================================================================

    /// Parse an annotation as seen from `scope` (a module or member
    /// reference used for name qualification).
    pub fn parse_annotation_in(&self, expression: &Node<Expression>, scope: &Reference) -> Type {
        let resolve_alias = |reference: &Reference| {
            self.envs
                .aliases
                .alias(&self.envs.ast, &self.envs.globals, reference, None)
        };
        let qualify = |reference: &Reference| {
            qualify_class(&self.envs.ast, &self.envs.globals, scope, reference)
        };
        let context = AnnotationContext {
            resolve_alias: &resolve_alias,
            qualify: &qualify,
        };
        annotation_parser::parse_annotation(expression, &context)
    }

    pub fn parse_annotation(&self, expression: &Node<Expression>) -> Type {
        self.parse_annotation_in(expression, &Reference::empty())
    }

    /// The type of a literal expression display.
    pub fn resolve_literal(&self, expression: &Node<Expression>) -> Type {
        annotation_parser::literal_type(expression)
    }

    pub fn create_overload(
        &self,
        signature: &pyrite_ast::Signature,
        scope: &Reference,
    ) -> pyrite_types::Overload {
        let resolve_alias = |reference: &Reference| {
            self.envs
                .aliases
                .alias(&self.envs.ast, &self.envs.globals, reference, None)
        };
        let qualify = |reference: &Reference| {
            qualify_class(&self.envs.ast, &self.envs.globals, scope, reference)
        };
        let context = AnnotationContext {
            resolve_alias: &resolve_alias,
            qualify: &qualify,
        };
        annotation_parser::overload_of_signature(signature, &context)
    }

    // =========================================================================
    // Order-backed queries
    // =========================================================================

    pub fn signature_select(
        &self,
        callable: &Callable,
        arguments: &[CallArgument],
    ) -> SignatureMatch {
        let mut order = self.order();
        signature_select(&mut order, callable, arguments)
    }

    pub fn resolve_mutable_literals(
        &self,
        expression: Option<&Node<Expression>>,
        resolved: &Type,
        expected: &Type,
    ) -> Type {
        let mut order = self.order();
        weaken::weaken_mutable_literals(&mut order, expression, resolved, expected)
    }

    /// Solve `left <= right` and extract one full solution.
    pub fn constraints(&self, left: &Type, right: &Type) -> Option<Solution> {
        let mut order = self.order();
        order
            .solve_less_or_equal(&ConstraintSet::empty(), left, right)
            .into_iter()
            .find_map(|constraints| constraints.solve(&mut order))
    }

    pub fn constraints_solution_exists(&self, left: &Type, right: &Type) -> bool {
        self.constraints(left, right).is_some()
    }

    /// Arity-check every parametric against its class's declared variables.
    pub fn check_invalid_type_parameters(&self, annotation: &Type) -> Vec<InvalidTypeParameters> {
        let mut errors = Vec::new();
        let _ = pyrite_types::visitor::map_bottom_up(annotation, &mut |ty| {
            if let Type::Parametric { name, parameters } = ty {
                if let Some(variables) = self.hierarchy.variables(*name) {
                    if !variables.is_empty() && variables.len() != parameters.len() {
                        errors.push(InvalidTypeParameters {
                            class_name: *name,
                            expected: variables.len(),
                            provided: parameters.len(),
                        });
                    }
                }
            }
            None
        });
        errors
    }

    // =========================================================================
    // Attribute tables
    // =========================================================================

    /// The uninstantiated table of a single class (no MRO flattening).
    pub fn uninstantiated_table(&self, class_name: Atom) -> Option<AttributeTable> {
        self.tables.get_or_produce(&class_name, None, || {
            self.build_table(class_name)
        })
    }

    fn build_table(&self, class_name: Atom) -> Option<AttributeTable> {
        let names = well_known();
        let class_reference = Reference::new(&pyrite_common::resolve(class_name));
        let summary = self.envs.globals.class_summary(
            &self.envs.ast,
            &class_reference,
            Some(&class_reference),
        )?;
        let mut table = AttributeTable::new();
        let scope = summary.qualified_name.clone();

        let mut own_fields: Vec<DataclassField> = Vec::new();
        let mut method_groups: Vec<(Atom, Vec<pyrite_ast::Signature>)> = Vec::new();

        for statement in &summary.body {
            match &statement.value {
                Statement::Define(define) => {
                    let Some(method_name) = define.signature.name.value.last() else {
                        continue;
                    };
                    match method_groups
                        .iter_mut()
                        .find(|(name, _)| *name == method_name)
                    {
                        Some((_, signatures)) => signatures.push(define.signature.clone()),
                        None => method_groups.push((method_name, vec![define.signature.clone()])),
                    }
                }
                Statement::Assign(assign) => {
                    let Expression::Name(pyrite_ast::Name::Identifier(attribute_name)) =
                        &assign.target.value
                    else {
                        continue;
                    };
                    let attribute_name = *attribute_name;
                    match &assign.annotation {
                        Some(annotation) => {
                            let raw = self.parse_annotation_in(annotation, &scope);
                            let is_class_variable = matches!(
                                &annotation.value,
                                Expression::Subscript(subscript)
                                    if subscript
                                        .base
                                        .value
                                        .as_reference()
                                        .map(|reference| reference.to_string().ends_with("ClassVar"))
                                        .unwrap_or(false)
                            );
                            let mut attribute = UninstantiatedAttribute::simple(
                                attribute_name,
                                class_name,
                                raw.clone(),
                            );
                            attribute.is_class_variable = is_class_variable;
                            table.insert(attribute);
                            own_fields.push(DataclassField {
                                name: attribute_name,
                                annotation: raw,
                                has_default: assign
                                    .value
                                    .as_ref()
                                    .map(dataclasses::value_provides_default)
                                    .unwrap_or(false),
                            });
                        }
                        None => {
                            if let Some(value) = &assign.value {
                                let resolved =
                                    annotation_parser::literal_type(value).weaken_literals();
                                table.insert(UninstantiatedAttribute::simple(
                                    attribute_name,
                                    class_name,
                                    resolved,
                                ));
                            }
                        }
                    }
                }
                Statement::Class(nested) => {
                    if let Some(nested_name) = nested.name.value.last() {
                        let qualified = pyrite_common::intern(
                            &scope.combine(&nested.name.value).to_string(),
                        );
                        table.insert(UninstantiatedAttribute::simple(
                            nested_name,
                            class_name,
                            Type::meta(Type::Primitive(qualified)),
                        ));
                    }
                }
                _ => {}
            }
        }

        for (method_name, signatures) in method_groups {
            let resolve_alias = |reference: &Reference| {
                self.envs
                    .aliases
                    .alias(&self.envs.ast, &self.envs.globals, reference, None)
            };
            let qualify = |reference: &Reference| {
                qualify_class(&self.envs.ast, &self.envs.globals, &scope, reference)
            };
            let context = AnnotationContext {
                resolve_alias: &resolve_alias,
                qualify: &qualify,
            };
            let Some(callable) =
                annotation_parser::callable_of_signatures(&signatures, &context)
            else {
                continue;
            };
            let first = &signatures[0];
            let is_class_method =
                first.is_class_method || first.has_decorator("classmethod");
            let is_static = first.is_static_method || first.has_decorator("staticmethod");
            let is_property = first.is_property || first.has_decorator("property");
            if is_property {
                let annotation = callable.implementation.annotation.clone();
                table.insert(UninstantiatedAttribute {
                    name: method_name,
                    parent: class_name,
                    visibility: pyrite_solver::Visibility::ReadOnly {
                        refinable: true,
                        overridable: true,
                    },
                    initialized: pyrite_solver::InitializedState::OnClass,
                    is_async: first.is_async,
                    is_static: false,
                    is_class_variable: false,
                    accessed_via_metaclass: false,
                    annotation: UninstantiatedAnnotation::Attribute {
                        annotation: annotation.clone(),
                        original_annotation: annotation,
                        is_property: true,
                    },
                });
            } else {
                let mut attribute = UninstantiatedAttribute::method(
                    method_name,
                    class_name,
                    callable,
                    is_class_method,
                );
                attribute.is_static = is_static;
                attribute.is_async = first.is_async;
                table.insert(attribute);
            }
        }

        // Placeholder-stub parents accept anything; synthesize the catch-all
        // members when missing.
        let metadata = self.envs.classes.metadata(
            &self.envs.ast,
            &self.envs.globals,
            &self.envs.aliases,
            &self.envs.empty_stubs,
            &class_reference,
            None,
        );
        if metadata
            .as_ref()
            .map(|metadata| metadata.extends_placeholder_stub)
            .unwrap_or(false)
        {
            let init = Callable::named(
                class_reference.with_component(names.init),
                pyrite_types::Overload {
                    annotation: Type::none(),
                    parameters: CallableParameters::from_types(vec![Type::Primitive(class_name)]),
                },
            );
            table.insert_if_missing(UninstantiatedAttribute::method(
                names.init, class_name, init, false,
            ));
            let getattr = Callable::named(
                class_reference.with_component(names.getattr),
                pyrite_types::Overload {
                    annotation: Type::Any,
                    parameters: CallableParameters::from_types(vec![
                        Type::Primitive(class_name),
                        Type::string(),
                    ]),
                },
            );
            table.insert_if_missing(UninstantiatedAttribute::method(
                names.getattr,
                class_name,
                getattr,
                false,
            ));
        }

        // Dataclass-like decorators synthesize their methods last, so
        // explicit members always win.
        let decorator_options = summary
            .decorators
            .iter()
            .find_map(DataclassOptions::from_decorator);
        if let Some(options) = decorator_options {
            let fields = if options.collect_parent_fields {
                let inherited = metadata
                    .map(|metadata| {
                        metadata
                            .successors
                            .iter()
                            .rev()
                            .filter_map(|successor| self.dataclass_fields(*successor))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                dataclasses::merge_fields(inherited, own_fields)
            } else {
                own_fields
            };
            dataclasses::synthesize_methods(&mut table, class_name, &fields, &options);
        }

        Some(table)
    }

    /// The declared fields of `class_name` when it is itself a dataclass.
    fn dataclass_fields(&self, class_name: Atom) -> Option<Vec<DataclassField>> {
        let class_reference = Reference::new(&pyrite_common::resolve(class_name));
        let summary = self
            .envs
            .globals
            .class_summary(&self.envs.ast, &class_reference, None)?;
        summary
            .decorators
            .iter()
            .find_map(DataclassOptions::from_decorator)?;
        let scope = summary.qualified_name.clone();
        let mut fields = Vec::new();
        for statement in &summary.body {
            if let Statement::Assign(assign) = &statement.value {
                if let (
                    Expression::Name(pyrite_ast::Name::Identifier(name)),
                    Some(annotation),
                ) = (&assign.target.value, &assign.annotation)
                {
                    fields.push(DataclassField {
                        name: *name,
                        annotation: self.parse_annotation_in(annotation, &scope),
                        has_default: assign
                            .value
                            .as_ref()
                            .map(dataclasses::value_provides_default)
                            .unwrap_or(false),
                    });
                }
            }
        }
        Some(fields)
    }

    /// Attribute lookup over the receiver's class then its MRO, with the
    /// synthesized members (typed dictionaries, bounded tuples, generic
    /// metas) taking precedence.
    pub fn attribute(&self, receiver: &Type, attribute_name: Atom) -> Option<InstantiatedAttribute> {
        let mut order = self.order();
        if let Some(synthesized) = order.synthesized_attribute(receiver, attribute_name) {
            return Some(synthesized);
        }
        let class_name = receiver.primitive_name()?;
        let uninstantiated = self.lookup_in_mro(class_name, attribute_name)?;
        Some(order.instantiate_attribute(&uninstantiated, receiver))
    }

    /// Resolve the receiver's type parameters into an uninstantiated
    /// record, specializing `self` for methods.
    pub fn instantiate_attribute(
        &self,
        attribute: &UninstantiatedAttribute,
        receiver: &Type,
    ) -> InstantiatedAttribute {
        let mut order = self.order();
        order.instantiate_attribute(attribute, receiver)
    }

    fn lookup_in_mro(&self, class_name: Atom, attribute_name: Atom) -> Option<UninstantiatedAttribute> {
        if let Some(attribute) = self
            .uninstantiated_table(class_name)
            .and_then(|table| table.lookup(attribute_name).cloned())
        {
            return Some(attribute);
        }
        for successor in self.hierarchy.successors(class_name).ok()? {
            if let Some(attribute) = self
                .uninstantiated_table(successor)
                .and_then(|table| table.lookup(attribute_name).cloned())
            {
                return Some(attribute);
            }
        }
        None
    }

    /// Every attribute visible on `class_name`, own class first, then MRO.
    pub fn all_attributes(&self, class_name: Atom) -> Vec<UninstantiatedAttribute> {
        let mut seen = Vec::new();
        let mut result = Vec::new();
        let mut collect = |table: Option<AttributeTable>| {
            if let Some(table) = table {
                for attribute in table.iter() {
                    if !seen.contains(&attribute.name) {
                        seen.push(attribute.name);
                        result.push(attribute.clone());
                    }
                }
            }
        };
        collect(self.uninstantiated_table(class_name));
        if let Ok(successors) = self.hierarchy.successors(class_name) {
            for successor in successors {
                collect(self.uninstantiated_table(successor));
            }
        }
        result
    }

    pub fn attribute_names(&self, class_name: Atom) -> Vec<Atom> {
        self.all_attributes(class_name)
            .into_iter()
            .map(|attribute| attribute.name)
            .collect()
    }

    /// The metaclass governing `class_name`.
    pub fn metaclass(&self, class_name: Atom) -> Type {
        let class_reference = Reference::new(&pyrite_common::resolve(class_name));
        let candidates = self
            .envs
            .classes
            .metadata(
                &self.envs.ast,
                &self.envs.globals,
                &self.envs.aliases,
                &self.envs.empty_stubs,
                &class_reference,
                None,
            )
            .map(|metadata| metadata.metaclass_candidates)
            .unwrap_or_default();
        match candidates.first() {
            Some(metaclass) => {
                Type::Primitive(pyrite_common::intern(&metaclass.to_string()))
            }
            None => Type::Primitive(well_known().r#type),
        }
    }

    /// The callable that constructs `class_name`, or the reason it cannot be
    /// constructed.
    pub fn constructor(
        &self,
        class_name: Atom,
    ) -> Result<Type, pyrite_solver::SignatureSelectionReason> {
        use pyrite_solver::SignatureSelectionReason;
        let names = well_known();
        let class_reference = Reference::new(&pyrite_common::resolve(class_name));
        let metadata = self.envs.classes.metadata(
            &self.envs.ast,
            &self.envs.globals,
            &self.envs.aliases,
            &self.envs.empty_stubs,
            &class_reference,
            None,
        );
        if metadata
            .as_ref()
            .map(|metadata| metadata.is_protocol)
            .unwrap_or(false)
        {
            return Err(SignatureSelectionReason::ProtocolInstantiation(class_name));
        }
        if self.has_abstract_methods(&class_reference) {
            return Err(SignatureSelectionReason::AbstractClassInstantiation(
                class_name,
            ));
        }
        let instance = self.instance_of(class_name);
        let init = self
            .attribute(&instance, names.init)
            .map(|attribute| attribute.annotation);
        match init {
            Some(Type::Callable(callable)) => {
                let constructor = callable.map_implementation_and_overloads(|overload| {
                    pyrite_types::Overload {
                        annotation: instance.clone(),
                        parameters: overload.parameters.clone(),
                    }
                });
                Ok(Type::Callable(Box::new(constructor)))
            }
            _ => Ok(Type::callable(
                CallableParameters::Undefined,
                instance,
            )),
        }
    }

    fn has_abstract_methods(&self, class_reference: &Reference) -> bool {
        self.envs
            .globals
            .class_summary(&self.envs.ast, class_reference, None)
            .map(|summary| {
                summary.body.iter().any(|statement| match &statement.value {
                    Statement::Define(define) => {
                        define.signature.has_decorator("abstractmethod")
                            || define.signature.has_decorator("abc.abstractmethod")
                    }
                    _ => false,
                })
            })
            .unwrap_or(false)
    }

    /// The generic instance of a class: its declared variables applied.
    fn instance_of(&self, class_name: Atom) -> Type {
        match self.hierarchy.variables(class_name) {
            Some(variables) if !variables.is_empty() => Type::Parametric {
                name: class_name,
                parameters: variables
                    .iter()
                    .map(|variable| match variable {
                        pyrite_types::Variable::Unary(unary) => {
                            pyrite_types::Parameter::Single(Type::Variable(unary.clone()))
                        }
                        pyrite_types::Variable::ListVariadic(list) => pyrite_types::Parameter::Group(
                            pyrite_types::OrderedTypes::Concatenation(
                                pyrite_types::Concatenation::bare(list.clone()),
                            ),
                        ),
                        pyrite_types::Variable::ParameterVariadic(parameter) => {
                            pyrite_types::Parameter::CallableParameters(
                                CallableParameters::ParameterVariadicTypeVariable {
                                    head: Vec::new(),
                                    variable: parameter.clone(),
                                },
                            )
                        }
                    })
                    .collect(),
            },
            _ => Type::Primitive(class_name),
        }
    }

    /// Structural view of a receiver's attributes, used by the order for
    /// protocol conformance and `__call__` lookup. Methods are returned with
    /// `self` already dropped and the receiver's parameters substituted; no
    /// order queries run here, keeping the recursion acyclic.
    fn structural_attributes(&self, receiver: &Type) -> Option<Vec<(Atom, Type)>> {
        let class_name = receiver.primitive_name()?;
        let declared = self.hierarchy.variables(class_name).unwrap_or_default();
        let solution = self
            .hierarchy
            .instantiate_successors_parameters(receiver, class_name)
            .and_then(|parameters| zip_variables_with_parameters(&declared, &parameters))
            .map(solution_from_zipped)
            .unwrap_or_else(Solution::empty);
        let attributes = self
            .all_attributes(class_name)
            .into_iter()
            .map(|attribute| {
                let annotation = match &attribute.annotation {
                    UninstantiatedAnnotation::Method { callable, .. } => {
                        Type::Callable(Box::new(callable.drop_first_parameter()))
                    }
                    UninstantiatedAnnotation::Attribute { annotation, .. } => annotation.clone(),
                };
                (attribute.name, solution.instantiate(&annotation))
            })
            .collect();
        Some(attributes)
    }
}

impl ClassHandler for AttributeResolution<'_> {
    fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    fn is_protocol(&self, name: Atom) -> bool {
        let class_reference = Reference::new(&pyrite_common::resolve(name));
        self.envs
            .classes
            .metadata(
                &self.envs.ast,
                &self.envs.globals,
                &self.envs.aliases,
                &self.envs.empty_stubs,
                &class_reference,
                None,
            )
            .map(|metadata| metadata.is_protocol)
            .unwrap_or(false)
    }

    fn attributes(&self, receiver: &Type) -> Option<Vec<(Atom, Type)>> {
        self.structural_attributes(receiver)
    }

    fn protocol_attributes(&self, protocol: Atom) -> Option<Vec<(Atom, Type)>> {
        // Only the protocol's own declarations constrain conformance.
        let table = self.uninstantiated_table(protocol)?;
        Some(
            table
                .iter()
                .map(|attribute| {
                    let annotation = match &attribute.annotation {
                        UninstantiatedAnnotation::Method { callable, .. } => {
                            Type::Callable(Box::new(callable.drop_first_parameter()))
                        }
                        UninstantiatedAnnotation::Attribute { annotation, .. } => {
                            annotation.clone()
                        }
                    };
                    (attribute.name, annotation)
                })
                .collect(),
        )
    }

    fn metaclass(&self, name: Atom) -> Option<Type> {
        Some(AttributeResolution::metaclass(self, name))
    }
}

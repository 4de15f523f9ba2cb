//! Structural traversal and rewriting over `Type`.
//!
//! All rewrite passes (instantiation, namespacing, escape handling, literal
//! weakening) are built on one bottom-up transform. The transform walks every
//! type position, including callable annotations and parameter lists, tuple
//! and group sequences, typed-dictionary fields, and the variables embedded in
//! concatenation middles and parameter-variadic tails.

use crate::callable::{
    Callable, CallableParameter, CallableParameters, Implicit, Overload, StarParameter,
};
use crate::ordered_types::{Concatenation, OrderedTypes, Tuple};
use crate::types::{Parameter, ParameterVariadicComponent, Type, TypedDictionary};
use crate::variable::Variable;

/// A bottom-up rewrite with user state.
///
/// `should_descend` is consulted top-down; returning `false` leaves the
/// subterm untouched. `transform` is applied to each rebuilt subterm; `None`
/// keeps the rebuilt value.
pub trait TypeTransform {
    fn transform(&mut self, ty: &Type) -> Option<Type>;

    fn should_descend(&mut self, _ty: &Type) -> bool {
        true
    }

    /// Every variable occurrence, including those not wrapped in a
    /// `Type::Variable` node (concatenation middles, parameter-variadic
    /// tails). `None` keeps the variable.
    fn transform_variable(&mut self, _variable: &Variable) -> Option<Variable> {
        None
    }
}

/// Apply `transform` to `ty`, rebuilding only what changes.
pub fn transform(ty: &Type, visitor: &mut impl TypeTransform) -> Type {
    rebuild(ty, visitor)
}

fn rebuild(ty: &Type, visitor: &mut impl TypeTransform) -> Type {
    let rebuilt = if visitor.should_descend(ty) {
        rebuild_children(ty, visitor)
    } else {
        ty.clone()
    };
    visitor.transform(&rebuilt).unwrap_or(rebuilt)
}

fn rebuild_children(ty: &Type, visitor: &mut impl TypeTransform) -> Type {
    match ty {
        Type::Bottom | Type::Top | Type::Any | Type::Primitive(_) | Type::Literal(_) => ty.clone(),
        Type::Parametric { name, parameters } => Type::Parametric {
            name: *name,
            parameters: parameters
                .iter()
                .map(|parameter| rebuild_parameter(parameter, visitor))
                .collect(),
        },
        Type::Optional(inner) => Type::Optional(Box::new(rebuild(inner, visitor))),
        Type::Union(members) => {
            // Rebuild members without re-canonicalizing; transforms that can
            // break canonicity re-union explicitly.
            Type::Union(
                members
                    .iter()
                    .map(|member| rebuild(member, visitor))
                    .collect(),
            )
        }
        Type::Tuple(Tuple::Bounded(ordered)) => {
            Type::Tuple(Tuple::Bounded(rebuild_ordered(ordered, visitor)))
        }
        Type::Tuple(Tuple::Unbounded(element)) => {
            Type::Tuple(Tuple::Unbounded(Box::new(rebuild(element, visitor))))
        }
        Type::TypedDictionary(dictionary) => Type::TypedDictionary(TypedDictionary {
            name: dictionary.name,
            fields: dictionary
                .fields
                .iter()
                .map(|field| crate::types::TypedDictionaryField {
                    name: field.name,
                    annotation: rebuild(&field.annotation, visitor),
                })
                .collect(),
            total: dictionary.total,
        }),
        Type::Callable(callable) => Type::Callable(Box::new(rebuild_callable(callable, visitor))),
        Type::Variable(variable) => {
            match visitor.transform_variable(&Variable::Unary(variable.clone())) {
                Some(Variable::Unary(rewritten)) => Type::Variable(rewritten),
                _ => ty.clone(),
            }
        }
        Type::ParameterVariadicComponent(component) => {
            match visitor.transform_variable(&Variable::ParameterVariadic(
                component.variable.clone(),
            )) {
                Some(Variable::ParameterVariadic(rewritten)) => {
                    Type::ParameterVariadicComponent(ParameterVariadicComponent {
                        component: component.component,
                        variable: rewritten,
                    })
                }
                _ => ty.clone(),
            }
        }
        Type::Annotated(inner) => Type::Annotated(Box::new(rebuild(inner, visitor))),
    }
}

fn rebuild_parameter(parameter: &Parameter, visitor: &mut impl TypeTransform) -> Parameter {
    match parameter {
        Parameter::Single(ty) => Parameter::Single(rebuild(ty, visitor)),
        Parameter::Group(ordered) => Parameter::Group(rebuild_ordered(ordered, visitor)),
        Parameter::CallableParameters(parameters) => {
            Parameter::CallableParameters(rebuild_parameters(parameters, visitor))
        }
    }
}

fn rebuild_ordered(ordered: &OrderedTypes, visitor: &mut impl TypeTransform) -> OrderedTypes {
    match ordered {
        OrderedTypes::Concrete(types) => {
            OrderedTypes::Concrete(types.iter().map(|ty| rebuild(ty, visitor)).collect())
        }
        OrderedTypes::Concatenation(concatenation) => {
            OrderedTypes::Concatenation(rebuild_concatenation(concatenation, visitor))
        }
    }
}

fn rebuild_concatenation(
    concatenation: &Concatenation,
    visitor: &mut impl TypeTransform,
) -> Concatenation {
    let middle = match visitor.transform_variable(&Variable::ListVariadic(
        concatenation.middle.clone(),
    )) {
        Some(Variable::ListVariadic(rewritten)) => rewritten,
        _ => concatenation.middle.clone(),
    };
    Concatenation {
        head: concatenation
            .head
            .iter()
            .map(|ty| rebuild(ty, visitor))
            .collect(),
        middle,
        mappers: concatenation.mappers.clone(),
        tail: concatenation
            .tail
            .iter()
            .map(|ty| rebuild(ty, visitor))
            .collect(),
    }
}

fn rebuild_parameters(
    parameters: &CallableParameters,
    visitor: &mut impl TypeTransform,
) -> CallableParameters {
    match parameters {
        CallableParameters::Undefined => CallableParameters::Undefined,
        CallableParameters::Defined(defined) => CallableParameters::Defined(
            defined
                .iter()
                .map(|parameter| match parameter {
                    CallableParameter::PositionalOnly {
                        index,
                        annotation,
                        default,
                    } => CallableParameter::PositionalOnly {
                        index: *index,
                        annotation: rebuild(annotation, visitor),
                        default: *default,
                    },
                    CallableParameter::Named {
                        name,
                        annotation,
                        default,
                    } => CallableParameter::Named {
                        name: *name,
                        annotation: rebuild(annotation, visitor),
                        default: *default,
                    },
                    CallableParameter::KeywordOnly {
                        name,
                        annotation,
                        default,
                    } => CallableParameter::KeywordOnly {
                        name: *name,
                        annotation: rebuild(annotation, visitor),
                        default: *default,
                    },
                    CallableParameter::Variable(StarParameter::Concrete(annotation)) => {
                        CallableParameter::Variable(StarParameter::Concrete(rebuild(
                            annotation, visitor,
                        )))
                    }
                    CallableParameter::Variable(StarParameter::Concatenation(concatenation)) => {
                        CallableParameter::Variable(StarParameter::Concatenation(
                            rebuild_concatenation(concatenation, visitor),
                        ))
                    }
                    CallableParameter::Keywords(annotation) => {
                        CallableParameter::Keywords(rebuild(annotation, visitor))
                    }
                })
                .collect(),
        ),
        CallableParameters::ParameterVariadicTypeVariable { head, variable } => {
            let variable = match visitor
                .transform_variable(&Variable::ParameterVariadic(variable.clone()))
            {
                Some(Variable::ParameterVariadic(rewritten)) => rewritten,
                _ => variable.clone(),
            };
            CallableParameters::ParameterVariadicTypeVariable {
                head: head.iter().map(|ty| rebuild(ty, visitor)).collect(),
                variable,
            }
        }
    }
}

fn rebuild_overload(overload: &Overload, visitor: &mut impl TypeTransform) -> Overload {
    Overload {
        annotation: rebuild(&overload.annotation, visitor),
        parameters: rebuild_parameters(&overload.parameters, visitor),
    }
}

fn rebuild_callable(callable: &Callable, visitor: &mut impl TypeTransform) -> Callable {
    Callable {
        kind: callable.kind.clone(),
        implementation: rebuild_overload(&callable.implementation, visitor),
        overloads: callable
            .overloads
            .iter()
            .map(|overload| rebuild_overload(overload, visitor))
            .collect(),
        implicit: callable.implicit.as_ref().map(|implicit| Implicit {
            implicit_annotation: rebuild(&implicit.implicit_annotation, visitor),
            name: implicit.name,
        }),
    }
}

// =============================================================================
// Function-style wrappers
// =============================================================================

struct FnTransform<'a, F: FnMut(&Type) -> Option<Type>> {
    f: &'a mut F,
}

impl<F: FnMut(&Type) -> Option<Type>> TypeTransform for FnTransform<'_, F> {
    fn transform(&mut self, ty: &Type) -> Option<Type> {
        (self.f)(ty)
    }
}

/// Bottom-up rewrite with a plain closure.
pub fn map_bottom_up(ty: &Type, f: &mut impl FnMut(&Type) -> Option<Type>) -> Type {
    transform(ty, &mut FnTransform { f })
}

struct VariableTransform<'a, F: FnMut(Variable) -> Variable> {
    f: &'a mut F,
}

impl<F: FnMut(Variable) -> Variable> TypeTransform for VariableTransform<'_, F> {
    fn transform(&mut self, _ty: &Type) -> Option<Type> {
        None
    }

    fn transform_variable(&mut self, variable: &Variable) -> Option<Variable> {
        Some((self.f)(variable.clone()))
    }
}

/// Rewrite every variable occurrence, of any kind, wherever it appears.
pub fn map_variables(ty: &Type, f: &mut impl FnMut(Variable) -> Variable) -> Type {
    transform(ty, &mut VariableTransform { f })
}

/// Top-down substitution. Where `f` answers, the subterm is replaced without
/// descending further; `widen` maps a `Bottom` replacement to `Top`. `f` must
/// be deterministic: it is consulted once to gate descent and once on the
/// (then unchanged) subterm to replace it.
pub fn instantiate(ty: &Type, widen: bool, f: &mut impl FnMut(&Type) -> Option<Type>) -> Type {
    struct Instantiate<'a, F: FnMut(&Type) -> Option<Type>> {
        f: &'a mut F,
        widen: bool,
    }
    impl<F: FnMut(&Type) -> Option<Type>> TypeTransform for Instantiate<'_, F> {
        fn should_descend(&mut self, ty: &Type) -> bool {
            (self.f)(ty).is_none()
        }

        fn transform(&mut self, ty: &Type) -> Option<Type> {
            (self.f)(ty).map(|replacement| {
                if self.widen && replacement == Type::Bottom {
                    Type::Top
                } else {
                    replacement
                }
            })
        }
    }
    transform(ty, &mut Instantiate { f, widen })
}

// =============================================================================
// Folds
// =============================================================================

/// Whether any subterm satisfies `predicate`. Traverses the same positions
/// as the transform.
pub fn exists(ty: &Type, predicate: &mut impl FnMut(&Type) -> bool) -> bool {
    let mut found = false;
    let _ = map_bottom_up(ty, &mut |subterm| {
        if predicate(subterm) {
            found = true;
        }
        None
    });
    found
}

/// Every variable occurrence, of all three kinds.
pub fn collect_variables(ty: &Type) -> Vec<Variable> {
    let mut variables = Vec::new();
    let _ = map_variables(ty, &mut |variable| {
        variables.push(variable.clone());
        variable
    });
    variables
}

/// Variable occurrences whose state is `Free`.
pub fn collect_free_variables(ty: &Type) -> Vec<Variable> {
    collect_variables(ty)
        .into_iter()
        .filter(Variable::is_free)
        .collect()
}

/// No variables, no `Any`/`Top`/`Bottom` (other than the `Bottom` inside the
/// canonical `None`), no escaped occurrences.
pub fn is_concrete(ty: &Type) -> bool {
    if ty.is_none() {
        return true;
    }
    match ty {
        Type::Any | Type::Top | Type::Bottom => false,
        Type::Variable(_) | Type::ParameterVariadicComponent(_) => false,
        Type::Primitive(_) => !ty.is_undeclared(),
        Type::Literal(_) => true,
        Type::Optional(inner) => is_concrete(inner),
        Type::Annotated(inner) => is_concrete(inner),
        Type::Union(members) => members.iter().all(is_concrete),
        Type::Tuple(Tuple::Bounded(ordered)) => is_concrete_ordered(ordered),
        Type::Tuple(Tuple::Unbounded(element)) => is_concrete(element),
        Type::Parametric { parameters, .. } => parameters.iter().all(|parameter| match parameter {
            Parameter::Single(ty) => is_concrete(ty),
            Parameter::Group(ordered) => is_concrete_ordered(ordered),
            Parameter::CallableParameters(parameters) => is_concrete_parameters(parameters),
        }),
        Type::TypedDictionary(dictionary) => dictionary
            .fields
            .iter()
            .all(|field| is_concrete(&field.annotation)),
        Type::Callable(callable) => {
            let overload_concrete = |overload: &Overload| {
                is_concrete(&overload.annotation) && is_concrete_parameters(&overload.parameters)
            };
            overload_concrete(&callable.implementation)
                && callable.overloads.iter().all(overload_concrete)
        }
    }
}

fn is_concrete_ordered(ordered: &OrderedTypes) -> bool {
    match ordered {
        OrderedTypes::Concrete(types) => types.iter().all(is_concrete),
        OrderedTypes::Concatenation(_) => false,
    }
}

fn is_concrete_parameters(parameters: &CallableParameters) -> bool {
    match parameters {
        // `Callable[..., R]` is gradual, not concrete.
        CallableParameters::Undefined => false,
        CallableParameters::Defined(defined) => defined.iter().all(|parameter| match parameter {
            CallableParameter::Variable(StarParameter::Concatenation(_)) => false,
            CallableParameter::Variable(StarParameter::Concrete(annotation)) => {
                is_concrete(annotation)
            }
            parameter => parameter.annotation().map(is_concrete).unwrap_or(true),
        }),
        CallableParameters::ParameterVariadicTypeVariable { .. } => false,
    }
}

//! Attribute tables and receiver instantiation.
//!
//! A class's attribute table holds *uninstantiated* records: annotations
//! still expressed over the class's own type variables, methods still
//! carrying their `self` parameter. Access through a receiver instantiates
//! the record: the receiver is solved against the defining class to obtain
//! the substitution, methods get `self` bound and dropped, and the special
//! container classes synthesize their index/update members on the fly.

use crate::order::TypeOrder;
use indexmap::IndexMap;
use pyrite_common::{Atom, Reference};
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{
    solution_from_zipped, well_known, zip_variables_with_parameters, Callable, CallableKind,
    CallableParameter, CallableParameters, Implicit, Literal, OrderedTypes, Overload, Parameter,
    Solution, Tuple, Type, TypedDictionary, Variable,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    ReadWrite,
    ReadOnly { refinable: bool, overridable: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializedState {
    OnClass,
    OnlyOnInstance,
    /// Synthesized members (dataclass fields, stub fallbacks).
    Implicitly,
    NotInitialized,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UninstantiatedAnnotation {
    Method {
        callable: Callable,
        is_class_method: bool,
    },
    Attribute {
        annotation: Type,
        original_annotation: Type,
        is_property: bool,
    },
}

impl UninstantiatedAnnotation {
    pub fn annotation(&self) -> Type {
        match self {
            UninstantiatedAnnotation::Method { callable, .. } => {
                Type::Callable(Box::new(callable.clone()))
            }
            UninstantiatedAnnotation::Attribute { annotation, .. } => annotation.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstantiatedAttribute {
    pub name: Atom,
    pub parent: Atom,
    pub visibility: Visibility,
    pub initialized: InitializedState,
    pub is_async: bool,
    pub is_static: bool,
    pub is_class_variable: bool,
    pub accessed_via_metaclass: bool,
    pub annotation: UninstantiatedAnnotation,
}

impl UninstantiatedAttribute {
    pub fn method(name: Atom, parent: Atom, callable: Callable, is_class_method: bool) -> Self {
        Self {
            name,
            parent,
            visibility: Visibility::ReadWrite,
            initialized: InitializedState::OnClass,
            is_async: false,
            is_static: false,
            is_class_variable: false,
            accessed_via_metaclass: false,
            annotation: UninstantiatedAnnotation::Method {
                callable,
                is_class_method,
            },
        }
    }

    pub fn simple(name: Atom, parent: Atom, annotation: Type) -> Self {
        Self {
            name,
            parent,
            visibility: Visibility::ReadWrite,
            initialized: InitializedState::OnClass,
            is_async: false,
            is_static: false,
            is_class_variable: false,
            accessed_via_metaclass: false,
            annotation: UninstantiatedAnnotation::Attribute {
                annotation: annotation.clone(),
                original_annotation: annotation,
                is_property: false,
            },
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(
            self.annotation,
            UninstantiatedAnnotation::Attribute {
                is_property: true,
                ..
            }
        )
    }
}

/// Attribute name -> uninstantiated record, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    attributes: IndexMap<Atom, UninstantiatedAttribute>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: UninstantiatedAttribute) {
        self.attributes.insert(attribute.name, attribute);
    }

    /// Insert only when absent; used by stub and decorator synthesis.
    pub fn insert_if_missing(&mut self, attribute: UninstantiatedAttribute) {
        self.attributes.entry(attribute.name).or_insert(attribute);
    }

    pub fn lookup(&self, name: Atom) -> Option<&UninstantiatedAttribute> {
        self.attributes.get(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = Atom> + '_ {
        self.attributes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UninstantiatedAttribute> {
        self.attributes.values()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstantiatedAttribute {
    pub name: Atom,
    pub parent: Atom,
    pub visibility: Visibility,
    pub initialized: InitializedState,
    pub is_class_variable: bool,
    pub annotation: Type,
}

impl TypeOrder<'_> {
    /// Resolve the receiver's parameters into an uninstantiated attribute
    /// (and specialize `self` for methods).
    pub fn instantiate_attribute(
        &mut self,
        attribute: &UninstantiatedAttribute,
        receiver: &Type,
    ) -> InstantiatedAttribute {
        let names = well_known();
        let annotation = match &attribute.annotation {
            UninstantiatedAnnotation::Method {
                callable,
                is_class_method,
            } => {
                let bound = if attribute.is_static {
                    // Static methods see no receiver at all.
                    callable.clone()
                } else if *is_class_method || attribute.name == names.new {
                    self.bind_receiver(callable, &Type::meta(receiver.clone()))
                } else {
                    self.bind_receiver(callable, receiver)
                };
                Type::Callable(Box::new(bound))
            }
            UninstantiatedAnnotation::Attribute {
                annotation,
                is_property,
                ..
            } => {
                if *is_property {
                    // Properties may mention variables never declared on the
                    // class; those instantiate straight to the receiver.
                    let declared: Vec<Variable> = self
                        .handler
                        .hierarchy()
                        .variables(attribute.parent)
                        .unwrap_or_default();
                    pyrite_types::visitor::map_bottom_up(annotation, &mut |ty| match ty {
                        Type::Variable(variable)
                            if variable.is_free()
                                && !declared
                                    .iter()
                                    .any(|declared| declared.name() == variable.name) =>
                        {
                            Some(receiver.clone())
                        }
                        _ => None,
                    })
                } else {
                    annotation.clone()
                }
            }
        };

        // Solve `receiver <= parent` for the substitution that specializes
        // the defining class's variables.
        let solution = self.receiver_solution(receiver, attribute.parent);
        InstantiatedAttribute {
            name: attribute.name,
            parent: attribute.parent,
            visibility: attribute.visibility,
            initialized: attribute.initialized,
            is_class_variable: attribute.is_class_variable,
            annotation: solution.instantiate(&annotation),
        }
    }

    fn receiver_solution(&mut self, receiver: &Type, parent: Atom) -> Solution {
        let declared = self
            .handler
            .hierarchy()
            .variables(parent)
            .unwrap_or_default();
        if declared.is_empty() {
            return Solution::empty();
        }
        self.handler
            .hierarchy()
            .instantiate_successors_parameters(receiver, parent)
            .and_then(|parameters| zip_variables_with_parameters(&declared, &parameters))
            .map(solution_from_zipped)
            .unwrap_or_else(Solution::empty)
    }

    /// Bind the first parameter of every overload to `receiver` and drop it.
    fn bind_receiver(&mut self, callable: &Callable, receiver: &Type) -> Callable {
        let self_annotation = match &callable.implementation.parameters {
            CallableParameters::Defined(parameters) => parameters
                .first()
                .and_then(CallableParameter::annotation)
                .cloned(),
            _ => None,
        };
        let specialized = match self_annotation {
            Some(self_annotation) if self_annotation.contains_variable() => {
                // `def method(self: S) -> S` style; solving the receiver
                // against the annotation specializes S.
                let solved = self
                    .solve_less_or_equal(&ConstraintSet::empty(), receiver, &self_annotation)
                    .into_iter()
                    .find_map(|constraints| constraints.solve(self));
                match solved {
                    Some(solution) => callable.map_implementation_and_overloads(|overload| {
                        Overload {
                            annotation: solution.instantiate(&overload.annotation),
                            parameters: match &overload.parameters {
                                CallableParameters::Defined(parameters) => {
                                    CallableParameters::Defined(
                                        parameters
                                            .iter()
                                            .map(|parameter| {
                                                map_parameter_annotation(parameter, |annotation| {
                                                    solution.instantiate(annotation)
                                                })
                                            })
                                            .collect(),
                                    )
                                }
                                parameters => parameters.clone(),
                            },
                        }
                    }),
                    None => callable.clone(),
                }
            }
            _ => callable.clone(),
        };
        let mut bound = specialized.drop_first_parameter();
        bound.implicit = Some(Implicit {
            implicit_annotation: receiver.clone(),
            name: well_known().self_parameter,
        });
        bound
    }

    /// Special members the resolver synthesizes per receiver shape.
    pub fn synthesized_attribute(
        &mut self,
        receiver: &Type,
        attribute_name: Atom,
    ) -> Option<InstantiatedAttribute> {
        let names = well_known();
        match receiver.strip_annotated() {
            Type::TypedDictionary(dictionary) => {
                typed_dictionary_method(dictionary, attribute_name).map(|callable| {
                    synthesized(attribute_name, dictionary.class_name(), callable)
                })
            }
            Type::Tuple(Tuple::Bounded(OrderedTypes::Concrete(elements)))
                if attribute_name == names.getitem =>
            {
                Some(synthesized(
                    attribute_name,
                    names.tuple,
                    bounded_tuple_getitem(elements),
                ))
            }
            // `type[C]` subscribed as a generic alias.
            ty if ty.is_meta() && attribute_name == names.getitem => {
                let instance = match ty {
                    Type::Parametric { parameters, .. } => parameters
                        .first()
                        .and_then(Parameter::as_single)
                        .cloned()
                        .unwrap_or(Type::Any),
                    _ => Type::Any,
                };
                let class_name = instance.primitive_name()?;
                let declared = self
                    .handler
                    .hierarchy()
                    .variables(class_name)
                    .unwrap_or_default();
                Some(synthesized(
                    attribute_name,
                    names.generic_meta,
                    generic_meta_getitem(class_name, &declared),
                ))
            }
            _ => None,
        }
    }
}

fn map_parameter_annotation(
    parameter: &CallableParameter,
    mut f: impl FnMut(&Type) -> Type,
) -> CallableParameter {
    match parameter {
        CallableParameter::PositionalOnly {
            index,
            annotation,
            default,
        } => CallableParameter::PositionalOnly {
            index: *index,
            annotation: f(annotation),
            default: *default,
        },
        CallableParameter::Named {
            name,
            annotation,
            default,
        } => CallableParameter::Named {
            name: *name,
            annotation: f(annotation),
            default: *default,
        },
        CallableParameter::KeywordOnly {
            name,
            annotation,
            default,
        } => CallableParameter::KeywordOnly {
            name: *name,
            annotation: f(annotation),
            default: *default,
        },
        CallableParameter::Variable(star) => CallableParameter::Variable(match star {
            pyrite_types::StarParameter::Concrete(annotation) => {
                pyrite_types::StarParameter::Concrete(f(annotation))
            }
            star => star.clone(),
        }),
        CallableParameter::Keywords(annotation) => CallableParameter::Keywords(f(annotation)),
    }
}

fn synthesized(name: Atom, parent: Atom, callable: Callable) -> InstantiatedAttribute {
    InstantiatedAttribute {
        name,
        parent,
        visibility: Visibility::ReadWrite,
        initialized: InitializedState::Implicitly,
        is_class_variable: false,
        annotation: Type::Callable(Box::new(callable)),
    }
}

fn named_method(name: &str, overloads: Vec<Overload>, implementation: Overload) -> Callable {
    Callable {
        kind: CallableKind::Named(Reference::new(name)),
        implementation,
        overloads,
        implicit: None,
    }
}

fn positional(index: usize, annotation: Type) -> CallableParameter {
    CallableParameter::PositionalOnly {
        index,
        annotation,
        default: false,
    }
}

fn positional_with_default(index: usize, annotation: Type) -> CallableParameter {
    CallableParameter::PositionalOnly {
        index,
        annotation,
        default: true,
    }
}

/// The key-literal-driven overloads of a typed dictionary's methods,
/// computed from its field list. Non-total dictionaries additionally allow
/// `pop` and `__delitem__`.
fn typed_dictionary_method(
    dictionary: &TypedDictionary,
    attribute_name: Atom,
) -> Option<Callable> {
    let names = well_known();
    let key_literal =
        |field: &pyrite_types::TypedDictionaryField| Type::Literal(Literal::String(field.name));

    let per_field = |build: &dyn Fn(&pyrite_types::TypedDictionaryField) -> Overload| {
        dictionary.fields.iter().map(build).collect::<Vec<_>>()
    };

    if attribute_name == names.getitem {
        let overloads = per_field(&|field| Overload {
            annotation: field.annotation.clone(),
            parameters: CallableParameters::Defined(vec![positional(0, key_literal(field))]),
        });
        let implementation = Overload {
            annotation: Type::Bottom,
            parameters: CallableParameters::Defined(vec![positional(0, Type::string())]),
        };
        return Some(named_method("__getitem__", overloads, implementation));
    }
    if attribute_name == names.setitem {
        let overloads = per_field(&|field| Overload {
            annotation: Type::none(),
            parameters: CallableParameters::Defined(vec![
                positional(0, key_literal(field)),
                positional(1, field.annotation.clone()),
            ]),
        });
        let implementation = Overload {
            annotation: Type::none(),
            parameters: CallableParameters::Defined(vec![
                positional(0, Type::string()),
                positional(1, Type::Bottom),
            ]),
        };
        return Some(named_method("__setitem__", overloads, implementation));
    }
    if attribute_name == names.get {
        let mut overloads = Vec::with_capacity(dictionary.fields.len() * 2);
        for field in &dictionary.fields {
            overloads.push(Overload {
                annotation: Type::optional(field.annotation.clone()),
                parameters: CallableParameters::Defined(vec![positional(0, key_literal(field))]),
            });
            overloads.push(Overload {
                annotation: field.annotation.clone(),
                parameters: CallableParameters::Defined(vec![
                    positional(0, key_literal(field)),
                    positional(1, field.annotation.clone()),
                ]),
            });
        }
        let implementation = Overload {
            annotation: Type::Any,
            parameters: CallableParameters::Defined(vec![
                positional(0, Type::string()),
                positional_with_default(1, Type::Any),
            ]),
        };
        return Some(named_method("get", overloads, implementation));
    }
    if attribute_name == names.setdefault {
        let overloads = per_field(&|field| Overload {
            annotation: field.annotation.clone(),
            parameters: CallableParameters::Defined(vec![
                positional(0, key_literal(field)),
                positional(1, field.annotation.clone()),
            ]),
        });
        let implementation = Overload {
            annotation: Type::Any,
            parameters: CallableParameters::Defined(vec![
                positional(0, Type::string()),
                positional(1, Type::Any),
            ]),
        };
        return Some(named_method("setdefault", overloads, implementation));
    }
    if attribute_name == names.update {
        let implementation = Overload {
            annotation: Type::none(),
            parameters: CallableParameters::Defined(vec![positional(
                0,
                Type::TypedDictionary(dictionary.clone()),
            )]),
        };
        return Some(named_method("update", Vec::new(), implementation));
    }
    if !dictionary.total && attribute_name == names.pop {
        let mut overloads = Vec::with_capacity(dictionary.fields.len() * 2);
        for field in &dictionary.fields {
            overloads.push(Overload {
                annotation: Type::optional(field.annotation.clone()),
                parameters: CallableParameters::Defined(vec![positional(0, key_literal(field))]),
            });
            overloads.push(Overload {
                annotation: field.annotation.clone(),
                parameters: CallableParameters::Defined(vec![
                    positional(0, key_literal(field)),
                    positional(1, field.annotation.clone()),
                ]),
            });
        }
        let implementation = Overload {
            annotation: Type::Any,
            parameters: CallableParameters::Defined(vec![
                positional(0, Type::string()),
                positional_with_default(1, Type::Any),
            ]),
        };
        return Some(named_method("pop", overloads, implementation));
    }
    if !dictionary.total && attribute_name == names.delitem {
        let overloads = per_field(&|field| Overload {
            annotation: Type::none(),
            parameters: CallableParameters::Defined(vec![positional(0, key_literal(field))]),
        });
        let implementation = Overload {
            annotation: Type::none(),
            parameters: CallableParameters::Defined(vec![positional(0, Type::string())]),
        };
        return Some(named_method("__delitem__", overloads, implementation));
    }
    None
}

/// `__getitem__` of a bounded tuple: one overload per index with a literal
/// key, plus an `int` fallback over the union of elements.
fn bounded_tuple_getitem(elements: &[Type]) -> Callable {
    let overloads = elements
        .iter()
        .enumerate()
        .map(|(index, element)| Overload {
            annotation: element.clone(),
            parameters: CallableParameters::Defined(vec![positional(
                0,
                Type::literal_integer(index as i64),
            )]),
        })
        .collect();
    let implementation = Overload {
        annotation: Type::union(elements.to_vec()),
        parameters: CallableParameters::Defined(vec![positional(0, Type::integer())]),
    };
    named_method("tuple.__getitem__", overloads, implementation)
}

/// `GenericMeta.__getitem__`: the parameter a generic class expects when
/// subscripted, special-cased for `Literal`, `Union`, `Optional`,
/// `Callable`, and list-variadic classes. The special-case list is closed.
fn generic_meta_getitem(class_name: Atom, declared: &[Variable]) -> Callable {
    let names = well_known();
    let parameter = if class_name == names.literal {
        // Any literal value is admissible; validation happens later.
        positional(0, Type::object())
    } else if class_name == names.union || class_name == names.callable {
        positional(0, Type::unbounded_tuple(Type::meta(Type::Any)))
    } else if class_name == names.optional {
        positional(0, Type::meta(Type::Any))
    } else if declared
        .iter()
        .any(|variable| matches!(variable, Variable::ListVariadic(_)))
    {
        positional(0, Type::unbounded_tuple(Type::meta(Type::Any)))
    } else if declared.len() == 1 {
        positional(0, Type::meta(Type::Any))
    } else {
        positional(
            0,
            Type::tuple(vec![Type::meta(Type::Any); declared.len().max(1)]),
        )
    };
    let instance = if declared.is_empty() {
        Type::Primitive(class_name)
    } else {
        Type::Parametric {
            name: class_name,
            parameters: vec![Parameter::Single(Type::Any); declared.len()],
        }
    };
    named_method(
        "typing.GenericMeta.__getitem__",
        Vec::new(),
        Overload {
            annotation: Type::meta(instance),
            parameters: CallableParameters::Defined(vec![parameter]),
        },
    )
}

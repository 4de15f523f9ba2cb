//! Dataclass-like decorator expansion.
//!
//! `@dataclasses.dataclass` (and `@attr.s`) classes get `__init__`,
//! `__repr__`, `__eq__`, and the ordering methods synthesized from their
//! attribute-typed fields. Fields are collected subclass-last so identically
//! named fields override parents while keeping the original position.

use crate::attributes::{
    AttributeTable, InitializedState, UninstantiatedAttribute, Visibility,
};
use pyrite_ast::{Argument, Expression, Node};
use pyrite_common::{Atom, Reference};
use pyrite_types::{
    well_known, Callable, CallableKind, CallableParameter, CallableParameters, Overload,
    Parameter, Type,
};

const DATACLASS_DECORATORS: &[&str] = &["dataclasses.dataclass", "dataclass"];
const ATTRS_DECORATORS: &[&str] = &["attr.s", "attr.attrs"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataclassOptions {
    pub init: bool,
    pub repr: bool,
    pub eq: bool,
    pub order: bool,
    /// `attr.s` collects fields only from the decorated class, never from
    /// parent dataclasses.
    pub collect_parent_fields: bool,
}

impl DataclassOptions {
    fn defaults(collect_parent_fields: bool) -> Self {
        Self {
            init: true,
            repr: true,
            eq: true,
            order: false,
            collect_parent_fields,
        }
    }

    /// Recognize a dataclass-like decorator and extract its boolean options.
    /// Non-boolean or unknown keywords keep their defaults.
    pub fn from_decorator(decorator: &Node<Expression>) -> Option<Self> {
        let target = decorator.value.call_target()?.to_string();
        let mut options = if DATACLASS_DECORATORS.contains(&target.as_str()) {
            Self::defaults(true)
        } else if ATTRS_DECORATORS.contains(&target.as_str()) {
            Self::defaults(false)
        } else {
            return None;
        };
        if let Expression::Call(call) = &decorator.value {
            for Argument { name, value } in &call.arguments {
                let Some(name) = name else { continue };
                let flag = match &value.value {
                    Expression::True => true,
                    Expression::False => false,
                    _ => continue,
                };
                let name = pyrite_common::resolve(name.value);
                match name.as_ref() {
                    "init" => options.init = flag,
                    "repr" => options.repr = flag,
                    "eq" => options.eq = flag,
                    "order" => options.order = flag,
                    _ => {}
                }
            }
        }
        Some(options)
    }
}

/// One attribute-typed field, in declaration order. `InitVar[T]` has already
/// been unwrapped to `T` by the time the annotation lands here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataclassField {
    pub name: Atom,
    pub annotation: Type,
    pub has_default: bool,
}

/// Whether an assignment's value expression counts as providing a default.
/// Recognizes plain values plus the `field(...)`/`attr.ib(...)` call
/// patterns carrying `default=` or `default_factory=`.
pub fn value_provides_default(value: &Node<Expression>) -> bool {
    match &value.value {
        Expression::Call(call) => {
            let target = call
                .callee
                .value
                .as_reference()
                .map(|reference| reference.to_string());
            match target.as_deref() {
                Some("dataclasses.field") | Some("field") | Some("attr.ib") => {
                    call.arguments.iter().any(|argument| {
                        argument
                            .name
                            .as_ref()
                            .map(|name| {
                                let name = pyrite_common::resolve(name.value);
                                name.as_ref() == "default" || name.as_ref() == "default_factory"
                            })
                            .unwrap_or(false)
                    })
                }
                _ => true,
            }
        }
        _ => true,
    }
}

/// Unwrap `dataclasses.InitVar[T]` to `T`.
pub fn unwrap_init_var(annotation: &Type) -> Type {
    let names = well_known();
    match annotation {
        Type::Parametric { name, parameters } if *name == names.init_var => parameters
            .first()
            .and_then(Parameter::as_single)
            .cloned()
            .unwrap_or(Type::Any),
        annotation => annotation.clone(),
    }
}

/// Merge parent fields (most distant first) with the class's own; a
/// same-named redeclaration overrides in place.
pub fn merge_fields(inherited: Vec<Vec<DataclassField>>, own: Vec<DataclassField>) -> Vec<DataclassField> {
    let mut merged: Vec<DataclassField> = Vec::new();
    let mut override_field = |field: DataclassField, merged: &mut Vec<DataclassField>| {
        match merged.iter_mut().find(|existing| existing.name == field.name) {
            Some(existing) => *existing = field,
            None => merged.push(field),
        }
    };
    for fields in inherited {
        for field in fields {
            override_field(field, &mut merged);
        }
    }
    for field in own {
        override_field(field, &mut merged);
    }
    merged
}

/// Synthesize the decorator's methods into `table`, honoring `options`.
/// Explicitly declared members always win over synthesized ones.
pub fn synthesize_methods(
    table: &mut AttributeTable,
    class_name: Atom,
    fields: &[DataclassField],
    options: &DataclassOptions,
) {
    let names = well_known();
    let self_parameter = CallableParameter::Named {
        name: names.self_parameter,
        annotation: Type::Primitive(class_name),
        default: false,
    };

    if options.init {
        let mut parameters = vec![self_parameter.clone()];
        parameters.extend(fields.iter().map(|field| CallableParameter::Named {
            name: field.name,
            annotation: unwrap_init_var(&field.annotation),
            default: field.has_default,
        }));
        table.insert_if_missing(synthesized_method(
            class_name,
            names.init,
            parameters,
            Type::none(),
        ));
    }
    if options.repr {
        table.insert_if_missing(synthesized_method(
            class_name,
            names.repr,
            vec![self_parameter.clone()],
            Type::string(),
        ));
    }
    if options.eq {
        table.insert_if_missing(comparison_method(
            class_name,
            names.eq,
            Type::object(),
            self_parameter.clone(),
        ));
    }
    if options.order {
        for method in [names.lt, names.le, names.gt, names.ge] {
            table.insert_if_missing(comparison_method(
                class_name,
                method,
                Type::Primitive(class_name),
                self_parameter.clone(),
            ));
        }
    }

    // Every synthesized field is implicitly initialized.
    for field in fields {
        let mut attribute = UninstantiatedAttribute::simple(
            field.name,
            class_name,
            unwrap_init_var(&field.annotation),
        );
        attribute.initialized = InitializedState::Implicitly;
        attribute.visibility = Visibility::ReadWrite;
        table.insert_if_missing(attribute);
    }
}

fn synthesized_method(
    class_name: Atom,
    method_name: Atom,
    parameters: Vec<CallableParameter>,
    annotation: Type,
) -> UninstantiatedAttribute {
    let callable = Callable {
        kind: CallableKind::Named(
            Reference::from_components(vec![class_name, method_name]),
        ),
        implementation: Overload {
            annotation,
            parameters: CallableParameters::Defined(parameters),
        },
        overloads: Vec::new(),
        implicit: None,
    };
    let mut attribute =
        UninstantiatedAttribute::method(method_name, class_name, callable, false);
    attribute.initialized = InitializedState::Implicitly;
    attribute
}

fn comparison_method(
    class_name: Atom,
    method_name: Atom,
    other_annotation: Type,
    self_parameter: CallableParameter,
) -> UninstantiatedAttribute {
    synthesized_method(
        class_name,
        method_name,
        vec![
            self_parameter,
            CallableParameter::Named {
                name: pyrite_common::intern("other"),
                annotation: other_annotation,
                default: false,
            },
        ],
        Type::boolean(),
    )
}

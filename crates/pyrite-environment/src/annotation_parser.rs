//! Layer 10's helper: AST expressions -> types (C10).
//!
//! The parser knows the builtin vocabulary and the `typing` constructors;
//! everything else goes through the caller-supplied alias resolver and class
//! qualifier. Alias chains are resolved with a visited set; any shape the
//! parser cannot make sense of collapses to `Top` rather than erroring.

use pyrite_ast::{Expression, Name, Node};
use pyrite_common::{Atom, Reference};
use pyrite_types::{
    well_known, CallableParameters, Literal, Parameter, Type, UnaryVariable, Variable,
};
use rustc_hash::FxHashSet;

/// A resolved alias target.
#[derive(Clone, Debug, PartialEq)]
pub enum Alias {
    TypeAlias(Type),
    VariableAlias(Variable),
}

/// Name-resolution hooks the parser borrows from the layer above.
pub struct AnnotationContext<'r> {
    /// `X = Y`-style aliases and declared type variables.
    pub resolve_alias: &'r dyn Fn(&Reference) -> Option<Alias>,
    /// Short class name -> tracked qualified name.
    pub qualify: &'r dyn Fn(&Reference) -> Option<Atom>,
}

impl AnnotationContext<'_> {
    pub fn empty() -> AnnotationContext<'static> {
        AnnotationContext {
            resolve_alias: &|_| None,
            qualify: &|_| None,
        }
    }
}

pub fn parse_annotation(expression: &Node<Expression>, context: &AnnotationContext<'_>) -> Type {
    let mut visited = FxHashSet::default();
    parse(expression, context, &mut visited)
}

fn parse(
    expression: &Node<Expression>,
    context: &AnnotationContext<'_>,
    visited: &mut FxHashSet<Reference>,
) -> Type {
    match &expression.value {
        Expression::None => Type::none(),
        Expression::Ellipsis => Type::Primitive(well_known().ellipsis),
        // A string annotation is a forward reference; the external parser
        // re-parses it, so reaching here means it stayed opaque.
        Expression::String(_) => Type::Top,
        Expression::Name(_) => parse_name(expression, context, visited),
        Expression::Subscript(subscript) => parse_subscript(subscript, context, visited),
        _ => Type::Top,
    }
}

fn parse_name(
    expression: &Node<Expression>,
    context: &AnnotationContext<'_>,
    visited: &mut FxHashSet<Reference>,
) -> Type {
    let Some(reference) = expression.value.as_reference() else {
        return Type::Top;
    };
    let canonical = canonical_name(&reference);
    match canonical.as_str() {
        "object" => return Type::object(),
        "int" => return Type::integer(),
        "str" => return Type::string(),
        "bool" => return Type::boolean(),
        "float" => return Type::float(),
        "bytes" => return Type::bytes(),
        "complex" => return Type::Primitive(well_known().complex),
        "None" => return Type::none(),
        "typing.Any" => return Type::Any,
        "typing.NoReturn" => return Type::Bottom,
        "typing.Optional" | "typing.Union" | "typing.Callable" | "typing.Tuple" | "tuple" => {
            // Bare constructor mentions mean "any instantiation".
            return match canonical.as_str() {
                "typing.Tuple" | "tuple" => Type::unbounded_tuple(Type::Any),
                "typing.Callable" => Type::callable(CallableParameters::Undefined, Type::Any),
                _ => Type::Top,
            };
        }
        "list" => return Type::list(Type::Any),
        "dict" => return Type::dictionary(Type::Any, Type::Any),
        "set" => return Type::set(Type::Any),
        "type" => return Type::meta(Type::Any),
        _ => {}
    }

    // Aliases and declared variables win over bare class names.
    if visited.insert(reference.clone()) {
        if let Some(alias) = (context.resolve_alias)(&reference) {
            let parsed = match alias {
                Alias::TypeAlias(ty) => ty,
                Alias::VariableAlias(Variable::Unary(variable)) => Type::Variable(variable),
                Alias::VariableAlias(_) => Type::Top,
            };
            visited.remove(&reference);
            return parsed;
        }
        visited.remove(&reference);
    } else {
        // Alias cycle; refuse to loop.
        return Type::Top;
    }

    match (context.qualify)(&reference) {
        Some(qualified) => Type::Primitive(qualified),
        None => Type::Primitive(pyrite_common::intern(&canonical)),
    }
}

fn parse_subscript(
    subscript: &pyrite_ast::Subscript,
    context: &AnnotationContext<'_>,
    visited: &mut FxHashSet<Reference>,
) -> Type {
    let names = well_known();
    let Some(base) = subscript.base.value.as_reference() else {
        return Type::Top;
    };
    let canonical = canonical_name(&base);
    let index = &subscript.index;
    let arguments = |index: &Node<Expression>| -> Vec<Node<Expression>> {
        match &index.value {
            Expression::Tuple(entries) => entries.clone(),
            _ => vec![index.clone()],
        }
    };

    match canonical.as_str() {
        "typing.Optional" => {
            return Type::optional(parse(index, context, visited));
        }
        "typing.Union" => {
            return Type::union(
                arguments(index)
                    .iter()
                    .map(|argument| parse(argument, context, visited))
                    .collect(),
            );
        }
        "typing.Annotated" => {
            let mut entries = arguments(index);
            if entries.is_empty() {
                return Type::Top;
            }
            let annotated = parse(&entries.remove(0), context, visited);
            return Type::Annotated(Box::new(annotated));
        }
        "typing.Final" | "typing.ClassVar" => {
            return parse(index, context, visited);
        }
        "dataclasses.InitVar" => {
            return Type::parametric_over(names.init_var, vec![parse(index, context, visited)]);
        }
        "typing.Tuple" | "tuple" => {
            let entries = arguments(index);
            // Tuple[X, ...] is the unbounded form.
            if entries.len() == 2 && matches!(entries[1].value, Expression::Ellipsis) {
                return Type::unbounded_tuple(parse(&entries[0], context, visited));
            }
            if entries.len() == 1 && matches!(&entries[0].value, Expression::Tuple(e) if e.is_empty())
            {
                return Type::tuple(Vec::new());
            }
            return Type::tuple(
                entries
                    .iter()
                    .map(|entry| parse(entry, context, visited))
                    .collect(),
            );
        }
        "typing.Callable" => {
            let entries = arguments(index);
            if entries.len() == 2 {
                let parameters = match &entries[0].value {
                    Expression::List(parameter_entries) => CallableParameters::from_types(
                        parameter_entries
                            .iter()
                            .map(|entry| parse(entry, context, visited)),
                    ),
                    Expression::Ellipsis => CallableParameters::Undefined,
                    _ => CallableParameters::Undefined,
                };
                let annotation = parse(&entries[1], context, visited);
                return Type::callable(parameters, annotation);
            }
            return Type::callable(CallableParameters::Undefined, Type::Any);
        }
        "typing_extensions.Literal" | "typing.Literal" => {
            let members: Vec<Type> = arguments(index)
                .iter()
                .filter_map(|entry| match &entry.value {
                    Expression::Integer(value) => Some(Type::Literal(Literal::Integer(*value))),
                    Expression::String(value) => Some(Type::literal_string(value)),
                    Expression::True => Some(Type::Literal(Literal::Boolean(true))),
                    Expression::False => Some(Type::Literal(Literal::Boolean(false))),
                    Expression::None => Some(Type::none()),
                    _ => None,
                })
                .collect();
            if members.is_empty() {
                return Type::Top;
            }
            return Type::union(members);
        }
        "type" | "typing.Type" => {
            return Type::meta(parse(index, context, visited));
        }
        _ => {}
    }

    // Generic class subscription: List[int], Mapping[str, V], user classes.
    let constructor = match canonical.as_str() {
        "list" => names.list,
        "set" => names.set,
        "dict" => names.dict,
        "typing.Sequence" => names.sequence,
        "typing.Iterable" => names.iterable,
        "typing.Iterator" => names.iterator,
        "typing.Mapping" => names.mapping,
        "typing.MutableMapping" => names.mutable_mapping,
        "typing.AbstractSet" => names.abstract_set,
        "typing.Awaitable" => names.awaitable,
        "typing.Coroutine" => names.coroutine,
        _ => (context.qualify)(&base)
            .unwrap_or_else(|| pyrite_common::intern(&canonical)),
    };
    Type::Parametric {
        name: constructor,
        parameters: arguments(index)
            .iter()
            .map(|argument| Parameter::Single(parse(argument, context, visited)))
            .collect(),
    }
}

/// Normalize the spelling of typing names: `List` and `typing.List` both
/// mean the builtin `list`, `Text` means `str`.
fn canonical_name(reference: &Reference) -> String {
    let rendered = reference.to_string();
    let bare = rendered.strip_prefix("typing.").unwrap_or(&rendered);
    match bare {
        "List" => "list".to_string(),
        "Dict" => "dict".to_string(),
        "Set" => "set".to_string(),
        "Text" => "str".to_string(),
        "Type" => "typing.Type".to_string(),
        "Optional" | "Union" | "Callable" | "Tuple" | "Any" | "NoReturn" | "Annotated"
        | "Final" | "ClassVar" | "Sequence" | "Iterable" | "Iterator" | "Mapping"
        | "MutableMapping" | "AbstractSet" | "Awaitable" | "Coroutine" => {
            format!("typing.{}", bare)
        }
        "Literal" => "typing_extensions.Literal".to_string(),
        "InitVar" => "dataclasses.InitVar".to_string(),
        _ => rendered,
    }
}

/// The type of a literal display. Containers weaken their member literals
/// so `[1, 2]` reads as `list[int]`; scalars keep their singleton types.
pub fn literal_type(expression: &Node<Expression>) -> Type {
    let names = well_known();
    let member_union = |entries: &[Node<Expression>]| {
        Type::union(entries.iter().map(literal_type).collect()).weaken_literals()
    };
    match &expression.value {
        Expression::Integer(value) => Type::Literal(Literal::Integer(*value)),
        Expression::String(value) => Type::literal_string(value),
        Expression::Bytes(_) => Type::bytes(),
        Expression::Float(_) => Type::float(),
        Expression::True => Type::Literal(Literal::Boolean(true)),
        Expression::False => Type::Literal(Literal::Boolean(false)),
        Expression::None => Type::none(),
        Expression::Ellipsis => Type::Primitive(names.ellipsis),
        Expression::Tuple(entries) => Type::tuple(entries.iter().map(literal_type).collect()),
        Expression::List(entries) => {
            if entries.is_empty() {
                Type::list(Type::Bottom)
            } else {
                Type::list(member_union(entries))
            }
        }
        Expression::Set(entries) => {
            if entries.is_empty() {
                Type::set(Type::Bottom)
            } else {
                Type::set(member_union(entries))
            }
        }
        Expression::Dictionary(dictionary) => {
            if dictionary.entries.is_empty() && dictionary.keywords.is_empty() {
                Type::dictionary(Type::Bottom, Type::Bottom)
            } else {
                let keys: Vec<Node<Expression>> = dictionary
                    .entries
                    .iter()
                    .map(|(key, _)| key.clone())
                    .collect();
                let values: Vec<Node<Expression>> = dictionary
                    .entries
                    .iter()
                    .map(|(_, value)| value.clone())
                    .collect();
                Type::dictionary(member_union(&keys), member_union(&values))
            }
        }
        _ => Type::Top,
    }
}

/// Parse a declared type-variable call: `TypeVar("T", bound=int)`.
pub fn parse_type_variable(
    call: &pyrite_ast::Call,
    context: &AnnotationContext<'_>,
) -> Option<UnaryVariable> {
    use pyrite_types::{Constraints, Variance};
    let target = call.callee.value.as_reference()?.to_string();
    if target != "TypeVar" && target != "typing.TypeVar" {
        return None;
    }
    let name = call.arguments.first().and_then(|argument| {
        match &argument.value.value {
            Expression::String(name) => Some(pyrite_common::intern(name)),
            _ => None,
        }
    })?;
    let mut variable = UnaryVariable::new(name);

    let mut explicit = Vec::new();
    for argument in call.arguments.iter().skip(1) {
        match argument.name.as_ref().map(|name| pyrite_common::resolve(name.value)) {
            Some(keyword) if keyword.as_ref() == "bound" => {
                let bound = parse_annotation(&argument.value, context);
                variable = variable.with_constraints(Constraints::Bound(Box::new(bound)));
            }
            Some(keyword) if keyword.as_ref() == "covariant" => {
                if matches!(argument.value.value, Expression::True) {
                    variable = variable.with_variance(Variance::Covariant);
                }
            }
            Some(keyword) if keyword.as_ref() == "contravariant" => {
                if matches!(argument.value.value, Expression::True) {
                    variable = variable.with_variance(Variance::Contravariant);
                }
            }
            Some(_) => {}
            None => explicit.push(parse_annotation(&argument.value, context)),
        }
    }
    if !explicit.is_empty() {
        variable = variable.with_constraints(pyrite_types::Constraints::Explicit(explicit));
    }
    Some(variable)
}

/// Build one overload from a function signature. Star conventions ride on
/// the parameter names: `*args` and `**kwargs` keep their stars, a bare `*`
/// turns everything after it keyword-only, and a leading underscore double
/// appears as positional-only in stubs.
pub fn overload_of_signature(
    signature: &pyrite_ast::Signature,
    context: &AnnotationContext<'_>,
) -> pyrite_types::Overload {
    use pyrite_types::{CallableParameter, StarParameter};
    let mut parameters = Vec::with_capacity(signature.parameters.len());
    let mut keyword_only = false;
    let mut positional_index = 0usize;
    for parameter in &signature.parameters {
        let raw_name = pyrite_common::resolve(parameter.value.name);
        let annotation = parameter
            .value
            .annotation
            .as_ref()
            .map(|annotation| parse_annotation(annotation, context))
            .unwrap_or(Type::Top);
        let default = parameter.value.default.is_some();
        if raw_name.as_ref() == "*" {
            keyword_only = true;
            continue;
        }
        if raw_name.starts_with("**") {
            parameters.push(CallableParameter::Keywords(annotation));
            continue;
        }
        if raw_name.starts_with('*') {
            keyword_only = true;
            parameters.push(CallableParameter::Variable(StarParameter::Concrete(
                annotation,
            )));
            continue;
        }
        if keyword_only {
            parameters.push(CallableParameter::KeywordOnly {
                name: parameter.value.name,
                annotation,
                default,
            });
        } else if raw_name.starts_with("__") && !raw_name.ends_with("__") {
            parameters.push(CallableParameter::PositionalOnly {
                index: positional_index,
                annotation,
                default,
            });
            positional_index += 1;
        } else {
            parameters.push(CallableParameter::Named {
                name: parameter.value.name,
                annotation,
                default,
            });
            positional_index += 1;
        }
    }

    let mut annotation = signature
        .return_annotation
        .as_ref()
        .map(|annotation| parse_annotation(annotation, context))
        .unwrap_or(Type::Top);
    if signature.is_async {
        annotation = Type::awaitable(annotation);
    }
    pyrite_types::Overload {
        annotation,
        parameters: pyrite_types::CallableParameters::Defined(parameters),
    }
}

/// Assemble a named callable from a `def` group: `@overload`-decorated
/// signatures become overloads, the undecorated one the implementation.
pub fn callable_of_signatures(
    signatures: &[pyrite_ast::Signature],
    context: &AnnotationContext<'_>,
) -> Option<pyrite_types::Callable> {
    let first = signatures.first()?;
    let is_overload = |signature: &pyrite_ast::Signature| {
        signature.has_decorator("overload") || signature.has_decorator("typing.overload")
    };
    let implementation = signatures
        .iter()
        .rev()
        .find(|signature| !is_overload(signature))
        .unwrap_or(first);
    let overloads: Vec<pyrite_types::Overload> = signatures
        .iter()
        .filter(|signature| is_overload(signature))
        .map(|signature| overload_of_signature(signature, context))
        .collect();
    Some(
        pyrite_types::Callable::named(
            first.name.value.clone(),
            overload_of_signature(implementation, context),
        )
        .with_overloads(overloads),
    )
}

/// Convenience for callers that only have a bare name in hand.
pub fn parse_reference(reference: &Reference, context: &AnnotationContext<'_>) -> Type {
    let expression = reference_expression(reference);
    parse_annotation(&expression, context)
}

fn reference_expression(reference: &Reference) -> Node<Expression> {
    let mut components = reference.components().iter();
    let first: Atom = match components.next() {
        Some(first) => *first,
        None => return Node::synthetic(Expression::Name(Name::Identifier(Atom::DUMMY))),
    };
    let mut expression = Node::synthetic(Expression::Name(Name::Identifier(first)));
    for component in components {
        expression = Node::synthetic(Expression::Name(Name::Attribute {
            base: Box::new(expression),
            attribute: *component,
            special: false,
        }));
    }
    expression
}

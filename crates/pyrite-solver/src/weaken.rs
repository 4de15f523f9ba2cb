//! Mutable-literal weakening.
//!
//! `[1, 2]` resolves to `list[int]`, which is not a `list[object]` because
//! lists are invariant. When the expression is a fresh literal display there
//! is no aliasing to protect, so the resolved type may be weakened to the
//! expected container. The relaxation recurses through list/set/dict
//! displays, typed dictionaries, optionals, and unions, and re-clothes the
//! abstract container expectations via their mutable counterparts.

use crate::order::TypeOrder;
use pyrite_ast::{Dictionary, Expression, Node};
use pyrite_types::{well_known, Literal, Parameter, Type, TypedDictionary};

/// Comparator used to accept a weakened candidate against an expectation.
pub type Comparator<'o, 'a> = dyn FnMut(&mut TypeOrder<'a>, &Type, &Type) -> bool + 'o;

pub fn weaken_mutable_literals(
    order: &mut TypeOrder<'_>,
    expression: Option<&Node<Expression>>,
    resolved: &Type,
    expected: &Type,
) -> Type {
    let mut comparator =
        |order: &mut TypeOrder<'_>, left: &Type, right: &Type| order.always_less_or_equal(left, right);
    weaken_mutable_literals_with(order, expression, resolved, expected, &mut comparator)
}

pub fn weaken_mutable_literals_with<'a>(
    order: &mut TypeOrder<'a>,
    expression: Option<&Node<Expression>>,
    resolved: &Type,
    expected: &Type,
    comparator: &mut Comparator<'_, 'a>,
) -> Type {
    let names = well_known();
    let expected = expected.strip_annotated();

    match expected {
        // Optional is unwrapped; a weakened fit re-clothes as the optional.
        Type::Optional(inner) => {
            let weakened =
                weaken_mutable_literals_with(order, expression, resolved, inner, comparator);
            if comparator(order, &weakened, inner) {
                expected.clone()
            } else {
                weakened
            }
        }
        // Unions are tried per-alternative; the first acceptable wins.
        Type::Union(alternatives) => {
            for alternative in alternatives {
                let weakened = weaken_mutable_literals_with(
                    order,
                    expression,
                    resolved,
                    alternative,
                    comparator,
                );
                if comparator(order, &weakened, alternative) {
                    return weakened;
                }
            }
            resolved.clone()
        }
        Type::TypedDictionary(dictionary) => {
            weaken_against_typed_dictionary(order, expression, resolved, dictionary, comparator)
                .unwrap_or_else(|| resolved.clone())
        }
        Type::Parametric { name, .. } => {
            // Abstract expectations relax via their mutable counterparts and
            // are re-clothed afterwards.
            let mutable_counterpart = if *name == names.sequence || *name == names.iterable {
                Some(names.list)
            } else if *name == names.abstract_set {
                Some(names.set)
            } else if *name == names.mapping || *name == names.mutable_mapping {
                Some(names.dict)
            } else {
                None
            };
            if let Some(counterpart) = mutable_counterpart {
                let single_parameters: Option<Vec<Type>> = expected
                    .single_parameters()
                    .map(|parameters| parameters.into_iter().cloned().collect());
                if let Some(parameters) = single_parameters {
                    let as_mutable = Type::parametric_over(counterpart, parameters);
                    let weakened = weaken_mutable_literals_with(
                        order,
                        expression,
                        resolved,
                        &as_mutable,
                        comparator,
                    );
                    if comparator(order, &weakened, &as_mutable) {
                        return expected.clone();
                    }
                }
                return resolved.clone();
            }
            weaken_container_display(order, expression, resolved, expected, comparator)
                .unwrap_or_else(|| resolved.clone())
        }
        _ => resolved.clone(),
    }
}

/// `list`/`set`/`dict` displays against the corresponding mutable container.
fn weaken_container_display<'a>(
    order: &mut TypeOrder<'a>,
    expression: Option<&Node<Expression>>,
    resolved: &Type,
    expected: &Type,
    comparator: &mut Comparator<'_, 'a>,
) -> Option<Type> {
    let names = well_known();
    let expression = expression?;
    let (expected_name, expected_parameters) = match expected {
        Type::Parametric { name, parameters } => (*name, parameters.clone()),
        _ => return None,
    };
    let (resolved_name, resolved_parameters) = match resolved.strip_annotated() {
        Type::Parametric { name, parameters } => (*name, parameters.clone()),
        _ => return None,
    };
    if expected_name != resolved_name {
        return None;
    }

    let is_display = |expression: &Expression, name| {
        (name == names.list && matches!(expression, Expression::List(_)))
            || (name == names.set && matches!(expression, Expression::Set(_)))
            || (name == names.dict && matches!(expression, Expression::Dictionary(_)))
    };
    if !is_display(&expression.value, expected_name) {
        return None;
    }

    // Weaken position-wise: element (list/set) or key/value (dict). The
    // element expressions re-weaken against the expected position type.
    let element_expressions: Vec<Vec<&Node<Expression>>> = match &expression.value {
        Expression::List(elements) | Expression::Set(elements) => {
            vec![elements.iter().collect()]
        }
        Expression::Dictionary(Dictionary { entries, .. }) => vec![
            entries.iter().map(|(key, _)| key).collect(),
            entries.iter().map(|(_, value)| value).collect(),
        ],
        _ => return None,
    };

    let mut weakened_parameters = Vec::with_capacity(expected_parameters.len());
    for (position, (resolved_parameter, expected_parameter)) in resolved_parameters
        .iter()
        .zip(expected_parameters.iter())
        .enumerate()
    {
        let (Parameter::Single(resolved_parameter), Parameter::Single(expected_parameter)) =
            (resolved_parameter, expected_parameter)
        else {
            return None;
        };
        let per_element = element_expressions.get(position);
        let weakened = match per_element {
            Some(elements) if !elements.is_empty() => {
                let mut weakened_elements = Vec::with_capacity(elements.len());
                for element in elements {
                    weakened_elements.push(weaken_mutable_literals_with(
                        order,
                        Some(element),
                        resolved_parameter,
                        expected_parameter,
                        comparator,
                    ));
                }
                Type::union(weakened_elements)
            }
            _ => weaken_mutable_literals_with(
                order,
                None,
                resolved_parameter,
                expected_parameter,
                comparator,
            ),
        };
        if !comparator(order, &weakened, expected_parameter) {
            return None;
        }
        weakened_parameters.push(Parameter::Single(expected_parameter.clone()));
    }
    Some(Type::Parametric {
        name: expected_name,
        parameters: weakened_parameters,
    })
}

/// A dict display against a typed dictionary: every string-literal key must
/// name a field (its value weakens against the field type); non-total
/// expectations tolerate missing fields.
fn weaken_against_typed_dictionary<'a>(
    order: &mut TypeOrder<'a>,
    expression: Option<&Node<Expression>>,
    resolved: &Type,
    dictionary: &TypedDictionary,
    comparator: &mut Comparator<'_, 'a>,
) -> Option<Type> {
    let expression = expression?;
    let Expression::Dictionary(Dictionary { entries, keywords }) = &expression.value else {
        return None;
    };
    if !keywords.is_empty() {
        return None;
    }

    let mut provided = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let Expression::String(key_name) = &key.value else {
            return None;
        };
        let key_name = pyrite_common::intern(key_name);
        let field = dictionary.field(key_name)?;
        // Literal entries carry their own value types; anything else falls
        // back to the resolved dict's value slot.
        let resolved_value = literal_expression_type(&value.value).unwrap_or_else(|| {
            match resolved.strip_annotated() {
                Type::Parametric { parameters, .. } => parameters
                    .get(1)
                    .and_then(Parameter::as_single)
                    .cloned()
                    .unwrap_or(Type::Any),
                _ => Type::Any,
            }
        });
        let weakened = weaken_mutable_literals_with(
            order,
            Some(value),
            &resolved_value,
            &field.annotation,
            comparator,
        );
        let weakened = weakened.weaken_literals();
        if !comparator(order, &weakened, &field.annotation) {
            return None;
        }
        provided.push(key_name);
    }

    if dictionary.total {
        let all_present = dictionary
            .fields
            .iter()
            .all(|field| provided.contains(&field.name));
        if !all_present {
            return None;
        }
    }
    Some(Type::TypedDictionary(dictionary.clone()))
}

/// The type of a bare literal expression, when it is one.
fn literal_expression_type(expression: &Expression) -> Option<Type> {
    match expression {
        Expression::Integer(value) => Some(Type::Literal(Literal::Integer(*value))),
        Expression::String(value) => Some(Type::literal_string(value)),
        Expression::True => Some(Type::Literal(Literal::Boolean(true))),
        Expression::False => Some(Type::Literal(Literal::Boolean(false))),
        Expression::None => Some(Type::none()),
        _ => None,
    }
}

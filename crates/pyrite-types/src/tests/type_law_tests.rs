//! Algebraic law tests for the type representation.
//!
//! ## Laws tested
//! - **Union canonicalization**: sorted, flattened, duplicate-free, no `Top`,
//!   none-subsumption; idempotent under re-unioning
//! - **Instantiate homomorphism**: substitution distributes over `Union` and
//!   `Parametric`
//! - **Concreteness**: `is_concrete(t)` implies no variables and no `Any`

use crate::types::{Parameter, Type};
use crate::variable::UnaryVariable;
use pyrite_common::intern;
use pretty_assertions::assert_eq;

fn sample_types() -> Vec<Type> {
    vec![
        Type::Bottom,
        Type::Any,
        Type::none(),
        Type::integer(),
        Type::string(),
        Type::literal_integer(7),
        Type::literal_string("hi"),
        Type::optional(Type::integer()),
        Type::union(vec![Type::integer(), Type::string()]),
        Type::tuple(vec![Type::integer(), Type::string()]),
        Type::unbounded_tuple(Type::integer()),
        Type::list(Type::integer()),
        Type::dictionary(Type::string(), Type::integer()),
        Type::Variable(UnaryVariable::new(intern("T"))),
    ]
}

// =============================================================================
// Union canonicalization
// =============================================================================

#[test]
fn union_flattens_and_sorts() {
    let nested = Type::union(vec![
        Type::string(),
        Type::union(vec![Type::integer(), Type::string()]),
    ]);
    let flat = Type::union(vec![Type::integer(), Type::string()]);
    assert_eq!(nested, flat);
}

#[test]
fn union_deduplicates() {
    assert_eq!(
        Type::union(vec![Type::integer(), Type::integer()]),
        Type::integer()
    );
}

#[test]
fn union_collapses_on_top() {
    assert_eq!(
        Type::union(vec![Type::integer(), Type::Top]),
        Type::Top
    );
}

#[test]
fn union_drops_bottom() {
    assert_eq!(
        Type::union(vec![Type::integer(), Type::Bottom]),
        Type::integer()
    );
}

#[test]
fn union_applies_none_subsumption() {
    // Optional[int] and int collapse to Optional[int].
    assert_eq!(
        Type::union(vec![Type::optional(Type::integer()), Type::integer()]),
        Type::optional(Type::integer())
    );
}

#[test]
fn union_of_none_alone_is_none() {
    assert_eq!(Type::union(vec![Type::none()]), Type::none());
}

#[test]
fn union_with_none_becomes_optional() {
    assert_eq!(
        Type::union(vec![Type::integer(), Type::none()]),
        Type::optional(Type::integer())
    );
}

#[test]
fn union_idempotent_over_samples() {
    for left in sample_types() {
        for right in sample_types() {
            let once = Type::union(vec![left.clone(), right.clone()]);
            let twice = Type::union(vec![once.clone(), right.clone()]);
            assert_eq!(once, twice, "re-union changed {} + {}", left, right);
        }
    }
}

#[test]
fn empty_union_is_bottom() {
    assert_eq!(Type::union(vec![]), Type::Bottom);
}

// =============================================================================
// Instantiate
// =============================================================================

#[test]
fn instantiate_distributes_over_union() {
    let variable = UnaryVariable::new(intern("T"));
    let subject = Type::Variable(variable.clone());
    let substitute = |ty: &Type| (ty == &subject).then(|| Type::integer());

    let union = Type::union(vec![subject.clone(), Type::string()]);
    let whole = union.instantiate(false, &mut substitute.clone());
    let parts = Type::union(vec![
        subject.instantiate(false, &mut substitute.clone()),
        Type::string(),
    ]);
    assert_eq!(whole, Type::union(vec![Type::integer(), Type::string()]));
    assert_eq!(Type::union(vec![whole]), parts);
}

#[test]
fn instantiate_distributes_over_parametric() {
    let variable = Type::Variable(UnaryVariable::new(intern("T")));
    let list = Type::list(variable.clone());
    let instantiated = list.instantiate(false, &mut |ty| {
        (ty == &variable).then(|| Type::string())
    });
    assert_eq!(instantiated, Type::list(Type::string()));
}

#[test]
fn instantiate_widen_maps_bottom_to_top() {
    let variable = Type::Variable(UnaryVariable::new(intern("T")));
    let widened = variable.instantiate(true, &mut |ty| {
        (ty == &variable).then(|| Type::Bottom)
    });
    assert_eq!(widened, Type::Top);
}

#[test]
fn instantiate_preserves_unrelated_structure() {
    let variable = Type::Variable(UnaryVariable::new(intern("T")));
    let tuple = Type::tuple(vec![Type::integer(), Type::string()]);
    let untouched = tuple.instantiate(false, &mut |ty| {
        (ty == &variable).then(|| Type::Bottom)
    });
    assert_eq!(untouched, tuple);
}

// =============================================================================
// Predicates
// =============================================================================

#[test]
fn concrete_implies_no_variables_and_no_any() {
    for ty in sample_types() {
        if ty.is_concrete() {
            assert!(!ty.contains_variable(), "{} is concrete yet has variables", ty);
            assert!(!ty.contains_any(), "{} is concrete yet contains Any", ty);
        }
    }
}

#[test]
fn none_is_concrete() {
    assert!(Type::none().is_concrete());
    assert!(Type::optional(Type::integer()).is_concrete());
}

#[test]
fn lattice_elements_are_not_concrete() {
    assert!(!Type::Any.is_concrete());
    assert!(!Type::Top.is_concrete());
    assert!(!Type::Bottom.is_concrete());
}

#[test]
fn variables_are_found_in_callable_positions() {
    let variable = Type::Variable(UnaryVariable::new(intern("T")));
    let callable = Type::callable(
        crate::callable::CallableParameters::from_types(vec![variable]),
        Type::integer(),
    );
    assert!(callable.contains_variable());
    assert!(!callable.is_concrete());
}

#[test]
fn optional_display_forms() {
    assert_eq!(Type::none().to_string(), "None");
    assert_eq!(
        Type::optional(Type::integer()).to_string(),
        "typing.Optional[int]"
    );
    assert_eq!(
        Type::union(vec![Type::integer(), Type::string()]).to_string(),
        "typing.Union[int, str]"
    );
}

#[test]
fn parametric_display() {
    assert_eq!(
        Type::list(Type::integer()).to_string(),
        "list[int]"
    );
    assert_eq!(
        Type::tuple(vec![Type::integer(), Type::string()]).to_string(),
        "typing.Tuple[int, str]"
    );
    assert_eq!(
        Type::unbounded_tuple(Type::integer()).to_string(),
        "typing.Tuple[int, ...]"
    );
}

#[test]
fn parameter_single_accessor() {
    let parameter = Parameter::Single(Type::integer());
    assert_eq!(parameter.as_single(), Some(&Type::integer()));
}

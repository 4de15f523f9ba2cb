//! Subtype rule tests: tuples, unions, variables, typed dictionaries.

use crate::class_handler::SimpleClassHandler;
use crate::order::TypeOrder;
use pyrite_common::intern;
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{
    Literal, Type, TypedDictionary, TypedDictionaryField, UnaryVariable, Variable,
};

fn typed_dictionary(name: &str, fields: &[(&str, Type)], total: bool) -> TypedDictionary {
    TypedDictionary {
        name: intern(name),
        fields: fields
            .iter()
            .map(|(field, annotation)| TypedDictionaryField {
                name: intern(field),
                annotation: annotation.clone(),
            })
            .collect(),
        total,
    }
}

#[test]
fn bounded_tuple_fits_sequence() {
    // Tuple[int, int] <= Sequence[int]
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.always_less_or_equal(
        &Type::tuple(vec![Type::integer(), Type::integer()]),
        &Type::sequence(Type::integer())
    ));
}

#[test]
fn heterogeneous_tuple_needs_a_wide_element() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let tuple = Type::tuple(vec![Type::integer(), Type::string()]);
    assert!(order.always_less_or_equal(&tuple, &Type::sequence(Type::object())));
    assert!(!order.always_less_or_equal(&tuple, &Type::sequence(Type::integer())));
}

#[test]
fn bounded_tuples_match_pairwise() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let left = Type::tuple(vec![Type::boolean(), Type::string()]);
    assert!(order.always_less_or_equal(&left, &Type::tuple(vec![Type::integer(), Type::string()])));
    assert!(!order.always_less_or_equal(&left, &Type::tuple(vec![Type::string(), Type::string()])));
    // Length mismatch never solves.
    assert!(!order.always_less_or_equal(&left, &Type::tuple(vec![Type::boolean()])));
}

#[test]
fn bounded_tuple_fits_unbounded() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let bounded = Type::tuple(vec![Type::integer(), Type::boolean()]);
    assert!(order.always_less_or_equal(&bounded, &Type::unbounded_tuple(Type::integer())));
    assert!(!order.always_less_or_equal(
        &Type::tuple(vec![Type::integer(), Type::string()]),
        &Type::unbounded_tuple(Type::integer())
    ));
}

#[test]
fn union_on_the_left_requires_every_member() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let union = Type::union(vec![Type::integer(), Type::string()]);
    assert!(order.always_less_or_equal(&union, &Type::object()));
    assert!(!order.always_less_or_equal(&union, &Type::integer()));
}

#[test]
fn union_on_the_right_accepts_any_member() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let union = Type::union(vec![Type::integer(), Type::string()]);
    assert!(order.always_less_or_equal(&Type::integer(), &union));
    assert!(order.always_less_or_equal(&Type::boolean(), &union));
    assert!(!order.always_less_or_equal(&Type::float(), &union));
}

#[test]
fn optionals_reduce_componentwise() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.always_less_or_equal(
        &Type::optional(Type::boolean()),
        &Type::optional(Type::integer())
    ));
    assert!(order.always_less_or_equal(&Type::integer(), &Type::optional(Type::integer())));
    assert!(order.always_less_or_equal(&Type::none(), &Type::optional(Type::integer())));
    assert!(!order.always_less_or_equal(&Type::optional(Type::integer()), &Type::integer()));
}

#[test]
fn literals_weaken_to_their_class() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.always_less_or_equal(&Type::literal_integer(3), &Type::integer()));
    assert!(order.always_less_or_equal(&Type::literal_string("s"), &Type::string()));
    assert!(order.always_less_or_equal(&Type::Literal(Literal::Boolean(true)), &Type::boolean()));
    assert!(!order.always_less_or_equal(&Type::integer(), &Type::literal_integer(3)));
    assert!(!order.always_less_or_equal(&Type::literal_integer(3), &Type::literal_integer(4)));
}

#[test]
fn invariant_containers_do_not_covary() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(!order.always_less_or_equal(&Type::list(Type::boolean()), &Type::list(Type::integer())));
    assert!(order.always_less_or_equal(&Type::list(Type::integer()), &Type::list(Type::integer())));
    // The read-only view covaries.
    assert!(order.always_less_or_equal(
        &Type::list(Type::integer()),
        &Type::sequence(Type::object())
    ));
}

#[test]
fn free_variables_collect_bounds() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let variable = UnaryVariable::new(intern("T"));
    let results = order.solve_less_or_equal(
        &ConstraintSet::empty(),
        &Type::integer(),
        &Type::Variable(variable.clone()),
    );
    assert_eq!(results.len(), 1);
    let solution = results[0].solve(&mut order).expect("solvable");
    assert_eq!(solution.unaries.get(&variable), Some(&Type::integer()));
}

#[test]
fn contradictory_bounds_are_unsatisfiable() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let variable = Type::Variable(UnaryVariable::new(intern("T")));
    // str <= T and T <= int cannot both hold.
    let after_lower =
        order.solve_less_or_equal(&ConstraintSet::empty(), &Type::string(), &variable);
    assert_eq!(after_lower.len(), 1);
    let after_upper = order.solve_less_or_equal(&after_lower[0], &variable, &Type::integer());
    assert!(after_upper.is_empty());
}

#[test]
fn bound_variables_defer_to_their_bound() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let mut variable = UnaryVariable::new(intern("T"));
    variable.constraints = pyrite_types::Constraints::Bound(Box::new(Type::integer()));
    variable.state = pyrite_types::VariableState::InFunction;
    let ty = Type::Variable(variable);
    assert!(order.always_less_or_equal(&ty, &Type::float()));
    assert!(!order.always_less_or_equal(&ty, &Type::string()));
}

#[test]
fn typed_dictionary_width_subtyping() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let wide = Type::TypedDictionary(typed_dictionary(
        "Movie",
        &[("a", Type::integer()), ("b", Type::string())],
        true,
    ));
    let narrow = Type::TypedDictionary(typed_dictionary("Named", &[("a", Type::integer())], true));
    assert!(order.always_less_or_equal(&wide, &narrow));
    assert!(!order.always_less_or_equal(&narrow, &wide));

    let wider = Type::TypedDictionary(typed_dictionary(
        "Movie",
        &[
            ("a", Type::integer()),
            ("b", Type::string()),
            ("c", Type::boolean()),
        ],
        true,
    ));
    assert!(order.always_less_or_equal(&wider, &narrow));

    let retyped = Type::TypedDictionary(typed_dictionary(
        "Movie",
        &[("a", Type::boolean()), ("b", Type::string())],
        true,
    ));
    assert!(!order.always_less_or_equal(&retyped, &narrow));
}

#[test]
fn typed_dictionary_totality_must_match() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let total = Type::TypedDictionary(typed_dictionary("M", &[("a", Type::integer())], true));
    let partial = Type::TypedDictionary(typed_dictionary("M", &[("a", Type::integer())], false));
    assert!(!order.always_less_or_equal(&total, &partial));
    assert!(!order.always_less_or_equal(&partial, &total));
}

#[test]
fn undeclared_absorbs_on_both_sides() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.always_less_or_equal(&Type::undeclared(), &Type::integer()));
    assert!(order.always_less_or_equal(&Type::integer(), &Type::undeclared()));
}

#[test]
fn any_absorbs_in_both_directions() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.always_less_or_equal(&Type::Any, &Type::integer()));
    assert!(order.always_less_or_equal(&Type::integer(), &Type::Any));
}

#[test]
fn compatibility_tolerates_top_on_the_right() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.is_compatible_with(&Type::integer(), &Type::Top));
    assert!(!order.always_less_or_equal(&Type::Top, &Type::integer()));
    assert!(order.is_compatible_with(&Type::boolean(), &Type::integer()));
    assert!(!order.is_compatible_with(&Type::string(), &Type::integer()));
}

#[test]
fn variable_bounds_respect_declared_explicit_constraints() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let variable = UnaryVariable::new(intern("AnyStr")).with_constraints(
        pyrite_types::Constraints::Explicit(vec![Type::string(), Type::bytes()]),
    );
    let results = order.solve_less_or_equal(
        &ConstraintSet::empty(),
        &Type::string(),
        &Type::Variable(variable.clone()),
    );
    assert_eq!(results.len(), 1);
    let solution = results[0].solve(&mut order).expect("solvable");
    assert_eq!(
        solution.unaries.get(&variable),
        Some(&Type::string()),
        "explicit constraint should pick the first admissible choice"
    );
}

// Variables of all kinds participate in the generic zip.
#[test]
fn zip_fails_atomically_on_kind_mismatch() {
    use pyrite_types::{zip_variables_with_parameters, Parameter};
    let unary = Variable::Unary(UnaryVariable::new(intern("T")));
    let list = Variable::ListVariadic(pyrite_types::ListVariadic::new(intern("Ts")));
    let ok = zip_variables_with_parameters(
        &[unary.clone()],
        &[Parameter::Single(Type::integer())],
    );
    assert!(ok.is_some());
    let mismatch = zip_variables_with_parameters(
        &[list],
        &[Parameter::CallableParameters(
            pyrite_types::CallableParameters::Undefined,
        )],
    );
    assert!(mismatch.is_none());
    let arity = zip_variables_with_parameters(&[unary], &[]);
    assert!(arity.is_none());
}

//! Ordered-type and list-variadic subtyping.

use pyrite_common::intern;
use pyrite_solver::{SimpleClassHandler, TypeOrder};
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{Concatenation, ListVariadic, OrderedTypes, Type};

fn concrete(types: Vec<Type>) -> OrderedTypes {
    OrderedTypes::Concrete(types)
}

#[test]
fn concrete_sequences_match_pairwise() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::boolean(), Type::string()]),
        &concrete(vec![Type::integer(), Type::string()]),
    );
    assert!(!results.is_empty());

    let mismatched = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::string()]),
        &concrete(vec![Type::integer()]),
    );
    assert!(mismatched.is_empty());

    let length_mismatch = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::integer()]),
        &concrete(vec![Type::integer(), Type::integer()]),
    );
    assert!(length_mismatch.is_empty());
}

#[test]
fn bare_middle_binds_both_bounds() {
    // [int, str] against Concatenation[Ts] binds Ts = [int, str].
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let middle = ListVariadic::new(intern("Ts"));
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::integer(), Type::string()]),
        &OrderedTypes::Concatenation(Concatenation::bare(middle.clone())),
    );
    assert_eq!(results.len(), 1);
    let solution = results[0].solve(&mut order).expect("solvable");
    assert_eq!(
        solution.list_variadics.get(&middle),
        Some(&concrete(vec![Type::integer(), Type::string()]))
    );
}

#[test]
fn head_and_tail_split_off() {
    // [int, str, bool] against Concatenate[int, Ts, bool] binds Ts = [str].
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let middle = ListVariadic::new(intern("Ts"));
    let concatenation = Concatenation {
        head: vec![Type::integer()],
        middle: middle.clone(),
        mappers: Vec::new(),
        tail: vec![Type::boolean()],
    };
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::integer(), Type::string(), Type::boolean()]),
        &OrderedTypes::Concatenation(concatenation),
    );
    assert_eq!(results.len(), 1);
    let solution = results[0].solve(&mut order).expect("solvable");
    assert_eq!(
        solution.list_variadics.get(&middle),
        Some(&concrete(vec![Type::string()]))
    );
}

#[test]
fn too_short_for_head_and_tail_fails() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let concatenation = Concatenation {
        head: vec![Type::integer()],
        middle: ListVariadic::new(intern("Ts")),
        mappers: Vec::new(),
        tail: vec![Type::boolean()],
    };
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::integer()]),
        &OrderedTypes::Concatenation(concatenation),
    );
    assert!(results.is_empty());
}

#[test]
fn mapped_middles_solve_elementwise() {
    // [list[int], list[str]] against Map[list, Ts] synthesizes fresh unaries
    // and binds Ts through the mapper.
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let names = pyrite_types::well_known();
    let middle = ListVariadic::new(intern("Ts"));
    let concatenation = Concatenation {
        head: Vec::new(),
        middle: middle.clone(),
        mappers: vec![names.list],
        tail: Vec::new(),
    };
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![
            Type::list(Type::integer()),
            Type::list(Type::string()),
        ]),
        &OrderedTypes::Concatenation(concatenation),
    );
    assert!(!results.is_empty());
    let solution = results[0].solve(&mut order).expect("solvable");
    let bound = solution
        .list_variadics
        .get(&middle)
        .expect("middle variable is bound");
    match bound {
        OrderedTypes::Concrete(elements) => assert_eq!(elements.len(), 2),
        bound => panic!("expected a concrete binding, got {:?}", bound),
    }
}

#[test]
fn non_mapping_elements_fail_mapped_middles() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let names = pyrite_types::well_known();
    let concatenation = Concatenation {
        head: Vec::new(),
        middle: ListVariadic::new(intern("Ts")),
        mappers: vec![names.list],
        tail: Vec::new(),
    };
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &concrete(vec![Type::integer()]),
        &OrderedTypes::Concatenation(concatenation),
    );
    assert!(results.is_empty());
}

#[test]
fn bare_variables_bind_against_each_other() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let left = ListVariadic::new(intern("Ls"));
    let right = ListVariadic::new(intern("Rs"));
    let results = order.solve_ordered_types_less_or_equal(
        &ConstraintSet::empty(),
        &OrderedTypes::Concatenation(Concatenation::bare(left)),
        &OrderedTypes::Concatenation(Concatenation::bare(right)),
    );
    // Both orientations are attempted; at least one binds.
    assert!(!results.is_empty());
}

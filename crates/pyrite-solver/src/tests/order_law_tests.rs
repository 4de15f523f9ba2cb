//! Order law tests.
//!
//! ## Laws tested
//! - **Reflexivity**: `t <= t` for every sample type
//! - **Antisymmetry up to equality**: mutual subtypes join/meet to one of
//!   the pair (modulo canonicalization)
//! - **Transitivity**: sampled `a <= b <= c` chains imply `a <= c`
//! - **Absorption**: `join(t, Top) = Top`, `meet(t, Bottom) = Bottom`,
//!   `join(t, Bottom) = t`, `meet(t, Top) = t` (with the documented `Any`
//!   exception for meet)

use crate::class_handler::SimpleClassHandler;
use crate::order::TypeOrder;
use pyrite_types::Type;

fn sample_types() -> Vec<Type> {
    vec![
        Type::Bottom,
        Type::Top,
        Type::Any,
        Type::none(),
        Type::integer(),
        Type::string(),
        Type::boolean(),
        Type::object(),
        Type::literal_integer(3),
        Type::literal_string("s"),
        Type::optional(Type::integer()),
        Type::union(vec![Type::integer(), Type::string()]),
        Type::tuple(vec![Type::integer(), Type::string()]),
        Type::unbounded_tuple(Type::integer()),
        Type::list(Type::integer()),
        Type::sequence(Type::integer()),
        Type::dictionary(Type::string(), Type::integer()),
    ]
}

#[test]
fn law_reflexivity() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    for ty in sample_types() {
        assert!(
            order.always_less_or_equal(&ty, &ty),
            "reflexivity failed for {}",
            ty
        );
    }
}

#[test]
fn law_antisymmetry_up_to_equality() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    for left in sample_types() {
        for right in sample_types() {
            if order.always_less_or_equal(&left, &right)
                && order.always_less_or_equal(&right, &left)
            {
                let joined = order.join(&left, &right);
                let met = order.meet(&left, &right);
                assert!(
                    joined == left || joined == right,
                    "join of mutual subtypes {} and {} produced {}",
                    left,
                    right,
                    joined
                );
                assert!(
                    met == left || met == right,
                    "meet of mutual subtypes {} and {} produced {}",
                    left,
                    right,
                    met
                );
            }
        }
    }
}

#[test]
fn law_transitivity_sampled() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let samples = sample_types();
    for a in &samples {
        for b in &samples {
            // `Any` absorbs both directions, so chains through it do not
            // compose; the law is stated over the static fragment.
            if b.contains_any() {
                continue;
            }
            if !order.always_less_or_equal(a, b) {
                continue;
            }
            for c in &samples {
                if order.always_less_or_equal(b, c) {
                    assert!(
                        order.always_less_or_equal(a, c),
                        "transitivity failed: {} <= {} <= {} but not {} <= {}",
                        a,
                        b,
                        c,
                        a,
                        c
                    );
                }
            }
        }
    }
}

#[test]
fn law_join_meet_absorption() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    for ty in sample_types() {
        assert_eq!(order.join(&ty, &Type::Top), Type::Top);
        assert_eq!(order.join(&ty, &Type::Bottom), ty);
        assert_eq!(order.meet(&ty, &Type::Top), ty);
        if ty != Type::Any {
            // Any absorbs in both directions for meet.
            assert_eq!(order.meet(&ty, &Type::Bottom), Type::Bottom);
        }
    }
}

#[test]
fn join_climbs_to_common_successor() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    // int and str meet only at object.
    assert_eq!(order.join(&Type::integer(), &Type::string()), Type::object());
    // bool <= int makes the join the supertype directly.
    assert_eq!(order.join(&Type::boolean(), &Type::integer()), Type::integer());
}

#[test]
fn join_weakens_literals() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert_eq!(
        order.join(&Type::literal_integer(1), &Type::literal_integer(2)),
        Type::integer()
    );
}

#[test]
fn join_propagates_optionals() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert_eq!(
        order.join(&Type::optional(Type::integer()), &Type::integer()),
        Type::optional(Type::integer())
    );
}

#[test]
fn meet_of_unrelated_is_bottom() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert_eq!(order.meet(&Type::integer(), &Type::string()), Type::Bottom);
}

#[test]
fn meet_picks_the_subtype() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert_eq!(order.meet(&Type::boolean(), &Type::integer()), Type::boolean());
}

#[test]
fn widen_caps_iteration() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let joined = order.widen(&Type::integer(), &Type::string(), 2, 10);
    assert_eq!(joined, Type::object());
    let widened = order.widen(&Type::integer(), &Type::string(), 11, 10);
    assert_eq!(widened, Type::Top);
}

#[test]
fn undeclared_joins_as_union() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let joined = order.join(&Type::undeclared(), &Type::integer());
    assert!(matches!(joined, Type::Union(_)));
}

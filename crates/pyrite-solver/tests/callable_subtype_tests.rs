//! Callable subtyping: contravariant parameters, covariant returns, and the
//! overload simulation.

use pyrite_solver::{SimpleClassHandler, TypeOrder};
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{
    Callable, CallableParameter, CallableParameters, Overload, Type, UnaryVariable,
};

fn callable(parameter_annotations: Vec<Type>, annotation: Type) -> Type {
    Type::callable(
        CallableParameters::from_types(parameter_annotations),
        annotation,
    )
}

#[test]
fn parameters_are_contravariant() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    // (object) -> str fits where (int) -> str is expected.
    assert!(order.always_less_or_equal(
        &callable(vec![Type::object()], Type::string()),
        &callable(vec![Type::integer()], Type::string()),
    ));
    assert!(!order.always_less_or_equal(
        &callable(vec![Type::integer()], Type::string()),
        &callable(vec![Type::object()], Type::string()),
    ));
}

#[test]
fn returns_are_covariant() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(order.always_less_or_equal(
        &callable(vec![], Type::boolean()),
        &callable(vec![], Type::integer()),
    ));
    assert!(!order.always_less_or_equal(
        &callable(vec![], Type::integer()),
        &callable(vec![], Type::boolean()),
    ));
}

#[test]
fn undefined_parameters_absorb() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let gradual = Type::callable(CallableParameters::Undefined, Type::integer());
    assert!(order.always_less_or_equal(&gradual, &callable(vec![Type::integer()], Type::integer())));
    assert!(order.always_less_or_equal(&callable(vec![Type::integer()], Type::integer()), &gradual));
}

#[test]
fn arity_mismatch_fails() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    assert!(!order.always_less_or_equal(
        &callable(vec![Type::integer(), Type::integer()], Type::string()),
        &callable(vec![Type::integer()], Type::string()),
    ));
}

#[test]
fn simulation_freshens_generic_overloads() {
    // left: (x: T) -> T; called as (int) -> int. The simulation freshens T,
    // solves it to int, and instantiates the return.
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let variable = Type::Variable(UnaryVariable::new(pyrite_common::intern("T")));
    let identity = Callable::anonymous(Overload {
        annotation: variable.clone(),
        parameters: CallableParameters::from_types(vec![variable]),
    });
    let called_as = Overload {
        annotation: Type::integer(),
        parameters: CallableParameters::from_types(vec![Type::integer()]),
    };
    let simulated =
        order.simulate_signature_select(&identity, &called_as, &ConstraintSet::empty());
    assert_eq!(simulated.len(), 1);
    assert_eq!(simulated[0].0, Type::integer());
}

#[test]
fn overloads_try_in_order_with_implementation_fallback() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let overloaded = Callable::anonymous(Overload {
        annotation: Type::object(),
        parameters: CallableParameters::from_types(vec![Type::object()]),
    })
    .with_overloads(vec![Overload {
        annotation: Type::string(),
        parameters: CallableParameters::from_types(vec![Type::string()]),
    }]);

    // A string call matches the explicit overload.
    let string_call = Overload {
        annotation: Type::string(),
        parameters: CallableParameters::from_types(vec![Type::string()]),
    };
    let simulated =
        order.simulate_signature_select(&overloaded, &string_call, &ConstraintSet::empty());
    assert_eq!(simulated[0].0, Type::string());

    // An int call misses the overload and falls back to the implementation.
    let int_call = Overload {
        annotation: Type::object(),
        parameters: CallableParameters::from_types(vec![Type::integer()]),
    };
    let simulated =
        order.simulate_signature_select(&overloaded, &int_call, &ConstraintSet::empty());
    assert_eq!(simulated.len(), 1);
    assert_eq!(simulated[0].0, Type::object());
}

#[test]
fn named_parameters_match_positionally() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let named = Type::Callable(Box::new(Callable::anonymous(Overload {
        annotation: Type::none(),
        parameters: CallableParameters::Defined(vec![CallableParameter::Named {
            name: pyrite_common::intern("x"),
            annotation: Type::integer(),
            default: false,
        }]),
    })));
    let anonymous = callable(vec![Type::integer()], Type::none());
    assert!(order.always_less_or_equal(&named, &anonymous));
}

#[test]
fn keywords_accept_double_star_flow() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let takes_keywords = Type::Callable(Box::new(Callable::anonymous(Overload {
        annotation: Type::none(),
        parameters: CallableParameters::Defined(vec![CallableParameter::Keywords(
            Type::integer(),
        )]),
    })));
    let requires_named = Type::Callable(Box::new(Callable::anonymous(Overload {
        annotation: Type::none(),
        parameters: CallableParameters::Defined(vec![CallableParameter::KeywordOnly {
            name: pyrite_common::intern("flag"),
            annotation: Type::integer(),
            default: false,
        }]),
    })));
    // A callable with **kwargs: int accepts any call the named form accepts.
    assert!(order.always_less_or_equal(&takes_keywords, &requires_named));
}

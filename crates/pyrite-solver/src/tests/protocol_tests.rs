//! Structural (protocol) conformance tests.

use crate::class_handler::SimpleClassHandler;
use crate::order::TypeOrder;
use pyrite_common::intern;
use pyrite_types::{CallableParameters, Parameter, Type, UnaryVariable, Variable, Variance};

fn nullary_method(annotation: Type) -> Type {
    Type::callable(CallableParameters::from_types(vec![]), annotation)
}

#[test]
fn conforming_class_instantiates_empty_parameters() {
    // protocol SupportsLen: def __len__(self) -> int
    let mut handler = SimpleClassHandler::with_builtins();
    let protocol = handler.add_protocol("SupportsLen", vec![("__len__", nullary_method(Type::integer()))]);
    handler.add_class("Sized", &[]);
    handler.add_attributes("Sized", vec![("__len__", nullary_method(Type::integer()))]);

    let mut order = TypeOrder::new(&handler);
    let candidate = Type::primitive("Sized");
    assert_eq!(
        order.instantiate_protocol_parameters(&candidate, protocol),
        Some(vec![])
    );
    assert!(order.always_less_or_equal(&candidate, &Type::Primitive(protocol)));
}

#[test]
fn missing_attribute_fails_conformance() {
    let mut handler = SimpleClassHandler::with_builtins();
    let protocol = handler.add_protocol("SupportsLen", vec![("__len__", nullary_method(Type::integer()))]);
    handler.add_class("Opaque", &[]);
    handler.add_attributes("Opaque", vec![("size", Type::integer())]);

    let mut order = TypeOrder::new(&handler);
    let candidate = Type::primitive("Opaque");
    assert_eq!(order.instantiate_protocol_parameters(&candidate, protocol), None);
    assert!(!order.always_less_or_equal(&candidate, &Type::Primitive(protocol)));
}

#[test]
fn wrong_attribute_type_fails_conformance() {
    let mut handler = SimpleClassHandler::with_builtins();
    let protocol = handler.add_protocol("SupportsLen", vec![("__len__", nullary_method(Type::integer()))]);
    handler.add_class("Lying", &[]);
    handler.add_attributes("Lying", vec![("__len__", nullary_method(Type::string()))]);

    let mut order = TypeOrder::new(&handler);
    assert_eq!(
        order.instantiate_protocol_parameters(&Type::primitive("Lying"), protocol),
        None
    );
}

#[test]
fn generic_protocol_solves_its_parameter() {
    // protocol Yields[T_co]: def value(self) -> T_co
    let mut handler = SimpleClassHandler::with_builtins();
    let variable = UnaryVariable::new(intern("T_co")).with_variance(Variance::Covariant);
    let protocol = handler.add_protocol(
        "Yields",
        vec![("value", nullary_method(Type::Variable(variable.clone())))],
    );
    handler
        .hierarchy
        .set_variables(protocol, vec![Variable::Unary(variable)]);
    handler.add_class("IntSource", &[]);
    handler.add_attributes("IntSource", vec![("value", nullary_method(Type::integer()))]);

    let mut order = TypeOrder::new(&handler);
    let parameters = order
        .instantiate_protocol_parameters(&Type::primitive("IntSource"), protocol)
        .expect("IntSource yields ints");
    assert_eq!(parameters, vec![Parameter::Single(Type::integer())]);
}

#[test]
fn nominal_mention_answers_itself() {
    let mut handler = SimpleClassHandler::with_builtins();
    let protocol = handler.add_protocol("SupportsLen", vec![("__len__", nullary_method(Type::integer()))]);
    let mut order = TypeOrder::new(&handler);
    assert_eq!(
        order.instantiate_protocol_parameters(&Type::Primitive(protocol), protocol),
        Some(vec![])
    );
}

#[test]
fn callable_conforms_through_call() {
    // protocol Invokable: def __call__(self) -> int
    let mut handler = SimpleClassHandler::with_builtins();
    let protocol =
        handler.add_protocol("Invokable", vec![("__call__", nullary_method(Type::integer()))]);
    let mut order = TypeOrder::new(&handler);
    let callable = nullary_method(Type::integer());
    assert_eq!(
        order.instantiate_protocol_parameters(&callable, protocol),
        Some(vec![])
    );
    let wrong = nullary_method(Type::string());
    assert_eq!(order.instantiate_protocol_parameters(&wrong, protocol), None);
}

#[test]
fn recursive_conformance_terminates() {
    // protocol Chainable: def next(self) -> Chainable
    let mut handler = SimpleClassHandler::with_builtins();
    let protocol = handler.add_protocol(
        "Chainable",
        vec![("next", nullary_method(Type::primitive("Chainable")))],
    );
    handler.add_class("Chain", &[]);
    handler.add_attributes("Chain", vec![("next", nullary_method(Type::primitive("Chain")))]);

    let mut order = TypeOrder::new(&handler);
    // The inner `Chain <= Chainable` goal recurs; the assumption bag answers
    // it tentatively instead of looping.
    assert_eq!(
        order.instantiate_protocol_parameters(&Type::primitive("Chain"), protocol),
        Some(vec![])
    );
}

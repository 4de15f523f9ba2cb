//! Mutable-literal weakening tests.

use crate::class_handler::SimpleClassHandler;
use crate::order::TypeOrder;
use crate::weaken::weaken_mutable_literals;
use pyrite_ast::{Dictionary, Expression, Node};
use pyrite_common::intern;
use pyrite_types::{Type, TypedDictionary, TypedDictionaryField};

fn list_display(elements: Vec<Expression>) -> Node<Expression> {
    Node::synthetic(Expression::List(
        elements.into_iter().map(Node::synthetic).collect(),
    ))
}

fn dict_display(entries: Vec<(Expression, Expression)>) -> Node<Expression> {
    Node::synthetic(Expression::Dictionary(Dictionary {
        entries: entries
            .into_iter()
            .map(|(key, value)| (Node::synthetic(key), Node::synthetic(value)))
            .collect(),
        keywords: Vec::new(),
    }))
}

#[test]
fn list_literal_weakens_to_expected_element() {
    // [1, 2] : list[int] against list[object] type-checks.
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let display = list_display(vec![Expression::Integer(1), Expression::Integer(2)]);
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &Type::list(Type::integer()),
        &Type::list(Type::object()),
    );
    assert_eq!(weakened, Type::list(Type::object()));
}

#[test]
fn incompatible_elements_stay_resolved() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let display = list_display(vec![Expression::String("s".to_string())]);
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &Type::list(Type::string()),
        &Type::list(Type::integer()),
    );
    assert_eq!(weakened, Type::list(Type::string()));
}

#[test]
fn abstract_containers_reclothe() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let display = list_display(vec![Expression::Integer(1)]);
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &Type::list(Type::integer()),
        &Type::sequence(Type::object()),
    );
    assert_eq!(weakened, Type::sequence(Type::object()));
}

#[test]
fn optional_expectation_unwraps() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let display = list_display(vec![Expression::Integer(1)]);
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &Type::list(Type::integer()),
        &Type::optional(Type::list(Type::object())),
    );
    assert_eq!(weakened, Type::optional(Type::list(Type::object())));
}

#[test]
fn union_expectation_prefers_first_accepting_alternative() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let display = list_display(vec![Expression::Integer(1)]);
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &Type::list(Type::integer()),
        &Type::union(vec![Type::list(Type::object()), Type::string()]),
    );
    assert_eq!(weakened, Type::list(Type::object()));
}

#[test]
fn dict_display_weakens_against_typed_dictionary() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let movie = TypedDictionary {
        name: intern("Movie"),
        fields: vec![
            TypedDictionaryField {
                name: intern("title"),
                annotation: Type::string(),
            },
            TypedDictionaryField {
                name: intern("year"),
                annotation: Type::integer(),
            },
        ],
        total: true,
    };
    let display = dict_display(vec![
        (
            Expression::String("title".to_string()),
            Expression::String("Blade Runner".to_string()),
        ),
        (Expression::String("year".to_string()), Expression::Integer(1982)),
    ]);
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &Type::dictionary(Type::string(), Type::object()),
        &Type::TypedDictionary(movie.clone()),
    );
    assert_eq!(weakened, Type::TypedDictionary(movie));
}

#[test]
fn missing_fields_tolerated_only_when_non_total() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let fields = vec![
        TypedDictionaryField {
            name: intern("title"),
            annotation: Type::string(),
        },
        TypedDictionaryField {
            name: intern("year"),
            annotation: Type::integer(),
        },
    ];
    let display = dict_display(vec![(
        Expression::String("title".to_string()),
        Expression::String("Alien".to_string()),
    )]);
    let resolved = Type::dictionary(Type::string(), Type::string());

    let total = TypedDictionary {
        name: intern("Movie"),
        fields: fields.clone(),
        total: true,
    };
    let unweakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &resolved,
        &Type::TypedDictionary(total),
    );
    assert_eq!(unweakened, resolved, "total dictionaries need every field");

    let partial = TypedDictionary {
        name: intern("Movie"),
        fields,
        total: false,
    };
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &resolved,
        &Type::TypedDictionary(partial.clone()),
    );
    assert_eq!(weakened, Type::TypedDictionary(partial));
}

#[test]
fn unknown_keys_fail_typed_dictionary_weakening() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let movie = TypedDictionary {
        name: intern("Movie"),
        fields: vec![TypedDictionaryField {
            name: intern("title"),
            annotation: Type::string(),
        }],
        total: false,
    };
    let display = dict_display(vec![(
        Expression::String("director".to_string()),
        Expression::String("Scott".to_string()),
    )]);
    let resolved = Type::dictionary(Type::string(), Type::string());
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&display),
        &resolved,
        &Type::TypedDictionary(movie),
    );
    assert_eq!(weakened, resolved);
}

#[test]
fn non_display_expressions_stay_resolved() {
    let handler = SimpleClassHandler::with_builtins();
    let mut order = TypeOrder::new(&handler);
    let name = Node::synthetic(Expression::Name(pyrite_ast::Name::Identifier(intern("xs"))));
    let weakened = weaken_mutable_literals(
        &mut order,
        Some(&name),
        &Type::list(Type::integer()),
        &Type::list(Type::object()),
    );
    assert_eq!(weakened, Type::list(Type::integer()));
}

//! Dataclass synthesis tests.

use crate::attributes::{AttributeTable, InitializedState, UninstantiatedAnnotation};
use crate::dataclasses::{
    merge_fields, synthesize_methods, unwrap_init_var, value_provides_default, DataclassField,
    DataclassOptions,
};
use pyrite_ast::{Argument, Call, Expression, Name, Node};
use pyrite_common::intern;
use pyrite_types::{well_known, CallableParameters, Type};

fn decorator(name: &str) -> Node<Expression> {
    Node::synthetic(Expression::Name(Name::Identifier(intern(name))))
}

fn called_decorator(name: &str, keywords: &[(&str, bool)]) -> Node<Expression> {
    Node::synthetic(Expression::Call(Call {
        callee: Box::new(decorator(name)),
        arguments: keywords
            .iter()
            .map(|(keyword, flag)| Argument {
                name: Some(Node::synthetic(intern(keyword))),
                value: Node::synthetic(if *flag {
                    Expression::True
                } else {
                    Expression::False
                }),
            })
            .collect(),
    }))
}

fn fields() -> Vec<DataclassField> {
    vec![
        DataclassField {
            name: intern("x"),
            annotation: Type::integer(),
            has_default: false,
        },
        DataclassField {
            name: intern("y"),
            annotation: Type::string(),
            has_default: true,
        },
    ]
}

#[test]
fn decorator_recognition_and_options() {
    assert_eq!(
        DataclassOptions::from_decorator(&decorator("dataclass")),
        Some(DataclassOptions {
            init: true,
            repr: true,
            eq: true,
            order: false,
            collect_parent_fields: true,
        })
    );
    assert_eq!(
        DataclassOptions::from_decorator(&called_decorator(
            "dataclasses.dataclass",
            &[("order", true), ("repr", false)]
        )),
        Some(DataclassOptions {
            init: true,
            repr: false,
            eq: true,
            order: true,
            collect_parent_fields: true,
        })
    );
    let attrs = DataclassOptions::from_decorator(&decorator("attr.s")).unwrap();
    assert!(!attrs.collect_parent_fields);
    assert_eq!(DataclassOptions::from_decorator(&decorator("lru_cache")), None);
}

#[test]
fn init_signature_follows_declaration_order() {
    // @dataclass class C: x: int; y: str = "hi"
    let names = well_known();
    let mut table = AttributeTable::new();
    synthesize_methods(
        &mut table,
        intern("C"),
        &fields(),
        &DataclassOptions::from_decorator(&decorator("dataclass")).unwrap(),
    );

    let init = table.lookup(names.init).expect("__init__ synthesized");
    let UninstantiatedAnnotation::Method { callable, .. } = &init.annotation else {
        panic!("__init__ must be a method");
    };
    assert_eq!(callable.implementation.annotation, Type::none());
    let CallableParameters::Defined(parameters) = &callable.implementation.parameters else {
        panic!("__init__ has defined parameters");
    };
    assert_eq!(parameters.len(), 3);
    assert_eq!(parameters[1].name(), Some(intern("x")));
    assert!(!parameters[1].has_default());
    assert_eq!(parameters[2].name(), Some(intern("y")));
    assert!(parameters[2].has_default());
}

#[test]
fn synthesized_member_set() {
    let names = well_known();
    let mut table = AttributeTable::new();
    synthesize_methods(
        &mut table,
        intern("C"),
        &fields(),
        &DataclassOptions::from_decorator(&decorator("dataclass")).unwrap(),
    );
    for member in ["x", "y"] {
        assert!(table.lookup(intern(member)).is_some(), "missing {}", member);
    }
    for member in [names.init, names.repr, names.eq] {
        assert!(table.lookup(member).is_some());
    }
    assert!(table.lookup(names.lt).is_none(), "order off by default");
    // Synthesized fields are implicitly initialized.
    assert_eq!(
        table.lookup(intern("x")).unwrap().initialized,
        InitializedState::Implicitly
    );
}

#[test]
fn order_option_synthesizes_comparisons() {
    let names = well_known();
    let mut table = AttributeTable::new();
    synthesize_methods(
        &mut table,
        intern("C"),
        &fields(),
        &DataclassOptions::from_decorator(&called_decorator("dataclass", &[("order", true)]))
            .unwrap(),
    );
    for member in [names.lt, names.le, names.gt, names.ge] {
        assert!(table.lookup(member).is_some());
    }
}

#[test]
fn explicit_members_beat_synthesized_ones() {
    let names = well_known();
    let mut table = AttributeTable::new();
    let explicit = crate::attributes::UninstantiatedAttribute::simple(
        names.repr,
        intern("C"),
        Type::string(),
    );
    table.insert(explicit.clone());
    synthesize_methods(
        &mut table,
        intern("C"),
        &fields(),
        &DataclassOptions::from_decorator(&decorator("dataclass")).unwrap(),
    );
    assert_eq!(table.lookup(names.repr), Some(&explicit));
}

#[test]
fn subclass_fields_override_in_place() {
    let parent = vec![
        DataclassField {
            name: intern("a"),
            annotation: Type::integer(),
            has_default: false,
        },
        DataclassField {
            name: intern("b"),
            annotation: Type::integer(),
            has_default: false,
        },
    ];
    let own = vec![DataclassField {
        name: intern("a"),
        annotation: Type::string(),
        has_default: true,
    }];
    let merged = merge_fields(vec![parent], own);
    assert_eq!(merged.len(), 2);
    // `a` keeps its original position but takes the subclass declaration.
    assert_eq!(merged[0].name, intern("a"));
    assert_eq!(merged[0].annotation, Type::string());
    assert!(merged[0].has_default);
    assert_eq!(merged[1].name, intern("b"));
}

#[test]
fn init_var_unwraps() {
    let names = well_known();
    let wrapped = Type::parametric_over(names.init_var, vec![Type::integer()]);
    assert_eq!(unwrap_init_var(&wrapped), Type::integer());
    assert_eq!(unwrap_init_var(&Type::string()), Type::string());
}

#[test]
fn field_call_defaults_are_recognized() {
    let field_with_default = Node::synthetic(Expression::Call(Call {
        callee: Box::new(decorator("field")),
        arguments: vec![Argument {
            name: Some(Node::synthetic(intern("default_factory"))),
            value: Node::synthetic(Expression::Name(Name::Identifier(intern("list")))),
        }],
    }));
    assert!(value_provides_default(&field_with_default));

    let field_without = Node::synthetic(Expression::Call(Call {
        callee: Box::new(decorator("field")),
        arguments: vec![Argument {
            name: Some(Node::synthetic(intern("metadata"))),
            value: Node::synthetic(Expression::None),
        }],
    }));
    assert!(!value_provides_default(&field_without));

    let plain = Node::synthetic(Expression::Integer(3));
    assert!(value_provides_default(&plain));
}

#[test]
fn eq_takes_object() {
    let names = well_known();
    let mut table = AttributeTable::new();
    synthesize_methods(
        &mut table,
        intern("C"),
        &fields(),
        &DataclassOptions::from_decorator(&decorator("dataclass")).unwrap(),
    );
    let eq = table.lookup(names.eq).unwrap();
    let UninstantiatedAnnotation::Method { callable, .. } = &eq.annotation else {
        panic!("__eq__ must be a method");
    };
    let CallableParameters::Defined(parameters) = &callable.implementation.parameters else {
        panic!("__eq__ has defined parameters");
    };
    assert_eq!(
        parameters[1].annotation(),
        Some(&Type::object()),
        "__eq__ compares against object"
    );
    assert_eq!(callable.implementation.annotation, Type::boolean());
}

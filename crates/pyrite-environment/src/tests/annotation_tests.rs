//! Annotation parser tests.

use super::helpers::*;
use crate::annotation_parser::{parse_annotation, Alias, AnnotationContext};
use pyrite_ast::{Expression, Node};
use pyrite_common::{intern, Location, Reference};
use pyrite_types::{well_known, CallableParameters, Literal, Type, UnaryVariable, Variable};
use pretty_assertions::assert_eq;

fn parse(expression: Node<Expression>) -> Type {
    parse_annotation(&expression, &AnnotationContext::empty())
}

#[test]
fn builtin_names_parse() {
    assert_eq!(parse(name("int")), Type::integer());
    assert_eq!(parse(name("str")), Type::string());
    assert_eq!(parse(name("bool")), Type::boolean());
    assert_eq!(parse(name("object")), Type::object());
    assert_eq!(
        parse(Node::new(Expression::None, Location::any())),
        Type::none()
    );
}

#[test]
fn typing_constructors_parse() {
    assert_eq!(
        parse(subscript("typing.Optional", name("int"))),
        Type::optional(Type::integer())
    );
    assert_eq!(
        parse(subscript(
            "typing.Union",
            Node::new(
                Expression::Tuple(vec![name("int"), name("str")]),
                Location::any()
            )
        )),
        Type::union(vec![Type::integer(), Type::string()])
    );
    assert_eq!(
        parse(subscript("typing.List", name("int"))),
        Type::list(Type::integer())
    );
    assert_eq!(
        parse(subscript(
            "typing.Dict",
            Node::new(
                Expression::Tuple(vec![name("str"), name("int")]),
                Location::any()
            )
        )),
        Type::dictionary(Type::string(), Type::integer())
    );
}

#[test]
fn tuple_forms_parse() {
    assert_eq!(
        parse(subscript(
            "typing.Tuple",
            Node::new(
                Expression::Tuple(vec![name("int"), name("str")]),
                Location::any()
            )
        )),
        Type::tuple(vec![Type::integer(), Type::string()])
    );
    assert_eq!(
        parse(subscript(
            "typing.Tuple",
            Node::new(
                Expression::Tuple(vec![
                    name("int"),
                    Node::new(Expression::Ellipsis, Location::any())
                ]),
                Location::any()
            )
        )),
        Type::unbounded_tuple(Type::integer())
    );
}

#[test]
fn callable_annotations_parse() {
    let parsed = parse(subscript(
        "typing.Callable",
        Node::new(
            Expression::Tuple(vec![
                Node::new(Expression::List(vec![name("int")]), Location::any()),
                name("str"),
            ]),
            Location::any(),
        ),
    ));
    let Type::Callable(callable) = &parsed else {
        panic!("expected a callable, got {}", parsed);
    };
    assert_eq!(callable.implementation.annotation, Type::string());
    match &callable.implementation.parameters {
        CallableParameters::Defined(parameters) => assert_eq!(parameters.len(), 1),
        parameters => panic!("unexpected parameters {:?}", parameters),
    }
}

#[test]
fn literal_annotations_parse() {
    assert_eq!(
        parse(subscript("Literal", integer(7))),
        Type::literal_integer(7)
    );
    assert_eq!(
        parse(subscript(
            "Literal",
            Node::new(
                Expression::Tuple(vec![integer(1), integer(2)]),
                Location::any()
            )
        )),
        Type::union(vec![Type::literal_integer(1), Type::literal_integer(2)])
    );
}

#[test]
fn aliases_resolve_with_cycle_guard() {
    let target = Type::list(Type::integer());
    let resolve_alias = |reference: &Reference| {
        if reference.to_string() == "IntList" {
            Some(Alias::TypeAlias(Type::list(Type::integer())))
        } else if reference.to_string() == "Loop" {
            // A self-referential alias; the visited set must cut it.
            Some(Alias::TypeAlias(Type::Primitive(intern("Loop"))))
        } else {
            None
        }
    };
    let qualify = |_: &Reference| None;
    let context = AnnotationContext {
        resolve_alias: &resolve_alias,
        qualify: &qualify,
    };
    assert_eq!(parse_annotation(&name("IntList"), &context), target);
    // The self-loop parses to something stable rather than diverging.
    let _ = parse_annotation(&name("Loop"), &context);
}

#[test]
fn type_variables_resolve_through_aliases() {
    let variable = UnaryVariable::new(intern("T"));
    let resolve_alias = |reference: &Reference| {
        (reference.to_string() == "T")
            .then(|| Alias::VariableAlias(Variable::Unary(UnaryVariable::new(intern("T")))))
    };
    let qualify = |_: &Reference| None;
    let context = AnnotationContext {
        resolve_alias: &resolve_alias,
        qualify: &qualify,
    };
    assert_eq!(
        parse_annotation(&name("T"), &context),
        Type::Variable(variable)
    );
}

#[test]
fn unknown_shapes_collapse_to_top() {
    assert_eq!(parse(integer(3)), Type::Top);
    assert_eq!(
        parse(Node::new(
            Expression::String("unresolvable".to_string()),
            Location::any()
        )),
        Type::Top
    );
}

#[test]
fn unqualified_class_names_qualify() {
    let qualify = |reference: &Reference| {
        (reference.to_string() == "C").then(|| intern("m.C"))
    };
    let resolve_alias = |_: &Reference| None;
    let context = AnnotationContext {
        resolve_alias: &resolve_alias,
        qualify: &qualify,
    };
    assert_eq!(
        parse_annotation(&name("C"), &context),
        Type::Primitive(intern("m.C"))
    );
}

#[test]
fn literal_displays_type_as_containers() {
    use crate::annotation_parser::literal_type;
    assert_eq!(
        literal_type(&integer(3)),
        Type::Literal(Literal::Integer(3))
    );
    let display = Node::new(
        Expression::List(vec![integer(1), integer(2)]),
        Location::any(),
    );
    assert_eq!(literal_type(&display), Type::list(Type::integer()));
    let names = well_known();
    let empty = Node::new(Expression::List(vec![]), Location::any());
    assert_eq!(
        literal_type(&empty),
        Type::parametric_over(names.list, vec![Type::Bottom])
    );
}

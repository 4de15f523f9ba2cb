//! AST construction helpers shared by the environment tests.

use pyrite_ast::{
    Assign, Call, ClassDef, Define, Expression, Import, ImportEntry, Name, Node, Parameter,
    Signature, Statement,
};
use pyrite_common::{intern, Location, Position, Reference};

/// Distinct concrete locations so lookup tables and dependency keys differ.
pub fn location(line: u32) -> Location {
    Location::new(Position::new(line, 0), Position::new(line, 80))
}

pub fn name(identifier: &str) -> Node<Expression> {
    Node::new(
        Expression::Name(Name::Identifier(intern(identifier))),
        Location::any(),
    )
}

pub fn dotted(reference: &str) -> Node<Expression> {
    let reference = Reference::new(reference);
    let mut components = reference.components().iter();
    let mut expression = Node::new(
        Expression::Name(Name::Identifier(*components.next().expect("nonempty"))),
        Location::any(),
    );
    for component in components {
        expression = Node::new(
            Expression::Name(Name::Attribute {
                base: Box::new(expression),
                attribute: *component,
                special: false,
            }),
            Location::any(),
        );
    }
    expression
}

pub fn subscript(base: &str, index: Node<Expression>) -> Node<Expression> {
    Node::new(
        Expression::Subscript(pyrite_ast::Subscript {
            base: Box::new(dotted(base)),
            index: Box::new(index),
        }),
        Location::any(),
    )
}

pub fn integer(value: i64) -> Node<Expression> {
    Node::new(Expression::Integer(value), Location::any())
}

pub fn string(value: &str) -> Node<Expression> {
    Node::new(Expression::String(value.to_string()), Location::any())
}

pub fn annotated_assign(
    target: &str,
    annotation: Node<Expression>,
    value: Option<Node<Expression>>,
    line: u32,
) -> Node<Statement> {
    Node::new(
        Statement::Assign(Assign {
            target: name(target),
            annotation: Some(annotation),
            value,
        }),
        location(line),
    )
}

pub fn plain_assign(target: &str, value: Node<Expression>, line: u32) -> Node<Statement> {
    Node::new(
        Statement::Assign(Assign {
            target: name(target),
            annotation: None,
            value: Some(value),
        }),
        location(line),
    )
}

pub fn parameter(parameter_name: &str, annotation: Option<Node<Expression>>) -> Node<Parameter> {
    Node::new(
        Parameter {
            name: intern(parameter_name),
            annotation,
            default: None,
        },
        Location::any(),
    )
}

pub fn define(
    qualified_name: &str,
    parameters: Vec<Node<Parameter>>,
    return_annotation: Option<Node<Expression>>,
    line: u32,
) -> Node<Statement> {
    Node::new(
        Statement::Define(Define {
            signature: Signature {
                name: Node::new(Reference::new(qualified_name), location(line)),
                parameters,
                decorators: Vec::new(),
                return_annotation,
                is_async: false,
                is_static_method: false,
                is_class_method: false,
                is_property: false,
                parent: None,
            },
            body: Vec::new(),
        }),
        location(line),
    )
}

pub fn class(
    class_name: &str,
    bases: Vec<Node<Expression>>,
    decorators: Vec<Node<Expression>>,
    body: Vec<Node<Statement>>,
    line: u32,
) -> Node<Statement> {
    Node::new(
        Statement::Class(ClassDef {
            name: Node::new(Reference::new(class_name), location(line)),
            bases,
            keywords: Vec::new(),
            decorators,
            body,
        }),
        location(line),
    )
}

pub fn import_from(from: &str, entry: &str, line: u32) -> Node<Statement> {
    Node::new(
        Statement::Import(Import {
            from: Some(Reference::new(from)),
            imports: vec![ImportEntry {
                name: Reference::new(entry),
                alias: None,
            }],
        }),
        location(line),
    )
}

pub fn decorator_call(target: &str, keywords: &[(&str, bool)]) -> Node<Expression> {
    Node::new(
        Expression::Call(Call {
            callee: Box::new(dotted(target)),
            arguments: keywords
                .iter()
                .map(|(keyword, flag)| pyrite_ast::Argument {
                    name: Some(Node::new(intern(keyword), Location::any())),
                    value: Node::new(
                        if *flag {
                            Expression::True
                        } else {
                            Expression::False
                        },
                        Location::any(),
                    ),
                })
                .collect(),
        }),
        Location::any(),
    )
}

//! Expression nodes.
//!
//! Only the shapes the core inspects are modeled: names and attribute chains
//! (annotation parsing, global resolution), calls (signature selection,
//! decorator recognition), literals and container displays (literal types,
//! mutable-literal weakening), subscripts (generic annotations).

use crate::Node;
use pyrite_common::{Atom, Reference};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Name(Name),
    Call(Call),
    Subscript(Subscript),
    Lambda(Box<Lambda>),
    Starred(Starred),
    /// Integer literal. Large literals are clamped by the external parser.
    Integer(i64),
    String(String),
    /// Byte-string literal; annotation-position strings are re-parsed upstream.
    Bytes(String),
    Float(u64),
    True,
    False,
    None,
    Ellipsis,
    Tuple(Vec<Node<Expression>>),
    List(Vec<Node<Expression>>),
    Set(Vec<Node<Expression>>),
    Dictionary(Dictionary),
    BooleanOperation {
        left: Box<Node<Expression>>,
        operator: BooleanOperator,
        right: Box<Node<Expression>>,
    },
    Comparison {
        left: Box<Node<Expression>>,
        operator: ComparisonOperator,
        right: Box<Node<Expression>>,
    },
    Await(Box<Node<Expression>>),
}

/// A name expression: a bare identifier or a dotted attribute access.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Name {
    Identifier(Atom),
    Attribute {
        base: Box<Node<Expression>>,
        attribute: Atom,
        /// Sugared accesses (`__getattr__` fallthrough) the parser marks.
        special: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub callee: Box<Node<Expression>>,
    pub arguments: Vec<Argument>,
}

/// One call argument. `name` is set for keyword arguments; a `Starred`
/// value expression carries the `*`/`**` distinction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    pub name: Option<Node<Atom>>,
    pub value: Node<Expression>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscript {
    pub base: Box<Node<Expression>>,
    pub index: Box<Node<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lambda {
    pub parameters: Vec<Node<crate::statement::Parameter>>,
    pub body: Node<Expression>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarKind {
    /// `*args`
    Once,
    /// `**kwargs`
    Twice,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Starred {
    pub kind: StarKind,
    pub value: Box<Node<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dictionary {
    pub entries: Vec<(Node<Expression>, Node<Expression>)>,
    /// `**`-splatted sub-dictionaries, in order of appearance.
    pub keywords: Vec<Node<Expression>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOperator {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    Is,
    IsNot,
    In,
    NotIn,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
}

impl Expression {
    /// Flatten a name/attribute chain into a dotted `Reference`.
    /// Returns `None` when any link is not a plain name.
    pub fn as_reference(&self) -> Option<Reference> {
        match self {
            Expression::Name(Name::Identifier(identifier)) => {
                Some(Reference::from_components(vec![*identifier]))
            }
            Expression::Name(Name::Attribute {
                base, attribute, ..
            }) => base
                .value
                .as_reference()
                .map(|prefix| prefix.with_component(*attribute)),
            _ => None,
        }
    }

    /// The callee reference of a decorator or field-call pattern, if the
    /// expression is `name(...)` or a bare `name`.
    pub fn call_target(&self) -> Option<Reference> {
        match self {
            Expression::Call(call) => call.callee.value.as_reference(),
            _ => self.as_reference(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_common::intern;
    use pyrite_common::Location;

    fn name(identifier: &str) -> Node<Expression> {
        Node::new(
            Expression::Name(Name::Identifier(intern(identifier))),
            Location::any(),
        )
    }

    #[test]
    fn attribute_chain_flattens_to_reference() {
        let chain = Expression::Name(Name::Attribute {
            base: Box::new(Node::new(
                Expression::Name(Name::Attribute {
                    base: Box::new(name("os")),
                    attribute: intern("path"),
                    special: false,
                }),
                Location::any(),
            )),
            attribute: intern("sep"),
            special: false,
        });
        assert_eq!(chain.as_reference().unwrap().to_string(), "os.path.sep");
    }

    #[test]
    fn call_is_not_a_reference() {
        let call = Expression::Call(Call {
            callee: Box::new(name("f")),
            arguments: vec![],
        });
        assert_eq!(call.as_reference(), None);
        assert_eq!(call.call_target().unwrap().to_string(), "f");
    }
}

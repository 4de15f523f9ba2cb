//! Statement nodes.

use crate::expression::Expression;
use crate::Node;
use pyrite_common::{Atom, Reference};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    Assign(Assign),
    Define(Define),
    Class(ClassDef),
    Import(Import),
    Expression(Node<Expression>),
    Return(Return),
    Raise(Raise),
    If {
        test: Node<Expression>,
        body: Vec<Node<Statement>>,
        orelse: Vec<Node<Statement>>,
    },
    Pass,
}

/// `target: annotation = value`; each of annotation and value may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assign {
    pub target: Node<Expression>,
    pub annotation: Option<Node<Expression>>,
    pub value: Option<Node<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Atom,
    pub annotation: Option<Node<Expression>>,
    pub default: Option<Node<Expression>>,
}

/// A function signature as the parser hands it over; decorators unapplied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: Node<Reference>,
    pub parameters: Vec<Node<Parameter>>,
    pub decorators: Vec<Node<Expression>>,
    pub return_annotation: Option<Node<Expression>>,
    pub is_async: bool,
    pub is_static_method: bool,
    pub is_class_method: bool,
    pub is_property: bool,
    /// Enclosing class, when the define is a method.
    pub parent: Option<Reference>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Define {
    pub signature: Signature,
    pub body: Vec<Node<Statement>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: Node<Reference>,
    pub bases: Vec<Node<Expression>>,
    pub keywords: Vec<(Atom, Node<Expression>)>,
    pub decorators: Vec<Node<Expression>>,
    pub body: Vec<Node<Statement>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportEntry {
    pub name: Reference,
    pub alias: Option<Atom>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Import {
    /// `from X import ...` when set; plain `import ...` otherwise.
    pub from: Option<Reference>,
    pub imports: Vec<ImportEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Return {
    pub expression: Option<Node<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Raise {
    pub expression: Option<Node<Expression>>,
}

impl ClassDef {
    /// Base expressions that name classes (skips keyword-only bases like
    /// `metaclass=`).
    pub fn base_references(&self) -> impl Iterator<Item = Reference> + '_ {
        self.bases
            .iter()
            .filter_map(|base| base.value.as_reference())
    }

    /// Whether any decorator matches one of `targets` (dotted names).
    pub fn has_decorator(&self, targets: &[&str]) -> bool {
        self.decorators.iter().any(|decorator| {
            decorator
                .value
                .call_target()
                .map(|reference| targets.iter().any(|target| reference.to_string() == *target))
                .unwrap_or(false)
        })
    }

    /// The decorator node matching one of `targets`, if any.
    pub fn find_decorator(&self, targets: &[&str]) -> Option<&Node<Expression>> {
        self.decorators.iter().find(|decorator| {
            decorator
                .value
                .call_target()
                .map(|reference| targets.iter().any(|target| reference.to_string() == *target))
                .unwrap_or(false)
        })
    }
}

impl Signature {
    pub fn has_decorator(&self, target: &str) -> bool {
        self.decorators.iter().any(|decorator| {
            decorator
                .value
                .call_target()
                .map(|reference| reference.to_string() == target)
                .unwrap_or(false)
        })
    }
}

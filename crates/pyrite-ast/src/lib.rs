//! The AST interface consumed by the pyrite type-inference core.
//!
//! The parser itself is external; this crate only defines the node shapes the
//! core reads. Every node is a `Node<T>` pairing a value with its source
//! `Location`.

pub mod expression;
pub mod statement;

pub use expression::{
    Argument, BooleanOperator, Call, ComparisonOperator, Dictionary, Expression, Lambda, Name,
    StarKind, Starred, Subscript,
};
pub use statement::{
    Assign, ClassDef, Define, Import, ImportEntry, Parameter, Raise, Return, Signature, Statement,
};

use pyrite_common::Location;
use serde::{Deserialize, Serialize};

/// A located AST node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node<T> {
    pub value: T,
    pub location: Location,
}

impl<T> Node<T> {
    pub fn new(value: T, location: Location) -> Self {
        Self { value, location }
    }

    /// A node with a synthetic location; lookup tables skip it.
    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            location: Location::synthetic(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Node<U> {
        Node {
            value: f(self.value),
            location: self.location,
        }
    }

    pub fn as_ref(&self) -> Node<&T> {
        Node {
            value: &self.value,
            location: self.location,
        }
    }
}

//! Ordered type sequences.
//!
//! Tuples and list-variadic instantiations are both "ordered types": either a
//! concrete list, or a concatenation `[head...] ++ middle ++ [tail...]` whose
//! middle is a list-variadic variable, optionally mapped through a parametric
//! constructor (`Map[F, Ts]`).

use crate::types::Type;
use crate::variable::ListVariadic;
use pyrite_common::Atom;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderedTypes {
    Concrete(Vec<Type>),
    Concatenation(Concatenation),
}

impl OrderedTypes {
    pub fn empty() -> Self {
        OrderedTypes::Concrete(Vec::new())
    }

    pub fn as_concrete(&self) -> Option<&[Type]> {
        match self {
            OrderedTypes::Concrete(types) => Some(types),
            OrderedTypes::Concatenation(_) => None,
        }
    }

    /// All type subterms, in order. Concatenation middles contribute nothing
    /// here; callers needing the variable use `variables()`.
    pub fn types(&self) -> Vec<&Type> {
        match self {
            OrderedTypes::Concrete(types) => types.iter().collect(),
            OrderedTypes::Concatenation(concatenation) => concatenation
                .head
                .iter()
                .chain(concatenation.tail.iter())
                .collect(),
        }
    }
}

impl fmt::Display for OrderedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderedTypes::Concrete(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                Ok(())
            }
            OrderedTypes::Concatenation(concatenation) => write!(f, "{}", concatenation),
        }
    }
}

/// `[head...] ++ middle ++ [tail...]`. The middle is bare when `mappers` is
/// empty; each mapper wraps every element of the middle in a one-parameter
/// parametric, innermost first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Concatenation {
    pub head: Vec<Type>,
    pub middle: ListVariadic,
    pub mappers: Vec<Atom>,
    pub tail: Vec<Type>,
}

impl Concatenation {
    pub fn bare(middle: ListVariadic) -> Self {
        Self {
            head: Vec::new(),
            middle,
            mappers: Vec::new(),
            tail: Vec::new(),
        }
    }

    pub fn is_bare_variable(&self) -> bool {
        self.head.is_empty() && self.tail.is_empty() && self.mappers.is_empty()
    }

    /// Wrap a concrete element the way the middle's mappers would.
    pub fn apply_mappers(&self, ty: Type) -> Type {
        self.mappers.iter().fold(ty, |ty, mapper| {
            Type::parametric(*mapper, vec![crate::types::Parameter::Single(ty)])
        })
    }
}

impl fmt::Display for Concatenation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Concatenate[")?;
        for head in &self.head {
            write!(f, "{}, ", head)?;
        }
        let mut middle = format!("{}", self.middle);
        for mapper in &self.mappers {
            middle = format!("Map[{}, {}]", mapper, middle);
        }
        f.write_str(&middle)?;
        for tail in &self.tail {
            write!(f, ", {}", tail)?;
        }
        f.write_str("]")
    }
}

/// A tuple is either a bounded ordered sequence or homogeneous/unbounded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tuple {
    Bounded(OrderedTypes),
    Unbounded(Box<Type>),
}

impl Tuple {
    pub fn bounded(types: Vec<Type>) -> Self {
        Tuple::Bounded(OrderedTypes::Concrete(types))
    }

    pub fn unbounded(element: Type) -> Self {
        Tuple::Unbounded(Box::new(element))
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tuple::Bounded(OrderedTypes::Concrete(types)) if types.is_empty() => {
                f.write_str("typing.Tuple[()]")
            }
            Tuple::Bounded(ordered) => write!(f, "typing.Tuple[{}]", ordered),
            Tuple::Unbounded(element) => write!(f, "typing.Tuple[{}, ...]", element),
        }
    }
}

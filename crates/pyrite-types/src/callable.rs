//! Callable types.
//!
//! A callable carries one implementation overload, zero or more additional
//! overloads, and an optional implicit receiver binding. Parameter lists come
//! in three shapes: fully undefined (`Callable[..., R]`), a defined list, or
//! a head prefix followed by a parameter-variadic tail.

use crate::ordered_types::Concatenation;
use crate::types::Type;
use crate::variable::ParameterVariadic;
use pyrite_common::{Atom, Reference};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CallableKind {
    Anonymous,
    Named(Reference),
}

/// A single callable parameter. `default` records only whether a default
/// exists; default values themselves live in the AST.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CallableParameter {
    PositionalOnly {
        index: usize,
        annotation: Type,
        default: bool,
    },
    Named {
        name: Atom,
        annotation: Type,
        default: bool,
    },
    KeywordOnly {
        name: Atom,
        annotation: Type,
        default: bool,
    },
    /// `*args`. Either a homogeneous element type or a concatenation of a
    /// list-variadic.
    Variable(StarParameter),
    /// `**kwargs` with the given value type.
    Keywords(Type),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StarParameter {
    Concrete(Type),
    Concatenation(Concatenation),
}

impl CallableParameter {
    pub fn annotation(&self) -> Option<&Type> {
        match self {
            CallableParameter::PositionalOnly { annotation, .. }
            | CallableParameter::Named { annotation, .. }
            | CallableParameter::KeywordOnly { annotation, .. }
            | CallableParameter::Keywords(annotation) => Some(annotation),
            CallableParameter::Variable(StarParameter::Concrete(annotation)) => Some(annotation),
            CallableParameter::Variable(StarParameter::Concatenation(_)) => None,
        }
    }

    pub fn name(&self) -> Option<Atom> {
        match self {
            CallableParameter::Named { name, .. } | CallableParameter::KeywordOnly { name, .. } => {
                Some(*name)
            }
            _ => None,
        }
    }

    pub fn has_default(&self) -> bool {
        match self {
            CallableParameter::PositionalOnly { default, .. }
            | CallableParameter::Named { default, .. }
            | CallableParameter::KeywordOnly { default, .. } => *default,
            // Star parameters match zero arguments.
            CallableParameter::Variable(_) | CallableParameter::Keywords(_) => true,
        }
    }

    /// Whether an anonymous (positional) argument can land on this parameter.
    pub fn accepts_positional(&self) -> bool {
        matches!(
            self,
            CallableParameter::PositionalOnly { .. }
                | CallableParameter::Named { .. }
                | CallableParameter::Variable(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CallableParameters {
    /// `Callable[..., R]` - accepts anything.
    Undefined,
    Defined(Vec<CallableParameter>),
    /// A prefix of positional head types followed by a parameter-variadic.
    ParameterVariadicTypeVariable {
        head: Vec<Type>,
        variable: ParameterVariadic,
    },
}

impl CallableParameters {
    pub fn from_types(annotations: impl IntoIterator<Item = Type>) -> Self {
        CallableParameters::Defined(
            annotations
                .into_iter()
                .enumerate()
                .map(|(index, annotation)| CallableParameter::PositionalOnly {
                    index,
                    annotation,
                    default: false,
                })
                .collect(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Overload {
    pub annotation: Type,
    pub parameters: CallableParameters,
}

impl Overload {
    pub fn undefined(annotation: Type) -> Self {
        Self {
            annotation,
            parameters: CallableParameters::Undefined,
        }
    }
}

/// `self`-binding information for methods accessed through an instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Implicit {
    pub implicit_annotation: Type,
    pub name: Atom,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Callable {
    pub kind: CallableKind,
    pub implementation: Overload,
    pub overloads: Vec<Overload>,
    pub implicit: Option<Implicit>,
}

impl Callable {
    pub fn anonymous(implementation: Overload) -> Self {
        Self {
            kind: CallableKind::Anonymous,
            implementation,
            overloads: Vec::new(),
            implicit: None,
        }
    }

    pub fn named(name: Reference, implementation: Overload) -> Self {
        Self {
            kind: CallableKind::Named(name),
            implementation,
            overloads: Vec::new(),
            implicit: None,
        }
    }

    pub fn with_overloads(mut self, overloads: Vec<Overload>) -> Self {
        self.overloads = overloads;
        self
    }

    pub fn name(&self) -> Option<&Reference> {
        match &self.kind {
            CallableKind::Named(reference) => Some(reference),
            CallableKind::Anonymous => None,
        }
    }

    /// Overloads tried during selection: the explicit ones, then the
    /// implementation as fallback; just the implementation when no explicit
    /// overloads exist.
    pub fn signatures(&self) -> Vec<&Overload> {
        if self.overloads.is_empty() {
            vec![&self.implementation]
        } else {
            let mut signatures: Vec<&Overload> = self.overloads.iter().collect();
            signatures.push(&self.implementation);
            signatures
        }
    }

    /// Rewrite the implementation and every overload in place.
    pub fn map_implementation_and_overloads(
        &self,
        mut f: impl FnMut(&Overload) -> Overload,
    ) -> Callable {
        Callable {
            kind: self.kind.clone(),
            implementation: f(&self.implementation),
            overloads: self.overloads.iter().map(&mut f).collect(),
            implicit: self.implicit.clone(),
        }
    }

    /// Prepend anonymous positional parameters to every defined overload;
    /// used when unbinding `self`.
    pub fn prepend_anonymous_parameters(&self, annotations: Vec<Type>) -> Callable {
        self.map_implementation_and_overloads(|overload| {
            let parameters = match &overload.parameters {
                CallableParameters::Defined(parameters) => {
                    let mut prepended: Vec<CallableParameter> = annotations
                        .iter()
                        .cloned()
                        .enumerate()
                        .map(|(index, annotation)| CallableParameter::PositionalOnly {
                            index,
                            annotation,
                            default: false,
                        })
                        .collect();
                    let offset = prepended.len();
                    prepended.extend(parameters.iter().cloned().map(|parameter| match parameter {
                        CallableParameter::PositionalOnly {
                            index,
                            annotation,
                            default,
                        } => CallableParameter::PositionalOnly {
                            index: index + offset,
                            annotation,
                            default,
                        },
                        other => other,
                    }));
                    CallableParameters::Defined(prepended)
                }
                other => other.clone(),
            };
            Overload {
                annotation: overload.annotation.clone(),
                parameters,
            }
        })
    }

    /// Drop the first positional parameter of every overload; used when
    /// binding `self` into an instantiated method.
    pub fn drop_first_parameter(&self) -> Callable {
        self.map_implementation_and_overloads(|overload| {
            let parameters = match &overload.parameters {
                CallableParameters::Defined(parameters) => CallableParameters::Defined(
                    parameters
                        .iter()
                        .skip(1)
                        .cloned()
                        .map(|parameter| match parameter {
                            CallableParameter::PositionalOnly {
                                index,
                                annotation,
                                default,
                            } => CallableParameter::PositionalOnly {
                                index: index.saturating_sub(1),
                                annotation,
                                default,
                            },
                            other => other,
                        })
                        .collect(),
                ),
                other => other.clone(),
            };
            Overload {
                annotation: overload.annotation.clone(),
                parameters,
            }
        })
    }
}

impl fmt::Display for CallableParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableParameters::Undefined => f.write_str("..."),
            CallableParameters::Defined(parameters) => {
                f.write_str("[")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match parameter {
                        CallableParameter::PositionalOnly { annotation, .. } => {
                            write!(f, "{}", annotation)?
                        }
                        CallableParameter::Named {
                            name, annotation, ..
                        } => write!(f, "{}: {}", name, annotation)?,
                        CallableParameter::KeywordOnly {
                            name, annotation, ..
                        } => write!(f, "*, {}: {}", name, annotation)?,
                        CallableParameter::Variable(StarParameter::Concrete(annotation)) => {
                            write!(f, "*({})", annotation)?
                        }
                        CallableParameter::Variable(StarParameter::Concatenation(c)) => {
                            write!(f, "*({})", c)?
                        }
                        CallableParameter::Keywords(annotation) => {
                            write!(f, "**({})", annotation)?
                        }
                    }
                }
                f.write_str("]")
            }
            CallableParameters::ParameterVariadicTypeVariable { head, variable } => {
                if head.is_empty() {
                    write!(f, "{}", variable)
                } else {
                    f.write_str("Concatenate[")?;
                    for head in head {
                        write!(f, "{}, ", head)?;
                    }
                    write!(f, "{}]", variable)
                }
            }
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "typing.Callable[{}, {}]",
            self.implementation.parameters, self.implementation.annotation
        )
    }
}

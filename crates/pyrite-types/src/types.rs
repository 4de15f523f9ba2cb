//! The core `Type` sum and its structural operations.
//!
//! Construction goes through the smart constructors (`Type::union`,
//! `Type::optional`, `Type::literal_*`); they enforce the canonical-form
//! invariants equality relies on:
//! - unions are sorted, flattened, duplicate-free, never contain `Top`, and
//!   apply none-subsumption (one canonical optional form)
//! - `None` is represented as `Optional(Bottom)`
//! - escaped free variables are only produced by the escape transform

use crate::callable::{Callable, CallableParameters};
use crate::names::well_known;
use crate::ordered_types::{OrderedTypes, Tuple};
use crate::variable::{ParameterVariadic, UnaryVariable};
use pyrite_common::{intern, resolve, Atom};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value-singleton types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    String(Atom),
}

impl Literal {
    /// The nominal class this literal belongs to.
    pub fn class_name(&self) -> Atom {
        let names = well_known();
        match self {
            Literal::Boolean(_) => names.bool_,
            Literal::Integer(_) => names.int,
            Literal::String(_) => names.str_,
        }
    }
}

/// One parameter position of a `Parametric` type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    Single(Type),
    Group(OrderedTypes),
    CallableParameters(CallableParameters),
}

impl Parameter {
    pub fn as_single(&self) -> Option<&Type> {
        match self {
            Parameter::Single(ty) => Some(ty),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypedDictionaryField {
    pub name: Atom,
    pub annotation: Type,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypedDictionary {
    pub name: Atom,
    pub fields: Vec<TypedDictionaryField>,
    pub total: bool,
}

impl TypedDictionary {
    pub fn field(&self, name: Atom) -> Option<&TypedDictionaryField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Totality is encoded in the synthesized base-class name so the nominal
    /// order can compare it.
    pub fn class_name(&self) -> Atom {
        let names = well_known();
        if self.total {
            names.typed_dictionary
        } else {
            names.non_total_typed_dictionary
        }
    }
}

/// The `args`/`kwargs` half of a decomposed parameter-variadic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariadicComponent {
    PositionalArguments,
    KeywordArguments,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterVariadicComponent {
    pub component: VariadicComponent,
    pub variable: ParameterVariadic,
}

/// The closed sum of all types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// Universal subtype.
    Bottom,
    /// Universal supertype.
    Top,
    /// Both at once; the gradual escape hatch.
    Any,
    Primitive(Atom),
    Parametric {
        name: Atom,
        parameters: Vec<Parameter>,
    },
    /// `Optional(Bottom)` is `None`.
    Optional(Box<Type>),
    Union(Vec<Type>),
    Tuple(Tuple),
    TypedDictionary(TypedDictionary),
    Callable(Box<Callable>),
    Literal(Literal),
    Variable(UnaryVariable),
    ParameterVariadicComponent(ParameterVariadicComponent),
    /// Transparent wrapper; ignored by the order.
    Annotated(Box<Type>),
}

impl Type {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn none() -> Type {
        Type::Optional(Box::new(Type::Bottom))
    }

    pub fn optional(ty: Type) -> Type {
        match ty {
            Type::Optional(inner) => Type::Optional(inner),
            Type::Top => Type::Top,
            ty => Type::Optional(Box::new(ty)),
        }
    }

    pub fn primitive(name: &str) -> Type {
        Type::Primitive(intern(name))
    }

    pub fn parametric(name: Atom, parameters: Vec<Parameter>) -> Type {
        Type::Parametric { name, parameters }
    }

    /// Parametric over single-type parameters.
    pub fn parametric_over(name: Atom, arguments: Vec<Type>) -> Type {
        Type::Parametric {
            name,
            parameters: arguments.into_iter().map(Parameter::Single).collect(),
        }
    }

    pub fn integer() -> Type {
        Type::Primitive(well_known().int)
    }

    pub fn string() -> Type {
        Type::Primitive(well_known().str_)
    }

    pub fn boolean() -> Type {
        Type::Primitive(well_known().bool_)
    }

    pub fn float() -> Type {
        Type::Primitive(well_known().float)
    }

    pub fn bytes() -> Type {
        Type::Primitive(well_known().bytes)
    }

    pub fn object() -> Type {
        Type::Primitive(well_known().object)
    }

    pub fn literal_integer(value: i64) -> Type {
        Type::Literal(Literal::Integer(value))
    }

    pub fn literal_string(value: &str) -> Type {
        Type::Literal(Literal::String(intern(value)))
    }

    pub fn literal_boolean(value: bool) -> Type {
        Type::Literal(Literal::Boolean(value))
    }

    pub fn list(element: Type) -> Type {
        Type::parametric_over(well_known().list, vec![element])
    }

    pub fn set(element: Type) -> Type {
        Type::parametric_over(well_known().set, vec![element])
    }

    pub fn dictionary(key: Type, value: Type) -> Type {
        Type::parametric_over(well_known().dict, vec![key, value])
    }

    pub fn iterator(element: Type) -> Type {
        Type::parametric_over(well_known().iterator, vec![element])
    }

    pub fn sequence(element: Type) -> Type {
        Type::parametric_over(well_known().sequence, vec![element])
    }

    pub fn awaitable(element: Type) -> Type {
        Type::parametric_over(well_known().awaitable, vec![element])
    }

    /// `type[T]`, the metaclass side of a class.
    pub fn meta(instance: Type) -> Type {
        Type::parametric_over(well_known().r#type, vec![instance])
    }

    pub fn callable(parameters: CallableParameters, annotation: Type) -> Type {
        Type::Callable(Box::new(Callable::anonymous(crate::callable::Overload {
            annotation,
            parameters,
        })))
    }

    pub fn tuple(elements: Vec<Type>) -> Type {
        Type::Tuple(Tuple::bounded(elements))
    }

    pub fn unbounded_tuple(element: Type) -> Type {
        Type::Tuple(Tuple::unbounded(element))
    }

    /// Synthetic marker for names that resolve nowhere. Absorbs into unions
    /// on either side of the order.
    pub fn undeclared() -> Type {
        Type::Primitive(well_known().undeclared)
    }

    /// Canonical union construction. Flattens nested unions and optionals,
    /// drops `Bottom`, collapses on `Top`, sorts, and deduplicates; a union
    /// that saw an optional (or `None`) member reappears as `Optional`.
    pub fn union(types: Vec<Type>) -> Type {
        let mut members: Vec<Type> = Vec::with_capacity(types.len());
        let mut saw_optional = false;

        fn flatten(ty: Type, members: &mut Vec<Type>, saw_optional: &mut bool) -> bool {
            match ty {
                Type::Top => return true,
                Type::Bottom => {}
                Type::Union(inner) => {
                    for ty in inner {
                        if flatten(ty, members, saw_optional) {
                            return true;
                        }
                    }
                }
                Type::Optional(inner) => {
                    *saw_optional = true;
                    if flatten(*inner, members, saw_optional) {
                        return true;
                    }
                }
                ty => members.push(ty),
            }
            false
        }

        for ty in types {
            if flatten(ty, &mut members, &mut saw_optional) {
                return Type::Top;
            }
        }

        members.sort();
        members.dedup();

        let inner = match members.len() {
            0 => Type::Bottom,
            1 => members.pop().unwrap_or(Type::Bottom),
            _ => Type::Union(members),
        };
        if saw_optional {
            Type::optional(inner)
        } else {
            inner
        }
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Type::Tuple(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Type::Callable(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Type::Optional(inner) if **inner == Type::Bottom)
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Optional(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Top)
    }

    pub fn is_undeclared(&self) -> bool {
        matches!(self, Type::Primitive(name) if *name == well_known().undeclared)
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Type::Parametric { name, .. } if *name == well_known().r#type)
    }

    pub fn contains_variable(&self) -> bool {
        !crate::visitor::collect_variables(self).is_empty()
    }

    pub fn contains_any(&self) -> bool {
        crate::visitor::exists(self, &mut |ty| matches!(ty, Type::Any))
    }

    pub fn contains_undeclared(&self) -> bool {
        crate::visitor::exists(self, &mut |ty| ty.is_undeclared())
    }

    pub fn contains_escaped_free_variable(&self) -> bool {
        crate::visitor::collect_free_variables(self)
            .iter()
            .any(|variable| variable.is_escaped())
    }

    /// No variables, no lattice elements, no escaped-free occurrences.
    /// `is_concrete(t)` implies `!contains_variable(t) && !contains_any(t)`.
    pub fn is_concrete(&self) -> bool {
        crate::visitor::is_concrete(self)
    }

    /// Strip `Annotated` wrappers; the order ignores them.
    pub fn strip_annotated(&self) -> &Type {
        match self {
            Type::Annotated(inner) => inner.strip_annotated(),
            ty => ty,
        }
    }

    /// The nominal class name backing this type, if any.
    pub fn primitive_name(&self) -> Option<Atom> {
        match self.strip_annotated() {
            Type::Primitive(name) => Some(*name),
            Type::Parametric { name, .. } => Some(*name),
            Type::Literal(literal) => Some(literal.class_name()),
            Type::Tuple(_) => Some(well_known().tuple),
            Type::TypedDictionary(dictionary) => Some(dictionary.class_name()),
            _ => None,
        }
    }

    /// Single-type arguments of a parametric, when every position is single.
    pub fn single_parameters(&self) -> Option<Vec<&Type>> {
        match self {
            Type::Parametric { parameters, .. } => parameters
                .iter()
                .map(Parameter::as_single)
                .collect::<Option<Vec<_>>>(),
            _ => None,
        }
    }

    // =========================================================================
    // Rewrites
    // =========================================================================

    /// Replace every subterm `s` with `f(s)` where `f` answers `Some`. With
    /// `widen`, a substitution result of `Bottom` maps to `Top` (used when a
    /// lower bound should generalize rather than pin).
    pub fn instantiate(&self, widen: bool, f: &mut impl FnMut(&Type) -> Option<Type>) -> Type {
        crate::visitor::instantiate(self, widen, f)
    }

    /// Literal types widen to their nominal class; containers recurse.
    pub fn weaken_literals(&self) -> Type {
        crate::visitor::map_bottom_up(self, &mut |ty| match ty {
            Type::Literal(literal) => Some(Type::Primitive(literal.class_name())),
            _ => None,
        })
    }

    /// Rewrite qualified primitive names through `lookup` (import-aware
    /// unqualification for rendering).
    pub fn dequalify(&self, lookup: &impl Fn(Atom) -> Option<Atom>) -> Type {
        crate::visitor::map_bottom_up(self, &mut |ty| match ty {
            Type::Primitive(name) => lookup(*name).map(Type::Primitive),
            Type::Parametric { name, parameters } => lookup(*name).map(|name| Type::Parametric {
                name,
                parameters: parameters.clone(),
            }),
            _ => None,
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bottom => f.write_str("undefined"),
            Type::Top => f.write_str("unknown"),
            Type::Any => f.write_str("typing.Any"),
            Type::Primitive(name) => f.write_str(&resolve(*name)),
            Type::Parametric { name, parameters } => {
                write!(f, "{}[", resolve(*name))?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match parameter {
                        Parameter::Single(ty) => write!(f, "{}", ty)?,
                        Parameter::Group(ordered) => write!(f, "[{}]", ordered)?,
                        Parameter::CallableParameters(parameters) => {
                            write!(f, "{}", parameters)?
                        }
                    }
                }
                f.write_str("]")
            }
            ty if ty.is_none() => f.write_str("None"),
            Type::Optional(inner) => write!(f, "typing.Optional[{}]", inner),
            Type::Union(members) => {
                f.write_str("typing.Union[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str("]")
            }
            Type::Tuple(tuple) => write!(f, "{}", tuple),
            Type::TypedDictionary(dictionary) => {
                write!(f, "TypedDict `{}`", resolve(dictionary.name))
            }
            Type::Callable(callable) => write!(f, "{}", callable),
            Type::Literal(Literal::Boolean(value)) => write!(
                f,
                "typing_extensions.Literal[{}]",
                if *value { "True" } else { "False" }
            ),
            Type::Literal(Literal::Integer(value)) => {
                write!(f, "typing_extensions.Literal[{}]", value)
            }
            Type::Literal(Literal::String(value)) => {
                write!(f, "typing_extensions.Literal['{}']", resolve(*value))
            }
            Type::Variable(variable) => write!(f, "Variable[{}]", variable),
            Type::ParameterVariadicComponent(component) => write!(
                f,
                "{}.{}",
                component.variable,
                match component.component {
                    VariadicComponent::PositionalArguments => "args",
                    VariadicComponent::KeywordArguments => "kwargs",
                }
            ),
            Type::Annotated(inner) => write!(f, "typing.Annotated[{}]", inner),
        }
    }
}

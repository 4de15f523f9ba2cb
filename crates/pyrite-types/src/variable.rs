//! Type variables.
//!
//! Three kinds of variables flow through the solver:
//! - unary (`T`) - stands for one concrete type
//! - parameter-variadic (`P`) - stands for an entire callable parameter list
//! - list-variadic (`Ts`) - stands for an ordered sequence of types
//!
//! Every free variable carries a `namespace`. A fresh namespace is minted per
//! instantiation event (overload match, protocol sanitization), so variables
//! cloned from the same declaration never collide across events. Namespace 0
//! is the canonical namespace used for namespace-insensitive comparison.

use crate::types::Type;
use pyrite_common::Atom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

pub type Namespace = u32;

/// Canonical namespace every variable is converged to for
/// namespace-insensitive equality.
pub const CANONICAL_NAMESPACE: Namespace = 0;

static NAMESPACE_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Mint a namespace no live variable uses. Process-wide.
pub fn fresh_namespace() -> Namespace {
    NAMESPACE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Rewind the counter so tests get deterministic namespaces.
pub fn reset_namespaces_for_tests() {
    NAMESPACE_COUNTER.store(1, Ordering::Relaxed)
}

/// Rewrite every variable in `ty` into the canonical namespace.
pub fn converge_all_namespaces(ty: &Type) -> Type {
    crate::visitor::map_variables(ty, &mut |mut variable| {
        variable.set_namespace(CANONICAL_NAMESPACE);
        variable
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

/// Declared restriction on what a unary variable may be bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Constraints {
    Unconstrained,
    /// `TypeVar("T", bound=X)`
    Bound(Box<Type>),
    /// `TypeVar("T", X, Y)`
    Explicit(Vec<Type>),
    /// Integer-literal-only variable, used by tuple indexing.
    LiteralIntegers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableState {
    /// Not bound by any enclosing scope. `escaped` marks a variable that
    /// leaked out of its scope through unsuccessful constraint solving;
    /// consumers coerce escaped variables to `Any` as a last step.
    Free { escaped: bool },
    /// Currently a bound parameter of an enclosing function; preserved, never
    /// generalized.
    InFunction,
}

impl VariableState {
    pub fn is_free(self) -> bool {
        matches!(self, VariableState::Free { .. })
    }

    pub fn is_escaped(self) -> bool {
        matches!(self, VariableState::Free { escaped: true })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnaryVariable {
    pub name: Atom,
    pub constraints: Constraints,
    pub variance: Variance,
    pub state: VariableState,
    pub namespace: Namespace,
}

impl UnaryVariable {
    pub fn new(name: Atom) -> Self {
        Self {
            name,
            constraints: Constraints::Unconstrained,
            variance: Variance::Invariant,
            state: VariableState::Free { escaped: false },
            namespace: CANONICAL_NAMESPACE,
        }
    }

    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }

    pub fn is_escaped(&self) -> bool {
        self.state.is_escaped()
    }

    /// The fallback type an unsolved occurrence dissolves into.
    pub fn any_fallback(&self) -> Type {
        match &self.constraints {
            Constraints::Bound(bound) => (**bound).clone(),
            _ => Type::Any,
        }
    }
}

impl fmt::Display for UnaryVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterVariadic {
    pub name: Atom,
    pub state: VariableState,
    pub namespace: Namespace,
}

impl ParameterVariadic {
    pub fn new(name: Atom) -> Self {
        Self {
            name,
            state: VariableState::Free { escaped: false },
            namespace: CANONICAL_NAMESPACE,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }
}

impl fmt::Display for ParameterVariadic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListVariadic {
    pub name: Atom,
    pub state: VariableState,
    pub namespace: Namespace,
}

impl ListVariadic {
    pub fn new(name: Atom) -> Self {
        Self {
            name,
            state: VariableState::Free { escaped: false },
            namespace: CANONICAL_NAMESPACE,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }
}

impl fmt::Display for ListVariadic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Any of the three variable kinds. The constraint store and the generic
/// zip both need to treat them uniformly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    Unary(UnaryVariable),
    ParameterVariadic(ParameterVariadic),
    ListVariadic(ListVariadic),
}

impl Variable {
    pub fn name(&self) -> Atom {
        match self {
            Variable::Unary(v) => v.name,
            Variable::ParameterVariadic(v) => v.name,
            Variable::ListVariadic(v) => v.name,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            Variable::Unary(v) => v.namespace,
            Variable::ParameterVariadic(v) => v.namespace,
            Variable::ListVariadic(v) => v.namespace,
        }
    }

    pub fn set_namespace(&mut self, namespace: Namespace) {
        match self {
            Variable::Unary(v) => v.namespace = namespace,
            Variable::ParameterVariadic(v) => v.namespace = namespace,
            Variable::ListVariadic(v) => v.namespace = namespace,
        }
    }

    pub fn state(&self) -> VariableState {
        match self {
            Variable::Unary(v) => v.state,
            Variable::ParameterVariadic(v) => v.state,
            Variable::ListVariadic(v) => v.state,
        }
    }

    pub fn set_state(&mut self, state: VariableState) {
        match self {
            Variable::Unary(v) => v.state = state,
            Variable::ParameterVariadic(v) => v.state = state,
            Variable::ListVariadic(v) => v.state = state,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state().is_free()
    }

    pub fn is_escaped(&self) -> bool {
        self.state().is_escaped()
    }
}

/// Move every free variable in `ty` into `namespace`.
pub fn namespace_all_free_variables(ty: &Type, namespace: Namespace) -> Type {
    crate::visitor::map_variables(ty, &mut |mut variable| {
        if variable.is_free() {
            variable.set_namespace(namespace);
        }
        variable
    })
}

/// Namespace-insensitive structural comparison.
pub fn namespace_insensitive_compare(left: &Type, right: &Type) -> std::cmp::Ordering {
    converge_all_namespaces(left).cmp(&converge_all_namespaces(right))
}

/// Pin every variable as a bound function parameter; bound variables are
/// preserved by solving, never generalized.
pub fn mark_all_variables_as_bound(ty: &Type) -> Type {
    crate::visitor::map_variables(ty, &mut |mut variable| {
        variable.set_state(VariableState::InFunction);
        variable
    })
}

/// Release bound variables back to free; the inverse of
/// `mark_all_variables_as_bound`, applied when a callable is cloned for a
/// fresh instantiation event.
pub fn mark_all_variables_as_free(ty: &Type) -> Type {
    crate::visitor::map_variables(ty, &mut |mut variable| {
        variable.set_state(VariableState::Free { escaped: false });
        variable
    })
}

/// Mark the free variables that survived solving as escaped, in one fresh
/// namespace. Downstream consumers coerce escaped variables to `Any`.
pub fn mark_all_free_variables_as_escaped(ty: &Type) -> Type {
    let namespace = fresh_namespace();
    crate::visitor::map_variables(ty, &mut |mut variable| {
        if variable.is_free() {
            variable.set_state(VariableState::Free { escaped: true });
            variable.set_namespace(namespace);
        }
        variable
    })
}

/// The last-resort fallback: every escaped occurrence dissolves into `Any`
/// (or the variable's declared bound where one exists).
pub fn convert_all_escaped_free_variables_to_anys(ty: &Type) -> Type {
    use crate::callable::{CallableParameters, StarParameter};
    use crate::ordered_types::{OrderedTypes, Tuple};
    use crate::types::Parameter;

    crate::visitor::map_bottom_up(ty, &mut |subterm| match subterm {
        Type::Variable(variable) if variable.is_escaped() => Some(variable.any_fallback()),
        Type::ParameterVariadicComponent(component) if component.variable.state.is_escaped() => {
            Some(Type::Any)
        }
        Type::Tuple(Tuple::Bounded(OrderedTypes::Concatenation(concatenation)))
            if concatenation.middle.state.is_escaped() =>
        {
            Some(Type::unbounded_tuple(Type::Any))
        }
        Type::Parametric { name, parameters } => {
            let mut changed = false;
            let parameters = parameters
                .iter()
                .map(|parameter| match parameter {
                    Parameter::Group(OrderedTypes::Concatenation(concatenation))
                        if concatenation.middle.state.is_escaped() =>
                    {
                        changed = true;
                        Parameter::Group(OrderedTypes::Concrete(vec![Type::Any]))
                    }
                    Parameter::CallableParameters(
                        CallableParameters::ParameterVariadicTypeVariable { variable, .. },
                    ) if variable.state.is_escaped() => {
                        changed = true;
                        Parameter::CallableParameters(CallableParameters::Undefined)
                    }
                    parameter => parameter.clone(),
                })
                .collect();
            changed.then(|| Type::Parametric {
                name: *name,
                parameters,
            })
        }
        Type::Callable(callable) => {
            let mut changed = false;
            let rewritten = callable.map_implementation_and_overloads(|overload| {
                let parameters = match &overload.parameters {
                    CallableParameters::ParameterVariadicTypeVariable { variable, .. }
                        if variable.state.is_escaped() =>
                    {
                        changed = true;
                        CallableParameters::Undefined
                    }
                    CallableParameters::Defined(defined)
                        if defined.iter().any(|parameter| {
                            matches!(
                                parameter,
                                crate::callable::CallableParameter::Variable(
                                    StarParameter::Concatenation(concatenation)
                                ) if concatenation.middle.state.is_escaped()
                            )
                        }) =>
                    {
                        changed = true;
                        CallableParameters::Defined(
                            defined
                                .iter()
                                .map(|parameter| match parameter {
                                    crate::callable::CallableParameter::Variable(
                                        StarParameter::Concatenation(concatenation),
                                    ) if concatenation.middle.state.is_escaped() => {
                                        crate::callable::CallableParameter::Variable(
                                            StarParameter::Concrete(Type::Any),
                                        )
                                    }
                                    parameter => parameter.clone(),
                                })
                                .collect(),
                        )
                    }
                    parameters => parameters.clone(),
                };
                crate::callable::Overload {
                    annotation: overload.annotation.clone(),
                    parameters,
                }
            });
            changed.then(|| Type::Callable(Box::new(rewritten)))
        }
        _ => None,
    })
}

/// Remove escaped variables from unions; they pollute otherwise. The policy
/// lives here alone so alternatives can be trialled.
pub fn collapse_all_escaped_variable_unions(ty: &Type) -> Type {
    crate::visitor::map_bottom_up(ty, &mut |subterm| match subterm {
        Type::Union(members) => {
            let kept: Vec<Type> = members
                .iter()
                .filter(|member| {
                    !matches!(member, Type::Variable(variable) if variable.is_escaped())
                })
                .cloned()
                .collect();
            (kept.len() != members.len()).then(|| Type::union(kept))
        }
        _ => None,
    })
}

impl From<UnaryVariable> for Variable {
    fn from(v: UnaryVariable) -> Self {
        Variable::Unary(v)
    }
}

impl From<ParameterVariadic> for Variable {
    fn from(v: ParameterVariadic) -> Self {
        Variable::ParameterVariadic(v)
    }
}

impl From<ListVariadic> for Variable {
    fn from(v: ListVariadic) -> Self {
        Variable::ListVariadic(v)
    }
}

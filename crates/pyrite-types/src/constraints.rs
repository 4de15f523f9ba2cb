//! Constraint sets and solutions.
//!
//! A `ConstraintSet` tracks, per in-scope free variable, independent lower
//! and upper bounds. Bound merging needs the lattice operations, which live
//! above this crate; they are threaded in through the narrow `BoundOrder`
//! trait, implemented by the order engine. All operations are persistent:
//! adding a bound returns a new set, `None` when unsatisfiable.

use crate::callable::CallableParameters;
use crate::ordered_types::OrderedTypes;
use crate::types::{Parameter, Type};
use crate::variable::{Constraints, ListVariadic, ParameterVariadic, UnaryVariable, Variable};
use indexmap::{IndexMap, IndexSet};
use pyrite_common::Atom;

/// The slice of the order engine bound merging needs.
pub trait BoundOrder {
    fn join(&mut self, left: &Type, right: &Type) -> Type;
    fn meet(&mut self, left: &Type, right: &Type) -> Type;
    fn always_less_or_equal(&mut self, left: &Type, right: &Type) -> bool;
}

/// A bound for any of the three variable kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    Single(Type),
    Ordered(OrderedTypes),
    Parameters(CallableParameters),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Interval<T> {
    lower: Option<T>,
    upper: Option<T>,
}

impl<T> Interval<T> {
    fn empty() -> Self {
        Interval {
            lower: None,
            upper: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    unaries: IndexMap<UnaryVariable, Interval<Type>>,
    parameter_variadics: IndexMap<ParameterVariadic, Interval<CallableParameters>>,
    list_variadics: IndexMap<ListVariadic, Interval<OrderedTypes>>,
    fallback_to_any: IndexSet<UnaryVariable>,
}

impl ConstraintSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.unaries.is_empty()
            && self.parameter_variadics.is_empty()
            && self.list_variadics.is_empty()
    }

    pub fn tracked_unaries(&self) -> impl Iterator<Item = &UnaryVariable> {
        self.unaries.keys()
    }

    /// Mark variables so an unresolved solution maps them to `Any` instead of
    /// failing. Marked variables become tracked even when no bound ever
    /// lands on them.
    pub fn add_fallback_to_any(&self, variables: impl IntoIterator<Item = UnaryVariable>) -> Self {
        let mut next = self.clone();
        for variable in variables {
            next.unaries
                .entry(variable.clone())
                .or_insert_with(Interval::empty);
            next.fallback_to_any.insert(variable);
        }
        next
    }

    pub fn add_lower_bound(
        &self,
        variable: &Variable,
        bound: &Bound,
        order: &mut dyn BoundOrder,
    ) -> Option<ConstraintSet> {
        self.add_bound(variable, bound, order, true)
    }

    pub fn add_upper_bound(
        &self,
        variable: &Variable,
        bound: &Bound,
        order: &mut dyn BoundOrder,
    ) -> Option<ConstraintSet> {
        self.add_bound(variable, bound, order, false)
    }

    fn add_bound(
        &self,
        variable: &Variable,
        bound: &Bound,
        order: &mut dyn BoundOrder,
        is_lower: bool,
    ) -> Option<ConstraintSet> {
        match (variable, bound) {
            (Variable::Unary(variable), Bound::Single(bound)) => {
                self.add_unary_bound(variable, bound, order, is_lower)
            }
            (Variable::ListVariadic(variable), Bound::Ordered(bound)) => {
                self.add_list_variadic_bound(variable, bound, is_lower)
            }
            (Variable::ParameterVariadic(variable), Bound::Parameters(bound)) => {
                self.add_parameter_variadic_bound(variable, bound, is_lower)
            }
            // Kind mismatch is a caller bug upstream; treat as unsatisfiable.
            _ => None,
        }
    }

    fn add_unary_bound(
        &self,
        variable: &UnaryVariable,
        bound: &Type,
        order: &mut dyn BoundOrder,
        is_lower: bool,
    ) -> Option<ConstraintSet> {
        // A bound mentioning the variable itself cannot pin it.
        if crate::visitor::collect_variables(bound)
            .iter()
            .any(|inner| matches!(inner, Variable::Unary(inner) if inner == variable))
        {
            return if matches!(bound, Type::Variable(inner) if inner == variable) {
                // `v <= v` is vacuous.
                Some(self.clone())
            } else {
                None
            };
        }

        let mut next = self.clone();
        let interval = next
            .unaries
            .entry(variable.clone())
            .or_insert_with(Interval::empty);
        if is_lower {
            interval.lower = Some(match &interval.lower {
                Some(existing) => order.join(existing, bound),
                None => bound.clone(),
            });
        } else {
            interval.upper = Some(match &interval.upper {
                Some(existing) => order.meet(existing, bound),
                None => bound.clone(),
            });
        }

        let interval = next.unaries.get(variable).cloned().unwrap_or_else(Interval::empty);
        if let (Some(lower), Some(upper)) = (&interval.lower, &interval.upper) {
            if !order.always_less_or_equal(lower, upper) {
                return None;
            }
        }
        if !Self::respects_declared_constraints(variable, &interval, order) {
            return None;
        }
        Some(next)
    }

    fn respects_declared_constraints(
        variable: &UnaryVariable,
        interval: &Interval<Type>,
        order: &mut dyn BoundOrder,
    ) -> bool {
        match &variable.constraints {
            Constraints::Unconstrained => true,
            Constraints::Bound(declared) => interval
                .lower
                .as_ref()
                .map(|lower| order.always_less_or_equal(lower, declared))
                .unwrap_or(true),
            Constraints::Explicit(choices) => {
                let candidate = interval.lower.as_ref().or(interval.upper.as_ref());
                match candidate {
                    Some(candidate) => choices
                        .iter()
                        .any(|choice| order.always_less_or_equal(candidate, choice)),
                    None => true,
                }
            }
            Constraints::LiteralIntegers => {
                let is_integerish = |ty: &Type| {
                    matches!(ty, Type::Literal(crate::types::Literal::Integer(_)))
                        || *ty == Type::integer()
                        || matches!(ty, Type::Bottom)
                };
                interval.lower.as_ref().map(&is_integerish).unwrap_or(true)
                    && interval.upper.as_ref().map(&is_integerish).unwrap_or(true)
            }
        }
    }

    fn add_list_variadic_bound(
        &self,
        variable: &ListVariadic,
        bound: &OrderedTypes,
        is_lower: bool,
    ) -> Option<ConstraintSet> {
        let mut next = self.clone();
        let interval = next
            .list_variadics
            .entry(variable.clone())
            .or_insert_with(Interval::empty);
        let slot = if is_lower {
            &mut interval.lower
        } else {
            &mut interval.upper
        };
        match slot {
            // Ordered bounds merge only when identical; there is no useful
            // elementwise lattice for sequences of unknown provenance.
            Some(existing) if existing != bound => return None,
            _ => *slot = Some(bound.clone()),
        }
        Some(next)
    }

    fn add_parameter_variadic_bound(
        &self,
        variable: &ParameterVariadic,
        bound: &CallableParameters,
        is_lower: bool,
    ) -> Option<ConstraintSet> {
        let mut next = self.clone();
        let interval = next
            .parameter_variadics
            .entry(variable.clone())
            .or_insert_with(Interval::empty);
        let slot = if is_lower {
            &mut interval.lower
        } else {
            &mut interval.upper
        };
        match slot {
            Some(existing) if existing != bound => return None,
            _ => *slot = Some(bound.clone()),
        }
        Some(next)
    }

    /// Solve the subset `variables`, leaving the rest tracked. Returns the
    /// remaining constraints (with solved values substituted through their
    /// bounds) and the substitution over the subset.
    pub fn extract_partial_solution(
        &self,
        variables: &[Variable],
        order: &mut dyn BoundOrder,
    ) -> Option<(ConstraintSet, Solution)> {
        let in_subset = |variable: &Variable| variables.contains(variable);
        let mut solution = Solution::empty();
        let mut remaining = ConstraintSet::empty();
        remaining.fallback_to_any = self.fallback_to_any.clone();

        for (variable, interval) in &self.unaries {
            if in_subset(&Variable::Unary(variable.clone())) {
                let value = self.choose_unary_value(variable, interval, order)?;
                solution.unaries.insert(variable.clone(), value);
            } else {
                remaining.unaries.insert(variable.clone(), interval.clone());
            }
        }
        for (variable, interval) in &self.list_variadics {
            if in_subset(&Variable::ListVariadic(variable.clone())) {
                let value = interval.lower.clone().or_else(|| interval.upper.clone())?;
                solution.list_variadics.insert(variable.clone(), value);
            } else {
                remaining
                    .list_variadics
                    .insert(variable.clone(), interval.clone());
            }
        }
        for (variable, interval) in &self.parameter_variadics {
            if in_subset(&Variable::ParameterVariadic(variable.clone())) {
                let value = interval.lower.clone().or_else(|| interval.upper.clone())?;
                solution.parameter_variadics.insert(variable.clone(), value);
            } else {
                remaining
                    .parameter_variadics
                    .insert(variable.clone(), interval.clone());
            }
        }

        // Substitute the solved values through the surviving bounds.
        for interval in remaining.unaries.values_mut() {
            interval.lower = interval.lower.as_ref().map(|ty| solution.instantiate(ty));
            interval.upper = interval.upper.as_ref().map(|ty| solution.instantiate(ty));
        }
        Some((remaining, solution))
    }

    /// Produce one substitution over every tracked variable.
    pub fn solve(&self, order: &mut dyn BoundOrder) -> Option<Solution> {
        let all: Vec<Variable> = self
            .unaries
            .keys()
            .cloned()
            .map(Variable::Unary)
            .chain(
                self.list_variadics
                    .keys()
                    .cloned()
                    .map(Variable::ListVariadic),
            )
            .chain(
                self.parameter_variadics
                    .keys()
                    .cloned()
                    .map(Variable::ParameterVariadic),
            )
            .collect();
        let (_, solution) = self.extract_partial_solution(&all, order)?;
        Some(solution)
    }

    fn choose_unary_value(
        &self,
        variable: &UnaryVariable,
        interval: &Interval<Type>,
        order: &mut dyn BoundOrder,
    ) -> Option<Type> {
        let candidate = interval
            .lower
            .clone()
            .or_else(|| interval.upper.clone())
            .or_else(|| {
                self.fallback_to_any
                    .contains(variable)
                    .then(|| Type::Any)
            })?;
        match &variable.constraints {
            Constraints::Explicit(choices) => choices
                .iter()
                .find(|choice| order.always_less_or_equal(&candidate, choice))
                .cloned(),
            Constraints::Bound(declared) => {
                order.always_less_or_equal(&candidate, declared).then_some(candidate)
            }
            _ => Some(candidate),
        }
    }
}

// =============================================================================
// Solutions
// =============================================================================

/// A partial substitution from variables to their domain elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    pub unaries: IndexMap<UnaryVariable, Type>,
    pub parameter_variadics: IndexMap<ParameterVariadic, CallableParameters>,
    pub list_variadics: IndexMap<ListVariadic, OrderedTypes>,
}

impl Solution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.unaries.is_empty()
            && self.parameter_variadics.is_empty()
            && self.list_variadics.is_empty()
    }

    pub fn bind_unary(mut self, variable: UnaryVariable, ty: Type) -> Self {
        self.unaries.insert(variable, ty);
        self
    }

    pub fn bind_list_variadic(mut self, variable: ListVariadic, ordered: OrderedTypes) -> Self {
        self.list_variadics.insert(variable, ordered);
        self
    }

    pub fn bind_parameter_variadic(
        mut self,
        variable: ParameterVariadic,
        parameters: CallableParameters,
    ) -> Self {
        self.parameter_variadics.insert(variable, parameters);
        self
    }

    /// Compose: bindings in `other` shadow ours.
    pub fn extend(mut self, other: Solution) -> Solution {
        self.unaries.extend(other.unaries);
        self.parameter_variadics.extend(other.parameter_variadics);
        self.list_variadics.extend(other.list_variadics);
        self
    }

    /// Rewrite `ty` by the substitution, preserving structure elsewhere.
    pub fn instantiate(&self, ty: &Type) -> Type {
        crate::visitor::map_bottom_up(ty, &mut |subterm| match subterm {
            Type::Variable(variable) => self.unaries.get(variable).cloned(),
            Type::Tuple(crate::ordered_types::Tuple::Bounded(ordered)) => self
                .instantiate_ordered(ordered)
                .map(|ordered| Type::Tuple(crate::ordered_types::Tuple::Bounded(ordered))),
            Type::Parametric { name, parameters } => {
                self.instantiate_parametric(*name, parameters)
            }
            Type::ParameterVariadicComponent(component) => {
                self.parameter_variadics.get(&component.variable).map(|_| Type::Any)
            }
            Type::Callable(callable) => {
                let rewritten = callable.map_implementation_and_overloads(|overload| {
                    crate::callable::Overload {
                        annotation: overload.annotation.clone(),
                        parameters: self.instantiate_callable_parameters(&overload.parameters),
                    }
                });
                (rewritten != **callable).then(|| Type::Callable(Box::new(rewritten)))
            }
            _ => None,
        })
    }

    /// Splice group and callable-parameter positions of a parametric;
    /// single positions were already rewritten bottom-up.
    fn instantiate_parametric(&self, name: Atom, parameters: &[Parameter]) -> Option<Type> {
        let mut changed = false;
        let parameters = parameters
            .iter()
            .map(|parameter| match parameter {
                Parameter::Group(ordered) => match self.instantiate_ordered(ordered) {
                    Some(ordered) => {
                        changed = true;
                        Parameter::Group(ordered)
                    }
                    None => parameter.clone(),
                },
                Parameter::CallableParameters(inner) => {
                    let rewritten = self.instantiate_callable_parameters(inner);
                    if rewritten != *inner {
                        changed = true;
                        Parameter::CallableParameters(rewritten)
                    } else {
                        parameter.clone()
                    }
                }
                Parameter::Single(_) => parameter.clone(),
            })
            .collect();
        changed.then(|| Type::Parametric { name, parameters })
    }

    /// Rewrite an ordered sequence completely: elements through the unary
    /// substitution, middles spliced where solved.
    pub fn instantiate_all_ordered(&self, ordered: &OrderedTypes) -> OrderedTypes {
        match ordered {
            OrderedTypes::Concrete(types) => {
                OrderedTypes::Concrete(types.iter().map(|ty| self.instantiate(ty)).collect())
            }
            OrderedTypes::Concatenation(concatenation) => {
                let rewritten = crate::ordered_types::Concatenation {
                    head: concatenation
                        .head
                        .iter()
                        .map(|ty| self.instantiate(ty))
                        .collect(),
                    middle: concatenation.middle.clone(),
                    mappers: concatenation.mappers.clone(),
                    tail: concatenation
                        .tail
                        .iter()
                        .map(|ty| self.instantiate(ty))
                        .collect(),
                };
                let rewritten = OrderedTypes::Concatenation(rewritten);
                self.instantiate_ordered(&rewritten).unwrap_or(rewritten)
            }
        }
    }

    /// Splice list-variadic solutions into an ordered sequence.
    pub fn instantiate_ordered(&self, ordered: &OrderedTypes) -> Option<OrderedTypes> {
        match ordered {
            OrderedTypes::Concrete(_) => None,
            OrderedTypes::Concatenation(concatenation) => {
                let solved = self.list_variadics.get(&concatenation.middle)?;
                match solved {
                    OrderedTypes::Concrete(middle) => {
                        let mut types = concatenation.head.clone();
                        types.extend(
                            middle
                                .iter()
                                .map(|ty| concatenation.apply_mappers(ty.clone())),
                        );
                        types.extend(concatenation.tail.clone());
                        Some(OrderedTypes::Concrete(types))
                    }
                    OrderedTypes::Concatenation(inner)
                        if concatenation.head.is_empty() && concatenation.tail.is_empty() =>
                    {
                        let mut merged = inner.clone();
                        merged
                            .mappers
                            .extend(concatenation.mappers.iter().copied());
                        Some(OrderedTypes::Concatenation(merged))
                    }
                    _ => None,
                }
            }
        }
    }

    pub fn instantiate_callable_parameters(
        &self,
        parameters: &CallableParameters,
    ) -> CallableParameters {
        match parameters {
            CallableParameters::ParameterVariadicTypeVariable { head, variable } => {
                match self.parameter_variadics.get(variable) {
                    Some(CallableParameters::Defined(solved)) => {
                        let mut prepended: Vec<crate::callable::CallableParameter> = head
                            .iter()
                            .cloned()
                            .enumerate()
                            .map(|(index, annotation)| {
                                crate::callable::CallableParameter::PositionalOnly {
                                    index,
                                    annotation,
                                    default: false,
                                }
                            })
                            .collect();
                        prepended.extend(solved.iter().cloned());
                        CallableParameters::Defined(prepended)
                    }
                    Some(solved) if head.is_empty() => solved.clone(),
                    _ => parameters.clone(),
                }
            }
            parameters => parameters.clone(),
        }
    }
}

// =============================================================================
// Protocol assumptions
// =============================================================================

/// Query-scoped memo of in-progress `(candidate, protocol)` conformance
/// goals with their tentative parameter assignments. Revisiting a goal that
/// is already here returns the tentative answer, cutting the cycle.
#[derive(Clone, Debug, Default)]
pub struct ProtocolAssumptions {
    in_progress: Vec<((Type, Atom), Vec<Parameter>)>,
}

impl ProtocolAssumptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, candidate: &Type, protocol: Atom) -> Option<&Vec<Parameter>> {
        self.in_progress
            .iter()
            .rev()
            .find(|((c, p), _)| c == candidate && *p == protocol)
            .map(|(_, parameters)| parameters)
    }

    pub fn push(&mut self, candidate: Type, protocol: Atom, parameters: Vec<Parameter>) {
        self.in_progress.push(((candidate, protocol), parameters));
    }

    pub fn pop(&mut self) {
        self.in_progress.pop();
    }
}

/// Assumption state threaded through every recursive order query. Scoped to
/// one top-level query; never outlives it.
#[derive(Clone, Debug, Default)]
pub struct Assumptions {
    pub protocols: ProtocolAssumptions,
    /// In-progress callable-vs-protocol goals, cut the same way.
    pub callables: Vec<(Type, Atom)>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }
}

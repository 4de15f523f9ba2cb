//! The subtype order.
//!
//! `solve_less_or_equal` is the heart of the engine: given a precondition
//! constraint set it produces zero or more sufficient successor sets; the
//! empty list means no satisfying assignment exists. `join`/`meet` are the
//! lattice operations over the same order, and `widen` caps fixpoint
//! iteration.
//!
//! Queries may re-enter attribute resolution (and vice versa); the
//! `Assumptions` bag carried by the order yields tentative answers for goals
//! already in progress, cutting the cycles.

use crate::class_handler::ClassHandler;
use pyrite_types::constraints::{Assumptions, Bound, BoundOrder, ConstraintSet};
use pyrite_types::{
    well_known, zip_variables_with_parameters, Callable, CallableParameters, Constraints,
    OrderedTypes, Parameter, Tuple, Type, TypedDictionary, Variable, Variance, ZippedParameter,
};
use tracing::trace;

pub struct TypeOrder<'a> {
    pub handler: &'a dyn ClassHandler,
    pub assumptions: Assumptions,
}

impl<'a> TypeOrder<'a> {
    pub fn new(handler: &'a dyn ClassHandler) -> Self {
        Self {
            handler,
            assumptions: Assumptions::new(),
        }
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    pub fn always_less_or_equal(&mut self, left: &Type, right: &Type) -> bool {
        !self
            .solve_less_or_equal(&ConstraintSet::empty(), left, right)
            .is_empty()
    }

    pub fn solve_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        left: &Type,
        right: &Type,
    ) -> Vec<ConstraintSet> {
        // Deeply nested generics recurse hard; grow the stack as needed.
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
            self.solve_less_or_equal_inner(constraints, left, right)
        })
    }

    fn solve_less_or_equal_inner(
        &mut self,
        constraints: &ConstraintSet,
        left: &Type,
        right: &Type,
    ) -> Vec<ConstraintSet> {
        let left = left.strip_annotated();
        let right = right.strip_annotated();

        if left == right {
            return vec![constraints.clone()];
        }
        // The undeclared marker absorbs rather than fails; the resolution
        // error was already recorded where the name failed to resolve.
        if left.is_undeclared() || right.is_undeclared() {
            return vec![constraints.clone()];
        }

        match (left, right) {
            (_, Type::Top) | (_, Type::Any) | (Type::Any, _) | (Type::Bottom, _) => {
                vec![constraints.clone()]
            }
            (Type::Top, _) => Vec::new(),

            // Two free variables: try both orientations to preserve
            // completeness of the search.
            (Type::Variable(l), Type::Variable(r)) if l.is_free() && r.is_free() => {
                let mut results = Vec::new();
                if let Some(next) = constraints.add_upper_bound(
                    &Variable::Unary(l.clone()),
                    &Bound::Single(right.clone()),
                    self,
                ) {
                    results.push(next);
                }
                if let Some(next) = constraints.add_lower_bound(
                    &Variable::Unary(r.clone()),
                    &Bound::Single(left.clone()),
                    self,
                ) {
                    results.push(next);
                }
                results
            }
            (Type::Variable(variable), _) if variable.is_free() => constraints
                .add_upper_bound(
                    &Variable::Unary(variable.clone()),
                    &Bound::Single(right.clone()),
                    self,
                )
                .into_iter()
                .collect(),
            (_, Type::Variable(variable)) if variable.is_free() => constraints
                .add_lower_bound(
                    &Variable::Unary(variable.clone()),
                    &Bound::Single(left.clone()),
                    self,
                )
                .into_iter()
                .collect(),

            // A bound variable stands for anything satisfying its declared
            // restriction; it is below `right` when its restriction is.
            (Type::Variable(variable), _) => match &variable.constraints {
                Constraints::Bound(bound) => {
                    self.solve_less_or_equal(constraints, &bound.clone(), right)
                }
                Constraints::Explicit(choices) => {
                    let choices = choices.clone();
                    self.solve_all_sequential(constraints, &choices, |order, constraints, choice| {
                        order.solve_less_or_equal(constraints, choice, right)
                    })
                }
                Constraints::LiteralIntegers => {
                    self.solve_less_or_equal(constraints, &Type::integer(), right)
                }
                // The implicit bound of an unconstrained variable.
                Constraints::Unconstrained => {
                    self.solve_less_or_equal(constraints, &Type::object(), right)
                }
            },
            (_, Type::Variable(_)) => Vec::new(),

            // Union on the left: every alternative must fit.
            (Type::Union(members), _) => {
                let members = members.clone();
                self.solve_all_sequential(constraints, &members, |order, constraints, member| {
                    order.solve_less_or_equal(constraints, member, right)
                })
            }

            (Type::Optional(l), Type::Optional(r)) => {
                self.solve_less_or_equal(constraints, &l.clone(), &r.clone())
            }
            // An optional only fits under another optional.
            (Type::Optional(_), _) => Vec::new(),

            // Union on the right. When the left side has no unresolved
            // variables a single successful alternative suffices; this trades
            // completeness for performance and is relied upon downstream.
            (_, Type::Union(members)) => {
                let members = members.clone();
                let resolved = pyrite_types::visitor::collect_free_variables(left).is_empty();
                let mut results = Vec::new();
                for member in &members {
                    let solved = self.solve_less_or_equal(constraints, left, member);
                    if !solved.is_empty() {
                        if resolved {
                            return solved;
                        }
                        results.extend(solved);
                    }
                }
                results
            }
            (_, Type::Optional(r)) => self.solve_less_or_equal(constraints, left, &r.clone()),

            (Type::Literal(_), Type::Literal(_)) => Vec::new(),
            (Type::Literal(literal), _) => {
                let weakened = Type::Primitive(literal.class_name());
                self.solve_less_or_equal(constraints, &weakened, right)
            }
            (_, Type::Literal(_)) => Vec::new(),

            (Type::Callable(l), Type::Callable(r)) => {
                let (l, r) = (l.clone(), r.clone());
                self.solve_callable_less_or_equal(constraints, &l, &r)
            }
            // A class with `__call__` fits under a callable.
            (_, Type::Callable(r)) => {
                let call = well_known().call_attribute;
                let callable = self
                    .handler
                    .attributes(left)
                    .and_then(|attributes| {
                        attributes
                            .into_iter()
                            .find(|(name, _)| *name == call)
                            .map(|(_, ty)| ty)
                    });
                match callable {
                    Some(callable) => {
                        let r = r.clone();
                        self.solve_less_or_equal(
                            constraints,
                            &callable,
                            &Type::Callable(r),
                        )
                    }
                    None => Vec::new(),
                }
            }

            (Type::Tuple(l), Type::Tuple(r)) => {
                let (l, r) = (l.clone(), r.clone());
                self.solve_tuple_less_or_equal(constraints, &l, &r)
            }

            (Type::TypedDictionary(l), Type::TypedDictionary(r)) => {
                let (l, r) = (l.clone(), r.clone());
                self.solve_typed_dictionary_less_or_equal(constraints, &l, &r)
            }

            // Everything nominally backed flows through the hierarchy walk,
            // with protocol conformance as the structural fallback.
            _ => match right.primitive_name() {
                Some(target) => self.solve_nominal_less_or_equal(constraints, left, right, target),
                None => Vec::new(),
            },
        }
    }

    /// Thread one constraint set through a conjunction of goals; each goal
    /// may fan out into several successor sets.
    fn solve_all_sequential<T>(
        &mut self,
        constraints: &ConstraintSet,
        goals: &[T],
        mut solve: impl FnMut(&mut Self, &ConstraintSet, &T) -> Vec<ConstraintSet>,
    ) -> Vec<ConstraintSet> {
        let mut current = vec![constraints.clone()];
        for goal in goals {
            let mut next = Vec::new();
            for constraints in &current {
                next.extend(solve(self, constraints, goal));
            }
            if next.is_empty() {
                return Vec::new();
            }
            current = next;
        }
        current
    }

    // =========================================================================
    // Nominal subtyping
    // =========================================================================

    fn solve_nominal_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        left: &Type,
        right: &Type,
        target: pyrite_common::Atom,
    ) -> Vec<ConstraintSet> {
        let nominal = self.solve_nominal_walk(constraints, left, right, target);
        if !nominal.is_empty() {
            return nominal;
        }
        if self.handler.is_protocol(target) {
            if let Some(protocol_parameters) =
                self.instantiate_protocol_parameters(left, target)
            {
                let expected = match right {
                    Type::Parametric { parameters, .. } => parameters.clone(),
                    _ => Vec::new(),
                };
                if expected.is_empty() {
                    return vec![constraints.clone()];
                }
                let conformer = Type::Parametric {
                    name: target,
                    parameters: protocol_parameters,
                };
                return self.solve_nominal_walk(constraints, &conformer, right, target);
            }
        }
        Vec::new()
    }

    fn solve_nominal_walk(
        &mut self,
        constraints: &ConstraintSet,
        left: &Type,
        right: &Type,
        target: pyrite_common::Atom,
    ) -> Vec<ConstraintSet> {
        let source_parameters = match self
            .handler
            .hierarchy()
            .instantiate_successors_parameters(left, target)
        {
            Some(parameters) => parameters,
            None => return Vec::new(),
        };
        let right_parameters = match right {
            Type::Parametric { parameters, .. } => parameters.clone(),
            _ => {
                // Bare target: reaching it nominally is enough.
                return vec![constraints.clone()];
            }
        };
        let variables = self
            .handler
            .hierarchy()
            .variables(target)
            .unwrap_or_default();
        self.solve_parameters_by_variance(
            constraints,
            &variables,
            &source_parameters,
            &right_parameters,
        )
    }

    /// Zip declared variables against both parameter lists and propagate each
    /// position according to its declared variance.
    fn solve_parameters_by_variance(
        &mut self,
        constraints: &ConstraintSet,
        variables: &[Variable],
        source: &[Parameter],
        target: &[Parameter],
    ) -> Vec<ConstraintSet> {
        let (left_zip, right_zip) = match (
            zip_variables_with_parameters(variables, source),
            zip_variables_with_parameters(variables, target),
        ) {
            (Some(left), Some(right)) => (left, right),
            _ => return Vec::new(),
        };
        let pairs: Vec<(ZippedParameter, ZippedParameter)> =
            left_zip.into_iter().zip(right_zip).collect();
        self.solve_all_sequential(constraints, &pairs, |order, constraints, (left, right)| {
            match (left, right) {
                (
                    ZippedParameter::Unary {
                        variable,
                        parameter: left,
                    },
                    ZippedParameter::Unary {
                        parameter: right, ..
                    },
                ) => match variable.variance {
                    Variance::Covariant => order.solve_less_or_equal(constraints, left, right),
                    Variance::Contravariant => order.solve_less_or_equal(constraints, right, left),
                    Variance::Invariant => {
                        let forward = order.solve_less_or_equal(constraints, left, right);
                        let mut results = Vec::new();
                        for constraints in &forward {
                            results.extend(order.solve_less_or_equal(constraints, right, left));
                        }
                        results
                    }
                },
                (
                    ZippedParameter::ListVariadic {
                        parameter: left, ..
                    },
                    ZippedParameter::ListVariadic {
                        parameter: right, ..
                    },
                ) => order.solve_ordered_types_less_or_equal(constraints, left, right),
                (
                    ZippedParameter::ParameterVariadic {
                        parameter: left, ..
                    },
                    ZippedParameter::ParameterVariadic {
                        parameter: right, ..
                    },
                ) => {
                    // Zero-return callables reduce parameter-variadic zips to
                    // the callable rule.
                    let as_callable = |parameters: &CallableParameters| {
                        Callable::anonymous(pyrite_types::Overload {
                            annotation: Type::none(),
                            parameters: parameters.clone(),
                        })
                    };
                    order.solve_callable_less_or_equal(
                        constraints,
                        &as_callable(left),
                        &as_callable(right),
                    )
                }
                _ => Vec::new(),
            }
        })
    }

    // =========================================================================
    // Tuples
    // =========================================================================

    fn solve_tuple_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        left: &Tuple,
        right: &Tuple,
    ) -> Vec<ConstraintSet> {
        match (left, right) {
            (Tuple::Bounded(left), Tuple::Bounded(right)) => {
                self.solve_ordered_types_less_or_equal(constraints, left, right)
            }
            // Tuples are covariant reads.
            (Tuple::Unbounded(left), Tuple::Unbounded(right)) => {
                self.solve_less_or_equal(constraints, &left.clone(), &right.clone())
            }
            (Tuple::Bounded(OrderedTypes::Concrete(lefts)), Tuple::Unbounded(element)) => {
                let union = Type::union(lefts.clone());
                self.solve_less_or_equal(constraints, &union, &element.clone())
            }
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // TypedDictionary
    // =========================================================================

    fn solve_typed_dictionary_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        left: &TypedDictionary,
        right: &TypedDictionary,
    ) -> Vec<ConstraintSet> {
        // Width subtyping with exact field types; totality is part of the
        // generated class name.
        if left.class_name() != right.class_name() {
            return Vec::new();
        }
        let width_holds = right.fields.iter().all(|required| {
            left.field(required.name)
                .map(|present| present.annotation == required.annotation)
                .unwrap_or(false)
        });
        if width_holds {
            vec![constraints.clone()]
        } else {
            Vec::new()
        }
    }

    // =========================================================================
    // Compatibility
    // =========================================================================

    /// Relaxed `less_or_equal` for assignment positions: `Top` on the right
    /// is tolerated, `Any` anywhere is tolerated, unions distribute
    /// permissively.
    pub fn is_compatible_with(&mut self, left: &Type, right: &Type) -> bool {
        let left = left.strip_annotated();
        let right = right.strip_annotated();
        if left == right {
            return true;
        }
        match (left, right) {
            (Type::Any, _) | (_, Type::Any) => true,
            (_, Type::Top) => true,
            (Type::Bottom, _) => true,
            (Type::Union(members), _) => {
                let members = members.clone();
                members
                    .iter()
                    .all(|member| self.is_compatible_with(member, right))
            }
            (Type::Optional(l), Type::Optional(r)) => {
                let (l, r) = (l.clone(), r.clone());
                self.is_compatible_with(&l, &r)
            }
            (_, Type::Union(members)) => {
                let members = members.clone();
                members
                    .iter()
                    .any(|member| self.is_compatible_with(left, member))
            }
            (_, Type::Optional(r)) => {
                let r = r.clone();
                self.is_compatible_with(left, &r)
            }
            (
                Type::Tuple(Tuple::Bounded(OrderedTypes::Concrete(lefts))),
                Type::Tuple(Tuple::Bounded(OrderedTypes::Concrete(rights))),
            ) if lefts.len() == rights.len() => {
                let pairs: Vec<(Type, Type)> =
                    lefts.iter().cloned().zip(rights.iter().cloned()).collect();
                pairs
                    .iter()
                    .all(|(left, right)| self.is_compatible_with(left, right))
            }
            (
                Type::Parametric {
                    name: left_name,
                    parameters: left_parameters,
                },
                Type::Parametric {
                    name: right_name,
                    parameters: right_parameters,
                },
            ) if left_name == right_name && left_parameters.len() == right_parameters.len() => {
                let pairs: Vec<(Parameter, Parameter)> = left_parameters
                    .iter()
                    .cloned()
                    .zip(right_parameters.iter().cloned())
                    .collect();
                pairs.iter().all(|(left, right)| match (left, right) {
                    (Parameter::Single(left), Parameter::Single(right)) => {
                        self.is_compatible_with(left, right)
                    }
                    (left, right) => left == right,
                })
            }
            _ => self.always_less_or_equal(left, right),
        }
    }

    // =========================================================================
    // Join / meet / widen
    // =========================================================================

    pub fn join(&mut self, left: &Type, right: &Type) -> Type {
        let left = left.strip_annotated().clone();
        let right = right.strip_annotated().clone();
        if left == right {
            return left;
        }
        // Undeclared never merges away; it surfaces as a union member.
        if left.is_undeclared() || right.is_undeclared() {
            return Type::Union(vec![left, right]);
        }
        match (&left, &right) {
            (Type::Top, _) | (_, Type::Top) => Type::Top,
            (Type::Bottom, other) | (other, Type::Bottom) => (*other).clone(),
            (Type::Any, _) | (_, Type::Any) => Type::Any,
            _ => {
                if self.always_less_or_equal(&left, &right) {
                    return right;
                }
                if self.always_less_or_equal(&right, &left) {
                    return left;
                }
                self.join_incomparable(left, right)
            }
        }
    }

    fn join_incomparable(&mut self, left: Type, right: Type) -> Type {
        match (&left, &right) {
            (Type::Union(l), Type::Union(r)) => {
                Type::union(l.iter().chain(r.iter()).cloned().collect())
            }
            (Type::Union(members), other) | (other, Type::Union(members)) => {
                let mut all = members.clone();
                all.push((*other).clone());
                Type::union(all)
            }
            (Type::Optional(l), Type::Optional(r)) => {
                Type::optional(self.join(&l.clone(), &r.clone()))
            }
            (Type::Optional(l), other) | (other, Type::Optional(l)) => {
                let (l, other) = (l.clone(), (*other).clone());
                Type::optional(self.join(&l, &other))
            }
            (Type::Literal(l), _) => {
                let weakened = Type::Primitive(l.class_name());
                self.join(&weakened, &right)
            }
            (_, Type::Literal(r)) => {
                let weakened = Type::Primitive(r.class_name());
                self.join(&left, &weakened)
            }
            (Type::TypedDictionary(l), Type::TypedDictionary(r)) => {
                let (l, r) = (l.clone(), r.clone());
                self.join_typed_dictionaries(&l, &r)
            }
            (
                Type::Tuple(Tuple::Bounded(OrderedTypes::Concrete(lefts))),
                Type::Tuple(Tuple::Bounded(OrderedTypes::Concrete(rights))),
            ) if lefts.len() == rights.len() => {
                let pairs: Vec<(Type, Type)> =
                    lefts.iter().cloned().zip(rights.iter().cloned()).collect();
                Type::tuple(
                    pairs
                        .iter()
                        .map(|(left, right)| self.join(left, right))
                        .collect(),
                )
            }
            (Type::Callable(l), Type::Callable(r)) => {
                if l.implementation.parameters == r.implementation.parameters
                    && l.overloads.is_empty()
                    && r.overloads.is_empty()
                {
                    let annotation = self.join(
                        &l.implementation.annotation.clone(),
                        &r.implementation.annotation.clone(),
                    );
                    Type::callable(l.implementation.parameters.clone(), annotation)
                } else {
                    Type::union(vec![left.clone(), right.clone()])
                }
            }
            _ => self.join_nominal(left, right),
        }
    }

    fn join_nominal(&mut self, left: Type, right: Type) -> Type {
        let (Some(left_name), Some(right_name)) = (left.primitive_name(), right.primitive_name())
        else {
            return Type::union(vec![left, right]);
        };
        // Same generic class: merge parameter-wise by declared variance.
        if left_name == right_name {
            if let Some(joined) = self.join_same_parametric(left_name, &left, &right) {
                return joined;
            }
            return Type::union(vec![left, right]);
        }
        let candidates = self
            .handler
            .hierarchy()
            .least_upper_bound(left_name, right_name);
        for candidate in candidates {
            let left_parameters = self
                .handler
                .hierarchy()
                .instantiate_successors_parameters(&left, candidate);
            let right_parameters = self
                .handler
                .hierarchy()
                .instantiate_successors_parameters(&right, candidate);
            let (Some(left_parameters), Some(right_parameters)) =
                (left_parameters, right_parameters)
            else {
                continue;
            };
            if left_parameters.is_empty() && right_parameters.is_empty() {
                return Type::Primitive(candidate);
            }
            let as_parametric = |parameters: Vec<Parameter>| Type::Parametric {
                name: candidate,
                parameters,
            };
            if let Some(joined) = self.join_same_parametric(
                candidate,
                &as_parametric(left_parameters),
                &as_parametric(right_parameters),
            ) {
                return joined;
            }
        }
        trace!(
            "join of {} and {} found no common successor; widening to union",
            left,
            right
        );
        Type::union(vec![left, right])
    }

    fn join_same_parametric(
        &mut self,
        name: pyrite_common::Atom,
        left: &Type,
        right: &Type,
    ) -> Option<Type> {
        let variables = self.handler.hierarchy().variables(name)?;
        let left_parameters = match left {
            Type::Parametric { parameters, .. } => parameters.clone(),
            _ => Vec::new(),
        };
        let right_parameters = match right {
            Type::Parametric { parameters, .. } => parameters.clone(),
            _ => Vec::new(),
        };
        if variables.is_empty() {
            return Some(Type::Primitive(name));
        }
        let left_zip = zip_variables_with_parameters(&variables, &left_parameters)?;
        let right_zip = zip_variables_with_parameters(&variables, &right_parameters)?;
        let mut parameters = Vec::with_capacity(left_zip.len());
        for (left, right) in left_zip.into_iter().zip(right_zip) {
            match (left, right) {
                (
                    ZippedParameter::Unary {
                        variable,
                        parameter: left,
                    },
                    ZippedParameter::Unary {
                        parameter: right, ..
                    },
                ) => {
                    let joined = match variable.variance {
                        Variance::Covariant => self.join(&left, &right),
                        Variance::Contravariant => self.meet(&left, &right),
                        Variance::Invariant => {
                            if left == right {
                                left
                            } else {
                                // Invariant positions admit no middle ground.
                                return None;
                            }
                        }
                    };
                    parameters.push(Parameter::Single(joined));
                }
                (left, right) => {
                    if left != right {
                        return None;
                    }
                    match left {
                        ZippedParameter::ListVariadic { parameter, .. } => {
                            parameters.push(Parameter::Group(parameter))
                        }
                        ZippedParameter::ParameterVariadic { parameter, .. } => {
                            parameters.push(Parameter::CallableParameters(parameter))
                        }
                        ZippedParameter::Unary { .. } => unreachable!("kinds diverged after zip"),
                    }
                }
            }
        }
        Some(Type::Parametric { name, parameters })
    }

    fn join_typed_dictionaries(
        &mut self,
        left: &TypedDictionary,
        right: &TypedDictionary,
    ) -> Type {
        let names = well_known();
        let collision = left.fields.iter().any(|field| {
            right
                .field(field.name)
                .map(|other| other.annotation != field.annotation)
                .unwrap_or(false)
        });
        if collision || left.total != right.total {
            // Colliding keys have no common record shape; fall back to a
            // string-keyed mapping.
            return Type::parametric_over(names.mapping, vec![Type::string(), Type::Any]);
        }
        let common: Vec<_> = left
            .fields
            .iter()
            .filter(|field| right.field(field.name).is_some())
            .cloned()
            .collect();
        Type::TypedDictionary(TypedDictionary {
            name: pyrite_common::intern("$anonymous"),
            fields: common,
            total: left.total,
        })
    }

    pub fn meet(&mut self, left: &Type, right: &Type) -> Type {
        let left = left.strip_annotated().clone();
        let right = right.strip_annotated().clone();
        if left == right {
            return left;
        }
        match (&left, &right) {
            (Type::Any, _) | (_, Type::Any) => Type::Any,
            (Type::Top, other) | (other, Type::Top) => (*other).clone(),
            (Type::Bottom, _) | (_, Type::Bottom) => Type::Bottom,
            _ => {
                if self.always_less_or_equal(&left, &right) {
                    return left;
                }
                if self.always_less_or_equal(&right, &left) {
                    return right;
                }
                match (&left, &right) {
                    (Type::Union(members), other) | (other, Type::Union(members)) => {
                        let members = members.clone();
                        let other = (*other).clone();
                        Type::union(
                            members
                                .iter()
                                .map(|member| self.meet(member, &other))
                                .collect(),
                        )
                    }
                    (Type::Optional(l), Type::Optional(r)) => {
                        let (l, r) = (l.clone(), r.clone());
                        Type::optional(self.meet(&l, &r))
                    }
                    (Type::Optional(l), other) | (other, Type::Optional(l)) => {
                        let (l, other) = (l.clone(), (*other).clone());
                        self.meet(&l, &other)
                    }
                    _ => Type::Bottom,
                }
            }
        }
    }

    /// Cap a fixpoint iteration: once past `threshold`, widen straight to
    /// `Top` instead of joining.
    pub fn widen(&mut self, previous: &Type, next: &Type, iteration: usize, threshold: usize) -> Type {
        if iteration > threshold {
            Type::Top
        } else {
            self.join(previous, next)
        }
    }
}

impl BoundOrder for TypeOrder<'_> {
    fn join(&mut self, left: &Type, right: &Type) -> Type {
        TypeOrder::join(self, left, right)
    }

    fn meet(&mut self, left: &Type, right: &Type) -> Type {
        TypeOrder::meet(self, left, right)
    }

    fn always_less_or_equal(&mut self, left: &Type, right: &Type) -> bool {
        TypeOrder::always_less_or_equal(self, left, right)
    }
}

//! Callable subtyping and the overload simulation.
//!
//! `left <= right` for callables asks: every call valid for `right` is valid
//! for `left`, and `left`'s return fits `right`'s. That is decided by
//! simulating a selection of `left` "called as" `right`: each overload of
//! `left` is freshened into a new namespace, its parameter list is solved
//! against the called-as list, a partial solution over the fresh variables is
//! extracted (discarded when a fresh variable leaks), and the instantiated
//! return is checked against the called-as annotation.

use crate::order::TypeOrder;
use pyrite_types::constraints::{Bound, ConstraintSet};
use pyrite_types::{
    fresh_namespace, namespace_all_free_variables, well_known, Callable, CallableParameter,
    CallableParameters, Overload, StarParameter, Type, Variable,
};
use pyrite_common::Atom;
use rustc_hash::FxHashMap;
use tracing::trace;

impl TypeOrder<'_> {
    pub fn solve_callable_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        left: &Callable,
        right: &Callable,
    ) -> Vec<ConstraintSet> {
        let called_as = right.implementation.clone();
        let mut results = Vec::new();
        for (return_type, constraints) in
            self.simulate_signature_select(left, &called_as, constraints)
        {
            results.extend(self.solve_less_or_equal(
                &constraints,
                &return_type,
                &called_as.annotation,
            ));
        }
        results
    }

    /// Simulate selecting `callable` when called with arguments shaped like
    /// `called_as`. Yields one `(instantiated_return, remaining_constraints)`
    /// per admissible overload. The implementation is consulted only when
    /// every explicit overload fails.
    pub fn simulate_signature_select(
        &mut self,
        callable: &Callable,
        called_as: &Overload,
        constraints: &ConstraintSet,
    ) -> Vec<(Type, ConstraintSet)> {
        let explicit: Vec<&Overload> = if callable.overloads.is_empty() {
            vec![&callable.implementation]
        } else {
            callable.overloads.iter().collect()
        };
        let mut results = Vec::new();
        for (index, overload) in explicit.iter().enumerate() {
            let attempt = self.simulate_one_overload(overload, called_as, constraints);
            if attempt.is_empty() {
                trace!("overload {} rejected during simulation", index);
            }
            results.extend(attempt);
        }
        if results.is_empty() && !callable.overloads.is_empty() {
            results = self.simulate_one_overload(&callable.implementation, called_as, constraints);
        }
        results
    }

    fn simulate_one_overload(
        &mut self,
        overload: &Overload,
        called_as: &Overload,
        constraints: &ConstraintSet,
    ) -> Vec<(Type, ConstraintSet)> {
        // Freshen the overload's free variables so this instantiation event
        // cannot collide with any other in-flight one.
        let namespace = fresh_namespace();
        let freshened_type = namespace_all_free_variables(
            &Type::Callable(Box::new(Callable::anonymous(overload.clone()))),
            namespace,
        );
        let freshened = match &freshened_type {
            Type::Callable(callable) => callable.implementation.clone(),
            _ => return Vec::new(),
        };
        let fresh_variables: Vec<Variable> =
            pyrite_types::visitor::collect_free_variables(&freshened_type)
                .into_iter()
                .filter(|variable| variable.namespace() == namespace)
                .collect();

        let solved = self.solve_parameters_less_or_equal(
            constraints,
            &called_as.parameters,
            &freshened.parameters,
        );

        let mut results = Vec::new();
        for constraints in solved {
            let Some((remaining, solution)) =
                constraints.extract_partial_solution(&fresh_variables, self)
            else {
                continue;
            };
            // A solution that still mentions a freshened variable leaked it
            // out of this instantiation event.
            let leaks = solution.unaries.values().any(|value| {
                pyrite_types::visitor::collect_variables(value)
                    .iter()
                    .any(|variable| variable.namespace() == namespace)
            });
            if leaks {
                continue;
            }
            let instantiated = solution.instantiate(&freshened.annotation);
            results.push((instantiated, remaining));
        }
        results
    }

    /// `supplied <= accepted`: every argument list valid per `supplied` is
    /// accepted by `accepted`. Annotations flow covariantly from supplied to
    /// accepted position-by-position (the caller reverses sides for callable
    /// contravariance).
    pub fn solve_parameters_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        supplied: &CallableParameters,
        accepted: &CallableParameters,
    ) -> Vec<ConstraintSet> {
        match (supplied, accepted) {
            // `Callable[..., R]` on either side absorbs the parameter check.
            (_, CallableParameters::Undefined) | (CallableParameters::Undefined, _) => {
                vec![constraints.clone()]
            }
            (
                CallableParameters::Defined(supplied),
                CallableParameters::Defined(accepted),
            ) => {
                let (supplied, accepted) = (supplied.clone(), accepted.clone());
                self.solve_defined_parameters(constraints, &supplied, &accepted)
            }
            (
                CallableParameters::ParameterVariadicTypeVariable {
                    head: supplied_head,
                    variable: supplied_variable,
                },
                CallableParameters::ParameterVariadicTypeVariable {
                    head: accepted_head,
                    variable: accepted_variable,
                },
            ) => {
                if supplied_head.len() != accepted_head.len() {
                    return Vec::new();
                }
                let pairs: Vec<(Type, Type)> = supplied_head
                    .iter()
                    .cloned()
                    .zip(accepted_head.iter().cloned())
                    .collect();
                let mut current = vec![constraints.clone()];
                for (supplied_annotation, accepted_annotation) in &pairs {
                    let mut next = Vec::new();
                    for constraints in &current {
                        next.extend(self.solve_less_or_equal(
                            constraints,
                            supplied_annotation,
                            accepted_annotation,
                        ));
                    }
                    if next.is_empty() {
                        return Vec::new();
                    }
                    current = next;
                }
                if supplied_variable == accepted_variable {
                    return current;
                }
                let mut results = Vec::new();
                for constraints in &current {
                    if accepted_variable.is_free() {
                        if let Some(next) = constraints.add_lower_bound(
                            &Variable::ParameterVariadic(accepted_variable.clone()),
                            &Bound::Parameters(CallableParameters::ParameterVariadicTypeVariable {
                                head: Vec::new(),
                                variable: supplied_variable.clone(),
                            }),
                            self,
                        ) {
                            results.push(next);
                        }
                    }
                }
                results
            }
            // A free parameter-variadic on the accepted side swallows the
            // supplied list beyond its head.
            (
                CallableParameters::Defined(supplied),
                CallableParameters::ParameterVariadicTypeVariable { head, variable },
            ) => {
                let supplied = supplied.clone();
                let (head, variable) = (head.clone(), variable.clone());
                if !variable.is_free() {
                    return Vec::new();
                }
                if supplied.len() < head.len() {
                    return Vec::new();
                }
                let mut current = vec![constraints.clone()];
                for (supplied_parameter, accepted_annotation) in
                    supplied.iter().take(head.len()).zip(head.iter())
                {
                    let Some(supplied_annotation) = supplied_parameter.annotation() else {
                        return Vec::new();
                    };
                    let supplied_annotation = supplied_annotation.clone();
                    let mut next = Vec::new();
                    for constraints in &current {
                        next.extend(self.solve_less_or_equal(
                            constraints,
                            &supplied_annotation,
                            accepted_annotation,
                        ));
                    }
                    if next.is_empty() {
                        return Vec::new();
                    }
                    current = next;
                }
                let rest = CallableParameters::Defined(supplied[head.len()..].to_vec());
                let mut results = Vec::new();
                for constraints in &current {
                    if let Some(next) = constraints.add_lower_bound(
                        &Variable::ParameterVariadic(variable.clone()),
                        &Bound::Parameters(rest.clone()),
                        self,
                    ) {
                        results.push(next);
                    }
                }
                results
            }
            (CallableParameters::ParameterVariadicTypeVariable { .. }, _) => Vec::new(),
        }
    }

    fn solve_defined_parameters(
        &mut self,
        constraints: &ConstraintSet,
        supplied: &[CallableParameter],
        accepted: &[CallableParameter],
    ) -> Vec<ConstraintSet> {
        let supplied_shape = ParameterShape::of(supplied);
        let accepted_shape = ParameterShape::of(accepted);
        let mut goals: Vec<(Type, Type)> = Vec::new();

        // Positionals pair up in order; anonymous and named parameters are
        // compatible positionally.
        let mut accepted_positionals = accepted_shape.positionals.iter();
        for (supplied_annotation, _) in &supplied_shape.positionals {
            match accepted_positionals.next() {
                Some((accepted_annotation, _)) => {
                    goals.push((supplied_annotation.clone(), accepted_annotation.clone()))
                }
                None => match &accepted_shape.star {
                    // Overflow positionals land on the accepted *args.
                    Some(StarParameter::Concrete(element)) => {
                        goals.push((supplied_annotation.clone(), element.clone()))
                    }
                    Some(StarParameter::Concatenation(_)) | None => return Vec::new(),
                },
            }
        }
        // Accepted positionals with no supplied counterpart need defaults or
        // a supplied *args to feed them.
        for (accepted_annotation, has_default) in accepted_positionals {
            if *has_default {
                continue;
            }
            match &supplied_shape.star {
                Some(StarParameter::Concrete(element)) => {
                    goals.push((element.clone(), accepted_annotation.clone()))
                }
                _ => return Vec::new(),
            }
        }

        // Single-star against single-star.
        if let (Some(StarParameter::Concrete(supplied_star)), Some(accepted_star)) =
            (&supplied_shape.star, &accepted_shape.star)
        {
            match accepted_star {
                StarParameter::Concrete(accepted_star) => {
                    goals.push((supplied_star.clone(), accepted_star.clone()))
                }
                StarParameter::Concatenation(_) => return Vec::new(),
            }
        }
        if supplied_shape.star.is_some() && accepted_shape.star.is_none() {
            return Vec::new();
        }

        // Keywords match by name, falling back to the accepted **kwargs.
        for (name, (supplied_annotation, _)) in &supplied_shape.keywords {
            match accepted_shape.keywords.get(name) {
                Some((accepted_annotation, _)) => {
                    goals.push((supplied_annotation.clone(), accepted_annotation.clone()))
                }
                None => match &accepted_shape.double_star {
                    Some(accepted_values) => {
                        goals.push((supplied_annotation.clone(), accepted_values.clone()))
                    }
                    None => return Vec::new(),
                },
            }
        }
        // Accepted keywords without a supplied counterpart need defaults or a
        // supplied **kwargs.
        for (name, (accepted_annotation, has_default)) in &accepted_shape.keywords {
            if *has_default || supplied_shape.keywords.contains_key(name) {
                continue;
            }
            match &supplied_shape.double_star {
                Some(supplied_values) => {
                    goals.push((supplied_values.clone(), accepted_annotation.clone()))
                }
                None => return Vec::new(),
            }
        }
        // Double-star against double-star.
        if let (Some(supplied_values), Some(accepted_values)) =
            (&supplied_shape.double_star, &accepted_shape.double_star)
        {
            goals.push((supplied_values.clone(), accepted_values.clone()));
        }
        if supplied_shape.double_star.is_some() && accepted_shape.double_star.is_none() {
            return Vec::new();
        }

        // Concatenation stars: solve the supplied concrete positionals
        // against the pattern.
        if let Some(StarParameter::Concatenation(concatenation)) = &accepted_shape.star {
            let concrete: Vec<Type> = supplied_shape
                .positionals
                .iter()
                .map(|(annotation, _)| annotation.clone())
                .collect();
            let concatenation = concatenation.clone();
            let mut results = Vec::new();
            let seeds = self.solve_goal_list(constraints, &goals);
            for constraints in &seeds {
                results.extend(self.solve_concrete_against_concatenation(
                    constraints,
                    &concrete,
                    &concatenation,
                    true,
                ));
            }
            return results;
        }

        self.solve_goal_list(constraints, &goals)
    }

    fn solve_goal_list(
        &mut self,
        constraints: &ConstraintSet,
        goals: &[(Type, Type)],
    ) -> Vec<ConstraintSet> {
        let mut current = vec![constraints.clone()];
        for (left, right) in goals {
            let mut next = Vec::new();
            for constraints in &current {
                next.extend(self.solve_less_or_equal(constraints, left, right));
            }
            if next.is_empty() {
                return Vec::new();
            }
            current = next;
        }
        current
    }
}

/// A parameter list summarized for matching: positionals in order, keyword
/// parameters by name, and the star/double-star catch-alls.
struct ParameterShape {
    positionals: Vec<(Type, bool)>,
    keywords: FxHashMap<Atom, (Type, bool)>,
    star: Option<StarParameter>,
    double_star: Option<Type>,
}

impl ParameterShape {
    fn of(parameters: &[CallableParameter]) -> Self {
        let names = well_known();
        let mut shape = ParameterShape {
            positionals: Vec::new(),
            keywords: FxHashMap::default(),
            star: None,
            double_star: None,
        };
        for parameter in parameters {
            match parameter {
                CallableParameter::PositionalOnly {
                    annotation,
                    default,
                    ..
                } => shape.positionals.push((annotation.clone(), *default)),
                CallableParameter::Named {
                    name,
                    annotation,
                    default,
                } => {
                    // A named parameter is addressable both ways; record it
                    // positionally and by name (`self` stays positional).
                    shape.positionals.push((annotation.clone(), *default));
                    if *name != names.self_parameter {
                        shape.keywords.insert(*name, (annotation.clone(), true));
                    }
                }
                CallableParameter::KeywordOnly {
                    name,
                    annotation,
                    default,
                } => {
                    shape.keywords.insert(*name, (annotation.clone(), *default));
                }
                CallableParameter::Variable(star) => shape.star = Some(star.clone()),
                CallableParameter::Keywords(values) => {
                    shape.double_star = Some(values.clone())
                }
            }
        }
        shape
    }
}

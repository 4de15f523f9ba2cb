//! Ordered-types subtyping.
//!
//! Concrete sequences match pairwise; a concrete sequence against a
//! concatenation splits off the head and tail, binds the middle when it is a
//! bare variable, and otherwise synthesizes one fresh unary per remaining
//! element so mapped middles solve element-wise.

use crate::order::TypeOrder;
use pyrite_types::constraints::{Bound, ConstraintSet};
use pyrite_types::{
    fresh_namespace, Concatenation, OrderedTypes, Type, UnaryVariable, Variable, VariableState,
};

impl TypeOrder<'_> {
    pub fn solve_ordered_types_less_or_equal(
        &mut self,
        constraints: &ConstraintSet,
        left: &OrderedTypes,
        right: &OrderedTypes,
    ) -> Vec<ConstraintSet> {
        match (left, right) {
            (OrderedTypes::Concrete(lefts), OrderedTypes::Concrete(rights)) => {
                if lefts.len() != rights.len() {
                    return Vec::new();
                }
                let pairs: Vec<(Type, Type)> =
                    lefts.iter().cloned().zip(rights.iter().cloned()).collect();
                let mut current = vec![constraints.clone()];
                for (left, right) in &pairs {
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
            (OrderedTypes::Concrete(bound), OrderedTypes::Concatenation(concatenation)) => {
                self.solve_concrete_against_concatenation(constraints, bound, concatenation, true)
            }
            (OrderedTypes::Concatenation(concatenation), OrderedTypes::Concrete(bound)) => {
                self.solve_concrete_against_concatenation(constraints, bound, concatenation, false)
            }
            (OrderedTypes::Concatenation(left), OrderedTypes::Concatenation(right)) => {
                // A single free bare variable on either side binds to the
                // whole other sequence, in both orientations; anything else
                // yields no constraints.
                let mut results = Vec::new();
                if right.is_bare_variable() && right.middle.is_free() {
                    let bound = Bound::Ordered(OrderedTypes::Concatenation(left.clone()));
                    let variable = Variable::ListVariadic(right.middle.clone());
                    if let Some(next) = constraints.add_lower_bound(&variable, &bound, self) {
                        results.push(next);
                    }
                }
                if left.is_bare_variable() && left.middle.is_free() {
                    let bound = Bound::Ordered(OrderedTypes::Concatenation(right.clone()));
                    let variable = Variable::ListVariadic(left.middle.clone());
                    if let Some(next) = constraints.add_upper_bound(&variable, &bound, self) {
                        results.push(next);
                    }
                }
                results
            }
        }
    }

    /// Match a concrete sequence against `[head...] ++ middle ++ [tail...]`.
    /// `concrete_on_left` fixes which side of the order each element pair
    /// lands on.
    pub fn solve_concrete_against_concatenation(
        &mut self,
        constraints: &ConstraintSet,
        bound: &[Type],
        concatenation: &Concatenation,
        concrete_on_left: bool,
    ) -> Vec<ConstraintSet> {
        let head_length = concatenation.head.len();
        let tail_length = concatenation.tail.len();
        if bound.len() < head_length + tail_length {
            return Vec::new();
        }
        let (head, rest) = bound.split_at(head_length);
        let (middle, tail) = rest.split_at(rest.len() - tail_length);

        let oriented = |order: &mut Self,
                            constraints: &ConstraintSet,
                            concrete: &Type,
                            pattern: &Type|
         -> Vec<ConstraintSet> {
            if concrete_on_left {
                order.solve_less_or_equal(constraints, concrete, pattern)
            } else {
                order.solve_less_or_equal(constraints, pattern, concrete)
            }
        };

        let mut current = vec![constraints.clone()];
        for (concrete, pattern) in head
            .iter()
            .zip(concatenation.head.iter())
            .chain(tail.iter().zip(concatenation.tail.iter()))
        {
            let mut next = Vec::new();
            for constraints in &current {
                next.extend(oriented(self, constraints, concrete, pattern));
            }
            if next.is_empty() {
                return Vec::new();
            }
            current = next;
        }

        if !concatenation.middle.is_free() {
            // A pinned middle only matches exactly itself, which concrete
            // elements never are.
            return Vec::new();
        }

        let variable = Variable::ListVariadic(concatenation.middle.clone());
        if concatenation.mappers.is_empty() {
            let bound = Bound::Ordered(OrderedTypes::Concrete(middle.to_vec()));
            let mut results = Vec::new();
            for constraints in &current {
                let lowered = constraints.add_lower_bound(&variable, &bound, self);
                let both = lowered
                    .and_then(|constraints| constraints.add_upper_bound(&variable, &bound, self));
                if let Some(both) = both {
                    results.push(both);
                }
            }
            return results;
        }

        // Mapped middle: synthesize one fresh unary per element, wrap each in
        // the mappers, solve element-wise, then bind the middle to the
        // synthesized sequence in both directions.
        let namespace = fresh_namespace();
        let synthesized: Vec<UnaryVariable> = (0..middle.len())
            .map(|index| {
                let mut variable =
                    UnaryVariable::new(pyrite_common::intern(&format!("$mapped_{index}")));
                variable.namespace = namespace;
                variable.state = VariableState::Free { escaped: false };
                variable
            })
            .collect();

        for (concrete, fresh) in middle.iter().zip(synthesized.iter()) {
            let pattern = concatenation.apply_mappers(Type::Variable(fresh.clone()));
            let mut next = Vec::new();
            for constraints in &current {
                next.extend(oriented(self, constraints, concrete, &pattern));
            }
            if next.is_empty() {
                return Vec::new();
            }
            current = next;
        }

        let sequence = OrderedTypes::Concrete(
            synthesized
                .iter()
                .cloned()
                .map(Type::Variable)
                .collect(),
        );
        let bound = Bound::Ordered(sequence);
        let mut results = Vec::new();
        for constraints in &current {
            let lowered = constraints.add_lower_bound(&variable, &bound, self);
            let both =
                lowered.and_then(|constraints| constraints.add_upper_bound(&variable, &bound, self));
            if let Some(both) = both {
                results.push(both);
            }
        }
        results
    }
}

//! Protocol conformance.
//!
//! `instantiate_protocol_parameters(candidate, protocol)` answers: is there a
//! parameter list for `protocol` under which `candidate` structurally
//! satisfies every protocol attribute? Conformance goals recurse through
//! attribute resolution and back into the order; goals already in progress
//! are answered tentatively out of the assumption bag.

use crate::order::TypeOrder;
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{
    namespace_all_free_variables, well_known, CallableParameters, Concatenation, OrderedTypes,
    Parameter, Type, Variable,
};
use pyrite_common::Atom;
use rustc_hash::FxHashMap;
use tracing::trace;

impl TypeOrder<'_> {
    pub fn instantiate_protocol_parameters(
        &mut self,
        candidate: &Type,
        protocol: Atom,
    ) -> Option<Vec<Parameter>> {
        let candidate = candidate.strip_annotated().clone();

        // A nominal mention of the protocol answers itself.
        match &candidate {
            Type::Primitive(name) if *name == protocol => return Some(Vec::new()),
            Type::Parametric { name, parameters } if *name == protocol => {
                return Some(parameters.clone())
            }
            _ => {}
        }

        if let Some(tentative) = self.assumptions.protocols.find(&candidate, protocol) {
            return Some(tentative.clone());
        }
        if candidate.is_callable()
            && self
                .assumptions
                .callables
                .iter()
                .any(|(c, p)| c == &candidate && *p == protocol)
        {
            return Some(generic_parameters(self, protocol));
        }

        let tentative = generic_parameters(self, protocol);
        self.assumptions
            .protocols
            .push(candidate.clone(), protocol, tentative);
        if candidate.is_callable() {
            self.assumptions.callables.push((candidate.clone(), protocol));
        }
        let result = self.instantiate_protocol_parameters_inner(&candidate, protocol);
        if candidate.is_callable() {
            self.assumptions.callables.pop();
        }
        self.assumptions.protocols.pop();
        result
    }

    fn instantiate_protocol_parameters_inner(
        &mut self,
        candidate: &Type,
        protocol: Atom,
    ) -> Option<Vec<Parameter>> {
        let names = well_known();
        let protocol_attributes = self.handler.protocol_attributes(protocol)?;

        // Sanitize the candidate's free variables into a fresh namespace so
        // they cannot collide with the protocol's own; remember how to map
        // them back.
        let namespace = pyrite_types::fresh_namespace();
        let original_namespaces: FxHashMap<Atom, u32> =
            pyrite_types::visitor::collect_free_variables(candidate)
                .iter()
                .map(|variable| (variable.name(), variable.namespace()))
                .collect();
        let sanitized = namespace_all_free_variables(candidate, namespace);

        let candidate_attributes: Vec<(Atom, Type)> = match &sanitized {
            // Calling is the one shape a bare callable can offer.
            Type::Callable(_) => vec![(names.call_attribute, sanitized.clone())],
            _ => self.handler.attributes(&sanitized)?,
        };

        let mut current = vec![ConstraintSet::empty()];
        for (attribute_name, protocol_annotation) in &protocol_attributes {
            let candidate_annotation = candidate_attributes
                .iter()
                .find(|(name, _)| name == attribute_name)
                .map(|(_, annotation)| annotation.clone());
            let Some(candidate_annotation) = candidate_annotation else {
                trace!(
                    "{} lacks `{}` required by protocol {}",
                    candidate,
                    attribute_name,
                    protocol
                );
                return None;
            };
            let mut next = Vec::new();
            for constraints in &current {
                next.extend(self.solve_less_or_equal(
                    constraints,
                    &candidate_annotation,
                    protocol_annotation,
                ));
            }
            if next.is_empty() {
                return None;
            }
            current = next;
        }

        let declared = self
            .handler
            .hierarchy()
            .variables(protocol)
            .unwrap_or_default();
        let solution = current
            .into_iter()
            .find_map(|constraints| constraints.solve(self))?;

        let desanitize = |ty: Type| {
            pyrite_types::visitor::map_variables(&ty, &mut |mut variable| {
                if variable.namespace() == namespace {
                    if let Some(original) = original_namespaces.get(&variable.name()) {
                        variable.set_namespace(*original);
                    }
                }
                variable
            })
        };

        let parameters = declared
            .iter()
            .map(|variable| match variable {
                Variable::Unary(unary) => Parameter::Single(
                    solution
                        .unaries
                        .get(unary)
                        .cloned()
                        .map(&desanitize)
                        .unwrap_or(Type::Any),
                ),
                Variable::ListVariadic(list) => Parameter::Group(
                    solution
                        .list_variadics
                        .get(list)
                        .cloned()
                        .unwrap_or_else(|| OrderedTypes::Concrete(vec![Type::Any])),
                ),
                Variable::ParameterVariadic(parameter) => Parameter::CallableParameters(
                    solution
                        .parameter_variadics
                        .get(parameter)
                        .cloned()
                        .unwrap_or(CallableParameters::Undefined),
                ),
            })
            .collect();
        Some(parameters)
    }
}

/// The protocol instantiated with its own declared variables; the tentative
/// answer handed to recursive goals.
fn generic_parameters(order: &TypeOrder<'_>, protocol: Atom) -> Vec<Parameter> {
    order
        .handler
        .hierarchy()
        .variables(protocol)
        .unwrap_or_default()
        .iter()
        .map(|variable| match variable {
            Variable::Unary(unary) => Parameter::Single(Type::Variable(unary.clone())),
            Variable::ListVariadic(list) => Parameter::Group(OrderedTypes::Concatenation(
                Concatenation::bare(list.clone()),
            )),
            Variable::ParameterVariadic(parameter) => {
                Parameter::CallableParameters(CallableParameters::ParameterVariadicTypeVariable {
                    head: Vec::new(),
                    variable: parameter.clone(),
                })
            }
        })
        .collect()
}

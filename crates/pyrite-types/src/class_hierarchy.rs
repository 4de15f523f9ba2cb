//! The class hierarchy.
//!
//! An indexed DAG of nominal edges. Class names are interned to dense
//! `ClassIndex` values; edges out of a class carry the ordered types with
//! which the parent is instantiated, expressed over the child's declared
//! variables. All queries are O(edges) or better.

use crate::constraints::Solution;
use crate::method_resolution_order;
use crate::ordered_types::{OrderedTypes, Tuple};
use crate::types::{Parameter, Type};
use crate::variable::{ListVariadic, ParameterVariadic, UnaryVariable, Variable};
use pyrite_common::{resolve, Atom};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassIndex(pub u32);

/// One inheritance edge: the parent class and how it is instantiated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub target: ClassIndex,
    pub parameters: OrderedTypes,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("class hierarchy contains a cycle")]
    Cyclic,
    #[error("class hierarchy references an untracked index")]
    Incomplete,
    #[error("inconsistent method resolution order for class {0:?}")]
    InconsistentMethodResolutionOrder(ClassIndex),
    #[error("type references untracked class `{0}`")]
    Untracked(String),
}

/// Declared variables zipped against supplied parameters, kind by kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZippedParameter {
    Unary {
        variable: UnaryVariable,
        parameter: Type,
    },
    ListVariadic {
        variable: ListVariadic,
        parameter: OrderedTypes,
    },
    ParameterVariadic {
        variable: ParameterVariadic,
        parameter: crate::callable::CallableParameters,
    },
}

/// Zip declared variables against supplied parameters. Total: any kind or
/// arity mismatch fails atomically with `None`.
pub fn zip_variables_with_parameters(
    variables: &[Variable],
    parameters: &[Parameter],
) -> Option<Vec<ZippedParameter>> {
    if variables.len() != parameters.len() {
        return None;
    }
    variables
        .iter()
        .zip(parameters.iter())
        .map(|(variable, parameter)| match (variable, parameter) {
            (Variable::Unary(variable), Parameter::Single(ty)) => Some(ZippedParameter::Unary {
                variable: variable.clone(),
                parameter: ty.clone(),
            }),
            (Variable::ListVariadic(variable), Parameter::Group(ordered)) => {
                Some(ZippedParameter::ListVariadic {
                    variable: variable.clone(),
                    parameter: ordered.clone(),
                })
            }
            // A single supplied to a list-variadic position is a one-element
            // group; annotation sugar produces this shape.
            (Variable::ListVariadic(variable), Parameter::Single(ty)) => {
                Some(ZippedParameter::ListVariadic {
                    variable: variable.clone(),
                    parameter: OrderedTypes::Concrete(vec![ty.clone()]),
                })
            }
            (Variable::ParameterVariadic(variable), Parameter::CallableParameters(parameters)) => {
                Some(ZippedParameter::ParameterVariadic {
                    variable: variable.clone(),
                    parameter: parameters.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

/// Zip declared variables against a raw ordered sequence (the form edges
/// carry). All-unary classes consume the sequence positionally; a class
/// declaring exactly one list-variadic consumes it whole.
pub fn zip_variables_with_ordered(
    variables: &[Variable],
    ordered: &OrderedTypes,
) -> Option<Vec<ZippedParameter>> {
    match (variables, ordered) {
        ([Variable::ListVariadic(variable)], ordered) => Some(vec![ZippedParameter::ListVariadic {
            variable: variable.clone(),
            parameter: ordered.clone(),
        }]),
        (variables, OrderedTypes::Concrete(types)) => {
            let parameters: Vec<Parameter> =
                types.iter().cloned().map(Parameter::Single).collect();
            zip_variables_with_parameters(variables, &parameters)
        }
        _ => None,
    }
}

impl ZippedParameter {
    pub fn into_solution_entry(self, solution: Solution) -> Solution {
        match self {
            ZippedParameter::Unary {
                variable,
                parameter,
            } => solution.bind_unary(variable, parameter),
            ZippedParameter::ListVariadic {
                variable,
                parameter,
            } => solution.bind_list_variadic(variable, parameter),
            ZippedParameter::ParameterVariadic {
                variable,
                parameter,
            } => solution.bind_parameter_variadic(variable, parameter),
        }
    }
}

/// Build a substitution from zipped parameters.
pub fn solution_from_zipped(zipped: Vec<ZippedParameter>) -> Solution {
    zipped
        .into_iter()
        .fold(Solution::empty(), |solution, entry| {
            entry.into_solution_entry(solution)
        })
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassHierarchy {
    indices: FxHashMap<Atom, ClassIndex>,
    names: Vec<Atom>,
    edges: FxHashMap<ClassIndex, Vec<Target>>,
    variables: FxHashMap<ClassIndex, Vec<Variable>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a class name, creating its index on first sight.
    pub fn insert(&mut self, name: Atom) -> ClassIndex {
        if let Some(index) = self.indices.get(&name) {
            return *index;
        }
        let index = ClassIndex(self.names.len() as u32);
        self.names.push(name);
        self.indices.insert(name, index);
        self.edges.entry(index).or_default();
        index
    }

    /// Add an edge `child -> parent` instantiated with `parameters`.
    pub fn connect(&mut self, child: Atom, parent: Atom, parameters: OrderedTypes) {
        let child = self.insert(child);
        let parent = self.insert(parent);
        self.edges.entry(child).or_default().push(Target {
            target: parent,
            parameters,
        });
    }

    pub fn set_variables(&mut self, name: Atom, variables: Vec<Variable>) {
        let index = self.insert(name);
        self.variables.insert(index, variables);
    }

    pub fn contains(&self, name: Atom) -> bool {
        self.indices.contains_key(&name)
    }

    pub fn index_of(&self, name: Atom) -> Option<ClassIndex> {
        self.indices.get(&name).copied()
    }

    pub fn name_of(&self, index: ClassIndex) -> Option<Atom> {
        self.names.get(index.0 as usize).copied()
    }

    pub fn edges(&self, index: ClassIndex) -> Option<&[Target]> {
        self.edges.get(&index).map(Vec::as_slice)
    }

    /// Declared type-parameters of a class; empty when not generic.
    pub fn variables(&self, name: Atom) -> Option<Vec<Variable>> {
        let index = self.index_of(name)?;
        Some(self.variables.get(&index).cloned().unwrap_or_default())
    }

    /// Linearized MRO of `name`, excluding `name` itself.
    pub fn successors(&self, name: Atom) -> Result<Vec<Atom>, HierarchyError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| HierarchyError::Untracked(resolve(name).to_string()))?;
        let linearized =
            method_resolution_order::linearize(&|index| self.edges.get(&index).cloned(), index)?;
        Ok(linearized
            .into_iter()
            .skip(1)
            .filter_map(|index| self.name_of(index))
            .collect())
    }

    pub fn is_transitive_successor(&self, source: Atom, target: Atom) -> bool {
        let (Some(source), Some(target)) = (self.index_of(source), self.index_of(target)) else {
            return false;
        };
        if source == target {
            return true;
        }
        let mut visited = FxHashSet::default();
        let mut worklist = VecDeque::from([source]);
        while let Some(current) = worklist.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for edge in self.edges.get(&current).into_iter().flatten() {
                if edge.target == target {
                    return true;
                }
                worklist.push_back(edge.target);
            }
        }
        false
    }

    /// Common successors of minimum combined BFS weight, in index order.
    pub fn least_upper_bound(&self, left: Atom, right: Atom) -> Vec<Atom> {
        let (Some(left), Some(right)) = (self.index_of(left), self.index_of(right)) else {
            return Vec::new();
        };
        let left_depths = self.bfs_depths(left);
        let right_depths = self.bfs_depths(right);
        let mut common: Vec<(usize, ClassIndex)> = left_depths
            .iter()
            .filter_map(|(index, left_depth)| {
                right_depths
                    .get(index)
                    .map(|right_depth| (left_depth + right_depth, *index))
            })
            .collect();
        let minimum = match common.iter().map(|(weight, _)| *weight).min() {
            Some(minimum) => minimum,
            None => return Vec::new(),
        };
        common.retain(|(weight, _)| *weight == minimum);
        common.sort_by_key(|(_, index)| *index);
        common
            .into_iter()
            .filter_map(|(_, index)| self.name_of(index))
            .collect()
    }

    fn bfs_depths(&self, start: ClassIndex) -> FxHashMap<ClassIndex, usize> {
        let mut depths = FxHashMap::default();
        let mut worklist = VecDeque::from([(start, 0usize)]);
        while let Some((current, depth)) = worklist.pop_front() {
            if depths.contains_key(&current) {
                continue;
            }
            depths.insert(current, depth);
            for edge in self.edges.get(&current).into_iter().flatten() {
                worklist.push_back((edge.target, depth + 1));
            }
        }
        depths
    }

    /// Walk `source` up to `target_name`, substituting parameters through
    /// each edge. Returns the parameters with which `source` instantiates
    /// `target_name`, or `None` when unrelated.
    pub fn instantiate_successors_parameters(
        &self,
        source: &Type,
        target_name: Atom,
    ) -> Option<Vec<Parameter>> {
        let (source_name, source_parameters) = decompose_parametric(source)?;
        let target = self.index_of(target_name)?;
        let start = self.index_of(source_name)?;

        let declared = self
            .variables
            .get(&start)
            .cloned()
            .unwrap_or_default();
        if start == target {
            return Some(pad_parameters(source_parameters, &declared));
        }

        let initial = zip_variables_with_parameters(
            &declared,
            &pad_parameters(source_parameters, &declared),
        )
        .map(solution_from_zipped)
        .unwrap_or_else(Solution::empty);

        let mut visited = FxHashSet::default();
        let mut worklist = VecDeque::from([(start, initial)]);
        while let Some((current, substitution)) = worklist.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for edge in self.edges.get(&current).into_iter().flatten() {
                let supplied = substitution.instantiate_all_ordered(&edge.parameters);
                let parent_declared = self
                    .variables
                    .get(&edge.target)
                    .cloned()
                    .unwrap_or_default();
                let parent_parameters = match zip_variables_with_ordered(&parent_declared, &supplied)
                {
                    Some(zipped) => zipped
                        .iter()
                        .map(|entry| match entry {
                            ZippedParameter::Unary { parameter, .. } => {
                                Parameter::Single(parameter.clone())
                            }
                            ZippedParameter::ListVariadic { parameter, .. } => {
                                Parameter::Group(parameter.clone())
                            }
                            ZippedParameter::ParameterVariadic { parameter, .. } => {
                                Parameter::CallableParameters(parameter.clone())
                            }
                        })
                        .collect(),
                    None => match &supplied {
                        OrderedTypes::Concrete(types) => {
                            types.iter().cloned().map(Parameter::Single).collect()
                        }
                        ordered => vec![Parameter::Group(ordered.clone())],
                    },
                };
                if edge.target == target {
                    return Some(parent_parameters);
                }
                let parent_substitution =
                    zip_variables_with_parameters(&parent_declared, &parent_parameters)
                        .map(solution_from_zipped)
                        .unwrap_or_else(Solution::empty);
                worklist.push_back((edge.target, parent_substitution));
            }
        }
        None
    }

    /// Verify acyclicity and MRO consistency over the whole hierarchy.
    pub fn check_integrity(&self) -> Result<(), HierarchyError> {
        for index in 0..self.names.len() {
            let index = ClassIndex(index as u32);
            method_resolution_order::linearize(&|index| self.edges.get(&index).cloned(), index)?;
        }
        Ok(())
    }

    pub fn class_names(&self) -> impl Iterator<Item = Atom> + '_ {
        self.names.iter().copied()
    }
}

/// The builtin skeleton every hierarchy starts from: `object`, the numeric
/// tower, and the container classes with their declared variances.
pub fn builtin_hierarchy() -> ClassHierarchy {
    use crate::variable::Variance;
    let mut hierarchy = ClassHierarchy::new();
    let names = crate::names::well_known();

    hierarchy.insert(names.object);
    for primitive in [
        names.int,
        names.float,
        names.complex,
        names.str_,
        names.bool_,
        names.bytes,
        names.none_type,
        names.slice,
        names.base_exception,
        names.r#type,
        names.ellipsis,
    ] {
        hierarchy.connect(primitive, names.object, OrderedTypes::empty());
    }
    // bool <= int, int <= float <= complex per the numeric tower.
    hierarchy.connect(names.bool_, names.int, OrderedTypes::empty());
    hierarchy.connect(names.int, names.float, OrderedTypes::empty());
    hierarchy.connect(names.float, names.complex, OrderedTypes::empty());

    let covariant = |name: &str| {
        Variable::Unary(
            UnaryVariable::new(pyrite_common::intern(name)).with_variance(Variance::Covariant),
        )
    };
    let invariant = |name: &str| Variable::Unary(UnaryVariable::new(pyrite_common::intern(name)));
    let var = |name: &str| Type::Variable(UnaryVariable::new(pyrite_common::intern(name)));
    let cov_var = |name: &str| {
        Type::Variable(
            UnaryVariable::new(pyrite_common::intern(name)).with_variance(Variance::Covariant),
        )
    };

    // `type` is generic over the instance it constructs.
    hierarchy.set_variables(names.r#type, vec![covariant("T_co")]);

    // Covariant read-only containers.
    hierarchy.set_variables(names.iterable, vec![covariant("T_co")]);
    hierarchy.set_variables(names.iterator, vec![covariant("T_co")]);
    hierarchy.set_variables(names.sequence, vec![covariant("T_co")]);
    hierarchy.set_variables(names.awaitable, vec![covariant("T_co")]);
    hierarchy.connect(
        names.iterator,
        names.iterable,
        OrderedTypes::Concrete(vec![cov_var("T_co")]),
    );
    hierarchy.connect(
        names.sequence,
        names.iterable,
        OrderedTypes::Concrete(vec![cov_var("T_co")]),
    );
    hierarchy.connect(names.iterable, names.object, OrderedTypes::empty());
    hierarchy.connect(names.awaitable, names.object, OrderedTypes::empty());

    // Invariant mutable containers.
    hierarchy.set_variables(names.list, vec![invariant("T")]);
    hierarchy.set_variables(names.set, vec![invariant("T")]);
    hierarchy.set_variables(names.abstract_set, vec![covariant("T_co")]);
    hierarchy.connect(
        names.list,
        names.sequence,
        OrderedTypes::Concrete(vec![var("T")]),
    );
    hierarchy.connect(
        names.set,
        names.abstract_set,
        OrderedTypes::Concrete(vec![var("T")]),
    );
    hierarchy.connect(
        names.abstract_set,
        names.iterable,
        OrderedTypes::Concrete(vec![cov_var("T_co")]),
    );

    // tuple is covariant in its single collapsed parameter.
    hierarchy.set_variables(names.tuple, vec![covariant("T_co")]);
    hierarchy.connect(
        names.tuple,
        names.sequence,
        OrderedTypes::Concrete(vec![cov_var("T_co")]),
    );

    // Mappings: invariant key, covariant value on the read side.
    hierarchy.set_variables(names.mapping, vec![invariant("K"), covariant("V_co")]);
    hierarchy.set_variables(names.mutable_mapping, vec![invariant("K"), invariant("V")]);
    hierarchy.set_variables(names.dict, vec![invariant("K"), invariant("V")]);
    hierarchy.connect(
        names.dict,
        names.mutable_mapping,
        OrderedTypes::Concrete(vec![var("K"), var("V")]),
    );
    hierarchy.connect(
        names.mutable_mapping,
        names.mapping,
        OrderedTypes::Concrete(vec![var("K"), var("V")]),
    );
    hierarchy.connect(
        names.mapping,
        names.iterable,
        OrderedTypes::Concrete(vec![var("K")]),
    );

    // TypedDictionary base classes behave as string-keyed mappings.
    for typed_dictionary in [names.typed_dictionary, names.non_total_typed_dictionary] {
        hierarchy.connect(
            typed_dictionary,
            names.mapping,
            OrderedTypes::Concrete(vec![Type::Primitive(names.str_), Type::Primitive(names.object)]),
        );
    }

    hierarchy
}

/// View any nominally-backed type as `(class_name, parameters)`.
fn decompose_parametric(source: &Type) -> Option<(Atom, Vec<Parameter>)> {
    let names = crate::names::well_known();
    match source.strip_annotated() {
        Type::Primitive(name) => Some((*name, Vec::new())),
        Type::Parametric { name, parameters } => Some((*name, parameters.clone())),
        Type::Literal(literal) => Some((literal.class_name(), Vec::new())),
        Type::Tuple(Tuple::Bounded(OrderedTypes::Concrete(types))) => Some((
            names.tuple,
            vec![Parameter::Single(Type::union(types.clone()))],
        )),
        Type::Tuple(Tuple::Unbounded(element)) => Some((
            names.tuple,
            vec![Parameter::Single((**element).clone())],
        )),
        Type::TypedDictionary(dictionary) => Some((dictionary.class_name(), Vec::new())),
        _ => None,
    }
}

/// Pad or trim supplied parameters against the declared variable list;
/// missing positions become `Any`.
fn pad_parameters(mut parameters: Vec<Parameter>, declared: &[Variable]) -> Vec<Parameter> {
    if declared.is_empty() {
        return parameters;
    }
    while parameters.len() < declared.len() {
        let position = parameters.len();
        match &declared[position] {
            Variable::Unary(_) => parameters.push(Parameter::Single(Type::Any)),
            Variable::ListVariadic(_) => {
                parameters.push(Parameter::Group(OrderedTypes::Concrete(vec![Type::Any])))
            }
            Variable::ParameterVariadic(_) => parameters.push(Parameter::CallableParameters(
                crate::callable::CallableParameters::Undefined,
            )),
        }
    }
    parameters.truncate(declared.len());
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_common::intern;

    fn unary(name: &str) -> Variable {
        Variable::Unary(UnaryVariable::new(intern(name)))
    }

    fn hierarchy() -> ClassHierarchy {
        // list[T] -> Sequence[T] -> Iterable[T] -> object
        let mut hierarchy = ClassHierarchy::new();
        let names = crate::names::well_known();
        hierarchy.insert(names.object);
        hierarchy.set_variables(names.list, vec![unary("T")]);
        hierarchy.set_variables(names.sequence, vec![unary("T")]);
        hierarchy.set_variables(names.iterable, vec![unary("T")]);
        let t = |name: &str| Type::Variable(UnaryVariable::new(intern(name)));
        hierarchy.connect(
            names.list,
            names.sequence,
            OrderedTypes::Concrete(vec![t("T")]),
        );
        hierarchy.connect(
            names.sequence,
            names.iterable,
            OrderedTypes::Concrete(vec![t("T")]),
        );
        hierarchy.connect(names.iterable, names.object, OrderedTypes::empty());
        hierarchy
    }

    #[test]
    fn successors_linearize() {
        let hierarchy = hierarchy();
        let names = crate::names::well_known();
        let successors = hierarchy.successors(names.list).unwrap();
        assert_eq!(
            successors,
            vec![names.sequence, names.iterable, names.object]
        );
    }

    #[test]
    fn transitive_successor() {
        let hierarchy = hierarchy();
        let names = crate::names::well_known();
        assert!(hierarchy.is_transitive_successor(names.list, names.object));
        assert!(!hierarchy.is_transitive_successor(names.object, names.list));
    }

    #[test]
    fn parameters_propagate_through_edges() {
        let hierarchy = hierarchy();
        let names = crate::names::well_known();
        let source = Type::list(Type::integer());
        let parameters = hierarchy
            .instantiate_successors_parameters(&source, names.iterable)
            .unwrap();
        assert_eq!(parameters, vec![Parameter::Single(Type::integer())]);
    }

    #[test]
    fn unrelated_classes_fail() {
        let hierarchy = hierarchy();
        let names = crate::names::well_known();
        assert_eq!(
            hierarchy.instantiate_successors_parameters(&Type::object(), names.list),
            None
        );
    }

    #[test]
    fn least_upper_bound_finds_minimum() {
        let hierarchy = hierarchy();
        let names = crate::names::well_known();
        assert_eq!(
            hierarchy.least_upper_bound(names.list, names.sequence),
            vec![names.sequence]
        );
    }

    #[test]
    fn integrity_passes_on_dag() {
        assert!(hierarchy().check_integrity().is_ok());
    }
}

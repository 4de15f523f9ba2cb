//! Type algebra for the pyrite type-inference core.
//!
//! This crate contains the data model the solver operates on:
//! - `types` - the closed `Type` sum with canonical unions
//! - `variable` - unary, parameter-variadic, and list-variadic variables
//! - `ordered_types` - finite, unbounded, and concatenated type sequences
//! - `callable` - callables, overloads, and parameter lists
//! - `constraints` - per-variable bound sets and extracted solutions
//! - `class_hierarchy` - the indexed DAG of nominal edges with MRO queries
//! - `visitor` - the bottom-up transform every rewrite pass is built on

pub mod callable;
pub mod class_hierarchy;
pub mod constraints;
pub mod method_resolution_order;
pub mod names;
pub mod ordered_types;
pub mod types;
pub mod variable;
pub mod visitor;

pub use callable::{
    Callable, CallableKind, CallableParameter, CallableParameters, Implicit, Overload,
    StarParameter,
};
pub use class_hierarchy::{
    solution_from_zipped, zip_variables_with_ordered, zip_variables_with_parameters,
    ClassHierarchy, ClassIndex, HierarchyError, Target, ZippedParameter,
};
pub use constraints::{Assumptions, Bound, BoundOrder, ConstraintSet, ProtocolAssumptions, Solution};
pub use names::well_known;
pub use ordered_types::{Concatenation, OrderedTypes, Tuple};
pub use types::{
    Literal, Parameter, ParameterVariadicComponent, Type, TypedDictionary, TypedDictionaryField,
    VariadicComponent,
};
pub use variable::{
    collapse_all_escaped_variable_unions, converge_all_namespaces,
    convert_all_escaped_free_variables_to_anys, fresh_namespace,
    mark_all_free_variables_as_escaped, mark_all_variables_as_bound, mark_all_variables_as_free,
    namespace_all_free_variables, namespace_insensitive_compare, reset_namespaces_for_tests,
    Constraints, ListVariadic, Namespace, ParameterVariadic, UnaryVariable, Variable,
    VariableState, Variance,
};

#[cfg(test)]
mod tests;

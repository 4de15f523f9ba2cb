//! The pyrite order engine and its consumers.
//!
//! This crate decides the questions the environment asks about types:
//! - `order` - `left <= right`, joins, meets, widening, compatibility
//! - `protocols` - structural conformance with assumption-cut recursion
//! - `callables` - callable subtyping and the overload simulation
//! - `ordered` - ordered-type subtyping and concatenation splitting
//! - `signature` - call-site matching against (overloaded) callables
//! - `attributes` - per-class attribute tables and receiver instantiation
//! - `dataclasses` - `@dataclass`/`attr.s` method synthesis
//! - `weaken` - mutable-literal weakening against expected containers

pub mod attributes;
pub mod callables;
pub mod class_handler;
pub mod dataclasses;
pub mod order;
pub mod ordered;
pub mod protocols;
pub mod signature;
pub mod weaken;

pub use attributes::{
    AttributeTable, InitializedState, InstantiatedAttribute, UninstantiatedAnnotation,
    UninstantiatedAttribute, Visibility,
};
pub use class_handler::{ClassHandler, SimpleClassHandler};
pub use dataclasses::{DataclassField, DataclassOptions};
pub use order::TypeOrder;
pub use signature::{ArgumentKind, CallArgument, SignatureMatch, SignatureSelectionReason};

#[cfg(test)]
mod tests;

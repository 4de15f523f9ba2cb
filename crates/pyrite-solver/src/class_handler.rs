//! The seam between the order and the class universe.
//!
//! The order needs nominal facts (the hierarchy), protocol flags, and
//! attribute shapes. All three are produced by the environment stack, which
//! itself calls back into the order; the trait keeps that recursion behind
//! one borrowed handle threaded through every query.

use pyrite_common::Atom;
use pyrite_types::{ClassHierarchy, Type};
use rustc_hash::FxHashMap;

pub trait ClassHandler {
    fn hierarchy(&self) -> &ClassHierarchy;

    fn is_protocol(&self, name: Atom) -> bool;

    /// Attribute name/annotation pairs as seen on values of `receiver`.
    /// `None` when the receiver has no tracked class.
    fn attributes(&self, receiver: &Type) -> Option<Vec<(Atom, Type)>>;

    /// Attributes declared on the protocol itself, excluding those inherited
    /// from `object` and `Generic`.
    fn protocol_attributes(&self, protocol: Atom) -> Option<Vec<(Atom, Type)>>;

    /// The metaclass governing `name`; `type` unless overridden.
    fn metaclass(&self, name: Atom) -> Option<Type> {
        let _ = name;
        Some(Type::Primitive(pyrite_types::well_known().r#type))
    }
}

/// In-memory handler used by solver tests and small standalone consumers.
#[derive(Default)]
pub struct SimpleClassHandler {
    pub hierarchy: ClassHierarchy,
    protocols: FxHashMap<Atom, Vec<(Atom, Type)>>,
    attributes: FxHashMap<Atom, Vec<(Atom, Type)>>,
}

impl SimpleClassHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler preloaded with the builtin skeleton every test needs:
    /// `object`, the numeric tower, and the container classes with their
    /// declared variances.
    pub fn with_builtins() -> Self {
        Self {
            hierarchy: pyrite_types::class_hierarchy::builtin_hierarchy(),
            ..Self::new()
        }
    }

    pub fn add_class(&mut self, name: &str, bases: &[&str]) -> Atom {
        use pyrite_types::OrderedTypes;
        let name = pyrite_common::intern(name);
        self.hierarchy.insert(name);
        for base in bases {
            self.hierarchy
                .connect(name, pyrite_common::intern(base), OrderedTypes::empty());
        }
        if bases.is_empty() {
            let names = pyrite_types::well_known();
            if name != names.object {
                self.hierarchy
                    .connect(name, names.object, OrderedTypes::empty());
            }
        }
        name
    }

    pub fn add_protocol(&mut self, name: &str, attributes: Vec<(&str, Type)>) -> Atom {
        let name = self.add_class(name, &[]);
        self.protocols.insert(
            name,
            attributes
                .into_iter()
                .map(|(attribute, ty)| (pyrite_common::intern(attribute), ty))
                .collect(),
        );
        name
    }

    pub fn add_attributes(&mut self, name: &str, attributes: Vec<(&str, Type)>) {
        let name = pyrite_common::intern(name);
        self.attributes.insert(
            name,
            attributes
                .into_iter()
                .map(|(attribute, ty)| (pyrite_common::intern(attribute), ty))
                .collect(),
        );
    }
}

impl ClassHandler for SimpleClassHandler {
    fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    fn is_protocol(&self, name: Atom) -> bool {
        self.protocols.contains_key(&name)
    }

    fn attributes(&self, receiver: &Type) -> Option<Vec<(Atom, Type)>> {
        let name = receiver.primitive_name()?;
        self.attributes
            .get(&name)
            .or_else(|| self.protocols.get(&name))
            .cloned()
    }

    fn protocol_attributes(&self, protocol: Atom) -> Option<Vec<(Atom, Type)>> {
        self.protocols.get(&protocol).cloned()
    }
}

//! Dotted qualified names.
//!
//! A `Reference` is the analyzer's name for modules (`os.path`), globals
//! (`os.path.sep`) and class members (`C.__init__`). Components are interned.

use crate::interner::{intern, resolve, Atom};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Reference {
    components: Vec<Atom>,
}

impl Reference {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a dotted name. `Reference::new("os.path")` has two components.
    pub fn new(name: &str) -> Self {
        if name.is_empty() {
            return Self::empty();
        }
        Self {
            components: name.split('.').map(intern).collect(),
        }
    }

    pub fn from_components(components: Vec<Atom>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Atom] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn head(&self) -> Option<Atom> {
        self.components.first().copied()
    }

    pub fn last(&self) -> Option<Atom> {
        self.components.last().copied()
    }

    /// `a.b.c`.combine(`d.e`) = `a.b.c.d.e`
    pub fn combine(&self, suffix: &Reference) -> Reference {
        let mut components = self.components.clone();
        components.extend_from_slice(&suffix.components);
        Reference { components }
    }

    /// Append a single component.
    pub fn with_component(&self, component: Atom) -> Reference {
        let mut components = self.components.clone();
        components.push(component);
        Reference { components }
    }

    /// The reference minus its last component; empty stays empty.
    pub fn prefix(&self) -> Reference {
        match self.components.split_last() {
            Some((_, rest)) => Reference {
                components: rest.to_vec(),
            },
            None => Self::empty(),
        }
    }

    pub fn is_prefix_of(&self, other: &Reference) -> bool {
        other.components.len() >= self.components.len()
            && other.components[..self.components.len()] == self.components[..]
    }

    /// Strip `prefix` from the front, if present.
    pub fn drop_prefix(&self, prefix: &Reference) -> Option<Reference> {
        if prefix.is_prefix_of(self) {
            Some(Reference {
                components: self.components[prefix.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&resolve(*component))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self)
    }
}

impl From<&str> for Reference {
    fn from(name: &str) -> Self {
        Reference::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_round_trips() {
        let r = Reference::new("os.path.sep");
        assert_eq!(r.len(), 3);
        assert_eq!(r.to_string(), "os.path.sep");
        assert_eq!(r.prefix().to_string(), "os.path");
    }

    #[test]
    fn prefix_relationships() {
        let module = Reference::new("os.path");
        let global = Reference::new("os.path.sep");
        assert!(module.is_prefix_of(&global));
        assert!(!global.is_prefix_of(&module));
        assert_eq!(global.drop_prefix(&module).unwrap().to_string(), "sep");
        assert_eq!(global.drop_prefix(&Reference::new("sys")), None);
    }

    #[test]
    fn combine_and_empty() {
        let empty = Reference::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.prefix(), empty);
        let combined = Reference::new("a.b").combine(&Reference::new("c"));
        assert_eq!(combined.to_string(), "a.b.c");
    }
}

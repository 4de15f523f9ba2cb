//! String interning.
//!
//! Identifiers and primitive class names recur constantly across type terms;
//! interning them makes equality and hashing O(1) and keeps the `Type` sum
//! `Copy`-friendly at the leaves.
//!
//! Two interners are provided:
//! - `Interner` - single-threaded, used inside one query
//! - `ShardedInterner` - concurrent, used for the process-wide name table
//!
//! The process-wide table is a global singleton behind an explicit
//! initializer (`global_interner`) with a test-only reset.

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

/// An interned string. Cheap to copy, compare, and hash.
///
/// Atoms are only meaningful relative to the interner that produced them;
/// all pyrite crates use the process-wide `global_interner`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom(pub u32);

impl Atom {
    pub const DUMMY: Atom = Atom(u32::MAX);
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(interner) = GLOBAL.get() {
            write!(f, "Atom({:?})", interner.resolve(*self))
        } else {
            write!(f, "Atom({})", self.0)
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(interner) = GLOBAL.get() {
            write!(f, "{}", interner.resolve(*self))
        } else {
            write!(f, "atom#{}", self.0)
        }
    }
}

/// Single-threaded interner.
#[derive(Default)]
pub struct Interner {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let arc: Arc<str> = Arc::from(s);
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(Arc::clone(&arc));
        self.map.insert(arc, atom);
        atom
    }

    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Concurrent interner. Lock-free lookups via sharded maps; the reverse
/// table is only locked for the rare miss path.
pub struct ShardedInterner {
    map: DashMap<Arc<str>, Atom, rustc_hash::FxBuildHasher>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardedInterner {
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(rustc_hash::FxBuildHasher),
            strings: RwLock::new(Vec::new()),
        }
    }

    pub fn intern(&self, s: &str) -> Atom {
        if let Some(atom) = self.map.get(s) {
            return *atom;
        }
        let arc: Arc<str> = Arc::from(s);
        // Entry-based insert so two racing writers agree on one atom.
        let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
        *self
            .map
            .entry(Arc::clone(&arc))
            .or_insert_with(|| {
                let atom = Atom(strings.len() as u32);
                strings.push(arc);
                atom
            })
            .value()
    }

    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&strings[atom.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.strings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: OnceCell<ShardedInterner> = OnceCell::new();

/// Process-wide name table. First call initializes it; `Atom`s produced by
/// different processes are not comparable.
pub fn global_interner() -> &'static ShardedInterner {
    GLOBAL.get_or_init(ShardedInterner::new)
}

/// Intern into the process-wide table.
pub fn intern(s: &str) -> Atom {
    global_interner().intern(s)
}

/// Resolve from the process-wide table.
pub fn resolve(atom: Atom) -> Arc<str> {
    global_interner().resolve(atom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner_dedupes() {
        let mut interner = Interner::new();
        let a = interner.intern("int");
        let b = interner.intern("str");
        let c = interner.intern("int");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a), "int");
        assert_eq!(interner.resolve(b), "str");
    }

    #[test]
    fn sharded_interner_dedupes_across_threads() {
        let interner = Arc::new(ShardedInterner::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = Arc::clone(&interner);
                std::thread::spawn(move || interner.intern("typing.Mapping"))
            })
            .collect();
        let atoms: Vec<Atom> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(atoms.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(interner.resolve(atoms[0]).as_ref(), "typing.Mapping");
    }
}

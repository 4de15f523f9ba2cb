//! External interfaces the environment stack consumes.
//!
//! The filesystem watcher and the source parser live outside the core; the
//! stack sees them only through these traits. `MemorySources` is the
//! in-memory implementation used by tests and embedders.

use pyrite_ast::{Node, Statement};
use pyrite_common::Reference;
use rustc_hash::FxHashMap;
use std::sync::RwLock;

/// One tracker-observed change to the file set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncrementalUpdate {
    /// A path the user's sources mention directly.
    NewExplicit(String),
    /// A path discovered through package structure.
    NewImplicit(String),
    Delete(Reference),
}

pub trait ModuleTracker {
    fn modules(&self) -> Vec<Reference>;
    fn contains(&self, module: &Reference) -> bool;
    /// Resolve a tracked path to the module it provides.
    fn module_for_path(&self, path: &str) -> Option<Reference>;
}

#[derive(Clone, Debug)]
pub enum ParseOutcome {
    Parsed(Vec<Node<Statement>>),
    SyntaxError(String),
    SystemError(String),
    Missing,
}

pub trait SourceParser {
    fn parse(&self, module: &Reference) -> ParseOutcome;
}

/// What a stack update produced: the modules whose parses changed, and the
/// ones that failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub reparsed: Vec<Reference>,
    pub syntax_errors: Vec<Reference>,
    pub system_errors: Vec<Reference>,
}

/// In-memory module set: pre-parsed statements keyed by module reference.
/// Serves as both tracker and parser for tests and embedders that already
/// hold ASTs.
#[derive(Default)]
pub struct MemorySources {
    modules: RwLock<FxHashMap<Reference, Vec<Node<Statement>>>>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_module(&self, module: &str, statements: Vec<Node<Statement>>) {
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(Reference::new(module), statements);
    }

    pub fn remove_module(&self, module: &str) {
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&Reference::new(module));
    }
}

impl ModuleTracker for MemorySources {
    fn modules(&self) -> Vec<Reference> {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    fn contains(&self, module: &Reference) -> bool {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(module)
    }

    fn module_for_path(&self, path: &str) -> Option<Reference> {
        // `a/b.py` provides `a.b`; stubs use the same stem.
        let stem = path
            .strip_suffix(".pyi")
            .or_else(|| path.strip_suffix(".py"))
            .unwrap_or(path);
        let module = Reference::new(&stem.replace('/', "."));
        self.contains(&module).then_some(module)
    }
}

impl SourceParser for MemorySources {
    fn parse(&self, module: &Reference) -> ParseOutcome {
        match self
            .modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(module)
        {
            Some(statements) => ParseOutcome::Parsed(statements.clone()),
            None => ParseOutcome::Missing,
        }
    }
}

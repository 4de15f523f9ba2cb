//! The pyrite environment stack.
//!
//! Ten layers, each a read-only view over the one below, memoized behind a
//! dependency-tracking table:
//!
//! 1. module tracker (external, consumed as a trait)
//! 2. `ast_environment` - module -> parsed source + wildcard exports
//! 3. `globals` - parsed source -> unannotated globals and class summaries
//! 4. `aliases` - resolved `X = Y` / `TypeAlias` declarations
//! 5. `aliases::empty_stubs` - `...`-only stub modules
//! 6. `class_environment` - the class hierarchy (C4)
//! 7. `class_environment::metadata` - successors, protocol and stub flags
//! 8. `class_environment::undecorated_functions` - pre-decorator signatures
//! 9. `attribute_resolution` - the attribute/order surface
//! 10. `annotated_globals` - global reference -> annotation + location
//!
//! An update enters at the tracker, reparses what changed, and walks the
//! dependency maps downward; every invalidated key is re-produced lazily on
//! its next read.

pub mod annotated_globals;
pub mod annotation_parser;
pub mod ast_environment;
pub mod attribute_resolution;
pub mod class_environment;
pub mod globals;
pub mod aliases;
pub mod interfaces;
pub mod lookup;
pub mod table;

pub use annotated_globals::AnnotatedGlobal;
pub use annotation_parser::Alias;
pub use attribute_resolution::AttributeResolution;
pub use interfaces::{
    IncrementalUpdate, MemorySources, ModuleTracker, ParseOutcome, SourceParser, UpdateResult,
};
pub use lookup::LookupTable;
pub use table::EnvironmentTable;

use pyrite_common::Reference;

#[cfg(test)]
mod tests;

/// The assembled stack. Layers borrow the tracker and parser; everything
/// else is owned.
pub struct Environments<'a> {
    pub ast: ast_environment::AstEnvironment<'a>,
    pub globals: globals::UnannotatedGlobalEnvironment,
    pub aliases: aliases::AliasEnvironment,
    pub empty_stubs: aliases::EmptyStubEnvironment,
    pub classes: class_environment::ClassEnvironment,
    pub annotated_globals: annotated_globals::AnnotatedGlobalEnvironment,
    /// When false, invalidated globals are re-produced at the end of
    /// `update` instead of on their next read.
    pub lazy_incremental: bool,
}

impl<'a> Environments<'a> {
    pub fn new(
        tracker: &'a dyn ModuleTracker,
        parser: &'a dyn SourceParser,
    ) -> Self {
        Self {
            ast: ast_environment::AstEnvironment::new(tracker, parser),
            globals: globals::UnannotatedGlobalEnvironment::new(),
            aliases: aliases::AliasEnvironment::new(),
            empty_stubs: aliases::EmptyStubEnvironment::new(),
            classes: class_environment::ClassEnvironment::new(),
            annotated_globals: annotated_globals::AnnotatedGlobalEnvironment::new(),
            lazy_incremental: true,
        }
    }

    /// The C8/C6 surface over this stack. Rebuilt per query generation; the
    /// underlying tables memoize across calls.
    pub fn resolution(&self) -> AttributeResolution<'_> {
        AttributeResolution::new(self)
    }

    /// Apply a file-set change: reparse what moved, then walk invalidation
    /// down the stack. Every invalidated key's next read reflects the
    /// post-update inputs.
    pub fn update(&mut self, updates: Vec<IncrementalUpdate>) -> UpdateResult {
        self.update_with_token(updates, &pyrite_common::CancellationToken::new())
    }

    /// `update` with a cooperative cancellation check between batches. A
    /// cancelled update stops reparsing but still invalidates everything it
    /// already touched, so no stale value survives.
    pub fn update_with_token(
        &mut self,
        updates: Vec<IncrementalUpdate>,
        token: &pyrite_common::CancellationToken,
    ) -> UpdateResult {
        let mut batched = Vec::with_capacity(updates.len());
        for update in updates {
            if token.is_cancelled() {
                break;
            }
            batched.push(update);
        }
        let result = self.ast.update(&batched);
        let invalidated_modules: Vec<Reference> = result.reparsed.clone();
        let global_triggers = self.globals.invalidate_modules(&invalidated_modules);
        self.aliases.invalidate(&global_triggers);
        self.empty_stubs.invalidate_modules(&invalidated_modules);
        self.classes.invalidate(&global_triggers);
        let invalidated_globals = self.annotated_globals.invalidate(&global_triggers);
        if !self.lazy_incremental {
            for key in &invalidated_globals {
                let _ = self.annotated_globals.get_global(
                    &self.ast,
                    &self.globals,
                    &self.aliases,
                    key,
                    None,
                );
            }
        }
        result
    }
}

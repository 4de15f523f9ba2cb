//! Common types and utilities for the pyrite type-inference core.
//!
//! This crate provides foundational types used across all pyrite crates:
//! - String interning (`Atom`, `Interner`, `ShardedInterner`)
//! - Dotted names (`Reference`)
//! - Source locations (`Location`, `Position`)
//! - Cooperative cancellation (`CancellationToken`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{global_interner, intern, resolve, Atom, Interner, ShardedInterner};

// Dotted qualified names (module paths, attribute chains)
pub mod reference;
pub use reference::Reference;

// Source location tracking (line/column ranges)
pub mod location;
pub use location::{Location, Position};

// Cooperative cancellation between batches of work
pub mod cancellation;
pub use cancellation::CancellationToken;

//! Source locations.
//!
//! The AST carries `(start, stop)` line/column ranges. Two values are
//! distinguished: `Location::any()` compares equal to every location, and
//! `Location::synthetic()` marks nodes fabricated by the resolver (synthesized
//! overloads, decorator expansions) which lookup tables must skip.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A line/column position, 1-indexed lines, 0-indexed columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    pub stop: Position,
}

const ANY_MARKER: u32 = u32::MAX;
const SYNTHETIC_MARKER: u32 = u32::MAX - 1;

impl Location {
    pub fn new(start: Position, stop: Position) -> Self {
        Self { start, stop }
    }

    /// Wildcard location; equal to everything.
    pub fn any() -> Self {
        Self {
            start: Position::new(ANY_MARKER, ANY_MARKER),
            stop: Position::new(ANY_MARKER, ANY_MARKER),
        }
    }

    /// Marks resolver-fabricated nodes. Lookup tables skip these.
    pub fn synthetic() -> Self {
        Self {
            start: Position::new(SYNTHETIC_MARKER, SYNTHETIC_MARKER),
            stop: Position::new(SYNTHETIC_MARKER, SYNTHETIC_MARKER),
        }
    }

    pub fn is_any(&self) -> bool {
        self.start.line == ANY_MARKER
    }

    pub fn is_synthetic(&self) -> bool {
        self.start.line == SYNTHETIC_MARKER
    }

    /// Whether `position` falls inside this range.
    pub fn contains(&self, position: Position) -> bool {
        !self.is_any() && !self.is_synthetic() && self.start <= position && position < self.stop
    }

    /// Span width used to prefer the innermost enclosing range.
    pub fn width(&self) -> (u32, u32) {
        (
            self.stop.line - self.start.line,
            self.stop.column.wrapping_sub(self.start.column),
        )
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        if self.is_any() || other.is_any() {
            return true;
        }
        self.start == other.start && self.stop == other.stop
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.is_any() || other.is_any() {
            return Ordering::Equal;
        }
        (self.start, self.stop).cmp(&(other.start, other.stop))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str("*:*");
        }
        if self.is_synthetic() {
            return f.write_str("<synthetic>");
        }
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.stop.line, self.stop.column
        )
    }
}

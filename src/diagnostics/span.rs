//! Source location tracking.
//!
//! `SourceLocation` is attached to every AST node produced by the lexer and
//! parser and is carried through evaluation so that runtime errors can point
//! back at the offending expression.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based line/column pair identifying a point in the original source
/// text, or the sentinel "not available" location used for synthetic nodes
/// (e.g. expressions constructed internally by an intrinsic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line number, or a non-positive value to mean "unavailable".
    pub line: i64,
    /// 1-based column number, or a non-positive value to mean "unavailable".
    pub column: i64,
}

impl SourceLocation {
    /// Creates a new source location.
    pub fn new(line: i64, column: i64) -> Self {
        Self { line, column }
    }

    /// The sentinel location used when no real position is known.
    pub fn unknown() -> Self {
        Self { line: -1, column: -1 }
    }

    /// Whether this location refers to a real position in source text.
    pub fn is_known(&self) -> bool {
        self.line > 0 && self.column > 0
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "(SourceLocation {} {})", self.line, self.column)
        } else {
            write!(f, "(SourceLocation N/A)")
        }
    }
}

//! Error handling and source location tracking for ExprScript.
//!
//! This module is the crate's single point of contact with the outside
//! world for failure reporting: every fatal condition anywhere in the
//! lexer, parser, evaluator, or intrinsics is expressed as an [`Error`] and
//! surfaced with the exact diagnostic-line shape described by the language
//! contract: `[Kind Error (SourceLocation L C)] message`.

mod error;
mod span;

pub use error::{Error, ErrorKind, Result};
pub use span::SourceLocation;

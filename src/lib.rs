#![warn(missing_docs, rust_2018_idioms)]

//! # ExprScript
//!
//! An interpreter for ExprScript: a small language with first-class
//! closures, first-class multi-shot continuations (`.call/cc`), exact
//! rational arithmetic, mixed lexical/dynamic scoping (a name's first
//! character's case decides its discipline), and an instrumented
//! mark-sweep-compact heap.
//!
//! ## Pipeline
//!
//! 1. [`lexer`] tokenizes source text.
//! 2. [`parser`] builds an [`ast::Expr`] tree.
//! 3. [`evaluator::State`] drives a small-step evaluation loop over an
//!    explicit stack of [`evaluator::Layer`]s — the stack itself is the
//!    continuation `.call/cc` captures.
//! 4. [`stdlib`] supplies every intrinsic (string operations, I/O,
//!    `.eval`, `.reg`, `.py`, `.call/cc`'s argument checks aside).
//!
//! [`runtime`] ties the pipeline together for the [`cli`] front end and for
//! the `.eval` intrinsic, which evaluates a fresh program against a fresh
//! heap rather than recursing into the live one.

/// The abstract syntax tree produced by the lexer and parser.
pub mod ast;
/// Command-line argument parsing and program entry points.
pub mod cli;
/// Error types and source location tracking.
pub mod diagnostics;
/// Lexical and dynamic variable binding.
pub mod environment;
/// The small-step evaluator, its stack of layers, and its garbage collector.
pub mod evaluator;
/// Tokenization.
pub mod lexer;
/// Exact rational arithmetic.
pub mod numeric;
/// Recursive-descent parsing from tokens to [`ast::Expr`].
pub mod parser;
/// Wires the lexer, parser, and evaluator together into complete runs.
pub mod runtime;
/// Intrinsic operations reachable from ExprScript source as `.name` calls.
pub mod stdlib;
/// Runtime values and the heap they live on.
pub mod value;

pub use diagnostics::{Error, ErrorKind, Result, SourceLocation};
pub use evaluator::{EvalConfig, State};
pub use runtime::{eval_fresh, run_source, RunOutcome};
pub use value::Value;

/// The crate's version, as declared in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_a_trivial_expression() {
        let outcome = run_source("(.+ 1 2)", EvalConfig::default()).unwrap();
        assert_eq!(outcome.result.to_string(), "3");
    }
}

//! The abstract syntax tree produced by the lexer and parser.
//!
//! Every node is wrapped in [`Spanned`] so the evaluator can attach a source
//! location to any runtime error without threading a separate position
//! argument through every dispatch arm.

use crate::diagnostics::SourceLocation;
use crate::numeric::Rational;
use std::rc::Rc;

/// A node paired with the source location it started at.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    /// The wrapped payload.
    pub node: T,
    /// Where `node` begins in the original source text.
    pub span: SourceLocation,
}

impl<T> Spanned<T> {
    /// Wraps `node` with `span`.
    pub fn new(node: T, span: SourceLocation) -> Self {
        Self { node, span }
    }
}

/// A single AST node, shared by `Rc` since the same lambda body is
/// evaluated from many call sites and captured by many closures.
pub type Expr = Rc<Spanned<Node>>;

/// A `(name, expr)` binding as it appears in a `letrec` form.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The bound name (lexical or dynamic, per its leading character).
    pub name: String,
    /// The initializer expression, evaluated with all sibling bindings
    /// already visible (enabling mutual recursion).
    pub expr: Expr,
}

/// The shape of one `lambda` literal: its parameter list and body.
#[derive(Debug, Clone)]
pub struct Lambda {
    /// Ordered formal parameter names.
    pub params: Vec<String>,
    /// The body expression, evaluated in a frame that binds `params`.
    pub body: Expr,
}

/// A syntax node. `Number`/`String` are literals; `Intrinsic` appears only
/// in callee position; everything else is structural.
#[derive(Debug, Clone)]
pub enum Node {
    /// An already-normalised rational literal.
    Number(Rational),
    /// A string literal with escapes already decoded.
    String(String),
    /// The literal name of a built-in operation; valid only as a call's
    /// callee, never resolved as a variable.
    Intrinsic(String),
    /// A variable reference, classified lexical/dynamic by its first
    /// character's case.
    Variable(String),
    /// A `lambda` literal.
    Lambda(Rc<Lambda>),
    /// A `letrec` form: an ordered list of mutually-visible bindings and a
    /// body evaluated with them all in scope.
    Letrec(Vec<Binding>, Expr),
    /// `if cond then conseq else alt`.
    If(Expr, Expr, Expr),
    /// A call: `callee` is either an `Intrinsic` node or an expression
    /// evaluating to a `Closure`/`Continuation`.
    Call(Expr, Vec<Expr>),
    /// A non-empty sequence of expressions; value is the last one's.
    Sequence(Vec<Expr>),
    /// Tests whether `name` is bound: for a lexical name, within the
    /// captured environment of the evaluated closure expression; for a
    /// dynamic name, within the live stack (the closure expression is not
    /// present and not evaluated).
    Query(String, Option<Expr>),
    /// Reads the lexical binding `name` out of the captured environment of
    /// the evaluated closure expression.
    Access(String, Expr),
}

impl Node {
    /// Whether `name` is classified as a dynamically-scoped variable: its
    /// first character is an uppercase ASCII letter.
    pub fn is_dynamic_name(name: &str) -> bool {
        name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    }

    /// Whether `name` is classified as a lexically-scoped variable.
    pub fn is_lexical_name(name: &str) -> bool {
        !Self::is_dynamic_name(name)
    }
}

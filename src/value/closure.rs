//! The closure payload.

use crate::ast::Lambda;
use crate::diagnostics::SourceLocation;
use crate::environment::Binding;
use std::cell::RefCell;
use std::rc::Rc;

/// The heap payload of a `Closure` value.
///
/// `env` holds only lexical bindings, filtered at capture time (see
/// [`crate::environment::capture_lexical`]); dynamic-named bindings never
/// appear here, by construction. It is wrapped in a `RefCell` purely so
/// the garbage collector's relocation pass can rewrite the `StoreIndex`
/// values it holds after a compaction, without caring whether this
/// `ClosureData` is uniquely owned or shared (via `Rc`) by several live
/// `Value`s that all refer to the same closure.
#[derive(Debug)]
pub struct ClosureData {
    /// The captured lexical environment.
    pub env: RefCell<Vec<Binding>>,
    /// The lambda literal this closure was created from.
    pub fun: Rc<Lambda>,
    /// Where the enclosing `lambda` expression was evaluated, used for
    /// canonical display (`<closure evaluated at ...>`).
    pub defined_at: SourceLocation,
}

impl ClosureData {
    /// Constructs a new closure payload.
    pub fn new(env: Vec<Binding>, fun: Rc<Lambda>, defined_at: SourceLocation) -> Self {
        Self {
            env: RefCell::new(env),
            fun,
            defined_at,
        }
    }
}

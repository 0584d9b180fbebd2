//! The evaluation stack element.
//!
//! A [`Layer`] represents one in-progress expression evaluation. The stack
//! of layers *is* the continuation: capturing `call/cc` deep-copies it, and
//! invoking a captured continuation replaces the live stack with another
//! deep copy.

use crate::ast::Expr;
use crate::environment::Env;
use crate::value::{StoreIndex, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// The small fixed set of working slots a layer accumulates while its
/// expression is mid-evaluation. Which fields are meaningful depends on
/// the node kind the owning layer is evaluating.
#[derive(Debug, Clone, Default)]
pub struct Local {
    /// The callee value, once evaluated (`Call`).
    pub callee: Option<Value>,
    /// Evaluated argument values gathered so far, in order (`Call`).
    pub args: Vec<Value>,
    /// Store indices allocated for `letrec` bindings, one per binding, in
    /// declaration order (`Letrec`).
    pub letrec_slots: Vec<StoreIndex>,
}

/// One element of the evaluation stack.
#[derive(Debug, Clone)]
pub struct Layer {
    /// The lexical environment in effect for this layer, shared across
    /// every intermediate layer of the same frame.
    pub env: Env,
    /// The expression this layer is evaluating. `None` only for the
    /// bottom sentinel layer, which marks successful completion.
    pub expr: Option<Expr>,
    /// The step counter driving this layer's internal state machine.
    pub pc: usize,
    /// Working storage for partially-evaluated sub-results.
    pub local: Local,
    /// Marks either the bottom sentinel or a layer that began a user call;
    /// frame layers bound dynamic-scope lookups and GC rooting.
    pub frame: bool,
    /// Set when this layer occupies the tail position of its enclosing
    /// frame, enabling the evaluator to collapse that frame instead of
    /// growing the stack on the next call.
    pub tail: bool,
}

impl Layer {
    /// Builds a fresh, non-frame, non-tail layer evaluating `expr` with
    /// `env` at `pc = 0`.
    pub fn new(expr: Expr, env: Env) -> Self {
        Self {
            env,
            expr: Some(expr),
            pc: 0,
            local: Local::default(),
            frame: false,
            tail: false,
        }
    }

    /// Builds a frame-starting layer (the body of a closure call, or the
    /// bottom sentinel when `expr` is omitted by the caller).
    pub fn new_frame(expr: Expr, env: Env) -> Self {
        let mut layer = Self::new(expr, env);
        layer.frame = true;
        layer
    }

    /// The bottom sentinel layer: no expression, always a frame.
    pub fn sentinel(env: Env) -> Self {
        Self {
            env,
            expr: None,
            pc: 0,
            local: Local::default(),
            frame: true,
            tail: false,
        }
    }

    /// Marks this layer as occupying tail position.
    pub fn with_tail(mut self, tail: bool) -> Self {
        self.tail = tail;
        self
    }
}

/// Deep-copies an entire stack of layers for `.call/cc` capture and for
/// continuation invocation.
///
/// A plain `Vec<Layer>::clone()` would share each layer's `env` `Rc`
/// with the live stack (since `Rc::clone` is shallow), which would let a
/// `letrec` push in the captured continuation mutate the live binding
/// list, or vice versa. This function instead clones every distinct `Env`
/// exactly once, keyed by its original `Rc` pointer identity, so layers
/// that shared a frame's environment before the copy still share their
/// (independent, freshly allocated) environment after it.
pub fn deep_clone_stack(stack: &[Layer]) -> Vec<Layer> {
    let mut seen: HashMap<*const std::cell::RefCell<Vec<(String, StoreIndex)>>, Env> =
        HashMap::new();
    stack
        .iter()
        .map(|layer| {
            let key = Rc::as_ptr(&layer.env);
            let env = seen
                .entry(key)
                .or_insert_with(|| Rc::new(std::cell::RefCell::new(layer.env.borrow().clone())))
                .clone();
            Layer {
                env,
                expr: layer.expr.clone(),
                pc: layer.pc,
                local: layer.local.clone(),
                frame: layer.frame,
                tail: layer.tail,
            }
        })
        .collect()
}

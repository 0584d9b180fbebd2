//! The lexical environment representation shared by a frame's layers.
//!
//! An environment is an ordered list of `(name, location)` pairs, newest
//! binding last, looked up by a linear right-to-left scan. It is shared
//! (via `Rc<RefCell<_>>`) across every intermediate layer belonging to the
//! same frame, since `letrec` needs to push bindings into it that remain
//! visible to sibling layers until the frame's layer itself pops.

use crate::ast::Node;
use crate::value::StoreIndex;
use std::cell::RefCell;
use std::rc::Rc;

/// One `(name, location)` binding.
pub type Binding = (String, StoreIndex);

/// A shared, mutable lexical environment.
pub type Env = Rc<RefCell<Vec<Binding>>>;

/// Creates a fresh, empty environment.
pub fn new_env() -> Env {
    Rc::new(RefCell::new(Vec::new()))
}

/// Creates an environment that starts out as a copy of an existing
/// binding list (used when a closure's captured `env` seeds a new frame).
pub fn from_bindings(bindings: Vec<Binding>) -> Env {
    Rc::new(RefCell::new(bindings))
}

/// Appends a new binding, shadowing any earlier binding of the same name.
pub fn push(env: &Env, name: String, location: StoreIndex) {
    env.borrow_mut().push((name, location));
}

/// Looks up `name` by scanning newest-first; returns the first match.
pub fn lookup(env: &Env, name: &str) -> Option<StoreIndex> {
    env.borrow()
        .iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, loc)| *loc)
}

/// Removes the last `count` bindings. Used by `letrec` to retract its
/// bindings from the shared frame env once its body has produced a result,
/// since the env outlives the `letrec` layer itself.
pub fn pop_n(env: &Env, count: usize) {
    let mut env = env.borrow_mut();
    let new_len = env.len().saturating_sub(count);
    env.truncate(new_len);
}

/// Filters `env` down to lexical bindings only, in their existing order,
/// for capture into a `Closure`. Dynamic-named bindings are never carried
/// into captured state.
pub fn capture_lexical(env: &Env) -> Vec<Binding> {
    env.borrow()
        .iter()
        .filter(|(name, _)| Node::is_lexical_name(name))
        .cloned()
        .collect()
}

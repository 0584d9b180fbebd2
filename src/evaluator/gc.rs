//! The mark–sweep–compact collector.
//!
//! Roots are the live evaluation stack (every layer's environment and
//! working locals) plus the single `result` register. Marking follows
//! `Closure.env` and `Continuation.stack` locations recursively. Sweep
//! drops unmarked cells while preserving the relative order of survivors;
//! relocation then rewrites every surviving `StoreIndex` so it again
//! points into the compacted store.

use crate::environment::{Binding, Env};
use crate::evaluator::layer::{Layer, Local};
use crate::value::{ClosureData, ContinuationData, Store, StoreIndex, Value, ValueKind};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// What happened during one collection cycle, for diagnostic logging.
#[derive(Debug, Clone, Copy)]
pub struct GcStats {
    /// Live cell count before the cycle.
    pub before: usize,
    /// Live cell count after the cycle.
    pub after: usize,
}

/// Runs one full mark-sweep-compact cycle over `store`, rooted at `stack`
/// and `result`. Returns statistics for diagnostic logging.
pub fn collect(stack: &mut [Layer], store: &mut Store, result: &mut Value) -> GcStats {
    let before = store.len();
    let marked = mark(stack, store, result);
    let mapping = sweep_and_compact(store, &marked);
    relocate(stack, store, result, &mapping);
    let after = store.len();
    GcStats { before, after }
}

fn mark(stack: &[Layer], store: &Store, result: &Value) -> HashSet<StoreIndex> {
    let mut marked = HashSet::new();
    for layer in stack {
        mark_env(&layer.env, store, &mut marked);
        mark_local(&layer.local, store, &mut marked);
    }
    mark_value(result, store, &mut marked);
    marked
}

fn mark_env(env: &Env, store: &Store, marked: &mut HashSet<StoreIndex>) {
    for (_, loc) in env.borrow().iter() {
        mark_location(*loc, store, marked);
    }
}

fn mark_local(local: &Local, store: &Store, marked: &mut HashSet<StoreIndex>) {
    if let Some(callee) = &local.callee {
        mark_value(callee, store, marked);
    }
    for arg in &local.args {
        mark_value(arg, store, marked);
    }
    for loc in &local.letrec_slots {
        mark_location(*loc, store, marked);
    }
}

fn mark_location(index: StoreIndex, store: &Store, marked: &mut HashSet<StoreIndex>) {
    if !marked.insert(index) {
        return;
    }
    mark_contents(store.get(index), store, marked);
}

fn mark_value(value: &Value, store: &Store, marked: &mut HashSet<StoreIndex>) {
    if let Some(loc) = value.location() {
        mark_location(loc, store, marked);
    } else {
        mark_contents(value, store, marked);
    }
}

fn mark_contents(value: &Value, store: &Store, marked: &mut HashSet<StoreIndex>) {
    match value.kind() {
        ValueKind::Closure(c) => {
            for (_, loc) in c.env.borrow().iter() {
                mark_location(*loc, store, marked);
            }
        }
        ValueKind::Continuation(c) => {
            for layer in c.stack.borrow().iter() {
                mark_env(&layer.env, store, marked);
                mark_local(&layer.local, store, marked);
            }
        }
        ValueKind::Void | ValueKind::Number(_) | ValueKind::String(_) => {}
    }
}

/// Compacts `store` to contain only cells named in `marked`, preserving
/// relative order, and returns the old-index → new-index mapping for
/// every surviving cell.
fn sweep_and_compact(store: &mut Store, marked: &HashSet<StoreIndex>) -> HashMap<StoreIndex, StoreIndex> {
    let mut mapping = HashMap::new();
    let mut compacted = Vec::with_capacity(marked.len());
    for (old_index, cell) in store.live_slice().iter().enumerate() {
        if marked.contains(&old_index) {
            let new_index = compacted.len();
            mapping.insert(old_index, new_index);
            let mut cell = cell.clone();
            cell.set_location(new_index);
            compacted.push(cell);
        }
    }
    store.replace_live(compacted);
    mapping
}

fn relocate(
    stack: &mut [Layer],
    store: &mut Store,
    result: &mut Value,
    mapping: &HashMap<StoreIndex, StoreIndex>,
) {
    let mut visited_envs: HashSet<*const RefCell<Vec<Binding>>> = HashSet::new();
    let mut visited_closures: HashSet<*const ClosureData> = HashSet::new();
    let mut visited_continuations: HashSet<*const ContinuationData> = HashSet::new();

    for layer in stack.iter_mut() {
        relocate_env(&layer.env, mapping, &mut visited_envs);
        relocate_local(
            &mut layer.local,
            mapping,
            &mut visited_envs,
            &mut visited_closures,
            &mut visited_continuations,
        );
    }
    relocate_value_and_contents(
        result,
        mapping,
        &mut visited_envs,
        &mut visited_closures,
        &mut visited_continuations,
    );

    // Store cells already have their own `location` fixed up by
    // `sweep_and_compact`; only their Rc-shared contents need rewriting.
    for cell in store.live_slice_mut() {
        relocate_contents(
            cell,
            mapping,
            &mut visited_envs,
            &mut visited_closures,
            &mut visited_continuations,
        );
    }
}

fn relocate_env(
    env: &Env,
    mapping: &HashMap<StoreIndex, StoreIndex>,
    visited: &mut HashSet<*const RefCell<Vec<Binding>>>,
) {
    let ptr = Rc::as_ptr(env);
    if !visited.insert(ptr) {
        return;
    }
    for (_, loc) in env.borrow_mut().iter_mut() {
        if let Some(&new_index) = mapping.get(loc) {
            *loc = new_index;
        }
    }
}

fn relocate_local(
    local: &mut Local,
    mapping: &HashMap<StoreIndex, StoreIndex>,
    visited_envs: &mut HashSet<*const RefCell<Vec<Binding>>>,
    visited_closures: &mut HashSet<*const ClosureData>,
    visited_continuations: &mut HashSet<*const ContinuationData>,
) {
    if let Some(callee) = &mut local.callee {
        relocate_value_and_contents(callee, mapping, visited_envs, visited_closures, visited_continuations);
    }
    for arg in &mut local.args {
        relocate_value_and_contents(arg, mapping, visited_envs, visited_closures, visited_continuations);
    }
    for loc in &mut local.letrec_slots {
        if let Some(&new_index) = mapping.get(loc) {
            *loc = new_index;
        }
    }
}

/// Rewrites `value`'s own `location` back-pointer (if it has one, since it
/// hasn't been re-stamped by `sweep_and_compact` the way store cells have
/// been) and then its contents.
fn relocate_value_and_contents(
    value: &mut Value,
    mapping: &HashMap<StoreIndex, StoreIndex>,
    visited_envs: &mut HashSet<*const RefCell<Vec<Binding>>>,
    visited_closures: &mut HashSet<*const ClosureData>,
    visited_continuations: &mut HashSet<*const ContinuationData>,
) {
    if let Some(old_index) = value.location() {
        if let Some(&new_index) = mapping.get(&old_index) {
            value.set_location(new_index);
        }
    }
    relocate_contents(value, mapping, visited_envs, visited_closures, visited_continuations);
}

/// Rewrites the `StoreIndex` values reachable through `value`'s payload,
/// without touching `value`'s own `location`. Used both for floating
/// values (after their own location has separately been fixed up) and for
/// store cells (whose location was already fixed during compaction).
fn relocate_contents(
    value: &Value,
    mapping: &HashMap<StoreIndex, StoreIndex>,
    visited_envs: &mut HashSet<*const RefCell<Vec<Binding>>>,
    visited_closures: &mut HashSet<*const ClosureData>,
    visited_continuations: &mut HashSet<*const ContinuationData>,
) {
    match value.kind() {
        ValueKind::Closure(c) => {
            let ptr = Rc::as_ptr(c);
            if visited_closures.insert(ptr) {
                for (_, loc) in c.env.borrow_mut().iter_mut() {
                    if let Some(&new_index) = mapping.get(loc) {
                        *loc = new_index;
                    }
                }
            }
        }
        ValueKind::Continuation(c) => {
            let ptr = Rc::as_ptr(c);
            if visited_continuations.insert(ptr) {
                for layer in c.stack.borrow_mut().iter_mut() {
                    relocate_env(&layer.env, mapping, visited_envs);
                    relocate_local(&mut layer.local, mapping, visited_envs, visited_closures, visited_continuations);
                }
            }
        }
        ValueKind::Void | ValueKind::Number(_) | ValueKind::String(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::new_env;
    use crate::numeric::Rational;

    #[test]
    fn sweep_drops_unreachable_cells_and_preserves_order() {
        let mut store = Store::with_capacity(8);
        let a = store.put(Value::number(Rational::from_integer(1)));
        let _garbage = store.put(Value::number(Rational::from_integer(2)));
        let c = store.put(Value::number(Rational::from_integer(3)));

        let env = new_env();
        env.borrow_mut().push(("x".to_string(), a));
        env.borrow_mut().push(("y".to_string(), c));
        let mut stack = vec![Layer::new_frame(
            std::rc::Rc::new(crate::ast::Spanned::new(
                crate::ast::Node::Number(Rational::ZERO),
                crate::diagnostics::SourceLocation::unknown(),
            )),
            env.clone(),
        )];
        let mut result = Value::void();

        let stats = collect(&mut stack, &mut store, &mut result);
        assert_eq!(stats.before, 3);
        assert_eq!(stats.after, 2);

        let new_a = crate::environment::lookup(&env, "x").unwrap();
        let new_c = crate::environment::lookup(&env, "y").unwrap();
        assert_eq!(store.get(new_a).as_number(crate::diagnostics::SourceLocation::unknown()).unwrap(), Rational::from_integer(1));
        assert_eq!(store.get(new_c).as_number(crate::diagnostics::SourceLocation::unknown()).unwrap(), Rational::from_integer(3));
    }
}

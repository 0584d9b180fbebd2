//! The index-addressed heap of runtime values.
//!
//! The store is the single owner of every heap-residing [`Value`]; every
//! other place in the evaluator refers to them by [`StoreIndex`]. Bump
//! allocation keeps `new` O(1); the garbage collector (see
//! [`crate::evaluator::gc`]) is the only code that ever shrinks `end` or
//! relocates indices.

use super::Value;

/// An integer naming a live slot in a [`Store`]. The only form of reference
/// between heap-allocated values.
pub type StoreIndex = usize;

/// A growable vector of value slots plus an `end` cursor marking the first
/// dead (unused) slot. Physical capacity may exceed `end`; cells at or past
/// `end` are garbage from a previous compaction and are never read.
#[derive(Debug, Default)]
pub struct Store {
    cells: Vec<Value>,
    end: usize,
}

impl Store {
    /// Creates an empty store with room for `capacity` cells before the
    /// first reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
            end: 0,
        }
    }

    /// The number of live cells.
    pub fn len(&self) -> usize {
        self.end
    }

    /// Whether the store holds no live cells.
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// The physical capacity of the backing vector (not merely `len()`).
    pub fn capacity(&self) -> usize {
        self.cells.capacity()
    }

    /// Occupancy as a fraction of physical capacity, used by the GC trigger.
    pub fn occupancy(&self) -> f64 {
        if self.cells.capacity() == 0 {
            1.0
        } else {
            self.end as f64 / self.cells.capacity() as f64
        }
    }

    /// Allocates `value` at the next free index, stamping its `location`
    /// back-pointer, and returns that index. If `value` already carries a
    /// location (it was already resident somewhere — the same value passed
    /// through a call unchanged), that existing index is returned instead
    /// and no new cell is allocated, matching the "pass by reference for
    /// heap-backed arguments" rule.
    pub fn put(&mut self, mut value: Value) -> StoreIndex {
        if let Some(existing) = value.location() {
            return existing;
        }
        let index = self.end;
        value.set_location(index);
        if index == self.cells.len() {
            self.cells.push(value);
        } else {
            self.cells[index] = value;
        }
        self.end += 1;
        index
    }

    /// Reads the value at `index`. Panics if `index >= end`: every caller
    /// holds a `StoreIndex` only through a live reference chain rooted at
    /// the stack or result register, so an out-of-range index is an
    /// internal bug, not a recoverable condition.
    pub fn get(&self, index: StoreIndex) -> &Value {
        assert!(index < self.end, "dereferenced a dead store index");
        &self.cells[index]
    }

    /// Overwrites the value at `index` in place, preserving its location.
    pub fn set(&mut self, index: StoreIndex, mut value: Value) {
        assert!(index < self.end, "wrote to a dead store index");
        value.set_location(index);
        self.cells[index] = value;
    }

    /// Direct access to the live prefix, for the GC's mark/sweep passes.
    pub(crate) fn live_slice(&self) -> &[Value] {
        &self.cells[..self.end]
    }

    /// Mutable access to the live prefix, for the GC's relocation pass.
    pub(crate) fn live_slice_mut(&mut self) -> &mut [Value] {
        &mut self.cells[..self.end]
    }

    /// Replaces the live prefix after a sweep-and-compact pass, and resets
    /// `end` to the new length.
    pub(crate) fn replace_live(&mut self, compacted: Vec<Value>) {
        self.end = compacted.len();
        self.cells = compacted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Rational;

    #[test]
    fn put_assigns_sequential_indices() {
        let mut store = Store::with_capacity(4);
        let a = store.put(Value::number(Rational::from_integer(1)));
        let b = store.put(Value::number(Rational::from_integer(2)));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn put_reuses_an_existing_location() {
        let mut store = Store::with_capacity(4);
        let idx = store.put(Value::number(Rational::from_integer(1)));
        let already_placed = store.get(idx).clone();
        let idx2 = store.put(already_placed);
        assert_eq!(idx, idx2);
        assert_eq!(store.len(), 1);
    }
}

//! The continuation payload.

use crate::diagnostics::SourceLocation;
use crate::evaluator::Layer;
use std::cell::RefCell;

/// The heap payload of a `Continuation` value: an immutable-from-the-
/// outside snapshot of the evaluation stack at the moment `.call/cc` was
/// invoked.
///
/// The snapshot is never mutated by ordinary evaluation and never aliases
/// the live stack — every layer, and every layer's `env`, was
/// independently deep-copied when the snapshot was taken (see
/// [`crate::evaluator::layer::deep_clone_stack`]) and is deep-copied again
/// every time the continuation is invoked, which is what makes
/// continuations multi-shot. The `RefCell` exists solely so the garbage
/// collector's relocation pass can rewrite `StoreIndex` values after a
/// compaction.
#[derive(Debug)]
pub struct ContinuationData {
    /// The captured stack, bottom-first, identical in shape to a live
    /// evaluator stack.
    pub stack: RefCell<Vec<Layer>>,
    /// Where `.call/cc` was invoked, used for canonical display.
    pub captured_at: SourceLocation,
}

impl ContinuationData {
    /// Constructs a new continuation payload.
    pub fn new(stack: Vec<Layer>, captured_at: SourceLocation) -> Self {
        Self {
            stack: RefCell::new(stack),
            captured_at,
        }
    }
}

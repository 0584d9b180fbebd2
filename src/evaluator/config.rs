//! Evaluator configuration.

/// Knobs controlling evaluator behavior that the language contract leaves
/// as implementation choices. `EvalConfig::default()` reproduces the
/// original implementation's fixed behavior: unbounded steps, an 80%
/// occupancy GC trigger, and tail calls always elided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalConfig {
    /// Store occupancy fraction (live cells / physical capacity) above
    /// which a GC cycle runs before the next step.
    pub gc_high_watermark: f64,
    /// Physical capacity the store is created with.
    pub initial_store_capacity: usize,
    /// An optional cap on the number of evaluator steps a single
    /// evaluation may take before failing with `Error::timeout`. Step
    /// count is deterministic across machines, unlike a wall-clock
    /// budget, which is why this crate measures steps rather than time.
    pub step_budget: Option<u64>,
    /// Whether a `Call` in tail position collapses its enclosing frame
    /// before pushing the new one, bounding stack growth in
    /// tail-recursive programs. Semantically invisible except for stack
    /// depth and GC retention; exposed so both behaviors stay testable.
    pub enable_tail_call_elision: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            gc_high_watermark: 0.8,
            initial_store_capacity: 64,
            step_budget: None,
            enable_tail_call_elision: true,
        }
    }
}

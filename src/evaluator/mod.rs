//! The small-step evaluator: the stack of layers, the step driver, and the
//! garbage collector that reaches through it.

pub mod config;
pub mod gc;
pub mod layer;
mod state;

pub use config::EvalConfig;
pub use layer::{deep_clone_stack, Layer, Local};
pub use state::{OutputPayload, State};

//! The `.py`-style foreign-function escape hatch.
//!
//! The original implementation lets a program call into pre-registered
//! host (Python) functions by name via `.py`. That escape hatch is out of
//! core scope here, but the crate keeps its *shape*: a name-keyed registry
//! of native callbacks with `Number`/`String` marshalling, so an embedder
//! can wire up host functions the same way the original embeds Python
//! callables. This crate registers none itself.

use crate::diagnostics::{Error, Result, SourceLocation};
use std::collections::HashMap;

/// A marshalled argument or return value crossing the host boundary.
/// Closures and continuations cannot cross it, matching the original's
/// restriction to `Number`/`String` payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum HostArg {
    /// A rational number.
    Number(crate::numeric::Rational),
    /// A string.
    String(String),
}

/// A native callback reachable from ExprScript via `.py`.
pub type HostFunction = Box<dyn Fn(&[HostArg]) -> std::result::Result<HostArg, String>>;

/// The registry of host functions available to `.py`.
#[derive(Default)]
pub struct HostRegistry {
    functions: HashMap<String, HostFunction>,
}

impl HostRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under `name`, shadowing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, f: HostFunction) {
        self.functions.insert(name.into(), f);
    }

    /// Calls the function registered under `name`, translating a host-side
    /// failure into a `TypeError` at `at`.
    pub fn call(&self, name: &str, args: &[HostArg], at: SourceLocation) -> Result<HostArg> {
        let f = self
            .functions
            .get(name)
            .ok_or_else(|| Error::type_error(at, format!("unregistered host function {name}")))?;
        f(args).map_err(|msg| Error::type_error(at, msg))
    }
}

impl std::fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

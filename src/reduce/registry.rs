//! Name → reduction lookup

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::kernels;
use crate::{Error, Result};

/// A reduction collapsing one step's per-run values into a scalar.
pub type ReduceFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Registry of named reductions.
///
/// [`ReduceRegistry::default`] holds the built-ins: `mean`, `median`,
/// `std`, `var`, `min`, `max`, `sum`, `prod`. Any `Fn(&[f64]) -> f64` can
/// be added under a new name, or replace a built-in.
///
/// ```rust
/// use tensorboard_reducer::reduce::ReduceRegistry;
///
/// let mut registry = ReduceRegistry::default();
/// registry.register("range", |xs: &[f64]| {
///     let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
///     let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
///     hi - lo
/// });
///
/// let range = registry.resolve("range").unwrap();
/// assert_eq!(range(&[1.0, 4.0, 2.0]), 3.0);
/// ```
#[derive(Clone)]
pub struct ReduceRegistry {
    ops: BTreeMap<String, ReduceFn>,
}

impl Default for ReduceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("mean", kernels::mean);
        registry.register("median", kernels::median);
        registry.register("std", kernels::std);
        registry.register("var", kernels::var);
        registry.register("min", kernels::min);
        registry.register("max", kernels::max);
        registry.register("sum", kernels::sum);
        registry.register("prod", kernels::prod);
        registry
    }
}

impl fmt::Debug for ReduceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ops.keys()).finish()
    }
}

impl ReduceRegistry {
    /// Registry without any reductions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ops: BTreeMap::new(),
        }
    }

    /// Register `op` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, op: F)
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        self.ops.insert(name.into(), Arc::new(op));
    }

    /// Check if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    /// Look up a reduction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReduceOp`] listing the registered names.
    pub fn resolve(&self, name: &str) -> Result<ReduceFn> {
        self.ops
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownReduceOp {
                op: name.to_string(),
                available: self.names().map(ToString::to_string).collect(),
            })
    }
}

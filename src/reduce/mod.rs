//! Reduction of the run axis of aligned matrices
//!
//! For every requested op and every tag:
//!
//! ```text
//! reduced[op][tag][i] = op(events[tag].row(i))
//! ```
//!
//! Steps never interact, so each row is reduced independently.

pub mod kernels;
mod reduced;
mod registry;

pub use reduced::{ReducedEventsDict, ReducedSeries};
pub use registry::{ReduceFn, ReduceRegistry};

use tracing::debug;

use crate::align::EventsDict;
use crate::{Error, Result};

/// Applies named reductions to an [`EventsDict`].
#[derive(Debug, Clone, Default)]
pub struct ReductionEngine {
    registry: ReduceRegistry,
}

impl ReductionEngine {
    /// Engine with the built-in reductions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom registry.
    #[must_use]
    pub const fn with_registry(registry: ReduceRegistry) -> Self {
        Self { registry }
    }

    /// Registry in use.
    #[must_use]
    pub const fn registry(&self) -> &ReduceRegistry {
        &self.registry
    }

    /// Reduce every tag of `events` with every op in `ops`.
    ///
    /// Op names are resolved up front, so an unknown name fails before any
    /// work is done. Repeated names are reduced once.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `ops` is empty
    /// - [`Error::UnknownReduceOp`] if a name is not registered
    ///
    /// # Example
    ///
    /// ```rust
    /// use tensorboard_reducer::align::AlignmentEngine;
    /// use tensorboard_reducer::reduce::ReductionEngine;
    /// use tensorboard_reducer::run::{RunScalars, RunStore};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut store = RunStore::new();
    /// store.add_run(RunScalars::builder("a").series("loss", &[1.0, 5.0]).build());
    /// store.add_run(RunScalars::builder("b").series("loss", &[3.0, 7.0]).build());
    /// let events = AlignmentEngine::default().align(&store)?;
    ///
    /// let reduced = ReductionEngine::new().reduce(&events, &["mean", "max"])?;
    /// assert_eq!(reduced.get("mean", "loss").unwrap().values(), &[2.0, 6.0]);
    /// assert_eq!(reduced.get("max", "loss").unwrap().values(), &[3.0, 7.0]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn reduce<S: AsRef<str>>(&self, events: &EventsDict, ops: &[S]) -> Result<ReducedEventsDict> {
        if ops.is_empty() {
            return Err(Error::InvalidInput("no reduce ops requested".to_string()));
        }

        let resolved = ops
            .iter()
            .map(|op| {
                let name = op.as_ref();
                self.registry.resolve(name).map(|f| (name, f))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut reduced = ReducedEventsDict::new();
        for (name, op) in resolved {
            if reduced.op(name).is_some() {
                continue;
            }
            for (tag, matrix) in events.iter() {
                let values: Vec<f64> = matrix.rows().map(|row| op(row)).collect();
                reduced.insert(name, tag, ReducedSeries::new(matrix.steps().to_vec(), values));
            }
            debug!(op = name, tags = events.len(), "reduced");
        }

        Ok(reduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignedMatrix;

    fn events() -> EventsDict {
        let mut events = EventsDict::new(2);
        events.insert(
            "loss",
            AlignedMatrix::from_columns(
                vec![0, 1],
                vec!["a".to_string(), "b".to_string()],
                &[&[1.0, 5.0], &[3.0, 7.0]],
            )
            .unwrap(),
        );
        events
    }

    #[test]
    fn test_reduce_mean_and_max() {
        let reduced = ReductionEngine::new()
            .reduce(&events(), &["mean", "max"])
            .unwrap();

        assert_eq!(reduced.get("mean", "loss").unwrap().values(), &[2.0, 6.0]);
        assert_eq!(reduced.get("max", "loss").unwrap().values(), &[3.0, 7.0]);
        assert_eq!(reduced.get("max", "loss").unwrap().steps(), &[0, 1]);
    }

    #[test]
    fn test_reduce_unknown_op_fails_before_work() {
        let err = ReductionEngine::new()
            .reduce(&events(), &["mean", "average"])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownReduceOp { ref op, .. } if op == "average"));
    }

    #[test]
    fn test_reduce_requires_ops() {
        let ops: [&str; 0] = [];
        assert!(ReductionEngine::new().reduce(&events(), &ops).is_err());
    }

    #[test]
    fn test_duplicate_ops_collapse() {
        let reduced = ReductionEngine::new()
            .reduce(&events(), &["mean", "mean"])
            .unwrap();
        assert_eq!(reduced.op_count(), 1);
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = ReduceRegistry::empty();
        registry.register("count", |xs: &[f64]| xs.len() as f64);

        let reduced = ReductionEngine::with_registry(registry)
            .reduce(&events(), &["count"])
            .unwrap();
        assert_eq!(reduced.get("count", "loss").unwrap().values(), &[2.0, 2.0]);
    }
}

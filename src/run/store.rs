//! Run Store - the ordered set of loaded runs
//!
//! Run order is fixed at insertion and becomes the column order of every
//! aligned matrix.

use std::collections::BTreeSet;

use super::{DuplicateStepPolicy, RunScalars};
use crate::Result;

/// In-memory store of loaded runs, in discovery order.
#[derive(Debug, Default, Clone)]
pub struct RunStore {
    runs: Vec<RunScalars>,
}

impl RunStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Add a run after all previously added runs.
    pub fn add_run(&mut self, run: RunScalars) {
        self.runs.push(run);
    }

    /// Get a run by ID.
    #[must_use]
    pub fn get_run(&self, run_id: &str) -> Option<&RunScalars> {
        self.runs.iter().find(|run| run.run_id() == run_id)
    }

    /// Runs in insertion order.
    #[must_use]
    pub fn runs(&self) -> &[RunScalars] {
        &self.runs
    }

    /// Union of tags over all runs, sorted.
    #[must_use]
    pub fn tag_union(&self) -> BTreeSet<&str> {
        self.runs.iter().flat_map(RunScalars::tags).collect()
    }

    /// Put every series of every run into step order.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::DuplicateSteps`] from the first offending
    /// series.
    pub fn finalize(self, policy: DuplicateStepPolicy) -> Result<Self> {
        let runs = self
            .runs
            .into_iter()
            .map(|scalars| {
                let (run, series) = scalars.into_parts();
                let mut out = RunScalars::new(run);
                for (tag, raw) in series {
                    let sorted = raw.finalize(policy, out.run_id(), &tag)?;
                    out.insert(tag, sorted);
                }
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { runs })
    }
}

impl FromIterator<RunScalars> for RunStore {
    fn from_iter<I: IntoIterator<Item = RunScalars>>(iter: I) -> Self {
        Self {
            runs: iter.into_iter().collect(),
        }
    }
}

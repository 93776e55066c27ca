//! Alignment of per-run scalar series into (steps × runs) matrices
//!
//! Two independent consistency policies:
//!
//! | policy         | strict                                   | relaxed                                       |
//! |----------------|------------------------------------------|-----------------------------------------------|
//! | `strict_tags`  | every run logs the same tag set          | union of tags; a tag's matrix only has the runs that logged it |
//! | `strict_steps` | same step count and step values per tag  | truncate every run to the shortest; steps from the first run |
//!
//! Alignment is pure reshaping. No value is ever interpolated or padded.

mod events_dict;
mod matrix;

pub use events_dict::{AlignSummary, EventsDict};
pub use matrix::AlignedMatrix;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::run::{RawSeries, RunStore};
use crate::{Error, Result};

/// Consistency policy applied while aligning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignPolicy {
    /// Require every run to log exactly the same tags.
    pub strict_tags: bool,
    /// Require every run to log the same steps for a tag.
    pub strict_steps: bool,
}

impl Default for AlignPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

impl AlignPolicy {
    /// Both checks enabled.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict_tags: true,
            strict_steps: true,
        }
    }

    /// Both checks disabled.
    #[must_use]
    pub const fn relaxed() -> Self {
        Self {
            strict_tags: false,
            strict_steps: false,
        }
    }
}

/// Stacks raw series into an [`EventsDict`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentEngine {
    policy: AlignPolicy,
}

impl AlignmentEngine {
    /// Create an engine with the given policy.
    #[must_use]
    pub const fn new(policy: AlignPolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect.
    #[must_use]
    pub const fn policy(&self) -> AlignPolicy {
        self.policy
    }

    /// Align every tag of every run in `store`.
    ///
    /// Column order of each matrix follows the run order of `store`.
    /// Series are expected to be step-ordered (see [`RunStore::finalize`]).
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if there are no runs or no tags
    /// - [`Error::TagMismatch`] if `strict_tags` and tag sets differ
    /// - [`Error::StepMismatch`] if `strict_steps` and a tag's steps differ
    ///
    /// # Example
    ///
    /// ```rust
    /// use tensorboard_reducer::align::{AlignPolicy, AlignmentEngine};
    /// use tensorboard_reducer::run::{RunScalars, RunStore};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut store = RunStore::new();
    /// store.add_run(RunScalars::builder("a").series("loss", &[1.0, 5.0]).build());
    /// store.add_run(RunScalars::builder("b").series("loss", &[3.0, 7.0]).build());
    ///
    /// let events = AlignmentEngine::new(AlignPolicy::strict()).align(&store)?;
    /// assert_eq!(events.get("loss").unwrap().row(1), &[5.0, 7.0]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn align(&self, store: &RunStore) -> Result<EventsDict> {
        if store.is_empty() {
            return Err(Error::EmptyInput("no runs to align".to_string()));
        }

        let tags = store.tag_union();
        if tags.is_empty() {
            return Err(Error::EmptyInput(format!(
                "none of the {} runs logged a scalar tag",
                store.run_count()
            )));
        }

        if self.policy.strict_tags {
            check_tags(store, &tags)?;
        }

        let mut events = EventsDict::new(store.run_count());
        for tag in tags {
            let (runs, series): (Vec<String>, Vec<&RawSeries>) = store
                .runs()
                .iter()
                .filter_map(|run| run.get(tag).map(|s| (run.run_id().to_string(), s)))
                .unzip();

            if runs.len() < store.run_count() {
                debug!(
                    tag,
                    present = runs.len(),
                    runs = store.run_count(),
                    "tag missing from some runs"
                );
            }

            let n_steps = if self.policy.strict_steps {
                check_steps(tag, &runs, &series)?;
                series[0].len()
            } else {
                truncated_len(tag, &series)
            };

            let steps = series[0].steps()[..n_steps].to_vec();
            let columns: Vec<&[f64]> = series.iter().map(|s| &s.values()[..n_steps]).collect();
            events.insert(tag, AlignedMatrix::from_columns(steps, runs, &columns)?);
        }

        Ok(events)
    }
}

fn check_tags(store: &RunStore, tags: &std::collections::BTreeSet<&str>) -> Result<()> {
    let missing: Vec<(String, Vec<String>)> = store
        .runs()
        .iter()
        .filter_map(|run| {
            let lacks: Vec<String> = tags
                .iter()
                .filter(|tag| !run.has_tag(tag))
                .map(ToString::to_string)
                .collect();
            (!lacks.is_empty()).then(|| (run.run_id().to_string(), lacks))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::TagMismatch { missing })
    }
}

fn check_steps(tag: &str, runs: &[String], series: &[&RawSeries]) -> Result<()> {
    let reference = series[0];
    let mismatch = |detail: String| Error::StepMismatch {
        tag: tag.to_string(),
        lengths: runs
            .iter()
            .zip(series)
            .map(|(run, s)| (run.clone(), s.len()))
            .collect(),
        detail,
    };

    for (run, s) in runs.iter().zip(series).skip(1) {
        if s.len() != reference.len() {
            return Err(mismatch(format!(
                "run '{}' has {} steps, run '{run}' has {}",
                runs[0],
                reference.len(),
                s.len()
            )));
        }
        if let Some(i) = reference
            .steps()
            .iter()
            .zip(s.steps())
            .position(|(a, b)| a != b)
        {
            return Err(mismatch(format!(
                "runs '{}' and '{run}' diverge at index {i} (step {} vs {})",
                runs[0],
                reference.steps()[i],
                s.steps()[i]
            )));
        }
    }
    Ok(())
}

fn truncated_len(tag: &str, series: &[&RawSeries]) -> usize {
    let min = series.iter().map(|s| s.len()).min().unwrap_or(0);
    let max = series.iter().map(|s| s.len()).max().unwrap_or(0);
    if min != max {
        warn!(tag, min, max, "uneven step counts, truncating to shortest run");
    }
    min
}

//! Run Record - one run directory and the scalars it logged

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::RawSeries;

/// Run Record represents a single execution of an experiment.
///
/// A run is identified by the directory its event files live in. The
/// `run_id` is the directory path as displayed, which keeps error messages
/// pointing at something the user can `ls`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    path: PathBuf,
}

impl RunRecord {
    /// Create a run record for a directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            run_id: path.display().to_string(),
            path,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the run directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// All scalar series logged by one run, keyed by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunScalars {
    run: RunRecord,
    series: BTreeMap<String, RawSeries>,
}

impl RunScalars {
    /// Create an empty scalar set for a run.
    #[must_use]
    pub fn new(run: RunRecord) -> Self {
        Self {
            run,
            series: BTreeMap::new(),
        }
    }

    /// Create a builder, mostly useful for assembling runs in memory.
    #[must_use]
    pub fn builder(path: impl Into<PathBuf>) -> RunScalarsBuilder {
        RunScalarsBuilder::new(path)
    }

    /// Get the run record.
    #[must_use]
    pub const fn run(&self) -> &RunRecord {
        &self.run
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run.run_id()
    }

    /// Tags logged by this run, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.series.len()
    }

    /// Check if the tag was logged by this run.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.series.contains_key(tag)
    }

    /// Get the series for a tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&RawSeries> {
        self.series.get(tag)
    }

    /// Mutable access to the series for a tag, creating it if missing.
    pub fn series_mut(&mut self, tag: &str) -> &mut RawSeries {
        self.series.entry(tag.to_string()).or_default()
    }

    /// Replace the series for a tag.
    pub fn insert(&mut self, tag: impl Into<String>, series: RawSeries) {
        self.series.insert(tag.into(), series);
    }

    /// Iterate `(tag, series)` in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawSeries)> {
        self.series.iter().map(|(tag, series)| (tag.as_str(), series))
    }

    pub(crate) fn into_parts(self) -> (RunRecord, BTreeMap<String, RawSeries>) {
        (self.run, self.series)
    }
}

/// Builder for `RunScalars`.
#[derive(Debug)]
pub struct RunScalarsBuilder {
    scalars: RunScalars,
}

impl RunScalarsBuilder {
    /// Create a new builder for the run at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            scalars: RunScalars::new(RunRecord::new(path)),
        }
    }

    /// Append one `(step, value)` point to `tag`.
    #[must_use]
    pub fn scalar(mut self, tag: &str, step: i64, value: f64) -> Self {
        self.scalars.series_mut(tag).push(step, value);
        self
    }

    /// Append `values` to `tag` at steps `0..values.len()`.
    #[must_use]
    pub fn series(mut self, tag: &str, values: &[f64]) -> Self {
        let series = self.scalars.series_mut(tag);
        for (step, &value) in (0_i64..).zip(values) {
            series.push(step, value);
        }
        self
    }

    /// Build the `RunScalars`.
    #[must_use]
    pub fn build(self) -> RunScalars {
        self.scalars
    }
}

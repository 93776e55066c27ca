//! Tag → aligned matrix mapping, plus the summary used for logging

use std::collections::BTreeMap;

use serde::Serialize;

use super::AlignedMatrix;

/// Aligned matrices keyed by tag, iterated in sorted tag order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsDict {
    n_runs: usize,
    matrices: BTreeMap<String, AlignedMatrix>,
}

impl EventsDict {
    /// Create an empty dict for `n_runs` discovered runs.
    #[must_use]
    pub fn new(n_runs: usize) -> Self {
        Self {
            n_runs,
            matrices: BTreeMap::new(),
        }
    }

    /// Insert (or replace) the matrix of a tag.
    pub fn insert(&mut self, tag: impl Into<String>, matrix: AlignedMatrix) {
        self.matrices.insert(tag.into(), matrix);
    }

    /// Number of runs that were aligned, including runs that lack some tags.
    #[must_use]
    pub const fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Check if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Get the matrix of a tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&AlignedMatrix> {
        self.matrices.get(tag)
    }

    /// Tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.matrices.keys().map(String::as_str)
    }

    /// Iterate `(tag, matrix)` in sorted tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlignedMatrix)> {
        self.matrices.iter().map(|(tag, m)| (tag.as_str(), m))
    }

    /// Describe the aligned shapes.
    #[must_use]
    pub fn summary(&self) -> AlignSummary {
        let shapes: Vec<(String, (usize, usize))> = self
            .iter()
            .map(|(tag, m)| (tag.to_string(), m.shape()))
            .collect();

        let uniform = shapes.first().map(|(_, shape)| *shape).filter(|first| {
            shapes.iter().all(|(_, shape)| shape == first) && first.1 == self.n_runs
        });

        AlignSummary {
            n_runs: self.n_runs,
            n_tags: shapes.len(),
            uniform,
            shapes,
        }
    }
}

/// Shape metadata of an [`EventsDict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignSummary {
    /// Runs aligned
    pub n_runs: usize,
    /// Tags aligned
    pub n_tags: usize,
    /// `(n_steps, n_runs)` when every tag has that same shape and all runs contribute
    pub uniform: Option<(usize, usize)>,
    /// `(tag, (n_steps, n_runs))` per tag, sorted by tag
    pub shapes: Vec<(String, (usize, usize))>,
}

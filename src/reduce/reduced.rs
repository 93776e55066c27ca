//! Reduced series and their op → tag → series container

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One tag reduced by one op: a value per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedSeries {
    steps: Vec<i64>,
    values: Vec<f64>,
}

impl ReducedSeries {
    /// Pair a step axis with its reduced values.
    ///
    /// # Panics
    ///
    /// Panics if `steps` and `values` differ in length.
    #[must_use]
    pub fn new(steps: Vec<i64>, values: Vec<f64>) -> Self {
        assert_eq!(steps.len(), values.len(), "one reduced value per step");
        Self { steps, values }
    }

    /// Step axis.
    #[must_use]
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Reduced values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(step, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.steps.iter().copied().zip(self.values.iter().copied())
    }
}

/// Reduced series keyed by op (requested order), then tag (sorted).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReducedEventsDict {
    ops: IndexMap<String, BTreeMap<String, ReducedSeries>>,
}

impl ReducedEventsDict {
    /// Create an empty dict.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the series of one (op, tag) pair.
    pub fn insert(&mut self, op: &str, tag: &str, series: ReducedSeries) {
        self.ops
            .entry(op.to_string())
            .or_default()
            .insert(tag.to_string(), series);
    }

    /// Ops in requested order.
    pub fn ops(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    /// Number of ops.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Check if no op was reduced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Tags reduced by any op, sorted.
    #[must_use]
    pub fn tags(&self) -> BTreeSet<&str> {
        self.ops
            .values()
            .flat_map(|tags| tags.keys().map(String::as_str))
            .collect()
    }

    /// Series of one (op, tag) pair.
    #[must_use]
    pub fn get(&self, op: &str, tag: &str) -> Option<&ReducedSeries> {
        self.ops.get(op).and_then(|tags| tags.get(tag))
    }

    /// All series of one op, keyed by tag.
    #[must_use]
    pub fn op(&self, op: &str) -> Option<&BTreeMap<String, ReducedSeries>> {
        self.ops.get(op)
    }

    /// Iterate `(op, tag → series)` in op order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, ReducedSeries>)> {
        self.ops.iter().map(|(op, tags)| (op.as_str(), tags))
    }

    /// Sorted union of every series' steps; the row index of tabular output.
    #[must_use]
    pub fn step_union(&self) -> Vec<i64> {
        let steps: BTreeSet<i64> = self
            .ops
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(|series| series.steps().iter().copied())
            .collect();
        steps.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_order_is_insertion_order() {
        let mut reduced = ReducedEventsDict::new();
        reduced.insert("std", "loss", ReducedSeries::new(vec![0], vec![0.1]));
        reduced.insert("mean", "loss", ReducedSeries::new(vec![0], vec![1.0]));

        assert_eq!(reduced.ops().collect::<Vec<_>>(), vec!["std", "mean"]);
        assert_eq!(reduced.op_count(), 2);
    }

    #[test]
    fn test_step_union_merges_tags() {
        let mut reduced = ReducedEventsDict::new();
        reduced.insert("mean", "loss", ReducedSeries::new(vec![0, 2], vec![1.0, 0.5]));
        reduced.insert("mean", "acc", ReducedSeries::new(vec![1, 2], vec![0.1, 0.2]));

        assert_eq!(reduced.step_union(), vec![0, 1, 2]);
        assert_eq!(reduced.tags().into_iter().collect::<Vec<_>>(), vec!["acc", "loss"]);
        assert_eq!(reduced.get("mean", "acc").unwrap().len(), 2);
        assert!(reduced.get("max", "acc").is_none());
    }

    #[test]
    #[should_panic(expected = "one reduced value per step")]
    fn test_reduced_series_length_mismatch() {
        let _ = ReducedSeries::new(vec![0, 1], vec![1.0]);
    }
}

//! Raw Series - step-ordered scalar values of one tag in one run

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What to do when a run records the same step more than once for a tag.
///
/// Restarted or resumed training jobs commonly re-log the steps between the
/// last checkpoint and the crash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateStepPolicy {
    /// Fail with [`Error::DuplicateSteps`].
    #[default]
    Error,
    /// Keep the value that was logged first.
    KeepFirst,
    /// Keep the value that was logged last.
    KeepLast,
    /// Replace all values of the step with their mean.
    Mean,
}

/// Raw Series is the time series of one scalar tag in one run.
///
/// Points are appended in log order and put into step order by
/// [`RawSeries::finalize`], after which `steps` is strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    steps: Vec<i64>,
    values: Vec<f64>,
}

impl RawSeries {
    /// Create an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a series from `(step, value)` pairs, keeping their order.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = (i64, f64)>) -> Self {
        let (steps, values) = points.into_iter().unzip();
        Self { steps, values }
    }

    /// Append one point.
    pub fn push(&mut self, step: i64, value: f64) {
        self.steps.push(step);
        self.values.push(value);
    }

    /// Append every point of `other`, preserving its order.
    pub fn extend(&mut self, other: Self) {
        self.steps.extend(other.steps);
        self.values.extend(other.values);
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step axis.
    #[must_use]
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Values, parallel to [`steps`](Self::steps).
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sort by step and resolve duplicate steps.
    ///
    /// The sort is stable, so `KeepFirst`/`KeepLast` refer to log order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSteps`] if a step repeats and `policy` is
    /// [`DuplicateStepPolicy::Error`].
    pub fn finalize(self, policy: DuplicateStepPolicy, run: &str, tag: &str) -> Result<Self> {
        let mut points: Vec<(i64, f64)> = self.steps.into_iter().zip(self.values).collect();
        points.sort_by_key(|&(step, _)| step);

        let mut out = Self {
            steps: Vec::with_capacity(points.len()),
            values: Vec::with_capacity(points.len()),
        };

        let mut i = 0;
        while i < points.len() {
            let step = points[i].0;
            let end = points[i..]
                .iter()
                .position(|&(s, _)| s != step)
                .map_or(points.len(), |offset| i + offset);
            let group = &points[i..end];

            let value = if group.len() == 1 {
                group[0].1
            } else {
                match policy {
                    DuplicateStepPolicy::Error => {
                        return Err(Error::DuplicateSteps {
                            run: run.to_string(),
                            tag: tag.to_string(),
                            step,
                        });
                    }
                    DuplicateStepPolicy::KeepFirst => group[0].1,
                    DuplicateStepPolicy::KeepLast => group[group.len() - 1].1,
                    #[allow(clippy::cast_precision_loss)]
                    DuplicateStepPolicy::Mean => {
                        group.iter().map(|&(_, v)| v).sum::<f64>() / group.len() as f64
                    }
                }
            };

            out.push(step, value);
            i = end;
        }

        Ok(out)
    }
}

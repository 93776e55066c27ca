//! Aligned (steps × runs) matrix of one tag

use crate::{Error, Result};

/// Values of one tag stacked across runs.
///
/// Shape is `(n_steps, n_runs)`. Storage is row-major so that every step's
/// per-run values form one contiguous slice, which is exactly what the
/// reduction kernels consume.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    steps: Vec<i64>,
    runs: Vec<String>,
    data: Vec<f64>,
}

impl AlignedMatrix {
    /// Build a matrix from per-run columns sharing the step axis `steps`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if there are no columns, the run ids
    /// and columns differ in count, or a column's length differs from
    /// `steps.len()`.
    pub fn from_columns(steps: Vec<i64>, runs: Vec<String>, columns: &[&[f64]]) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::InvalidInput(
                "aligned matrix needs at least one run column".to_string(),
            ));
        }
        if runs.len() != columns.len() {
            return Err(Error::InvalidInput(format!(
                "{} run ids for {} columns",
                runs.len(),
                columns.len()
            )));
        }
        if let Some((j, col)) = columns
            .iter()
            .enumerate()
            .find(|(_, col)| col.len() != steps.len())
        {
            return Err(Error::InvalidInput(format!(
                "column {j} ('{}') has {} values for {} steps",
                runs[j],
                col.len(),
                steps.len()
            )));
        }

        let n_runs = columns.len();
        let mut data = vec![0.0; steps.len() * n_runs];
        for (j, col) in columns.iter().enumerate() {
            for (i, &value) in col.iter().enumerate() {
                data[i * n_runs + j] = value;
            }
        }

        Ok(Self { steps, runs, data })
    }

    /// Number of steps (rows).
    #[must_use]
    pub fn n_steps(&self) -> usize {
        self.steps.len()
    }

    /// Number of runs (columns).
    #[must_use]
    pub fn n_runs(&self) -> usize {
        self.runs.len()
    }

    /// `(n_steps, n_runs)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_steps(), self.n_runs())
    }

    /// Shared step axis.
    #[must_use]
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Ids of the contributing runs, in column order.
    #[must_use]
    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    /// Per-run values at step index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_steps()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.n_runs();
        &self.data[i * n..(i + 1) * n]
    }

    /// Iterate rows in step order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_runs())
    }

    /// Copy out column `j` (one run's values), or `None` if `j >= n_runs()`.
    #[must_use]
    pub fn column(&self, j: usize) -> Option<Vec<f64>> {
        (j < self.n_runs()).then(|| self.rows().map(|row| row[j]).collect())
    }

    /// Value at step index `i`, run index `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.n_steps() && j < self.n_runs() {
            Some(self.data[i * self.n_runs() + j])
        } else {
            None
        }
    }
}

//! # tensorboard-reducer: Reduce Repeated TensorBoard Runs
//!
//! Aggregates the scalar metrics of several runs of the same experiment
//! (different seeds, say) into one reduced time series per metric and
//! reduce op.
//!
//! ## Pipeline
//!
//! ```text
//! events::load_runs ─► align::AlignmentEngine ─► reduce::ReductionEngine ─► output::OutputDispatcher
//!   RunStore             EventsDict (steps×runs)   ReducedEventsDict          .csv/.json/.parquet or <out>-<op>/
//! ```
//!
//! Each stage fully owns its output; nothing is written until alignment and
//! reduction have both succeeded.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tensorboard_reducer::Reducer;
//!
//! let reducer = Reducer::builder()
//!     .reduce_ops(["mean", "std"])
//!     .strict_steps(false)
//!     .overwrite(true)
//!     .build()?;
//!
//! let report = reducer.run("runs/seed-*", "reduced.csv")?;
//! println!("Reduced {} tags", report.summary.n_tags);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod align;
pub mod error;
pub mod events;
pub mod output;
pub mod reduce;
pub mod run;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use align::{AlignPolicy, AlignSummary, AlignmentEngine, EventsDict};
use output::OutputDispatcher;
use reduce::{ReduceRegistry, ReducedEventsDict, ReductionEngine};
use run::{DuplicateStepPolicy, RunStore};

/// Reduce op used when none is requested
pub const DEFAULT_REDUCE_OP: &str = "mean";

/// Everything that controls one reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Reduce op names, applied in this order
    pub reduce_ops: Vec<String>,
    /// Tag and step consistency checks
    pub align: AlignPolicy,
    /// Handling of steps logged twice within one run
    pub duplicate_steps: DuplicateStepPolicy,
    /// Replace existing outputs
    pub overwrite: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            reduce_ops: vec![DEFAULT_REDUCE_OP.to_string()],
            align: AlignPolicy::strict(),
            duplicate_steps: DuplicateStepPolicy::default(),
            overwrite: false,
        }
    }
}

impl ReducerConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What a completed [`Reducer::run`] did.
#[derive(Debug, Clone)]
pub struct ReduceReport {
    /// Shapes that were aligned
    pub summary: AlignSummary,
    /// Files or directories written
    pub written: Vec<PathBuf>,
}

/// Load → align → reduce → write, with explicit configuration.
#[derive(Debug, Clone)]
pub struct Reducer {
    config: ReducerConfig,
    reduction: ReductionEngine,
}

impl Reducer {
    /// Create a new reducer builder
    #[must_use]
    pub fn builder() -> ReducerBuilder {
        ReducerBuilder::default()
    }

    /// Create a reducer from a config, using the built-in reduce ops.
    ///
    /// # Errors
    ///
    /// Same as [`ReducerBuilder::build`].
    pub fn from_config(config: ReducerConfig) -> Result<Self> {
        ReducerBuilder {
            config,
            registry: ReduceRegistry::default(),
        }
        .build()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Load and step-order every run matching `pattern`.
    ///
    /// # Errors
    ///
    /// Discovery, IO, corrupt-record and duplicate-step errors.
    pub fn load(&self, pattern: &str) -> Result<RunStore> {
        events::load_runs(pattern)?.finalize(self.config.duplicate_steps)
    }

    /// Align a step-ordered store.
    ///
    /// # Errors
    ///
    /// See [`AlignmentEngine::align`].
    pub fn align(&self, store: &RunStore) -> Result<EventsDict> {
        AlignmentEngine::new(self.config.align).align(store)
    }

    /// Reduce aligned events with the configured ops.
    ///
    /// # Errors
    ///
    /// See [`ReductionEngine::reduce`].
    pub fn reduce(&self, events: &EventsDict) -> Result<ReducedEventsDict> {
        self.reduction.reduce(events, &self.config.reduce_ops)
    }

    /// Finalize, align and reduce an in-memory store.
    ///
    /// # Errors
    ///
    /// Duplicate-step, alignment and reduction errors.
    pub fn reduce_store(&self, store: RunStore) -> Result<(AlignSummary, ReducedEventsDict)> {
        let store = store.finalize(self.config.duplicate_steps)?;
        let events = self.align(&store)?;
        let reduced = self.reduce(&events)?;
        Ok((events.summary(), reduced))
    }

    /// Write reduced events to `outpath` (format chosen by suffix).
    ///
    /// # Errors
    ///
    /// See [`OutputDispatcher::write`].
    pub fn write(&self, reduced: &ReducedEventsDict, outpath: &Path) -> Result<Vec<PathBuf>> {
        OutputDispatcher::new(self.config.overwrite).write(reduced, outpath)
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Any stage's error; nothing is written unless loading, alignment and
    /// reduction all succeed.
    pub fn run(&self, pattern: &str, outpath: impl AsRef<Path>) -> Result<ReduceReport> {
        let store = self.load(pattern)?;
        let events = self.align(&store)?;
        let summary = events.summary();
        info!(runs = summary.n_runs, tags = summary.n_tags, "aligned runs");

        let reduced = self.reduce(&events)?;
        let written = self.write(&reduced, outpath.as_ref())?;
        Ok(ReduceReport { summary, written })
    }
}

/// Reducer builder
#[derive(Debug, Default)]
pub struct ReducerBuilder {
    config: ReducerConfig,
    registry: ReduceRegistry,
}

impl ReducerBuilder {
    /// Set the reduce ops (names are trimmed; empty names are dropped)
    #[must_use]
    pub fn reduce_ops<I, S>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.reduce_ops = ops
            .into_iter()
            .map(|op| op.as_ref().trim().to_string())
            .filter(|op| !op.is_empty())
            .collect();
        self
    }

    /// Require identical tag sets across runs
    #[must_use]
    pub const fn strict_tags(mut self, strict: bool) -> Self {
        self.config.align.strict_tags = strict;
        self
    }

    /// Require identical step sequences per tag across runs
    #[must_use]
    pub const fn strict_steps(mut self, strict: bool) -> Self {
        self.config.align.strict_steps = strict;
        self
    }

    /// Set how duplicate steps within one run are handled
    #[must_use]
    pub const fn duplicate_steps(mut self, policy: DuplicateStepPolicy) -> Self {
        self.config.duplicate_steps = policy;
        self
    }

    /// Allow replacing existing outputs
    #[must_use]
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    /// Use a custom reduce op registry
    #[must_use]
    pub fn registry(mut self, registry: ReduceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the reducer
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if no reduce op is configured, or
    /// [`Error::UnknownReduceOp`] if one is not registered. Both are caught
    /// here, before any run is loaded.
    pub fn build(self) -> Result<Reducer> {
        if self.config.reduce_ops.is_empty() {
            return Err(Error::InvalidInput("no reduce ops configured".to_string()));
        }
        for op in &self.config.reduce_ops {
            self.registry.resolve(op)?;
        }

        Ok(Reducer {
            config: self.config,
            reduction: ReductionEngine::with_registry(self.registry),
        })
    }
}

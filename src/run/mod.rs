//! Run data model
//!
//! ## Schema Overview
//!
//! ```text
//! RunStore (ordered)
//!   └──< RunScalars (one per run directory)
//!            ├── RunRecord (run_id = directory path)
//!            └──< tag → RawSeries [(step, value), step-ordered]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tensorboard_reducer::run::{RunScalars, RunStore};
//!
//! let mut store = RunStore::new();
//! store.add_run(RunScalars::builder("runs/seed-1").series("loss", &[1.0, 0.5]).build());
//! store.add_run(RunScalars::builder("runs/seed-2").series("loss", &[0.9, 0.4]).build());
//!
//! assert_eq!(store.run_count(), 2);
//! assert_eq!(store.tag_union().len(), 1);
//! ```

mod raw_series;
mod run_record;
mod store;

pub use raw_series::{DuplicateStepPolicy, RawSeries};
pub use run_record::{RunRecord, RunScalars, RunScalarsBuilder};
pub use store::RunStore;

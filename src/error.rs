//! Error types for tensorboard-reducer
//!
//! Every variant names the offending run, tag, operator or path so the
//! message alone is enough to fix the input.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// tensorboard-reducer error types
#[derive(Error, Debug)]
pub enum Error {
    /// Glob pattern matched no run directories
    #[error("No run directories matched '{pattern}'\nQuote the pattern to keep the shell from expanding it")]
    NoRunsFound {
        /// Pattern as given by the caller
        pattern: String,
    },

    /// Glob pattern could not be parsed
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Nothing to align (zero runs or zero scalar tags)
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Runs report different tag sets under strict tag checking
    #[error("Tag mismatch across runs: {}\nPass --allow-uneven-tags to reduce the union of tags instead", format_missing(.missing))]
    TagMismatch {
        /// (run, tags missing from that run) for every run that lacks a tag
        missing: Vec<(String, Vec<String>)>,
    },

    /// Runs disagree on the step sequence of a tag under strict step checking
    #[error("Step mismatch for tag '{tag}': {detail}\nPass --allow-uneven-steps to truncate to the shortest run instead")]
    StepMismatch {
        /// Offending tag
        tag: String,
        /// Step count per contributing run
        lengths: Vec<(String, usize)>,
        /// Human readable description of the first disagreement
        detail: String,
    },

    /// One run recorded the same step twice for a tag
    #[error("Run '{run}' has duplicate step {step} for tag '{tag}'\nPass --handle-dup-steps to keep-first, keep-last or mean them")]
    DuplicateSteps {
        /// Run directory
        run: String,
        /// Offending tag
        tag: String,
        /// First duplicated step
        step: i64,
    },

    /// Requested reduction is not registered
    #[error("Unknown reduce op '{op}' (available: {})", .available.join(", "))]
    UnknownReduceOp {
        /// Requested name
        op: String,
        /// Registered names
        available: Vec<String>,
    },

    /// Output destination exists and overwrite was not requested
    #[error("Destination '{}' already exists\nPass --overwrite to replace it", .0.display())]
    DestinationExists(PathBuf),

    /// Event file record failed its checksum or could not be decoded
    #[error("Corrupt record in '{}': {reason}", .path.display())]
    CorruptRecord {
        /// Event file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Invalid caller-supplied input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_missing(missing: &[(String, Vec<String>)]) -> String {
    missing
        .iter()
        .map(|(run, tags)| format!("'{run}' is missing [{}]", tags.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

//! Output dispatch
//!
//! The destination's suffix alone picks the output shape:
//!
//! | suffix     | shape                                             |
//! |------------|---------------------------------------------------|
//! | `.csv`     | one table, two-line `(tag, op)` header            |
//! | `.json`    | one table, `{"step": [...], "series": {...}}`     |
//! | `.parquet` | one table, `<tag>/<op>` columns                   |
//! | other      | one event-log run directory `<base>-<op>` per op  |
//!
//! Every destination is checked before anything is written, so a refused
//! overwrite leaves the filesystem untouched. Writes land in hidden
//! `.<name>.partial` siblings and replace the destinations only once all of
//! them succeeded.

mod event_log;
pub mod parquet_file;
mod table;

pub use event_log::op_dir;
pub use table::{ReducedTable, TableColumn};

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::reduce::ReducedEventsDict;
use crate::{Error, Result};

/// Output shape selected from a destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated table
    Csv,
    /// JSON table
    Json,
    /// Parquet table
    Parquet,
    /// One event-log directory per op
    EventLog,
}

impl OutputFormat {
    /// Pick the format from `path`'s extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            Some("parquet") => Self::Parquet,
            _ => Self::EventLog,
        }
    }

    /// Whether this format writes a single table file.
    #[must_use]
    pub const fn is_tabular(self) -> bool {
        !matches!(self, Self::EventLog)
    }
}

/// Routes reduced series to the writer matching the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputDispatcher {
    overwrite: bool,
}

impl OutputDispatcher {
    /// Create a dispatcher; `overwrite` allows replacing existing outputs.
    #[must_use]
    pub const fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Paths [`write`](Self::write) would create for `outpath`.
    #[must_use]
    pub fn destinations(reduced: &ReducedEventsDict, outpath: &Path) -> Vec<PathBuf> {
        if OutputFormat::from_path(outpath).is_tabular() {
            vec![outpath.to_path_buf()]
        } else {
            reduced.ops().map(|op| op_dir(outpath, op)).collect()
        }
    }

    /// Write `reduced` to `outpath`; returns the paths written.
    ///
    /// Outputs are first written to hidden sibling paths and only moved into
    /// place once every one of them succeeded, so a failed write leaves any
    /// previous outputs as they were.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `reduced` holds no ops
    /// - [`Error::DestinationExists`] if a destination exists and overwrite is off
    /// - IO / Arrow / Parquet / JSON errors from the writers
    pub fn write(&self, reduced: &ReducedEventsDict, outpath: &Path) -> Result<Vec<PathBuf>> {
        if reduced.is_empty() {
            return Err(Error::InvalidInput("nothing to write: no reduced ops".to_string()));
        }

        let format = OutputFormat::from_path(outpath);
        let destinations = Self::destinations(reduced, outpath);
        self.check_destinations(&destinations)?;
        debug!(?format, outpath = %outpath.display(), "writing reduced events");

        let staged: Vec<PathBuf> = destinations.iter().map(|d| staging_path(d)).collect();
        if let Err(e) = write_staged(format, reduced, &staged) {
            for path in &staged {
                if let Err(cleanup) = remove_path(path) {
                    warn!(path = %path.display(), error = %cleanup, "could not remove staged output");
                }
            }
            return Err(e);
        }

        for (stage, dest) in staged.iter().zip(&destinations) {
            remove_path(dest)?;
            fs::rename(stage, dest)?;
        }
        if format.is_tabular() {
            info!(path = %outpath.display(), "wrote table");
        } else {
            for (op, dir) in reduced.ops().zip(&destinations) {
                info!(op, path = %dir.display(), "wrote event log");
            }
        }

        Ok(destinations)
    }

    /// Single overwrite decision for all destinations, taken before any write.
    fn check_destinations(&self, destinations: &[PathBuf]) -> Result<()> {
        match destinations.iter().find(|p| fs::symlink_metadata(p).is_ok()) {
            Some(existing) if !self.overwrite => Err(Error::DestinationExists(existing.clone())),
            _ => Ok(()),
        }
    }
}

/// Hidden sibling `.<name>.partial` that `dest` is written to first.
fn staging_path(dest: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(dest.file_name().unwrap_or(dest.as_os_str()));
    name.push(".partial");
    dest.with_file_name(name)
}

fn write_staged(format: OutputFormat, reduced: &ReducedEventsDict, staged: &[PathBuf]) -> Result<()> {
    for path in staged {
        remove_path(path)?;
    }
    if format.is_tabular() {
        match staged {
            [path] => write_table(format, reduced, path),
            _ => Err(Error::InvalidInput("a table has exactly one destination".to_string())),
        }
    } else {
        for ((_, series), dir) in reduced.iter().zip(staged) {
            event_log::write_run(dir, series)?;
        }
        Ok(())
    }
}

/// Remove a file or directory tree; a missing path is not an error.
fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            debug!(path = %path.display(), "removing existing output");
            if meta.is_dir() {
                fs::remove_dir_all(path)?;
            } else {
                fs::remove_file(path)?;
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_table(format: OutputFormat, reduced: &ReducedEventsDict, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let table = ReducedTable::from_reduced(reduced);
    match format {
        OutputFormat::Csv => table.write_csv(BufWriter::new(File::create(path)?)),
        OutputFormat::Json => table.write_json(BufWriter::new(File::create(path)?)),
        OutputFormat::Parquet => parquet_file::write_parquet(&table, path),
        OutputFormat::EventLog => Err(Error::InvalidInput(format!(
            "'{}' is not a table destination",
            path.display()
        ))),
    }
}

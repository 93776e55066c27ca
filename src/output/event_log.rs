//! Event-log output: one run directory per reduce op

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::events::EventWriter;
use crate::reduce::ReducedSeries;
use crate::Result;

/// `<base>-<op>`, ignoring any trailing separator on `base`.
#[must_use]
pub fn op_dir(base: &Path, op: &str) -> PathBuf {
    let mut name: OsString = base.components().as_path().as_os_str().to_owned();
    name.push("-");
    name.push(op);
    PathBuf::from(name)
}

/// Write every tag's series into a fresh event file under `dir`.
///
/// # Errors
///
/// Propagates IO errors from [`EventWriter`].
pub fn write_run(dir: &Path, series: &BTreeMap<String, ReducedSeries>) -> Result<PathBuf> {
    let mut writer = EventWriter::create(dir)?;
    for (tag, reduced) in series {
        writer.add_series(tag, reduced.iter())?;
    }
    writer.close()
}

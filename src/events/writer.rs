//! Event file writer

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use prost::Message;

use super::proto::{event, summary, Event, Summary};
use super::record::RecordWriter;
use crate::Result;

/// Header every event file starts with
pub const FILE_VERSION: &str = "brain.Event:2";

/// Writes scalar events into a new event file in a run directory.
///
/// Values are stored as TF1 `simple_value` (f32), the form every
/// TensorBoard version reads.
pub struct EventWriter {
    writer: RecordWriter<BufWriter<File>>,
    path: PathBuf,
}

impl EventWriter {
    /// Create `dir` if needed and open a fresh event file inside it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the directory or file cannot be created.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let now = Utc::now();
        let path = dir.join(format!(
            "events.out.tfevents.{}.tb-reducer.{:09}",
            now.timestamp(),
            now.timestamp_subsec_nanos()
        ));
        let mut writer = Self {
            writer: RecordWriter::new(BufWriter::new(File::create(&path)?)),
            path,
        };
        writer.write_event(Event {
            wall_time: wall_time(),
            step: 0,
            what: Some(event::What::FileVersion(FILE_VERSION.to_string())),
        })?;
        Ok(writer)
    }

    /// Path of the event file being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one scalar.
    ///
    /// # Errors
    ///
    /// Propagates IO errors.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_scalar(&mut self, tag: &str, step: i64, value: f64) -> Result<()> {
        let value = summary::Value {
            tag: tag.to_string(),
            metadata: None,
            kind: Some(summary::value::Kind::SimpleValue(value as f32)),
        };
        self.write_event(Event {
            wall_time: wall_time(),
            step,
            what: Some(event::What::Summary(Summary { value: vec![value] })),
        })
    }

    /// Append every `(step, value)` of a series under `tag`.
    ///
    /// # Errors
    ///
    /// Propagates IO errors.
    pub fn add_series(
        &mut self,
        tag: &str,
        points: impl IntoIterator<Item = (i64, f64)>,
    ) -> Result<()> {
        for (step, value) in points {
            self.add_scalar(tag, step, value)?;
        }
        Ok(())
    }

    /// Flush and close the file, returning its path.
    ///
    /// # Errors
    ///
    /// Propagates IO errors from the final flush.
    pub fn close(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }

    fn write_event(&mut self, event: Event) -> Result<()> {
        self.writer.write_record(&event.encode_to_vec())?;
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn wall_time() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

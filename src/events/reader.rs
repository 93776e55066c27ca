//! Run discovery and event file loading

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, info, warn};

use super::proto::{event, Event};
use super::record::{RecordError, RecordReader};
use crate::run::{RunRecord, RunScalars, RunStore};
use crate::{Error, Result};

/// Substring every TensorBoard event file name contains
pub const EVENT_FILE_MARKER: &str = "tfevents";

/// Directories matching `pattern`, sorted by path.
///
/// # Errors
///
/// - [`Error::Pattern`] for an invalid glob
/// - [`Error::NoRunsFound`] if no directory matches
pub fn discover_runs(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry.map_err(glob::GlobError::into_error)?;
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    if dirs.is_empty() {
        return Err(Error::NoRunsFound {
            pattern: pattern.to_string(),
        });
    }
    Ok(dirs)
}

/// Load every run directory matching `pattern`, in path order.
///
/// Series come back in log order; call [`RunStore::finalize`] to put them in
/// step order.
///
/// # Errors
///
/// Discovery errors from [`discover_runs`], or any error from [`load_run`].
pub fn load_runs(pattern: &str) -> Result<RunStore> {
    let dirs = discover_runs(pattern)?;
    info!(pattern, runs = dirs.len(), "discovered run directories");

    #[cfg(feature = "parallel")]
    let runs = {
        use rayon::prelude::*;
        dirs.par_iter()
            .map(|dir| load_run(dir))
            .collect::<Result<Vec<_>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let runs = dirs
        .iter()
        .map(|dir| load_run(dir))
        .collect::<Result<Vec<_>>>()?;

    Ok(runs.into_iter().collect())
}

/// Load all scalar series from the event files directly inside `dir`.
///
/// Event files are read in file name order, which for TensorBoard's
/// timestamped names is creation order.
///
/// # Errors
///
/// - [`Error::Io`] if the directory or a file cannot be read
/// - [`Error::CorruptRecord`] on a checksum or decoding failure
pub fn load_run(dir: &Path) -> Result<RunScalars> {
    let mut scalars = RunScalars::new(RunRecord::new(dir));
    let mut scalar_tags = HashSet::new();
    let files = event_files(dir)?;
    if files.is_empty() {
        warn!(run = %dir.display(), "no event files in run directory");
    }
    for file in files {
        let points = read_event_file(&file, &mut scalars, &mut scalar_tags)?;
        debug!(file = %file.display(), points, "loaded event file");
    }
    Ok(scalars)
}

fn event_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_event_file = entry.file_name().to_string_lossy().contains(EVENT_FILE_MARKER);
        if is_event_file && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Append every scalar in `path` to `scalars`; returns the number of points.
///
/// `scalar_tags` collects tags whose metadata marked them as scalars, so
/// later tensor values of those tags are accepted without metadata.
fn read_event_file(
    path: &Path,
    scalars: &mut RunScalars,
    scalar_tags: &mut HashSet<String>,
) -> Result<usize> {
    let corrupt = |reason: String| Error::CorruptRecord {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = RecordReader::new(BufReader::new(File::open(path)?));
    let mut points = 0;
    loop {
        let data = match reader.read_record() {
            Ok(Some(data)) => data,
            Ok(None) => break,
            Err(RecordError::Truncated) => {
                warn!(file = %path.display(), "ignoring truncated trailing record");
                break;
            }
            Err(RecordError::Checksum(part)) => {
                return Err(corrupt(format!("{part} checksum mismatch")));
            }
            Err(RecordError::Io(e)) => return Err(e.into()),
        };

        let event = Event::decode(data.as_slice()).map_err(|e| corrupt(e.to_string()))?;
        let Some(event::What::Summary(summary)) = event.what else {
            continue;
        };
        for value in &summary.value {
            if value.is_scalar_summary() && !scalar_tags.contains(&value.tag) {
                scalar_tags.insert(value.tag.clone());
            }
            if let Some(scalar) = value.scalar(scalar_tags.contains(&value.tag)) {
                scalars.series_mut(&value.tag).push(event.step, scalar);
                points += 1;
            }
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::proto::{
        summary, PluginData, Summary, SummaryMetadata, TensorProto, DT_FLOAT, SCALARS_PLUGIN,
    };
    use crate::events::record::RecordWriter;
    use crate::events::EventWriter;

    fn tensor_event(tag: &str, step: i64, value: f32, with_metadata: bool) -> Event {
        let metadata = with_metadata.then(|| SummaryMetadata {
            plugin_data: Some(PluginData {
                plugin_name: SCALARS_PLUGIN.to_string(),
            }),
            data_class: 0,
        });
        Event {
            wall_time: 0.0,
            step,
            what: Some(event::What::Summary(Summary {
                value: vec![summary::Value {
                    tag: tag.to_string(),
                    metadata,
                    kind: Some(summary::value::Kind::Tensor(TensorProto {
                        dtype: DT_FLOAT,
                        tensor_content: value.to_le_bytes().to_vec(),
                        float_val: vec![],
                        double_val: vec![],
                    })),
                }],
            })),
        }
    }

    fn write_events(path: &Path, events: &[Event]) {
        let mut writer = RecordWriter::new(Vec::new());
        for event in events {
            writer.write_record(&event.encode_to_vec()).unwrap();
        }
        fs::write(path, writer.into_inner()).unwrap();
    }

    #[test]
    fn test_discover_runs_sorted_dirs_only() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["run-b", "run-a"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        fs::write(tmp.path().join("run-c"), b"not a dir").unwrap();

        let pattern = format!("{}/run-*", tmp.path().display());
        let dirs = discover_runs(&pattern).unwrap();
        assert_eq!(dirs, vec![tmp.path().join("run-a"), tmp.path().join("run-b")]);
    }

    #[test]
    fn test_discover_runs_none() {
        let tmp = tempfile::tempdir().unwrap();
        let pattern = format!("{}/missing-*", tmp.path().display());
        assert!(matches!(
            discover_runs(&pattern),
            Err(Error::NoRunsFound { .. })
        ));
    }

    #[test]
    fn test_load_run_reads_written_scalars() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = EventWriter::create(tmp.path()).unwrap();
        writer.add_scalar("loss", 0, 1.0).unwrap();
        writer.add_scalar("loss", 1, 0.5).unwrap();
        writer.add_scalar("acc", 1, 0.25).unwrap();
        writer.close().unwrap();

        let run = load_run(tmp.path()).unwrap();
        assert_eq!(run.tag_count(), 2);
        assert_eq!(run.get("loss").unwrap().values(), &[1.0, 0.5]);
        assert_eq!(run.get("acc").unwrap().steps(), &[1]);
    }

    #[test]
    fn test_load_run_detects_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = EventWriter::create(tmp.path()).unwrap();
        writer.add_scalar("loss", 0, 1.0).unwrap();
        let file = writer.close().unwrap();

        let mut bytes = fs::read(&file).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&file, bytes).unwrap();

        assert!(matches!(
            load_run(tmp.path()),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_load_run_tolerates_truncated_tail() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = EventWriter::create(tmp.path()).unwrap();
        writer.add_scalar("loss", 0, 1.0).unwrap();
        writer.add_scalar("loss", 1, 2.0).unwrap();
        let file = writer.close().unwrap();

        let bytes = fs::read(&file).unwrap();
        fs::write(&file, &bytes[..bytes.len() - 3]).unwrap();

        let run = load_run(tmp.path()).unwrap();
        assert_eq!(run.get("loss").unwrap().steps(), &[0]);
    }

    #[test]
    fn test_tf2_scalars_with_metadata_on_first_value_only() {
        let tmp = tempfile::tempdir().unwrap();
        write_events(
            &tmp.path().join("events.out.tfevents.1.host"),
            &[
                tensor_event("loss", 0, 1.0, true),
                tensor_event("loss", 1, 0.5, false),
                tensor_event("loss", 2, 0.25, false),
                tensor_event("image_stats", 0, 9.0, false),
            ],
        );

        let run = load_run(tmp.path()).unwrap();
        let loss = run.get("loss").unwrap();
        assert_eq!(loss.steps(), &[0, 1, 2]);
        assert_eq!(loss.values(), &[1.0, 0.5, 0.25]);
        assert!(!run.has_tag("image_stats"));
    }

    #[test]
    fn test_tf2_scalar_tags_carry_across_files_of_a_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_events(
            &tmp.path().join("events.out.tfevents.1.host"),
            &[tensor_event("loss", 0, 1.0, true)],
        );
        write_events(
            &tmp.path().join("events.out.tfevents.2.host"),
            &[tensor_event("loss", 1, 0.5, false)],
        );

        let run = load_run(tmp.path()).unwrap();
        assert_eq!(run.get("loss").unwrap().steps(), &[0, 1]);
    }

    #[test]
    fn test_load_run_survives_huge_declared_length() {
        use crate::events::crc::masked_crc32c;

        let tmp = tempfile::tempdir().unwrap();
        let mut writer = EventWriter::create(tmp.path()).unwrap();
        writer.add_scalar("loss", 0, 1.0).unwrap();
        let file = writer.close().unwrap();

        let len = (1u64 << 62).to_le_bytes();
        let mut bytes = fs::read(&file).unwrap();
        bytes.extend_from_slice(&len);
        bytes.extend_from_slice(&masked_crc32c(&len).to_le_bytes());
        bytes.extend_from_slice(b"short");
        fs::write(&file, bytes).unwrap();

        let run = load_run(tmp.path()).unwrap();
        assert_eq!(run.get("loss").unwrap().steps(), &[0]);
    }
}

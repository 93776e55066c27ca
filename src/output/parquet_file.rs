//! Parquet table output (Arrow columnar format)
//!
//! The two-level `(tag, op)` header is flattened into `<tag>/<op>` column
//! names. Each column also carries `tag` and `reduce_op` field metadata so
//! readers never have to split on `/` (tags often contain slashes).

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::table::ReducedTable;
use crate::{Error, Result};

/// Metadata key holding a column's tag
pub const TAG_METADATA_KEY: &str = "tag";
/// Metadata key holding a column's reduce op
pub const OP_METADATA_KEY: &str = "reduce_op";

/// Convert a table to one Arrow record batch.
///
/// # Errors
///
/// Returns [`Error::Arrow`] if the batch cannot be assembled.
pub fn to_record_batch(table: &ReducedTable) -> Result<RecordBatch> {
    let mut fields = vec![Field::new("step", DataType::Int64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(Int64Array::from(table.steps().to_vec()))];

    for column in table.columns() {
        let metadata = HashMap::from([
            (TAG_METADATA_KEY.to_string(), column.tag.clone()),
            (OP_METADATA_KEY.to_string(), column.op.clone()),
        ]);
        fields.push(
            Field::new(format!("{}/{}", column.tag, column.op), DataType::Float64, true)
                .with_metadata(metadata),
        );
        arrays.push(Arc::new(Float64Array::from(column.values.clone())));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Write a table to a Parquet file.
///
/// # Errors
///
/// Returns [`Error::Io`], [`Error::Arrow`] or [`Error::Parquet`] on failure.
pub fn write_parquet(table: &ReducedTable, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = File::create(path)?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Read a Parquet file back into record batches.
///
/// # Errors
///
/// Returns error if file cannot be read or parsed
pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<RecordBatch>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    reader
        .map(|batch| batch.map_err(Error::from))
        .collect()
}

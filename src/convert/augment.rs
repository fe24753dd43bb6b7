//! Whole-file copy of an already-columnar input with a synthetic `id` column.

use crate::config::ColumnarCodec;
use crate::convert::ColumnarFile;
use crate::error::{ResourceContext, Result};
use crate::io::atomic::AtomicFile;
use crate::io::parquet::{read_all_batches, writer_properties};
use arrow::array::{ArrayRef, Int64Array};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Name of the injected row-number column.
pub const ID_COLUMN: &str = "id";

/// Copy `src` to `dest`, adding an `id` column numbered `1..=N` in stored row order.
///
/// All original columns and values are kept in order. If `src` already has an `id`
/// column it is replaced in place; otherwise `id` is appended as the last column.
///
/// # Errors
/// Returns [`crate::RosterError::Resource`] if reading, rebuilding, or writing fails.
pub fn augment_with_id(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    codec: ColumnarCodec,
) -> Result<ColumnarFile> {
    let src = src.as_ref();
    let dest = dest.as_ref();
    let (schema, batches) = read_all_batches(src)?;
    let table = concat_batches(&schema, &batches)
        .with_resource(|| format!("concatenate batches of {}", src.display()))?;
    let augmented = with_id_column(&table)
        .with_resource(|| format!("add `{ID_COLUMN}` column to {}", src.display()))?;

    let out = AtomicFile::create(dest)?;
    let mut writer = ArrowWriter::try_new(out, augmented.schema(), Some(writer_properties(codec)))
        .with_resource(|| format!("create ArrowWriter for {}", dest.display()))?;
    writer
        .write(&augmented)
        .with_resource(|| format!("write {}", dest.display()))?;
    let out = writer
        .into_inner()
        .with_resource(|| format!("close ArrowWriter for {}", dest.display()))?;
    let path = out.commit()?;

    let rows = augmented.num_rows() as u64;
    info!(src = %src.display(), dest = %path.display(), rows, "augmented columnar file");
    Ok(ColumnarFile {
        path,
        schema: augmented.schema(),
        rows,
    })
}

/// Return `batch` with an `id` column holding `1..=num_rows`.
///
/// # Errors
/// Returns an Arrow error if the rebuilt batch is inconsistent.
pub fn with_id_column(batch: &RecordBatch) -> arrow::error::Result<RecordBatch> {
    let n = batch.num_rows() as i64;
    let ids: ArrayRef = Arc::new(Int64Array::from_iter_values(1..=n));
    let id_field = Arc::new(Field::new(ID_COLUMN, DataType::Int64, false));

    let schema = batch.schema();
    let mut fields: Vec<_> = schema.fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    match schema.index_of(ID_COLUMN) {
        Ok(idx) => {
            fields[idx] = id_field;
            columns[idx] = ids;
        }
        Err(_) => {
            fields.push(id_field);
            columns.push(ids);
        }
    }
    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    RecordBatch::try_new(Arc::new(schema), columns)
}

//! Parquet helpers shared by conversion, augmentation, and table loading.
//!
//! This module provides:
//! - [`writer_properties`] mapping a [`ColumnarCodec`] to Parquet writer settings
//! - [`open_batches`] for a projected, batched Arrow reader over one file
//! - [`read_all_batches`] for whole-file reads (the augmenter's input path)
//! - [`parquet_row_count`] / [`parquet_row_groups`] from footer metadata
//! - typed [`write_parquet_vec`] / [`read_parquet_vec`] via `serde_arrow`, used for
//!   fixtures and assertions where the row type is known at compile time
//!
//! Uses Arrow 58 and `serde_arrow` 0.14 (`SchemaLike::from_type`,
//! `to_record_batch`/`from_record_batch`).

use crate::config::ColumnarCodec;
use crate::io::atomic::AtomicFile;
use anyhow::{Context, Result};
use arrow::datatypes::{FieldRef, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{Serialize, de::DeserializeOwned};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use serde_arrow::{from_record_batch, to_record_batch};
use std::fs::File;
use std::path::Path;

/// Rows per Arrow batch when reading whole files.
pub const READ_BATCH_SIZE: usize = 64 * 1024;

/// Writer settings for the given codec.
#[must_use]
pub fn writer_properties(codec: ColumnarCodec) -> WriterProperties {
    WriterProperties::builder()
        .set_compression(codec.compression())
        .build()
}

/// Open a batched reader over `path`, keeping only the top-level columns in `roots`.
///
/// `roots` are indices into the file's Arrow schema as returned by [`file_schema`].
/// `None` reads every column.
///
/// # Errors
/// Returns an error if the file cannot be opened or the reader cannot be built.
pub fn open_batches(
    path: impl AsRef<Path>,
    roots: Option<&[usize]>,
    batch_size: usize,
) -> Result<ParquetRecordBatchReader> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(f)
        .with_context(|| format!("open ParquetRecordBatchReader for {}", path.display()))?;
    if let Some(roots) = roots {
        let mask = ProjectionMask::roots(builder.parquet_schema(), roots.iter().copied());
        builder = builder.with_projection(mask);
    }
    builder
        .with_batch_size(batch_size.max(1))
        .build()
        .with_context(|| format!("build ParquetRecordBatchReader for {}", path.display()))
}

/// The Arrow schema stored in a Parquet file's footer.
///
/// # Errors
/// Returns an error if the file cannot be opened or its metadata is unreadable.
pub fn file_schema(path: impl AsRef<Path>) -> Result<SchemaRef> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(f)
        .with_context(|| format!("read Parquet metadata of {}", path.display()))?;
    Ok(builder.schema().clone())
}

/// Read an entire file into memory as Arrow batches, returning its schema alongside.
///
/// # Errors
/// Returns an error if the file cannot be opened or any batch fails to decode.
pub fn read_all_batches(path: impl AsRef<Path>) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let path = path.as_ref();
    let reader = open_batches(path, None, READ_BATCH_SIZE)?;
    let schema = reader.schema();
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("read batches from {}", path.display()))?;
    Ok((schema, batches))
}

/// Total row count from the footer, without decoding any data page.
///
/// # Errors
/// Returns an error if the file cannot be opened or its metadata is unreadable.
pub fn parquet_row_count(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(f)
        .with_context(|| format!("read Parquet metadata of {}", path.display()))?;
    let rows = builder.metadata().file_metadata().num_rows();
    Ok(u64::try_from(rows).unwrap_or(0))
}

/// Number of row groups in the file.
///
/// # Errors
/// Returns an error if the file cannot be opened or its metadata is unreadable.
pub fn parquet_row_groups(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(f)
        .with_context(|| format!("read Parquet metadata of {}", path.display()))?;
    Ok(builder.metadata().num_row_groups())
}

/// Write a typed slice to a Parquet file, replacing it atomically.
///
/// The Arrow schema is inferred from `T` (works even if `data` is empty).
///
/// # Errors
/// An error is returned if schema inference, conversion, file creation, or writing fails.
pub fn write_parquet_vec<T: Serialize + serde::Deserialize<'static>>(
    path: impl AsRef<Path>,
    data: &[T],
    codec: ColumnarCodec,
) -> Result<usize> {
    let path = path.as_ref();
    let fields: Vec<FieldRef> = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())
        .context("infer Arrow schema from type T")?;
    let batch: RecordBatch = to_record_batch(&fields, &data).context("convert rows to RecordBatch")?;

    let out = AtomicFile::create(path)?;
    let mut writer = ArrowWriter::try_new(out, batch.schema(), Some(writer_properties(codec)))
        .context("create ArrowWriter")?;
    writer.write(&batch).context("write batch to parquet")?;
    let out = writer.into_inner().context("close ArrowWriter")?;
    out.commit()?;
    Ok(data.len())
}

/// Read a Parquet file into a typed `Vec<T>`.
///
/// # Errors
/// Returns an error if the file cannot be read or conversion to `T` fails.
pub fn read_parquet_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let reader = open_batches(path, None, READ_BATCH_SIZE)?;
    let mut out: Vec<T> = Vec::new();
    for batch in reader {
        let batch = batch.with_context(|| format!("read batch from {}", path.display()))?;
        let mut rows: Vec<T> =
            from_record_batch(&batch).context("deserialize RecordBatch rows to T")?;
        out.append(&mut rows);
    }
    Ok(out)
}

//! Streaming delimited-text to Parquet conversion.
//!
//! The conversion is an explicit two-phase protocol:
//! 1. [`ColumnarWriter::open`] fixes the schema and opens the output for appending.
//! 2. [`ColumnarWriter::append`] writes each normalized chunk as its own row group,
//!    rejecting any chunk whose columns differ from the fixed schema.
//!
//! [`ColumnarWriter::close`] writes the footer and moves the file into place. A writer
//! dropped without `close` (for example after a schema violation) leaves nothing at
//! the destination.

use crate::config::ColumnarCodec;
use crate::convert::normalize::ChunkNormalizer;
use crate::convert::reader::DelimitedReader;
use crate::convert::ColumnarFile;
use crate::error::{ResourceContext, Result, RosterError};
use crate::io::atomic::AtomicFile;
use crate::io::parquet::writer_properties;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Append-only Parquet writer bound to one fixed schema.
pub struct ColumnarWriter {
    dest: PathBuf,
    schema: SchemaRef,
    writer: ArrowWriter<AtomicFile>,
    rows: u64,
    chunks: usize,
}

impl ColumnarWriter {
    /// Open `dest` for appending chunks that match `schema`.
    ///
    /// # Errors
    /// Returns [`RosterError::Resource`] if the output cannot be created.
    pub fn open(dest: impl AsRef<Path>, schema: SchemaRef, codec: ColumnarCodec) -> Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        let out = AtomicFile::create(&dest)?;
        let writer = ArrowWriter::try_new(out, Arc::clone(&schema), Some(writer_properties(codec)))
            .with_resource(|| format!("create ArrowWriter for {}", dest.display()))?;
        debug!(path = %dest.display(), columns = schema.fields().len(), ?codec, "opened columnar writer");
        Ok(Self {
            dest,
            schema,
            writer,
            rows: 0,
            chunks: 0,
        })
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Append one chunk as a single row group.
    ///
    /// # Errors
    /// Returns [`RosterError::SchemaViolation`] if the chunk's column names, order, or
    /// types differ from the fixed schema, or [`RosterError::Resource`] on write failure.
    pub fn append(&mut self, chunk: &RecordBatch) -> Result<()> {
        if chunk.schema().fields() != self.schema.fields() {
            let got: Vec<&str> = chunk.schema_ref().fields().iter().map(|f| f.name().as_str()).collect();
            let want: Vec<&str> = self.schema.fields().iter().map(|f| f.name().as_str()).collect();
            return Err(RosterError::schema(
                &self.dest,
                format!("chunk #{} has columns {got:?}, expected {want:?}", self.chunks + 1),
            ));
        }
        self.writer
            .write(chunk)
            .with_resource(|| format!("append chunk to {}", self.dest.display()))?;
        self.writer
            .flush()
            .with_resource(|| format!("flush row group to {}", self.dest.display()))?;
        self.rows += chunk.num_rows() as u64;
        self.chunks += 1;
        debug!(path = %self.dest.display(), chunk = self.chunks, rows = chunk.num_rows(), "appended chunk");
        Ok(())
    }

    /// Finish the file and move it into place.
    ///
    /// # Errors
    /// Returns [`RosterError::Resource`] if the footer or the rename fails.
    pub fn close(self) -> Result<ColumnarFile> {
        let out = self
            .writer
            .into_inner()
            .with_resource(|| format!("close ArrowWriter for {}", self.dest.display()))?;
        let path = out.commit()?;
        Ok(ColumnarFile {
            path,
            schema: self.schema,
            rows: self.rows,
        })
    }
}

/// Convert one delimited file into `dest`, one chunk of `batch_size` rows at a time.
///
/// The schema comes from the header label of the file; every chunk, including the
/// first, is normalized and checked against it before being appended. A header-only
/// file produces a valid zero-row output.
///
/// # Errors
/// Returns [`RosterError::SchemaViolation`] on the first malformed row (nothing is
/// left at `dest`), [`RosterError::EmptyInput`] for a file without a header, or
/// [`RosterError::Resource`] on I/O failures.
pub fn convert_delimited(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    sep: char,
    batch_size: usize,
    codec: ColumnarCodec,
) -> Result<ColumnarFile> {
    let src = src.as_ref();
    let mut reader = DelimitedReader::open(src, batch_size)?;
    let normalizer = ChunkNormalizer::from_header(src, reader.header(), sep)?;

    let mut writer = ColumnarWriter::open(dest, normalizer.schema(), codec)?;
    while let Some(raw) = reader.next_batch()? {
        let chunk = normalizer.normalize(&raw)?;
        writer.append(&chunk)?;
    }
    let out = writer.close()?;
    info!(
        src = %src.display(),
        dest = %out.path.display(),
        rows = out.rows,
        "converted delimited file"
    );
    Ok(out)
}

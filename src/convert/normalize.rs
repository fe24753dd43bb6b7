//! Turning a raw batch of packed rows into a typed Arrow chunk.
//!
//! Raw delimited files carry a single logical column whose header label and cells
//! both pack several fields with the same separator (`fname_lname_cid` over rows
//! like `A_B_1`). Normalizing fans those out into one Arrow column per field, named
//! after the pieces of the header label.

use crate::convert::split::{header_columns, split_fields};
use crate::error::{ResourceContext, Result, RosterError};
use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Rows read from a delimited file, still packed, with their 1-based line numbers.
#[derive(Clone, Debug, Default)]
pub struct RawBatch {
    pub rows: Vec<String>,
    pub lines: Vec<u64>,
}

impl RawBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Splits raw batches of one file against the column layout taken from its header.
#[derive(Clone, Debug)]
pub struct ChunkNormalizer {
    source: PathBuf,
    sep: char,
    schema: SchemaRef,
}

impl ChunkNormalizer {
    /// Derive the canonical columns from the header `label`.
    ///
    /// # Errors
    /// Returns [`RosterError::SchemaViolation`] if the label yields an empty or duplicate
    /// column name.
    pub fn from_header(source: impl AsRef<Path>, label: &str, sep: char) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        let names = header_columns(label, sep);
        let mut fields = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(RosterError::schema(
                    &source,
                    format!("header `{label}` has an empty column name at position {idx}"),
                ));
            }
            if names[..idx].contains(name) {
                return Err(RosterError::schema(
                    &source,
                    format!("header `{label}` repeats column `{name}`"),
                ));
            }
            fields.push(Field::new(name, DataType::Utf8, false));
        }
        Ok(Self {
            source,
            sep,
            schema: Arc::new(Schema::new(fields)),
        })
    }

    /// Column layout every chunk from this normalizer carries.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Split every row of `batch` into a new chunk. The batch itself is not modified.
    ///
    /// # Errors
    /// Returns [`RosterError::SchemaViolation`] naming the first row whose field count
    /// differs from the header's.
    pub fn normalize(&self, batch: &RawBatch) -> Result<RecordBatch> {
        let width = self.schema.fields().len();
        let mut builders: Vec<StringBuilder> = (0..width)
            .map(|_| StringBuilder::with_capacity(batch.len(), batch.len() * 8))
            .collect();

        for (idx, row) in batch.rows.iter().enumerate() {
            let fields = split_fields(row, self.sep);
            if fields.len() != width {
                let line = batch.lines.get(idx).copied().unwrap_or(idx as u64 + 1);
                return Err(RosterError::schema(
                    &self.source,
                    format!(
                        "line {line}: `{row}` splits into {} fields, header has {width}",
                        fields.len()
                    ),
                ));
            }
            for (builder, value) in builders.iter_mut().zip(fields) {
                builder.append_value(value);
            }
        }

        let columns: Vec<ArrayRef> = builders
            .into_iter()
            .map(|mut b| Arc::new(b.finish()) as ArrayRef)
            .collect();
        RecordBatch::try_new(self.schema(), columns)
            .with_resource(|| format!("assemble chunk for {}", self.source.display()))
    }
}

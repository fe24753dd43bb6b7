//! Normalizing heterogeneous inputs into cleaned Parquet files.
//!
//! Delimited text inputs stream through [`writer::convert_delimited`] in fixed-size
//! chunks under one schema; inputs that are already columnar get a whole-file copy
//! with an `id` column via [`augment::augment_with_id`]. [`orchestrator::convert_all`]
//! routes each configured input by extension and returns the cleaned files in input
//! order.

pub mod augment;
pub mod normalize;
pub mod orchestrator;
pub mod reader;
pub mod split;
pub mod writer;

use crate::io::compression::strip_compression_suffix;
use arrow::datatypes::SchemaRef;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Extension (without the dot) of every cleaned output file.
pub const COLUMNAR_EXTENSION: &str = "parquet";

/// Prefix of every cleaned output file name.
pub const CLEANED_PREFIX: &str = "cleaned_";

/// Input format as decided by the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    DelimitedText,
    Columnar,
}

impl InputFormat {
    /// Classify `path` by its extension, ignoring a trailing compression suffix.
    ///
    /// `csv` is delimited text; `parquet` and `pq` are columnar. Anything else is
    /// `None`. Compressed columnar files are not recognized since Parquet compresses
    /// internally.
    pub fn classify(path: impl AsRef<Path>) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?;
        let stripped = strip_compression_suffix(name);
        let compressed = stripped.len() != name.len();
        let ext = Path::new(stripped).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::DelimitedText),
            "parquet" | "pq" if !compressed => Some(Self::Columnar),
            _ => None,
        }
    }
}

/// A cleaned columnar file produced by the conversion step.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnarFile {
    pub path: PathBuf,
    #[serde(serialize_with = "column_names")]
    pub schema: SchemaRef,
    pub rows: u64,
}

impl ColumnarFile {
    /// Column names in schema order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }
}

fn column_names<S: Serializer>(schema: &SchemaRef, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(schema.fields().iter().map(|f| f.name()))
}

/// Output name for an input: `cleaned_<stem>.parquet` for delimited text and
/// `cleaned_<file name>` for columnar inputs.
///
/// The stem is everything before the first `.` of the file name, so
/// `students.csv.gz` becomes `cleaned_students.parquet`.
#[must_use]
pub fn cleaned_file_name(input: &Path, format: InputFormat) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match format {
        InputFormat::DelimitedText => {
            let stem = name.split('.').next().unwrap_or_default();
            format!("{CLEANED_PREFIX}{stem}.{COLUMNAR_EXTENSION}")
        }
        InputFormat::Columnar => format!("{CLEANED_PREFIX}{name}"),
    }
}

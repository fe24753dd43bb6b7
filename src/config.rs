//! Job configuration passed explicitly through every stage.
//!
//! A [`JobConfig`] names the ordered input files (their order decides which table is
//! the student side and which is the teacher side), the report destination, and the
//! knobs for conversion and joining. It round-trips through JSON so a job can live in
//! a file next to its inputs:
//!
//! ```json
//! {
//!   "inputs": ["data/students.csv", "data/teachers.parquet"],
//!   "output": "out/report.json",
//!   "batch_size": 100
//! }
//! ```

use crate::error::{ResourceContext, Result, RosterError};
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Rows per chunk when streaming delimited text.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Separator between packed fields inside one raw row.
pub const DEFAULT_DELIMITER: char = '_';

/// Compression codec for the columnar files the conversion step writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnarCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Uncompressed,
}

impl ColumnarCodec {
    /// The Parquet compression setting for this codec.
    #[must_use]
    pub fn compression(self) -> Compression {
        match self {
            Self::Snappy => Compression::SNAPPY,
            Self::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Self::Gzip => Compression::GZIP(GzipLevel::default()),
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Layout of the materialized join report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One JSON array holding every record.
    #[default]
    Json,
    /// One compact JSON object per line.
    JsonLines,
}

/// What to do with an input whose extension is neither delimited nor columnar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Log a warning and leave the file out of the converted list.
    #[default]
    Skip,
    /// Abort the run with [`RosterError::UnsupportedFormat`].
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Ordered inputs; position 0 is the student table, position 1 the teacher table.
    pub inputs: Vec<PathBuf>,
    /// Destination of the join report. Overwritten if present.
    pub output: PathBuf,
    /// Directory that receives the `cleaned_*` columnar files.
    pub work_dir: PathBuf,
    pub batch_size: usize,
    pub delimiter: char,
    pub codec: ColumnarCodec,
    pub report_format: ReportFormat,
    pub unsupported: UnsupportedPolicy,
    /// Convert independent inputs on the rayon pool instead of one after another.
    pub parallel_conversion: bool,
    /// Join partitions; defaults to twice the CPU count.
    pub partitions: Option<usize>,
    /// Worker threads for the join session; defaults to the CPU count.
    pub threads: Option<usize>,
    /// Sort report records by class ID, then student, then teacher.
    pub sort_report: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from("report.json"),
            work_dir: PathBuf::from("."),
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: DEFAULT_DELIMITER,
            codec: ColumnarCodec::default(),
            report_format: ReportFormat::default(),
            unsupported: UnsupportedPolicy::default(),
            parallel_conversion: false,
            partitions: None,
            threads: None,
            sort_report: false,
        }
    }
}

impl JobConfig {
    /// A config with the given inputs and report path and defaults for everything else.
    pub fn new<I, P>(inputs: I, output: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: output.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not valid JSON for this shape.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_resource(|| format!("open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .with_resource(|| format!("parse job config {}", path.display()))
    }

    /// Apply overrides from environment variables, falling back to current values.
    ///
    /// - `ROSTERFLOW_BATCH_SIZE`: rows per chunk
    /// - `ROSTERFLOW_WORK_DIR`: directory for cleaned columnar files
    /// - `ROSTERFLOW_THREADS`: join session worker threads
    /// - `ROSTERFLOW_PARTITIONS`: join partitions
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<usize>("ROSTERFLOW_BATCH_SIZE") {
            self.batch_size = v;
        }
        if let Ok(dir) = std::env::var("ROSTERFLOW_WORK_DIR")
            && !dir.trim().is_empty()
        {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_parse::<usize>("ROSTERFLOW_THREADS") {
            self.threads = Some(v);
        }
        if let Some(v) = env_parse::<usize>("ROSTERFLOW_PARTITIONS") {
            self.partitions = Some(v);
        }
        self
    }

    /// Check the values every stage relies on.
    ///
    /// # Errors
    /// Returns [`RosterError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(RosterError::Config("no input files configured".into()));
        }
        if self.batch_size == 0 {
            return Err(RosterError::Config("batch_size must be greater than zero".into()));
        }
        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(RosterError::Config("delimiter cannot be a line terminator".into()));
        }
        if self.threads == Some(0) {
            return Err(RosterError::Config("threads must be greater than zero".into()));
        }
        if self.partitions == Some(0) {
            return Err(RosterError::Config("partitions must be greater than zero".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(RosterError::Config("output path is empty".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

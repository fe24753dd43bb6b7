//! # Rosterflow
//!
//! A small **batch job** that normalizes heterogeneous roster files into Parquet and
//! joins a student table with a teacher table into a JSON report.
//!
//! ## Stages
//!
//! - **Convert** ([`convert`]): every configured input is routed by extension.
//!   Delimited text (`.csv`, optionally `.gz`/`.zst`/`.bz2`/`.xz` compressed) whose
//!   single column packs several fields behind a `_` separator is streamed in
//!   fixed-size chunks, split, and written to `cleaned_<stem>.parquet` with one row
//!   group per chunk and one schema for the whole file. Parquet inputs are copied to
//!   `cleaned_<file>` with a 1-based `id` column. Unknown extensions are skipped.
//! - **Load** ([`table`], [`session`]): each cleaned file is registered in a scoped
//!   [`Session`] under its stem, projected to `fname`, `lname`, `cid`, with column
//!   types inferred from the data.
//! - **Join** ([`join`]): the first table (students) is inner-joined with the second
//!   (teachers) on `cid`, producing `student name`, `teacher name`, `class ID`.
//! - **Report** ([`report`]): the records are written atomically as a JSON array or
//!   JSON Lines.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rosterflow::{JobConfig, run};
//!
//! # fn main() -> rosterflow::Result<()> {
//! let config = JobConfig::new(["data/students.csv", "data/teachers.parquet"], "out/report.json")
//!     .with_work_dir("out")
//!     .with_batch_size(100);
//! let summary = run(&config)?;
//! println!("{} records in {}", summary.records, summary.report.display());
//! # Ok(()) }
//! ```
//!
//! ## Errors
//!
//! Library functions return [`Result`] with a [`RosterError`]; the lower-level file
//! helpers in [`io`] return `anyhow::Result` and convert on `?`.
//!
//! ## Features
//!
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`, `compression-xz`
//!   (all default): transparent decompression of delimited inputs.

pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod join;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod table;
pub mod testing;
pub mod value;

pub use config::{ColumnarCodec, JobConfig, ReportFormat, UnsupportedPolicy};
pub use convert::ColumnarFile;
pub use convert::orchestrator::{ConversionOutput, convert_all};
pub use error::{Result, RosterError};
pub use join::{JoinRecord, TableRole};
pub use pipeline::{RunSummary, run};
pub use report::write_report;
pub use session::{Session, SessionBuilder};
pub use table::{RosterRow, Table, load_table};
pub use value::{ColumnType, Value};

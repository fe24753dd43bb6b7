//! Fixtures and assertions for exercising roster jobs against real files.
//!
//! Everything here writes to a caller-provided directory (usually a
//! `tempfile::TempDir`) so tests stay hermetic.
//!
//! ```no_run
//! use rosterflow::testing::*;
//! use rosterflow::{JobConfig, run};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let students = write_delimited(dir.path().join("students.csv"), STUDENT_HEADER, &["A_B_1", "C_D_1"])?;
//! let teachers = write_roster_parquet(dir.path().join("teachers.parquet"), &[RosterRecord::new("E", "F", 1)])?;
//!
//! let config = JobConfig::new([students, teachers], dir.path().join("report.json"))
//!     .with_work_dir(dir.path());
//! let summary = run(&config)?;
//! assert_eq!(summary.records, 2);
//! # Ok(()) }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

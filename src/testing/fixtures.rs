//! Sample rosters and helpers that write them in every supported input layout.

use crate::config::ColumnarCodec;
use crate::io::parquet::write_parquet_vec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header label of a packed student file.
pub const STUDENT_HEADER: &str = "fname_lname_cid";

/// A typed roster row, as stored in a columnar teacher file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterRecord {
    pub fname: String,
    pub lname: String,
    pub cid: i64,
}

impl RosterRecord {
    pub fn new(fname: &str, lname: &str, cid: i64) -> Self {
        Self {
            fname: fname.to_string(),
            lname: lname.to_string(),
            cid,
        }
    }

    /// The packed `fname_lname_cid` form of this row.
    #[must_use]
    pub fn packed(&self) -> String {
        format!("{}_{}_{}", self.fname, self.lname, self.cid)
    }
}

/// Students enrolled in classes 1 and 2, with class 2 shared by two students.
#[must_use]
pub fn sample_students() -> Vec<RosterRecord> {
    vec![
        RosterRecord::new("Ada", "Lovelace", 1),
        RosterRecord::new("Alan", "Turing", 2),
        RosterRecord::new("Grace", "Hopper", 2),
        RosterRecord::new("Edsger", "Dijkstra", 3),
    ]
}

/// Teachers for classes 2 through 4, with two teachers on class 2.
#[must_use]
pub fn sample_teachers() -> Vec<RosterRecord> {
    vec![
        RosterRecord::new("Barbara", "Liskov", 2),
        RosterRecord::new("Donald", "Knuth", 2),
        RosterRecord::new("Leslie", "Lamport", 3),
        RosterRecord::new("Niklaus", "Wirth", 4),
    ]
}

/// Write a single-column delimited file: `header`, then one line per row.
///
/// Rows are written as-is, so they should not contain commas or quotes.
pub fn write_delimited<S: AsRef<str>>(path: impl AsRef<Path>, header: &str, rows: &[S]) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    writeln!(w, "{header}")?;
    for row in rows {
        writeln!(w, "{}", row.as_ref())?;
    }
    w.flush()?;
    Ok(path.to_path_buf())
}

/// Write `records` as a packed student file with the standard header.
pub fn write_student_csv(path: impl AsRef<Path>, records: &[RosterRecord]) -> Result<PathBuf> {
    let rows: Vec<String> = records.iter().map(RosterRecord::packed).collect();
    write_delimited(path, STUDENT_HEADER, &rows)
}

/// Write `records` as a Snappy-compressed Parquet file with `fname`, `lname`, `cid`.
pub fn write_roster_parquet(path: impl AsRef<Path>, records: &[RosterRecord]) -> Result<PathBuf> {
    let path = path.as_ref();
    write_parquet_vec(path, records, ColumnarCodec::Snappy)?;
    Ok(path.to_path_buf())
}

/// Gzip `src` into `dest`.
#[cfg(feature = "compression-gzip")]
pub fn gzip_file(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PathBuf> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let (src, dest) = (src.as_ref(), dest.as_ref());
    let bytes = fs::read(src).with_context(|| format!("read {}", src.display()))?;
    let f = File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut enc = GzEncoder::new(f, Compression::default());
    enc.write_all(&bytes)?;
    enc.finish().context("finish gzip stream")?;
    Ok(dest.to_path_buf())
}

/// Read a report back as JSON values, accepting either a JSON array or JSON Lines.
pub fn read_report(path: impl AsRef<Path>) -> Result<Vec<serde_json::Value>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()));
    }
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, l)| {
            serde_json::from_str(l).with_context(|| format!("parse line {} of {}", i + 1, path.display()))
        })
        .collect()
}

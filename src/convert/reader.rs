//! Bounded-memory reading of a delimited text file in fixed-size raw batches.

use crate::convert::normalize::RawBatch;
use crate::error::{ResourceContext, Result, RosterError};
use crate::io::compression::open_decompressed;
use csv::StringRecord;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Streams packed rows from a CSV file, `batch_size` rows at a time.
///
/// Only the first CSV column is used; it holds the packed fields. Any further
/// fields on a record are dropped with a warning. Blank lines are skipped. At most one batch of rows is held in memory.
pub struct DelimitedReader {
    path: PathBuf,
    rdr: csv::Reader<Box<dyn Read + Send>>,
    header: String,
    batch_size: usize,
    record: StringRecord,
    done: bool,
}

impl DelimitedReader {
    /// Open `path` (decompressing if needed) and read its header line.
    ///
    /// # Errors
    /// Returns [`RosterError::EmptyInput`] if the file has no header, or
    /// [`RosterError::Resource`] if it cannot be opened or parsed.
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let input = open_decompressed(&path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        let header = rdr
            .headers()
            .with_resource(|| format!("read header of {}", path.display()))?
            .get(0)
            .map(str::to_string)
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| RosterError::EmptyInput { path: path.clone() })?;

        Ok(Self {
            path,
            rdr,
            header,
            batch_size: batch_size.max(1),
            record: StringRecord::new(),
            done: false,
        })
    }

    /// The raw header label (e.g. `fname_lname_cid`).
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next batch; `None` once the file is exhausted.
    ///
    /// Every batch except possibly the last holds exactly `batch_size` rows.
    ///
    /// # Errors
    /// Returns [`RosterError::Resource`] on read or CSV parse failures.
    pub fn next_batch(&mut self) -> Result<Option<RawBatch>> {
        if self.done {
            return Ok(None);
        }
        let mut batch = RawBatch {
            rows: Vec::with_capacity(self.batch_size),
            lines: Vec::with_capacity(self.batch_size),
        };
        while batch.len() < self.batch_size {
            let more = self
                .rdr
                .read_record(&mut self.record)
                .with_resource(|| format!("read record from {}", self.path.display()))?;
            if !more {
                self.done = true;
                break;
            }
            let line = self.record.position().map_or(0, csv::Position::line);
            if self.record.len() > 1 {
                warn!(
                    path = %self.path.display(),
                    line,
                    fields = self.record.len(),
                    "ignoring fields after the first column"
                );
            }
            batch.rows.push(self.record.get(0).unwrap_or_default().to_string());
            batch.lines.push(line);
        }
        Ok((!batch.is_empty()).then_some(batch))
    }
}

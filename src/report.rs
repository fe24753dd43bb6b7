//! Materializing the join result as a JSON document.

use crate::config::ReportFormat;
use crate::error::{ResourceContext, Result};
use crate::io::atomic::AtomicFile;
use crate::join::JoinRecord;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `records` to `path` in the given format, replacing any existing file.
///
/// - [`ReportFormat::Json`]: a single array of `{"student name", "teacher name",
///   "class ID"}` objects.
/// - [`ReportFormat::JsonLines`]: one compact object per line.
///
/// The report appears at `path` only once fully written.
///
/// # Errors
/// Returns [`crate::RosterError::Resource`] if serialization or any file operation fails.
pub fn write_report(path: impl AsRef<Path>, records: &[JoinRecord], format: ReportFormat) -> Result<PathBuf> {
    let path = path.as_ref();
    let out = AtomicFile::create(path)?;
    let mut w = BufWriter::new(out);
    match format {
        ReportFormat::Json => {
            serde_json::to_writer(&mut w, records)
                .with_resource(|| format!("serialize report to {}", path.display()))?;
            w.write_all(b"\n")
                .with_resource(|| format!("write {}", path.display()))?;
        }
        ReportFormat::JsonLines => {
            for (i, record) in records.iter().enumerate() {
                serde_json::to_writer(&mut w, record)
                    .with_resource(|| format!("serialize record #{} to {}", i, path.display()))?;
                w.write_all(b"\n")
                    .with_resource(|| format!("write {}", path.display()))?;
            }
        }
    }
    let out = w
        .into_inner()
        .map_err(|e| e.into_error())
        .with_resource(|| format!("flush {}", path.display()))?;
    let written = out.commit()?;
    info!(path = %written.display(), records = records.len(), ?format, "report written");
    Ok(written)
}

/// Sort records by class ID, then student name, then teacher name.
pub fn sort_records(records: &mut [JoinRecord]) {
    records.sort_by(JoinRecord::report_order);
}

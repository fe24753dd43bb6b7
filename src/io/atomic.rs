//! All-or-nothing file replacement.
//!
//! Bytes go to a hidden temp file in the destination directory; [`AtomicFile::commit`]
//! renames it over the final path. Dropping an uncommitted `AtomicFile` deletes the
//! temp file, so an aborted write never leaves a partial output behind.

use anyhow::{Context, Result};
use std::fs::create_dir_all;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct AtomicFile {
    tmp: NamedTempFile,
    dest: PathBuf,
}

impl AtomicFile {
    /// Start writing `dest`. Creates parent directories if needed.
    ///
    /// # Errors
    /// Returns an error if the parent directory or the temp file cannot be created.
    pub fn create(dest: impl AsRef<Path>) -> Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        create_dir_all(&dir).with_context(|| format!("mkdir -p {}", dir.display()))?;
        let tmp = tempfile::Builder::new()
            .prefix(".rosterflow-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        Ok(Self { tmp, dest })
    }

    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Flush and move the temp file over the destination.
    ///
    /// # Errors
    /// Returns an error if flushing or the rename fails.
    pub fn commit(mut self) -> Result<PathBuf> {
        self.tmp
            .flush()
            .with_context(|| format!("flush {}", self.dest.display()))?;
        self.tmp
            .as_file()
            .sync_all()
            .with_context(|| format!("sync {}", self.dest.display()))?;
        let dest = self.dest;
        self.tmp
            .persist(&dest)
            .with_context(|| format!("rename into {}", dest.display()))?;
        Ok(dest)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tmp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tmp.flush()
    }
}

//! Error kinds surfaced by conversion, loading, joining, and reporting.
//!
//! Every variant is fatal for the run; nothing in the crate retries. Callers that
//! only want a message can convert into `anyhow::Error` with `?`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical result for the library.
pub type Result<T> = std::result::Result<T, RosterError>;

#[derive(Debug, Error)]
pub enum RosterError {
    /// A chunk's column shape disagrees with the schema fixed for its file.
    #[error("schema violation in {}: {detail}", path.display())]
    SchemaViolation { path: PathBuf, detail: String },

    /// An input's extension maps to no known format (strict mode only).
    #[error("unsupported input format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// A loaded table lacks one of the projected columns.
    #[error("table `{table}` is missing required column `{column}`")]
    MissingJoinColumn { table: String, column: String },

    /// The join step needs exactly one student and one teacher table.
    #[error("expected exactly 2 tables to join, found {found}")]
    TableCount { found: usize },

    #[error("no table registered under `{name}`")]
    UnknownTable { name: String },

    /// A delimited input without even a header line.
    #[error("delimited input {} has no header line", path.display())]
    EmptyInput { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Open/read/write failures and engine start/stop failures.
    #[error("{context}")]
    Resource {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl RosterError {
    pub fn schema(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn resource<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Resource {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// I/O helpers report through `anyhow`; their outermost context becomes the message.
impl From<anyhow::Error> for RosterError {
    fn from(e: anyhow::Error) -> Self {
        Self::Resource {
            context: e.to_string(),
            source: e.into(),
        }
    }
}

/// Attach a context message to foreign errors, mapping them to [`RosterError::Resource`].
///
/// Mirrors `anyhow::Context` so call sites read the same in library and binary code.
pub trait ResourceContext<T> {
    fn resource(self, context: impl Into<String>) -> Result<T>;

    fn with_resource<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResourceContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn resource(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| RosterError::resource(context, e))
    }

    fn with_resource<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| RosterError::resource(f(), e))
    }
}

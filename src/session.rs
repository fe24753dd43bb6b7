//! The scoped execution session tables are loaded into and joined within.
//!
//! A [`Session`] owns a dedicated rayon worker pool and a catalog of named tables.
//! It is released when dropped, so every exit path (including an error during load or
//! join) shuts the pool down. [`Session::scoped`] makes the lifetime explicit:
//!
//! ```no_run
//! use rosterflow::session::Session;
//! # fn main() -> rosterflow::Result<()> {
//! let rows = Session::scoped(Session::builder().app_name("report"), |session| {
//!     let students = session.load("work/cleaned_students.parquet")?;
//!     Ok(students.len())
//! })?;
//! # Ok(()) }
//! ```

use crate::error::{ResourceContext, Result, RosterError};
use crate::table::{Table, load_table};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for a [`Session`].
#[derive(Clone, Debug)]
pub struct SessionBuilder {
    app_name: String,
    threads: Option<usize>,
    partitions: Option<usize>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            app_name: "rosterflow".to_string(),
            threads: None,
            partitions: None,
        }
    }
}

impl SessionBuilder {
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Worker threads; `None` uses the CPU count.
    #[must_use]
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Partitions each join is split into; `None` uses twice the CPU count.
    #[must_use]
    pub fn partitions(mut self, partitions: Option<usize>) -> Self {
        self.partitions = partitions;
        self
    }

    /// Start the session's worker pool.
    ///
    /// # Errors
    /// Returns [`RosterError::Resource`] if the pool cannot be built.
    pub fn start(self) -> Result<Session> {
        let threads = self.threads.unwrap_or_else(num_cpus::get).max(1);
        let partitions = self
            .partitions
            .unwrap_or_else(|| 2 * num_cpus::get().max(2))
            .max(1);
        let prefix = self.app_name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{prefix}-worker-{i}"))
            .build()
            .with_resource(|| format!("start session `{}`", self.app_name))?;
        info!(app = %self.app_name, threads, partitions, "session started");
        Ok(Session {
            app_name: self.app_name,
            pool,
            partitions,
            catalog: HashMap::new(),
        })
    }
}

/// A running execution session.
pub struct Session {
    app_name: String,
    pool: rayon::ThreadPool,
    partitions: usize,
    catalog: HashMap<String, Arc<Table>>,
}

impl Session {
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Start a session, run `f` with it, and stop it whether `f` succeeds or fails.
    ///
    /// # Errors
    /// Returns the start error or whatever `f` returns.
    pub fn scoped<R>(builder: SessionBuilder, f: impl FnOnce(&mut Session) -> Result<R>) -> Result<R> {
        let mut session = builder.start()?;
        let out = f(&mut session);
        session.stop();
        out
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    #[must_use]
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Register `table` under its name, replacing any table of the same name.
    pub fn register(&mut self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        if self
            .catalog
            .insert(table.name().to_string(), Arc::clone(&table))
            .is_some()
        {
            debug!(table = table.name(), "replaced registered table");
        }
        table
    }

    /// Load a cleaned file and register it under its derived name.
    ///
    /// # Errors
    /// See [`load_table`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Arc<Table>> {
        let table = load_table(path)?;
        Ok(self.register(table))
    }

    /// Look up a registered table by name.
    ///
    /// # Errors
    /// Returns [`RosterError::UnknownTable`] if nothing is registered under `name`.
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.catalog
            .get(name)
            .cloned()
            .ok_or_else(|| RosterError::UnknownTable { name: name.to_string() })
    }

    /// Registered table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.catalog.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run `op` inside the session's worker pool.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Drop every registered table and shut the worker pool down.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.catalog.clear();
        info!(app = %self.app_name, "session stopped");
    }
}

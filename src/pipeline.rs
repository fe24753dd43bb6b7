//! The end-to-end job: convert every input, join the two cleaned tables, write the report.
//!
//! [`run`] is the only entry point the binary needs. Stages run in order and the first
//! error stops the job; the join session is released on every path.

use crate::config::JobConfig;
use crate::convert::ColumnarFile;
use crate::convert::orchestrator::convert_all;
use crate::error::{Result, RosterError};
use crate::join::{TableRole, join_by_position};
use crate::report::{sort_records, write_report};
use crate::session::Session;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span};

/// What a completed job produced.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    /// Cleaned columnar files, in input order.
    pub converted: Vec<ColumnarFile>,
    /// Inputs skipped for an unrecognized extension.
    pub skipped: Vec<PathBuf>,
    pub report: PathBuf,
    /// Records written to the report.
    pub records: usize,
    pub elapsed_ms: u64,
}

/// Run the whole job described by `config`.
///
/// # Errors
/// - [`RosterError::Config`] if `config` fails validation.
/// - Any conversion error (schema violation, unreadable input, strict-mode unsupported input).
/// - [`RosterError::TableCount`] unless exactly two inputs were converted.
/// - [`RosterError::MissingJoinColumn`] if a cleaned table lacks `fname`, `lname`, or `cid`.
/// - [`RosterError::Resource`] if the report cannot be written.
pub fn run(config: &JobConfig) -> Result<RunSummary> {
    config.validate()?;
    let started = Instant::now();
    let _span = info_span!("job", output = %config.output.display()).entered();

    let conversion = convert_all(config)?;
    info!(
        converted = conversion.files.len(),
        skipped = conversion.skipped.len(),
        "conversion finished"
    );
    if conversion.files.len() != 2 {
        return Err(RosterError::TableCount {
            found: conversion.files.len(),
        });
    }

    let builder = Session::builder()
        .app_name("rosterflow")
        .threads(config.threads)
        .partitions(config.partitions);
    let mut records = Session::scoped(builder, |session| {
        let mut names = Vec::with_capacity(conversion.files.len());
        for (position, file) in conversion.files.iter().enumerate() {
            let table = session.load(&file.path)?;
            info!(
                table = table.name(),
                role = ?TableRole::for_position(position),
                rows = table.len(),
                "registered table"
            );
            names.push(table.name().to_string());
        }
        join_by_position(session, &names)
    })?;

    if config.sort_report {
        sort_records(&mut records);
    }
    let report = write_report(&config.output, &records, config.report_format)?;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(records = records.len(), elapsed_ms, "job finished");
    Ok(RunSummary {
        converted: conversion.files,
        skipped: conversion.skipped,
        report,
        records: records.len(),
        elapsed_ms,
    })
}

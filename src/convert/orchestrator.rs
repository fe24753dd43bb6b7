//! Routing every configured input through the right conversion path.

use crate::config::{JobConfig, UnsupportedPolicy};
use crate::convert::augment::augment_with_id;
use crate::convert::writer::convert_delimited;
use crate::convert::{ColumnarFile, InputFormat, cleaned_file_name};
use crate::error::{Result, RosterError};
use crate::table::table_name_for;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of converting the configured inputs.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionOutput {
    /// Cleaned files in input order.
    pub files: Vec<ColumnarFile>,
    /// Inputs left out because their extension was not recognized.
    pub skipped: Vec<PathBuf>,
}

impl ConversionOutput {
    /// Paths of the cleaned files, in input order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Convert one input according to its format, or `None` if it was skipped.
///
/// # Errors
/// Propagates conversion errors, and [`RosterError::UnsupportedFormat`] under
/// [`UnsupportedPolicy::Error`].
pub fn convert_one(input: &Path, config: &JobConfig) -> Result<Option<ColumnarFile>> {
    let Some(format) = InputFormat::classify(input) else {
        return match config.unsupported {
            UnsupportedPolicy::Skip => {
                warn!(path = %input.display(), "skipping input with unrecognized extension");
                Ok(None)
            }
            UnsupportedPolicy::Error => Err(RosterError::UnsupportedFormat {
                path: input.to_path_buf(),
            }),
        };
    };

    let dest = config.work_dir.join(cleaned_file_name(input, format));
    info!(path = %input.display(), ?format, dest = %dest.display(), "converting input");
    let out = match format {
        InputFormat::DelimitedText => convert_delimited(
            input,
            &dest,
            config.delimiter,
            config.batch_size,
            config.codec,
        )?,
        InputFormat::Columnar => augment_with_id(input, &dest, config.codec)?,
    };
    Ok(Some(out))
}

/// Reject inputs whose cleaned files would share a table name (and so possibly a
/// path), e.g. `a/roster.csv` and `b/roster.parquet`, or `s.csv` and `s.v2.csv`.
///
/// # Errors
/// Returns [`RosterError::Config`] naming the first pair that collides.
pub fn check_distinct_outputs(config: &JobConfig) -> Result<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for input in &config.inputs {
        let Some(format) = InputFormat::classify(input) else {
            continue;
        };
        let table = table_name_for(Path::new(&cleaned_file_name(input, format)));
        if let Some(first) = seen.insert(table.clone(), input.as_path()) {
            return Err(RosterError::Config(format!(
                "inputs {} and {} both convert to table `{table}`",
                first.display(),
                input.display()
            )));
        }
    }
    Ok(())
}

/// Convert every input of `config`, keeping input order in the result.
///
/// With `parallel_conversion` the files are converted on the rayon pool; each still
/// streams its own chunks sequentially, and results are collected by input position
/// so table roles stay positional. The first error aborts the run. Colliding
/// outputs are rejected before anything is written.
///
/// # Errors
/// Returns [`RosterError::Config`] from [`check_distinct_outputs`], or the first
/// conversion error encountered.
pub fn convert_all(config: &JobConfig) -> Result<ConversionOutput> {
    check_distinct_outputs(config)?;
    let results: Vec<Option<ColumnarFile>> = if config.parallel_conversion {
        config
            .inputs
            .par_iter()
            .map(|input| convert_one(input, config))
            .collect::<Result<Vec<_>>>()?
    } else {
        config
            .inputs
            .iter()
            .map(|input| convert_one(input, config))
            .collect::<Result<Vec<_>>>()?
    };

    let mut out = ConversionOutput::default();
    for (input, result) in config.inputs.iter().zip(results) {
        match result {
            Some(file) => out.files.push(file),
            None => out.skipped.push(input.clone()),
        }
    }
    Ok(out)
}

//! Rosterflow CLI: convert roster files and write the student/teacher join report.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rosterflow::convert::InputFormat;
use rosterflow::{ColumnarCodec, JobConfig, ReportFormat, UnsupportedPolicy, run};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rosterflow")]
#[command(about = "Normalize roster files to Parquet and join students with teachers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job and print its summary as JSON
    Run(JobArgs),

    /// Check a job's configuration and show how each input would be handled
    Validate(JobArgs),
}

#[derive(clap::Args)]
struct JobArgs {
    /// Job config JSON file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input file, in role order (students first, then teachers)
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Report destination
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for cleaned Parquet files
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Rows per chunk when converting delimited text
    #[arg(long)]
    batch_size: Option<usize>,

    /// Parquet compression for cleaned files
    #[arg(long, value_enum)]
    codec: Option<CodecArg>,

    /// Write the report as JSON Lines instead of one array
    #[arg(long)]
    lines: bool,

    /// Fail on inputs with an unrecognized extension instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Convert inputs in parallel
    #[arg(long)]
    parallel: bool,

    /// Sort report records by class ID, student, teacher
    #[arg(long)]
    sort: bool,

    /// Join worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Join partitions
    #[arg(long)]
    partitions: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    Snappy,
    Zstd,
    Gzip,
    #[value(name = "none")]
    Uncompressed,
}

impl From<CodecArg> for ColumnarCodec {
    fn from(c: CodecArg) -> Self {
        match c {
            CodecArg::Snappy => ColumnarCodec::Snappy,
            CodecArg::Zstd => ColumnarCodec::Zstd,
            CodecArg::Gzip => ColumnarCodec::Gzip,
            CodecArg::Uncompressed => ColumnarCodec::Uncompressed,
        }
    }
}

impl JobArgs {
    /// Config file (or defaults), then environment, then flags.
    fn into_config(self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::from_json_file(path)
                .with_context(|| format!("load job config {}", path.display()))?,
            None => JobConfig::default(),
        }
        .with_env_overrides();

        if !self.inputs.is_empty() {
            config.inputs = self.inputs;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(dir) = self.work_dir {
            config.work_dir = dir;
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(codec) = self.codec {
            config.codec = codec.into();
        }
        if self.lines {
            config.report_format = ReportFormat::JsonLines;
        }
        if self.strict {
            config.unsupported = UnsupportedPolicy::Error;
        }
        config.parallel_conversion |= self.parallel;
        config.sort_report |= self.sort;
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if self.partitions.is_some() {
            config.partitions = self.partitions;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => {
            let config = args.into_config()?;
            let summary = run(&config)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Validate(args) => {
            let config = args.into_config()?;
            config.validate()?;
            let mut recognized = 0usize;
            for input in &config.inputs {
                let format = InputFormat::classify(input);
                recognized += usize::from(format.is_some());
                match format {
                    Some(f) => println!("{}\t{f:?}", input.display()),
                    None => println!("{}\tunsupported", input.display()),
                }
            }
            if recognized != 2 {
                bail!("expected exactly 2 convertible inputs, found {recognized}");
            }
        }
    }
    Ok(())
}

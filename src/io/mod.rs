//! File I/O shared across the conversion and reporting stages.

pub mod atomic;
pub mod compression;
pub mod parquet;

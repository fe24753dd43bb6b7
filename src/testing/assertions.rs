//! Assertions over join results and cleaned files.

use crate::io::parquet::{file_schema, parquet_row_count, parquet_row_groups};
use crate::join::JoinRecord;
use crate::value::Value;
use std::path::Path;

/// Assert that `actual` holds exactly the `(student, teacher, class)` triples in
/// `expected`, ignoring order but respecting multiplicity.
///
/// # Panics
///
/// Panics if the multisets differ.
pub fn assert_records_unordered(actual: &[JoinRecord], expected: &[(&str, &str, i64)]) {
    let mut got: Vec<(Option<String>, Option<String>, Value)> = actual
        .iter()
        .map(|r| (r.student_name.clone(), r.teacher_name.clone(), r.class_id.clone()))
        .collect();
    let mut want: Vec<(Option<String>, Option<String>, Value)> = expected
        .iter()
        .map(|(s, t, c)| (Some((*s).to_string()), Some((*t).to_string()), Value::Int(*c)))
        .collect();
    got.sort();
    want.sort();
    assert_eq!(got, want, "join records differ (order ignored)");
}

/// Assert the column names of a Parquet file, in order.
///
/// # Panics
///
/// Panics if the file cannot be read or its columns differ.
pub fn assert_parquet_columns(path: impl AsRef<Path>, expected: &[&str]) {
    let path = path.as_ref();
    let schema = file_schema(path).unwrap_or_else(|e| panic!("read schema of {}: {e:#}", path.display()));
    let got: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(got, expected, "columns of {}", path.display());
}

/// Assert the row and row group counts of a Parquet file.
///
/// # Panics
///
/// Panics if the file cannot be read or either count differs.
pub fn assert_parquet_shape(path: impl AsRef<Path>, rows: u64, row_groups: usize) {
    let path = path.as_ref();
    let got_rows =
        parquet_row_count(path).unwrap_or_else(|e| panic!("read {}: {e:#}", path.display()));
    let got_groups =
        parquet_row_groups(path).unwrap_or_else(|e| panic!("read {}: {e:#}", path.display()));
    assert_eq!(got_rows, rows, "row count of {}", path.display());
    assert_eq!(got_groups, row_groups, "row groups of {}", path.display());
}

//! Loading cleaned Parquet files as named, projected relations.
//!
//! A [`Table`] exposes only the roster columns `fname`, `lname`, and `cid`. Its name
//! is the cleaned file name without extension (`cleaned_students.parquet` loads as
//! `cleaned_students`). `fname` and `lname` are kept exactly as stored, as text.
//! The type of `cid` is inferred from the stored values: native numeric and boolean
//! columns keep their type, text columns are promoted as a whole by
//! [`infer_column_type`].

use crate::error::{Result, RosterError};
use crate::io::parquet::{file_schema, open_batches};
use crate::value::{ColumnType, Value, infer_column_type};
use arrow::array::{ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use std::path::Path;
use tracing::debug;

pub const FIRST_NAME: &str = "fname";
pub const LAST_NAME: &str = "lname";
pub const CLASS_ID: &str = "cid";

/// The projected columns, in output order.
pub const PROJECTED_COLUMNS: [&str; 3] = [FIRST_NAME, LAST_NAME, CLASS_ID];

/// Rows decoded per Arrow batch while loading.
const LOAD_BATCH_SIZE: usize = 8 * 1024;

/// One projected roster row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RosterRow {
    pub fname: Value,
    pub lname: Value,
    pub cid: Value,
}

impl RosterRow {
    pub fn new(fname: impl Into<Value>, lname: impl Into<Value>, cid: impl Into<Value>) -> Self {
        Self {
            fname: fname.into(),
            lname: lname.into(),
            cid: cid.into(),
        }
    }

    /// `concat(fname, ' ', lname)`; null if either part is null.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        if self.fname.is_null() || self.lname.is_null() {
            return None;
        }
        Some(format!("{} {}", self.fname, self.lname))
    }
}

/// A named relation over the projected roster columns.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    types: [ColumnType; 3],
    rows: Vec<RosterRow>,
}

impl Table {
    /// Build a table from rows already in memory. Column types are reported as text.
    pub fn from_rows(name: impl Into<String>, rows: Vec<RosterRow>) -> Self {
        Self {
            name: name.into(),
            types: [ColumnType::Str; 3],
            rows,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inferred type of a projected column, or `None` for a name outside the projection.
    #[must_use]
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        PROJECTED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.types[idx])
    }
}

/// Table name for a cleaned file: its file name up to the first `.`.
#[must_use]
pub fn table_name_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

/// Values of one projected column while batches are being read.
enum ColumnValues {
    Text(Vec<Option<String>>),
    Typed(ColumnType, Vec<Value>),
}

impl ColumnValues {
    /// Name columns are kept as stored text; only the join key is typed.
    fn for_column(column: &str, data_type: &DataType) -> Self {
        if column != CLASS_ID {
            return ColumnValues::Typed(ColumnType::Str, Vec::new());
        }
        match native_type(data_type) {
            Some(ty) => ColumnValues::Typed(ty, Vec::new()),
            None => ColumnValues::Text(Vec::new()),
        }
    }

    fn extend(&mut self, array: &ArrayRef) -> arrow::error::Result<()> {
        match self {
            ColumnValues::Typed(ColumnType::Int, out) => {
                let ints = cast(array, &DataType::Int64)?;
                out.extend(ints.as_primitive::<Int64Type>().iter().map(|v| v.map_or(Value::Null, Value::Int)));
            }
            ColumnValues::Typed(ColumnType::Float, out) => {
                let floats = cast(array, &DataType::Float64)?;
                out.extend(
                    floats
                        .as_primitive::<Float64Type>()
                        .iter()
                        .map(|v| v.map_or(Value::Null, |f| Value::Float(f.into()))),
                );
            }
            ColumnValues::Typed(ColumnType::Bool, out) => {
                out.extend(array.as_boolean().iter().map(|v| v.map_or(Value::Null, Value::Bool)));
            }
            ColumnValues::Typed(ColumnType::Str, out) => {
                let text = cast(array, &DataType::Utf8)?;
                out.extend(
                    text.as_string::<i32>()
                        .iter()
                        .map(|v| v.map_or(Value::Null, |s| Value::Str(s.to_string()))),
                );
            }
            ColumnValues::Text(out) => {
                let text = cast(array, &DataType::Utf8)?;
                out.extend(text.as_string::<i32>().iter().map(|v| v.map(str::to_string)));
            }
        }
        Ok(())
    }

    fn finish(self) -> (ColumnType, Vec<Value>) {
        match self {
            ColumnValues::Typed(ty, values) => (ty, values),
            ColumnValues::Text(cells) => {
                let ty = infer_column_type(cells.iter().map(Option::as_deref));
                let values = cells
                    .iter()
                    .map(|c| Value::parse_as(c.as_deref(), ty))
                    .collect();
                (ty, values)
            }
        }
    }
}

/// Parquet types that already carry a usable scalar type.
fn native_type(data_type: &DataType) -> Option<ColumnType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(ColumnType::Int),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => Some(ColumnType::Float),
        DataType::Boolean => Some(ColumnType::Bool),
        _ => None,
    }
}

/// Load `path` as a [`Table`] named after its file.
///
/// Only `fname`, `lname`, and `cid` are read; other columns are never decoded.
///
/// # Errors
/// Returns [`RosterError::MissingJoinColumn`] before reading any data if a projected
/// column is absent, or [`RosterError::Resource`] if the file cannot be read.
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let name = table_name_for(path);
    let schema = file_schema(path)?;

    let mut roots = Vec::with_capacity(PROJECTED_COLUMNS.len());
    let mut columns = Vec::with_capacity(PROJECTED_COLUMNS.len());
    for column in PROJECTED_COLUMNS {
        let idx = schema
            .index_of(column)
            .map_err(|_| RosterError::MissingJoinColumn {
                table: name.clone(),
                column: column.to_string(),
            })?;
        roots.push(idx);
        columns.push(ColumnValues::for_column(column, schema.field(idx).data_type()));
    }

    let reader = open_batches(path, Some(&roots), LOAD_BATCH_SIZE)?;
    for batch in reader {
        let batch = batch.map_err(|e| RosterError::resource(format!("read {}", path.display()), e))?;
        for (column, values) in PROJECTED_COLUMNS.iter().zip(columns.iter_mut()) {
            let array = batch.column_by_name(column).ok_or_else(|| RosterError::MissingJoinColumn {
                table: name.clone(),
                column: (*column).to_string(),
            })?;
            values
                .extend(array)
                .map_err(|e| RosterError::resource(format!("decode `{column}` of {}", path.display()), e))?;
        }
    }

    let mut finished = columns.into_iter().map(ColumnValues::finish);
    let mut next = || finished.next().unwrap_or((ColumnType::Str, Vec::new()));
    let (fname_ty, fnames) = next();
    let (lname_ty, lnames) = next();
    let (cid_ty, cids) = next();

    let rows: Vec<RosterRow> = fnames
        .into_iter()
        .zip(lnames)
        .zip(cids)
        .map(|((fname, lname), cid)| RosterRow { fname, lname, cid })
        .collect();
    debug!(table = %name, rows = rows.len(), ?cid_ty, "loaded table");
    Ok(Table {
        name,
        types: [fname_ty, lname_ty, cid_ty],
        rows,
    })
}

//! Scalar cell values and deterministic type inference for loaded tables.
//!
//! Columns that arrive as text (every column the conversion step writes) are promoted
//! as a whole: integer if every non-empty cell parses as `i64`, else float, else
//! boolean, else text. Empty cells are null. The same input always infers the same
//! type.

use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};
use std::fmt;

/// 2^63; every integral float in `[-2^63, 2^63)` converts to `i64` exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// One cell of a loaded table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

/// Column type chosen by [`infer_column_type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Bool,
    Str,
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Normalized form used for equality joins, or `None` for null.
    ///
    /// Integral floats compare equal to integers; text never equals a number.
    #[must_use]
    pub fn join_key(&self) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Float(f) if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f.0) => {
                Some(Value::Int(f.0 as i64))
            }
            other => Some(other.clone()),
        }
    }

    /// Parse a text cell into the given column type. Unparseable cells become null.
    #[must_use]
    pub fn parse_as(raw: Option<&str>, ty: ColumnType) -> Value {
        let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Value::Null;
        };
        match ty {
            ColumnType::Int => s.parse().map_or(Value::Null, Value::Int),
            ColumnType::Float => s
                .parse::<f64>()
                .map_or(Value::Null, |f| Value::Float(OrderedFloat(f))),
            ColumnType::Bool => parse_bool(s).map_or(Value::Null, Value::Bool),
            ColumnType::Str => Value::Str(s.to_string()),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Pick the narrowest type every non-empty cell of a text column fits.
///
/// An all-empty column stays text.
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut int = true;
    let mut float = true;
    let mut boolean = true;
    let mut seen = false;
    for cell in cells {
        let Some(s) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        seen = true;
        int &= s.parse::<i64>().is_ok();
        float &= s.parse::<f64>().is_ok();
        boolean &= parse_bool(s).is_some();
        if !(int || float || boolean) {
            break;
        }
    }
    match (seen, int, float, boolean) {
        (false, ..) => ColumnType::Str,
        (true, true, _, _) => ColumnType::Int,
        (true, _, true, _) => ColumnType::Float,
        (true, _, _, true) => ColumnType::Bool,
        _ => ColumnType::Str,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", x.0),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(x.0),
            Value::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_narrowest_type() {
        assert_eq!(infer_column_type([Some("1"), Some(" 22 "), None]), ColumnType::Int);
        assert_eq!(infer_column_type([Some("1"), Some("2.5")]), ColumnType::Float);
        assert_eq!(infer_column_type([Some("TRUE"), Some("false")]), ColumnType::Bool);
        assert_eq!(infer_column_type([Some("1"), Some("x")]), ColumnType::Str);
        assert_eq!(infer_column_type([None, Some("")]), ColumnType::Str);
    }

    #[test]
    fn join_key_folds_integral_floats() {
        assert_eq!(Value::Float(OrderedFloat(3.0)).join_key(), Some(Value::Int(3)));
        assert_eq!(
            Value::Float(OrderedFloat(3.5)).join_key(),
            Some(Value::Float(OrderedFloat(3.5)))
        );
        assert_eq!(Value::Null.join_key(), None);
        assert_eq!(
            Value::Float(OrderedFloat(2f64.powi(63))).join_key(),
            Some(Value::Float(OrderedFloat(2f64.powi(63))))
        );
        assert_eq!(
            Value::Float(OrderedFloat(-(2f64.powi(63)))).join_key(),
            Some(Value::Int(i64::MIN))
        );
        assert_ne!(Value::Str("1".into()).join_key(), Value::Int(1).join_key());
    }

    #[test]
    fn serializes_as_plain_json() {
        let v = serde_json::to_value(vec![Value::Int(1), Value::Null, Value::Str("a".into())])
            .unwrap();
        assert_eq!(v, serde_json::json!([1, null, "a"]));
    }
}

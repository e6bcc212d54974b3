//! Type inference for text formats.
//!
//! Types form a small lattice: `Null` below everything, `Int64` widening to
//! `Float64`, and anything irreconcilable falling back to `Utf8`. Readers
//! feed a bounded sample through [`merge`] and then decode every value with
//! [`parse_text`] / [`coerce_json`]. Values that do not fit the inferred type
//! decode as null.

use serde_json::Value;
use tabscan_core::schema::DataType;
use tabscan_core::types::Scalar;

/// Least upper bound of two inferred types.
pub fn merge(a: DataType, b: DataType) -> DataType {
    use DataType::*;
    match (a, b) {
        (x, y) if x == y => x,
        (Null, x) | (x, Null) => x,
        (Int64, Float64) | (Float64, Int64) => Float64,
        _ => Utf8,
    }
}

/// Narrowest type for a single CSV cell. Empty cells carry no type information.
pub fn infer_text(cell: &str) -> DataType {
    let cell = cell.trim();
    if cell.is_empty() {
        DataType::Null
    } else if cell.parse::<i64>().is_ok() {
        DataType::Int64
    } else if cell.parse::<f64>().is_ok() {
        DataType::Float64
    } else if parse_bool(cell).is_some() {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Decode a CSV cell as `data_type`.
pub fn parse_text(cell: &str, data_type: DataType) -> Scalar {
    if cell.is_empty() {
        return Scalar::Null;
    }
    let trimmed = cell.trim();
    match data_type {
        DataType::Int64 => trimmed.parse().map(Scalar::I64).unwrap_or(Scalar::Null),
        DataType::Int32 => trimmed.parse().map(Scalar::I32).unwrap_or(Scalar::Null),
        DataType::Float64 => trimmed.parse().map(Scalar::F64).unwrap_or(Scalar::Null),
        DataType::Float32 => trimmed.parse().map(Scalar::F32).unwrap_or(Scalar::Null),
        DataType::Boolean => parse_bool(trimmed).map(Scalar::Bool).unwrap_or(Scalar::Null),
        DataType::Null => Scalar::Null,
        DataType::Utf8 => Scalar::Str(cell.to_string()),
        DataType::Binary => Scalar::Bin(cell.as_bytes().to_vec()),
    }
}

/// Narrowest type for a JSON value. Arrays and objects are kept as JSON text.
pub fn infer_json(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_i64() => DataType::Int64,
        Value::Number(_) => DataType::Float64,
        Value::String(_) | Value::Array(_) | Value::Object(_) => DataType::Utf8,
    }
}

/// Decode a JSON value as `data_type`.
pub fn coerce_json(value: &Value, data_type: DataType) -> Scalar {
    match (value, data_type) {
        (Value::Null, _) | (_, DataType::Null) => Scalar::Null,
        (Value::Bool(b), DataType::Boolean) => Scalar::Bool(*b),
        (Value::Number(n), DataType::Int64) => n.as_i64().map(Scalar::I64).unwrap_or(Scalar::Null),
        (Value::Number(n), DataType::Float64) => n.as_f64().map(Scalar::F64).unwrap_or(Scalar::Null),
        (Value::String(s), DataType::Utf8) => Scalar::Str(s.clone()),
        (other, DataType::Utf8) => Scalar::Str(other.to_string()),
        _ => Scalar::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lattice() {
        assert_eq!(merge(DataType::Null, DataType::Int64), DataType::Int64);
        assert_eq!(merge(DataType::Int64, DataType::Float64), DataType::Float64);
        assert_eq!(merge(DataType::Boolean, DataType::Int64), DataType::Utf8);
    }

    #[test]
    fn text_cells() {
        assert_eq!(infer_text("42"), DataType::Int64);
        assert_eq!(infer_text("4.5"), DataType::Float64);
        assert_eq!(infer_text("TRUE"), DataType::Boolean);
        assert_eq!(infer_text(""), DataType::Null);
        assert_eq!(infer_text("x"), DataType::Utf8);
        assert_eq!(parse_text("oops", DataType::Int64), Scalar::Null);
        assert_eq!(parse_text("7", DataType::Float64), Scalar::F64(7.0));
    }

    #[test]
    fn json_values() {
        assert_eq!(infer_json(&json!(1)), DataType::Int64);
        assert_eq!(infer_json(&json!(1.5)), DataType::Float64);
        assert_eq!(coerce_json(&json!(2), DataType::Float64), Scalar::F64(2.0));
        assert_eq!(coerce_json(&json!([1, 2]), DataType::Utf8), Scalar::Str("[1,2]".into()));
        assert_eq!(coerce_json(&json!("x"), DataType::Int64), Scalar::Null);
    }
}

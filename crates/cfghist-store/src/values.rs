//! Conversions between JSON values and SQLite values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value;

/// Bind a scalar column value. Booleans become 0/1, structured values JSON text.
pub(crate) fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Read a scalar column value back as JSON.
pub(crate) fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(hex::encode(b)),
    }
}

/// Bind an opaque payload column: JSON null is stored as SQL NULL.
pub(crate) fn payload_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        other => SqlValue::Text(other.to_string()),
    }
}

/// Parse an opaque payload column.
pub(crate) fn payload_from_sql(text: Option<&str>) -> serde_json::Result<Value> {
    match text {
        None => Ok(Value::Null),
        Some(text) => serde_json::from_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_sql_scalars() {
        assert_eq!(json_to_sql(&json!(true)), SqlValue::Integer(1));
        assert_eq!(json_to_sql(&json!(3)), SqlValue::Integer(3));
        assert_eq!(json_to_sql(&json!(1.5)), SqlValue::Real(1.5));
        assert_eq!(json_to_sql(&json!(null)), SqlValue::Null);
        assert_eq!(
            json_to_sql(&json!(["a"])),
            SqlValue::Text("[\"a\"]".to_string())
        );
    }

    #[test]
    fn test_payload_null_is_sql_null() {
        assert_eq!(payload_to_sql(&Value::Null), SqlValue::Null);
        assert_eq!(payload_from_sql(None).unwrap(), Value::Null);
        assert_eq!(payload_from_sql(Some("{\"a\":1}")).unwrap(), json!({"a": 1}));
    }
}

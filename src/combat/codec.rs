//! Lenient field readers for stored JSON records
//!
//! Stored snapshots are not trusted: a missing or wrongly-typed optional field
//! falls back to its default instead of failing the whole record.

use serde_json::{Map, Value};

use crate::error::TrackerError;

pub(crate) type Record = Map<String, Value>;

/// Require a top-level JSON object
pub(crate) fn record<'a>(value: &'a Value, what: &str) -> Result<&'a Record, TrackerError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(TrackerError::invalid(format!("{what} record is null"))),
        _ => Err(TrackerError::invalid(format!("{what} record is not an object"))),
    }
}

fn integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

pub(crate) fn int_or(rec: &Record, key: &str, default: i32) -> i32 {
    rec.get(key)
        .and_then(integral)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(default)
}

pub(crate) fn i64_or(rec: &Record, key: &str, default: i64) -> i64 {
    rec.get(key).and_then(integral).unwrap_or(default)
}

pub(crate) fn bool_or(rec: &Record, key: &str, default: bool) -> bool {
    rec.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub(crate) fn str_opt<'a>(rec: &'a Record, key: &str) -> Option<&'a str> {
    rec.get(key).and_then(Value::as_str)
}

pub(crate) fn string_or(rec: &Record, key: &str, default: &str) -> String {
    str_opt(rec, key).unwrap_or(default).to_string()
}

pub(crate) fn array<'a>(rec: &'a Record, key: &str) -> &'a [Value] {
    rec.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

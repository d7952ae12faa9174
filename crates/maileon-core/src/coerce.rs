//! Conversion of raw mapped values into the types Maileon declares for a field
//!
//! [`coerce`] is pure: it never touches the network or any state, and the same
//! `(type, value)` pair always produces the same output or the same error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Declared type of a contact field or event attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Date,
    Boolean,
    /// `number` and `float` are the same type on the wire
    Float,
    Integer,
    Json,
    /// Any type name the connector does not coerce (e.g. `timestamp`, `double`)
    Other(String),
}

impl FieldType {
    /// Name as reported by the API (`float` for [`FieldType::Float`])
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Json => "json",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            "number" | "float" => Self::Float,
            "integer" => Self::Integer,
            "json" => Self::Json,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a value could not be coerced to its declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid float: {0}")]
    InvalidFloat(String),

    #[error("Invalid integer: {0}")]
    InvalidInteger(String),

    /// The string is the artifact of stringifying an object list, not JSON
    #[error("Corrupted JSON-like string: {0}")]
    CorruptedJson(String),

    #[error("Invalid JSON string: {0}")]
    InvalidJson(String),

    #[error("Unsupported type for JSON casting: {0}")]
    UnsupportedJsonInput(&'static str),
}

/// Signature left behind when a list of objects is joined as strings upstream
const STRINGIFIED_OBJECT: &str = "[object Object]";

/// Coerce `value` to `field_type`.
///
/// | type | result |
/// |------|--------|
/// | `date` | `YYYY-MM-DD` string (time of day and zone dropped after normalizing to UTC) |
/// | `boolean` | `true` only for `"true"`, `true`, `"1"`, `1`; everything else `false` |
/// | `float` / `number` | JSON number |
/// | `integer` | JSON integer; fractional input is rejected |
/// | `json` | object or array |
/// | anything else | value unchanged |
pub fn coerce(field_type: &FieldType, value: &Value) -> Result<Value, CoercionError> {
    match field_type {
        FieldType::Date => coerce_date(value).map(Value::String),
        FieldType::Boolean => Ok(Value::Bool(coerce_bool(value))),
        FieldType::Float => coerce_float(value),
        FieldType::Integer => coerce_integer(value),
        FieldType::Json => coerce_json(value),
        FieldType::String | FieldType::Other(_) => Ok(value.clone()),
    }
}

/// Render a value for an error message: strings without quotes, the rest as JSON
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_date(value: &Value) -> Result<String, CoercionError> {
    let invalid = || CoercionError::InvalidDate(display(value));

    let date = match value {
        Value::String(raw) => parse_date(raw.trim()).ok_or_else(invalid)?,
        // Numbers are epoch milliseconds
        Value::Number(n) => {
            let millis = n.as_i64().ok_or_else(invalid)?;
            DateTime::<Utc>::from_timestamp_millis(millis)
                .ok_or_else(invalid)?
                .date_naive()
        }
        _ => return Err(invalid()),
    };

    Ok(date.format("%Y-%m-%d").to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    // Zone-less timestamps are taken as UTC
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

fn coerce_float(value: &Value) -> Result<Value, CoercionError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| CoercionError::InvalidFloat(display(value)))
}

fn coerce_integer(value: &Value) -> Result<Value, CoercionError> {
    let invalid = || CoercionError::InvalidInteger(display(value));

    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
            _ => Err(invalid()),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn coerce_json(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Object(_) | Value::Array(_) => Ok(value.clone()),
        Value::String(s) => {
            if s.contains(STRINGIFIED_OBJECT) {
                return Err(CoercionError::CorruptedJson(s.clone()));
            }

            match serde_json::from_str::<Value>(s) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => Ok(parsed),
                _ => Err(CoercionError::InvalidJson(s.clone())),
            }
        }
        Value::Null => Err(CoercionError::UnsupportedJsonInput("null")),
        Value::Bool(_) => Err(CoercionError::UnsupportedJsonInput("boolean")),
        Value::Number(_) => Err(CoercionError::UnsupportedJsonInput("number")),
    }
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

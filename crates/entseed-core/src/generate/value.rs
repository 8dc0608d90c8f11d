use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated value for a column.
///
/// The `String` variant uses `Cow<'static, str>` so that values drawn from
/// static lists (first names, last names) stay zero-cost borrows while
/// generated tokens are owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Time of day in UTC, rendered with an explicit `+00` offset.
    TimeTz(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Convert to the text written into a CSV cell. NULL is the empty cell,
    /// which `COPY ... CSV` reads back as NULL.
    pub fn to_csv_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.3f").to_string(),
            Value::TimeTz(t) => format!("{}+00", t.format("%H:%M:%S%.3f")),
            Value::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            Value::TimestampTz(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            Value::Json(j) => j.to_string(),
        }
    }

    /// Convert a value from a fixed row of the schema.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(Cow::Owned(s.clone())),
            other => Value::Json(other.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Uuid(u) => write!(f, "'{}'", u),
            Value::Json(j) => write!(f, "{}", j),
            other => write!(f, "'{}'", other.to_csv_string()),
        }
    }
}

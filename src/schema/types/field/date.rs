use crate::error::{SchemaError, SchemaResult};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Options for a date item. Dates are stored as milliseconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateOptions {
    /// Every validation pass overwrites the value with the current time,
    /// whatever the caller supplied. Suits "last updated" style fields.
    pub use_now: bool,
}

impl DateOptions {
    pub fn now() -> Self {
        Self { use_now: true }
    }

    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        if self.use_now {
            return Ok(Value::from(Utc::now().timestamp_millis()));
        }

        match value {
            Value::Null => Ok(Value::Null),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(Value::from)
                .ok_or_else(|| not_a_date(name)),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|d| Value::from(d.with_timezone(&Utc).timestamp_millis()))
                .map_err(|_| not_a_date(name)),
            _ => Err(not_a_date(name)),
        }
    }
}

fn not_a_date(name: &str) -> SchemaError {
    SchemaError::Validation(format!("'{}' must be a valid date", name))
}

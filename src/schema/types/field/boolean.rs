use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;

/// Casts the accepted boolean spellings. Null reads as false.
pub(crate) fn validate(name: &str, value: &Value) -> SchemaResult<Value> {
    let flag = match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) if n.as_f64() == Some(0.0) => false,
        Value::Number(n) if n.as_f64() == Some(1.0) => true,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" | "" => false,
            _ => return Err(not_a_boolean(name)),
        },
        _ => return Err(not_a_boolean(name)),
    };
    Ok(Value::Bool(flag))
}

fn not_a_boolean(name: &str) -> SchemaError {
    SchemaError::Validation(format!("'{}' must be a boolean", name))
}

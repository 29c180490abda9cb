use crate::error::{SchemaError, SchemaResult};
use serde_json::{Number, Value};

/// Largest number of decimal places a float item may keep.
pub const MAX_DECIMAL_PLACES: u8 = 20;

/// How a numeric item casts its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Truncates toward zero.
    Integer,
    /// Rounds to a fixed number of decimal places.
    Float { decimal_places: u8 },
}

/// Options for a numeric item. The range is inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberOptions {
    pub min: f64,
    pub max: f64,
    pub kind: NumberKind,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
            kind: NumberKind::Integer,
        }
    }
}

impl NumberOptions {
    pub fn integer(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            kind: NumberKind::Integer,
        }
    }

    pub fn float(min: f64, max: f64, decimal_places: u8) -> Self {
        Self {
            min,
            max,
            kind: NumberKind::Float { decimal_places },
        }
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        if let NumberKind::Float { decimal_places } = self.kind {
            if decimal_places > MAX_DECIMAL_PLACES {
                return Err(SchemaError::InvalidData(format!(
                    "'{}' cannot keep more than {} decimal places",
                    name, MAX_DECIMAL_PLACES
                )));
            }
        }
        if self.min > self.max {
            return Err(SchemaError::InvalidData(format!(
                "'{}' has a minimum of {} above its maximum of {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }

    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        let raw = match value {
            Value::Null => 0.0,
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) if s.trim().is_empty() => 0.0,
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_a_number(name))?,
            _ => return Err(not_a_number(name)),
        };
        self.cast(name, raw)
    }

    pub(crate) fn cast(&self, name: &str, raw: f64) -> SchemaResult<Value> {
        if !raw.is_finite() {
            return Err(not_a_number(name));
        }

        let cast = match self.kind {
            NumberKind::Integer => raw.trunc(),
            NumberKind::Float { decimal_places } => {
                let factor = 10f64.powi(i32::from(decimal_places));
                (raw * factor).round() / factor
            }
        };

        if cast < self.min {
            return Err(SchemaError::Validation(format!(
                "The value of '{}' is too low, minimum value is {}",
                name, self.min
            )));
        }
        if cast > self.max {
            return Err(SchemaError::Validation(format!(
                "The value of '{}' is too high, maximum value is {}",
                name, self.max
            )));
        }

        match self.kind {
            NumberKind::Integer if cast.abs() < 9.0e15 => Ok(Value::from(cast as i64)),
            _ => Number::from_f64(cast)
                .map(Value::Number)
                .ok_or_else(|| not_a_number(name)),
        }
    }
}

fn not_a_number(name: &str) -> SchemaError {
    SchemaError::Validation(format!("'{}' must be a number", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_truncate() {
        let options = NumberOptions::integer(0.0, 100.0);
        assert_eq!(options.validate("n", &json!(4.9)).unwrap(), json!(4));
        assert_eq!(options.validate("n", &json!("12")).unwrap(), json!(12));
    }

    #[test]
    fn floats_round_to_places() {
        let options = NumberOptions::float(0.0, 10.0, 2);
        assert_eq!(options.validate("n", &json!(1.23456)).unwrap(), json!(1.23));
    }

    #[test]
    fn range_is_inclusive() {
        let options = NumberOptions::integer(1.0, 5.0);
        assert!(options.validate("n", &json!(1)).is_ok());
        assert!(options.validate("n", &json!(5)).is_ok());
        assert!(options.validate("n", &json!(0)).unwrap_err().to_string().contains("too low"));
        assert!(options.validate("n", &json!(6)).unwrap_err().to_string().contains("too high"));
    }

    #[test]
    fn non_numbers_fail() {
        let options = NumberOptions::default();
        assert!(options.validate("n", &json!("abc")).is_err());
        assert!(options.validate("n", &json!(true)).is_err());
    }

    #[test]
    fn decimal_places_are_capped() {
        assert!(NumberOptions::float(0.0, 1.0, 20).check("n").is_ok());
        assert!(NumberOptions::float(0.0, 1.0, 21).check("n").is_err());
    }
}

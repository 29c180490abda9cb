use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;

/// Options for an item restricted to a fixed set of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumOptions {
    pub choices: Vec<String>,
    /// Accept the empty string in addition to the choices.
    pub can_be_empty: bool,
}

impl EnumOptions {
    pub fn new(choices: &[&str]) -> Self {
        Self {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            can_be_empty: false,
        }
    }

    pub fn allow_empty(mut self) -> Self {
        self.can_be_empty = true;
        self
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        if self.choices.is_empty() {
            return Err(SchemaError::InvalidData(format!(
                "'{}' must declare at least one choice",
                name
            )));
        }
        Ok(())
    }

    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        let choice = match value {
            Value::Null => "",
            Value::String(s) => s.trim(),
            _ => return Err(SchemaError::Validation(format!("'{}' must be text", name))),
        };

        if choice.is_empty() && self.can_be_empty {
            return Ok(Value::String(String::new()));
        }
        if self.choices.iter().any(|c| c == choice) {
            return Ok(Value::String(choice.to_string()));
        }
        Err(SchemaError::Validation(format!(
            "'{}' is not a valid choice for '{}', use one of: {}",
            choice,
            name,
            self.choices.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn choices_are_enforced() {
        let options = EnumOptions::new(&["draft", "published"]);
        assert_eq!(options.validate("status", &json!("draft")).unwrap(), json!("draft"));
        assert!(options.validate("status", &json!("archived")).is_err());
        assert!(options.validate("status", &json!("")).is_err());
    }

    #[test]
    fn empty_allowed_when_configured() {
        let options = EnumOptions::new(&["a"]).allow_empty();
        assert_eq!(options.validate("status", &json!("")).unwrap(), json!(""));
    }
}

use crate::error::{SchemaError, SchemaResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid markup regex"));

/// Removes every tag from `input`, keeping the text between tags.
pub fn strip_markup(input: &str) -> String {
    MARKUP.replace_all(input, "").into_owned()
}

/// Options for a plain text item.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub min_characters: usize,
    pub max_characters: usize,
    /// Strip all markup before measuring and storing.
    pub html_clean: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            min_characters: 0,
            max_characters: 10_000,
            html_clean: true,
        }
    }
}

impl TextOptions {
    pub fn new(min_characters: usize, max_characters: usize) -> Self {
        Self {
            min_characters,
            max_characters,
            ..Default::default()
        }
    }

    pub fn keep_markup(mut self) -> Self {
        self.html_clean = false;
        self
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        check_bounds(name, self.min_characters, self.max_characters)
    }

    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        let text = coerce_text(name, value)?;
        let mut text = text.trim().to_string();
        if self.html_clean {
            text = strip_markup(&text).trim().to_string();
        }
        check_length(name, &text, self.min_characters, self.max_characters)?;
        Ok(Value::String(text))
    }
}

/// Reads a scalar as text. Null reads as the empty string.
pub(crate) fn coerce_text(name: &str, value: &Value) -> SchemaResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(SchemaError::Validation(format!("'{}' must be text", name))),
    }
}

/// Enforces character bounds.
///
/// A minimum of exactly one reports an empty value as "cannot be empty";
/// any other minimum reports it as too short.
pub(crate) fn check_length(name: &str, text: &str, min: usize, max: usize) -> SchemaResult<()> {
    let length = text.chars().count();
    if min == 1 && length == 0 {
        return Err(SchemaError::Validation(format!("'{}' cannot be empty", name)));
    }
    if length < min {
        return Err(SchemaError::Validation(format!(
            "The character length of '{}' is too short, please keep it above {}",
            name, min
        )));
    }
    if length > max {
        return Err(SchemaError::Validation(format!(
            "The character length of '{}' is too long, please keep it below {}",
            name, max
        )));
    }
    Ok(())
}

pub(crate) fn check_bounds(name: &str, min: usize, max: usize) -> SchemaResult<()> {
    if min > max {
        return Err(SchemaError::InvalidData(format!(
            "'{}' has a minimum length of {} above its maximum of {}",
            name, min, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn min_of_one_reports_empty() {
        let options = TextOptions::new(1, 100);
        let err = options.validate("title", &json!("")).unwrap_err();
        assert_eq!(err.to_string(), "'title' cannot be empty");
    }

    #[test]
    fn min_of_zero_accepts_empty() {
        let options = TextOptions::new(0, 100);
        assert_eq!(options.validate("title", &json!("")).unwrap(), json!(""));
    }

    #[test]
    fn other_minimums_report_too_short_even_when_empty() {
        let options = TextOptions::new(3, 100);
        let err = options.validate("title", &json!("")).unwrap_err();
        assert!(err.to_string().contains("too short"));
        assert!(!err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let options = TextOptions::new(1, 100);
        assert!(options.validate("title", &json!("   ")).is_err());
    }

    #[test]
    fn trims_and_strips_markup() {
        let options = TextOptions::default();
        let out = options.validate("title", &json!("  <b>Hi</b> there ")).unwrap();
        assert_eq!(out, json!("Hi there"));

        let raw = options.clone().keep_markup();
        assert_eq!(raw.validate("title", &json!("<b>Hi</b>")).unwrap(), json!("<b>Hi</b>"));
    }

    #[test]
    fn padding_inside_markup_is_trimmed() {
        let options = TextOptions::new(0, 2);
        assert_eq!(options.validate("title", &json!("<b> hi </b>")).unwrap(), json!("hi"));
    }

    #[test]
    fn too_long_is_rejected() {
        let options = TextOptions::new(0, 3);
        let err = options.validate("code", &json!("abcd")).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn objects_are_not_text() {
        let options = TextOptions::default();
        assert!(options.validate("title", &json!({ "a": 1 })).is_err());
    }
}

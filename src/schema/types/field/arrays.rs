use super::number::NumberOptions;
use super::text::{check_bounds, check_length, coerce_text, strip_markup};
use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;

/// Options for a list of strings.
#[derive(Debug, Clone, PartialEq)]
pub struct TextArrayOptions {
    pub min_items: usize,
    pub max_items: usize,
    pub min_characters: usize,
    pub max_characters: usize,
    pub html_clean: bool,
}

impl Default for TextArrayOptions {
    fn default() -> Self {
        Self {
            min_items: 0,
            max_items: 10_000,
            min_characters: 0,
            max_characters: 10_000,
            html_clean: true,
        }
    }
}

impl TextArrayOptions {
    pub fn new(min_items: usize, max_items: usize) -> Self {
        Self {
            min_items,
            max_items,
            ..Default::default()
        }
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        check_bounds(name, self.min_items, self.max_items)?;
        check_bounds(name, self.min_characters, self.max_characters)
    }

    /// Trims and cleans each element, drops the ones left empty, then
    /// checks the surviving count.
    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        let mut kept = Vec::new();
        for element in elements(name, value)? {
            let text = coerce_text(name, element)?;
            let mut text = text.trim().to_string();
            if self.html_clean {
                text = strip_markup(&text).trim().to_string();
            }
            if text.is_empty() {
                continue;
            }
            check_length(name, &text, self.min_characters, self.max_characters)?;
            kept.push(Value::String(text));
        }

        check_count(name, kept.len(), self.min_items, self.max_items)?;
        Ok(Value::Array(kept))
    }
}

/// Options for a list of numbers. Each element follows the scalar number rules.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberArrayOptions {
    pub min_items: usize,
    pub max_items: usize,
    pub element: NumberOptions,
}

impl Default for NumberArrayOptions {
    fn default() -> Self {
        Self {
            min_items: 0,
            max_items: 10_000,
            element: NumberOptions::default(),
        }
    }
}

impl NumberArrayOptions {
    pub fn new(min_items: usize, max_items: usize, element: NumberOptions) -> Self {
        Self {
            min_items,
            max_items,
            element,
        }
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        check_bounds(name, self.min_items, self.max_items)?;
        self.element.check(name)
    }

    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        let cast = elements(name, value)?
            .iter()
            .map(|element| self.element.validate(name, element))
            .collect::<SchemaResult<Vec<_>>>()?;
        check_count(name, cast.len(), self.min_items, self.max_items)?;
        Ok(Value::Array(cast))
    }
}

/// Reads an array input. Null reads as the empty list.
pub(crate) fn elements<'a>(name: &str, value: &'a Value) -> SchemaResult<&'a [Value]> {
    match value {
        Value::Null => Ok(&[]),
        Value::Array(items) => Ok(items.as_slice()),
        _ => Err(SchemaError::Validation(format!("'{}' must be a list", name))),
    }
}

pub(crate) fn check_count(name: &str, count: usize, min: usize, max: usize) -> SchemaResult<()> {
    if count < min {
        return Err(SchemaError::Validation(format!(
            "You must select at least {} item(s) for '{}'",
            min, name
        )));
    }
    if count > max {
        return Err(SchemaError::Validation(format!(
            "You have selected too many items for '{}', please only use up to {}",
            name, max
        )));
    }
    Ok(())
}

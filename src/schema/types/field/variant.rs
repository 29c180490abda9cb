use super::{
    boolean, DateOptions, EnumOptions, ForeignKeyOptions, HtmlOptions, IdArrayOptions,
    NumberArrayOptions, NumberOptions, TextArrayOptions, TextOptions,
};
use crate::error::SchemaResult;
use crate::schema::id::id_from_value;
use serde_json::Value;

/// Enumeration over all item kinds and their options.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Text(TextOptions),
    Html(HtmlOptions),
    Number(NumberOptions),
    Boolean,
    Date(DateOptions),
    Enum(EnumOptions),
    /// Arbitrary JSON, stored as given.
    Json,
    TextArray(TextArrayOptions),
    NumberArray(NumberArrayOptions),
    /// A single id with no existence check.
    Id,
    IdArray(IdArrayOptions),
    ForeignKey(ForeignKeyOptions),
}

impl ItemKind {
    /// Whether the kind maintains a dependency index on other documents.
    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::ForeignKey(_) | Self::IdArray(_))
    }

    pub(crate) fn default_value(&self) -> Value {
        match self {
            Self::Text(_) | Self::Html(_) | Self::Enum(_) => Value::String(String::new()),
            Self::Number(_) => Value::from(0),
            Self::Boolean => Value::Bool(false),
            Self::TextArray(_) | Self::NumberArray(_) | Self::IdArray(_) => Value::Array(Vec::new()),
            Self::Date(_) | Self::Json | Self::Id | Self::ForeignKey(_) => Value::Null,
        }
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        match self {
            Self::Text(options) => options.check(name),
            Self::Html(options) => options.check(name),
            Self::Number(options) => options.check(name),
            Self::Enum(options) => options.check(name),
            Self::TextArray(options) => options.check(name),
            Self::NumberArray(options) => options.check(name),
            Self::IdArray(options) => options.check(name),
            Self::Boolean | Self::Date(_) | Self::Json | Self::Id | Self::ForeignKey(_) => Ok(()),
        }
    }

    /// Validates kinds that never look at other documents. Returns `None`
    /// for relationship kinds.
    pub(crate) fn validate_local(&self, name: &str, value: &Value) -> SchemaResult<Option<Value>> {
        let normalized = match self {
            Self::Text(options) => options.validate(name, value)?,
            Self::Html(options) => options.validate(name, value)?,
            Self::Number(options) => options.validate(name, value)?,
            Self::Boolean => boolean::validate(name, value)?,
            Self::Date(options) => options.validate(name, value)?,
            Self::Enum(options) => options.validate(name, value)?,
            Self::Json => value.clone(),
            Self::TextArray(options) => options.validate(name, value)?,
            Self::NumberArray(options) => options.validate(name, value)?,
            Self::Id => id_from_value(name, value)?
                .map(|id| Value::String(id.to_hex()))
                .unwrap_or(Value::Null),
            Self::IdArray(_) | Self::ForeignKey(_) => return Ok(None),
        };
        Ok(Some(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::id::ObjectId;
    use serde_json::json;

    #[test]
    fn id_kind_normalizes_without_lookup() {
        let id = ObjectId::new();
        let kind = ItemKind::Id;
        assert_eq!(kind.validate_local("ref", &json!(id.to_hex())).unwrap(), Some(json!(id.to_hex())));
        assert_eq!(kind.validate_local("ref", &json!("")).unwrap(), Some(Value::Null));
        assert!(kind.validate_local("ref", &json!("abc")).is_err());
    }

    #[test]
    fn relationship_kinds_defer() {
        let kind = ItemKind::ForeignKey(ForeignKeyOptions::new("users"));
        assert!(kind.is_relationship());
        assert_eq!(kind.validate_local("author", &Value::Null).unwrap(), None);
    }

    #[test]
    fn json_is_stored_as_given() {
        let payload = json!({ "nested": [1, 2, { "x": true }] });
        assert_eq!(ItemKind::Json.validate_local("p", &payload).unwrap(), Some(payload));
    }
}

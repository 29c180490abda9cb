use super::variant::ItemKind;
use super::{
    DateOptions, EnumOptions, ForeignKeyOptions, HtmlOptions, IdArrayOptions, NumberArrayOptions,
    NumberOptions, TextArrayOptions, TextOptions,
};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::dependencies::is_reserved;
use serde_json::Value;

/// Policy flags shared by every item kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    /// Must be set by the caller when a document is created.
    pub required: bool,
    /// Only writable at creation time.
    pub read_only: bool,
    /// No two documents may hold the same value.
    pub unique: bool,
    /// Scopes every unique item of the schema to documents sharing this value.
    pub unique_indexer: bool,
    pub indexable: bool,
    /// Left out of projections unless the caller asks for verbose output.
    pub sensitive: bool,
}

/// Immutable definition of one item, shared by a prototype and all of its
/// instances.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDescriptor {
    name: String,
    kind: ItemKind,
    flags: ItemFlags,
    default: Value,
}

impl ItemDescriptor {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        let default = kind.default_value();
        Self {
            name: name.into(),
            kind,
            flags: ItemFlags::default(),
            default,
        }
    }

    pub fn text(name: impl Into<String>, options: TextOptions) -> Self {
        Self::new(name, ItemKind::Text(options))
    }

    pub fn html(name: impl Into<String>, options: HtmlOptions) -> Self {
        Self::new(name, ItemKind::Html(options))
    }

    pub fn number(name: impl Into<String>, options: NumberOptions) -> Self {
        Self::new(name, ItemKind::Number(options))
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Boolean)
    }

    pub fn date(name: impl Into<String>, options: DateOptions) -> Self {
        Self::new(name, ItemKind::Date(options))
    }

    pub fn enumeration(name: impl Into<String>, options: EnumOptions) -> Self {
        Self::new(name, ItemKind::Enum(options))
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Json)
    }

    pub fn text_array(name: impl Into<String>, options: TextArrayOptions) -> Self {
        Self::new(name, ItemKind::TextArray(options))
    }

    pub fn number_array(name: impl Into<String>, options: NumberArrayOptions) -> Self {
        Self::new(name, ItemKind::NumberArray(options))
    }

    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Id)
    }

    pub fn id_array(name: impl Into<String>, options: IdArrayOptions) -> Self {
        Self::new(name, ItemKind::IdArray(options))
    }

    pub fn foreign_key(name: impl Into<String>, options: ForeignKeyOptions) -> Self {
        Self::new(name, ItemKind::ForeignKey(options))
    }

    pub fn required(mut self) -> Self {
        self.flags.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.flags.read_only = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.flags.unique = true;
        self
    }

    pub fn unique_indexer(mut self) -> Self {
        self.flags.unique_indexer = true;
        self
    }

    pub fn indexable(mut self) -> Self {
        self.flags.indexable = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// Value an instance starts with before anything is set.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Rejects reserved names and inconsistent options.
    pub fn check_definition(&self) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::InvalidData("Item names cannot be empty".to_string()));
        }
        if is_reserved(&self.name) {
            return Err(SchemaError::InvalidData(format!(
                "'{}' is a reserved field name",
                self.name
            )));
        }
        self.kind.check(&self.name)
    }
}

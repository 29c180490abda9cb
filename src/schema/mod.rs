//! Schema items, schema containers and projection.

pub mod dependencies;
pub mod id;
pub mod projection;
pub mod types;
pub mod zoned;

pub use dependencies::{DependencyEntry, Dependents};
pub use id::{is_valid_id, is_valid_id_bytes, ObjectId};
pub use projection::ProjectionOptions;
pub use types::{
    DateOptions, EnumOptions, ForeignKeyOptions, HtmlAllowList, HtmlOptions, IdArrayOptions,
    ItemDescriptor, ItemFlags, ItemKind, NumberArrayOptions, NumberKind, NumberOptions, Schema,
    SchemaBuilder, SchemaItem, TextArrayOptions, TextOptions,
};
pub use zoned::{ZonedDocument, UNASSIGNED_ZONE};

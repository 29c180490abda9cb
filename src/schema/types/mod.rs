pub mod field;
pub mod fields;
pub mod schema;

pub use field::{
    DateOptions, EnumOptions, ForeignKeyOptions, HtmlAllowList, HtmlOptions, IdArrayOptions,
    ItemDescriptor, ItemFlags, ItemKind, NumberArrayOptions, NumberKind, NumberOptions,
    TextArrayOptions, TextOptions,
};
pub use fields::SchemaItem;
pub use schema::{Schema, SchemaBuilder};

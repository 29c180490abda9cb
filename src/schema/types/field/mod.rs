//! Item kinds: definitions, options and per-kind validation.

pub mod arrays;
pub mod boolean;
pub mod common;
pub mod date;
pub mod enumeration;
pub mod foreign_key;
pub mod html;
pub mod id_array;
pub mod number;
pub mod text;
pub mod variant;

pub use arrays::{NumberArrayOptions, TextArrayOptions};
pub use common::{ItemDescriptor, ItemFlags};
pub use date::DateOptions;
pub use enumeration::EnumOptions;
pub use foreign_key::ForeignKeyOptions;
pub use html::{HtmlAllowList, HtmlOptions};
pub use id_array::IdArrayOptions;
pub use number::{NumberKind, NumberOptions, MAX_DECIMAL_PLACES};
pub use text::{strip_markup, TextOptions};
pub use variant::ItemKind;

// Document store plumbing
pub mod collection;
pub mod core;
pub mod error_utils;
pub mod query;

pub use collection::{Collection, SledCollection};
pub use core::Store;
pub use error_utils::ErrorUtils;
pub use query::{Document, Filter, FindOptions, SortOrder, Update};

//! # docschema
//!
//! A small object-document mapper over a sled document store. It provides
//! typed schema items with validation, models that bind a schema to a
//! collection, a registry resolving relationships between models by name,
//! and JSON projection that inlines referenced documents to a bounded depth.
//!
//! Referenced documents keep reverse-reference lists (`_requiredDependencies`,
//! `_optionalDependencies`, `_arrayDependencies`) that are maintained after
//! every write and delete, so callers can find dependents before removing a
//! document.
//!
//! ```no_run
//! use docschema::schema::{ForeignKeyOptions, ItemDescriptor, Schema, TextOptions};
//! use docschema::{document, Engine, ProjectionOptions};
//! use serde_json::json;
//!
//! # async fn run() -> docschema::SchemaResult<()> {
//! let engine = Engine::temporary()?;
//! let users = engine.register_model(
//!     "users",
//!     Schema::builder()
//!         .item(ItemDescriptor::text("name", TextOptions::new(1, 64)).required())
//!         .build()?,
//! )?;
//! let posts = engine.register_model(
//!     "posts",
//!     Schema::builder()
//!         .item(ItemDescriptor::text("title", TextOptions::new(1, 200)).required())
//!         .item(ItemDescriptor::foreign_key("author", ForeignKeyOptions::new("users")).required())
//!         .build()?,
//! )?;
//!
//! let ada = users.create_instance(&document(json!({ "name": "Ada" }))).await?;
//! let author = ada.id().map(|id| id.to_hex());
//! posts
//!     .create_instance(&document(json!({ "title": "Notes", "author": author })))
//!     .await?;
//!
//! let options = ProjectionOptions::new().expand(1);
//! let all = posts
//!     .download_many(&docschema::Filter::All, &Default::default(), &options)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db_operations;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod schema;
pub mod testing_utils;

pub use config::EngineConfig;
pub use db_operations::{Collection, Document, Filter, FindOptions, SortOrder, Store, Update};
pub use engine::Engine;
pub use error::{SchemaError, SchemaResult};
pub use logging::{init_logging, LogConfig};
pub use model::{Model, ModelRegistry, UpdateOutcome};
pub use schema::{ObjectId, ProjectionOptions, Schema};
pub use testing_utils::document;

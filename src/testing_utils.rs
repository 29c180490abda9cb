//! Shared helpers for tests of code built on the engine.

use crate::db_operations::{Document, Store};
use crate::engine::Engine;
use crate::error::SchemaResult;
use serde_json::Value;

/// Builds throwaway stores and engines.
pub struct TestDatabaseFactory;

impl TestDatabaseFactory {
    /// Create a temporary sled database for testing
    pub fn create_temp_sled_db() -> Result<sled::Db, sled::Error> {
        sled::Config::new().temporary(true).open()
    }

    pub fn create_temp_store() -> SchemaResult<Store> {
        Ok(Store::new(Self::create_temp_sled_db()?).with_flush_on_write(false))
    }

    pub fn create_temp_engine() -> SchemaResult<Engine> {
        Engine::temporary()
    }
}

/// Converts a `json!` object literal into a [`Document`]. Anything other
/// than an object yields an empty document.
pub fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

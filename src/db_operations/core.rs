use super::collection::{Collection, SledCollection};
use super::error_utils::ErrorUtils;
use crate::config::EngineConfig;
use crate::error::SchemaResult;
use log::info;
use std::path::Path;
use std::sync::Arc;

/// Sled-backed document store handing out one [`Collection`] per tree.
#[derive(Clone)]
pub struct Store {
    /// The underlying sled database instance
    db: sled::Db,
    flush_on_write: bool,
}

impl Store {
    /// Wraps an already-open sled database.
    pub fn new(db: sled::Db) -> Self {
        Self {
            db,
            flush_on_write: true,
        }
    }

    /// Opens (or creates) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        info!("Opening document store at {}", path.as_ref().display());
        let db = sled::open(path).map_err(ErrorUtils::from_sled_error("open"))?;
        Ok(Self::new(db))
    }

    /// Opens a store that lives only as long as this process.
    pub fn temporary() -> SchemaResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(ErrorUtils::from_sled_error("open"))?;
        Ok(Self::new(db).with_flush_on_write(false))
    }

    /// Opens the store described by `config`.
    pub fn from_config(config: &EngineConfig) -> SchemaResult<Self> {
        let store = if config.temporary {
            Self::temporary()?
        } else {
            Self::open(&config.storage_path)?
        };
        Ok(store.with_flush_on_write(config.flush_on_write))
    }

    /// Whether every write is flushed to disk before returning.
    pub fn with_flush_on_write(mut self, flush_on_write: bool) -> Self {
        self.flush_on_write = flush_on_write;
        self
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Returns the handle for the named collection, creating it on first use.
    pub fn collection(&self, name: &str) -> SchemaResult<Arc<dyn Collection>> {
        let tree = self
            .db
            .open_tree(name)
            .map_err(ErrorUtils::from_sled_error("open collection"))?;
        Ok(Arc::new(SledCollection::new(name, tree, self.flush_on_write)))
    }

    /// Names of every collection that has been opened in this store.
    pub fn collection_names(&self) -> Vec<String> {
        self.db
            .tree_names()
            .into_iter()
            .map(|name| String::from_utf8_lossy(&name).to_string())
            .filter(|name| name != "__sled__default")
            .collect()
    }
}

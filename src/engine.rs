use crate::config::EngineConfig;
use crate::db_operations::Store;
use crate::error::SchemaResult;
use crate::model::{Model, ModelRegistry};
use crate::schema::{ProjectionOptions, Schema};
use log::info;
use std::sync::Arc;

/// A store and the registry of models bound to it.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    store: Store,
    registry: ModelRegistry,
}

impl Engine {
    /// Opens the store described by `config` with an empty registry.
    pub fn open(config: EngineConfig) -> SchemaResult<Self> {
        config.validate()?;
        let store = Store::from_config(&config)?;
        info!(
            "Engine ready (temporary: {}, default expansion depth: {})",
            config.temporary, config.default_expand_max_depth
        );
        Ok(Self {
            config,
            store,
            registry: ModelRegistry::new(),
        })
    }

    /// An engine over a throwaway database.
    pub fn temporary() -> SchemaResult<Self> {
        Self::open(EngineConfig::temporary())
    }

    /// Binds `schema` to the collection called `name` and registers the model.
    pub fn register_model(&self, name: &str, schema: Schema) -> SchemaResult<Arc<Model>> {
        let collection = self.store.collection(name)?;
        self.registry.register(Model::new(name, collection, schema))
    }

    pub fn model(&self, name: &str) -> SchemaResult<Arc<Model>> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Projection options expanding to the configured default depth.
    pub fn expanded(&self) -> ProjectionOptions {
        ProjectionOptions::expanded_default(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::schema::ItemDescriptor;

    #[test]
    fn registered_models_are_found_by_name() {
        let engine = Engine::temporary().unwrap();
        let schema = Schema::builder()
            .item(ItemDescriptor::boolean("done"))
            .build()
            .unwrap();
        engine.register_model("tasks", schema).unwrap();
        assert_eq!(engine.model("tasks").unwrap().collection().name(), "tasks");
        assert!(matches!(engine.model("other"), Err(SchemaError::Reference(_))));
    }

    #[test]
    fn expanded_uses_configured_depth() {
        let config = EngineConfig {
            default_expand_max_depth: 3,
            ..EngineConfig::temporary()
        };
        let engine = Engine::open(config).unwrap();
        assert_eq!(engine.expanded().expand_max_depth, Some(3));
    }
}

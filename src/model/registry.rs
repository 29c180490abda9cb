//! Name to model lookup used by relationship items.
//!
//! Foreign keys and id arrays name their target model as a string and
//! resolve it here at validation and projection time, so models can refer
//! to each other in any order. Each registry is an explicit value: tests
//! build their own and may reset it.

use super::Model;
use crate::db_operations::ErrorUtils;
use crate::error::{SchemaError, SchemaResult};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

type ModelMap = RwLock<HashMap<String, Arc<Model>>>;

/// Shared name to [`Model`] map.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Arc<ModelMap>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `model` under its name, replacing any model of that name.
    /// The model keeps a weak handle back to this registry.
    pub fn register(&self, mut model: Model) -> SchemaResult<Arc<Model>> {
        model.attach(self.downgrade());
        let model = Arc::new(model);
        let mut models = self
            .models
            .write()
            .map_err(|_| ErrorUtils::lock_error("model registry"))?;
        if models
            .insert(model.name().to_string(), Arc::clone(&model))
            .is_some()
        {
            info!("Replaced model '{}'", model.name());
        } else {
            info!("Registered model '{}'", model.name());
        }
        Ok(model)
    }

    /// Looks a model up by name.
    pub fn get(&self, name: &str) -> SchemaResult<Arc<Model>> {
        let models = self
            .models
            .read()
            .map_err(|_| ErrorUtils::lock_error("model registry"))?;
        models
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::Reference(format!("Model '{}' is not registered", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models
            .read()
            .map(|models| models.contains_key(name))
            .unwrap_or(false)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .models
            .read()
            .map(|models| models.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn unregister(&self, name: &str) -> SchemaResult<Option<Arc<Model>>> {
        let mut models = self
            .models
            .write()
            .map_err(|_| ErrorUtils::lock_error("model registry"))?;
        Ok(models.remove(name))
    }

    /// Drops every registered model.
    pub fn clear(&self) -> SchemaResult<()> {
        self.models
            .write()
            .map_err(|_| ErrorUtils::lock_error("model registry"))?
            .clear();
        Ok(())
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            models: Arc::downgrade(&self.models),
        }
    }
}

/// Non-owning handle on a [`ModelRegistry`], held by registered models so
/// the registry and its models do not keep each other alive.
#[derive(Debug, Clone, Default)]
pub struct WeakRegistry {
    models: Weak<ModelMap>,
}

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<ModelRegistry> {
        self.models.upgrade().map(|models| ModelRegistry { models })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_operations::Store;
    use crate::schema::{ItemDescriptor, Schema};

    fn model(name: &str, store: &Store) -> Model {
        let schema = Schema::builder()
            .item(ItemDescriptor::boolean("flag"))
            .build()
            .unwrap();
        Model::new(name, store.collection(name).unwrap(), schema)
    }

    #[test]
    fn unknown_names_are_reference_errors() {
        let registry = ModelRegistry::new();
        assert!(matches!(registry.get("nope"), Err(SchemaError::Reference(_))));
    }

    #[test]
    fn register_lookup_and_reset() {
        let store = Store::temporary().unwrap();
        let registry = ModelRegistry::new();
        registry.register(model("users", &store)).unwrap();
        registry.register(model("posts", &store)).unwrap();
        assert_eq!(registry.names(), vec!["posts", "users"]);
        assert_eq!(registry.get("users").unwrap().name(), "users");

        assert!(registry.unregister("users").unwrap().is_some());
        assert!(!registry.contains("users"));
        registry.clear().unwrap();
        assert!(registry.names().is_empty());
    }

    #[test]
    fn models_do_not_keep_the_registry_alive() {
        let store = Store::temporary().unwrap();
        let registry = ModelRegistry::new();
        let users = registry.register(model("users", &store)).unwrap();
        assert!(users.registry().is_ok());
        drop(registry);
        assert!(users.registry().is_err());
    }
}

//! Collection-bound CRUD over schema instances.
//!
//! A [`Model`] pairs one schema prototype with one collection. Every call
//! clones the prototype into a fresh instance, so a model holds no document
//! state between calls.

pub mod registry;
pub mod uniqueness;

pub use registry::{ModelRegistry, WeakRegistry};
pub use uniqueness::uniqueness_filter;

use crate::db_operations::{Collection, Document, Filter, FindOptions, Update};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::dependencies::Dependents;
use crate::schema::id::ObjectId;
use crate::schema::{ProjectionOptions, Schema};
use futures::future::try_join_all;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// What [`Model::update`] hands back.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The updated instance, when no projection options were given.
    Instance(Schema),
    /// The updated instance projected with the given options.
    Projection(Value),
}

impl UpdateOutcome {
    pub fn into_instance(self) -> Option<Schema> {
        match self {
            Self::Instance(schema) => Some(schema),
            Self::Projection(_) => None,
        }
    }

    pub fn into_projection(self) -> Option<Value> {
        match self {
            Self::Instance(_) => None,
            Self::Projection(value) => Some(value),
        }
    }
}

/// One schema prototype bound to one collection.
#[derive(Debug)]
pub struct Model {
    name: String,
    collection: Arc<dyn Collection>,
    schema: Schema,
    registry: WeakRegistry,
}

impl Model {
    pub fn new(name: impl Into<String>, collection: Arc<dyn Collection>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            collection,
            schema,
            registry: WeakRegistry::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &Arc<dyn Collection> {
        &self.collection
    }

    /// The prototype. Never bound to a document.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn attach(&mut self, registry: WeakRegistry) {
        self.registry = registry;
    }

    /// The registry this model was registered in.
    pub fn registry(&self) -> SchemaResult<ModelRegistry> {
        self.registry.upgrade().ok_or_else(|| {
            SchemaError::Reference(format!("Model '{}' is not attached to a registry", self.name))
        })
    }

    /// A fresh, unbound instance of the prototype.
    pub fn new_instance(&self) -> Schema {
        self.schema.clone()
    }

    /// Hydrates a stored document into an instance.
    pub fn instantiate(&self, doc: &Document) -> SchemaResult<Schema> {
        let mut instance = self.schema.clone();
        instance.load(doc)?;
        Ok(instance)
    }

    pub async fn find_many(&self, filter: &Filter, options: &FindOptions) -> SchemaResult<Vec<Schema>> {
        self.collection
            .find(filter, options)
            .await?
            .iter()
            .map(|doc| self.instantiate(doc))
            .collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> SchemaResult<Option<Schema>> {
        let options = FindOptions::new().limit(1);
        Ok(self.find_many(filter, &options).await?.into_iter().next())
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> SchemaResult<Option<Schema>> {
        match self.collection.find_by_id(id).await? {
            Some(doc) => Ok(Some(self.instantiate(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn count(&self, filter: &Filter) -> SchemaResult<u64> {
        self.collection.count(filter).await
    }

    /// Deserializes the first matching stored document into `T`.
    pub async fn find_one_as<T: DeserializeOwned>(&self, filter: &Filter) -> SchemaResult<Option<T>> {
        let options = FindOptions::new().limit(1);
        match self.collection.find(filter, &options).await?.into_iter().next() {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc))?)),
            None => Ok(None),
        }
    }

    /// Projects a stored document of this model. `depth` counts the
    /// references followed to reach it.
    pub async fn project(
        &self,
        doc: Document,
        options: &ProjectionOptions,
        depth: u32,
        registry: &ModelRegistry,
    ) -> SchemaResult<Value> {
        let instance = self.instantiate(&doc)?;
        instance.get_as_json(options, depth, registry).await
    }

    /// Finds and projects every matching document.
    pub async fn download_many(
        &self,
        filter: &Filter,
        find_options: &FindOptions,
        options: &ProjectionOptions,
    ) -> SchemaResult<Vec<Value>> {
        let registry = self.registry()?;
        let instances = self.find_many(filter, find_options).await?;
        try_join_all(
            instances
                .iter()
                .map(|instance| instance.get_as_json(options, 0, &registry)),
        )
        .await
    }

    pub async fn download_one(
        &self,
        filter: &Filter,
        options: &ProjectionOptions,
    ) -> SchemaResult<Option<Value>> {
        let registry = self.registry()?;
        match self.find_one(filter).await? {
            Some(instance) => Ok(Some(instance.get_as_json(options, 0, &registry).await?)),
            None => Ok(None),
        }
    }

    /// Projects the first matching document and deserializes it into `T`.
    pub async fn download_one_as<T: DeserializeOwned>(
        &self,
        filter: &Filter,
        options: &ProjectionOptions,
    ) -> SchemaResult<Option<T>> {
        match self.download_one(filter, options).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Creates a document from caller data.
    ///
    /// Read-only items may be set. Uniqueness is checked, then every item is
    /// validated with required items enforced. After the insert the instance
    /// is bound to the new id and its relationship items record it on their
    /// targets.
    pub async fn create_instance(&self, data: &Document) -> SchemaResult<Schema> {
        let registry = self.registry()?;
        let mut instance = self.new_instance();
        instance.set(data, true);
        self.check_uniqueness(&instance, None).await?;
        instance.validate(true, &registry).await?;

        let id = self.collection.insert_one(instance.serialize()).await?;
        instance.set_id(id);
        instance.post_upsert(self.collection.name(), &registry).await?;
        info!("{}: created {}", self.name, id);
        Ok(instance)
    }

    /// Updates the first document matching `filter`.
    ///
    /// Read-only items are left untouched and required items are not
    /// enforced. With `options` the result is the projected document,
    /// otherwise the live instance.
    pub async fn update(
        &self,
        filter: &Filter,
        data: &Document,
        options: Option<&ProjectionOptions>,
    ) -> SchemaResult<UpdateOutcome> {
        let registry = self.registry()?;
        let mut instance = self
            .find_one(filter)
            .await?
            .ok_or_else(|| SchemaError::NotFound(format!("no {} matches {:?}", self.name, filter)))?;
        let id = instance.id().ok_or_else(|| {
            SchemaError::InvalidData(format!("{} document without an _id", self.name))
        })?;

        instance.set(data, false);
        instance.validate(false, &registry).await?;
        self.check_uniqueness(&instance, Some(id)).await?;

        let update = Update::new().set_all(instance.serialize());
        if !self.collection.update_one(&id, &update).await? {
            return Err(SchemaError::NotFound(format!("{} {}", self.name, id)));
        }
        instance.post_upsert(self.collection.name(), &registry).await?;
        debug!("{}: updated {}", self.name, id);

        match options {
            Some(options) => Ok(UpdateOutcome::Projection(
                instance.get_as_json(options, 0, &registry).await?,
            )),
            None => Ok(UpdateOutcome::Instance(instance)),
        }
    }

    /// Deletes every matching document and releases its references.
    /// Returns how many documents were removed.
    ///
    /// Dependents of the deleted documents are not touched. Callers that
    /// need cascade behavior read [`Model::dependents_of`] first.
    pub async fn delete_instances(&self, filter: &Filter) -> SchemaResult<u64> {
        let registry = self.registry()?;
        let instances = self.find_many(filter, &FindOptions::default()).await?;
        let collection = self.collection.name();

        let removed = try_join_all(
            instances
                .iter()
                .map(|instance| self.delete_one_instance(instance, collection, &registry)),
        )
        .await?;

        let count = removed.into_iter().filter(|deleted| *deleted).count() as u64;
        info!("{}: deleted {} document(s)", self.name, count);
        Ok(count)
    }

    async fn delete_one_instance(
        &self,
        instance: &Schema,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<bool> {
        let Some(id) = instance.id() else {
            return Ok(false);
        };
        if !self.collection.delete_one(&id).await? {
            return Ok(false);
        }
        instance.post_delete(collection, registry).await?;
        Ok(true)
    }

    /// Reads the dependency index of a stored document.
    pub async fn dependents_of(&self, id: &ObjectId) -> SchemaResult<Dependents> {
        let doc = self
            .collection
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchemaError::NotFound(format!("{} {}", self.name, id)))?;
        Dependents::from_document(&doc)
    }
}

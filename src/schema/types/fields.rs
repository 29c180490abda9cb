use super::field::foreign_key::RequiredTarget;
use super::field::{ItemDescriptor, ItemFlags, ItemKind};
use crate::db_operations::Document;
use crate::error::SchemaResult;
use crate::model::ModelRegistry;
use crate::schema::id::{id_from_value, ObjectId};
use crate::schema::projection::ProjectionOptions;
use serde_json::Value;
use std::sync::Arc;

/// One item of a schema instance.
///
/// The definition is shared with the prototype. The value and bookkeeping
/// state belong to this instance alone, so cloning an item yields a copy
/// that can be changed without affecting the original.
#[derive(Debug, Clone)]
pub struct SchemaItem {
    descriptor: Arc<ItemDescriptor>,
    value: Value,
    modified: bool,
    // Value as last read from or written to the store.
    persisted: Option<Value>,
    // Targets found by the last validation, consumed by post_upsert.
    resolved: Vec<Document>,
}

impl SchemaItem {
    pub fn new(descriptor: Arc<ItemDescriptor>) -> Self {
        let value = descriptor.default_value().clone();
        Self {
            descriptor,
            value,
            modified: false,
            persisted: None,
            resolved: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn flags(&self) -> ItemFlags {
        self.descriptor.flags()
    }

    pub fn kind(&self) -> &ItemKind {
        self.descriptor.kind()
    }

    pub fn descriptor(&self) -> &Arc<ItemDescriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn persisted_value(&self) -> Option<&Value> {
        self.persisted.as_ref()
    }

    /// Sets a caller-provided value and marks the item modified.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.modified = true;
    }

    /// Hydrates the item from a stored document.
    pub(crate) fn load_value(&mut self, value: Value) {
        self.persisted = Some(value.clone());
        self.value = value;
        self.modified = false;
    }

    /// The document a foreign key resolved to during validation.
    pub fn resolved_target(&self) -> Option<&Document> {
        match self.kind() {
            ItemKind::ForeignKey(_) => self.resolved.first(),
            _ => None,
        }
    }

    /// Normalizes the current value in place, resolving relationships
    /// through `registry`.
    pub async fn validate(&mut self, registry: &ModelRegistry) -> SchemaResult<()> {
        let name = self.descriptor.name();
        if let Some(normalized) = self.descriptor.kind().validate_local(name, &self.value)? {
            self.value = normalized;
            return Ok(());
        }

        let (normalized, resolved) = match self.descriptor.kind() {
            ItemKind::ForeignKey(options) => {
                let (value, target) = options.validate(name, &self.value, registry).await?;
                (value, target.into_iter().collect())
            }
            ItemKind::IdArray(options) => options.validate(name, &self.value, registry).await?,
            _ => return Ok(()),
        };
        self.value = normalized;
        self.resolved = resolved;
        Ok(())
    }

    /// Projects the value. `depth` counts how many references were
    /// followed to reach the owning document.
    pub async fn get_value(
        &self,
        options: &ProjectionOptions,
        depth: u32,
        registry: &ModelRegistry,
    ) -> SchemaResult<Value> {
        let name = self.descriptor.name();
        match self.descriptor.kind() {
            ItemKind::ForeignKey(fk) => {
                fk.get_value(name, &self.value, options, depth, registry).await
            }
            ItemKind::IdArray(ids) => {
                ids.get_value(name, &self.value, options, depth, registry).await
            }
            _ => Ok(self.value.clone()),
        }
    }

    /// The target this item points at when it is a required foreign key.
    pub(crate) fn required_target(&self) -> Option<RequiredTarget> {
        match self.descriptor.kind() {
            ItemKind::ForeignKey(fk) if !fk.can_adapt => id_from_value(self.name(), &self.value)
                .ok()
                .flatten()
                .map(|id| RequiredTarget {
                    target_model: fk.target_model.clone(),
                    id,
                }),
            _ => None,
        }
    }

    /// Records the owner in the dependency index of resolved targets, then
    /// clears the cache.
    pub(crate) async fn post_upsert(
        &mut self,
        held: &[RequiredTarget],
        owner: ObjectId,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<()> {
        let name = self.descriptor.name();
        match self.descriptor.kind() {
            ItemKind::ForeignKey(fk) => {
                fk.post_upsert(
                    name,
                    self.resolved.first(),
                    self.persisted.as_ref(),
                    held,
                    owner,
                    collection,
                    registry,
                )
                .await?
            }
            ItemKind::IdArray(ids) => {
                ids.post_upsert(
                    name,
                    &self.resolved,
                    self.persisted.as_ref(),
                    owner,
                    collection,
                    registry,
                )
                .await?
            }
            _ => {}
        }
        self.resolved.clear();
        self.persisted = Some(self.value.clone());
        Ok(())
    }

    /// Pulls the owner out of the dependency index of stored targets.
    pub async fn post_delete(
        &self,
        owner: ObjectId,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<()> {
        let name = self.descriptor.name();
        match self.descriptor.kind() {
            ItemKind::ForeignKey(fk) => {
                fk.post_delete(name, &self.value, owner, collection, registry).await
            }
            ItemKind::IdArray(ids) => {
                ids.post_delete(name, &self.value, owner, collection, registry).await
            }
            _ => Ok(()),
        }
    }
}

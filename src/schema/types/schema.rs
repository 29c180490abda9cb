use super::field::ItemDescriptor;
use super::fields::SchemaItem;
use crate::db_operations::Document;
use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelRegistry;
use crate::schema::id::{id_from_value, ObjectId};
use crate::schema::projection::ProjectionOptions;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// An ordered set of named items.
///
/// A prototype is built once per model and never bound to a document.
/// Instances are clones of the prototype, each bound to at most one
/// document id. Item order is the order of serialized and projected fields.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    id: Option<ObjectId>,
    items: Vec<SchemaItem>,
}

/// Builder for schema prototypes.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    items: Vec<ItemDescriptor>,
}

impl SchemaBuilder {
    pub fn item(mut self, descriptor: ItemDescriptor) -> Self {
        self.items.push(descriptor);
        self
    }

    /// Checks every definition and name uniqueness.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(self.items.len());
        for descriptor in self.items {
            descriptor.check_definition()?;
            if !seen.insert(descriptor.name().to_string()) {
                return Err(SchemaError::InvalidData(format!(
                    "'{}' is declared more than once",
                    descriptor.name()
                )));
            }
            items.push(SchemaItem::new(Arc::new(descriptor)));
        }
        Ok(Schema { id: None, items })
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    pub fn items(&self) -> &[SchemaItem] {
        &self.items
    }

    pub fn item(&self, name: &str) -> Option<&SchemaItem> {
        self.items.iter().find(|item| item.name() == name)
    }

    pub fn item_mut(&mut self, name: &str) -> Option<&mut SchemaItem> {
        self.items.iter_mut().find(|item| item.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.item(name).map(SchemaItem::value)
    }

    /// Applies caller data to matching items. Unknown keys are ignored, and
    /// read-only items are skipped unless `allow_read_only_override` is set.
    /// Returns how many items were set.
    pub fn set(&mut self, data: &Document, allow_read_only_override: bool) -> usize {
        let mut count = 0;
        for item in &mut self.items {
            if item.flags().read_only && !allow_read_only_override {
                continue;
            }
            if let Some(value) = data.get(item.name()) {
                item.set_value(value.clone());
                count += 1;
            }
        }
        count
    }

    /// Hydrates the instance from a stored document.
    pub fn load(&mut self, doc: &Document) -> SchemaResult<()> {
        if let Some(raw) = doc.get("_id") {
            self.id = id_from_value("_id", raw)?;
        }
        for item in &mut self.items {
            if let Some(value) = doc.get(item.name()) {
                item.load_value(value.clone());
            }
        }
        Ok(())
    }

    /// Validates every item in parallel. With `require_all`, a required item
    /// that was never set fails before its own validator runs.
    pub async fn validate(&mut self, require_all: bool, registry: &ModelRegistry) -> SchemaResult<()> {
        try_join_all(self.items.iter_mut().map(|item| async move {
            if require_all && item.flags().required && !item.is_modified() {
                return Err(SchemaError::Required(item.name().to_string()));
            }
            item.validate(registry).await
        }))
        .await?;
        Ok(())
    }

    /// Item values keyed by name, without `_id`.
    pub fn serialize(&self) -> Document {
        self.items
            .iter()
            .map(|item| (item.name().to_string(), item.value().clone()))
            .collect()
    }

    /// The stored form: `_id` first when bound, then every item.
    pub fn to_document(&self) -> Document {
        let mut doc = Map::new();
        if let Some(id) = self.id {
            doc.insert("_id".to_string(), Value::String(id.to_hex()));
        }
        doc.extend(self.serialize());
        doc
    }

    /// Projects the instance to JSON. Sensitive items are left out unless
    /// `options.verbose` is set. References are expanded per `options`,
    /// with `depth` counting the references already followed.
    pub fn get_as_json<'a>(
        &'a self,
        options: &'a ProjectionOptions,
        depth: u32,
        registry: &'a ModelRegistry,
    ) -> BoxFuture<'a, SchemaResult<Value>> {
        async move {
            let visible: Vec<&SchemaItem> = self
                .items
                .iter()
                .filter(|item| options.verbose || !item.flags().sensitive)
                .collect();
            let values = try_join_all(
                visible
                    .iter()
                    .map(|item| item.get_value(options, depth, registry)),
            )
            .await?;

            let mut projection = Map::new();
            if let Some(id) = self.id {
                projection.insert("_id".to_string(), Value::String(id.to_hex()));
            }
            for (item, value) in visible.into_iter().zip(values) {
                projection.insert(item.name().to_string(), value);
            }
            Ok(Value::Object(projection))
        }
        .boxed()
    }

    /// Runs every item's post-write hook in parallel.
    pub async fn post_upsert(&mut self, collection: &str, registry: &ModelRegistry) -> SchemaResult<()> {
        let owner = self.require_id()?;
        let held: Vec<_> = self
            .items
            .iter()
            .filter_map(SchemaItem::required_target)
            .collect();
        let held = &held;
        try_join_all(
            self.items
                .iter_mut()
                .map(|item| item.post_upsert(held, owner, collection, registry)),
        )
        .await?;
        Ok(())
    }

    /// Runs every item's delete hook in parallel.
    pub async fn post_delete(&self, collection: &str, registry: &ModelRegistry) -> SchemaResult<()> {
        let owner = self.require_id()?;
        try_join_all(
            self.items
                .iter()
                .filter(|item| item.kind().is_relationship())
                .map(|item| item.post_delete(owner, collection, registry)),
        )
        .await?;
        Ok(())
    }

    pub fn unique_items(&self) -> impl Iterator<Item = &SchemaItem> {
        self.items.iter().filter(|item| item.flags().unique)
    }

    pub fn unique_indexers(&self) -> impl Iterator<Item = &SchemaItem> {
        self.items.iter().filter(|item| item.flags().unique_indexer)
    }

    fn require_id(&self) -> SchemaResult<ObjectId> {
        self.id.ok_or_else(|| {
            SchemaError::InvalidData("Schema instance is not bound to a document".to_string())
        })
    }
}

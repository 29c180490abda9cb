use super::arrays::{check_count, elements};
use super::foreign_key::document_id;
use crate::db_operations::{Document, Filter, FindOptions, Update};
use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelRegistry;
use crate::schema::dependencies::{DependencyEntry, ARRAY_DEPENDENCIES};
use crate::schema::id::{id_from_value, ObjectId};
use crate::schema::projection::ProjectionOptions;
use futures::future::try_join_all;
use log::{debug, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Options for an ordered list of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdArrayOptions {
    /// Registry name of the referenced model. Untyped arrays are neither
    /// resolved nor recorded in any dependency index.
    pub target_model: Option<String>,
    pub min_items: usize,
    pub max_items: usize,
}

impl Default for IdArrayOptions {
    fn default() -> Self {
        Self {
            target_model: None,
            min_items: 0,
            max_items: 10_000,
        }
    }
}

impl IdArrayOptions {
    pub fn new(target_model: impl Into<String>) -> Self {
        Self {
            target_model: Some(target_model.into()),
            ..Default::default()
        }
    }

    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn items(mut self, min_items: usize, max_items: usize) -> Self {
        self.min_items = min_items;
        self.max_items = max_items;
        self
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        if self.min_items > self.max_items {
            return Err(SchemaError::InvalidData(format!(
                "'{}' has a minimum of {} items above its maximum of {}",
                name, self.min_items, self.max_items
            )));
        }
        Ok(())
    }

    pub(crate) async fn validate(
        &self,
        name: &str,
        value: &Value,
        registry: &ModelRegistry,
    ) -> SchemaResult<(Value, Vec<Document>)> {
        let ids = parse_ids(name, value)?;
        check_count(name, ids.len(), self.min_items, self.max_items)?;
        let normalized = Value::Array(ids.iter().map(|id| Value::String(id.to_hex())).collect());

        let Some(target_model) = &self.target_model else {
            return Ok((normalized, Vec::new()));
        };
        if ids.is_empty() {
            return Ok((normalized, Vec::new()));
        }

        let target = registry.get(target_model)?;
        let found = target
            .collection()
            .find(&Filter::ids(&ids), &FindOptions::default())
            .await?;
        let found_ids: HashSet<ObjectId> = found.iter().filter_map(document_id).collect();
        if let Some(missing) = ids.iter().find(|id| !found_ids.contains(id)) {
            return Err(SchemaError::Reference(format!(
                "'{}' references a {} that does not exist: {}",
                name, target_model, missing
            )));
        }
        Ok((normalized, found))
    }

    /// Records `owner` on every resolved target in parallel, pulling it from
    /// targets that were dropped from the list since it was loaded.
    pub(crate) async fn post_upsert(
        &self,
        name: &str,
        resolved: &[Document],
        previous: Option<&Value>,
        owner: ObjectId,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<()> {
        let Some(target_model) = &self.target_model else {
            return Ok(());
        };
        let target = registry.get(target_model)?;
        let entry = DependencyEntry::with_property(owner, collection, name);

        let current: HashSet<ObjectId> = resolved.iter().filter_map(document_id).collect();
        let released: Vec<ObjectId> = match previous {
            Some(previous) => parse_ids(name, previous)?
                .into_iter()
                .filter(|id| !current.contains(id))
                .collect(),
            None => Vec::new(),
        };

        let release = Update::new().pull(ARRAY_DEPENDENCIES, entry.matcher());
        let record = Update::new()
            .pull(ARRAY_DEPENDENCIES, entry.matcher())
            .push(ARRAY_DEPENDENCIES, entry.to_value());

        let collection_handle = target.collection();
        try_join_all(
            released
                .iter()
                .map(|id| collection_handle.update_one(id, &release)),
        )
        .await?;
        let recorded = try_join_all(
            current
                .iter()
                .map(|id| collection_handle.update_one(id, &record)),
        )
        .await?;

        let vanished = recorded.iter().filter(|written| !**written).count();
        if vanished > 0 {
            warn!("{} {} target(s) of '{}' vanished before recording {}", vanished, target_model, name, owner);
        }
        debug!("'{}' of {} recorded on {} {}", name, owner, current.len(), target_model);
        Ok(())
    }

    pub(crate) async fn post_delete(
        &self,
        name: &str,
        value: &Value,
        owner: ObjectId,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<()> {
        let Some(target_model) = &self.target_model else {
            return Ok(());
        };
        let ids = parse_ids(name, value)?;
        if ids.is_empty() {
            return Ok(());
        }
        let target = registry.get(target_model)?;
        let entry = DependencyEntry::with_property(owner, collection, name);
        let release = Update::new().pull(ARRAY_DEPENDENCIES, entry.matcher());
        let collection_handle = target.collection();
        try_join_all(ids.iter().map(|id| collection_handle.update_one(id, &release))).await?;
        Ok(())
    }

    /// Projects the list, inlining every target found by one batch query.
    /// Ids whose target is missing stay as ids.
    pub(crate) async fn get_value(
        &self,
        name: &str,
        value: &Value,
        options: &ProjectionOptions,
        depth: u32,
        registry: &ModelRegistry,
    ) -> SchemaResult<Value> {
        if !options.expand_foreign_keys {
            return Ok(value.clone());
        }
        let max_depth = options.require_max_depth()?;
        let Some(target_model) = &self.target_model else {
            return Ok(value.clone());
        };
        if options.is_blacklisted(name) || depth >= max_depth {
            return Ok(value.clone());
        }

        let ids = parse_ids(name, value)?;
        if ids.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        let target = registry.get(target_model)?;
        let found = target
            .collection()
            .find(&Filter::ids(&ids), &FindOptions::default())
            .await?;
        let by_id: HashMap<ObjectId, Document> = found
            .into_iter()
            .filter_map(|doc| document_id(&doc).map(|id| (id, doc)))
            .collect();

        let projections = ids.iter().map(|id| {
            let doc = by_id.get(id).cloned();
            let target = target.clone();
            async move {
                match doc {
                    Some(doc) => target.project(doc, options, depth + 1, registry).await,
                    None => {
                        warn!("'{}' points at missing {} {}", name, target.name(), id);
                        Ok(Value::String(id.to_hex()))
                    }
                }
            }
        });
        Ok(Value::Array(try_join_all(projections).await?))
    }
}

/// Reads every id of a list. Blank entries are skipped.
pub(crate) fn parse_ids(name: &str, value: &Value) -> SchemaResult<Vec<ObjectId>> {
    let mut ids = Vec::new();
    for element in elements(name, value)? {
        if let Some(id) = id_from_value(name, element)? {
            ids.push(id);
        }
    }
    Ok(ids)
}

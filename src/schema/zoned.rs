//! Documents assembled from an ordered list of element documents.
//!
//! Each element names a zone and carries a fragment of html. The document
//! projection gains an `html` object mapping every zone to the fragments of
//! its elements, concatenated in list order.

use crate::db_operations::{Document, Filter, FindOptions};
use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelRegistry;
use crate::schema::id::ObjectId;
use crate::schema::projection::ProjectionOptions;
use crate::schema::types::field::foreign_key::document_id;
use crate::schema::types::field::id_array::parse_ids;
use crate::schema::types::{ItemKind, Schema};
use log::warn;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Zone used for elements that do not name one.
pub const UNASSIGNED_ZONE: &str = "unassigned";

/// Builds zoned html for schemas holding an id array of elements.
#[derive(Debug, Clone)]
pub struct ZonedDocument {
    elements_item: String,
    zone_field: String,
    html_field: String,
}

impl Default for ZonedDocument {
    fn default() -> Self {
        Self::new("elements")
    }
}

impl ZonedDocument {
    /// Reads element ids from the id-array item `elements_item`.
    pub fn new(elements_item: impl Into<String>) -> Self {
        Self {
            elements_item: elements_item.into(),
            zone_field: "zone".to_string(),
            html_field: "html".to_string(),
        }
    }

    /// Element fields holding the zone name and the html fragment.
    pub fn with_fields(mut self, zone_field: impl Into<String>, html_field: impl Into<String>) -> Self {
        self.zone_field = zone_field.into();
        self.html_field = html_field.into();
        self
    }

    /// Maps each zone to its concatenated html.
    pub async fn zones(&self, instance: &Schema, registry: &ModelRegistry) -> SchemaResult<Map<String, Value>> {
        let item = instance.item(&self.elements_item).ok_or_else(|| {
            SchemaError::InvalidData(format!("No item named '{}'", self.elements_item))
        })?;
        let target_model = match item.kind() {
            ItemKind::IdArray(options) => options.target_model.as_deref(),
            _ => None,
        }
        .ok_or_else(|| {
            SchemaError::InvalidData(format!(
                "'{}' must be an id array bound to an element model",
                self.elements_item
            ))
        })?;

        let ids = parse_ids(item.name(), item.value())?;
        let mut zones = Map::new();
        if ids.is_empty() {
            return Ok(zones);
        }

        let elements = registry.get(target_model)?;
        let found = elements
            .collection()
            .find(&Filter::ids(&ids), &FindOptions::default())
            .await?;
        let by_id: HashMap<ObjectId, Document> = found
            .into_iter()
            .filter_map(|doc| document_id(&doc).map(|id| (id, doc)))
            .collect();

        for id in &ids {
            let Some(element) = by_id.get(id) else {
                warn!("Element {} of '{}' is missing", id, self.elements_item);
                continue;
            };
            let zone = match element.get(&self.zone_field).and_then(Value::as_str) {
                Some(zone) if !zone.trim().is_empty() => zone.trim(),
                _ => UNASSIGNED_ZONE,
            };
            let html = element
                .get(&self.html_field)
                .and_then(Value::as_str)
                .unwrap_or_default();

            let entry = zones
                .entry(zone.to_string())
                .or_insert_with(|| Value::String(String::new()));
            if let Value::String(existing) = entry {
                existing.push_str(html);
            }
        }
        Ok(zones)
    }

    /// Projects `instance` and merges the zone map under `html`.
    pub async fn get_as_json(
        &self,
        instance: &Schema,
        options: &ProjectionOptions,
        registry: &ModelRegistry,
    ) -> SchemaResult<Value> {
        let mut projection = instance.get_as_json(options, 0, registry).await?;
        let zones = self.zones(instance, registry).await?;
        if let Value::Object(fields) = &mut projection {
            fields.insert("html".to_string(), Value::Object(zones));
        }
        Ok(projection)
    }
}

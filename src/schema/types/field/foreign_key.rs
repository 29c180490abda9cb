//! Single-document references.
//!
//! A foreign key stores the id of a document in another model's collection.
//! Validation proves the target exists and caches it. After a successful
//! write the owner is recorded in the target's dependency index, and the
//! entry is pulled again when the owner is deleted or repointed.

use crate::db_operations::{Document, Update};
use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelRegistry;
use crate::schema::dependencies::{DependencyEntry, OPTIONAL_DEPENDENCIES, REQUIRED_DEPENDENCIES};
use crate::schema::id::{id_from_value, ObjectId};
use crate::schema::projection::ProjectionOptions;
use log::{debug, warn};
use serde_json::Value;

/// Options for a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyOptions {
    /// Registry name of the referenced model.
    pub target_model: String,
    pub key_can_be_null: bool,
    /// Adaptable keys are recorded as optional dependencies and may be
    /// nulled by cascade code. Non-adaptable keys are required dependencies.
    pub can_adapt: bool,
}

impl ForeignKeyOptions {
    /// A required, non-nullable reference.
    pub fn new(target_model: impl Into<String>) -> Self {
        Self {
            target_model: target_model.into(),
            key_can_be_null: false,
            can_adapt: false,
        }
    }

    /// A nullable, adaptable reference.
    pub fn optional(target_model: impl Into<String>) -> Self {
        Self {
            target_model: target_model.into(),
            key_can_be_null: true,
            can_adapt: true,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.key_can_be_null = true;
        self
    }

    pub fn adaptable(mut self) -> Self {
        self.can_adapt = true;
        self
    }

    fn list(&self) -> &'static str {
        if self.can_adapt {
            OPTIONAL_DEPENDENCIES
        } else {
            REQUIRED_DEPENDENCIES
        }
    }

    fn entry(&self, name: &str, owner: ObjectId, collection: &str) -> DependencyEntry {
        if self.can_adapt {
            DependencyEntry::with_property(owner, collection, name)
        } else {
            DependencyEntry::required(owner, collection)
        }
    }

    /// Normalizes the input and looks the target up. Returns the stored
    /// value together with the resolved target document.
    pub(crate) async fn validate(
        &self,
        name: &str,
        value: &Value,
        registry: &ModelRegistry,
    ) -> SchemaResult<(Value, Option<Document>)> {
        let id = match id_from_value(name, value)? {
            Some(id) => id,
            None if self.key_can_be_null => return Ok((Value::Null, None)),
            None => {
                return Err(SchemaError::Validation(format!(
                    "'{}' must reference a {}",
                    name, self.target_model
                )))
            }
        };

        let target = registry.get(&self.target_model)?;
        match target.collection().find_by_id(&id).await? {
            Some(doc) => Ok((Value::String(id.to_hex()), Some(doc))),
            None => Err(SchemaError::Reference(format!(
                "'{}' references a {} that does not exist: {}",
                name, self.target_model, id
            ))),
        }
    }

    /// Records `owner` on the resolved target, first pulling it from the
    /// previously stored target when the reference moved.
    ///
    /// Required entries carry no property name, so every required key of
    /// one owner shares a single entry per target. `held` lists the targets
    /// the owner's required keys point at now; those are never released.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn post_upsert(
        &self,
        name: &str,
        resolved: Option<&Document>,
        previous: Option<&Value>,
        held: &[RequiredTarget],
        owner: ObjectId,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<()> {
        let current = resolved.and_then(document_id);
        let previous = match previous {
            Some(value) => id_from_value(name, value)?,
            None => None,
        };

        let target = registry.get(&self.target_model)?;
        let entry = self.entry(name, owner, collection);

        let still_held = |id: &ObjectId| {
            !self.can_adapt
                && held
                    .iter()
                    .any(|t| t.target_model == self.target_model && t.id == *id)
        };
        if let Some(previous) = previous.filter(|p| Some(*p) != current && !still_held(p)) {
            let update = Update::new().pull(self.list(), entry.matcher());
            target.collection().update_one(&previous, &update).await?;
            debug!("Released {} from {} {} ({})", owner, self.target_model, previous, name);
        }

        if let Some(current) = current {
            let update = Update::new()
                .pull(self.list(), entry.matcher())
                .push(self.list(), entry.to_value());
            if !target.collection().update_one(&current, &update).await? {
                warn!(
                    "{} {} vanished before '{}' could record {}",
                    self.target_model, current, name, owner
                );
            }
        }
        Ok(())
    }

    /// Pulls `owner` out of the stored target's dependency list.
    pub(crate) async fn post_delete(
        &self,
        name: &str,
        value: &Value,
        owner: ObjectId,
        collection: &str,
        registry: &ModelRegistry,
    ) -> SchemaResult<()> {
        let Some(id) = id_from_value(name, value)? else {
            return Ok(());
        };
        let target = registry.get(&self.target_model)?;
        let entry = self.entry(name, owner, collection);
        let update = Update::new().pull(self.list(), entry.matcher());
        if !target.collection().update_one(&id, &update).await? {
            debug!("{} {} already gone while releasing {}", self.target_model, id, owner);
        }
        Ok(())
    }

    /// Projects the reference, inlining the target while `depth` is below
    /// the configured maximum.
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
        if options.is_blacklisted(name) || depth >= max_depth {
            return Ok(value.clone());
        }
        let Some(id) = id_from_value(name, value)? else {
            return Ok(Value::Null);
        };

        let target = registry.get(&self.target_model)?;
        match target.collection().find_by_id(&id).await? {
            Some(doc) => target.project(doc, options, depth + 1, registry).await,
            None => {
                warn!("'{}' points at missing {} {}", name, self.target_model, id);
                Ok(value.clone())
            }
        }
    }
}

/// A target currently referenced by a required key of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequiredTarget {
    pub target_model: String,
    pub id: ObjectId,
}

pub(crate) fn document_id(doc: &Document) -> Option<ObjectId> {
    doc.get("_id")
        .and_then(Value::as_str)
        .and_then(|s| ObjectId::parse_str(s).ok())
}

use super::Model;
use crate::db_operations::Filter;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::id::ObjectId;
use crate::schema::{Schema, SchemaItem};
use log::debug;
use serde_json::Value;

// Creation checks uniqueness before validation, so compare the value the
// item will store rather than the raw input. Values that fail to normalize
// are compared as given and rejected by validation afterwards.
fn stored_form(item: &SchemaItem) -> Value {
    item.kind()
        .validate_local(item.name(), item.value())
        .ok()
        .flatten()
        .unwrap_or_else(|| item.value().clone())
}

/// Builds the selector matching any other document that collides with
/// `instance` on a unique item.
///
/// Each unique item contributes one clause, scoped by every unique indexer,
/// so a unique item may be unique only within a parent scope. Returns `None`
/// when the schema declares no unique items.
pub fn uniqueness_filter(instance: &Schema, exclude: Option<ObjectId>) -> Option<Filter> {
    let scope: Vec<Filter> = instance
        .unique_indexers()
        .map(|item| Filter::eq(item.name(), stored_form(item)))
        .collect();

    let clauses: Vec<Filter> = instance
        .unique_items()
        .map(|item| {
            let mut clause = vec![Filter::eq(item.name(), stored_form(item))];
            clause.extend(scope.iter().cloned());
            Filter::And(clause)
        })
        .collect();
    if clauses.is_empty() {
        return None;
    }

    let any = Filter::Or(clauses);
    Some(match exclude {
        Some(id) => Filter::And(vec![Filter::ne("_id", id.to_hex()), any]),
        None => any,
    })
}

impl Model {
    /// Fails with a uniqueness error when another document already holds
    /// one of the instance's unique values.
    ///
    /// This is a check-then-act sequence. A concurrent write landing between
    /// the check and the caller's write is not detected.
    pub async fn check_uniqueness(
        &self,
        instance: &Schema,
        exclude: Option<ObjectId>,
    ) -> SchemaResult<()> {
        let Some(filter) = uniqueness_filter(instance, exclude) else {
            return Ok(());
        };
        let matches = self.collection().count(&filter).await?;
        if matches > 0 {
            let names: Vec<&str> = instance.unique_items().map(|item| item.name()).collect();
            debug!("{}: {} document(s) collide on {:?}", self.name(), matches, names);
            return Err(SchemaError::Uniqueness(names.join(", ")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_operations::Document;
    use crate::schema::{ItemDescriptor, TextOptions};
    use serde_json::json;

    fn scoped() -> Schema {
        let mut schema = Schema::builder()
            .item(ItemDescriptor::text("slug", TextOptions::default()).unique())
            .item(ItemDescriptor::id("site").unique_indexer())
            .item(ItemDescriptor::text("title", TextOptions::default()))
            .build()
            .unwrap();
        let data: Document = json!({ "slug": "home", "site": "507f191e810c19729de860ea" })
            .as_object()
            .cloned()
            .unwrap();
        schema.set(&data, true);
        schema
    }

    #[test]
    fn clauses_are_scoped_by_indexers() {
        let filter = uniqueness_filter(&scoped(), None).unwrap();
        let same_site = json!({ "slug": "home", "site": "507f191e810c19729de860ea" });
        let other_site = json!({ "slug": "home", "site": "507f191e810c19729de860eb" });
        assert!(filter.matches(same_site.as_object().unwrap()));
        assert!(!filter.matches(other_site.as_object().unwrap()));
    }

    #[test]
    fn excluded_id_never_collides_with_itself() {
        let id = ObjectId::new();
        let filter = uniqueness_filter(&scoped(), Some(id)).unwrap();
        let itself = json!({ "_id": id.to_hex(), "slug": "home", "site": "507f191e810c19729de860ea" });
        assert!(!filter.matches(itself.as_object().unwrap()));
    }

    #[test]
    fn raw_input_is_compared_in_stored_form() {
        let mut schema = scoped();
        let data: Document = json!({ "slug": "  <b>home</b> " }).as_object().cloned().unwrap();
        schema.set(&data, true);
        let filter = uniqueness_filter(&schema, None).unwrap();
        let stored = json!({ "slug": "home", "site": "507f191e810c19729de860ea" });
        assert!(filter.matches(stored.as_object().unwrap()));
    }

    #[test]
    fn no_unique_items_no_filter() {
        let schema = Schema::builder()
            .item(ItemDescriptor::boolean("flag"))
            .build()
            .unwrap();
        assert!(uniqueness_filter(&schema, None).is_none());
    }
}

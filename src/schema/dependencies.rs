//! Reverse-reference lists kept on referenced documents.
//!
//! When a document points at a target through a foreign key or an id array,
//! the target records an entry naming the pointer. Deleting code reads these
//! lists to find who still depends on a document.

use crate::db_operations::{Document, Filter};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::id::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dependents that cannot exist without the target.
pub const REQUIRED_DEPENDENCIES: &str = "_requiredDependencies";
/// Dependents that may be nulled when the target goes away.
pub const OPTIONAL_DEPENDENCIES: &str = "_optionalDependencies";
/// Dependents referencing the target from an id array.
pub const ARRAY_DEPENDENCIES: &str = "_arrayDependencies";

/// Field names no schema may declare.
pub const RESERVED_FIELDS: &[&str] = &[
    "_id",
    REQUIRED_DEPENDENCIES,
    OPTIONAL_DEPENDENCIES,
    ARRAY_DEPENDENCIES,
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// One entry in a dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub collection: String,
    #[serde(rename = "propertyName", default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
}

impl DependencyEntry {
    /// Entry for a required foreign key. Required entries carry no property name.
    pub fn required(owner: ObjectId, collection: &str) -> Self {
        Self {
            id: owner,
            collection: collection.to_string(),
            property_name: None,
        }
    }

    pub fn with_property(owner: ObjectId, collection: &str, property: &str) -> Self {
        Self {
            id: owner,
            collection: collection.to_string(),
            property_name: Some(property.to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("_id".to_string(), Value::String(self.id.to_hex()));
        entry.insert("collection".to_string(), Value::String(self.collection.clone()));
        if let Some(property) = &self.property_name {
            entry.insert("propertyName".to_string(), Value::String(property.clone()));
        }
        Value::Object(entry)
    }

    /// Filter selecting this entry inside a dependency list, used by `$pull`.
    pub fn matcher(&self) -> Filter {
        let mut clauses = vec![
            Filter::eq("_id", self.id.to_hex()),
            Filter::eq("collection", self.collection.clone()),
        ];
        if let Some(property) = &self.property_name {
            clauses.push(Filter::eq("propertyName", property.clone()));
        }
        Filter::And(clauses)
    }
}

/// The three dependency lists of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependents {
    pub required: Vec<DependencyEntry>,
    pub optional: Vec<DependencyEntry>,
    pub array: Vec<DependencyEntry>,
}

impl Dependents {
    pub fn from_document(doc: &Document) -> SchemaResult<Self> {
        Ok(Self {
            required: read_list(doc, REQUIRED_DEPENDENCIES)?,
            optional: read_list(doc, OPTIONAL_DEPENDENCIES)?,
            array: read_list(doc, ARRAY_DEPENDENCIES)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty() && self.array.is_empty()
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.optional.len() + self.array.len()
    }
}

fn read_list(doc: &Document, field: &str) -> SchemaResult<Vec<DependencyEntry>> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
            SchemaError::InvalidData(format!("Malformed dependency list '{}': {}", field, e))
        }),
    }
}

//! Selectors, find options and update documents understood by [`Collection`].
//!
//! The shapes mirror what a document store offers: equality, `$ne`, `$in`,
//! `$and`/`$or` composition, and `$set`/`$push`/`$pull` updates.
//!
//! [`Collection`]: super::Collection

use crate::error::{SchemaError, SchemaResult};
use crate::schema::id::ObjectId;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A stored document.
pub type Document = Map<String, Value>;

/// Document selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value. Array fields match when any element equals the value.
    Eq(String, Value),
    /// Negation of [`Filter::Eq`].
    Ne(String, Value),
    /// Field equals any of the values.
    In(String, Vec<Value>),
    /// Every clause matches. An empty list matches everything.
    And(Vec<Filter>),
    /// At least one clause matches. An empty list matches nothing.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In(field.into(), values)
    }

    /// Selects a single document by id.
    pub fn id(id: &ObjectId) -> Self {
        Self::Eq("_id".to_string(), Value::String(id.to_hex()))
    }

    /// Selects every document whose id is in `ids`.
    pub fn ids(ids: &[ObjectId]) -> Self {
        Self::In(
            "_id".to_string(),
            ids.iter().map(|id| Value::String(id.to_hex())).collect(),
        )
    }

    /// Returns the id this filter pins down when it is a plain `_id` equality.
    pub fn as_id(&self) -> Option<ObjectId> {
        match self {
            Self::Eq(field, Value::String(s)) if field == "_id" => ObjectId::parse_str(s).ok(),
            _ => None,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, expected) => value_matches(lookup(doc, field), expected),
            Self::Ne(field, expected) => !value_matches(lookup(doc, field), expected),
            Self::In(field, candidates) => {
                let actual = lookup(doc, field);
                candidates.iter().any(|c| value_matches(actual, c))
            }
            Self::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Self::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
        }
    }
}

/// Resolves a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| scalar_eq(item, expected))
        }
        Some(value) => scalar_eq(value, expected),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order used for sorting: null < bool < number < string < array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ Value::Array(_)), Some(y @ Value::Array(_)))
        | (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Paging, ordering and projection applied by `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub skip: usize,
    pub limit: Option<usize>,
    pub sort: Vec<(String, SortOrder)>,
    /// Fields to keep. `_id` is always kept.
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    pub fn projection(mut self, fields: &[&str]) -> Self {
        self.projection = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Sorts, pages and projects an already-filtered set of documents.
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if !self.sort.is_empty() {
            docs.sort_by(|a, b| {
                for (field, order) in &self.sort {
                    let ordering = compare_values(lookup(a, field), lookup(b, field));
                    let ordering = match order {
                        SortOrder::Ascending => ordering,
                        SortOrder::Descending => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let paged = docs.into_iter().skip(self.skip);
        let paged: Vec<Document> = match self.limit {
            Some(limit) => paged.take(limit).collect(),
            None => paged.collect(),
        };

        match &self.projection {
            None => paged,
            Some(fields) => paged
                .into_iter()
                .map(|doc| {
                    doc.into_iter()
                        .filter(|(key, _)| key == "_id" || fields.iter().any(|f| f == key))
                        .collect()
                })
                .collect(),
        }
    }
}

/// A single-document update: `$set` fields, then `$pull`, then `$push`.
///
/// Pulls run before pushes so that pulling and re-pushing the same entry in
/// one update leaves exactly one copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Document,
    push: Vec<(String, Value)>,
    pull: Vec<(String, Filter)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn set_all(mut self, fields: Document) -> Self {
        self.set.extend(fields);
        self
    }

    /// Appends `value` to the array stored under `field`, creating it if absent.
    pub fn push(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push.push((field.into(), value.into()));
        self
    }

    /// Removes every object entry of the array under `field` matching `matching`.
    pub fn pull(mut self, field: impl Into<String>, matching: Filter) -> Self {
        self.pull.push((field.into(), matching));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.push.is_empty() && self.pull.is_empty()
    }

    pub(crate) fn apply(&self, doc: &mut Document) -> SchemaResult<()> {
        for (field, value) in &self.set {
            if field == "_id" {
                continue;
            }
            doc.insert(field.clone(), value.clone());
        }

        for (field, matching) in &self.pull {
            match doc.get_mut(field) {
                None => {}
                Some(Value::Array(items)) => items.retain(|item| match item {
                    Value::Object(entry) => !matching.matches(entry),
                    _ => true,
                }),
                Some(_) => {
                    return Err(SchemaError::InvalidData(format!(
                        "Cannot pull from non-array field '{}'",
                        field
                    )))
                }
            }
        }

        for (field, value) in &self.push {
            match doc
                .entry(field.clone())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(value.clone()),
                _ => {
                    return Err(SchemaError::InvalidData(format!(
                        "Cannot push to non-array field '{}'",
                        field
                    )))
                }
            }
        }

        Ok(())
    }
}

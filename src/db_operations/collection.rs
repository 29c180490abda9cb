use super::error_utils::ErrorUtils;
use super::query::{Document, Filter, FindOptions, Update};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::id::ObjectId;
use async_trait::async_trait;
use log::{debug, trace};
use serde_json::Value;
use std::fmt::Debug;

/// Handle on one physical collection of documents.
///
/// This is the only surface the engine needs from a document store. Every
/// single-document write is atomic; nothing spans documents.
#[async_trait]
pub trait Collection: Send + Sync + Debug {
    /// Name of the physical collection.
    fn name(&self) -> &str;

    /// Returns every document matching `filter`, after applying `options`.
    async fn find(&self, filter: &Filter, options: &FindOptions) -> SchemaResult<Vec<Document>>;

    /// Fetches one document by id.
    async fn find_by_id(&self, id: &ObjectId) -> SchemaResult<Option<Document>>;

    /// Counts documents matching `filter`.
    async fn count(&self, filter: &Filter) -> SchemaResult<u64>;

    /// Inserts a document, generating `_id` when the document has none.
    async fn insert_one(&self, doc: Document) -> SchemaResult<ObjectId>;

    /// Applies `update` to the document with the given id as one atomic
    /// read-modify-write. Returns false when no such document exists.
    async fn update_one(&self, id: &ObjectId, update: &Update) -> SchemaResult<bool>;

    /// Removes one document. Returns false when no such document exists.
    async fn delete_one(&self, id: &ObjectId) -> SchemaResult<bool>;

    /// Removes every document matching `filter`, returning how many went.
    async fn delete_many(&self, filter: &Filter) -> SchemaResult<u64>;
}

/// [`Collection`] stored in one sled tree, keyed by hex id.
#[derive(Debug, Clone)]
pub struct SledCollection {
    name: String,
    tree: sled::Tree,
    flush_on_write: bool,
}

impl SledCollection {
    pub fn new(name: impl Into<String>, tree: sled::Tree, flush_on_write: bool) -> Self {
        Self {
            name: name.into(),
            tree,
            flush_on_write,
        }
    }

    fn decode(&self, bytes: &[u8]) -> SchemaResult<Document> {
        serde_json::from_slice(bytes).map_err(ErrorUtils::from_deserialization_error(&self.name))
    }

    fn encode(&self, doc: &Document) -> SchemaResult<Vec<u8>> {
        serde_json::to_vec(doc).map_err(ErrorUtils::from_serialization_error(&self.name))
    }

    async fn flush(&self) -> SchemaResult<()> {
        if self.flush_on_write {
            self.tree
                .flush_async()
                .await
                .map_err(ErrorUtils::from_sled_error("flush"))?;
        }
        Ok(())
    }

    fn scan(&self, filter: &Filter) -> SchemaResult<Vec<Document>> {
        if let Some(id) = filter.as_id() {
            return Ok(self.get(&id)?.into_iter().collect());
        }

        let mut matched = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry.map_err(ErrorUtils::from_sled_error("scan"))?;
            let doc = self.decode(&bytes)?;
            if filter.matches(&doc) {
                matched.push(doc);
            }
        }
        Ok(matched)
    }

    fn get(&self, id: &ObjectId) -> SchemaResult<Option<Document>> {
        match self
            .tree
            .get(id.to_hex().as_bytes())
            .map_err(ErrorUtils::from_sled_error("get"))?
        {
            Some(bytes) => Ok(Some(self.decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Collection for SledCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> SchemaResult<Vec<Document>> {
        let docs = self.scan(filter)?;
        trace!("{}: {} documents matched {:?}", self.name, docs.len(), filter);
        Ok(options.apply(docs))
    }

    async fn find_by_id(&self, id: &ObjectId) -> SchemaResult<Option<Document>> {
        self.get(id)
    }

    async fn count(&self, filter: &Filter) -> SchemaResult<u64> {
        Ok(self.scan(filter)?.len() as u64)
    }

    async fn insert_one(&self, mut doc: Document) -> SchemaResult<ObjectId> {
        let id = match doc.get("_id") {
            Some(Value::String(s)) => ObjectId::parse_str(s)?,
            Some(Value::Null) | None => ObjectId::new(),
            Some(other) => {
                return Err(SchemaError::InvalidData(format!(
                    "Document _id must be a hex string, got {}",
                    other
                )))
            }
        };
        doc.insert("_id".to_string(), Value::String(id.to_hex()));

        let bytes = self.encode(&doc)?;
        let swapped = self
            .tree
            .compare_and_swap(id.to_hex().as_bytes(), None as Option<&[u8]>, Some(bytes))
            .map_err(ErrorUtils::from_sled_error("insert"))?;
        if swapped.is_err() {
            return Err(SchemaError::InvalidData(format!(
                "A document with id {} already exists in '{}'",
                id, self.name
            )));
        }

        self.flush().await?;
        debug!("{}: inserted {}", self.name, id);
        Ok(id)
    }

    async fn update_one(&self, id: &ObjectId, update: &Update) -> SchemaResult<bool> {
        let key = id.to_hex();
        loop {
            let current = match self
                .tree
                .get(key.as_bytes())
                .map_err(ErrorUtils::from_sled_error("get"))?
            {
                Some(bytes) => bytes,
                None => return Ok(false),
            };

            let mut doc = self.decode(&current)?;
            update.apply(&mut doc)?;
            let bytes = self.encode(&doc)?;

            let swapped = self
                .tree
                .compare_and_swap(key.as_bytes(), Some(&current), Some(bytes))
                .map_err(ErrorUtils::from_sled_error("update"))?;
            match swapped {
                Ok(()) => break,
                Err(_) => trace!("{}: concurrent write on {}, retrying", self.name, id),
            }
        }

        self.flush().await?;
        debug!("{}: updated {}", self.name, id);
        Ok(true)
    }

    async fn delete_one(&self, id: &ObjectId) -> SchemaResult<bool> {
        let existed = self
            .tree
            .remove(id.to_hex().as_bytes())
            .map_err(ErrorUtils::from_sled_error("delete"))?
            .is_some();
        self.flush().await?;
        if existed {
            debug!("{}: deleted {}", self.name, id);
        }
        Ok(existed)
    }

    async fn delete_many(&self, filter: &Filter) -> SchemaResult<u64> {
        let mut removed = 0;
        for doc in self.scan(filter)? {
            let id = match doc.get("_id").and_then(Value::as_str) {
                Some(id) => ObjectId::parse_str(id)?,
                None => continue,
            };
            if self
                .tree
                .remove(id.to_hex().as_bytes())
                .map_err(ErrorUtils::from_sled_error("delete"))?
                .is_some()
            {
                removed += 1;
            }
        }
        self.flush().await?;
        debug!("{}: deleted {} documents", self.name, removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> SledCollection {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let tree = db.open_tree("posts").unwrap();
        SledCollection::new("posts", tree, false)
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_find_returns_it() {
        let posts = collection();
        let id = posts.insert_one(doc(json!({ "title": "hello" }))).await.unwrap();

        let stored = posts.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored["_id"], json!(id.to_hex()));
        assert_eq!(stored["title"], json!("hello"));

        let found = posts
            .find(&Filter::eq("title", "hello"), &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let posts = collection();
        let id = ObjectId::new();
        posts
            .insert_one(doc(json!({ "_id": id.to_hex() })))
            .await
            .unwrap();
        let err = posts
            .insert_one(doc(json!({ "_id": id.to_hex() })))
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidData(_)));
    }

    #[tokio::test]
    async fn update_missing_document_returns_false() {
        let posts = collection();
        let updated = posts
            .update_one(&ObjectId::new(), &Update::new().set("a", 1))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn set_keeps_untouched_fields() {
        let posts = collection();
        let id = posts
            .insert_one(doc(json!({ "title": "a", "_arrayDependencies": [] })))
            .await
            .unwrap();
        posts
            .update_one(&id, &Update::new().set("title", "b"))
            .await
            .unwrap();
        let stored = posts.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored["title"], json!("b"));
        assert_eq!(stored["_arrayDependencies"], json!([]));
    }

    #[tokio::test]
    async fn delete_many_counts_removed() {
        let posts = collection();
        for i in 0..3 {
            posts
                .insert_one(doc(json!({ "n": i, "kind": "x" })))
                .await
                .unwrap();
        }
        let removed = posts.delete_many(&Filter::eq("kind", "x")).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(posts.count(&Filter::All).await.unwrap(), 0);
    }
}

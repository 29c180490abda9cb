//! Shared fixtures for the integration tests.
//!
//! Every fixture runs on its own temporary sled database with its own
//! registry, so tests never see each other's models.

#![allow(dead_code)]

use docschema::schema::{
    DateOptions, ForeignKeyOptions, HtmlOptions, IdArrayOptions, ItemDescriptor, NumberOptions,
    Schema, TextOptions,
};
use docschema::testing_utils::TestDatabaseFactory;
use docschema::{document, Engine, Model, ObjectId, SchemaResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct TestFixture {
    pub engine: Engine,
}

impl TestFixture {
    /// An engine with the blog, chain and page models registered.
    pub fn new() -> Self {
        let engine = TestDatabaseFactory::create_temp_engine().expect("temporary engine");
        let fixture = Self { engine };
        fixture.register_blog().expect("blog models");
        fixture.register_chain().expect("chain models");
        fixture.register_pages().expect("page models");
        fixture
    }

    pub fn model(&self, name: &str) -> Arc<Model> {
        self.engine.model(name).expect("registered model")
    }

    /// users, tags and articles. Articles point at users through a required
    /// `editor`, an adaptable `reviewer` and at tags through an id array.
    fn register_blog(&self) -> SchemaResult<()> {
        self.engine.register_model(
            "users",
            Schema::builder()
                .item(ItemDescriptor::text("name", TextOptions::new(1, 64)).required())
                .item(ItemDescriptor::text("email", TextOptions::new(3, 128)).unique().sensitive())
                .item(ItemDescriptor::number("karma", NumberOptions::integer(0.0, 1000.0)))
                .item(ItemDescriptor::date("joined", DateOptions::default()).read_only())
                .build()?,
        )?;
        self.engine.register_model(
            "tags",
            Schema::builder()
                .item(ItemDescriptor::text("label", TextOptions::new(1, 32)).required().unique())
                .build()?,
        )?;
        self.engine.register_model(
            "articles",
            Schema::builder()
                .item(ItemDescriptor::text("title", TextOptions::new(1, 200)).required())
                .item(ItemDescriptor::text("slug", TextOptions::new(1, 200)).unique())
                .item(ItemDescriptor::id("site").unique_indexer())
                .item(ItemDescriptor::foreign_key("editor", ForeignKeyOptions::new("users")).required())
                .item(ItemDescriptor::foreign_key("reviewer", ForeignKeyOptions::optional("users")))
                .item(ItemDescriptor::id_array("tags", IdArrayOptions::new("tags").items(0, 5)))
                .item(ItemDescriptor::date("updated", DateOptions::now()))
                .build()?,
        )?;
        Ok(())
    }

    /// countries <- cities <- people, one required key per hop.
    fn register_chain(&self) -> SchemaResult<()> {
        self.engine.register_model(
            "countries",
            Schema::builder()
                .item(ItemDescriptor::text("name", TextOptions::new(1, 64)).required())
                .build()?,
        )?;
        self.engine.register_model(
            "cities",
            Schema::builder()
                .item(ItemDescriptor::text("name", TextOptions::new(1, 64)).required())
                .item(ItemDescriptor::foreign_key("country", ForeignKeyOptions::new("countries")).required())
                .build()?,
        )?;
        self.engine.register_model(
            "people",
            Schema::builder()
                .item(ItemDescriptor::text("name", TextOptions::new(1, 64)).required())
                .item(ItemDescriptor::foreign_key("city", ForeignKeyOptions::new("cities")).required())
                .build()?,
        )?;
        Ok(())
    }

    /// elements carry a zone and an html fragment; pages list elements.
    fn register_pages(&self) -> SchemaResult<()> {
        self.engine.register_model(
            "elements",
            Schema::builder()
                .item(ItemDescriptor::text("zone", TextOptions::new(0, 32)))
                .item(ItemDescriptor::html("html", HtmlOptions::new(0, 1000)))
                .build()?,
        )?;
        self.engine.register_model(
            "pages",
            Schema::builder()
                .item(ItemDescriptor::text("title", TextOptions::new(1, 64)).required())
                .item(ItemDescriptor::id_array("elements", IdArrayOptions::new("elements")))
                .build()?,
        )?;
        Ok(())
    }

    /// Creates a document and returns its id.
    pub async fn create(&self, model: &str, data: Value) -> ObjectId {
        self.model(model)
            .create_instance(&document(data))
            .await
            .expect("create document")
            .id()
            .expect("bound id")
    }

    /// Reads a stored document as raw JSON.
    pub async fn raw(&self, model: &str, id: &ObjectId) -> Option<Value> {
        self.model(model)
            .collection()
            .find_by_id(id)
            .await
            .expect("read document")
            .map(Value::Object)
    }

    pub async fn create_user(&self, name: &str) -> ObjectId {
        self.create(
            "users",
            json!({ "name": name, "email": format!("{}@example.com", name.to_lowercase()) }),
        )
        .await
    }

    /// Creates an article with a unique slug edited by `editor`.
    pub async fn create_article(&self, slug: &str, editor: &ObjectId) -> ObjectId {
        self.create(
            "articles",
            json!({ "title": format!("About {}", slug), "slug": slug, "editor": editor.to_hex() }),
        )
        .await
    }
}

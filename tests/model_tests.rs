mod common;

use common::TestFixture;
use docschema::{document, Filter, FindOptions, ProjectionOptions, SchemaError, SortOrder, UpdateOutcome};
use serde::Deserialize;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_find_round_trip() {
    let fixture = TestFixture::new();
    let id = fixture.create_user("Ada").await;

    let users = fixture.model("users");
    let found = users.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(found.id(), Some(id));
    assert_eq!(found.value("name"), Some(&json!("Ada")));
    assert_eq!(users.count(&Filter::All).await.unwrap(), 1);

    let by_name = users.find_one(&Filter::eq("name", "Ada")).await.unwrap();
    assert!(by_name.is_some());
    assert!(users.find_one(&Filter::eq("name", "Bob")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_requires_required_items() {
    let fixture = TestFixture::new();
    let err = fixture
        .model("users")
        .create_instance(&document(json!({ "email": "x@example.com" })))
        .await
        .unwrap_err();
    assert_eq!(err, SchemaError::Required("name".to_string()));
    assert_eq!(err.to_string(), "'name' is required");
}

#[tokio::test]
async fn test_validation_errors_name_the_item() {
    let fixture = TestFixture::new();
    let err = fixture
        .model("users")
        .create_instance(&document(json!({ "name": "", "email": "x@example.com" })))
        .await
        .unwrap_err();
    assert_eq!(err, SchemaError::Validation("'name' cannot be empty".to_string()));
}

#[tokio::test]
async fn test_uniqueness_round_trip() {
    let fixture = TestFixture::new();
    let users = fixture.model("users");
    users
        .create_instance(&document(json!({ "name": "Ada", "email": "ada@example.com" })))
        .await
        .unwrap();

    let err = users
        .create_instance(&document(json!({ "name": "Ada Two", "email": "ada@example.com" })))
        .await
        .unwrap_err();
    assert_eq!(err, SchemaError::Uniqueness("email".to_string()));

    let err = users
        .create_instance(&document(json!({ "name": "Ada Three", "email": " ada@example.com " })))
        .await
        .unwrap_err();
    assert_eq!(err, SchemaError::Uniqueness("email".to_string()));

    users
        .create_instance(&document(json!({ "name": "Ada Two", "email": "ada2@example.com" })))
        .await
        .unwrap();
    assert_eq!(users.count(&Filter::All).await.unwrap(), 2);
}

#[tokio::test]
async fn test_uniqueness_is_scoped_by_indexer() {
    let fixture = TestFixture::new();
    let editor = fixture.create_user("Ed").await;
    let articles = fixture.model("articles");
    let site_a = "507f191e810c19729de860ea";
    let site_b = "507f191e810c19729de860eb";

    let article = |site: &str| {
        document(json!({ "title": "Home", "slug": "home", "site": site, "editor": editor.to_hex() }))
    };
    articles.create_instance(&article(site_a)).await.unwrap();
    articles.create_instance(&article(site_b)).await.unwrap();

    let err = articles.create_instance(&article(site_a)).await.unwrap_err();
    assert!(matches!(err, SchemaError::Uniqueness(_)));
}

#[tokio::test]
async fn test_update_keeps_read_only_and_skips_required() {
    let fixture = TestFixture::new();
    let users = fixture.model("users");
    let id = fixture
        .create(
            "users",
            json!({ "name": "Ada", "email": "ada@example.com", "joined": 1000 }),
        )
        .await;

    let outcome = users
        .update(&Filter::id(&id), &document(json!({ "karma": 7, "joined": 5 })), None)
        .await
        .unwrap();
    let instance = outcome.into_instance().unwrap();
    assert_eq!(instance.value("karma"), Some(&json!(7)));
    assert_eq!(instance.value("joined"), Some(&json!(1000)));

    let stored = fixture.raw("users", &id).await.unwrap();
    assert_eq!(stored["karma"], json!(7));
    assert_eq!(stored["joined"], json!(1000));
    assert_eq!(stored["name"], json!("Ada"));
}

#[tokio::test]
async fn test_update_can_return_a_projection() {
    let fixture = TestFixture::new();
    let users = fixture.model("users");
    let id = fixture.create_user("Ada").await;

    let outcome = users
        .update(
            &Filter::id(&id),
            &document(json!({ "name": "Ada L." })),
            Some(&ProjectionOptions::new()),
        )
        .await
        .unwrap();
    let projection = match outcome {
        UpdateOutcome::Projection(value) => value,
        UpdateOutcome::Instance(_) => panic!("expected a projection"),
    };
    assert_eq!(projection["_id"], json!(id.to_hex()));
    assert_eq!(projection["name"], json!("Ada L."));
    assert!(projection.get("email").is_none());
}

#[tokio::test]
async fn test_update_excludes_itself_from_uniqueness() {
    let fixture = TestFixture::new();
    let users = fixture.model("users");
    let ada = fixture.create_user("Ada").await;
    fixture.create_user("Bob").await;

    users
        .update(&Filter::id(&ada), &document(json!({ "email": "ada@example.com" })), None)
        .await
        .unwrap();
    let err = users
        .update(&Filter::id(&ada), &document(json!({ "email": "bob@example.com" })), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::Uniqueness(_)));
}

#[tokio::test]
async fn test_update_of_missing_document_is_not_found() {
    let fixture = TestFixture::new();
    let err = fixture
        .model("users")
        .update(&Filter::eq("name", "nobody"), &document(json!({ "karma": 1 })), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::NotFound(_)));
}

#[tokio::test]
async fn test_use_now_dates_are_refreshed_by_every_write() {
    // A use-now date is a clock, not a creation stamp: every validation
    // pass overwrites whatever value it held.
    let fixture = TestFixture::new();
    let editor = fixture.create_user("Ed").await;
    let articles = fixture.model("articles");
    let id = fixture
        .create(
            "articles",
            json!({ "title": "T", "slug": "t", "editor": editor.to_hex(), "updated": 1 }),
        )
        .await;
    let created = fixture.raw("articles", &id).await.unwrap()["updated"]
        .as_i64()
        .unwrap();
    assert!(created > 1);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    articles
        .update(&Filter::id(&id), &document(json!({ "title": "T2" })), None)
        .await
        .unwrap();
    let updated = fixture.raw("articles", &id).await.unwrap()["updated"]
        .as_i64()
        .unwrap();
    assert!(updated > created);
}

#[tokio::test]
async fn test_find_many_applies_options() {
    let fixture = TestFixture::new();
    for name in ["Cleo", "Ada", "Bob", "Dan"] {
        fixture.create_user(name).await;
    }
    let users = fixture.model("users");
    let options = FindOptions::new()
        .sort("name", SortOrder::Ascending)
        .skip(1)
        .limit(2);
    let page = users.find_many(&Filter::All, &options).await.unwrap();
    let names: Vec<&Value> = page.iter().filter_map(|u| u.value("name")).collect();
    assert_eq!(names, vec![&json!("Bob"), &json!("Cleo")]);
}

#[derive(Debug, Deserialize)]
struct StoredUser {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct PublicUser {
    name: String,
    email: Option<String>,
}

#[tokio::test]
async fn test_typed_reads() {
    let fixture = TestFixture::new();
    fixture.create_user("Ada").await;
    let users = fixture.model("users");

    let stored: StoredUser = users
        .find_one_as(&Filter::eq("name", "Ada"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email, "ada@example.com");

    let public: PublicUser = users
        .download_one_as(&Filter::eq("name", "Ada"), &ProjectionOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(public.name, "Ada");
    assert_eq!(stored.name, public.name);
    assert!(public.email.is_none());
}

#[tokio::test]
async fn test_download_many_gates_sensitive_items() {
    let fixture = TestFixture::new();
    fixture.create_user("Ada").await;
    fixture.create_user("Bob").await;
    let users = fixture.model("users");

    let quiet = users
        .download_many(&Filter::All, &FindOptions::default(), &ProjectionOptions::new())
        .await
        .unwrap();
    assert_eq!(quiet.len(), 2);
    assert!(quiet.iter().all(|u| u.get("email").is_none()));

    let loud = users
        .download_many(&Filter::All, &FindOptions::default(), &ProjectionOptions::new().verbose())
        .await
        .unwrap();
    assert!(loud.iter().all(|u| u["email"].is_string()));
}

#[tokio::test]
async fn test_delete_instances_returns_count() {
    let fixture = TestFixture::new();
    for name in ["Ada", "Bob", "Cleo"] {
        fixture.create_user(name).await;
    }
    let users = fixture.model("users");
    let removed = users
        .delete_instances(&Filter::in_values("name", vec![json!("Ada"), json!("Bob")]))
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(users.count(&Filter::All).await.unwrap(), 1);
    assert_eq!(users.delete_instances(&Filter::eq("name", "Ada")).await.unwrap(), 0);
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{registry, MemoryStore};
use courier_engine::ErrorDetail;
use courier_transfer::{
    ConfigError, RemoteConfig, TransferError, TransferOptions, TransferRequest, TransferService,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Remote configuration ────────────────────────────────────────

#[test]
fn config_strips_trailing_slash() {
    let config = RemoteConfig::new("https://remote.example.com/", "token").unwrap();
    assert_eq!(config.api_url(), "https://remote.example.com/api");
}

#[test]
fn config_rejects_empty_base_url() {
    let result = RemoteConfig::new("", "token");
    assert!(matches!(result, Err(ConfigError::MissingBaseUrl)));
}

#[test]
fn config_rejects_empty_token() {
    let result = RemoteConfig::new("https://remote.example.com", "");
    assert!(matches!(result, Err(ConfigError::MissingToken)));
}

#[test]
fn config_carries_timeout() {
    let config = RemoteConfig::new("https://remote.example.com", "token")
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
}

// ── Error details ───────────────────────────────────────────────

fn status_error(body: Option<Value>) -> TransferError {
    TransferError::Status {
        status: StatusCode::BAD_REQUEST,
        url: "http://remote.example.com/api/articles".to_string(),
        body,
    }
}

#[test]
fn error_details_maps_each_remote_detail() {
    let err = status_error(Some(json!({
        "error": {
            "status": 400,
            "name": "ValidationError",
            "message": "Invalid data",
            "details": {
                "errors": [
                    { "path": ["title"], "message": "Title is required", "name": "ValidationError" },
                    { "message": "Body is too long" }
                ]
            }
        }
    })));

    assert_eq!(
        err.error_details(),
        vec![
            ErrorDetail::new("Title is required", "ValidationError"),
            ErrorDetail::new("Body is too long", "Request error"),
        ]
    );
}

#[test]
fn error_details_falls_back_to_error_message() {
    let err = status_error(Some(json!({
        "error": { "status": 404, "name": "NotFoundError", "message": "Entity not found" }
    })));

    assert_eq!(
        err.error_details(),
        vec![ErrorDetail::new("Entity not found", "Request error")]
    );
}

#[test]
fn error_details_without_error_body_is_a_transport_error() {
    let err = status_error(Some(json!({ "message": "nope" })));

    let details = err.error_details();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].name, "Transport error");
    assert!(details[0].message.contains("400"));
}

#[test]
fn error_details_empty_for_local_errors() {
    let err = TransferError::Config(ConfigError::MissingToken);
    assert!(err.error_details().is_empty());
}

// ── Transfer options ────────────────────────────────────────────

#[test]
fn options_default_to_everything_enabled() {
    let options = TransferOptions::default();
    assert!(options.upload_media);
    assert!(options.create_missing_relations);
    assert!(options.transfer_locales);
}

#[test]
fn options_deserialize_with_wire_names() {
    let options: TransferOptions = serde_json::from_value(json!({
        "uploadMedia": false,
        "createRelations": false,
        "transferLocales": true
    }))
    .unwrap();

    assert!(!options.upload_media);
    assert!(!options.create_missing_relations);
    assert!(options.transfer_locales);
}

#[test]
fn options_missing_keys_fall_back_to_defaults() {
    let options: TransferOptions = serde_json::from_value(json!({ "uploadMedia": false })).unwrap();
    assert!(!options.upload_media);
    assert!(options.create_missing_relations);
    assert!(options.transfer_locales);
}

#[test]
fn request_deserializes_without_options() {
    let request: TransferRequest = serde_json::from_value(json!({
        "collection": "api::article.article",
        "entityIds": [1, 2]
    }))
    .unwrap();

    assert_eq!(request.collection, "api::article.article");
    assert_eq!(request.entity_ids, vec![1, 2]);
    assert!(request.options.upload_media);
}

// ── Fixtures ────────────────────────────────────────────────────

async fn start_service(store: MemoryStore) -> (MockServer, TransferService) {
    let server = MockServer::start().await;
    let config = RemoteConfig::new(server.uri(), "transfer-token").unwrap();
    let service = TransferService::new(registry(), Arc::new(store), &config).unwrap();
    (server, service)
}

async fn mount_locales(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/i18n/locales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn english_only() -> Value {
    json!([{ "id": 1, "name": "English (en)", "code": "en", "isDefault": true }])
}

fn english_and_german(default: &str) -> Value {
    json!([
        { "id": 1, "name": "English (en)", "code": "en", "isDefault": default == "en" },
        { "id": 2, "name": "German (de)", "code": "de", "isDefault": default == "de" }
    ])
}

// ── Entity upserts ──────────────────────────────────────────────

#[tokio::test]
async fn transfer_updates_and_creates_entities() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "First", "body": "Alpha",
            "author": { "id": 10, "name": "Ada", "locale": "en" },
            "cover": null, "localizations": []
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "en", "title": "Second", "body": "Beta",
            "author": { "id": 10, "name": "Ada", "locale": "en" },
            "cover": null, "localizations": []
        }),
    );

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_only()).await;

    Mock::given(method("GET"))
        .and(path("/api/authors"))
        .and(query_param("filters[name][$in][0]", "Ada"))
        .and(query_param("pagination[limit]", "10000"))
        .and(query_param("publicationState", "preview"))
        .and(query_param("populate[localizations]", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 501, "attributes": { "name": "Ada", "locale": "en" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("filters[title][$in][0]", "First"))
        .and(query_param("filters[title][$in][1]", "Second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 601, "attributes": { "title": "First", "locale": "en" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/articles/601"))
        .and(body_partial_json(json!({
            "data": { "title": "First", "author": { "id": 501 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "First", "locale": "en", "body": "Alpha" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "Second", "author": { "id": 501 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 602, "attributes": { "title": "Second", "locale": "en", "body": "Beta" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1, 2]))
        .await
        .unwrap();

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(
        outcome.data,
        vec![
            json!({ "title": "First", "locale": "en", "body": "Alpha", "id": 601 }),
            json!({ "title": "Second", "locale": "en", "body": "Beta", "id": 602 }),
        ]
    );

    assert_eq!(outcome.new_relations.len(), 1);
    let record = &outcome.new_relations[0];
    assert_eq!(record.old_id, 10);
    assert_eq!(record.model_id, "api::author.author");
    assert_eq!(record.remote_id, 501);
}

#[tokio::test]
async fn transfer_collects_failures_without_aborting() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "First", "body": "",
            "author": null,
            "cover": { "id": 31, "name": "logo.png", "width": 100, "height": 50, "mime": "image/png" },
            "localizations": []
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "en", "title": "Second", "body": "",
            "author": null, "cover": null, "localizations": []
        }),
    );

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_only()).await;

    Mock::given(method("GET"))
        .and(path("/api/upload/files"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "status": 500, "name": "InternalServerError", "message": "boom" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 605, "attributes": { "title": "Second", "locale": "en" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {
                "status": 500,
                "name": "InternalServerError",
                "message": "Internal Server Error",
                "details": {
                    "errors": [
                        { "path": ["title"], "message": "This attribute must be unique", "name": "ValidationError" }
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/articles/605"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 605, "attributes": { "title": "Second", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1, 2]))
        .await
        .unwrap();

    assert_eq!(
        outcome.data,
        vec![json!({ "title": "Second", "locale": "en", "id": 605 })]
    );

    assert_eq!(outcome.errors.len(), 2, "{:?}", outcome.errors);
    assert_eq!(outcome.errors[0].message, "Failed to create/update entity: First");
    assert_eq!(
        outcome.errors[0].details.clone().unwrap_or_default(),
        vec![ErrorDetail::new("This attribute must be unique", "ValidationError")]
    );
    assert!(outcome.errors[1].message.starts_with("Failed to fetch files:"));
}

// ── Media migration ─────────────────────────────────────────────

#[tokio::test]
async fn transfer_reuses_and_uploads_media() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "First", "body": "",
            "author": null,
            "cover": {
                "id": 31, "name": "logo.png", "width": 100, "height": 50,
                "mime": "image/png", "url": "/uploads/logo.png"
            },
            "localizations": []
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "en", "title": "Second", "body": "",
            "author": null,
            "cover": {
                "id": 32, "name": "photo.jpg", "width": 800, "height": 600,
                "mime": "image/jpeg", "url": "/uploads/photo.jpg"
            },
            "localizations": []
        }),
    );
    store.insert_media(32, b"jpeg bytes".to_vec());

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_only()).await;

    Mock::given(method("GET"))
        .and(path("/api/upload/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 810, "name": "logo.png", "width": 100, "height": 50,
                "mime": "image/png", "url": "https://remote.example.com/uploads/logo.png"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 910, "name": "photo.jpg", "width": 800, "height": 600,
                "mime": "image/jpeg", "url": "https://remote.example.com/uploads/photo.jpg"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    // The reused file must point at the remote record, the uploaded one at
    // the record the upload returned.
    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "First", "cover": { "id": 810 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "First", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "Second", "cover": { "id": 910 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 602, "attributes": { "title": "Second", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1, 2]))
        .await
        .unwrap();

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.data.len(), 2);
    assert!(outcome.new_relations.is_empty());
}

#[tokio::test]
async fn transfer_uploads_duplicate_assets_once() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "First", "body": "",
            "author": null,
            "cover": {
                "id": 32, "name": "photo.jpg", "width": 800, "height": 600,
                "mime": "image/jpeg", "url": "/uploads/photo.jpg"
            },
            "localizations": []
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "en", "title": "Second", "body": "",
            "author": null,
            "cover": {
                "id": 33, "name": "photo.jpg", "width": 800, "height": 600,
                "mime": "image/jpeg", "url": "/uploads/photo-copy.jpg"
            },
            "localizations": []
        }),
    );
    // Only the first copy has bytes; the second must never be read.
    store.insert_media(32, b"jpeg bytes".to_vec());

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_only()).await;

    Mock::given(method("GET"))
        .and(path("/api/upload/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 910, "name": "photo.jpg", "width": 800, "height": 600,
                "mime": "image/jpeg", "url": "https://remote.example.com/uploads/photo.jpg"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    // Both covers land on the single uploaded record.
    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "First", "cover": { "id": 910 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "First", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "Second", "cover": { "id": 910 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 602, "attributes": { "title": "Second", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1, 2]))
        .await
        .unwrap();

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.data.len(), 2);
    assert!(outcome.new_relations.is_empty());
}

// ── Relation resolution ─────────────────────────────────────────

#[tokio::test]
async fn transfer_creates_relation_parents_and_localizations() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "Hello", "body": "",
            "author": { "id": 10, "name": "Ada", "locale": "en" },
            "cover": null, "localizations": [{ "id": 2 }]
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "de", "title": "Hallo", "body": "",
            "author": { "id": 11, "name": "Ada DE", "locale": "de" },
            "cover": null
        }),
    );
    store.insert(
        "api::author.author",
        json!({
            "id": 10, "name": "Ada", "locale": "en",
            "localizations": [{ "id": 11, "name": "Ada DE", "locale": "de" }]
        }),
    );
    store.insert(
        "api::author.author",
        json!({
            "id": 11, "name": "Ada DE", "locale": "de",
            "localizations": [{ "id": 10, "name": "Ada", "locale": "en" }]
        }),
    );

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_and_german("en")).await;

    // Matching fetches in both the default locale and locale=all find nothing.
    Mock::given(method("GET"))
        .and(path("/api/authors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/authors/"))
        .and(query_param("filters[name][$eq]", "Ada"))
        .and(query_param("locale", "en"))
        .and(query_param("publicationState", "preview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/authors"))
        .and(body_partial_json(json!({
            "data": { "name": "Ada", "locale": "en" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 701, "attributes": { "name": "Ada", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Localized variants are posted without a data envelope.
    Mock::given(method("POST"))
        .and(path("/api/authors/701/localizations"))
        .and(body_partial_json(json!({ "name": "Ada DE", "locale": "de" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 702, "name": "Ada DE", "locale": "de"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "Hello", "author": { "id": 701 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "Hello", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles/601/localizations"))
        .and(body_partial_json(json!({
            "title": "Hallo", "locale": "de",
            "author": { "id": 702 }, "localizations": [601]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 602, "title": "Hallo", "locale": "de"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1]))
        .await
        .unwrap();

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.data.len(), 2);
    assert_eq!(outcome.data[0]["id"], json!(602));
    assert_eq!(outcome.data[0]["title"], json!("Hallo"));
    assert_eq!(outcome.data[1]["id"], json!(601));
    assert_eq!(outcome.data[1]["title"], json!("Hello"));

    assert_eq!(outcome.new_relations.len(), 2);
    assert_eq!(outcome.new_relations[0].old_id, 11);
    assert_eq!(outcome.new_relations[0].remote_id, 702);
    assert_eq!(outcome.new_relations[1].old_id, 10);
    assert_eq!(outcome.new_relations[1].remote_id, 701);
    assert!(outcome
        .new_relations
        .iter()
        .all(|record| record.model_id == "api::author.author"));
}

#[tokio::test]
async fn transfer_reports_missing_default_locale_relation() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "Hello", "body": "",
            "author": null, "cover": null, "localizations": [{ "id": 2 }]
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "de", "title": "Hallo", "body": "",
            "author": { "id": 11, "name": "Ada DE", "locale": "de" },
            "cover": null
        }),
    );
    store.insert(
        "api::author.author",
        json!({ "id": 11, "name": "Ada DE", "locale": "de", "localizations": [] }),
    );

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_and_german("en")).await;

    Mock::given(method("GET"))
        .and(path("/api/authors"))
        .and(query_param("locale", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "Hello", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles/601/localizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 602, "title": "Hallo", "locale": "de"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1]))
        .await
        .unwrap();

    assert_eq!(outcome.data.len(), 2);
    assert!(outcome.new_relations.is_empty());

    assert_eq!(outcome.errors.len(), 1, "{:?}", outcome.errors);
    assert_eq!(outcome.errors[0].message, "Failed to find default locale relation");
    assert_eq!(
        outcome.errors[0].details.clone().unwrap_or_default(),
        vec![ErrorDetail::new(
            "Default remote locale en has no entity for Ada DE (de) in authors",
            "Relation error"
        )]
    );
}

// ── Locale reconciliation ───────────────────────────────────────

#[tokio::test]
async fn transfer_reshapes_batch_around_remote_default_locale() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "Hello", "body": "",
            "author": null, "cover": null, "localizations": [{ "id": 2 }]
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "de", "title": "Hallo", "body": "",
            "author": null, "cover": null
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 3, "locale": "en", "title": "Lonely", "body": "",
            "author": null, "cover": null, "localizations": []
        }),
    );

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_and_german("de")).await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;

    // The German variant becomes the primary entity.
    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({
            "data": { "title": "Hallo", "locale": "de" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "Hallo", "locale": "de" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles/601/localizations"))
        .and(body_partial_json(json!({
            "title": "Hello", "locale": "en", "localizations": [601]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 602, "title": "Hello", "locale": "en"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service
        .run(&TransferRequest::new("api::article.article", vec![1, 3]))
        .await
        .unwrap();

    assert_eq!(outcome.data.len(), 2);
    assert_eq!(outcome.data[0]["id"], json!(602));
    assert_eq!(outcome.data[0]["locale"], json!("en"));
    assert_eq!(outcome.data[1]["id"], json!(601));
    assert_eq!(outcome.data[1]["locale"], json!("de"));

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.errors[0].message,
        "There was a mismatch between original entities and entities by default remote \
         locale: there are 2 original entities and 1 default remote locale entities."
    );
}

// ── Option gating and edge cases ────────────────────────────────

#[tokio::test]
async fn transfer_respects_disabled_options() {
    let mut store = MemoryStore::new("en");
    store.insert(
        "api::article.article",
        json!({
            "id": 1, "locale": "en", "title": "First", "body": "",
            "author": { "id": 10, "name": "Ada", "locale": "en" },
            "cover": {
                "id": 32, "name": "photo.jpg", "width": 800, "height": 600,
                "mime": "image/jpeg", "url": "/uploads/photo.jpg"
            },
            "localizations": [{ "id": 2 }]
        }),
    );
    store.insert(
        "api::article.article",
        json!({
            "id": 2, "locale": "de", "title": "Erste", "body": "",
            "author": null, "cover": null
        }),
    );
    store.insert(
        "api::author.author",
        json!({
            "id": 10, "name": "Ada", "locale": "en",
            "localizations": [{ "id": 11, "name": "Ada DE", "locale": "de" }]
        }),
    );

    let (server, service) = start_service(store).await;
    mount_locales(&server, english_and_german("en")).await;

    Mock::given(method("GET"))
        .and(path("/api/upload/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/authors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/authors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_partial_json(json!({ "data": { "title": "First" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 601, "attributes": { "title": "First", "locale": "en" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = TransferRequest::new("api::article.article", vec![1]).with_options(
        TransferOptions {
            upload_media: false,
            create_missing_relations: false,
            transfer_locales: false,
        },
    );
    let outcome = service.run(&request).await.unwrap();

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(
        outcome.data,
        vec![json!({ "title": "First", "locale": "en", "id": 601 })]
    );
    assert!(outcome.new_relations.is_empty());
}

#[tokio::test]
async fn empty_request_reports_an_empty_batch() {
    let store = MemoryStore::new("en");
    let config = RemoteConfig::new("http://localhost:1", "token").unwrap();
    let service = TransferService::new(registry(), Arc::new(store), &config).unwrap();

    let outcome = service
        .run(&TransferRequest::new("api::article.article", Vec::new()))
        .await
        .unwrap();

    assert!(outcome.data.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.errors[0].message,
        "There are no entities to transfer after locale preparation"
    );
    assert!(outcome.new_relations.is_empty());
}

#[tokio::test]
async fn unknown_collection_fails_the_run() {
    let store = MemoryStore::new("en");
    let config = RemoteConfig::new("http://localhost:1", "token").unwrap();
    let service = TransferService::new(registry(), Arc::new(store), &config).unwrap();

    let result = service
        .run(&TransferRequest::new("api::missing.missing", vec![1]))
        .await;

    assert!(result.is_err());
}

//! Shared test fixtures: content schemas and an in-memory local store.

use std::collections::HashMap;

use async_trait::async_trait;
use courier_engine::{AttributeDef, ContentType, LocalId, MediaFile, RelationKind, SchemaRegistry};
use courier_transfer::{FindOptions, LocalStore, StoreError, StoreResult};
use serde_json::Value;

/// Articles referencing authors, with a single cover image.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_content_type(
            ContentType::new(
                "api::article.article",
                "articles",
                vec![
                    AttributeDef::scalar("title"),
                    AttributeDef::scalar("body"),
                    AttributeDef::relation("author", "api::author.author", RelationKind::One),
                    AttributeDef::media("cover", false),
                ],
            )
            .with_main_field("title"),
        )
        .with_content_type(
            ContentType::new(
                "api::author.author",
                "authors",
                vec![AttributeDef::scalar("name")],
            )
            .with_main_field("name"),
        )
}

/// In-memory [`LocalStore`] backed by plain JSON rows.
#[derive(Default)]
pub struct MemoryStore {
    default_locale: String,
    entities: HashMap<String, Vec<Value>>,
    media: HashMap<LocalId, Vec<u8>>,
}

impl MemoryStore {
    pub fn new(default_locale: &str) -> Self {
        Self {
            default_locale: default_locale.to_string(),
            ..Self::default()
        }
    }

    /// Add a populated entity row to a collection.
    pub fn insert(&mut self, collection: &str, row: Value) {
        self.entities
            .entry(collection.to_string())
            .or_default()
            .push(row);
    }

    /// Register the raw bytes behind a local media file id.
    pub fn insert_media(&mut self, id: LocalId, bytes: Vec<u8>) {
        self.media.insert(id, bytes);
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn find_many(
        &self,
        collection: &str,
        ids: &[LocalId],
        _options: &FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let rows = self
            .entities
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(rows
            .iter()
            .filter(|row| {
                row.get("id")
                    .and_then(Value::as_i64)
                    .is_some_and(|id| ids.contains(&id))
            })
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        id: LocalId,
        options: &FindOptions,
    ) -> StoreResult<Option<Value>> {
        Ok(self
            .find_many(collection, &[id], options)
            .await?
            .into_iter()
            .next())
    }

    async fn default_locale(&self) -> StoreResult<String> {
        Ok(self.default_locale.clone())
    }

    async fn media_bytes(&self, file: &MediaFile) -> StoreResult<Vec<u8>> {
        self.media
            .get(&file.id)
            .cloned()
            .ok_or_else(|| StoreError::new(format!("No stored bytes for file {}", file.id)))
    }
}

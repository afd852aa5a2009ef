//! Transfer orchestration.
//!
//! Ties the whole pipeline together: load the requested entities fully
//! populated from the local store, collect their relation and media
//! references, migrate media, resolve relations on the remote, and finally
//! upsert the entities themselves. Setup failures (unknown collection,
//! unreachable local store) abort the run; everything after that degrades
//! into error items on the outcome so one bad entity never sinks the batch.

use std::sync::Arc;

use courier_engine::{
    collect_media, collect_relations, populate_plan, relation_fields, ContentType, Entity,
    ErrorItem, LocalId, NewRelationRecord, PopulatePlan, ResolvedRelations, SchemaRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::RemoteClient;
use crate::config::RemoteConfig;
use crate::error::Result;
use crate::locales::fetch_locales_info;
use crate::media::migrate_media;
use crate::resolve::{resolve_relations, ResolveOutcome};
use crate::store::{FindOptions, LocalStore};
use crate::upsert::upsert_entities;

/// Switches controlling how much a transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferOptions {
    /// Upload media files that are missing from the remote library.
    pub upload_media: bool,
    /// Create referenced entities that do not exist on the remote.
    #[serde(rename = "createRelations")]
    pub create_missing_relations: bool,
    /// Transfer localized variants alongside their parents.
    pub transfer_locales: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            upload_media: true,
            create_missing_relations: true,
            transfer_locales: true,
        }
    }
}

/// One transfer request: which entities of which collection to move.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Collection the entities belong to.
    pub collection: String,
    /// Local ids of the entities to transfer.
    pub entity_ids: Vec<LocalId>,
    /// Transfer switches.
    #[serde(default)]
    pub options: TransferOptions,
}

impl TransferRequest {
    /// Request a transfer of the given entities with default options.
    pub fn new(collection: impl Into<String>, entity_ids: Vec<LocalId>) -> Self {
        Self {
            collection: collection.into(),
            entity_ids,
            options: TransferOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }
}

/// Everything a finished transfer reports back.
#[derive(Debug, Default)]
pub struct TransferOutcome {
    /// Remote entities as written, one per transferred entity or locale.
    pub data: Vec<Value>,
    /// Failures accumulated across the entity, media, and relation stages.
    pub errors: Vec<ErrorItem>,
    /// Relation resolution records, for callers that track cross-system ids.
    pub new_relations: Vec<NewRelationRecord>,
}

/// Drives transfers from one local store to one remote instance.
pub struct TransferService {
    registry: SchemaRegistry,
    store: Arc<dyn LocalStore>,
    client: RemoteClient,
}

impl TransferService {
    /// Create a service talking to the remote described by `config`.
    pub fn new(
        registry: SchemaRegistry,
        store: Arc<dyn LocalStore>,
        config: &RemoteConfig,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            store,
            client: RemoteClient::new(config)?,
        })
    }

    /// Collections the service knows how to transfer.
    pub fn collections(&self) -> impl Iterator<Item = &ContentType> {
        self.registry.content_types()
    }

    /// Run one transfer request end to end.
    pub async fn run(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let collection = &request.collection;
        let content_type = self.registry.content_type(collection)?;
        let main_field = self.registry.main_field(collection)?.clone();
        let plan = populate_plan(&self.registry, collection)?;
        let relation_map = relation_fields(&self.registry, collection)?;

        tracing::info!(
            "Transferring {} entities from {collection} to {}",
            request.entity_ids.len(),
            self.client.api_url()
        );

        let raw_entities = self
            .load_entities(collection, &request.entity_ids, &plan)
            .await?;
        let (entities, mut errors) = self.decode_entities(collection, raw_entities);

        let relations = collect_relations(&entities);
        let media_files = collect_media(&entities);

        let locales = fetch_locales_info(self.store.as_ref(), &self.client).await?;

        let media = migrate_media(
            &self.client,
            self.store.as_ref(),
            media_files,
            request.options.upload_media,
        )
        .await;

        let resolution = if relation_map.is_empty() {
            ResolveOutcome::default()
        } else {
            resolve_relations(
                &self.registry,
                self.store.as_ref(),
                &self.client,
                &relations,
                &locales,
                &request.options,
            )
            .await
        };

        let mut resolved = ResolvedRelations::new();
        resolved.extend(resolution.records.iter().cloned());

        let upserted = upsert_entities(
            &self.client,
            entities,
            &main_field,
            &content_type.plural_name,
            &resolved,
            &media.index,
            &locales,
            request.options.transfer_locales,
        )
        .await;

        errors.extend(upserted.errors);
        errors.extend(media.errors);
        errors.extend(resolution.errors);

        tracing::info!(
            "Transfer finished: {} entities written, {} errors",
            upserted.data.len(),
            errors.len()
        );

        Ok(TransferOutcome {
            data: upserted.data,
            errors,
            new_relations: resolution.records,
        })
    }

    /// Load the requested entities with the populate plan applied, then
    /// reload their localizations fully populated. The first query returns
    /// localizations as id stubs only, and locale reconciliation needs their
    /// relation and media fields as much as the parents'.
    async fn load_entities(
        &self,
        collection: &str,
        ids: &[LocalId],
        plan: &PopulatePlan,
    ) -> Result<Vec<Value>> {
        let options = FindOptions::new(plan.clone()).with_localizations();
        let mut values = self.store.find_many(collection, ids, &options).await?;

        for value in &mut values {
            let locale_ids: Vec<LocalId> = value
                .get("localizations")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("id").and_then(Value::as_i64))
                        .collect()
                })
                .unwrap_or_default();

            let localized = if locale_ids.is_empty() {
                Vec::new()
            } else {
                let options = FindOptions::new(plan.clone()).all_locales();
                self.store
                    .find_many(collection, &locale_ids, &options)
                    .await?
            };

            if let Some(object) = value.as_object_mut() {
                object.insert("localizations".to_string(), Value::Array(localized));
            }
        }

        Ok(values)
    }

    fn decode_entities(
        &self,
        collection: &str,
        values: Vec<Value>,
    ) -> (Vec<Entity>, Vec<ErrorItem>) {
        let mut entities = Vec::new();
        let mut errors = Vec::new();
        for value in values {
            match Entity::from_value(&self.registry, collection, &value) {
                Ok(entity) => entities.push(entity),
                Err(err) => errors.push(ErrorItem::new(format!(
                    "Failed to read entity from {collection}: {err}"
                ))),
            }
        }
        (entities, errors)
    }
}

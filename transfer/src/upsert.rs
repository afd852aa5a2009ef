//! Entity upsert against the remote system.
//!
//! The batch is first reshaped around the remote default locale, then every
//! entity is matched against the remote by main field value and either
//! updated in place or created. Creation reconnects any localization
//! siblings that already exist remotely, and with locale transfer enabled
//! each localized variant is written afterwards, linked to the parent and
//! to every sibling written before it.

use std::collections::HashSet;

use courier_engine::{
    entity_payload, reconcile_entities, Entity, ErrorItem, FieldValue, LocalesInfo, MediaIndex,
    RemoteEntity, RemoteId, ResolvedRelations,
};
use serde_json::{json, Map, Value};

use crate::client::RemoteClient;
use crate::error::Result;
use crate::remote::{fetch_filtered, try_entity_from_envelope, try_entity_from_flat};

/// Outcome of an entity upsert run.
#[derive(Debug, Default)]
pub struct UpsertOutcome {
    /// Remote entities as written, localized variants before their parents
    pub data: Vec<Value>,
    /// Per entity and per locale failures
    pub errors: Vec<ErrorItem>,
}

/// Write a batch of entities into one remote collection.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_entities(
    client: &RemoteClient,
    entities: Vec<Entity>,
    main_field: &str,
    plural_name: &str,
    resolved: &ResolvedRelations,
    media: &MediaIndex,
    locales: &LocalesInfo,
    transfer_locales: bool,
) -> UpsertOutcome {
    let collection_client = client.collection(plural_name);

    let original_len = entities.len();
    let reconciled = reconcile_entities(entities, locales);
    if reconciled.is_empty() {
        return UpsertOutcome {
            data: Vec::new(),
            errors: vec![ErrorItem::new(
                "There are no entities to transfer after locale preparation",
            )],
        };
    }

    let mut errors = Vec::new();
    let mut results = Vec::new();

    if reconciled.len() != original_len {
        errors.push(ErrorItem::new(format!(
            "There was a mismatch between original entities and entities by default \
             remote locale: there are {original_len} original entities and {} default \
             remote locale entities.",
            reconciled.len()
        )));
    }

    let texts: Vec<String> = reconciled
        .iter()
        .filter_map(|entity| entity.main_field_text(main_field))
        .collect();
    let remote_entities = fetch_filtered(&collection_client, &texts, main_field, None).await;

    for entity in &reconciled {
        upsert_entity(
            &collection_client,
            entity,
            main_field,
            resolved,
            media,
            &remote_entities,
            transfer_locales,
            &mut results,
            &mut errors,
        )
        .await;
    }

    UpsertOutcome {
        data: results,
        errors,
    }
}

/// A successfully written primary entity, with the remote localization
/// siblings that were connected while writing it.
struct WrittenEntity {
    id: RemoteId,
    attributes: Map<String, Value>,
    siblings: Vec<RemoteEntity>,
}

impl WrittenEntity {
    fn primary_result(&self) -> Value {
        let mut object = self.attributes.clone();
        object.insert("id".to_string(), Value::from(self.id));
        Value::Object(object)
    }
}

#[allow(clippy::too_many_arguments)]
async fn upsert_entity(
    client: &RemoteClient,
    entity: &Entity,
    main_field: &str,
    resolved: &ResolvedRelations,
    media: &MediaIndex,
    remote_entities: &[RemoteEntity],
    transfer_locales: bool,
    results: &mut Vec<Value>,
    errors: &mut Vec<ErrorItem>,
) {
    let remote_entity = remote_entities
        .iter()
        .find(|remote| remote.attributes.get(main_field) == main_value(entity, main_field));
    let payload = entity_payload(entity, resolved, media);

    match write_entity(client, entity, payload, main_field, remote_entity).await {
        Ok(written) => {
            if transfer_locales {
                let (locale_results, locale_errors) = upsert_localizations(
                    client,
                    entity,
                    main_field,
                    resolved,
                    media,
                    remote_entity,
                    &written,
                )
                .await;
                results.extend(locale_results);
                errors.extend(locale_errors);
            }
            results.push(written.primary_result());
        }
        Err(err) => {
            errors.push(
                ErrorItem::new(format!(
                    "Failed to create/update entity: {}",
                    entity.main_field_text(main_field).unwrap_or_default()
                ))
                .with_details(err.error_details()),
            );
        }
    }
}

/// Write the primary entity, creating, updating, or attaching it to already
/// existing remote localizations.
async fn write_entity(
    client: &RemoteClient,
    entity: &Entity,
    payload: Value,
    main_field: &str,
    remote_entity: Option<&RemoteEntity>,
) -> Result<WrittenEntity> {
    if let Some(remote) = remote_entity {
        let body = json!({ "data": payload });
        let response = client.update(&format!("/{}", remote.id), &body).await?;
        let written = try_entity_from_envelope(&response)?;
        return Ok(WrittenEntity {
            id: written.id,
            attributes: written.attributes,
            siblings: Vec::new(),
        });
    }

    // The entity is missing remotely, but some of its translations may not
    // be. Those must be connected instead of recreated.
    let locale_texts: Vec<String> = entity
        .localizations
        .iter()
        .filter_map(|localization| localization.main_field_text(main_field))
        .collect();
    let existing_localizations =
        fetch_filtered(client, &locale_texts, main_field, Some("locale=all")).await;

    let remote_default_lang = existing_localizations.first().and_then(|first| {
        first
            .localizations()
            .into_iter()
            .find(|sibling| sibling.locale() == entity.locale.as_deref())
    });
    let locale_ids: Vec<RemoteId> = existing_localizations
        .iter()
        .map(|existing| existing.id)
        .collect();

    if remote_default_lang.is_none() && !existing_localizations.is_empty() {
        let parent_id = existing_localizations[0].id;
        let mut fields = payload_object(payload);
        fields.insert("localizations".to_string(), json!(locale_ids));

        let response = client
            .create(&format!("/{parent_id}/localizations"), &Value::Object(fields))
            .await?;
        let written = try_entity_from_flat(&response)?;
        return Ok(WrittenEntity {
            id: written.id,
            attributes: written.attributes,
            siblings: existing_localizations,
        });
    }

    let mut fields = payload_object(payload);
    fields.insert("localizations".to_string(), json!(locale_ids));
    let body = json!({ "data": fields });

    let response = match &remote_default_lang {
        Some(target) => client.update(&format!("/{}", target.id), &body).await?,
        None => client.create("", &body).await?,
    };
    let written = try_entity_from_envelope(&response)?;
    Ok(WrittenEntity {
        id: written.id,
        attributes: written.attributes,
        siblings: existing_localizations,
    })
}

/// One localized variant prepared for writing.
struct LocalizationPlan {
    payload: Value,
    existing_id: Option<RemoteId>,
    locale: Option<String>,
    label: String,
}

async fn upsert_localizations(
    client: &RemoteClient,
    entity: &Entity,
    main_field: &str,
    resolved: &ResolvedRelations,
    media: &MediaIndex,
    remote_entity: Option<&RemoteEntity>,
    written: &WrittenEntity,
) -> (Vec<Value>, Vec<ErrorItem>) {
    let remote_siblings = remote_entity
        .map(|remote| remote.localizations())
        .unwrap_or_default();

    let plans: Vec<LocalizationPlan> = entity
        .localizations
        .iter()
        .map(|localization| {
            let existing_id = remote_siblings
                .iter()
                .find(|sibling| sibling.locale() == localization.locale.as_deref())
                .map(|sibling| sibling.id)
                .or_else(|| {
                    written
                        .siblings
                        .iter()
                        .find(|sibling| sibling.locale() == localization.locale.as_deref())
                        .map(|sibling| sibling.id)
                });

            LocalizationPlan {
                payload: entity_payload(localization, resolved, media),
                existing_id,
                locale: localization.locale.clone(),
                label: localization
                    .main_field_text(main_field)
                    .unwrap_or_default(),
            }
        })
        .collect();

    write_localizations(client, written.id, &plans).await
}

/// Write localized variants under a parent. Every created variant is linked
/// to all variants known before it, so the translation group stays fully
/// connected.
async fn write_localizations(
    client: &RemoteClient,
    parent_id: RemoteId,
    plans: &[LocalizationPlan],
) -> (Vec<Value>, Vec<ErrorItem>) {
    let mut results = Vec::new();
    let mut errors = Vec::new();

    let localization_ids: Vec<RemoteId> =
        plans.iter().filter_map(|plan| plan.existing_id).collect();
    let mut created_ids: Vec<RemoteId> = vec![parent_id];

    for plan in plans {
        let outcome = match plan.existing_id {
            Some(id) => update_localization(client, id, plan).await,
            None => {
                create_localization(client, parent_id, plan, &localization_ids, &created_ids).await
            }
        };

        match outcome {
            Ok(value) => {
                if plan.existing_id.is_none() {
                    if let Some(id) = value.get("id").and_then(Value::as_i64) {
                        created_ids.push(id);
                    }
                }
                results.push(value);
            }
            Err(err) => errors.push(
                ErrorItem::new(format!(
                    "Failed to create/update locale {} for entity {}",
                    plan.locale.as_deref().unwrap_or("none"),
                    plan.label
                ))
                .with_details(err.error_details()),
            ),
        }
    }

    (results, errors)
}

async fn update_localization(
    client: &RemoteClient,
    id: RemoteId,
    plan: &LocalizationPlan,
) -> Result<Value> {
    let body = json!({ "data": plan.payload });
    let response = client.update(&format!("/{id}"), &body).await?;
    let entity = try_entity_from_envelope(&response)?;

    let mut object = entity.attributes;
    object.insert("id".to_string(), Value::from(entity.id));
    Ok(Value::Object(object))
}

async fn create_localization(
    client: &RemoteClient,
    parent_id: RemoteId,
    plan: &LocalizationPlan,
    localization_ids: &[RemoteId],
    created_ids: &[RemoteId],
) -> Result<Value> {
    let mut fields = payload_object(plan.payload.clone());
    fields.insert(
        "localizations".to_string(),
        json!(unique_ids(localization_ids, created_ids)),
    );

    client
        .create(&format!("/{parent_id}/localizations"), &Value::Object(fields))
        .await
}

fn main_value<'a>(entity: &'a Entity, main_field: &str) -> Option<&'a Value> {
    match entity.field(main_field) {
        Some(FieldValue::Scalar(value)) => Some(value),
        _ => None,
    }
}

fn payload_object(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Object(object) => object,
        _ => Map::new(),
    }
}

fn unique_ids(existing: &[RemoteId], created: &[RemoteId]) -> Vec<RemoteId> {
    let mut seen = HashSet::new();
    existing
        .iter()
        .chain(created)
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

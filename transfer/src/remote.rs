//! Remote lookup helpers shared by relation resolution and entity upsert.

use courier_engine::{RemoteEntity, RemoteId};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::RemoteClient;
use crate::error::Result;
use crate::query::filtered_entities_query;

/// Fetch remote entities matching the given main field values, always with
/// their localization stubs populated. Lookup failures degrade to an empty
/// match set so the caller treats every entity as missing remotely.
pub(crate) async fn fetch_filtered(
    client: &RemoteClient,
    values: &[String],
    main_field: &str,
    extra: Option<&str>,
) -> Vec<RemoteEntity> {
    if values.is_empty() {
        return Vec::new();
    }

    let query = filtered_entities_query(values, main_field, extra);
    match client.fetch(&format!("?{query}")).await {
        Ok(response) => parse_entity_list(&response),
        Err(err) => {
            tracing::warn!("Error getting filtered remote entities: {err}");
            Vec::new()
        }
    }
}

/// Entities out of a `{data: [...]}` listing body. Items that do not look
/// like entities are dropped.
pub(crate) fn parse_entity_list(response: &Value) -> Vec<RemoteEntity> {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// The entity inside a `{data: {id, attributes}}` write response.
pub(crate) fn try_entity_from_envelope(response: &Value) -> Result<RemoteEntity> {
    let data = response.get("data").cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

/// An entity out of a flat `{id, ...attributes}` body, as the localization
/// endpoint returns it.
pub(crate) fn try_entity_from_flat(response: &Value) -> Result<RemoteEntity> {
    #[derive(Deserialize)]
    struct FlatEntity {
        id: RemoteId,
        #[serde(flatten)]
        attributes: Map<String, Value>,
    }

    let flat: FlatEntity = serde_json::from_value(response.clone())?;
    Ok(RemoteEntity::new(flat.id, flat.attributes))
}

pub(crate) fn entity_from_envelope(response: &Value) -> Option<RemoteEntity> {
    try_entity_from_envelope(response).ok()
}

pub(crate) fn entity_from_flat(response: &Value) -> Option<RemoteEntity> {
    try_entity_from_flat(response).ok()
}

//! Outgoing payload construction.
//!
//! Once relations are resolved and media is uploaded, every entity must be
//! rewritten before it can be sent: local relation references are swapped
//! for their remote counterparts, media references for remote file records,
//! and local identifiers are stripped. Unresolvable references degrade
//! rather than fail: a single relation becomes `null`, an array keeps only
//! its resolved members, an unmatched file is sent as its attributes
//! without the local id.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::entity::{
    ComponentData, ComponentRef, Entity, FieldValue, MediaRef, RelationValue, ZoneEntry,
};
use crate::{scalar_text, CollectionId, FieldName, LocalId, RemoteId};

/// The artifact of resolving one referenced entity: where it lives remotely
/// and which local entity it replaces.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelationRecord {
    /// Local id of the referenced entity
    pub old_id: LocalId,
    /// Collection the reference belongs to
    pub model_id: CollectionId,
    /// Remote id of the created, updated, or matched entity
    pub remote_id: RemoteId,
    /// Remote attributes of the entity
    pub attributes: Map<String, Value>,
}

impl NewRelationRecord {
    pub fn new(
        old_id: LocalId,
        model_id: impl Into<CollectionId>,
        remote_id: RemoteId,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            old_id,
            model_id: model_id.into(),
            remote_id,
            attributes,
        }
    }

    /// Replacement value for relation fields: the remote attributes plus the
    /// remote id.
    pub fn payload(&self) -> Value {
        let mut object = self.attributes.clone();
        object.insert("id".to_string(), Value::from(self.remote_id));
        Value::Object(object)
    }

    /// Attribute rendered as query text.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.attributes.get(name).map(scalar_text)
    }

    /// Locale of the remote entity, when present.
    pub fn locale(&self) -> Option<&str> {
        self.attributes.get("locale").and_then(Value::as_str)
    }
}

/// Lookup table of resolved relations keyed by `(oldId, modelId)`. The
/// first record per key wins; later duplicates are ignored.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRelations {
    records: HashMap<(LocalId, CollectionId), NewRelationRecord>,
}

impl ResolvedRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its `(oldId, modelId)` key is already taken.
    pub fn insert(&mut self, record: NewRelationRecord) {
        self.records
            .entry((record.old_id, record.model_id.clone()))
            .or_insert(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = NewRelationRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Find the resolution of a local reference.
    pub fn get(&self, old_id: LocalId, model_id: &str) -> Option<&NewRelationRecord> {
        self.records.get(&(old_id, model_id.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Iterate all records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &NewRelationRecord> {
        self.records.values()
    }
}

/// Remote media records indexed for reference rewriting. Each record is a
/// remote file object tagged with `localId`, the id of the local file it
/// replaces. Lookups try the local id first and fall back to the file name.
#[derive(Debug, Clone, Default)]
pub struct MediaIndex {
    records: Vec<Value>,
    by_local_id: HashMap<LocalId, usize>,
    by_name: HashMap<String, usize>,
}

impl MediaIndex {
    pub fn new(records: Vec<Value>) -> Self {
        let mut by_local_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            if let Some(local_id) = record.get("localId").and_then(Value::as_i64) {
                by_local_id.entry(local_id).or_insert(index);
            }
            if let Some(name) = record.get("name").and_then(Value::as_str) {
                by_name.entry(name.to_string()).or_insert(index);
            }
        }
        Self {
            records,
            by_local_id,
            by_name,
        }
    }

    /// Find the remote record replacing a local file.
    pub fn lookup(&self, local_id: LocalId, name: &str) -> Option<&Value> {
        let index = self
            .by_local_id
            .get(&local_id)
            .or_else(|| self.by_name.get(name))?;
        self.records.get(*index)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }
}

/// Build the outgoing payload of one entity: fields with relation and media
/// references rewritten, local ids stripped, locale kept, localizations
/// excluded.
pub fn entity_payload(entity: &Entity, resolved: &ResolvedRelations, media: &MediaIndex) -> Value {
    let mut object = Map::new();
    if let Some(locale) = &entity.locale {
        object.insert("locale".to_string(), Value::String(locale.clone()));
    }
    render_fields(&entity.fields, resolved, media, &mut object);
    Value::Object(object)
}

fn render_fields(
    fields: &[(FieldName, FieldValue)],
    resolved: &ResolvedRelations,
    media: &MediaIndex,
    object: &mut Map<String, Value>,
) {
    for (name, value) in fields {
        object.insert(name.clone(), render_value(value, resolved, media));
    }
}

fn render_value(value: &FieldValue, resolved: &ResolvedRelations, media: &MediaIndex) -> Value {
    match value {
        FieldValue::Scalar(raw) => raw.clone(),
        FieldValue::Media(MediaRef::Single(None)) => Value::Null,
        FieldValue::Media(MediaRef::Single(Some(file))) => media
            .lookup(file.id, &file.name)
            .cloned()
            .unwrap_or_else(|| file.payload()),
        FieldValue::Media(MediaRef::Multiple(files)) => Value::Array(
            files
                .iter()
                .map(|file| {
                    media
                        .lookup(file.id, &file.name)
                        .cloned()
                        .unwrap_or_else(|| file.payload())
                })
                .collect(),
        ),
        FieldValue::Relation(relation) => match &relation.value {
            RelationValue::Single(None) => Value::Null,
            RelationValue::Single(Some(related)) => resolved
                .get(related.id, &relation.target)
                .map(NewRelationRecord::payload)
                .unwrap_or(Value::Null),
            RelationValue::Multiple(items) => Value::Array(
                items
                    .iter()
                    .filter_map(|related| resolved.get(related.id, &relation.target))
                    .map(NewRelationRecord::payload)
                    .collect(),
            ),
        },
        FieldValue::Component(ComponentRef::Single(None)) => Value::Null,
        FieldValue::Component(ComponentRef::Single(Some(data))) => {
            component_payload(data, resolved, media)
        }
        FieldValue::Component(ComponentRef::Multiple(items)) => Value::Array(
            items
                .iter()
                .map(|data| component_payload(data, resolved, media))
                .collect(),
        ),
        FieldValue::DynamicZone(entries) => Value::Array(
            entries
                .iter()
                .map(|entry| zone_entry_payload(entry, resolved, media))
                .collect(),
        ),
    }
}

fn component_payload(
    data: &ComponentData,
    resolved: &ResolvedRelations,
    media: &MediaIndex,
) -> Value {
    let mut object = Map::new();
    render_fields(&data.fields, resolved, media, &mut object);
    Value::Object(object)
}

fn zone_entry_payload(
    entry: &ZoneEntry,
    resolved: &ResolvedRelations,
    media: &MediaIndex,
) -> Value {
    let mut object = Map::new();
    object.insert(
        "__component".to_string(),
        Value::String(entry.component.clone()),
    );
    render_fields(&entry.data.fields, resolved, media, &mut object);
    Value::Object(object)
}

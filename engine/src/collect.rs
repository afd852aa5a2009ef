//! Relation and media collection over decoded entity batches.
//!
//! Before anything is written remotely, a transfer needs to know every
//! entity referenced by a relation field and every media file attached
//! anywhere in the batch. Both collectors traverse the typed entity tree,
//! components, dynamic zones, and localization siblings included, and
//! deduplicate while preserving first-occurrence order.

use std::collections::{BTreeMap, HashSet};

use crate::entity::{
    ComponentData, ComponentRef, Entity, FieldValue, MediaFile, MediaRef, RelatedEntity,
    RelationValue,
};
use crate::{CollectionId, LocalId};

/// Referenced relation entities grouped by target collection.
#[derive(Debug, Clone, Default)]
pub struct CollectedRelations {
    by_target: BTreeMap<CollectionId, Vec<RelatedEntity>>,
    seen: BTreeMap<CollectionId, HashSet<LocalId>>,
}

impl CollectedRelations {
    fn push(&mut self, target: &CollectionId, related: &RelatedEntity) {
        let seen = self.seen.entry(target.clone()).or_default();
        if seen.insert(related.id) {
            self.by_target
                .entry(target.clone())
                .or_default()
                .push(related.clone());
        }
    }

    /// Target collections with at least one referenced entity.
    pub fn targets(&self) -> impl Iterator<Item = &CollectionId> {
        self.by_target.keys()
    }

    /// Referenced entities of one target collection, in first-occurrence order.
    pub fn values(&self, target: &str) -> &[RelatedEntity] {
        self.by_target.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Iterate all target collections with their referenced entities.
    pub fn iter(&self) -> impl Iterator<Item = (&CollectionId, &[RelatedEntity])> {
        self.by_target
            .iter()
            .map(|(target, values)| (target, values.as_slice()))
    }
}

/// Collect every relation reference in a batch, localization siblings
/// included. Each target collection's list is deduplicated by local id.
pub fn collect_relations(entities: &[Entity]) -> CollectedRelations {
    let mut collected = CollectedRelations::default();
    for entity in entities {
        collect_entity_relations(entity, &mut collected);
    }
    collected
}

fn collect_entity_relations(entity: &Entity, collected: &mut CollectedRelations) {
    for (_, value) in &entity.fields {
        collect_value_relations(value, collected);
    }
    for localization in &entity.localizations {
        collect_entity_relations(localization, collected);
    }
}

fn collect_value_relations(value: &FieldValue, collected: &mut CollectedRelations) {
    match value {
        FieldValue::Relation(relation) => match &relation.value {
            RelationValue::Single(Some(related)) => collected.push(&relation.target, related),
            RelationValue::Single(None) => {}
            RelationValue::Multiple(items) => {
                for related in items {
                    collected.push(&relation.target, related);
                }
            }
        },
        FieldValue::Component(ComponentRef::Single(Some(data))) => {
            collect_component_relations(data, collected);
        }
        FieldValue::Component(ComponentRef::Multiple(items)) => {
            for data in items {
                collect_component_relations(data, collected);
            }
        }
        FieldValue::DynamicZone(entries) => {
            for entry in entries {
                collect_component_relations(&entry.data, collected);
            }
        }
        FieldValue::Scalar(_)
        | FieldValue::Media(_)
        | FieldValue::Component(ComponentRef::Single(None)) => {}
    }
}

fn collect_component_relations(data: &ComponentData, collected: &mut CollectedRelations) {
    for (_, value) in &data.fields {
        collect_value_relations(value, collected);
    }
}

/// Collect every media file in a batch, deduplicated by local id in
/// first-occurrence order.
pub fn collect_media(entities: &[Entity]) -> Vec<MediaFile> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    for entity in entities {
        collect_entity_media(entity, &mut files, &mut seen);
    }
    files
}

fn collect_entity_media(entity: &Entity, files: &mut Vec<MediaFile>, seen: &mut HashSet<LocalId>) {
    for (_, value) in &entity.fields {
        collect_value_media(value, files, seen);
    }
    for localization in &entity.localizations {
        collect_entity_media(localization, files, seen);
    }
}

fn collect_value_media(value: &FieldValue, files: &mut Vec<MediaFile>, seen: &mut HashSet<LocalId>) {
    match value {
        FieldValue::Media(MediaRef::Single(Some(file))) => {
            if seen.insert(file.id) {
                files.push(file.clone());
            }
        }
        FieldValue::Media(MediaRef::Multiple(items)) => {
            for file in items {
                if seen.insert(file.id) {
                    files.push(file.clone());
                }
            }
        }
        FieldValue::Component(ComponentRef::Single(Some(data))) => {
            collect_component_media(data, files, seen);
        }
        FieldValue::Component(ComponentRef::Multiple(items)) => {
            for data in items {
                collect_component_media(data, files, seen);
            }
        }
        FieldValue::DynamicZone(entries) => {
            for entry in entries {
                collect_component_media(&entry.data, files, seen);
            }
        }
        FieldValue::Scalar(_)
        | FieldValue::Relation(_)
        | FieldValue::Media(MediaRef::Single(None))
        | FieldValue::Component(ComponentRef::Single(None)) => {}
    }
}

fn collect_component_media(data: &ComponentData, files: &mut Vec<MediaFile>, seen: &mut HashSet<LocalId>) {
    for (_, value) in &data.fields {
        collect_value_media(value, files, seen);
    }
}

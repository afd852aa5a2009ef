//! Relation field discovery.
//!
//! Flattens a content type's schema into a map from dotted field path to
//! relation descriptor. The map is the contract between schema and data:
//! the entity decoder tags exactly the positions listed here, and the
//! relation collector and payload builder look positions up by the same
//! paths.

use std::collections::BTreeMap;

use crate::walk::{walk_content_type, SchemaVisitor, WalkPosition};
use crate::{error::Result, CollectionId, FieldPath, RelationKind, SchemaRegistry};

/// A relation-valued position in a content type's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationField {
    /// Collection the relation points at
    pub target: CollectionId,
    /// Single or multi valued
    pub kind: RelationKind,
    /// Whether the position sits inside a repeatable component
    pub in_repeatable: bool,
    /// Whether the position sits inside a dynamic zone
    pub in_dynamic_zone: bool,
}

/// Map from dotted field path to relation descriptor. Ordered so iteration
/// is deterministic.
pub type RelationFieldMap = BTreeMap<FieldPath, RelationField>;

struct RelationCollector {
    fields: RelationFieldMap,
}

impl SchemaVisitor for RelationCollector {
    fn relation(
        &mut self,
        pos: &WalkPosition,
        _name: &str,
        target: &CollectionId,
        kind: RelationKind,
    ) {
        self.fields.insert(
            pos.path.clone(),
            RelationField {
                target: target.clone(),
                kind,
                in_repeatable: pos.in_repeatable,
                in_dynamic_zone: pos.in_dynamic_zone,
            },
        );
    }
}

/// Discover every relation position in a collection's schema, however
/// deeply nested in components or dynamic zones.
pub fn relation_fields(registry: &SchemaRegistry, collection: &str) -> Result<RelationFieldMap> {
    let mut collector = RelationCollector {
        fields: RelationFieldMap::new(),
    };
    walk_content_type(registry, collection, &mut collector)?;
    Ok(collector.fields)
}

/// Distinct target collections referenced by a relation map, in path order.
pub fn relation_targets(fields: &RelationFieldMap) -> Vec<CollectionId> {
    let mut targets: Vec<CollectionId> = Vec::new();
    for field in fields.values() {
        if !targets.contains(&field.target) {
            targets.push(field.target.clone());
        }
    }
    targets
}

//! Populate-plan construction.
//!
//! Builds the nested populate directive a local store needs so that media,
//! relation, component, and dynamic-zone fields come back populated on
//! fetched entities. Leaf positions serialize as `true`, components wrap
//! their children in a `populate` object, and dynamic zones branch per
//! component under an `on` object. Localizations are populated separately
//! by the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::walk::{walk_content_type, SchemaVisitor, WalkPosition};
use crate::{error::Result, CollectionId, ComponentId, FieldName, RelationKind, SchemaRegistry};

/// One node of a populate plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PopulateNode {
    /// Leaf directive for media and relation fields, serialized as `true`
    All(bool),
    /// Dynamic-zone directive with one branch per possible component
    Zone(ZonePopulate),
    /// Component directive wrapping the nested plan
    Nested(NestedPopulate),
}

/// Populate directive for a component subtree. Serializes as `{}` when the
/// component holds nothing that needs populating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NestedPopulate {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub populate: BTreeMap<FieldName, PopulateNode>,
}

/// Populate directive for a dynamic zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePopulate {
    pub on: BTreeMap<ComponentId, PopulateNode>,
}

/// Complete populate plan for one collection, keyed by attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PopulatePlan {
    pub fields: BTreeMap<FieldName, PopulateNode>,
}

impl PopulatePlan {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&PopulateNode> {
        self.fields.get(field)
    }
}

enum Frame {
    Plan(BTreeMap<FieldName, PopulateNode>),
    Zone(BTreeMap<ComponentId, PopulateNode>),
}

struct PlanBuilder {
    stack: Vec<Frame>,
}

impl PlanBuilder {
    fn insert(&mut self, name: &str, node: PopulateNode) {
        if let Some(Frame::Plan(fields)) = self.stack.last_mut() {
            fields.insert(name.to_string(), node);
        }
    }
}

impl SchemaVisitor for PlanBuilder {
    fn media(&mut self, _pos: &WalkPosition, name: &str, _multiple: bool) {
        self.insert(name, PopulateNode::All(true));
    }

    fn relation(
        &mut self,
        _pos: &WalkPosition,
        name: &str,
        _target: &CollectionId,
        _kind: RelationKind,
    ) {
        self.insert(name, PopulateNode::All(true));
    }

    fn enter_component(
        &mut self,
        _pos: &WalkPosition,
        _name: &str,
        _component: &ComponentId,
        _repeatable: bool,
    ) {
        self.stack.push(Frame::Plan(BTreeMap::new()));
    }

    fn leave_component(&mut self, _pos: &WalkPosition, name: &str) {
        if let Some(Frame::Plan(populate)) = self.stack.pop() {
            self.insert(name, PopulateNode::Nested(NestedPopulate { populate }));
        }
    }

    fn enter_zone(&mut self, _pos: &WalkPosition, _name: &str, _components: &[ComponentId]) {
        self.stack.push(Frame::Zone(BTreeMap::new()));
    }

    fn enter_zone_component(&mut self, _pos: &WalkPosition, _component: &ComponentId) {
        self.stack.push(Frame::Plan(BTreeMap::new()));
    }

    fn leave_zone_component(&mut self, _pos: &WalkPosition, component: &ComponentId) {
        if let Some(Frame::Plan(populate)) = self.stack.pop() {
            if let Some(Frame::Zone(on)) = self.stack.last_mut() {
                on.insert(
                    component.clone(),
                    PopulateNode::Nested(NestedPopulate { populate }),
                );
            }
        }
    }

    fn leave_zone(&mut self, _pos: &WalkPosition, name: &str) {
        if let Some(Frame::Zone(on)) = self.stack.pop() {
            self.insert(name, PopulateNode::Zone(ZonePopulate { on }));
        }
    }
}

/// Build the populate plan for a collection from its schema.
pub fn populate_plan(registry: &SchemaRegistry, collection: &str) -> Result<PopulatePlan> {
    let mut builder = PlanBuilder {
        stack: vec![Frame::Plan(BTreeMap::new())],
    };
    walk_content_type(registry, collection, &mut builder)?;

    match builder.stack.pop() {
        Some(Frame::Plan(fields)) => Ok(PopulatePlan { fields }),
        _ => Ok(PopulatePlan::default()),
    }
}

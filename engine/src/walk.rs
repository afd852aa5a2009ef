//! Shared recursive traversal over content-type schemas.
//!
//! A single walk drives every schema consumer: the relation field mapper,
//! the populate-plan builder, and the entity decoder. Each consumer
//! implements [`SchemaVisitor`] and receives one callback per field kind,
//! together with the dotted path and nesting flags of the position, so path
//! semantics cannot diverge between consumers.
//!
//! Dotted paths join attribute names with `.`; a dynamic-zone branch appends
//! the concrete component id after the zone field, e.g. `blocks.shared.quote.text`.
//! Repeatable-component items do not add a path segment.

use crate::schema::{AttributeDef, AttributeKind, SchemaRegistry};
use crate::{error::Result, CollectionId, ComponentId, FieldPath, RelationKind};

/// Position of an attribute within the schema walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkPosition {
    /// Dotted path of the attribute, dynamic-zone branches included
    pub path: FieldPath,
    /// Whether any ancestor is a repeatable component
    pub in_repeatable: bool,
    /// Whether any ancestor is a dynamic zone
    pub in_dynamic_zone: bool,
}

/// Callbacks invoked during a schema walk, one per field kind.
///
/// All methods default to no-ops so a visitor only implements the kinds it
/// cares about. `name` is the attribute's local name; `pos.path` is the full
/// dotted path.
pub trait SchemaVisitor {
    fn scalar(&mut self, _pos: &WalkPosition, _name: &str) {}

    fn media(&mut self, _pos: &WalkPosition, _name: &str, _multiple: bool) {}

    fn relation(
        &mut self,
        _pos: &WalkPosition,
        _name: &str,
        _target: &CollectionId,
        _kind: RelationKind,
    ) {
    }

    /// Called before descending into a component's attributes.
    fn enter_component(
        &mut self,
        _pos: &WalkPosition,
        _name: &str,
        _component: &ComponentId,
        _repeatable: bool,
    ) {
    }

    /// Called after a component's attributes were visited.
    fn leave_component(&mut self, _pos: &WalkPosition, _name: &str) {}

    /// Called once per dynamic-zone attribute, before its component branches.
    fn enter_zone(&mut self, _pos: &WalkPosition, _name: &str, _components: &[ComponentId]) {}

    /// Called before descending into one possible dynamic-zone component.
    fn enter_zone_component(&mut self, _pos: &WalkPosition, _component: &ComponentId) {}

    /// Called after one dynamic-zone component branch was visited.
    fn leave_zone_component(&mut self, _pos: &WalkPosition, _component: &ComponentId) {}

    /// Called after all component branches of a dynamic zone were visited.
    fn leave_zone(&mut self, _pos: &WalkPosition, _name: &str) {}
}

/// Walk the attribute schema of a collection content type.
pub fn walk_content_type(
    registry: &SchemaRegistry,
    collection: &str,
    visitor: &mut dyn SchemaVisitor,
) -> Result<()> {
    let content_type = registry.content_type(collection)?;
    walk_attributes(registry, &content_type.attributes, "", false, false, visitor)
}

/// Walk the attribute schema of a component.
pub fn walk_component(
    registry: &SchemaRegistry,
    component: &str,
    visitor: &mut dyn SchemaVisitor,
) -> Result<()> {
    let def = registry.component(component)?;
    walk_attributes(registry, &def.attributes, "", false, false, visitor)
}

fn join_path(prefix: &str, segment: &str) -> FieldPath {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn walk_attributes(
    registry: &SchemaRegistry,
    attributes: &[AttributeDef],
    prefix: &str,
    in_repeatable: bool,
    in_dynamic_zone: bool,
    visitor: &mut dyn SchemaVisitor,
) -> Result<()> {
    for attr in attributes {
        let pos = WalkPosition {
            path: join_path(prefix, &attr.name),
            in_repeatable,
            in_dynamic_zone,
        };

        match &attr.kind {
            AttributeKind::Scalar => visitor.scalar(&pos, &attr.name),
            AttributeKind::Media { multiple } => visitor.media(&pos, &attr.name, *multiple),
            AttributeKind::Relation { target, relation } => {
                visitor.relation(&pos, &attr.name, target, *relation)
            }
            AttributeKind::Component {
                component,
                repeatable,
            } => {
                visitor.enter_component(&pos, &attr.name, component, *repeatable);
                let def = registry.component(component)?;
                walk_attributes(
                    registry,
                    &def.attributes,
                    &pos.path,
                    in_repeatable || *repeatable,
                    in_dynamic_zone,
                    visitor,
                )?;
                visitor.leave_component(&pos, &attr.name);
            }
            AttributeKind::DynamicZone { components } => {
                visitor.enter_zone(&pos, &attr.name, components);
                for component in components {
                    let branch = WalkPosition {
                        path: join_path(&pos.path, component),
                        in_repeatable,
                        in_dynamic_zone: true,
                    };
                    visitor.enter_zone_component(&branch, component);
                    let def = registry.component(component)?;
                    walk_attributes(
                        registry,
                        &def.attributes,
                        &branch.path,
                        in_repeatable,
                        true,
                        visitor,
                    )?;
                    visitor.leave_zone_component(&branch, component);
                }
                visitor.leave_zone(&pos, &attr.name);
            }
        }
    }

    Ok(())
}

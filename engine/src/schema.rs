//! Content-type schema model and introspection registry.
//!
//! Schemas describe which attributes of a collection are plain values,
//! media, relations, nested components, or dynamic zones. Every schema-driven
//! consumer (field mapping, populate planning, entity decoding) reads from
//! the same [`SchemaRegistry`].

use crate::{error::Result, CollectionId, ComponentId, Error, FieldName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cardinality of a relation attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// At most one referenced entity
    One,
    /// A list of referenced entities
    Many,
}

impl RelationKind {
    /// Whether the relation holds a list of references.
    pub fn is_many(self) -> bool {
        matches!(self, RelationKind::Many)
    }
}

/// Kind of a single attribute in a content-type or component schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeKind {
    /// Plain value: strings, numbers, booleans, dates, raw json
    Scalar,
    /// Uploaded file reference(s)
    Media { multiple: bool },
    /// Reference(s) to entities of another collection
    Relation {
        target: CollectionId,
        relation: RelationKind,
    },
    /// Nested structure described by a reusable component schema
    Component {
        component: ComponentId,
        repeatable: bool,
    },
    /// Per-instance choice among several component schemas
    DynamicZone { components: Vec<ComponentId> },
}

/// Definition of a named attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDef {
    /// Attribute name
    pub name: FieldName,
    /// Attribute kind
    pub kind: AttributeKind,
}

impl AttributeDef {
    /// Create a scalar attribute.
    pub fn scalar(name: impl Into<FieldName>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Scalar,
        }
    }

    /// Create a media attribute.
    pub fn media(name: impl Into<FieldName>, multiple: bool) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Media { multiple },
        }
    }

    /// Create a relation attribute.
    pub fn relation(
        name: impl Into<FieldName>,
        target: impl Into<CollectionId>,
        relation: RelationKind,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Relation {
                target: target.into(),
                relation,
            },
        }
    }

    /// Create a component attribute.
    pub fn component(
        name: impl Into<FieldName>,
        component: impl Into<ComponentId>,
        repeatable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Component {
                component: component.into(),
                repeatable,
            },
        }
    }

    /// Create a dynamic-zone attribute.
    pub fn dynamic_zone(name: impl Into<FieldName>, components: Vec<ComponentId>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::DynamicZone { components },
        }
    }
}

/// Schema of a collection content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    /// Collection identifier, e.g. `api::article.article`
    pub id: CollectionId,
    /// Plural API name, the remote path segment, e.g. `articles`
    pub plural_name: String,
    /// Human-readable attribute used for cross-system identity matching
    pub main_field: Option<FieldName>,
    /// Attribute definitions in declaration order
    pub attributes: Vec<AttributeDef>,
}

impl ContentType {
    /// Create a new content type.
    pub fn new(
        id: impl Into<CollectionId>,
        plural_name: impl Into<String>,
        attributes: Vec<AttributeDef>,
    ) -> Self {
        Self {
            id: id.into(),
            plural_name: plural_name.into(),
            main_field: None,
            attributes,
        }
    }

    /// Builder-style method to set the main field.
    pub fn with_main_field(mut self, main_field: impl Into<FieldName>) -> Self {
        self.main_field = Some(main_field.into());
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Schema of a reusable component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    /// Component identifier, e.g. `shared.seo`
    pub id: ComponentId,
    /// Attribute definitions in declaration order
    pub attributes: Vec<AttributeDef>,
}

impl ComponentDef {
    /// Create a new component schema.
    pub fn new(id: impl Into<ComponentId>, attributes: Vec<AttributeDef>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Registry of all content-type and component schemas known to a transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistry {
    /// Content types by collection id
    content_types: HashMap<CollectionId, ContentType>,
    /// Components by component id
    components: HashMap<ComponentId, ComponentDef>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a content type to the registry.
    pub fn add_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.content_types
            .insert(content_type.id.clone(), content_type);
        self
    }

    /// Builder-style method to add a content type.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.add_content_type(content_type);
        self
    }

    /// Add a component to the registry.
    pub fn add_component(&mut self, component: ComponentDef) -> &mut Self {
        self.components.insert(component.id.clone(), component);
        self
    }

    /// Builder-style method to add a component.
    pub fn with_component(mut self, component: ComponentDef) -> Self {
        self.add_component(component);
        self
    }

    /// Get a content type by collection id.
    pub fn content_type(&self, id: &str) -> Result<&ContentType> {
        self.content_types
            .get(id)
            .ok_or_else(|| Error::CollectionNotFound(id.to_string()))
    }

    /// Get a component by id.
    pub fn component(&self, id: &str) -> Result<&ComponentDef> {
        self.components
            .get(id)
            .ok_or_else(|| Error::ComponentNotFound(id.to_string()))
    }

    /// Get the configured main field of a collection.
    pub fn main_field(&self, id: &str) -> Result<&FieldName> {
        self.content_type(id)?
            .main_field
            .as_ref()
            .ok_or_else(|| Error::MissingMainField(id.to_string()))
    }

    /// Iterate over all registered content types.
    pub fn content_types(&self) -> impl Iterator<Item = &ContentType> {
        self.content_types.values()
    }
}

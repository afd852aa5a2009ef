//! Typed entity model and decoder.
//!
//! Local stores hand over populated entities as raw json. The decoder lifts
//! that json into a typed tree using the collection's schema, tagging every
//! media, relation, component, and dynamic-zone position so downstream
//! passes (relation collection, media collection, payload building) never
//! have to re-derive field kinds from data shapes.
//!
//! Values that do not match their declared shape pass through untouched as
//! scalars rather than failing the whole entity. Relation items without a
//! numeric id are dropped, which matches how unkeyed references behave at
//! payload time anyway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{AttributeKind, SchemaRegistry};
use crate::{
    error::{Error, Result},
    CollectionId, ComponentId, FieldName, Locale, LocalId, RemoteId,
};

/// One populated entity from the local store, fields in data order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Local numeric identifier
    pub id: LocalId,
    /// Locale code, absent for non-localized collections
    pub locale: Option<Locale>,
    /// Sibling entities in other locales
    pub localizations: Vec<Entity>,
    /// Decoded fields, excluding `id`, `locale`, and `localizations`
    pub fields: Vec<(FieldName, FieldValue)>,
}

/// Decoded value of a single entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain value, kept as raw json
    Scalar(Value),
    /// Media reference(s)
    Media(MediaRef),
    /// Relation reference(s)
    Relation(RelationRef),
    /// Nested component data
    Component(ComponentRef),
    /// Dynamic-zone entries, each tagged with its component id
    DynamicZone(Vec<ZoneEntry>),
}

/// Media value of a media attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaRef {
    Single(Option<MediaFile>),
    Multiple(Vec<MediaFile>),
}

/// Relation value together with the collection it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRef {
    /// Target collection id
    pub target: CollectionId,
    /// Referenced entities, shaped by the data
    pub value: RelationValue,
}

/// Referenced entities of a relation field.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    Single(Option<RelatedEntity>),
    Multiple(Vec<RelatedEntity>),
}

/// Component value of a component attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentRef {
    Single(Option<ComponentData>),
    Multiple(Vec<ComponentData>),
}

/// Decoded fields of one component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentData {
    /// Component instance id, dropped from outgoing payloads
    pub id: Option<LocalId>,
    /// Decoded fields, excluding `id` and `__component`
    pub fields: Vec<(FieldName, FieldValue)>,
}

/// One entry of a dynamic zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneEntry {
    /// Component id from the entry's `__component` tag
    pub component: ComponentId,
    /// Decoded component fields
    pub data: ComponentData,
}

/// An uploaded file as stored by the media library.
///
/// Identity for deduplication is the `(name, width, height)` triple; local
/// and remote ids are never comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: LocalId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Any further file attributes, carried through unchanged
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl MediaFile {
    /// Whether two files are the same asset across systems.
    pub fn same_asset(&self, other: &MediaFile) -> bool {
        self.name == other.name && self.width == other.width && self.height == other.height
    }

    /// File attributes without the local id, used when no remote match exists.
    pub fn payload(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(object) = value.as_object_mut() {
            object.remove("id");
        }
        value
    }
}

/// A referenced entity inside a relation field.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedEntity {
    /// Local numeric identifier
    pub id: LocalId,
    /// Locale code when the target collection is localized
    pub locale: Option<Locale>,
    /// Remaining attributes, excluding `id`, `locale`, and `localizations`
    pub attributes: Map<String, Value>,
}

impl RelatedEntity {
    /// Decode a populated relation item. Returns `None` when the value is
    /// not an object or carries no numeric id.
    pub fn from_value(value: &Value) -> Option<RelatedEntity> {
        let object = value.as_object()?;
        let id = object.get("id").and_then(Value::as_i64)?;
        let locale = object
            .get("locale")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut attributes = Map::new();
        for (key, val) in object {
            if key == "id" || key == "locale" || key == "localizations" {
                continue;
            }
            attributes.insert(key.clone(), val.clone());
        }

        Some(RelatedEntity {
            id,
            locale,
            attributes,
        })
    }

    /// Main-field value rendered as query text.
    pub fn main_field_text(&self, main_field: &str) -> Option<String> {
        self.attributes.get(main_field).map(scalar_text)
    }

    /// Attributes plus locale, without the local id. The base of create and
    /// update payloads for this entity.
    pub fn payload_fields(&self) -> Map<String, Value> {
        let mut fields = self.attributes.clone();
        if let Some(locale) = &self.locale {
            fields.insert("locale".to_string(), Value::String(locale.clone()));
        }
        fields
    }
}

/// An entity as a remote api returns it, attributes nested under
/// `attributes` and localizations wrapped in a `data` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    /// Remote numeric identifier
    pub id: RemoteId,
    /// Raw remote attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RemoteEntity {
    pub fn new(id: RemoteId, attributes: Map<String, Value>) -> Self {
        Self { id, attributes }
    }

    /// Locale of the remote entity, when present.
    pub fn locale(&self) -> Option<&str> {
        self.attributes.get("locale").and_then(Value::as_str)
    }

    /// Attribute rendered as query text.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.attributes.get(name).map(scalar_text)
    }

    /// Localization siblings from the populated `localizations.data`
    /// envelope. Empty when localizations were not populated.
    pub fn localizations(&self) -> Vec<RemoteEntity> {
        self.attributes
            .get("localizations")
            .and_then(|value| value.get("data"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Render a scalar as text for filter queries. Strings stay bare, other
/// values use their json rendering.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Entity {
    /// Decode a populated entity as returned by the local store.
    pub fn from_value(
        registry: &SchemaRegistry,
        collection: &str,
        value: &Value,
    ) -> Result<Entity> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::EntityNotObject(collection.to_string()))?;
        let id = object
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::MissingEntityId(collection.to_string()))?;
        let locale = object
            .get("locale")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut localizations = Vec::new();
        if let Some(items) = object.get("localizations").and_then(Value::as_array) {
            for item in items {
                localizations.push(Entity::from_value(registry, collection, item)?);
            }
        }

        let content_type = registry.content_type(collection)?;
        let mut fields = Vec::new();
        for (key, val) in object {
            if key == "id" || key == "locale" || key == "localizations" {
                continue;
            }
            let decoded = match content_type.attribute(key) {
                Some(attr) => decode_value(registry, &attr.kind, val, key)?,
                None => FieldValue::Scalar(val.clone()),
            };
            fields.push((key.clone(), decoded));
        }

        Ok(Entity {
            id,
            locale,
            localizations,
            fields,
        })
    }

    /// Look up a decoded field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Main-field value rendered as query text.
    pub fn main_field_text(&self, main_field: &str) -> Option<String> {
        match self.field(main_field)? {
            FieldValue::Scalar(value) => Some(scalar_text(value)),
            _ => None,
        }
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn decode_value(
    registry: &SchemaRegistry,
    kind: &AttributeKind,
    value: &Value,
    path: &str,
) -> Result<FieldValue> {
    match kind {
        AttributeKind::Scalar => Ok(FieldValue::Scalar(value.clone())),
        AttributeKind::Media { multiple: false } => match value {
            Value::Null => Ok(FieldValue::Media(MediaRef::Single(None))),
            Value::Object(_) => match serde_json::from_value::<MediaFile>(value.clone()) {
                Ok(file) => Ok(FieldValue::Media(MediaRef::Single(Some(file)))),
                Err(_) => Ok(FieldValue::Scalar(value.clone())),
            },
            _ => Ok(FieldValue::Scalar(value.clone())),
        },
        AttributeKind::Media { multiple: true } => match value {
            Value::Array(_) => match serde_json::from_value::<Vec<MediaFile>>(value.clone()) {
                Ok(files) => Ok(FieldValue::Media(MediaRef::Multiple(files))),
                Err(_) => Ok(FieldValue::Scalar(value.clone())),
            },
            _ => Ok(FieldValue::Scalar(value.clone())),
        },
        AttributeKind::Relation { target, .. } => match value {
            Value::Null => Ok(FieldValue::Relation(RelationRef {
                target: target.clone(),
                value: RelationValue::Single(None),
            })),
            Value::Object(_) => Ok(FieldValue::Relation(RelationRef {
                target: target.clone(),
                value: RelationValue::Single(RelatedEntity::from_value(value)),
            })),
            Value::Array(items) => {
                let related = items.iter().filter_map(RelatedEntity::from_value).collect();
                Ok(FieldValue::Relation(RelationRef {
                    target: target.clone(),
                    value: RelationValue::Multiple(related),
                }))
            }
            _ => Ok(FieldValue::Scalar(value.clone())),
        },
        AttributeKind::Component {
            component,
            repeatable: false,
        } => match value {
            Value::Null => Ok(FieldValue::Component(ComponentRef::Single(None))),
            Value::Object(object) => {
                let data = decode_component(registry, component, object, path)?;
                Ok(FieldValue::Component(ComponentRef::Single(Some(data))))
            }
            _ => Ok(FieldValue::Scalar(value.clone())),
        },
        AttributeKind::Component {
            component,
            repeatable: true,
        } => match value {
            Value::Array(items) => {
                let mut instances = Vec::new();
                for item in items {
                    match item.as_object() {
                        Some(object) => {
                            instances.push(decode_component(registry, component, object, path)?)
                        }
                        None => continue,
                    }
                }
                Ok(FieldValue::Component(ComponentRef::Multiple(instances)))
            }
            _ => Ok(FieldValue::Scalar(value.clone())),
        },
        AttributeKind::DynamicZone { .. } => match value {
            Value::Array(items) => {
                let mut entries = Vec::new();
                for (index, item) in items.iter().enumerate() {
                    let entry_path = format!("{path}[{index}]");
                    let object = item
                        .as_object()
                        .ok_or_else(|| Error::MissingComponentTag(entry_path.clone()))?;
                    let component = object
                        .get("__component")
                        .and_then(Value::as_str)
                        .ok_or(Error::MissingComponentTag(entry_path))?;
                    let branch_path = join_path(path, component);
                    let data = decode_component(registry, component, object, &branch_path)?;
                    entries.push(ZoneEntry {
                        component: component.to_string(),
                        data,
                    });
                }
                Ok(FieldValue::DynamicZone(entries))
            }
            _ => Ok(FieldValue::Scalar(value.clone())),
        },
    }
}

fn decode_component(
    registry: &SchemaRegistry,
    component: &str,
    object: &Map<String, Value>,
    path: &str,
) -> Result<ComponentData> {
    let def = registry.component(component)?;
    let id = object.get("id").and_then(Value::as_i64);

    let mut fields = Vec::new();
    for (key, val) in object {
        if key == "id" || key == "__component" {
            continue;
        }
        let decoded = match def.attribute(key) {
            Some(attr) => decode_value(registry, &attr.kind, val, &join_path(path, key))?,
            None => FieldValue::Scalar(val.clone()),
        };
        fields.push((key.clone(), decoded));
    }

    Ok(ComponentData { id, fields })
}

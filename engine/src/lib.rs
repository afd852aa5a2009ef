//! # Courier Engine
//!
//! Schema-driven content transfer between headless CMS instances.
//!
//! This crate provides the pure logic for moving entities from one system
//! to another: schema walking, relation and media discovery, locale
//! reconciliation, and payload rewriting. It performs no IO of its own -
//! callers feed it schemas and populated entities and send the payloads it
//! produces.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of files, network, or platform
//! - **Deterministic**: Same inputs always produce same outputs
//! - **Testable**: Pure logic, no mocks needed
//! - **Degrading**: Unresolvable references are dropped, never fatal
//!
//! ## Core Concepts
//!
//! ### Schemas
//!
//! Collections are described by a [`SchemaRegistry`] of content types and
//! reusable components. Attributes are scalars, media, relations, nested
//! components, or dynamic zones. A single [`walk_content_type`] traversal
//! drives every schema consumer so dotted field paths never diverge.
//!
//! ### Entities
//!
//! Populated entities from a local store decode into a typed [`Entity`]
//! tree via [`Entity::from_value`]. Every relation and media position is
//! tagged during decoding, so collection and rewriting are plain tree
//! walks.
//!
//! ### Collection
//!
//! [`collect_relations`] gathers every referenced entity per target
//! collection, and [`collect_media`] gathers every attached file, both
//! deduplicated and including localization siblings.
//!
//! ### Resolution artifacts
//!
//! Each referenced entity resolves to a [`NewRelationRecord`] keyed by
//! `(oldId, modelId)`. [`entity_payload`] consumes the [`ResolvedRelations`]
//! table and a [`MediaIndex`] to rewrite an entity into its outgoing form:
//! remote ids substituted, local ids stripped, unresolved references
//! degraded to `null` or dropped from arrays.
//!
//! ### Locale reconciliation
//!
//! Remote writes hang localized entities off a parent in the remote
//! default locale. [`reconcile_entities`] reshapes a batch accordingly
//! before anything is sent, guided by a [`LocalesInfo`].
//!
//! ## Quick Start
//!
//! ```rust
//! use courier_engine::{
//!     AttributeDef, ContentType, RelationKind, SchemaRegistry,
//!     collect_relations, entity_payload,
//!     Entity, MediaIndex, NewRelationRecord, ResolvedRelations,
//! };
//! use serde_json::json;
//!
//! // 1. Describe the collection
//! let registry = SchemaRegistry::new().with_content_type(
//!     ContentType::new(
//!         "api::article.article",
//!         "articles",
//!         vec![
//!             AttributeDef::scalar("title"),
//!             AttributeDef::relation("author", "api::author.author", RelationKind::One),
//!         ],
//!     )
//!     .with_main_field("title"),
//! );
//!
//! // 2. Decode a populated entity
//! let entity = Entity::from_value(&registry, "api::article.article", &json!({
//!     "id": 1,
//!     "title": "Hello",
//!     "author": { "id": 10, "name": "Ada" }
//! })).unwrap();
//!
//! // 3. Collect referenced relations
//! let batch = vec![entity];
//! let relations = collect_relations(&batch);
//! assert_eq!(relations.values("api::author.author").len(), 1);
//!
//! // 4. Rewrite references once they are resolved remotely
//! let mut resolved = ResolvedRelations::new();
//! resolved.insert(NewRelationRecord::new(
//!     10,
//!     "api::author.author",
//!     501,
//!     serde_json::Map::new(),
//! ));
//! let payload = entity_payload(&batch[0], &resolved, &MediaIndex::default());
//! assert_eq!(payload["author"]["id"], json!(501));
//! ```
//!
//! ## Reports
//!
//! Failures during a transfer never abort the batch. The [`TransferReport`]
//! envelope pairs whatever succeeded with the [`ErrorItem`] list describing
//! what did not.

pub mod collect;
pub mod entity;
pub mod error;
pub mod locale;
pub mod normalize;
pub mod populate;
pub mod relation_map;
pub mod report;
pub mod schema;
pub mod walk;

// Re-export main types at crate root
pub use collect::{collect_media, collect_relations, CollectedRelations};
pub use entity::{
    scalar_text, ComponentData, ComponentRef, Entity, FieldValue, MediaFile, MediaRef,
    RelatedEntity, RelationRef, RelationValue, RemoteEntity, ZoneEntry,
};
pub use error::{Error, Result};
pub use locale::{
    connected_localizations, reconcile_entities, ConnectedLocalizations, LocalesInfo,
};
pub use normalize::{entity_payload, MediaIndex, NewRelationRecord, ResolvedRelations};
pub use populate::{populate_plan, NestedPopulate, PopulateNode, PopulatePlan, ZonePopulate};
pub use relation_map::{relation_fields, relation_targets, RelationField, RelationFieldMap};
pub use report::{ErrorDetail, ErrorItem, TransferReport};
pub use schema::{
    AttributeDef, AttributeKind, ComponentDef, ContentType, RelationKind, SchemaRegistry,
};
pub use walk::{walk_component, walk_content_type, SchemaVisitor, WalkPosition};

/// Type aliases for clarity
pub type LocalId = i64;
pub type RemoteId = i64;
pub type CollectionId = String;
pub type ComponentId = String;
pub type FieldName = String;
pub type FieldPath = String;
pub type Locale = String;

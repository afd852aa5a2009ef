//! Error types for the Courier engine.

use crate::{CollectionId, ComponentId, FieldPath};
use thiserror::Error;

/// All possible errors from the Courier engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Schema lookup errors
    #[error("collection not found: {0}")]
    CollectionNotFound(CollectionId),

    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    #[error("collection '{0}' has no main field configured")]
    MissingMainField(CollectionId),

    // Entity decoding errors
    #[error("entity in '{0}' is not a json object")]
    EntityNotObject(CollectionId),

    #[error("entity in '{0}' has no numeric id")]
    MissingEntityId(CollectionId),

    #[error("dynamic zone entry at '{0}' has no component tag")]
    MissingComponentTag(FieldPath),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

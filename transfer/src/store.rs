//! Local content store seam.
//!
//! The transfer runtime reads entities, locale settings, and media bytes
//! from its host system through this trait. Hosts back it with whatever
//! storage they run on; tests back it with an in-memory double.

use async_trait::async_trait;
use courier_engine::{LocalId, Locale, MediaFile, PopulatePlan};
use serde_json::Value;

/// Failure raised by a local store backend.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(String);

impl StoreError {
    /// Wrap a backend failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read options for populated entity loads.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Populate plan applied to the load
    pub populate: PopulatePlan,
    /// Also attach localization stubs to each entity
    pub populate_localizations: bool,
    /// Lift the default-locale filter and return entities in every locale
    pub all_locales: bool,
}

impl FindOptions {
    /// Options carrying the given populate plan.
    pub fn new(populate: PopulatePlan) -> Self {
        Self {
            populate,
            ..Self::default()
        }
    }

    /// Attach localization stubs to the loaded entities.
    pub fn with_localizations(mut self) -> Self {
        self.populate_localizations = true;
        self
    }

    /// Return entities in every locale.
    pub fn all_locales(mut self) -> Self {
        self.all_locales = true;
        self
    }
}

/// Read access to the local content system.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Load entities of a collection by id.
    async fn find_many(
        &self,
        collection: &str,
        ids: &[LocalId],
        options: &FindOptions,
    ) -> StoreResult<Vec<Value>>;

    /// Load one entity of a collection, or `None` when it does not exist.
    async fn find_one(
        &self,
        collection: &str,
        id: LocalId,
        options: &FindOptions,
    ) -> StoreResult<Option<Value>>;

    /// Default locale of the local system.
    async fn default_locale(&self) -> StoreResult<Locale>;

    /// Raw bytes of a locally stored media file.
    async fn media_bytes(&self, file: &MediaFile) -> StoreResult<Vec<u8>>;
}

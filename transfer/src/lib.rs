//! # Courier Transfer
//!
//! Remote transfer runtime for Courier. Where `courier-engine` is pure
//! logic, this crate does the IO: it loads populated entities from a
//! [`LocalStore`] you implement, talks to the remote content API over
//! HTTP, and drives the full pipeline of media migration, relation
//! resolution, and entity upserts.
//!
//! ## Core Concepts
//!
//! ### Local store
//!
//! The [`LocalStore`] trait is the seam between this crate and whatever
//! holds your content locally: a database, an exported dataset, another
//! API. It answers populated-entity queries and serves media bytes.
//!
//! ### Remote client
//!
//! [`RemoteClient`] wraps the remote content API: bearer-token auth,
//! collection-scoped paths, multipart uploads. [`RemoteConfig`] carries
//! the base URL and token.
//!
//! ### Transfer service
//!
//! [`TransferService`] runs a [`TransferRequest`] end to end and returns
//! a [`TransferOutcome`]: the written entities, every error the stages
//! accumulated, and the relation records created along the way. Per-item
//! failures never abort a batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use courier_engine::{MediaFile, SchemaRegistry};
//! use courier_transfer::{
//!     FindOptions, LocalStore, RemoteConfig, StoreResult, TransferRequest, TransferService,
//! };
//! use serde_json::Value;
//!
//! struct EmptyStore;
//!
//! #[async_trait]
//! impl LocalStore for EmptyStore {
//!     async fn find_many(
//!         &self,
//!         _collection: &str,
//!         _ids: &[i64],
//!         _options: &FindOptions,
//!     ) -> StoreResult<Vec<Value>> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn find_one(
//!         &self,
//!         _collection: &str,
//!         _id: i64,
//!         _options: &FindOptions,
//!     ) -> StoreResult<Option<Value>> {
//!         Ok(None)
//!     }
//!
//!     async fn default_locale(&self) -> StoreResult<String> {
//!         Ok("en".to_string())
//!     }
//!
//!     async fn media_bytes(&self, _file: &MediaFile) -> StoreResult<Vec<u8>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # async fn demo() -> courier_transfer::Result<()> {
//! let registry = SchemaRegistry::new();
//! let config = RemoteConfig::new("https://remote.example.com", "api-token")?;
//! let service = TransferService::new(registry, Arc::new(EmptyStore), &config)?;
//!
//! let outcome = service
//!     .run(&TransferRequest::new("api::article.article", vec![1, 2, 3]))
//!     .await?;
//! println!("{} entities written, {} errors", outcome.data.len(), outcome.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod locales;
pub mod media;
pub mod query;
mod remote;
pub mod resolve;
pub mod service;
pub mod store;
pub mod upsert;

// Re-export main types at crate root
pub use client::RemoteClient;
pub use config::{ConfigError, RemoteConfig};
pub use error::{Result, TransferError};
pub use locales::{fetch_locales_info, RemoteLocale};
pub use media::{migrate_media, MediaOutcome};
pub use resolve::{resolve_relations, ResolveOutcome};
pub use service::{TransferOptions, TransferOutcome, TransferRequest, TransferService};
pub use store::{FindOptions, LocalStore, StoreError, StoreResult};
pub use upsert::{upsert_entities, UpsertOutcome};

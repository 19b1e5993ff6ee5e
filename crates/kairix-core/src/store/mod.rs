//! Storage abstraction for Kairix.
//!
//! The [`DocumentStore`] trait is the only thing the import driver knows
//! about persistence, so backends (SQLite, in-memory) are interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DocumentSummary, StoredDocument};

/// Abstract storage backend for imported documents.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`install_schema`](DocumentStore::install_schema) | Create tables and indexes (idempotent) |
/// | [`create`](DocumentStore::create) | Persist a document keyed by its uid |
/// | [`get`](DocumentStore::get) | Fetch one document by uid |
/// | [`list`](DocumentStore::list) | List document summaries, oldest first |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Register the schema. Safe to call more than once; called once at
    /// startup, never per document.
    async fn install_schema(&self) -> Result<()>;

    /// Persist a document. A document with the same uid is replaced.
    ///
    /// Returns the uid it was stored under.
    async fn create(&self, doc: &StoredDocument) -> Result<String>;

    /// Retrieve a document by uid.
    async fn get(&self, uid: &str) -> Result<Option<StoredDocument>>;

    /// List stored documents, optionally restricted to one source type.
    async fn list(&self, source_type: Option<&str>) -> Result<Vec<DocumentSummary>>;
}

//! In-memory [`DocumentStore`] implementation for tests and dry runs.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`, in insertion
//! order. Replacing a uid keeps the original position.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{DocumentSummary, StoredDocument};

use super::DocumentStore;

/// In-memory document store.
pub struct InMemoryStore {
    docs: RwLock<Vec<StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every stored document, in insertion order.
    pub fn documents(&self) -> Vec<StoredDocument> {
        self.docs.read().map(|docs| docs.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn install_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn create(&self, doc: &StoredDocument) -> Result<String> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        match docs.iter_mut().find(|d| d.uid == doc.uid) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(doc.uid.clone())
    }

    async fn get(&self, uid: &str) -> Result<Option<StoredDocument>> {
        let docs = self
            .docs
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(docs.iter().find(|d| d.uid == uid).cloned())
    }

    async fn list(&self, source_type: Option<&str>) -> Result<Vec<DocumentSummary>> {
        let docs = self
            .docs
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(docs
            .iter()
            .filter(|d| source_type.map_or(true, |st| d.source_type == st))
            .map(DocumentSummary::from)
            .collect())
    }
}

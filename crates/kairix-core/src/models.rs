//! Core data models used throughout Kairix.
//!
//! [`ConversationRecord`] is the input side (one exported conversation);
//! [`StoredDocument`] is what gets persisted for it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Discriminator written to `source_type` for documents imported from a
/// ChatGPT-style conversation export.
pub const SOURCE_TYPE_CHATGPT: &str = "chatgpt";

/// Message-id → message-node mapping, kept in the export's declaration order.
pub type MessageMapping = Map<String, Value>;

/// One exported conversation.
///
/// Message nodes are kept as raw JSON values; their shape is checked lazily
/// by [`crate::flatten::flatten_message`] so a malformed node only drops
/// that node instead of failing the whole export.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRecord {
    /// Export-assigned identifiers, when the export carries them. Kept
    /// untyped so an unexpected id type never fails the parse.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub conversation_id: Option<Value>,
    pub title: String,
    /// `None` when the key is absent or explicitly `null`.
    #[serde(default)]
    pub mapping: Option<MessageMapping>,
}

impl ConversationRecord {
    /// Number of message nodes, zero for a missing mapping.
    pub fn mapping_len(&self) -> usize {
        self.mapping.as_ref().map_or(0, Map::len)
    }

    /// Key distinguishing this record from its siblings in one export:
    /// `id`, then `conversation_id`, then the record's array position.
    pub fn record_key(&self, index: usize) -> String {
        [&self.id, &self.conversation_id]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("#{}", index))
    }
}

/// Parse a whole conversation export (a JSON array of records).
///
/// The underlying [`serde_json::Error`] stays reachable through
/// `anyhow::Error::downcast_ref`.
pub fn parse_export(json: &str) -> Result<Vec<ConversationRecord>> {
    serde_json::from_str(json).context("Failed to parse conversation export")
}

/// How the `uid` of a new [`StoredDocument`] is chosen.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UidStrategy {
    /// A fresh `urn:uuid:` v4 per import. Re-importing a file duplicates it.
    #[default]
    Random,
    /// `urn:sha256:` of source type, record key, label, and content.
    /// Re-importing the same export resolves to the same uids.
    Content,
}

/// Persisted record for one flattened conversation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct StoredDocument {
    pub uid: String,
    pub source_label: String,
    pub source_type: String,
    pub content: String,
    /// Unix seconds at import time.
    pub created_at: i64,
}

impl StoredDocument {
    pub fn new(
        source_label: impl Into<String>,
        source_type: impl Into<String>,
        content: impl Into<String>,
        strategy: UidStrategy,
    ) -> Self {
        Self::for_record("", source_label, source_type, content, strategy)
    }

    /// Build the document for one export record. `record_key` (see
    /// [`ConversationRecord::record_key`]) keeps content uids of records
    /// with identical title and transcript apart.
    pub fn for_record(
        record_key: &str,
        source_label: impl Into<String>,
        source_type: impl Into<String>,
        content: impl Into<String>,
        strategy: UidStrategy,
    ) -> Self {
        let source_label = source_label.into();
        let source_type = source_type.into();
        let content = content.into();
        let uid = match strategy {
            UidStrategy::Random => Uuid::new_v4().urn().to_string(),
            UidStrategy::Content => {
                content_uid(&source_type, record_key, &source_label, &content)
            }
        };
        Self {
            uid,
            source_label,
            source_type,
            content,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

fn content_uid(source_type: &str, record_key: &str, source_label: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_type.as_bytes());
    hasher.update([0u8]);
    hasher.update(record_key.as_bytes());
    hasher.update([0u8]);
    hasher.update(source_label.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("urn:sha256:{:x}", hasher.finalize())
}

/// Listing row: everything but the content body.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub uid: String,
    pub source_label: String,
    pub source_type: String,
    pub created_at: i64,
}

impl From<&StoredDocument> for DocumentSummary {
    fn from(doc: &StoredDocument) -> Self {
        Self {
            uid: doc.uid.clone(),
            source_label: doc.source_label.clone(),
            source_type: doc.source_type.clone(),
            created_at: doc.created_at,
        }
    }
}

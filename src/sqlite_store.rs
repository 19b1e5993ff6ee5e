//! SQLite-backed [`DocumentStore`] implementation.
//!
//! One `source_documents` row per imported conversation, keyed by uid,
//! with secondary indexes on label and source type.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use kairix_core::models::{DocumentSummary, StoredDocument};
use kairix_core::store::DocumentStore;

use crate::config::Config;
use crate::db;

/// SQLite implementation of the [`DocumentStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using `config.db` and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = Self::new(db::connect(config).await?);
        store.install_schema().await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_summary(row: &SqliteRow) -> DocumentSummary {
    DocumentSummary {
        uid: row.get("uid"),
        source_label: row.get("source_label"),
        source_type: row.get("source_type"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn install_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS source_documents (
                uid TEXT PRIMARY KEY,
                source_label TEXT NOT NULL,
                source_type TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_source_documents_label ON source_documents(source_label)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_source_documents_type ON source_documents(source_type)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create(&self, doc: &StoredDocument) -> Result<String> {
        sqlx::query(
            r#"
            INSERT INTO source_documents (uid, source_label, source_type, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uid) DO UPDATE SET
                source_label = excluded.source_label,
                source_type = excluded.source_type,
                content = excluded.content,
                created_at = excluded.created_at
            "#,
        )
        .bind(&doc.uid)
        .bind(&doc.source_label)
        .bind(&doc.source_type)
        .bind(&doc.content)
        .bind(doc.created_at)
        .execute(&self.pool)
        .await?;

        Ok(doc.uid.clone())
    }

    async fn get(&self, uid: &str) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT uid, source_label, source_type, content, created_at FROM source_documents WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| StoredDocument {
            uid: row.get("uid"),
            source_label: row.get("source_label"),
            source_type: row.get("source_type"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        }))
    }

    async fn list(&self, source_type: Option<&str>) -> Result<Vec<DocumentSummary>> {
        let rows = match source_type {
            Some(st) => {
                sqlx::query(
                    "SELECT uid, source_label, source_type, created_at FROM source_documents WHERE source_type = ? ORDER BY created_at ASC, rowid ASC",
                )
                .bind(st)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT uid, source_label, source_type, created_at FROM source_documents ORDER BY created_at ASC, rowid ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(row_to_summary).collect())
    }
}

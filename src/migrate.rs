use anyhow::Result;

use kairix_core::store::DocumentStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Create the database file and install the document schema.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    store.install_schema().await?;
    store.close().await;
    Ok(())
}

//! Stored document listing and retrieval.
//!
//! Backs the `kairix list` and `kairix get` commands.

use anyhow::{bail, Result};

use kairix_core::store::DocumentStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// CLI entry point for `kairix list`: one tab-separated row per document.
pub async fn run_list(config: &Config, source_type: Option<&str>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let docs = store.list(source_type).await?;
    store.close().await;

    for doc in &docs {
        println!(
            "{}\t{}\t{}\t{}",
            doc.uid,
            doc.source_label,
            doc.source_type,
            format_ts_iso(doc.created_at)
        );
    }
    println!("{} documents", docs.len());
    Ok(())
}

/// CLI entry point for `kairix get`: metadata header, then the transcript.
pub async fn run_get(config: &Config, uid: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let doc = store.get(uid).await?;
    store.close().await;

    let Some(doc) = doc else {
        bail!("document not found: {}", uid);
    };

    println!("--- Document ---");
    println!("uid:          {}", doc.uid);
    println!("source_label: {}", doc.source_label);
    println!("source_type:  {}", doc.source_type);
    println!("created_at:   {}", format_ts_iso(doc.created_at));
    println!();
    println!("--- Content ---");
    println!("{}", doc.content);

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

//! # Kairix CLI (`kairix`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kairix init` | Create the SQLite database and install the schema |
//! | `kairix import <file>` | Import a conversation export |
//! | `kairix list` | List stored documents |
//! | `kairix get <uid>` | Print a stored document |
//!
//! ## Examples
//!
//! ```bash
//! kairix init --config ./config/kairix.toml
//! kairix import ~/Downloads/conversations.json --progress human
//! kairix list --source-type chatgpt
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use kairix::config;
use kairix::documents;
use kairix::import::{stream_import, FileSelection};
use kairix::logging;
use kairix::migrate;
use kairix::progress::ProgressMode;
use kairix::sqlite_store::SqliteStore;

/// Kairix — import exported chat history into a local document store.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "kairix",
    about = "Kairix — import exported chat history into a local document store",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kairix.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Import a conversation export.
    ///
    /// Each conversation becomes one stored document. With several paths,
    /// `import.multi_file` decides whether the first is used or the
    /// import is refused. With none, nothing is imported.
    Import {
        /// Export file(s) (JSON array of conversations).
        paths: Vec<PathBuf>,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List stored documents.
    List {
        /// Only show documents of this source type (e.g. `chatgpt`).
        #[arg(long)]
        source_type: Option<String>,
    },

    /// Print a stored document by uid.
    Get {
        /// Document uid (e.g. `urn:uuid:...`).
        uid: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let _log_guard = logging::init_logging(&cfg.log)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { paths, progress } => {
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            let store = Arc::new(SqliteStore::open(&cfg).await?);

            let (handle, mut notifications) = stream_import(
                FileSelection::Many(paths),
                store.clone(),
                cfg.import.clone(),
            );
            while let Some(notification) = notifications.recv().await {
                reporter.report(&notification);
            }
            let result = handle.await?;
            store.close().await;

            let summary = result?;
            println!("imported {} documents", summary.documents.len());
            for doc in &summary.documents {
                println!("  {}\t{}", doc.uid, doc.source_label);
            }
        }
        Commands::List { source_type } => {
            documents::run_list(&cfg, source_type.as_deref()).await?;
        }
        Commands::Get { uid } => {
            documents::run_get(&cfg, &uid).await?;
        }
    }

    Ok(())
}

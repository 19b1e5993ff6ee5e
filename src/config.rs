use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

use kairix_core::models::{UidStrategy, SOURCE_TYPE_CHATGPT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    /// Minimum severity written to the log file. `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            level: default_log_level(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("./app.log")
}
fn default_log_level() -> String {
    "info".to_string()
}

/// What to do when the file selection holds more than one path.
#[derive(Debug, Deserialize, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum MultiFilePolicy {
    /// Import the first path, ignore the rest.
    #[default]
    TakeFirst,
    /// Fail the import without touching any file.
    RejectMultiple,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default)]
    pub multi_file: MultiFilePolicy,
    #[serde(default)]
    pub uid_strategy: UidStrategy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_type: default_source_type(),
            multi_file: MultiFilePolicy::default(),
            uid_strategy: UidStrategy::default(),
        }
    }
}

fn default_source_type() -> String {
    SOURCE_TYPE_CHATGPT.to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.log.level.parse::<LevelFilter>().is_err() {
        anyhow::bail!(
            "log.level must be one of off, error, warn, info, debug, trace (got '{}')",
            config.log.level
        );
    }

    if config.import.source_type.trim().is_empty() {
        anyhow::bail!("import.source_type must not be empty");
    }

    Ok(config)
}

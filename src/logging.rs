//! Process-wide log sink.
//!
//! Every import notification is also recorded here through `tracing`.
//! Lines go to an append-only file with timestamp, target, and level.

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install the global subscriber writing to `config.path`.
///
/// The returned guard flushes buffered lines on drop and must be held
/// until the process exits. Calling this twice is an error.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)
        .with_context(|| format!("Failed to open log file: {}", config.path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(log_file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}

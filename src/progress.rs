//! Import progress notifications and the reporters that render them.
//!
//! The import driver emits one [`Notification`] at each step and hands it
//! to an [`ImportReporter`] before moving on, so a caller sees progress as
//! it happens. The CLI renders on **stderr** so stdout stays parseable.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

/// One unit of human-readable import progress.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notification {
    /// The selection was an empty list. Terminal.
    NoFileSelected,
    Loading {
        path: PathBuf,
    },
    Loaded {
        conversations: usize,
    },
    /// The conversation's mapping was null or absent. Processing continues
    /// with zero messages.
    SkippingEmpty {
        title: String,
    },
    Processing {
        title: String,
    },
    MappingCount {
        count: usize,
    },
    /// A message node did not have the expected shape and was left out.
    SkippedMessage {
        title: String,
        message_id: String,
    },
    Writing {
        title: String,
        messages: usize,
    },
    /// Cumulative: every label written so far in this run, in order.
    Finished {
        labels: Vec<String>,
    },
}

impl Notification {
    /// Stable name for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::NoFileSelected => "no_file_selected",
            Notification::Loading { .. } => "loading",
            Notification::Loaded { .. } => "loaded",
            Notification::SkippingEmpty { .. } => "skipping_empty",
            Notification::Processing { .. } => "processing",
            Notification::MappingCount { .. } => "mapping_count",
            Notification::SkippedMessage { .. } => "skipped_message",
            Notification::Writing { .. } => "writing",
            Notification::Finished { .. } => "finished",
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::NoFileSelected => write!(f, "No file selected"),
            Notification::Loading { path } => write!(f, "Loading {}", path.display()),
            Notification::Loaded { conversations } => {
                write!(f, "Loaded {} conversations.", conversations)
            }
            Notification::SkippingEmpty { title } => {
                write!(f, "Skipping convo {} with no messages.", title)
            }
            Notification::Processing { title } => write!(f, "Processing conversation: {}", title),
            Notification::MappingCount { count } => write!(f, "# of mappings: {}", count),
            Notification::SkippedMessage { title, message_id } => {
                write!(f, "Skipped malformed message {} in {}", message_id, title)
            }
            Notification::Writing { title, messages } => write!(
                f,
                "Writing source document for {}, # of messages: {}",
                title, messages
            ),
            Notification::Finished { labels } => {
                write!(f, "finished! Wrote source documents:")?;
                for label in labels {
                    write!(f, "\n{}", label)?;
                }
                Ok(())
            }
        }
    }
}

/// Receives notifications as the import driver emits them.
pub trait ImportReporter: Send + Sync {
    fn report(&self, notification: &Notification);
}

/// Human-friendly progress on stderr, one notification per line.
pub struct StderrProgress;

impl ImportReporter for StderrProgress {
    fn report(&self, notification: &Notification) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", notification);
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ImportReporter for JsonProgress {
    fn report(&self, notification: &Notification) {
        let obj = serde_json::json!({
            "event": "progress",
            "kind": notification.kind(),
            "text": notification.to_string(),
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ImportReporter for NoProgress {
    fn report(&self, _notification: &Notification) {}
}

/// Keeps every notification in memory, for callers that want the full run.
#[derive(Default)]
pub struct CollectingProgress {
    seen: Mutex<Vec<Notification>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl ImportReporter for CollectingProgress {
    fn report(&self, notification: &Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification.clone());
        }
    }
}

/// Forwards notifications to a channel. A closed receiver is ignored; the
/// import still runs to completion.
pub struct ChannelProgress {
    tx: UnboundedSender<Notification>,
}

impl ChannelProgress {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

impl ImportReporter for ChannelProgress {
    fn report(&self, notification: &Notification) {
        let _ = self.tx.send(notification.clone());
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ImportReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

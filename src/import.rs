//! Conversation export import.
//!
//! Reads one export file, flattens every conversation into a transcript,
//! and writes one [`StoredDocument`] per conversation:
//!
//! ```text
//! selection ─▶ read + parse ─▶ per conversation:
//!                               skip-check → processing → count
//!                               → flatten → write → finished
//! ```
//!
//! Every step emits a [`Notification`], which is reported before the next
//! step runs, recorded in the run's [`ImportLog`], and written to the log
//! sink. A read or parse failure aborts the run before any conversation is
//! touched; malformed messages are dropped, never fatal.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;

use kairix_core::flatten::{build_transcript, flatten_conversation_with};
use kairix_core::models::{parse_export, MessageMapping, StoredDocument};
use kairix_core::store::DocumentStore;

use crate::config::{ImportConfig, MultiFilePolicy};
use crate::progress::{ChannelProgress, ImportReporter, Notification};

/// What the user picked: one path, or a list of paths.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FileSelection {
    Single(PathBuf),
    Many(Vec<PathBuf>),
}

impl From<PathBuf> for FileSelection {
    fn from(path: PathBuf) -> Self {
        FileSelection::Single(path)
    }
}

impl From<&Path> for FileSelection {
    fn from(path: &Path) -> Self {
        FileSelection::Single(path.to_path_buf())
    }
}

impl From<&str> for FileSelection {
    fn from(path: &str) -> Self {
        FileSelection::Single(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for FileSelection {
    fn from(paths: Vec<PathBuf>) -> Self {
        FileSelection::Many(paths)
    }
}

impl FileSelection {
    /// The single path to import, or `None` for an empty list.
    fn resolve(self, policy: MultiFilePolicy) -> Result<Option<PathBuf>> {
        let paths = match self {
            FileSelection::Single(path) => return Ok(Some(path)),
            FileSelection::Many(paths) => paths,
        };
        if paths.len() > 1 {
            match policy {
                MultiFilePolicy::TakeFirst => {
                    tracing::debug!(
                        ignored = paths.len() - 1,
                        "multiple files selected, importing the first"
                    );
                }
                MultiFilePolicy::RejectMultiple => {
                    bail!(
                        "{} files selected; import accepts exactly one (import.multi_file = \"reject-multiple\")",
                        paths.len()
                    );
                }
            }
        }
        Ok(paths.into_iter().next())
    }
}

/// Text of every notification emitted during one import, in order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImportLog {
    lines: Vec<String>,
}

impl ImportLog {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The accumulated progress text, one notification per line.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Result of a completed import.
#[derive(Clone, Debug, Default)]
pub struct ImportSummary {
    /// Documents written, in export order.
    pub documents: Vec<StoredDocument>,
    pub log: ImportLog,
}

struct Emitter<'a> {
    reporter: &'a dyn ImportReporter,
    log: ImportLog,
}

impl Emitter<'_> {
    fn emit(&mut self, notification: Notification) {
        tracing::info!(target: "kairix::import", "{}", notification);
        self.log.lines.push(notification.to_string());
        self.reporter.report(&notification);
    }
}

/// Import one conversation export into `store`.
pub async fn import_file(
    selection: impl Into<FileSelection>,
    store: &dyn DocumentStore,
    reporter: &dyn ImportReporter,
    options: &ImportConfig,
) -> Result<ImportSummary> {
    let mut emitter = Emitter {
        reporter,
        log: ImportLog::default(),
    };

    let selection: FileSelection = selection.into();
    let path = match selection.resolve(options.multi_file)? {
        Some(path) => path,
        None => {
            emitter.emit(Notification::NoFileSelected);
            return Ok(ImportSummary {
                documents: Vec::new(),
                log: emitter.log,
            });
        }
    };

    emitter.emit(Notification::Loading { path: path.clone() });
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read conversation export: {}", path.display()))?;
    let records = parse_export(&raw)?;
    emitter.emit(Notification::Loaded {
        conversations: records.len(),
    });

    let empty = MessageMapping::new();
    let mut documents: Vec<StoredDocument> = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let title = &record.title;
        if record.mapping.is_none() {
            emitter.emit(Notification::SkippingEmpty {
                title: title.clone(),
            });
        }
        let mapping = record.mapping.as_ref().unwrap_or(&empty);

        emitter.emit(Notification::Processing {
            title: title.clone(),
        });
        emitter.emit(Notification::MappingCount {
            count: mapping.len(),
        });

        let lines = flatten_conversation_with(mapping, |message_id| {
            emitter.emit(Notification::SkippedMessage {
                title: title.clone(),
                message_id: message_id.to_string(),
            })
        });

        emitter.emit(Notification::Writing {
            title: title.clone(),
            messages: lines.len(),
        });

        let doc = StoredDocument::for_record(
            &record.record_key(index),
            title.as_str(),
            options.source_type.as_str(),
            build_transcript(&lines),
            options.uid_strategy,
        );
        store
            .create(&doc)
            .await
            .with_context(|| format!("Failed to store document for conversation: {}", title))?;
        documents.push(doc);

        emitter.emit(Notification::Finished {
            labels: documents.iter().map(|d| d.source_label.clone()).collect(),
        });
    }

    Ok(ImportSummary {
        documents,
        log: emitter.log,
    })
}

/// Run [`import_file`] on a background task, streaming its notifications.
///
/// The receiver yields each notification as soon as it is emitted and
/// closes when the import finishes; the handle resolves to the outcome.
pub fn stream_import(
    selection: FileSelection,
    store: Arc<dyn DocumentStore>,
    options: ImportConfig,
) -> (
    JoinHandle<Result<ImportSummary>>,
    UnboundedReceiver<Notification>,
) {
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(async move {
        let reporter = ChannelProgress::new(tx);
        import_file(selection, store.as_ref(), &reporter, &options).await
    });
    (handle, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectingProgress, NoProgress};
    use kairix_core::models::UidStrategy;
    use kairix_core::store::memory::InMemoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_export(tmp: &TempDir, name: &str, data: serde_json::Value) -> PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();
        path
    }

    fn message(role: &str, text: &str, time: i64) -> serde_json::Value {
        json!({
            "message": {
                "author": {"role": role},
                "content": {"parts": [text]},
                "create_time": time
            }
        })
    }

    fn finished(notes: &[Notification]) -> Vec<Vec<String>> {
        notes
            .iter()
            .filter_map(|n| match n {
                Notification::Finished { labels } => Some(labels.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn single_message_scenario() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "one.json",
            json!([{"title": "T", "mapping": {"m0": message("user", "hi", 5)}}]),
        );
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        let summary = import_file(path, &store, &reporter, &ImportConfig::default())
            .await
            .unwrap();

        let docs = store.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_label, "T");
        assert_eq!(docs[0].source_type, "chatgpt");
        assert_eq!(docs[0].content, "(5)-user: hi\n");
        assert!(docs[0].uid.starts_with("urn:uuid:"));
        assert_eq!(summary.documents, docs);

        let notes = reporter.notifications();
        assert_eq!(finished(&notes), vec![vec!["T".to_string()]]);
        assert_eq!(
            summary.log.lines(),
            notes.iter().map(ToString::to_string).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn empty_mapping_still_writes_a_document() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(&tmp, "empty.json", json!([{"title": "Empty", "mapping": {}}]));
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        import_file(path, &store, &reporter, &ImportConfig::default())
            .await
            .unwrap();

        let docs = store.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "");
        let notes = reporter.notifications();
        assert_eq!(finished(&notes), vec![vec!["Empty".to_string()]]);
        assert!(!notes
            .iter()
            .any(|n| matches!(n, Notification::SkippingEmpty { .. })));
    }

    #[tokio::test]
    async fn null_mapping_is_announced_then_processed() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(&tmp, "null.json", json!([{"title": "Nothing", "mapping": null}]));
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        import_file(path, &store, &reporter, &ImportConfig::default())
            .await
            .unwrap();

        let notes = reporter.notifications();
        let kinds: Vec<&str> = notes.iter().map(Notification::kind).collect();
        assert_eq!(
            kinds,
            [
                "loading",
                "loaded",
                "skipping_empty",
                "processing",
                "mapping_count",
                "writing",
                "finished"
            ]
        );
        assert_eq!(store.documents()[0].content, "");
    }

    #[tokio::test]
    async fn empty_selection_reports_no_file() {
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        let summary = import_file(
            Vec::<PathBuf>::new(),
            &store,
            &reporter,
            &ImportConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(reporter.notifications(), vec![Notification::NoFileSelected]);
        assert_eq!(summary.log.render(), "No file selected");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_and_scalar_selection_agree() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "list.json",
            json!([{"title": "List Test", "mapping": {
                "msg0": message("user", "Test message", 1234567890),
                "msg1": message("assistant", "Test response", 1234567891)
            }}]),
        );
        let options = ImportConfig {
            uid_strategy: UidStrategy::Content,
            ..ImportConfig::default()
        };

        let scalar_store = InMemoryStore::new();
        let scalar = CollectingProgress::new();
        import_file(path.clone(), &scalar_store, &scalar, &options)
            .await
            .unwrap();

        let list_store = InMemoryStore::new();
        let list = CollectingProgress::new();
        import_file(vec![path], &list_store, &list, &options)
            .await
            .unwrap();

        assert_eq!(scalar.notifications(), list.notifications());
        let strip = |store: &InMemoryStore| {
            store
                .documents()
                .into_iter()
                .map(|d| (d.uid, d.source_label, d.source_type, d.content))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(&scalar_store), strip(&list_store));
    }

    #[tokio::test]
    async fn take_first_ignores_extra_paths() {
        let tmp = TempDir::new().unwrap();
        let first = write_export(&tmp, "a.json", json!([{"title": "A", "mapping": {}}]));
        let second = write_export(&tmp, "b.json", json!([{"title": "B", "mapping": {}}]));
        let store = InMemoryStore::new();

        import_file(
            vec![first, second],
            &store,
            &NoProgress,
            &ImportConfig::default(),
        )
        .await
        .unwrap();

        let labels: Vec<String> = store.documents().into_iter().map(|d| d.source_label).collect();
        assert_eq!(labels, ["A"]);
    }

    #[tokio::test]
    async fn reject_multiple_fails_before_reading() {
        let tmp = TempDir::new().unwrap();
        let first = write_export(&tmp, "a.json", json!([{"title": "A", "mapping": {}}]));
        let second = write_export(&tmp, "b.json", json!([{"title": "B", "mapping": {}}]));
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();
        let options = ImportConfig {
            multi_file: MultiFilePolicy::RejectMultiple,
            ..ImportConfig::default()
        };

        let err = import_file(vec![first, second], &store, &reporter, &options)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("2 files selected"));
        assert!(reporter.notifications().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn finished_notifications_are_cumulative() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "multi.json",
            json!([
                {"title": "Conversation 1", "mapping": {"msg0": message("user", "First convo", 1)}},
                {"title": "Conversation 2", "mapping": {"msg0": message("user", "Second convo", 2)}},
                {"title": "Conversation 3", "mapping": null}
            ]),
        );
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        import_file(path, &store, &reporter, &ImportConfig::default())
            .await
            .unwrap();

        assert_eq!(
            finished(&reporter.notifications()),
            vec![
                vec!["Conversation 1".to_string()],
                vec!["Conversation 1".to_string(), "Conversation 2".to_string()],
                vec![
                    "Conversation 1".to_string(),
                    "Conversation 2".to_string(),
                    "Conversation 3".to_string()
                ],
            ]
        );
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn malformed_messages_are_skipped_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "missing.json",
            json!([{"title": "Missing Fields Test", "mapping": {
                "msg0": {"message": null},
                "msg1": {"message": {
                    "author": null,
                    "content": {"parts": ["No author message"]},
                    "create_time": 1234567890
                }},
                "msg2": {"message": {"author": {"role": "user"}, "create_time": 1234567891}},
                "msg3": message("user", "Valid message", 1234567892)
            }}]),
        );
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        import_file(path, &store, &reporter, &ImportConfig::default())
            .await
            .unwrap();

        assert_eq!(
            store.documents()[0].content,
            "(1234567890)-unknown: No author message\n\n(1234567892)-user: Valid message\n"
        );
        let skipped: Vec<String> = reporter
            .notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::SkippedMessage { message_id, .. } => Some(message_id),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, ["msg0", "msg2"]);
        assert!(reporter.notifications().contains(&Notification::Writing {
            title: "Missing Fields Test".into(),
            messages: 2
        }));
    }

    #[tokio::test]
    async fn roles_are_not_filtered() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "roles.json",
            json!([{"title": "Roles", "mapping": {
                "msg0": message("system", "System init", 1),
                "msg1": message("user", "Hello", 2),
                "msg2": message("assistant", "Hi there", 3)
            }}]),
        );
        let store = InMemoryStore::new();

        import_file(path, &store, &NoProgress, &ImportConfig::default())
            .await
            .unwrap();

        assert_eq!(
            store.documents()[0].content,
            "(1)-system: System init\n\n(2)-user: Hello\n\n(3)-assistant: Hi there\n"
        );
    }

    #[tokio::test]
    async fn invalid_json_fails_before_any_conversation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("invalid.json");
        std::fs::write(&path, "invalid json content").unwrap();
        let store = InMemoryStore::new();
        let reporter = CollectingProgress::new();

        let err = import_file(path.clone(), &store, &reporter, &ImportConfig::default())
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<serde_json::Error>().is_some());
        assert_eq!(
            reporter.notifications(),
            vec![Notification::Loading { path }]
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStore::new();
        let err = import_file(
            tmp.path().join("nope.json"),
            &store,
            &NoProgress,
            &ImportConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }

    #[tokio::test]
    async fn content_uids_make_reimport_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "again.json",
            json!([{"title": "Again", "mapping": {"m": message("user", "x", 1)}}]),
        );
        let store = InMemoryStore::new();
        let content = ImportConfig {
            uid_strategy: UidStrategy::Content,
            ..ImportConfig::default()
        };

        import_file(path.clone(), &store, &NoProgress, &content)
            .await
            .unwrap();
        import_file(path.clone(), &store, &NoProgress, &content)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        import_file(path, &store, &NoProgress, &ImportConfig::default())
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn content_uids_keep_identical_conversations_apart() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "new_chats.json",
            json!([
                {"title": "New chat", "mapping": {}},
                {"title": "New chat", "mapping": {}}
            ]),
        );
        let store = InMemoryStore::new();
        let content = ImportConfig {
            uid_strategy: UidStrategy::Content,
            ..ImportConfig::default()
        };

        let summary = import_file(path.clone(), &store, &NoProgress, &content)
            .await
            .unwrap();
        assert_eq!(summary.documents.len(), 2);
        assert_eq!(store.len(), summary.documents.len());

        import_file(path, &store, &NoProgress, &content)
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn stream_delivers_notifications_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            "stream.json",
            json!([
                {"title": "One", "mapping": {"m": message("user", "a", 1)}},
                {"title": "Two", "mapping": {}}
            ]),
        );
        let store = Arc::new(InMemoryStore::new());

        let (handle, mut rx) =
            stream_import(path.into(), store.clone(), ImportConfig::default());

        let mut received = Vec::new();
        while let Some(n) = rx.recv().await {
            received.push(n);
        }
        let summary = handle.await.unwrap().unwrap();

        assert_eq!(
            received.iter().map(ToString::to_string).collect::<Vec<_>>(),
            summary.log.lines()
        );
        assert_eq!(finished(&received).len(), 2);
        assert_eq!(store.len(), 2);
    }
}

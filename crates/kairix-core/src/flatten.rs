//! Conversation → transcript flattening.
//!
//! A conversation export stores messages as a mapping of message-id to
//! message node. Each node that carries a well-formed message becomes one
//! line of the form `(timestamp)-sender: text`, and the lines of one
//! conversation are joined into its transcript.
//!
//! Malformed nodes are never an error: they are dropped from the transcript.
//!
//! ```text
//! node ─▶ message ─▶ content ─▶ parts[]      required, else skipped
//!            ├─────▶ author ──▶ role        optional, "unknown"
//!            └─────▶ create_time            optional, "unknown"
//! ```

use serde_json::Value;

use crate::models::MessageMapping;

/// Placeholder for a missing sender or timestamp.
pub const UNKNOWN: &str = "unknown";

/// Flatten a single message node into one transcript line.
///
/// Returns `None` unless the node is an object whose `message` is an
/// object whose `content` is an object whose `parts` is an array of
/// strings. The returned line ends with `\n`.
pub fn flatten_message(node: &Value) -> Option<String> {
    let message = node.as_object()?.get("message")?.as_object()?;
    let parts = message
        .get("content")?
        .as_object()?
        .get("parts")?
        .as_array()?;

    let parts: Vec<&str> = parts.iter().map(Value::as_str).collect::<Option<_>>()?;
    let text = parts.join("\n");

    let sender = message
        .get("author")
        .and_then(Value::as_object)
        .and_then(|author| author.get("role"))
        .map(render_value)
        .unwrap_or_else(|| UNKNOWN.to_string());

    let timestamp = message
        .get("create_time")
        .map(render_value)
        .unwrap_or_else(|| UNKNOWN.to_string());

    Some(format!("({})-{}: {}\n", timestamp, sender, text))
}

/// `role` and `create_time` are not type-checked: strings are used
/// verbatim, anything else in its compact JSON form.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten every node of a conversation mapping, in declaration order.
pub fn flatten_conversation(mapping: &MessageMapping) -> Vec<String> {
    flatten_conversation_with(mapping, |_| {})
}

/// Like [`flatten_conversation`], calling `on_skip` with the message-id of
/// each node that did not yield a line.
pub fn flatten_conversation_with<F>(mapping: &MessageMapping, mut on_skip: F) -> Vec<String>
where
    F: FnMut(&str),
{
    let mut lines = Vec::with_capacity(mapping.len());
    for (message_id, node) in mapping {
        match flatten_message(node) {
            Some(line) => lines.push(line),
            None => on_skip(message_id),
        }
    }
    lines
}

/// Join flattened lines into a transcript.
pub fn build_transcript(lines: &[String]) -> String {
    lines.join("\n")
}

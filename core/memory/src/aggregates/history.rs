//! The History aggregate: the append-only log behind a session's Context.

use memengine_message::Message;
use serde::Deserialize;
use serde::Serialize;

/// One append-only entry in a session's History.
///
/// Invariant: `sequence` is assigned at first insert and never rewritten on
/// update. A message may be removed from Context while remaining in
/// History (`excluded_from_context`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {

    /// The full message content.
    #[serde(flatten)]
    pub message: Message,
    /// 1-based, dense position in the session's History.
    pub sequence: u64,
    /// Turn number, if the caller tracks turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<i64>,
    /// Whether this entry is a compaction summary.
    #[serde(default)]
    pub is_summary: bool,
    /// The CompactionRecord id that archived this entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_by: Option<String>,
    /// Whether this entry has been removed from the live Context.
    #[serde(default)]
    pub excluded_from_context: bool,
    /// Why this entry was excluded, when `excluded_from_context` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_reason: Option<String>,
}

impl HistoryMessage {
    /// Wrap a message as a fresh, non-excluded, non-archived History entry.
    pub fn new(message: Message, sequence: u64) -> Self {
        HistoryMessage {
            message,
            sequence,
            turn: None,
            is_summary: false,
            archived_by: None,
            excluded_from_context: false,
            excluded_reason: None,
        }
    }

    /// Apply an update to the wrapped message while preserving `sequence`
    /// and refusing any attempt to change `message_id`.
    pub fn apply_update(&mut self, mut updated: Message) {
        updated.message_id = self.message.message_id.clone();
        self.message = updated;
    }
}

/// Find the index of the most recent, non-excluded entry with the given id.
pub fn find_live_entry(history: &[HistoryMessage], message_id: &str) -> Option<usize> {
    history
        .iter()
        .rposition(|h| h.message.message_id == message_id && !h.excluded_from_context)
}

#[cfg(test)]
#[path = "history.test.rs"]
mod tests;

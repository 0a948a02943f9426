//! The CompactionRecord aggregate: one entry per compaction event.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Why a compaction was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionReason {
    /// Triggered because token usage crossed the configured threshold.
    TokenLimit,
    /// Explicitly requested by a caller.
    Manual,
    /// Triggered by an automatic policy other than the token threshold.
    Auto,
}

/// One compaction event recorded against a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionRecord {
    /// Identifier for this compaction event, stamped onto archived History
    /// entries as `archived_by`.
    pub record_id: String,
    /// The owning session.
    pub session_id: String,
    /// When the compaction ran.
    pub compacted_at: DateTime<Utc>,
    /// Non-system message count in Context before compaction.
    pub message_count_before: u64,
    /// Non-system message count in Context after compaction.
    pub message_count_after: u64,
    /// `message_id`s of History entries archived by this event.
    pub archived_message_ids: Vec<String>,
    /// `message_id` of the synthesized summary message.
    pub summary_message_id: String,
    /// Why this compaction ran.
    pub reason: CompactionReason,
    /// Estimated or reported token count before compaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count_before: Option<i64>,
    /// Estimated or reported token count after compaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count_after: Option<i64>,
}

#[cfg(test)]
#[path = "compaction.test.rs"]
mod tests;

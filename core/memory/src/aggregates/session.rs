//! The Session aggregate: a conversation's mutable lifecycle record.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The session accepts new messages.
    Active,
    /// The session is read-only but retained.
    Archived,
    /// The session is marked for removal.
    Deleted,
}

/// A conversation's mutable lifecycle record.
///
/// Invariant: exactly one [`CurrentContext`](crate::aggregates::CurrentContext)
/// exists for an active session; `total_messages` equals the length of its
/// History; `compaction_count` equals the length of its CompactionRecord list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// The aggregate root key.
    pub session_id: String,
    /// Immutable after creation: the first message of the live Context.
    pub system_prompt: String,
    /// Id of the live Context for this session.
    pub current_context_id: String,
    /// Cardinality of History, not of Context.
    pub total_messages: u64,
    /// Number of entries in the Compaction list.
    pub compaction_count: u64,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SessionData {
    /// Build a freshly created, active session.
    pub fn new(session_id: impl Into<String>, system_prompt: impl Into<String>, context_id: impl Into<String>) -> Self {
        let now = Utc::now();
        SessionData {
            session_id: session_id.into(),
            system_prompt: system_prompt.into(),
            current_context_id: context_id.into(),
            total_messages: 1,
            compaction_count: 0,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamp `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[path = "session.test.rs"]
mod tests;

//! The SubTaskRunData aggregate: bookkeeping for a spawned sub-agent run.

use chrono::DateTime;
use chrono::Utc;
use memengine_message::Message;
use serde::Deserialize;
use serde::Serialize;

/// Whether a sub-agent run executes inline or detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// The parent blocks on the run's completion.
    Foreground,
    /// The run proceeds independently; the parent polls or is notified.
    Background,
}

/// Lifecycle status of a sub-agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted but not yet started.
    Queued,
    /// Actively executing.
    Running,
    /// A cancellation has been requested but not yet observed.
    Cancelling,
    /// Cancelled before completion.
    Cancelled,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

/// Bookkeeping for a sub-agent run launched by a tool.
///
/// Invariant: persisted records never embed the child session's messages;
/// `message_count` is derived from `messages.len()` on save and `messages`
/// is stripped before write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTaskRunData {
    /// Global run identifier.
    pub run_id: String,
    /// The session that launched this run.
    pub parent_session_id: String,
    /// The session the sub-agent operates in, conventionally
    /// `"{parent_session_id}::subtask::{run_id}"`.
    pub child_session_id: String,
    /// Whether the run executes inline or detached.
    pub mode: RunMode,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Human-readable description of what the run is for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Error message, once `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of messages the child session has accumulated. Derived from
    /// `messages.len()` at save time; the field survives even though
    /// `messages` itself is stripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
    /// Transient: the child's messages, present only in memory before a
    /// save strips them. Never round-trips through storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SubTaskRunData {
    /// Build a fresh, queued run record.
    pub fn new(run_id: impl Into<String>, parent_session_id: impl Into<String>, mode: RunMode) -> Self {
        let run_id = run_id.into();
        let parent_session_id = parent_session_id.into();
        let child_session_id = format!("{parent_session_id}::subtask::{run_id}");
        let now = Utc::now();
        SubTaskRunData {
            run_id,
            parent_session_id,
            child_session_id,
            mode,
            status: RunStatus::Queued,
            description: None,
            error: None,
            message_count: None,
            messages: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derive `message_count` from `messages` and strip `messages`, as
    /// required before persisting.
    pub fn normalize_for_save(&mut self) {
        if let Some(messages) = &self.messages
            && self.message_count.is_none()
        {
            self.message_count = Some(messages.len() as u64);
        }
        self.messages = None;
    }
}

#[cfg(test)]
#[path = "subtask_run.test.rs"]
mod tests;

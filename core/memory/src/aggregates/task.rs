//! The TaskData aggregate: user-visible task records.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started.
    Pending,
    /// Actively being worked.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Abandoned without completing.
    Cancelled,
}

/// A user-visible task, global by `task_id` but filtered by `session_id`
/// in queries.
///
/// Invariant: a `task_id` belongs to exactly one `session_id` for its
/// entire lifetime; attempted reassignment is an [`InvariantViolation`](memengine_error::MemoryError::InvariantViolation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskData {
    /// Global task identifier.
    pub task_id: String,
    /// The session this task is bound to, for its whole lifetime.
    pub session_id: String,
    /// Parent task, for subtasks. `None` means top-level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
    /// Short human-readable description.
    pub subject: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Assigned owner, e.g. an agent or sub-agent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Creation timestamp; used to order task lists on save.
    pub created_at: DateTime<Utc>,
    /// Last-mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskData {
    /// Build a new pending task bound to `session_id`.
    pub fn new(task_id: impl Into<String>, session_id: impl Into<String>, subject: impl Into<String>) -> Self {
        let now = Utc::now();
        TaskData {
            task_id: task_id.into(),
            session_id: session_id.into(),
            parent_task_id: None,
            subject: subject.into(),
            status: TaskStatus::Pending,
            owner: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[path = "task.test.rs"]
mod tests;

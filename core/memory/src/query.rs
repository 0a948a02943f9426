//! Filter and pagination types for the engine's read operations.

use std::collections::HashSet;

use crate::aggregates::RunMode;
use crate::aggregates::RunStatus;
use crate::aggregates::SessionStatus;
use crate::aggregates::TaskStatus;

/// Shared pagination knobs for list operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(offset) = self.offset {
            if offset >= items.len() {
                return Vec::new();
            }
            items.drain(..offset);
        }
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
        items
    }
}

/// Filter for `querySessions`.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
}

/// Filter for `getFullHistory`.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Restrict to entries whose `message_id` is in this set.
    pub message_ids: Option<HashSet<String>>,
    /// Restrict to `sequence` within `[min, max]`, inclusive.
    pub sequence_range: Option<(u64, u64)>,
    /// `Some(true)` restricts to summary entries; `Some(false)` excludes them.
    pub include_summary: Option<bool>,
    /// Restrict to entries archived by this compaction record id.
    pub archived_by: Option<String>,
}

/// Sort/pagination options for `getFullHistory`.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQueryOptions {
    pub ascending: bool,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Default for HistoryQueryOptions {
    fn default() -> Self {
        HistoryQueryOptions {
            ascending: true,
            offset: None,
            limit: None,
        }
    }
}

/// Filter for `queryTasks`. `parent_task_id: Some(None)` means "no
/// parent"; `None` means "don't filter on parent at all".
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub session_id: Option<String>,
    pub task_id: Option<String>,
    pub parent_task_id: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

/// Filter for `querySubTaskRuns`.
#[derive(Debug, Clone, Default)]
pub struct SubTaskRunFilter {
    pub parent_session_id: Option<String>,
    pub mode: Option<RunMode>,
    pub status: Option<RunStatus>,
}

#[cfg(test)]
#[path = "query.test.rs"]
mod tests;

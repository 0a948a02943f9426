//! Task service: per-session task lists with id-collision detection.

use memengine_error::MemoryError;
use memengine_error::Result;

use crate::aggregates::TaskData;
use crate::engine::MemoryEngine;
use crate::query::QueryOptions;
use crate::query::TaskFilter;

impl MemoryEngine {
    /// Upsert `task` with `createdAt` preserved from any existing record.
    /// Fails if a record already exists with the same `task_id` but a
    /// different `session_id` — a `task_id` is bound to one session for
    /// its entire lifetime.
    pub async fn save_task(&self, task: TaskData) -> Result<()> {
        self.ensure_initialized().await?;

        let mut tasks = self.cache.tasks.write().await;

        if let Some(existing) = tasks.values().flatten().find(|t| t.task_id == task.task_id)
            && existing.session_id != task.session_id
        {
            return Err(MemoryError::InvariantViolation {
                message: "Task ID collision detected".to_string(),
            });
        }

        let mut task = task;
        if let Some(existing) = tasks.values().flatten().find(|t| t.task_id == task.task_id) {
            task.created_at = existing.created_at;
        }

        let session_id = task.session_id.clone();
        let list = tasks.entry(session_id.clone()).or_default();
        if let Some(slot) = list.iter_mut().find(|t| t.task_id == task.task_id) {
            *slot = task;
        } else {
            list.push(task);
        }
        let snapshot = list.clone();
        drop(tasks);

        self.store.tasks.save_by_session(&session_id, &snapshot).await?;
        Ok(())
    }

    /// Fetch one task by id, searching every session's list.
    pub async fn get_task(&self, task_id: &str) -> Result<Option<TaskData>> {
        self.ensure_initialized().await?;
        let tasks = self.cache.tasks.read().await;
        Ok(tasks.values().flatten().find(|t| t.task_id == task_id).cloned())
    }

    /// Filter tasks by session, id, parent, and status.
    pub async fn query_tasks(&self, filter: &TaskFilter, options: &QueryOptions) -> Result<Vec<TaskData>> {
        self.ensure_initialized().await?;
        let tasks = self.cache.tasks.read().await;
        let matched: Vec<TaskData> = tasks
            .values()
            .flatten()
            .filter(|t| filter.session_id.as_deref().is_none_or(|sid| t.session_id == sid))
            .filter(|t| filter.task_id.as_deref().is_none_or(|tid| t.task_id == tid))
            .filter(|t| match &filter.parent_task_id {
                None => true,
                Some(None) => t.parent_task_id.is_none(),
                Some(Some(parent)) => t.parent_task_id.as_deref() == Some(parent.as_str()),
            })
            .filter(|t| filter.status.is_none_or(|status| t.status == status))
            .cloned()
            .collect();
        Ok(options.apply(matched))
    }

    /// Remove a task and rewrite its session's list (deleting the file if
    /// the list becomes empty).
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.ensure_initialized().await?;
        let mut tasks = self.cache.tasks.write().await;
        let mut touched_session = None;
        for (session_id, list) in tasks.iter_mut() {
            if let Some(idx) = list.iter().position(|t| t.task_id == task_id) {
                list.remove(idx);
                touched_session = Some((session_id.clone(), list.clone()));
                break;
            }
        }
        drop(tasks);

        if let Some((session_id, snapshot)) = touched_session {
            self.store.tasks.save_by_session(&session_id, &snapshot).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "task.test.rs"]
mod tests;

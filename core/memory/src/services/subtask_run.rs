//! Sub-task-run service: per-run bookkeeping records.

use memengine_error::Result;

use crate::aggregates::SubTaskRunData;
use crate::engine::MemoryEngine;
use crate::query::QueryOptions;
use crate::query::SubTaskRunFilter;

impl MemoryEngine {
    /// Normalize `run` (derive `message_count` from `messages.len()` if
    /// absent, then strip `messages`) and persist it.
    pub async fn save_subtask_run(&self, mut run: SubTaskRunData) -> Result<()> {
        self.ensure_initialized().await?;
        run.normalize_for_save();

        self.cache
            .subtask_runs
            .write()
            .await
            .insert(run.run_id.clone(), run.clone());
        self.store.subtask_runs.save(&run.run_id, &run).await
    }

    /// Fetch one run by id.
    pub async fn get_subtask_run(&self, run_id: &str) -> Result<Option<SubTaskRunData>> {
        self.ensure_initialized().await?;
        Ok(self.cache.subtask_runs.read().await.get(run_id).cloned())
    }

    /// Filter runs by parent session, mode, and status.
    pub async fn query_subtask_runs(
        &self,
        filter: &SubTaskRunFilter,
        options: &QueryOptions,
    ) -> Result<Vec<SubTaskRunData>> {
        self.ensure_initialized().await?;
        let runs = self.cache.subtask_runs.read().await;
        let matched: Vec<SubTaskRunData> = runs
            .values()
            .filter(|r| {
                filter
                    .parent_session_id
                    .as_deref()
                    .is_none_or(|sid| r.parent_session_id == sid)
            })
            .filter(|r| filter.mode.is_none_or(|mode| r.mode == mode))
            .filter(|r| filter.status.is_none_or(|status| r.status == status))
            .cloned()
            .collect();
        Ok(options.apply(matched))
    }

    /// Remove one run record.
    pub async fn delete_subtask_run(&self, run_id: &str) -> Result<()> {
        self.ensure_initialized().await?;
        self.cache.subtask_runs.write().await.remove(run_id);
        self.store.subtask_runs.delete(run_id).await
    }
}

#[cfg(test)]
#[path = "subtask_run.test.rs"]
mod tests;

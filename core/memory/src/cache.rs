//! In-memory mirror of every loaded aggregate.
//!
//! The cache is the engine's operational state; the store is the
//! durability layer. All reads serve from cache; all writes update cache
//! first, then fan out to the store. Callers outside the orchestrator
//! services never touch this directly — encapsulation is what keeps the
//! cache-store pair consistent.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;

/// The six in-memory maps mirroring the store bundle's six ports.
#[derive(Default)]
pub struct Cache {
    pub sessions: RwLock<HashMap<String, SessionData>>,
    pub contexts: RwLock<HashMap<String, CurrentContext>>,
    pub histories: RwLock<HashMap<String, Vec<HistoryMessage>>>,
    pub compactions: RwLock<HashMap<String, Vec<CompactionRecord>>>,
    pub tasks: RwLock<HashMap<String, Vec<TaskData>>>,
    pub subtask_runs: RwLock<HashMap<String, SubTaskRunData>>,
}

impl Cache {
    pub fn new() -> Self {
        Cache::default()
    }

    /// Replace all six maps from a freshly loaded snapshot. Used only by
    /// bootstrap, before any caller can observe the cache.
    pub async fn hydrate(
        &self,
        sessions: HashMap<String, SessionData>,
        contexts: HashMap<String, CurrentContext>,
        histories: HashMap<String, Vec<HistoryMessage>>,
        compactions: HashMap<String, Vec<CompactionRecord>>,
        tasks: HashMap<String, Vec<TaskData>>,
        subtask_runs: HashMap<String, SubTaskRunData>,
    ) {
        *self.sessions.write().await = sessions;
        *self.contexts.write().await = contexts;
        *self.histories.write().await = histories;
        *self.compactions.write().await = compactions;
        *self.tasks.write().await = tasks;
        *self.subtask_runs.write().await = subtask_runs;
    }
}

#[cfg(test)]
#[path = "cache.test.rs"]
mod tests;

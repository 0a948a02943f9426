//! Tiered adapter: routes each aggregate to exactly one of up to three
//! tier bundles (short-term, mid-term, long-term).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use memengine_error::Result;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;
use crate::store::StoreBundle;
use crate::store::ports::CompactionStorePort;
use crate::store::ports::ContextStorePort;
use crate::store::ports::HistoryStorePort;
use crate::store::ports::SessionStorePort;
use crate::store::ports::SubTaskRunStorePort;
use crate::store::ports::TaskStorePort;

/// Which tier bundle an aggregate's reads and writes route through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    ShortTerm,
    MidTerm,
    LongTerm,
}

/// Per-aggregate tier assignment. Defaults match the spec's routing:
/// Context goes to the hottest, cheapest-to-rebuild tier; everything else
/// goes to mid-term, where durability matters. Long-term is instantiated
/// but only used when a caller opts a specific aggregate into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRouting {
    pub session: Tier,
    pub context: Tier,
    pub history: Tier,
    pub compaction: Tier,
    pub task: Tier,
    pub subtask_run: Tier,
}

impl Default for TierRouting {
    fn default() -> Self {
        TierRouting {
            session: Tier::MidTerm,
            context: Tier::ShortTerm,
            history: Tier::MidTerm,
            compaction: Tier::MidTerm,
            task: Tier::MidTerm,
            subtask_run: Tier::MidTerm,
        }
    }
}

/// Composes up to three tier bundles and routes each aggregate to exactly
/// one. Bundles assigned to multiple aggregates are only `close()`d once,
/// since the same underlying bundle may back more than one tier.
pub struct TieredAdapter {
    short_term: Arc<StoreBundle>,
    mid_term: Arc<StoreBundle>,
    long_term: Arc<StoreBundle>,
    routing: TierRouting,
}

impl TieredAdapter {
    /// Build a tiered adapter. `long_term` is still constructed even when no
    /// aggregate routes to it by default, since a caller may override
    /// routing to opt an aggregate in.
    pub fn new(
        short_term: Arc<StoreBundle>,
        mid_term: Arc<StoreBundle>,
        long_term: Arc<StoreBundle>,
        routing: TierRouting,
    ) -> Self {
        TieredAdapter {
            short_term,
            mid_term,
            long_term,
            routing,
        }
    }

    fn bundle_for(&self, tier: Tier) -> &StoreBundle {
        match tier {
            Tier::ShortTerm => &self.short_term,
            Tier::MidTerm => &self.mid_term,
            Tier::LongTerm => &self.long_term,
        }
    }

    /// The distinct underlying bundles, deduplicated by pointer identity, so
    /// `close()` never closes a shared bundle twice.
    pub fn distinct_bundles(&self) -> Vec<Arc<StoreBundle>> {
        let candidates = [&self.short_term, &self.mid_term, &self.long_term];
        let mut out: Vec<Arc<StoreBundle>> = Vec::new();
        for bundle in candidates {
            if !out.iter().any(|seen| Arc::ptr_eq(seen, bundle)) {
                out.push(Arc::clone(bundle));
            }
        }
        out
    }
}

#[async_trait]
impl SessionStorePort for TieredAdapter {
    async fn prepare(&self) -> Result<()> {
        self.bundle_for(self.routing.session).sessions.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, SessionData>> {
        self.bundle_for(self.routing.session).sessions.load_all().await
    }

    async fn save(&self, session_id: &str, value: &SessionData) -> Result<()> {
        self.bundle_for(self.routing.session).sessions.save(session_id, value).await
    }
}

#[async_trait]
impl ContextStorePort for TieredAdapter {
    async fn prepare(&self) -> Result<()> {
        self.bundle_for(self.routing.context).contexts.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, CurrentContext>> {
        self.bundle_for(self.routing.context).contexts.load_all().await
    }

    async fn save(&self, session_id: &str, value: &CurrentContext) -> Result<()> {
        self.bundle_for(self.routing.context).contexts.save(session_id, value).await
    }
}

#[async_trait]
impl HistoryStorePort for TieredAdapter {
    async fn prepare(&self) -> Result<()> {
        self.bundle_for(self.routing.history).histories.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<HistoryMessage>>> {
        self.bundle_for(self.routing.history).histories.load_all().await
    }

    async fn save(&self, session_id: &str, value: &[HistoryMessage]) -> Result<()> {
        self.bundle_for(self.routing.history).histories.save(session_id, value).await
    }
}

#[async_trait]
impl CompactionStorePort for TieredAdapter {
    async fn prepare(&self) -> Result<()> {
        self.bundle_for(self.routing.compaction).compactions.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<CompactionRecord>>> {
        self.bundle_for(self.routing.compaction).compactions.load_all().await
    }

    async fn save(&self, session_id: &str, value: &[CompactionRecord]) -> Result<()> {
        self.bundle_for(self.routing.compaction)
            .compactions
            .save(session_id, value)
            .await
    }
}

#[async_trait]
impl TaskStorePort for TieredAdapter {
    async fn prepare(&self) -> Result<()> {
        self.bundle_for(self.routing.task).tasks.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<TaskData>>> {
        self.bundle_for(self.routing.task).tasks.load_all().await
    }

    async fn save_by_session(&self, session_id: &str, tasks: &[TaskData]) -> Result<()> {
        self.bundle_for(self.routing.task)
            .tasks
            .save_by_session(session_id, tasks)
            .await
    }
}

#[async_trait]
impl SubTaskRunStorePort for TieredAdapter {
    async fn prepare(&self) -> Result<()> {
        self.bundle_for(self.routing.subtask_run).subtask_runs.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, SubTaskRunData>> {
        self.bundle_for(self.routing.subtask_run).subtask_runs.load_all().await
    }

    async fn save(&self, run_id: &str, value: &SubTaskRunData) -> Result<()> {
        self.bundle_for(self.routing.subtask_run)
            .subtask_runs
            .save(run_id, value)
            .await
    }

    async fn delete(&self, run_id: &str) -> Result<()> {
        self.bundle_for(self.routing.subtask_run).subtask_runs.delete(run_id).await
    }
}

#[cfg(test)]
#[path = "tiered.test.rs"]
mod tests;

//! Store bundle: one port trait per aggregate.
//!
//! Every port exposes `prepare()` (idempotent resource setup), `load_all()`
//! (a snapshot the caller may freely mutate), and a save operation. `close()`
//! lives on [`StoreBundle`] rather than per-port, since tiers may share an
//! underlying bundle and closing must be deduplicated by identity.

use std::collections::HashMap;

use async_trait::async_trait;
use memengine_error::Result;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;

/// Port for the Session aggregate.
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    /// Idempotent resource setup (e.g. ensure a directory exists).
    async fn prepare(&self) -> Result<()>;
    /// Load every persisted Session, keyed by `session_id`.
    async fn load_all(&self) -> Result<HashMap<String, SessionData>>;
    /// Persist one Session.
    async fn save(&self, session_id: &str, value: &SessionData) -> Result<()>;
}

/// Port for the Context aggregate.
#[async_trait]
pub trait ContextStorePort: Send + Sync {
    async fn prepare(&self) -> Result<()>;
    /// Load every persisted Context, keyed by `session_id`.
    async fn load_all(&self) -> Result<HashMap<String, CurrentContext>>;
    /// Persist one Context.
    async fn save(&self, session_id: &str, value: &CurrentContext) -> Result<()>;
}

/// Port for the History aggregate.
#[async_trait]
pub trait HistoryStorePort: Send + Sync {
    async fn prepare(&self) -> Result<()>;
    /// Load every persisted History list, keyed by `session_id`.
    async fn load_all(&self) -> Result<HashMap<String, Vec<HistoryMessage>>>;
    /// Persist one session's full History list.
    async fn save(&self, session_id: &str, value: &[HistoryMessage]) -> Result<()>;
}

/// Port for the CompactionRecord aggregate.
#[async_trait]
pub trait CompactionStorePort: Send + Sync {
    async fn prepare(&self) -> Result<()>;
    /// Load every persisted Compaction list, keyed by `session_id`.
    async fn load_all(&self) -> Result<HashMap<String, Vec<CompactionRecord>>>;
    /// Persist one session's full Compaction list.
    async fn save(&self, session_id: &str, value: &[CompactionRecord]) -> Result<()>;
}

/// Port for the Task aggregate. Tasks persist one list per session, not
/// one file per task.
#[async_trait]
pub trait TaskStorePort: Send + Sync {
    async fn prepare(&self) -> Result<()>;
    /// Load every persisted Task list, keyed by `session_id`.
    async fn load_all(&self) -> Result<HashMap<String, Vec<TaskData>>>;
    /// Replace the full Task list for one session. An empty list deletes
    /// the underlying record.
    async fn save_by_session(&self, session_id: &str, tasks: &[TaskData]) -> Result<()>;
}

/// Port for the SubTaskRunData aggregate.
#[async_trait]
pub trait SubTaskRunStorePort: Send + Sync {
    async fn prepare(&self) -> Result<()>;
    /// Load every persisted run, keyed by `run_id`.
    async fn load_all(&self) -> Result<HashMap<String, SubTaskRunData>>;
    /// Persist one run record (with `messages` already stripped).
    async fn save(&self, run_id: &str, value: &SubTaskRunData) -> Result<()>;
    /// Remove one run record. Idempotent.
    async fn delete(&self, run_id: &str) -> Result<()>;
}

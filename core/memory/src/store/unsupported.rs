//! Uniform "not implemented" shape for a declared-but-unbuilt backend type.

use std::collections::HashMap;

use async_trait::async_trait;
use memengine_error::MemoryError;
use memengine_error::Result;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;
use crate::store::ports::CompactionStorePort;
use crate::store::ports::ContextStorePort;
use crate::store::ports::HistoryStorePort;
use crate::store::ports::SessionStorePort;
use crate::store::ports::SubTaskRunStorePort;
use crate::store::ports::TaskStorePort;

/// Stands in for a configured-but-not-yet-implemented backend (e.g. a
/// planned `redis` or `sqlite` adapter type). Every operation fails with
/// [`MemoryError::BackendUnsupported`] naming the backend.
pub struct UnsupportedAdapter {
    backend: String,
}

impl UnsupportedAdapter {
    /// `backend` names the configured adapter type, surfaced in every error.
    pub fn new(backend: impl Into<String>) -> Self {
        UnsupportedAdapter { backend: backend.into() }
    }

    fn unsupported<T>(&self, operation: &str) -> Result<T> {
        Err(MemoryError::BackendUnsupported {
            backend: self.backend.clone(),
            message: format!("`{operation}` is not implemented for backend `{}`", self.backend),
        })
    }
}

#[async_trait]
impl SessionStorePort for UnsupportedAdapter {
    async fn prepare(&self) -> Result<()> {
        self.unsupported("prepare")
    }

    async fn load_all(&self) -> Result<HashMap<String, SessionData>> {
        self.unsupported("load_all")
    }

    async fn save(&self, _session_id: &str, _value: &SessionData) -> Result<()> {
        self.unsupported("save")
    }
}

#[async_trait]
impl ContextStorePort for UnsupportedAdapter {
    async fn prepare(&self) -> Result<()> {
        self.unsupported("prepare")
    }

    async fn load_all(&self) -> Result<HashMap<String, CurrentContext>> {
        self.unsupported("load_all")
    }

    async fn save(&self, _session_id: &str, _value: &CurrentContext) -> Result<()> {
        self.unsupported("save")
    }
}

#[async_trait]
impl HistoryStorePort for UnsupportedAdapter {
    async fn prepare(&self) -> Result<()> {
        self.unsupported("prepare")
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<HistoryMessage>>> {
        self.unsupported("load_all")
    }

    async fn save(&self, _session_id: &str, _value: &[HistoryMessage]) -> Result<()> {
        self.unsupported("save")
    }
}

#[async_trait]
impl CompactionStorePort for UnsupportedAdapter {
    async fn prepare(&self) -> Result<()> {
        self.unsupported("prepare")
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<CompactionRecord>>> {
        self.unsupported("load_all")
    }

    async fn save(&self, _session_id: &str, _value: &[CompactionRecord]) -> Result<()> {
        self.unsupported("save")
    }
}

#[async_trait]
impl TaskStorePort for UnsupportedAdapter {
    async fn prepare(&self) -> Result<()> {
        self.unsupported("prepare")
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<TaskData>>> {
        self.unsupported("load_all")
    }

    async fn save_by_session(&self, _session_id: &str, _tasks: &[TaskData]) -> Result<()> {
        self.unsupported("save_by_session")
    }
}

#[async_trait]
impl SubTaskRunStorePort for UnsupportedAdapter {
    async fn prepare(&self) -> Result<()> {
        self.unsupported("prepare")
    }

    async fn load_all(&self) -> Result<HashMap<String, SubTaskRunData>> {
        self.unsupported("load_all")
    }

    async fn save(&self, _run_id: &str, _value: &SubTaskRunData) -> Result<()> {
        self.unsupported("save")
    }

    async fn delete(&self, _run_id: &str) -> Result<()> {
        self.unsupported("delete")
    }
}

#[cfg(test)]
#[path = "unsupported.test.rs"]
mod tests;

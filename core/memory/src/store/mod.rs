//! Storage adapters: ports, concrete backends, and the bundle that wires
//! six per-aggregate adapters together behind one `close()`.

pub mod document;
pub mod file;
pub mod ports;
pub mod tiered;
pub mod unsupported;

use std::sync::Arc;

use async_trait::async_trait;
use memengine_error::Result;

pub use document::DEFAULT_COLLECTION_PREFIX;
pub use document::DEFAULT_DATABASE;
pub use document::DocumentAdapter;
pub use document::DocumentAdapterConfig;
pub use document::DocumentAdapterOptions;
pub use document::DocumentDriver;
pub use file::FileAdapter;
pub use ports::CompactionStorePort;
pub use ports::ContextStorePort;
pub use ports::HistoryStorePort;
pub use ports::SessionStorePort;
pub use ports::SubTaskRunStorePort;
pub use ports::TaskStorePort;
pub use tiered::Tier;
pub use tiered::TieredAdapter;
pub use tiered::TierRouting;
pub use unsupported::UnsupportedAdapter;

/// Releases whatever resources a concrete adapter holds (connections, file
/// handles). The file and unsupported adapters hold none, so their `close`
/// is a no-op; a document adapter's driver owns its own connection
/// lifecycle, so closing it here is also a no-op by default — callers that
/// need an explicit disconnect wire it into their `DocumentDriver`.
#[async_trait]
pub trait Closer: Send + Sync {
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl Closer for FileAdapter {
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Closer for UnsupportedAdapter {
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Closer for DocumentAdapter {
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Closer for TieredAdapter {
    async fn close(&self) -> Result<()> {
        for bundle in self.distinct_bundles() {
            bundle.close().await?;
        }
        Ok(())
    }
}

/// A set of six per-aggregate adapters plus a shared `close()`.
///
/// Load operations return snapshots the caller may freely mutate; nothing
/// in this crate hands out a reference into an adapter's own state.
#[derive(Clone)]
pub struct StoreBundle {
    pub sessions: Arc<dyn SessionStorePort>,
    pub contexts: Arc<dyn ContextStorePort>,
    pub histories: Arc<dyn HistoryStorePort>,
    pub compactions: Arc<dyn CompactionStorePort>,
    pub tasks: Arc<dyn TaskStorePort>,
    pub subtask_runs: Arc<dyn SubTaskRunStorePort>,
    closer: Arc<dyn Closer>,
}

impl StoreBundle {
    /// Build a bundle backed by a single adapter that implements every
    /// port (the file, unsupported, and tiered adapters all do).
    pub fn single<A>(adapter: Arc<A>) -> Self
    where
        A: SessionStorePort
            + ContextStorePort
            + HistoryStorePort
            + CompactionStorePort
            + TaskStorePort
            + SubTaskRunStorePort
            + Closer
            + 'static,
    {
        StoreBundle {
            sessions: adapter.clone(),
            contexts: adapter.clone(),
            histories: adapter.clone(),
            compactions: adapter.clone(),
            tasks: adapter.clone(),
            subtask_runs: adapter.clone(),
            closer: adapter,
        }
    }

    /// Build a bundle from independently-chosen adapters per port, e.g. to
    /// mix a custom port implementation with file adapters for the rest
    /// (tests exercising a single port in isolation do this).
    pub fn custom(
        sessions: Arc<dyn SessionStorePort>,
        contexts: Arc<dyn ContextStorePort>,
        histories: Arc<dyn HistoryStorePort>,
        compactions: Arc<dyn CompactionStorePort>,
        tasks: Arc<dyn TaskStorePort>,
        subtask_runs: Arc<dyn SubTaskRunStorePort>,
        closer: Arc<dyn Closer>,
    ) -> Self {
        StoreBundle {
            sessions,
            contexts,
            histories,
            compactions,
            tasks,
            subtask_runs,
            closer,
        }
    }

    /// Convenience: a file-backed bundle rooted at `base_path`.
    pub fn file(base_path: impl Into<std::path::PathBuf>) -> Self {
        StoreBundle::single(Arc::new(FileAdapter::new(base_path)))
    }

    /// Convenience: a document-store-backed bundle.
    pub fn document(
        driver: Arc<dyn DocumentDriver>,
        database: impl Into<String>,
        collection_prefix: impl Into<String>,
    ) -> Self {
        StoreBundle::single(Arc::new(DocumentAdapter::new(driver, database, collection_prefix)))
    }

    /// Convenience: a bundle whose every operation reports
    /// `BackendUnsupported` for a declared-but-unbuilt backend type.
    pub fn unsupported(backend: impl Into<String>) -> Self {
        StoreBundle::single(Arc::new(UnsupportedAdapter::new(backend)))
    }

    /// Call `prepare()` on all six ports.
    pub async fn prepare_all(&self) -> Result<()> {
        self.sessions.prepare().await?;
        self.contexts.prepare().await?;
        self.histories.prepare().await?;
        self.compactions.prepare().await?;
        self.tasks.prepare().await?;
        self.subtask_runs.prepare().await?;
        Ok(())
    }

    /// Release every adapter's resources.
    pub async fn close(&self) -> Result<()> {
        self.closer.close().await
    }
}

#[cfg(test)]
#[path = "mod.test.rs"]
mod tests;

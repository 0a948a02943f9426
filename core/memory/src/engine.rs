//! The memory engine: cache + store bundle + concurrent-initialization
//! discipline.

use memengine_error::MemoryError;
use memengine_error::Result;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::bootstrap;
use crate::cache::Cache;
use crate::store::StoreBundle;

/// The durable, concurrency-safe source of truth for session Context,
/// History, Compaction, Task, and SubTaskRun state.
///
/// `initialize()` is idempotent and safe under concurrent callers: a
/// double-checked read of `initialized` short-circuits the common case,
/// and `init_lock` serializes the rare concurrent cold-start so the
/// bootstrap pass runs exactly once no matter how many sub-agents race
/// into it.
pub struct MemoryEngine {
    pub(crate) store: StoreBundle,
    pub(crate) cache: Cache,
    initialized: RwLock<bool>,
    init_lock: Mutex<()>,
}

impl MemoryEngine {
    /// Build an engine over `store`. No I/O happens until `initialize()`.
    pub fn new(store: StoreBundle) -> Self {
        MemoryEngine {
            store,
            cache: Cache::new(),
            initialized: RwLock::new(false),
            init_lock: Mutex::new(()),
        }
    }

    /// Run the one-shot bootstrap if it has not already run. Concurrent
    /// callers all resolve successfully once the single bootstrap
    /// completes.
    pub async fn initialize(&self) -> Result<()> {
        if *self.initialized.read().await {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if *self.initialized.read().await {
            return Ok(());
        }
        bootstrap::bootstrap(&self.store, &self.cache).await?;
        *self.initialized.write().await = true;
        Ok(())
    }

    /// Safe entry point for callers that did not start initialization
    /// themselves (e.g. a sub-agent sharing the parent's engine instance):
    /// returns immediately if already initialized, otherwise runs it.
    pub async fn wait_for_initialization(&self) -> Result<()> {
        self.initialize().await
    }

    /// Await any in-flight initialization (ignoring its error), close the
    /// store bundle, then mark the engine uninitialized so it can be
    /// re-initialized later.
    pub async fn close(&self) -> Result<()> {
        let _ = self.init_lock.lock().await;
        self.store.close().await?;
        *self.initialized.write().await = false;
        Ok(())
    }

    /// Whether `initialize()` has completed.
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    pub(crate) async fn ensure_initialized(&self) -> Result<()> {
        if *self.initialized.read().await {
            Ok(())
        } else {
            Err(MemoryError::NotInitialized)
        }
    }
}

#[cfg(test)]
#[path = "engine.test.rs"]
mod tests;

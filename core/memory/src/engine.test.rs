use super::*;
use crate::store::FileAdapter;
use crate::store::SessionStorePort;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tempfile::tempdir;

/// Wraps a [`FileAdapter`]'s session port to count `load_all()` calls, so
/// the concurrent-cold-start test can observe that bootstrap's directory
/// scan really runs only once.
struct CountingSessions {
    inner: FileAdapter,
    load_all_calls: AtomicUsize,
}

#[async_trait]
impl SessionStorePort for CountingSessions {
    async fn prepare(&self) -> Result<()> {
        SessionStorePort::prepare(&self.inner).await
    }

    async fn load_all(&self) -> Result<HashMap<String, crate::aggregates::SessionData>> {
        self.load_all_calls.fetch_add(1, Ordering::SeqCst);
        SessionStorePort::load_all(&self.inner).await
    }

    async fn save(&self, session_id: &str, value: &crate::aggregates::SessionData) -> Result<()> {
        SessionStorePort::save(&self.inner, session_id, value).await
    }
}

#[tokio::test]
async fn concurrent_initialize_calls_run_bootstrap_exactly_once() {
    let dir = tempdir().expect("tempdir");
    let file = FileAdapter::new(dir.path());
    let counting = Arc::new(CountingSessions {
        inner: file.clone(),
        load_all_calls: AtomicUsize::new(0),
    });
    let file_bundle_base = Arc::new(file);

    let store = StoreBundle::custom(
        counting.clone(),
        file_bundle_base.clone(),
        file_bundle_base.clone(),
        file_bundle_base.clone(),
        file_bundle_base.clone(),
        file_bundle_base.clone(),
        file_bundle_base.clone(),
    );
    let engine = Arc::new(MemoryEngine::new(store));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.initialize().await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("join").expect("initialize succeeds");
    }

    assert_eq!(counting.load_all_calls.load(Ordering::SeqCst), 1);
    assert!(engine.is_initialized().await);
}

#[tokio::test]
async fn close_allows_reinitialization() {
    let dir = tempdir().expect("tempdir");
    let store = StoreBundle::file(dir.path());
    let engine = MemoryEngine::new(store);

    engine.initialize().await.expect("first init");
    engine.close().await.expect("close");
    assert!(!engine.is_initialized().await);

    engine.initialize().await.expect("second init");
    assert!(engine.is_initialized().await);
}

use std::sync::Arc;

use tempfile::tempdir;

use super::*;
use crate::aggregates::SessionData;

fn file_bundle(dir: &std::path::Path) -> Arc<StoreBundle> {
    Arc::new(StoreBundle::file(dir))
}

#[tokio::test]
async fn session_port_routes_to_mid_term_by_default() {
    let short_dir = tempdir().expect("short tempdir");
    let mid_dir = tempdir().expect("mid tempdir");
    let long_dir = tempdir().expect("long tempdir");
    let adapter = TieredAdapter::new(
        file_bundle(short_dir.path()),
        file_bundle(mid_dir.path()),
        file_bundle(long_dir.path()),
        TierRouting::default(),
    );
    SessionStorePort::prepare(&adapter).await.expect("prepare");

    let session = SessionData::new("s1", "be helpful", "c1");
    SessionStorePort::save(&adapter, "s1", &session).await.expect("save");

    assert!(mid_dir.path().join("sessions/s1.json").exists());
    assert!(!short_dir.path().join("sessions/s1.json").exists());
    assert!(!long_dir.path().join("sessions/s1.json").exists());

    let loaded = SessionStorePort::load_all(&adapter).await.expect("load_all");
    assert_eq!(loaded.len(), 1);
}

#[tokio::test]
async fn context_port_routes_to_short_term_by_default() {
    let short_dir = tempdir().expect("short tempdir");
    let mid_dir = tempdir().expect("mid tempdir");
    let long_dir = tempdir().expect("long tempdir");
    let adapter = TieredAdapter::new(
        file_bundle(short_dir.path()),
        file_bundle(mid_dir.path()),
        file_bundle(long_dir.path()),
        TierRouting::default(),
    );
    ContextStorePort::prepare(&adapter).await.expect("prepare");

    let context = CurrentContext::new("s1".to_string(), "c1".to_string(), "be helpful".to_string());
    ContextStorePort::save(&adapter, "s1", &context).await.expect("save");

    assert!(short_dir.path().join("contexts/s1.json").exists());
    assert!(!mid_dir.path().join("contexts/s1.json").exists());
}

#[tokio::test]
async fn distinct_bundles_dedupes_shared_tier_pointers() {
    let dir = tempdir().expect("tempdir");
    let shared = file_bundle(dir.path());
    let long_dir = tempdir().expect("long tempdir");
    let adapter = TieredAdapter::new(
        Arc::clone(&shared),
        Arc::clone(&shared),
        file_bundle(long_dir.path()),
        TierRouting::default(),
    );
    assert_eq!(adapter.distinct_bundles().len(), 2);
}

#[tokio::test]
async fn routing_override_sends_session_to_long_term() {
    let short_dir = tempdir().expect("short tempdir");
    let mid_dir = tempdir().expect("mid tempdir");
    let long_dir = tempdir().expect("long tempdir");
    let routing = TierRouting {
        session: Tier::LongTerm,
        ..TierRouting::default()
    };
    let adapter = TieredAdapter::new(
        file_bundle(short_dir.path()),
        file_bundle(mid_dir.path()),
        file_bundle(long_dir.path()),
        routing,
    );
    SessionStorePort::prepare(&adapter).await.expect("prepare");
    let session = SessionData::new("s1", "be helpful", "c1");
    SessionStorePort::save(&adapter, "s1", &session).await.expect("save");

    assert!(long_dir.path().join("sessions/s1.json").exists());
    assert!(!mid_dir.path().join("sessions/s1.json").exists());
}

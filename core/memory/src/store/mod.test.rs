use super::*;
use crate::aggregates::SessionData;
use tempfile::tempdir;

#[tokio::test]
async fn file_bundle_prepares_and_closes() {
    let dir = tempdir().expect("tempdir");
    let bundle = StoreBundle::file(dir.path());
    bundle.prepare_all().await.expect("prepare_all");
    bundle.close().await.expect("close");
}

#[tokio::test]
async fn tiered_bundle_routes_context_to_short_term_and_rest_to_mid_term() {
    let short_dir = tempdir().expect("short tempdir");
    let mid_dir = tempdir().expect("mid tempdir");
    let long_dir = tempdir().expect("long tempdir");

    let short = Arc::new(StoreBundle::file(short_dir.path()));
    let mid = Arc::new(StoreBundle::file(mid_dir.path()));
    let long = Arc::new(StoreBundle::file(long_dir.path()));

    let tiered = Arc::new(TieredAdapter::new(short, mid, long, TierRouting::default()));
    let bundle = StoreBundle::single(tiered);
    bundle.prepare_all().await.expect("prepare_all");

    let session = SessionData::new("s1", "p", "ctx-1");
    bundle.sessions.save("s1", &session).await.expect("save session");
    bundle
        .contexts
        .save("s1", &crate::aggregates::CurrentContext::new("s1", "ctx-1", "p"))
        .await
        .expect("save context");

    assert!(
        tokio::fs::try_exists(short_dir.path().join("contexts").join("s1.json"))
            .await
            .unwrap_or(false)
    );
    assert!(
        tokio::fs::try_exists(mid_dir.path().join("sessions").join("s1.json"))
            .await
            .unwrap_or(false)
    );
    assert!(
        !tokio::fs::try_exists(long_dir.path().join("sessions").join("s1.json"))
            .await
            .unwrap_or(false)
    );
    assert!(
        !tokio::fs::try_exists(mid_dir.path().join("contexts").join("s1.json"))
            .await
            .unwrap_or(false)
    );
}

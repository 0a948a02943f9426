use super::*;
use crate::aggregates::SessionData;

#[tokio::test]
async fn hydrate_replaces_all_six_maps() {
    let cache = Cache::new();
    let mut sessions = HashMap::new();
    sessions.insert("s1".to_string(), SessionData::new("s1", "p", "ctx-1"));

    cache
        .hydrate(
            sessions,
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
        )
        .await;

    assert_eq!(cache.sessions.read().await.len(), 1);
    assert!(cache.contexts.read().await.is_empty());
}

use super::*;
use memengine_message::Message;
use tempfile::tempdir;

#[tokio::test]
async fn synthesizes_context_from_orphaned_history() {
    let dir = tempdir().expect("tempdir");
    let store = StoreBundle::file(dir.path());
    store.prepare_all().await.expect("prepare");

    let session = SessionData::new("s1", "hello system", "missing-ctx");
    store.sessions.save("s1", &session).await.expect("save session");

    let history = vec![
        HistoryMessage::new(Message::system("hello system"), 1),
        HistoryMessage::new(Message::user("hi"), 2),
    ];
    store.histories.save("s1", &history).await.expect("save history");

    let cache = Cache::new();
    bootstrap(&store, &cache).await.expect("bootstrap");

    let contexts = cache.contexts.read().await;
    let context = contexts.get("s1").expect("context synthesized");
    assert_eq!(context.messages.len(), 2);
    assert_eq!(context.messages[0].role, memengine_message::Role::System);
}

#[tokio::test]
async fn synthesizes_history_from_context_with_turn_zero_on_system() {
    let dir = tempdir().expect("tempdir");
    let store = StoreBundle::file(dir.path());
    store.prepare_all().await.expect("prepare");

    let session = SessionData::new("s1", "p", "ctx-1");
    store.sessions.save("s1", &session).await.expect("save session");
    let mut context = CurrentContext::new("s1", "ctx-1", "p");
    context.messages.push(Message::user("hi"));
    store.contexts.save("s1", &context).await.expect("save context");

    let cache = Cache::new();
    bootstrap(&store, &cache).await.expect("bootstrap");

    let histories = cache.histories.read().await;
    let history = histories.get("s1").expect("history synthesized");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].turn, Some(0));
    assert_eq!(history[0].sequence, 1);
    assert_eq!(history[1].sequence, 2);
}

#[tokio::test]
async fn missing_compaction_list_becomes_empty() {
    let dir = tempdir().expect("tempdir");
    let store = StoreBundle::file(dir.path());
    store.prepare_all().await.expect("prepare");

    let session = SessionData::new("s1", "p", "ctx-1");
    store.sessions.save("s1", &session).await.expect("save session");
    let context = CurrentContext::new("s1", "ctx-1", "p");
    store.contexts.save("s1", &context).await.expect("save context");
    store
        .histories
        .save("s1", &[HistoryMessage::new(Message::system("p"), 1)])
        .await
        .expect("save history");

    let cache = Cache::new();
    bootstrap(&store, &cache).await.expect("bootstrap");

    assert!(cache.compactions.read().await.get("s1").is_some());
}

use super::*;
use crate::engine::MemoryEngine;
use crate::store::StoreBundle;
use tempfile::tempdir;

async fn engine_with_temp_store() -> (MemoryEngine, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let engine = MemoryEngine::new(StoreBundle::file(dir.path()));
    engine.initialize().await.expect("initialize");
    (engine, dir)
}

#[tokio::test]
async fn create_session_fails_on_duplicate_id() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine
        .create_session(Some("s1".to_string()), "p")
        .await
        .expect("first create");
    let err = engine
        .create_session(Some("s1".to_string()), "p")
        .await
        .expect_err("second create should collide");
    assert!(matches!(err, MemoryError::AlreadyExists { .. }));
}

#[tokio::test]
async fn scenario_a_streamed_assistant_usage_sync() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.create_session(Some("s1".to_string()), "p").await.expect("create");

    let mut partial = Message::assistant("partial");
    partial.message_id = "a1".to_string();
    engine
        .add_message_to_context("s1", partial, AddMessageOptions::default())
        .await
        .expect("add partial");

    let mut finalized = Message::assistant("final");
    finalized.message_id = "a1".to_string();
    finalized.finish_reason = Some("stop".to_string());
    finalized.usage = Some(memengine_message::Usage {
        total_tokens: Some(28),
        prompt_tokens: Some(14),
        completion_tokens: Some(14),
    });
    engine
        .add_message_to_context("s1", finalized, AddMessageOptions::default())
        .await
        .expect("add final");

    let history = engine
        .get_full_history(
            "s1",
            &HistoryFilter {
                message_ids: Some(["a1".to_string()].into_iter().collect()),
                ..Default::default()
            },
            &HistoryQueryOptions::default(),
        )
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message.content.to_plain_text(), "final");
    assert_eq!(history[0].message.usage.expect("usage").total_tokens, Some(28));

    let context = engine.get_current_context("s1").await.expect("context").expect("present");
    let a1 = context.messages.iter().find(|m| m.message_id == "a1").expect("a1 present");
    assert_eq!(a1.content.to_plain_text(), "final");
    assert_eq!(context.non_system_messages().len(), 1);
}

#[tokio::test]
async fn scenario_b_removal_preserves_history_with_reason() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.create_session(Some("s1".to_string()), "p").await.expect("create");

    let mut u1 = Message::user("hello");
    u1.message_id = "u1".to_string();
    engine
        .add_message_to_context("s1", u1, AddMessageOptions::default())
        .await
        .expect("add u1");

    let mut a2 = Message::assistant("");
    a2.message_id = "a2".to_string();
    engine
        .add_message_to_context("s1", a2, AddMessageOptions::default())
        .await
        .expect("add a2");

    let removed = engine
        .remove_message_from_context("s1", "a2", "manual")
        .await
        .expect("remove");
    assert!(removed);

    let context = engine.get_current_context("s1").await.expect("context").expect("present");
    assert!(context.messages.iter().all(|m| m.message_id != "a2"));

    let history = engine
        .get_full_history("s1", &HistoryFilter::default(), &HistoryQueryOptions::default())
        .await
        .expect("history");
    let a2_entry = history.iter().find(|h| h.message.message_id == "a2").expect("a2 in history");
    assert!(a2_entry.excluded_from_context);
    assert_eq!(a2_entry.excluded_reason.as_deref(), Some("manual"));
}

#[tokio::test]
async fn removing_system_message_is_a_no_op() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.create_session(Some("s1".to_string()), "p").await.expect("create");
    let context = engine.get_current_context("s1").await.expect("context").expect("present");
    let system_id = context.messages[0].message_id.clone();

    let removed = engine
        .remove_message_from_context("s1", &system_id, "manual")
        .await
        .expect("remove attempt");
    assert!(!removed);
}

#[tokio::test]
async fn update_message_in_context_ignores_message_id_change_and_preserves_sequence() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.create_session(Some("s1".to_string()), "p").await.expect("create");

    let mut u1 = Message::user("draft");
    u1.message_id = "u1".to_string();
    engine
        .add_message_to_context("s1", u1, AddMessageOptions::default())
        .await
        .expect("add u1");

    let mut attempted = Message::user("revised");
    attempted.message_id = "not-u1".to_string();
    engine
        .update_message_in_context("s1", "u1", attempted)
        .await
        .expect("update");

    let context = engine.get_current_context("s1").await.expect("context").expect("present");
    let updated = context.messages.iter().find(|m| m.message_id == "u1").expect("still u1");
    assert_eq!(updated.content.to_plain_text(), "revised");

    let history = engine
        .get_full_history("s1", &HistoryFilter::default(), &HistoryQueryOptions::default())
        .await
        .expect("history");
    let entry = history.iter().find(|h| h.message.message_id == "u1").expect("present");
    assert_eq!(entry.sequence, 2);
}

#[tokio::test]
async fn clear_context_resets_to_system_message_only() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.create_session(Some("s1".to_string()), "p").await.expect("create");
    engine
        .add_message_to_context("s1", Message::user("hi"), AddMessageOptions::default())
        .await
        .expect("add");

    engine.clear_context("s1").await.expect("clear");
    let context = engine.get_current_context("s1").await.expect("context").expect("present");
    assert_eq!(context.messages.len(), 1);
    assert_eq!(context.messages[0].role, Role::System);
}

#[tokio::test]
async fn compact_context_archives_prefix_and_rebuilds_with_summary() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.create_session(Some("s1".to_string()), "p").await.expect("create");

    for text in ["one", "two", "three"] {
        engine
            .add_message_to_context("s1", Message::user(text), AddMessageOptions::default())
            .await
            .expect("add");
    }

    let record = engine
        .compact_context(
            "s1",
            CompactContextOptions {
                keep_last_n: 1,
                summary: Message::summary("summary of one, two"),
                reason: CompactionReason::TokenLimit,
                token_count_before: Some(100),
                token_count_after: Some(40),
            },
        )
        .await
        .expect("compact");

    assert_eq!(record.archived_message_ids.len(), 2);
    assert_eq!(record.message_count_before, 3);
    assert_eq!(record.message_count_after, 2);

    let context = engine.get_current_context("s1").await.expect("context").expect("present");
    assert_eq!(context.messages[0].role, Role::System);
    assert_eq!(context.messages[1].r#type, Some(memengine_message::MessageType::Summary));
    assert_eq!(context.non_system_messages().len(), 2);

    let history = engine
        .get_full_history("s1", &HistoryFilter::default(), &HistoryQueryOptions::default())
        .await
        .expect("history");
    for id in &record.archived_message_ids {
        let entry = history.iter().find(|h| &h.message.message_id == id).expect("archived entry present");
        assert_eq!(entry.archived_by.as_deref(), Some(record.record_id.as_str()));
    }
    let summary_entry = history
        .iter()
        .find(|h| h.message.message_id == record.summary_message_id)
        .expect("summary entry present");
    assert!(summary_entry.is_summary);
    assert!(summary_entry.archived_by.is_none());
}

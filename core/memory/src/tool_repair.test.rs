use tempfile::tempdir;

use super::*;
use crate::engine::MemoryEngine;
use crate::query::HistoryFilter;
use crate::query::HistoryQueryOptions;
use crate::services::AddMessageOptions;
use crate::store::StoreBundle;

async fn engine_with_temp_store() -> (MemoryEngine, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let engine = MemoryEngine::new(StoreBundle::file(dir.path()));
    engine.initialize().await.expect("initialize");
    (engine, dir)
}

#[test]
fn repair_streaming_synthesizes_only_the_unanswered_call() {
    let call_a = ToolCall::function("c1", "tool_a", "{}");
    let call_b = ToolCall::function("c2", "tool_b", "{}");
    let mut messages = vec![
        Message::user("go"),
        Message::assistant_tool_call(vec![call_a, call_b]),
        Message::tool_result("c1", "done"),
    ];

    let mut synthesized = Vec::new();
    repair_streaming(&mut messages, |m| synthesized.push(m.clone()));

    assert_eq!(synthesized.len(), 1);
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].tool_call_id.as_deref(), Some("c2"));
    assert!(messages[3].content.to_plain_text().contains("TOOL_CALL_INTERRUPTED"));
}

#[test]
fn repair_streaming_is_a_noop_when_every_call_is_answered() {
    let call = ToolCall::function("c1", "tool_a", "{}");
    let mut messages = vec![Message::assistant_tool_call(vec![call]), Message::tool_result("c1", "ok")];
    let before = messages.clone();

    let mut calls = 0;
    repair_streaming(&mut messages, |_| calls += 1);

    assert_eq!(calls, 0);
    assert_eq!(messages.len(), before.len());
}

#[test]
fn normalize_messages_downgrades_assistant_with_no_valid_tool_calls() {
    let mut bad_call = ToolCall::function("", "tool_a", "{}");
    bad_call.function.name = String::new();
    let mut message = Message::assistant_tool_call(vec![bad_call]);
    message.content = memengine_message::MessageContent::text("partial output");

    let outcome = normalize_messages(&[message.clone()]);
    assert!(outcome.changed);
    assert_eq!(outcome.messages.len(), 1);
    assert!(outcome.messages[0].tool_calls.is_none());
    assert_eq!(outcome.messages[0].r#type, Some(MessageType::Text));
}

#[test]
fn normalize_messages_drops_assistant_with_no_valid_calls_and_no_content() {
    let bad_call = ToolCall::function("", "", "{}");
    let message = Message::assistant_tool_call(vec![bad_call]);

    let outcome = normalize_messages(&[message.clone()]);
    assert!(outcome.changed);
    assert!(outcome.messages.is_empty());
    assert_eq!(outcome.dropped_message_ids, vec![message.message_id]);
}

#[test]
fn normalize_messages_drops_orphaned_tool_message() {
    let orphan = Message::tool_result("ghost", "stray");
    let outcome = normalize_messages(&[orphan.clone()]);
    assert!(outcome.changed);
    assert!(outcome.messages.is_empty());
    assert_eq!(outcome.dropped_message_ids, vec![orphan.message_id]);
}

#[test]
fn normalize_messages_is_idempotent() {
    let call = ToolCall::function("c1", "tool_a", "{}");
    let messages = vec![Message::user("go"), Message::assistant_tool_call(vec![call]), Message::tool_result("c1", "ok")];

    let first = normalize_messages(&messages);
    assert!(!first.changed);
    let second = normalize_messages(&first.messages);
    assert!(!second.changed);
    assert_eq!(first.messages.len(), second.messages.len());
}

#[tokio::test]
async fn scenario_c_interrupted_tool_calls_on_resume() {
    let (engine, _dir) = engine_with_temp_store().await;
    let session_id = engine.create_session(None, "be helpful").await.expect("create_session");

    let call_a = ToolCall::function("c1", "tool_a", "{}");
    let call_b = ToolCall::function("c2", "tool_b", "{}");
    engine
        .add_message_to_context(
            &session_id,
            Message::assistant_tool_call(vec![call_a, call_b]),
            AddMessageOptions::default(),
        )
        .await
        .expect("add assistant tool-call message");

    let changed = engine
        .normalize_context_protocol(&session_id)
        .await
        .expect("normalize_context_protocol");
    assert!(changed);

    let context = engine
        .get_current_context(&session_id)
        .await
        .expect("get_current_context")
        .expect("context present");
    let tool_messages: Vec<&Message> = context.non_system_messages().iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(tool_messages.len(), 2);
    assert!(tool_messages.iter().any(|m| m.tool_call_id.as_deref() == Some("c1")));
    assert!(tool_messages.iter().any(|m| m.tool_call_id.as_deref() == Some("c2")));
    for m in &tool_messages {
        assert!(m.content.to_plain_text().contains("TOOL_CALL_INTERRUPTED"));
    }

    let changed_again = engine
        .normalize_context_protocol(&session_id)
        .await
        .expect("normalize_context_protocol second run");
    assert!(!changed_again);
    let context_again = engine
        .get_current_context(&session_id)
        .await
        .expect("get_current_context")
        .expect("context present");
    assert_eq!(context_again.non_system_messages().len(), context.non_system_messages().len());

    let history = engine
        .get_full_history(&session_id, &HistoryFilter::default(), &HistoryQueryOptions::default())
        .await
        .expect("get_full_history");
    assert!(
        !history
            .iter()
            .any(|h| h.message.content.to_plain_text().contains("TOOL_CALL_INTERRUPTED"))
    );
}

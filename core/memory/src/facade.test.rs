use std::sync::Arc;

use async_trait::async_trait;
use memengine_message::Message;
use memengine_message::Role;
use memengine_message::ToolCall;
use tempfile::tempdir;

use super::*;
use crate::engine::MemoryEngine;
use crate::store::StoreBundle;

struct StubProvider;

#[async_trait]
impl SummaryProvider for StubProvider {
    async fn summarize(&self, _prompt: &str) -> Result<String> {
        Ok("stub summary".to_string())
    }
}

async fn fresh_engine(path: &std::path::Path) -> Arc<MemoryEngine> {
    Arc::new(MemoryEngine::new(StoreBundle::file(path)))
}

#[tokio::test]
async fn fresh_session_creates_and_initializes_exactly_once() {
    let dir = tempdir().expect("tempdir");
    let engine = fresh_engine(dir.path()).await;
    let session = Session::new(
        Arc::clone(&engine),
        SessionInit::Fresh {
            session_id: None,
            system_prompt: "be helpful".to_string(),
        },
    );

    session.initialize().await.expect("initialize");
    session.initialize().await.expect("second initialize is a no-op");

    let messages = session.messages().await.expect("messages");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::System);
}

#[tokio::test]
async fn add_message_then_sync_persists_to_the_engine() {
    let dir = tempdir().expect("tempdir");
    let engine = fresh_engine(dir.path()).await;
    let session = Session::new(
        Arc::clone(&engine),
        SessionInit::Fresh {
            session_id: None,
            system_prompt: "be helpful".to_string(),
        },
    );
    session.initialize().await.expect("initialize");
    let session_id = session.session_id().await.expect("session_id");

    session
        .add_message(Message::user("hello"), AddMessageOptions::default())
        .await
        .expect("add_message");
    session.sync().await.expect("sync");

    let context = engine
        .get_current_context(&session_id)
        .await
        .expect("get_current_context")
        .expect("context present");
    assert_eq!(context.non_system_messages().len(), 1);
    assert_eq!(context.non_system_messages()[0].content.to_plain_text(), "hello");
}

#[tokio::test]
async fn rapid_updates_to_the_same_message_id_do_not_duplicate_history() {
    let dir = tempdir().expect("tempdir");
    let engine = fresh_engine(dir.path()).await;
    let session = Session::new(
        Arc::clone(&engine),
        SessionInit::Fresh {
            session_id: None,
            system_prompt: "be helpful".to_string(),
        },
    );
    session.initialize().await.expect("initialize");
    let session_id = session.session_id().await.expect("session_id");

    let mut streamed = Message::assistant("partial");
    for chunk in ["partial", "partial more", "partial more done"] {
        streamed.content = memengine_message::MessageContent::text(chunk);
        session
            .add_message(streamed.clone(), AddMessageOptions::default())
            .await
            .expect("add_message");
    }
    session.sync().await.expect("sync");

    let history = engine
        .get_full_history(
            &session_id,
            &crate::query::HistoryFilter::default(),
            &crate::query::HistoryQueryOptions::default(),
        )
        .await
        .expect("get_full_history");
    assert_eq!(history.len(), 2, "one system entry plus exactly one entry for the streamed message");
    assert_eq!(history[1].message.content.to_plain_text(), "partial more done");
}

#[tokio::test]
async fn scenario_c_interrupted_tool_calls_survive_close_and_resume() {
    let dir = tempdir().expect("tempdir");

    let session_id = {
        let engine = fresh_engine(dir.path()).await;
        let session = Session::new(
            Arc::clone(&engine),
            SessionInit::Fresh {
                session_id: None,
                system_prompt: "be helpful".to_string(),
            },
        );
        session.initialize().await.expect("initialize");
        let session_id = session.session_id().await.expect("session_id");

        let call_a = ToolCall::function("c1", "tool_a", "{}");
        let call_b = ToolCall::function("c2", "tool_b", "{}");
        session
            .add_message(Message::assistant_tool_call(vec![call_a, call_b]), AddMessageOptions::default())
            .await
            .expect("add_message");
        session.sync().await.expect("sync");
        engine.close().await.expect("close");
        session_id
    };

    let engine = fresh_engine(dir.path()).await;
    let session = Session::new(Arc::clone(&engine), SessionInit::Resume { session_id });
    session.initialize().await.expect("initialize (resume)");

    let record = session.compact_before_llm_call().await.expect("compact_before_llm_call");
    assert!(record.is_none(), "no compaction engine wired in, so this must be a pure normalization pass");

    let messages = session.messages().await.expect("messages");
    let tool_messages: Vec<&Message> = messages.iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(tool_messages.len(), 2);
    for m in &tool_messages {
        assert!(m.content.to_plain_text().contains("TOOL_CALL_INTERRUPTED"));
    }

    session.compact_before_llm_call().await.expect("second call");
    let messages_again = session.messages().await.expect("messages");
    let tool_messages_again = messages_again.iter().filter(|m| m.role == Role::Tool).count();
    assert_eq!(tool_messages_again, 2, "re-running protocol normalization must not duplicate synthesized messages");
}

#[tokio::test]
async fn compaction_is_skipped_without_a_configured_compaction_engine() {
    let dir = tempdir().expect("tempdir");
    let engine = fresh_engine(dir.path()).await;
    let session = Session::new(
        Arc::clone(&engine),
        SessionInit::Fresh {
            session_id: None,
            system_prompt: "be helpful".to_string(),
        },
    );
    session.initialize().await.expect("initialize");
    assert!(session.compact_before_llm_call().await.expect("compact_before_llm_call").is_none());
}

#[tokio::test]
async fn compaction_runs_when_wired_in_and_triggered() {
    let dir = tempdir().expect("tempdir");
    let engine = fresh_engine(dir.path()).await;
    let session = Session::new(
        Arc::clone(&engine),
        SessionInit::Fresh {
            session_id: None,
            system_prompt: "be helpful".to_string(),
        },
    )
    .with_compaction(
        CompactionConfig {
            keep_last_n: 1,
            trigger_ratio: 0.0,
            max_tokens: 1000,
            max_output_tokens: 0,
            max_serialized_message_chars: 500,
        },
        Arc::new(StubProvider),
    );
    session.initialize().await.expect("initialize");

    for i in 0..4 {
        session
            .add_message(Message::user(format!("message {i}")), AddMessageOptions::default())
            .await
            .expect("add_message");
    }
    session.sync().await.expect("sync");

    let record = session.compact_before_llm_call().await.expect("compact_before_llm_call");
    assert!(record.is_some());

    let messages = session.messages().await.expect("messages");
    assert!(messages.iter().any(|m| m.content.to_plain_text() == "stub summary"));
}

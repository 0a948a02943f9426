use async_trait::async_trait;
use memengine_message::ToolCall;
use tempfile::tempdir;

use super::*;
use crate::engine::MemoryEngine;
use crate::store::StoreBundle;

struct StubProvider {
    response: String,
}

#[async_trait]
impl SummaryProvider for StubProvider {
    async fn summarize(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

fn usage(total: i64) -> memengine_message::Usage {
    memengine_message::Usage {
        prompt_tokens: Some(total - 10),
        completion_tokens: Some(10),
        total_tokens: Some(total),
    }
}

fn context_with(messages: Vec<Message>) -> CurrentContext {
    let mut context = CurrentContext::new("s1".to_string(), "c1".to_string(), "be helpful".to_string());
    context.messages.extend(messages);
    context
}

#[test]
fn token_breakdown_prefers_accumulated_usage_when_reliable() {
    let mut context = context_with(vec![Message::user("hi"), Message::assistant("hello")]);
    context.messages[1].usage = Some(usage(500));
    context.messages[2].usage = Some(usage(500));
    let breakdown = compute_token_breakdown(&context);
    assert!(breakdown.reliable);
    assert_eq!(breakdown.used, 1000);
}

#[test]
fn token_breakdown_falls_back_to_estimate_when_usage_sparse() {
    let context = context_with(vec![Message::user("hi"), Message::assistant("hello"), Message::user("more"), Message::assistant("stuff")]);
    let breakdown = compute_token_breakdown(&context);
    assert!(!breakdown.reliable);
    assert_eq!(breakdown.used, breakdown.estimate);
}

#[test]
fn token_breakdown_distrusts_accumulated_usage_once_a_summary_exists() {
    let mut context = context_with(vec![Message::summary("prior summary"), Message::user("hi")]);
    context.messages[1].usage = Some(usage(100));
    context.messages[2].usage = Some(usage(100));
    let breakdown = compute_token_breakdown(&context);
    assert!(!breakdown.reliable);
}

#[test]
fn trigger_requires_both_usage_ratio_and_message_count() {
    let config = CompactionConfig {
        keep_last_n: 2,
        trigger_ratio: 0.5,
        max_tokens: 1000,
        max_output_tokens: 0,
        max_serialized_message_chars: 500,
    };
    let high_usage = TokenBreakdown {
        accumulated_from_usage: 0,
        messages_with_usage: 0,
        estimate: 600,
        reliable: false,
        used: 600,
    };
    assert!(should_trigger(&high_usage, 3, &config));
    assert!(!should_trigger(&high_usage, 2, &config), "not enough messages beyond keepLastN");

    let low_usage = TokenBreakdown {
        used: 100,
        ..high_usage
    };
    assert!(!should_trigger(&low_usage, 3, &config));
}

#[test]
fn scenario_d_tool_pair_at_the_seam_is_not_severed() {
    let call = ToolCall::function("k", "search", "{}");
    let user_x = Message::user("x");
    let assistant_tool = Message::assistant_tool_call(vec![call]);
    let tool_result = Message::tool_result("k", "ok");
    let user_final = Message::user("final");

    let non_system = vec![user_x.clone(), assistant_tool.clone(), tool_result.clone(), user_final.clone()];
    let split = preserve_tool_pairs(split_regions(&non_system, 1));

    assert_eq!(split.pending.len(), 1);
    assert_eq!(split.pending[0].message_id, user_x.message_id);
    assert_eq!(split.active.len(), 3);
    assert_eq!(split.active[0].message_id, assistant_tool.message_id);
    assert_eq!(split.active[1].message_id, tool_result.message_id);
    assert_eq!(split.active[2].message_id, user_final.message_id);
}

#[test]
fn tool_response_referencing_a_pending_assistant_pulls_it_forward() {
    let call = ToolCall::function("k", "search", "{}");
    let user_x = Message::user("x");
    let assistant_tool = Message::assistant_tool_call(vec![call]);
    let tool_result = Message::tool_result("k", "ok");

    let non_system = vec![user_x.clone(), assistant_tool.clone(), tool_result.clone()];
    // keep_last_n = 1 puts only the tool result in active, with its
    // issuing assistant left behind in pending.
    let split = preserve_tool_pairs(split_regions(&non_system, 1));

    assert_eq!(split.pending.len(), 1);
    assert_eq!(split.pending[0].message_id, user_x.message_id);
    assert_eq!(split.active.len(), 2);
    assert_eq!(split.active[0].message_id, assistant_tool.message_id);
    assert_eq!(split.active[1].message_id, tool_result.message_id);
}

#[test]
fn split_regions_shifts_left_to_the_last_user_message() {
    let non_system = vec![Message::user("a"), Message::assistant("b"), Message::user("c")];
    // keep_last_n = 0 would naively keep nothing, but the last user
    // message must never be archived away.
    let split = split_regions(&non_system, 0);
    assert_eq!(split.pending.len(), 2);
    assert_eq!(split.active.len(), 1);
    assert_eq!(split.active[0].content.to_plain_text(), "c");
}

async fn engine_with_temp_store() -> (MemoryEngine, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let engine = MemoryEngine::new(StoreBundle::file(dir.path()));
    engine.initialize().await.expect("initialize");
    (engine, dir)
}

#[tokio::test]
async fn maybe_compact_runs_end_to_end_when_triggered() {
    let (engine, _dir) = engine_with_temp_store().await;
    let session_id = engine.create_session(None, "be helpful").await.expect("create_session");

    for i in 0..5 {
        engine
            .add_message_to_context(&session_id, Message::user(format!("message {i}")), Default::default())
            .await
            .expect("add message");
    }

    let config = CompactionConfig {
        keep_last_n: 1,
        trigger_ratio: 0.0,
        max_tokens: 1000,
        max_output_tokens: 0,
        max_serialized_message_chars: 500,
    };
    let provider = StubProvider {
        response: "a tidy summary".to_string(),
    };

    let record = maybe_compact(&engine, &session_id, &config, &provider, CompactionReason::TokenLimit)
        .await
        .expect("maybe_compact")
        .expect("should have triggered");

    let context = engine
        .get_current_context(&session_id)
        .await
        .expect("get_current_context")
        .expect("context present");
    assert_eq!(context.non_system_messages().len(), 2);
    assert_eq!(context.non_system_messages()[0].content.to_plain_text(), "a tidy summary");
    assert_eq!(record.reason, CompactionReason::TokenLimit);
}

#[tokio::test]
async fn maybe_compact_is_a_noop_below_the_trigger_threshold() {
    let (engine, _dir) = engine_with_temp_store().await;
    let session_id = engine.create_session(None, "be helpful").await.expect("create_session");
    engine
        .add_message_to_context(&session_id, Message::user("hi"), Default::default())
        .await
        .expect("add message");

    let config = CompactionConfig {
        keep_last_n: 50,
        trigger_ratio: 0.99,
        max_tokens: 1_000_000,
        max_output_tokens: 0,
        max_serialized_message_chars: 500,
    };
    let provider = StubProvider {
        response: "unused".to_string(),
    };

    let result = maybe_compact(&engine, &session_id, &config, &provider, CompactionReason::Auto)
        .await
        .expect("maybe_compact");
    assert!(result.is_none());
}

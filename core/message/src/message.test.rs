use super::*;

#[test]
fn system_message_defaults_to_text_type() {
    let msg = Message::system("you are a helpful assistant");
    assert_eq!(msg.role, Role::System);
    assert_eq!(msg.r#type, Some(MessageType::Text));
    assert!(msg.tool_calls.is_none());
}

#[test]
fn assistant_tool_call_has_no_finish_reason_missing() {
    let call = ToolCall::function("c1", "Read", "{}");
    let msg = Message::assistant_tool_call(vec![call]);
    assert!(msg.has_tool_calls());
    assert_eq!(msg.finish_reason.as_deref(), Some("tool_calls"));
    assert_eq!(msg.r#type, Some(MessageType::ToolCall));
}

#[test]
fn interrupted_tool_result_round_trips_and_is_detected() {
    let msg = Message::interrupted_tool_result("c1");
    assert!(msg.is_interrupted_tool_result());
    assert_eq!(msg.tool_call_id.as_deref(), Some("c1"));
    assert_eq!(msg.r#type, Some(MessageType::ToolResult));
}

#[test]
fn estimate_tokens_scales_with_content_length() {
    let short = Message::user("hi");
    let long = Message::user("x".repeat(400));
    assert!(long.estimate_tokens() > short.estimate_tokens());
}

#[test]
fn message_ids_are_unique() {
    let a = Message::user("a");
    let b = Message::user("b");
    assert_ne!(a.message_id, b.message_id);
}

#[test]
fn message_serializes_without_empty_optional_fields() {
    let msg = Message::user("hi");
    let json = serde_json::to_value(&msg).expect("serialize");
    assert!(json.get("tool_calls").is_none());
    assert!(json.get("usage").is_none());
}

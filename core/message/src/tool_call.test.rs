use super::*;

#[test]
fn function_call_is_valid() {
    let call = ToolCall::function("c1", "Read", "{}");
    assert!(call.is_syntactically_valid());
}

#[test]
fn empty_id_is_invalid() {
    let call = ToolCall::function("", "Read", "{}");
    assert!(!call.is_syntactically_valid());
}

#[test]
fn empty_function_name_is_invalid() {
    let call = ToolCall::function("c1", "", "{}");
    assert!(!call.is_syntactically_valid());
}

#[test]
fn non_function_kind_is_invalid() {
    let mut call = ToolCall::function("c1", "Read", "{}");
    call.kind = "retrieval".to_string();
    assert!(!call.is_syntactically_valid());
}

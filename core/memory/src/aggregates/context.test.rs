use super::*;

#[test]
fn new_context_has_one_system_message_at_index_zero() {
    let ctx = CurrentContext::new("s1", "ctx-1", "you are helpful");
    assert_eq!(ctx.messages.len(), 1);
    assert_eq!(ctx.system_message().role, Role::System);
    assert_eq!(ctx.version, 1);
}

#[test]
fn upsert_last_replaces_same_id_streaming_message() {
    let mut ctx = CurrentContext::new("s1", "ctx-1", "p");
    let mut msg = Message::assistant("partial");
    let id = msg.message_id.clone();
    ctx.upsert_last(msg.clone());
    assert_eq!(ctx.messages.len(), 2);

    msg.content = memengine_message::MessageContent::text("final");
    let appended = ctx.upsert_last(msg);
    assert!(!appended);
    assert_eq!(ctx.messages.len(), 2);
    assert_eq!(ctx.messages[1].message_id, id);
    assert_eq!(ctx.messages[1].content.to_plain_text(), "final");
}

#[test]
fn upsert_last_appends_when_id_differs() {
    let mut ctx = CurrentContext::new("s1", "ctx-1", "p");
    ctx.upsert_last(Message::user("hi"));
    let appended = ctx.upsert_last(Message::assistant("hello"));
    assert!(appended);
    assert_eq!(ctx.messages.len(), 3);
}

#[test]
fn clear_to_system_drops_everything_else() {
    let mut ctx = CurrentContext::new("s1", "ctx-1", "p");
    ctx.upsert_last(Message::user("hi"));
    ctx.clear_to_system();
    assert_eq!(ctx.messages.len(), 1);
}

#[test]
fn check_invariants_flags_duplicate_consecutive_ids() {
    let mut ctx = CurrentContext::new("s1", "ctx-1", "p");
    let mut msg = Message::user("hi");
    msg.message_id = "dup".to_string();
    let mut msg2 = Message::assistant("there");
    msg2.message_id = "dup".to_string();
    ctx.messages.push(msg);
    ctx.messages.push(msg2);
    assert!(ctx.check_invariants().is_some());
}

use super::*;
use memengine_message::MessageContent;

#[test]
fn apply_update_preserves_sequence_and_message_id() {
    let msg = Message::user("hi");
    let id = msg.message_id.clone();
    let mut entry = HistoryMessage::new(msg, 3);

    let mut updated = Message::user("hi there");
    updated.message_id = "someone-elses-id".to_string();
    entry.apply_update(updated);

    assert_eq!(entry.sequence, 3);
    assert_eq!(entry.message.message_id, id);
    assert_eq!(entry.message.content, MessageContent::text("hi there"));
}

#[test]
fn find_live_entry_skips_excluded_messages() {
    let mut a = HistoryMessage::new(Message::user("a"), 1);
    a.message.message_id = "m1".to_string();
    let mut b = a.clone();
    b.sequence = 2;
    b.excluded_from_context = true;

    let history = vec![a, b];
    // Both entries share message_id "m1"; only the non-excluded one (index 0) counts.
    assert_eq!(find_live_entry(&history, "m1"), Some(0));
}

#[test]
fn find_live_entry_returns_none_when_all_excluded() {
    let mut entry = HistoryMessage::new(Message::user("a"), 1);
    entry.message.message_id = "m1".to_string();
    entry.excluded_from_context = true;
    assert_eq!(find_live_entry(&[entry], "m1"), None);
}

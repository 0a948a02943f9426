use super::*;
use memengine_message::Message;

#[test]
fn child_session_id_follows_convention() {
    let run = SubTaskRunData::new("r1", "s1", RunMode::Foreground);
    assert_eq!(run.child_session_id, "s1::subtask::r1");
    assert_eq!(run.status, RunStatus::Queued);
}

#[test]
fn normalize_for_save_derives_count_and_strips_messages() {
    let mut run = SubTaskRunData::new("r1", "s1", RunMode::Background);
    run.messages = Some(vec![Message::user("a"), Message::user("b")]);
    run.normalize_for_save();
    assert_eq!(run.message_count, Some(2));
    assert!(run.messages.is_none());
}

#[test]
fn normalize_for_save_respects_explicit_message_count() {
    let mut run = SubTaskRunData::new("r1", "s1", RunMode::Background);
    run.message_count = Some(9);
    run.messages = Some(vec![Message::user("a")]);
    run.normalize_for_save();
    assert_eq!(run.message_count, Some(9));
}

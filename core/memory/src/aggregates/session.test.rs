use super::*;

#[test]
fn new_session_is_active_with_one_message() {
    let session = SessionData::new("s1", "you are helpful", "ctx-1");
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.total_messages, 1);
    assert_eq!(session.compaction_count, 0);
}

#[test]
fn touch_advances_updated_at() {
    let mut session = SessionData::new("s1", "p", "ctx-1");
    let before = session.updated_at;
    std::thread::sleep(std::time::Duration::from_millis(2));
    session.touch();
    assert!(session.updated_at >= before);
}

use super::*;

#[test]
fn new_task_is_pending_and_unparented() {
    let task = TaskData::new("t1", "s1", "write the docs");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.parent_task_id.is_none());
    assert_eq!(task.created_at, task.updated_at);
}

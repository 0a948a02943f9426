use super::*;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;
use tempfile::tempdir;

#[tokio::test]
async fn session_round_trips_through_url_encoded_filename() {
    let dir = tempdir().expect("tempdir");
    let adapter = FileAdapter::new(dir.path());
    SessionStorePort::prepare(&adapter).await.expect("prepare");

    let sid = "session with spaces/and slash";
    let session = SessionData::new(sid, "p", "ctx-1");
    SessionStorePort::save(&adapter, sid, &session).await.expect("save");

    let expected_path = dir.path().join("sessions").join(format!("{}.json", encode(sid)));
    assert!(tokio::fs::try_exists(&expected_path).await.unwrap_or(false));

    let all = SessionStorePort::load_all(&adapter).await.expect("load_all");
    assert_eq!(all.len(), 1);
    assert_eq!(all.get(sid).expect("present").session_id, sid);
}

#[tokio::test]
async fn saving_empty_task_list_deletes_file() {
    let dir = tempdir().expect("tempdir");
    let adapter = FileAdapter::new(dir.path());
    TaskStorePort::prepare(&adapter).await.expect("prepare");

    let sid = "s1";
    let tasks = vec![TaskData::new("t1", sid, "do the thing")];
    TaskStorePort::save_by_session(&adapter, sid, &tasks).await.expect("save");
    let path = dir
        .path()
        .join("tasks")
        .join(format!("task-list-{}.json", encode(sid)));
    assert!(tokio::fs::try_exists(&path).await.unwrap_or(false));

    TaskStorePort::save_by_session(&adapter, sid, &[]).await.expect("save empty");
    assert!(!tokio::fs::try_exists(&path).await.unwrap_or(false));
}

#[tokio::test]
async fn legacy_subtask_run_files_in_tasks_dir_are_ignored() {
    let dir = tempdir().expect("tempdir");
    let adapter = FileAdapter::new(dir.path());
    TaskStorePort::prepare(&adapter).await.expect("prepare");

    let stray = dir.path().join("tasks").join("subtask-run-r1.json");
    tokio::fs::write(&stray, b"{}").await.expect("write stray file");

    let all = TaskStorePort::load_all(&adapter).await.expect("load_all");
    assert!(all.is_empty());
}

#[tokio::test]
async fn subtask_run_save_strips_messages_before_persisting() {
    let dir = tempdir().expect("tempdir");
    let adapter = FileAdapter::new(dir.path());
    SubTaskRunStorePort::prepare(&adapter).await.expect("prepare");

    let mut run = SubTaskRunData::new("r1", "s1", crate::aggregates::RunMode::Background);
    run.messages = Some(vec![memengine_message::Message::user("hi")]);
    SubTaskRunStorePort::save(&adapter, "r1", &run).await.expect("save");

    let all = SubTaskRunStorePort::load_all(&adapter).await.expect("load_all");
    let loaded = all.get("r1").expect("present");
    assert!(loaded.messages.is_none());
    assert_eq!(loaded.message_count, Some(1));
}

#[tokio::test]
async fn subtask_run_delete_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let adapter = FileAdapter::new(dir.path());
    SubTaskRunStorePort::prepare(&adapter).await.expect("prepare");
    SubTaskRunStorePort::delete(&adapter, "missing").await.expect("first delete");
    SubTaskRunStorePort::delete(&adapter, "missing").await.expect("second delete");
}

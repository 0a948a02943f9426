use super::*;
use crate::aggregates::RunMode;
use crate::engine::MemoryEngine;
use crate::store::StoreBundle;
use memengine_message::Message;
use tempfile::tempdir;

async fn engine_with_temp_store() -> (MemoryEngine, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let engine = MemoryEngine::new(StoreBundle::file(dir.path()));
    engine.initialize().await.expect("initialize");
    (engine, dir)
}

#[tokio::test]
async fn save_strips_messages_and_derives_count() {
    let (engine, _dir) = engine_with_temp_store().await;
    let mut run = SubTaskRunData::new("r1", "s1", RunMode::Background);
    run.messages = Some(vec![Message::user("a"), Message::user("b")]);
    engine.save_subtask_run(run).await.expect("save");

    let loaded = engine.get_subtask_run("r1").await.expect("get").expect("present");
    assert!(loaded.messages.is_none());
    assert_eq!(loaded.message_count, Some(2));
}

#[tokio::test]
async fn delete_removes_record() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine
        .save_subtask_run(SubTaskRunData::new("r1", "s1", RunMode::Foreground))
        .await
        .expect("save");
    engine.delete_subtask_run("r1").await.expect("delete");
    assert!(engine.get_subtask_run("r1").await.expect("get").is_none());
}

#[tokio::test]
async fn query_filters_by_parent_session_and_mode() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine
        .save_subtask_run(SubTaskRunData::new("r1", "s1", RunMode::Foreground))
        .await
        .expect("save r1");
    engine
        .save_subtask_run(SubTaskRunData::new("r2", "s1", RunMode::Background))
        .await
        .expect("save r2");
    engine
        .save_subtask_run(SubTaskRunData::new("r3", "s2", RunMode::Background))
        .await
        .expect("save r3");

    let matched = engine
        .query_subtask_runs(
            &SubTaskRunFilter {
                parent_session_id: Some("s1".to_string()),
                mode: Some(RunMode::Background),
                status: None,
            },
            &QueryOptions::default(),
        )
        .await
        .expect("query");
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].run_id, "r2");
}

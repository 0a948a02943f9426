use super::*;
use crate::engine::MemoryEngine;
use crate::store::StoreBundle;
use tempfile::tempdir;

async fn engine_with_temp_store() -> (MemoryEngine, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let engine = MemoryEngine::new(StoreBundle::file(dir.path()));
    engine.initialize().await.expect("initialize");
    (engine, dir)
}

#[tokio::test]
async fn scenario_e_task_collision() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine
        .save_task(TaskData::new("t", "s1", "first"))
        .await
        .expect("first save succeeds");

    let err = engine
        .save_task(TaskData::new("t", "s2", "second"))
        .await
        .expect_err("second save should collide");
    assert!(matches!(err, MemoryError::InvariantViolation { .. }));
}

#[tokio::test]
async fn save_task_twice_same_session_preserves_created_at() {
    let (engine, _dir) = engine_with_temp_store().await;
    let mut task = TaskData::new("t", "s1", "first subject");
    engine.save_task(task.clone()).await.expect("save");
    let original_created_at = task.created_at;

    task.subject = "revised subject".to_string();
    task.status = crate::aggregates::TaskStatus::InProgress;
    engine.save_task(task).await.expect("update");

    let loaded = engine.get_task("t").await.expect("get").expect("present");
    assert_eq!(loaded.created_at, original_created_at);
    assert_eq!(loaded.subject, "revised subject");
}

#[tokio::test]
async fn query_tasks_filters_by_parent_none_means_top_level() {
    let (engine, _dir) = engine_with_temp_store().await;
    engine.save_task(TaskData::new("t1", "s1", "top level")).await.expect("save t1");
    let mut child = TaskData::new("t2", "s1", "child");
    child.parent_task_id = Some("t1".to_string());
    engine.save_task(child).await.expect("save t2");

    let top_level = engine
        .query_tasks(
            &TaskFilter {
                parent_task_id: Some(None),
                ..Default::default()
            },
            &QueryOptions::default(),
        )
        .await
        .expect("query");
    assert_eq!(top_level.len(), 1);
    assert_eq!(top_level[0].task_id, "t1");
}

#[tokio::test]
async fn delete_task_removes_from_list_and_empty_list_deletes_file() {
    let (engine, dir) = engine_with_temp_store().await;
    engine.save_task(TaskData::new("t1", "s1", "only task")).await.expect("save");
    engine.delete_task("t1").await.expect("delete");

    assert!(engine.get_task("t1").await.expect("get").is_none());
    let path = dir
        .path()
        .join("tasks")
        .join(format!("task-list-{}.json", urlencoding::encode("s1")));
    assert!(!tokio::fs::try_exists(&path).await.unwrap_or(false));
}

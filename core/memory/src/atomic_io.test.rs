use super::*;
use serde::Deserialize;
use serde::Serialize;
use tempfile::tempdir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Sample {
    value: u32,
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.json");
    write_json(&path, &Sample { value: 1 }).await.expect("write");
    let loaded: Option<Sample> = read_json(&path).await.expect("read");
    assert_eq!(loaded, Some(Sample { value: 1 }));
}

#[tokio::test]
async fn read_missing_file_returns_none() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing.json");
    let loaded: Option<Sample> = read_json(&path).await.expect("read");
    assert_eq!(loaded, None);
}

#[tokio::test]
async fn second_write_creates_backup_of_prior_version() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.json");
    write_json(&path, &Sample { value: 1 }).await.expect("write 1");
    write_json(&path, &Sample { value: 2 }).await.expect("write 2");

    let bak = backup_path(&path);
    let bak_value: Sample =
        serde_json::from_slice(&tokio::fs::read(&bak).await.expect("read bak")).expect("parse bak");
    assert_eq!(bak_value, Sample { value: 1 });

    let current: Option<Sample> = read_json(&path).await.expect("read current");
    assert_eq!(current, Some(Sample { value: 2 }));
}

#[tokio::test]
async fn corrupt_file_falls_back_to_backup_and_is_quarantined() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.json");
    write_json(&path, &Sample { value: 1 }).await.expect("write 1");
    write_json(&path, &Sample { value: 2 }).await.expect("write 2");

    tokio::fs::write(&path, b"{not json").await.expect("corrupt current");

    let recovered: Option<Sample> = read_json(&path).await.expect("read recovers");
    assert_eq!(recovered, Some(Sample { value: 1 }));

    assert!(!tokio::fs::try_exists(&path).await.unwrap_or(false));

    let mut entries = tokio::fs::read_dir(dir.path()).await.expect("read dir");
    let mut saw_quarantine = false;
    while let Some(entry) = entries.next_entry().await.expect("next entry") {
        if entry
            .file_name()
            .to_string_lossy()
            .contains(".corrupt-")
        {
            saw_quarantine = true;
        }
    }
    assert!(saw_quarantine, "expected a quarantined copy of the corrupt file");
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.json");
    write_json(&path, &Sample { value: 1 }).await.expect("write");
    delete(&path).await.expect("first delete");
    delete(&path).await.expect("second delete is a no-op");
}

#[tokio::test]
async fn list_json_files_ignores_non_json_and_missing_dir() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    assert_eq!(list_json_files(&missing).await.expect("missing dir"), Vec::<PathBuf>::new());

    write_json(&dir.path().join("a.json"), &Sample { value: 1 })
        .await
        .expect("write a");
    write_json(&dir.path().join("b.json"), &Sample { value: 2 })
        .await
        .expect("write b");
    tokio::fs::write(dir.path().join("notes.txt"), b"hello")
        .await
        .expect("write txt");

    let files = list_json_files(dir.path()).await.expect("list");
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|p| p.extension().and_then(|e| e.to_str()) == Some("json")));
}

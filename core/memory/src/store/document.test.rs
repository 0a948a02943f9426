use super::*;
use crate::aggregates::SessionData;
use crate::aggregates::TaskData;
use std::sync::Mutex;

/// An in-process fake standing in for a real database driver in tests.
#[derive(Default)]
struct FakeDriver {
    collections: Mutex<HashMap<String, HashMap<String, Value>>>,
}

#[async_trait]
impl DocumentDriver for FakeDriver {
    async fn prepare(&self, _database: &str) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _database: &str, collection: &str, id: &str, document: Value) -> Result<()> {
        let mut guard = self.collections.lock().expect("lock");
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete(&self, _database: &str, collection: &str, id: &str) -> Result<()> {
        let mut guard = self.collections.lock().expect("lock");
        if let Some(coll) = guard.get_mut(collection) {
            coll.remove(id);
        }
        Ok(())
    }

    async fn find_all(&self, _database: &str, collection: &str) -> Result<Vec<(String, Value)>> {
        let guard = self.collections.lock().expect("lock");
        Ok(guard
            .get(collection)
            .map(|coll| coll.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

#[tokio::test]
async fn session_round_trips_as_id_payload_document() {
    let driver = std::sync::Arc::new(FakeDriver::default());
    let adapter = DocumentAdapter::new(driver, "agent_memory", "memory_");
    SessionStorePort::prepare(&adapter).await.expect("prepare");

    let session = SessionData::new("s1", "p", "ctx-1");
    SessionStorePort::save(&adapter, "s1", &session).await.expect("save");

    let all = SessionStorePort::load_all(&adapter).await.expect("load_all");
    assert_eq!(all.get("s1").expect("present").session_id, "s1");
}

#[tokio::test]
async fn task_document_replaces_whole_list_and_empty_deletes() {
    let driver = std::sync::Arc::new(FakeDriver::default());
    let adapter = DocumentAdapter::new(driver, "agent_memory", "memory_");
    TaskStorePort::prepare(&adapter).await.expect("prepare");

    let tasks = vec![TaskData::new("t1", "s1", "write docs")];
    TaskStorePort::save_by_session(&adapter, "s1", &tasks).await.expect("save");
    let all = TaskStorePort::load_all(&adapter).await.expect("load_all");
    assert_eq!(all.get("s1").expect("present").len(), 1);

    TaskStorePort::save_by_session(&adapter, "s1", &[]).await.expect("save empty");
    let all = TaskStorePort::load_all(&adapter).await.expect("load_all after delete");
    assert!(!all.contains_key("s1"));
}

#[test]
fn resolve_prefers_options_over_config() {
    let driver = std::sync::Arc::new(FakeDriver::default());
    let options = DocumentAdapterOptions {
        database: Some("from-options".to_string()),
        ..Default::default()
    };
    let config = DocumentAdapterConfig {
        db_name: Some("from-config".to_string()),
        ..Default::default()
    };
    let adapter = DocumentAdapter::resolve(driver, options, config);
    assert_eq!(adapter.collection("sessions"), format!("{DEFAULT_COLLECTION_PREFIX}sessions"));
    assert_eq!(adapter.database, "from-options");
}

#[test]
fn resolve_prefers_config_literal_over_env_key() {
    let driver = std::sync::Arc::new(FakeDriver::default());
    let config = DocumentAdapterConfig {
        collection_prefix: Some("cfg_".to_string()),
        collection_prefix_env_key: Some("MEMENGINE_TEST_UNSET_COLLECTION_PREFIX".to_string()),
        ..Default::default()
    };
    let adapter = DocumentAdapter::resolve(driver, DocumentAdapterOptions::default(), config);
    assert_eq!(adapter.collection_prefix, "cfg_");
}

#[test]
fn resolve_falls_back_to_documented_defaults() {
    let driver = std::sync::Arc::new(FakeDriver::default());
    let adapter = DocumentAdapter::resolve(driver, DocumentAdapterOptions::default(), DocumentAdapterConfig::default());
    assert_eq!(adapter.database, DEFAULT_DATABASE);
    assert_eq!(adapter.collection_prefix, DEFAULT_COLLECTION_PREFIX);
    assert!(adapter.connection_string().is_none());
}

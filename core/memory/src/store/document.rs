//! Document-store adapter: one collection per aggregate, records as
//! `{_id, payload}` upserted by replace-one.
//!
//! The engine does not hard-depend on any particular database driver at
//! compile time. Instead, callers inject a [`DocumentDriver`] implementation
//! — backed by whichever database crate their deployment actually uses —
//! and this adapter drives it through the collection-naming and document-
//! shape contract. This mirrors the spec's "lazy module loading" design by
//! moving the dependency-resolution step to the caller's binary instead of
//! this crate's `Cargo.toml`.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use memengine_error::MemoryError;
use memengine_error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;
use crate::store::ports::CompactionStorePort;
use crate::store::ports::ContextStorePort;
use crate::store::ports::HistoryStorePort;
use crate::store::ports::SessionStorePort;
use crate::store::ports::SubTaskRunStorePort;
use crate::store::ports::TaskStorePort;

/// The minimal driver surface the document adapter needs from a concrete
/// database client.
///
/// Implementations own their own connection lifecycle; `prepare` is where a
/// lazily-constructed driver would establish it. A deployment that has no
/// driver wired in simply never constructs a [`DocumentAdapter`].
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    /// Ensure the connection / collection set is ready.
    async fn prepare(&self, database: &str) -> Result<()>;
    /// Replace-one-with-upsert: `id` is the document's `_id`.
    async fn upsert(&self, database: &str, collection: &str, id: &str, document: Value) -> Result<()>;
    /// Delete one document by `_id`. Idempotent.
    async fn delete(&self, database: &str, collection: &str, id: &str) -> Result<()>;
    /// Fetch every document in a collection as `(id, document)` pairs.
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<(String, Value)>>;
}

/// Database name used when no option, config, or environment variable
/// resolves one.
pub const DEFAULT_DATABASE: &str = "agent_memory";
/// Collection prefix used when no option, config, or environment variable
/// resolves one.
pub const DEFAULT_COLLECTION_PREFIX: &str = "memory_";

/// Already-resolved literal values for a [`DocumentAdapter`], checked first
/// by [`DocumentAdapter::resolve`]. A `Some` field here always wins over
/// `config` and the environment.
#[derive(Debug, Clone, Default)]
pub struct DocumentAdapterOptions {
    pub connection_string: Option<String>,
    pub database: Option<String>,
    pub collection_prefix: Option<String>,
}

/// Injected configuration, checked after [`DocumentAdapterOptions`]. Also
/// names the environment variables consulted as the final fallback.
#[derive(Debug, Clone, Default)]
pub struct DocumentAdapterConfig {
    pub connection_string: Option<String>,
    pub db_name: Option<String>,
    pub collection_prefix: Option<String>,
    pub connection_env_key: Option<String>,
    pub db_name_env_key: Option<String>,
    pub collection_prefix_env_key: Option<String>,
}

fn resolve_value(option: Option<String>, config: Option<String>, env_key: Option<&str>) -> Option<String> {
    option.or(config).or_else(|| env_key.and_then(|key| env::var(key).ok()))
}

/// Collection-naming and document-shape adapter over an injected
/// [`DocumentDriver`].
pub struct DocumentAdapter {
    driver: std::sync::Arc<dyn DocumentDriver>,
    connection_string: Option<String>,
    database: String,
    collection_prefix: String,
}

impl DocumentAdapter {
    /// Build an adapter against `driver`, targeting database `database` with
    /// collections named `<collection_prefix><aggregate>`. Takes values the
    /// caller has already resolved; see [`DocumentAdapter::resolve`] for the
    /// options/config/env-var precedence instead.
    pub fn new(
        driver: std::sync::Arc<dyn DocumentDriver>,
        database: impl Into<String>,
        collection_prefix: impl Into<String>,
    ) -> Self {
        DocumentAdapter {
            driver,
            connection_string: None,
            database: database.into(),
            collection_prefix: collection_prefix.into(),
        }
    }

    /// Build an adapter by resolving the connection string, database name,
    /// and collection prefix from `options`, then `config`'s literal
    /// values, then the environment variable `config` names, in that
    /// precedence. Database name and collection prefix fall back to
    /// [`DEFAULT_DATABASE`] / [`DEFAULT_COLLECTION_PREFIX`] if nothing
    /// resolves them; the connection string has no default, since the
    /// injected `driver` may already own a live connection and never
    /// consult it.
    pub fn resolve(driver: std::sync::Arc<dyn DocumentDriver>, options: DocumentAdapterOptions, config: DocumentAdapterConfig) -> Self {
        let connection_string = resolve_value(options.connection_string, config.connection_string, config.connection_env_key.as_deref());
        let database = resolve_value(options.database, config.db_name, config.db_name_env_key.as_deref())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let collection_prefix = resolve_value(options.collection_prefix, config.collection_prefix, config.collection_prefix_env_key.as_deref())
            .unwrap_or_else(|| DEFAULT_COLLECTION_PREFIX.to_string());

        DocumentAdapter {
            driver,
            connection_string,
            database,
            collection_prefix,
        }
    }

    /// The resolved connection string, if any layer supplied one.
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref()
    }

    fn collection(&self, aggregate: &str) -> String {
        format!("{}{aggregate}", self.collection_prefix)
    }

    async fn prepare(&self) -> Result<()> {
        self.driver.prepare(&self.database).await
    }

    async fn load_payloads<T: DeserializeOwned>(&self, aggregate: &str) -> Result<HashMap<String, T>> {
        let collection = self.collection(aggregate);
        let docs = self.driver.find_all(&self.database, &collection).await?;
        let mut out = HashMap::with_capacity(docs.len());
        for (id, doc) in docs {
            let payload = doc.get("payload").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<T>(payload) {
                Ok(value) => {
                    out.insert(id, value);
                }
                Err(e) => {
                    tracing::warn!(collection = %collection, id = %id, error = %e, "skipping document with unparseable payload");
                }
            }
        }
        Ok(out)
    }

    async fn save_payload<T: Serialize + Sync>(&self, aggregate: &str, id: &str, value: &T) -> Result<()> {
        let collection = self.collection(aggregate);
        let payload = serde_json::to_value(value).map_err(|e| MemoryError::BackendUnavailable {
            message: format!("failed to serialize payload for `{collection}`: {e}"),
        })?;
        let document = serde_json::json!({ "_id": id, "payload": payload });
        self.driver.upsert(&self.database, &collection, id, document).await
    }
}

#[async_trait]
impl SessionStorePort for DocumentAdapter {
    async fn prepare(&self) -> Result<()> {
        self.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, SessionData>> {
        self.load_payloads("sessions").await
    }

    async fn save(&self, session_id: &str, value: &SessionData) -> Result<()> {
        self.save_payload("sessions", session_id, value).await
    }
}

#[async_trait]
impl ContextStorePort for DocumentAdapter {
    async fn prepare(&self) -> Result<()> {
        self.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, CurrentContext>> {
        self.load_payloads("contexts").await
    }

    async fn save(&self, session_id: &str, value: &CurrentContext) -> Result<()> {
        self.save_payload("contexts", session_id, value).await
    }
}

#[async_trait]
impl HistoryStorePort for DocumentAdapter {
    async fn prepare(&self) -> Result<()> {
        self.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<HistoryMessage>>> {
        self.load_payloads("histories").await
    }

    async fn save(&self, session_id: &str, value: &[HistoryMessage]) -> Result<()> {
        self.save_payload("histories", session_id, &value).await
    }
}

#[async_trait]
impl CompactionStorePort for DocumentAdapter {
    async fn prepare(&self) -> Result<()> {
        self.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<CompactionRecord>>> {
        self.load_payloads("compactions").await
    }

    async fn save(&self, session_id: &str, value: &[CompactionRecord]) -> Result<()> {
        self.save_payload("compactions", session_id, &value).await
    }
}

/// A task document is `{_id: sessionId, tasks: [...]}`, not the
/// `{_id, payload}` shape every other aggregate uses, so save-by-session
/// replaces the whole document directly.
#[async_trait]
impl TaskStorePort for DocumentAdapter {
    async fn prepare(&self) -> Result<()> {
        self.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<TaskData>>> {
        let collection = self.collection("tasks");
        let docs = self.driver.find_all(&self.database, &collection).await?;
        let mut out = HashMap::with_capacity(docs.len());
        for (id, doc) in docs {
            let tasks = doc.get("tasks").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<Vec<TaskData>>(tasks) {
                Ok(value) => {
                    out.insert(id, value);
                }
                Err(e) => {
                    tracing::warn!(collection = %collection, id = %id, error = %e, "skipping task document with unparseable tasks");
                }
            }
        }
        Ok(out)
    }

    async fn save_by_session(&self, session_id: &str, tasks: &[TaskData]) -> Result<()> {
        let collection = self.collection("tasks");
        if tasks.is_empty() {
            return self.driver.delete(&self.database, &collection, session_id).await;
        }
        let mut sorted = tasks.to_vec();
        sorted.sort_by_key(|t| t.created_at);
        let document = serde_json::json!({ "_id": session_id, "tasks": sorted });
        self.driver
            .upsert(&self.database, &collection, session_id, document)
            .await
    }
}

#[async_trait]
impl SubTaskRunStorePort for DocumentAdapter {
    async fn prepare(&self) -> Result<()> {
        self.prepare().await
    }

    async fn load_all(&self) -> Result<HashMap<String, SubTaskRunData>> {
        self.load_payloads("subtask_runs").await
    }

    async fn save(&self, run_id: &str, value: &SubTaskRunData) -> Result<()> {
        let mut value = value.clone();
        value.normalize_for_save();
        self.save_payload("subtask_runs", run_id, &value).await
    }

    async fn delete(&self, run_id: &str) -> Result<()> {
        let collection = self.collection("subtask_runs");
        self.driver.delete(&self.database, &collection, run_id).await
    }
}

#[cfg(test)]
#[path = "document.test.rs"]
mod tests;

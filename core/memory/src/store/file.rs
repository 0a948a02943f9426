//! File adapter: one directory per aggregate, JSON files keyed by
//! URL-encoded identifiers.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use memengine_error::Result;
use tracing::warn;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::SubTaskRunData;
use crate::aggregates::TaskData;
use crate::atomic_io;
use crate::store::ports::CompactionStorePort;
use crate::store::ports::ContextStorePort;
use crate::store::ports::HistoryStorePort;
use crate::store::ports::SessionStorePort;
use crate::store::ports::SubTaskRunStorePort;
use crate::store::ports::TaskStorePort;

fn encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn decode(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

/// Per-aggregate directories of JSON files under a configurable base path.
///
/// Unknown or malformed filenames, decoding errors, and individual parse
/// failures are logged and skipped; the rest of a directory still loads.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    base_path: PathBuf,
}

impl FileAdapter {
    /// Build an adapter rooted at `base_path`. No I/O happens until
    /// `prepare()`/the port methods are called.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        FileAdapter {
            base_path: base_path.into(),
        }
    }

    fn dir(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Load every `*.json` file in `dir`, decode its stem with `key_of`, and
    /// parse it as `T`. Any failure at any stage is logged and the entry
    /// skipped rather than aborting the whole load.
    async fn load_dir<T, F>(&self, dir_name: &str, key_of: F) -> Result<HashMap<String, T>>
    where
        T: serde::de::DeserializeOwned,
        F: Fn(&str) -> Option<String>,
    {
        let dir = self.dir(dir_name);
        let files = atomic_io::list_json_files(&dir).await?;
        let mut out = HashMap::with_capacity(files.len());
        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "skipping file with non-utf8 name");
                continue;
            };
            let Some(key) = key_of(stem) else {
                warn!(path = %path.display(), "skipping unrecognized filename shape");
                continue;
            };
            match atomic_io::read_json::<T>(&path).await {
                Ok(Some(value)) => {
                    out.insert(key, value);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping file that failed to load");
                }
            }
        }
        Ok(out)
    }
}

fn plain_key(stem: &str) -> Option<String> {
    decode(stem)
}

fn prefixed_key(stem: &str, prefix: &str) -> Option<String> {
    stem.strip_prefix(prefix).and_then(decode)
}

async fn prepare_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| memengine_error::MemoryError::WriteFailure {
            path: path.display().to_string(),
            source,
        })
}

#[async_trait]
impl SessionStorePort for FileAdapter {
    async fn prepare(&self) -> Result<()> {
        prepare_dir(&self.dir("sessions")).await
    }

    async fn load_all(&self) -> Result<HashMap<String, SessionData>> {
        self.load_dir("sessions", plain_key).await
    }

    async fn save(&self, session_id: &str, value: &SessionData) -> Result<()> {
        let path = self.dir("sessions").join(format!("{}.json", encode(session_id)));
        atomic_io::write_json(&path, value).await
    }
}

#[async_trait]
impl ContextStorePort for FileAdapter {
    async fn prepare(&self) -> Result<()> {
        prepare_dir(&self.dir("contexts")).await
    }

    async fn load_all(&self) -> Result<HashMap<String, CurrentContext>> {
        self.load_dir("contexts", plain_key).await
    }

    async fn save(&self, session_id: &str, value: &CurrentContext) -> Result<()> {
        let path = self.dir("contexts").join(format!("{}.json", encode(session_id)));
        atomic_io::write_json(&path, value).await
    }
}

#[async_trait]
impl HistoryStorePort for FileAdapter {
    async fn prepare(&self) -> Result<()> {
        prepare_dir(&self.dir("histories")).await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<HistoryMessage>>> {
        self.load_dir("histories", plain_key).await
    }

    async fn save(&self, session_id: &str, value: &[HistoryMessage]) -> Result<()> {
        let path = self.dir("histories").join(format!("{}.json", encode(session_id)));
        atomic_io::write_json(&path, &value).await
    }
}

#[async_trait]
impl CompactionStorePort for FileAdapter {
    async fn prepare(&self) -> Result<()> {
        prepare_dir(&self.dir("compactions")).await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<CompactionRecord>>> {
        self.load_dir("compactions", plain_key).await
    }

    async fn save(&self, session_id: &str, value: &[CompactionRecord]) -> Result<()> {
        let path = self.dir("compactions").join(format!("{}.json", encode(session_id)));
        atomic_io::write_json(&path, &value).await
    }
}

const TASK_LIST_PREFIX: &str = "task-list-";
const SUBTASK_RUN_PREFIX: &str = "subtask-run-";

#[async_trait]
impl TaskStorePort for FileAdapter {
    async fn prepare(&self) -> Result<()> {
        prepare_dir(&self.dir("tasks")).await
    }

    async fn load_all(&self) -> Result<HashMap<String, Vec<TaskData>>> {
        // Legacy sub-task-run files that ended up in `tasks/` are ignored:
        // their stem never matches the `task-list-` prefix, so `prefixed_key`
        // filters them out like any other malformed name.
        self.load_dir("tasks", |stem| prefixed_key(stem, TASK_LIST_PREFIX)).await
    }

    async fn save_by_session(&self, session_id: &str, tasks: &[TaskData]) -> Result<()> {
        let path = self
            .dir("tasks")
            .join(format!("{TASK_LIST_PREFIX}{}.json", encode(session_id)));
        if tasks.is_empty() {
            atomic_io::delete(&path).await
        } else {
            let mut sorted = tasks.to_vec();
            sorted.sort_by_key(|t| t.created_at);
            atomic_io::write_json(&path, &sorted).await
        }
    }
}

#[async_trait]
impl SubTaskRunStorePort for FileAdapter {
    async fn prepare(&self) -> Result<()> {
        prepare_dir(&self.dir("subtask-runs")).await
    }

    async fn load_all(&self) -> Result<HashMap<String, SubTaskRunData>> {
        self.load_dir("subtask-runs", |stem| prefixed_key(stem, SUBTASK_RUN_PREFIX))
            .await
    }

    async fn save(&self, run_id: &str, value: &SubTaskRunData) -> Result<()> {
        let mut value = value.clone();
        value.normalize_for_save();
        let path = self
            .dir("subtask-runs")
            .join(format!("{SUBTASK_RUN_PREFIX}{}.json", encode(run_id)));
        atomic_io::write_json(&path, &value).await
    }

    async fn delete(&self, run_id: &str) -> Result<()> {
        let path = self
            .dir("subtask-runs")
            .join(format!("{SUBTASK_RUN_PREFIX}{}.json", encode(run_id)));
        atomic_io::delete(&path).await
    }
}

#[cfg(test)]
#[path = "file.test.rs"]
mod tests;

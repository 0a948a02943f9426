//! Crash-safe read/write for a single JSON file.
//!
//! Every write goes to a temp file in the same directory then an atomic
//! rename over the target. Before overwriting an existing file its current
//! content is copied aside as `<name>.bak`. A read that fails to parse
//! falls back to `.bak`; if that also fails the corrupt file is quarantined
//! as `<name>.corrupt-<iso-ms>` and the backup value (or `None`) is
//! returned instead of propagating the parse error.

use std::path::Path;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::warn;

use memengine_error::MemoryError;
use memengine_error::Result;

/// Write `value` as pretty-printed JSON to `path`, atomically.
///
/// If `path` already has content, it is copied to `<path>.bak` first so a
/// crash mid-write never loses the prior version.
pub async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| MemoryError::WriteFailure {
                path: path.display().to_string(),
                source,
            })?;
    }

    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        let bak = backup_path(path);
        if let Err(source) = tokio::fs::copy(path, &bak).await {
            warn!(path = %path.display(), error = %source, "failed to write .bak before overwrite");
        }
    }

    let body = serde_json::to_string_pretty(value).map_err(|e| MemoryError::WriteFailure {
        path: path.display().to_string(),
        source: std::io::Error::other(e),
    })?;

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, body.as_bytes())
        .await
        .map_err(|source| MemoryError::WriteFailure {
            path: path.display().to_string(),
            source,
        })?;

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| MemoryError::WriteFailure {
            path: path.display().to_string(),
            source,
        })
}

/// Read and deserialize JSON from `path`.
///
/// Returns `Ok(None)` if the file does not exist. On parse failure, tries
/// `<path>.bak`; if that also fails, quarantines the corrupt file as
/// `<path>.corrupt-<timestamp-ms>` and returns the backup's value (or
/// `Ok(None)` if there is no usable backup) instead of an error, since a
/// single corrupt file must not abort a directory-wide load.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(MemoryError::WriteFailure {
                path: path.display().to_string(),
                source,
            });
        }
    };

    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(parse_err) => recover_from_corruption(path, parse_err).await,
    }
}

async fn recover_from_corruption<T: DeserializeOwned>(
    path: &Path,
    parse_err: serde_json::Error,
) -> Result<Option<T>> {
    let bak = backup_path(path);
    let recovered = match tokio::fs::read(&bak).await {
        Ok(bytes) => serde_json::from_slice::<T>(&bytes).ok(),
        Err(_) => None,
    };

    let quarantine = quarantine_path(path);
    if let Err(e) = tokio::fs::rename(path, &quarantine).await {
        warn!(path = %path.display(), error = %e, "failed to quarantine corrupt file");
    } else {
        warn!(
            path = %path.display(),
            quarantine = %quarantine.display(),
            error = %parse_err,
            "quarantined corrupt JSON file after parse failure"
        );
    }

    Ok(recovered)
}

/// Idempotent delete: a missing file is success.
pub async fn delete(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MemoryError::WriteFailure {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// List `*.json` entries directly inside `dir`. Returns an empty list if
/// `dir` does not exist.
pub async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(MemoryError::WriteFailure {
                path: dir.display().to_string(),
                source,
            });
        }
    };

    let mut files = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(MemoryError::WriteFailure {
                    path: dir.display().to_string(),
                    source,
                });
            }
        };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-.json directory entry");
        }
    }
    files.sort();
    Ok(files)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".bak");
    PathBuf::from(s)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(format!(".corrupt-{}", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ")));
    PathBuf::from(s)
}

#[cfg(test)]
#[path = "atomic_io.test.rs"]
mod tests;

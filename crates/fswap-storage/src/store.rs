//! Result store operations.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use fswap_models::JobId;

use crate::error::{StorageError, StorageResult};

/// Result store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding result files
    pub root: PathBuf,
    /// How long results are retained before the cleanup sweep removes them
    pub result_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/results"),
            result_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            root: std::env::var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/results")),
            result_ttl: Duration::from_secs(
                std::env::var("RESULT_TTL_HOURS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(24)
                    * 3600,
            ),
        }
    }
}

/// Durable byte-blob storage keyed by job id.
///
/// Only the worker ever writes a given job's result; downloads read it
/// any number of times until the TTL sweep removes it.
#[derive(Debug, Clone)]
pub struct ResultStore {
    config: StoreConfig,
}

impl ResultStore {
    /// Create a new result store.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    /// Full path for a job's result file.
    pub fn result_path(&self, job_id: &JobId, extension: &str) -> PathBuf {
        self.config.root.join(format!("{job_id}{extension}"))
    }

    /// Write result bytes, returning the stored path.
    pub async fn write(&self, job_id: &JobId, bytes: &[u8], extension: &str) -> StorageResult<PathBuf> {
        let path = self.result_path(job_id, extension);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        info!(job_id = %job_id, path = %path.display(), bytes = bytes.len(), "Stored result");
        Ok(path)
    }

    /// Read result bytes from a stored path.
    pub async fn read(&self, path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a stored path still exists.
    pub async fn exists(&self, path: impl AsRef<Path>) -> bool {
        tokio::fs::try_exists(path.as_ref()).await.unwrap_or(false)
    }

    /// Delete a stored result. Missing files are not an error.
    pub async fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted result");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete result files older than the configured TTL.
    ///
    /// Returns the number of files removed.
    pub async fn cleanup_expired(&self) -> StorageResult<usize> {
        let root = &self.config.root;
        if !tokio::fs::try_exists(root).await.unwrap_or(false) {
            return Ok(0);
        }
        let cutoff = SystemTime::now() - self.config.result_ttl;

        let mut deleted = 0;
        let mut entries = tokio::fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(_) => continue,
            };
            if modified < cutoff {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(path = %entry.path().display(), "Failed to delete expired result: {e}"),
                }
            }
        }

        if deleted > 0 {
            info!(deleted, "Removed expired result files");
        }
        Ok(deleted)
    }
}

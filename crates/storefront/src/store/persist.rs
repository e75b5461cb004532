//! Durable key-value storage for client state that outlives the process.
//!
//! Only the auth session is persisted; cart and wishlist are refetched
//! from the backend each session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Errors from session storage.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Session storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session storage is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Namespaced JSON storage, the desktop analogue of browser local storage.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Value stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<Value>, PersistError>;

    async fn save(&self, key: &str, value: Value) -> Result<(), PersistError>;

    /// Delete `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), PersistError>;
}

type Document = BTreeMap<String, Value>;

/// Keeps every key in one JSON object file.
///
/// Writes go to a sibling temp file that is renamed over the original, so
/// a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSessionStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_document(&self) -> Result<Document, PersistError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Current document, or an empty one if the file is unreadable JSON.
    async fn read_document_for_write(&self) -> Result<Document, PersistError> {
        match self.read_document().await {
            Err(PersistError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
                Ok(Document::new())
            }
            other => other,
        }
    }

    async fn write_document(&self, document: &Document) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        restrict_permissions(&tmp)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), keys = document.len(), "Session file written");
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self, key: &str) -> Result<Option<Value>, PersistError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(document.remove(key))
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), PersistError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document_for_write().await?;
        document.insert(key.to_string(), value);
        self.write_document(&document).await
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document_for_write().await?;
        if document.remove(key).is_none() {
            return Ok(());
        }
        self.write_document(&document).await
    }
}

/// In-process storage for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    entries: Arc<Mutex<Document>>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self, key: &str) -> Result<Option<Value>, PersistError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), PersistError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

//! Named string slots persisted in one JSON file.
//!
//! Default location is the platform data directory:
//! - Linux: ~/.local/share/sims/storage.json
//! - macOS: ~/Library/Application Support/sims/storage.json
//! - Windows: %APPDATA%/sims/storage.json

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sims_application::ports::{KeyValueStorage, StorageError};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

type Slots = BTreeMap<String, String>;

/// Key/value storage in a single JSON object file.
///
/// Writes go to a temporary file that is then renamed over the target, so
/// a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileKeyValueStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStorage {
    /// Storage backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage in the platform data directory, if one exists.
    #[must_use]
    pub fn in_data_dir() -> Option<Self> {
        Self::default_path().map(Self::new)
    }

    /// `<data_dir>/sims/storage.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("sims").join("storage.json"))
    }

    /// File holding the slots.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_slots(&self) -> Result<Slots, StorageError> {
        match fs::read(&self.path).await {
            Ok(content) if content.iter().all(u8::is_ascii_whitespace) => Ok(Slots::new()),
            Ok(content) => {
                from_json_bytes(&content).map_err(|e| StorageError::Serialization(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Slots::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Slots a write starts from. An unreadable file counts as empty and is
    /// overwritten; the flag reports that case.
    async fn slots_for_write(&self) -> Result<(Slots, bool), StorageError> {
        match self.read_slots().await {
            Ok(slots) => Ok((slots, false)),
            Err(StorageError::Serialization(reason)) => {
                warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Storage file unreadable, replacing it"
                );
                Ok((Slots::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn write_slots(&self, slots: &Slots) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content =
            to_json_stable_bytes(slots).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), slots = slots.len(), "Storage file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileKeyValueStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_slots().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let (mut slots, _) = self.slots_for_write().await?;
        slots.insert(key.to_string(), value.to_string());
        self.write_slots(&slots).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let (mut slots, corrupt) = self.slots_for_write().await?;
        if slots.remove(key).is_some() || corrupt {
            self.write_slots(&slots).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> FileKeyValueStorage {
        FileKeyValueStorage::new(dir.path().join("nested").join("storage.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(storage(&dir).get_item("acces_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        storage.set_item("acces_token", "\"abc\"").await.unwrap();
        storage.set_item("other", "1").await.unwrap();
        assert_eq!(
            storage.get_item("acces_token").await.unwrap().as_deref(),
            Some("\"abc\"")
        );

        storage.remove_item("acces_token").await.unwrap();
        assert_eq!(storage.get_item("acces_token").await.unwrap(), None);
        assert_eq!(storage.get_item("other").await.unwrap().as_deref(), Some("1"));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        storage(&dir).set_item("acces_token", "\"abc\"").await.unwrap();

        let reopened = storage(&dir);
        assert_eq!(
            reopened.get_item("acces_token").await.unwrap().as_deref(),
            Some("\"abc\"")
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        std::fs::write(storage.path(), "{broken").unwrap();

        assert!(matches!(
            storage.get_item("acces_token").await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_write_replaces_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        std::fs::write(storage.path(), "{ not json").unwrap();

        storage.set_item("acces_token", "\"abc\"").await.unwrap();

        assert_eq!(
            storage.get_item("acces_token").await.unwrap().as_deref(),
            Some("\"abc\"")
        );
    }

    #[tokio::test]
    async fn test_remove_resets_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        std::fs::write(storage.path(), "{ not json").unwrap();

        storage.remove_item("acces_token").await.unwrap();

        assert_eq!(storage.get_item("acces_token").await.unwrap(), None);
    }
}

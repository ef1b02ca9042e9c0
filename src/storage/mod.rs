//! Durable client storage
//!
//! A small string key/value store playing the role browser `localStorage`
//! plays for a web client. The session store and the timed caches sit on
//! top of [`ClientStorage`]; the CLI uses [`FileStorage`], tests use
//! [`MemoryStorage`].

use crate::error::{FintripError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod types;
pub use types::{keys, CookieRecord};

/// String key/value storage shared by the session store and caches.
pub trait ClientStorage: Send + Sync {
    /// Returns the stored value for `key`, or `None` when absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Lists every stored key.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Resolve the directory holding the storage files.
///
/// `FINTRIP_STORAGE_DIR` wins over the platform data directory.
pub fn default_storage_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINTRIP_STORAGE_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let proj_dirs = ProjectDirs::from("com", "fintrip", "fintrip")
        .ok_or_else(|| FintripError::Storage("Could not determine data directory".into()))?;

    Ok(proj_dirs.data_dir().to_path_buf())
}

/// JSON-file backed storage
///
/// The whole store is a single JSON object of string values. Every mutation
/// is a read-modify-write under a mutex, written to a temporary file and
/// renamed into place so a crash never leaves a half-written store.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create storage backed by the file at `path`.
    ///
    /// The parent directory is created if needed; the file itself is only
    /// created on the first write.
    ///
    /// # Examples
    ///
    /// ```
    /// use fintrip::storage::{ClientStorage, FileStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = FileStorage::new_with_path(dir.path().join("storage.json")).unwrap();
    /// storage.set_item("token", "abc").unwrap();
    /// assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create storage directory")
                .map_err(|e| FintripError::Storage(e.to_string()))?;
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_contents(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FintripError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
            .into()),
        }
    }

    fn parse_map(&self, contents: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(contents).map_err(|e| {
            FintripError::Storage(format!("Corrupt storage file {}: {}", self.path.display(), e))
                .into()
        })
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match self.read_contents()? {
            Some(contents) => self.parse_map(&contents),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Like `read_map`, but a corrupt file is moved aside and writing starts
    /// over from an empty store.
    fn read_map_for_update(&self) -> Result<BTreeMap<String, String>> {
        let contents = match self.read_contents()? {
            Some(contents) => contents,
            None => return Ok(BTreeMap::new()),
        };

        match self.parse_map(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                let aside = self.path.with_extension("json.corrupt");
                tracing::warn!("{}; moving it to {}", e, aside.display());
                if let Err(e) = std::fs::rename(&self.path, &aside) {
                    tracing::warn!("failed to move corrupt storage file aside: {}", e);
                }
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");

        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                FintripError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
                    .into()
            })
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| FintripError::Storage("storage lock poisoned".into()))?;
        let mut map = self.read_map_for_update()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl ClientStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| FintripError::Storage("storage lock poisoned".into()))?;
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| FintripError::Storage("storage lock poisoned".into()))?;
        Ok(self.read_map()?.into_keys().collect())
    }
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| FintripError::Storage("storage lock poisoned".into()).into())
    }
}

impl ClientStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("token").unwrap(), None);

        storage.set_item("token", "T1").unwrap();
        assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("T1"));

        storage.remove_item("token").unwrap();
        assert_eq!(storage.get_item("token").unwrap(), None);

        // removing twice is fine
        storage.remove_item("token").unwrap();
    }

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new_with_path(dir.path().join("storage.json")).unwrap();
        assert_eq!(storage.get_item("anything").unwrap(), None);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = FileStorage::new_with_path(&path).unwrap();
        first.set_item("token", "T1").unwrap();
        first.set_item("user", r#"{"fullName":"A"}"#).unwrap();

        let second = FileStorage::new_with_path(&path).unwrap();
        assert_eq!(second.get_item("token").unwrap().as_deref(), Some("T1"));
        assert_eq!(
            second.keys().unwrap(),
            vec!["token".to_string(), "user".to_string()]
        );
    }

    #[test]
    fn test_file_storage_recovers_from_corrupt_file_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{truncated").unwrap();

        let storage = FileStorage::new_with_path(&path).unwrap();
        storage.remove_item("token").unwrap();
        assert!(storage.keys().unwrap().is_empty());

        storage.set_item("token", "T1").unwrap();
        assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("T1"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("storage.json.corrupt")).unwrap(),
            "{truncated"
        );
    }

    #[test]
    fn test_file_storage_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::new_with_path(&path).unwrap();
        let err = storage.get_item("token").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FintripError>(),
            Some(FintripError::Storage(_))
        ));
    }
}

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Key-value persistence for the durable memory scope.
pub trait DurableStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, MemoryError>;
    fn save(&self, key: &str, value: &str) -> Result<(), MemoryError>;
    fn remove(&self, key: &str) -> Result<(), MemoryError>;
}

/// One JSON file per key under a base directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, MemoryError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        tracing::info!("Durable store initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, MemoryError> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) || key.starts_with('.') {
            return Err(MemoryError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl DurableStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, MemoryError> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        let path = self.key_path(key)?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved durable key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MemoryError> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("Removed durable key: {}", key);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl DurableStore for InMemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, MemoryError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MemoryError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        assert!(store.load("memory").unwrap().is_none());

        store.save("memory", "[]").unwrap();
        assert_eq!(store.load("memory").unwrap().as_deref(), Some("[]"));
        assert!(!temp_dir.path().join("memory.tmp").exists());

        store.remove("memory").unwrap();
        assert!(store.load("memory").unwrap().is_none());
        store.remove("memory").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        assert!(matches!(
            store.save("../escape", "x"),
            Err(MemoryError::InvalidKey(_))
        ));
    }
}

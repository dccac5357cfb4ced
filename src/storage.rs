//! String-keyed persistent slots backing the guest cart.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A flat key-value store holding serialized strings.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a key that does not exist succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.read().map_err(|_| StorageError::Unavailable("memory storage poisoned".into()))?;
        Ok(slots.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().map_err(|_| StorageError::Unavailable("memory storage poisoned".into()))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().map_err(|_| StorageError::Unavailable("memory storage poisoned".into()))?;
        slots.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key != "."
            && !key.contains("..")
            && !key.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if !valid { return Err(StorageError::InvalidKey(key.to_string())); }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write-then-rename so readers never see a half-written blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let s = MemoryStorage::new();
        assert_eq!(s.get_item("k").unwrap(), None);
        s.set_item("k", "v").unwrap();
        assert_eq!(s.get_item("k").unwrap().as_deref(), Some("v"));
        s.remove_item("k").unwrap();
        s.remove_item("k").unwrap();
        assert_eq!(s.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::new(dir.path().join("slots")).unwrap();
        s.set_item("guest_cart", "{}").unwrap();
        assert_eq!(s.get_item("guest_cart").unwrap().as_deref(), Some("{}"));
        assert!(s.dir().join("guest_cart.json").exists());
        s.remove_item("guest_cart").unwrap();
        s.remove_item("guest_cart").unwrap();
        assert_eq!(s.get_item("guest_cart").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::new(dir.path()).unwrap();
        assert!(matches!(s.get_item("../etc"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(s.set_item("a/b", "x"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(s.remove_item(""), Err(StorageError::InvalidKey(_))));
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::VfsError;
use crate::path;
use crate::provider::VfsProvider;

/// In-memory provider for tests and embedded data.
///
/// Clones share the same storage, so a test can keep a handle and inspect
/// what a store wrote after handing the provider over.
///
/// Directories are implicit: they exist whenever a file path contains that
/// directory prefix.
///
/// # Example
///
/// ```ignore
/// let mem = MemoryProvider::new();
/// mem.insert("Cooked/chars/hero.CMDL", cooked_bytes);
/// let store = ResourceStore::new(Box::new(mem.clone()), StoreConfig::default(), Game::Prime);
/// ```
#[derive(Clone)]
pub struct MemoryProvider {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryProvider {
    /// Create an empty in-memory provider.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a file at the given path, overwriting any existing file.
    ///
    /// The path is normalised the same way provider calls are; invalid
    /// paths are ignored with a warning.
    pub fn insert(&self, path: impl AsRef<str>, data: Vec<u8>) {
        match path::normalize(path.as_ref()) {
            Ok(key) => {
                self.files.write().insert(key, data);
            }
            Err(err) => log::warn!("MemoryProvider: ignoring insert: {err}"),
        }
    }

    /// Remove a file at the given path, returning its data if it existed.
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        let key = path::normalize(path).ok()?;
        self.files.write().remove(&key)
    }

    /// Snapshot of a file's contents.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        let key = path::normalize(path).ok()?;
        self.files.read().get(&key).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VfsProvider for MemoryProvider {
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let key = path::normalize(path)?;
        self.files
            .read()
            .get(&key)
            .cloned()
            .ok_or(VfsError::NotFound(key))
    }

    fn exists(&self, path: &str) -> Result<bool, VfsError> {
        let key = path::normalize(path)?;
        Ok(self.files.read().contains_key(&key))
    }

    fn size(&self, path: &str) -> Result<u64, VfsError> {
        let key = path::normalize(path)?;
        self.files
            .read()
            .get(&key)
            .map(|data| data.len() as u64)
            .ok_or(VfsError::NotFound(key))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), VfsError> {
        let key = path::normalize(path)?;
        self.files.write().insert(key, data.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), VfsError> {
        let key = path::normalize(path)?;
        self.files
            .write()
            .remove(&key)
            .map(|_| ())
            .ok_or(VfsError::NotFound(key))
    }

    fn delete_dir(&self, path: &str) -> Result<bool, VfsError> {
        // An implicit directory disappears with its last file, so there is
        // never an empty one left to remove.
        path::normalize_dir(path)?;
        Ok(false)
    }
}

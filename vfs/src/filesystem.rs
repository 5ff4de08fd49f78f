use std::path::{Path, PathBuf};

use crate::error::VfsError;
use crate::path;
use crate::provider::VfsProvider;

/// Filesystem provider rooted at a project directory.
///
/// Provider paths are normalised before being joined to the root, so `..`
/// segments never reach the filesystem.
///
/// # Example
///
/// ```ignore
/// let provider = FileSystemProvider::new("./projects/prime");
/// // Reads ./projects/prime/Cooked/chars/hero.CMDL
/// let bytes = provider.read("Cooked/chars/hero.CMDL")?;
/// ```
pub struct FileSystemProvider {
    root: PathBuf,
}

impl FileSystemProvider {
    /// Create a provider rooted at the given directory.
    ///
    /// The directory does not need to exist yet; it will be checked
    /// at read/write time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a file path to a full filesystem path.
    fn resolve(&self, path: &str) -> Result<PathBuf, VfsError> {
        Ok(self.root.join(path::normalize(path)?))
    }

    /// Resolve a directory path; the empty path is the root itself.
    fn resolve_dir(&self, path: &str) -> Result<PathBuf, VfsError> {
        let dir = path::normalize_dir(path)?;
        Ok(if dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(dir)
        })
    }
}

impl VfsProvider for FileSystemProvider {
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        Ok(std::fs::read(self.resolve(path)?)?)
    }

    fn exists(&self, path: &str) -> Result<bool, VfsError> {
        Ok(self.resolve(path)?.is_file())
    }

    fn size(&self, path: &str) -> Result<u64, VfsError> {
        Ok(std::fs::metadata(self.resolve(path)?)?.len())
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), VfsError> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full_path, data)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), VfsError> {
        std::fs::remove_file(self.resolve(path)?)?;
        Ok(())
    }

    fn delete_dir(&self, path: &str) -> Result<bool, VfsError> {
        let full_path = self.resolve_dir(path)?;
        if !full_path.is_dir() || std::fs::read_dir(&full_path)?.next().is_some() {
            return Ok(false);
        }
        std::fs::remove_dir(full_path)?;
        Ok(true)
    }
}

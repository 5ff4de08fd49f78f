use crate::VfsError;

/// Trait for byte-source backends.
///
/// All calls are blocking and run to completion before returning.
///
/// # Read vs Write
///
/// All providers must implement read operations (`read`, `exists`, `size`).
/// Write operations (`write`, `delete`, `delete_dir`) have default
/// implementations that return [`VfsError::ReadOnly`]. Providers that
/// support writes override them.
///
/// # Path Contract
///
/// Paths are relative to the provider's root, use forward slashes, and must
/// not contain `..`. Providers normalise their input with
/// [`path::normalize`](crate::path::normalize) and reject anything else with
/// [`VfsError::InvalidPath`]. The empty path names the root directory.
pub trait VfsProvider: Send + Sync + 'static {
    // --- Read operations (required) ---

    /// Read the entire contents of a file at the given path.
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    /// Check whether a file exists at the given path.
    fn exists(&self, path: &str) -> Result<bool, VfsError>;

    /// Size of a file in bytes.
    fn size(&self, path: &str) -> Result<u64, VfsError>;

    // --- Write operations (optional, default returns ReadOnly) ---

    /// Write data to a file, creating parent directories and overwriting
    /// any existing file.
    fn write(&self, _path: &str, _data: &[u8]) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }

    /// Delete a file at the given path.
    fn delete(&self, _path: &str) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }

    /// Remove a directory if it exists and is empty.
    ///
    /// Returns `Ok(false)` when the directory is missing or still has
    /// children.
    fn delete_dir(&self, _path: &str) -> Result<bool, VfsError> {
        Err(VfsError::ReadOnly)
    }
}

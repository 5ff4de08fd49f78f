//! Store error type.

use std::path::PathBuf;

use relic_core::FourCC;
use relic_serial::ArchiveError;
use relic_vfs::VfsError;
use thiserror::Error;

/// Failures behind the store's persistence and configuration calls.
///
/// Lifecycle operations (`load_*`, `unload_entry`, `register_*`) keep a
/// `bool`/`Option` surface and log these instead of returning them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("VFS error: {0}")]
    Vfs(#[from] VfsError),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to load {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("invalid cache file magic: {0}")]
    BadMagic(FourCC),
    #[error("cache file truncated at offset {0}")]
    Truncated(usize),
}

pub type StoreResult<T> = Result<T, StoreError>;

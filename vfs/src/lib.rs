//! Virtual file system layer for the Relic resource store.
//!
//! The store never touches `std::fs` for project files directly. It reads and
//! writes bytes through a [`VfsProvider`] rooted at the project directory.
//!
//! # Providers
//!
//! - [`MemoryProvider`]: in-memory storage for tests and embedded data (read-write)
//! - [`FileSystemProvider`]: native filesystem access (read-write, native only)
//!
//! Custom providers can implement the [`VfsProvider`] trait for packed
//! archives or other storage backends.
//!
//! # Read-Only vs Read-Write
//!
//! All providers must implement read operations. Write operations are optional
//! and default to returning [`VfsError::ReadOnly`], which the store logs.
//!
//! # Paths
//!
//! Provider paths are relative, use `/` separators and never contain `..`.
//! The [`path`] module normalises user input and carries the validity rules
//! the store applies to directory and resource names.

mod error;
#[cfg(all(feature = "filesystem", not(target_arch = "wasm32")))]
mod filesystem;
mod memory;
pub mod path;
mod provider;

pub use error::VfsError;
#[cfg(all(feature = "filesystem", not(target_arch = "wasm32")))]
pub use filesystem::FileSystemProvider;
pub use memory::MemoryProvider;
pub use provider::VfsProvider;

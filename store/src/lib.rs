//! # Relic Store
//!
//! The resource registry: every asset of a project as a [`ResourceEntry`]
//! placed in a virtual [`DirectoryTree`], loaded lazily through pluggable
//! [`ResourceLoader`]s and persisted as a text database plus a binary
//! metadata cache.
//!
//! ```ignore
//! let mut store = ResourceStore::open(Path::new("projects/prime"))?;
//! store.register_loader(ResourceType::Model, ModelLoader);
//! let hero = store.load_resource_path("chars/hero.CMDL");
//! drop(hero);
//! store.destroy_unreferenced_resources();
//! store.conditional_save_store()?;
//! ```

pub mod config;
pub mod dependency;
pub mod directory;
pub mod entry;
mod error;
pub mod resource;
mod store;

pub use config::{ProjectConfig, ProjectInfo, StoreConfig};
pub use dependency::{
    DependencyKind, DependencyNode, DependencyTree, ResourceDependency, ScriptInstanceDependency,
};
pub use directory::{DirId, DirectoryTree};
pub use entry::{EntryFlags, ResourceEntry};
pub use error::{StoreError, StoreResult};
pub use resource::{LoadRequest, Resource, ResourceLoader};
pub use store::ResourceStore;

/// Store library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Relic Core
//!
//! Vocabulary shared by every Relic crate: the [`Game`] a piece of content
//! belongs to, four-character codes, stable [`AssetId`]s and the catalogue of
//! [`ResourceType`]s the resource store knows how to track.

pub mod asset_id;
pub mod fourcc;
pub mod game;
pub mod resource_type;

pub use asset_id::{AssetId, IdLength};
pub use fourcc::FourCC;
pub use game::Game;
pub use resource_type::ResourceType;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("Relic Core v{} initialized", VERSION);
}

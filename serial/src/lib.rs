//! # Relic Serial
//!
//! A format-agnostic archive engine. Types describe their fields once in a
//! [`Serial`] impl; the [`Archive`] walks them and drives a text or binary
//! [`ArchiveBackend`] for reading or writing.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relic_serial::{Archive, ArchiveResult, Format, Param, Serial, SerialVersion};
//!
//! #[derive(Default)]
//! struct Door { locked: bool, key: String }
//!
//! impl Serial for Door {
//!     fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
//!         arc.param(Param::new("Locked", &mut self.locked).optional(false))?;
//!         arc.field("Key", &mut self.key)
//!     }
//! }
//!
//! let bytes = Format::Text.encode("Door", &mut door, SerialVersion::current(1, game))?;
//! let (door, version) = Format::Text.decode::<Door>(&bytes)?;
//! ```

mod archive;
mod backend;
mod binary;
pub mod containers;
mod error;
mod format;
mod hints;
mod param;
mod polymorphic;
mod serial;
mod text;
mod version;

pub use archive::{Archive, StackFrame};
pub use backend::ArchiveBackend;
pub use binary::{BinaryReader, BinaryWriter};
pub use containers::serialize_named_sequence;
pub use error::{ArchiveError, ArchiveResult};
pub use format::Format;
pub use hints::{ArchiveFlags, SerialHints};
pub use param::{Param, SerialDefault};
pub use polymorphic::{AbstractObject, BasicConstructor, ContextConstructor, ObjectFactory};
pub use serial::{serialize_enum, RawBuffer, Serial, SerialEnum, SerialKind};
pub use text::{TextNode, TextReader, TextWriter};
pub use version::{ArchiveVersion, SerialVersion};

/// Serial library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

//! Compact big-endian binary format.
//!
//! Fields are written back to back with no names, so every parameter is
//! always serialized (`NO_SKIPPING`). Strings and containers carry a `u32`
//! length prefix; nullable pointers carry a one-byte presence flag.

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

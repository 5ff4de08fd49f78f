//! The contract every physical format implements.

use relic_core::{AssetId, FourCC, IdLength};

use crate::error::ArchiveResult;
use crate::hints::{ArchiveFlags, SerialHints};

/// Primitive I/O operations the [`Archive`](crate::Archive) engine drives.
///
/// A backend is either a reader or a writer for one format. The engine owns
/// traversal, skipping and defaults; a backend only maps named scopes and
/// primitive values onto its physical layout. Every `serialize_*` method
/// writes `*value` when writing and overwrites it when reading.
pub trait ArchiveBackend {
    /// Mode and format flags. Must contain exactly one of `READER`/`WRITER`
    /// and exactly one of `TEXT`/`BINARY`.
    fn flags(&self) -> ArchiveFlags;

    /// Enter a named scope. Returns `false` when the entry is absent (readers)
    /// or the backend declines it. `param_end` is only called after `true`.
    fn param_begin(&mut self, name: &str, hints: SerialHints) -> ArchiveResult<bool>;

    fn param_end(&mut self) -> ArchiveResult<()>;

    /// Gate before a pointee is serialized. `present` is whether the live
    /// pointer is non-null. Returning `false` makes readers null the pointer.
    fn pre_serialize_pointer(&mut self, present: bool, hints: SerialHints) -> ArchiveResult<bool>;

    /// Native container length framing. Returns `false` to let the engine
    /// write the count as a `Size` attribute instead.
    fn serialize_array_size(&mut self, _size: &mut u32) -> ArchiveResult<bool> {
        Ok(false)
    }

    /// Most bytes a bulk read at the current position can produce, if the
    /// reader knows. Lengths above it are rejected before allocating.
    fn bulk_limit(&self) -> Option<usize> {
        None
    }

    fn serialize_bool(&mut self, value: &mut bool, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_i8(&mut self, value: &mut i8, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_u8(&mut self, value: &mut u8, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_i16(&mut self, value: &mut i16, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_u16(&mut self, value: &mut u16, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_i32(&mut self, value: &mut i32, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_u32(&mut self, value: &mut u32, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_i64(&mut self, value: &mut i64, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_u64(&mut self, value: &mut u64, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_f32(&mut self, value: &mut f32, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_f64(&mut self, value: &mut f64, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_string(&mut self, value: &mut String, hints: SerialHints) -> ArchiveResult<()>;
    fn serialize_fourcc(&mut self, value: &mut FourCC, hints: SerialHints) -> ArchiveResult<()>;

    /// `length` is the id width of the archive's game. Binary readers need
    /// it to know how many bytes to consume.
    fn serialize_asset_id(
        &mut self,
        value: &mut AssetId,
        length: IdLength,
        hints: SerialHints,
    ) -> ArchiveResult<()>;

    /// Raw byte block. Readers fill the already-sized slice.
    fn serialize_bulk_data(&mut self, data: &mut [u8], hints: SerialHints) -> ArchiveResult<()>;
}

use std::io::{self, Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use relic_core::{AssetId, FourCC, IdLength};

use crate::backend::ArchiveBackend;
use crate::error::{ArchiveError, ArchiveResult};
use crate::hints::{ArchiveFlags, SerialHints};

/// Reads fields back in the order a [`BinaryWriter`](crate::BinaryWriter)
/// wrote them. Truncated input surfaces as an `UnexpectedEof` I/O error.
#[derive(Debug)]
pub struct BinaryReader {
    cursor: Cursor<Vec<u8>>,
}

impl BinaryReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn read_length(&mut self) -> ArchiveResult<usize> {
        let len = self.cursor.read_u32::<BigEndian>()? as usize;
        if len > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("length {len} exceeds the {} remaining bytes", self.remaining()),
            )
            .into());
        }
        Ok(len)
    }
}

impl ArchiveBackend for BinaryReader {
    fn flags(&self) -> ArchiveFlags {
        ArchiveFlags::BINARY | ArchiveFlags::READER | ArchiveFlags::NO_SKIPPING
    }

    fn param_begin(&mut self, _name: &str, _hints: SerialHints) -> ArchiveResult<bool> {
        Ok(true)
    }

    fn param_end(&mut self) -> ArchiveResult<()> {
        Ok(())
    }

    fn pre_serialize_pointer(&mut self, _present: bool, _hints: SerialHints) -> ArchiveResult<bool> {
        Ok(self.cursor.read_u8()? != 0)
    }

    /// Every element takes at least one byte, so a count above the
    /// remaining input is corrupt.
    fn serialize_array_size(&mut self, size: &mut u32) -> ArchiveResult<bool> {
        let count = self.cursor.read_u32::<BigEndian>()?;
        if count as usize > self.remaining() {
            return Err(ArchiveError::ArraySize {
                count: count.into(),
                limit: self.remaining() as u64,
            });
        }
        *size = count;
        Ok(true)
    }

    fn bulk_limit(&self) -> Option<usize> {
        Some(self.remaining())
    }

    fn serialize_bool(&mut self, value: &mut bool, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_u8()? != 0;
        Ok(())
    }

    fn serialize_i8(&mut self, value: &mut i8, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_i8()?;
        Ok(())
    }

    fn serialize_u8(&mut self, value: &mut u8, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_u8()?;
        Ok(())
    }

    fn serialize_i16(&mut self, value: &mut i16, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_i16::<BigEndian>()?;
        Ok(())
    }

    fn serialize_u16(&mut self, value: &mut u16, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_u16::<BigEndian>()?;
        Ok(())
    }

    fn serialize_i32(&mut self, value: &mut i32, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_i32::<BigEndian>()?;
        Ok(())
    }

    fn serialize_u32(&mut self, value: &mut u32, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_u32::<BigEndian>()?;
        Ok(())
    }

    fn serialize_i64(&mut self, value: &mut i64, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_i64::<BigEndian>()?;
        Ok(())
    }

    fn serialize_u64(&mut self, value: &mut u64, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_u64::<BigEndian>()?;
        Ok(())
    }

    fn serialize_f32(&mut self, value: &mut f32, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_f32::<BigEndian>()?;
        Ok(())
    }

    fn serialize_f64(&mut self, value: &mut f64, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.cursor.read_f64::<BigEndian>()?;
        Ok(())
    }

    fn serialize_string(&mut self, value: &mut String, _hints: SerialHints) -> ArchiveResult<()> {
        let len = self.read_length()?;
        let mut bytes = vec![0u8; len];
        self.cursor.read_exact(&mut bytes)?;
        *value = String::from_utf8(bytes)?;
        Ok(())
    }

    fn serialize_fourcc(&mut self, value: &mut FourCC, _hints: SerialHints) -> ArchiveResult<()> {
        *value = FourCC::read(&mut self.cursor)?;
        Ok(())
    }

    fn serialize_asset_id(
        &mut self,
        value: &mut AssetId,
        length: IdLength,
        _hints: SerialHints,
    ) -> ArchiveResult<()> {
        *value = AssetId::read(&mut self.cursor, length)?;
        Ok(())
    }

    fn serialize_bulk_data(&mut self, data: &mut [u8], _hints: SerialHints) -> ArchiveResult<()> {
        self.cursor.read_exact(data)?;
        Ok(())
    }
}

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use relic_core::{AssetId, FourCC, IdLength};

use crate::backend::ArchiveBackend;
use crate::error::{ArchiveError, ArchiveResult};
use crate::hints::{ArchiveFlags, SerialHints};

/// Appends fields to an in-memory buffer.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    bytes: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl ArchiveBackend for BinaryWriter {
    fn flags(&self) -> ArchiveFlags {
        ArchiveFlags::BINARY | ArchiveFlags::WRITER | ArchiveFlags::NO_SKIPPING
    }

    fn param_begin(&mut self, _name: &str, _hints: SerialHints) -> ArchiveResult<bool> {
        Ok(true)
    }

    fn param_end(&mut self) -> ArchiveResult<()> {
        Ok(())
    }

    fn pre_serialize_pointer(&mut self, present: bool, _hints: SerialHints) -> ArchiveResult<bool> {
        self.bytes.write_u8(present as u8)?;
        Ok(present)
    }

    fn serialize_array_size(&mut self, size: &mut u32) -> ArchiveResult<bool> {
        self.bytes.write_u32::<BigEndian>(*size)?;
        Ok(true)
    }

    fn serialize_bool(&mut self, value: &mut bool, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_u8(*value as u8)?)
    }

    fn serialize_i8(&mut self, value: &mut i8, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_i8(*value)?)
    }

    fn serialize_u8(&mut self, value: &mut u8, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_u8(*value)?)
    }

    fn serialize_i16(&mut self, value: &mut i16, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_i16::<BigEndian>(*value)?)
    }

    fn serialize_u16(&mut self, value: &mut u16, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_u16::<BigEndian>(*value)?)
    }

    fn serialize_i32(&mut self, value: &mut i32, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_i32::<BigEndian>(*value)?)
    }

    fn serialize_u32(&mut self, value: &mut u32, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_u32::<BigEndian>(*value)?)
    }

    fn serialize_i64(&mut self, value: &mut i64, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_i64::<BigEndian>(*value)?)
    }

    fn serialize_u64(&mut self, value: &mut u64, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_u64::<BigEndian>(*value)?)
    }

    fn serialize_f32(&mut self, value: &mut f32, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_f32::<BigEndian>(*value)?)
    }

    fn serialize_f64(&mut self, value: &mut f64, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_f64::<BigEndian>(*value)?)
    }

    fn serialize_string(&mut self, value: &mut String, _hints: SerialHints) -> ArchiveResult<()> {
        self.bytes.write_u32::<BigEndian>(value.len() as u32)?;
        Ok(self.bytes.write_all(value.as_bytes())?)
    }

    fn serialize_fourcc(&mut self, value: &mut FourCC, _hints: SerialHints) -> ArchiveResult<()> {
        Ok(value.write(&mut self.bytes)?)
    }

    /// Ids are stored at the game's width, not their own. Narrowing would
    /// drop the high half, so a wider id is an error.
    fn serialize_asset_id(
        &mut self,
        value: &mut AssetId,
        length: IdLength,
        _hints: SerialHints,
    ) -> ArchiveResult<()> {
        if value.length() > length {
            return Err(ArchiveError::IdWidth { id: *value, length });
        }
        Ok(AssetId::new(value.value(), length).write(&mut self.bytes)?)
    }

    fn serialize_bulk_data(&mut self, data: &mut [u8], _hints: SerialHints) -> ArchiveResult<()> {
        Ok(self.bytes.write_all(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_big_endian() {
        let mut writer = BinaryWriter::new();
        writer.serialize_u16(&mut 0x0102, SerialHints::empty()).unwrap();
        writer.serialize_f32(&mut 1.0, SerialHints::empty()).unwrap();
        writer
            .serialize_string(&mut "hi".to_owned(), SerialHints::empty())
            .unwrap();
        assert_eq!(
            writer.into_bytes(),
            [1, 2, 0x3F, 0x80, 0, 0, 0, 0, 0, 2, b'h', b'i']
        );
    }

    #[test]
    fn asset_id_uses_requested_width() {
        let mut writer = BinaryWriter::new();
        let mut id = AssetId::from_u32(0xABCD);
        writer
            .serialize_asset_id(&mut id, IdLength::Bits64, SerialHints::empty())
            .unwrap();
        assert_eq!(writer.into_bytes(), [0, 0, 0, 0, 0, 0, 0xAB, 0xCD]);
    }

    #[test]
    fn asset_id_wider_than_archive_is_rejected() {
        let mut writer = BinaryWriter::new();
        let mut id = AssetId::from_u64(0x1_0000_0002);
        let err = writer
            .serialize_asset_id(&mut id, IdLength::Bits32, SerialHints::empty())
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::IdWidth { length: IdLength::Bits32, .. }
        ));
        assert!(writer.into_bytes().is_empty());
    }

    #[test]
    fn null_pointer_writes_flag() {
        let mut writer = BinaryWriter::new();
        assert!(!writer.pre_serialize_pointer(false, SerialHints::empty()).unwrap());
        assert!(writer.pre_serialize_pointer(true, SerialHints::empty()).unwrap());
        assert_eq!(writer.into_bytes(), [0, 1]);
    }
}

//! Stable asset identifiers.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// Storage width of an [`AssetId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdLength {
    Bits32,
    Bits64,
}

impl IdLength {
    /// Number of bytes the id occupies in binary streams.
    pub const fn byte_count(self) -> usize {
        match self {
            IdLength::Bits32 => 4,
            IdLength::Bits64 => 8,
        }
    }

    const fn mask(self) -> u64 {
        match self {
            IdLength::Bits32 => u32::MAX as u64,
            IdLength::Bits64 => u64::MAX,
        }
    }
}

/// Identifier of one asset, 32 or 64 bits wide depending on the game.
///
/// The all-ones value of each width is reserved as the invalid id.
/// Two ids with the same numeric value but different widths are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId {
    value: u64,
    length: IdLength,
}

impl AssetId {
    pub const INVALID_32: AssetId = AssetId {
        value: u32::MAX as u64,
        length: IdLength::Bits32,
    };

    pub const INVALID_64: AssetId = AssetId {
        value: u64::MAX,
        length: IdLength::Bits64,
    };

    /// Create an id, truncating `value` to the requested width.
    pub const fn new(value: u64, length: IdLength) -> Self {
        Self {
            value: value & length.mask(),
            length,
        }
    }

    pub const fn from_u32(value: u32) -> Self {
        Self::new(value as u64, IdLength::Bits32)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self::new(value, IdLength::Bits64)
    }

    /// The reserved invalid id for a width.
    pub const fn invalid(length: IdLength) -> Self {
        match length {
            IdLength::Bits32 => Self::INVALID_32,
            IdLength::Bits64 => Self::INVALID_64,
        }
    }

    pub const fn value(&self) -> u64 {
        self.value
    }

    pub const fn length(&self) -> IdLength {
        self.length
    }

    pub fn is_valid(&self) -> bool {
        self.value != self.length.mask()
    }

    /// Random id of the given width, never the invalid value.
    pub fn random(length: IdLength) -> Self {
        loop {
            let id = Self::new(rand::random::<u64>(), length);
            if id.is_valid() {
                return id;
            }
        }
    }

    /// Deterministic 64-bit id derived from a path string.
    pub fn from_path_hash(path: &str) -> Self {
        Self::new(xxhash_rust::xxh3::xxh3_64(path.as_bytes()), IdLength::Bits64)
    }

    /// Parse a hex id with or without a `0x` prefix.
    ///
    /// Up to 8 digits parse as a 32-bit id, 9 to 16 digits as a 64-bit id.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.is_empty() || digits.len() > 16 {
            return None;
        }
        let value = u64::from_str_radix(digits, 16).ok()?;
        let length = if digits.len() <= 8 {
            IdLength::Bits32
        } else {
            IdLength::Bits64
        };
        Some(Self::new(value, length))
    }

    /// Bare upper-case hex digits padded to the id's width, e.g. `0001BEEF`.
    pub fn to_hex(&self) -> String {
        match self.length {
            IdLength::Bits32 => format!("{:08X}", self.value),
            IdLength::Bits64 => format!("{:016X}", self.value),
        }
    }

    /// Read a big-endian id of the given width.
    pub fn read<R: Read>(reader: &mut R, length: IdLength) -> io::Result<Self> {
        let value = match length {
            IdLength::Bits32 => reader.read_u32::<BigEndian>()? as u64,
            IdLength::Bits64 => reader.read_u64::<BigEndian>()?,
        };
        Ok(Self::new(value, length))
    }

    /// Write the id big-endian at its own width.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self.length {
            IdLength::Bits32 => writer.write_u32::<BigEndian>(self.value as u32),
            IdLength::Bits64 => writer.write_u64::<BigEndian>(self.value),
        }
    }
}

/// The invalid 32-bit id. Readers overwrite it at the archive's width.
impl Default for AssetId {
    fn default() -> Self {
        Self::INVALID_32
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

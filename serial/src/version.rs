//! Archive and file versioning.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use relic_core::{FourCC, Game};

/// Revisions of the archive protocol itself.
///
/// Distinct from a file's own schema revision, which producers track in
/// [`SerialVersion::file_version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum ArchiveVersion {
    Initial = 0,
    /// Binary container sizes became 32-bit. Earlier binary archives frame
    /// counts as `u16`.
    BinarySize32 = 1,
    /// Polymorphic pointers stopped carrying a redundant type tag.
    Refactor = 2,
}

impl ArchiveVersion {
    pub const CURRENT: ArchiveVersion = ArchiveVersion::Refactor;

    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// The three version values every top-level document starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerialVersion {
    pub archive_version: u16,
    pub file_version: u16,
    pub game: Game,
}

impl SerialVersion {
    pub const fn new(archive_version: u16, file_version: u16, game: Game) -> Self {
        Self {
            archive_version,
            file_version,
            game,
        }
    }

    /// Current archive version with the given file version and game.
    pub const fn current(file_version: u16, game: Game) -> Self {
        Self::new(ArchiveVersion::CURRENT.as_u16(), file_version, game)
    }

    /// Read the fixed binary record: `u16 archive, u16 file, FourCC game`.
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let archive_version = reader.read_u16::<BigEndian>()?;
        let file_version = reader.read_u16::<BigEndian>()?;
        let game = Game::from_id(FourCC::read(reader)?);
        Ok(Self::new(archive_version, file_version, game))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<BigEndian>(self.archive_version)?;
        writer.write_u16::<BigEndian>(self.file_version)?;
        self.game.id().write(writer)
    }
}

impl Default for SerialVersion {
    fn default() -> Self {
        Self::current(0, Game::Unknown)
    }
}

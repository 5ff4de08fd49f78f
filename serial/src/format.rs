//! Whole-document encoding.
//!
//! A document is a version header followed by the body of one root object.

use crate::archive::Archive;
use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::ArchiveResult;
use crate::serial::Serial;
use crate::text::{TextReader, TextWriter};
use crate::version::SerialVersion;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// RON element tree, human-readable.
    Text,
    /// Compact big-endian binary.
    Binary,
}

impl Format {
    /// Encode `value` as a document. `root_name` names the text root element
    /// and is ignored by the binary format.
    pub fn encode<T: Serial>(
        self,
        root_name: &str,
        value: &mut T,
        version: SerialVersion,
    ) -> ArchiveResult<Vec<u8>> {
        match self {
            Format::Text => {
                let mut arc = Archive::with_version(TextWriter::new(root_name), version);
                arc.serialize_version()?;
                value.serialize(&mut arc)?;
                Ok(arc.into_backend().into_string()?.into_bytes())
            }
            Format::Binary => {
                let mut arc = Archive::with_version(BinaryWriter::new(), version);
                arc.serialize_version()?;
                value.serialize(&mut arc)?;
                Ok(arc.into_backend().into_bytes())
            }
        }
    }

    /// Decode a document, returning the root object and the version it was
    /// written with.
    pub fn decode<T: Serial + Default>(self, bytes: &[u8]) -> ArchiveResult<(T, SerialVersion)> {
        let mut value = T::default();
        let version = match self {
            Format::Text => {
                let mut arc = Archive::new(TextReader::from_bytes(bytes)?);
                arc.serialize_version()?;
                value.serialize(&mut arc)?;
                arc.version()
            }
            Format::Binary => {
                let mut arc = Archive::new(BinaryReader::new(bytes.to_vec()));
                arc.serialize_version()?;
                value.serialize(&mut arc)?;
                arc.version()
            }
        };
        log::debug!("decoded {:?} document, version {:?}", self, version);
        Ok((value, version))
    }
}

//! Resource database and cache file persistence.
//!
//! The database is a text archive listing every project entry. The cache
//! file is binary:
//!
//! ```text
//! "CACH" | u16 archive, u16 file, FourCC game | u32 count
//! count * ( id | u32 length | EntryCache payload )
//! ```
//!
//! Each record carries its own length, so records for unknown ids (or ones
//! that fail to parse) are skipped without losing the cursor.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use relic_core::{AssetId, FourCC, ResourceType};
use relic_serial::{
    serialize_named_sequence, Archive, ArchiveResult, Serial, SerialHints, SerialKind,
    SerialVersion, TextReader, TextWriter,
};

use super::ResourceStore;
use crate::entry::ResourceEntry;
use crate::error::{StoreError, StoreResult};

const CACHE_MAGIC: FourCC = FourCC::new(b"CACH");

/// Text root element of the resource database.
const DATABASE_ROOT: &str = "ResourceDB";

/// One `Resource` element of the database.
#[derive(Debug, Clone)]
struct DatabaseRecord {
    id: AssetId,
    resource_type: ResourceType,
    directory: String,
    name: String,
}

impl Default for DatabaseRecord {
    fn default() -> Self {
        Self {
            id: AssetId::INVALID_32,
            resource_type: ResourceType::Invalid,
            directory: String::new(),
            name: String::new(),
        }
    }
}

impl Serial for DatabaseRecord {
    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        arc.field_hinted(
            "ID",
            &mut self.id,
            SerialHints::ATTRIBUTE | SerialHints::HEX_DISPLAY,
        )?;
        arc.field_hinted("Type", &mut self.resource_type, SerialHints::ATTRIBUTE)?;
        arc.field_hinted("Directory", &mut self.directory, SerialHints::ATTRIBUTE)?;
        arc.field_hinted("Name", &mut self.name, SerialHints::ATTRIBUTE)
    }
}

#[derive(Default)]
struct Records(Vec<DatabaseRecord>);

impl Serial for Records {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        serialize_named_sequence(arc, &mut self.0, "Resource")
    }
}

impl ResourceStore {
    /// Read or write the database body: `RawDir`, `CookedDir` and one
    /// `Resource` record per project entry. Reading registers every record.
    pub fn serialize_resource_database(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let mut records = Records::default();
        if arc.is_writer() {
            let mut project: Vec<&ResourceEntry> =
                self.entries.values().filter(|e| !e.is_transient()).collect();
            project.sort_by_key(|e| e.id());
            records.0 = project
                .into_iter()
                .map(|entry| DatabaseRecord {
                    id: entry.id(),
                    resource_type: entry.resource_type(),
                    directory: entry
                        .directory()
                        .map_or_else(String::new, |dir| self.tree.full_path(dir)),
                    name: entry.name().to_owned(),
                })
                .collect();
        }

        arc.field("RawDir", &mut self.config.raw_dir)?;
        arc.field("CookedDir", &mut self.config.cooked_dir)?;
        arc.field("Resources", &mut records)?;

        if arc.is_reader() {
            for record in records.0 {
                self.register_resource(record.id, record.resource_type, &record.directory, &record.name);
            }
        }
        Ok(())
    }

    /// Load the resource database and register its entries. The store takes
    /// the database's game.
    pub fn load_resource_database(&mut self) -> StoreResult<()> {
        let bytes = self.provider.read(&self.config.database)?;
        let mut arc = Archive::new(TextReader::from_bytes(&bytes)?);
        arc.serialize_version()?;
        if self.game != relic_core::Game::Unknown && self.game != arc.game() {
            log::warn!(
                "Resource database is for {} but the project is {}",
                arc.game(),
                self.game
            );
        }
        self.game = arc.game();
        self.serialize_resource_database(&mut arc)?;
        self.database_dirty = false;
        log::info!(
            "Loaded resource database {} ({} entries)",
            self.config.database,
            self.entries.len()
        );
        Ok(())
    }

    pub fn save_resource_database(&mut self) -> StoreResult<()> {
        let version = SerialVersion::current(0, self.game);
        let mut arc = Archive::with_version(TextWriter::new(DATABASE_ROOT), version);
        arc.serialize_version()?;
        self.serialize_resource_database(&mut arc)?;
        let text = arc.into_backend().into_string()?;
        if let Err(e) = self.provider.write(&self.config.database, text.as_bytes()) {
            log::error!("Failed to save resource database {}: {e}", self.config.database);
            return Err(e.into());
        }
        self.database_dirty = false;
        log::info!("Saved resource database {}", self.config.database);
        Ok(())
    }

    /// Load cached entry metadata. Records for ids that are not registered
    /// project entries are skipped.
    pub fn load_cache_file(&mut self) -> StoreResult<()> {
        let data = self.provider.read(&self.config.cache_file)?;
        let mut cursor = Cursor::new(data.as_slice());

        let magic = FourCC::read(&mut cursor)?;
        if magic != CACHE_MAGIC {
            return Err(StoreError::BadMagic(magic));
        }
        let version = SerialVersion::read(&mut cursor)?;
        let count = cursor.read_u32::<BigEndian>()?;

        let mut applied = 0;
        for _ in 0..count {
            let id = AssetId::read(&mut cursor, version.game.id_length())?;
            let size = cursor.read_u32::<BigEndian>()? as usize;
            let start = cursor.position() as usize;
            let end = start + size;
            if end > data.len() {
                return Err(StoreError::Truncated(start));
            }

            if let Some(entry) = self.entries.get_mut(&id).filter(|e| !e.is_transient()) {
                match entry.load_cache_data(&data[start..end], version) {
                    Ok(()) => applied += 1,
                    Err(e) => log::warn!("Ignoring unreadable cache data for {id}: {e}"),
                }
            }
            cursor.set_position(end as u64);
        }

        self.cache_dirty = false;
        log::debug!("Applied {applied} of {count} cache records");
        Ok(())
    }

    pub fn save_cache_file(&mut self) -> StoreResult<()> {
        let version = SerialVersion::current(0, self.game);
        let id_length = self.game.id_length();

        let mut ids: Vec<AssetId> = self
            .entries
            .values()
            .filter(|e| !e.is_transient())
            .map(ResourceEntry::id)
            .collect();
        ids.sort();

        // Records that can't be written are skipped so the rest survive.
        let mut records = Vec::new();
        let mut count = 0u32;
        for id in ids {
            if id.length() != id_length {
                log::error!("Not caching {id}: ids in {} are {id_length:?}", self.game);
                continue;
            }
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            match entry.save_cache_data(version) {
                Ok(payload) => {
                    id.write(&mut records)?;
                    records.write_u32::<BigEndian>(payload.len() as u32)?;
                    records.extend_from_slice(&payload);
                    count += 1;
                }
                Err(e) => log::error!("Not caching {id}: {e}"),
            }
        }

        let mut out = Vec::new();
        CACHE_MAGIC.write(&mut out)?;
        version.write(&mut out)?;
        out.write_u32::<BigEndian>(count)?;
        out.extend_from_slice(&records);

        if let Err(e) = self.provider.write(&self.config.cache_file, &out) {
            log::error!("Failed to save cache file {}: {e}", self.config.cache_file);
            return Err(e.into());
        }
        self.cache_dirty = false;
        Ok(())
    }

    /// Save whichever of the database and cache file is dirty.
    pub fn conditional_save_store(&mut self) -> StoreResult<()> {
        if self.database_dirty {
            self.save_resource_database()?;
        }
        if self.cache_dirty {
            self.save_cache_file()?;
        }
        Ok(())
    }
}

//! Per-asset metadata tracked by the store.

use std::cell::Cell;
use std::rc::Rc;

use relic_core::{AssetId, FourCC, Game, ResourceType};
use relic_serial::{
    Archive, ArchiveResult, BinaryReader, BinaryWriter, Param, SerialHints, SerialVersion,
};

use crate::dependency::DependencyTree;
use crate::directory::DirId;
use crate::resource::{self, Resource};

bitflags::bitflags! {
    /// State flags of a [`ResourceEntry`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u32 {
        /// The raw asset changed since it was last cooked.
        const NEEDS_RECOOK = 1 << 0;
        /// Not part of the project database.
        const TRANSIENT = 1 << 1;
        const HAS_THUMBNAIL = 1 << 2;
        /// Flags persisted in the cache file.
        const SAVED = Self::NEEDS_RECOOK.bits() | Self::HAS_THUMBNAIL.bits();
    }
}

/// One tracked asset: identity, location, flags, and the payload while it
/// is loaded.
///
/// Entries are owned by the [`ResourceStore`](crate::ResourceStore);
/// everything that changes an entry's registration goes through the store.
pub struct ResourceEntry {
    id: AssetId,
    resource_type: ResourceType,
    game: Game,
    pub(crate) directory: Option<DirId>,
    name: String,
    uppercase_name: String,
    pub(crate) flags: EntryFlags,
    pub(crate) cached_size: Cell<Option<u64>>,
    pub(crate) payload: Option<Rc<dyn Resource>>,
    pub(crate) dependencies: Option<Box<DependencyTree>>,
}

impl ResourceEntry {
    pub(crate) fn new(
        id: AssetId,
        resource_type: ResourceType,
        game: Game,
        directory: Option<DirId>,
        name: &str,
        transient: bool,
    ) -> Self {
        let mut flags = EntryFlags::empty();
        flags.set(EntryFlags::TRANSIENT, transient);
        Self {
            id,
            resource_type,
            game,
            directory,
            name: name.to_owned(),
            uppercase_name: name.to_uppercase(),
            flags,
            cached_size: Cell::new(None),
            payload: None,
            dependencies: None,
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn directory(&self) -> Option<DirId> {
        self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upper-cased name, used for case-insensitive sorting and filtering.
    pub fn uppercase_name(&self) -> &str {
        &self.uppercase_name
    }

    pub(crate) fn rename(&mut self, name: &str) {
        self.name = name.to_owned();
        self.uppercase_name = name.to_uppercase();
        self.cached_size.set(None);
    }

    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    pub fn is_transient(&self) -> bool {
        self.flags.contains(EntryFlags::TRANSIENT)
    }

    pub fn needs_recook(&self) -> bool {
        self.flags.contains(EntryFlags::NEEDS_RECOOK)
    }

    pub fn has_thumbnail(&self) -> bool {
        self.flags.contains(EntryFlags::HAS_THUMBNAIL)
    }

    /// Whether the entry has a real name rather than its id.
    pub fn is_named(&self) -> bool {
        !self.name.eq_ignore_ascii_case(&self.id.to_hex())
    }

    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }

    pub fn payload(&self) -> Option<&Rc<dyn Resource>> {
        self.payload.as_ref()
    }

    /// Whether the payload is held by anything besides this entry.
    pub fn is_referenced(&self) -> bool {
        self.payload.as_ref().is_some_and(resource::is_referenced)
    }

    pub fn dependencies(&self) -> Option<&DependencyTree> {
        self.dependencies.as_deref()
    }

    pub fn cooked_extension(&self) -> FourCC {
        self.resource_type.cooked_extension()
    }

    pub fn raw_extension(&self) -> String {
        self.resource_type.raw_extension()
    }

    // --- Cache data ---

    /// Fields stored in the cache file: the saved flag subset and the
    /// dependency tree.
    pub fn serialize_cache_data(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let mut saved = (self.flags & EntryFlags::SAVED).bits();
        arc.param(Param::new("Flags", &mut saved).hex())?;
        if arc.is_reader() {
            let loaded = EntryFlags::from_bits_truncate(saved) & EntryFlags::SAVED;
            self.flags = (self.flags - EntryFlags::SAVED) | loaded;
        }
        arc.field("Dependencies", &mut self.dependencies)
    }

    /// Encode this entry's cache record.
    pub fn save_cache_data(&mut self, version: SerialVersion) -> ArchiveResult<Vec<u8>> {
        let mut arc = Archive::with_version(BinaryWriter::new(), version);
        if arc.param_begin("EntryCache", SerialHints::empty())? {
            self.serialize_cache_data(&mut arc)?;
            arc.param_end()?;
        }
        Ok(arc.into_backend().into_bytes())
    }

    /// Decode a cache record written by [`save_cache_data`](Self::save_cache_data).
    pub fn load_cache_data(&mut self, data: &[u8], version: SerialVersion) -> ArchiveResult<()> {
        let mut arc = Archive::with_version(BinaryReader::new(data.to_vec()), version);
        if arc.param_begin("EntryCache", SerialHints::empty())? {
            self.serialize_cache_data(&mut arc)?;
            arc.param_end()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceEntry")
            .field("id", &self.id)
            .field("type", &self.resource_type)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

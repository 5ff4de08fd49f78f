//! The resource registry.
//!
//! [`ResourceStore`] owns every [`ResourceEntry`], the virtual directory tree
//! they live in, and the set of currently loaded payloads. Project files are
//! reached through a [`VfsProvider`] rooted at the project directory;
//! transient entries point at arbitrary filesystem locations and are read
//! with `std::fs` directly.
//!
//! Persistence (database and cache file) lives in `persist.rs`, the
//! `.contents.txt` name importer in `import.rs`.

mod import;
mod persist;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use relic_core::{AssetId, FourCC, Game, ResourceType};
use relic_vfs::{path, FileSystemProvider, VfsError, VfsProvider};

use crate::config::{self, ProjectConfig, StoreConfig, PROJECT_FILE};
use crate::dependency::DependencyTree;
use crate::directory::{DirId, DirectoryTree};
use crate::entry::{EntryFlags, ResourceEntry};
use crate::error::StoreResult;
use crate::resource::{LoadRequest, Resource, ResourceLoader};

/// Registry of every asset in a project plus any transient assets loaded
/// from outside it.
pub struct ResourceStore {
    provider: Box<dyn VfsProvider>,
    config: StoreConfig,
    game: Game,
    tree: DirectoryTree,
    entries: HashMap<AssetId, ResourceEntry>,
    loaded: BTreeSet<AssetId>,
    transient_load_dir: String,
    loaders: HashMap<ResourceType, Rc<dyn ResourceLoader>>,
    loading: HashSet<AssetId>,
    database_dirty: bool,
    cache_dirty: bool,
}

impl ResourceStore {
    pub fn new(provider: Box<dyn VfsProvider>, config: StoreConfig, game: Game) -> Self {
        let transient_load_dir = trim_dir(&config.transient_load_dir).to_owned();
        Self {
            provider,
            config,
            game,
            tree: DirectoryTree::new(),
            entries: HashMap::new(),
            loaded: BTreeSet::new(),
            transient_load_dir,
            loaders: HashMap::new(),
            loading: HashSet::new(),
            database_dirty: false,
            cache_dirty: false,
        }
    }

    /// Open the project at `root`, reading `project.toml` if present.
    pub fn open(root: &Path) -> StoreResult<Self> {
        let config = config::load_or_default(&root.join(PROJECT_FILE));
        Self::open_with_config(root, config)
    }

    /// Open the project at `root` with an explicit configuration.
    ///
    /// The database is loaded when it exists. A missing or damaged cache
    /// file is logged and otherwise ignored.
    pub fn open_with_config(root: &Path, config: ProjectConfig) -> StoreResult<Self> {
        let provider = Box::new(FileSystemProvider::new(root));
        let mut store = Self::new(provider, config.store, config.project.game);
        if store.provider.exists(&store.config.database)? {
            store.load_resource_database()?;
            if let Err(e) = store.load_cache_file() {
                log::error!("Failed to load resource cache: {e}");
            }
        } else {
            log::info!("No resource database at {}, starting empty", store.config.database);
        }
        Ok(store)
    }

    // --- Accessors ---

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn VfsProvider {
        self.provider.as_ref()
    }

    pub fn directories(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Ids of every loaded entry, in ascending order.
    pub fn loaded_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.loaded.iter().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.values()
    }

    pub fn is_database_dirty(&self) -> bool {
        self.database_dirty
    }

    pub fn is_cache_dirty(&self) -> bool {
        self.cache_dirty
    }

    pub fn transient_load_dir(&self) -> &str {
        &self.transient_load_dir
    }

    /// Directory searched by [`load_resource`](Self::load_resource) for
    /// ids that are not registered.
    pub fn set_transient_load_dir(&mut self, dir: &str) {
        self.transient_load_dir = trim_dir(dir).to_owned();
        log::info!("Set resource directory: {dir}");
    }

    /// Install the loader used for payloads of `resource_type`.
    pub fn register_loader<L: ResourceLoader + 'static>(&mut self, resource_type: ResourceType, loader: L) {
        self.loaders.insert(resource_type, Rc::new(loader));
    }

    // --- Lookup ---

    pub fn find_entry(&self, id: AssetId) -> Option<&ResourceEntry> {
        if !id.is_valid() {
            return None;
        }
        self.entries.get(&id)
    }

    pub fn is_resource_registered(&self, id: AssetId) -> bool {
        self.find_entry(id).is_some()
    }

    /// Find a project entry by its relative path, e.g. `chars/hero.CMDL`.
    ///
    /// The extension is optional. When present it must be the entry's
    /// cooked extension (four characters) or its raw extension.
    pub fn find_entry_by_path(&self, rel_path: &str) -> Option<&ResourceEntry> {
        let dir = self
            .tree
            .find_directory(self.tree.database_root(), path::parent(rel_path))?;
        let stem = path::file_stem(rel_path);
        let extension = path::extension(rel_path);
        self.tree
            .resources(dir)
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|entry| {
                entry.name().eq_ignore_ascii_case(stem)
                    && extension.map_or(true, |ext| extension_matches(entry, ext))
            })
    }

    /// Directory of an entry with a trailing `/`; `""` for the database root
    /// and for transient entries without a directory.
    pub fn directory_path(&self, id: AssetId) -> Option<String> {
        let entry = self.entries.get(&id)?;
        Some(entry.directory().map_or_else(String::new, |dir| self.tree.full_path(dir)))
    }

    /// Whether `dir` and `name` may locate a project resource: `dir` is
    /// relative and stays inside the project, `name` is a single component.
    pub fn is_valid_resource_path(dir: &str, name: &str) -> bool {
        path::is_valid_directory_path(dir) && path::is_valid_name(name)
    }

    // --- Registration ---

    /// Register a project resource.
    ///
    /// An id already tracked as transient is promoted in place. An id
    /// already tracked in the project is left alone and logged.
    pub fn register_resource(
        &mut self,
        id: AssetId,
        resource_type: ResourceType,
        dir: &str,
        name: &str,
    ) -> Option<&ResourceEntry> {
        if let Some(existing) = self.entries.get(&id) {
            if !existing.is_transient() {
                log::error!(
                    "Attempted to register resource that's already tracked in the database: {id} / {dir} / {name}"
                );
                return None;
            }
            debug_assert_eq!(existing.resource_type(), resource_type);
            if !self.add_to_project(id, dir, name) {
                return None;
            }
            return self.entries.get(&id);
        }

        if !id.is_valid() || !Self::is_valid_resource_path(dir, name) {
            log::error!("Invalid resource path, failed to register: {dir}{name}");
            return None;
        }
        if !self.has_project_width(id) {
            return None;
        }
        let root = self.tree.database_root();
        let directory = self.tree.find_child_directory(root, dir, true)?;
        self.tree.add_child_resource(directory, id);
        self.entries.insert(
            id,
            ResourceEntry::new(id, resource_type, self.game, Some(directory), name, false),
        );
        self.database_dirty = true;
        self.cache_dirty = true;
        self.entries.get(&id)
    }

    /// Project ids are stored at the game's width, so an id of another
    /// width can't be tracked in the project.
    fn has_project_width(&self, id: AssetId) -> bool {
        let expected = self.game.id_length();
        if id.length() != expected {
            log::error!(
                "Resource id {id} is {:?} but {} uses {expected:?}, refusing to add it to the project",
                id.length(),
                self.game
            );
            return false;
        }
        true
    }

    /// Register a transient resource under a fresh random id.
    ///
    /// `dir` is a filesystem directory (or `""` for none); `name` defaults
    /// to the id's hex form.
    pub fn register_transient_resource(
        &mut self,
        resource_type: ResourceType,
        dir: &str,
        name: &str,
    ) -> &ResourceEntry {
        let mut id = AssetId::random(self.game.id_length());
        while self.entries.contains_key(&id) {
            id = AssetId::random(self.game.id_length());
        }
        self.register_transient_resource_with_id(resource_type, id, dir, name)
    }

    /// Register a transient resource with a known id, or return the entry
    /// already tracked under that id.
    pub fn register_transient_resource_with_id(
        &mut self,
        resource_type: ResourceType,
        id: AssetId,
        dir: &str,
        name: &str,
    ) -> &ResourceEntry {
        if !self.entries.contains_key(&id) {
            let dir = trim_dir(dir);
            let directory = if dir.is_empty() {
                None
            } else {
                self.tree.transient_root(dir, true)
            };
            if let Some(directory) = directory {
                self.tree.add_child_resource(directory, id);
            }
            let name = if name.is_empty() { id.to_hex() } else { name.to_owned() };
            self.entries.insert(
                id,
                ResourceEntry::new(id, resource_type, self.game, directory, &name, true),
            );
        }
        &self.entries[&id]
    }

    // --- Loading ---

    /// Load a resource by id.
    ///
    /// Registered entries load through their own location. Unknown ids are
    /// looked up as `<id>.<cooked_type>` in the transient load directory;
    /// the transient entry created for that is removed again on failure.
    pub fn load_resource(&mut self, id: AssetId, cooked_type: FourCC) -> Option<Rc<dyn Resource>> {
        if !id.is_valid() {
            return None;
        }
        if self.entries.contains_key(&id) {
            return self.load_entry(id);
        }

        let Some(resource_type) = ResourceType::from_cooked_extension(&cooked_type.to_string())
        else {
            log::error!(
                "Can't load requested resource with ID \"{id}\"; can't locate resource. Loading raw assets from an arbitrary directory is unsupported."
            );
            return None;
        };

        let name = id.to_hex();
        let file = path::join(&self.transient_load_dir, &format!("{name}.{cooked_type}"));
        let dir = self.transient_load_dir.clone();
        self.register_transient_resource_with_id(resource_type, id, &dir, &name);

        let payload = match std::fs::read(&file) {
            Ok(data) => self.load_entry_from(id, &data),
            Err(e) => {
                log::error!("Unable to load resource; couldn't open file {file}: {e}");
                None
            }
        };
        if payload.is_none() {
            self.delete_resource_entry(id);
        }
        payload
    }

    /// Load a resource by path.
    ///
    /// Relative paths name project resources. Absolute paths name cooked
    /// files anywhere on disk and are tracked as transient entries keyed by
    /// the file name (when it is a hex id) or a hash of the path.
    pub fn load_resource_path(&mut self, file_path: &str) -> Option<Rc<dyn Resource>> {
        if !path::is_absolute(file_path) {
            let id = self.find_entry_by_path(file_path)?.id();
            return self.load_entry(id);
        }

        let dir = path::parent(file_path).to_owned();
        let name = path::file_stem(file_path).to_owned();
        let id = AssetId::from_hex(&name).unwrap_or_else(|| AssetId::from_path_hash(file_path));
        if let Some(payload) = self.entries.get(&id).and_then(ResourceEntry::payload) {
            return Some(Rc::clone(payload));
        }

        let extension = path::extension(file_path).unwrap_or_default().to_uppercase();
        let Some(resource_type) = ResourceType::from_cooked_extension(&extension) else {
            log::error!("Unable to load resource {file_path}; unrecognized extension: {extension}");
            return None;
        };
        let data = match std::fs::read(file_path) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Unable to load resource; couldn't open file {file_path}: {e}");
                return None;
            }
        };

        let previous = std::mem::replace(&mut self.transient_load_dir, trim_dir(&dir).to_owned());
        let created = !self.entries.contains_key(&id);
        self.register_transient_resource_with_id(resource_type, id, &dir, &name);
        let payload = self.load_entry_from(id, &data);
        if payload.is_none() && created {
            self.delete_resource_entry(id);
        }
        self.transient_load_dir = previous;
        payload
    }

    /// Load a registered entry from its own location.
    ///
    /// Returns the existing payload if already loaded. The raw file is
    /// preferred when the loader reads raw assets and one exists. Failures
    /// are logged and yield `None`.
    pub fn load_entry(&mut self, id: AssetId) -> Option<Rc<dyn Resource>> {
        let entry = self.entries.get(&id)?;
        if let Some(payload) = entry.payload() {
            return Some(Rc::clone(payload));
        }
        let loader = self.loader_for(entry.resource_type())?;
        match self.read_entry_source(entry, loader.supports_raw()) {
            Ok((data, raw)) => self.finish_load(id, &loader, &data, raw),
            Err(e) => {
                log::error!("Failed to open {}: {e}", self.describe(id));
                None
            }
        }
    }

    /// Load a registered entry from cooked bytes supplied by the caller.
    pub fn load_entry_from(&mut self, id: AssetId, data: &[u8]) -> Option<Rc<dyn Resource>> {
        let entry = self.entries.get(&id)?;
        if let Some(payload) = entry.payload() {
            return Some(Rc::clone(payload));
        }
        let loader = self.loader_for(entry.resource_type())?;
        self.finish_load(id, &loader, data, false)
    }

    fn loader_for(&self, resource_type: ResourceType) -> Option<Rc<dyn ResourceLoader>> {
        let loader = self.loaders.get(&resource_type).cloned();
        if loader.is_none() {
            log::error!("No loader registered for {resource_type} resources");
        }
        loader
    }

    fn read_entry_source(&self, entry: &ResourceEntry, prefer_raw: bool) -> StoreResult<(Vec<u8>, bool)> {
        if prefer_raw {
            if let Some(raw) = self.entry_asset_path(entry, true) {
                if self.source_exists(&raw, entry.is_transient()) {
                    return Ok((self.read_source(&raw, entry.is_transient())?, true));
                }
            }
        }
        let cooked = self
            .entry_asset_path(entry, false)
            .ok_or_else(|| VfsError::NotFound(format!("{} has no location", entry.name())))?;
        Ok((self.read_source(&cooked, entry.is_transient())?, false))
    }

    fn finish_load(
        &mut self,
        id: AssetId,
        loader: &Rc<dyn ResourceLoader>,
        data: &[u8],
        raw: bool,
    ) -> Option<Rc<dyn Resource>> {
        let request = self.load_request(id)?;
        if !self.loading.insert(id) {
            log::warn!("Circular load of {} ignored", self.describe(id));
            return None;
        }
        let payload = if raw {
            loader.load_raw(data, &request, self)
        } else {
            loader.load_cooked(data, &request, self)
        };
        self.loading.remove(&id);

        let Some(payload) = payload else {
            log::error!("Failed to load {}", self.describe(id));
            return None;
        };
        let entry = self.entries.get_mut(&id)?;
        if let Some(existing) = entry.payload() {
            return Some(Rc::clone(existing));
        }
        entry.payload = Some(Rc::clone(&payload));
        let build_dependencies = entry.dependencies.is_none();
        self.loaded.insert(id);
        if build_dependencies {
            self.rebuild_dependencies(id, &payload);
        }
        log::debug!("Loaded {}", self.describe(id));
        Some(payload)
    }

    fn load_request(&self, id: AssetId) -> Option<LoadRequest> {
        let entry = self.entries.get(&id)?;
        Some(LoadRequest {
            id,
            resource_type: entry.resource_type(),
            game: entry.game(),
            name: entry.name().to_owned(),
            directory: entry
                .directory()
                .map_or_else(String::new, |dir| self.tree.full_path(dir)),
        })
    }

    /// Release an entry's payload.
    ///
    /// Refuses (returns `false`) while anything else holds the payload.
    /// Transient entries are deleted once unloaded.
    pub fn unload_entry(&mut self, id: AssetId) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        if entry.is_referenced() {
            log::debug!("{} is still referenced, not unloading", entry.name());
            return false;
        }
        let payload = entry.payload.take();
        let transient = entry.is_transient();
        self.loaded.remove(&id);
        drop(payload);

        if transient {
            self.remove_entry(id);
            self.tree.remove_empty_transient_roots();
        }
        true
    }

    /// Unload every payload nobody else holds, repeating until a pass
    /// unloads nothing, then drop empty transient roots. Returns the number
    /// of payloads unloaded.
    pub fn destroy_unreferenced_resources(&mut self) -> usize {
        let mut total = 0;
        loop {
            let candidates: Vec<AssetId> = self
                .loaded
                .iter()
                .copied()
                .filter(|id| self.entries.get(id).is_some_and(|e| !e.is_referenced()))
                .collect();
            let unloaded = candidates
                .into_iter()
                .filter(|&id| self.unload_entry(id))
                .count();
            if unloaded == 0 {
                break;
            }
            total += unloaded;
        }
        self.tree.remove_empty_transient_roots();
        if total > 0 {
            log::debug!("Destroyed {total} unreferenced resources");
        }
        total
    }

    /// Unload (if needed) and remove an entry.
    pub fn delete_resource_entry(&mut self, id: AssetId) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        let transient = entry.is_transient();
        if entry.is_loaded() && !self.unload_entry(id) {
            return false;
        }
        if self.entries.contains_key(&id) {
            self.remove_entry(id);
        }
        if !transient {
            self.database_dirty = true;
            self.cache_dirty = true;
        }
        true
    }

    /// Detach an entry from its directory and forget it.
    fn remove_entry(&mut self, id: AssetId) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        self.loaded.remove(&id);
        if let Some(dir) = entry.directory() {
            self.tree.remove_child_resource(dir, id);
            if !entry.is_transient() {
                self.prune_directory(dir);
            }
        }
    }

    /// Remove `dir` and its ancestors while they are empty, along with their
    /// raw and cooked directories on disk.
    fn prune_directory(&mut self, dir: DirId) {
        for removed in self.tree.remove_empty_ancestors(dir) {
            for base in [&self.config.raw_dir, &self.config.cooked_dir] {
                if let Err(e) = self.provider.delete_dir(&path::join(base, &removed)) {
                    log::debug!("Could not remove {base}/{removed}: {e}");
                }
            }
        }
    }

    // --- Project membership ---

    /// Relocate a project entry, moving its raw and cooked files along.
    pub fn move_entry(&mut self, id: AssetId, dir: &str, name: &str) -> bool {
        if !Self::is_valid_resource_path(dir, name) {
            log::error!("Invalid resource path, failed to move {id}: {dir}{name}");
            return false;
        }
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        if entry.is_transient() {
            log::error!("Can't move transient resource {id}; add it to the project instead");
            return false;
        }
        let root = self.tree.database_root();
        let taken = self.tree.find_directory(root, dir).and_then(|target| {
            self.tree
                .resources(target)
                .iter()
                .filter_map(|other| self.entries.get(other))
                .find(|other| {
                    other.id() != id
                        && other.resource_type() == entry.resource_type()
                        && other.name().eq_ignore_ascii_case(name)
                })
                .map(ResourceEntry::id)
        });
        if let Some(other) = taken {
            log::error!("Can't move {id} to {dir}/{name}; the path is taken by {other}");
            return false;
        }
        let old_dir = entry.directory();
        let old_raw = self.entry_asset_path(entry, true);
        let old_cooked = self.entry_asset_path(entry, false);

        let Some(new_dir) = self.tree.find_child_directory(root, dir, true) else {
            return false;
        };
        if let Some(old) = old_dir {
            self.tree.remove_child_resource(old, id);
        }
        self.tree.add_child_resource(new_dir, id);
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        entry.directory = Some(new_dir);
        entry.rename(name);

        let entry = &self.entries[&id];
        let new_raw = self.entry_asset_path(entry, true);
        let new_cooked = self.entry_asset_path(entry, false);
        self.move_file(old_raw, new_raw);
        self.move_file(old_cooked, new_cooked);

        if let Some(old) = old_dir.filter(|&old| old != new_dir) {
            self.prune_directory(old);
        }
        self.database_dirty = true;
        log::info!("Moved {id} to {}{name}", self.tree.full_path(new_dir));
        true
    }

    fn move_file(&self, from: Option<String>, to: Option<String>) {
        let (Some(from), Some(to)) = (from, to) else {
            return;
        };
        if from == to || !self.provider.exists(&from).unwrap_or(false) {
            return;
        }
        let moved = self
            .provider
            .read(&from)
            .and_then(|data| self.provider.write(&to, &data))
            .and_then(|()| self.provider.delete(&from));
        if let Err(e) = moved {
            log::warn!("Failed to move {from} to {to}: {e}");
        }
    }

    /// Promote a transient entry into the project at `dir`/`name`.
    pub fn add_to_project(&mut self, id: AssetId, dir: &str, name: &str) -> bool {
        if !Self::is_valid_resource_path(dir, name) {
            log::error!("Invalid resource path, failed to add {id} to project: {dir}{name}");
            return false;
        }
        if !self.has_project_width(id) {
            return false;
        }
        let Some(old_dir) = self.entries.get(&id).filter(|e| e.is_transient()).map(ResourceEntry::directory)
        else {
            return false;
        };
        let root = self.tree.database_root();
        let Some(new_dir) = self.tree.find_child_directory(root, dir, true) else {
            return false;
        };
        if let Some(old) = old_dir {
            self.tree.remove_child_resource(old, id);
            self.tree.remove_empty_transient_roots();
        }
        self.tree.add_child_resource(new_dir, id);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.directory = Some(new_dir);
            entry.rename(name);
            entry.flags.remove(EntryFlags::TRANSIENT);
        }
        self.database_dirty = true;
        self.cache_dirty = true;
        true
    }

    /// Demote a project entry to transient. The entry stays registered
    /// until it is unloaded or deleted.
    pub fn remove_from_project(&mut self, id: AssetId) -> bool {
        let Some(entry) = self.entries.get_mut(&id).filter(|e| !e.is_transient()) else {
            return false;
        };
        entry.flags.insert(EntryFlags::TRANSIENT);
        let old_dir = entry.directory.take();
        if let Some(old) = old_dir {
            self.tree.remove_child_resource(old, id);
            self.prune_directory(old);
        }
        self.database_dirty = true;
        self.cache_dirty = true;
        true
    }

    // --- Metadata ---

    /// Rebuild an entry's dependency tree from its payload. An entry that
    /// was not loaded is loaded for the rebuild and released again, along
    /// with anything it pulled in.
    pub fn update_dependencies(&mut self, id: AssetId) -> bool {
        let was_loaded = self.entries.get(&id).is_some_and(ResourceEntry::is_loaded);
        let Some(payload) = self.load_entry(id) else {
            return false;
        };
        self.rebuild_dependencies(id, &payload);
        drop(payload);
        if !was_loaded {
            self.destroy_unreferenced_resources();
        }
        true
    }

    fn rebuild_dependencies(&mut self, id: AssetId, payload: &Rc<dyn Resource>) {
        let mut tree = DependencyTree::with_id_length(id, self.game.id_length());
        payload.build_dependency_tree(&mut tree);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.dependencies = Some(Box::new(tree));
            if !entry.is_transient() {
                self.cache_dirty = true;
            }
        }
    }

    pub fn set_needs_recook(&mut self, id: AssetId, needs_recook: bool) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        entry.flags.set(EntryFlags::NEEDS_RECOOK, needs_recook);
        if !entry.is_transient() {
            self.cache_dirty = true;
        }
        true
    }

    pub fn set_has_thumbnail(&mut self, id: AssetId, has_thumbnail: bool) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        entry.flags.set(EntryFlags::HAS_THUMBNAIL, has_thumbnail);
        if !entry.is_transient() {
            self.cache_dirty = true;
        }
        true
    }

    // --- Asset files ---

    /// `{raw_dir}/{dir}{name}.{ext}` for project entries, `{dir}/{name}.{ext}`
    /// for transient ones.
    pub fn raw_asset_path(&self, id: AssetId) -> Option<String> {
        self.entry_asset_path(self.entries.get(&id)?, true)
    }

    pub fn cooked_asset_path(&self, id: AssetId) -> Option<String> {
        self.entry_asset_path(self.entries.get(&id)?, false)
    }

    fn entry_asset_path(&self, entry: &ResourceEntry, raw: bool) -> Option<String> {
        let dir = entry.directory()?;
        let extension = if raw {
            entry.raw_extension()
        } else {
            entry.cooked_extension().to_string()
        };
        let file = format!("{}{}.{extension}", self.tree.full_path(dir), entry.name());
        if entry.is_transient() {
            return Some(file);
        }
        let base = if raw {
            &self.config.raw_dir
        } else {
            &self.config.cooked_dir
        };
        Some(path::join(base, &file))
    }

    pub fn has_raw_version(&self, id: AssetId) -> bool {
        self.entries.get(&id).is_some_and(|entry| {
            self.entry_asset_path(entry, true)
                .is_some_and(|p| self.source_exists(&p, entry.is_transient()))
        })
    }

    pub fn has_cooked_version(&self, id: AssetId) -> bool {
        self.entries.get(&id).is_some_and(|entry| {
            self.entry_asset_path(entry, false)
                .is_some_and(|p| self.source_exists(&p, entry.is_transient()))
        })
    }

    /// Size of the cooked file in bytes, 0 if it is missing. Cached until
    /// the entry moves.
    pub fn size(&self, id: AssetId) -> u64 {
        let Some(entry) = self.entries.get(&id) else {
            return 0;
        };
        if let Some(size) = entry.cached_size.get() {
            return size;
        }
        let size = self
            .entry_asset_path(entry, false)
            .and_then(|p| {
                if entry.is_transient() {
                    std::fs::metadata(&p).map(|m| m.len()).ok()
                } else {
                    self.provider.size(&p).ok()
                }
            })
            .unwrap_or(0);
        entry.cached_size.set(Some(size));
        size
    }

    fn source_exists(&self, file: &str, transient: bool) -> bool {
        if transient {
            Path::new(file).is_file()
        } else {
            self.provider.exists(file).unwrap_or(false)
        }
    }

    fn read_source(&self, file: &str, transient: bool) -> StoreResult<Vec<u8>> {
        if transient {
            Ok(std::fs::read(file)?)
        } else {
            Ok(self.provider.read(file)?)
        }
    }

    /// `name.EXT` of an entry, for log messages.
    pub(crate) fn describe(&self, id: AssetId) -> String {
        match self.entries.get(&id) {
            Some(entry) => format!("{}.{}", entry.name(), entry.cooked_extension()),
            None => id.to_string(),
        }
    }

    // --- Project lifetime ---

    /// Drop every project entry and reset the store to an empty state.
    ///
    /// All payloads must have been released by their holders first; any
    /// still loaded after garbage collection are listed in the log and
    /// trip a debug assertion.
    pub fn close_project(&mut self) {
        self.destroy_unreferenced_resources();

        if !self.loaded.is_empty() {
            log::error!("{} resources still loaded on project close:", self.loaded.len());
            for &id in &self.loaded {
                log::error!("\t{}", self.describe(id));
            }
        }
        debug_assert!(
            self.loaded.is_empty(),
            "resources still loaded on project close"
        );

        let project: Vec<AssetId> = self
            .entries
            .values()
            .filter(|entry| !entry.is_transient())
            .map(ResourceEntry::id)
            .collect();
        for id in project {
            self.entries.remove(&id);
            self.loaded.remove(&id);
        }
        self.tree.reset_database_root();
        self.game = Game::Unknown;
        self.database_dirty = false;
        self.cache_dirty = false;
        log::info!("Closed project");
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("game", &self.game)
            .field("entries", &self.entries.len())
            .field("loaded", &self.loaded.len())
            .field("database_dirty", &self.database_dirty)
            .field("cache_dirty", &self.cache_dirty)
            .finish()
    }
}

fn trim_dir(dir: &str) -> &str {
    let trimmed = dir.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !dir.is_empty() {
        &dir[..1]
    } else {
        trimmed
    }
}

fn extension_matches(entry: &ResourceEntry, extension: &str) -> bool {
    if extension.len() == 4 {
        extension.eq_ignore_ascii_case(&entry.cooked_extension().to_string())
    } else {
        extension.eq_ignore_ascii_case(&entry.raw_extension())
    }
}

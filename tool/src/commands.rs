//! Command implementations.
//!
//! Each command writes its report to `out` so it can run against any
//! writer.

use std::io::Write;
use std::path::Path;

use relic_core::ResourceType;
use relic_store::{config, ResourceEntry, ResourceStore, StoreResult};

use crate::args::{Args, Command};

/// Open the project named by `args`.
pub fn open_store(args: &Args) -> StoreResult<ResourceStore> {
    match &args.config {
        Some(file) => {
            let config = config::load_project(file)?;
            ResourceStore::open_with_config(&args.project, config)
        }
        None => ResourceStore::open(&args.project),
    }
}

pub fn run(command: &Command, store: &mut ResourceStore, out: &mut dyn Write) -> StoreResult<()> {
    match command {
        Command::Info => info(store, out),
        Command::List { resource_type } => list(store, *resource_type, out),
        Command::Check => check(store, out).map(|_| ()),
        Command::ImportNames { file, unnamed_only } => import_names(store, file, *unnamed_only, out),
    }
}

fn info(store: &ResourceStore, out: &mut dyn Write) -> StoreResult<()> {
    let transient = store.entries().filter(|e| e.is_transient()).count();
    writeln!(out, "Game:        {} ({})", store.game().display_name(), store.game())?;
    writeln!(out, "Entries:     {}", store.entry_count() - transient)?;
    writeln!(out, "Transient:   {transient}")?;
    writeln!(out, "Loaded:      {}", store.loaded_count())?;
    writeln!(out, "Directories: {} / {}", store.config().raw_dir, store.config().cooked_dir)?;
    writeln!(
        out,
        "Dirty:       database={} cache={}",
        store.is_database_dirty(),
        store.is_cache_dirty()
    )?;
    Ok(())
}

/// Project entries sorted by id, optionally of one type.
fn sorted_entries(store: &ResourceStore, filter: Option<ResourceType>) -> Vec<&ResourceEntry> {
    let mut entries: Vec<&ResourceEntry> = store
        .entries()
        .filter(|e| !e.is_transient())
        .filter(|e| filter.map_or(true, |ty| e.resource_type() == ty))
        .collect();
    entries.sort_by_key(|e| e.id());
    entries
}

fn list(store: &ResourceStore, filter: Option<ResourceType>, out: &mut dyn Write) -> StoreResult<()> {
    for entry in sorted_entries(store, filter) {
        let dir = store.directory_path(entry.id()).unwrap_or_default();
        writeln!(
            out,
            "{}  {:<13} {dir}{}.{}",
            entry.id(),
            entry.resource_type(),
            entry.name(),
            entry.cooked_extension()
        )?;
    }
    Ok(())
}

/// Report entries without a cooked file. Returns how many were missing.
fn check(store: &ResourceStore, out: &mut dyn Write) -> StoreResult<usize> {
    let mut missing = 0;
    for entry in sorted_entries(store, None) {
        if !store.has_cooked_version(entry.id()) {
            let path = store.cooked_asset_path(entry.id()).unwrap_or_default();
            writeln!(out, "missing {}  {path}", entry.id())?;
            missing += 1;
        }
    }
    if missing > 0 {
        log::warn!("{missing} entries have no cooked file");
    }
    writeln!(out, "{missing} missing")?;
    Ok(missing)
}

fn import_names(
    store: &mut ResourceStore,
    file: &Path,
    unnamed_only: bool,
    out: &mut dyn Write,
) -> StoreResult<()> {
    let moved = store.import_names_from_contents_txt(file, unnamed_only)?;
    writeln!(out, "Renamed {moved} entries")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_core::{AssetId, Game};
    use std::path::PathBuf;

    fn project() -> (tempfile::TempDir, ResourceStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("project.toml"),
            "[project]\nname = \"Prime\"\ngame = \"MPRM\"\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("Cooked/chars")).unwrap();
        std::fs::write(dir.path().join("Cooked/chars/hero.CMDL"), b"data").unwrap();

        let mut store = ResourceStore::open(dir.path()).unwrap();
        assert_eq!(store.game(), Game::Prime);
        store.register_resource(AssetId::from_u32(0x2), ResourceType::Texture, "ui", "logo");
        store.register_resource(AssetId::from_u32(0x1), ResourceType::Model, "chars", "hero");
        (dir, store)
    }

    fn output(command: Command, store: &mut ResourceStore) -> String {
        let mut out = Vec::new();
        run(&command, store, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn info_reports_counts() {
        let (_dir, mut store) = project();
        let text = output(Command::Info, &mut store);
        assert!(text.contains("Entries:     2"));
        assert!(text.contains("database=true"));
    }

    #[test]
    fn list_sorts_and_filters() {
        let (_dir, mut store) = project();
        let text = output(Command::List { resource_type: None }, &mut store);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x00000001"));
        assert!(lines[0].ends_with("chars/hero.CMDL"));

        let text = output(
            Command::List {
                resource_type: Some(ResourceType::Texture),
            },
            &mut store,
        );
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("ui/logo.TXTR"));
    }

    #[test]
    fn check_lists_missing_cooked_files() {
        let (_dir, store) = project();
        let mut out = Vec::new();
        assert_eq!(check(&store, &mut out).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("missing 0x00000002  Cooked/ui/logo.TXTR"));
    }

    #[test]
    fn import_names_saves_the_project() {
        let (dir, mut store) = project();
        let listing = dir.path().join("Metroid1.contents.txt");
        std::fs::write(&listing, "0x00000002 C:\\x_rep\\ui\\title.txtr\n").unwrap();

        let text = output(
            Command::ImportNames {
                file: listing,
                unnamed_only: false,
            },
            &mut store,
        );
        assert_eq!(text.trim(), "Renamed 1 entries");
        assert!(dir.path().join("ResourceDB.rdb").is_file());
    }

    #[test]
    fn explicit_config_file() {
        let (dir, _) = project();
        let alt = dir.path().join("alt.toml");
        std::fs::write(&alt, "[project]\nname = \"Alt\"\ngame = \"MP2E\"\n").unwrap();
        let args = Args {
            project: dir.path().to_owned(),
            config: Some(alt),
            command: Command::Info,
        };
        assert_eq!(open_store(&args).unwrap().game(), Game::Echoes);

        let args = Args {
            project: dir.path().to_owned(),
            config: Some(PathBuf::from("/nonexistent/project.toml")),
            command: Command::Info,
        };
        assert!(open_store(&args).is_err());
    }
}

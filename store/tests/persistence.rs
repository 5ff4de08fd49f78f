mod common;

use byteorder::{BigEndian, WriteBytesExt};
use common::{id, logged, memory_store};
use relic_core::{AssetId, FourCC, Game, ResourceType};
use relic_serial::{SerialVersion, TextNode};
use relic_store::{ResourceStore, StoreConfig, StoreError};
use relic_vfs::MemoryProvider;

fn reopen(provider: &MemoryProvider) -> ResourceStore {
    let mut store =
        ResourceStore::new(Box::new(provider.clone()), StoreConfig::default(), Game::Unknown);
    store.load_resource_database().unwrap();
    store
}

// ---------------------------------------------------------------------------
// Resource database
// ---------------------------------------------------------------------------

#[test]
fn database_round_trip() {
    let (mut store, provider) = memory_store(Game::Prime);
    store.register_resource(id(0x1), ResourceType::Model, "chars", "hero");
    store.register_resource(id(0x2), ResourceType::Texture, "chars/textures", "hero_diffuse");
    store.register_transient_resource(ResourceType::Model, "/tmp/loose", "scratch");
    store.save_resource_database().unwrap();
    assert!(!store.is_database_dirty());

    let reloaded = reopen(&provider);
    assert_eq!(reloaded.game(), Game::Prime);
    assert_eq!(reloaded.entry_count(), 2);
    let hero = reloaded.find_entry(id(0x1)).unwrap();
    assert_eq!(hero.name(), "hero");
    assert_eq!(hero.resource_type(), ResourceType::Model);
    assert_eq!(reloaded.directory_path(id(0x1)).unwrap(), "chars/");
    assert_eq!(
        reloaded.directory_path(id(0x2)).unwrap(),
        "chars/textures/"
    );
    assert!(!reloaded.is_database_dirty());
}

#[test]
fn database_document_layout() {
    let (mut store, provider) = memory_store(Game::Prime);
    store.register_resource(id(0x1), ResourceType::Model, "chars", "hero");
    store.save_resource_database().unwrap();

    let text = String::from_utf8(provider.get("ResourceDB.rdb").unwrap()).unwrap();
    let root = TextNode::decode(&text).unwrap();
    assert_eq!(root.name, "ResourceDB");
    assert_eq!(root.attribute("Game"), Some("MPRM"));
    assert_eq!(root.child("RawDir").and_then(|n| n.text.as_deref()), Some("Raw"));

    let resources = root.child("Resources").unwrap();
    let record = &resources.children[0];
    assert_eq!(record.name, "Resource");
    assert_eq!(record.attribute("ID"), Some("0x00000001"));
    assert_eq!(record.attribute("Type"), Some("Model"));
    assert_eq!(record.attribute("Directory"), Some("chars/"));
    assert_eq!(record.attribute("Name"), Some("hero"));
}

#[test]
fn database_directories_follow_the_file() {
    let (mut store, provider) = memory_store(Game::Echoes);
    store.register_resource(id(0x3), ResourceType::Model, "", "root_model");
    store.save_resource_database().unwrap();

    let text = String::from_utf8(provider.get("ResourceDB.rdb").unwrap()).unwrap();
    let mut root = TextNode::decode(&text).unwrap();
    for child in &mut root.children {
        if child.name == "CookedDir" {
            child.text = Some("Paks".into());
        }
    }
    provider.insert("ResourceDB.rdb", root.encode().unwrap().into_bytes());

    let reloaded = reopen(&provider);
    assert_eq!(reloaded.config().cooked_dir, "Paks");
    assert_eq!(
        reloaded.cooked_asset_path(id(0x3)).unwrap(),
        "Paks/root_model.CMDL"
    );
}

// ---------------------------------------------------------------------------
// Cache file
// ---------------------------------------------------------------------------

#[test]
fn cache_round_trip() {
    let (mut store, provider) = memory_store(Game::Prime);
    provider.insert("Cooked/a.CMDL", b"BLOB 00000002".to_vec());
    provider.insert("Cooked/b.TXTR", b"BLOB".to_vec());
    store.register_resource(id(0x1), ResourceType::Model, "", "a");
    store.register_resource(id(0x2), ResourceType::Texture, "", "b");
    assert!(store.update_dependencies(id(0x1)));
    assert_eq!(store.loaded_count(), 0);
    store.set_needs_recook(id(0x2), true);
    store.conditional_save_store().unwrap();
    assert!(!store.is_cache_dirty());

    let mut reloaded = reopen(&provider);
    reloaded.load_cache_file().unwrap();
    let a = reloaded.find_entry(id(0x1)).unwrap();
    assert!(a.dependencies().unwrap().has_dependency(id(0x2)));
    assert!(!a.needs_recook());
    let b = reloaded.find_entry(id(0x2)).unwrap();
    assert!(b.needs_recook());
    assert!(!reloaded.is_cache_dirty());
}

#[test]
fn cache_skips_records_for_unknown_ids() {
    let (mut store, provider) = memory_store(Game::Prime);
    for value in 1..=3 {
        store.register_resource(id(value), ResourceType::Model, "", &format!("m{value}"));
        store.set_needs_recook(id(value), true);
    }
    store.save_cache_file().unwrap();
    let cache = provider.get("ResourceCacheData.rcd").unwrap();

    let (mut partial, partial_provider) = memory_store(Game::Prime);
    partial.register_resource(id(1), ResourceType::Model, "", "m1");
    partial.register_resource(id(3), ResourceType::Model, "", "m3");
    partial_provider.insert("ResourceCacheData.rcd", cache);
    partial.load_cache_file().unwrap();
    assert!(partial.find_entry(id(1)).unwrap().needs_recook());
    assert!(partial.find_entry(id(3)).unwrap().needs_recook());
}

#[test]
fn cache_skips_unparseable_records() {
    let (mut store, provider) = memory_store(Game::Prime);
    store.register_resource(id(0x7), ResourceType::Model, "", "door");
    store.set_needs_recook(id(0x7), true);
    store.save_resource_database().unwrap();
    store.save_cache_file().unwrap();
    let cache = provider.get("ResourceCacheData.rcd").unwrap();

    // Header (magic + version record), patched count, one junk record for
    // a registered id, then the original record.
    let mut patched = cache[..12].to_vec();
    patched.write_u32::<BigEndian>(2).unwrap();
    patched.write_u32::<BigEndian>(0x7).unwrap();
    patched.write_u32::<BigEndian>(3).unwrap();
    patched.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
    patched.extend_from_slice(&cache[16..]);
    provider.insert("ResourceCacheData.rcd", patched);

    let mut reloaded = reopen(&provider);
    reloaded.load_cache_file().unwrap();
    assert!(reloaded.find_entry(id(0x7)).unwrap().needs_recook());
}

#[test]
fn hostile_container_count_is_skipped() {
    let (mut store, provider) = memory_store(Game::Prime);
    provider.insert("Cooked/gate.CMDL", b"BLOB".to_vec());
    store.register_resource(id(0x21), ResourceType::Model, "", "gate");
    store.register_resource(id(0x22), ResourceType::Model, "", "lock");
    assert!(store.update_dependencies(id(0x21)));
    store.set_needs_recook(id(0x22), true);
    store.conditional_save_store().unwrap();
    let mut cache = provider.get("ResourceCacheData.rcd").unwrap();

    // The first record is 0x21; its payload ends with the children count of
    // its empty dependency tree.
    let length = u32::from_be_bytes(cache[20..24].try_into().unwrap()) as usize;
    let end = 24 + length;
    cache[end - 4..end].copy_from_slice(&[0xFF; 4]);
    provider.insert("ResourceCacheData.rcd", cache);

    let mut reloaded = reopen(&provider);
    reloaded.load_cache_file().unwrap();
    assert!(logged(
        log::Level::Warn,
        "Ignoring unreadable cache data for 0x00000021"
    ));
    assert!(reloaded.find_entry(id(0x22)).unwrap().needs_recook());
}

#[test]
fn wide_ids_survive_the_cache() {
    let (mut store, provider) = memory_store(Game::Corruption);
    let model = AssetId::from_u64(0x1_0000_0001);
    let texture = AssetId::from_u64(0x1_0000_0002);
    provider.insert("Cooked/ship.CMDL", b"BLOB 0000000100000002".to_vec());
    provider.insert("Cooked/hull.TXTR", b"BLOB".to_vec());
    store.register_resource(model, ResourceType::Model, "", "ship");
    store.register_resource(texture, ResourceType::Texture, "", "hull");
    assert!(store.update_dependencies(model));
    store.set_needs_recook(texture, true);
    store.conditional_save_store().unwrap();

    let mut reloaded = reopen(&provider);
    reloaded.load_cache_file().unwrap();
    assert_eq!(reloaded.game(), Game::Corruption);
    let ship = reloaded.find_entry(model).unwrap();
    assert_eq!(ship.dependencies().unwrap().all_asset_ids(), [texture]);
    assert!(reloaded.find_entry(texture).unwrap().needs_recook());
}

#[test]
fn project_ids_must_match_the_game_width() {
    let (mut store, _) = memory_store(Game::Corruption);
    assert!(store
        .register_resource(id(0x31), ResourceType::Model, "", "narrow")
        .is_none());
    assert!(logged(log::Level::Error, "Resource id 0x00000031 is Bits32"));
    assert_eq!(store.entry_count(), 0);

    let (mut prime, _) = memory_store(Game::Prime);
    let wide = AssetId::from_u64(0x5_0000_0031);
    assert!(prime
        .register_resource(wide, ResourceType::Model, "", "wide")
        .is_none());
    prime.register_transient_resource_with_id(ResourceType::Model, wide, "", "");
    assert!(!prime.add_to_project(wide, "", "wide"));
    assert!(prime.find_entry(wide).unwrap().is_transient());
    assert!(logged(log::Level::Error, "Resource id 0x0000000500000031 is Bits64"));
}

#[test]
fn wide_dependency_is_not_truncated_into_the_cache() {
    let (mut store, provider) = memory_store(Game::Prime);
    provider.insert("Cooked/arm.CMDL", b"BLOB 0000000100000033 00000034".to_vec());
    provider.insert("Cooked/hand.CMDL", b"BLOB".to_vec());
    store.register_resource(id(0x32), ResourceType::Model, "", "arm");
    store.register_resource(id(0x34), ResourceType::Model, "", "hand");
    assert!(store.update_dependencies(id(0x32)));
    assert!(logged(log::Level::Warn, "Ignoring dependency 0x0000000100000033"));
    store.conditional_save_store().unwrap();

    let mut reloaded = reopen(&provider);
    reloaded.load_cache_file().unwrap();
    let tree = reloaded.find_entry(id(0x32)).unwrap().dependencies().unwrap();
    assert_eq!(tree.all_asset_ids(), [id(0x34)]);
    assert!(!tree.has_dependency(id(0x33)));
}

#[test]
fn cache_header_layout() {
    let (mut store, provider) = memory_store(Game::Corruption);
    let wide = AssetId::from_u64(0x0123_4567_89AB_CDEF);
    store.register_resource(wide, ResourceType::Model, "", "wide");
    store.save_cache_file().unwrap();

    let cache = provider.get("ResourceCacheData.rcd").unwrap();
    let mut expected = b"CACH".to_vec();
    SerialVersion::current(0, Game::Corruption)
        .write(&mut expected)
        .unwrap();
    expected.write_u32::<BigEndian>(1).unwrap();
    expected.write_u64::<BigEndian>(0x0123_4567_89AB_CDEF).unwrap();
    assert_eq!(&cache[..expected.len()], expected.as_slice());
}

#[test]
fn bad_magic_is_an_error() {
    let (mut store, provider) = memory_store(Game::Prime);
    provider.insert("ResourceCacheData.rcd", b"JUNK\0\x02\0\0MPRM\0\0\0\0".to_vec());
    match store.load_cache_file() {
        Err(StoreError::BadMagic(magic)) => assert_eq!(magic, FourCC::new(b"JUNK")),
        other => panic!("expected bad magic, got {other:?}"),
    }
}

#[test]
fn truncated_record_is_an_error() {
    let (mut store, provider) = memory_store(Game::Prime);
    let mut cache = b"CACH".to_vec();
    SerialVersion::current(0, Game::Prime).write(&mut cache).unwrap();
    cache.write_u32::<BigEndian>(1).unwrap();
    cache.write_u32::<BigEndian>(0x1).unwrap();
    cache.write_u32::<BigEndian>(100).unwrap();
    cache.extend_from_slice(&[0; 4]);
    provider.insert("ResourceCacheData.rcd", cache);
    assert!(matches!(store.load_cache_file(), Err(StoreError::Truncated(24))));
}

#[test]
fn conditional_save_only_writes_dirty_files() {
    let (mut store, provider) = memory_store(Game::Prime);
    store.register_resource(id(0x9), ResourceType::Model, "", "lamp");
    store.conditional_save_store().unwrap();
    assert!(provider.get("ResourceDB.rdb").is_some());
    assert!(provider.get("ResourceCacheData.rcd").is_some());

    provider.remove("ResourceDB.rdb");
    store.set_needs_recook(id(0x9), true);
    store.conditional_save_store().unwrap();
    assert!(provider.get("ResourceDB.rdb").is_none());
    assert!(!store.is_cache_dirty());
}

// ---------------------------------------------------------------------------
// Projects on disk
// ---------------------------------------------------------------------------

#[test]
fn open_project_directory() {
    common::install_log_capture();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("project.toml"),
        "[project]\nname = \"Echoes\"\ngame = \"MP2E\"\n",
    )
    .unwrap();

    let mut store = ResourceStore::open(dir.path()).unwrap();
    assert_eq!(store.game(), Game::Echoes);
    assert_eq!(store.entry_count(), 0);
    store.register_resource(id(0x44), ResourceType::Scan, "scans", "pirate");
    store.conditional_save_store().unwrap();
    assert!(dir.path().join("ResourceDB.rdb").is_file());

    let reopened = ResourceStore::open(dir.path()).unwrap();
    assert_eq!(reopened.find_entry(id(0x44)).unwrap().name(), "pirate");
}

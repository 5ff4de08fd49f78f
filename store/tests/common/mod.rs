//! Shared helpers for the store integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::rc::Rc;
use std::sync::{Mutex, Once, OnceLock};

use log::Log;
use relic_core::{AssetId, Game, ResourceType};
use relic_store::{DependencyTree, LoadRequest, Resource, ResourceLoader, ResourceStore, StoreConfig};
use relic_vfs::MemoryProvider;

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

static CAPTURED: OnceLock<Mutex<Vec<(log::Level, String)>>> = OnceLock::new();
static INSTALL: Once = Once::new();

/// Logger that forwards to `env_logger` and keeps every record for
/// assertions.
struct LogCapture {
    inner: env_logger::Logger,
}

impl log::Log for LogCapture {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
        if let Ok(mut captured) = captured().lock() {
            captured.push((record.level(), format!("{}", record.args())));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

fn captured() -> &'static Mutex<Vec<(log::Level, String)>> {
    CAPTURED.get_or_init(|| Mutex::new(Vec::new()))
}

/// Install the capturing logger once per test binary.
pub fn install_log_capture() {
    INSTALL.call_once(|| {
        let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .is_test(true)
            .build();
        log::set_boxed_logger(Box::new(LogCapture { inner })).expect("logger already set");
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Whether a record at `level` containing `needle` has been logged.
///
/// Tests share one logger, so needles should be unique to the test.
pub fn logged(level: log::Level, needle: &str) -> bool {
    captured()
        .lock()
        .map(|records| {
            records
                .iter()
                .any(|(l, message)| *l == level && message.contains(needle))
        })
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// A tiny resource format
// ---------------------------------------------------------------------------

/// Cooked form: `BLOB` followed by the hex ids of the blobs it holds.
/// Raw form: `RAW` followed by the same.
pub struct Blob {
    pub resource_type: ResourceType,
    pub from_raw: bool,
    pub child_ids: Vec<AssetId>,
    pub children: Vec<Rc<dyn Resource>>,
}

impl Resource for Blob {
    fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    fn build_dependency_tree(&self, tree: &mut DependencyTree) {
        for &id in &self.child_ids {
            tree.add_resource(id);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn parse_blob(
    data: &[u8],
    magic: &str,
    request: &LoadRequest,
    store: &mut ResourceStore,
) -> Option<Rc<dyn Resource>> {
    let text = std::str::from_utf8(data).ok()?;
    let mut tokens = text.split_whitespace();
    if tokens.next()? != magic {
        return None;
    }
    let mut child_ids = Vec::new();
    let mut children = Vec::new();
    for token in tokens {
        let id = AssetId::from_hex(token)?;
        child_ids.push(id);
        if let Some(child) = store.load_entry(id) {
            children.push(child);
        }
    }
    Some(Rc::new(Blob {
        resource_type: request.resource_type,
        from_raw: magic == "RAW",
        child_ids,
        children,
    }))
}

/// Reads cooked blobs only.
pub struct BlobLoader;

impl ResourceLoader for BlobLoader {
    fn load_cooked(
        &self,
        data: &[u8],
        request: &LoadRequest,
        store: &mut ResourceStore,
    ) -> Option<Rc<dyn Resource>> {
        parse_blob(data, "BLOB", request, store)
    }
}

/// Reads raw blobs when present, cooked otherwise.
pub struct RawBlobLoader;

impl ResourceLoader for RawBlobLoader {
    fn load_cooked(
        &self,
        data: &[u8],
        request: &LoadRequest,
        store: &mut ResourceStore,
    ) -> Option<Rc<dyn Resource>> {
        parse_blob(data, "BLOB", request, store)
    }

    fn supports_raw(&self) -> bool {
        true
    }

    fn load_raw(
        &self,
        data: &[u8],
        request: &LoadRequest,
        store: &mut ResourceStore,
    ) -> Option<Rc<dyn Resource>> {
        parse_blob(data, "RAW", request, store)
    }
}

/// Store over a fresh memory provider, with blob loaders for models and
/// textures. The provider handle shares its files with the store.
pub fn memory_store(game: Game) -> (ResourceStore, MemoryProvider) {
    install_log_capture();
    let provider = MemoryProvider::new();
    let mut store = ResourceStore::new(Box::new(provider.clone()), StoreConfig::default(), game);
    store.register_loader(ResourceType::Model, BlobLoader);
    store.register_loader(ResourceType::Texture, BlobLoader);
    (store, provider)
}

pub fn id(value: u32) -> AssetId {
    AssetId::from_u32(value)
}

pub fn blob(payload: &Rc<dyn Resource>) -> &Blob {
    payload
        .as_any()
        .downcast_ref::<Blob>()
        .expect("payload is a blob")
}

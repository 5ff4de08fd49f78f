//! Loaded resource payloads and the loaders that build them.

use std::any::Any;
use std::rc::Rc;

use relic_core::{AssetId, Game, ResourceType};

use crate::dependency::DependencyTree;
use crate::store::ResourceStore;

/// A loaded resource payload.
///
/// Payloads are shared as `Rc<dyn Resource>`. The owning entry holds one
/// reference; any other live reference (a caller, or another payload that
/// depends on this one) keeps the payload from being unloaded.
pub trait Resource: Any {
    fn resource_type(&self) -> ResourceType;

    /// Record the assets this payload refers to.
    fn build_dependency_tree(&self, _tree: &mut DependencyTree) {}

    fn as_any(&self) -> &dyn Any;
}

/// Snapshot of the entry being loaded, handed to a [`ResourceLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: AssetId,
    pub resource_type: ResourceType,
    pub game: Game,
    pub name: String,
    /// Directory of the entry with a trailing `/`, or `""`.
    pub directory: String,
}

/// Builds payloads of one resource type from bytes.
///
/// Loaders receive the store mutably so payloads can load the resources
/// they depend on with ordinary nested `load_resource` calls. Malformed
/// input is reported by returning `None`.
pub trait ResourceLoader {
    fn load_cooked(
        &self,
        data: &[u8],
        request: &LoadRequest,
        store: &mut ResourceStore,
    ) -> Option<Rc<dyn Resource>>;

    /// Whether [`load_raw`](Self::load_raw) is implemented.
    fn supports_raw(&self) -> bool {
        false
    }

    fn load_raw(
        &self,
        _data: &[u8],
        _request: &LoadRequest,
        _store: &mut ResourceStore,
    ) -> Option<Rc<dyn Resource>> {
        None
    }
}

/// Whether anything besides the owning entry holds `payload`.
pub fn is_referenced(payload: &Rc<dyn Resource>) -> bool {
    Rc::strong_count(payload) > 1
}

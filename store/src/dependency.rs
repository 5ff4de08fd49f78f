//! Dependency trees: the assets a resource refers to.
//!
//! Trees are cached per entry in the cache file and rebuilt from a loaded
//! payload by [`ResourceStore::update_dependencies`](crate::ResourceStore::update_dependencies).

use std::any::Any;
use std::sync::OnceLock;

use relic_core::{AssetId, FourCC, IdLength};
use relic_serial::{AbstractObject, Archive, ArchiveResult, ObjectFactory, Serial, SerialHints};

relic_serial::serial_enum! {
    /// Discriminant of a [`DependencyNode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum DependencyKind {
        #[default]
        Resource = 0,
        ScriptInstance = 1,
    }
}

/// One node of a dependency tree.
pub trait DependencyNode: AbstractObject<Kind = DependencyKind> {
    /// Every asset this node refers to.
    fn asset_ids(&self) -> Vec<AssetId>;

    fn as_any(&self) -> &dyn Any;
}

/// Direct reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDependency {
    pub id: AssetId,
}

impl AbstractObject for ResourceDependency {
    type Kind = DependencyKind;

    fn kind(&self) -> DependencyKind {
        DependencyKind::Resource
    }

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        arc.field_hinted("ID", &mut self.id, SerialHints::HEX_DISPLAY)
    }
}

impl DependencyNode for ResourceDependency {
    fn asset_ids(&self) -> Vec<AssetId> {
        vec![self.id]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Assets referenced by one script object instance in an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInstanceDependency {
    pub instance_id: u32,
    pub object_type: FourCC,
    pub assets: Vec<AssetId>,
}

impl AbstractObject for ScriptInstanceDependency {
    type Kind = DependencyKind;

    fn kind(&self) -> DependencyKind {
        DependencyKind::ScriptInstance
    }

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        arc.field_hinted("InstanceID", &mut self.instance_id, SerialHints::HEX_DISPLAY)?;
        arc.field("ObjectType", &mut self.object_type)?;
        arc.field("Assets", &mut self.assets)
    }
}

impl DependencyNode for ScriptInstanceDependency {
    fn asset_ids(&self) -> Vec<AssetId> {
        self.assets.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn factory() -> &'static ObjectFactory<dyn DependencyNode> {
    static FACTORY: OnceLock<ObjectFactory<dyn DependencyNode>> = OnceLock::new();
    FACTORY.get_or_init(|| {
        ObjectFactory::new()
            .with(DependencyKind::Resource, |_| {
                Box::new(ResourceDependency {
                    id: AssetId::invalid(IdLength::Bits32),
                }) as Box<dyn DependencyNode>
            })
            .with(DependencyKind::ScriptInstance, |_| {
                Box::new(ScriptInstanceDependency {
                    instance_id: 0,
                    object_type: FourCC::new(b"NONE"),
                    assets: Vec::new(),
                }) as Box<dyn DependencyNode>
            })
    })
}

/// Assets a resource depends on.
pub struct DependencyTree {
    root_id: AssetId,
    id_length: IdLength,
    children: Vec<Box<dyn DependencyNode>>,
}

impl DependencyTree {
    /// Empty tree whose dependencies share the root's width.
    pub fn new(root_id: AssetId) -> Self {
        Self::with_id_length(root_id, root_id.length())
    }

    /// Empty tree accepting dependencies of `id_length` only, for roots
    /// whose own id was not chosen by the game.
    pub fn with_id_length(root_id: AssetId, id_length: IdLength) -> Self {
        Self {
            root_id,
            id_length,
            children: Vec::new(),
        }
    }

    pub fn root_id(&self) -> AssetId {
        self.root_id
    }

    pub fn children(&self) -> &[Box<dyn DependencyNode>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn id_length(&self) -> IdLength {
        self.id_length
    }

    /// Whether `id` can be stored in this tree. Trees are cached at the
    /// game's width, so ids of another width are refused.
    fn accepts(&self, id: AssetId) -> bool {
        if !id.is_valid() {
            return false;
        }
        if id.length() != self.id_length {
            log::warn!(
                "Ignoring dependency {id} of {}: id width {:?} doesn't match {:?}",
                self.root_id,
                id.length(),
                self.id_length
            );
            return false;
        }
        true
    }

    /// Add a direct resource dependency. Invalid ids, ids of another width,
    /// self references and duplicates are ignored.
    pub fn add_resource(&mut self, id: AssetId) -> bool {
        if !self.accepts(id) || id == self.root_id || self.has_dependency(id) {
            return false;
        }
        self.children.push(Box::new(ResourceDependency { id }));
        true
    }

    pub fn add_script_instance(&mut self, instance_id: u32, object_type: FourCC, assets: Vec<AssetId>) {
        let assets = assets.into_iter().filter(|&id| self.accepts(id)).collect();
        self.children.push(Box::new(ScriptInstanceDependency {
            instance_id,
            object_type,
            assets,
        }));
    }

    pub fn has_dependency(&self, id: AssetId) -> bool {
        self.children
            .iter()
            .any(|child| child.asset_ids().contains(&id))
    }

    /// Every referenced asset, in tree order, without duplicates.
    pub fn all_asset_ids(&self) -> Vec<AssetId> {
        let mut ids = Vec::new();
        for id in self.children.iter().flat_map(|child| child.asset_ids()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl Default for DependencyTree {
    fn default() -> Self {
        Self::new(AssetId::invalid(IdLength::Bits32))
    }
}

impl std::fmt::Debug for DependencyTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyTree")
            .field("root_id", &self.root_id)
            .field("assets", &self.all_asset_ids())
            .finish()
    }
}

impl Serial for DependencyTree {
    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        arc.field_hinted("RootID", &mut self.root_id, SerialHints::HEX_DISPLAY)?;
        if arc.is_reader() {
            self.id_length = self.root_id.length();
        }
        arc.abstract_container("Children", &mut self.children, factory(), SerialHints::empty())
    }
}

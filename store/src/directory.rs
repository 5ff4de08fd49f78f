//! Virtual directory tree.
//!
//! Directories live in an arena and are addressed by [`DirId`]. The tree has
//! one database root (the project's directory structure) plus any number of
//! transient roots, each named after the filesystem directory it stands for.
//! Directories hold the ids of the resources they contain; resource names
//! live on the entries themselves.

use relic_core::AssetId;
use relic_vfs::path;

/// Handle to a directory in a [`DirectoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirId(usize);

#[derive(Debug)]
struct DirNode {
    name: String,
    parent: Option<DirId>,
    children: Vec<DirId>,
    resources: Vec<AssetId>,
}

impl DirNode {
    fn new(name: impl Into<String>, parent: Option<DirId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            resources: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct DirectoryTree {
    nodes: Vec<Option<DirNode>>,
    free: Vec<usize>,
    database_root: DirId,
    transient_roots: Vec<DirId>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(DirNode::new("", None))],
            free: Vec::new(),
            database_root: DirId(0),
            transient_roots: Vec::new(),
        }
    }

    pub fn database_root(&self) -> DirId {
        self.database_root
    }

    pub fn transient_roots(&self) -> &[DirId] {
        &self.transient_roots
    }

    fn node(&self, dir: DirId) -> Option<&DirNode> {
        self.nodes.get(dir.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, dir: DirId) -> Option<&mut DirNode> {
        self.nodes.get_mut(dir.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: DirNode) -> DirId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                DirId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                DirId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, dir: DirId) {
        let children = match self.nodes.get_mut(dir.0).and_then(Option::take) {
            Some(node) => node.children,
            None => return,
        };
        self.free.push(dir.0);
        for child in children {
            self.release(child);
        }
    }

    pub fn contains(&self, dir: DirId) -> bool {
        self.node(dir).is_some()
    }

    pub fn name(&self, dir: DirId) -> &str {
        self.node(dir).map_or("", |node| node.name.as_str())
    }

    pub fn parent(&self, dir: DirId) -> Option<DirId> {
        self.node(dir).and_then(|node| node.parent)
    }

    pub fn children(&self, dir: DirId) -> &[DirId] {
        self.node(dir).map_or(&[], |node| node.children.as_slice())
    }

    pub fn resources(&self, dir: DirId) -> &[AssetId] {
        self.node(dir).map_or(&[], |node| node.resources.as_slice())
    }

    /// Topmost ancestor of `dir`.
    pub fn root_of(&self, dir: DirId) -> DirId {
        let mut current = dir;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn is_in_database(&self, dir: DirId) -> bool {
        self.root_of(dir) == self.database_root
    }

    pub fn is_empty(&self, dir: DirId) -> bool {
        self.node(dir)
            .map_or(true, |node| node.children.is_empty() && node.resources.is_empty())
    }

    /// Path from the root down to `dir`, with a trailing `/`.
    ///
    /// The database root is `""`; a transient root is its own name.
    pub fn full_path(&self, dir: DirId) -> String {
        let mut names = Vec::new();
        let mut current = Some(dir);
        while let Some(id) = current {
            let name = self.name(id);
            if !name.is_empty() {
                names.push(name);
            }
            current = self.parent(id);
        }
        names.reverse();
        let mut path = names.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path
    }

    /// Resolve `rel_path` below `from`, optionally creating missing levels.
    ///
    /// Returns `None` for invalid paths and, without `allow_create`, for
    /// missing directories.
    pub fn find_child_directory(
        &mut self,
        from: DirId,
        rel_path: &str,
        allow_create: bool,
    ) -> Option<DirId> {
        if !path::is_valid_directory_path(rel_path) || !self.contains(from) {
            return None;
        }
        let mut current = from;
        for segment in path::segments_of(rel_path) {
            let existing = self
                .children(current)
                .iter()
                .copied()
                .find(|&child| self.name(child).eq_ignore_ascii_case(segment));
            current = match existing {
                Some(child) => child,
                None if allow_create => {
                    let child = self.alloc(DirNode::new(segment, Some(current)));
                    self.node_mut(current)?.children.push(child);
                    child
                }
                None => return None,
            };
        }
        Some(current)
    }

    /// Look up a directory without creating anything.
    pub fn find_directory(&self, from: DirId, rel_path: &str) -> Option<DirId> {
        if !path::is_valid_directory_path(rel_path) {
            return None;
        }
        path::segments_of(rel_path).try_fold(from, |current, segment| {
            self.children(current)
                .iter()
                .copied()
                .find(|&child| self.name(child).eq_ignore_ascii_case(segment))
        })
    }

    /// Transient root named `name`, created on demand.
    pub fn transient_root(&mut self, name: &str, allow_create: bool) -> Option<DirId> {
        if let Some(&root) = self
            .transient_roots
            .iter()
            .find(|&&root| self.name(root) == name)
        {
            return Some(root);
        }
        if !allow_create {
            return None;
        }
        let root = self.alloc(DirNode::new(name, None));
        self.transient_roots.push(root);
        Some(root)
    }

    pub fn add_child_resource(&mut self, dir: DirId, id: AssetId) {
        if let Some(node) = self.node_mut(dir) {
            if !node.resources.contains(&id) {
                node.resources.push(id);
            }
        }
    }

    pub fn remove_child_resource(&mut self, dir: DirId, id: AssetId) -> bool {
        match self.node_mut(dir) {
            Some(node) => {
                let before = node.resources.len();
                node.resources.retain(|&existing| existing != id);
                node.resources.len() != before
            }
            None => false,
        }
    }

    /// Remove `dir` and everything under it. Roots other than transient
    /// roots cannot be removed.
    pub fn remove_directory(&mut self, dir: DirId) -> bool {
        if dir == self.database_root || !self.contains(dir) {
            return false;
        }
        match self.parent(dir) {
            Some(parent) => {
                if let Some(node) = self.node_mut(parent) {
                    node.children.retain(|&child| child != dir);
                }
            }
            None => self.transient_roots.retain(|&root| root != dir),
        }
        self.release(dir);
        true
    }

    /// Remove `dir` if empty, then each ancestor that becomes empty. Stops
    /// at a root. Returns the full paths of removed database directories.
    pub fn remove_empty_ancestors(&mut self, dir: DirId) -> Vec<String> {
        let mut removed = Vec::new();
        let mut current = dir;
        while let Some(parent) = self.parent(current) {
            if !self.is_empty(current) {
                break;
            }
            if self.is_in_database(current) {
                removed.push(self.full_path(current));
            }
            self.remove_directory(current);
            current = parent;
        }
        removed
    }

    /// Drop every empty transient root. Returns how many were removed.
    pub fn remove_empty_transient_roots(&mut self) -> usize {
        let empty: Vec<DirId> = self
            .transient_roots
            .iter()
            .copied()
            .filter(|&root| self.is_empty(root))
            .collect();
        for &root in &empty {
            self.remove_directory(root);
        }
        empty.len()
    }

    /// Replace the database root with an empty one.
    pub fn reset_database_root(&mut self) {
        let old = self.database_root;
        let children = self.children(old).to_vec();
        for child in children {
            self.release(child);
        }
        if let Some(node) = self.node_mut(old) {
            node.children.clear();
            node.resources.clear();
        }
    }
}

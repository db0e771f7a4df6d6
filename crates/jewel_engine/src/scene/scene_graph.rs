//! Hierarchical scene graph
//!
//! Nodes live in a slot map arena and reference each other by [`NodeKey`].
//! Traversal is depth-first pre-order over the ordered root list and each
//! node's ordered children, so it is deterministic for a given asset.

use thiserror::Error;

use super::Geometry;
use crate::foundation::collections::{NodeKey, SceneId, SlotMap};
use crate::foundation::math::{Aabb, Mat4, Transform};
use crate::materials::MeshMaterial;

/// Scene graph errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneGraphError {
    /// Referenced node does not exist in this graph
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeKey),
}

/// Renderable payload of a node
#[derive(Debug)]
pub struct Mesh {
    /// Geometry buffers
    pub geometry: Geometry,
    /// Material slot(s)
    pub material: MeshMaterial,
}

impl Mesh {
    /// Create a mesh
    pub fn new(geometry: Geometry, material: impl Into<MeshMaterial>) -> Self {
        Self {
            geometry,
            material: material.into(),
        }
    }

    /// Deep copy with fresh geometry and material identities
    pub fn duplicate(&self) -> Self {
        Self {
            geometry: self.geometry.duplicate(),
            material: self.material.duplicate(),
        }
    }
}

/// A node in the scene hierarchy
#[derive(Debug)]
pub struct SceneNode {
    /// Authored node name (used by the gem-naming convention)
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Whether the node is drawn
    pub visible: bool,
    /// Optional renderable payload
    pub mesh: Option<Mesh>,
    world: Mat4,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl SceneNode {
    /// Create an empty group node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            visible: true,
            mesh: None,
            world: Mat4::identity(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder: attach a mesh
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// World matrix as of the last [`SceneGraph::update_world_matrices`]
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Ordered children
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    fn detached_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            transform: self.transform,
            visible: self.visible,
            mesh: self.mesh.as_ref().map(Mesh::duplicate),
            world: self.world,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Scene hierarchy with identity
#[derive(Debug)]
pub struct SceneGraph {
    id: SceneId,
    nodes: SlotMap<NodeKey, SceneNode>,
    roots: Vec<NodeKey>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty graph with a fresh identity
    pub fn new() -> Self {
        Self {
            id: SceneId::fresh(),
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Graph identity; a clone always has a different one from its source
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Add a root node
    pub fn add_root(&mut self, node: SceneNode) -> NodeKey {
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Add a node under `parent`
    pub fn add_child(&mut self, parent: NodeKey, mut node: SceneNode) -> Result<NodeKey, SceneGraphError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneGraphError::NodeNotFound(parent));
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        Ok(key)
    }

    /// Look up a node
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Look up a node mutably
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Ordered root nodes
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first pre-order traversal
    pub fn traverse(&self) -> Vec<NodeKey> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeKey> = self.roots.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get(key) {
                order.push(key);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Traversal order restricted to a subtree, `root` included
    pub fn traverse_from(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get(key) {
                order.push(key);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Keys of every node that carries a mesh, in traversal order
    pub fn mesh_nodes(&self) -> Vec<NodeKey> {
        self.traverse()
            .into_iter()
            .filter(|key| self.nodes[*key].mesh.is_some())
            .collect()
    }

    /// Number of meshes in the graph
    pub fn mesh_count(&self) -> usize {
        self.nodes.values().filter(|n| n.mesh.is_some()).count()
    }

    /// Visit every mesh mutably together with its node name
    pub fn for_each_mesh_mut(&mut self, mut f: impl FnMut(&str, &mut Mesh)) {
        for node in self.nodes.values_mut() {
            if let Some(mesh) = node.mesh.as_mut() {
                f(&node.name, mesh);
            }
        }
    }

    /// Recompute every node's world matrix from its ancestors
    pub fn update_world_matrices(&mut self) {
        for key in self.traverse() {
            let parent_world = self.nodes[key]
                .parent
                .and_then(|p| self.nodes.get(p))
                .map_or_else(Mat4::identity, |p| p.world);
            let node = &mut self.nodes[key];
            node.world = parent_world * node.transform.to_matrix();
        }
    }

    /// World-space bounds of a node's meshes and all of its descendants'
    ///
    /// Uses the world matrices from the last update.
    pub fn world_bounds(&self, key: NodeKey) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        for k in self.traverse_from(key) {
            let node = &self.nodes[k];
            let Some(local) = node.mesh.as_ref().and_then(|m| m.geometry.bounding_box()) else {
                continue;
            };
            let world = local.transformed(&node.world);
            bounds = Some(match bounds {
                Some(mut b) => {
                    b.expand_to(&world.min);
                    b.expand_to(&world.max);
                    b
                }
                None => world,
            });
        }
        bounds
    }

    /// Deep copy of the whole hierarchy
    ///
    /// The copy has a fresh graph identity, and every geometry, material and
    /// texture map inside it is duplicated, so nothing is shared with `self`.
    pub fn deep_clone(&self) -> Self {
        let mut copy = Self::new();
        for &root in &self.roots {
            let new_root = copy.add_root(self.nodes[root].detached_copy());
            self.copy_children(root, new_root, &mut copy);
        }
        copy
    }

    fn copy_children(&self, from: NodeKey, to: NodeKey, copy: &mut Self) {
        for &child in &self.nodes[from].children {
            // `to` was just inserted into `copy`, so the parent always exists.
            if let Ok(new_child) = copy.add_child(to, self.nodes[child].detached_copy()) {
                self.copy_children(child, new_child, copy);
            }
        }
    }
}

use glam::Affine3A;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::resources::material::MaterialOverride;
use crate::scene::NodeHandle;
use crate::scene::node::{Node, NodeKind};

/// Arena-backed node hierarchy.
///
/// Used both for a freshly loaded asset and for the viewport's render set;
/// a loaded graph is moved into the render set with [`adopt`](Self::adopt).
/// Handles are generational, so a stale handle resolves to `None` instead of
/// aliasing another node.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeHandle, Node>,
    roots: Vec<NodeHandle>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Inserts a node at the root level.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.roots.push(handle);
        handle
    }

    /// Inserts a node as the last child of `parent`.
    ///
    /// Falls back to the root level when `parent` is not in this graph.
    pub fn add_child(&mut self, parent: NodeHandle, mut node: Node) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            return self.add_node(node);
        }
        node.parent = Some(parent);
        let handle = self.nodes.insert(node);
        self.nodes[parent].children.push(handle);
        handle
    }

    /// Moves every node of `other` under a new group node named `name` and
    /// returns that group's handle.
    pub fn adopt(&mut self, mut other: SceneGraph, name: &str) -> NodeHandle {
        let group = self.add_node(Node::group().with_name(name));

        let mut remap: FxHashMap<NodeHandle, NodeHandle> = FxHashMap::default();
        let drained: Vec<(NodeHandle, Node)> = other.nodes.drain().collect();
        for (old, node) in drained {
            remap.insert(old, self.nodes.insert(node));
        }

        for &new in remap.values() {
            let node = &mut self.nodes[new];
            node.parent = node.parent.and_then(|p| remap.get(&p).copied());
            node.children = node
                .children
                .iter()
                .filter_map(|c| remap.get(c).copied())
                .collect();
        }

        for old_root in other.roots {
            if let Some(&root) = remap.get(&old_root) {
                self.nodes[root].parent = Some(group);
                self.nodes[group].children.push(root);
            }
        }

        group
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeHandle, &mut Node)> {
        self.nodes.iter_mut()
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.values().filter(|n| n.mesh().is_some()).count()
    }

    /// First node carrying `name`, in arena order.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(h, _)| h)
    }

    /// Depth-first pre-order walk of the subtree rooted at `root`.
    pub fn traverse(&self, root: NodeHandle, mut visit: impl FnMut(NodeHandle, &Node)) {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            visit(handle, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    // ========================================================================
    // Passes
    // ========================================================================

    /// Rewrites the material of every mesh primitive with `material`.
    ///
    /// Non-mesh nodes are untouched. Returns the number of primitives rewritten.
    pub fn normalize_materials(&mut self, material: &MaterialOverride) -> usize {
        let mut count = 0;
        for node in self.nodes.values_mut() {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                for primitive in &mut mesh.primitives {
                    material.apply(&mut primitive.material);
                    count += 1;
                }
            }
        }
        count
    }

    /// Propagates local transforms down the hierarchy into world matrices.
    pub fn update_world_matrices(&mut self) {
        let mut stack: Vec<(NodeHandle, Affine3A, bool)> = self
            .roots
            .iter()
            .rev()
            .map(|&h| (h, Affine3A::IDENTITY, false))
            .collect();

        while let Some((handle, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };

            let local_changed = node.transform.update_local_matrix();
            let changed = local_changed || parent_changed;
            if changed {
                let world = parent_world * node.transform.local_matrix;
                node.transform.set_world_matrix(world);
            }

            let world = node.transform.world_matrix;
            stack.extend(node.children.iter().rev().map(|&c| (c, world, changed)));
        }
    }
}

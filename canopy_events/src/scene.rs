// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A ready-made [`EventScene`] over [`canopy_tree::Tree`].

use alloc::boxed::Box;
use alloc::vec::Vec;

use canopy_tree::{NodeId, ParentLookup, Tree};
use hashbrown::HashMap;

use crate::capability::Component;
use crate::dispatcher::EventScene;

/// A hierarchy plus the components attached to each node.
///
/// Removing a node drops the components of its whole subtree.
#[derive(Debug, Default)]
pub struct SceneGraph {
    tree: Tree,
    components: HashMap<NodeId, Vec<Box<dyn Component>>>,
}

impl SceneGraph {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying hierarchy.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Insert a node under `parent` (or as a root).
    pub fn insert(&mut self, parent: Option<NodeId>) -> NodeId {
        self.tree.insert(parent)
    }

    /// Remove a node, its subtree, and every attached component.
    pub fn remove(&mut self, node: NodeId) {
        let mut stack = alloc::vec![node];
        while let Some(n) = stack.pop() {
            stack.extend_from_slice(self.tree.children_of(n));
            self.components.remove(&n);
        }
        self.tree.remove(node);
    }

    /// Move `node` under `new_parent`. See [`Tree::reparent`].
    pub fn reparent(&mut self, node: NodeId, new_parent: Option<NodeId>) -> bool {
        self.tree.reparent(node, new_parent)
    }

    /// Set whether `node` itself is active.
    pub fn set_active(&mut self, node: NodeId, active: bool) {
        self.tree.set_active(node, active);
    }

    /// Attach a component to `node`.
    ///
    /// Returns `false` and drops the component if `node` is stale.
    pub fn add_component(&mut self, node: NodeId, component: impl Component + 'static) -> bool {
        if !self.tree.is_alive(node) {
            return false;
        }
        self.components
            .entry(node)
            .or_default()
            .push(Box::new(component));
        true
    }

    /// Components attached to `node`, in attachment order.
    pub fn components(&self, node: NodeId) -> &[Box<dyn Component>] {
        match self.components.get(&node) {
            Some(list) if self.tree.is_alive(node) => list,
            _ => &[],
        }
    }
}

impl ParentLookup<NodeId> for SceneGraph {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.parent_of(*node)
    }
}

impl EventScene<NodeId> for SceneGraph {
    fn is_active_in_hierarchy(&self, node: &NodeId) -> bool {
        self.tree.is_active_in_hierarchy(*node)
    }

    fn components_mut(&mut self, node: &NodeId) -> &mut [Box<dyn Component>] {
        if !self.tree.is_alive(*node) {
            return &mut [];
        }
        self.components
            .get_mut(node)
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker;

    impl Component for Marker {}

    #[test]
    fn components_follow_node_lifetime() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(None);
        let child = scene.insert(Some(root));
        let grandchild = scene.insert(Some(child));
        assert!(scene.add_component(child, Marker));
        assert!(scene.add_component(grandchild, Marker));
        assert!(scene.add_component(grandchild, Marker));
        assert_eq!(scene.components(grandchild).len(), 2);

        scene.remove(child);
        assert!(scene.components(child).is_empty());
        assert!(scene.components_mut(&grandchild).is_empty());
        assert!(!scene.add_component(grandchild, Marker));

        // A reused slot starts without components.
        let fresh = scene.insert(Some(root));
        assert!(scene.components(fresh).is_empty());
    }

    #[test]
    fn scene_answers_hierarchy_queries() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(None);
        let child = scene.insert(Some(root));
        assert_eq!(ParentLookup::parent_of(&scene, &child), Some(root));
        assert_eq!(scene.depth_of(&child), 1);
        scene.set_active(root, false);
        assert!(!scene.is_active_in_hierarchy(&child));
        assert!(scene.reparent(child, None));
        assert!(scene.is_active_in_hierarchy(&child));
    }
}

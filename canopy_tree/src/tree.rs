// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, activation, and ancestry queries.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::lookup::ParentLookup;
use crate::types::{NodeFlags, NodeId};

/// Hierarchy arena.
///
/// Nodes live in slots addressed by generational [`NodeId`]s. Parent lookup is
/// O(1), so depth and ancestor chains cost one step per ancestor and never
/// need back-pointers into the caller's data.
///
/// ## Example
///
/// ```rust
/// use canopy_tree::{ParentLookup, Tree};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(None);
/// let panel = tree.insert(Some(root));
/// let button = tree.insert(Some(panel));
///
/// assert_eq!(tree.depth(button), Some(2));
/// assert_eq!(tree.depth_of(&button), 2);
///
/// // Deactivating an ancestor deactivates the subtree in the hierarchy.
/// tree.set_active(panel, false);
/// assert!(tree.is_active_self(button));
/// assert!(!tree.is_active_in_hierarchy(button));
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    flags: NodeFlags,
}

impl Node {
    fn new(generation: u32, flags: NodeFlags) -> Self {
        Self {
            generation,
            parent: None,
            children: SmallVec::new(),
            flags,
        }
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Whether the tree has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new active node as a child of `parent` (or as a root if `None`).
    ///
    /// A stale `parent` inserts the node as a root.
    pub fn insert(&mut self, parent: Option<NodeId>) -> NodeId {
        self.insert_with_flags(parent, NodeFlags::default())
    }

    /// Insert a new node with explicit flags.
    pub fn insert_with_flags(&mut self, parent: Option<NodeId>, flags: NodeFlags) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, flags));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, flags)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove a node and its subtree.
    ///
    /// Every removed identifier becomes stale immediately.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let mut stack: Vec<NodeId> = Vec::new();
        stack.push(id);
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
            }
        }
    }

    /// Move `id` under `new_parent` (or make it a root with `None`).
    ///
    /// Returns `false` and leaves the tree untouched if either id is stale or
    /// `new_parent` lies inside the subtree of `id`.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.is_ancestor_or_self(id, p))
        {
            return false;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
        true
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Returns the flags of a node if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|node| node.flags)
    }

    /// Set or clear the node's own [`NodeFlags::ACTIVE`] flag.
    pub fn set_active(&mut self, id: NodeId, active: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.flags.set(NodeFlags::ACTIVE, active);
        }
    }

    /// Whether the node itself is flagged active (ignores ancestors).
    pub fn is_active_self(&self, id: NodeId) -> bool {
        self.flags(id).is_some_and(|f| f.contains(NodeFlags::ACTIVE))
    }

    /// Whether the node and all of its ancestors are active.
    ///
    /// Stale identifiers are never active.
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if !self.is_active_self(n) {
                return false;
            }
            cur = self.parent_of(n);
        }
        true
    }

    /// Number of ancestors above a live node; `None` for stale ids.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        if !self.is_alive(id) {
            return None;
        }
        Some(ParentLookup::depth_of(self, &id))
    }

    // --- internals ---

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent_of(n);
        }
        false
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let p = self.node_mut(parent);
        p.children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}

impl ParentLookup<NodeId> for Tree {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        Self::parent_of(self, *node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn insert_links_parent_and_children() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let a = tree.insert(Some(root));
        let b = tree.insert(Some(root));
        assert_eq!(tree.parent_of(a), Some(root));
        assert_eq!(tree.parent_of(root), None);
        assert_eq!(tree.children_of(root), &[a, b]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let child = tree.insert(Some(root));
        let grandchild = tree.insert(Some(child));
        tree.remove(child);
        assert!(tree.is_alive(root));
        assert!(!tree.is_alive(child));
        assert!(!tree.is_alive(grandchild));
        assert!(tree.children_of(root).is_empty());
        assert_eq!(tree.len(), 1);

        // Slots are reused with a bumped generation; old ids stay stale.
        let reused = tree.insert(Some(root));
        assert!(tree.is_alive(reused));
        assert!(!tree.is_alive(child));
        assert!(!tree.is_alive(grandchild));
        assert_ne!(reused, child);
        assert_ne!(reused, grandchild);
    }

    #[test]
    fn parent_of_respects_liveness_and_roots() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let child = tree.insert(Some(root));
        assert_eq!(tree.parent_of(child), Some(root));
        assert_eq!(tree.parent_of(root), None);
        tree.remove(child);
        assert_eq!(tree.parent_of(child), None);
    }

    #[test]
    fn depth_counts_ancestors() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let a = tree.insert(Some(root));
        let b = tree.insert(Some(a));
        assert_eq!(tree.depth(root), Some(0));
        assert_eq!(tree.depth(a), Some(1));
        assert_eq!(tree.depth(b), Some(2));
        tree.remove(b);
        assert_eq!(tree.depth(b), None);
    }

    #[test]
    fn ancestor_chain_walks_to_top() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let mid = tree.insert(Some(root));
        let leaf = tree.insert(Some(mid));
        let mut chain = vec![];
        tree.ancestor_chain(leaf, &mut chain);
        assert_eq!(chain, vec![leaf, mid, root]);
    }

    #[test]
    fn reparent_moves_subtree_and_rejects_cycles() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let a = tree.insert(Some(root));
        let b = tree.insert(Some(root));
        let a_child = tree.insert(Some(a));

        assert!(tree.reparent(a, Some(b)));
        assert_eq!(tree.parent_of(a), Some(b));
        assert_eq!(tree.children_of(root), &[b]);
        assert_eq!(tree.depth(a_child), Some(3));

        // Moving a node under its own descendant would create a cycle.
        assert!(!tree.reparent(b, Some(a_child)));
        assert_eq!(tree.parent_of(b), Some(root));

        assert!(tree.reparent(a, None));
        assert_eq!(tree.depth(a_child), Some(1));
    }

    #[test]
    fn active_in_hierarchy_requires_all_ancestors() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let mid = tree.insert(Some(root));
        let leaf = tree.insert(Some(mid));
        assert!(tree.is_active_in_hierarchy(leaf));

        tree.set_active(root, false);
        assert!(tree.is_active_self(leaf));
        assert!(!tree.is_active_in_hierarchy(leaf));
        assert!(!tree.is_active_in_hierarchy(mid));

        tree.set_active(root, true);
        assert!(tree.is_active_in_hierarchy(leaf));

        let inactive = tree.insert_with_flags(Some(leaf), NodeFlags::empty());
        assert!(!tree.is_active_in_hierarchy(inactive));
    }

    #[test]
    fn stale_ids_are_inactive_and_ignored() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        tree.remove(root);
        assert!(!tree.is_active_in_hierarchy(root));
        tree.set_active(root, true);
        assert_eq!(tree.flags(root), None);
        assert!(!tree.reparent(root, None));
        let orphan = tree.insert(Some(root));
        assert_eq!(tree.parent_of(orphan), None);
    }
}

// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Tree: a generational hierarchy arena for UI scenes.
//!
//! The scheduler and the event dispatcher in Canopy both need a small,
//! read-only view of the scene hierarchy: who is the parent of a node, how
//! deep is it, and is it active once its ancestors are taken into account.
//! This crate provides that view and a concrete arena to back it.
//!
//! - [`Tree`]: slot arena of nodes with parent/child links and per-node flags.
//! - [`NodeId`]: generational handle; stale handles never alias newer nodes.
//! - [`NodeFlags`]: per-node state. [`NodeFlags::ACTIVE`] drives
//!   [`Tree::is_active_in_hierarchy`].
//! - [`ParentLookup`]: the trait other crates consume. Anything that can
//!   answer `parent_of` gets [`ParentLookup::depth_of`] and
//!   [`ParentLookup::ancestor_chain`] for free.
//!
//! ## Not a scene graph
//!
//! There are no transforms, bounds, or rendering data here. Hosts that
//! already have a scene representation can implement [`ParentLookup`]
//! directly and skip [`Tree`] entirely.
//!
//! ## Example
//!
//! ```rust
//! use canopy_tree::{ParentLookup, Tree};
//!
//! let mut tree = Tree::new();
//! let canvas = tree.insert(None);
//! let row = tree.insert(Some(canvas));
//! let label = tree.insert(Some(row));
//!
//! let mut chain = Vec::new();
//! tree.ancestor_chain(label, &mut chain);
//! assert_eq!(chain, vec![label, row, canvas]);
//!
//! tree.remove(row);
//! assert!(!tree.is_alive(label));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod lookup;
mod tree;
mod types;

pub use lookup::{NoParent, ParentLookup};
pub use tree::Tree;
pub use types::{NodeFlags, NodeId};

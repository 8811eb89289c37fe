// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent lookups: the read-only view of a hierarchy that schedulers and
//! dispatchers need.

use alloc::vec::Vec;

/// Look up the parent of a node.
///
/// Implemented by [`Tree`](crate::Tree); other scene representations can
/// implement it directly. Implementations must describe an acyclic hierarchy.
pub trait ParentLookup<K> {
    /// Returns the parent of `node`, or `None` if `node` is a root (or unknown).
    fn parent_of(&self, node: &K) -> Option<K>;

    /// Number of ancestors above `node`; `0` for roots.
    fn depth_of(&self, node: &K) -> usize {
        let mut depth = 0;
        let mut cur = self.parent_of(node);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent_of(&p);
        }
        depth
    }

    /// Fill `out` with `node` followed by each ancestor up to the top.
    ///
    /// `out` is cleared first so pooled buffers can be passed in directly.
    fn ancestor_chain(&self, node: K, out: &mut Vec<K>)
    where
        K: Copy,
    {
        out.clear();
        let mut cur = Some(node);
        while let Some(n) = cur {
            out.push(n);
            cur = self.parent_of(&n);
        }
    }
}

/// A parent provider with no parents: every node is a root.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    #[inline]
    fn parent_of(&self, _node: &K) -> Option<K> {
        None
    }
}

impl<K, P: ParentLookup<K> + ?Sized> ParentLookup<K> for &P {
    #[inline]
    fn parent_of(&self, node: &K) -> Option<K> {
        (**self).parent_of(node)
    }
}

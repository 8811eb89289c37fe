// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-ordered set with O(1) membership and index access.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::Hash;

use hashbrown::HashMap;

/// An insertion-ordered set.
///
/// Backed by a `Vec` for ordered storage and a hash map from value to its
/// current position. Every mutation keeps the two in agreement, so
/// [`IndexedSet::index_of`] always reflects the current order.
///
/// ## Ordering
///
/// - Iteration order is insertion order.
/// - Removal shifts later elements down by one (it does not swap the last
///   element into the hole), so relative order survives removals.
/// - [`IndexedSet::sort_by`] reorders in place with a stable sort.
///
/// ## Example
///
/// ```rust
/// use canopy_collections::IndexedSet;
///
/// let mut set = IndexedSet::new();
/// set.add_unique('c');
/// set.add_unique('a');
/// set.add_unique('b');
/// assert!(set.remove(&'a'));
/// assert_eq!(set.as_slice(), &['c', 'b']);
/// set.sort_by(|x, y| x.cmp(y));
/// assert_eq!(set.as_slice(), &['b', 'c']);
/// assert_eq!(set.index_of(&'c'), Some(1));
/// ```
#[derive(Clone)]
pub struct IndexedSet<T> {
    list: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T: core::fmt::Debug> core::fmt::Debug for IndexedSet<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.list.iter()).finish()
    }
}

impl<T: Hash + Eq + Clone> Default for IndexedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> IndexedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Create an empty set with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Whether `item` is in the set.
    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// Append `item` if it is not already present.
    ///
    /// Returns `true` if it was inserted.
    pub fn add_unique(&mut self, item: T) -> bool {
        if self.positions.contains_key(&item) {
            return false;
        }
        self.positions.insert(item.clone(), self.list.len());
        self.list.push(item);
        true
    }

    /// Remove `item` if present. Returns `true` if it was removed.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(index) = self.index_of(item) else {
            return false;
        };
        self.remove_at(index);
        true
    }

    /// Remove and return the element at `index`, shifting later elements down.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; that is a caller bug.
    pub fn remove_at(&mut self, index: usize) -> T {
        assert!(
            index < self.list.len(),
            "IndexedSet::remove_at index {index} out of range for length {}",
            self.list.len()
        );
        let item = self.list.remove(index);
        self.positions.remove(&item);
        self.reindex_from(index);
        item
    }

    /// Remove every element matching `pred`, preserving the order of the rest.
    ///
    /// Returns the number of removed elements.
    pub fn remove_all(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.list.len();
        let positions = &mut self.positions;
        self.list.retain(|item| {
            let remove = pred(item);
            if remove {
                positions.remove(item);
            }
            !remove
        });
        let removed = before - self.list.len();
        if removed > 0 {
            self.reindex_from(0);
        }
        removed
    }

    /// Position of `item`, if present.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.positions.get(item).copied()
    }

    /// Element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.list.get(index)
    }

    /// Iterate in current order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.list.iter()
    }

    /// The elements in current order.
    pub fn as_slice(&self) -> &[T] {
        &self.list
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.list.clear();
        self.positions.clear();
    }

    /// Sort in place with a stable sort; equal elements keep their relative order.
    pub fn sort_by(&mut self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.list.sort_by(compare);
        self.reindex_from(0);
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, item) in self.list.iter().enumerate().skip(start) {
            if let Some(slot) = self.positions.get_mut(item) {
                *slot = i;
            }
        }
    }
}

impl<T> core::ops::Index<usize> for IndexedSet<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.list[index]
    }
}

impl<'a, T> IntoIterator for &'a IndexedSet<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

impl<T: Hash + Eq + Clone> Extend<T> for IndexedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.add_unique(item);
        }
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for IndexedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

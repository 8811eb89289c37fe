// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object pools.

use alloc::vec::Vec;

/// A cache of reusable instances.
///
/// ## Usage
///
/// - [`ObjectPool::get`] pops a previously released instance, or builds a new
///   one with the pool's factory when none is available.
/// - [`ObjectPool::release`] runs the optional release action (typically a
///   reset such as `Vec::clear`) and keeps the instance for the next `get`.
///
/// The pool is not synchronized; it is meant to be owned by a single
/// frame-driven system.
///
/// ## Example
///
/// ```rust
/// use canopy_collections::ObjectPool;
///
/// let mut pool: ObjectPool<String> = ObjectPool::with_actions(
///     String::new,
///     None,
///     Some(|s: &mut String| s.clear()),
/// );
/// let mut s = pool.get();
/// s.push_str("scratch");
/// pool.release(s);
/// assert_eq!(pool.count_inactive(), 1);
/// assert!(pool.get().is_empty());
/// ```
pub struct ObjectPool<T> {
    stack: Vec<T>,
    factory: fn() -> T,
    on_get: Option<fn(&mut T)>,
    on_release: Option<fn(&mut T)>,
    count_all: usize,
}

/// A pool of `Vec`s that are cleared when released.
///
/// Build one with [`ObjectPool::list_pool`].
pub type ListPool<T> = ObjectPool<Vec<T>>;

impl<T> core::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("count_all", &self.count_all)
            .field("count_inactive", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl<T: Default> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> ObjectPool<T> {
    /// Create a pool that builds instances with `T::default()` and has no
    /// get/release actions.
    pub fn new() -> Self {
        Self::with_factory(T::default)
    }
}

impl<T> ObjectPool<T> {
    /// Create a pool with an explicit factory.
    pub fn with_factory(factory: fn() -> T) -> Self {
        Self::with_actions(factory, None, None)
    }

    /// Create a pool with a factory and optional actions run on every
    /// [`get`](Self::get) and [`release`](Self::release).
    pub fn with_actions(
        factory: fn() -> T,
        on_get: Option<fn(&mut T)>,
        on_release: Option<fn(&mut T)>,
    ) -> Self {
        Self {
            stack: Vec::new(),
            factory,
            on_get,
            on_release,
            count_all: 0,
        }
    }

    /// Reserve room for `capacity` released instances.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.stack.reserve(capacity);
        self
    }

    /// Take an instance out of the pool, building a new one if it is empty.
    pub fn get(&mut self) -> T {
        let mut item = match self.stack.pop() {
            Some(item) => item,
            None => {
                self.count_all += 1;
                (self.factory)()
            }
        };
        if let Some(on_get) = self.on_get {
            on_get(&mut item);
        }
        item
    }

    /// Return an instance to the pool after running the release action.
    ///
    /// Instances that did not come from this pool are accepted and adopted.
    pub fn release(&mut self, mut item: T) {
        if let Some(on_release) = self.on_release {
            on_release(&mut item);
        }
        if self.stack.len() >= self.count_all {
            // Adopted from outside; keep the counters consistent.
            self.count_all = self.stack.len() + 1;
        }
        self.stack.push(item);
    }

    /// Number of instances this pool has created (or adopted).
    pub fn count_all(&self) -> usize {
        self.count_all
    }

    /// Number of instances currently checked out.
    pub fn count_active(&self) -> usize {
        self.count_all - self.stack.len()
    }

    /// Number of instances waiting in the pool.
    pub fn count_inactive(&self) -> usize {
        self.stack.len()
    }
}

impl<T> ObjectPool<Vec<T>> {
    /// Create a pool of lists that are cleared on release.
    pub fn list_pool() -> Self {
        Self::with_actions(Vec::new, None, Some(Vec::clear as fn(&mut Vec<T>)))
    }
}

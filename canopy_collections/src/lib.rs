// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Collections: small, allocation-avoiding containers for per-frame UI work.
//!
//! ## Overview
//!
//! UI systems that run once per frame tend to allocate the same short-lived
//! scratch lists over and over. This crate provides the two containers the rest
//! of Canopy leans on to avoid that churn:
//!
//! - [`ObjectPool`]: a reusable-object cache. [`ObjectPool::get`] hands out a
//!   previously released instance (or builds a fresh one), and
//!   [`ObjectPool::release`] runs an optional reset action and keeps the
//!   instance for later. [`ListPool`] is the common case of pooled `Vec`s that
//!   are cleared on release.
//! - [`IndexedSet`]: an insertion-ordered set with O(1) membership tests,
//!   unique insertion, positional and value removal, index access, and a
//!   stable in-place sort.
//!
//! ## Ownership
//!
//! Pools transfer ownership: `get` moves the instance out to the caller and
//! `release` moves it back. An entry therefore cannot be borrowed by two
//! callers at once, and a released entry cannot be used again by the caller
//! that released it.
//!
//! ## Example
//!
//! ```rust
//! use canopy_collections::{IndexedSet, ListPool, ObjectPool};
//!
//! let mut pool: ListPool<u32> = ObjectPool::list_pool();
//! let mut scratch = pool.get();
//! scratch.extend([3, 1, 2]);
//! pool.release(scratch);
//! // Released lists come back empty.
//! assert!(pool.get().is_empty());
//!
//! let mut set = IndexedSet::new();
//! assert!(set.add_unique("a"));
//! assert!(!set.add_unique("a"));
//! assert_eq!(set.index_of(&"a"), Some(0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod indexed_set;
mod pool;

pub use indexed_set::IndexedSet;
pub use pool::{ListPool, ObjectPool};

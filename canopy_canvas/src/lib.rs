// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Canvas: the per-frame layout and graphic rebuild scheduler.
//!
//! UI elements mark themselves dirty when their layout or appearance goes
//! stale. Once per frame, right before drawing, the host asks the
//! [`CanvasUpdateRegistry`] to rebuild everything that is dirty:
//!
//! - layout first, parents before children, in three phases
//!   ([`CanvasUpdate::LAYOUT_PHASES`]),
//! - then clipping and culling through a [`Clipper`],
//! - then graphics, in two phases ([`CanvasUpdate::RENDER_PHASES`]).
//!
//! Elements implement [`CanvasElement`]. The registry holds them weakly, so
//! dropping an element is enough to take it out of the schedule.
//!
//! ## Hierarchy
//!
//! Layout depth comes from a [`canopy_tree::ParentLookup`]. A
//! [`canopy_tree::Tree`] works directly; hosts with their own scene
//! representation implement the trait instead.
//!
//! ## Failures
//!
//! [`CanvasElement::rebuild`] returns [`RebuildError`] on failure. Failures
//! are logged through [`tracing`] with the element and phase, and the drain
//! continues. With the `std` feature, panics in element callbacks are
//! contained the same way.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod element;
mod registry;
mod update;

pub use element::{CanvasElement, RebuildError};
pub use registry::{CanvasUpdateRegistry, Clipper, NoClip, RegistryConfig, UpdateSummary};
pub use update::{CanvasUpdate, MAX_UPDATE_VALUE};

// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract between the scheduler and the things it rebuilds.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt::Debug;

use crate::registry::CanvasUpdateRegistry;
use crate::update::CanvasUpdate;

/// Failure reported by [`CanvasElement::rebuild`].
///
/// The scheduler logs it with the element and phase and moves on.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    /// A plain description.
    #[error("{0}")]
    Message(String),
    /// An underlying error.
    #[error("{0}")]
    Source(#[source] Box<dyn core::error::Error + Send + Sync>),
}

impl RebuildError {
    /// Build a [`RebuildError::Message`].
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Something that can be queued for layout or graphic rebuild.
///
/// Callbacks take `&self`; elements keep their mutable state behind cells.
/// The registry is passed into [`rebuild`](Self::rebuild) so an element can
/// dirty other elements while it rebuilds.
///
/// Identity is the element's allocation: registering the same `Rc` twice is
/// a no-op.
pub trait CanvasElement<K>: Debug {
    /// Run one phase of the rebuild.
    fn rebuild(
        &self,
        update: CanvasUpdate,
        registry: &CanvasUpdateRegistry<K>,
    ) -> Result<(), RebuildError>;

    /// Node this element is attached to; determines its layout depth.
    ///
    /// Elements without a node sort as roots. Called while the layout set is
    /// being sorted, so it must not call back into the registry.
    fn node(&self) -> Option<K>;

    /// Called once after the layout drain, or on unregistration.
    fn layout_complete(&self) {}

    /// Called once after the graphic drain, or on unregistration.
    fn graphic_update_complete(&self) {}

    /// Whether the element is still alive and should be rebuilt.
    ///
    /// Invalid elements are dropped from the sets at the start of the next
    /// frame, with their completion callback.
    fn is_valid(&self) -> bool {
        true
    }
}

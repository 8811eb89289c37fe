// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Events: capability-based event dispatch for UI scenes.
//!
//! ## Overview
//!
//! Input arrives as a target node plus a payload. The dispatcher finds the
//! components on that node (and, when bubbling, on its ancestors) that
//! implement the relevant capability, and invokes them.
//!
//! - [`event_data`]: payloads. [`BaseEventData`] carries the used flag;
//!   [`PointerEventData`] and [`AxisEventData`] extend it.
//! - [`capability`]: one handler trait and one marker type per event category,
//!   the [`Component`] trait components implement, and [`EventTriggerType`]
//!   for picking a capability at runtime.
//! - [`dispatcher`]: [`EventDispatcher`] and the [`EventScene`] seam it routes
//!   through.
//! - [`scene`]: [`SceneGraph`], an [`EventScene`] over a [`canopy_tree::Tree`].
//! - [`raycast`]: raycaster registry and the physics raycasters that produce
//!   hit lists for the input layer.
//!
//! ## Open dispatch
//!
//! The dispatcher knows capabilities, never component types. A new widget
//! that implements [`PointerClickHandler`] and overrides
//! [`Component::as_pointer_click_handler`] receives clicks with no change
//! anywhere else.
//!
//! ## Errors and logging
//!
//! Supplying a payload of the wrong type is a caller bug and is reported as
//! [`DispatchError::InvalidEventData`] before any handler runs. Handler
//! panics are contained when the `std` feature is enabled and reported with
//! [`tracing`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod capability;
pub mod dispatcher;
mod error;
pub mod event_data;
pub mod raycast;
pub mod scene;

pub use capability::{
    BeginDrag, BeginDragHandler, Cancel, CancelHandler, Capability, Component, Deselect,
    DeselectHandler, Drag, DragHandler, Drop, DropHandler, EndDrag, EndDragHandler,
    EventTriggerType, InitializePotentialDrag, InitializePotentialDragHandler, Move, MoveHandler,
    PointerClick, PointerClickHandler, PointerDown, PointerDownHandler, PointerEnter,
    PointerEnterHandler, PointerExit, PointerExitHandler, PointerUp, PointerUpHandler, Scroll,
    ScrollHandler, Select, SelectHandler, Submit, SubmitHandler, UpdateSelected,
    UpdateSelectedHandler,
};
pub use dispatcher::{EventDispatcher, EventScene};
pub use error::DispatchError;
pub use event_data::{
    AxisEventData, BaseEventData, EventData, EventHandle, InputButton, MoveDirection,
    PointerEventData, validate_event_data,
};
pub use scene::SceneGraph;

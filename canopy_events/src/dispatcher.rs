// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event dispatcher: fan an event out to the components of a node, and bubble
//! it up the node's ancestors until something handles it.
//!
//! ## Semantics
//!
//! - A component is eligible for capability `C` when its node is active in the
//!   hierarchy, the component is enabled, and it implements `C`.
//! - [`EventDispatcher::execute`] invokes every eligible component on one node
//!   and reports whether there were any.
//! - [`EventDispatcher::execute_hierarchy`] offers the event to the target,
//!   then to each ancestor in turn, and stops at the first node that had an
//!   eligible component.
//! - [`EventDispatcher::can_handle`] and [`EventDispatcher::find_handler`]
//!   answer the same questions without invoking anything.
//!
//! The payload is checked against the capability once, before any handler
//! runs. A mismatch is returned as [`DispatchError::InvalidEventData`].
//!
//! With the `std` feature, a handler that panics is logged and skipped; its
//! siblings still run and the node still counts as handled.
//!
//! ## Example
//!
//! ```rust
//! use canopy_events::{
//!     Component, EventDispatcher, PointerClick, PointerClickHandler, PointerEventData, SceneGraph,
//! };
//!
//! #[derive(Debug, Default)]
//! struct Button;
//!
//! impl PointerClickHandler for Button {
//!     fn on_pointer_click(&mut self, event: &mut PointerEventData) {
//!         event.base.use_event();
//!     }
//! }
//!
//! impl Component for Button {
//!     fn as_pointer_click_handler(&mut self) -> Option<&mut dyn PointerClickHandler> {
//!         Some(self)
//!     }
//! }
//!
//! let mut scene = SceneGraph::new();
//! let panel = scene.insert(None);
//! let label = scene.insert(Some(panel));
//! scene.add_component(panel, Button);
//!
//! let mut dispatcher = EventDispatcher::new();
//! let mut event = PointerEventData::default();
//!
//! // The label has no click handler, so the click bubbles to the panel.
//! let handled_by = dispatcher
//!     .execute_hierarchy::<PointerClick>(&mut scene, label, &mut event)
//!     .unwrap();
//! assert_eq!(handled_by, Some(panel));
//! assert!(event.base.is_used());
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use canopy_collections::{ListPool, ObjectPool};
use canopy_tree::ParentLookup;

use crate::capability::{
    BeginDrag, Cancel, Capability, Component, Deselect, Drag, Drop, EndDrag, EventTriggerType,
    InitializePotentialDrag, Move, PointerClick, PointerDown, PointerEnter, PointerExit,
    PointerUp, Scroll, Select, Submit, UpdateSelected,
};
use crate::error::DispatchError;
use crate::event_data::EventData;

/// A scene the dispatcher can route events through.
///
/// Parent links come from [`ParentLookup`]; this adds activation state and
/// access to the components attached to each node.
pub trait EventScene<K>: ParentLookup<K> {
    /// Whether `node` and all of its ancestors are active.
    fn is_active_in_hierarchy(&self, node: &K) -> bool;

    /// Components attached to `node`, in attachment order.
    ///
    /// Unknown nodes have no components.
    fn components_mut(&mut self, node: &K) -> &mut [Box<dyn Component>];
}

/// Routes events to components.
///
/// Owns pooled scratch lists for handler indices and ancestor chains, so
/// steady-state dispatch does not allocate.
pub struct EventDispatcher<K> {
    handlers: ListPool<usize>,
    chains: ListPool<K>,
}

impl<K> Debug for EventDispatcher<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers)
            .field("chains", &self.chains)
            .finish()
    }
}

impl<K: Copy + Debug> Default for EventDispatcher<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Debug> EventDispatcher<K> {
    /// Create a dispatcher with empty scratch pools.
    pub fn new() -> Self {
        Self {
            handlers: ObjectPool::list_pool(),
            chains: ObjectPool::list_pool(),
        }
    }

    /// Create a dispatcher whose scratch lists start with room for `capacity`
    /// entries (handlers per node, and ancestors per chain).
    pub fn with_capacity(capacity: usize) -> Self {
        let mut dispatcher = Self::new();
        let mut handlers = dispatcher.handlers.get();
        handlers.reserve(capacity);
        dispatcher.handlers.release(handlers);
        let mut chain = dispatcher.chains.get();
        chain.reserve(capacity);
        dispatcher.chains.release(chain);
        dispatcher
    }

    /// Invoke capability `C` on every eligible component of `target`.
    ///
    /// Returns `Ok(true)` if at least one component was eligible.
    pub fn execute<C: Capability>(
        &mut self,
        scene: &mut impl EventScene<K>,
        target: K,
        data: &mut dyn EventData,
    ) -> Result<bool, DispatchError> {
        let event = C::validate(data)?;
        Ok(self.execute_validated::<C>(scene, target, event))
    }

    /// Offer capability `C` to `target`, then to each ancestor in turn.
    ///
    /// Returns the first node that had an eligible component, or `None` if
    /// none on the chain did.
    pub fn execute_hierarchy<C: Capability>(
        &mut self,
        scene: &mut impl EventScene<K>,
        target: K,
        data: &mut dyn EventData,
    ) -> Result<Option<K>, DispatchError> {
        let event = C::validate(data)?;
        let mut chain = self.chains.get();
        scene.ancestor_chain(target, &mut chain);
        let mut handled_by = None;
        for &node in &chain {
            if self.execute_validated::<C>(scene, node, event) {
                handled_by = Some(node);
                break;
            }
        }
        self.chains.release(chain);
        Ok(handled_by)
    }

    /// Whether `node` has at least one component eligible for `C`.
    pub fn can_handle<C: Capability>(&mut self, scene: &mut impl EventScene<K>, node: K) -> bool {
        let mut handlers = self.handlers.get();
        collect_handlers::<C, K>(scene, &node, &mut handlers);
        let found = !handlers.is_empty();
        self.handlers.release(handlers);
        found
    }

    /// First node on the chain from `target` up to the top that
    /// [`can_handle`](Self::can_handle) `C`.
    pub fn find_handler<C: Capability>(
        &mut self,
        scene: &mut impl EventScene<K>,
        target: K,
    ) -> Option<K> {
        let mut chain = self.chains.get();
        scene.ancestor_chain(target, &mut chain);
        let found = chain
            .iter()
            .copied()
            .find(|node| self.can_handle::<C>(scene, *node));
        self.chains.release(chain);
        found
    }

    /// [`execute`](Self::execute) for a capability chosen at runtime.
    pub fn execute_trigger(
        &mut self,
        trigger: EventTriggerType,
        scene: &mut impl EventScene<K>,
        target: K,
        data: &mut dyn EventData,
    ) -> Result<bool, DispatchError> {
        match trigger {
            EventTriggerType::PointerEnter => self.execute::<PointerEnter>(scene, target, data),
            EventTriggerType::PointerExit => self.execute::<PointerExit>(scene, target, data),
            EventTriggerType::PointerDown => self.execute::<PointerDown>(scene, target, data),
            EventTriggerType::PointerUp => self.execute::<PointerUp>(scene, target, data),
            EventTriggerType::PointerClick => self.execute::<PointerClick>(scene, target, data),
            EventTriggerType::Drag => self.execute::<Drag>(scene, target, data),
            EventTriggerType::Drop => self.execute::<Drop>(scene, target, data),
            EventTriggerType::Scroll => self.execute::<Scroll>(scene, target, data),
            EventTriggerType::UpdateSelected => {
                self.execute::<UpdateSelected>(scene, target, data)
            }
            EventTriggerType::Select => self.execute::<Select>(scene, target, data),
            EventTriggerType::Deselect => self.execute::<Deselect>(scene, target, data),
            EventTriggerType::Move => self.execute::<Move>(scene, target, data),
            EventTriggerType::InitializePotentialDrag => {
                self.execute::<InitializePotentialDrag>(scene, target, data)
            }
            EventTriggerType::BeginDrag => self.execute::<BeginDrag>(scene, target, data),
            EventTriggerType::EndDrag => self.execute::<EndDrag>(scene, target, data),
            EventTriggerType::Submit => self.execute::<Submit>(scene, target, data),
            EventTriggerType::Cancel => self.execute::<Cancel>(scene, target, data),
        }
    }

    fn execute_validated<C: Capability>(
        &mut self,
        scene: &mut impl EventScene<K>,
        target: K,
        event: &mut C::Event,
    ) -> bool {
        let mut handlers = self.handlers.get();
        collect_handlers::<C, K>(scene, &target, &mut handlers);
        if !handlers.is_empty() {
            let components = scene.components_mut(&target);
            for &index in &handlers {
                let Some(component) = components.get_mut(index) else {
                    continue;
                };
                let component: &mut dyn Component = &mut **component;
                if !invoke_isolated::<C>(component, event) {
                    tracing::error!(
                        capability = C::NAME,
                        node = ?target,
                        component = ?component,
                        "event handler panicked"
                    );
                }
            }
            tracing::trace!(
                capability = C::NAME,
                node = ?target,
                handlers = handlers.len(),
                "event executed"
            );
        }
        let handled = !handlers.is_empty();
        self.handlers.release(handlers);
        handled
    }
}

fn collect_handlers<C: Capability, K>(
    scene: &mut impl EventScene<K>,
    node: &K,
    out: &mut Vec<usize>,
) {
    out.clear();
    if !scene.is_active_in_hierarchy(node) {
        return;
    }
    for (index, component) in scene.components_mut(node).iter_mut().enumerate() {
        if component.is_enabled() && C::handles(&mut **component) {
            out.push(index);
        }
    }
}

/// Returns `false` if the handler panicked.
#[cfg(feature = "std")]
fn invoke_isolated<C: Capability>(component: &mut dyn Component, event: &mut C::Event) -> bool {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    catch_unwind(AssertUnwindSafe(|| {
        C::invoke(component, event);
    }))
    .is_ok()
}

#[cfg(not(feature = "std"))]
fn invoke_isolated<C: Capability>(component: &mut dyn Component, event: &mut C::Event) -> bool {
    C::invoke(component, event);
    true
}

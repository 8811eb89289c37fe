// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capabilities: handler traits, their markers, and the [`Component`] trait.
//!
//! A capability is one event category (pointer enter, drag, submit, ...). It
//! has three parts:
//!
//! - a handler trait (for example [`PointerClickHandler`]) that components
//!   implement,
//! - a zero-sized marker type (for example [`PointerClick`]) that names the
//!   capability at dispatch sites and implements [`Capability`],
//! - an opt-in accessor on [`Component`] (for example
//!   [`Component::as_pointer_click_handler`]) through which the dispatcher
//!   reaches the handler.
//!
//! Components opt in by implementing the handler trait and overriding the
//! accessor to return `Some(self)`. The dispatcher never learns concrete
//! component types, so new components work without touching it.
//!
//! ```rust
//! use canopy_events::{Component, PointerClickHandler, PointerEventData};
//!
//! #[derive(Debug, Default)]
//! struct Button {
//!     clicks: u32,
//! }
//!
//! impl PointerClickHandler for Button {
//!     fn on_pointer_click(&mut self, event: &mut PointerEventData) {
//!         self.clicks += event.click_count;
//!         event.base.use_event();
//!     }
//! }
//!
//! impl Component for Button {
//!     fn as_pointer_click_handler(&mut self) -> Option<&mut dyn PointerClickHandler> {
//!         Some(self)
//!     }
//! }
//! ```

use core::fmt::Debug;

use crate::error::DispatchError;
use crate::event_data::{
    AxisEventData, BaseEventData, EventData, PointerEventData, validate_event_data,
};

/// Runtime identifier of each capability.
///
/// Discriminants are stable and usable as table indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventTriggerType {
    /// [`PointerEnter`].
    PointerEnter = 0,
    /// [`PointerExit`].
    PointerExit = 1,
    /// [`PointerDown`].
    PointerDown = 2,
    /// [`PointerUp`].
    PointerUp = 3,
    /// [`PointerClick`].
    PointerClick = 4,
    /// [`Drag`].
    Drag = 5,
    /// [`Drop`].
    Drop = 6,
    /// [`Scroll`].
    Scroll = 7,
    /// [`UpdateSelected`].
    UpdateSelected = 8,
    /// [`Select`].
    Select = 9,
    /// [`Deselect`].
    Deselect = 10,
    /// [`Move`].
    Move = 11,
    /// [`InitializePotentialDrag`].
    InitializePotentialDrag = 12,
    /// [`BeginDrag`].
    BeginDrag = 13,
    /// [`EndDrag`].
    EndDrag = 14,
    /// [`Submit`].
    Submit = 15,
    /// [`Cancel`].
    Cancel = 16,
}

impl EventTriggerType {
    /// Every trigger, in discriminant order.
    pub const ALL: [Self; 17] = [
        Self::PointerEnter,
        Self::PointerExit,
        Self::PointerDown,
        Self::PointerUp,
        Self::PointerClick,
        Self::Drag,
        Self::Drop,
        Self::Scroll,
        Self::UpdateSelected,
        Self::Select,
        Self::Deselect,
        Self::Move,
        Self::InitializePotentialDrag,
        Self::BeginDrag,
        Self::EndDrag,
        Self::Submit,
        Self::Cancel,
    ];
}

impl TryFrom<u8> for EventTriggerType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        Self::ALL.get(usize::from(value)).copied().ok_or(value)
    }
}

/// A capability marker: binds a handler trait to its payload type and to the
/// [`Component`] accessor that exposes it.
pub trait Capability: 'static {
    /// Payload type the handler takes.
    type Event: EventData;

    /// Human-readable name, used in log records.
    const NAME: &'static str;

    /// Runtime identifier.
    const TRIGGER: EventTriggerType;

    /// Narrow an arbitrary payload to [`Self::Event`].
    fn validate(data: &mut dyn EventData) -> Result<&mut Self::Event, DispatchError>;

    /// Whether `component` implements this capability.
    fn handles(component: &mut dyn Component) -> bool;

    /// Invoke the handler on `component`.
    ///
    /// Returns `false` without doing anything if `component` does not
    /// implement this capability.
    fn invoke(component: &mut dyn Component, event: &mut Self::Event) -> bool;
}

fn any_payload(data: &mut dyn EventData) -> Result<&mut BaseEventData, DispatchError> {
    Ok(data.base_mut())
}

macro_rules! capabilities {
    ($(
        $(#[$meta:meta])*
        $marker:ident: $handler:ident::$method:ident($event:ty), $accessor:ident, $validate:expr;
    )*) => {
        $(
            $(#[$meta])*
            pub trait $handler {
                /// Handle the event.
                fn $method(&mut self, event: &mut $event);
            }

            #[doc = concat!("Capability marker for [`", stringify!($handler), "`].")]
            #[derive(Debug)]
            pub enum $marker {}

            impl Capability for $marker {
                type Event = $event;

                const NAME: &'static str = stringify!($marker);
                const TRIGGER: EventTriggerType = EventTriggerType::$marker;

                fn validate(data: &mut dyn EventData) -> Result<&mut $event, DispatchError> {
                    $validate(data)
                }

                fn handles(component: &mut dyn Component) -> bool {
                    component.$accessor().is_some()
                }

                fn invoke(component: &mut dyn Component, event: &mut $event) -> bool {
                    match component.$accessor() {
                        Some(handler) => {
                            handler.$method(event);
                            true
                        }
                        None => false,
                    }
                }
            }
        )*

        /// Something attached to a scene node that may receive events.
        ///
        /// Every accessor defaults to `None`. Override the ones for the
        /// capabilities the component implements, returning `Some(self)`.
        pub trait Component: Debug {
            /// Whether the component currently participates in dispatch.
            fn is_enabled(&self) -> bool {
                true
            }

            $(
                #[doc = concat!("Expose this component as a [`", stringify!($handler), "`].")]
                fn $accessor(&mut self) -> Option<&mut dyn $handler> {
                    None
                }
            )*
        }
    };
}

capabilities! {
    /// Pointer moved onto the node.
    PointerEnter: PointerEnterHandler::on_pointer_enter(PointerEventData),
        as_pointer_enter_handler, validate_event_data::<PointerEventData>;
    /// Pointer moved off the node.
    PointerExit: PointerExitHandler::on_pointer_exit(PointerEventData),
        as_pointer_exit_handler, validate_event_data::<PointerEventData>;
    /// Pointer pressed on the node.
    PointerDown: PointerDownHandler::on_pointer_down(PointerEventData),
        as_pointer_down_handler, validate_event_data::<PointerEventData>;
    /// Pointer released; sent to the node that received the press.
    PointerUp: PointerUpHandler::on_pointer_up(PointerEventData),
        as_pointer_up_handler, validate_event_data::<PointerEventData>;
    /// Press and release on the same node.
    PointerClick: PointerClickHandler::on_pointer_click(PointerEventData),
        as_pointer_click_handler, validate_event_data::<PointerEventData>;
    /// A drag target was found, before the drag threshold is crossed.
    InitializePotentialDrag: InitializePotentialDragHandler::on_initialize_potential_drag(PointerEventData),
        as_initialize_potential_drag_handler, validate_event_data::<PointerEventData>;
    /// Drag is about to begin.
    BeginDrag: BeginDragHandler::on_begin_drag(PointerEventData),
        as_begin_drag_handler, validate_event_data::<PointerEventData>;
    /// Pointer moved during a drag.
    Drag: DragHandler::on_drag(PointerEventData),
        as_drag_handler, validate_event_data::<PointerEventData>;
    /// Drag finished; sent to the dragged node.
    EndDrag: EndDragHandler::on_end_drag(PointerEventData),
        as_end_drag_handler, validate_event_data::<PointerEventData>;
    /// Drag finished over this node.
    Drop: DropHandler::on_drop(PointerEventData),
        as_drop_handler, validate_event_data::<PointerEventData>;
    /// Scroll wheel or trackpad scroll.
    Scroll: ScrollHandler::on_scroll(PointerEventData),
        as_scroll_handler, validate_event_data::<PointerEventData>;
    /// Per-frame tick for the selected node.
    UpdateSelected: UpdateSelectedHandler::on_update_selected(BaseEventData),
        as_update_selected_handler, any_payload;
    /// Node became selected.
    Select: SelectHandler::on_select(BaseEventData),
        as_select_handler, any_payload;
    /// Node stopped being selected.
    Deselect: DeselectHandler::on_deselect(BaseEventData),
        as_deselect_handler, any_payload;
    /// Navigation move (arrow keys, gamepad).
    Move: MoveHandler::on_move(AxisEventData),
        as_move_handler, validate_event_data::<AxisEventData>;
    /// Submit (enter, gamepad confirm).
    Submit: SubmitHandler::on_submit(BaseEventData),
        as_submit_handler, any_payload;
    /// Cancel (escape, gamepad back).
    Cancel: CancelHandler::on_cancel(BaseEventData),
        as_cancel_handler, any_payload;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Submitter {
        submitted: u32,
    }

    impl SubmitHandler for Submitter {
        fn on_submit(&mut self, event: &mut BaseEventData) {
            self.submitted += 1;
            event.use_event();
        }
    }

    impl Component for Submitter {
        fn as_submit_handler(&mut self) -> Option<&mut dyn SubmitHandler> {
            Some(self)
        }
    }

    #[test]
    fn trigger_discriminants_match_table_order() {
        for (i, trigger) in EventTriggerType::ALL.iter().enumerate() {
            assert_eq!(*trigger as usize, i, "{trigger:?} out of place");
        }
        assert_eq!(EventTriggerType::try_from(11), Ok(EventTriggerType::Move));
        assert_eq!(EventTriggerType::try_from(17), Err(17));
    }

    #[test]
    fn markers_carry_their_trigger() {
        assert_eq!(PointerEnter::TRIGGER, EventTriggerType::PointerEnter);
        assert_eq!(InitializePotentialDrag::TRIGGER as u8, 12);
        assert_eq!(Cancel::TRIGGER as u8, 16);
        assert_eq!(Submit::NAME, "Submit");
    }

    #[test]
    fn invoke_reaches_only_implemented_capabilities() {
        let mut c = Submitter::default();
        let component: &mut dyn Component = &mut c;
        assert!(Submit::handles(component));
        assert!(!Cancel::handles(component));

        let mut data = BaseEventData::new();
        assert!(Submit::invoke(component, &mut data));
        assert!(!Cancel::invoke(component, &mut data));
        assert!(data.is_used());
        assert_eq!(c.submitted, 1);
    }

    #[test]
    fn base_capabilities_accept_any_payload() {
        let mut pointer = PointerEventData::default();
        let base = Submit::validate(&mut pointer).unwrap();
        base.use_event();
        assert!(pointer.base.is_used());

        let mut axis = AxisEventData::default();
        assert!(Cancel::validate(&mut axis).is_ok());
    }

    #[test]
    fn typed_capabilities_reject_other_payloads() {
        let mut base = BaseEventData::new();
        assert!(PointerClick::validate(&mut base).is_err());
        assert!(Move::validate(&mut base).is_err());
        let mut pointer = PointerEventData::default();
        assert!(Move::validate(&mut pointer).is_err());
    }
}

// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event payloads.
//!
//! Every payload embeds a [`BaseEventData`] and implements [`EventData`], so
//! the dispatcher can hand any payload to any capability and let the
//! capability narrow it to the concrete type it expects.

use core::any::Any;
use core::fmt::Debug;

use kurbo::{Point, Vec2};

use crate::error::DispatchError;

bitflags::bitflags! {
    /// Whether an event has been consumed by a handler.
    ///
    /// The empty set means unused.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventHandle: u8 {
        /// A handler marked the event as used.
        const USED = 0b0000_0001;
    }
}

/// Data shared by every event payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BaseEventData {
    /// Consumption state.
    pub handle: EventHandle,
}

impl BaseEventData {
    /// Create unused event data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the event as used.
    pub fn use_event(&mut self) {
        self.handle.insert(EventHandle::USED);
    }

    /// Whether a handler has used the event.
    pub fn is_used(&self) -> bool {
        self.handle.contains(EventHandle::USED)
    }

    /// Clear the used flag so the payload can be sent again.
    pub fn reset(&mut self) {
        self.handle = EventHandle::empty();
    }
}

/// Mouse button (or equivalent) that produced a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputButton {
    /// Primary button.
    #[default]
    Left,
    /// Secondary button.
    Right,
    /// Middle button.
    Middle,
}

/// Pointer (mouse, touch, pen) event payload.
///
/// Positions are in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEventData {
    /// Shared event data.
    pub base: BaseEventData,
    /// Identifier of the pointer (touch id, or a negative id for mouse buttons).
    pub pointer_id: i32,
    /// Button that triggered this event.
    pub button: InputButton,
    /// Current pointer position.
    pub position: Point,
    /// Movement since the last update.
    pub delta: Vec2,
    /// Position at the last press.
    pub press_position: Point,
    /// Wheel or trackpad scroll amount.
    pub scroll_delta: Vec2,
    /// Number of consecutive clicks.
    pub click_count: u32,
    /// Timestamp of the last click, in seconds.
    pub click_time: f64,
    /// A drag is in progress.
    pub dragging: bool,
    /// A release now would count as a click.
    pub eligible_for_click: bool,
    /// Drag should only begin after the pointer moves past a threshold.
    pub use_drag_threshold: bool,
}

impl Default for PointerEventData {
    fn default() -> Self {
        Self {
            base: BaseEventData::default(),
            pointer_id: -1,
            button: InputButton::Left,
            position: Point::ZERO,
            delta: Vec2::ZERO,
            press_position: Point::ZERO,
            scroll_delta: Vec2::ZERO,
            click_count: 0,
            click_time: 0.0,
            dragging: false,
            eligible_for_click: false,
            use_drag_threshold: true,
        }
    }
}

impl PointerEventData {
    /// Pointer payload at `position` with everything else at defaults.
    pub fn at(position: Point) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Whether the pointer has moved since the last update.
    pub fn is_pointer_moving(&self) -> bool {
        self.delta.hypot2() > 0.0
    }

    /// Whether the event carries a scroll amount.
    pub fn is_scrolling(&self) -> bool {
        self.scroll_delta.hypot2() > 0.0
    }
}

/// Cardinal direction of a navigation move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    /// Towards negative x.
    Left,
    /// Towards negative y.
    Up,
    /// Towards positive x.
    Right,
    /// Towards positive y.
    Down,
    /// No movement.
    #[default]
    None,
}

/// Navigation (keyboard, gamepad axis) event payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxisEventData {
    /// Shared event data.
    pub base: BaseEventData,
    /// Raw axis input.
    pub move_vector: Vec2,
    /// Direction derived from the axis input.
    pub move_dir: MoveDirection,
}

impl AxisEventData {
    /// Build a payload from raw axis input, classifying its direction.
    ///
    /// Input shorter than `dead_zone` is [`MoveDirection::None`]. Otherwise the
    /// dominant axis wins; ties go to the vertical axis. Coordinates follow
    /// Kurbo's y-down convention, so positive y is [`MoveDirection::Down`].
    pub fn from_move_vector(move_vector: Vec2, dead_zone: f64) -> Self {
        let move_dir = if move_vector.hypot2() < dead_zone * dead_zone {
            MoveDirection::None
        } else if move_vector.x.abs() > move_vector.y.abs() {
            if move_vector.x > 0.0 {
                MoveDirection::Right
            } else {
                MoveDirection::Left
            }
        } else if move_vector.y > 0.0 {
            MoveDirection::Down
        } else {
            MoveDirection::Up
        };
        Self {
            base: BaseEventData::default(),
            move_vector,
            move_dir,
        }
    }
}

/// Common view over every event payload.
pub trait EventData: Any + Debug {
    /// Shared event data.
    fn base(&self) -> &BaseEventData;

    /// Shared event data, mutably.
    fn base_mut(&mut self) -> &mut BaseEventData;

    /// Upcast for downcasting to the concrete payload.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete payload type, for diagnostics.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl EventData for BaseEventData {
    fn base(&self) -> &BaseEventData {
        self
    }

    fn base_mut(&mut self) -> &mut BaseEventData {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EventData for PointerEventData {
    fn base(&self) -> &BaseEventData {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEventData {
        &mut self.base
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EventData for AxisEventData {
    fn base(&self) -> &BaseEventData {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEventData {
        &mut self.base
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Narrow a payload to the concrete type `T`.
///
/// Returns [`DispatchError::InvalidEventData`] naming both types on mismatch.
pub fn validate_event_data<T: EventData>(
    data: &mut dyn EventData,
) -> Result<&mut T, DispatchError> {
    let actual = data.type_name();
    data.as_any_mut()
        .downcast_mut::<T>()
        .ok_or(DispatchError::InvalidEventData {
            expected: core::any::type_name::<T>(),
            actual,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_and_reset() {
        let mut data = PointerEventData::default();
        assert!(!data.base.is_used());
        data.base_mut().use_event();
        assert!(data.base().is_used());
        data.base.reset();
        assert_eq!(data.base.handle, EventHandle::empty());
    }

    #[test]
    fn validate_accepts_matching_payload() {
        let mut data = PointerEventData::at(Point::new(3.0, 4.0));
        let narrowed = validate_event_data::<PointerEventData>(&mut data).unwrap();
        narrowed.click_count = 2;
        assert_eq!(data.click_count, 2);
    }

    #[test]
    fn validate_reports_both_type_names() {
        let mut data = AxisEventData::default();
        let err = validate_event_data::<PointerEventData>(&mut data).unwrap_err();
        let DispatchError::InvalidEventData { expected, actual } = err;
        assert!(expected.ends_with("PointerEventData"), "{expected}");
        assert!(actual.ends_with("AxisEventData"), "{actual}");
    }

    #[test]
    fn move_direction_classification() {
        let dir = |x, y| AxisEventData::from_move_vector(Vec2::new(x, y), 0.5).move_dir;
        assert_eq!(dir(0.1, 0.2), MoveDirection::None);
        assert_eq!(dir(1.0, 0.2), MoveDirection::Right);
        assert_eq!(dir(-1.0, 0.2), MoveDirection::Left);
        assert_eq!(dir(0.2, 1.0), MoveDirection::Down);
        assert_eq!(dir(0.2, -1.0), MoveDirection::Up);
        assert_eq!(dir(1.0, -1.0), MoveDirection::Up);
    }

    #[test]
    fn pointer_motion_queries() {
        let mut data = PointerEventData::default();
        assert!(!data.is_pointer_moving());
        assert!(!data.is_scrolling());
        data.delta = Vec2::new(0.0, 1.0);
        data.scroll_delta = Vec2::new(0.0, -3.0);
        assert!(data.is_pointer_moving());
        assert!(data.is_scrolling());
    }
}

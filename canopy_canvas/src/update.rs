// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rebuild phases.

/// One step of a frame's rebuild.
///
/// Layout phases run against the layout set; render phases run against the
/// graphic set. Discriminants give the execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CanvasUpdate {
    /// Before layout.
    PreLayout = 0,
    /// Layout.
    Layout = 1,
    /// After layout.
    PostLayout = 2,
    /// Before rendering, after layout and clipping have settled.
    PreRender = 3,
    /// Final pass before rendering.
    LatePreRender = 4,
}

/// One past the last phase discriminant.
pub const MAX_UPDATE_VALUE: u8 = 5;

impl CanvasUpdate {
    /// Phases applied to the layout set, in order.
    pub const LAYOUT_PHASES: [Self; 3] = [Self::PreLayout, Self::Layout, Self::PostLayout];

    /// Phases applied to the graphic set, in order.
    pub const RENDER_PHASES: [Self; 2] = [Self::PreRender, Self::LatePreRender];

    /// Whether this phase belongs to the layout drain.
    pub const fn is_layout(self) -> bool {
        (self as u8) <= Self::PostLayout as u8
    }

    /// Whether this phase belongs to the graphic drain.
    pub const fn is_render(self) -> bool {
        !self.is_layout()
    }
}

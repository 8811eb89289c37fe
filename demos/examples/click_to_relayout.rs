// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer click → event dispatch → canvas rebuild.
//!
//! This example shows how to combine:
//! - `canopy_events::raycast` to turn a pointer position into a hit node,
//! - `canopy_events` to bubble a click from the hit node to a button,
//! - `canopy_canvas` to relayout and redraw the label the button changes.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p canopy_demos --example click_to_relayout`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use canopy_canvas::{CanvasElement, CanvasUpdate, CanvasUpdateRegistry, RebuildError};
use canopy_events::raycast::{
    EventCamera, Physics2dRaycaster, Ray, RayHit, RayIntersector, RaycastResult, Raycaster, Vec3,
};
use canopy_events::{
    Component, EventDispatcher, PointerClick, PointerClickHandler, PointerEventData, SceneGraph,
};
use canopy_tree::NodeId;
use kurbo::{Point, Rect};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Width of one character in the toy text layout.
const GLYPH_WIDTH: f64 = 7.0;

/// A text label: measured during layout, "drawn" during pre-render.
#[derive(Debug)]
struct Label {
    node: NodeId,
    text: RefCell<String>,
    width: Cell<f64>,
}

impl Label {
    fn set_text(self: &Rc<Self>, text: &str, registry: &CanvasUpdateRegistry) {
        *self.text.borrow_mut() = text.to_owned();
        let element: Rc<dyn CanvasElement<NodeId>> = self.clone();
        registry.register_for_layout(&element);
        registry.register_for_graphic(&element);
    }
}

impl CanvasElement<NodeId> for Label {
    fn rebuild(
        &self,
        update: CanvasUpdate,
        _registry: &CanvasUpdateRegistry,
    ) -> Result<(), RebuildError> {
        match update {
            CanvasUpdate::Layout => {
                let chars = self.text.borrow().chars().count();
                self.width.set(GLYPH_WIDTH * chars as f64);
            }
            CanvasUpdate::PreRender => {
                info!(text = %self.text.borrow(), width = self.width.get(), "draw label");
            }
            _ => {}
        }
        Ok(())
    }

    fn node(&self) -> Option<NodeId> {
        Some(self.node)
    }

    fn layout_complete(&self) {
        info!(node = ?self.node, "label layout settled");
    }
}

/// A button that bumps a counter shown in a label.
#[derive(Debug)]
struct CounterButton {
    clicks: u32,
    label: Rc<Label>,
    registry: Rc<CanvasUpdateRegistry>,
}

impl PointerClickHandler for CounterButton {
    fn on_pointer_click(&mut self, event: &mut PointerEventData) {
        self.clicks += 1;
        info!(clicks = self.clicks, at = ?event.position, "button clicked");
        self.label
            .set_text(&format!("clicked {} times", self.clicks), &self.registry);
        event.base.use_event();
    }
}

impl Component for CounterButton {
    fn as_pointer_click_handler(&mut self) -> Option<&mut dyn PointerClickHandler> {
        Some(self)
    }
}

/// Orthographic camera looking down +z at a 320×240 viewport.
struct ScreenCamera;

impl EventCamera for ScreenCamera {
    fn target_display(&self) -> u32 {
        0
    }

    fn pixel_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 320.0, 240.0)
    }

    fn screen_point_to_ray(&self, position: Point) -> Ray {
        Ray {
            origin: Vec3::new(position.x, position.y, 0.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    fn near_clip_plane(&self) -> f64 {
        0.0
    }

    fn far_clip_plane(&self) -> f64 {
        100.0
    }

    fn position(&self) -> Vec3 {
        Vec3::ZERO
    }
}

/// Flat 2D hit testing against per-node rectangles, front to back.
struct Rects(Vec<(NodeId, Rect, i32)>);

impl RayIntersector<NodeId> for Rects {
    fn intersect(
        &mut self,
        ray: &Ray,
        _max_distance: f64,
        _layer_mask: u32,
        out: &mut Vec<RayHit<NodeId>>,
    ) {
        let pt = Point::new(ray.origin.x, ray.origin.y);
        let mut hits: Vec<_> = self.0.iter().filter(|(_, r, _)| r.contains(pt)).collect();
        hits.sort_by_key(|(_, _, order)| -order);
        out.extend(hits.into_iter().map(|&(node, _, order)| RayHit {
            node,
            distance: 0.0,
            point: Vec3::new(pt.x, pt.y, 0.0),
            normal: Vec3::new(0.0, 0.0, -1.0),
            sorting_layer: 0,
            sorting_order: order,
        }));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let registry = Rc::new(CanvasUpdateRegistry::new());

    // canvas
    // ├── button
    // │   └── icon
    // └── label
    let mut scene = SceneGraph::new();
    let canvas = scene.insert(None);
    let button = scene.insert(Some(canvas));
    let icon = scene.insert(Some(button));
    let label_node = scene.insert(Some(canvas));

    let label = Rc::new(Label {
        node: label_node,
        text: RefCell::new(String::new()),
        width: Cell::new(0.0),
    });
    label.set_text("never clicked", &registry);
    scene.add_component(button, CounterButton {
        clicks: 0,
        label: label.clone(),
        registry: registry.clone(),
    });

    // First frame lays out the initial text.
    let summary = registry.perform_update(scene.tree(), &mut || info!("cull"));
    info!(?summary, "frame 1");

    let mut raycaster = Physics2dRaycaster::new(
        ScreenCamera,
        Rects(vec![
            (button, Rect::new(10.0, 10.0, 110.0, 40.0), 1),
            (icon, Rect::new(14.0, 14.0, 34.0, 34.0), 2),
        ]),
    );
    let mut dispatcher = EventDispatcher::new();
    let mut hits: Vec<RaycastResult<NodeId>> = Vec::new();

    // Click on the icon: no handler there, so the click bubbles to the button.
    let mut click = PointerEventData::at(Point::new(20.0, 20.0));
    raycaster.raycast(&click, &mut hits);
    if let Some(top) = hits.first() {
        info!(node = ?top.node, order = top.sorting_order, "top hit");
        match dispatcher.execute_hierarchy::<PointerClick>(&mut scene, top.node, &mut click) {
            Ok(handled_by) => info!(?handled_by, used = click.base.is_used(), "click dispatched"),
            Err(err) => tracing::error!(%err, "click dispatch failed"),
        }
    }

    // Second frame picks up the new text.
    let summary = registry.perform_update(scene.tree(), &mut || info!("cull"));
    info!(?summary, width = label.width.get(), "frame 2");

    // Nothing is dirty any more.
    let summary = registry.perform_update(scene.tree(), &mut || {});
    info!(?summary, "frame 3");
}

// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raycasting: turn a pointer position into an ordered list of hit nodes.
//!
//! The geometry query itself belongs to an external collaborator
//! ([`RayIntersector`]); the camera is another ([`EventCamera`]). What lives
//! here is the plumbing around them:
//!
//! - [`RaycasterRegistry`]: the set of active raycasters, add-if-absent.
//! - [`PhysicsRaycaster`]: 3D hits, sorted nearest first.
//! - [`Physics2dRaycaster`]: 2D hits carrying sorting layer and order, left in
//!   intersector order.
//!
//! Both raycasters discard pointers on another display or outside the
//! camera's pixel rectangle, limit the ray to the span between the clip
//! planes, and honor an optional cap on the number of intersections.

use alloc::vec::Vec;
use core::hash::Hash;

use canopy_collections::IndexedSet;
use kurbo::{Point, Rect, Vec2};

use crate::event_data::PointerEventData;

/// A point or direction in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        let planar = Vec2::new(other.x - self.x, other.y - self.y).hypot();
        Vec2::new(planar, other.z - self.z).hypot()
    }
}

/// A world-space ray.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Direction; not required to be normalized.
    pub direction: Vec3,
}

/// One intersection reported by a [`RayIntersector`].
#[derive(Clone, Debug, PartialEq)]
pub struct RayHit<K> {
    /// Node that was hit.
    pub node: K,
    /// Distance along the ray.
    pub distance: f64,
    /// Hit point.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
    /// Sorting layer of the node's 2D renderer, if it has one.
    pub sorting_layer: i32,
    /// Order within the sorting layer, if the node has a 2D renderer.
    pub sorting_order: i32,
}

/// A hit as seen by the event system.
#[derive(Clone, Debug, PartialEq)]
pub struct RaycastResult<K> {
    /// Node that was hit.
    pub node: K,
    /// Distance from the camera.
    pub distance: f64,
    /// Position of this result in the accumulator it was appended to.
    pub index: usize,
    /// Sorting layer (2D only; `0` for 3D hits).
    pub sorting_layer: i32,
    /// Sorting order (2D only; `0` for 3D hits).
    pub sorting_order: i32,
    /// Hit point in world space.
    pub world_position: Vec3,
    /// Surface normal in world space.
    pub world_normal: Vec3,
    /// Pointer position that produced the hit.
    pub screen_position: Point,
}

/// The camera a raycaster casts from.
pub trait EventCamera {
    /// Display this camera renders to.
    fn target_display(&self) -> u32;

    /// Viewport in screen pixels.
    fn pixel_rect(&self) -> Rect;

    /// Ray from the camera through a screen position.
    fn screen_point_to_ray(&self, position: Point) -> Ray;

    /// Distance to the near clip plane.
    fn near_clip_plane(&self) -> f64;

    /// Distance to the far clip plane.
    fn far_clip_plane(&self) -> f64;

    /// Camera position in world space.
    fn position(&self) -> Vec3;

    /// Layers the camera renders.
    fn culling_mask(&self) -> u32 {
        u32::MAX
    }

    /// Map a raw pointer position to a display-relative position and the
    /// display it falls on.
    ///
    /// `None` means the platform has no multi-display support, and the raw
    /// position is used as is.
    fn relative_display_position(&self, _position: Point) -> Option<(Point, u32)> {
        None
    }
}

/// Geometry query collaborator: intersect a ray with the scene.
pub trait RayIntersector<K> {
    /// Append every hit within `max_distance` on a layer in `layer_mask` to
    /// `out`. Order is unspecified.
    fn intersect(&mut self, ray: &Ray, max_distance: f64, layer_mask: u32, out: &mut Vec<RayHit<K>>);
}

/// Something that turns a pointer event into hits.
pub trait Raycaster<K> {
    /// Append hits for `event` to `out`.
    fn raycast(&mut self, event: &PointerEventData, out: &mut Vec<RaycastResult<K>>);
}

/// The set of active raycasters.
///
/// Holds handles (ids, shared pointers, ...) rather than the raycasters
/// themselves; adding a handle twice has no effect.
#[derive(Clone, Debug)]
pub struct RaycasterRegistry<R> {
    raycasters: IndexedSet<R>,
}

impl<R: Hash + Eq + Clone> Default for RaycasterRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Hash + Eq + Clone> RaycasterRegistry<R> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            raycasters: IndexedSet::new(),
        }
    }

    /// Add `raycaster` if absent. Returns whether it was added.
    pub fn add(&mut self, raycaster: R) -> bool {
        self.raycasters.add_unique(raycaster)
    }

    /// Remove `raycaster` if present. Returns whether it was removed.
    pub fn remove(&mut self, raycaster: &R) -> bool {
        self.raycasters.remove(raycaster)
    }

    /// Whether `raycaster` is registered.
    pub fn contains(&self, raycaster: &R) -> bool {
        self.raycasters.contains(raycaster)
    }

    /// Registered raycasters in registration order.
    pub fn list(&self) -> &[R] {
        self.raycasters.as_slice()
    }

    /// Number of registered raycasters.
    pub fn len(&self) -> usize {
        self.raycasters.len()
    }

    /// Whether no raycaster is registered.
    pub fn is_empty(&self) -> bool {
        self.raycasters.is_empty()
    }
}

/// Casting parameters shared by both raycasters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaycasterConfig {
    /// Layers this raycaster reports; combined with the camera's culling mask.
    pub event_mask: u32,
    /// Keep at most this many intersections per cast; `0` keeps all.
    pub max_ray_intersections: usize,
}

impl Default for RaycasterConfig {
    fn default() -> Self {
        Self {
            event_mask: u32::MAX,
            max_ray_intersections: 0,
        }
    }
}

/// Ray through the pointer, and the distance between the clip planes along it.
///
/// `None` when the pointer is on another display or outside the viewport.
fn compute_ray_and_distance(
    camera: &impl EventCamera,
    event: &PointerEventData,
) -> Option<(Ray, f64)> {
    let mut position = event.position;
    if let Some((relative, display)) = camera.relative_display_position(event.position) {
        if display != camera.target_display() {
            return None;
        }
        position = relative;
    }
    if !camera.pixel_rect().contains(position) {
        return None;
    }
    let ray = camera.screen_point_to_ray(position);
    let projection = ray.direction.z;
    let distance = if projection.abs() < f64::EPSILON {
        f64::INFINITY
    } else {
        ((camera.far_clip_plane() - camera.near_clip_plane()) / projection).abs()
    };
    Some((ray, distance))
}

/// Run the intersector and apply the intersection cap.
fn collect_hits<K>(
    camera: &impl EventCamera,
    intersector: &mut impl RayIntersector<K>,
    config: &RaycasterConfig,
    event: &PointerEventData,
    hits: &mut Vec<RayHit<K>>,
) -> bool {
    hits.clear();
    let Some((ray, distance)) = compute_ray_and_distance(camera, event) else {
        return false;
    };
    let mask = camera.culling_mask() & config.event_mask;
    intersector.intersect(&ray, distance, mask, hits);
    if config.max_ray_intersections != 0 {
        hits.truncate(config.max_ray_intersections);
    }
    true
}

/// Raycaster for 3D geometry. Results are sorted nearest first.
#[derive(Debug)]
pub struct PhysicsRaycaster<C, I, K> {
    camera: C,
    intersector: I,
    /// Casting parameters.
    pub config: RaycasterConfig,
    hits: Vec<RayHit<K>>,
}

impl<C: EventCamera, I: RayIntersector<K>, K: Clone> PhysicsRaycaster<C, I, K> {
    /// Create a raycaster with default configuration.
    pub fn new(camera: C, intersector: I) -> Self {
        Self::with_config(camera, intersector, RaycasterConfig::default())
    }

    /// Create a raycaster with explicit configuration.
    pub fn with_config(camera: C, intersector: I, config: RaycasterConfig) -> Self {
        Self {
            camera,
            intersector,
            config,
            hits: Vec::new(),
        }
    }

    /// The camera rays are cast from.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Mask actually passed to the intersector.
    pub fn final_event_mask(&self) -> u32 {
        self.camera.culling_mask() & self.config.event_mask
    }
}

impl<C: EventCamera, I: RayIntersector<K>, K: Clone> Raycaster<K> for PhysicsRaycaster<C, I, K> {
    fn raycast(&mut self, event: &PointerEventData, out: &mut Vec<RaycastResult<K>>) {
        if !collect_hits(
            &self.camera,
            &mut self.intersector,
            &self.config,
            event,
            &mut self.hits,
        ) {
            return;
        }
        self.hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        for hit in &self.hits {
            out.push(RaycastResult {
                node: hit.node.clone(),
                distance: hit.distance,
                index: out.len(),
                sorting_layer: 0,
                sorting_order: 0,
                world_position: hit.point,
                world_normal: hit.normal,
                screen_position: event.position,
            });
        }
    }
}

/// Raycaster for 2D geometry.
///
/// Hits keep intersector order; distance is measured from the camera to the
/// hit point, and sorting layer and order are passed through.
#[derive(Debug)]
pub struct Physics2dRaycaster<C, I, K> {
    camera: C,
    intersector: I,
    /// Casting parameters.
    pub config: RaycasterConfig,
    hits: Vec<RayHit<K>>,
}

impl<C: EventCamera, I: RayIntersector<K>, K: Clone> Physics2dRaycaster<C, I, K> {
    /// Create a raycaster with default configuration.
    pub fn new(camera: C, intersector: I) -> Self {
        Self::with_config(camera, intersector, RaycasterConfig::default())
    }

    /// Create a raycaster with explicit configuration.
    pub fn with_config(camera: C, intersector: I, config: RaycasterConfig) -> Self {
        Self {
            camera,
            intersector,
            config,
            hits: Vec::new(),
        }
    }

    /// The camera rays are cast from.
    pub fn camera(&self) -> &C {
        &self.camera
    }
}

impl<C: EventCamera, I: RayIntersector<K>, K: Clone> Raycaster<K> for Physics2dRaycaster<C, I, K> {
    fn raycast(&mut self, event: &PointerEventData, out: &mut Vec<RaycastResult<K>>) {
        if !collect_hits(
            &self.camera,
            &mut self.intersector,
            &self.config,
            event,
            &mut self.hits,
        ) {
            return;
        }
        let eye = self.camera.position();
        for hit in &self.hits {
            out.push(RaycastResult {
                node: hit.node.clone(),
                distance: eye.distance(hit.point),
                index: out.len(),
                sorting_layer: hit.sorting_layer,
                sorting_order: hit.sorting_order,
                world_position: hit.point,
                world_normal: hit.normal,
                screen_position: event.position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[derive(Clone, Debug)]
    struct Camera {
        display: u32,
        rect: Rect,
        direction: Vec3,
        relative: Option<(Point, u32)>,
        culling: u32,
    }

    impl Default for Camera {
        fn default() -> Self {
            Self {
                display: 0,
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                direction: Vec3::new(0.0, 0.0, 1.0),
                relative: None,
                culling: u32::MAX,
            }
        }
    }

    impl EventCamera for Camera {
        fn target_display(&self) -> u32 {
            self.display
        }

        fn pixel_rect(&self) -> Rect {
            self.rect
        }

        fn screen_point_to_ray(&self, position: Point) -> Ray {
            Ray {
                origin: Vec3::new(position.x, position.y, 0.0),
                direction: self.direction,
            }
        }

        fn near_clip_plane(&self) -> f64 {
            1.0
        }

        fn far_clip_plane(&self) -> f64 {
            11.0
        }

        fn position(&self) -> Vec3 {
            Vec3::ZERO
        }

        fn culling_mask(&self) -> u32 {
            self.culling
        }

        fn relative_display_position(&self, _position: Point) -> Option<(Point, u32)> {
            self.relative
        }
    }

    /// Returns canned hits and records the query it was given.
    #[derive(Debug, Default)]
    struct Canned {
        hits: Vec<RayHit<u32>>,
        last_query: Option<(f64, u32)>,
    }

    impl RayIntersector<u32> for Canned {
        fn intersect(
            &mut self,
            _ray: &Ray,
            max_distance: f64,
            layer_mask: u32,
            out: &mut Vec<RayHit<u32>>,
        ) {
            self.last_query = Some((max_distance, layer_mask));
            out.extend(self.hits.iter().cloned());
        }
    }

    fn hit(node: u32, distance: f64, point: Vec3) -> RayHit<u32> {
        RayHit {
            node,
            distance,
            point,
            normal: Vec3::new(0.0, 0.0, -1.0),
            sorting_layer: node as i32,
            sorting_order: -(node as i32),
        }
    }

    fn canned(hits: Vec<RayHit<u32>>) -> Canned {
        Canned {
            hits,
            last_query: None,
        }
    }

    #[test]
    fn registry_is_add_if_absent() {
        let mut registry = RaycasterRegistry::new();
        assert!(registry.add("ui"));
        assert!(registry.add("world"));
        assert!(!registry.add("ui"));
        assert_eq!(registry.list(), &["ui", "world"]);
        assert!(registry.remove(&"ui"));
        assert!(!registry.remove(&"ui"));
        assert_eq!(registry.list(), &["world"]);
        assert!(registry.contains(&"world"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn physics_results_are_sorted_by_distance() {
        let intersector = canned(vec![
            hit(1, 5.0, Vec3::ZERO),
            hit(2, 1.0, Vec3::ZERO),
            hit(3, 3.0, Vec3::ZERO),
        ]);
        let mut raycaster = PhysicsRaycaster::new(Camera::default(), intersector);
        let mut out = vec![];
        raycaster.raycast(&PointerEventData::at(Point::new(10.0, 10.0)), &mut out);
        let nodes: Vec<u32> = out.iter().map(|r| r.node).collect();
        assert_eq!(nodes, vec![2, 3, 1]);
        assert_eq!(out[2].index, 2);
        assert_eq!(out[0].sorting_layer, 0);
        assert_eq!(out[0].screen_position, Point::new(10.0, 10.0));
    }

    #[test]
    fn index_continues_from_existing_results() {
        let mut raycaster =
            PhysicsRaycaster::new(Camera::default(), canned(vec![hit(7, 2.0, Vec3::ZERO)]));
        let mut out = vec![];
        let event = PointerEventData::at(Point::new(1.0, 1.0));
        raycaster.raycast(&event, &mut out);
        raycaster.raycast(&event, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].index, 1);
    }

    #[test]
    fn clip_distance_and_mask_reach_the_intersector() {
        let camera = Camera {
            direction: Vec3::new(0.0, 0.0, -2.0),
            culling: 0b0110,
            ..Camera::default()
        };
        let config = RaycasterConfig {
            event_mask: 0b0011,
            ..RaycasterConfig::default()
        };
        let mut raycaster = PhysicsRaycaster::with_config(camera, canned(vec![]), config);
        assert_eq!(raycaster.final_event_mask(), 0b0010);
        raycaster.raycast(&PointerEventData::at(Point::new(5.0, 5.0)), &mut vec![]);
        assert_eq!(raycaster.intersector.last_query, Some((5.0, 0b0010)));
    }

    #[test]
    fn flat_projection_casts_to_infinity() {
        let camera = Camera {
            direction: Vec3::new(1.0, 0.0, 0.0),
            ..Camera::default()
        };
        let mut raycaster = PhysicsRaycaster::new(camera, canned(vec![]));
        raycaster.raycast(&PointerEventData::at(Point::new(5.0, 5.0)), &mut vec![]);
        let (distance, _) = raycaster.intersector.last_query.unwrap();
        assert!(distance.is_infinite());
    }

    #[test]
    fn pointer_outside_viewport_or_display_is_ignored() {
        let mut raycaster =
            PhysicsRaycaster::new(Camera::default(), canned(vec![hit(1, 1.0, Vec3::ZERO)]));
        let mut out = vec![];
        raycaster.raycast(&PointerEventData::at(Point::new(150.0, 5.0)), &mut out);
        assert!(out.is_empty());
        assert!(raycaster.intersector.last_query.is_none());

        let camera = Camera {
            relative: Some((Point::new(5.0, 5.0), 1)),
            ..Camera::default()
        };
        let mut raycaster = PhysicsRaycaster::new(camera, canned(vec![hit(1, 1.0, Vec3::ZERO)]));
        raycaster.raycast(&PointerEventData::at(Point::new(5.0, 5.0)), &mut out);
        assert!(out.is_empty());

        // Same display: the display-relative position is what gets tested.
        let camera = Camera {
            relative: Some((Point::new(5.0, 5.0), 0)),
            ..Camera::default()
        };
        let mut raycaster = PhysicsRaycaster::new(camera, canned(vec![hit(1, 1.0, Vec3::ZERO)]));
        raycaster.raycast(&PointerEventData::at(Point::new(500.0, 5.0)), &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn max_intersections_caps_results() {
        let config = RaycasterConfig {
            max_ray_intersections: 2,
            ..RaycasterConfig::default()
        };
        let intersector = canned(vec![
            hit(1, 3.0, Vec3::ZERO),
            hit(2, 2.0, Vec3::ZERO),
            hit(3, 1.0, Vec3::ZERO),
        ]);
        let mut raycaster = PhysicsRaycaster::with_config(Camera::default(), intersector, config);
        let mut out = vec![];
        raycaster.raycast(&PointerEventData::at(Point::new(1.0, 1.0)), &mut out);
        let nodes: Vec<u32> = out.iter().map(|r| r.node).collect();
        assert_eq!(nodes, vec![2, 1]);
    }

    #[test]
    fn physics_2d_keeps_order_and_sorting_metadata() {
        let intersector = canned(vec![
            hit(1, 0.0, Vec3::new(3.0, 4.0, 0.0)),
            hit(2, 0.0, Vec3::new(0.0, 0.0, 2.0)),
        ]);
        let mut raycaster = Physics2dRaycaster::new(Camera::default(), intersector);
        let mut out = vec![];
        raycaster.raycast(&PointerEventData::at(Point::new(1.0, 1.0)), &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].node, 1);
        assert!((out[0].distance - 5.0).abs() < 1e-9);
        assert!((out[1].distance - 2.0).abs() < 1e-9);
        assert_eq!((out[0].sorting_layer, out[0].sorting_order), (1, -1));
        assert_eq!(out[1].index, 1);
    }
}

// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas update registry: two dirty sets and the per-frame drain.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt::Debug;
use core::hash::{Hash, Hasher};

use canopy_collections::IndexedSet;
use canopy_tree::{NodeId, ParentLookup};

use crate::element::CanvasElement;
use crate::update::CanvasUpdate;

/// Registry configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Reject (and log) layout registrations made while the layout drain is
    /// running.
    ///
    /// Off by default: an element registered for layout during the drain is
    /// appended to the running set and rebuilt in the phases that remain.
    pub reject_layout_registration_during_rebuild: bool,
    /// Room reserved in each dirty set up front.
    pub initial_capacity: usize,
}

/// Collaborator that recomputes clipping and culling once layout has settled.
///
/// Any `FnMut()` closure is a clipper.
pub trait Clipper {
    /// Recompute clip rectangles and cull.
    fn cull(&mut self);
}

impl<F: FnMut()> Clipper for F {
    fn cull(&mut self) {
        self();
    }
}

/// A [`Clipper`] that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoClip;

impl Clipper for NoClip {
    fn cull(&mut self) {}
}

/// What one [`CanvasUpdateRegistry::perform_update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Handles whose element had already been dropped.
    pub dropped: usize,
    /// Elements removed because [`CanvasElement::is_valid`] was false.
    pub invalid: usize,
    /// Elements that received `layout_complete` at the end of the layout drain.
    pub layout_elements: usize,
    /// Elements that received `graphic_update_complete` at the end of the
    /// graphic drain.
    pub graphic_elements: usize,
    /// Calls to [`CanvasElement::rebuild`].
    pub rebuilds: usize,
    /// Element callbacks that returned an error or panicked: rebuilds,
    /// validity checks, and node lookups for the depth sort.
    pub failures: usize,
}

/// Weak handle keyed by allocation address.
struct ElementRef<K>(Weak<dyn CanvasElement<K>>);

impl<K> ElementRef<K> {
    fn new(element: &Rc<dyn CanvasElement<K>>) -> Self {
        Self(Rc::downgrade(element))
    }

    fn upgrade(&self) -> Option<Rc<dyn CanvasElement<K>>> {
        self.0.upgrade()
    }
}

impl<K> Clone for ElementRef<K> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K> PartialEq for ElementRef<K> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(self.0.as_ptr(), other.0.as_ptr())
    }
}

impl<K> Eq for ElementRef<K> {}

impl<K> Hash for ElementRef<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_ptr().cast::<()>().hash(state);
    }
}

impl<K> Debug for ElementRef<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.upgrade() {
            Some(element) => Debug::fmt(&element, f),
            None => f.write_str("<dropped>"),
        }
    }
}

type DirtySet<K> = RefCell<IndexedSet<ElementRef<K>>>;

/// Keeps a drain flag raised; lowers it on drop, unwinding included.
struct DrainGuard<'a>(&'a Cell<bool>);

impl<'a> DrainGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Tracks which canvas elements need rebuilding and rebuilds them once per
/// frame.
///
/// ## Usage
///
/// - Construct one registry at frame-loop setup and pass it by reference to
///   whatever needs to dirty elements.
/// - Elements call [`register_for_layout`](Self::register_for_layout) or
///   [`register_for_graphic`](Self::register_for_graphic) when their layout
///   or appearance goes stale. Registration is idempotent.
/// - The frame loop calls [`perform_update`](Self::perform_update) exactly
///   once per frame, right before drawing.
///
/// ## Drain order
///
/// 1. Drop dead handles, and remove invalid elements (calling their
///    completion callback).
/// 2. Sort the layout set by hierarchy depth, shallow first; ties keep
///    registration order.
/// 3. Run `PreLayout`, `Layout`, `PostLayout` over the layout set, one phase
///    at a time across all elements.
/// 4. Call `layout_complete` on every layout element, then clear the set.
/// 5. Run the [`Clipper`].
/// 6. Run `PreRender`, `LatePreRender` over the graphic set (registration
///    order), then call `graphic_update_complete` and clear it.
///
/// A rebuild that fails or panics is logged and skipped, and so is a panic
/// in `is_valid` or `node`; the drain always runs to completion.
///
/// ## Re-entrancy
///
/// The registry uses interior mutability so elements can call back into it
/// from [`CanvasElement::rebuild`]. While a set is being drained:
///
/// - graphic registration is rejected during the graphic drain,
/// - layout registration is accepted unless
///   [`RegistryConfig::reject_layout_registration_during_rebuild`] is set,
/// - unregistration from the set being drained is rejected.
///
/// Rejections are logged with [`tracing::error!`].
///
/// ## Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use canopy_canvas::{
///     CanvasElement, CanvasUpdate, CanvasUpdateRegistry, NoClip, RebuildError,
/// };
/// use canopy_tree::{NodeId, Tree};
///
/// #[derive(Debug)]
/// struct Label {
///     node: NodeId,
///     seen: RefCell<Vec<CanvasUpdate>>,
/// }
///
/// impl CanvasElement<NodeId> for Label {
///     fn rebuild(
///         &self,
///         update: CanvasUpdate,
///         _registry: &CanvasUpdateRegistry,
///     ) -> Result<(), RebuildError> {
///         self.seen.borrow_mut().push(update);
///         Ok(())
///     }
///
///     fn node(&self) -> Option<NodeId> {
///         Some(self.node)
///     }
/// }
///
/// let mut tree = Tree::new();
/// let root = tree.insert(None);
/// let label = Rc::new(Label { node: root, seen: RefCell::new(Vec::new()) });
/// let element: Rc<dyn CanvasElement<NodeId>> = label.clone();
///
/// let registry = CanvasUpdateRegistry::new();
/// assert!(registry.register_for_layout(&element));
/// assert!(!registry.register_for_layout(&element));
///
/// let summary = registry.perform_update(&tree, &mut NoClip);
/// assert_eq!(summary.layout_elements, 1);
/// assert_eq!(*label.seen.borrow(), CanvasUpdate::LAYOUT_PHASES);
/// assert!(!registry.is_pending_layout(&element));
/// ```
pub struct CanvasUpdateRegistry<K = NodeId> {
    layout_queue: DirtySet<K>,
    graphic_queue: DirtySet<K>,
    performing_layout: Cell<bool>,
    performing_graphic: Cell<bool>,
    config: RegistryConfig,
}

impl<K> Debug for CanvasUpdateRegistry<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasUpdateRegistry")
            .field("layout_queue", &self.layout_queue)
            .field("graphic_queue", &self.graphic_queue)
            .field("performing_layout", &self.performing_layout.get())
            .field("performing_graphic", &self.performing_graphic.get())
            .field("config", &self.config)
            .finish()
    }
}

impl<K: Debug + 'static> Default for CanvasUpdateRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug + 'static> CanvasUpdateRegistry<K> {
    /// Create a registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with an explicit configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            layout_queue: RefCell::new(IndexedSet::with_capacity(config.initial_capacity)),
            graphic_queue: RefCell::new(IndexedSet::with_capacity(config.initial_capacity)),
            performing_layout: Cell::new(false),
            performing_graphic: Cell::new(false),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Queue `element` for layout rebuild.
    ///
    /// Returns `false` if it was already queued, or if the layout drain is
    /// running and the configuration rejects registration during it.
    pub fn register_for_layout(&self, element: &Rc<dyn CanvasElement<K>>) -> bool {
        let handle = ElementRef::new(element);
        if self.layout_queue.borrow().contains(&handle) {
            return false;
        }
        if self.config.reject_layout_registration_during_rebuild && self.performing_layout.get() {
            tracing::error!(
                ?element,
                "trying to add element for layout rebuild while inside a layout rebuild loop"
            );
            return false;
        }
        self.layout_queue.borrow_mut().add_unique(handle)
    }

    /// Queue `element` for graphic rebuild.
    ///
    /// Returns `false` if it was already queued, or if the graphic drain is
    /// running.
    pub fn register_for_graphic(&self, element: &Rc<dyn CanvasElement<K>>) -> bool {
        if self.performing_graphic.get() {
            tracing::error!(
                ?element,
                "trying to add element for graphic rebuild while inside a graphic rebuild loop"
            );
            return false;
        }
        self.graphic_queue
            .borrow_mut()
            .add_unique(ElementRef::new(element))
    }

    /// Remove `element` from both sets, calling both completion callbacks.
    ///
    /// Each half is skipped (and logged) while its own set is being drained;
    /// the callbacks fire even if the element was not queued.
    pub fn unregister(&self, element: &Rc<dyn CanvasElement<K>>) {
        let handle = ElementRef::new(element);
        if self.performing_layout.get() {
            tracing::error!(
                ?element,
                "trying to remove element from the layout rebuild list while inside a layout rebuild loop"
            );
        } else {
            element.layout_complete();
            self.layout_queue.borrow_mut().remove(&handle);
        }
        if self.performing_graphic.get() {
            tracing::error!(
                ?element,
                "trying to remove element from the graphic rebuild list while inside a graphic rebuild loop"
            );
        } else {
            element.graphic_update_complete();
            self.graphic_queue.borrow_mut().remove(&handle);
        }
    }

    /// Whether the layout drain is running.
    pub fn is_rebuilding_layout(&self) -> bool {
        self.performing_layout.get()
    }

    /// Whether the graphic drain is running.
    pub fn is_rebuilding_graphics(&self) -> bool {
        self.performing_graphic.get()
    }

    /// Whether `element` is queued for layout rebuild.
    pub fn is_pending_layout(&self, element: &Rc<dyn CanvasElement<K>>) -> bool {
        self.layout_queue
            .borrow()
            .contains(&ElementRef::new(element))
    }

    /// Whether `element` is queued for graphic rebuild.
    pub fn is_pending_graphic(&self, element: &Rc<dyn CanvasElement<K>>) -> bool {
        self.graphic_queue
            .borrow()
            .contains(&ElementRef::new(element))
    }

    /// Number of handles in the layout set.
    pub fn pending_layout_len(&self) -> usize {
        self.layout_queue.borrow().len()
    }

    /// Number of handles in the graphic set.
    pub fn pending_graphic_len(&self) -> usize {
        self.graphic_queue.borrow().len()
    }

    /// Drain both sets. Call once per frame, right before drawing.
    ///
    /// `hierarchy` supplies depths for the layout sort; `clipper` runs between
    /// the layout and graphic drains. Calling this from inside a rebuild is
    /// rejected and logged.
    pub fn perform_update(
        &self,
        hierarchy: &impl ParentLookup<K>,
        clipper: &mut impl Clipper,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        if self.performing_layout.get() || self.performing_graphic.get() {
            tracing::error!("perform_update called from inside a rebuild loop");
            return summary;
        }
        let _span = tracing::debug_span!("canvas_update").entered();

        self.clean_invalid_items(&mut summary);

        {
            let _layout = DrainGuard::raise(&self.performing_layout);
            self.sort_layout_by_depth(hierarchy, &mut summary);
            self.drain(&self.layout_queue, &CanvasUpdate::LAYOUT_PHASES, &mut summary);
            summary.layout_elements = self.complete_all(&self.layout_queue, |element| {
                element.layout_complete();
            });
            self.layout_queue.borrow_mut().clear();
        }

        clipper.cull();

        {
            let _graphic = DrainGuard::raise(&self.performing_graphic);
            self.drain(&self.graphic_queue, &CanvasUpdate::RENDER_PHASES, &mut summary);
            summary.graphic_elements = self.complete_all(&self.graphic_queue, |element| {
                element.graphic_update_complete();
            });
            self.graphic_queue.borrow_mut().clear();
        }

        tracing::debug!(
            layout = summary.layout_elements,
            graphic = summary.graphic_elements,
            rebuilds = summary.rebuilds,
            failures = summary.failures,
            "canvas update complete"
        );
        summary
    }

    fn clean_invalid_items(&self, summary: &mut UpdateSummary) {
        let dropped = self
            .layout_queue
            .borrow_mut()
            .remove_all(|handle| handle.0.strong_count() == 0)
            + self
                .graphic_queue
                .borrow_mut()
                .remove_all(|handle| handle.0.strong_count() == 0);
        summary.dropped += dropped;
        self.remove_invalid(&self.layout_queue, summary, |element| {
            element.layout_complete();
        });
        self.remove_invalid(&self.graphic_queue, summary, |element| {
            element.graphic_update_complete();
        });
        if dropped > 0 || summary.invalid > 0 {
            tracing::trace!(dropped, invalid = summary.invalid, "cleaned rebuild sets");
        }
    }

    /// Remove elements whose `is_valid` is false, then run `complete` on each.
    ///
    /// An element whose validity check panics is removed the same way and
    /// counted as a failure.
    fn remove_invalid(
        &self,
        queue: &DirtySet<K>,
        summary: &mut UpdateSummary,
        complete: impl Fn(&dyn CanvasElement<K>),
    ) {
        let mut index = handle_count(queue);
        while index > 0 {
            index -= 1;
            let Some(handle) = handle_at(queue, index) else {
                continue;
            };
            let Some(element) = handle.upgrade() else {
                continue;
            };
            match run_isolated(|| element.is_valid()) {
                Some(true) => continue,
                Some(false) => summary.invalid += 1,
                None => {
                    tracing::error!(?element, "canvas element validity check panicked");
                    summary.failures += 1;
                }
            }
            queue.borrow_mut().remove(&handle);
            if run_isolated(|| complete(&*element)).is_none() {
                tracing::error!(?element, "canvas element completion callback panicked");
            }
        }
    }

    /// Stable sort of the layout set by hierarchy depth, shallow first.
    ///
    /// Depths are looked up once per element before sorting. A lookup that
    /// panics is counted as a failure and the element sorts as a root.
    fn sort_layout_by_depth(&self, hierarchy: &impl ParentLookup<K>, summary: &mut UpdateSummary) {
        let handles: Vec<ElementRef<K>> = self.layout_queue.borrow().iter().cloned().collect();
        let mut keyed: Vec<(usize, ElementRef<K>)> = handles
            .into_iter()
            .map(|handle| {
                let Some(element) = handle.upgrade() else {
                    return (0, handle);
                };
                let depth = run_isolated(|| {
                    element
                        .node()
                        .map_or(0, |node| hierarchy.depth_of(&node))
                });
                let depth = depth.unwrap_or_else(|| {
                    tracing::error!(?element, "canvas element depth lookup panicked");
                    summary.failures += 1;
                    0
                });
                (depth, handle)
            })
            .collect();
        keyed.sort_by_key(|(depth, _)| *depth);
        let mut queue = self.layout_queue.borrow_mut();
        queue.clear();
        queue.extend(keyed.into_iter().map(|(_, handle)| handle));
    }

    /// Run each phase over every element in `queue`.
    ///
    /// Length is re-read on every step, so elements appended mid-drain are
    /// rebuilt in the phases that remain.
    fn drain(&self, queue: &DirtySet<K>, phases: &[CanvasUpdate], summary: &mut UpdateSummary) {
        for &phase in phases {
            let mut index = 0;
            while let Some(handle) = handle_at(queue, index) {
                index += 1;
                let Some(element) = handle.upgrade() else {
                    continue;
                };
                self.rebuild_isolated(&element, phase, summary);
            }
        }
    }

    /// Check validity and rebuild one element, containing errors and panics
    /// from both calls.
    fn rebuild_isolated(
        &self,
        element: &Rc<dyn CanvasElement<K>>,
        phase: CanvasUpdate,
        summary: &mut UpdateSummary,
    ) {
        let mut rebuilt = false;
        let outcome = run_isolated(|| {
            if !element.is_valid() {
                return Ok(());
            }
            rebuilt = true;
            element.rebuild(phase, self)
        });
        if rebuilt {
            summary.rebuilds += 1;
        }
        match outcome {
            Some(Ok(())) => {}
            Some(Err(error)) => {
                summary.failures += 1;
                tracing::error!(?element, ?phase, %error, "canvas element rebuild failed");
            }
            None => {
                summary.failures += 1;
                if rebuilt {
                    tracing::error!(?element, ?phase, "canvas element rebuild panicked");
                } else {
                    tracing::error!(?element, ?phase, "canvas element validity check panicked");
                }
            }
        }
    }

    /// Run `complete` on every live element in `queue`; returns how many ran.
    fn complete_all(&self, queue: &DirtySet<K>, complete: impl Fn(&dyn CanvasElement<K>)) -> usize {
        let mut completed = 0;
        let mut index = 0;
        while let Some(handle) = handle_at(queue, index) {
            index += 1;
            let Some(element) = handle.upgrade() else {
                continue;
            };
            completed += 1;
            if run_isolated(|| complete(&*element)).is_none() {
                tracing::error!(?element, "canvas element completion callback panicked");
            }
        }
        completed
    }
}

/// Clone the handle at `index` out of the set so no borrow outlives the call.
fn handle_at<K>(queue: &DirtySet<K>, index: usize) -> Option<ElementRef<K>> {
    queue.borrow().as_slice().get(index).cloned()
}

fn handle_count<K>(queue: &DirtySet<K>) -> usize {
    queue.borrow().as_slice().len()
}

/// Run `f`, containing panics when unwinding is available.
#[cfg(feature = "std")]
fn run_isolated<R>(f: impl FnOnce() -> R) -> Option<R> {
    std::panic::catch_unwind(core::panic::AssertUnwindSafe(f)).ok()
}

#[cfg(not(feature = "std"))]
fn run_isolated<R>(f: impl FnOnce() -> R) -> Option<R> {
    Some(f())
}

//! Simulated Viewport - geometry-backed intersection host
//!
//! A scrollable viewport over a document of element rectangles. It implements
//! [`IntersectionHost`] the way a browser observer behaves:
//!
//! - an initial report is delivered as soon as an element is observed
//! - afterwards one report per observation whenever the element crosses that
//!   observation's threshold (scrolling, resizing or moving the element)
//! - reports are delivered in observation order
//!
//! The root is the viewport adjusted by each observation's root margin. An
//! observation with a `root` ancestor uses that element's rectangle clipped to
//! the viewport instead, so an ancestor scrolled out of view hides everything
//! inside it.
//!
//! # Example
//!
//! ```ignore
//! let viewport = SimulatedViewport::new(80.0, 24.0);
//! viewport.install();
//!
//! let card = viewport.add_element(Rect::new(0.0, 40.0, 80.0, 4.0));
//! let tracker = use_in_view(TrackerOptions::default());
//! tracker.attach(card);
//!
//! viewport.scroll_to(30.0); // card scrolls into view, tracker flips
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::state::visibility::{
    install_intersection_host, IntersectionCallback, IntersectionEntry, IntersectionHost,
    ObservationId,
};
use crate::types::{ElementHandle, Rect, TrackerOptions};

struct Observation {
    target: ElementHandle,
    options: TrackerOptions,
    notify: IntersectionCallback,
    /// Threshold state of the last delivered report
    last_met: Option<bool>,
}

#[derive(Default)]
struct ViewportInner {
    viewport: Cell<Rect>,
    elements: RefCell<HashMap<ElementHandle, Rect>>,
    observations: RefCell<BTreeMap<u64, Observation>>,
    next_element: Cell<u64>,
    next_observation: Cell<u64>,
}

/// Scrollable viewport over positioned elements.
#[derive(Clone, Default)]
pub struct SimulatedViewport {
    inner: Rc<ViewportInner>,
}

impl SimulatedViewport {
    /// Viewport of the given size scrolled to the top of the document.
    pub fn new(width: f32, height: f32) -> Self {
        let viewport = Self::default();
        viewport.inner.viewport.set(Rect::new(0.0, 0.0, width, height));
        viewport
    }

    /// Install as the thread's intersection host.
    pub fn install(&self) {
        install_intersection_host(Some(Rc::new(self.clone())));
    }

    pub fn viewport(&self) -> Rect {
        self.inner.viewport.get()
    }

    pub fn scroll_y(&self) -> f32 {
        self.inner.viewport.get().y
    }

    /// Place a new element in the document.
    pub fn add_element(&self, rect: Rect) -> ElementHandle {
        let id = self.inner.next_element.get();
        self.inner.next_element.set(id + 1);
        let handle = ElementHandle::new(id);
        self.inner.elements.borrow_mut().insert(handle, rect);
        handle
    }

    /// Move or resize an element.
    pub fn move_element(&self, element: ElementHandle, rect: Rect) {
        if let Some(slot) = self.inner.elements.borrow_mut().get_mut(&element) {
            *slot = rect;
        }
        self.refresh();
    }

    /// Remove an element. Its observations report it as out of view.
    pub fn remove_element(&self, element: ElementHandle) {
        self.inner.elements.borrow_mut().remove(&element);
        self.refresh();
    }

    pub fn element_rect(&self, element: ElementHandle) -> Option<Rect> {
        self.inner.elements.borrow().get(&element).copied()
    }

    /// Scroll so the viewport's top edge sits at `y` (clamped at 0).
    pub fn scroll_to(&self, y: f32) {
        let mut vp = self.inner.viewport.get();
        vp.y = y.max(0.0);
        self.inner.viewport.set(vp);
        self.refresh();
    }

    pub fn scroll_by(&self, dy: f32) {
        self.scroll_to(self.scroll_y() + dy);
    }

    pub fn resize(&self, width: f32, height: f32) {
        let mut vp = self.inner.viewport.get();
        vp.width = width.max(0.0);
        vp.height = height.max(0.0);
        self.inner.viewport.set(vp);
        self.refresh();
    }

    /// Number of live observations.
    pub fn observation_count(&self) -> usize {
        self.inner.observations.borrow().len()
    }

    /// Compute the report an observation with `options` would see for `element`.
    pub fn measure(&self, element: ElementHandle, options: &TrackerOptions) -> IntersectionEntry {
        let root = self
            .root_rect(options)
            .map(|root| options.root_margin.apply(&root));
        let rect = self.element_rect(element);

        let overlap = rect.zip(root).and_then(|(r, root)| r.intersection(&root).map(|i| (r, i)));
        let (ratio, is_intersecting) = match overlap {
            None => (0.0, false),
            Some((rect, overlap)) => {
                let area = rect.area();
                if area > 0.0 {
                    ((overlap.area() / area).clamp(0.0, 1.0), true)
                } else {
                    // Zero-area elements are either inside or not
                    (1.0, true)
                }
            }
        };

        IntersectionEntry {
            target: element,
            ratio,
            is_intersecting,
        }
    }

    /// Root rectangle before the margin: the viewport, or the ancestor's
    /// visible part. `None` when the ancestor is gone or fully off screen.
    fn root_rect(&self, options: &TrackerOptions) -> Option<Rect> {
        let viewport = self.inner.viewport.get();
        match options.root {
            None => Some(viewport),
            Some(ancestor) => self.element_rect(ancestor)?.intersection(&viewport),
        }
    }

    /// Re-measure every observation and deliver reports for threshold crossings.
    pub fn refresh(&self) {
        let ids: Vec<u64> = self.inner.observations.borrow().keys().copied().collect();
        for id in ids {
            self.deliver(id, false);
        }
    }

    fn deliver(&self, id: u64, initial: bool) {
        let (entry, notify) = {
            let mut observations = self.inner.observations.borrow_mut();
            let Some(obs) = observations.get_mut(&id) else {
                // Unobserved by an earlier callback
                return;
            };

            let entry = self.measure(obs.target, &obs.options);
            let met = obs.options.is_met(entry.ratio, entry.is_intersecting);
            if !initial && obs.last_met == Some(met) {
                return;
            }
            obs.last_met = Some(met);
            (entry, obs.notify.clone())
        };

        notify(entry);
    }
}

impl IntersectionHost for SimulatedViewport {
    fn observe(
        &self,
        target: ElementHandle,
        options: &TrackerOptions,
        notify: IntersectionCallback,
    ) -> Option<ObservationId> {
        let id = self.inner.next_observation.get();
        self.inner.next_observation.set(id + 1);

        self.inner.observations.borrow_mut().insert(
            id,
            Observation {
                target,
                options: *options,
                notify,
                last_met: None,
            },
        );

        self.deliver(id, true);
        Some(ObservationId::new(id))
    }

    fn unobserve(&self, id: ObservationId) {
        self.inner.observations.borrow_mut().remove(&id.id());
    }
}

// =============================================================================
// TESTS
// =============================================================================

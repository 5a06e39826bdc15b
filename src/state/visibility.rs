//! Visibility Tracker - reveal-on-scroll detection
//!
//! Observes one element and reports whether it has entered the viewport (or
//! a margin-adjusted root), optionally only once.
//!
//! # Pattern
//!
//! - `attach(element)` on mount begins observation through the installed
//!   [`IntersectionHost`]
//! - Reports meeting the threshold set `is_visible = true`; with `once` the
//!   observation is released right away and later reports are ignored
//! - Without `once`, reports below the threshold set `is_visible = false`
//! - `detach()`, `dispose()` and `Drop` always release the observation, even
//!   if the element never intersected
//!
//! The tracker never debounces: hosts may coalesce or deliver reports at any
//! time and each one is applied as-is.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::state::visibility::use_in_view;
//! use spark_reveal::TrackerOptions;
//!
//! let tracker = use_in_view(TrackerOptions::default());
//! tracker.attach(element);
//!
//! if tracker.is_visible() {
//!     // apply fade-in class
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::types::{ElementHandle, TrackerFlags, TrackerOptions};

// =============================================================================
// INTERSECTION HOST CAPABILITY
// =============================================================================

/// Identifier of one registered observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationId(u64);

impl ObservationId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

/// One intersection report delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementHandle,
    /// Fraction of the target inside the root (0.0–1.0).
    pub ratio: f32,
    /// Whether the target touches the root at all.
    pub is_intersecting: bool,
}

/// Callback receiving intersection reports.
pub type IntersectionCallback = Rc<dyn Fn(IntersectionEntry)>;

/// Host-provided intersection observation.
pub trait IntersectionHost {
    /// Start observing `target`. `None` means the element cannot be observed.
    fn observe(
        &self,
        target: ElementHandle,
        options: &TrackerOptions,
        notify: IntersectionCallback,
    ) -> Option<ObservationId>;

    /// Stop an observation. Unknown ids are ignored.
    fn unobserve(&self, id: ObservationId);
}

thread_local! {
    static INTERSECTION_HOST: RefCell<Option<Rc<dyn IntersectionHost>>> = RefCell::new(None);
}

/// Install (or remove with `None`) the intersection host for this thread.
pub fn install_intersection_host(host: Option<Rc<dyn IntersectionHost>>) {
    INTERSECTION_HOST.with(|slot| *slot.borrow_mut() = host);
}

/// The currently installed intersection host, if any.
pub fn intersection_host() -> Option<Rc<dyn IntersectionHost>> {
    INTERSECTION_HOST.with(|slot| slot.borrow().clone())
}

/// Remove the installed intersection host (for testing).
pub fn reset_intersection_host() {
    install_intersection_host(None);
}

// =============================================================================
// VISIBILITY TRACKER
// =============================================================================

type VisibilityListener = Rc<dyn Fn(bool)>;

struct TrackerInner {
    options: TrackerOptions,
    target: Cell<Option<ElementHandle>>,
    /// Observation plus the host that owns it
    observation: RefCell<Option<(Rc<dyn IntersectionHost>, ObservationId)>>,
    flags: Cell<TrackerFlags>,
    visible: Signal<bool>,
    listeners: RefCell<Vec<(usize, VisibilityListener)>>,
    next_listener: Cell<usize>,
}

impl TrackerInner {
    fn has(&self, flag: TrackerFlags) -> bool {
        self.flags.get().contains(flag)
    }

    fn set_flag(&self, flag: TrackerFlags, on: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, on);
        self.flags.set(flags);
    }

    fn release(&self) {
        if let Some((host, id)) = self.observation.borrow_mut().take() {
            tracing::trace!(observation = id.id(), "releasing observation");
            host.unobserve(id);
        }
        self.set_flag(TrackerFlags::OBSERVING, false);
    }

    fn handle_entry(&self, entry: IntersectionEntry) {
        if self.has(TrackerFlags::DISPOSED) || self.has(TrackerFlags::FROZEN) {
            return;
        }
        if self.target.get() != Some(entry.target) {
            return;
        }

        if self.options.is_met(entry.ratio, entry.is_intersecting) {
            if self.options.once {
                self.set_flag(TrackerFlags::FROZEN, true);
                self.release();
            }
            self.publish(true);
        } else if !self.options.once {
            self.publish(false);
        }
    }

    fn publish(&self, visible: bool) {
        if self.has(TrackerFlags::VISIBLE) == visible {
            return;
        }

        self.set_flag(TrackerFlags::VISIBLE, visible);
        self.visible.set(visible);

        let listeners: Vec<(usize, VisibilityListener)> = self.listeners.borrow().clone();
        for (id, listener) in listeners {
            let still_registered = self.listeners.borrow().iter().any(|(i, _)| *i == id);
            if still_registered && !self.has(TrackerFlags::DISPOSED) {
                listener(visible);
            }
        }
    }
}

/// Tracks whether one element is in view.
///
/// Owns its observation: dropping the tracker releases it.
pub struct VisibilityTracker {
    inner: Rc<TrackerInner>,
}

/// Create a tracker with the given options (hook-style constructor).
pub fn use_in_view(options: TrackerOptions) -> VisibilityTracker {
    VisibilityTracker::new(options)
}

impl VisibilityTracker {
    pub fn new(options: TrackerOptions) -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                options,
                target: Cell::new(None),
                observation: RefCell::new(None),
                flags: Cell::new(TrackerFlags::NONE),
                visible: signal(false),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Options this tracker was created with.
    pub fn options(&self) -> &TrackerOptions {
        &self.inner.options
    }

    /// Attach the tracker to its element and start observing.
    ///
    /// Attaching a different element releases the previous observation. A
    /// frozen `once` tracker stays visible and does not observe again.
    pub fn attach(&self, target: ElementHandle) {
        let inner = &self.inner;
        if inner.has(TrackerFlags::DISPOSED) {
            return;
        }
        if inner.target.get() == Some(target) && inner.has(TrackerFlags::OBSERVING) {
            return;
        }

        inner.release();
        inner.target.set(Some(target));
        inner.set_flag(TrackerFlags::ATTACHED, true);

        if inner.has(TrackerFlags::FROZEN) {
            return;
        }

        let Some(host) = intersection_host() else {
            tracing::debug!(
                element = target.id(),
                "no intersection host installed, element will not be observed"
            );
            return;
        };

        let weak: Weak<TrackerInner> = Rc::downgrade(inner);
        let notify: IntersectionCallback = Rc::new(move |entry| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_entry(entry);
            }
        });

        // Mark as observing before the host can deliver its initial report
        inner.set_flag(TrackerFlags::OBSERVING, true);
        match host.observe(target, &inner.options, notify) {
            Some(id) => {
                if inner.has(TrackerFlags::FROZEN) {
                    // Initial report already froze us
                    host.unobserve(id);
                    inner.set_flag(TrackerFlags::OBSERVING, false);
                } else {
                    *inner.observation.borrow_mut() = Some((host, id));
                }
            }
            None => {
                tracing::debug!(element = target.id(), "host refused observation");
                inner.set_flag(TrackerFlags::OBSERVING, false);
            }
        }
    }

    /// Element unmounted: release the observation.
    pub fn detach(&self) {
        self.inner.release();
        self.inner.target.set(None);
        self.inner.set_flag(TrackerFlags::ATTACHED, false);
    }

    /// Release everything. Idempotent; nothing fires afterwards.
    pub fn dispose(&self) {
        if self.inner.has(TrackerFlags::DISPOSED) {
            return;
        }
        self.inner.release();
        self.inner.set_flag(TrackerFlags::DISPOSED, true);
        self.inner.listeners.borrow_mut().clear();
    }

    /// Whether the element is currently considered visible.
    pub fn is_visible(&self) -> bool {
        self.inner.has(TrackerFlags::VISIBLE)
    }

    /// Visibility as a signal, for reactive bindings.
    pub fn visible_signal(&self) -> Signal<bool> {
        self.inner.visible.clone()
    }

    /// Attached element, if any.
    pub fn target(&self) -> Option<ElementHandle> {
        self.inner.target.get()
    }

    /// Whether an observation is currently held.
    pub fn is_observing(&self) -> bool {
        self.inner.has(TrackerFlags::OBSERVING)
    }

    pub fn flags(&self) -> TrackerFlags {
        self.inner.flags.get()
    }

    /// Register a callback fired when visibility flips.
    /// Returns cleanup function to unregister.
    pub fn on_change(&self, callback: impl Fn(bool) + 'static) -> Box<dyn FnOnce()> {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }
}

impl Drop for VisibilityTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Host that records observations and lets the test push reports
    #[derive(Default)]
    struct ManualHost {
        observers: RefCell<Vec<(ObservationId, ElementHandle, IntersectionCallback)>>,
        next: Cell<u64>,
        unobserved: RefCell<Vec<ObservationId>>,
    }

    impl ManualHost {
        fn report(&self, target: ElementHandle, ratio: f32) {
            let observers: Vec<_> = self
                .observers
                .borrow()
                .iter()
                .filter(|(_, t, _)| *t == target)
                .map(|(_, _, cb)| cb.clone())
                .collect();
            for cb in observers {
                cb(IntersectionEntry {
                    target,
                    ratio,
                    is_intersecting: ratio > 0.0,
                });
            }
        }

        fn live(&self) -> usize {
            self.observers.borrow().len()
        }
    }

    impl IntersectionHost for ManualHost {
        fn observe(
            &self,
            target: ElementHandle,
            _options: &TrackerOptions,
            notify: IntersectionCallback,
        ) -> Option<ObservationId> {
            let id = ObservationId::new(self.next.get());
            self.next.set(self.next.get() + 1);
            self.observers.borrow_mut().push((id, target, notify));
            Some(id)
        }

        fn unobserve(&self, id: ObservationId) {
            self.observers.borrow_mut().retain(|(i, _, _)| *i != id);
            self.unobserved.borrow_mut().push(id);
        }
    }

    fn setup() -> Rc<ManualHost> {
        let host = Rc::new(ManualHost::default());
        install_intersection_host(Some(host.clone()));
        host
    }

    const EL: ElementHandle = ElementHandle::new(7);

    #[test]
    fn test_once_tracker_freezes_visible() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default());
        tracker.attach(EL);
        assert!(!tracker.is_visible());
        assert_eq!(host.live(), 1);

        host.report(EL, 0.5);
        assert!(tracker.is_visible());
        assert!(tracker.flags().contains(TrackerFlags::FROZEN));

        // Observation released; exits are ignored
        assert_eq!(host.live(), 0);
        host.report(EL, 0.0);
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_below_threshold_does_not_reveal() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default());
        tracker.attach(EL);

        host.report(EL, 0.1);
        assert!(!tracker.is_visible());
        assert!(tracker.is_observing());
    }

    #[test]
    fn test_repeatable_tracker_oscillates() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default().with_once(false));
        tracker.attach(EL);

        host.report(EL, 0.6);
        assert!(tracker.is_visible());
        host.report(EL, 0.0);
        assert!(!tracker.is_visible());
        host.report(EL, 1.0);
        assert!(tracker.is_visible());
        assert_eq!(host.live(), 1);
    }

    #[test]
    fn test_drop_releases_unintersected_observation() {
        let host = setup();
        {
            let tracker = use_in_view(TrackerOptions::default());
            tracker.attach(EL);
            assert_eq!(host.live(), 1);
        }
        assert_eq!(host.live(), 0);
        assert_eq!(host.unobserved.borrow().len(), 1);
    }

    #[test]
    fn test_detach_releases_observation() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default().with_once(false));
        tracker.attach(EL);
        tracker.detach();

        assert_eq!(host.live(), 0);
        assert_eq!(tracker.target(), None);
    }

    #[test]
    fn test_reports_for_other_elements_ignored() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default());
        tracker.attach(EL);

        // Simulate a host that misroutes a report
        let cb = host.observers.borrow()[0].2.clone();
        cb(IntersectionEntry {
            target: ElementHandle::new(99),
            ratio: 1.0,
            is_intersecting: true,
        });
        assert!(!tracker.is_visible());
    }

    #[test]
    fn test_no_host_degrades_to_unobserved() {
        reset_intersection_host();
        let tracker = use_in_view(TrackerOptions::default());
        tracker.attach(EL);

        assert!(!tracker.is_observing());
        assert!(!tracker.is_visible());
        assert_eq!(tracker.target(), Some(EL));
    }

    #[test]
    fn test_on_change_listener() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default().with_once(false));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let unsub = tracker.on_change(move |v| s.borrow_mut().push(v));
        tracker.attach(EL);

        host.report(EL, 0.9);
        host.report(EL, 0.95); // no change, no callback
        host.report(EL, 0.0);
        unsub();
        host.report(EL, 0.9);

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(tracker.visible_signal().get());
    }

    #[test]
    fn test_dispose_is_final() {
        let host = setup();
        let tracker = use_in_view(TrackerOptions::default().with_once(false));
        tracker.attach(EL);
        let cb = host.observers.borrow()[0].2.clone();

        tracker.dispose();
        tracker.dispose();
        assert_eq!(host.live(), 0);

        // A stale callback held by the host does nothing
        cb(IntersectionEntry {
            target: EL,
            ratio: 1.0,
            is_intersecting: true,
        });
        assert!(!tracker.is_visible());

        tracker.attach(EL);
        assert_eq!(host.live(), 0);
    }
}

//! Reduced Motion - the user's "prefers reduced motion" preference
//!
//! One preference per thread, held in a signal so hosts can bind to it, plus
//! a callback registry for components that must react imperatively when it
//! flips (a typewriter has to cancel its timer and reveal everything on the
//! same turn).
//!
//! The live value comes from an optional [`MotionQuery`] capability (a media
//! query bridge in a browser, an env var or flag in a terminal). Without one
//! the preference defaults to "not reduced".
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::state::motion;
//!
//! let unsubscribe = motion::on_motion_change(|reduced| {
//!     println!("reduced motion: {reduced}");
//! });
//!
//! motion::set_reduced_motion(true); // fires the callback
//! unsubscribe();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{signal, Signal};

// =============================================================================
// MOTION QUERY CAPABILITY
// =============================================================================

/// Host-provided source of the reduced-motion preference.
pub trait MotionQuery {
    /// Current value of the preference.
    fn matches(&self) -> bool;

    /// Subscribe to changes. Returns an unsubscribe function.
    fn subscribe(&self, on_change: Box<dyn Fn(bool)>) -> Box<dyn FnOnce()>;
}

/// A fixed preference that never changes (flags, env vars, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMotionQuery(pub bool);

impl MotionQuery for StaticMotionQuery {
    fn matches(&self) -> bool {
        self.0
    }

    fn subscribe(&self, _on_change: Box<dyn Fn(bool)>) -> Box<dyn FnOnce()> {
        Box::new(|| {})
    }
}

// =============================================================================
// PREFERENCE STATE
// =============================================================================

type MotionListener = Rc<dyn Fn(bool)>;

thread_local! {
    static REDUCED_MOTION: Signal<bool> = signal(false);
    static MOTION_LISTENERS: RefCell<Vec<(usize, MotionListener)>> = RefCell::new(Vec::new());
    static NEXT_LISTENER_ID: Cell<usize> = Cell::new(0);
    /// Unsubscribe function of the installed query
    static QUERY_SUBSCRIPTION: RefCell<Option<Box<dyn FnOnce()>>> = RefCell::new(None);
}

/// Current reduced-motion preference.
pub fn prefers_reduced_motion() -> bool {
    REDUCED_MOTION.with(|s| s.get())
}

/// The preference as a signal, for reactive bindings.
pub fn reduced_motion_signal() -> Signal<bool> {
    REDUCED_MOTION.with(|s| s.clone())
}

/// Set the preference and notify listeners if it changed.
pub fn set_reduced_motion(reduced: bool) {
    if prefers_reduced_motion() == reduced {
        return;
    }

    tracing::debug!(reduced, "reduced-motion preference changed");
    REDUCED_MOTION.with(|s| s.set(reduced));

    // Snapshot so listeners may (un)subscribe while we notify
    let listeners: Vec<(usize, MotionListener)> =
        MOTION_LISTENERS.with(|l| l.borrow().clone());

    for (id, listener) in listeners {
        // Skip listeners removed by an earlier callback in this round
        let still_registered = MOTION_LISTENERS.with(|l| l.borrow().iter().any(|(i, _)| *i == id));
        if still_registered {
            listener(reduced);
        }
    }
}

/// Register a callback fired whenever the preference changes.
/// Returns cleanup function to unregister.
pub fn on_motion_change(callback: impl Fn(bool) + 'static) -> impl FnOnce() {
    let id = NEXT_LISTENER_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });

    MOTION_LISTENERS.with(|l| l.borrow_mut().push((id, Rc::new(callback))));

    move || {
        MOTION_LISTENERS.with(|l| l.borrow_mut().retain(|(i, _)| *i != id));
    }
}

/// Number of registered listeners (for testing).
pub fn listener_count() -> usize {
    MOTION_LISTENERS.with(|l| l.borrow().len())
}

/// Connect the preference to a host query, replacing any previous one.
///
/// `None` disconnects and falls back to "not reduced".
pub fn install_motion_query(query: Option<Rc<dyn MotionQuery>>) {
    if let Some(unsubscribe) = QUERY_SUBSCRIPTION.with(|q| q.borrow_mut().take()) {
        unsubscribe();
    }

    match query {
        Some(query) => {
            set_reduced_motion(query.matches());
            let unsubscribe = query.subscribe(Box::new(set_reduced_motion));
            QUERY_SUBSCRIPTION.with(|q| *q.borrow_mut() = Some(unsubscribe));
        }
        None => {
            tracing::debug!("no motion query installed, assuming full motion");
            set_reduced_motion(false);
        }
    }
}

/// Reset preference, listeners and query (for testing).
pub fn reset_motion_state() {
    if let Some(unsubscribe) = QUERY_SUBSCRIPTION.with(|q| q.borrow_mut().take()) {
        unsubscribe();
    }
    MOTION_LISTENERS.with(|l| l.borrow_mut().clear());
    REDUCED_MOTION.with(|s| s.set(false));
}

// =============================================================================
// TESTS
// =============================================================================

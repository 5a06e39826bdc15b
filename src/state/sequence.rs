//! Sequence - step counter and sequenced typewriters
//!
//! A page reveals N text segments one after another. They share one
//! [`StepSequencer`]:
//!
//! ```text
//! step:      0            1            2    ...    N (terminal)
//! active:    segment 0 -> segment 1 -> segment 2 -> call-to-action ready
//! ```
//!
//! - Segment `k` is mounted when `step >= k` and animating only when
//!   `step == k`; earlier segments keep their full text on screen
//! - Only the active segment may advance the counter (`complete(k)` with
//!   `k == step`), so two segments can never animate at once
//! - The counter only moves forward, by exactly one, and stops at N
//!
//! [`SequencedTypewriter`] wires N [`Typewriter`]s to a sequencer, follows the
//! reduced-motion preference (everything resolves in one pass when reduced),
//! and can hold the first segment back behind a start gate such as a
//! [`VisibilityTracker`].
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::state::sequence::{SequencedTypewriter, SequenceOptions};
//!
//! let seq = SequencedTypewriter::new(
//!     vec!["Hello.".into(), "Let's begin.".into()],
//!     SequenceOptions::default(),
//! );
//!
//! clock.advance(1_000);
//! assert!(seq.cta_actionable());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::state::motion;
use crate::state::typewriter::{Typewriter, TypewriterProps, DEFAULT_SPEED_MS};
use crate::state::visibility::VisibilityTracker;
use crate::types::Segment;

// =============================================================================
// STEP SEQUENCER
// =============================================================================

type StepListener = Rc<dyn Fn(usize)>;

struct SequencerInner {
    step: Signal<usize>,
    count: usize,
    listeners: RefCell<Vec<(usize, StepListener)>>,
    next_listener: Cell<usize>,
}

/// Shared step counter over `count` segments.
///
/// Cloning shares the same counter.
#[derive(Clone)]
pub struct StepSequencer {
    inner: Rc<SequencerInner>,
}

impl StepSequencer {
    pub fn new(count: usize) -> Self {
        Self {
            inner: Rc::new(SequencerInner {
                step: signal(0),
                count,
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Current step (index of the active segment, or N when finished).
    pub fn step(&self) -> usize {
        self.inner.step.get()
    }

    /// Step as a signal, for reactive bindings.
    pub fn step_signal(&self) -> Signal<usize> {
        self.inner.step.clone()
    }

    pub fn segment_count(&self) -> usize {
        self.inner.count
    }

    /// Whether every segment has completed.
    pub fn is_terminal(&self) -> bool {
        self.step() >= self.inner.count
    }

    /// Segment `k` is on screen.
    pub fn is_mounted(&self, k: usize) -> bool {
        k < self.inner.count && self.step() >= k
    }

    /// Segment `k` is the one allowed to animate.
    pub fn is_active(&self, k: usize) -> bool {
        k < self.inner.count && self.step() == k
    }

    /// Report completion of segment `k`.
    ///
    /// Advances to `k + 1` only if `k` is the active segment; returns whether
    /// the counter moved.
    pub fn complete(&self, k: usize) -> bool {
        let step = self.step();
        if k != step || step >= self.inner.count {
            tracing::trace!(segment = k, step, "ignoring completion from inactive segment");
            return false;
        }

        let next = step + 1;
        self.inner.step.set(next);
        tracing::debug!(step = next, total = self.inner.count, "sequence advanced");

        let listeners: Vec<(usize, StepListener)> = self.inner.listeners.borrow().clone();
        for (id, listener) in listeners {
            let still_registered = self.inner.listeners.borrow().iter().any(|(i, _)| *i == id);
            if still_registered {
                listener(next);
            }
        }
        true
    }

    /// Register a callback fired after every advance.
    /// Returns cleanup function to unregister.
    pub fn on_step(&self, callback: impl Fn(usize) + 'static) -> Box<dyn FnOnce()> {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(callback)));

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }
}

// =============================================================================
// SEQUENCED TYPEWRITER
// =============================================================================

/// Options for a [`SequencedTypewriter`].
#[derive(Debug, Clone, Copy)]
pub struct SequenceOptions {
    /// Default milliseconds per character for segments without their own speed
    pub speed_ms: u64,
    /// Whether the start gate begins open (default: true)
    pub gate_open: bool,
    /// Follow the thread's reduced-motion preference (default: true)
    pub follow_motion: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            speed_ms: DEFAULT_SPEED_MS,
            gate_open: true,
            follow_motion: true,
        }
    }
}

/// What a host should render for one mounted segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentView {
    pub index: usize,
    pub text: String,
    pub animating: bool,
}

struct SequenceInner {
    sequencer: StepSequencer,
    segments: Vec<Typewriter>,
    gate: Cell<bool>,
    reduced: Cell<bool>,
    disposed: Cell<bool>,
    /// Re-entrancy guard for `sync`
    syncing: Cell<bool>,
    dirty: Cell<bool>,
    subscriptions: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl SequenceInner {
    /// Push step, gate and motion state into every segment.
    ///
    /// Completions triggered while syncing (reduced motion, empty segments)
    /// request another pass instead of recursing.
    fn sync(&self) {
        if self.disposed.get() {
            return;
        }
        if self.syncing.replace(true) {
            self.dirty.set(true);
            return;
        }

        loop {
            self.dirty.set(false);
            let reduced = self.reduced.get();
            let gate = self.gate.get();

            for (k, segment) in self.segments.iter().enumerate() {
                // Read the step per segment: an earlier segment may have
                // completed synchronously in this very pass
                let step = self.sequencer.step();
                let active = reduced || (gate && step == k);
                segment.set_state(active, reduced);
            }

            if !self.dirty.get() || self.disposed.get() {
                break;
            }
        }

        self.syncing.set(false);
    }

    fn on_segment_complete(&self, k: usize) {
        if self.disposed.get() {
            return;
        }
        self.sequencer.complete(k);
    }
}

/// N typewriters revealed strictly one after another.
pub struct SequencedTypewriter {
    inner: Rc<SequenceInner>,
}

impl SequencedTypewriter {
    pub fn new(segments: Vec<Segment>, options: SequenceOptions) -> Self {
        let sequencer = StepSequencer::new(segments.len());

        let inner = Rc::new_cyclic(|weak: &Weak<SequenceInner>| {
            let typewriters = segments
                .into_iter()
                .enumerate()
                .map(|(k, segment)| {
                    let weak = weak.clone();
                    Typewriter::new(TypewriterProps {
                        text: segment.text,
                        speed_ms: segment.speed_ms.unwrap_or(options.speed_ms),
                        active: false,
                        reduced_motion: false,
                        on_complete: Some(Rc::new(move || {
                            if let Some(inner) = weak.upgrade() {
                                inner.on_segment_complete(k);
                            }
                        })),
                    })
                })
                .collect();

            SequenceInner {
                sequencer: sequencer.clone(),
                segments: typewriters,
                gate: Cell::new(options.gate_open),
                reduced: Cell::new(options.follow_motion && motion::prefers_reduced_motion()),
                disposed: Cell::new(false),
                syncing: Cell::new(false),
                dirty: Cell::new(false),
                subscriptions: RefCell::new(Vec::new()),
            }
        });

        let weak = Rc::downgrade(&inner);
        let unsubscribe_step = sequencer.on_step(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.sync();
            }
        });
        inner.subscriptions.borrow_mut().push(unsubscribe_step);

        if options.follow_motion {
            let weak = Rc::downgrade(&inner);
            let unsubscribe_motion = motion::on_motion_change(move |reduced| {
                if let Some(inner) = weak.upgrade() {
                    inner.reduced.set(reduced);
                    inner.sync();
                }
            });
            inner
                .subscriptions
                .borrow_mut()
                .push(Box::new(unsubscribe_motion));
        }

        inner.sync();
        Self { inner }
    }

    /// Shared step counter.
    pub fn sequencer(&self) -> &StepSequencer {
        &self.inner.sequencer
    }

    pub fn step(&self) -> usize {
        self.inner.sequencer.step()
    }

    pub fn step_signal(&self) -> Signal<usize> {
        self.inner.sequencer.step_signal()
    }

    pub fn segment_count(&self) -> usize {
        self.inner.segments.len()
    }

    pub fn segment(&self, k: usize) -> Option<&Typewriter> {
        self.inner.segments.get(k)
    }

    pub fn segment_text(&self, k: usize) -> Option<String> {
        self.segment(k).map(Typewriter::text)
    }

    /// Currently displayed prefix of segment `k`.
    pub fn displayed(&self, k: usize) -> Option<String> {
        self.segment(k).map(Typewriter::displayed)
    }

    /// Segment `k` is on screen. Everything is mounted under reduced motion.
    pub fn is_mounted(&self, k: usize) -> bool {
        k < self.segment_count() && (self.inner.reduced.get() || self.step() >= k)
    }

    /// Segment `k` is currently typing.
    pub fn is_animating(&self, k: usize) -> bool {
        self.segment(k).is_some_and(Typewriter::is_animating)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.sequencer.is_terminal()
    }

    /// Whether the control following the sequence may be used.
    pub fn cta_actionable(&self) -> bool {
        self.inner.reduced.get() || self.is_finished()
    }

    /// Getter for [`cta_actionable`](Self::cta_actionable) that outlives
    /// borrows of the sequence. Returns false once the sequence is gone.
    pub fn cta_getter(&self) -> Rc<dyn Fn() -> bool> {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || {
            weak.upgrade().is_some_and(|inner| {
                !inner.disposed.get()
                    && (inner.reduced.get() || inner.sequencer.is_terminal())
            })
        })
    }

    pub fn is_reduced_motion(&self) -> bool {
        self.inner.reduced.get()
    }

    /// Override the motion preference (for sequences not following it).
    pub fn set_reduced_motion(&self, reduced: bool) {
        if self.inner.reduced.replace(reduced) != reduced {
            self.inner.sync();
        }
    }

    pub fn is_gate_open(&self) -> bool {
        self.inner.gate.get()
    }

    /// Open the start gate. The gate latches: once open it stays open, the
    /// sequence never rewinds.
    pub fn set_gate(&self, open: bool) {
        if !open || self.inner.gate.replace(true) {
            return;
        }
        tracing::debug!("sequence gate opened");
        self.inner.sync();
    }

    /// Hold the sequence until `tracker` reports its element visible.
    pub fn gate_on(&self, tracker: &VisibilityTracker) {
        self.inner.gate.set(false);

        let weak = Rc::downgrade(&self.inner);
        let unsubscribe = tracker.on_change(move |visible| {
            if visible {
                if let Some(inner) = weak.upgrade() {
                    if !inner.gate.replace(true) {
                        tracing::debug!("sequence gate opened by visibility");
                        inner.sync();
                    }
                }
            }
        });
        self.inner.subscriptions.borrow_mut().push(unsubscribe);

        if tracker.is_visible() {
            self.set_gate(true);
        } else {
            // Stop anything the open gate already started
            self.inner.sync();
        }
    }

    /// Replace the text of segment `k`.
    ///
    /// A finished segment shows the new text in full, the running one
    /// restarts its reveal and a future one stays blank.
    pub fn set_segment_text(&self, k: usize, text: impl Into<String>) {
        let Some(segment) = self.segment(k) else {
            return;
        };
        if k < self.step() {
            segment.set_text_revealed(text);
        } else {
            segment.set_text(text);
        }
    }

    /// Mounted segments in order, ready for a host to draw.
    pub fn views(&self) -> Vec<SegmentView> {
        self.inner
            .segments
            .iter()
            .enumerate()
            .filter(|(k, _)| self.is_mounted(*k))
            .map(|(index, segment)| SegmentView {
                index,
                text: segment.displayed(),
                animating: segment.is_animating(),
            })
            .collect()
    }

    /// Cancel every timer and subscription. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        for segment in &self.inner.segments {
            segment.dispose();
        }
        let subscriptions: Vec<Box<dyn FnOnce()>> =
            self.inner.subscriptions.borrow_mut().drain(..).collect();
        for unsubscribe in subscriptions {
            unsubscribe();
        }
    }
}

impl Drop for SequencedTypewriter {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// TESTS
// =============================================================================

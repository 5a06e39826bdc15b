//! Typewriter - incremental text reveal for one segment
//!
//! Reveals `text` one grapheme at a time on a repeating timer and reports
//! completion exactly once per reveal.
//!
//! # Rules
//!
//! - Reduced motion: the full text is shown immediately and completion fires
//!   synchronously. No timer is created.
//! - Active: reset to empty, then one grapheme per `speed_ms` tick. At the end
//!   the timer stops and completion fires.
//! - Inactive: no timer runs; the displayed text keeps its last value.
//! - New text: the reveal restarts from empty against the new text.
//! - Deactivating, disposing or dropping cancels the pending timer on the same
//!   turn. Nothing fires afterwards.
//!
//! The cursor counts extended grapheme clusters so an emoji or a letter with
//! combining marks never shows up half-typed.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::state::typewriter::{Typewriter, TypewriterProps};
//!
//! let tw = Typewriter::new(TypewriterProps {
//!     text: "Hi".into(),
//!     speed_ms: 10,
//!     on_complete: Some(Rc::new(|| println!("done"))),
//!     ..Default::default()
//! });
//!
//! clock.advance(10); // "H"
//! clock.advance(10); // "Hi", prints "done"
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};
use unicode_segmentation::UnicodeSegmentation;

use crate::state::clock::{timer_host, TimerHost, TimerId};
use crate::state::motion;

/// Default reveal speed in milliseconds per character.
pub const DEFAULT_SPEED_MS: u64 = 22;

/// Completion callback.
pub type CompleteCallback = Rc<dyn Fn()>;

// =============================================================================
// PROPS
// =============================================================================

/// Inputs for a [`Typewriter`].
#[derive(Clone)]
pub struct TypewriterProps {
    pub text: String,
    /// Milliseconds per character (default: 22)
    pub speed_ms: u64,
    /// Whether this segment may animate (default: true)
    pub active: bool,
    /// Skip the animation entirely (default: false)
    pub reduced_motion: bool,
    pub on_complete: Option<CompleteCallback>,
}

impl Default for TypewriterProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            speed_ms: DEFAULT_SPEED_MS,
            active: true,
            reduced_motion: false,
            on_complete: None,
        }
    }
}

impl TypewriterProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// REVEAL TEXT
// =============================================================================

/// Text plus the byte offset where each grapheme ends.
struct RevealText {
    text: String,
    ends: Vec<usize>,
}

impl RevealText {
    fn new(text: String) -> Self {
        let ends = text
            .grapheme_indices(true)
            .map(|(start, g)| start + g.len())
            .collect();
        Self { text, ends }
    }

    fn len(&self) -> usize {
        self.ends.len()
    }

    fn prefix(&self, cursor: usize) -> &str {
        match cursor.min(self.ends.len()) {
            0 => "",
            n => &self.text[..self.ends[n - 1]],
        }
    }
}

/// Number of reveal steps `text` takes (its grapheme count).
pub fn reveal_len(text: &str) -> usize {
    text.graphemes(true).count()
}

// =============================================================================
// TYPEWRITER
// =============================================================================

struct TypewriterInner {
    text: RefCell<RevealText>,
    speed_ms: Cell<u64>,
    active: Cell<bool>,
    reduced: Cell<bool>,
    cursor: Cell<usize>,
    displayed: Signal<String>,
    /// Running interval plus the host that owns it
    timer: RefCell<Option<(Rc<dyn TimerHost>, TimerId)>>,
    /// Bumped whenever a reveal is started or cancelled; stale ticks compare
    /// against it and bail out
    run: Cell<u64>,
    completed: Cell<bool>,
    disposed: Cell<bool>,
    on_complete: RefCell<Option<CompleteCallback>>,
    motion_subscription: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl TypewriterInner {
    fn cancel_timer(&self) {
        self.run.set(self.run.get() + 1);
        if let Some((host, id)) = self.timer.borrow_mut().take() {
            host.clear_interval(id);
        }
    }

    fn publish(&self) {
        let prefix = self.text.borrow().prefix(self.cursor.get()).to_string();
        self.displayed.set(prefix);
    }

    fn reveal_all(&self) {
        self.cursor.set(self.text.borrow().len());
        self.publish();
        self.complete();
    }

    fn complete(&self) {
        if self.completed.get() || self.disposed.get() {
            return;
        }
        self.completed.set(true);

        let callback = self.on_complete.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Start a fresh reveal according to the current inputs.
    fn restart(self: &Rc<Self>) {
        self.cancel_timer();
        if self.disposed.get() {
            return;
        }
        self.completed.set(false);

        if self.reduced.get() {
            self.reveal_all();
            return;
        }
        if !self.active.get() {
            return;
        }

        self.cursor.set(0);
        self.publish();

        if self.text.borrow().len() == 0 {
            self.complete();
            return;
        }

        self.schedule();
    }

    /// Create the tick interval, keeping the current cursor.
    fn schedule(self: &Rc<Self>) {
        let Some(host) = timer_host() else {
            tracing::debug!("no timer host installed, revealing text instantly");
            self.reveal_all();
            return;
        };

        let run = self.run.get();
        let weak: Weak<TypewriterInner> = Rc::downgrade(self);
        let id = host.set_interval(
            self.speed_ms.get(),
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.tick(run);
                }
            }),
        );
        *self.timer.borrow_mut() = Some((host, id));
    }

    fn tick(&self, run: u64) {
        if self.disposed.get() || run != self.run.get() {
            return;
        }

        let len = self.text.borrow().len();
        let cursor = self.cursor.get();
        if cursor < len {
            self.cursor.set(cursor + 1);
            self.publish();
            tracing::trace!(cursor = cursor + 1, len, "typewriter tick");
        }

        if self.cursor.get() >= len {
            self.cancel_timer();
            self.complete();
        }
    }

    fn apply(self: &Rc<Self>, active: bool, reduced: bool) {
        let was_active = self.active.replace(active);
        let was_reduced = self.reduced.replace(reduced);

        if reduced {
            if !was_reduced {
                self.restart();
            }
            return;
        }

        if was_reduced {
            // Leaving reduced motion: a finished reveal stays on screen
            if active && !self.completed.get() {
                self.restart();
            }
        } else if active && !was_active {
            self.restart();
        } else if !active && was_active {
            self.cancel_timer();
        }
    }
}

/// A single-segment typewriter.
///
/// Owns its timer: dropping the typewriter cancels it.
pub struct Typewriter {
    inner: Rc<TypewriterInner>,
}

impl Typewriter {
    pub fn new(props: TypewriterProps) -> Self {
        let inner = Rc::new(TypewriterInner {
            text: RefCell::new(RevealText::new(props.text)),
            speed_ms: Cell::new(props.speed_ms),
            active: Cell::new(props.active),
            reduced: Cell::new(props.reduced_motion),
            cursor: Cell::new(0),
            displayed: signal(String::new()),
            timer: RefCell::new(None),
            run: Cell::new(0),
            completed: Cell::new(false),
            disposed: Cell::new(false),
            on_complete: RefCell::new(props.on_complete),
            motion_subscription: RefCell::new(None),
        });

        if props.active || props.reduced_motion {
            inner.restart();
        }

        Self { inner }
    }

    /// Track the thread's reduced-motion preference from now on.
    pub fn follow_motion_preference(&self) {
        if let Some(unsubscribe) = self.inner.motion_subscription.borrow_mut().take() {
            unsubscribe();
        }

        let weak = Rc::downgrade(&self.inner);
        let unsubscribe = motion::on_motion_change(move |reduced| {
            if let Some(inner) = weak.upgrade() {
                inner.apply(inner.active.get(), reduced);
            }
        });
        *self.inner.motion_subscription.borrow_mut() = Some(Box::new(unsubscribe));

        self.inner
            .apply(self.inner.active.get(), motion::prefers_reduced_motion());
    }

    /// Replace the text. Restarts the reveal from empty when running.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        if self.inner.text.borrow().text == text {
            return;
        }
        *self.inner.text.borrow_mut() = RevealText::new(text);
        self.inner.cursor.set(0);

        if self.inner.active.get() || self.inner.reduced.get() {
            self.inner.restart();
        } else {
            self.inner.cancel_timer();
            self.inner.completed.set(false);
            self.inner.publish();
        }
    }

    /// Replace the text and show all of it as an already finished reveal.
    ///
    /// Any running reveal is cancelled and the completion callback does not
    /// fire again.
    pub fn set_text_revealed(&self, text: impl Into<String>) {
        let inner = &self.inner;
        if inner.disposed.get() {
            return;
        }
        inner.cancel_timer();
        *inner.text.borrow_mut() = RevealText::new(text.into());
        inner.cursor.set(inner.text.borrow().len());
        inner.completed.set(true);
        inner.publish();
    }

    /// Change the tick period. A running reveal keeps its cursor and
    /// continues at the new speed.
    pub fn set_speed(&self, speed_ms: u64) {
        if self.inner.speed_ms.replace(speed_ms) == speed_ms {
            return;
        }
        if self.is_animating() {
            self.inner.cancel_timer();
            self.inner.schedule();
        }
    }

    pub fn set_active(&self, active: bool) {
        self.inner.apply(active, self.inner.reduced.get());
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.inner.apply(self.inner.active.get(), reduced);
    }

    /// Set both inputs at once, restarting at most once.
    pub fn set_state(&self, active: bool, reduced: bool) {
        self.inner.apply(active, reduced);
    }

    /// Currently displayed prefix.
    pub fn displayed(&self) -> String {
        self.inner.displayed.get()
    }

    /// Displayed prefix as a signal, for reactive bindings.
    pub fn displayed_signal(&self) -> Signal<String> {
        self.inner.displayed.clone()
    }

    pub fn text(&self) -> String {
        self.inner.text.borrow().text.clone()
    }

    /// Graphemes revealed so far.
    pub fn cursor(&self) -> usize {
        self.inner.cursor.get()
    }

    /// Total graphemes in the text.
    pub fn len(&self) -> usize {
        self.inner.text.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn speed_ms(&self) -> u64 {
        self.inner.speed_ms.get()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn is_reduced_motion(&self) -> bool {
        self.inner.reduced.get()
    }

    /// Whether the current reveal has finished.
    pub fn is_complete(&self) -> bool {
        self.inner.completed.get()
    }

    /// Whether a tick timer is pending.
    pub fn is_animating(&self) -> bool {
        self.inner.timer.borrow().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Cancel the timer and drop the callback. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.cancel_timer();
        self.inner.on_complete.borrow_mut().take();
        if let Some(unsubscribe) = self.inner.motion_subscription.borrow_mut().take() {
            unsubscribe();
        }
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// TESTS
// =============================================================================

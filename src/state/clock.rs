//! Timer capability - repeating intervals on a cooperative clock
//!
//! The reveal engine never sleeps or spawns threads. Anything time-driven asks
//! the installed [`TimerHost`] for an interval and gets a [`TimerId`] back to
//! cancel it. Hosts decide what "time" is:
//!
//! - [`VirtualClock`] - deterministic clock advanced explicitly (tests, and the
//!   terminal host which feeds it real elapsed time)
//! - any custom host (e.g. a browser `setInterval` bridge)
//!
//! # Pattern
//!
//! - Host is installed once per thread with [`install_timer_host`]
//! - Components capture the host `Rc` when they create a timer, so cancelling
//!   always reaches the host that owns it
//! - No host installed = no timers; callers degrade to instant behaviour
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::state::clock::VirtualClock;
//!
//! let clock = VirtualClock::new();
//! clock.install();
//!
//! // ... create typewriters ...
//!
//! clock.advance(100); // fire every interval due within the next 100ms
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

// =============================================================================
// TIMER HOST CAPABILITY
// =============================================================================

/// Identifier of a repeating interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Callback fired on every interval tick.
pub type TimerCallback = Rc<dyn Fn()>;

/// A source of repeating timers.
pub trait TimerHost {
    /// Start an interval that fires `callback` every `period_ms`.
    fn set_interval(&self, period_ms: u64, callback: TimerCallback) -> TimerId;

    /// Cancel an interval. Unknown or already-cleared ids are ignored.
    fn clear_interval(&self, id: TimerId);
}

thread_local! {
    static TIMER_HOST: RefCell<Option<Rc<dyn TimerHost>>> = RefCell::new(None);
}

/// Install (or remove with `None`) the timer host for this thread.
pub fn install_timer_host(host: Option<Rc<dyn TimerHost>>) {
    TIMER_HOST.with(|slot| *slot.borrow_mut() = host);
}

/// The currently installed timer host, if any.
pub fn timer_host() -> Option<Rc<dyn TimerHost>> {
    TIMER_HOST.with(|slot| slot.borrow().clone())
}

/// Check whether a timer host is installed.
pub fn has_timer_host() -> bool {
    TIMER_HOST.with(|slot| slot.borrow().is_some())
}

/// Remove the installed timer host (for testing).
pub fn reset_timer_host() {
    install_timer_host(None);
}

// =============================================================================
// VIRTUAL CLOCK
// =============================================================================

struct TimerEntry {
    period: u64,
    due: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct ClockInner {
    now: Cell<u64>,
    next_id: Cell<u64>,
    timers: RefCell<BTreeMap<u64, TimerEntry>>,
}

/// Deterministic millisecond clock.
///
/// Timers fire from [`advance`](Self::advance) one at a time in due-time
/// order; ties fire in creation order. Callbacks may create or clear timers
/// (including their own) while the clock is advancing.
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Rc<ClockInner>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install this clock as the thread's timer host.
    pub fn install(&self) {
        install_timer_host(Some(Rc::new(self.clone())));
    }

    /// Current time in milliseconds since the clock was created.
    pub fn now(&self) -> u64 {
        self.inner.now.get()
    }

    /// Number of live intervals.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Due time of the next interval tick, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.inner.timers.borrow().values().map(|t| t.due).min()
    }

    /// Advance by `ms`, firing every tick that falls due.
    pub fn advance(&self, ms: u64) {
        self.advance_to(self.now().saturating_add(ms));
    }

    /// Advance to absolute time `target`. Moving backwards is a no-op.
    pub fn advance_to(&self, target: u64) {
        if target < self.now() {
            return;
        }

        // Pick the earliest due timer, reschedule it, then fire it with no
        // borrow held so the callback may touch the clock.
        while let Some(callback) = self.take_due(target) {
            callback();
        }

        self.inner.now.set(target);
    }

    fn take_due(&self, target: u64) -> Option<TimerCallback> {
        let mut timers = self.inner.timers.borrow_mut();

        let (&id, _) = timers
            .iter()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(id, t)| (t.due, **id))?;

        let entry = timers.get_mut(&id)?;
        let due = entry.due;
        entry.due = due.saturating_add(entry.period);
        let callback = entry.callback.clone();
        drop(timers);

        self.inner.now.set(due);
        Some(callback)
    }
}

impl TimerHost for VirtualClock {
    fn set_interval(&self, period_ms: u64, callback: TimerCallback) -> TimerId {
        // A zero period would never let time move forward
        let period = period_ms.max(1);
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        self.inner.timers.borrow_mut().insert(
            id,
            TimerEntry {
                period,
                due: self.now() + period,
                callback,
            },
        );

        TimerId(id)
    }

    fn clear_interval(&self, id: TimerId) {
        self.inner.timers.borrow_mut().remove(&id.0);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, TimerCallback) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Rc::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn test_interval_fires_each_period() {
        let clock = VirtualClock::new();
        let (count, cb) = counter();
        clock.set_interval(10, cb);

        clock.advance(9);
        assert_eq!(count.get(), 0);

        clock.advance(1);
        assert_eq!(count.get(), 1);

        clock.advance(25);
        assert_eq!(count.get(), 3);
        assert_eq!(clock.now(), 35);
    }

    #[test]
    fn test_next_due_tracks_earliest_timer() {
        let clock = VirtualClock::new();
        assert_eq!(clock.next_due(), None);

        let (_, slow) = counter();
        let (_, fast) = counter();
        clock.set_interval(30, slow);
        let id = clock.set_interval(20, fast);
        assert_eq!(clock.next_due(), Some(20));

        clock.advance(20);
        assert_eq!(clock.next_due(), Some(30));

        clock.clear_interval(id);
        clock.advance(10);
        assert_eq!(clock.next_due(), Some(60));
    }

    #[test]
    fn test_clear_interval_stops_ticks() {
        let clock = VirtualClock::new();
        let (count, cb) = counter();
        let id = clock.set_interval(5, cb);

        clock.advance(5);
        clock.clear_interval(id);
        clock.advance(100);

        assert_eq!(count.get(), 1);
        assert_eq!(clock.pending_timers(), 0);
    }

    #[test]
    fn test_ticks_fire_in_due_order() {
        let clock = VirtualClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        clock.set_interval(3, Rc::new(move || l.borrow_mut().push("slow")));
        let l = log.clone();
        clock.set_interval(2, Rc::new(move || l.borrow_mut().push("fast")));

        clock.advance(6);

        // t=2 fast, t=3 slow, t=4 fast, t=6 slow (created first), t=6 fast
        assert_eq!(*log.borrow(), vec!["fast", "slow", "fast", "slow", "fast"]);
    }

    #[test]
    fn test_callback_sees_its_own_due_time() {
        let clock = VirtualClock::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let c = clock.clone();
        clock.set_interval(10, Rc::new(move || s.borrow_mut().push(c.now())));

        clock.advance(30);
        assert_eq!(*seen.borrow(), vec![10, 20, 30]);
    }

    #[test]
    fn test_callback_can_clear_itself() {
        let clock = VirtualClock::new();
        let count = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));

        let c = count.clone();
        let slot = id_slot.clone();
        let clock_for_cb = clock.clone();
        let id = clock.set_interval(
            1,
            Rc::new(move || {
                c.set(c.get() + 1);
                if c.get() == 3 {
                    if let Some(id) = slot.get() {
                        clock_for_cb.clear_interval(id);
                    }
                }
            }),
        );
        id_slot.set(Some(id));

        clock.advance(50);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let clock = VirtualClock::new();
        let (count, cb) = counter();
        clock.set_interval(0, cb);

        clock.advance(4);
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn test_install_and_reset_host() {
        reset_timer_host();
        assert!(!has_timer_host());

        let clock = VirtualClock::new();
        clock.install();
        assert!(has_timer_host());

        reset_timer_host();
        assert!(timer_host().is_none());
    }
}

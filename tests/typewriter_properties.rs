//! Typewriter property tests
//!
//! Property-based and scenario tests for single-segment reveals driven by the
//! virtual clock.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use rstest::*;
use spark_reveal::state::typewriter::reveal_len;
use spark_reveal::{reset_motion_state, set_reduced_motion, Typewriter, TypewriterProps, VirtualClock};

// ============================================================================
// Helpers
// ============================================================================

fn setup() -> VirtualClock {
    reset_motion_state();
    let clock = VirtualClock::new();
    clock.install();
    clock
}

fn counting(text: &str, speed_ms: u64, active: bool, reduced: bool) -> (Typewriter, Rc<Cell<u32>>) {
    let completions = Rc::new(Cell::new(0));
    let c = completions.clone();
    let tw = Typewriter::new(TypewriterProps {
        text: text.to_string(),
        speed_ms,
        active,
        reduced_motion: reduced,
        on_complete: Some(Rc::new(move || c.set(c.get() + 1))),
    });
    (tw, completions)
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Reduced motion shows everything at once, whatever the text or speed.
    #[test]
    fn prop_reduced_motion_is_instant(text in "\\PC{0,40}", speed in 1u64..500) {
        let clock = setup();
        let (tw, completions) = counting(&text, speed, true, true);

        prop_assert_eq!(tw.displayed(), text.clone());
        prop_assert_eq!(completions.get(), 1);
        prop_assert_eq!(clock.pending_timers(), 0);

        clock.advance(speed * 100);
        prop_assert_eq!(completions.get(), 1);
    }

    /// A reveal of L graphemes passes through L+1 distinct prefixes and
    /// completes exactly on the L-th tick.
    #[test]
    fn prop_reveal_walks_every_prefix(text in "[a-zA-Z ,.]{1,30}", speed in 1u64..50) {
        let clock = setup();
        let (tw, completions) = counting(&text, speed, true, false);
        let len = reveal_len(&text);

        let mut states = vec![tw.displayed()];
        for tick in 1..=len {
            prop_assert_eq!(completions.get(), 0, "completed before tick {}", tick);
            clock.advance(speed);
            states.push(tw.displayed());
        }
        prop_assert_eq!(completions.get(), 1);

        prop_assert_eq!(states.len(), len + 1);
        prop_assert_eq!(states[0].as_str(), "");
        prop_assert_eq!(states[len].as_str(), text.as_str());
        for pair in states.windows(2) {
            prop_assert!(pair[1].starts_with(pair[0].as_str()));
            prop_assert!(pair[1].len() > pair[0].len());
        }

        clock.advance(speed * 10);
        prop_assert_eq!(completions.get(), 1);
        prop_assert_eq!(clock.pending_timers(), 0);
    }

    /// Going inactive and active again restarts from empty.
    #[test]
    fn prop_reactivation_restarts(text in "[a-z]{2,20}", ticks in 1usize..10) {
        let clock = setup();
        let (tw, _) = counting(&text, 10, true, false);

        clock.advance(10 * ticks.min(reveal_len(&text) - 1) as u64);
        tw.set_active(false);
        let frozen = tw.displayed();
        clock.advance(1_000);
        prop_assert_eq!(tw.displayed(), frozen);

        tw.set_active(true);
        prop_assert_eq!(tw.displayed(), "");
        prop_assert_eq!(tw.cursor(), 0);
    }

    /// Grapheme clusters are never split.
    #[test]
    fn prop_graphemes_never_split(parts in prop::collection::vec(prop_oneof![
        Just("e\u{301}"), Just("👍🏽"), Just("a"), Just("日"),
    ], 1..8)) {
        let clock = setup();
        let text: String = parts.concat();
        let (tw, _) = counting(&text, 5, true, false);

        for k in 0..=parts.len() {
            prop_assert_eq!(tw.displayed(), parts[..k].concat());
            clock.advance(5);
        }
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[rstest]
fn test_hi_at_ten_ms() {
    let clock = setup();
    let (tw, completions) = counting("Hi", 10, true, false);

    assert_eq!(tw.displayed(), "");
    clock.advance(10);
    assert_eq!(tw.displayed(), "H");
    assert_eq!(completions.get(), 0);
    clock.advance(10);
    assert_eq!(tw.displayed(), "Hi");
    assert_eq!(completions.get(), 1);
    assert_eq!(clock.now(), 20);
}

#[rstest]
#[case::fast(1)]
#[case::default_speed(22)]
#[case::slow(250)]
fn test_completion_time_scales_with_speed(#[case] speed: u64) {
    let clock = setup();
    let (_tw, completions) = counting("abcd", speed, true, false);

    clock.advance(speed * 4 - 1);
    assert_eq!(completions.get(), 0);
    clock.advance(1);
    assert_eq!(completions.get(), 1);
}

#[rstest]
fn test_dispose_silences_everything() {
    let clock = setup();
    let (tw, completions) = counting("hello", 10, true, false);

    clock.advance(20);
    tw.dispose();
    let frozen = tw.displayed();

    clock.advance(10_000);
    assert_eq!(tw.displayed(), frozen);
    assert_eq!(completions.get(), 0);
    assert_eq!(clock.pending_timers(), 0);
}

#[rstest]
fn test_motion_preference_flip_completes_once() {
    let clock = setup();
    let (tw, completions) = counting("hello", 10, true, false);
    tw.follow_motion_preference();

    clock.advance(20);
    set_reduced_motion(true);
    assert_eq!(tw.displayed(), "hello");
    assert_eq!(completions.get(), 1);
    assert_eq!(clock.pending_timers(), 0);
}

#[rstest]
fn test_inactive_typewriter_waits() {
    let clock = setup();
    let (tw, completions) = counting("wait", 10, false, false);

    clock.advance(1_000);
    assert_eq!(tw.displayed(), "");
    assert_eq!(completions.get(), 0);

    tw.set_active(true);
    clock.advance(40);
    assert_eq!(tw.displayed(), "wait");
    assert_eq!(completions.get(), 1);
}

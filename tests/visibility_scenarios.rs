//! Visibility tracker tests
//!
//! Trackers observed through a simulated viewport.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use rstest::*;
use spark_reveal::{
    reset_intersection_host, use_in_view, Rect, RootMargin, SimulatedViewport, TrackerOptions,
};

// ============================================================================
// Fixtures
// ============================================================================

fn setup() -> SimulatedViewport {
    let viewport = SimulatedViewport::new(100.0, 100.0);
    viewport.install();
    viewport
}

#[fixture]
fn viewport() -> SimulatedViewport {
    setup()
}

fn no_margin() -> RootMargin {
    "0px".parse().expect("valid margin")
}

// ============================================================================
// Scenario Tests
// ============================================================================

/// Element half inside the viewport (rows 90..110 of a 100-row viewport).
#[rstest]
#[case::any_overlap(0.0, true)]
#[case::below_ratio(0.4, true)]
#[case::exact_ratio(0.5, true)]
#[case::above_ratio(0.6, false)]
#[case::whole_element(1.0, false)]
fn test_threshold_against_half_visible(
    viewport: SimulatedViewport,
    #[case] threshold: f32,
    #[case] expected: bool,
) {
    let el = viewport.add_element(Rect::new(0.0, 90.0, 100.0, 20.0));
    let tracker = use_in_view(
        TrackerOptions::default()
            .with_threshold(threshold)
            .with_root_margin(no_margin()),
    );
    tracker.attach(el);

    assert_eq!(tracker.is_visible(), expected);
}

#[rstest]
fn test_default_margin_ignores_bottom_tenth(viewport: SimulatedViewport) {
    // Fully inside the bottom 10%: not counted
    let el = viewport.add_element(Rect::new(0.0, 92.0, 100.0, 6.0));
    let tracker = use_in_view(TrackerOptions::default());
    tracker.attach(el);
    assert!(!tracker.is_visible());

    viewport.scroll_by(10.0);
    assert!(tracker.is_visible());
}

#[rstest]
fn test_once_releases_observation(viewport: SimulatedViewport) {
    let el = viewport.add_element(Rect::new(0.0, 200.0, 100.0, 20.0));
    let tracker = use_in_view(TrackerOptions::default());
    tracker.attach(el);
    assert_eq!(viewport.observation_count(), 1);

    viewport.scroll_to(150.0);
    assert!(tracker.is_visible());
    assert_eq!(viewport.observation_count(), 0);
    assert!(!tracker.is_observing());
}

#[rstest]
fn test_repeating_tracker_follows_scroll(viewport: SimulatedViewport) {
    let el = viewport.add_element(Rect::new(0.0, 200.0, 100.0, 20.0));
    let tracker = use_in_view(TrackerOptions::default().with_once(false));
    let changes = Rc::new(RefCell::new(Vec::new()));
    let c = changes.clone();
    let _unsubscribe = tracker.on_change(move |visible| c.borrow_mut().push(visible));
    tracker.attach(el);

    viewport.scroll_to(150.0);
    viewport.scroll_to(0.0);
    viewport.scroll_to(150.0);

    assert_eq!(*changes.borrow(), vec![true, false, true]);
    assert_eq!(viewport.observation_count(), 1);
}

#[rstest]
fn test_scroll_ancestor_as_root(viewport: SimulatedViewport) {
    let panel = viewport.add_element(Rect::new(0.0, 0.0, 100.0, 30.0));
    let el = viewport.add_element(Rect::new(0.0, 20.0, 100.0, 20.0));
    let tracker = use_in_view(
        TrackerOptions::default()
            .with_root_margin(no_margin())
            .with_root(panel)
            .with_once(false),
    );
    tracker.attach(el);
    assert!(tracker.is_visible());

    // Panel leaves the viewport while the element's lower half is still on screen
    viewport.scroll_to(35.0);
    assert!(!tracker.is_visible());
}

#[rstest]
fn test_without_host_stays_hidden() {
    reset_intersection_host();
    let tracker = use_in_view(TrackerOptions::default());
    tracker.attach(spark_reveal::ElementHandle::new(7));

    assert!(!tracker.is_visible());
    assert!(!tracker.is_observing());
}

#[rstest]
fn test_drop_releases_observation(viewport: SimulatedViewport) {
    let el = viewport.add_element(Rect::new(0.0, 500.0, 100.0, 20.0));
    {
        let tracker = use_in_view(TrackerOptions::default());
        tracker.attach(el);
        assert_eq!(viewport.observation_count(), 1);
    }
    assert_eq!(viewport.observation_count(), 0);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Once a `once` tracker has seen its element it never goes back,
    /// whatever the scrolling does afterwards.
    #[test]
    fn prop_once_never_resets(
        element_y in 0.0f32..400.0,
        scrolls in prop::collection::vec(0.0f32..500.0, 1..20),
    ) {
        let viewport = setup();
        let el = viewport.add_element(Rect::new(0.0, element_y, 100.0, 10.0));
        let tracker = use_in_view(TrackerOptions::default());

        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        let _unsubscribe = tracker.on_change(move |visible| c.borrow_mut().push(visible));
        tracker.attach(el);

        let mut seen = tracker.is_visible();
        for y in scrolls {
            viewport.scroll_to(y);
            if seen {
                prop_assert!(tracker.is_visible());
            }
            seen |= tracker.is_visible();
        }

        let changes = changes.borrow();
        prop_assert!(changes.len() <= 1);
        prop_assert!(changes.iter().all(|v| *v));
    }

    /// A repeating tracker agrees with a direct measurement after every scroll.
    #[test]
    fn prop_repeating_matches_measurement(
        element_y in 0.0f32..400.0,
        scrolls in prop::collection::vec(0.0f32..500.0, 1..20),
    ) {
        let viewport = setup();
        let el = viewport.add_element(Rect::new(0.0, element_y, 100.0, 10.0));
        let options = TrackerOptions::default().with_once(false);
        let tracker = use_in_view(options);
        tracker.attach(el);

        for y in scrolls {
            viewport.scroll_to(y);
            let entry = viewport.measure(el, &options);
            prop_assert_eq!(tracker.is_visible(), options.is_met(entry.ratio, entry.is_intersecting));
        }
    }
}

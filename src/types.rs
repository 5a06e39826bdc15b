//! Core types for spark-reveal.
//!
//! These are the plain values that flow between the host environment and the
//! reveal engine: element handles, geometry, observer options and segments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevealError};

// =============================================================================
// Element handles
// =============================================================================

/// Non-owning reference to a host element.
///
/// The UI element owns the real node; trackers only remember this id and hand
/// it back to the intersection host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle in document coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlap of two rectangles. Edge-adjacent rectangles produce a
    /// zero-area overlap rather than `None`, matching how browsers treat
    /// touching boxes as intersecting.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow (positive) or shrink (negative) each edge independently.
    pub fn expand(&self, top: f32, right: f32, bottom: f32, left: f32) -> Rect {
        Rect::new(
            self.x - left,
            self.y - top,
            (self.width + left + right).max(0.0),
            (self.height + top + bottom).max(0.0),
        )
    }
}

// =============================================================================
// Root margin
// =============================================================================

/// One side of a root margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    Px(f32),
    Percent(f32),
}

impl MarginValue {
    /// Resolve against the root extent along this side's axis.
    pub fn resolve(self, extent: f32) -> f32 {
        match self {
            MarginValue::Px(px) => px,
            MarginValue::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl Default for MarginValue {
    fn default() -> Self {
        MarginValue::Px(0.0)
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Px(v) => write!(f, "{v}px"),
            MarginValue::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// CSS-style margin applied to the observation root before intersecting.
///
/// Parsed from the usual 1–4 value shorthand, e.g. `"0px 0px -10% 0px"`.
/// Positive values grow the root, negative values shrink it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    /// Apply this margin to a root rectangle.
    ///
    /// Percentages resolve against the root height for top/bottom and the
    /// root width for left/right.
    pub fn apply(&self, root: &Rect) -> Rect {
        root.expand(
            self.top.resolve(root.height),
            self.right.resolve(root.width),
            self.bottom.resolve(root.height),
            self.left.resolve(root.width),
        )
    }
}

fn parse_margin_value(input: &str, token: &str) -> Result<MarginValue> {
    let (number, percent) = if let Some(n) = token.strip_suffix('%') {
        (n, true)
    } else if let Some(n) = token.strip_suffix("px") {
        (n, false)
    } else if token == "0" {
        ("0", false)
    } else {
        return Err(RevealError::invalid_margin(
            input,
            format!("{token:?} must be in px or %"),
        ));
    };

    let value: f32 = number
        .parse()
        .map_err(|_| RevealError::invalid_margin(input, format!("{token:?} is not a number")))?;

    if !value.is_finite() {
        return Err(RevealError::invalid_margin(input, "values must be finite"));
    }

    Ok(if percent {
        MarginValue::Percent(value)
    } else {
        MarginValue::Px(value)
    })
}

impl FromStr for RootMargin {
    type Err = RevealError;

    fn from_str(input: &str) -> Result<Self> {
        let values = input
            .split_whitespace()
            .map(|token| parse_margin_value(input, token))
            .collect::<Result<Vec<_>>>()?;

        // CSS shorthand expansion
        let (top, right, bottom, left) = match values.as_slice() {
            [] => return Err(RevealError::invalid_margin(input, "empty margin")),
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(RevealError::invalid_margin(input, "more than four values")),
        };

        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl TryFrom<String> for RootMargin {
    type Error = RevealError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RootMargin> for String {
    fn from(margin: RootMargin) -> Self {
        margin.to_string()
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

// =============================================================================
// Tracker options
// =============================================================================

/// Default fraction of the element that must be inside the root.
pub const DEFAULT_THRESHOLD: f32 = 0.15;

/// Default root margin: ignore the bottom 10% of the viewport.
pub const DEFAULT_ROOT_MARGIN: &str = "0px 0px -10% 0px";

/// Options for a [`VisibilityTracker`](crate::state::visibility::VisibilityTracker).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    /// Fraction of the element (0.0–1.0) that must intersect the root.
    pub threshold: f32,
    /// Margin applied to the root before intersecting.
    pub root_margin: RootMargin,
    /// Freeze at visible after the first intersection and stop observing.
    pub once: bool,
    /// Scroll ancestor to intersect against instead of the viewport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<ElementHandle>,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin {
                top: MarginValue::Px(0.0),
                right: MarginValue::Px(0.0),
                bottom: MarginValue::Percent(-10.0),
                left: MarginValue::Px(0.0),
            },
            once: true,
            root: None,
        }
    }
}

impl TrackerOptions {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn with_root(mut self, root: ElementHandle) -> Self {
        self.root = Some(root);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RevealError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    /// Whether an intersection report satisfies this threshold.
    ///
    /// A zero threshold means "any overlap at all", which includes
    /// zero-area edge contact reported as intersecting.
    pub fn is_met(&self, ratio: f32, is_intersecting: bool) -> bool {
        if self.threshold <= 0.0 {
            is_intersecting || ratio > 0.0
        } else {
            is_intersecting && ratio >= self.threshold
        }
    }
}

// =============================================================================
// Tracker flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Lifecycle flags of a visibility tracker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TrackerFlags: u8 {
        const NONE = 0;
        /// A target element is attached.
        const ATTACHED = 1 << 0;
        /// An observation is currently registered with the host.
        const OBSERVING = 1 << 1;
        /// Last report met the threshold.
        const VISIBLE = 1 << 2;
        /// `once` tracker has fired; further reports are ignored.
        const FROZEN = 1 << 3;
        /// Tracker was disposed.
        const DISPOSED = 1 << 4;
    }
}

// =============================================================================
// Segment
// =============================================================================

/// One unit of text revealed by the typewriter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Per-segment speed override in milliseconds per character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_ms: Option<u64>,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speed_ms: None,
        }
    }

    pub fn with_speed(mut self, speed_ms: u64) -> Self {
        self.speed_ms = Some(speed_ms);
        self
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::new(text)
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::new(text)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_margin_shorthand() {
        let one: RootMargin = "8px".parse().unwrap();
        assert_eq!(one.top, MarginValue::Px(8.0));
        assert_eq!(one.left, MarginValue::Px(8.0));

        let two: RootMargin = "4px 10%".parse().unwrap();
        assert_eq!(two.bottom, MarginValue::Px(4.0));
        assert_eq!(two.right, MarginValue::Percent(10.0));

        let three: RootMargin = "1px 2px 3px".parse().unwrap();
        assert_eq!(three.left, MarginValue::Px(2.0));
        assert_eq!(three.bottom, MarginValue::Px(3.0));
    }

    #[test]
    fn test_default_margin_matches_constant() {
        let parsed: RootMargin = DEFAULT_ROOT_MARGIN.parse().unwrap();
        assert_eq!(parsed, TrackerOptions::default().root_margin);
    }

    #[test]
    fn test_root_margin_rejects_garbage() {
        assert!("".parse::<RootMargin>().is_err());
        assert!("10em".parse::<RootMargin>().is_err());
        assert!("1px 2px 3px 4px 5px".parse::<RootMargin>().is_err());
        assert!("abcpx".parse::<RootMargin>().is_err());
    }

    #[test]
    fn test_root_margin_apply_shrinks_bottom() {
        let margin: RootMargin = DEFAULT_ROOT_MARGIN.parse().unwrap();
        let root = margin.apply(&Rect::new(0.0, 0.0, 100.0, 200.0));
        assert_eq!(root.y, 0.0);
        assert_eq!(root.height, 180.0);
        assert_eq!(root.width, 100.0);
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));

        // Touching edges intersect with zero area
        let c = Rect::new(10.0, 0.0, 5.0, 5.0);
        assert_eq!(a.intersection(&c).map(|r| r.area()), Some(0.0));

        let d = Rect::new(20.0, 20.0, 1.0, 1.0);
        assert_eq!(a.intersection(&d), None);
    }

    #[test]
    fn test_threshold_met() {
        let opts = TrackerOptions::default();
        assert!(!opts.is_met(0.1, true));
        assert!(opts.is_met(0.15, true));
        assert!(!opts.is_met(0.5, false));

        let zero = opts.with_threshold(0.0);
        assert!(zero.is_met(0.0, true));
        assert!(!zero.is_met(0.0, false));
    }

    #[test]
    fn test_tracker_options_validate() {
        assert!(TrackerOptions::default().validate().is_ok());
        assert!(TrackerOptions::default().with_threshold(1.5).validate().is_err());
        assert!(TrackerOptions::default().with_threshold(-0.1).validate().is_err());
    }

    #[test]
    fn test_tracker_options_serde_defaults() {
        let opts: TrackerOptions = serde_json::from_str(r#"{"once": false}"#).unwrap();
        assert!(!opts.once);
        assert_eq!(opts.threshold, DEFAULT_THRESHOLD);

        let opts: TrackerOptions =
            serde_json::from_str(r#"{"root_margin": "10px 0px"}"#).unwrap();
        assert_eq!(opts.root_margin.top, MarginValue::Px(10.0));
        assert!(serde_json::from_str::<TrackerOptions>(r#"{"root_margin": "x"}"#).is_err());
    }
}

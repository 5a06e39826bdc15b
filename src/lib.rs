//! # spark-reveal
//!
//! Progressive-disclosure animation engine for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): every
//! observable output (visibility, displayed text, sequence step) is a
//! `Signal` a renderer can bind to.
//!
//! ## Architecture
//!
//! Content appears in three ways, all honoring the reduced-motion preference:
//!
//! ```text
//! VisibilityTracker  ── element scrolled into view ──▶ visible: Signal<bool>
//! Typewriter         ── timer ticks ────────────────▶ displayed: Signal<String>
//! SequencedTypewriter ─ N typewriters, one at a time ▶ step: Signal<usize>
//! ```
//!
//! The environment is reached only through capabilities installed per thread:
//! a [`TimerHost`](state::TimerHost), an
//! [`IntersectionHost`](state::IntersectionHost) and a
//! [`MotionQuery`](state::MotionQuery). [`VirtualClock`](state::VirtualClock)
//! and [`SimulatedViewport`](state::SimulatedViewport) implement the first two
//! deterministically, which is what tests and the terminal host use.
//!
//! ## Modules
//!
//! - [`types`] - Core types (ElementHandle, Rect, RootMargin, TrackerOptions, Segment)
//! - [`state`] - Runtime systems (clock, motion, visibility, typewriter, sequence, actions)
//! - [`page`] - Page scripts and presets
//! - [`renderer`] - Terminal host (crossterm)
//! - [`config`] / [`logging`] - Engine configuration and tracing setup

pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod renderer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Result, RevealError};

pub use config::{EngineConfig, LoggingConfig};

pub use page::{get_preset, preset_names, resolve_script, ActionSpec, ItemSpec, Page, PageScript};

pub use state::{
    // Clock
    install_timer_host, reset_timer_host, TimerHost, TimerId, VirtualClock,
    // Motion
    install_motion_query, on_motion_change, prefers_reduced_motion, reset_motion_state,
    set_reduced_motion, MotionQuery, StaticMotionQuery,
    // Visibility
    install_intersection_host, reset_intersection_host, use_in_view, IntersectionEntry,
    IntersectionHost, SimulatedViewport, VisibilityTracker,
    // Typewriter
    Typewriter, TypewriterProps, DEFAULT_SPEED_MS,
    // Sequence
    SegmentView, SequenceOptions, SequencedTypewriter, StepSequencer,
    // Actions
    ActionControl, Activation, ControlKind, Navigator, Notice, Notifier,
};

// Re-export spark-signals for convenience
pub use spark_signals::{signal, Signal};

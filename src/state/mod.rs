//! State Module - Runtime systems of the reveal engine
//!
//! - **Clock** - Timer capability and the deterministic virtual clock
//! - **Motion** - Reduced-motion preference and its host query
//! - **Visibility** - Viewport trackers and the intersection capability
//! - **Viewport** - Geometry-backed intersection host
//! - **Typewriter** - Single-segment incremental reveal
//! - **Sequence** - Step counter and sequenced typewriters
//! - **Action** - Controls gated on sequence completion
//!
//! Everything here is single-threaded: state lives in `thread_local!`
//! registries and `Rc` handles, and time only moves when the host advances it.

pub mod action;
pub mod clock;
pub mod motion;
pub mod sequence;
pub mod typewriter;
pub mod viewport;
pub mod visibility;

pub use action::{
    ActionControl, Activation, ControlKind, Navigator, Notice, Notifier, RecordingHost,
    DEFAULT_NOTICE_DURATION_MS,
};
pub use clock::{
    has_timer_host, install_timer_host, reset_timer_host, timer_host, TimerCallback, TimerHost,
    TimerId, VirtualClock,
};
pub use motion::{
    install_motion_query, on_motion_change, prefers_reduced_motion, reduced_motion_signal,
    reset_motion_state, set_reduced_motion, MotionQuery, StaticMotionQuery,
};
pub use sequence::{SegmentView, SequenceOptions, SequencedTypewriter, StepSequencer};
pub use typewriter::{reveal_len, CompleteCallback, Typewriter, TypewriterProps, DEFAULT_SPEED_MS};
pub use viewport::SimulatedViewport;
pub use visibility::{
    install_intersection_host, intersection_host, reset_intersection_host, use_in_view,
    IntersectionCallback, IntersectionEntry, IntersectionHost, ObservationId, VisibilityTracker,
};

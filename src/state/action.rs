//! Actions - the interactive controls that follow a sequence
//!
//! Navigation and notifications are host concerns; this module only decides
//! *whether* a control may act and *what* it asks the host to do.
//!
//! - `Navigate` controls stay blocked until their readiness getter says yes
//!   (typically [`SequencedTypewriter::cta_getter`]), then ask the
//!   [`Navigator`] to go to their route.
//! - `ComingSoon` controls always notify through the [`Notifier`] and never
//!   perform a default action.
//!
//! [`SequencedTypewriter::cta_getter`]: crate::state::sequence::SequencedTypewriter::cta_getter

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Default on-screen duration of a notice.
pub const DEFAULT_NOTICE_DURATION_MS: u64 = 3500;

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Host routing.
pub trait Navigator {
    fn navigate(&self, route: &str);
}

/// Host toast/notification presentation.
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

/// A short message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_notice_duration")]
    pub duration_ms: u64,
}

fn default_notice_duration() -> u64 {
    DEFAULT_NOTICE_DURATION_MS
}

impl Notice {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            duration_ms: DEFAULT_NOTICE_DURATION_MS,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Records routes and notices instead of acting on them.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub routes: RefCell<Vec<String>>,
    pub notices: RefCell<Vec<Notice>>,
}

impl Navigator for RecordingHost {
    fn navigate(&self, route: &str) {
        self.routes.borrow_mut().push(route.to_string());
    }
}

impl Notifier for RecordingHost {
    fn notify(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}

// =============================================================================
// ACTION CONTROL
// =============================================================================

/// What a control does when used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Navigate { route: String },
    ComingSoon { notice: Notice },
}

/// Result of activating a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Navigation was requested.
    Proceeded { route: String },
    /// Control is not actionable yet; nothing happened.
    Blocked,
    /// A notice was shown; the default action was suppressed.
    Notified,
}

/// A button-like control gated on readiness.
pub struct ActionControl {
    label: String,
    kind: ControlKind,
    ready: Rc<dyn Fn() -> bool>,
}

impl ActionControl {
    /// Control that is always actionable.
    pub fn new(label: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            label: label.into(),
            kind,
            ready: Rc::new(|| true),
        }
    }

    /// Gate the control on a readiness getter.
    pub fn when(mut self, ready: Rc<dyn Fn() -> bool>) -> Self {
        self.ready = ready;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    /// Whether activating would do something other than `Blocked`.
    pub fn is_actionable(&self) -> bool {
        match self.kind {
            ControlKind::ComingSoon { .. } => true,
            ControlKind::Navigate { .. } => (self.ready)(),
        }
    }

    pub fn activate(&self, navigator: &dyn Navigator, notifier: &dyn Notifier) -> Activation {
        match &self.kind {
            ControlKind::ComingSoon { notice } => {
                tracing::debug!(label = %self.label, "coming-soon control used, notifying");
                notifier.notify(notice);
                Activation::Notified
            }
            ControlKind::Navigate { route } => {
                if !(self.ready)() {
                    tracing::debug!(label = %self.label, "control not ready, ignoring activation");
                    return Activation::Blocked;
                }
                navigator.navigate(route);
                Activation::Proceeded {
                    route: route.clone(),
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

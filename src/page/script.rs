//! Page scripts - a page variant described as data.
//!
//! ```json
//! {
//!   "slug": "intro",
//!   "title": "You chose: Domestic Violence Restraining Order",
//!   "segments": ["First sentence.", { "text": "Slower one.", "speed_ms": 40 }],
//!   "items": [{ "title": "Collect your core details safely." }],
//!   "actions": [{ "kind": "navigate", "label": "I understand", "route": "/intake" }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevealError};
use crate::state::action::{ActionControl, ControlKind, Notice};
use crate::state::sequence::{SequenceOptions, SequencedTypewriter};
use crate::state::typewriter::DEFAULT_SPEED_MS;
use crate::types::{Segment, TrackerOptions};

// =============================================================================
// Script types
// =============================================================================

/// A text segment as written in a script: a bare string or a full segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentSpec {
    Text(String),
    Full(Segment),
}

impl From<SegmentSpec> for Segment {
    fn from(spec: SegmentSpec) -> Self {
        match spec {
            SegmentSpec::Text(text) => Segment::new(text),
            SegmentSpec::Full(segment) => segment,
        }
    }
}

impl From<&str> for SegmentSpec {
    fn from(text: &str) -> Self {
        SegmentSpec::Text(text.to_string())
    }
}

/// A card or checklist row revealed when scrolled into view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ItemSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// An interactive control shown after the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Route to `route`, by default only once the sequence has finished.
    Navigate {
        label: String,
        route: String,
        #[serde(default = "default_true")]
        after_sequence: bool,
    },
    /// Feature not available yet; shows a notice instead.
    ComingSoon {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notice: Option<Notice>,
    },
}

fn default_true() -> bool {
    true
}

fn default_speed() -> u64 {
    DEFAULT_SPEED_MS
}

impl ActionSpec {
    pub fn label(&self) -> &str {
        match self {
            ActionSpec::Navigate { label, .. } | ActionSpec::ComingSoon { label, .. } => label,
        }
    }
}

/// A complete page variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageScript {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub segments: Vec<SegmentSpec>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    /// Milliseconds per character for segments without their own speed
    #[serde(default = "default_speed")]
    pub speed_ms: u64,
    /// Tracker options for items (and the text block when gated)
    #[serde(default)]
    pub reveal: TrackerOptions,
    /// Hold the text until its block scrolls into view
    #[serde(default)]
    pub gate_on_view: bool,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

// =============================================================================
// Loading
// =============================================================================

impl PageScript {
    pub fn from_json(content: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RevealError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slug.trim().is_empty() {
            return Err(RevealError::invalid_script("slug must not be empty"));
        }
        if self.speed_ms == 0 {
            return Err(RevealError::invalid_script("speed_ms must be positive"));
        }
        self.reveal.validate()?;

        for (k, spec) in self.segments.iter().enumerate() {
            if let SegmentSpec::Full(Segment {
                speed_ms: Some(0), ..
            }) = spec
            {
                return Err(RevealError::invalid_script(format!(
                    "segment {k}: speed_ms must be positive"
                )));
            }
        }

        for action in &self.actions {
            if action.label().trim().is_empty() {
                return Err(RevealError::invalid_script("action label must not be empty"));
            }
            if let ActionSpec::Navigate { route, .. } = action {
                if route.trim().is_empty() {
                    return Err(RevealError::invalid_script(format!(
                        "action {:?}: route must not be empty",
                        action.label()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Override the default speed.
    pub fn with_speed(mut self, speed_ms: u64) -> Self {
        self.speed_ms = speed_ms.max(1);
        self
    }

    pub fn segment_list(&self) -> Vec<Segment> {
        self.segments.iter().cloned().map(Segment::from).collect()
    }

    /// Build the sequenced typewriter for this page's text.
    pub fn build_sequence(&self) -> SequencedTypewriter {
        SequencedTypewriter::new(
            self.segment_list(),
            SequenceOptions {
                speed_ms: self.speed_ms,
                ..Default::default()
            },
        )
    }

    /// Build the page's controls, gating navigation on `sequence`.
    pub fn build_actions(&self, sequence: &SequencedTypewriter) -> Vec<ActionControl> {
        self.actions
            .iter()
            .map(|spec| match spec {
                ActionSpec::Navigate {
                    label,
                    route,
                    after_sequence,
                } => {
                    let control = ActionControl::new(
                        label.clone(),
                        ControlKind::Navigate {
                            route: route.clone(),
                        },
                    );
                    if *after_sequence {
                        control.when(sequence.cta_getter())
                    } else {
                        control
                    }
                }
                ActionSpec::ComingSoon { label, notice } => {
                    let notice = notice.clone().unwrap_or_else(|| {
                        Notice::new("Coming soon")
                            .with_description(format!("{label} is not available yet."))
                    });
                    ActionControl::new(label.clone(), ControlKind::ComingSoon { notice })
                }
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Page Module - Scripted pages and their live state
//!
//! A [`PageScript`] describes a page as data. A [`Page`] is the script brought
//! to life: one [`SequencedTypewriter`] for the text, one
//! [`VisibilityTracker`] per item, and the page's [`ActionControl`]s.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::page::{resolve_script, Page};
//!
//! let page = Page::new(resolve_script("intro")?)?;
//! page.attach_item(0, viewport.add_element(row_rect));
//!
//! clock.advance(5_000);
//! assert!(page.sequence().cta_actionable());
//! ```

mod presets;
mod script;

pub use presets::{features, get_preset, intro, preset_names};
pub use script::{ActionSpec, ItemSpec, PageScript, SegmentSpec};

use std::path::Path;

use crate::error::{Result, RevealError};
use crate::state::action::ActionControl;
use crate::state::sequence::SequencedTypewriter;
use crate::state::visibility::VisibilityTracker;
use crate::types::ElementHandle;

/// Resolve a preset name or a path to a JSON script.
///
/// Existing files win over presets of the same name.
pub fn resolve_script(name_or_path: &str) -> Result<PageScript> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        return PageScript::load(path);
    }
    get_preset(name_or_path).ok_or_else(|| RevealError::UnknownPreset(name_or_path.to_string()))
}

// =============================================================================
// PAGE
// =============================================================================

/// One item of a page with its own reveal tracker.
pub struct PageItem {
    pub spec: ItemSpec,
    tracker: VisibilityTracker,
}

impl PageItem {
    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    pub fn is_visible(&self) -> bool {
        self.tracker.is_visible()
    }
}

/// A page script with live state.
pub struct Page {
    script: PageScript,
    sequence: SequencedTypewriter,
    hero: VisibilityTracker,
    items: Vec<PageItem>,
    actions: Vec<ActionControl>,
}

impl Page {
    /// Build live state for `script`. Timers start right away unless the script
    /// gates its text on view.
    pub fn new(script: PageScript) -> Result<Self> {
        script.validate()?;

        let hero = VisibilityTracker::new(script.reveal);
        let sequence = script.build_sequence();
        if script.gate_on_view {
            sequence.gate_on(&hero);
        }

        let items = script
            .items
            .iter()
            .map(|spec| PageItem {
                spec: spec.clone(),
                tracker: VisibilityTracker::new(script.reveal),
            })
            .collect();
        let actions = script.build_actions(&sequence);

        tracing::debug!(
            slug = %script.slug,
            segments = sequence.segment_count(),
            items = script.items.len(),
            "page created"
        );

        Ok(Self {
            script,
            sequence,
            hero,
            items,
            actions,
        })
    }

    pub fn script(&self) -> &PageScript {
        &self.script
    }

    pub fn title(&self) -> &str {
        &self.script.title
    }

    pub fn sequence(&self) -> &SequencedTypewriter {
        &self.sequence
    }

    pub fn items(&self) -> &[PageItem] {
        &self.items
    }

    pub fn actions(&self) -> &[ActionControl] {
        &self.actions
    }

    /// Tracker on the text block. Opens the sequence gate when the script
    /// gates on view.
    pub fn hero(&self) -> &VisibilityTracker {
        &self.hero
    }

    /// Bind the text block to a host element.
    pub fn attach_hero(&self, element: ElementHandle) {
        self.hero.attach(element);
    }

    /// Bind item `k` to a host element. Out-of-range indices are ignored.
    pub fn attach_item(&self, k: usize, element: ElementHandle) {
        match self.items.get(k) {
            Some(item) => item.tracker.attach(element),
            None => tracing::debug!(item = k, "attach_item: no such item"),
        }
    }

    /// Whether the page's text is done and its controls are ready.
    pub fn is_settled(&self) -> bool {
        self.sequence.cta_actionable()
    }

    /// Stop every timer and observation.
    pub fn dispose(&self) {
        self.sequence.dispose();
        self.hero.dispose();
        for item in &self.items {
            item.tracker.dispose();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

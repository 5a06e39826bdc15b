//! Bundled page presets.
//!
//! - intro (typed welcome, checklist, "I understand" to `/intake`)
//! - features (feature cards revealed on scroll, coming-soon buttons)

use super::script::{ActionSpec, ItemSpec, PageScript, SegmentSpec};
use crate::state::action::Notice;
use crate::state::typewriter::DEFAULT_SPEED_MS;
use crate::types::TrackerOptions;

// =============================================================================
// Intro
// =============================================================================

/// Case introduction: the guide introduces itself, then the plan, then the
/// call to action unlocks.
pub fn intro() -> PageScript {
    PageScript {
        slug: "intro".to_string(),
        title: "You chose: Domestic Violence Restraining Order".to_string(),
        description: None,
        segments: vec![
            SegmentSpec::from("I’m Jura. I’ll walk with you through this — calmly and step by step."),
            SegmentSpec::from(
                "I’ll ask you several questions to understand where you are now, \
                 and where you may need to go based on your situation.",
            ),
        ],
        items: vec![
            ItemSpec::new("Collect your core details safely (you control the pace)."),
            ItemSpec::new("Draft your court forms (DV-100 and a short declaration)."),
            ItemSpec::new("Review for clarity, accuracy, and safety-first language."),
            ItemSpec::new("Guide filing and service of process, with local court tips."),
            ItemSpec::new("Prepare you for next steps and hearing day, if needed."),
        ],
        speed_ms: DEFAULT_SPEED_MS,
        reveal: TrackerOptions::default(),
        gate_on_view: false,
        actions: vec![ActionSpec::Navigate {
            label: "I understand".to_string(),
            route: "/intake".to_string(),
            after_sequence: true,
        }],
    }
}

// =============================================================================
// Features
// =============================================================================

/// Feature overview: the subtitle types once the header is in view and each
/// card fades in as it scrolls past the bottom tenth of the screen.
pub fn features() -> PageScript {
    let card = |title: &str, body: &str| ItemSpec::new(title).with_body(body);

    PageScript {
        slug: "features".to_string(),
        title: "All features in 1 tool".to_string(),
        description: None,
        segments: vec![SegmentSpec::from(
            "Discover features that simplify workflows & grow your business.",
        )],
        items: vec![
            card(
                "Cutting-Edge AI",
                "Deploy AI solutions that adapt quickly, learn fast, and scale with your needs.",
            ),
            card(
                "Automated Workflows",
                "Streamline tasks and boost efficiency with scalable AI-powered automation.",
            ),
            card(
                "Insightful Analytics",
                "Gain deep, real-time insights to guide smarter strategies and growth.",
            ),
            card(
                "AI-Powered Support",
                "Enhance customer experience with always-on virtual assistants.",
            ),
            card(
                "Security & Compliance",
                "Keep data protected and meet regulatory standards with built-in safeguards.",
            ),
        ],
        speed_ms: DEFAULT_SPEED_MS,
        reveal: TrackerOptions::default(),
        gate_on_view: true,
        actions: vec![
            ActionSpec::ComingSoon {
                label: "Get Started".to_string(),
                notice: Some(
                    Notice::new("Coming soon")
                        .with_description("Sign-up opens shortly. Thanks for your patience."),
                ),
            },
            ActionSpec::ComingSoon {
                label: "See Our Services".to_string(),
                notice: None,
            },
        ],
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// Get a preset page by name (case-insensitive).
pub fn get_preset(name: &str) -> Option<PageScript> {
    match name.trim().to_lowercase().as_str() {
        "intro" => Some(intro()),
        "features" => Some(features()),
        _ => None,
    }
}

/// List all available preset names.
pub fn preset_names() -> &'static [&'static str] {
    &["intro", "features"]
}

// =============================================================================
// Tests
// =============================================================================

//! Engine configuration.
//!
//! Loaded from JSON, every field optional. Environment variables override the
//! file so a terminal user can ask for reduced motion without editing it:
//!
//! - `SPARK_REDUCED_MOTION` - `1`/`true`/`yes`/`on`/`reduce` or `0`/`false`/`no`/`off`
//! - `SPARK_REVEAL_SPEED_MS` - milliseconds per character

use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevealError};
use crate::state::motion::{MotionQuery, StaticMotionQuery};
use crate::state::typewriter::DEFAULT_SPEED_MS;
use crate::types::TrackerOptions;

pub const ENV_REDUCED_MOTION: &str = "SPARK_REDUCED_MOTION";
pub const ENV_SPEED_MS: &str = "SPARK_REVEAL_SPEED_MS";

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default typewriter speed in milliseconds per character.
    pub speed_ms: u64,

    /// Default visibility tracker options.
    pub tracker: TrackerOptions,

    /// Forced reduced-motion preference. `None` leaves it to the host query.
    pub reduced_motion: Option<bool>,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "spark_reveal=debug,warn").
    pub level: String,

    /// Colorize output.
    pub ansi: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed_ms: DEFAULT_SPEED_MS,
            tracker: TrackerOptions::default(),
            reduced_motion: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            ansi: true,
        }
    }
}

impl EngineConfig {
    /// Load config from a JSON file.
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

    /// Load config from a file if given, otherwise defaults. Unreadable files
    /// are logged and ignored.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                tracing::warn!("Failed to load config: {}", e);
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        if self.speed_ms == 0 {
            return Err(RevealError::invalid_script("speed_ms must be positive"));
        }
        Ok(())
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_REDUCED_MOTION) {
            match parse_flag(&raw) {
                Some(value) => self.reduced_motion = Some(value),
                None => tracing::warn!("Ignoring {}={:?}: not a boolean", ENV_REDUCED_MOTION, raw),
            }
        }

        if let Some(raw) = lookup(ENV_SPEED_MS) {
            match raw.trim().parse::<u64>() {
                Ok(speed) if speed > 0 => self.speed_ms = speed,
                _ => tracing::warn!("Ignoring {}={:?}: not a positive integer", ENV_SPEED_MS, raw),
            }
        }

        self
    }

    /// Motion query for a forced preference, if one is configured.
    pub fn motion_query(&self) -> Option<Rc<dyn MotionQuery>> {
        self.reduced_motion
            .map(|reduced| Rc::new(StaticMotionQuery(reduced)) as Rc<dyn MotionQuery>)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "reduce" => Some(true),
        "0" | "false" | "no" | "off" | "no-preference" => Some(false),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.speed_ms, 22);
        assert_eq!(config.tracker, TrackerOptions::default());
        assert!(config.motion_query().is_none());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"speed_ms": 40, "tracker": {"once": false}}"#)
            .unwrap();
        assert_eq!(config.speed_ms, 40);
        assert!(!config.tracker.once);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_json(r#"{"speed_ms": 0}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"tracker": {"threshold": 2.0}}"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::default().with_overrides_from(|key| match key {
            ENV_REDUCED_MOTION => Some("reduce".into()),
            ENV_SPEED_MS => Some("15".into()),
            _ => None,
        });
        assert_eq!(config.reduced_motion, Some(true));
        assert_eq!(config.speed_ms, 15);
        assert!(config.motion_query().is_some_and(|q| q.matches()));
    }

    #[test]
    fn test_bad_env_values_ignored() {
        let config = EngineConfig::default().with_overrides_from(|key| match key {
            ENV_REDUCED_MOTION => Some("maybe".into()),
            ENV_SPEED_MS => Some("0".into()),
            _ => None,
        });
        assert_eq!(config.reduced_motion, None);
        assert_eq!(config.speed_ms, DEFAULT_SPEED_MS);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RevealError::FileNotFound { .. }));
        assert_eq!(
            EngineConfig::load_or_default(Some(Path::new("/definitely/not/here.json"))),
            EngineConfig::default()
        );
    }
}

//! Error types for spark-reveal.
//!
//! Only setup operations are fallible (parsing options, loading page scripts
//! and configs, terminal I/O). Runtime components never surface errors: a
//! missing capability degrades to a safe default and is logged instead.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum RevealError {
    #[error("invalid root margin {input:?}: {reason}")]
    InvalidRootMargin { input: String, reason: String },

    #[error("threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f32),

    #[error("invalid page script: {message}")]
    InvalidScript { message: String },

    #[error("unknown page preset: {0}")]
    UnknownPreset(String),

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using RevealError.
pub type Result<T> = std::result::Result<T, RevealError>;

impl RevealError {
    pub fn invalid_script(msg: impl Into<String>) -> Self {
        Self::InvalidScript {
            message: msg.into(),
        }
    }

    pub(crate) fn invalid_margin(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRootMargin {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

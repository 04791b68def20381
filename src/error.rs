//! Error types for the extraction pipeline
//!
//! Each stage reports its own error type. The orchestrator wraps whichever
//! one halted the run in a [`PipelineError`] tagged with the failing
//! [`Stage`], so callers can tell an acquisition problem (bytes that could
//! not be decoded) from an extraction problem (no content, unsanitizable
//! markup).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to clean an HTML fragment.
///
/// Distinct from the successful "cleaned to nothing" outcome, which is an
/// empty `Ok` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizationError {
    /// The fragment is not blank but produced no nodes inside the document
    /// (for example a lone comment or doctype).
    #[error("fragment could not be parsed into a document tree: {0}")]
    Unparseable(String),
    /// The fragment nests elements deeper than the policy allows.
    #[error("HTML nesting depth {depth} exceeds maximum allowed depth {max}")]
    TooDeep { depth: usize, max: usize },
}

/// Failure to turn raw input bytes into a UTF-8 document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported charset '{0}' for HTML parsing")]
    UnsupportedCharset(String),
    #[error("invalid byte sequence for charset '{charset}'{}", .position.map(|p| format!(" at byte position {p}")).unwrap_or_default())]
    InvalidBytes {
        charset: String,
        position: Option<usize>,
    },
}

/// Pipeline stage that can halt a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Byte input decoding, before any HTML is looked at.
    Decode,
    /// Main-content localization.
    Locate,
    /// Noise removal.
    Sanitize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Locate => "locate",
            Stage::Sanitize => "sanitize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cause carried by a [`PipelineError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Neither a selector rule nor the `body` fallback produced a region.
    #[error("no content region found")]
    NoContentFound,
    #[error(transparent)]
    Sanitization(#[from] SanitizationError),
}

/// Stage-attributed failure returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} stage failed: {cause}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub cause: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, cause: impl Into<StageError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    /// Get a stable numeric code for the failure, used as the CLI exit status
    pub fn code(&self) -> u8 {
        match self.cause {
            StageError::Decode(_) => 2,
            StageError::NoContentFound => 3,
            StageError::Sanitization(_) => 4,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self.cause, StageError::NoContentFound)
    }
}

/// Invalid pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        selector: String,
        reason: &'static str,
    },
    #[error("heading marker for level {level} must not be empty")]
    InvalidHeadingMarker { level: usize },
    #[error("bullet set must contain at least one character")]
    EmptyBullets,
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

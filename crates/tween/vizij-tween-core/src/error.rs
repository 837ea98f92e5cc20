//! Error types for the tween core

use serde::{Deserialize, Serialize};

use crate::ids::TweenId;

/// Errors raised while building or registering tweens.
///
/// Playback control (`pause`, `resume`, `stop`, `destroy`, callback
/// registration) never fails; out-of-order calls degrade to no-ops.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TweenError {
    /// A configuration field is out of range
    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Time scale must be finite and non-negative
    #[error("Invalid time scale: {value}")]
    InvalidTimeScale { value: f64 },

    /// Loop count must be -1 (infinite) or greater
    #[error("Invalid loop count: {value} (expected -1 or greater)")]
    InvalidLoopCount { value: i32 },

    /// No tween with that id is registered
    #[error("Tween not found: {id}")]
    TweenNotFound { id: TweenId },

    /// A tween with that id is already registered
    #[error("Tween already registered: {id}")]
    DuplicateTween { id: TweenId },

    /// The tween was destroyed and cannot be reused
    #[error("Tween destroyed: {id}")]
    Destroyed { id: TweenId },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl TweenError {
    /// Shorthand for [`TweenError::InvalidConfig`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidTimeScale { .. }
            | Self::InvalidLoopCount { .. } => "config",
            Self::TweenNotFound { .. } | Self::DuplicateTween { .. } => "registry",
            Self::Destroyed { .. } => "lifecycle",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for TweenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

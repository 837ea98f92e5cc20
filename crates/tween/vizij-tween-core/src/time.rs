//! Time units and delta scaling.

use serde::{Deserialize, Serialize};

/// How a tween measures time.
///
/// Durations and delays on a tween are expressed in the same unit: milliseconds
/// for [`TimeUnits::Millis`], ticks for [`TimeUnits::Frames`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnits {
    #[default]
    Millis,
    Frames,
}

impl TimeUnits {
    #[inline]
    pub fn from_use_frames(use_frames: bool) -> Self {
        if use_frames {
            Self::Frames
        } else {
            Self::Millis
        }
    }

    #[inline]
    pub fn is_frames(&self) -> bool {
        matches!(self, Self::Frames)
    }

    /// Convert one tick's raw delta into the amount applied to counters.
    /// Frame-based tweens count every tick as a single frame.
    #[inline]
    pub fn scaled_delta(&self, delta_ms: f64, time_scale: f64) -> f64 {
        let raw = match self {
            Self::Millis => delta_ms,
            Self::Frames => 1.0,
        };
        let scaled = raw * time_scale;
        if scaled.is_finite() && scaled > 0.0 {
            scaled
        } else {
            0.0
        }
    }
}

/// Ratio `num / den` clamped into [0, 1].
///
/// An infinite denominator never progresses; an empty one is trivially done.
#[inline]
pub(crate) fn unit_ratio(num: f64, den: f64) -> f64 {
    if den.is_infinite() {
        0.0
    } else if den <= 0.0 {
        1.0
    } else {
        (num / den).clamp(0.0, 1.0)
    }
}

//! Configuration for tweens, tracks and the manager.
//!
//! All structs deserialize from JSON with every field optional, so a fixture
//! only needs to spell out what differs from the defaults.

use serde::{Deserialize, Serialize};

use crate::error::TweenError;

/// Loop count meaning "loop forever".
pub const INFINITE: i32 = -1;

fn check_non_negative(field: &str, value: f64) -> Result<(), TweenError> {
    if !value.is_finite() {
        return Err(TweenError::invalid(field, "must be finite"));
    }
    if value < 0.0 {
        return Err(TweenError::invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

/// Declarative description of one tween.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    /// Extra playthroughs after the first; `-1` loops forever.
    #[serde(alias = "loop")]
    pub loop_count: i32,
    /// Countdown between playthroughs.
    pub loop_delay: f64,
    /// Countdown after the final playthrough before `onComplete`.
    pub complete_delay: f64,
    /// Countdown between activation and `onStart`.
    pub delay: f64,
    pub time_scale: f64,
    /// Count ticks instead of milliseconds.
    pub use_frames: bool,
    /// Keep the tween registered after it finishes.
    pub persist: bool,
    /// Start in the paused state.
    pub paused: bool,
    pub tracks: Vec<PropertyTrackConfig>,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            loop_count: 0,
            loop_delay: 0.0,
            complete_delay: 0.0,
            delay: 0.0,
            time_scale: 1.0,
            use_frames: false,
            persist: false,
            paused: false,
            tracks: Vec::new(),
        }
    }
}

impl TweenConfig {
    pub fn from_json(raw: &str) -> Result<Self, TweenError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TweenError> {
        if self.loop_count < INFINITE {
            return Err(TweenError::InvalidLoopCount {
                value: self.loop_count,
            });
        }
        check_non_negative("loop_delay", self.loop_delay)?;
        check_non_negative("complete_delay", self.complete_delay)?;
        check_non_negative("delay", self.delay)?;
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(TweenError::InvalidTimeScale {
                value: self.time_scale,
            });
        }
        for track in &self.tracks {
            track.validate()?;
        }
        Ok(())
    }

    pub fn with_track(mut self, track: PropertyTrackConfig) -> Self {
        self.tracks.push(track);
        self
    }
}

/// Declarative description of one [`crate::PropertyTrack`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyTrackConfig {
    pub key: String,
    pub from: f64,
    pub to: f64,
    pub duration: f64,
    pub delay: f64,
    pub hold: f64,
    /// Track-level repeats; `-1` repeats forever.
    pub repeat: i32,
    pub repeat_delay: f64,
    pub yoyo: bool,
}

impl Default for PropertyTrackConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            from: 0.0,
            to: 1.0,
            duration: 1000.0,
            delay: 0.0,
            hold: 0.0,
            repeat: 0,
            repeat_delay: 0.0,
            yoyo: false,
        }
    }
}

impl PropertyTrackConfig {
    pub fn new(key: impl Into<String>, from: f64, to: f64, duration: f64) -> Self {
        Self {
            key: key.into(),
            from,
            to,
            duration,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TweenError> {
        if self.key.is_empty() {
            return Err(TweenError::invalid("tracks.key", "must not be empty"));
        }
        check_non_negative("tracks.duration", self.duration)?;
        check_non_negative("tracks.delay", self.delay)?;
        check_non_negative("tracks.hold", self.hold)?;
        check_non_negative("tracks.repeat_delay", self.repeat_delay)?;
        if self.repeat < INFINITE {
            return Err(TweenError::invalid(
                "tracks.repeat",
                format!("must be -1 or greater, got {}", self.repeat),
            ));
        }
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(TweenError::invalid("tracks.from/to", "must be finite"));
        }
        Ok(())
    }
}

/// Manager-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Scale applied to every tick before tweens see it.
    pub time_scale: f64,
    /// Deltas above this are treated as a stall; `0` disables lag smoothing.
    pub lag_threshold_ms: f64,
    /// Delta substituted for a stalled tick.
    pub lag_skip_ms: f64,
    /// Initial capacity of each registered tween's track signal buffer.
    pub max_signals_per_tick: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            lag_threshold_ms: 500.0,
            lag_skip_ms: 33.0,
            max_signals_per_tick: 64,
        }
    }
}

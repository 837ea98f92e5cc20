//! Playable tracks: the per-property units a tween drives.
//!
//! The tween owns the clock; a track only turns "time since my playthrough
//! began" into a value and reports the boundaries it crossed.

use serde::{Deserialize, Serialize};

use crate::config::PropertyTrackConfig;
use crate::error::TweenError;
use crate::event::TweenEvent;

/// Track-originated signals, a subset of [`TweenEvent`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackEvent {
    Update,
    Repeat,
    Yoyo,
}

impl From<TrackEvent> for TweenEvent {
    fn from(ev: TrackEvent) -> Self {
        match ev {
            TrackEvent::Update => TweenEvent::OnUpdate,
            TrackEvent::Repeat => TweenEvent::OnRepeat,
            TrackEvent::Yoyo => TweenEvent::OnYoyo,
        }
    }
}

/// One signal produced by a track during an update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSignal {
    pub event: TrackEvent,
    pub key: String,
    pub value: f64,
}

/// Uniform interface the tween uses to drive property animation.
pub trait PlayableTrack {
    /// Property key this track animates.
    fn key(&self) -> &str;

    /// Length of one full playthrough of this track, including its own delay,
    /// hold and repeats. May be infinite.
    fn duration(&self) -> f64;

    /// Rewind to the beginning of the playthrough.
    fn reset(&mut self);

    /// Advance by `delta` and append any crossed boundaries to `signals`.
    /// Returns `true` while the track still has time left.
    fn update(&mut self, delta: f64, signals: &mut Vec<TrackSignal>) -> bool;

    /// Current property value.
    fn value(&self) -> f64;
}

pub type EaseFn = fn(f64) -> f64;

#[inline]
pub fn linear(t: f64) -> f64 {
    t
}

/// Scalar from/to track with delay, hold, repeat and yoyo.
#[derive(Clone, Debug)]
pub struct PropertyTrack {
    key: String,
    from: f64,
    to: f64,
    duration: f64,
    delay: f64,
    hold: f64,
    repeat: i32,
    repeat_delay: f64,
    yoyo: bool,
    ease: EaseFn,
    time: f64,
    value: f64,
}

impl PropertyTrack {
    pub fn new(key: impl Into<String>, from: f64, to: f64, duration: f64) -> Self {
        Self {
            key: key.into(),
            from,
            to,
            duration: duration.max(0.0),
            delay: 0.0,
            hold: 0.0,
            repeat: 0,
            repeat_delay: 0.0,
            yoyo: false,
            ease: linear,
            time: 0.0,
            value: from,
        }
    }

    pub fn from_config(cfg: &PropertyTrackConfig) -> Result<Self, TweenError> {
        cfg.validate()?;
        Ok(Self::new(cfg.key.clone(), cfg.from, cfg.to, cfg.duration)
            .with_delay(cfg.delay)
            .with_hold(cfg.hold)
            .with_repeat(cfg.repeat, cfg.repeat_delay)
            .with_yoyo(cfg.yoyo))
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Time spent at the end value before a yoyo runs back.
    pub fn with_hold(mut self, hold: f64) -> Self {
        self.hold = hold.max(0.0);
        self
    }

    /// `-1` repeats forever.
    pub fn with_repeat(mut self, repeat: i32, repeat_delay: f64) -> Self {
        self.repeat = repeat.max(-1);
        self.repeat_delay = repeat_delay.max(0.0);
        self
    }

    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn with_ease(mut self, ease: EaseFn) -> Self {
        self.ease = ease;
        self
    }

    /// Local time since the last reset.
    pub fn time(&self) -> f64 {
        self.time
    }

    fn cycle_len(&self) -> f64 {
        if self.yoyo {
            2.0 * self.duration + self.hold
        } else {
            self.duration
        }
    }

    /// A cycle plus the gap that follows it.
    fn span(&self) -> f64 {
        self.cycle_len() + self.repeat_delay
    }

    fn lerp(&self, t: f64) -> f64 {
        let e = (self.ease)(t.clamp(0.0, 1.0));
        self.from + (self.to - self.from) * e
    }

    fn end_value(&self) -> f64 {
        if self.yoyo {
            self.from
        } else {
            self.to
        }
    }

    fn value_in_cycle(&self, w: f64) -> f64 {
        let d = self.duration;
        if w < d {
            return self.lerp(w / d);
        }
        if !self.yoyo || w < d + self.hold {
            return self.to;
        }
        let back = w - d - self.hold;
        if back < d {
            self.lerp(1.0 - back / d)
        } else {
            self.from
        }
    }

    fn sample(&self, t: f64) -> f64 {
        if t < self.delay {
            return self.from;
        }
        let total = self.duration();
        if total.is_finite() && t >= total {
            return self.end_value();
        }
        let u = t - self.delay;
        let span = self.span();
        let within = if span > 0.0 {
            u - (u / span).floor() * span
        } else {
            u
        };
        self.value_in_cycle(within)
    }

    fn cycle_limit(&self) -> Option<u64> {
        (self.repeat >= 0).then(|| self.repeat as u64 + 1)
    }

    /// Repeat and yoyo boundaries in `(t0, t1]`, in time order. Only the
    /// latest boundary of each kind is reported, so a single step emits at
    /// most one `Repeat` and one `Yoyo`.
    fn boundaries(&self, t0: f64, t1: f64) -> Vec<(f64, TrackEvent)> {
        let mut out = Vec::new();
        let span = self.span();
        if span <= 0.0 || t1 < self.delay {
            return out;
        }
        let mut last = ((t1 - self.delay) / span).floor().max(0.0) as u64;
        if let Some(limit) = self.cycle_limit() {
            last = last.min(limit.saturating_sub(1));
        }

        let mut repeat: Option<f64> = None;
        let mut turn: Option<f64> = None;
        // Neighbouring cycles absorb rounding in the floor above.
        for k in last.saturating_sub(1)..=last + 1 {
            if self.cycle_limit().is_some_and(|limit| k >= limit) {
                break;
            }
            let cycle_start = self.delay + k as f64 * span;
            if cycle_start > t1 {
                break;
            }
            if k > 0 && cycle_start > t0 {
                repeat = Some(cycle_start);
            }
            if self.yoyo {
                let at = cycle_start + self.duration + self.hold;
                if at > t0 && at <= t1 {
                    turn = Some(at);
                }
            }
        }

        out.extend(repeat.map(|at| (at, TrackEvent::Repeat)));
        out.extend(turn.map(|at| (at, TrackEvent::Yoyo)));
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }
}

impl PlayableTrack for PropertyTrack {
    fn key(&self) -> &str {
        &self.key
    }

    fn duration(&self) -> f64 {
        match self.cycle_limit() {
            None => f64::INFINITY,
            Some(cycles) => {
                self.delay
                    + cycles as f64 * self.cycle_len()
                    + (cycles - 1) as f64 * self.repeat_delay
            }
        }
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.value = self.from;
    }

    fn update(&mut self, delta: f64, signals: &mut Vec<TrackSignal>) -> bool {
        let total = self.duration();
        let t0 = self.time;
        let t1 = (t0 + delta.max(0.0)).min(total);
        self.time = t1;

        for (at, event) in self.boundaries(t0, t1) {
            signals.push(TrackSignal {
                event,
                key: self.key.clone(),
                value: self.sample(at),
            });
        }

        let was_live = t0 < total;
        self.value = self.sample(t1);
        if was_live && t1 >= self.delay && t1 > t0 {
            signals.push(TrackSignal {
                event: TrackEvent::Update,
                key: self.key.clone(),
                value: self.value,
            });
        }
        t1 < total
    }

    fn value(&self) -> f64 {
        self.value
    }
}

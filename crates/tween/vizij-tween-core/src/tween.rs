//! Tween: the playback state machine.
//!
//! A tween owns an ordered list of tracks and the clock that drives them. Each
//! tick its owner calls [`Tween::update`]; the tween consumes the delta phase by
//! phase (start delay, playthrough, loop delay, complete delay), carrying any
//! overshoot into the next phase, and dispatches lifecycle events as it
//! crosses boundaries.
//!
//! Every dispatch goes to the event channel first (all subscribers, in order)
//! and then to the single callback registered for that event.

use std::fmt;
use std::rc::Weak;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::callbacks::{Callback, CallbackRegistry};
use crate::config::{TweenConfig, INFINITE};
use crate::error::TweenError;
use crate::event::{EventArgs, EventChannel, EventListener, FnListener, ListenerId, TweenEvent};
use crate::ids::TweenId;
use crate::time::{unit_ratio, TimeUnits};
use crate::track::{PlayableTrack, PropertyTrack, TrackSignal};

/// Back-reference a tween uses to tell its manager it has been admitted.
pub trait TweenOwner {
    fn make_active(&self, id: TweenId);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweenState {
    /// Created but not yet admitted by an owner.
    Pending,
    /// Admitted; counting down before the first playthrough.
    StartDelay,
    Active,
    LoopDelay,
    CompleteDelay,
    /// Completed or stopped; waiting for the owner's cleanup pass.
    Finished,
    Destroyed,
}

impl TweenState {
    /// Get the name of this state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::StartDelay => "start_delay",
            Self::Active => "active",
            Self::LoopDelay => "loop_delay",
            Self::CompleteDelay => "complete_delay",
            Self::Finished => "finished",
            Self::Destroyed => "destroyed",
        }
    }

    /// Admitted and not yet finished.
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::StartDelay | Self::Active | Self::LoopDelay | Self::CompleteDelay
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelayPhase {
    Start,
    Loop,
    Complete,
}

/// The single countdown a tween runs at any time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub phase: DelayPhase,
    pub remaining: f64,
}

/// Observable state of a tween at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TweenStatus {
    pub id: TweenId,
    pub state: TweenState,
    pub paused: bool,
    pub elapsed: f64,
    pub progress: f64,
    pub total_elapsed: f64,
    pub total_progress: f64,
    pub loops_remaining: i32,
    pub countdown: Option<Countdown>,
}

pub struct Tween {
    id: TweenId,
    owner: Option<Weak<dyn TweenOwner>>,

    tracks: Vec<Box<dyn PlayableTrack>>,
    track_count: usize,

    time_scale: f64,
    units: TimeUnits,

    loop_count: i32,
    loop_delay: f64,
    loops_remaining: i32,
    complete_delay: f64,
    start_delay: f64,
    countdown: Option<Countdown>,

    state: TweenState,
    paused: bool,
    started: bool,
    stopped: bool,
    persist: bool,

    elapsed: f64,
    progress: f64,
    total_elapsed: f64,
    // Sum of the phases already completed in this run; `total_elapsed`
    // snaps back to it at every boundary.
    settled_total: f64,
    total_progress: f64,
    duration: f64,
    total_duration: f64,

    callbacks: Option<CallbackRegistry>,
    channel: Option<EventChannel>,

    // Reused between ticks to collect track signals.
    signals: Vec<TrackSignal>,
}

impl Tween {
    /// Create a pending tween that plays `tracks` once.
    pub fn new(id: TweenId, tracks: Vec<Box<dyn PlayableTrack>>) -> Self {
        let mut tween = Self {
            id,
            owner: None,
            tracks,
            track_count: 0,
            time_scale: 1.0,
            units: TimeUnits::Millis,
            loop_count: 0,
            loop_delay: 0.0,
            loops_remaining: 0,
            complete_delay: 0.0,
            start_delay: 0.0,
            countdown: None,
            state: TweenState::Pending,
            paused: false,
            started: false,
            stopped: false,
            persist: false,
            elapsed: 0.0,
            progress: 0.0,
            total_elapsed: 0.0,
            settled_total: 0.0,
            total_progress: 0.0,
            duration: 0.0,
            total_duration: 0.0,
            callbacks: Some(CallbackRegistry::new()),
            channel: Some(EventChannel::new()),
            signals: Vec::new(),
        };
        tween.init_durations();
        tween
    }

    /// Build a tween and its property tracks from a validated config.
    pub fn from_config(id: TweenId, cfg: &TweenConfig) -> Result<Self, TweenError> {
        cfg.validate()?;
        let mut tracks: Vec<Box<dyn PlayableTrack>> = Vec::with_capacity(cfg.tracks.len());
        for track_cfg in &cfg.tracks {
            tracks.push(Box::new(PropertyTrack::from_config(track_cfg)?));
        }
        Ok(Self::with_tracks(id, cfg, tracks))
    }

    /// Apply the timing fields of `cfg` to caller-supplied tracks.
    /// `cfg.tracks` is ignored.
    pub fn with_tracks(id: TweenId, cfg: &TweenConfig, tracks: Vec<Box<dyn PlayableTrack>>) -> Self {
        let mut tween = Self::new(id, tracks)
            .with_loop(cfg.loop_count, cfg.loop_delay)
            .with_complete_delay(cfg.complete_delay)
            .with_start_delay(cfg.delay)
            .with_time_scale(cfg.time_scale)
            .with_units(TimeUnits::from_use_frames(cfg.use_frames))
            .with_persist(cfg.persist);
        tween.paused = cfg.paused;
        tween
    }

    /// `count` extra playthroughs (`-1` forever), separated by `delay`.
    pub fn with_loop(mut self, count: i32, delay: f64) -> Self {
        self.loop_count = count.max(INFINITE);
        self.loop_delay = delay.max(0.0);
        self.init_durations();
        self
    }

    pub fn with_complete_delay(mut self, delay: f64) -> Self {
        self.complete_delay = delay.max(0.0);
        self.init_durations();
        self
    }

    pub fn with_start_delay(mut self, delay: f64) -> Self {
        self.start_delay = delay.max(0.0);
        self
    }

    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.set_time_scale(scale);
        self
    }

    pub fn with_units(mut self, units: TimeUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    fn init_durations(&mut self) {
        self.track_count = self.tracks.len();
        self.duration = self
            .tracks
            .iter()
            .map(|t| t.duration())
            .fold(0.0, f64::max);
        self.total_duration = if self.loop_count == INFINITE || self.duration.is_infinite() {
            f64::INFINITY
        } else {
            let loops = self.loop_count as f64;
            self.duration + self.complete_delay + (self.duration + self.loop_delay) * loops
        };
        self.loops_remaining = self.loop_count;
    }

    /// Link this tween to the owner notified by [`Tween::make_active`].
    pub fn set_owner(&mut self, owner: Weak<dyn TweenOwner>) {
        if self.state != TweenState::Destroyed {
            self.owner = Some(owner);
        }
    }

    /// Drop the owner link; later admissions notify nobody.
    pub fn clear_owner(&mut self) {
        self.owner = None;
    }

    /// Grow the track signal scratch buffer to hold at least `capacity`
    /// signals without reallocating.
    pub fn reserve_signals(&mut self, capacity: usize) {
        self.signals
            .reserve(capacity.saturating_sub(self.signals.len()));
    }

    pub fn signal_capacity(&self) -> usize {
        self.signals.capacity()
    }

    // ----- accessors -----

    #[inline]
    pub fn id(&self) -> TweenId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> TweenState {
        self.state
    }

    /// Playing means admitted, in a playthrough, and not paused.
    #[inline]
    pub fn is_playing(&self) -> bool {
        !self.paused && self.state == TweenState::Active
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state == TweenState::Pending
    }

    /// Admitted and not yet finished; may be paused or delayed.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_running()
    }

    #[inline]
    pub fn is_start_delay(&self) -> bool {
        self.state == TweenState::StartDelay
    }

    #[inline]
    pub fn is_looping_delay(&self) -> bool {
        self.state == TweenState::LoopDelay
    }

    #[inline]
    pub fn is_complete_delay(&self) -> bool {
        self.state == TweenState::CompleteDelay
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == TweenState::Finished
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.state == TweenState::Destroyed
    }

    /// Finished through [`Tween::stop`] rather than natural completion.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// `onStart` has fired for the current run.
    #[inline]
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    pub fn total_progress(&self) -> f64 {
        self.total_progress
    }

    /// One playthrough, independent of time scale.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Whole run including loops and delays; infinite when looping forever.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn loop_count(&self) -> i32 {
        self.loop_count
    }

    pub fn loop_delay(&self) -> f64 {
        self.loop_delay
    }

    pub fn loops_remaining(&self) -> i32 {
        self.loops_remaining
    }

    pub fn complete_delay(&self) -> f64 {
        self.complete_delay
    }

    pub fn start_delay(&self) -> f64 {
        self.start_delay
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    pub fn units(&self) -> TimeUnits {
        self.units
    }

    pub fn uses_frames(&self) -> bool {
        self.units.is_frames()
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn set_persist(&mut self, persist: bool) -> &mut Self {
        if self.state != TweenState::Destroyed {
            self.persist = persist;
        }
        self
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn tracks(&self) -> impl Iterator<Item = &dyn PlayableTrack> + '_ {
        self.tracks.iter().map(|t| &**t)
    }

    /// Current value of every track, in insertion order.
    pub fn values(&self) -> Vec<(String, f64)> {
        self.tracks
            .iter()
            .map(|t| (t.key().to_string(), t.value()))
            .collect()
    }

    pub fn callbacks(&self) -> Option<&CallbackRegistry> {
        self.callbacks.as_ref()
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    pub fn status(&self) -> TweenStatus {
        TweenStatus {
            id: self.id,
            state: self.state,
            paused: self.paused,
            elapsed: self.elapsed,
            progress: self.progress,
            total_elapsed: self.total_elapsed,
            total_progress: self.total_progress,
            loops_remaining: self.loops_remaining,
            countdown: self.countdown,
        }
    }

    // ----- time scale -----

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Scale applied to every incoming delta. `0` freezes playback without
    /// pausing. Negative or non-finite values are treated as `0`.
    pub fn set_time_scale(&mut self, value: f64) -> &mut Self {
        if self.state == TweenState::Destroyed {
            return self;
        }
        if !value.is_finite() || value < 0.0 {
            log::warn!("{}: invalid time scale {value}, using 0", self.id);
            self.time_scale = 0.0;
        } else {
            self.time_scale = value;
        }
        self
    }

    // ----- listeners and callbacks -----

    /// Subscribe to every event on this tween's channel.
    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) -> Result<ListenerId, TweenError> {
        match self.channel.as_mut() {
            Some(channel) => Ok(channel.subscribe(listener)),
            None => Err(TweenError::Destroyed { id: self.id }),
        }
    }

    /// Subscribe a closure to one event.
    pub fn on<F>(&mut self, event: TweenEvent, func: F) -> Result<ListenerId, TweenError>
    where
        F: FnMut(&Tween) + 'static,
    {
        self.subscribe(Box::new(FnListener::new(event, func)))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.channel
            .as_mut()
            .map(|channel| channel.unsubscribe(id))
            .unwrap_or(false)
    }

    pub fn listener_count(&self) -> usize {
        self.channel.as_ref().map_or(0, EventChannel::listener_count)
    }

    /// Register or replace the callback for `event`.
    pub fn set_callback(&mut self, event: TweenEvent, callback: Callback) -> &mut Self {
        if let Some(registry) = self.callbacks.as_mut() {
            registry.set(event, callback);
        }
        self
    }

    /// Register by event name; unknown names leave the tween unchanged.
    pub fn set_callback_by_name(&mut self, name: &str, callback: Callback) -> &mut Self {
        if let Some(registry) = self.callbacks.as_mut() {
            registry.set_by_name(name, callback);
        }
        self
    }

    fn emit(&mut self, event: TweenEvent, signal: Option<&TrackSignal>, extra: &[Value]) {
        if let Some(mut channel) = self.channel.take() {
            channel.emit(&EventArgs {
                event,
                tween: &*self,
                signal,
            });
            self.channel = Some(channel);
        }
        if let Some(registry) = self.callbacks.as_mut() {
            registry.invoke(event, extra);
        }
    }

    fn dispatch(&mut self, event: TweenEvent) {
        self.emit(event, None, &[]);
    }

    fn dispatch_signal(&mut self, signal: &TrackSignal) {
        let extra = [json!(signal.key), json!(signal.value)];
        self.emit(signal.event.into(), Some(signal), &extra);
    }

    // ----- control -----

    /// Freeze playback. Repeated calls fire `onPause` once.
    pub fn pause(&mut self) -> &mut Self {
        if !self.paused && self.state != TweenState::Destroyed {
            self.paused = true;
            self.dispatch(TweenEvent::OnPause);
        }
        self
    }

    /// Resume a paused tween. No-op when not paused.
    pub fn resume(&mut self) -> &mut Self {
        if self.paused && self.state != TweenState::Destroyed {
            self.paused = false;
            self.dispatch(TweenEvent::OnResume);
        }
        self
    }

    /// Admission by the owner. Only acts on a pending tween.
    pub fn make_active(&mut self) {
        if self.state != TweenState::Pending {
            return;
        }
        if let Some(owner) = self.owner.as_ref().and_then(Weak::upgrade) {
            owner.make_active(self.id);
        }
        log::debug!("{}: active", self.id);
        self.enter_start_path();
        self.dispatch(TweenEvent::OnActive);
        self.maybe_start();
    }

    fn enter_start_path(&mut self) {
        self.started = false;
        if self.start_delay > 0.0 {
            self.countdown = Some(Countdown {
                phase: DelayPhase::Start,
                remaining: self.start_delay,
            });
            self.state = TweenState::StartDelay;
        } else {
            self.countdown = None;
            self.state = TweenState::Active;
        }
    }

    fn maybe_start(&mut self) {
        if self.state == TweenState::Active && !self.paused && !self.started {
            self.started = true;
            log::debug!("{}: start", self.id);
            self.dispatch(TweenEvent::OnStart);
        }
    }

    /// Jump to the finished state, skipping remaining loops and delays.
    /// Fires `onStop`; no-op once finished or destroyed.
    pub fn stop(&mut self) -> &mut Self {
        if self.state == TweenState::Pending || self.state.is_running() {
            self.countdown = None;
            self.state = TweenState::Finished;
            self.stopped = true;
            log::debug!("{}: stop", self.id);
            self.dispatch(TweenEvent::OnStop);
        }
        self
    }

    /// Rewind an admitted tween to its first playthrough.
    /// Useful for persistent tweens that finished and should play again.
    pub fn restart(&mut self) -> &mut Self {
        if matches!(self.state, TweenState::Pending | TweenState::Destroyed) {
            return self;
        }
        self.elapsed = 0.0;
        self.progress = 0.0;
        self.total_elapsed = 0.0;
        self.settled_total = 0.0;
        self.total_progress = 0.0;
        self.loops_remaining = self.loop_count;
        self.stopped = false;
        for track in &mut self.tracks {
            track.reset();
        }
        log::debug!("{}: restart", self.id);
        self.enter_start_path();
        self.maybe_start();
        self
    }

    /// Final teardown: releases the owner link, callbacks and listeners.
    /// Calling it again has no effect.
    pub fn destroy(&mut self) {
        if self.state == TweenState::Destroyed {
            return;
        }
        self.state = TweenState::Destroyed;
        self.countdown = None;
        self.owner = None;
        self.callbacks = None;
        self.channel = None;
        log::debug!("{}: destroyed", self.id);
    }

    // ----- stepping -----

    /// Advance by one tick. Returns `true` once the tween is finished or
    /// destroyed and can be cleaned up by its owner.
    pub fn update(&mut self, delta: f64) -> bool {
        self.update_scaled(delta, 1.0)
    }

    /// Like [`Tween::update`], with an owner-level scale applied on top of
    /// this tween's own time scale. Frame-based tweens advance by
    /// `outer_scale * time_scale` frames per tick.
    pub fn update_scaled(&mut self, delta: f64, outer_scale: f64) -> bool {
        if self.paused || !self.state.is_running() {
            return matches!(self.state, TweenState::Finished | TweenState::Destroyed);
        }
        if delta < 0.0 {
            log::warn!("{}: negative delta {delta} ignored", self.id);
        }
        let mut remaining = self
            .units
            .scaled_delta(delta, self.time_scale * outer_scale);
        if remaining <= 0.0 {
            return false;
        }
        // Admitted while paused: onStart waits for the first real step.
        self.maybe_start();

        loop {
            match self.state {
                TweenState::StartDelay => {
                    if !self.tick_countdown(&mut remaining, false) {
                        break;
                    }
                    self.state = TweenState::Active;
                    self.maybe_start();
                }
                TweenState::Active => {
                    let left = self.duration - self.elapsed;
                    let step = remaining.min(left).max(0.0);
                    let ends = step >= left;
                    self.advance(step, ends);
                    remaining -= step;
                    if !ends || self.state != TweenState::Active {
                        break;
                    }
                    self.end_playthrough();
                    // Zero-length playthroughs advance at most once per tick.
                    if step <= 0.0 {
                        break;
                    }
                }
                TweenState::LoopDelay => {
                    if !self.tick_countdown(&mut remaining, true) {
                        break;
                    }
                    self.begin_loop();
                }
                TweenState::CompleteDelay => {
                    if !self.tick_countdown(&mut remaining, true) {
                        break;
                    }
                    self.complete();
                }
                _ => break,
            }
        }

        self.is_finished()
    }

    /// Consume from the running countdown. Returns `true` once it expires.
    fn tick_countdown(&mut self, remaining: &mut f64, counts_toward_total: bool) -> bool {
        let Some(countdown) = self.countdown.as_mut() else {
            return true;
        };
        let used = remaining.min(countdown.remaining);
        countdown.remaining -= used;
        *remaining -= used;
        let expired = countdown.remaining <= 0.0;
        let phase = countdown.phase;
        if expired {
            self.countdown = None;
        }
        if counts_toward_total {
            self.total_elapsed += used;
            if expired {
                let length = match phase {
                    DelayPhase::Start => 0.0,
                    DelayPhase::Loop => self.loop_delay,
                    DelayPhase::Complete => self.complete_delay,
                };
                self.settle_total(length);
            }
            self.total_progress = unit_ratio(self.total_elapsed, self.total_duration);
        }
        expired
    }

    fn advance(&mut self, step: f64, ends: bool) {
        self.signals.clear();
        for track in &mut self.tracks {
            track.update(step, &mut self.signals);
        }
        self.elapsed = if ends {
            self.duration
        } else {
            self.elapsed + step
        };
        self.total_elapsed += step;
        if ends {
            self.settle_total(self.duration);
        }
        self.progress = unit_ratio(self.elapsed, self.duration);
        self.total_progress = unit_ratio(self.total_elapsed, self.total_duration);

        let signals = std::mem::take(&mut self.signals);
        for signal in &signals {
            self.dispatch_signal(signal);
        }
        self.signals = signals;
    }

    /// Close a phase of `length`: the running total becomes the exact sum of
    /// completed phases, dropping drift from fractional steps.
    fn settle_total(&mut self, length: f64) {
        self.settled_total += length;
        self.total_elapsed = self.settled_total;
    }

    fn end_playthrough(&mut self) {
        if self.loops_remaining != 0 {
            if self.loops_remaining > 0 {
                self.loops_remaining -= 1;
            }
            self.elapsed = 0.0;
            self.progress = 0.0;
            if self.loop_delay > 0.0 {
                self.countdown = Some(Countdown {
                    phase: DelayPhase::Loop,
                    remaining: self.loop_delay,
                });
                self.state = TweenState::LoopDelay;
            } else {
                self.begin_loop();
            }
        } else if self.complete_delay > 0.0 {
            self.countdown = Some(Countdown {
                phase: DelayPhase::Complete,
                remaining: self.complete_delay,
            });
            self.state = TweenState::CompleteDelay;
        } else {
            self.complete();
        }
    }

    fn begin_loop(&mut self) {
        for track in &mut self.tracks {
            track.reset();
        }
        self.state = TweenState::Active;
        log::debug!("{}: loop ({} left)", self.id, self.loops_remaining);
        self.dispatch(TweenEvent::OnLoop);
    }

    fn complete(&mut self) {
        self.countdown = None;
        self.state = TweenState::Finished;
        if self.total_duration.is_finite() {
            self.total_elapsed = self.total_duration;
        }
        self.total_progress = unit_ratio(self.total_elapsed, self.total_duration);
        log::debug!("{}: complete", self.id);
        self.dispatch(TweenEvent::OnComplete);
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("paused", &self.paused)
            .field("tracks", &self.tracks.iter().map(|t| t.key()).collect::<Vec<_>>())
            .field("elapsed", &self.elapsed)
            .field("total_elapsed", &self.total_elapsed)
            .field("loops_remaining", &self.loops_remaining)
            .field("countdown", &self.countdown)
            .finish_non_exhaustive()
    }
}

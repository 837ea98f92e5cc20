//! TweenManager: registry and per-tick driver for tweens.
//!
//! Each `update` runs in a fixed order:
//! 1) normalize the delta (manager pause, lag smoothing, manager time scale)
//! 2) admit pending tweens
//! 3) step every admitted tween in insertion order
//! 4) destroy and drop finished non-persistent tweens

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::{ManagerConfig, TweenConfig};
use crate::error::TweenError;
use crate::ids::{IdAllocator, TweenId};
use crate::outputs::{Change, ManagerOutputs};
use crate::tween::{Tween, TweenOwner};

/// Collects admissions reported back by tweens during `make_active`.
#[derive(Debug, Default)]
struct ActivationLog {
    ids: RefCell<Vec<TweenId>>,
}

impl ActivationLog {
    fn drain_into(&self, out: &mut Vec<TweenId>) {
        out.append(&mut self.ids.borrow_mut());
    }
}

impl TweenOwner for ActivationLog {
    fn make_active(&self, id: TweenId) {
        self.ids.borrow_mut().push(id);
    }
}

#[derive(Debug)]
pub struct TweenManager {
    cfg: ManagerConfig,
    ids: IdAllocator,
    tweens: IndexMap<TweenId, Tween>,
    activations: Rc<ActivationLog>,
    paused: bool,
    outputs: ManagerOutputs,
}

impl Default for TweenManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl TweenManager {
    pub fn new(cfg: ManagerConfig) -> Self {
        let time_scale = cfg.time_scale;
        let mut manager = Self {
            cfg,
            ids: IdAllocator::new(),
            tweens: IndexMap::new(),
            activations: Rc::default(),
            paused: false,
            outputs: ManagerOutputs::default(),
        };
        manager.set_time_scale(time_scale);
        manager
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.cfg
    }

    /// Allocate an id for a tween built outside the manager.
    pub fn next_id(&mut self) -> TweenId {
        self.ids.alloc_tween()
    }

    /// Build a tween from `cfg` and register it. It is admitted on the next
    /// update.
    pub fn create(&mut self, cfg: &TweenConfig) -> Result<TweenId, TweenError> {
        let id = self.ids.alloc_tween();
        let tween = Tween::from_config(id, cfg)?;
        self.add(tween)
    }

    /// Register an externally built tween.
    pub fn add(&mut self, mut tween: Tween) -> Result<TweenId, TweenError> {
        let id = tween.id();
        if tween.is_destroyed() {
            return Err(TweenError::Destroyed { id });
        }
        if self.tweens.contains_key(&id) {
            return Err(TweenError::DuplicateTween { id });
        }
        self.ids.reserve(id);
        let owner: Rc<dyn TweenOwner> = self.activations.clone();
        tween.set_owner(Rc::downgrade(&owner));
        tween.reserve_signals(self.cfg.max_signals_per_tick);
        self.tweens.insert(id, tween);
        Ok(id)
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.get(&id)
    }

    pub fn get_mut(&mut self, id: TweenId) -> Option<&mut Tween> {
        self.tweens.get_mut(&id)
    }

    /// Detach a tween without destroying it. The tween no longer reports
    /// to this manager.
    pub fn remove(&mut self, id: TweenId) -> Option<Tween> {
        let mut tween = self.tweens.shift_remove(&id)?;
        tween.clear_owner();
        Some(tween)
    }

    /// Destroy a tween and drop it from the registry immediately.
    pub fn destroy(&mut self, id: TweenId) -> Result<(), TweenError> {
        let mut tween = self
            .tweens
            .shift_remove(&id)
            .ok_or(TweenError::TweenNotFound { id })?;
        tween.destroy();
        Ok(())
    }

    /// Stop a tween; it is cleaned up on the next update unless persistent.
    pub fn stop(&mut self, id: TweenId) -> Result<(), TweenError> {
        let tween = self
            .tweens
            .get_mut(&id)
            .ok_or(TweenError::TweenNotFound { id })?;
        tween.stop();
        Ok(())
    }

    /// Destroy every registered tween.
    pub fn kill_all(&mut self) {
        for (_, mut tween) in self.tweens.drain(..) {
            tween.destroy();
        }
        log::debug!("tween manager: killed all tweens");
    }

    /// Freeze the whole manager. Individual tweens keep their own pause flag
    /// and receive no events.
    pub fn pause_all(&mut self) {
        self.paused = true;
    }

    pub fn resume_all(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f64 {
        self.cfg.time_scale
    }

    /// Negative or non-finite values are treated as `0`.
    pub fn set_time_scale(&mut self, value: f64) {
        if !value.is_finite() || value < 0.0 {
            log::warn!("tween manager: invalid time scale {value}, using 0");
            self.cfg.time_scale = 0.0;
        } else {
            self.cfg.time_scale = value;
        }
    }

    /// Deltas above `threshold` are replaced with `skip`. A threshold of `0`
    /// disables smoothing.
    pub fn set_lag_smooth(&mut self, threshold: f64, skip: f64) {
        self.cfg.lag_threshold_ms = threshold.max(0.0);
        self.cfg.lag_skip_ms = skip.max(0.0);
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Registered ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = TweenId> + '_ {
        self.tweens.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tween> + '_ {
        self.tweens.values()
    }

    /// Outputs of the most recent update.
    pub fn outputs(&self) -> &ManagerOutputs {
        &self.outputs
    }

    fn smooth(&self, delta: f64) -> f64 {
        if !delta.is_finite() || delta < 0.0 {
            log::warn!("tween manager: invalid delta {delta} ignored");
            return 0.0;
        }
        let threshold = self.cfg.lag_threshold_ms;
        if threshold > 0.0 && delta > threshold {
            log::debug!(
                "tween manager: lag spike {delta}ms, stepping {}ms",
                self.cfg.lag_skip_ms
            );
            return self.cfg.lag_skip_ms;
        }
        delta
    }

    /// Step the manager by one tick.
    pub fn update(&mut self, delta: f64) -> &ManagerOutputs {
        self.outputs.clear();
        if self.paused {
            return &self.outputs;
        }
        let dt = self.smooth(delta);
        let scale = self.cfg.time_scale;

        // Admission
        for tween in self.tweens.values_mut() {
            if tween.is_pending() {
                tween.make_active();
            }
        }
        self.activations.drain_into(&mut self.outputs.activated);

        // Step
        if dt > 0.0 && scale > 0.0 {
            for (id, tween) in self.tweens.iter_mut() {
                if tween.is_paused() || !tween.is_active() {
                    continue;
                }
                if tween.update_scaled(dt, scale) {
                    self.outputs.finished.push(*id);
                }
                for track in tween.tracks() {
                    self.outputs.push_change(Change {
                        tween: *id,
                        key: track.key().to_string(),
                        value: track.value(),
                    });
                }
            }
        }

        // Cleanup
        let removed = &mut self.outputs.removed;
        self.tweens.retain(|id, tween| {
            let doomed = tween.is_destroyed() || (tween.is_finished() && !tween.persist());
            if doomed {
                tween.destroy();
                removed.push(*id);
            }
            !doomed
        });

        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertyTrackConfig;

    fn simple(duration: f64) -> TweenConfig {
        TweenConfig::default().with_track(PropertyTrackConfig::new("x", 0.0, 10.0, duration))
    }

    #[test]
    fn create_admits_on_next_update() {
        let mut mgr = TweenManager::default();
        let id = mgr.create(&simple(100.0)).unwrap();
        assert!(mgr.get(id).unwrap().is_pending());
        let out = mgr.update(16.0);
        assert_eq!(out.activated, vec![id]);
        assert!(mgr.get(id).unwrap().is_playing());
    }

    #[test]
    fn finished_tween_is_removed() {
        let mut mgr = TweenManager::default();
        let id = mgr.create(&simple(100.0)).unwrap();
        let out = mgr.update(100.0).clone();
        assert_eq!(out.finished, vec![id]);
        assert_eq!(out.removed, vec![id]);
        assert_eq!(out.value(id, "x"), Some(10.0));
        assert!(mgr.is_empty());
    }

    #[test]
    fn persistent_tween_stays_registered() {
        let mut mgr = TweenManager::default();
        let cfg = TweenConfig {
            persist: true,
            ..simple(50.0)
        };
        let id = mgr.create(&cfg).unwrap();
        mgr.update(60.0);
        assert!(mgr.get(id).unwrap().is_finished());
        mgr.get_mut(id).unwrap().restart();
        mgr.update(25.0);
        assert!((mgr.get(id).unwrap().progress() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn stopped_persistent_tween_stays_and_restarts() {
        let mut mgr = TweenManager::default();
        let cfg = TweenConfig {
            persist: true,
            loop_count: 2,
            ..simple(100.0)
        };
        let id = mgr.create(&cfg).unwrap();
        mgr.update(40.0);
        mgr.stop(id).unwrap();
        let out = mgr.update(40.0);
        assert!(out.removed.is_empty());
        assert!(out.finished.is_empty());

        let tween = mgr.get(id).unwrap();
        assert!(tween.is_finished());
        assert!(tween.is_stopped());
        assert_eq!(tween.elapsed(), 40.0);

        mgr.get_mut(id).unwrap().restart();
        assert!(!mgr.get(id).unwrap().is_stopped());
        mgr.update(30.0);
        let tween = mgr.get(id).unwrap();
        assert!(tween.is_playing());
        assert_eq!(tween.elapsed(), 30.0);
        assert_eq!(tween.loops_remaining(), 2);
    }

    #[test]
    fn frame_tweens_follow_manager_time_scale() {
        let mut mgr = TweenManager::default();
        let cfg = TweenConfig {
            use_frames: true,
            ..simple(10.0)
        };
        let id = mgr.create(&cfg).unwrap();
        mgr.set_time_scale(0.5);
        for _ in 0..4 {
            mgr.update(16.0);
        }
        assert_eq!(mgr.get(id).unwrap().elapsed(), 2.0);
        mgr.set_time_scale(0.0);
        mgr.update(16.0);
        assert_eq!(mgr.get(id).unwrap().elapsed(), 2.0);
    }

    #[test]
    fn registered_tweens_get_signal_capacity() {
        let mut mgr = TweenManager::new(ManagerConfig {
            max_signals_per_tick: 128,
            ..ManagerConfig::default()
        });
        let id = mgr.create(&simple(100.0)).unwrap();
        assert!(mgr.get(id).unwrap().signal_capacity() >= 128);
    }

    #[test]
    fn removed_tween_no_longer_reports_activation() {
        let mut mgr = TweenManager::default();
        let id = mgr.create(&simple(100.0)).unwrap();
        let mut tween = mgr.remove(id).unwrap();
        assert!(!tween.has_owner());
        tween.make_active();
        let out = mgr.update(16.0);
        assert!(out.activated.is_empty());
        assert!(tween.is_playing());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut mgr = TweenManager::default();
        let id = mgr.next_id();
        mgr.add(Tween::new(id, Vec::new())).unwrap();
        let err = mgr.add(Tween::new(id, Vec::new())).unwrap_err();
        assert_eq!(err, TweenError::DuplicateTween { id });
        assert_eq!(err.category(), "registry");
        assert_ne!(mgr.next_id(), id);
    }

    #[test]
    fn lag_spikes_are_smoothed() {
        let mut mgr = TweenManager::default();
        let id = mgr.create(&simple(1000.0)).unwrap();
        mgr.update(2000.0);
        assert_eq!(mgr.get(id).unwrap().elapsed(), 33.0);
        mgr.set_lag_smooth(0.0, 0.0);
        mgr.update(600.0);
        assert_eq!(mgr.get(id).unwrap().elapsed(), 633.0);
    }

    #[test]
    fn pause_all_freezes_without_events() {
        let mut mgr = TweenManager::default();
        let id = mgr.create(&simple(100.0)).unwrap();
        mgr.update(10.0);
        mgr.pause_all();
        assert!(mgr.update(50.0).is_empty());
        assert_eq!(mgr.get(id).unwrap().elapsed(), 10.0);
        assert!(!mgr.get(id).unwrap().is_paused());
        mgr.resume_all();
        mgr.update(50.0);
        assert_eq!(mgr.get(id).unwrap().elapsed(), 60.0);
    }

    #[test]
    fn manager_time_scale_multiplies_tween_scale() {
        let mut mgr = TweenManager::default();
        let cfg = TweenConfig {
            time_scale: 2.0,
            ..simple(1000.0)
        };
        let id = mgr.create(&cfg).unwrap();
        mgr.set_time_scale(0.5);
        mgr.update(100.0);
        assert_eq!(mgr.get(id).unwrap().elapsed(), 100.0);
    }

    #[test]
    fn stop_and_destroy_by_id() {
        let mut mgr = TweenManager::default();
        let a = mgr.create(&simple(100.0)).unwrap();
        let b = mgr.create(&simple(100.0)).unwrap();
        mgr.update(10.0);
        mgr.stop(a).unwrap();
        mgr.destroy(b).unwrap();
        assert!(matches!(mgr.destroy(b), Err(TweenError::TweenNotFound { .. })));
        let out = mgr.update(10.0);
        assert_eq!(out.removed, vec![a]);
        assert!(mgr.is_empty());
    }

    #[test]
    fn kill_all_empties_registry() {
        let mut mgr = TweenManager::default();
        mgr.create(&simple(100.0)).unwrap();
        mgr.create(&simple(100.0)).unwrap();
        assert_eq!(mgr.len(), 2);
        mgr.kill_all();
        assert!(mgr.is_empty());
    }

    #[test]
    fn removed_tween_keeps_running_standalone() {
        let mut mgr = TweenManager::default();
        let id = mgr.create(&simple(100.0)).unwrap();
        mgr.update(10.0);
        let mut tween = mgr.remove(id).unwrap();
        tween.update(10.0);
        assert_eq!(tween.elapsed(), 20.0);
    }
}

//! Per-tick outputs of the tween manager.
//!
//! Outputs carry the property values written this tick and the ids whose
//! lifecycle changed. Hosts apply the values; lifecycle callbacks have
//! already run by the time the manager returns.

use serde::{Deserialize, Serialize};

use crate::ids::TweenId;

/// One property value produced by a stepped tween.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub tween: TweenId,
    pub key: String,
    pub value: f64,
}

/// Outputs returned by [`crate::TweenManager::update`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerOutputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Admitted this tick, in admission order.
    #[serde(default)]
    pub activated: Vec<TweenId>,
    /// Reached the finished state during this tick's step.
    #[serde(default)]
    pub finished: Vec<TweenId>,
    /// Destroyed and dropped from the registry this tick.
    #[serde(default)]
    pub removed: Vec<TweenId>,
}

impl ManagerOutputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.activated.clear();
        self.finished.clear();
        self.removed.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
            && self.activated.is_empty()
            && self.finished.is_empty()
            && self.removed.is_empty()
    }

    /// Latest value written for `key` by `tween` this tick.
    pub fn value(&self, tween: TweenId, key: &str) -> Option<f64> {
        self.changes
            .iter()
            .rev()
            .find(|c| c.tween == tween && c.key == key)
            .map(|c| c.value)
    }
}

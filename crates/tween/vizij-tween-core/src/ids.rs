//! Identifiers and a simple allocator for tweens.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TweenId(pub u32);

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

/// Monotonic allocator for TweenId.
/// Dense indices keep ids cheap to hash and compare; they are opaque externally.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_tween: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_tween(&mut self) -> TweenId {
        let id = TweenId(self.next_tween);
        self.next_tween = self.next_tween.wrapping_add(1);
        id
    }

    /// Make sure future allocations never hand out `taken` again.
    #[inline]
    pub fn reserve(&mut self, taken: TweenId) {
        if taken.0 >= self.next_tween {
            self.next_tween = taken.0.wrapping_add(1);
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

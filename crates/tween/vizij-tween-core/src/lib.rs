//! Vizij Tween Core (engine-agnostic)
//!
//! Playback engine for tweens: a tween drives an ordered set of property
//! tracks through an optional start delay, one or more playthroughs separated
//! by loop delays, and an optional complete delay. Lifecycle transitions are
//! dispatched to an event channel and a per-event callback table.
//!
//! [`TweenManager`] owns tweens, admits them, ticks them and cleans them up.
//! Adapters apply [`ManagerOutputs`] to their host.

pub mod callbacks;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod manager;
pub mod outputs;
pub mod time;
pub mod track;
pub mod tween;

// Re-exports for consumers (adapters)
pub use callbacks::{Callback, CallbackRegistry};
pub use config::{ManagerConfig, PropertyTrackConfig, TweenConfig, INFINITE};
pub use error::TweenError;
pub use event::{
    EventArgs, EventChannel, EventListener, EventRecord, EventRecorder, FnListener, ListenerId,
    TweenEvent,
};
pub use ids::{IdAllocator, TweenId};
pub use manager::TweenManager;
pub use outputs::{Change, ManagerOutputs};
pub use time::TimeUnits;
pub use track::{linear, EaseFn, PlayableTrack, PropertyTrack, TrackEvent, TrackSignal};
pub use tween::{Countdown, DelayPhase, Tween, TweenOwner, TweenState, TweenStatus};

pub type Result<T> = core::result::Result<T, TweenError>;

//! Lifecycle events and the event channel a tween emits them on.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ids::TweenId;
use crate::track::TrackSignal;
use crate::tween::Tween;

/// The closed set of lifecycle events.
///
/// The first seven are dispatched by the tween itself; `OnUpdate`,
/// `OnRepeat` and `OnYoyo` originate from individual tracks but are routed
/// through the same channel and callback table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweenEvent {
    #[serde(rename = "onActive")]
    OnActive,
    #[serde(rename = "onStart")]
    OnStart,
    #[serde(rename = "onLoop")]
    OnLoop,
    #[serde(rename = "onComplete")]
    OnComplete,
    #[serde(rename = "onStop")]
    OnStop,
    #[serde(rename = "onPause")]
    OnPause,
    #[serde(rename = "onResume")]
    OnResume,
    #[serde(rename = "onUpdate")]
    OnUpdate,
    #[serde(rename = "onRepeat")]
    OnRepeat,
    #[serde(rename = "onYoyo")]
    OnYoyo,
}

impl TweenEvent {
    pub const COUNT: usize = 10;

    pub const ALL: [TweenEvent; Self::COUNT] = [
        Self::OnActive,
        Self::OnStart,
        Self::OnLoop,
        Self::OnComplete,
        Self::OnStop,
        Self::OnPause,
        Self::OnResume,
        Self::OnUpdate,
        Self::OnRepeat,
        Self::OnYoyo,
    ];

    /// Get the name of this event
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnActive => "onActive",
            Self::OnStart => "onStart",
            Self::OnLoop => "onLoop",
            Self::OnComplete => "onComplete",
            Self::OnStop => "onStop",
            Self::OnPause => "onPause",
            Self::OnResume => "onResume",
            Self::OnUpdate => "onUpdate",
            Self::OnRepeat => "onRepeat",
            Self::OnYoyo => "onYoyo",
        }
    }

    /// Look up an event by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }

    /// Slot index in fixed-size per-event tables.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Dispatched by the tween rather than by one of its tracks.
    #[inline]
    pub fn is_unit_level(&self) -> bool {
        !self.is_track_level()
    }

    #[inline]
    pub fn is_track_level(&self) -> bool {
        matches!(self, Self::OnUpdate | Self::OnRepeat | Self::OnYoyo)
    }
}

impl fmt::Display for TweenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a listener receives for every emission.
#[derive(Debug, Clone, Copy)]
pub struct EventArgs<'a> {
    pub event: TweenEvent,
    pub tween: &'a Tween,
    /// Set for track-level events.
    pub signal: Option<&'a TrackSignal>,
}

/// Event listener trait for handling tween events
pub trait EventListener {
    /// Handle a tween event
    fn on_event(&mut self, args: &EventArgs<'_>);

    /// Get the event types this listener is interested in
    fn interested_events(&self) -> Vec<TweenEvent> {
        // Default: interested in all events
        vec![]
    }

    /// Check if this listener is interested in a specific event type
    fn is_interested_in(&self, event: TweenEvent) -> bool {
        let interested = self.interested_events();
        interested.is_empty() || interested.contains(&event)
    }
}

/// Handle returned by [`EventChannel::subscribe`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Multi-subscriber channel. Emission is synchronous and follows
/// subscription order.
#[derive(Default)]
pub struct EventChannel {
    listeners: Vec<(ListenerId, Box<dyn EventListener>)>,
    next_id: u32,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event listener
    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener; returns whether it was present.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    /// Remove all listeners
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Deliver one emission to every interested listener.
    pub fn emit(&mut self, args: &EventArgs<'_>) {
        for (_, listener) in &mut self.listeners {
            if listener.is_interested_in(args.event) {
                listener.on_event(args);
            }
        }
    }

    /// Get the number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Listener for a single event backed by a closure.
pub struct FnListener<F> {
    event: TweenEvent,
    func: F,
}

impl<F> FnListener<F>
where
    F: FnMut(&Tween),
{
    pub fn new(event: TweenEvent, func: F) -> Self {
        Self { event, func }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: FnMut(&Tween),
{
    fn on_event(&mut self, args: &EventArgs<'_>) {
        (self.func)(args.tween);
    }

    fn interested_events(&self) -> Vec<TweenEvent> {
        vec![self.event]
    }
}

/// One recorded emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event: TweenEvent,
    pub tween: TweenId,
    pub progress: f64,
    pub total_progress: f64,
    pub track_key: Option<String>,
}

/// Shared log of emissions, readable after its listener has been handed to a
/// tween. Mostly useful in tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    records: Rc<RefCell<Vec<EventRecord>>>,
    interested: Vec<TweenEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder for specific event types
    pub fn for_events(events: Vec<TweenEvent>) -> Self {
        Self {
            records: Rc::default(),
            interested: events,
        }
    }

    /// A listener that appends into this recorder.
    pub fn listener(&self) -> Box<dyn EventListener> {
        Box::new(self.clone())
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.borrow().clone()
    }

    /// Event names in emission order.
    pub fn events(&self) -> Vec<TweenEvent> {
        self.records.borrow().iter().map(|r| r.event).collect()
    }

    pub fn count(&self, event: TweenEvent) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl EventListener for EventRecorder {
    fn on_event(&mut self, args: &EventArgs<'_>) {
        self.records.borrow_mut().push(EventRecord {
            event: args.event,
            tween: args.tween.id(),
            progress: args.tween.progress(),
            total_progress: args.tween.total_progress(),
            track_key: args.signal.map(|s| s.key.clone()),
        });
    }

    fn interested_events(&self) -> Vec<TweenEvent> {
        self.interested.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for event in TweenEvent::ALL {
            assert_eq!(TweenEvent::from_name(event.name()), Some(event));
        }
        assert_eq!(TweenEvent::from_name("onBogus"), None);
        assert_eq!(TweenEvent::from_name("onactive"), None);
    }

    #[test]
    fn indices_are_dense() {
        for (i, event) in TweenEvent::ALL.iter().enumerate() {
            assert_eq!(event.index(), i);
        }
    }

    #[test]
    fn level_classification() {
        assert!(TweenEvent::OnActive.is_unit_level());
        assert!(TweenEvent::OnResume.is_unit_level());
        assert!(TweenEvent::OnYoyo.is_track_level());
        assert!(!TweenEvent::OnUpdate.is_unit_level());
    }

    #[test]
    fn serde_uses_event_names() {
        let s = serde_json::to_string(&TweenEvent::OnComplete).unwrap();
        assert_eq!(s, "\"onComplete\"");
        let e: TweenEvent = serde_json::from_str("\"onYoyo\"").unwrap();
        assert_eq!(e, TweenEvent::OnYoyo);
    }

    #[test]
    fn recorder_filtering() {
        let recorder = EventRecorder::for_events(vec![TweenEvent::OnLoop]);
        assert!(recorder.is_interested_in(TweenEvent::OnLoop));
        assert!(!recorder.is_interested_in(TweenEvent::OnStart));
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let mut channel = EventChannel::new();
        let a = channel.subscribe(EventRecorder::new().listener());
        let _b = channel.subscribe(EventRecorder::new().listener());
        assert_eq!(channel.listener_count(), 2);
        assert!(channel.unsubscribe(a));
        assert!(!channel.unsubscribe(a));
        assert_eq!(channel.listener_count(), 1);
    }
}

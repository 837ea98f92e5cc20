//! Per-event callback table.
//!
//! Each lifecycle event owns exactly one optional handler slot. Registering a
//! handler for an event replaces the previous one; unlike the event channel,
//! there is no list of subscribers here.

use std::fmt;

use serde_json::Value;

use crate::event::TweenEvent;

type CallbackFn = Box<dyn FnMut(&[Value])>;

/// A handler plus the fixed parameters it is invoked with.
///
/// The invocation scope is whatever the closure captures.
pub struct Callback {
    func: CallbackFn,
    params: Vec<Value>,
}

impl Callback {
    pub fn new<F>(func: F) -> Self
    where
        F: FnMut(&[Value]) + 'static,
    {
        Self {
            func: Box::new(func),
            params: Vec::new(),
        }
    }

    /// Fixed parameters appended after any event-supplied arguments.
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn call(&mut self, extra: &[Value]) {
        if extra.is_empty() {
            (self.func)(&self.params);
        } else {
            let mut args = Vec::with_capacity(extra.len() + self.params.len());
            args.extend_from_slice(extra);
            args.extend_from_slice(&self.params);
            (self.func)(&args);
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct CallbackRegistry {
    slots: [Option<Callback>; TweenEvent::COUNT],
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the handler for `event`.
    pub fn set(&mut self, event: TweenEvent, callback: Callback) {
        self.slots[event.index()] = Some(callback);
    }

    /// Register by event name. Unknown names are ignored and reported as
    /// `false`, so configuration written for newer event sets still loads.
    pub fn set_by_name(&mut self, name: &str, callback: Callback) -> bool {
        match TweenEvent::from_name(name) {
            Some(event) => {
                self.set(event, callback);
                true
            }
            None => {
                log::debug!("ignoring callback for unknown event '{name}'");
                false
            }
        }
    }

    /// Remove and return the handler for `event`.
    pub fn clear(&mut self, event: TweenEvent) -> Option<Callback> {
        self.slots[event.index()].take()
    }

    #[inline]
    pub fn is_set(&self, event: TweenEvent) -> bool {
        self.slots[event.index()].is_some()
    }

    pub fn get(&self, event: TweenEvent) -> Option<&Callback> {
        self.slots[event.index()].as_ref()
    }

    /// Run the handler for `event` if one is registered.
    /// `extra` is prepended to the handler's fixed parameters.
    pub fn invoke(&mut self, event: TweenEvent, extra: &[Value]) -> bool {
        match self.slots[event.index()].as_mut() {
            Some(cb) => {
                cb.call(extra);
                true
            }
            None => false,
        }
    }

    pub fn registered(&self) -> impl Iterator<Item = TweenEvent> + '_ {
        TweenEvent::ALL
            .into_iter()
            .filter(move |e| self.slots[e.index()].is_some())
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.registered().map(|e| e.name()))
            .finish()
    }
}

//! Synchronous, typed publish/subscribe for MIDI events.
//!
//! Each component exposes a fixed set of [`EventKind`]s. Consumers register
//! handlers per kind; [`EventChannel::emit`] calls every handler for the
//! event's kind, in registration order, before returning.

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::event::{EventKind, MidiEvent};

/// Callback invoked for each emitted event of the kind it was registered for.
pub type EventHandler = Box<dyn FnMut(&MidiEvent)>;

/// Anything an emulator can write its output events to.
pub trait EventSink {
    fn emit(&mut self, event: MidiEvent);
}

impl EventSink for Vec<MidiEvent> {
    #[inline]
    fn emit(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

pub struct EventChannel {
    kinds: &'static [EventKind],
    handlers: [SmallVec<[EventHandler; 1]>; EventKind::COUNT],
}

impl EventChannel {
    /// Channel exposing only `kinds`.
    pub fn new(kinds: &'static [EventKind]) -> Self {
        Self {
            kinds,
            handlers: std::array::from_fn(|_| SmallVec::new()),
        }
    }

    /// Channel exposing every event kind.
    pub fn all() -> Self {
        Self::new(&EventKind::ALL)
    }

    pub fn kinds(&self) -> &'static [EventKind] {
        self.kinds
    }

    #[inline]
    pub fn supports(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Register `handler` for `kind`.
    ///
    /// Fails with [`Error::UnsupportedEvent`] if this channel does not expose
    /// `kind`; nothing is registered in that case.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> Result<()>
    where
        F: FnMut(&MidiEvent) + 'static,
    {
        if !self.supports(kind) {
            return Err(Error::UnsupportedEvent { kind });
        }
        self.handlers[kind.index()].push(Box::new(handler));
        Ok(())
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers[kind.index()].len()
    }

    /// Remove every handler registered for `kind`.
    pub fn clear(&mut self, kind: EventKind) {
        self.handlers[kind.index()].clear();
    }

    /// Deliver `event` to the handlers of its kind.
    pub fn emit(&mut self, event: &MidiEvent) {
        for handler in self.handlers[event.kind().index()].iter_mut() {
            handler(event);
        }
    }
}

impl EventSink for EventChannel {
    #[inline]
    fn emit(&mut self, event: MidiEvent) {
        EventChannel::emit(self, &event);
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<(EventKind, usize)> = self
            .kinds
            .iter()
            .map(|&kind| (kind, self.handler_count(kind)))
            .collect();
        f.debug_struct("EventChannel")
            .field("handlers", &registered)
            .finish()
    }
}

/// A component that publishes events through an [`EventChannel`].
pub trait EventSource {
    fn events(&mut self) -> &mut EventChannel;

    fn on<F>(&mut self, kind: EventKind, handler: F) -> Result<()>
    where
        F: FnMut(&MidiEvent) + 'static,
        Self: Sized,
    {
        self.events().on(kind, handler)
    }
}

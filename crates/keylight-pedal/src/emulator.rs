//! Common interface of the pedal emulators and the emitting wrapper around them.

use keylight_midi::{
    ControllerNumber, EventChannel, EventKind, EventSink, EventSource, MidiChannel, MidiEvent,
    NoteNumber, Velocity, CC_SOFT, CC_SOSTENUTO, CC_SUSTAIN,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pedal {
    Damper,
    Sostenuto,
    Soft,
}

impl Pedal {
    pub fn controller(self) -> ControllerNumber {
        match self {
            Pedal::Damper => CC_SUSTAIN,
            Pedal::Sostenuto => CC_SOSTENUTO,
            Pedal::Soft => CC_SOFT,
        }
    }

    pub fn on_kind(self) -> EventKind {
        match self {
            Pedal::Damper => EventKind::SustainOn,
            Pedal::Sostenuto => EventKind::SostenutoOn,
            Pedal::Soft => EventKind::SoftOn,
        }
    }

    pub fn off_kind(self) -> EventKind {
        match self {
            Pedal::Damper => EventKind::SustainOff,
            Pedal::Sostenuto => EventKind::SostenutoOff,
            Pedal::Soft => EventKind::SoftOff,
        }
    }

    pub fn on_event(self, channel: MidiChannel) -> MidiEvent {
        match self {
            Pedal::Damper => MidiEvent::SustainOn { channel },
            Pedal::Sostenuto => MidiEvent::SostenutoOn { channel },
            Pedal::Soft => MidiEvent::SoftOn { channel },
        }
    }

    pub fn off_event(self, channel: MidiChannel) -> MidiEvent {
        match self {
            Pedal::Damper => MidiEvent::SustainOff { channel },
            Pedal::Sostenuto => MidiEvent::SostenutoOff { channel },
            Pedal::Soft => MidiEvent::SoftOff { channel },
        }
    }

    /// Kinds an emulator of this pedal emits from its own operations.
    pub fn emitted_kinds(self) -> &'static [EventKind] {
        const DAMPER: &[EventKind] = &[
            EventKind::NoteOn,
            EventKind::NoteOff,
            EventKind::SustainOn,
            EventKind::SustainOff,
        ];
        const SOSTENUTO: &[EventKind] = &[
            EventKind::NoteOn,
            EventKind::NoteOff,
            EventKind::SostenutoOn,
            EventKind::SostenutoOff,
        ];
        const SOFT: &[EventKind] = &[
            EventKind::NoteOn,
            EventKind::NoteOff,
            EventKind::SoftOn,
            EventKind::SoftOff,
        ];
        match self {
            Pedal::Damper => DAMPER,
            Pedal::Sostenuto => SOSTENUTO,
            Pedal::Soft => SOFT,
        }
    }
}

/// A per-channel pedal state machine that rewrites the note stream.
///
/// Every operation validates its arguments first. On `Err` nothing has been
/// written to `out` and no state has changed.
pub trait PedalEmulator {
    fn pedal(&self) -> Pedal;

    fn is_pressed(&self, channel: MidiChannel) -> Result<bool>;

    fn press(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()>;

    fn release(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()>;

    fn note_on(
        &mut self,
        channel: MidiChannel,
        note: NoteNumber,
        velocity: Velocity,
        out: &mut dyn EventSink,
    ) -> Result<()>;

    fn note_off(
        &mut self,
        channel: MidiChannel,
        note: NoteNumber,
        out: &mut dyn EventSink,
    ) -> Result<()>;

    /// Route a decoded event to the matching operation.
    ///
    /// Note-on/off and this pedal's own on/off events drive the state machine;
    /// anything else is forwarded unchanged.
    fn process(&mut self, event: &MidiEvent, out: &mut dyn EventSink) -> Result<()> {
        let pedal = self.pedal();
        match *event {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity, out),
            MidiEvent::NoteOff { channel, note } => self.note_off(channel, note, out),
            _ => match event.channel() {
                Some(channel) if event.kind() == pedal.on_kind() => self.press(channel, out),
                Some(channel) if event.kind() == pedal.off_kind() => self.release(channel, out),
                _ => {
                    out.emit(event.clone());
                    Ok(())
                }
            },
        }
    }
}

/// Pairs an emulator with an [`EventChannel`] so its output reaches
/// registered handlers.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use keylight_midi::{EventKind, MidiEvent};
/// use keylight_pedal::{DamperPedal, PedalProcessor};
///
/// let offs = Rc::new(RefCell::new(Vec::new()));
/// let mut damper = PedalProcessor::new(DamperPedal::new());
/// let sink = Rc::clone(&offs);
/// damper
///     .on(EventKind::NoteOff, move |e| sink.borrow_mut().push(e.clone()))
///     .unwrap();
///
/// damper.press(0).unwrap();
/// damper.note_on(0, 60, 100).unwrap();
/// damper.note_off(0, 60).unwrap();
/// assert!(offs.borrow().is_empty());
///
/// damper.release(0).unwrap();
/// assert_eq!(*offs.borrow(), vec![MidiEvent::note_off(0, 60)]);
/// ```
#[derive(Debug)]
pub struct PedalProcessor<P> {
    emulator: P,
    events: EventChannel,
}

impl<P: PedalEmulator> PedalProcessor<P> {
    pub fn new(emulator: P) -> Self {
        let kinds = emulator.pedal().emitted_kinds();
        Self {
            emulator,
            events: EventChannel::new(kinds),
        }
    }

    pub fn emulator(&self) -> &P {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut P {
        &mut self.emulator
    }

    pub fn into_inner(self) -> P {
        self.emulator
    }

    /// Register `handler` for one of the kinds this pedal emits.
    ///
    /// Fails with [`Error::Midi`](crate::Error::Midi) for any other kind.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> Result<()>
    where
        F: FnMut(&MidiEvent) + 'static,
    {
        Ok(self.events.on(kind, handler)?)
    }

    pub fn is_pressed(&self, channel: MidiChannel) -> Result<bool> {
        self.emulator.is_pressed(channel)
    }

    pub fn press(&mut self, channel: MidiChannel) -> Result<()> {
        self.emulator.press(channel, &mut self.events)
    }

    pub fn release(&mut self, channel: MidiChannel) -> Result<()> {
        self.emulator.release(channel, &mut self.events)
    }

    pub fn note_on(
        &mut self,
        channel: MidiChannel,
        note: NoteNumber,
        velocity: Velocity,
    ) -> Result<()> {
        self.emulator.note_on(channel, note, velocity, &mut self.events)
    }

    pub fn note_off(&mut self, channel: MidiChannel, note: NoteNumber) -> Result<()> {
        self.emulator.note_off(channel, note, &mut self.events)
    }
}

impl<P: PedalEmulator + Default> Default for PedalProcessor<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P> EventSource for PedalProcessor<P> {
    fn events(&mut self) -> &mut EventChannel {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pedal_controllers() {
        assert_eq!(Pedal::Damper.controller(), 64);
        assert_eq!(Pedal::Sostenuto.controller(), 66);
        assert_eq!(Pedal::Soft.controller(), 67);
    }

    #[test]
    fn test_on_off_events_match_kinds() {
        for pedal in [Pedal::Damper, Pedal::Sostenuto, Pedal::Soft] {
            assert_eq!(pedal.on_event(5).kind(), pedal.on_kind());
            assert_eq!(pedal.off_event(5).kind(), pedal.off_kind());
            assert!(pedal.emitted_kinds().contains(&pedal.on_kind()));
            assert!(pedal.emitted_kinds().contains(&pedal.off_kind()));
        }
    }

    #[test]
    fn test_pedal_on_bytes_decode_to_on_event() {
        for pedal in [Pedal::Damper, Pedal::Sostenuto, Pedal::Soft] {
            let bytes = [0xB7, pedal.controller(), 0x7F];
            assert_eq!(keylight_midi::decode(&bytes), pedal.on_event(7));
        }
    }

    #[test]
    fn test_pedal_serde_names() {
        assert_eq!(serde_json::to_string(&Pedal::Sostenuto).unwrap(), "\"sostenuto\"");
        let pedal: Pedal = serde_json::from_str("\"damper\"").unwrap();
        assert_eq!(pedal, Pedal::Damper);
    }
}

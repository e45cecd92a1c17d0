//! Damper (sustain) pedal emulation.
//!
//! While the pedal is down, note-offs are held back and replayed when it comes
//! up. Striking a held note again drops its pending note-off.

use keylight_midi::{EventSink, MidiChannel, MidiEvent, NoteNumber, Velocity};
use tracing::{debug, trace};

use crate::emulator::{Pedal, PedalEmulator};
use crate::error::Result;
use crate::note_set::NoteSet;
use crate::store::{check_note, check_velocity, ChannelStore};

#[derive(Debug, Clone, Copy, Default)]
struct DamperChannel {
    pressed: bool,
    /// Notes whose note-off is owed on release.
    held: NoteSet,
}

#[derive(Debug, Clone, Default)]
pub struct DamperPedal {
    channels: ChannelStore<DamperChannel>,
}

impl DamperPedal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes on `channel` with a deferred note-off.
    pub fn held_notes(&self, channel: MidiChannel) -> Result<NoteSet> {
        Ok(self.channels.get(channel)?.held)
    }
}

impl PedalEmulator for DamperPedal {
    fn pedal(&self) -> Pedal {
        Pedal::Damper
    }

    fn is_pressed(&self, channel: MidiChannel) -> Result<bool> {
        Ok(self.channels.get(channel)?.pressed)
    }

    fn press(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()> {
        let state = self.channels.get_mut(channel)?;
        state.pressed = true;
        debug!(channel, "damper pressed");
        out.emit(MidiEvent::SustainOn { channel });
        Ok(())
    }

    fn release(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()> {
        let state = self.channels.get_mut(channel)?;
        state.pressed = false;
        let held = state.held.take();
        debug!(channel, flushed = held.len(), "damper released");
        for note in held {
            out.emit(MidiEvent::note_off(channel, note));
        }
        out.emit(MidiEvent::SustainOff { channel });
        Ok(())
    }

    fn note_on(
        &mut self,
        channel: MidiChannel,
        note: NoteNumber,
        velocity: Velocity,
        out: &mut dyn EventSink,
    ) -> Result<()> {
        check_note(note)?;
        check_velocity(velocity)?;
        let state = self.channels.get_mut(channel)?;
        if state.held.remove(note) {
            trace!(channel, note, "re-struck held note, pending note-off dropped");
        }
        out.emit(MidiEvent::note_on(channel, note, velocity));
        Ok(())
    }

    fn note_off(
        &mut self,
        channel: MidiChannel,
        note: NoteNumber,
        out: &mut dyn EventSink,
    ) -> Result<()> {
        check_note(note)?;
        let state = self.channels.get_mut(channel)?;
        if state.pressed {
            state.held.insert(note);
            trace!(channel, note, "note-off deferred by damper");
        } else {
            out.emit(MidiEvent::note_off(channel, note));
        }
        Ok(())
    }
}

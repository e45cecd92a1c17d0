//! Sostenuto pedal emulation.
//!
//! Only notes already sounding when the pedal goes down are sustained. Notes
//! struck afterwards behave normally even while the pedal stays down.

use keylight_midi::{EventSink, MidiChannel, MidiEvent, NoteNumber, Velocity};
use tracing::{debug, trace};

use crate::emulator::{Pedal, PedalEmulator};
use crate::error::Result;
use crate::note_set::NoteSet;
use crate::store::{check_note, check_velocity, ChannelStore};

#[derive(Debug, Clone, Copy, Default)]
struct SostenutoChannel {
    pressed: bool,
    /// Notes currently sounding, tracked regardless of pedal state.
    sounding: NoteSet,
    /// Snapshot of `sounding` taken at press time.
    captured: NoteSet,
    /// Captured notes whose note-off is owed on release.
    held: NoteSet,
}

#[derive(Debug, Clone, Default)]
pub struct SostenutoPedal {
    channels: ChannelStore<SostenutoChannel>,
}

impl SostenutoPedal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes on `channel` with a deferred note-off.
    pub fn held_notes(&self, channel: MidiChannel) -> Result<NoteSet> {
        Ok(self.channels.get(channel)?.held)
    }

    /// Notes captured by the current press on `channel` (empty when released).
    pub fn pedal_notes(&self, channel: MidiChannel) -> Result<NoteSet> {
        Ok(self.channels.get(channel)?.captured)
    }

    /// Notes currently sounding on `channel`.
    pub fn sounding_notes(&self, channel: MidiChannel) -> Result<NoteSet> {
        Ok(self.channels.get(channel)?.sounding)
    }
}

impl PedalEmulator for SostenutoPedal {
    fn pedal(&self) -> Pedal {
        Pedal::Sostenuto
    }

    fn is_pressed(&self, channel: MidiChannel) -> Result<bool> {
        Ok(self.channels.get(channel)?.pressed)
    }

    /// Snapshot the sounding notes. A repeated press while already down keeps
    /// the first snapshot.
    fn press(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()> {
        let state = self.channels.get_mut(channel)?;
        if !state.pressed {
            state.captured = state.sounding;
            state.pressed = true;
        }
        debug!(channel, captured = state.captured.len(), "sostenuto pressed");
        out.emit(MidiEvent::SostenutoOn { channel });
        Ok(())
    }

    fn release(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()> {
        let state = self.channels.get_mut(channel)?;
        state.captured.clear();
        let held = state.held.take();
        state.pressed = false;
        debug!(channel, flushed = held.len(), "sostenuto released");
        for note in held {
            out.emit(MidiEvent::note_off(channel, note));
        }
        out.emit(MidiEvent::SostenutoOff { channel });
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
        state.sounding.insert(note);
        if state.pressed && state.held.remove(note) {
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
        state.sounding.remove(note);
        if state.pressed && state.captured.contains(note) {
            state.held.insert(note);
            trace!(channel, note, "note-off deferred by sostenuto");
        } else {
            out.emit(MidiEvent::note_off(channel, note));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_note_sounding_at_press_is_captured() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.press(0, &mut out).unwrap();
        pedal.note_off(0, 60, &mut out).unwrap();
        assert_eq!(out.len(), 2, "note-off must be held while pedal is down");

        pedal.release(0, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                MidiEvent::note_on(0, 60, 100),
                MidiEvent::SostenutoOn { channel: 0 },
                MidiEvent::note_off(0, 60),
                MidiEvent::SostenutoOff { channel: 0 },
            ]
        );
    }

    #[test]
    fn test_note_struck_after_press_is_not_captured() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.press(0, &mut out).unwrap();
        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.note_off(0, 60, &mut out).unwrap();

        assert_eq!(
            out,
            vec![
                MidiEvent::SostenutoOn { channel: 0 },
                MidiEvent::note_on(0, 60, 100),
                MidiEvent::note_off(0, 60),
            ]
        );
        assert!(pedal.held_notes(0).unwrap().is_empty());
    }

    #[test]
    fn test_note_released_before_press_is_not_captured() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.note_off(0, 60, &mut out).unwrap();
        pedal.press(0, &mut out).unwrap();
        assert!(pedal.pedal_notes(0).unwrap().is_empty());
    }

    #[test]
    fn test_restrike_of_captured_note() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.press(0, &mut out).unwrap();
        pedal.note_off(0, 60, &mut out).unwrap();
        pedal.note_on(0, 60, 80, &mut out).unwrap();
        assert!(pedal.held_notes(0).unwrap().is_empty());

        // Still captured, so the second note-off is held too
        pedal.note_off(0, 60, &mut out).unwrap();
        assert!(pedal.held_notes(0).unwrap().contains(60));

        out.clear();
        pedal.release(0, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                MidiEvent::note_off(0, 60),
                MidiEvent::SostenutoOff { channel: 0 },
            ]
        );
    }

    #[test]
    fn test_release_clears_snapshot() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.note_on(3, 40, 100, &mut out).unwrap();
        pedal.note_on(3, 52, 100, &mut out).unwrap();
        pedal.press(3, &mut out).unwrap();
        assert_eq!(pedal.pedal_notes(3).unwrap().iter().collect::<Vec<_>>(), vec![40, 52]);

        pedal.release(3, &mut out).unwrap();
        assert!(pedal.pedal_notes(3).unwrap().is_empty());
        assert!(!pedal.is_pressed(3).unwrap());

        // Pedal is up, so a note-off passes straight through
        out.clear();
        pedal.note_off(3, 40, &mut out).unwrap();
        assert_eq!(out, vec![MidiEvent::note_off(3, 40)]);
    }

    #[test]
    fn test_second_press_keeps_first_snapshot() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.press(0, &mut out).unwrap();
        pedal.note_on(0, 67, 100, &mut out).unwrap();
        pedal.press(0, &mut out).unwrap();

        assert_eq!(pedal.pedal_notes(0).unwrap().iter().collect::<Vec<_>>(), vec![60]);

        pedal.note_off(0, 60, &mut out).unwrap();
        pedal.note_off(0, 67, &mut out).unwrap();
        out.clear();
        pedal.release(0, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                MidiEvent::note_off(0, 60),
                MidiEvent::SostenutoOff { channel: 0 },
            ]
        );
    }

    #[test]
    fn test_out_of_range_rejected_without_effect() {
        let mut pedal = SostenutoPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        assert_eq!(
            pedal.note_on(16, 60, 100, &mut out),
            Err(Error::ChannelOutOfRange(16))
        );
        assert_eq!(pedal.release(99, &mut out), Err(Error::ChannelOutOfRange(99)));
        assert_eq!(
            pedal.note_off(0, 128, &mut out),
            Err(Error::NoteOutOfRange(128))
        );
        assert!(out.is_empty());
        assert!(pedal.sounding_notes(0).unwrap().is_empty());
    }
}

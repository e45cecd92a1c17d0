//! Soft pedal emulation: scales note-on velocity while the pedal is down.

use keylight_midi::{EventSink, MidiChannel, MidiEvent, NoteNumber, Velocity};
use tracing::debug;

use crate::emulator::{Pedal, PedalEmulator};
use crate::error::{Error, Result};
use crate::store::{check_channel, check_note, check_velocity, ChannelStore};

pub const DEFAULT_SOFTEN_FACTOR: f64 = 2.0 / 3.0;

/// Scales note-on velocity by the soften factor, rounded to the nearest
/// integer, on channels where the pedal is down.
///
/// Small velocities can round to 0: with a factor below 0.5 a velocity-1
/// note-on becomes `NoteOn { velocity: 0 }`. The event stays a note-on, but
/// its [`to_bytes`](keylight_midi::MidiEvent::to_bytes) form decodes back as
/// a note-off.
#[derive(Debug, Clone)]
pub struct SoftPedal {
    pressed: ChannelStore<bool>,
    soften_factor: f64,
}

impl SoftPedal {
    pub fn new() -> Self {
        Self {
            pressed: ChannelStore::new(),
            soften_factor: DEFAULT_SOFTEN_FACTOR,
        }
    }

    pub fn with_soften_factor(soften_factor: f64) -> Result<Self> {
        let mut pedal = Self::new();
        pedal.set_soften_factor(soften_factor)?;
        Ok(pedal)
    }

    pub fn soften_factor(&self) -> f64 {
        self.soften_factor
    }

    /// Accepts factors in `[0, 1]`; anything else (including NaN) is rejected
    /// and the current factor is kept.
    pub fn set_soften_factor(&mut self, soften_factor: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&soften_factor) {
            debug!(soften_factor, "rejected soften factor");
            return Err(Error::InvalidSoftenFactor(soften_factor));
        }
        self.soften_factor = soften_factor;
        Ok(())
    }

    #[inline]
    fn soften(&self, velocity: Velocity) -> Velocity {
        (f64::from(velocity) * self.soften_factor).round() as Velocity
    }
}

impl Default for SoftPedal {
    fn default() -> Self {
        Self::new()
    }
}

impl PedalEmulator for SoftPedal {
    fn pedal(&self) -> Pedal {
        Pedal::Soft
    }

    fn is_pressed(&self, channel: MidiChannel) -> Result<bool> {
        Ok(*self.pressed.get(channel)?)
    }

    fn press(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()> {
        *self.pressed.get_mut(channel)? = true;
        debug!(channel, "soft pedal pressed");
        out.emit(MidiEvent::SoftOn { channel });
        Ok(())
    }

    fn release(&mut self, channel: MidiChannel, out: &mut dyn EventSink) -> Result<()> {
        *self.pressed.get_mut(channel)? = false;
        debug!(channel, "soft pedal released");
        out.emit(MidiEvent::SoftOff { channel });
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
        let velocity = if *self.pressed.get(channel)? {
            self.soften(velocity)
        } else {
            velocity
        };
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
        check_channel(channel)?;
        out.emit(MidiEvent::note_off(channel, note));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factor() {
        let pedal = SoftPedal::new();
        assert!((pedal.soften_factor() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_half_factor_scales_once() {
        let mut pedal = SoftPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.set_soften_factor(0.5).unwrap();
        pedal.press(2, &mut out).unwrap();
        out.clear();
        pedal.note_on(2, 60, 100, &mut out).unwrap();

        assert_eq!(out, vec![MidiEvent::note_on(2, 60, 50)]);
    }

    #[test]
    fn test_default_factor_rounds() {
        let mut pedal = SoftPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.press(0, &mut out).unwrap();
        out.clear();
        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.note_on(0, 61, 127, &mut out).unwrap();
        pedal.note_on(0, 62, 1, &mut out).unwrap();

        // 66.67 -> 67, 84.67 -> 85, 0.67 -> 1
        assert_eq!(
            out,
            vec![
                MidiEvent::note_on(0, 60, 67),
                MidiEvent::note_on(0, 61, 85),
                MidiEvent::note_on(0, 62, 1),
            ]
        );
    }

    #[test]
    fn test_unpressed_passes_through() {
        let mut pedal = SoftPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.press(1, &mut out).unwrap();
        out.clear();
        pedal.note_on(0, 60, 100, &mut out).unwrap();
        pedal.note_off(0, 60, &mut out).unwrap();

        assert_eq!(
            out,
            vec![MidiEvent::note_on(0, 60, 100), MidiEvent::note_off(0, 60)]
        );
    }

    #[test]
    fn test_release_restores_velocity() {
        let mut pedal = SoftPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.press(0, &mut out).unwrap();
        pedal.release(0, &mut out).unwrap();
        out.clear();
        pedal.note_on(0, 60, 90, &mut out).unwrap();
        assert_eq!(out, vec![MidiEvent::note_on(0, 60, 90)]);
    }

    #[test]
    fn test_low_factor_can_soften_to_zero_velocity() {
        let mut pedal = SoftPedal::with_soften_factor(0.25).unwrap();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.press(0, &mut out).unwrap();
        out.clear();
        pedal.note_on(0, 60, 1, &mut out).unwrap();
        assert_eq!(out, vec![MidiEvent::note_on(0, 60, 0)]);

        let bytes = out[0].to_bytes();
        assert_eq!(keylight_midi::decode(&bytes), MidiEvent::note_off(0, 60));
    }

    #[test]
    fn test_invalid_factor_rejected() {
        let mut pedal = SoftPedal::new();
        pedal.set_soften_factor(0.25).unwrap();

        for bad in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            assert!(pedal.set_soften_factor(bad).is_err());
            assert_eq!(pedal.soften_factor(), 0.25);
        }

        assert!(pedal.set_soften_factor(0.0).is_ok());
        assert!(pedal.set_soften_factor(1.0).is_ok());
        assert!(SoftPedal::with_soften_factor(2.0).is_err());
    }

    #[test]
    fn test_zero_factor() {
        let mut pedal = SoftPedal::with_soften_factor(0.0).unwrap();
        let mut out: Vec<MidiEvent> = Vec::new();

        pedal.press(0, &mut out).unwrap();
        out.clear();
        pedal.note_on(0, 60, 127, &mut out).unwrap();
        assert_eq!(out, vec![MidiEvent::note_on(0, 60, 0)]);
    }

    #[test]
    fn test_out_of_range_rejected_without_effect() {
        let mut pedal = SoftPedal::new();
        let mut out: Vec<MidiEvent> = Vec::new();

        assert_eq!(pedal.press(16, &mut out), Err(Error::ChannelOutOfRange(16)));
        assert_eq!(
            pedal.note_on(0, 60, 255, &mut out),
            Err(Error::VelocityOutOfRange(255))
        );
        assert_eq!(
            pedal.note_off(20, 60, &mut out),
            Err(Error::ChannelOutOfRange(20))
        );
        assert!(out.is_empty());
    }
}

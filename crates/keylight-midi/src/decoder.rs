//! Byte-level MIDI message decoder.
//!
//! [`decode`] is a pure translation of one complete message into one
//! [`MidiEvent`], parsed with `midi-msg`. There is no running status: every
//! call must start with a status byte. Messages that are unrecognized or too
//! short for their kind come back as [`MidiEvent::Unknown`] carrying the raw
//! bytes.

use midi_msg::{ChannelModeMsg, ChannelVoiceMsg, ControlChange, MidiMsg, PolyMode};
use tracing::trace;

use crate::emitter::{EventChannel, EventSource};
use crate::event::{
    ControllerNumber, MidiChannel, MidiEvent, RawBytes, CC_SOFT, CC_SOSTENUTO, CC_SUSTAIN,
    SWITCH_ON_THRESHOLD,
};

const NOTE_OFF_STATUS: u8 = 0x80;

/// Decode one MIDI message.
///
/// Data bytes are masked to 7 bits before parsing. Note-on with velocity 0 is
/// normalized to note-off. Controllers 64, 66 and 67 become sustain,
/// sostenuto and soft on/off events (value >= 64 is on).
pub fn decode(bytes: &[u8]) -> MidiEvent {
    let mut masked = RawBytes::from_slice(bytes);
    for byte in masked.iter_mut().skip(1) {
        *byte &= 0x7F;
    }
    // Note-off needs only the note; release velocity defaults to 0
    if matches!(masked[..], [status, _] if status & 0xF0 == NOTE_OFF_STATUS) {
        masked.push(0);
    }

    let event = match MidiMsg::from_midi(&masked) {
        Ok((MidiMsg::ChannelVoice { channel, msg }, _)) => channel_voice(channel as u8, msg),
        Ok((MidiMsg::ChannelMode { channel, msg }, _)) => {
            let (controller, value) = channel_mode_control(msg);
            Some(MidiEvent::control(channel as u8, controller, value))
        }
        Ok((msg, _)) => {
            trace!(?msg, "non-channel MIDI message");
            None
        }
        Err(error) => {
            trace!(?error, len = bytes.len(), "unparseable MIDI message");
            None
        }
    };

    event.unwrap_or_else(|| MidiEvent::unknown(bytes))
}

fn channel_voice(channel: MidiChannel, msg: ChannelVoiceMsg) -> Option<MidiEvent> {
    let event = match msg {
        ChannelVoiceMsg::NoteOn { note, velocity: 0 } => MidiEvent::note_off(channel, note),
        ChannelVoiceMsg::NoteOn { note, velocity } => MidiEvent::note_on(channel, note, velocity),
        ChannelVoiceMsg::NoteOff { note, .. } => MidiEvent::note_off(channel, note),
        ChannelVoiceMsg::PolyPressure { note, pressure } => MidiEvent::KeyPressure {
            channel,
            note,
            pressure,
        },
        ChannelVoiceMsg::ControlChange {
            control: ControlChange::CC { control, value },
        } => control_change(channel, control, value),
        ChannelVoiceMsg::ProgramChange { program } => MidiEvent::ProgramChange { channel, program },
        ChannelVoiceMsg::ChannelPressure { pressure } => {
            MidiEvent::ChannelPressure { channel, pressure }
        }
        ChannelVoiceMsg::PitchBend { bend } => MidiEvent::PitchBend {
            channel,
            value: bend,
        },
        // High-res notes and named controllers need a receiver context
        _ => return None,
    };
    Some(event)
}

fn control_change(channel: MidiChannel, controller: ControllerNumber, value: u8) -> MidiEvent {
    let on = value >= SWITCH_ON_THRESHOLD;
    match controller {
        CC_SUSTAIN if on => MidiEvent::SustainOn { channel },
        CC_SUSTAIN => MidiEvent::SustainOff { channel },
        CC_SOSTENUTO if on => MidiEvent::SostenutoOn { channel },
        CC_SOSTENUTO => MidiEvent::SostenutoOff { channel },
        CC_SOFT if on => MidiEvent::SoftOn { channel },
        CC_SOFT => MidiEvent::SoftOff { channel },
        _ => MidiEvent::control(channel, controller, value),
    }
}

/// Controller number and value of a channel mode message, as sent on the wire.
fn channel_mode_control(msg: ChannelModeMsg) -> (ControllerNumber, u8) {
    match msg {
        ChannelModeMsg::AllSoundOff => (120, 0),
        ChannelModeMsg::ResetAllControllers => (121, 0),
        ChannelModeMsg::LocalControl(on) => (122, if on { 0x7F } else { 0x00 }),
        ChannelModeMsg::AllNotesOff => (123, 0),
        ChannelModeMsg::OmniMode(on) => (if on { 125 } else { 124 }, 0),
        ChannelModeMsg::PolyMode(PolyMode::Mono(channels)) => (126, channels),
        ChannelModeMsg::PolyMode(PolyMode::Poly) => (127, 0),
    }
}

/// Event-emitting front end over [`decode`].
///
/// Handlers are registered per [`EventKind`](crate::EventKind); every kind
/// the decoder can produce is exposed.
pub struct MidiDecoder {
    events: EventChannel,
}

impl MidiDecoder {
    pub fn new() -> Self {
        Self {
            events: EventChannel::all(),
        }
    }

    /// Decode `bytes` and emit the result to the registered handlers.
    pub fn parse(&mut self, bytes: &[u8]) -> MidiEvent {
        let event = decode(bytes);
        self.events.emit(&event);
        event
    }
}

impl Default for MidiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for MidiDecoder {
    fn events(&mut self) -> &mut EventChannel {
        &mut self.events
    }
}

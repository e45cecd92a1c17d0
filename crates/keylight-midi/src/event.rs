//! Semantic MIDI events produced by the decoder and consumed by pedal emulators.

use core::fmt;

use midi_msg::{Channel, ChannelModeMsg, ChannelVoiceMsg, ControlChange, MidiMsg, PolyMode};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// MIDI channel (0-15, where 0 = channel 1)
pub type MidiChannel = u8;

/// MIDI note number (0-127)
pub type NoteNumber = u8;

/// Note velocity (0-127)
pub type Velocity = u8;

/// Control Change controller number (0-127)
pub type ControllerNumber = u8;

/// Raw bytes of a message the decoder could not interpret.
pub type RawBytes = SmallVec<[u8; 3]>;

pub const NUM_CHANNELS: usize = 16;
pub const NUM_NOTES: usize = 128;

/// Damper (sustain) pedal controller.
pub const CC_SUSTAIN: ControllerNumber = 0x40;
/// Sostenuto pedal controller.
pub const CC_SOSTENUTO: ControllerNumber = 0x42;
/// Soft pedal controller.
pub const CC_SOFT: ControllerNumber = 0x43;

/// First controller number that addresses a channel mode message.
pub const CHANNEL_MODE_FIRST: ControllerNumber = 120;

/// Switch controllers read values at or above this as "on".
pub const SWITCH_ON_THRESHOLD: u8 = 0x40;

/// The fixed set of event kinds a component can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    NoteOn,
    NoteOff,
    KeyPressure,
    SustainOn,
    SustainOff,
    SostenutoOn,
    SostenutoOff,
    SoftOn,
    SoftOff,
    Control,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    Unknown,
}

impl EventKind {
    pub const COUNT: usize = 14;

    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::NoteOn,
        EventKind::NoteOff,
        EventKind::KeyPressure,
        EventKind::SustainOn,
        EventKind::SustainOff,
        EventKind::SostenutoOn,
        EventKind::SostenutoOff,
        EventKind::SoftOn,
        EventKind::SoftOff,
        EventKind::Control,
        EventKind::ProgramChange,
        EventKind::ChannelPressure,
        EventKind::PitchBend,
        EventKind::Unknown,
    ];

    /// Slot of this kind in per-kind tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::NoteOn => "note-on",
            EventKind::NoteOff => "note-off",
            EventKind::KeyPressure => "key-pressure",
            EventKind::SustainOn => "sustain-on",
            EventKind::SustainOff => "sustain-off",
            EventKind::SostenutoOn => "sostenuto-on",
            EventKind::SostenutoOff => "sostenuto-off",
            EventKind::SoftOn => "soft-on",
            EventKind::SoftOff => "soft-off",
            EventKind::Control => "control",
            EventKind::ProgramChange => "program-change",
            EventKind::ChannelPressure => "channel-pressure",
            EventKind::PitchBend => "pitch-bend",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded MIDI message.
///
/// Pedal controllers (64, 66, 67) are lifted into their own on/off variants;
/// every other controller stays a generic [`MidiEvent::Control`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MidiEvent {
    NoteOn {
        channel: MidiChannel,
        note: NoteNumber,
        velocity: Velocity,
    },
    NoteOff {
        channel: MidiChannel,
        note: NoteNumber,
    },
    KeyPressure {
        channel: MidiChannel,
        note: NoteNumber,
        pressure: u8,
    },
    SustainOn {
        channel: MidiChannel,
    },
    SustainOff {
        channel: MidiChannel,
    },
    SostenutoOn {
        channel: MidiChannel,
    },
    SostenutoOff {
        channel: MidiChannel,
    },
    SoftOn {
        channel: MidiChannel,
    },
    SoftOff {
        channel: MidiChannel,
    },
    Control {
        channel: MidiChannel,
        controller: ControllerNumber,
        value: u8,
    },
    ProgramChange {
        channel: MidiChannel,
        program: u8,
    },
    ChannelPressure {
        channel: MidiChannel,
        pressure: u8,
    },
    /// 14-bit bend value, 8192 = centre.
    PitchBend {
        channel: MidiChannel,
        value: u16,
    },
    Unknown {
        bytes: RawBytes,
    },
}

impl MidiEvent {
    #[inline]
    pub fn note_on(channel: MidiChannel, note: NoteNumber, velocity: Velocity) -> Self {
        Self::NoteOn {
            channel,
            note,
            velocity,
        }
    }

    #[inline]
    pub fn note_off(channel: MidiChannel, note: NoteNumber) -> Self {
        Self::NoteOff { channel, note }
    }

    #[inline]
    pub fn control(channel: MidiChannel, controller: ControllerNumber, value: u8) -> Self {
        Self::Control {
            channel,
            controller,
            value,
        }
    }

    pub fn unknown(bytes: &[u8]) -> Self {
        Self::Unknown {
            bytes: RawBytes::from_slice(bytes),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            MidiEvent::NoteOn { .. } => EventKind::NoteOn,
            MidiEvent::NoteOff { .. } => EventKind::NoteOff,
            MidiEvent::KeyPressure { .. } => EventKind::KeyPressure,
            MidiEvent::SustainOn { .. } => EventKind::SustainOn,
            MidiEvent::SustainOff { .. } => EventKind::SustainOff,
            MidiEvent::SostenutoOn { .. } => EventKind::SostenutoOn,
            MidiEvent::SostenutoOff { .. } => EventKind::SostenutoOff,
            MidiEvent::SoftOn { .. } => EventKind::SoftOn,
            MidiEvent::SoftOff { .. } => EventKind::SoftOff,
            MidiEvent::Control { .. } => EventKind::Control,
            MidiEvent::ProgramChange { .. } => EventKind::ProgramChange,
            MidiEvent::ChannelPressure { .. } => EventKind::ChannelPressure,
            MidiEvent::PitchBend { .. } => EventKind::PitchBend,
            MidiEvent::Unknown { .. } => EventKind::Unknown,
        }
    }

    /// `None` only for [`MidiEvent::Unknown`].
    pub fn channel(&self) -> Option<MidiChannel> {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::KeyPressure { channel, .. }
            | MidiEvent::SustainOn { channel }
            | MidiEvent::SustainOff { channel }
            | MidiEvent::SostenutoOn { channel }
            | MidiEvent::SostenutoOff { channel }
            | MidiEvent::SoftOn { channel }
            | MidiEvent::SoftOff { channel }
            | MidiEvent::Control { channel, .. }
            | MidiEvent::ProgramChange { channel, .. }
            | MidiEvent::ChannelPressure { channel, .. }
            | MidiEvent::PitchBend { channel, .. } => Some(channel),
            MidiEvent::Unknown { .. } => None,
        }
    }

    #[inline]
    pub fn note(&self) -> Option<NoteNumber> {
        match *self {
            MidiEvent::NoteOn { note, .. }
            | MidiEvent::NoteOff { note, .. }
            | MidiEvent::KeyPressure { note, .. } => Some(note),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<Velocity> {
        match *self {
            MidiEvent::NoteOn { velocity, .. } => Some(velocity),
            _ => None,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { .. })
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(self, MidiEvent::NoteOff { .. })
    }

    /// The wire message this event stands for, or `None` for [`MidiEvent::Unknown`].
    ///
    /// Controllers 120-127 are channel mode messages and are built as such.
    pub fn to_midi_msg(&self) -> Option<MidiMsg> {
        let (channel, msg) = match *self {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => (channel, ChannelVoiceMsg::NoteOn { note, velocity }),
            MidiEvent::NoteOff { channel, note } => {
                (channel, ChannelVoiceMsg::NoteOff { note, velocity: 0 })
            }
            MidiEvent::KeyPressure {
                channel,
                note,
                pressure,
            } => (channel, ChannelVoiceMsg::PolyPressure { note, pressure }),
            MidiEvent::SustainOn { channel } => (channel, switch(CC_SUSTAIN, true)),
            MidiEvent::SustainOff { channel } => (channel, switch(CC_SUSTAIN, false)),
            MidiEvent::SostenutoOn { channel } => (channel, switch(CC_SOSTENUTO, true)),
            MidiEvent::SostenutoOff { channel } => (channel, switch(CC_SOSTENUTO, false)),
            MidiEvent::SoftOn { channel } => (channel, switch(CC_SOFT, true)),
            MidiEvent::SoftOff { channel } => (channel, switch(CC_SOFT, false)),
            MidiEvent::Control {
                channel,
                controller,
                value,
            } if controller >= CHANNEL_MODE_FIRST => {
                return Some(MidiMsg::ChannelMode {
                    channel: Channel::from_u8(channel),
                    msg: channel_mode(controller, value),
                });
            }
            MidiEvent::Control {
                channel,
                controller,
                value,
            } => (channel, cc(controller, value)),
            MidiEvent::ProgramChange { channel, program } => {
                (channel, ChannelVoiceMsg::ProgramChange { program })
            }
            MidiEvent::ChannelPressure { channel, pressure } => {
                (channel, ChannelVoiceMsg::ChannelPressure { pressure })
            }
            MidiEvent::PitchBend { channel, value } => {
                (channel, ChannelVoiceMsg::PitchBend { bend: value })
            }
            MidiEvent::Unknown { .. } => return None,
        };
        Some(MidiMsg::ChannelVoice {
            channel: Channel::from_u8(channel),
            msg,
        })
    }

    /// Re-encode into MIDI wire bytes.
    ///
    /// Pedal events use value 127 for on and 0 for off. Note-off is written
    /// with a zero release velocity. A note-on with velocity 0 is written as
    /// `9n kk 00`, which every receiver (and [`decode`](crate::decode)) reads
    /// back as a note-off. [`MidiEvent::Unknown`] yields its raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MidiEvent::Unknown { bytes } => bytes.to_vec(),
            _ => self
                .to_midi_msg()
                .map(|msg| msg.to_midi())
                .unwrap_or_default(),
        }
    }
}

#[inline]
fn cc(control: ControllerNumber, value: u8) -> ChannelVoiceMsg {
    ChannelVoiceMsg::ControlChange {
        control: ControlChange::CC { control, value },
    }
}

#[inline]
fn switch(control: ControllerNumber, on: bool) -> ChannelVoiceMsg {
    cc(control, if on { 0x7F } else { 0x00 })
}

/// Values a channel mode message does not carry are dropped.
fn channel_mode(controller: ControllerNumber, value: u8) -> ChannelModeMsg {
    match controller {
        120 => ChannelModeMsg::AllSoundOff,
        121 => ChannelModeMsg::ResetAllControllers,
        122 => ChannelModeMsg::LocalControl(value >= SWITCH_ON_THRESHOLD),
        123 => ChannelModeMsg::AllNotesOff,
        124 => ChannelModeMsg::OmniMode(false),
        125 => ChannelModeMsg::OmniMode(true),
        126 => ChannelModeMsg::PolyMode(PolyMode::Mono(value)),
        _ => ChannelModeMsg::PolyMode(PolyMode::Poly),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_index_matches_all_table() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EventKind::NoteOn.as_str(), "note-on");
        assert_eq!(EventKind::SostenutoOff.to_string(), "sostenuto-off");
        assert_eq!(EventKind::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_accessors() {
        let event = MidiEvent::note_on(3, 60, 100);
        assert_eq!(event.kind(), EventKind::NoteOn);
        assert_eq!(event.channel(), Some(3));
        assert_eq!(event.note(), Some(60));
        assert_eq!(event.velocity(), Some(100));
        assert!(event.is_note_on());
        assert!(!event.is_note_off());

        let off = MidiEvent::note_off(3, 60);
        assert!(off.is_note_off());
        assert_eq!(off.velocity(), None);

        let unknown = MidiEvent::unknown(&[0xF0]);
        assert_eq!(unknown.channel(), None);
        assert_eq!(unknown.note(), None);
    }

    #[test]
    fn test_pedal_to_bytes() {
        let on = MidiEvent::SustainOn { channel: 2 };
        assert_eq!(on.to_bytes().as_slice(), &[0xB2, 0x40, 0x7F]);

        let off = MidiEvent::SoftOff { channel: 15 };
        assert_eq!(off.to_bytes().as_slice(), &[0xBF, 0x43, 0x00]);
    }

    #[test]
    fn test_pitch_bend_to_bytes() {
        let bend = MidiEvent::PitchBend {
            channel: 0,
            value: 8192,
        };
        assert_eq!(bend.to_bytes().as_slice(), &[0xE0, 0x00, 0x40]);
    }

    #[test]
    fn test_to_midi_msg() {
        assert_eq!(
            MidiEvent::note_on(9, 36, 100).to_midi_msg(),
            Some(MidiMsg::ChannelVoice {
                channel: Channel::Ch10,
                msg: ChannelVoiceMsg::NoteOn {
                    note: 36,
                    velocity: 100
                },
            })
        );
        assert_eq!(MidiEvent::unknown(&[0xF8]).to_midi_msg(), None);
    }

    #[test]
    fn test_zero_velocity_note_on_encodes_as_note_off_bytes() {
        let bytes = MidiEvent::note_on(0, 60, 0).to_bytes();
        assert_eq!(bytes, vec![0x90, 0x3C, 0x00]);
        assert_eq!(crate::decode(&bytes), MidiEvent::note_off(0, 60));
    }

    #[test]
    fn test_channel_mode_to_bytes() {
        assert_eq!(
            MidiEvent::control(3, 123, 0).to_bytes(),
            vec![0xB3, 0x7B, 0x00]
        );
        assert_eq!(
            MidiEvent::control(0, 122, 127).to_bytes(),
            vec![0xB0, 0x7A, 0x7F]
        );
        // All-sound-off carries no value
        assert_eq!(
            MidiEvent::control(0, 120, 5).to_bytes(),
            vec![0xB0, 0x78, 0x00]
        );
    }

    #[test]
    fn test_unknown_to_bytes_is_raw() {
        assert_eq!(MidiEvent::unknown(&[0xF0, 0x7E]).to_bytes(), vec![0xF0, 0x7E]);
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&MidiEvent::note_off(1, 64)).unwrap();
        assert_eq!(json, r#"{"type":"note-off","channel":1,"note":64}"#);

        let back: MidiEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MidiEvent::note_off(1, 64));
    }
}

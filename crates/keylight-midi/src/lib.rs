//! MIDI subsystem for keylight.
//!
//! Turns raw MIDI byte messages into typed [`MidiEvent`]s and delivers them
//! through synchronous, per-kind [`EventChannel`]s.
//!
//! # Example
//!
//! ```
//! use keylight_midi::{decode, MidiEvent};
//!
//! assert_eq!(decode(&[0x90, 0x40, 0x60]), MidiEvent::note_on(0, 64, 96));
//! assert_eq!(decode(&[0xB3, 0x40, 0x7F]), MidiEvent::SustainOn { channel: 3 });
//! ```

pub mod error;
pub use error::{Error, Result};

pub(crate) mod decoder;
pub use decoder::{decode, MidiDecoder};

pub(crate) mod emitter;
pub use emitter::{EventChannel, EventHandler, EventSink, EventSource};

pub(crate) mod event;
pub use event::{
    ControllerNumber, EventKind, MidiChannel, MidiEvent, NoteNumber, RawBytes, Velocity,
    CC_SOFT, CC_SOSTENUTO, CC_SUSTAIN, CHANNEL_MODE_FIRST, NUM_CHANNELS, NUM_NOTES,
    SWITCH_ON_THRESHOLD,
};

// Wire-level types used by `MidiEvent::to_midi_msg`
pub use midi_msg::{Channel, ChannelModeMsg, ChannelVoiceMsg, ControlChange, MidiMsg};

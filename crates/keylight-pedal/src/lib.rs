//! Pedal emulation for keylight.
//!
//! Three per-channel state machines sit between the MIDI decoder and the
//! visualization layer and rewrite the note stream:
//!
//! - [`DamperPedal`] - holds every note-off while the sustain pedal is down
//! - [`SostenutoPedal`] - holds note-offs only for notes sounding at press time
//! - [`SoftPedal`] - scales note-on velocity while the soft pedal is down
//!
//! Each emulator implements [`PedalEmulator`] and writes to any
//! [`EventSink`](keylight_midi::EventSink). Wrap one in a [`PedalProcessor`]
//! to deliver its output to handlers registered per event kind.

pub mod error;
pub use error::{Error, Result};

mod damper;
mod emulator;
mod note_set;
mod soft;
mod sostenuto;
mod store;

pub use damper::DamperPedal;
pub use emulator::{Pedal, PedalEmulator, PedalProcessor};
pub use note_set::NoteSet;
pub use soft::{SoftPedal, DEFAULT_SOFTEN_FACTOR};
pub use sostenuto::SostenutoPedal;
pub use store::{check_channel, check_note, check_velocity, ChannelStore};

pub use note_set::Iter as NoteSetIter;

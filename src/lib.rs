//! # keylight - MIDI event core for keyboard light visualizers
//!
//! Decodes raw MIDI messages into typed events and emulates piano pedals
//! before the events reach a colour/LED layer.
//!
//! ## Architecture
//!
//! keylight is an umbrella crate that coordinates:
//! - **keylight-midi** - message decoding and per-kind event channels
//! - **keylight-pedal** - damper, sostenuto and soft pedal emulators
//!
//! ## Quick Start
//!
//! ```
//! use keylight::prelude::*;
//!
//! let mut chain = PedalChain::builder()
//!     .soften_factor(0.5)
//!     .build()?;
//!
//! chain.on(EventKind::NoteOn, |event| println!("{event:?}"))?;
//!
//! chain.process_bytes(&[0xB0, 0x43, 0x7F])?; // soft pedal down
//! chain.process_bytes(&[0x90, 0x3C, 0x64])?; // note-on(0, 60, 50) reaches the handler
//! # Ok::<(), keylight::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - library plus the `keylight-dump` binary
//! - `cli` - `keylight-dump` (stdin hex messages to JSON events)

pub use keylight_midi as midi;
pub use keylight_pedal as pedal;

pub use keylight_midi::{
    decode, EventChannel, EventKind, EventSink, EventSource, MidiDecoder, MidiEvent,
};

pub use keylight_pedal::{
    DamperPedal, NoteSet, Pedal, PedalEmulator, PedalProcessor, SoftPedal, SostenutoPedal,
};

pub mod error;
pub use error::{Error, Result};

mod builder;
mod chain;

pub use builder::{PedalChainBuilder, PedalChainConfig};
pub use chain::PedalChain;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{PedalChain, PedalChainBuilder, PedalChainConfig};

    pub use crate::{EventKind, EventSource, MidiEvent};

    pub use crate::{DamperPedal, PedalEmulator, PedalProcessor, SoftPedal, SostenutoPedal};

    pub use crate::{Error, Result};
}

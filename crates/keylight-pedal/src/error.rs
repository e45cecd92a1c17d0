//! Error types for the pedal emulators.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("MIDI channel {0} out of range (0-15)")]
    ChannelOutOfRange(u8),

    #[error("MIDI note {0} out of range (0-127)")]
    NoteOutOfRange(u8),

    #[error("velocity {0} out of range (0-127)")]
    VelocityOutOfRange(u8),

    #[error("soften factor {0} outside [0, 1]")]
    InvalidSoftenFactor(f64),

    #[error(transparent)]
    Midi(#[from] keylight_midi::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

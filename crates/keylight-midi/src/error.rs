//! Error types for the MIDI decoding subsystem.

use thiserror::Error;

use crate::event::EventKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("event kind '{kind}' is not emitted by this component")]
    UnsupportedEvent { kind: EventKind },
}

pub type Result<T> = std::result::Result<T, Error>;

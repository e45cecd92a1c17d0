//! Per-channel state storage and argument validation shared by the emulators.

use keylight_midi::{MidiChannel, NoteNumber, Velocity, NUM_CHANNELS, NUM_NOTES};

use crate::error::{Error, Result};

/// Fixed array of 16 independent channel states, indexed by MIDI channel.
///
/// Every slot is initialized separately at construction; no state is shared
/// between channels.
#[derive(Debug, Clone)]
pub struct ChannelStore<T> {
    channels: [T; NUM_CHANNELS],
}

impl<T: Default> ChannelStore<T> {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T: Default> Default for ChannelStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChannelStore<T> {
    pub fn get(&self, channel: MidiChannel) -> Result<&T> {
        check_channel(channel)?;
        Ok(&self.channels[channel as usize])
    }

    pub fn get_mut(&mut self, channel: MidiChannel) -> Result<&mut T> {
        check_channel(channel)?;
        Ok(&mut self.channels[channel as usize])
    }

    /// `(channel, state)` pairs in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (MidiChannel, &T)> {
        self.channels
            .iter()
            .enumerate()
            .map(|(channel, state)| (channel as MidiChannel, state))
    }
}

#[inline]
pub fn check_channel(channel: MidiChannel) -> Result<()> {
    if (channel as usize) < NUM_CHANNELS {
        Ok(())
    } else {
        Err(Error::ChannelOutOfRange(channel))
    }
}

#[inline]
pub fn check_note(note: NoteNumber) -> Result<()> {
    if (note as usize) < NUM_NOTES {
        Ok(())
    } else {
        Err(Error::NoteOutOfRange(note))
    }
}

#[inline]
pub fn check_velocity(velocity: Velocity) -> Result<()> {
    if velocity <= 0x7F {
        Ok(())
    } else {
        Err(Error::VelocityOutOfRange(velocity))
    }
}

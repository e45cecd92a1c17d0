//! Decoder-to-output pipeline through the enabled pedal emulators.

use std::mem;

use keylight_midi::{decode, EventChannel, EventSource, MidiEvent};
use keylight_pedal::{
    check_channel, check_note, check_velocity, DamperPedal, PedalEmulator, SoftPedal,
    SostenutoPedal,
};
use tracing::trace;

use crate::builder::PedalChainBuilder;
use crate::Result;

/// Runs each message through soft, sostenuto and damper emulation, in that
/// order, and delivers the result to handlers registered on the chain.
///
/// Everything happens synchronously inside [`PedalChain::process_bytes`]:
/// when it returns, every handler has seen every event that message produced.
/// Disabled stages are skipped, so their pedal events reach the output as-is.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use keylight::prelude::*;
///
/// let mut chain = PedalChain::builder().build()?;
/// let offs = Rc::new(RefCell::new(0));
/// let counter = Rc::clone(&offs);
/// chain.on(EventKind::NoteOff, move |_| *counter.borrow_mut() += 1)?;
///
/// chain.process_bytes(&[0xB0, 0x40, 0x7F])?; // sustain on
/// chain.process_bytes(&[0x90, 0x3C, 0x64])?;
/// chain.process_bytes(&[0x80, 0x3C, 0x00])?;
/// assert_eq!(*offs.borrow(), 0);
///
/// chain.process_bytes(&[0xB0, 0x40, 0x00])?; // sustain off
/// assert_eq!(*offs.borrow(), 1);
/// # Ok::<(), keylight::Error>(())
/// ```
#[derive(Debug)]
pub struct PedalChain {
    soft: Option<SoftPedal>,
    sostenuto: Option<SostenutoPedal>,
    damper: Option<DamperPedal>,
    events: EventChannel,
    batch: Vec<MidiEvent>,
    scratch: Vec<MidiEvent>,
}

impl PedalChain {
    pub fn builder() -> PedalChainBuilder {
        PedalChainBuilder::default()
    }

    pub(crate) fn from_parts(
        soft: Option<SoftPedal>,
        sostenuto: Option<SostenutoPedal>,
        damper: Option<DamperPedal>,
    ) -> Self {
        Self {
            soft,
            sostenuto,
            damper,
            events: EventChannel::all(),
            batch: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn soft(&self) -> Option<&SoftPedal> {
        self.soft.as_ref()
    }

    pub fn soft_mut(&mut self) -> Option<&mut SoftPedal> {
        self.soft.as_mut()
    }

    pub fn sostenuto(&self) -> Option<&SostenutoPedal> {
        self.sostenuto.as_ref()
    }

    pub fn damper(&self) -> Option<&DamperPedal> {
        self.damper.as_ref()
    }

    /// Decode one MIDI message and run it through the chain.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.process_event(decode(bytes))
    }

    /// Run an already-decoded event through the chain.
    ///
    /// Out-of-range channel, note or velocity values are rejected before any
    /// stage sees the event.
    pub fn process_event(&mut self, event: MidiEvent) -> Result<()> {
        validate(&event)?;

        let Self {
            soft,
            sostenuto,
            damper,
            events,
            batch,
            scratch,
        } = self;

        batch.clear();
        batch.push(event);

        let stages: [Option<&mut dyn PedalEmulator>; 3] = [
            soft.as_mut().map(|p| p as &mut dyn PedalEmulator),
            sostenuto.as_mut().map(|p| p as &mut dyn PedalEmulator),
            damper.as_mut().map(|p| p as &mut dyn PedalEmulator),
        ];
        for stage in stages.into_iter().flatten() {
            scratch.clear();
            for event in batch.iter() {
                stage.process(event, &mut *scratch)?;
            }
            mem::swap(batch, scratch);
        }

        trace!(count = batch.len(), "chain output");
        for event in batch.iter() {
            events.emit(event);
        }
        Ok(())
    }
}

impl EventSource for PedalChain {
    fn events(&mut self) -> &mut EventChannel {
        &mut self.events
    }
}

fn validate(event: &MidiEvent) -> keylight_pedal::Result<()> {
    if let Some(channel) = event.channel() {
        check_channel(channel)?;
    }
    if let Some(note) = event.note() {
        check_note(note)?;
    }
    if let Some(velocity) = event.velocity() {
        check_velocity(velocity)?;
    }
    Ok(())
}

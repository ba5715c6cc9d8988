#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::dsp::modulation::ModMatrix;
use crate::dsp::unison::UnisonEngine;

/// Control-thread events, drained by the voice pool at block boundaries.
#[derive(Debug, Copy, Clone)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    PitchBend { cents: f32 },
    SetTempo { bpm: f32 },
    /// Whole-matrix routing replacement.
    SetModMatrix(ModMatrix),
    /// Applies from the next note-on.
    SetUnison(UnisonEngine),
    /// Release every sounding voice.
    AllNotesOff,
    /// Silence every voice immediately, skipping release.
    AllSoundOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

//! Voice management and the control-plane handoff.
//!
//! `voice` is one playing note, `poly` owns the fixed voice pool, `message`
//! and `params` carry control-thread input into the audio thread without
//! locking.

pub mod message;
pub mod params;
pub mod poly;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use params::{AtomicF32, SynthMeters, SynthParam, SynthParams};
pub use poly::{PolySynth, SynthConfig};
pub use voice::{SynthVoice, VoiceState};

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz.
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

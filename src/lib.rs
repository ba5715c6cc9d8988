pub mod dsp; // Oscillators, filters, LFOs, unison and the modulation matrix
pub mod error;
pub mod patch; // Serializable voice configuration
pub mod synth; // Voices, polyphony and the control-plane handoff

pub use error::SynthError;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

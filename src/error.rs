//! Construction-time errors.
//!
//! Nothing on the audio path returns these: per-sample and per-block code
//! clamps its inputs instead. They are raised only while building wavetables
//! or validating a patch, before the audio thread sees any of it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("wavetable `{name}` has no frames")]
    EmptyWavetable { name: String },

    #[error("wavetable `{name}` frame length {len} is outside 2..={max}")]
    FrameLength { name: String, len: usize, max: usize },

    #[error("wavetable `{name}` frame {frame} has {len} samples, expected {expected}")]
    RaggedFrame {
        name: String,
        frame: usize,
        len: usize,
        expected: usize,
    },

    #[error("wavetable id {0} is already in the bank")]
    DuplicateWavetable(u32),

    #[error("unknown wavetable id {0}")]
    UnknownWavetable(u32),

    #[error("patch `{patch}`: {field} is not a finite number")]
    NonFinite { patch: String, field: &'static str },

    #[error("patch `{patch}` has {count} modulation routes, the matrix holds {max}")]
    TooManyRoutes {
        patch: String,
        count: usize,
        max: usize,
    },
}

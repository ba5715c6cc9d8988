//! Saturation curves
//!
//! Waveshapers used inside the analog filter loop. Each one maps the driven
//! input through a transfer function:
//!   output = f(input * input_gain)
//!
//! The caller applies the gain; the curves here only shape.
//!
//! # Curves
//!
//! Soft (rational):
//!   f(x) = x / (1 + |x|)
//!   - Smooth, never quite reaches ±1
//!   - Cheapest of the smooth curves
//!
//! Tanh:
//!   f(x) = tanh(x)
//!   - Symmetric, odd harmonics only
//!   - The classic transistor-ladder colour
//!
//! Hard clip:
//!   f(x) = clamp(x, -threshold, threshold)
//!   - Abrupt corner, buzzy
//!
//! Asymmetric tanh:
//!   f(x) = tanh(x + bias) - tanh(bias)
//!   - Positive and negative halves compress differently
//!   - Adds even harmonics; f(0) stays 0 so there is no DC step at silence

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bias of the asymmetric curve.
pub const ASYMMETRY_BIAS: f32 = 0.2;

/// Default ceiling of the hard clipper.
pub const HARD_CLIP_THRESHOLD: f32 = 1.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saturation {
    Identity,
    Soft,
    Tanh,
    HardClip,
    AsymmetricTanh,
}

impl Saturation {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Saturation::Identity => x,
            Saturation::Soft => soft_clip(x),
            Saturation::Tanh => x.tanh(),
            Saturation::HardClip => hard_clip(x, HARD_CLIP_THRESHOLD),
            Saturation::AsymmetricTanh => asymmetric_tanh(x),
        }
    }
}

/// Soft clipping using x / (1 + |x|) transfer function.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x / (1.0 + x.abs())
}

/// Hard clipping - simply clamps the signal at a threshold.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

#[inline]
pub fn asymmetric_tanh(x: f32) -> f32 {
    (x + ASYMMETRY_BIAS).tanh() - ASYMMETRY_BIAS.tanh()
}

//! Low-level DSP primitives that make up a synth voice.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside voice structs. Every setter
//! clamps its input, so the per-sample paths never validate anything.

/// Analog-modeled filter: drive, saturation and resonance feedback around the SVF core.
pub mod analog;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Two-pole state-variable filter core.
pub mod filter;
/// Low frequency oscillator with sample-and-hold, smoothed random and tempo sync.
pub mod lfo;
/// Source-to-destination modulation routing.
pub mod modulation;
/// Noise source with colour and tone filtering.
pub mod noise;
/// Basic, wavetable and two-operator FM oscillator.
pub mod oscillator;
/// Waveshaping curves used by the filter models.
pub mod saturation;
/// Sub-oscillator tracking the voice pitch an octave or two down.
pub mod sub;
/// Musical note values for tempo sync.
pub mod tempo;
/// Unison detune/pan/gain distribution.
pub mod unison;
/// Wavetables, the built-in bank and frame morphing.
pub mod wavetable;

pub use envelope::EnvelopeState;

/// Wrap a phase accumulator back into [0, 1).
#[inline]
pub(crate) fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase - phase.floor();
    // `x - floor(x)` can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Equal-power gains for a pan position in [-1, 1].
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type              | tap                        | passes          | rejects      |
| ----------------- | -------------------------- | --------------- | ------------ |
| low-pass          | v2                         | below cutoff    | above cutoff |
| high-pass         | x - k·v1 - v2              | above cutoff    | below cutoff |
| band-pass         | k·v1 (unity gain at peak)  | around cutoff   | outside      |
| notch / band-stop | x - band-pass (call site)  | outside         | around       |

The core is the two-integrator TPT (topology-preserving transform) SVF. It
exposes low/band/high taps only; the analog filter builds the notch from the
band-pass tap and its own input.
*/

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
/// Absolute Q ceiling; keeps k = 1/Q away from zero.
pub const MAX_Q: f32 = 40.0;
pub const MIN_Q: f32 = 0.5;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

#[derive(Debug, Clone, Copy)]
pub struct SvfOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

/// Clamp a cutoff to the audible range, and below the Nyquist limit of the
/// given sample rate so the prewarp stays finite.
#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let cutoff = if cutoff_hz.is_finite() {
        cutoff_hz
    } else {
        MAX_CUTOFF_HZ
    };
    let ceiling = (sample_rate * 0.49).clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
    cutoff.clamp(MIN_CUTOFF_HZ, ceiling)
}

#[derive(Debug, Clone)]
pub struct SvfCore {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    q: f32,
    sample_rate: f32,

    g: f32,
    k: f32,
}

impl SvfCore {
    pub fn new(sample_rate: f32) -> Self {
        let mut core = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: 1_000.0,
            q: std::f32::consts::FRAC_1_SQRT_2,
            sample_rate: sample_rate.max(1.0),
            g: 0.0,
            k: 0.0,
        };
        core.update_coefficients();
        core
    }

    /// Set cutoff, Q and sample rate. Coefficients are only recomputed when
    /// something actually changed, so calling this once per block is cheap.
    pub fn set_params(&mut self, cutoff_hz: f32, q: f32, sample_rate: f32) {
        let sample_rate = sample_rate.max(1.0);
        let cutoff_hz = clamp_cutoff(cutoff_hz, sample_rate);
        let q = if q.is_finite() { q.clamp(MIN_Q, MAX_Q) } else { MIN_Q };

        if cutoff_hz != self.cutoff_hz || q != self.q || sample_rate != self.sample_rate {
            self.cutoff_hz = cutoff_hz;
            self.q = q;
            self.sample_rate = sample_rate;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        // Bilinear prewarp: g = tan(pi * fc / fs)
        self.g = (std::f32::consts::PI * self.cutoff_hz / self.sample_rate).tan();
        self.k = 1.0 / self.q;
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> SvfOutputs {
        let (g, k) = (self.g, self.k);
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        SvfOutputs {
            lowpass: v2,
            bandpass: k * v1,
            highpass: sample - k * v1 - v2,
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn sine(freq: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / SR).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer[skip..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn run(core: &mut SvfCore, input: &[f32], tap: impl Fn(SvfOutputs) -> f32) -> Vec<f32> {
        input.iter().map(|&x| tap(core.next_sample(x))).collect()
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut core = SvfCore::new(SR);
        core.set_params(500.0, 0.707, SR);
        let out = run(&mut core, &[1.0; 2_000], |o| o.lowpass);
        assert!((out[1_999] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut core = SvfCore::new(SR);
        core.set_params(500.0, 0.707, SR);
        let out = run(&mut core, &[1.0; 2_000], |o| o.highpass);
        assert!(out[1_999].abs() < 1e-3);
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let mut core = SvfCore::new(SR);
        core.set_params(500.0, 0.707, SR);
        let out = run(&mut core, &sine(5_000.0, 2_048), |o| o.lowpass);
        // ~12 dB/octave, a bit over three octaves above cutoff
        assert!(peak_after_transient(&out) < 0.05);
    }

    #[test]
    fn bandpass_is_unity_at_centre() {
        let mut core = SvfCore::new(SR);
        core.set_params(1_000.0, 4.0, SR);
        let out = run(&mut core, &sine(1_000.0, 8_192), |o| o.bandpass);
        let peak = peak_after_transient(&out[4_096..]);
        assert!((peak - 1.0).abs() < 0.05, "band-pass centre gain {peak}");
    }

    #[test]
    fn cutoff_is_clamped() {
        let mut core = SvfCore::new(SR);
        core.set_params(5.0, 1.0, SR);
        assert_eq!(core.cutoff(), MIN_CUTOFF_HZ);
        core.set_params(90_000.0, 1.0, SR);
        assert_eq!(core.cutoff(), MAX_CUTOFF_HZ);

        // At 32 kHz the Nyquist guard sits below 20 kHz
        core.set_params(20_000.0, 1.0, 32_000.0);
        assert!(core.cutoff() < 16_000.0);

        core.set_params(1_000.0, 1_000.0, SR);
        assert_eq!(core.q(), MAX_Q);
    }
}
